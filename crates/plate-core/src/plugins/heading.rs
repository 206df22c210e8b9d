use serde_json::Value;

use crate::editor::Editor;
use crate::error::{CommandError, EditorError};
use crate::matcher::Match;
use crate::node::PARAGRAPH;
use crate::ops::AttrPatch;
use crate::plugin::{CommandSpec, NodeSpec, PlatePlugin, QuerySpec};
use crate::plugins::arg_u64;
use crate::query::{self, AboveOptions, QueryOptions};
use crate::transforms::{set_nodes, text_block_match};

pub const HEADING_KINDS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

pub struct HeadingPlugin;

impl PlatePlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        HEADING_KINDS.iter().map(|kind| NodeSpec::text_block(*kind)).collect()
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_heading", "Set heading", |editor, args| {
                let level = arg_u64(&args, "level").unwrap_or(1).clamp(1, 6);
                set_heading(editor, level as usize)
                    .map_err(|e| CommandError::new(format!("Failed to set heading: {e}")))
            })
            .description("Convert the active text block(s) into a heading.")
            .keywords(["heading", "title", "h1", "h2", "h3", "h4", "h5", "h6"])
            .args_example(serde_json::json!({ "level": 2 })),
            CommandSpec::new("block.unset_heading", "Unset heading", |editor, _args| {
                unset_heading(editor)
                    .map_err(|e| CommandError::new(format!("Failed to unset heading: {e}")))
            })
            .description("Convert heading back to a paragraph.")
            .keywords(["heading", "paragraph", "title", "reset"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.heading_level", |editor, _args| {
            Ok(active_heading_level(editor).map_or(Value::Null, Value::from))
        })]
    }
}

fn set_heading(editor: &mut Editor, level: usize) -> Result<(), EditorError> {
    let selection = editor.selection().cloned().ok_or(EditorError::NoSelection)?;
    let kind = HEADING_KINDS[level - 1];
    set_nodes(
        editor,
        AttrPatch::kind(kind),
        QueryOptions::new()
            .at(selection)
            .matcher(text_block_match(editor)),
    )?;
    Ok(())
}

fn unset_heading(editor: &mut Editor) -> Result<(), EditorError> {
    let selection = editor.selection().cloned().ok_or(EditorError::NoSelection)?;
    set_nodes(
        editor,
        AttrPatch::kind(PARAGRAPH),
        QueryOptions::new()
            .at(selection)
            .matcher(Match::kinds(HEADING_KINDS)),
    )?;
    Ok(())
}

/// Level of the heading holding the selection focus.
pub fn active_heading_level(editor: &Editor) -> Option<u64> {
    let focus = editor.selection()?.focus.clone();
    let (block, _) = query::get_block_above(editor, AboveOptions::new().at(focus));
    let kind = block.element()?.kind.as_str();
    HEADING_KINDS
        .iter()
        .position(|k| *k == kind)
        .map(|ix| ix as u64 + 1)
}
