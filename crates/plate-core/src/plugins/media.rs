//! Images, mentions and links: the void and inline element kinds.

use serde_json::Value;
use tracing::debug;

use crate::editor::Editor;
use crate::error::{CommandError, EditorError};
use crate::location::{Location, Point, Range};
use crate::matcher::Match;
use crate::node::{ElementNode, Node};
use crate::path;
use crate::plugin::{CommandSpec, NodeRole, NodeSpec, PlatePlugin, QuerySpec};
use crate::plugins::arg_str;
use crate::query::{self, AboveOptions, QueryOptions};
use crate::transforms::{
    SplitOptions, UnwrapOptions, WrapOptions, insert_node, split_nodes, unwrap_nodes, wrap_nodes,
};

pub const IMAGE: &str = "img";
pub const MENTION: &str = "mention";
pub const LINK: &str = "a";

pub struct MediaPlugin;

impl PlatePlugin for MediaPlugin {
    fn id(&self) -> &'static str {
        "media"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::void(IMAGE, NodeRole::Block),
            NodeSpec::void(MENTION, NodeRole::Inline),
            NodeSpec::inline(LINK),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("image.insert", "Insert image", |editor, args| {
                let Some(url) = arg_str(&args, "url") else {
                    return Err(CommandError::new("Missing url"));
                };
                let url = url.to_string();
                insert_image(editor, &url)
                    .map_err(|e| CommandError::new(format!("Failed to insert image: {e}")))
            })
            .description("Insert an image block after the current block.")
            .keywords(["image", "picture", "img"])
            .args_example(serde_json::json!({ "url": "https://example.com/a.png" })),
            CommandSpec::new("mention.insert", "Insert mention", |editor, args| {
                let Some(value) = arg_str(&args, "value") else {
                    return Err(CommandError::new("Missing value"));
                };
                let value = value.to_string();
                insert_mention(editor, &value)
                    .map_err(|e| CommandError::new(format!("Failed to insert mention: {e}")))
            })
            .description("Insert a mention at the cursor.")
            .keywords(["mention", "@", "user"])
            .args_example(serde_json::json!({ "value": "alice" })),
            CommandSpec::new("link.wrap", "Set link", |editor, args| {
                let Some(url) = arg_str(&args, "url") else {
                    return Err(CommandError::new("Missing url"));
                };
                let url = url.to_string();
                wrap_link(editor, &url)
                    .map_err(|e| CommandError::new(format!("Failed to set link: {e}")))
            })
            .description("Wrap the selected text in a link.")
            .keywords(["link", "url", "href"])
            .args_example(serde_json::json!({ "url": "https://example.com" })),
            CommandSpec::new("link.unwrap", "Unset link", |editor, _args| {
                let Some(selection) = editor.selection().cloned() else {
                    return Ok(());
                };
                unwrap_nodes(
                    editor,
                    UnwrapOptions::at(selection).matcher(Match::kind(LINK)),
                )
                .map(|_| ())
                .map_err(|e| CommandError::new(format!("Failed to unset link: {e}")))
            })
            .description("Remove links touching the selection.")
            .keywords(["link", "unlink"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("link.active_url", |editor, _args| {
            let Some(selection) = editor.selection() else {
                return Ok(Value::Null);
            };
            let found = query::get_above(
                editor,
                AboveOptions::new()
                    .at(selection.focus.clone())
                    .matcher(Match::kind(LINK)),
            );
            Ok(found
                .and_then(|(node, _)| node.props().get("url").cloned())
                .unwrap_or(Value::Null))
        })]
    }
}

fn insert_image(editor: &mut Editor, url: &str) -> Result<(), EditorError> {
    let selection = editor.selection().cloned().ok_or(EditorError::NoSelection)?;
    let block = query::get_block_above(editor, AboveOptions::new().at(selection.focus.path.clone())).1;
    let at = match path::next(&block) {
        Some(at) => at,
        None => vec![editor.doc().children.len()],
    };
    let image = ElementNode::new(IMAGE, vec![Node::text("")]).with_attr("url", url);
    insert_node(editor, &at, image.into())?;
    debug!(?at, "insert image");
    Ok(())
}

/// Splits the text at the cursor and puts the mention between the halves;
/// the cursor ends up right after it.
fn insert_mention(editor: &mut Editor, value: &str) -> Result<(), EditorError> {
    editor.without_normalizing(|editor| {
        let selection = editor.selection().cloned().ok_or(EditorError::NoSelection)?;
        if selection.is_expanded() {
            crate::transforms::delete_fragment(editor, Default::default())?;
        }
        let Some(point) = editor.selection().map(|s| s.anchor.clone()) else {
            return Ok(());
        };
        if query::void_above(editor, &Location::Point(point.clone())).is_some() {
            return Ok(());
        }

        split_nodes(
            editor,
            SplitOptions {
                at: Some(Location::Point(point.clone())),
                matcher: Some(Match::text()),
                always: true,
                ..SplitOptions::default()
            },
        )?;
        let Some(at) = path::next(&point.path) else {
            return Ok(());
        };
        let mention = ElementNode::new(MENTION, vec![Node::text("")]).with_attr("value", value);
        insert_node(editor, &at, mention.into())?;

        if let Some(after) = path::next(&at) {
            editor.set_selection(Some(Range::collapsed(Point::new(after, 0))));
        }
        Ok(())
    })
}

fn wrap_link(editor: &mut Editor, url: &str) -> Result<(), EditorError> {
    let selection = editor.selection().cloned().ok_or(EditorError::NoSelection)?;
    if selection.is_collapsed() {
        return Ok(());
    }
    let existing = query::some_node(
        editor,
        QueryOptions::new()
            .at(selection.clone())
            .matcher(Match::kind(LINK)),
    );
    if existing {
        unwrap_nodes(editor, UnwrapOptions::at(selection).matcher(Match::kind(LINK)))?;
    }
    let link = ElementNode::new(LINK, Vec::new()).with_attr("url", url);
    wrap_nodes(editor, link, WrapOptions::default())?;
    Ok(())
}
