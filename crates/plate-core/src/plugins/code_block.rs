//! Code blocks: `code_block > code_line > text`, with Tab indentation and
//! Enter keeping the current line's indent.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::editor::Editor;
use crate::error::{CommandError, EditorError};
use crate::location::{Location, Point, Range};
use crate::matcher::Match;
use crate::node::{ElementNode, Node, PARAGRAPH};
use crate::ops::{AttrPatch, Op};
use crate::path::{self, Path};
use crate::plugin::{CommandSpec, EditorHandler, Hotkey, Next, NodeSpec, NormalizePass, PlatePlugin, QuerySpec};
use crate::plugins::element_paths;
use crate::query::{self, AboveOptions, QueryOptions};
use crate::transforms::{
    SplitOptions, UnwrapOptions, WrapOptions, insert_node, insert_text, move_node, remove_node,
    remove_text, set_nodes, split_nodes, text_block_match, unwrap_nodes, wrap_nodes,
};

pub const CODE_BLOCK: &str = "code_block";
pub const CODE_LINE: &str = "code_line";

pub struct CodeBlockPlugin;

impl PlatePlugin for CodeBlockPlugin {
    fn id(&self) -> &'static str {
        "code_block"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::container(CODE_BLOCK).default_child(CODE_LINE),
            NodeSpec::text_block(CODE_LINE),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeCodeBlock)]
    }

    fn handler(&self) -> Option<Arc<dyn EditorHandler>> {
        Some(Arc::new(CodeBlockHandler))
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("code_block.toggle", "Toggle code block", |editor, _args| {
                toggle_code_block(editor)
                    .map_err(|e| CommandError::new(format!("Failed to toggle code block: {e}")))
            })
            .description("Turn the selected blocks into a code block, or back into paragraphs.")
            .keywords(["code", "code block", "pre", "snippet"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("code_block.is_active", |editor, _args| {
            Ok(Value::Bool(get_code_line_entry(editor, None).is_some()))
        })]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLineEntry {
    pub code_block: Path,
    pub code_line: Path,
}

/// Closest code line above `at` (the selection focus by default) whose
/// parent is a code block.
pub fn get_code_line_entry(editor: &Editor, at: Option<Location>) -> Option<CodeLineEntry> {
    let at = match at {
        Some(Location::Range(range)) => Location::Point(range.focus),
        Some(at) => at,
        None => Location::Point(editor.selection()?.focus.clone()),
    };
    let (_, code_line) =
        query::get_above(editor, AboveOptions::new().at(at).matcher(Match::kind(CODE_LINE)))?;
    let code_block = path::parent(&code_line)
        .filter(|p| editor.doc().node(p).and_then(Node::kind) == Some(CODE_BLOCK))?;
    Some(CodeLineEntry {
        code_block,
        code_line,
    })
}

/// Leading whitespace of the line.
pub fn line_indent(editor: &Editor, code_line: &[usize]) -> String {
    let text = editor.doc().node(code_line).map(Node::string).unwrap_or_default();
    text.chars().take_while(|c| c.is_whitespace()).collect()
}

fn line_start(editor: &Editor, code_line: &[usize]) -> Option<Point> {
    query::start(editor, &Location::Path(code_line.to_vec()))
}

/// Code lines touched by the selection, in document order.
fn selected_code_lines(editor: &Editor) -> Vec<Path> {
    let Some(selection) = editor.selection().cloned() else {
        return Vec::new();
    };
    query::get_nodes(
        editor,
        QueryOptions::new()
            .at(selection)
            .matcher(Match::kind(CODE_LINE)),
    )
    .map(|(_, p)| p)
    .collect()
}

/// Indents the line by `indent_depth` spaces: at the cursor when text before
/// it on the line is not blank, else at the line start.
pub fn indent_code_line(editor: &mut Editor, entry: &CodeLineEntry) -> Result<(), EditorError> {
    let indent = " ".repeat(editor.config().code_block.indent_depth);
    let Some(start) = line_start(editor, &entry.code_line) else {
        return Ok(());
    };
    if let Some(selection) = editor.selection().cloned()
        && selection.is_collapsed()
    {
        let before = query::string(
            editor,
            &Location::Range(Range::new(start.clone(), selection.anchor.clone())),
        );
        if before.chars().any(|c| !c.is_whitespace()) {
            return insert_text(editor, &indent, Some(Location::Point(selection.anchor)));
        }
    }
    insert_text(editor, &indent, Some(Location::Point(start)))
}

/// Removes up to `indent_depth` leading whitespace characters.
pub fn outdent_code_line(editor: &mut Editor, entry: &CodeLineEntry) -> Result<(), EditorError> {
    let depth = editor.config().code_block.indent_depth;
    let Some(start) = line_start(editor, &entry.code_line) else {
        return Ok(());
    };
    let Some(leaf) = editor.doc().text(&start.path) else {
        return Ok(());
    };
    let width: usize = leaf
        .text
        .chars()
        .take(depth)
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if width == 0 {
        return Ok(());
    }
    let end = Point::new(start.path.clone(), start.offset + width);
    remove_text(editor, &Range::new(start, end))
}

/// Applies `f` to the line holding a collapsed selection, or to every line of
/// an expanded one.
fn for_selected_lines(
    editor: &mut Editor,
    f: fn(&mut Editor, &CodeLineEntry) -> Result<(), EditorError>,
) -> Result<bool, EditorError> {
    let expanded = editor.selection().is_some_and(Range::is_expanded);
    if !expanded {
        let Some(entry) = get_code_line_entry(editor, None) else {
            return Ok(false);
        };
        f(editor, &entry)?;
        return Ok(true);
    }

    let lines = selected_code_lines(editor);
    if lines.is_empty() {
        return Ok(false);
    }
    editor.without_normalizing(|editor| {
        for line in &lines {
            let Some(entry) = get_code_line_entry(editor, Some(Location::Path(path::child(line, 0))))
            else {
                continue;
            };
            f(editor, &entry)?;
        }
        Ok(true)
    })
}

/// Splits the line at the cursor; the new line starts with the current
/// line's indent.
pub fn insert_break_code_line(editor: &mut Editor, entry: &CodeLineEntry) -> Result<(), EditorError> {
    let indent = line_indent(editor, &entry.code_line);
    editor.without_normalizing(|editor| {
        split_nodes(
            editor,
            SplitOptions {
                matcher: Some(Match::kind(CODE_LINE)),
                always: true,
                ..SplitOptions::default()
            },
        )?;
        if indent.is_empty() {
            return Ok(());
        }
        let Some(focus) = editor.selection().map(|s| s.focus.clone()) else {
            return Ok(());
        };
        let Some(line) = get_code_line_entry(editor, Some(Location::Point(focus))) else {
            return Ok(());
        };
        let Some(start) = line_start(editor, &line.code_line) else {
            return Ok(());
        };
        insert_text(editor, &indent, Some(Location::Point(start)))?;
        debug!(line = ?line.code_line, depth = indent.len(), "code line break");
        Ok(())
    })
}

/// Unwraps the code block holding the focus back into paragraphs, or turns
/// the selected text blocks into one code block.
pub fn toggle_code_block(editor: &mut Editor) -> Result<(), EditorError> {
    let selection = editor.selection().cloned().ok_or(EditorError::NoSelection)?;
    editor.without_normalizing(|editor| {
        if let Some(entry) = get_code_line_entry(editor, None) {
            let block = entry.code_block;
            set_nodes(
                editor,
                AttrPatch::kind(PARAGRAPH),
                QueryOptions::new().at(block.clone()).matcher(Match::kind(CODE_LINE)),
            )?;
            unwrap_nodes(editor, UnwrapOptions::at(block))?;
            return Ok(());
        }

        set_nodes(
            editor,
            AttrPatch::kind(CODE_LINE),
            QueryOptions::new()
                .at(selection.clone())
                .matcher(text_block_match(editor)),
        )?;
        wrap_nodes(
            editor,
            ElementNode::new(CODE_BLOCK, Vec::new()),
            WrapOptions::at(selection).matcher(Match::kind(CODE_LINE)),
        )?;
        Ok(())
    })
}

struct CodeBlockHandler;

impl EditorHandler for CodeBlockHandler {
    fn id(&self) -> &'static str {
        "code_block"
    }

    fn insert_break(&self, editor: &mut Editor, next: Next<'_>) -> Result<(), EditorError> {
        let collapsed = editor.selection().is_some_and(Range::is_collapsed);
        match get_code_line_entry(editor, None) {
            Some(entry) if collapsed => insert_break_code_line(editor, &entry),
            _ => next.insert_break(editor),
        }
    }

    fn key_down(&self, editor: &mut Editor, hotkey: Hotkey) -> Result<bool, EditorError> {
        match hotkey {
            Hotkey::Tab => for_selected_lines(editor, indent_code_line),
            Hotkey::ShiftTab => for_selected_lines(editor, outdent_code_line),
        }
    }
}

/// Code blocks hold only code lines; code lines live only in code blocks.
struct NormalizeCodeBlock;

impl NormalizePass for NormalizeCodeBlock {
    fn id(&self) -> &'static str {
        "code_block.normalize"
    }

    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        let targets = element_paths(editor.doc(), |el, _| el.kind == CODE_BLOCK || el.kind == CODE_LINE);

        let mut repaired = false;
        for at in targets.iter().rev() {
            let Some(kind) = editor.doc().element(at).map(|el| el.kind.clone()) else {
                continue;
            };
            repaired |= if kind == CODE_LINE {
                normalize_code_line(editor, at)?
            } else {
                normalize_code_block(editor, at)?
            };
        }
        Ok(repaired)
    }
}

fn normalize_code_line(editor: &mut Editor, at: &[usize]) -> Result<bool, EditorError> {
    let in_block = path::parent(at)
        .filter(|p| !p.is_empty())
        .and_then(|p| editor.doc().node(&p))
        .and_then(Node::kind)
        == Some(CODE_BLOCK);
    if in_block {
        return Ok(false);
    }
    editor.apply_op(Op::SetNode {
        path: at.to_vec(),
        patch: AttrPatch::kind(PARAGRAPH),
    })?;
    debug!(?at, "stray code line to paragraph");
    Ok(true)
}

fn normalize_code_block(editor: &mut Editor, at: &[usize]) -> Result<bool, EditorError> {
    let Some(children) = editor.doc().children_at(at) else {
        return Ok(false);
    };
    let Some((ix, child)) = children
        .iter()
        .enumerate()
        .find(|(_, child)| child.kind() != Some(CODE_LINE))
    else {
        return Ok(false);
    };
    let child_path = path::child(at, ix);

    if child.is_text() || editor.is_inline(child) {
        insert_node(editor, &child_path, Node::element(CODE_LINE, Vec::new()))?;
        if let Some(moved) = path::next(&child_path) {
            move_node(editor, &moved, &path::child(&child_path, 0))?;
        }
    } else if editor.is_text_block(child) {
        editor.apply_op(Op::SetNode {
            path: child_path.clone(),
            patch: AttrPatch::kind(CODE_LINE),
        })?;
    } else {
        // Anything else leaves the block: voids move after it, other
        // elements are unwrapped in place.
        let void = editor.is_void(child);
        let count = child.children().len();
        if void {
            let Some(after) = path::next(at) else {
                return Ok(false);
            };
            move_node(editor, &child_path, &after)?;
        } else {
            let Some(after) = path::next(&child_path) else {
                return Ok(false);
            };
            for ix in (0..count).rev() {
                move_node(editor, &path::child(&child_path, ix), &after)?;
            }
            remove_node(editor, &child_path)?;
        }
    }
    debug!(block = ?at, child = ix, "repair code block");
    Ok(true)
}
