//! Text edits and the core behavior at the end of every handler pipeline.

use tracing::debug;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::location::{Location, Range};
use crate::ops::{Op, clamp_to_char_boundary};
use crate::query::{self, TextUnit};
use crate::transforms::delete::{DeleteOptions, delete_fragment};
use crate::transforms::split::{SplitOptions, split_nodes};

/// Inserts `text` at `at` (default: the selection). An expanded range is
/// deleted first; text is never inserted into a void.
pub fn insert_text(editor: &mut Editor, text: &str, at: Option<Location>) -> Result<(), EditorError> {
    editor.without_normalizing(|editor| {
        let explicit = at.is_some();
        let Some(at) = at.or_else(|| editor.selection().cloned().map(Location::Range)) else {
            return Ok(());
        };
        let point = match at {
            Location::Range(range) if range.is_expanded() => {
                let (start, end) = range.edges();
                if query::void_above(editor, &Location::Point(end.clone())).is_some() {
                    return Ok(());
                }
                let start_ref = editor.point_ref(start);
                let end_ref = editor.point_ref(end);
                delete_fragment(editor, DeleteOptions::at(range))?;
                let (start, end) = (start_ref.unref(), end_ref.unref());
                let Some(point) = start.or(end) else {
                    return Ok(());
                };
                if !explicit {
                    editor.set_selection(Some(Range::collapsed(point.clone())));
                }
                point
            }
            Location::Range(range) => range.anchor,
            Location::Point(point) => point,
            other => match query::start(editor, &other) {
                Some(point) => point,
                None => return Ok(()),
            },
        };

        if text.is_empty() || query::void_above(editor, &Location::Point(point.clone())).is_some() {
            return Ok(());
        }
        editor.apply_op(Op::InsertText {
            path: point.path,
            offset: point.offset,
            text: text.to_string(),
        })
    })
}

/// Removes the text between the two edges of `range`, which must lie in one
/// text leaf.
pub fn remove_text(editor: &mut Editor, range: &Range) -> Result<(), EditorError> {
    let (start, end) = range.edges();
    if start.path != end.path {
        return Err(EditorError::invalid_path(
            &end.path,
            "remove_text expects both edges in the same leaf",
        ));
    }
    let Some(leaf) = editor.doc().text(&start.path) else {
        return Err(EditorError::invalid_path(&start.path, "not a text node"));
    };
    let from = clamp_to_char_boundary(&leaf.text, start.offset);
    let to = clamp_to_char_boundary(&leaf.text, end.offset);
    if from >= to {
        return Ok(());
    }
    editor.apply_op(Op::RemoveText {
        path: start.path,
        range: from..to,
    })
}

pub(crate) fn delete_backward_default(editor: &mut Editor, unit: TextUnit) -> Result<(), EditorError> {
    delete_directional(editor, unit, true)
}

pub(crate) fn delete_forward_default(editor: &mut Editor, unit: TextUnit) -> Result<(), EditorError> {
    delete_directional(editor, unit, false)
}

fn delete_directional(editor: &mut Editor, unit: TextUnit, reverse: bool) -> Result<(), EditorError> {
    let Some(selection) = editor.selection() else {
        return Ok(());
    };
    if selection.is_expanded() {
        return editor.delete_fragment();
    }
    delete_fragment(
        editor,
        DeleteOptions {
            unit,
            reverse,
            ..DeleteOptions::default()
        },
    )
}

pub(crate) fn delete_fragment_default(editor: &mut Editor) -> Result<(), EditorError> {
    let Some(selection) = editor.selection() else {
        return Ok(());
    };
    if selection.is_collapsed() {
        return Ok(());
    }
    let reverse = selection.is_backward();
    debug!("delete fragment");
    delete_fragment(
        editor,
        DeleteOptions {
            reverse,
            ..DeleteOptions::default()
        },
    )
}

pub(crate) fn insert_break_default(editor: &mut Editor) -> Result<(), EditorError> {
    if editor.selection().is_none() {
        return Ok(());
    }
    split_nodes(
        editor,
        SplitOptions {
            always: true,
            ..SplitOptions::default()
        },
    )
}

pub(crate) fn insert_text_default(editor: &mut Editor, text: &str) -> Result<(), EditorError> {
    if editor.selection().is_none() {
        return Ok(());
    }
    insert_text(editor, text, None)
}
