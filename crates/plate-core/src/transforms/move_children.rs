use tracing::trace;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::matcher::{Match, matches};
use crate::path;
use crate::transforms::move_node;

/// Moves the children of the block at `at`, from index `start` on, to `to`.
/// Children are moved last to first onto the same target, so they keep
/// their order. Returns how many moved; nothing moves unless `at` is a block
/// element.
pub fn move_children(
    editor: &mut Editor,
    at: &[usize],
    to: &[usize],
    start: usize,
    matcher: Option<&Match>,
) -> Result<usize, EditorError> {
    let Some(parent) = editor.doc().node(at) else {
        return Ok(0);
    };
    if !editor.is_block(parent) {
        return Ok(0);
    }
    let count = parent.children().len();

    editor.without_normalizing(|editor| {
        let mut moved = 0;
        for ix in (start..count).rev() {
            let child_path = path::child(at, ix);
            let Some(child) = editor.doc().node(&child_path) else {
                continue;
            };
            if matcher.is_some_and(|m| !matches(child, &child_path, m)) {
                continue;
            }
            move_node(editor, &child_path, to)?;
            moved += 1;
        }
        trace!(moved, from = ?at, ?to, "move children");
        Ok(moved)
    })
}
