//! Structural edits built from low-level operations. Every compound transform
//! runs inside `without_normalizing`, so normalization sees only the final
//! tree.

pub mod deep;
pub mod delete;
pub mod merge;
pub mod move_children;
pub mod split;
pub mod text;
pub mod wrap;

use tracing::trace;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::location::{Edge, Location, Range};
use crate::matcher::Match;
use crate::node::Node;
use crate::ops::{AttrPatch, Op};
use crate::path::{self, Path};
use crate::query::{self, Mode, QueryOptions};

pub use deep::{
    DeepSource, NodeQuery, apply_deep_to_nodes, defaults_deep_to_nodes, merge_deep_to_nodes,
    query_node,
};
pub use delete::{DeleteOptions, delete_fragment, delete_range};
pub use merge::{MergeHooks, MergeOptions, merge_nodes};
pub use move_children::move_children;
pub use split::{SplitOptions, split_nodes};
pub use text::{insert_text, remove_text};
pub use wrap::{UnwrapOptions, WrapOptions, unwrap_nodes, wrap_nodes};

/// Matches block elements.
pub fn block_match(editor: &Editor) -> Match {
    let registry = editor.registry_handle();
    Match::predicate(move |node, _| registry.is_block(node))
}

/// Matches blocks whose children are inline content.
pub fn text_block_match(editor: &Editor) -> Match {
    let registry = editor.registry_handle();
    Match::predicate(move |node, _| registry.is_text_block(node))
}

/// Inserts `nodes` as consecutive siblings starting at `at`.
pub fn insert_nodes(editor: &mut Editor, at: &[usize], nodes: Vec<Node>) -> Result<(), EditorError> {
    if at.is_empty() {
        return Err(EditorError::invalid_path(at, "cannot insert at the root"));
    }
    let mut path = at.to_vec();
    editor.without_normalizing(|editor| {
        for node in nodes {
            editor.apply_op(Op::InsertNode {
                path: path.clone(),
                node,
            })?;
            if let Some(next) = path::next(&path) {
                path = next;
            }
        }
        Ok(())
    })
}

pub fn insert_node(editor: &mut Editor, at: &[usize], node: Node) -> Result<(), EditorError> {
    insert_nodes(editor, at, vec![node])
}

pub fn remove_node(editor: &mut Editor, at: &[usize]) -> Result<(), EditorError> {
    editor.apply_op(Op::RemoveNode { path: at.to_vec() })
}

/// Removes every node matched by `options`. `Mode::All` is read as
/// `Mode::Lowest`; without a matcher a `Path` scope selects the node at that
/// path and any other scope selects blocks.
pub fn remove_nodes(editor: &mut Editor, options: QueryOptions) -> Result<usize, EditorError> {
    let paths = matched_paths(editor, options);
    editor.without_normalizing(|editor| {
        let refs: Vec<_> = paths.into_iter().map(|p| editor.path_ref(p)).collect();
        let mut removed = 0;
        for r in refs {
            if let Some(path) = r.unref() {
                remove_node(editor, &path)?;
                removed += 1;
            }
        }
        Ok(removed)
    })
}

/// Applies `patch` to every node matched by `options`, see [`remove_nodes`]
/// for the defaults.
pub fn set_nodes(
    editor: &mut Editor,
    patch: AttrPatch,
    options: QueryOptions,
) -> Result<usize, EditorError> {
    if patch.is_empty() {
        return Ok(0);
    }
    let paths = matched_paths(editor, options);
    editor.without_normalizing(|editor| {
        for path in &paths {
            editor.apply_op(Op::SetNode {
                path: path.clone(),
                patch: patch.clone(),
            })?;
        }
        Ok(paths.len())
    })
}

/// Moves the node at `at` so it ends up at `to`.
pub fn move_node(editor: &mut Editor, at: &[usize], to: &[usize]) -> Result<(), EditorError> {
    if at == to {
        return Ok(());
    }
    editor.apply_op(Op::MoveNode {
        path: at.to_vec(),
        new_path: to.to_vec(),
    })
}

/// Moves every node matched by `options` to `to`, keeping their order.
pub fn move_nodes(editor: &mut Editor, options: QueryOptions, to: &[usize]) -> Result<usize, EditorError> {
    let paths = matched_paths(editor, options);
    editor.without_normalizing(|editor| {
        let to_ref = editor.path_ref(to.to_vec());
        let refs: Vec<_> = paths.into_iter().map(|p| editor.path_ref(p)).collect();
        let mut moved = 0;
        for r in refs {
            let (Some(from), Some(to)) = (r.unref(), to_ref.current()) else {
                continue;
            };
            move_node(editor, &from, &to)?;
            moved += 1;
        }
        trace!(moved, "move nodes");
        Ok(moved)
    })
}

fn matched_paths(editor: &Editor, options: QueryOptions) -> Vec<Path> {
    let mut options = options;
    if options.mode == Mode::All {
        options.mode = Mode::Lowest;
    }
    if options.matcher.is_any() {
        match &options.at {
            Some(Location::Path(at)) => options.matcher = Match::path(at),
            _ => options.matcher = block_match(editor),
        }
    }
    query::get_nodes(editor, options).map(|(_, p)| p).collect()
}

/// Sets the selection to `at`. Unresolvable locations leave it unchanged.
pub fn select(editor: &mut Editor, at: impl Into<Location>) {
    let at = at.into();
    if let Some(range) = query::range_of(editor, &at) {
        editor.set_selection(Some(range));
    }
}

pub fn collapse(editor: &mut Editor, edge: Edge) {
    let Some(selection) = editor.selection().cloned() else {
        return;
    };
    let point = match edge {
        Edge::Start => selection.start(),
        Edge::End => selection.end(),
    };
    editor.set_selection(Some(Range::collapsed(point)));
}

pub fn deselect(editor: &mut Editor) {
    editor.set_selection(None);
}
