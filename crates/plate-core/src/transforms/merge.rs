use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::location::{Location, Range};
use crate::matcher::Match;
use crate::node::{Document, Node};
use crate::ops::Op;
use crate::path::{self, Path};
use crate::query::{self, Mode, QueryOptions};
use crate::transforms::delete::{DeleteOptions, delete_fragment};
use crate::transforms::{block_match, move_node, remove_node};

/// Replaces the default "move next to the previous node, then merge" step.
/// Receives the path of the node being merged and of its previous node; it
/// must leave the node detached from its old place.
pub type MergeNodeHook = Arc<dyn Fn(&mut Editor, &[usize], &[usize]) -> Result<(), EditorError> + Send + Sync>;

/// Replaces the removal of the ancestor emptied by a merge.
pub type RemoveEmptyAncestorHook = Arc<dyn Fn(&mut Editor, &[usize]) -> Result<(), EditorError> + Send + Sync>;

/// Override points of [`merge_nodes`], also threaded through
/// [`delete_fragment`](crate::transforms::delete_fragment).
#[derive(Clone, Default)]
pub struct MergeHooks {
    pub merge_node: Option<MergeNodeHook>,
    pub remove_empty_ancestor: Option<RemoveEmptyAncestorHook>,
}

impl fmt::Debug for MergeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeHooks")
            .field("merge_node", &self.merge_node.is_some())
            .field("remove_empty_ancestor", &self.remove_empty_ancestor.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Defaults to the selection.
    pub at: Option<Location>,
    /// Defaults to siblings of a `Path` and to blocks otherwise.
    pub matcher: Option<Match>,
    pub highest: bool,
    pub hanging: bool,
    pub voids: bool,
    pub hooks: MergeHooks,
}

impl MergeOptions {
    pub fn at(at: impl Into<Location>) -> Self {
        Self {
            at: Some(at.into()),
            ..Self::default()
        }
    }
}

/// Merges the matched node into the previous node of the same kind.
///
/// An empty previous node is removed instead. The highest ancestor left empty
/// by moving the node out is removed as well.
pub fn merge_nodes(editor: &mut Editor, options: MergeOptions) -> Result<(), EditorError> {
    editor.without_normalizing(|editor| merge(editor, options))
}

fn merge(editor: &mut Editor, options: MergeOptions) -> Result<(), EditorError> {
    let explicit = options.at.is_some();
    let Some(mut at) = options
        .at
        .clone()
        .or_else(|| editor.selection().cloned().map(Location::Range))
    else {
        return Ok(());
    };
    let matcher = options.matcher.clone().unwrap_or_else(|| match &at {
        Location::Path(p) => Match::siblings_of(p),
        _ => block_match(editor),
    });

    if !options.hanging
        && let Location::Range(range) = &at
    {
        at = Location::Range(query::unhang_range(editor, range, options.voids));
    }

    if let Location::Range(range) = &at {
        if range.is_collapsed() {
            at = Location::Point(range.anchor.clone());
        } else {
            let end_ref = editor.point_ref(range.end());
            delete_fragment(editor, DeleteOptions::at(range.clone()))?;
            let Some(point) = end_ref.unref() else {
                return Ok(());
            };
            if !explicit {
                editor.set_selection(Some(Range::collapsed(point.clone())));
            }
            at = Location::Point(point);
        }
    }

    let mode = if options.highest { Mode::Highest } else { Mode::Lowest };
    let Some(node_path) = query::find_node(
        editor,
        QueryOptions::new()
            .at(at)
            .matcher(matcher.clone())
            .mode(mode)
            .voids(options.voids),
    )
    .map(|(_, p)| p) else {
        return Ok(());
    };
    let Some(prev_path) = query::previous(editor, &node_path, Some(matcher)).map(|(_, p)| p) else {
        return Ok(());
    };
    if node_path.is_empty() || prev_path.is_empty() {
        return Ok(());
    }

    let doc = editor.doc();
    let (Some(node), Some(prev)) = (doc.node(&node_path), doc.node(&prev_path)) else {
        return Ok(());
    };
    let position = match (node, prev) {
        (Node::Text(_), Node::Text(prev_text)) => prev_text.text.len(),
        (Node::Element(_), Node::Element(prev_el)) => prev_el.children.len(),
        _ => return Err(EditorError::merge_mismatch(&node_path, node, prev)),
    };
    let prev_empty = match prev {
        Node::Text(t) => t.text.is_empty() && path::has_previous(&prev_path),
        Node::Element(_) => query::is_empty(editor, prev),
    };
    let Some(new_path) = path::next(&prev_path) else {
        return Ok(());
    };
    let common = path::common(&node_path, &prev_path);
    let is_previous_sibling = path::is_sibling(&node_path, &prev_path);
    let emptied = emptied_ancestor(doc, &common, &node_path);

    let emptied_ref = emptied.map(|p| editor.path_ref(p));

    match options.hooks.merge_node.clone() {
        Some(hook) => hook(editor, &node_path, &prev_path)?,
        None => {
            if !is_previous_sibling {
                move_node(editor, &node_path, &new_path)?;
            }
            if prev_empty {
                remove_node(editor, &prev_path)?;
            } else {
                editor.apply_op(Op::MergeNode {
                    path: new_path.clone(),
                    position,
                })?;
            }
        }
    }

    if let Some(emptied) = emptied_ref.and_then(|r| r.unref()) {
        match options.hooks.remove_empty_ancestor.clone() {
            Some(hook) => hook(editor, &emptied)?,
            None => remove_node(editor, &emptied)?,
        }
    }

    debug!(path = ?node_path, prev = ?prev_path, "merge nodes");
    Ok(())
}

/// The highest ancestor of `at` below `common` whose only content is the
/// branch leading to `at`.
fn emptied_ancestor(doc: &Document, common: &[usize], at: &[usize]) -> Option<Path> {
    (common.len() + 1..at.len())
        .map(|len| at[..len].to_vec())
        .find(|ancestor| {
            (ancestor.len()..at.len()).all(|len| {
                doc.children_at(&at[..len])
                    .is_some_and(|children| children.len() == 1)
            })
        })
}
