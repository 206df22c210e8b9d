use std::cmp::Ordering;

use tracing::debug;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::location::{Location, Point, Range};
use crate::ops::Op;
use crate::path::{self, Path};
use crate::query::{self, AboveOptions, QueryOptions, TextUnit};
use crate::transforms::merge::{MergeHooks, MergeOptions, merge_nodes};
use crate::transforms::{block_match, remove_node};

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Defaults to the selection.
    pub at: Option<Location>,
    /// Step used when `at` is collapsed.
    pub unit: TextUnit,
    pub reverse: bool,
    /// Keep a range ending at the start of a following block as is.
    pub hanging: bool,
    pub voids: bool,
    /// Passed on to the merge of the boundary blocks.
    pub hooks: MergeHooks,
}

impl DeleteOptions {
    pub fn at(at: impl Into<Location>) -> Self {
        Self {
            at: Some(at.into()),
            ..Self::default()
        }
    }

    pub fn hooks(mut self, hooks: MergeHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Deletes the content at `options.at`.
///
/// A collapsed location deletes one `unit` in the given direction, a point
/// inside a void removes the void, and an expanded range removes everything
/// it covers, then merges the block at its end into the block at its start.
/// When `at` was taken from the selection, the selection is left collapsed
/// where the content was.
pub fn delete_fragment(editor: &mut Editor, options: DeleteOptions) -> Result<(), EditorError> {
    editor.without_normalizing(|editor| delete(editor, options))
}

/// Deletes `range` and returns the point where it collapsed to.
pub fn delete_range(editor: &mut Editor, range: Range) -> Result<Option<Point>, EditorError> {
    if range.is_collapsed() {
        return Ok(Some(range.anchor));
    }
    let end_ref = editor.point_ref(range.end());
    delete_fragment(editor, DeleteOptions::at(range))?;
    Ok(end_ref.unref())
}

fn delete(editor: &mut Editor, options: DeleteOptions) -> Result<(), EditorError> {
    let explicit = options.at.is_some();
    let voids = options.voids;
    let Some(mut at) = options
        .at
        .clone()
        .or_else(|| editor.selection().cloned().map(Location::Range))
    else {
        return Ok(());
    };
    let mut hanging = options.hanging;

    if let Location::Range(range) = &at
        && range.is_collapsed()
    {
        at = Location::Point(range.anchor.clone());
    }

    if let Location::Point(point) = &at {
        let point = point.clone();
        let void = query::void_above(editor, &Location::Point(point.clone())).map(|(_, p)| p);
        match void {
            Some(void_path) if !voids => at = Location::Path(void_path),
            _ => {
                let root = Location::Path(Vec::new());
                let target = if options.reverse {
                    query::before(editor, &point, options.unit).or_else(|| query::start(editor, &root))
                } else {
                    query::after(editor, &point, options.unit).or_else(|| query::end(editor, &root))
                };
                let Some(target) = target else {
                    return Ok(());
                };
                at = Location::Range(Range::new(point, target));
                hanging = true;
            }
        }
    }

    let range = match at {
        Location::Path(path) => {
            debug!(?path, "delete node");
            return remove_node(editor, &path);
        }
        Location::Range(range) => range,
        Location::Point(_) | Location::Span(..) => return Ok(()),
    };
    if range.is_collapsed() {
        return Ok(());
    }

    let mut range = range;
    if !hanging {
        let doc_end = query::end(editor, &Location::Path(Vec::new()));
        if doc_end.as_ref() != Some(&range.end()) {
            range = query::unhang_range(editor, &range, voids);
        }
    }

    let (mut start, mut end) = range.edges();
    let start_block = block_above(editor, &start, voids);
    let end_block = block_above(editor, &end, voids);
    let across_blocks = matches!((&start_block, &end_block), (Some(a), Some(b)) if a != b);
    let single_text = start.path == end.path;
    let start_void = if voids {
        None
    } else {
        query::void_above(editor, &Location::Point(start.clone())).map(|(_, p)| p)
    };
    let end_void = if voids {
        None
    } else {
        query::void_above(editor, &Location::Point(end.clone())).map(|(_, p)| p)
    };

    // Nudge the edges out of voids, staying inside their blocks.
    if start_void.is_some()
        && let Some(before) = query::before(editor, &start, TextUnit::Character)
        && start_block
            .as_ref()
            .is_some_and(|block| path::is_ancestor(block, &before.path))
    {
        start = before;
    }
    if end_void.is_some()
        && let Some(after) = query::after(editor, &end, TextUnit::Character)
        && end_block
            .as_ref()
            .is_some_and(|block| path::is_ancestor(block, &after.path))
    {
        end = after;
    }

    let mut doomed: Vec<Path> = Vec::new();
    let mut last: Option<Path> = None;
    for (node, p) in query::get_nodes(editor, QueryOptions::new().at(range.clone()).voids(voids)) {
        if last
            .as_ref()
            .is_some_and(|last| path::compare(&p, last) == Ordering::Equal)
        {
            continue;
        }
        let enclosed = !path::is_common(&p, &start.path) && !path::is_common(&p, &end.path);
        if (!voids && editor.is_void(node)) || enclosed {
            last = Some(p.clone());
            doomed.push(p);
        }
    }

    let start_ref = editor.point_ref(start.clone());
    let end_ref = editor.point_ref(end.clone());
    let doomed_refs: Vec<_> = doomed.into_iter().map(|p| editor.path_ref(p)).collect();

    if !single_text
        && start_void.is_none()
        && let Some(point) = start_ref.current()
        && let Some(leaf) = editor.doc().text(&point.path)
    {
        let len = leaf.text.len();
        if start.offset < len {
            editor.apply_op(Op::RemoveText {
                path: point.path,
                range: start.offset..len,
            })?;
        }
    }

    let doomed: Vec<Path> = doomed_refs.into_iter().filter_map(|r| r.unref()).collect();
    let removed = doomed.len();
    for p in doomed.iter().rev() {
        remove_node(editor, p)?;
    }

    if end_void.is_none()
        && let Some(point) = end_ref.current()
        && let Some(leaf) = editor.doc().text(&point.path)
    {
        let from = if single_text { start.offset } else { 0 };
        let to = end.offset.min(leaf.text.len());
        if from < to {
            editor.apply_op(Op::RemoveText {
                path: point.path,
                range: from..to,
            })?;
        }
    }

    if !single_text
        && across_blocks
        && start_ref.current().is_some()
        && let Some(point) = end_ref.current()
    {
        merge_nodes(
            editor,
            MergeOptions {
                at: Some(Location::Point(point)),
                hanging: true,
                voids,
                hooks: options.hooks.clone(),
                ..MergeOptions::default()
            },
        )?;
    }

    debug!(removed, across_blocks, "delete fragment");

    let (start, end) = (start_ref.unref(), end_ref.unref());
    let point = if options.reverse { start.or(end) } else { end.or(start) };
    if !explicit && let Some(point) = point {
        editor.set_selection(Some(Range::collapsed(point)));
    }
    Ok(())
}

fn block_above(editor: &Editor, point: &Point, voids: bool) -> Option<Path> {
    let options = AboveOptions::new()
        .at(point.clone())
        .matcher(block_match(editor))
        .voids(voids);
    query::get_above(editor, options).map(|(_, p)| p)
}
