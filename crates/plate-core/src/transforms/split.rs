use crate::editor::Editor;
use crate::error::EditorError;
use crate::location::{Affinity, Location, Point};
use crate::matcher::Match;
use crate::node::Node;
use crate::ops::Op;
use crate::path;
use crate::query::{self, Mode, QueryOptions};
use crate::transforms::delete::delete_range;
use crate::transforms::{block_match, insert_node, select};

#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Defaults to the selection. A `Path` splits its parent right before it.
    pub at: Option<Location>,
    /// The highest ancestor to split; defaults to the closest block.
    pub matcher: Option<Match>,
    /// Split up to the highest match instead of the lowest.
    pub highest: bool,
    /// Split even when the point sits at an edge of a node.
    pub always: bool,
    /// Levels above the text leaf that are left intact.
    pub height: usize,
    pub voids: bool,
}

/// Splits the text leaf at a point and its ancestors up to the matched
/// element. Without `always`, levels where the point is at an edge are only
/// stepped over.
pub fn split_nodes(editor: &mut Editor, options: SplitOptions) -> Result<(), EditorError> {
    editor.without_normalizing(|editor| split(editor, options))
}

fn split(editor: &mut Editor, options: SplitOptions) -> Result<(), EditorError> {
    let explicit = options.at.is_some();
    let Some(mut at) = options
        .at
        .clone()
        .or_else(|| editor.selection().cloned().map(Location::Range))
    else {
        return Ok(());
    };
    let mut matcher = options.matcher.clone().unwrap_or_else(|| block_match(editor));
    let mut height = options.height;
    let mut always = options.always;

    if let Location::Range(range) = &at {
        match delete_range(editor, range.clone())? {
            Some(point) => at = Location::Point(point),
            None => return Ok(()),
        }
    }

    if let Location::Path(target) = &at {
        let target = target.clone();
        let (Some(point), Some(parent)) = (
            query::start(editor, &Location::Path(target.clone())),
            path::parent(&target),
        ) else {
            return Ok(());
        };
        matcher = Match::path(&parent);
        height = point.path.len() - target.len() + 1;
        always = true;
        at = Location::Point(point);
    }

    let Location::Point(mut at) = at else {
        return Ok(());
    };

    let mode = if options.highest { Mode::Highest } else { Mode::Lowest };
    let Some(highest_path) = query::find_node(
        editor,
        QueryOptions::new()
            .at(at.clone())
            .matcher(matcher)
            .mode(mode)
            .voids(options.voids),
    )
    .map(|(_, p)| p) else {
        return Ok(());
    };

    if !options.voids
        && let Some((void_node, void_path)) = query::void_above(editor, &Location::Point(at.clone()))
    {
        if editor.is_inline(void_node) {
            let Some(after_path) = path::next(&void_path) else {
                return Ok(());
            };
            if !editor.doc().node(&after_path).is_some_and(Node::is_text) {
                insert_node(editor, &after_path, Node::text(""))?;
            }
            at = Point::new(after_path, 0);
        }
        height = at.path.len() - void_path.len() + 1;
        always = true;
    }

    let before_ref = editor.point_ref_with(at.clone(), Affinity::Backward);
    let after_ref = editor.point_ref(at.clone());
    let Some(depth) = at.path.len().checked_sub(height) else {
        return Ok(());
    };
    let lowest_path = at.path[..depth].to_vec();
    let mut position = if height == 0 {
        at.offset
    } else {
        at.path[depth]
    };

    let levels: Vec<_> = query::levels(editor, &lowest_path, &Match::Any, options.voids)
        .into_iter()
        .rev()
        .map(|(node, p)| (editor.is_void(node), p))
        .collect();
    for (is_void, p) in levels {
        if p.len() < highest_path.len() || (!options.voids && is_void) {
            break;
        }
        let point = before_ref.current();
        let at_path = Location::Path(p.clone());
        let is_end = point
            .as_ref()
            .is_some_and(|point| query::is_end(editor, point, &at_path));
        let mut did_split = false;
        let at_edge = point
            .as_ref()
            .is_some_and(|point| query::is_edge(editor, point, &at_path));
        if always || !at_edge {
            did_split = true;
            let Some(node) = editor.doc().node(&p) else {
                break;
            };
            let properties = node.props().clone();
            editor.apply_op(Op::SplitNode {
                path: p.clone(),
                position,
                properties,
            })?;
        }
        let last = p.last().copied().unwrap_or_default();
        position = last + usize::from(did_split || is_end);
    }

    if !explicit {
        let point = after_ref
            .current()
            .or_else(|| query::end(editor, &Location::Path(Vec::new())));
        if let Some(point) = point {
            select(editor, point);
        }
    }
    Ok(())
}
