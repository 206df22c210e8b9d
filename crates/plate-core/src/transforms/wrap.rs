use tracing::debug;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::location::{Affinity, Location, Range};
use crate::matcher::Match;
use crate::node::{ElementNode, Node};
use crate::path::{self, Path};
use crate::plugin::NodeRole;
use crate::query::{self, Mode, QueryOptions};
use crate::transforms::split::{SplitOptions, split_nodes};
use crate::transforms::{block_match, insert_node, move_node, remove_node};

#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Defaults to the selection.
    pub at: Option<Location>,
    /// Defaults to the node at a `Path`, otherwise to blocks (or inline
    /// content for an inline wrapper).
    pub matcher: Option<Match>,
    /// Defaults to `Lowest`.
    pub mode: Option<Mode>,
    pub voids: bool,
}

impl WrapOptions {
    pub fn at(at: impl Into<Location>) -> Self {
        Self {
            at: Some(at.into()),
            ..Self::default()
        }
    }

    pub fn matcher(mut self, matcher: Match) -> Self {
        self.matcher = Some(matcher);
        self
    }
}

pub type UnwrapOptions = WrapOptions;

/// Wraps the matched nodes in a copy of `element`. Matches that are not
/// siblings are wrapped at their closest common ancestor. Returns the path of
/// the last wrapper inserted.
pub fn wrap_nodes(
    editor: &mut Editor,
    element: ElementNode,
    options: WrapOptions,
) -> Result<Option<Path>, EditorError> {
    editor.without_normalizing(|editor| wrap(editor, element, options))
}

fn wrap(editor: &mut Editor, element: ElementNode, options: WrapOptions) -> Result<Option<Path>, EditorError> {
    let Some(mut at) = options
        .at
        .clone()
        .or_else(|| editor.selection().cloned().map(Location::Range))
    else {
        return Ok(None);
    };
    if let Location::Range(range) = &at {
        at = Location::Range(query::unhang_range(editor, range, options.voids));
    }

    let inline_wrapper = editor
        .registry()
        .node_spec(&element.kind)
        .is_some_and(|spec| spec.role == NodeRole::Inline);
    let matcher = options.matcher.clone().unwrap_or_else(|| match &at {
        Location::Path(p) => Match::path(p),
        _ if inline_wrapper => {
            let registry = editor.registry_handle();
            Match::predicate(move |node, _| node.is_text() || registry.is_inline(node))
        }
        _ => block_match(editor),
    });
    let mode = options.mode.unwrap_or(Mode::Lowest);

    // An inline wrapper covers exactly the selected text.
    if inline_wrapper
        && let Location::Range(range) = &at
        && range.is_expanded()
    {
        let (start, end) = range.edges();
        let start_ref = editor.point_ref(start.clone());
        let end_ref = editor.point_ref_with(end.clone(), Affinity::Backward);
        for point in [end, start] {
            let always = !query::is_edge(editor, &point, &Location::Path(point.path.clone()));
            split_nodes(
                editor,
                SplitOptions {
                    at: Some(Location::Point(point)),
                    matcher: Some(Match::text()),
                    always,
                    voids: options.voids,
                    ..SplitOptions::default()
                },
            )?;
        }
        let (Some(start), Some(end)) = (start_ref.unref(), end_ref.unref()) else {
            return Ok(None);
        };
        at = Location::Range(Range::new(start, end));
    }

    let roots: Vec<Path> = if inline_wrapper {
        query::get_nodes(
            editor,
            QueryOptions::new()
                .at(at.clone())
                .matcher(block_match(editor))
                .mode(Mode::Lowest)
                .voids(options.voids),
        )
        .map(|(_, p)| p)
        .collect()
    } else {
        vec![Vec::new()]
    };

    let mut wrapper_path = None;
    for root in roots {
        let scope = match &at {
            Location::Range(range) => {
                let Some(root_range) = query::range_of(editor, &Location::Path(root.clone())) else {
                    continue;
                };
                let Some(scope) = range.intersection(&root_range) else {
                    continue;
                };
                Location::Range(scope)
            }
            other => other.clone(),
        };

        let found: Vec<Path> = query::get_nodes(
            editor,
            QueryOptions::new()
                .at(scope)
                .matcher(matcher.clone())
                .mode(mode)
                .voids(options.voids),
        )
        .map(|(_, p)| p)
        .collect();
        let (Some(first), Some(last)) = (found.first(), found.last()) else {
            continue;
        };
        if first.is_empty() || last.is_empty() {
            continue;
        }

        let common = if first == last {
            path::parent(first).unwrap_or_default()
        } else {
            path::common(first, last)
        };
        let Some(range) = query::range_between(
            editor,
            &Location::Path(first.clone()),
            &Location::Path(last.clone()),
        ) else {
            continue;
        };
        let depth = common.len() + 1;
        let Some(target) = path::next(&last[..depth]) else {
            continue;
        };

        let wrapper = ElementNode {
            children: Vec::new(),
            ..element.clone()
        };
        insert_node(editor, &target, Node::Element(wrapper))?;
        let wrapper_ref = editor.path_ref(target.clone());
        let to_ref = editor.path_ref(path::child(&target, 0));

        let moving: Vec<Path> = query::get_nodes(
            editor,
            QueryOptions::new()
                .at(range)
                .matcher(Match::children_of(&common))
                .voids(options.voids),
        )
        .map(|(_, p)| p)
        .filter(|p| *p != target)
        .collect();
        let moving: Vec<_> = moving.into_iter().map(|p| editor.path_ref(p)).collect();
        for r in moving {
            let (Some(from), Some(to)) = (r.unref(), to_ref.current()) else {
                continue;
            };
            move_node(editor, &from, &to)?;
        }

        wrapper_path = wrapper_ref.unref();
        debug!(kind = %element.kind, path = ?wrapper_path, "wrap nodes");
    }
    Ok(wrapper_path)
}

/// Replaces every matched element by its children. Returns how many
/// elements were unwrapped.
pub fn unwrap_nodes(editor: &mut Editor, options: UnwrapOptions) -> Result<usize, EditorError> {
    editor.without_normalizing(|editor| unwrap(editor, options))
}

fn unwrap(editor: &mut Editor, options: UnwrapOptions) -> Result<usize, EditorError> {
    let Some(at) = options
        .at
        .clone()
        .or_else(|| editor.selection().cloned().map(Location::Range))
    else {
        return Ok(0);
    };
    let matcher = options.matcher.clone().unwrap_or_else(|| match &at {
        Location::Path(p) => Match::path(p),
        _ => block_match(editor),
    });
    let scope = match &at {
        Location::Path(_) => match query::range_of(editor, &at) {
            Some(range) => Location::Range(range),
            None => return Ok(0),
        },
        Location::Range(range) => Location::Range(query::unhang_range(editor, range, options.voids)),
        other => other.clone(),
    };

    let found: Vec<Path> = query::get_nodes(
        editor,
        QueryOptions::new()
            .at(scope)
            .matcher(matcher)
            .mode(options.mode.unwrap_or(Mode::Lowest))
            .voids(options.voids),
    )
    .filter(|(node, _)| node.is_element())
    .map(|(_, p)| p)
    .collect();
    let refs: Vec<_> = found.into_iter().map(|p| editor.path_ref(p)).collect();

    let mut unwrapped = 0;
    for r in refs.into_iter().rev() {
        let Some(wrapper) = r.unref() else {
            continue;
        };
        let Some(count) = editor.doc().node(&wrapper).map(|n| n.children().len()) else {
            continue;
        };
        let Some(after) = path::next(&wrapper) else {
            continue;
        };
        for ix in (0..count).rev() {
            move_node(editor, &path::child(&wrapper, ix), &after)?;
        }
        remove_node(editor, &wrapper)?;
        unwrapped += 1;
    }
    debug!(unwrapped, "unwrap nodes");
    Ok(unwrapped)
}
