use crate::editor::Editor;
use crate::location::Location;
use crate::matcher::Match;
use crate::node::Node;
use crate::path::{self, Path};
use crate::query::{self, AboveOptions, QueryOptions};

use super::{LI, LIST_KINDS};

/// A list item together with the list holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemEntry {
    pub list: Path,
    pub item: Path,
}

pub fn is_list(node: &Node) -> bool {
    node.kind().is_some_and(|kind| LIST_KINDS.contains(&kind))
}

pub fn is_list_item(node: &Node) -> bool {
    node.kind() == Some(LI)
}

/// Closest list item above `at` (the selection focus by default) whose
/// parent is a list.
pub fn get_list_item_entry(editor: &Editor, at: Option<Location>) -> Option<ListItemEntry> {
    let at = match at {
        Some(Location::Range(range)) => Location::Point(range.focus),
        Some(at) => at,
        None => Location::Point(editor.selection()?.focus.clone()),
    };
    let (_, item) = query::get_above(editor, AboveOptions::new().at(at).matcher(Match::kind(LI)))?;
    let list = path::parent(&item)?;
    let is_list_parent = editor.doc().node(&list).is_some_and(is_list);
    is_list_parent.then_some(ListItemEntry { list, item })
}

/// Path of the nested list inside the item at `item`, if it has one.
pub fn sublist_path(editor: &Editor, item: &[usize]) -> Option<Path> {
    let children = editor.doc().children_at(item)?;
    children
        .iter()
        .skip(1)
        .position(is_list)
        .map(|ix| path::child(item, ix + 1))
}

pub fn has_list_child(editor: &Editor, item: &[usize]) -> bool {
    sublist_path(editor, item).is_some()
}

/// A list whose parent is a list item.
pub fn is_list_nested(editor: &Editor, list: &[usize]) -> bool {
    path::parent(list)
        .filter(|parent| !parent.is_empty())
        .and_then(|parent| editor.doc().node(&parent))
        .is_some_and(is_list_item)
}

/// Kind of the list holding the selection focus.
pub fn active_list_kind(editor: &Editor) -> Option<String> {
    let entry = get_list_item_entry(editor, None)?;
    editor
        .doc()
        .element(&entry.list)
        .map(|el| el.kind.clone())
}

/// The selection is expanded across more than one block and touches at
/// least one list item.
pub fn is_across_list_items(editor: &Editor) -> bool {
    let Some(selection) = editor.selection() else {
        return false;
    };
    if selection.is_collapsed() {
        return false;
    }
    let (start, end) = selection.edges();
    let start_block = query::block_path_of(editor, &start.path);
    let end_block = query::block_path_of(editor, &end.path);
    if start_block == end_block {
        return false;
    }
    query::some_node(
        editor,
        QueryOptions::new()
            .at(selection.clone())
            .matcher(Match::kind(LI)),
    )
}

/// Items whose first block lies in the selection, without items nested in
/// another collected one. Document order.
pub fn selected_list_items(editor: &Editor) -> Vec<ListItemEntry> {
    let Some(selection) = editor.selection().cloned() else {
        return Vec::new();
    };
    let registry = editor.registry_handle();
    let blocks: Vec<Path> = query::get_nodes(
        editor,
        QueryOptions::new()
            .at(selection)
            .matcher(Match::predicate(move |node, _| registry.is_text_block(node))),
    )
    .map(|(_, p)| p)
    .collect();

    let mut out: Vec<ListItemEntry> = Vec::new();
    for block in blocks {
        if path::last_index(&block) != Some(0) {
            continue;
        }
        let Some(item) = path::parent(&block) else {
            continue;
        };
        let Some(entry) = get_list_item_entry(editor, Some(Location::Path(block))) else {
            continue;
        };
        if entry.item != item {
            continue;
        }
        if out.iter().any(|seen| path::is_ancestor(&seen.item, &item)) {
            continue;
        }
        out.push(entry);
    }
    out
}

/// Removal target after a cross-item delete: the highest list, starting at
/// the one holding `item`, with fewer than two children and not equal to
/// `keep`. The item itself when its list still has siblings for it.
pub fn highest_empty_list(editor: &Editor, item: &[usize], keep: Option<&[usize]>) -> Option<Path> {
    let doc = editor.doc();
    let qualifies = |list: &[usize]| {
        keep != Some(list) && doc.node(list).is_some_and(|n| is_list(n) && n.children().len() < 2)
    };

    let list = path::parent(item)?;
    if keep == Some(list.as_slice()) || !doc.node(&list).is_some_and(is_list) {
        return None;
    }
    if !qualifies(&list) {
        return Some(item.to_vec());
    }

    let mut highest = list;
    while let Some(parent_item) = path::parent(&highest).filter(|p| !p.is_empty())
        && doc.node(&parent_item).is_some_and(is_list_item)
        && let Some(parent_list) = path::parent(&parent_item)
        && qualifies(&parent_list)
    {
        highest = parent_list;
    }
    Some(highest)
}
