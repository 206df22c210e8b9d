use std::sync::Arc;

use tracing::debug;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::location::{Edge, Location, Point, Range};
use crate::matcher::Match;
use crate::node::{ElementNode, Node};
use crate::ops::AttrPatch;
use crate::path::{self, Path};
use crate::query::{self, QueryOptions};
use crate::refs::PathRef;
use crate::transforms::{
    DeleteOptions, MergeHooks, SplitOptions, WrapOptions, collapse, delete_fragment, insert_node,
    move_children, move_node, remove_node, select, set_nodes, split_nodes, wrap_nodes,
};

use super::queries::{
    ListItemEntry, get_list_item_entry, highest_empty_list, is_list, is_list_item, is_list_nested,
    selected_list_items, sublist_path,
};
use super::LI;

fn child_count(editor: &Editor, at: &[usize]) -> usize {
    editor.doc().children_at(at).map_or(0, <[Node]>::len)
}

fn list_kind(editor: &Editor, list: &[usize]) -> Option<String> {
    editor.doc().element(list).map(|el| el.kind.clone())
}

/// Sublist of the item at `item`, created empty at the end of the item when
/// missing.
fn ensure_sublist(editor: &mut Editor, item: &[usize], kind: &str) -> Result<Path, EditorError> {
    if let Some(sub) = sublist_path(editor, item) {
        return Ok(sub);
    }
    let at = path::child(item, child_count(editor, item));
    insert_node(editor, &at, Node::element(kind, Vec::new()))?;
    Ok(at)
}

/// Nests the item under its previous sibling, at the end of that sibling's
/// sublist. A first item has no previous sibling and stays put.
pub fn move_list_item_down(editor: &mut Editor, entry: &ListItemEntry) -> Result<bool, EditorError> {
    let Some(prev_item) = path::previous(&entry.item) else {
        return Ok(false);
    };
    let Some(kind) = list_kind(editor, &entry.list) else {
        return Ok(false);
    };

    editor.without_normalizing(|editor| {
        let sub = ensure_sublist(editor, &prev_item, &kind)?;
        let to = path::child(&sub, child_count(editor, &sub));
        move_node(editor, &entry.item, &to)?;
        debug!(item = ?entry.item, ?to, "list item down");
        Ok(true)
    })
}

/// Lifts the item one level. A nested item takes its following siblings
/// along as its own sublist and lands after its parent item. A top-level
/// item (only with `allow_top_level`) leaves the list: its content becomes
/// plain blocks between two halves of the list.
pub fn move_list_item_up(
    editor: &mut Editor,
    entry: &ListItemEntry,
    allow_top_level: bool,
) -> Result<bool, EditorError> {
    let ListItemEntry { list, item } = entry;
    let Some(kind) = list_kind(editor, list) else {
        return Ok(false);
    };
    let Some(item_ix) = path::last_index(item) else {
        return Ok(false);
    };
    let nested = is_list_nested(editor, list);
    if !nested && !allow_top_level {
        return Ok(false);
    }

    editor.without_normalizing(|editor| {
        let count = child_count(editor, list);

        if nested {
            let Some(parent_item) = path::parent(list) else {
                return Ok(false);
            };
            if item_ix + 1 < count {
                let sub = ensure_sublist(editor, item, &kind)?;
                let to = path::child(&sub, child_count(editor, &sub));
                move_children(editor, list, &to, item_ix + 1, None)?;
            }
            let Some(to) = path::next(&parent_item) else {
                return Ok(false);
            };
            move_node(editor, item, &to)?;
            if child_count(editor, list) == 0 {
                remove_node(editor, list)?;
            }
            debug!(?item, ?to, "list item up");
            return Ok(true);
        }

        let Some(after_list) = path::next(list) else {
            return Ok(false);
        };
        let sub = sublist_path(editor, item);
        if sub.is_some() || item_ix + 1 < count {
            insert_node(editor, &after_list, Node::element(kind.as_str(), Vec::new()))?;
            if let Some(sub) = sub {
                move_children(editor, &sub, &path::child(&after_list, 0), 0, None)?;
                remove_node(editor, &sub)?;
            }
            let to = path::child(&after_list, child_count(editor, &after_list));
            move_children(editor, list, &to, item_ix + 1, None)?;
        }
        move_children(editor, item, &after_list, 0, None)?;
        remove_node(editor, item)?;
        if child_count(editor, list) == 0 {
            remove_node(editor, list)?;
        }
        debug!(?item, "list item out of list");
        Ok(true)
    })
}

/// Indents (`increase`) or outdents every selected item. Returns whether the
/// selection touched a list at all.
pub fn move_list_items(editor: &mut Editor, increase: bool) -> Result<bool, EditorError> {
    let entries = selected_list_items(editor);
    if entries.is_empty() {
        return Ok(false);
    }
    let allow_top_level = editor.config().list.reset_on_shift_tab;

    editor.without_normalizing(|editor| {
        let mut refs: Vec<PathRef> = entries
            .iter()
            .map(|entry| editor.path_ref(entry.item.clone()))
            .collect();
        if !increase {
            refs.reverse();
        }
        for item_ref in refs {
            let Some(item) = item_ref.unref() else {
                continue;
            };
            let Some(list) = path::parent(&item) else {
                continue;
            };
            let entry = ListItemEntry { list, item };
            if increase {
                move_list_item_down(editor, &entry)?;
            } else {
                move_list_item_up(editor, &entry, allow_top_level)?;
            }
        }
        Ok(true)
    })
}

/// Enter inside an item whose first block holds the cursor. Returns `false`
/// when the cursor is somewhere else.
pub fn insert_list_item(editor: &mut Editor) -> Result<bool, EditorError> {
    let Some(entry) = get_list_item_entry(editor, None) else {
        return Ok(false);
    };
    let Some(selection) = editor.selection().cloned() else {
        return Ok(false);
    };
    let block = query::block_path_of(editor, &selection.focus.path);
    if path::parent(&block).as_ref() != Some(&entry.item) || path::last_index(&block) != Some(0) {
        return Ok(false);
    }
    let Some(next_item) = path::next(&entry.item) else {
        return Ok(false);
    };
    let Some(next_block) = path::next(&block) else {
        return Ok(false);
    };

    editor.without_normalizing(|editor| {
        if selection.is_expanded() {
            delete_fragment(editor, DeleteOptions::default())?;
        }
        let Some(focus) = editor.selection().map(|s| s.focus.clone()) else {
            return Ok(false);
        };
        let block_at = Location::Path(block.clone());

        if query::is_start(editor, &focus, &block_at) {
            let fresh = ElementNode::new(LI, vec![Node::paragraph("")]);
            insert_node(editor, &entry.item, fresh.into())?;
            return Ok(true);
        }

        let rest = query::end(editor, &block_at)
            .map(|end| query::string(editor, &Location::Range(Range::new(focus.clone(), end))))
            .unwrap_or_default();
        if rest.is_empty() {
            let fresh = ElementNode::new(LI, vec![Node::paragraph("")]);
            insert_node(editor, &next_item, fresh.into())?;
            select(editor, Point::new(path::child(&path::child(&next_item, 0), 0), 0));
        } else {
            split_nodes(
                editor,
                SplitOptions {
                    always: true,
                    ..SplitOptions::default()
                },
            )?;
            wrap_nodes(
                editor,
                ElementNode::new(LI, Vec::new()),
                WrapOptions::at(next_block.clone()),
            )?;
            move_node(editor, &next_block, &next_item)?;
            select(editor, next_item.clone());
            collapse(editor, Edge::Start);
        }

        if child_count(editor, &entry.item) > 1 {
            move_node(editor, &next_block, &path::child(&next_item, 1))?;
        }
        debug!(item = ?next_item, "insert list item");
        Ok(true)
    })
}

/// Turns the selected blocks into a list of `kind`, switches lists of
/// another kind over, or lifts the items out when they are all in a `kind`
/// list already.
pub fn toggle_list(editor: &mut Editor, kind: &str) -> Result<(), EditorError> {
    let Some(selection) = editor.selection().cloned() else {
        return Err(EditorError::NoSelection);
    };
    let registry = editor.registry_handle();
    let blocks: Vec<Path> = query::get_nodes(
        editor,
        QueryOptions::new()
            .at(selection.clone())
            .matcher(Match::predicate(move |node, _| registry.is_text_block(node))),
    )
    .map(|(_, p)| p)
    .collect();
    if blocks.is_empty() {
        return Ok(());
    }

    let entries: Vec<Option<ListItemEntry>> = blocks
        .iter()
        .map(|block| get_list_item_entry(editor, Some(Location::Path(block.clone()))))
        .collect();

    editor.without_normalizing(|editor| {
        if entries.iter().all(Option::is_some) {
            let entries: Vec<ListItemEntry> = entries.into_iter().flatten().collect();
            let same_kind = entries
                .iter()
                .all(|entry| list_kind(editor, &entry.list).as_deref() == Some(kind));
            if same_kind {
                return unwrap_blocks(editor, &blocks);
            }
            let mut lists: Vec<Path> = entries.into_iter().map(|e| e.list).collect();
            lists.dedup();
            for list in lists {
                set_nodes(
                    editor,
                    AttrPatch::kind(kind),
                    QueryOptions::new().at(list.clone()).matcher(Match::path(&list)),
                )?;
            }
            debug!(kind, "switch list kind");
            return Ok(());
        }

        let outside_list = Match::predicate({
            let registry = editor.registry_handle();
            let doc_items: Vec<Path> = blocks
                .iter()
                .zip(&entries)
                .filter(|(_, entry)| entry.is_none())
                .map(|(block, _)| block.clone())
                .collect();
            move |node, path| registry.is_text_block(node) && doc_items.iter().any(|p| p == path)
        });
        let Some(wrapper) = wrap_nodes(
            editor,
            ElementNode::new(kind, Vec::new()),
            WrapOptions::at(selection).matcher(outside_list),
        )?
        else {
            return Ok(());
        };
        for ix in (0..child_count(editor, &wrapper)).rev() {
            let child = path::child(&wrapper, ix);
            let wrapped = editor.doc().node(&child).is_some_and(is_list_item);
            if !wrapped {
                wrap_nodes(editor, ElementNode::new(LI, Vec::new()), WrapOptions::at(child))?;
            }
        }
        debug!(kind, list = ?wrapper, "wrap in list");
        Ok(())
    })
}

/// Lifts each block's item all the way out of its lists.
fn unwrap_blocks(editor: &mut Editor, blocks: &[Path]) -> Result<(), EditorError> {
    let refs: Vec<PathRef> = blocks.iter().rev().map(|b| editor.path_ref(b.clone())).collect();
    for block_ref in refs {
        while let Some(block) = block_ref.current()
            && let Some(entry) = get_list_item_entry(editor, Some(Location::Path(block)))
        {
            if !move_list_item_up(editor, &entry, true)? {
                break;
            }
        }
    }
    Ok(())
}

/// Lifts the item holding the selection out of every list.
pub fn unwrap_list(editor: &mut Editor) -> Result<(), EditorError> {
    let Some(selection) = editor.selection().cloned() else {
        return Ok(());
    };
    let block = query::block_path_of(editor, &selection.focus.path);
    editor.without_normalizing(|editor| unwrap_blocks(editor, &[block]))
}

/// Merge hooks for deletes spanning items: the tail block's children are
/// appended to the head block and the tail block is dropped.
pub fn list_merge_hooks() -> MergeHooks {
    MergeHooks {
        merge_node: Some(Arc::new(|editor: &mut Editor, at: &[usize], to: &[usize]| {
            let end = path::child(to, child_count(editor, to));
            move_children(editor, at, &end, 0, None)?;
            remove_node(editor, at)
        })),
        remove_empty_ancestor: None,
    }
}

/// Deletes a selection spanning list items, then drops the lists the delete
/// left with a single child.
pub fn delete_fragment_list(editor: &mut Editor) -> Result<(), EditorError> {
    let Some(selection) = editor.selection().cloned() else {
        return Ok(());
    };
    let (start, end) = selection.edges();

    editor.without_normalizing(|editor| {
        let end_item = get_list_item_entry(editor, Some(Location::Point(end)))
            .filter(|entry| sublist_path(editor, &entry.item).is_none());
        let end_ref = end_item.map(|entry| editor.path_ref(entry.item));

        delete_fragment(
            editor,
            DeleteOptions {
                reverse: true,
                ..DeleteOptions::default()
            }
            .hooks(list_merge_hooks()),
        )?;

        let Some(item) = end_ref.and_then(PathRef::unref) else {
            return Ok(());
        };
        let point = editor.selection().map_or(start, |s| s.anchor.clone());
        let keep = get_list_item_entry(editor, Some(Location::Point(point))).map(|entry| entry.list);
        if let Some(target) = highest_empty_list(editor, &item, keep.as_deref()) {
            let removable = editor
                .doc()
                .node(&target)
                .is_some_and(|node| is_list(node) || node.string().is_empty());
            if removable {
                remove_node(editor, &target)?;
                debug!(?target, "drop emptied list");
            }
        }
        Ok(())
    })
}
