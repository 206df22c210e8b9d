use tracing::debug;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::node::{ElementNode, Node};
use crate::path;
use crate::plugin::{EditorHandler, Hotkey, Next};
use crate::query::{self, TextUnit};
use crate::transforms::{insert_node, move_children, move_node, remove_node};

use super::queries::{
    ListItemEntry, get_list_item_entry, is_across_list_items, is_list_nested, sublist_path,
};
use super::transforms::{delete_fragment_list, insert_list_item, move_list_item_up, move_list_items};
use super::LI;

pub(super) struct ListHandler;

impl EditorHandler for ListHandler {
    fn id(&self) -> &'static str {
        "list"
    }

    fn delete_backward(
        &self,
        editor: &mut Editor,
        unit: TextUnit,
        next: Next<'_>,
    ) -> Result<(), EditorError> {
        let collapsed = editor.selection().is_some_and(|s| s.is_collapsed());
        let entry = get_list_item_entry(editor, None);
        match entry {
            Some(entry) if collapsed && at_item_start(editor, &entry) => {
                delete_backward_at_item_start(editor, &entry, unit, next)
            }
            _ => next.delete_backward(editor, unit),
        }
    }

    fn delete_fragment(&self, editor: &mut Editor, next: Next<'_>) -> Result<(), EditorError> {
        if is_across_list_items(editor) {
            return delete_fragment_list(editor);
        }
        next.delete_fragment(editor)
    }

    fn insert_break(&self, editor: &mut Editor, next: Next<'_>) -> Result<(), EditorError> {
        if let Some(entry) = get_list_item_entry(editor, None) {
            if query::is_block_above_empty(editor) && move_list_item_up(editor, &entry, true)? {
                return Ok(());
            }
            if insert_list_item(editor)? {
                return Ok(());
            }
        }
        next.insert_break(editor)
    }

    fn key_down(&self, editor: &mut Editor, hotkey: Hotkey) -> Result<bool, EditorError> {
        match hotkey {
            Hotkey::Tab => move_list_items(editor, true),
            Hotkey::ShiftTab => move_list_items(editor, false),
        }
    }
}

/// The cursor sits at the start of the item's first block.
fn at_item_start(editor: &Editor, entry: &ListItemEntry) -> bool {
    let Some(selection) = editor.selection() else {
        return false;
    };
    let block = query::block_path_of(editor, &selection.focus.path);
    block == path::child(&entry.item, 0) && query::is_selection_at_block_start(editor)
}

fn delete_backward_at_item_start(
    editor: &mut Editor,
    entry: &ListItemEntry,
    unit: TextUnit,
    next: Next<'_>,
) -> Result<(), EditorError> {
    let nested = is_list_nested(editor, &entry.list);
    let first = !path::has_previous(&entry.item);

    if first && !nested {
        debug!(item = ?entry.item, "backspace lifts first item");
        move_list_item_up(editor, entry, true)?;
        return Ok(());
    }

    let Some(sub) = sublist_path(editor, &entry.item) else {
        return next.delete_backward(editor, unit);
    };

    if first {
        // First item of a nested list: its sublist items join the parent
        // list right after it before the content merges upward.
        let Some(after) = path::next(&entry.item) else {
            return next.delete_backward(editor, unit);
        };
        move_children(editor, &sub, &after, 0, None)?;
        remove_node(editor, &sub)?;
        return next.delete_backward(editor, unit);
    }

    // A placeholder item holds the sublist while the content merges into the
    // previous item.
    let Some(placeholder) = path::next(&entry.item) else {
        return next.delete_backward(editor, unit);
    };
    let kind = editor
        .doc()
        .element(&sub)
        .map_or_else(|| super::UL.to_string(), |el| el.kind.clone());
    insert_node(editor, &placeholder, ElementNode::new(LI, Vec::new()).into())?;
    let placeholder_ref = editor.path_ref(placeholder.clone());
    move_node(editor, &sub, &path::child(&placeholder, 0))?;

    next.delete_backward(editor, unit)?;

    let Some(placeholder) = placeholder_ref.unref() else {
        return Ok(());
    };
    let moved_list = path::child(&placeholder, 0);
    match path::previous(&placeholder) {
        Some(prev_item) => {
            let target = match sublist_path(editor, &prev_item) {
                Some(target) => target,
                None => {
                    let at = path::child(
                        &prev_item,
                        editor.doc().children_at(&prev_item).map_or(0, <[Node]>::len),
                    );
                    insert_node(editor, &at, Node::element(kind, Vec::new()))?;
                    at
                }
            };
            let len = editor.doc().children_at(&target).map_or(0, <[Node]>::len);
            move_children(editor, &moved_list, &path::child(&target, len), 0, None)?;
        }
        None => {
            let Some(after) = path::next(&placeholder) else {
                return Ok(());
            };
            move_children(editor, &moved_list, &after, 0, None)?;
        }
    }
    remove_node(editor, &placeholder)?;
    debug!("backspace merged item into previous sibling");
    Ok(())
}
