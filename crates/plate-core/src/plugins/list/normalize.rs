use tracing::debug;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::node::{ElementNode, Node};
use crate::path::{self, Path};
use crate::plugin::NormalizePass;
use crate::plugins::element_paths;
use crate::transforms::{insert_node, move_children, move_node, remove_node};

use super::queries::{is_list, is_list_item};
use super::{LI, LIST_KINDS};

/// Keeps lists made of items, and items made of one text block optionally
/// followed by one nested list.
pub(super) struct NormalizeList;

impl NormalizePass for NormalizeList {
    fn id(&self) -> &'static str {
        "list.normalize"
    }

    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        let targets = element_paths(editor.doc(), |el, _| {
            el.kind == LI || LIST_KINDS.contains(&el.kind.as_str())
        });

        let mut repaired = false;
        for at in targets.iter().rev() {
            let Some(is_item) = editor.doc().element(at).map(|el| el.kind == LI) else {
                continue;
            };
            repaired |= if is_item {
                normalize_item(editor, at)?
            } else {
                normalize_list(editor, at)?
            };
        }
        Ok(repaired)
    }
}

fn normalize_list(editor: &mut Editor, at: &[usize]) -> Result<bool, EditorError> {
    let Some(children) = editor.doc().children_at(at) else {
        return Ok(false);
    };
    if children.is_empty() {
        remove_node(editor, at)?;
        debug!(?at, "remove empty list");
        return Ok(true);
    }

    let stray: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|(_, child)| !is_list_item(child))
        .map(|(ix, _)| ix)
        .collect();
    for ix in stray.iter().rev() {
        let child = path::child(at, *ix);
        insert_node(editor, &child, ElementNode::new(LI, Vec::new()).into())?;
        let Some(wrapped) = path::next(&child) else {
            continue;
        };
        move_node(editor, &wrapped, &path::child(&child, 0))?;
    }
    Ok(!stray.is_empty())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ItemChild {
    TextBlock,
    List,
    Inline,
    Void,
    Block,
}

fn classify(editor: &Editor, node: &Node) -> ItemChild {
    if node.is_text() || editor.is_inline(node) {
        ItemChild::Inline
    } else if is_list(node) {
        ItemChild::List
    } else if editor.is_void(node) {
        ItemChild::Void
    } else if editor.is_text_block(node) {
        ItemChild::TextBlock
    } else {
        ItemChild::Block
    }
}

/// Moves the children of `at` out after it and removes it.
fn lift_children(editor: &mut Editor, at: &[usize]) -> Result<(), EditorError> {
    if let Some(after) = path::next(at) {
        move_children(editor, at, &after, 0, None)?;
    }
    remove_node(editor, at)
}

/// One repair per call, the pass runs again until nothing changes.
fn normalize_item(editor: &mut Editor, at: &[usize]) -> Result<bool, EditorError> {
    let Some(list) = path::parent(at) else {
        return Ok(false);
    };
    let in_list = !list.is_empty() && editor.doc().node(&list).is_some_and(is_list);
    if !in_list {
        lift_children(editor, at)?;
        debug!(?at, "unwrap list item outside a list");
        return Ok(true);
    }

    let kinds: Vec<ItemChild> = editor
        .doc()
        .children_at(at)
        .unwrap_or_default()
        .iter()
        .map(|child| classify(editor, child))
        .collect();
    if kinds.first() != Some(&ItemChild::TextBlock) {
        insert_node(editor, &path::child(at, 0), Node::paragraph(""))?;
        return Ok(true);
    }

    let first: Path = path::child(at, 0);
    let mut sublist: Option<usize> = None;
    for (ix, kind) in kinds.iter().enumerate().skip(1) {
        let child = path::child(at, ix);
        match kind {
            ItemChild::Inline => {
                let to = path::child(&first, child_len(editor, &first));
                move_node(editor, &child, &to)?;
            }
            ItemChild::TextBlock => {
                let to = path::child(&first, child_len(editor, &first));
                move_children(editor, &child, &to, 0, None)?;
                remove_node(editor, &child)?;
            }
            ItemChild::List => match sublist {
                None => {
                    sublist = Some(ix);
                    continue;
                }
                Some(first_sub) => {
                    let sub = path::child(at, first_sub);
                    let to = path::child(&sub, child_len(editor, &sub));
                    move_children(editor, &child, &to, 0, None)?;
                    remove_node(editor, &child)?;
                }
            },
            ItemChild::Void => {
                let Some(after_list) = path::next(&list) else {
                    continue;
                };
                move_node(editor, &child, &after_list)?;
            }
            ItemChild::Block => lift_children(editor, &child)?,
        }
        debug!(item = ?at, child = ix, "repair list item");
        return Ok(true);
    }
    Ok(false)
}

fn child_len(editor: &Editor, at: &[usize]) -> usize {
    editor.doc().children_at(at).map_or(0, <[Node]>::len)
}
