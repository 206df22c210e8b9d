use std::ops::Range as TextRange;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::location::{Affinity, Point, Range};
use crate::node::{Attrs, Document, ElementKind, ElementNode, Node, TextNode};
use crate::path::{self, Path};

/// Low-level document operation. Every structural edit is expressed as a
/// sequence of these, and refs/selection are transformed through each one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        range: TextRange<usize>,
    },
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    /// Merges the node at `path` into its previous sibling. `position` is the
    /// previous sibling's text length or child count before the merge.
    MergeNode {
        #[serde(default)]
        path: Path,
        position: usize,
    },
    /// Splits the node at `path`; the tail becomes a new next sibling carrying
    /// `properties` as its attributes (or marks).
    SplitNode {
        #[serde(default)]
        path: Path,
        position: usize,
        #[serde(default)]
        properties: Attrs,
    },
    MoveNode {
        #[serde(default)]
        path: Path,
        new_path: Path,
    },
    SetNode {
        #[serde(default)]
        path: Path,
        patch: AttrPatch,
    },
}

impl Op {
    pub fn path(&self) -> &[usize] {
        match self {
            Op::InsertText { path, .. }
            | Op::RemoveText { path, .. }
            | Op::InsertNode { path, .. }
            | Op::RemoveNode { path }
            | Op::MergeNode { path, .. }
            | Op::SplitNode { path, .. }
            | Op::MoveNode { path, .. }
            | Op::SetNode { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set.insert(key.into(), value.into());
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.remove.push(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.set.is_empty() && self.remove.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Range>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            selection_after: None,
            meta: TransactionMeta::default(),
        }
    }

    pub fn selection_after(mut self, selection_after: Range) -> Self {
        self.selection_after = Some(selection_after);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }
}

pub(crate) fn apply_op_to(doc: &mut Document, op: &Op) -> Result<(), EditorError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let text_node = text_mut(doc, path)?;
            let offset = clamp_to_char_boundary(&text_node.text, *offset);
            text_node.text.insert_str(offset, text);
        }
        Op::RemoveText { path, range } => {
            let text_node = text_mut(doc, path)?;
            let start = clamp_to_char_boundary(&text_node.text, range.start);
            let end = clamp_to_char_boundary(&text_node.text, range.end);
            if start < end {
                text_node.text.replace_range(start..end, "");
            }
        }
        Op::InsertNode { path, node } => insert_node(doc, path, node.clone())?,
        Op::RemoveNode { path } => {
            remove_node(doc, path)?;
        }
        Op::MergeNode { path, .. } => {
            let prev_path = path::previous(path)
                .ok_or_else(|| EditorError::invalid_path(path, "No previous sibling to merge"))?;
            let compatible = matches!(
                (doc.node(&prev_path), doc.node(path)),
                (Some(Node::Text(_)), Some(Node::Text(_)))
                    | (Some(Node::Element(_)), Some(Node::Element(_)))
            );
            if !compatible {
                return Err(EditorError::invalid_path(path, "Merge of mismatched nodes"));
            }
            let node = remove_node(doc, path)?;
            match (doc.node_mut(&prev_path), node) {
                (Some(Node::Text(prev)), Node::Text(t)) => prev.text.push_str(&t.text),
                (Some(Node::Element(prev)), Node::Element(el)) => prev.children.extend(el.children),
                _ => return Err(EditorError::invalid_path(path, "Merge target vanished")),
            }
        }
        Op::SplitNode {
            path,
            position,
            properties,
        } => {
            let node = doc
                .node_mut(path)
                .ok_or_else(|| EditorError::invalid_path(path, "Split target not found"))?;
            let tail = match node {
                Node::Text(t) => {
                    let at = clamp_to_char_boundary(&t.text, *position);
                    Node::Text(TextNode {
                        text: t.text.split_off(at),
                        marks: properties.clone(),
                    })
                }
                Node::Element(el) => {
                    if *position > el.children.len() {
                        return Err(EditorError::invalid_path(
                            path,
                            format!(
                                "Split position out of bounds: {position} > {}",
                                el.children.len()
                            ),
                        ));
                    }
                    Node::Element(ElementNode {
                        kind: el.kind.clone(),
                        children: el.children.split_off(*position),
                        attrs: properties.clone(),
                    })
                }
            };
            let next = path::next(path)
                .ok_or_else(|| EditorError::invalid_path(path, "Cannot split the root"))?;
            insert_node(doc, &next, tail)?;
        }
        Op::MoveNode { path, new_path } => {
            if path == new_path {
                return Ok(());
            }
            if path::is_ancestor(path, new_path) {
                return Err(EditorError::MoveIntoItself {
                    path: path.clone(),
                    new_path: new_path.clone(),
                });
            }
            let true_path = transform_path(path, op, Affinity::Forward)
                .ok_or_else(|| EditorError::invalid_path(path, "Move target unresolved"))?;
            let node = remove_node(doc, path)?;
            if let Err(err) = insert_node(doc, &true_path, node.clone()) {
                insert_node(doc, path, node)?;
                return Err(err);
            }
        }
        Op::SetNode { path, patch } => {
            let node = doc
                .node_mut(path)
                .ok_or_else(|| EditorError::invalid_path(path, "Set target not found"))?;
            if let Some(kind) = &patch.kind {
                match node {
                    Node::Element(el) => el.kind = kind.clone(),
                    Node::Text(_) => {
                        return Err(EditorError::invalid_path(path, "Text has no type"));
                    }
                }
            }
            patch_apply(node.props_mut(), patch);
        }
    }
    Ok(())
}

fn text_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut TextNode, EditorError> {
    match doc.node_mut(path) {
        Some(Node::Text(t)) => Ok(t),
        Some(Node::Element(_)) => Err(EditorError::invalid_path(path, "Expected Text node")),
        None => Err(EditorError::invalid_path(path, "Text node not found")),
    }
}

fn insert_node(doc: &mut Document, path: &[usize], node: Node) -> Result<(), EditorError> {
    let (index, parent_path) = path
        .split_last()
        .ok_or_else(|| EditorError::invalid_path(path, "Empty insert path"))?;
    let children = doc
        .children_at_mut(parent_path)
        .ok_or_else(|| EditorError::invalid_path(path, "Insert parent is not a container"))?;
    if *index > children.len() {
        return Err(EditorError::invalid_path(
            path,
            format!("Insert index out of bounds: {index} > {}", children.len()),
        ));
    }
    children.insert(*index, node);
    Ok(())
}

fn remove_node(doc: &mut Document, path: &[usize]) -> Result<Node, EditorError> {
    let (index, parent_path) = path
        .split_last()
        .ok_or_else(|| EditorError::invalid_path(path, "Empty remove path"))?;
    let children = doc
        .children_at_mut(parent_path)
        .ok_or_else(|| EditorError::invalid_path(path, "Remove parent is not a container"))?;
    if *index >= children.len() {
        return Err(EditorError::invalid_path(
            path,
            format!("Remove index out of bounds: {index} >= {}", children.len()),
        ));
    }
    Ok(children.remove(*index))
}

fn patch_apply(attrs: &mut Attrs, patch: &AttrPatch) {
    for (k, v) in &patch.set {
        attrs.insert(k.clone(), v.clone());
    }
    for key in &patch.remove {
        attrs.remove(key);
    }
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

/// Where `target` ends up after `op` is applied; `None` when it was removed.
pub fn transform_path(target: &[usize], op: &Op, affinity: Affinity) -> Option<Path> {
    let mut p = target.to_vec();
    if p.is_empty() {
        return Some(p);
    }

    match op {
        Op::InsertNode { path: op_path, .. } => {
            if op_path.as_slice() == p.as_slice()
                || path::ends_before(op_path, &p)
                || path::is_ancestor(op_path, &p)
            {
                p[op_path.len() - 1] += 1;
            }
        }
        Op::RemoveNode { path: op_path } => {
            if op_path.as_slice() == p.as_slice() || path::is_ancestor(op_path, &p) {
                return None;
            } else if path::ends_before(op_path, &p) {
                p[op_path.len() - 1] -= 1;
            }
        }
        Op::MergeNode {
            path: op_path,
            position,
        } => {
            if op_path.as_slice() == p.as_slice() || path::ends_before(op_path, &p) {
                p[op_path.len() - 1] -= 1;
            } else if path::is_ancestor(op_path, &p) {
                p[op_path.len() - 1] -= 1;
                p[op_path.len()] += position;
            }
        }
        Op::SplitNode {
            path: op_path,
            position,
            ..
        } => {
            if op_path.as_slice() == p.as_slice() {
                if affinity == Affinity::Forward {
                    let last = p.len() - 1;
                    p[last] += 1;
                }
            } else if path::ends_before(op_path, &p) {
                p[op_path.len() - 1] += 1;
            } else if path::is_ancestor(op_path, &p) && target[op_path.len()] >= *position {
                p[op_path.len() - 1] += 1;
                p[op_path.len()] -= position;
            }
        }
        Op::MoveNode {
            path: op_path,
            new_path: onp,
        } => {
            if op_path == onp {
                return Some(p);
            }
            if path::is_common(op_path, &p) {
                let mut copy = onp.clone();
                if path::ends_before(op_path, onp) && op_path.len() < onp.len() {
                    copy[op_path.len() - 1] -= 1;
                }
                copy.extend_from_slice(&p[op_path.len()..]);
                return Some(copy);
            } else if path::is_sibling(op_path, onp) && path::is_common(onp, &p) {
                if path::ends_before(op_path, &p) {
                    p[op_path.len() - 1] -= 1;
                } else {
                    p[op_path.len() - 1] += 1;
                }
            } else if path::ends_before(onp, &p) || path::is_common(onp, &p) {
                if path::ends_before(op_path, &p) {
                    p[op_path.len() - 1] -= 1;
                }
                p[onp.len() - 1] += 1;
            } else if path::ends_before(op_path, &p) {
                if onp.as_slice() == p.as_slice() {
                    p[onp.len() - 1] += 1;
                }
                p[op_path.len() - 1] -= 1;
            }
        }
        Op::InsertText { .. } | Op::RemoveText { .. } | Op::SetNode { .. } => {}
    }

    Some(p)
}

/// Where `point` ends up after `op` is applied; `None` when its text was removed.
pub fn transform_point(point: &Point, op: &Op, affinity: Affinity) -> Option<Point> {
    let mut path = point.path.clone();
    let mut offset = point.offset;

    match op {
        Op::InsertText {
            path: op_path,
            offset: op_offset,
            text,
        } => {
            if *op_path == path
                && (*op_offset < offset
                    || (*op_offset == offset && affinity == Affinity::Forward))
            {
                offset += text.len();
            }
        }
        Op::RemoveText {
            path: op_path,
            range,
        } => {
            if *op_path == path && range.start <= offset {
                let len = range.end.saturating_sub(range.start);
                offset -= (offset - range.start).min(len);
            }
        }
        Op::MergeNode {
            path: op_path,
            position,
        } => {
            if *op_path == path {
                offset += position;
            }
            path = transform_path(&path, op, affinity)?;
        }
        Op::SplitNode {
            path: op_path,
            position,
            ..
        } => {
            if *op_path == path {
                if *position < offset || (*position == offset && affinity == Affinity::Forward) {
                    offset -= position;
                    path = transform_path(&path, op, Affinity::Forward)?;
                } else {
                    path = transform_path(&path, op, Affinity::Backward)?;
                }
            } else {
                path = transform_path(&path, op, affinity)?;
            }
        }
        _ => {
            path = transform_path(&path, op, affinity)?;
        }
    }

    Some(Point { path, offset })
}
