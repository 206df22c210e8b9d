use serde_json::Value;
use tracing::debug;

use crate::editor::Editor;
use crate::error::{CommandError, EditorError};
use crate::location::{Point, Range};
use crate::node::{ElementNode, Node, PARAGRAPH};
use crate::ops::{Op, Transaction};
use crate::path::{self, Path};
use crate::plugin::{ChildConstraint, CommandSpec, NodeSpec, NormalizePass, PlatePlugin, QuerySpec};
use crate::plugins::{element_paths, selection_or_err};
use crate::query::{self, AboveOptions};

/// Paragraphs and the structural rules every document follows.
pub struct CorePlugin;

impl PlatePlugin for CorePlugin {
    fn id(&self) -> &'static str {
        "core"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(PARAGRAPH)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(EnsureElementHasChild),
            Box::new(RemoveInlinesAmongBlocks),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("core.insert_paragraph", "Insert paragraph", |editor, _args| {
                let selection = selection_or_err(editor)?;
                let block = query::get_block_above(editor, AboveOptions::new().at(selection.focus.path.clone())).1;
                let top = block.first().copied().unwrap_or_default();
                let at = vec![top + 1];

                let tx = Transaction::new(vec![Op::InsertNode {
                    path: at.clone(),
                    node: Node::paragraph(""),
                }])
                .selection_after(Range::collapsed(Point::new(path::child(&at, 0), 0)))
                .source("command:core.insert_paragraph");
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("Failed to insert paragraph: {e}")))
            })
            .description("Insert an empty paragraph after the current top-level block.")
            .keywords(["paragraph", "new line", "block"]),
            CommandSpec::new("core.insert_break", "Insert break", |editor, _args| {
                editor.insert_break().map_err(CommandError::from)
            })
            .description("Split the current block at the cursor.")
            .hidden(true),
            CommandSpec::new("core.insert_text", "Insert text", |editor, args| {
                let text = crate::plugins::arg_str(&args, "text").unwrap_or_default().to_string();
                editor.insert_text(&text).map_err(CommandError::from)
            })
            .args_example(serde_json::json!({ "text": "hello" }))
            .hidden(true),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("core.block_type", |editor, _args| {
            let (block, path) = query::get_block_above(editor, AboveOptions::new());
            if path.is_empty() {
                return Ok(Value::Null);
            }
            Ok(block
                .element()
                .map_or(Value::Null, |el| Value::String(el.kind.clone())))
        })]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        if !editor.doc().children.is_empty() {
            return Ok(false);
        }
        editor.apply_op(Op::InsertNode {
            path: vec![0],
            node: Node::paragraph(""),
        })?;
        Ok(true)
    }
}

/// Every element keeps at least one child: a container gets its default
/// child element, anything else an empty text leaf.
struct EnsureElementHasChild;

impl NormalizePass for EnsureElementHasChild {
    fn id(&self) -> &'static str {
        "core.ensure_element_has_child"
    }

    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        let registry = editor.registry_handle();
        let empty: Vec<_> = element_paths(editor.doc(), |el, _| el.children.is_empty())
            .into_iter()
            .map(|p| {
                let child = editor
                    .doc()
                    .element(&p)
                    .and_then(|el| registry.node_spec(&el.kind))
                    .filter(|spec| spec.children == ChildConstraint::BlockOnly)
                    .map(|spec| {
                        let kind = spec.default_child.as_deref().unwrap_or(PARAGRAPH);
                        Node::element(kind, Vec::new())
                    })
                    .unwrap_or_else(|| Node::text(""));
                (p, child)
            })
            .collect();

        let repaired = !empty.is_empty();
        for (p, child) in empty.into_iter().rev() {
            debug!(path = ?p, "fill empty element");
            editor.apply_op(Op::InsertNode {
                path: path::child(&p, 0),
                node: child,
            })?;
        }
        Ok(repaired)
    }
}

/// Elements holding blocks keep only blocks: text and inline children
/// mixed in with them are removed.
struct RemoveInlinesAmongBlocks;

impl NormalizePass for RemoveInlinesAmongBlocks {
    fn id(&self) -> &'static str {
        "core.remove_inlines_among_blocks"
    }

    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        let registry = editor.registry_handle();
        let holds_blocks = |el: &ElementNode| {
            let keeps_inlines = registry
                .node_spec(&el.kind)
                .is_some_and(|spec| spec.children != ChildConstraint::BlockOnly);
            !keeps_inlines && el.children.iter().any(|child| registry.is_block(child))
        };

        let mut doomed: Vec<Path> = Vec::new();
        for parent in element_paths(editor.doc(), |el, _| holds_blocks(el)) {
            let Some(children) = editor.doc().children_at(&parent) else {
                continue;
            };
            doomed.extend(
                children
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| child.is_text() || registry.is_inline(child))
                    .map(|(ix, _)| path::child(&parent, ix)),
            );
        }

        for at in doomed.iter().rev() {
            debug!(path = ?at, "remove inline among blocks");
            editor.apply_op(Op::RemoveNode { path: at.clone() })?;
        }
        Ok(!doomed.is_empty())
    }
}

/// Adjacent texts with equal marks become one; an empty text next to another
/// text is dropped.
struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        let parents = element_paths(editor.doc(), |el, _| {
            el.children
                .windows(2)
                .any(|pair| pair[0].is_text() && pair[1].is_text())
        });

        let mut repaired = false;
        for parent in parents.iter().rev() {
            let mut ix = editor.doc().children_at(parent).map_or(0, <[Node]>::len);
            while ix > 1 {
                ix -= 1;
                let Some(children) = editor.doc().children_at(parent) else {
                    break;
                };
                let (Some(Node::Text(left)), Some(Node::Text(right))) =
                    (children.get(ix - 1), children.get(ix))
                else {
                    continue;
                };

                let op = if left.marks == right.marks {
                    Op::MergeNode {
                        path: path::child(parent, ix),
                        position: left.text.len(),
                    }
                } else if right.text.is_empty() {
                    Op::RemoveNode {
                        path: path::child(parent, ix),
                    }
                } else if left.text.is_empty() {
                    Op::RemoveNode {
                        path: path::child(parent, ix - 1),
                    }
                } else {
                    continue;
                };
                editor.apply_op(op)?;
                repaired = true;
            }
        }
        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Document, TextNode};
    use crate::plugin::PluginRegistry;

    #[test]
    fn text_leaves_merge_and_empty_leaves_drop() {
        let bold = TextNode::new("b").with_mark("bold", true);
        let doc = Document::new(vec![Node::element(
            PARAGRAPH,
            vec![
                Node::text("a"),
                Node::text("b"),
                Node::Text(TextNode::new("").with_mark("italic", true)),
                Node::Text(bold),
            ],
        )]);
        let editor = Editor::new(doc, None, PluginRegistry::core());

        let p = editor.doc().element(&[0]).unwrap();
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.children[0], Node::text("ab"));
        assert_eq!(p.children[1].props().get("bold"), Some(&Value::Bool(true)));
    }

    #[test]
    fn empty_document_gets_a_paragraph() {
        let editor = Editor::new(Document::new(Vec::new()), None, PluginRegistry::core());
        assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    }
}
