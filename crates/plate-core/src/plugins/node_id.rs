//! Stable element ids. Every element inserted into the document receives a
//! fresh uuid under the configured key unless it already has one, and both
//! halves of a split keep distinct ids.

use serde_json::Value;
use uuid::Uuid;

use crate::editor::{Editor, NodeIdConfig};
use crate::node::{Attrs, Node};
use crate::ops::Op;
use crate::plugin::{OpTransform, PlatePlugin, QuerySpec};
use crate::plugins::arg_str;
use crate::query::Descendants;
use crate::transforms::{DeepSource, NodeQuery, defaults_deep_to_nodes, query_node};

pub struct NodeIdPlugin;

impl PlatePlugin for NodeIdPlugin {
    fn id(&self) -> &'static str {
        "node_id"
    }

    fn op_transforms(&self) -> Vec<Box<dyn OpTransform>> {
        vec![Box::new(StampNodeIds)]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("node_id.path", |editor, args| {
            let Some(id) = arg_str(&args, "id") else {
                return Ok(Value::Null);
            };
            Ok(find_path_by_id(editor, id).map_or(Value::Null, Value::from))
        })]
    }
}

struct StampNodeIds;

impl OpTransform for StampNodeIds {
    fn id(&self) -> &'static str {
        "node_id.stamp"
    }

    fn transform(&self, editor: &Editor, op: Op) -> Op {
        let config = &editor.config().node_id;
        match op {
            Op::InsertNode { path, mut node } => {
                let key = config.key.clone();
                let source = DeepSource::factory(move || fresh_id(&key));
                defaults_deep_to_nodes(&mut node, &source, Some(&id_query(config)));
                Op::InsertNode { path, node }
            }
            Op::SplitNode {
                path,
                position,
                mut properties,
            } => {
                let stamps = editor
                    .doc()
                    .node(&path)
                    .is_some_and(|node| query_node(node, &[], Some(&id_query(config))));
                if stamps {
                    properties.extend(fresh_id(&config.key));
                }
                Op::SplitNode {
                    path,
                    position,
                    properties,
                }
            }
            other => other,
        }
    }
}

fn id_query(config: &NodeIdConfig) -> NodeQuery {
    NodeQuery::default()
        .filter(|node, _| node.is_element())
        .allow(config.allow.clone())
        .exclude(config.exclude.clone())
}

fn fresh_id(key: &str) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert(key.to_string(), Value::String(Uuid::new_v4().to_string()));
    attrs
}

/// Path of the element carrying `id` under the configured key.
pub fn find_path_by_id(editor: &Editor, id: &str) -> Option<Vec<usize>> {
    let key = editor.config().node_id.key.as_str();
    Descendants::new(editor.doc(), Vec::new(), None, false)
        .find(|(node, _)| {
            matches!(node, Node::Element(el) if el.attrs.get(key).and_then(Value::as_str) == Some(id))
        })
        .map(|(_, path)| path)
}
