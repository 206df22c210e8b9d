//! Recursive attribute stamping over a detached node, used before the node
//! is inserted.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::node::{Attrs, Node};
use crate::path::Path;

const RESERVED_KEYS: [&str; 3] = ["type", "children", "text"];

pub type NodeFilter = Arc<dyn Fn(&Node, &[usize]) -> bool + Send + Sync>;

/// Which nodes of a subtree a deep transform visits. All conditions must
/// hold. `level` and `max_level` count from the root of the walk (level 0).
#[derive(Clone, Default)]
pub struct NodeQuery {
    pub filter: Option<NodeFilter>,
    /// Element kinds to accept; empty accepts every kind.
    pub allow: Vec<String>,
    pub exclude: Vec<String>,
    pub level: Vec<usize>,
    pub max_level: Option<usize>,
}

impl fmt::Debug for NodeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeQuery")
            .field("filter", &self.filter.is_some())
            .field("allow", &self.allow)
            .field("exclude", &self.exclude)
            .field("level", &self.level)
            .field("max_level", &self.max_level)
            .finish()
    }
}

impl NodeQuery {
    pub fn filter(mut self, filter: impl Fn(&Node, &[usize]) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn allow<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn level(mut self, levels: impl IntoIterator<Item = usize>) -> Self {
        self.level = levels.into_iter().collect();
        self
    }

    pub fn max_level(mut self, max_level: usize) -> Self {
        self.max_level = Some(max_level);
        self
    }
}

/// Whether `node` at the walk-relative `path` passes `query`. No query
/// accepts everything. `allow`/`exclude` only reject elements.
pub fn query_node(node: &Node, path: &[usize], query: Option<&NodeQuery>) -> bool {
    let Some(query) = query else {
        return true;
    };
    if let Some(filter) = &query.filter
        && !filter(node, path)
    {
        return false;
    }
    if let Some(kind) = node.kind() {
        if !query.allow.is_empty() && !query.allow.iter().any(|k| k == kind) {
            return false;
        }
        if query.exclude.iter().any(|k| k == kind) {
            return false;
        }
    }
    let level = path.len();
    if !query.level.is_empty() && !query.level.contains(&level) {
        return false;
    }
    if query.max_level.is_some_and(|max| level > max) {
        return false;
    }
    true
}

/// Where the attributes come from. A factory is called once per visited
/// node, so each node can receive a fresh value.
#[derive(Clone)]
pub enum DeepSource {
    Value(Attrs),
    Factory(Arc<dyn Fn() -> Attrs + Send + Sync>),
}

impl DeepSource {
    pub fn factory(f: impl Fn() -> Attrs + Send + Sync + 'static) -> Self {
        DeepSource::Factory(Arc::new(f))
    }

    fn resolve(&self) -> Attrs {
        match self {
            DeepSource::Value(attrs) => attrs.clone(),
            DeepSource::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for DeepSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeepSource::Value(attrs) => f.debug_tuple("Value").field(attrs).finish(),
            DeepSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Walks `node` and its descendants, calling `apply` with the resolved
/// source for every node that passes `query`.
pub fn apply_deep_to_nodes(
    node: &mut Node,
    source: &DeepSource,
    apply: &mut dyn FnMut(&mut Node, Attrs),
    query: Option<&NodeQuery>,
) {
    fn walk(
        node: &mut Node,
        path: &mut Path,
        source: &DeepSource,
        apply: &mut dyn FnMut(&mut Node, Attrs),
        query: Option<&NodeQuery>,
    ) {
        if query_node(node, path, query) {
            apply(node, source.resolve());
        }
        if let Some(children) = node.children_mut() {
            for (ix, child) in children.iter_mut().enumerate() {
                path.push(ix);
                walk(child, path, source, apply, query);
                path.pop();
            }
        }
    }
    walk(node, &mut Vec::new(), source, apply, query);
}

/// Deep-merges the source into every matching node; object values are
/// merged key by key, anything else is overwritten.
pub fn merge_deep_to_nodes(node: &mut Node, source: &DeepSource, query: Option<&NodeQuery>) {
    apply_deep_to_nodes(
        node,
        source,
        &mut |node, attrs| {
            let props = node.props_mut();
            for (key, value) in attrs {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                match props.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        props.insert(key, value);
                    }
                }
            }
        },
        query,
    );
}

/// Sets every source key a matching node does not already have.
pub fn defaults_deep_to_nodes(node: &mut Node, source: &DeepSource, query: Option<&NodeQuery>) {
    apply_deep_to_nodes(
        node,
        source,
        &mut |node, attrs| {
            let props = node.props_mut();
            for (key, value) in attrs {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                props.entry(key).or_insert(value);
            }
        },
        query,
    );
}

fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::node::ElementNode;

    fn sample() -> Node {
        Node::element(
            "ul",
            vec![Node::element("li", vec![Node::paragraph("a")])],
        )
    }

    #[test]
    fn defaults_keep_existing_values() {
        let mut node: Node = ElementNode::new("p", vec![Node::text("x")])
            .with_attr("id", "keep")
            .into();
        let mut attrs = Attrs::new();
        attrs.insert("id".to_string(), json!("new"));
        attrs.insert("align".to_string(), json!("left"));
        attrs.insert("type".to_string(), json!("h1"));

        defaults_deep_to_nodes(&mut node, &DeepSource::Value(attrs), Some(&NodeQuery::default().allow(["p"])));

        let el = node.as_element().unwrap();
        assert_eq!(el.kind, "p");
        assert_eq!(el.attrs.get("id"), Some(&json!("keep")));
        assert_eq!(el.attrs.get("align"), Some(&json!("left")));
        assert!(el.children[0].props().is_empty());
    }

    #[test]
    fn merge_combines_nested_objects() {
        let mut node: Node = ElementNode::new("p", vec![Node::text("x")])
            .with_attr("style", json!({ "color": "red", "size": 1 }))
            .into();
        let mut attrs = Attrs::new();
        attrs.insert("style".to_string(), json!({ "size": 2 }));

        merge_deep_to_nodes(&mut node, &DeepSource::Value(attrs), Some(&NodeQuery::default().max_level(0)));

        assert_eq!(
            node.props().get("style"),
            Some(&json!({ "color": "red", "size": 2 }))
        );
        assert!(node.children()[0].props().is_empty());
    }

    #[test]
    fn factory_runs_once_per_visited_node() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let source = DeepSource::factory(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let mut attrs = Attrs::new();
            attrs.insert("n".to_string(), json!(n));
            attrs
        });

        let mut node = sample();
        let query = NodeQuery::default().filter(|node, _| node.is_element());
        defaults_deep_to_nodes(&mut node, &source, Some(&query));

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let li = &node.children()[0];
        assert_eq!(node.props().get("n"), Some(&json!(0)));
        assert_eq!(li.props().get("n"), Some(&json!(1)));
        assert_eq!(li.children()[0].props().get("n"), Some(&json!(2)));
    }

    #[test]
    fn query_levels_are_relative_to_the_walk_root() {
        let mut seen = Vec::new();
        apply_deep_to_nodes(
            &mut sample(),
            &DeepSource::Value(Attrs::new()),
            &mut |node, _| seen.push(node.kind().unwrap_or("text").to_string()),
            Some(&NodeQuery::default().level([1, 3])),
        );
        assert_eq!(seen, vec!["li", "text"]);
    }
}
