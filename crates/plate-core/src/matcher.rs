use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::node::Node;
use crate::path;

pub type Predicate = Arc<dyn Fn(&Node, &[usize]) -> bool + Send + Sync>;

/// What a query selects.
///
/// `Props` maps an attribute key to its allowed values; a node matches when
/// every key is present with one of the listed values. The `type` key is
/// compared against the element kind, so `Match::kinds(["ul", "ol"])` is the
/// usual way to select by type.
#[derive(Clone, Default)]
pub enum Match {
    #[default]
    Any,
    Predicate(Predicate),
    Props(BTreeMap<String, Vec<Value>>),
}

impl Match {
    pub fn predicate(f: impl Fn(&Node, &[usize]) -> bool + Send + Sync + 'static) -> Self {
        Match::Predicate(Arc::new(f))
    }

    pub fn kind(kind: impl Into<String>) -> Self {
        Self::kinds([kind.into()])
    }

    pub fn kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::prop(
            "type",
            kinds.into_iter().map(|k| Value::String(k.into())).collect(),
        )
    }

    pub fn prop(key: impl Into<String>, values: Vec<Value>) -> Self {
        let mut props = BTreeMap::new();
        props.insert(key.into(), values);
        Match::Props(props)
    }

    /// Adds a key to a `Props` matcher. Any other matcher is replaced.
    pub fn and_prop(self, key: impl Into<String>, values: Vec<Value>) -> Self {
        match self {
            Match::Props(mut props) => {
                props.insert(key.into(), values);
                Match::Props(props)
            }
            _ => Self::prop(key, values),
        }
    }

    pub fn text() -> Self {
        Self::predicate(|node, _| node.is_text())
    }

    pub fn element() -> Self {
        Self::predicate(|node, _| node.is_element())
    }

    /// Exactly the node at `at`.
    pub fn path(at: &[usize]) -> Self {
        let at = at.to_vec();
        Self::predicate(move |_, p| p == at.as_slice())
    }

    /// Any child of the node at `parent`.
    pub fn children_of(parent: &[usize]) -> Self {
        let parent = parent.to_vec();
        Self::predicate(move |_, p| path::is_child(p, &parent))
    }

    /// Nodes sharing a parent with `at`, `at` included.
    pub fn siblings_of(at: &[usize]) -> Self {
        match path::parent(at) {
            Some(parent) => Self::children_of(&parent),
            None => Self::predicate(|_, _| false),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Match::Any)
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Match::Any => f.write_str("Any"),
            Match::Predicate(_) => f.write_str("Predicate(..)"),
            Match::Props(props) => f.debug_tuple("Props").field(props).finish(),
        }
    }
}

pub fn matches(node: &Node, path: &[usize], matcher: &Match) -> bool {
    match matcher {
        Match::Any => true,
        Match::Predicate(f) => f(node, path),
        Match::Props(props) => props.iter().all(|(key, allowed)| {
            let actual = if key == "type" {
                match node.kind() {
                    Some(kind) => Value::String(kind.to_string()),
                    None => return false,
                }
            } else {
                match node.props().get(key) {
                    Some(value) => value.clone(),
                    None => return false,
                }
            };
            allowed.iter().any(|v| *v == actual)
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::ElementNode;

    #[test]
    fn props_match_by_membership() {
        let ul = Node::element("ul", vec![]);
        let h1: Node = ElementNode::new("h1", vec![]).with_attr("align", "left").into();

        let lists = Match::kinds(["ul", "ol"]);
        assert!(matches(&ul, &[0], &lists));
        assert!(!matches(&h1, &[0], &lists));
        assert!(!matches(&Node::text("x"), &[0, 0], &lists));

        let aligned = Match::kind("h1").and_prop("align", vec![json!("left"), json!("center")]);
        assert!(matches(&h1, &[1], &aligned));
        assert!(!matches(&ul, &[1], &aligned));
    }

    #[test]
    fn path_matchers() {
        let node = Node::text("");
        assert!(matches(&node, &[1, 2], &Match::path(&[1, 2])));
        assert!(matches(&node, &[1, 0], &Match::siblings_of(&[1, 2])));
        assert!(!matches(&node, &[2, 0], &Match::siblings_of(&[1, 2])));
        assert!(!matches(&node, &[], &Match::siblings_of(&[])));
    }
}
