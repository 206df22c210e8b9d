use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Attrs = BTreeMap<String, Value>;
pub type ElementKind = String;

pub const PARAGRAPH: &str = "p";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

/// A tree node in the Slate JSON shape: texts carry `text` plus mark keys,
/// elements carry `type`, `children` and arbitrary attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(TextNode),
    Element(ElementNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextNode {
    pub text: String,
    #[serde(flatten)]
    pub marks: Attrs,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode::new(text))
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode::new(kind, children))
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::element(PARAGRAPH, vec![Node::text(text)])
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.as_element().map(|el| el.kind.as_str())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(el) => Some(&mut el.children),
            Node::Text(_) => None,
        }
    }

    /// Element attributes or text marks.
    pub fn props(&self) -> &Attrs {
        match self {
            Node::Element(el) => &el.attrs,
            Node::Text(t) => &t.marks,
        }
    }

    pub fn props_mut(&mut self) -> &mut Attrs {
        match self {
            Node::Element(el) => &mut el.attrs,
            Node::Text(t) => &mut t.marks,
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn string(&self) -> String {
        let mut out = String::new();
        collect_string(self, &mut out);
        out
    }
}

fn collect_string(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&t.text),
        Node::Element(el) => {
            for child in &el.children {
                collect_string(child, out);
            }
        }
    }
}

impl From<ElementNode> for Node {
    fn from(value: ElementNode) -> Self {
        Node::Element(value)
    }
}

impl From<TextNode> for Node {
    fn from(value: TextNode) -> Self {
        Node::Text(value)
    }
}

impl ElementNode {
    pub fn new(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind: kind.into(),
            children,
            attrs: Attrs::default(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Attrs::default(),
        }
    }

    pub fn with_mark(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.marks.insert(key.into(), value.into());
        self
    }
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for &ix in rest {
            node = node.as_element()?.children.get(ix)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for &ix in rest {
            node = node.as_element_mut()?.children.get_mut(ix)?;
        }
        Some(node)
    }

    /// Children of the element at `path`; the empty path addresses the root.
    pub fn children_at(&self, path: &[usize]) -> Option<&[Node]> {
        if path.is_empty() {
            return Some(&self.children);
        }
        match self.node(path)? {
            Node::Element(el) => Some(&el.children),
            Node::Text(_) => None,
        }
    }

    pub fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.children);
        }
        self.node_mut(path)?.children_mut()
    }

    pub fn has_path(&self, path: &[usize]) -> bool {
        path.is_empty() || self.node(path).is_some()
    }

    pub fn element(&self, path: &[usize]) -> Option<&ElementNode> {
        self.node(path)?.as_element()
    }

    pub fn text(&self, path: &[usize]) -> Option<&TextNode> {
        self.node(path)?.as_text()
    }

    pub fn string(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            collect_string(child, &mut out);
        }
        out
    }
}
