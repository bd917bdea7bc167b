//! The document tree: `Element` ancestors and `Text` leaves, plus read-only
//! structural queries over any subtree.

pub mod fragment;
pub mod mutate;
pub mod query;
pub mod text;
pub mod traverse;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::location::Path;

pub use traverse::{NodeEntries, TraverseOptions};

/// Caller-defined properties of elements (and marks of text leaves).
pub type Properties = BTreeMap<String, Value>;

/// A borrowed node together with its path.
pub type NodeEntry<'a> = (&'a Node, Path);

/// Property keys that belong to the tree shape and can never be set directly.
pub const RESERVED_KEYS: [&str; 2] = ["children", "text"];

/// A node of the document tree.
///
/// Children are reference counted so that applying an operation only copies the nodes
/// on the path from the root to the touched node; untouched siblings are shared with
/// any snapshot a caller holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub children: Vec<Arc<Node>>,
    #[serde(flatten)]
    pub props: Properties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Properties,
}

impl Element {
    pub fn new(children: Vec<Node>) -> Self {
        Element {
            children: children.into_iter().map(Arc::new).collect(),
            props: Properties::new(),
        }
    }

    /// An element with a `type` property, the usual way hosts tag blocks.
    pub fn typed(kind: &str, children: Vec<Node>) -> Self {
        Element::new(children).with_prop("type", kind)
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn kind(&self) -> Option<&str> {
        self.props.get("type").and_then(Value::as_str)
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index).map(Arc::as_ref)
    }
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Text {
            text: text.into(),
            marks: Properties::new(),
        }
    }

    pub fn with_mark(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.marks.insert(key.to_string(), value.into());
        self
    }

    /// Length in characters; offsets into text leaves count characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether two leaves carry identical marks, ignoring their text.
    pub fn equals_loose(&self, another: &Text) -> bool {
        self.marks == another.marks
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(Text::new(text))
    }

    pub fn element(kind: &str, children: Vec<Node>) -> Node {
        Node::Element(Element::typed(kind, children))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Children of an element; text leaves have none.
    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    /// Properties excluding `children` / `text`.
    pub fn extract_props(&self) -> Properties {
        match self {
            Node::Element(element) => element.props.clone(),
            Node::Text(text) => text.marks.clone(),
        }
    }

    pub fn props(&self) -> &Properties {
        match self {
            Node::Element(element) => &element.props,
            Node::Text(text) => &text.marks,
        }
    }

    pub(crate) fn props_mut(&mut self) -> &mut Properties {
        match self {
            Node::Element(element) => &mut element.props,
            Node::Text(text) => &mut text.marks,
        }
    }

    /// Whether every property in `props` is present on this node with an equal value.
    pub fn matches_props(&self, props: &Properties) -> bool {
        let own = self.props();
        props.iter().all(|(key, value)| own.get(key) == Some(value))
    }

    /// Concatenated leaf text with no separators; meant for offset math, not display.
    pub fn string(&self) -> String {
        match self {
            Node::Text(text) => text.text.clone(),
            Node::Element(element) => element.children.iter().map(|c| c.string()).collect(),
        }
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// Wrap a list of nodes in a detached root so tree queries can run over them.
pub fn detached_root(children: &[Node]) -> Node {
    Node::Element(Element::new(children.to_vec()))
}
