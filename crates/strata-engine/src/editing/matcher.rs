use std::fmt;
use std::rc::Rc;

use crate::editing::Editor;
use crate::location::Path;
use crate::node::{Node, Properties};

/// Node predicate used by queries and node transforms.
///
/// Element kinds are judged against the editor's schema, so the same `Match` can be
/// reused across editors with different inline/void rules. `Element`, `Block` and
/// `Props` never match the root.
#[derive(Clone, Default)]
pub enum Match<'a> {
    #[default]
    Any,
    Root,
    Text,
    Element,
    Block,
    Inline,
    InlineOrText,
    Void,
    /// The node at exactly this path.
    Path(Path),
    /// Direct children of the node at this path.
    ChildOf(Path),
    /// Non-root nodes carrying every one of these properties.
    Props(Properties),
    Custom(Rc<dyn Fn(&Node, &Path) -> bool + 'a>),
    /// Like `Custom`, with the editor passed in for schema and tree lookups.
    Predicate(Rc<dyn Fn(&Editor, &Node, &Path) -> bool + 'a>),
}

impl<'a> Match<'a> {
    pub fn custom(f: impl Fn(&Node, &Path) -> bool + 'a) -> Self {
        Match::Custom(Rc::new(f))
    }

    pub fn predicate(f: impl Fn(&Editor, &Node, &Path) -> bool + 'a) -> Self {
        Match::Predicate(Rc::new(f))
    }

    /// Elements whose `type` property equals `kind`.
    pub fn kind(kind: &str) -> Self {
        let mut props = Properties::new();
        props.insert("type".to_string(), kind.into());
        Match::Props(props)
    }
}

impl fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Match::Any => write!(f, "Any"),
            Match::Root => write!(f, "Root"),
            Match::Text => write!(f, "Text"),
            Match::Element => write!(f, "Element"),
            Match::Block => write!(f, "Block"),
            Match::Inline => write!(f, "Inline"),
            Match::InlineOrText => write!(f, "InlineOrText"),
            Match::Void => write!(f, "Void"),
            Match::Path(path) => write!(f, "Path({path})"),
            Match::ChildOf(path) => write!(f, "ChildOf({path})"),
            Match::Props(props) => write!(f, "Props({props:?})"),
            Match::Custom(_) => write!(f, "Custom(..)"),
            Match::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl Editor {
    pub fn is_match(&self, m: &Match<'_>, node: &Node, path: &Path) -> bool {
        match m {
            Match::Any => true,
            Match::Root => path.is_empty(),
            Match::Text => node.is_text(),
            Match::Element => node.is_element() && !path.is_empty(),
            Match::Block => !path.is_empty() && node.as_element().is_some_and(|e| self.is_block(e)),
            Match::Inline => node.as_element().is_some_and(|e| self.is_inline(e)),
            Match::InlineOrText => {
                node.is_text() || node.as_element().is_some_and(|e| self.is_inline(e))
            }
            Match::Void => node.as_element().is_some_and(|e| self.is_void(e)),
            Match::Path(at) => at == path,
            Match::ChildOf(parent) => parent.is_parent(path),
            Match::Props(props) => !path.is_empty() && node.matches_props(props),
            Match::Custom(f) => f(node, path),
            Match::Predicate(f) => f(self, node, path),
        }
    }
}
