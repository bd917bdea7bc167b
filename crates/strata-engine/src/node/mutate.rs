//! Copy-on-write access into the tree. Mutable lookups clone only the nodes on the path
//! that are shared with someone else.

use std::sync::Arc;

use crate::error::{EditorError, Result};
use crate::location::Path;
use crate::node::{Element, Node, Text};

impl Node {
    pub(crate) fn get_mut(&mut self, path: &Path) -> Result<&mut Node> {
        let mut node = self;
        for &index in path.iter() {
            let children = match node {
                Node::Element(element) => &mut element.children,
                Node::Text(_) => return Err(EditorError::NodeNotFound { path: path.clone() }),
            };
            let child = children
                .get_mut(index)
                .ok_or_else(|| EditorError::NodeNotFound { path: path.clone() })?;
            node = Arc::make_mut(child);
        }
        Ok(node)
    }

    /// Children of the element at `path`, ready for insertion or removal.
    pub(crate) fn children_mut(&mut self, path: &Path) -> Result<&mut Vec<Arc<Node>>> {
        match self.get_mut(path)? {
            Node::Element(Element { children, .. }) => Ok(children),
            Node::Text(_) => Err(EditorError::NotAnAncestor { path: path.clone() }),
        }
    }

    pub(crate) fn leaf_mut(&mut self, path: &Path) -> Result<&mut Text> {
        match self.get_mut(path)? {
            Node::Text(text) => Ok(text),
            Node::Element(_) => Err(EditorError::NotAText { path: path.clone() }),
        }
    }

    /// Detach the node at a non-empty `path` and return it.
    pub(crate) fn remove_at(&mut self, path: &Path) -> Result<Node> {
        let (parent, index) = split_path(path)?;
        let children = self.children_mut(&parent)?;
        if index >= children.len() {
            return Err(EditorError::NodeNotFound { path: path.clone() });
        }
        let removed = children.remove(index);
        Ok(Arc::unwrap_or_clone(removed))
    }

    /// Insert `node` so that it ends up at `path`; the index may equal the child count.
    pub(crate) fn insert_at(&mut self, path: &Path, node: Node) -> Result<()> {
        let (parent, index) = split_path(path)?;
        let children = self.children_mut(&parent)?;
        if index > children.len() {
            return Err(EditorError::InsertPastEnd { path: path.clone() });
        }
        children.insert(index, Arc::new(node));
        Ok(())
    }
}

fn split_path(path: &Path) -> Result<(Path, usize)> {
    let parent = path.parent()?;
    let index = path.last().ok_or(EditorError::RootHasNoParent)?;
    Ok((parent, index))
}
