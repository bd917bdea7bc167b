//! Path-addressed lookups over a subtree.
//!
//! Every lookup is relative to `self`, so the same calls work on the document root and
//! on detached fragments.

use crate::error::{EditorError, Result};
use crate::location::Path;
use crate::node::{Node, NodeEntry, Text};

impl Node {
    /// The node at `path`, or `NodeNotFound` when any index is out of bounds.
    pub fn get(&self, path: &Path) -> Result<&Node> {
        let mut node = self;
        for &index in path.iter() {
            node = node
                .children()
                .get(index)
                .map(AsRef::as_ref)
                .ok_or_else(|| EditorError::NodeNotFound { path: path.clone() })?;
        }
        Ok(node)
    }

    pub fn has(&self, path: &Path) -> bool {
        self.get(path).is_ok()
    }

    pub fn child(&self, index: usize) -> Result<&Node> {
        self.children()
            .get(index)
            .map(AsRef::as_ref)
            .ok_or_else(|| EditorError::NodeNotFound {
                path: Path::new(vec![index]),
            })
    }

    /// The node at `path`, which must be an element (or the root).
    pub fn ancestor(&self, path: &Path) -> Result<&Node> {
        let node = self.get(path)?;
        if node.is_text() {
            return Err(EditorError::NotAnAncestor { path: path.clone() });
        }
        Ok(node)
    }

    pub fn parent(&self, path: &Path) -> Result<&Node> {
        let parent_path = path.parent()?;
        self.ancestor(&parent_path)
    }

    /// The node at a non-empty `path`.
    pub fn descendant(&self, path: &Path) -> Result<&Node> {
        if path.is_empty() {
            return Err(EditorError::RootIsNotDescendant);
        }
        self.get(path)
    }

    /// The text leaf at `path`.
    pub fn leaf(&self, path: &Path) -> Result<&Text> {
        self.get(path)?
            .as_text()
            .ok_or_else(|| EditorError::NotAText { path: path.clone() })
    }

    /// Children of the element at `path`, each with its own path.
    pub fn children_at(&self, path: &Path) -> Result<Vec<NodeEntry<'_>>> {
        let ancestor = self.ancestor(path)?;
        Ok(ancestor
            .children()
            .iter()
            .enumerate()
            .map(|(index, child)| (child.as_ref(), path.child(index)))
            .collect())
    }

    /// Deepest first-child descent starting at `path`.
    pub fn first(&self, path: &Path) -> Result<NodeEntry<'_>> {
        self.edge_descent(path, |_| 0)
    }

    /// Deepest last-child descent starting at `path`.
    pub fn last(&self, path: &Path) -> Result<NodeEntry<'_>> {
        self.edge_descent(path, |len| len - 1)
    }

    fn edge_descent(&self, path: &Path, pick: impl Fn(usize) -> usize) -> Result<NodeEntry<'_>> {
        let mut node = self.get(path)?;
        let mut at = path.clone();
        while !node.children().is_empty() {
            let index = pick(node.children().len());
            node = node.children()[index].as_ref();
            at = at.child(index);
        }
        Ok((node, at))
    }

    /// The deepest node that contains both paths.
    pub fn common(&self, path: &Path, another: &Path) -> Result<NodeEntry<'_>> {
        let common = path.common(another);
        Ok((self.get(&common)?, common))
    }

    /// Every node from `self` down to the node at `path`, top first.
    pub fn levels(&self, path: &Path) -> Result<Vec<NodeEntry<'_>>> {
        path.levels()
            .into_iter()
            .map(|level| Ok((self.get(&level)?, level)))
            .collect()
    }

    /// Ancestors of `path` (excluding the node itself), top first unless `reverse`.
    pub fn ancestors(&self, path: &Path, reverse: bool) -> Result<Vec<NodeEntry<'_>>> {
        let mut levels = self.levels(path)?;
        levels.pop();
        if reverse {
            levels.reverse();
        }
        Ok(levels)
    }

    /// Every text leaf below `self`, in document order.
    pub fn texts(&self) -> impl Iterator<Item = (&Text, Path)> {
        self.descendants()
            .filter_map(|(node, path)| node.as_text().map(|text| (text, path)))
    }

    /// Every element below `self` (including `self` when it is one), in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeEntry<'_>> {
        self.entries(Default::default())
            .filter(|(node, _)| node.is_element())
    }

    /// All descendants in document order, excluding `self`.
    pub fn descendants(&self) -> impl Iterator<Item = NodeEntry<'_>> {
        self.entries(Default::default())
            .filter(|(_, path)| !path.is_empty())
    }

    /// Concatenated text of the node at `path`.
    pub fn string_at(&self, path: &Path) -> Result<String> {
        Ok(self.get(path)?.string())
    }
}
