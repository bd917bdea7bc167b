use crate::error::Result;
use crate::location::{Path, Range};
use crate::node::text::char_slice;
use crate::node::{Node, TraverseOptions};

impl Node {
    /// A copy of the children of `self` trimmed to `range`: nodes outside the range are
    /// dropped and the edge leaves are cut at the range offsets.
    pub fn fragment(&self, range: &Range) -> Result<Vec<Node>> {
        let (start, end) = range.edges();
        let outside: Vec<(Path, bool)> = self
            .entries(TraverseOptions {
                reverse: true,
                pass: Some(Box::new(|_, path| !range.includes_path(path))),
                ..Default::default()
            })
            .map(|(_, path)| {
                let included = range.includes_path(&path);
                (path, included)
            })
            .collect();

        let mut root = self.clone();
        for (path, included) in outside {
            if !included {
                root.remove_at(&path)?;
                continue;
            }
            if path == end.path {
                let leaf = root.leaf_mut(&path)?;
                leaf.text = char_slice(&leaf.text, 0, end.offset).to_string();
            }
            if path == start.path {
                let leaf = root.leaf_mut(&path)?;
                let len = leaf.len();
                leaf.text = char_slice(&leaf.text, start.offset, len).to_string();
            }
        }

        Ok(root
            .children()
            .iter()
            .map(|child| child.as_ref().clone())
            .collect())
    }
}
