use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::location::Affinity;
use crate::operation::Operation;

/// Index sequence locating a node relative to the document root.
///
/// Paths compare structurally. [`Path::compare`] treats ancestors and descendants as
/// equal, while `==` only holds for identical paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Path(indices)
    }

    /// The root path, `[]`.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// The path of this node's child at `index`.
    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    /// Append a relative path.
    pub fn join(&self, relative: &Path) -> Path {
        let mut indices = self.0.clone();
        indices.extend_from_slice(&relative.0);
        Path(indices)
    }

    /// The first `depth` indices of this path.
    pub fn truncated(&self, depth: usize) -> Path {
        Path(self.0[..depth.min(self.0.len())].to_vec())
    }

    /// All ancestor paths, from the root down to the parent.
    pub fn ancestors(&self) -> Vec<Path> {
        let mut levels = self.levels();
        levels.pop();
        levels
    }

    /// Like [`Path::ancestors`], deepest first.
    pub fn ancestors_reversed(&self) -> Vec<Path> {
        let mut ancestors = self.ancestors();
        ancestors.reverse();
        ancestors
    }

    /// Every level from the root down to and including this path.
    pub fn levels(&self) -> Vec<Path> {
        (0..=self.0.len()).map(|depth| self.truncated(depth)).collect()
    }

    /// The longest shared prefix of two paths.
    pub fn common(&self, another: &Path) -> Path {
        let shared = self
            .0
            .iter()
            .zip(&another.0)
            .take_while(|(a, b)| a == b)
            .count();
        self.truncated(shared)
    }

    /// Compare by shared-prefix position; ancestor/descendant pairs compare equal.
    pub fn compare(&self, another: &Path) -> Ordering {
        for (a, b) in self.0.iter().zip(&another.0) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    fn split_last_index(&self) -> Option<(&[usize], usize)> {
        self.0.split_last().map(|(last, rest)| (rest, *last))
    }

    /// Whether this path's last index is after the other path's index at the same depth,
    /// under a shared parent.
    pub fn ends_after(&self, another: &Path) -> bool {
        self.ends_with(another, |a, b| a > b)
    }

    pub fn ends_at(&self, another: &Path) -> bool {
        self.ends_with(another, |a, b| a == b)
    }

    pub fn ends_before(&self, another: &Path) -> bool {
        self.ends_with(another, |a, b| a < b)
    }

    fn ends_with(&self, another: &Path, check: impl Fn(usize, usize) -> bool) -> bool {
        let Some((rest, last)) = self.split_last_index() else {
            return false;
        };
        let depth = rest.len();
        if another.0.len() <= depth || another.0[..depth] != *rest {
            return false;
        }
        check(last, another.0[depth])
    }

    pub fn has_previous(&self) -> bool {
        self.last().is_some_and(|last| last > 0)
    }

    pub fn is_after(&self, another: &Path) -> bool {
        self.compare(another) == Ordering::Greater
    }

    pub fn is_before(&self, another: &Path) -> bool {
        self.compare(another) == Ordering::Less
    }

    pub fn is_ancestor(&self, another: &Path) -> bool {
        self.len() < another.len() && self.compare(another) == Ordering::Equal
    }

    pub fn is_child(&self, another: &Path) -> bool {
        self.len() == another.len() + 1 && self.compare(another) == Ordering::Equal
    }

    /// Whether this path is an ancestor of, or equal to, another.
    pub fn is_common(&self, another: &Path) -> bool {
        self.len() <= another.len() && self.compare(another) == Ordering::Equal
    }

    pub fn is_descendant(&self, another: &Path) -> bool {
        self.len() > another.len() && self.compare(another) == Ordering::Equal
    }

    pub fn is_parent(&self, another: &Path) -> bool {
        self.len() + 1 == another.len() && self.compare(another) == Ordering::Equal
    }

    /// Distinct paths sharing a parent.
    pub fn is_sibling(&self, another: &Path) -> bool {
        match (self.split_last_index(), another.split_last_index()) {
            (Some((a_rest, a_last)), Some((b_rest, b_last))) => a_rest == b_rest && a_last != b_last,
            _ => false,
        }
    }

    pub fn next(&self) -> Result<Path> {
        let (rest, last) = self
            .split_last_index()
            .ok_or(EditorError::RootHasNoSibling { direction: "next" })?;
        let mut indices = rest.to_vec();
        indices.push(last + 1);
        Ok(Path(indices))
    }

    pub fn previous(&self) -> Result<Path> {
        let (rest, last) = self.split_last_index().ok_or(EditorError::RootHasNoSibling {
            direction: "previous",
        })?;
        if last == 0 {
            return Err(EditorError::NoPreviousSibling { path: self.clone() });
        }
        let mut indices = rest.to_vec();
        indices.push(last - 1);
        Ok(Path(indices))
    }

    pub fn parent(&self) -> Result<Path> {
        if self.is_empty() {
            return Err(EditorError::RootHasNoParent);
        }
        Ok(self.truncated(self.len() - 1))
    }

    /// This path relative to one of its ancestors (or itself).
    pub fn relative(&self, ancestor: &Path) -> Result<Path> {
        if !ancestor.is_ancestor(self) && self != ancestor {
            return Err(EditorError::NotAncestorPath {
                path: self.clone(),
                ancestor: ancestor.clone(),
            });
        }
        Ok(Path(self.0[ancestor.len()..].to_vec()))
    }

    pub fn operation_can_transform_path(op: &Operation) -> bool {
        matches!(
            op,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::MergeNode { .. }
                | Operation::SplitNode { .. }
                | Operation::MoveNode { .. }
        )
    }

    /// Where this path points after `op` is applied, or `None` when its node is removed.
    ///
    /// `affinity` only matters for a `split_node` at exactly this path: `Forward` follows
    /// the new successor, `Backward` stays on the original, `None` drops the path.
    ///
    /// Transforming through an operation and then through its inverse returns the
    /// original path for insert, remove, split and move. A `merge_node` is the exception:
    /// the previous sibling it merged into keeps its path, and the inverse split sends
    /// that path to the recreated node under `Forward` affinity.
    pub fn transform(&self, op: &Operation, affinity: Option<Affinity>) -> Option<Path> {
        let mut p = self.clone();
        if op.touches_root() {
            return Some(p);
        }
        match op {
            Operation::InsertNode { path: op_path, .. } => {
                if op_path == self || op_path.ends_before(self) || op_path.is_ancestor(self) {
                    p.0[op_path.len() - 1] += 1;
                }
            }
            Operation::RemoveNode { path: op_path, .. } => {
                if op_path == self || op_path.is_ancestor(self) {
                    return None;
                } else if op_path.ends_before(self) {
                    decrement(&mut p.0, op_path.len() - 1);
                }
            }
            Operation::MergeNode {
                path: op_path,
                position,
                ..
            } => {
                if op_path == self || op_path.ends_before(self) {
                    decrement(&mut p.0, op_path.len() - 1);
                } else if op_path.is_ancestor(self) {
                    decrement(&mut p.0, op_path.len() - 1);
                    p.0[op_path.len()] += position;
                }
            }
            Operation::SplitNode {
                path: op_path,
                position,
                ..
            } => {
                if op_path == self {
                    match affinity {
                        Some(Affinity::Forward) => {
                            let last = p.0.len() - 1;
                            p.0[last] += 1;
                        }
                        Some(Affinity::Backward) => {}
                        None => return None,
                    }
                } else if op_path.ends_before(self) {
                    p.0[op_path.len() - 1] += 1;
                } else if op_path.is_ancestor(self) && self.0[op_path.len()] >= *position {
                    p.0[op_path.len() - 1] += 1;
                    p.0[op_path.len()] = p.0[op_path.len()].saturating_sub(*position);
                }
            }
            Operation::MoveNode {
                path: op_path,
                new_path,
            } => {
                if op_path == new_path {
                    return Some(p);
                }

                if op_path.is_ancestor(self) || op_path == self {
                    let mut copy = new_path.clone();
                    if op_path.ends_before(new_path) && op_path.len() < new_path.len() {
                        decrement(&mut copy.0, op_path.len() - 1);
                    }
                    copy.0.extend_from_slice(&self.0[op_path.len()..]);
                    return Some(copy);
                } else if op_path.is_sibling(new_path)
                    && (new_path.is_ancestor(self) || new_path == self)
                {
                    if op_path.ends_before(self) {
                        decrement(&mut p.0, op_path.len() - 1);
                    } else {
                        p.0[op_path.len() - 1] += 1;
                    }
                } else if new_path.ends_before(self) || new_path == self || new_path.is_ancestor(self)
                {
                    if op_path.ends_before(self) {
                        decrement(&mut p.0, op_path.len() - 1);
                    }
                    p.0[new_path.len() - 1] += 1;
                } else if op_path.ends_before(self) {
                    if new_path == self {
                        p.0[new_path.len() - 1] += 1;
                    }
                    decrement(&mut p.0, op_path.len() - 1);
                }
            }
            Operation::InsertText { .. }
            | Operation::RemoveText { .. }
            | Operation::SetNode { .. }
            | Operation::SetSelection { .. } => {}
        }
        Some(p)
    }
}

impl std::ops::Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Path(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Path(indices.to_vec())
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Path(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

fn decrement(indices: &mut [usize], at: usize) {
    indices[at] = indices[at].saturating_sub(1);
}
