use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::{Affinity, Path};
use crate::operation::Operation;

/// A character offset into the text leaf at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Point {
            path: path.into(),
            offset,
        }
    }

    pub fn compare(&self, another: &Point) -> Ordering {
        match self.path.compare(&another.path) {
            Ordering::Equal => self.offset.cmp(&another.offset),
            other => other,
        }
    }

    pub fn is_after(&self, another: &Point) -> bool {
        self.compare(another) == Ordering::Greater
    }

    pub fn is_before(&self, another: &Point) -> bool {
        self.compare(another) == Ordering::Less
    }

    /// Where this point lands after `op`, or `None` when its leaf is removed (or split
    /// exactly here with no affinity).
    pub fn transform(&self, op: &Operation, affinity: Option<Affinity>) -> Option<Point> {
        let mut p = self.clone();
        match op {
            Operation::InsertNode { .. } | Operation::MoveNode { .. } => {
                p.path = self.path.transform(op, affinity)?;
            }
            Operation::InsertText { path, offset, text } => {
                if *path == self.path
                    && (*offset < self.offset
                        || (*offset == self.offset && affinity == Some(Affinity::Forward)))
                {
                    p.offset += text.chars().count();
                }
            }
            Operation::MergeNode { path, position, .. } => {
                if *path == self.path {
                    p.offset += position;
                }
                p.path = self.path.transform(op, affinity)?;
            }
            Operation::RemoveText { path, offset, text } => {
                if *path == self.path && *offset <= self.offset {
                    p.offset -= (self.offset - offset).min(text.chars().count());
                }
            }
            Operation::RemoveNode { path, .. } => {
                if *path == self.path || path.is_ancestor(&self.path) {
                    return None;
                }
                p.path = self.path.transform(op, affinity)?;
            }
            Operation::SplitNode { path, position, .. } => {
                if *path == self.path {
                    if *position == self.offset && affinity.is_none() {
                        return None;
                    } else if *position < self.offset
                        || (*position == self.offset && affinity == Some(Affinity::Forward))
                    {
                        p.offset -= position;
                        p.path = self.path.next().ok()?;
                    }
                } else {
                    p.path = self.path.transform(op, affinity)?;
                }
            }
            Operation::SetNode { .. } | Operation::SetSelection { .. } => {}
        }
        Some(p)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.offset)
    }
}
