use crate::error::Result;
use crate::location::Affinity;
use crate::operation::Operation;

impl Operation {
    /// The operation that undoes this one when applied right after it.
    ///
    /// Fails only for operations that could never have been applied, such as a merge of
    /// a first child.
    pub fn inverse(&self) -> Result<Operation> {
        let inverse = match self.clone() {
            Operation::InsertNode { path, node } => Operation::RemoveNode { path, node },
            Operation::RemoveNode { path, node } => Operation::InsertNode { path, node },
            Operation::InsertText { path, offset, text } => {
                Operation::RemoveText { path, offset, text }
            }
            Operation::RemoveText { path, offset, text } => {
                Operation::InsertText { path, offset, text }
            }
            Operation::MergeNode {
                path,
                position,
                properties,
            } => Operation::SplitNode {
                path: path.previous()?,
                position,
                properties,
            },
            Operation::SplitNode {
                path,
                position,
                properties,
            } => Operation::MergeNode {
                path: path.next()?,
                position,
                properties,
            },
            Operation::MoveNode { path, new_path } => {
                if path == new_path {
                    return Ok(self.clone());
                }
                if path.is_sibling(&new_path) {
                    return Ok(Operation::MoveNode {
                        path: new_path,
                        new_path: path,
                    });
                }
                // Where the moved node now lives, and where its old next sibling went:
                // moving back in front of that sibling restores the original layout.
                let forward = Some(Affinity::Forward);
                let inverse_path = path.transform(self, forward).unwrap_or(new_path);
                let old_next = path.next()?;
                let inverse_new_path = old_next.transform(self, forward).unwrap_or(old_next);
                Operation::MoveNode {
                    path: inverse_path,
                    new_path: inverse_new_path,
                }
            }
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => Operation::SetNode {
                path,
                properties: new_properties,
                new_properties: properties,
            },
            Operation::SetSelection {
                properties,
                new_properties,
            } => Operation::SetSelection {
                properties: new_properties,
                new_properties: properties,
            },
        };
        Ok(inverse)
    }
}
