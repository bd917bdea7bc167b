//! The nine reversible document operations: their shape, inverses, tree application and
//! the paths each one dirties.

pub mod apply;
pub mod dirty;
pub mod inverse;


use serde::{Deserialize, Serialize};

use crate::location::{Path, Point, Range};
use crate::node::{Node, Properties};

pub use apply::apply;
pub use dirty::dirty_paths;

/// Partial update of the selection's endpoints carried by `set_selection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<Point>,
}

impl SelectionPatch {
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.focus.is_none()
    }

    /// The full range this patch describes, when it names both endpoints.
    pub fn as_range(&self) -> Option<Range> {
        match (&self.anchor, &self.focus) {
            (Some(anchor), Some(focus)) => Some(Range::new(anchor.clone(), focus.clone())),
            _ => None,
        }
    }
}

impl From<Range> for SelectionPatch {
    fn from(range: Range) -> Self {
        SelectionPatch {
            anchor: Some(range.anchor),
            focus: Some(range.focus),
        }
    }
}

/// An atomic, invertible change to the document or the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    InsertNode {
        path: Path,
        node: Node,
    },
    RemoveNode {
        path: Path,
        node: Node,
    },
    /// Move the node at `path` so that it ends up at `new_path` once removed from its old
    /// position.
    MoveNode {
        path: Path,
        new_path: Path,
    },
    /// Merge the node at `path` into its previous sibling. `position` is the previous
    /// sibling's length (characters or children) before the merge and `properties` are
    /// the merged node's own properties, kept so the merge can be split back.
    MergeNode {
        path: Path,
        position: usize,
        properties: Properties,
    },
    /// Split the node at `path` at `position`; the second half gets `properties`.
    SplitNode {
        path: Path,
        position: usize,
        properties: Properties,
    },
    /// Set (or, for `null` values, remove) properties. `properties` holds the previous
    /// values of every touched key.
    SetNode {
        path: Path,
        properties: Properties,
        new_properties: Properties,
    },
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
    /// `None` on either side stands for "no selection".
    SetSelection {
        properties: Option<SelectionPatch>,
        new_properties: Option<SelectionPatch>,
    },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::SetNode { .. } => "set_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::SetSelection { .. } => "set_selection",
        }
    }

    /// The primary path of the operation; `None` for selection changes.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path, .. }
            | Operation::MoveNode { path, .. }
            | Operation::MergeNode { path, .. }
            | Operation::SplitNode { path, .. }
            | Operation::SetNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. } => Some(path),
            Operation::SetSelection { .. } => None,
        }
    }

    pub fn is_node_operation(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::MoveNode { .. }
                | Operation::MergeNode { .. }
                | Operation::SplitNode { .. }
                | Operation::SetNode { .. }
        )
    }

    pub fn is_text_operation(&self) -> bool {
        matches!(
            self,
            Operation::InsertText { .. } | Operation::RemoveText { .. }
        )
    }

    pub fn is_selection_operation(&self) -> bool {
        matches!(self, Operation::SetSelection { .. })
    }

    /// Structural operations addressed at the root itself. They are rejected on apply,
    /// and location transforms leave every path untouched for them.
    pub fn touches_root(&self) -> bool {
        match self {
            Operation::MoveNode { path, new_path } => path.is_empty() || new_path.is_empty(),
            Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path, .. }
            | Operation::MergeNode { path, .. }
            | Operation::SplitNode { path, .. } => path.is_empty(),
            _ => false,
        }
    }
}
