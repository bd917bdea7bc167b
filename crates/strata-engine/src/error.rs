use thiserror::Error;

use crate::location::{Edge, Path, Point};

/// Errors raised by the editing core.
///
/// Most variants are programmer-contract violations: the caller built an operation or a
/// location that cannot exist in the current tree. The rest are resolution failures of
/// read-style queries, which flow through [`crate::Editor::report`] so hosts can recover.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("Cannot get the parent path of the root path")]
    RootHasNoParent,

    #[error("Cannot get the {direction} path of the root path")]
    RootHasNoSibling { direction: &'static str },

    #[error("Cannot get the previous path of a first child path {path}")]
    NoPreviousSibling { path: Path },

    #[error("Cannot get the relative path of {path} inside {ancestor}, because it is not above or equal to the path")]
    NotAncestorPath { path: Path, ancestor: Path },

    #[error("Cannot find a descendant at path {path}")]
    NodeNotFound { path: Path },

    #[error("Cannot get the ancestor node at path {path} because it refers to a text node")]
    NotAnAncestor { path: Path },

    #[error("Cannot get the leaf node at path {path} because it refers to a non-leaf node")]
    NotAText { path: Path },

    #[error("Cannot get the descendant node at the root path")]
    RootIsNotDescendant,

    #[error("Cannot get the {edge} point in the node at path {path} because it has no {edge} text node")]
    NoEdgeText { edge: Edge, path: Path },

    #[error("Cannot apply an \"insert_node\" operation at path {path} because the destination is past the end of the node")]
    InsertPastEnd { path: Path },

    #[error("Cannot apply a \"merge_node\" operation at path {path} to nodes of different kinds")]
    MergeKindMismatch { path: Path },

    #[error("Cannot move a path {path} to new path {new_path} because the destination is inside itself")]
    MoveIntoSelf { path: Path, new_path: Path },

    #[error("Cannot set properties on the root node")]
    RootProperties,

    #[error("Cannot set the \"{key}\" property of nodes")]
    ReservedProperty { key: String },

    #[error("Cannot apply a \"split_node\" operation at the root path because the root node cannot be split")]
    SplitRoot,

    #[error("Offset {offset} is out of range for the text node at path {path} of length {len}")]
    OffsetOutOfRange { path: Path, offset: usize, len: usize },

    #[error("Cannot apply an incomplete \"set_selection\" operation when there is no current selection")]
    IncompleteSelection,

    #[error("Cannot lift node at a path {path} because it has a depth of less than 2")]
    LiftTooShallow { path: Path },

    #[error("Cannot get the {direction} node from the root node")]
    SiblingOfRoot { direction: &'static str },

    #[error("No block element contains the point {point}")]
    NoBlockAbove { point: Point },

    #[error("Could not completely normalize the editor after {iterations} iterations")]
    NormalizationDiverged { iterations: usize },
}

impl EditorError {
    /// Stable key identifying the failure, used by the recovery hook and by configuration.
    pub fn key(&self) -> &'static str {
        match self {
            EditorError::RootHasNoParent => "path.parent_of_root",
            EditorError::RootHasNoSibling { .. } => "path.sibling_of_root",
            EditorError::NoPreviousSibling { .. } => "path.no_previous",
            EditorError::NotAncestorPath { .. } => "path.not_ancestor",
            EditorError::NodeNotFound { .. } => "node.not_found",
            EditorError::NotAnAncestor { .. } => "node.not_ancestor",
            EditorError::NotAText { .. } => "node.not_text",
            EditorError::RootIsNotDescendant => "node.root_not_descendant",
            EditorError::NoEdgeText { .. } => "point.no_edge_text",
            EditorError::InsertPastEnd { .. } => "operation.insert_past_end",
            EditorError::MergeKindMismatch { .. } => "operation.merge_kind_mismatch",
            EditorError::MoveIntoSelf { .. } => "operation.move_into_self",
            EditorError::RootProperties => "operation.root_properties",
            EditorError::ReservedProperty { .. } => "operation.reserved_property",
            EditorError::SplitRoot => "operation.split_root",
            EditorError::OffsetOutOfRange { .. } => "operation.offset_out_of_range",
            EditorError::IncompleteSelection => "selection.incomplete",
            EditorError::LiftTooShallow { .. } => "transform.lift_too_shallow",
            EditorError::SiblingOfRoot { .. } => "query.sibling_of_root",
            EditorError::NoBlockAbove { .. } => "query.no_block_above",
            EditorError::NormalizationDiverged { .. } => "normalize.diverged",
        }
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
