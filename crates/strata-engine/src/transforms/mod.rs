//! Editing primitives built from operations.
//!
//! Each transform resolves its location, takes refs on whatever its own operations will
//! move, applies the operations and reads the refs back. All of them run with
//! normalization suspended, so the tree is only validated once the outermost transform
//! returns.

mod node;
mod selection;
mod text;

#[cfg(test)]
mod tests;

pub use node::{
    CompareFn, InsertNodesOptions, MergeFn, MoveNodesOptions, NodeOptions, SetNodesOptions,
    SplitNodesOptions,
};
pub use selection::{MoveOptions, PointPatch, SelectionEdge};
pub use text::{DeleteOptions, InsertFragmentOptions, InsertTextOptions};
