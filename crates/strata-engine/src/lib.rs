pub mod editing;
pub mod error;
pub mod location;
pub mod node;
pub mod operation;
pub mod transforms;

// Re-export key types for easier usage
pub use editing::*;
pub use error::{EditorError, Result};
pub use location::{Affinity, Edge, Location, Path, Point, Range, RangeAffinity, Span};
pub use node::{Element, Node, NodeEntry, Properties, Text};
pub use operation::{Operation, SelectionPatch};
pub use transforms::*;
