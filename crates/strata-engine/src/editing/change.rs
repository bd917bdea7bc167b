use serde::Serialize;

use crate::operation::Operation;

/// One flushed batch of operations, reported to [`crate::Schema::on_change`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Change {
    pub operations: Vec<Operation>,
    /// Editor version after the last operation in the batch.
    pub version: u64,
    pub content_changed: bool,
    pub selection_changed: bool,
    pub marks_changed: bool,
}

/// What the error hook decided for a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Raise,
    Recover,
}
