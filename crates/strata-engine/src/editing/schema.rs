use crate::editing::Editor;
use crate::editing::change::{Change, ErrorAction};
use crate::editing::normalize::{self, NormalizeNodeOptions, ShouldNormalize};
use crate::error::{EditorError, Result};
use crate::location::Path;
use crate::node::{Element, Node};
use crate::operation::{self, Operation};

/// Host-supplied behaviour: element classification and the normalization, merge, change
/// and error hooks.
///
/// Every method has a default, so a host only overrides what its document model needs.
/// Hooks that receive the editor may apply operations through it.
pub trait Schema {
    fn is_inline(&self, _element: &Element) -> bool {
        false
    }

    fn is_void(&self, _element: &Element) -> bool {
        false
    }

    fn is_selectable(&self, _element: &Element) -> bool {
        true
    }

    fn is_element_read_only(&self, _element: &Element) -> bool {
        false
    }

    /// Whether a void element still accepts character marks.
    fn markable_void(&self, _element: &Element) -> bool {
        false
    }

    /// Repair the node at `path`. Called once per dirty path during normalization.
    fn normalize_node(
        &self,
        editor: &mut Editor,
        path: &Path,
        options: &NormalizeNodeOptions,
    ) -> Result<()> {
        normalize::normalize_node_default(editor, path, options)
    }

    /// Whether normalization should keep going. The default fails once the pass has run
    /// for more than `initial dirty paths × max_iterations_factor` iterations.
    fn should_normalize(&self, editor: &Editor, context: &ShouldNormalize) -> Result<bool> {
        normalize::should_normalize_default(editor, context)
    }

    /// Paths that `op` may leave invalid.
    fn dirty_paths(&self, _editor: &Editor, op: &Operation) -> Vec<Path> {
        operation::dirty_paths(op)
    }

    /// Whether merging `current` into `prev` should instead drop `prev` and keep
    /// `current` where it is.
    fn should_merge_nodes_remove_prev_node(
        &self,
        editor: &Editor,
        prev: (&Node, &Path),
        _current: (&Node, &Path),
    ) -> bool {
        match prev.0 {
            Node::Element(element) => editor.is_empty(element),
            Node::Text(text) => text.is_empty() && prev.1.last().is_some_and(|index| index != 0),
        }
    }

    /// Wrapper for stray inline children of a block container. With `None` they are
    /// removed instead.
    fn fallback_element(&self) -> Option<Element> {
        None
    }

    fn on_change(&self, _change: &Change) {}

    fn on_error(&self, _error: &EditorError) -> ErrorAction {
        ErrorAction::Raise
    }
}

/// Plain schema: every element is a selectable, editable, non-void block.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSchema;

impl Schema for DefaultSchema {}
