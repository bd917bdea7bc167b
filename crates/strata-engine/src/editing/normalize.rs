//! Dirty-path normalization: the fixpoint pass that repairs the tree after every change.

use log::{debug, error};

use crate::editing::Editor;
use crate::error::{EditorError, Result};
use crate::location::Path;
use crate::node::{Node, Text, TraverseOptions};
use crate::operation::Operation;
use crate::transforms::{InsertNodesOptions, NodeOptions};

/// Context handed to [`crate::Schema::normalize_node`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeNodeOptions {
    /// The operation whose application triggered this pass, if any.
    pub operation: Option<Operation>,
}

/// Loop state handed to [`crate::Schema::should_normalize`] before each iteration.
#[derive(Debug, Clone)]
pub struct ShouldNormalize {
    pub iteration: usize,
    pub initial_dirty_paths_len: usize,
    pub dirty_paths_len: usize,
    pub operation: Option<Operation>,
}

impl Editor {
    pub fn is_normalizing(&self) -> bool {
        self.normalizing
    }

    /// Run pending normalization. With `force`, every node in the document is treated
    /// as dirty first.
    pub fn normalize(&mut self, force: bool) -> Result<()> {
        self.normalize_with(force, None)
    }

    /// Apply a group of changes with normalization suspended, then normalize once if
    /// `f` succeeded.
    pub fn without_normalizing<T>(&mut self, f: impl FnOnce(&mut Editor) -> Result<T>) -> Result<T> {
        let normalizing = self.normalizing;
        self.normalizing = false;
        let result = f(self);
        self.normalizing = normalizing;
        let value = result?;
        self.normalize(false)?;
        Ok(value)
    }

    pub(crate) fn normalize_with(&mut self, force: bool, operation: Option<&Operation>) -> Result<()> {
        if !self.normalizing {
            return Ok(());
        }
        if force {
            let all: Vec<Path> = self
                .root
                .entries(TraverseOptions::default())
                .map(|(_, path)| path)
                .collect();
            self.dirty.replace(all);
        }
        if self.dirty.len() == 0 {
            return Ok(());
        }

        let options = NormalizeNodeOptions {
            operation: operation.cloned(),
        };
        // Suspended by hand: a vetoed pass leaves paths behind, and re-entering here on
        // exit would loop.
        let normalizing = self.normalizing;
        self.normalizing = false;
        let result = (|| -> Result<()> {
            let editor = &mut *self;
            let schema = editor.schema();

            // Empty elements first: filling them never moves another path, and several
            // repairs assume every element has a child.
            for path in editor.dirty.snapshot() {
                let empty = editor
                    .root
                    .get(&path)
                    .is_ok_and(|node| node.is_element() && node.children().is_empty());
                if empty {
                    schema.normalize_node(editor, &path, &options)?;
                }
            }

            let initial = editor.dirty.len();
            debug!("normalizing {initial} dirty paths");
            let mut iteration = 0;
            while editor.dirty.len() != 0 {
                let context = ShouldNormalize {
                    iteration,
                    initial_dirty_paths_len: initial,
                    dirty_paths_len: editor.dirty.len(),
                    operation: options.operation.clone(),
                };
                if !schema.should_normalize(editor, &context)? {
                    return Ok(());
                }
                let Some(path) = editor.dirty.pop() else {
                    break;
                };
                if editor.root.has(&path) {
                    schema.normalize_node(editor, &path, &options)?;
                }
                iteration += 1;
            }
            Ok(())
        })();
        self.normalizing = normalizing;
        result
    }
}

pub(crate) fn should_normalize_default(editor: &Editor, context: &ShouldNormalize) -> Result<bool> {
    let max = context.initial_dirty_paths_len * editor.config.normalization.max_iterations_factor;
    if context.iteration > max {
        error!("normalization did not converge after {max} iterations");
        return Err(EditorError::NormalizationDiverged { iterations: max });
    }
    Ok(true)
}

/// The built-in repairs:
///
/// - an element with no children gets an empty text leaf,
/// - a container holds either only blocks or only inlines and text, decided by its first
///   child (the root always holds blocks),
/// - inline elements sit between text leaves,
/// - adjacent text leaves with equal marks are merged and empty ones dropped.
pub(crate) fn normalize_node_default(
    editor: &mut Editor,
    path: &Path,
    _options: &NormalizeNodeOptions,
) -> Result<()> {
    let node = editor.root.get(path)?.clone();
    let Node::Element(element) = &node else {
        return Ok(());
    };

    if element.children.is_empty() {
        if !path.is_empty() {
            editor.insert_nodes(
                vec![Node::text("")],
                InsertNodesOptions {
                    at: Some(path.child(0).into()),
                    voids: true,
                    ..Default::default()
                },
            )?;
        }
        return Ok(());
    }

    let should_have_inlines = !path.is_empty()
        && (editor.is_inline(element)
            || element.children[0].is_text()
            || element.children[0]
                .as_element()
                .is_some_and(|first| editor.is_inline(first)));

    let at = |index: usize| NodeOptions {
        at: Some(path.child(index).into()),
        voids: true,
        ..Default::default()
    };

    let count = element.children.len();
    let mut n: isize = 0;
    for i in 0..count {
        let index = n.max(0) as usize;
        let current = editor.root.get(path)?;
        let Some(child) = current.children().get(index).cloned() else {
            break;
        };
        let prev = index
            .checked_sub(1)
            .and_then(|p| current.children().get(p).cloned());
        let is_last = i == count - 1;
        let is_inline_or_text =
            child.is_text() || child.as_element().is_some_and(|e| editor.is_inline(e));

        if is_inline_or_text != should_have_inlines {
            if is_inline_or_text {
                match editor.schema().fallback_element() {
                    Some(wrapper) => editor.wrap_nodes(wrapper, at(index))?,
                    None => editor.remove_nodes(at(index))?,
                }
            } else {
                editor.unwrap_nodes(at(index))?;
            }
            n -= 1;
        } else if let Node::Element(child) = child.as_ref() {
            if editor.is_inline(child) {
                let prev_is_text = prev.as_deref().is_some_and(Node::is_text);
                if !prev_is_text {
                    insert_empty_text(editor, path.child(index))?;
                    n += 1;
                } else if is_last {
                    insert_empty_text(editor, path.child(index + 1))?;
                    n += 1;
                }
            }
        } else if let (Node::Text(child), Some(Node::Text(prev))) =
            (child.as_ref(), prev.as_deref())
        {
            if child.equals_loose(prev) {
                editor.merge_nodes(at(index))?;
                n -= 1;
            } else if prev.is_empty() {
                editor.remove_nodes(at(index - 1))?;
                n -= 1;
            } else if child.is_empty() {
                editor.remove_nodes(at(index))?;
                n -= 1;
            }
        }
        n += 1;
    }
    Ok(())
}

fn insert_empty_text(editor: &mut Editor, at: Path) -> Result<()> {
    editor.insert_nodes(
        vec![Node::Text(Text::new(""))],
        InsertNodesOptions {
            at: Some(at.into()),
            voids: true,
            ..Default::default()
        },
    )
}
