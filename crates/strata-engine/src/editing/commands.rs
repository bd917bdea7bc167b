//! High-level editing commands acting on the current selection, as a host would bind
//! them to keys.

use log::debug;
use serde_json::Value;

use crate::editing::{Editor, Match, PathOptions, Unit};
use crate::error::Result;
use crate::node::{Node, Properties, Text};
use crate::transforms::{
    DeleteOptions, InsertNodesOptions, InsertTextOptions, NodeOptions, SetNodesOptions,
    SplitNodesOptions,
};

/// Which way [`Editor::delete_fragment`] leaves the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Text leaves that can carry marks: those not inside a void, unless the void accepts marks.
fn markable_text() -> Match<'static> {
    Match::predicate(|editor, node, path| {
        if !node.is_text() {
            return false;
        }
        match editor.parent(path, PathOptions::default()) {
            Ok((Node::Element(parent), _)) => !editor.is_void(parent) || editor.markable_void(parent),
            _ => true,
        }
    })
}

impl Editor {
    /// Whether a collapsed selection sits in a void that accepts marks.
    fn mark_accepting_void_selected(&self) -> Result<bool> {
        let Some(selection) = &self.selection else {
            return Ok(false);
        };
        let (node, path) = self.node(selection, PathOptions::default())?;
        if !self.is_match(&markable_text(), node, &path) {
            return Ok(false);
        }
        Ok(match self.parent(&path, PathOptions::default())? {
            (Node::Element(parent), _) => self.markable_void(parent),
            _ => false,
        })
    }

    /// Apply a mark to the selected text, or to the pending marks when the selection
    /// is collapsed.
    pub fn add_mark(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        let value = value.into();
        if selection.is_expanded() || self.mark_accepting_void_selected()? {
            let mut props = Properties::new();
            props.insert(key.to_string(), value);
            self.set_nodes(props, mark_options())
        } else {
            let mut marks = self.marks()?.unwrap_or_default();
            marks.insert(key.to_string(), value);
            debug!("pending marks now {:?}", marks.keys().collect::<Vec<_>>());
            self.set_marks(Some(marks));
            Ok(())
        }
    }

    /// Remove a mark from the selected text, or from the pending marks.
    pub fn remove_mark(&mut self, key: &str) -> Result<()> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        if selection.is_expanded() || self.mark_accepting_void_selected()? {
            let options = mark_options();
            self.unset_nodes(&[key], options.node)
        } else {
            let mut marks = self.marks()?.unwrap_or_default();
            marks.remove(key);
            self.set_marks(Some(marks));
            Ok(())
        }
    }

    pub fn delete_backward(&mut self, unit: Unit) -> Result<()> {
        if !self.selection.as_ref().is_some_and(|s| s.is_collapsed()) {
            return Ok(());
        }
        self.delete(DeleteOptions {
            unit,
            reverse: true,
            ..Default::default()
        })
    }

    pub fn delete_forward(&mut self, unit: Unit) -> Result<()> {
        if !self.selection.as_ref().is_some_and(|s| s.is_collapsed()) {
            return Ok(());
        }
        self.delete(DeleteOptions {
            unit,
            ..Default::default()
        })
    }

    /// Delete an expanded selection.
    pub fn delete_fragment(&mut self, direction: Direction) -> Result<()> {
        if !self.selection.as_ref().is_some_and(|s| s.is_expanded()) {
            return Ok(());
        }
        self.delete(DeleteOptions {
            reverse: direction == Direction::Backward,
            ..Default::default()
        })
    }

    /// Copy of the selected content.
    pub fn get_fragment(&self) -> Result<Vec<Node>> {
        match &self.selection {
            Some(selection) => self.root.fragment(selection),
            None => Ok(Vec::new()),
        }
    }

    /// Split the block at the selection.
    pub fn insert_break(&mut self) -> Result<()> {
        self.split_nodes(SplitNodesOptions {
            always: true,
            ..Default::default()
        })
    }

    pub fn insert_soft_break(&mut self) -> Result<()> {
        self.split_nodes(SplitNodesOptions {
            always: true,
            ..Default::default()
        })
    }

    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        self.insert_nodes(vec![node], InsertNodesOptions::default())
    }

    /// Insert text at the selection. Pending marks are applied by inserting a marked
    /// leaf, and cleared afterwards.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        if self.selection.is_none() {
            return Ok(());
        }
        match self.marks.clone() {
            Some(marks) => {
                let leaf = Text {
                    text: text.to_string(),
                    marks,
                };
                self.insert_nodes(vec![Node::Text(leaf)], InsertNodesOptions::default())?;
            }
            None => self.insert_text_at(text, InsertTextOptions::default())?,
        }
        if self.marks.is_some() {
            self.set_marks(None);
        }
        Ok(())
    }
}

fn mark_options() -> SetNodesOptions<'static> {
    SetNodesOptions::from(NodeOptions {
        matches: Some(markable_text()),
        split: true,
        voids: true,
        ..Default::default()
    })
}
