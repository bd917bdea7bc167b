use crate::editing::{BeforeOptions, Editor, Unit};
use crate::error::Result;
use crate::location::{Location, Path, Point};
use crate::operation::{Operation, SelectionPatch};

/// One end of the selection. `Start` and `End` resolve against document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEdge {
    Anchor,
    Focus,
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
pub struct MoveOptions {
    pub distance: usize,
    pub unit: Unit,
    pub reverse: bool,
    /// Move only this end; both ends move when unset.
    pub edge: Option<SelectionEdge>,
}

impl Default for MoveOptions {
    fn default() -> Self {
        MoveOptions {
            distance: 1,
            unit: Unit::Character,
            reverse: false,
            edge: None,
        }
    }
}

/// Partial point update for [`Editor::set_point`].
#[derive(Debug, Clone, Default)]
pub struct PointPatch {
    pub path: Option<Path>,
    pub offset: Option<usize>,
}

impl Editor {
    /// Resolve `Start`/`End` to the anchor or focus of the current selection.
    fn resolve_edge(&self, edge: SelectionEdge) -> SelectionEdge {
        let backward = self.selection.as_ref().is_some_and(|s| s.is_backward());
        match edge {
            SelectionEdge::Start if backward => SelectionEdge::Focus,
            SelectionEdge::Start => SelectionEdge::Anchor,
            SelectionEdge::End if backward => SelectionEdge::Anchor,
            SelectionEdge::End => SelectionEdge::Focus,
            other => other,
        }
    }

    /// Collapse the selection onto one of its ends.
    pub fn collapse(&mut self, edge: SelectionEdge) -> Result<()> {
        let Some(selection) = &self.selection else {
            return Ok(());
        };
        let point = match edge {
            SelectionEdge::Anchor => selection.anchor.clone(),
            SelectionEdge::Focus => selection.focus.clone(),
            SelectionEdge::Start => selection.start(),
            SelectionEdge::End => selection.end(),
        };
        self.select(point)
    }

    pub fn deselect(&mut self) -> Result<()> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        self.apply(Operation::SetSelection {
            properties: Some(selection.into()),
            new_properties: None,
        })
    }

    /// Move the selection ends by `distance` units, skipping non-selectable elements.
    pub fn move_selection(&mut self, options: MoveOptions) -> Result<()> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        let edge = options.edge.map(|edge| self.resolve_edge(edge));
        let step = BeforeOptions {
            distance: options.distance,
            unit: options.unit,
            ignore_non_selectable: true,
            ..Default::default()
        };
        let shift = |editor: &Editor, point: &Point| -> Result<Option<Point>> {
            if options.reverse {
                editor.before(point, step)
            } else {
                editor.after(point, step)
            }
        };

        let mut patch = SelectionPatch::default();
        if matches!(edge, None | Some(SelectionEdge::Anchor)) {
            patch.anchor = shift(self, &selection.anchor)?;
        }
        if matches!(edge, None | Some(SelectionEdge::Focus)) {
            patch.focus = shift(self, &selection.focus)?;
        }
        self.set_selection(patch)
    }

    /// Select a location. Paths and points are resolved to ranges first.
    pub fn select(&mut self, target: impl Into<Location>) -> Result<()> {
        let target = self.range(target, None)?;
        if self.selection.is_some() {
            return self.set_selection(target.into());
        }
        self.apply(Operation::SetSelection {
            properties: None,
            new_properties: Some(target.into()),
        })
    }

    /// Update one end of the selection in place. Without an edge the focus is updated.
    pub fn set_point(&mut self, patch: PointPatch, edge: Option<SelectionEdge>) -> Result<()> {
        let Some(selection) = &self.selection else {
            return Ok(());
        };
        let edge = self.resolve_edge(edge.unwrap_or(SelectionEdge::Focus));
        let mut point = match edge {
            SelectionEdge::Anchor => selection.anchor.clone(),
            _ => selection.focus.clone(),
        };
        if let Some(path) = patch.path {
            point.path = path;
        }
        if let Some(offset) = patch.offset {
            point.offset = offset;
        }
        let patch = match edge {
            SelectionEdge::Anchor => SelectionPatch {
                anchor: Some(point),
                focus: None,
            },
            _ => SelectionPatch {
                anchor: None,
                focus: Some(point),
            },
        };
        self.set_selection(patch)
    }

    /// Apply the parts of `patch` that differ from the current selection. Does nothing
    /// without a selection; use [`Editor::select`] to create one.
    pub fn set_selection(&mut self, patch: SelectionPatch) -> Result<()> {
        let Some(selection) = &self.selection else {
            return Ok(());
        };

        let mut old = SelectionPatch::default();
        let mut new = SelectionPatch::default();
        if let Some(anchor) = patch.anchor.filter(|anchor| *anchor != selection.anchor) {
            old.anchor = Some(selection.anchor.clone());
            new.anchor = Some(anchor);
        }
        if let Some(focus) = patch.focus.filter(|focus| *focus != selection.focus) {
            old.focus = Some(selection.focus.clone());
            new.focus = Some(focus);
        }
        if new.is_empty() {
            return Ok(());
        }
        self.apply(Operation::SetSelection {
            properties: Some(old),
            new_properties: Some(new),
        })
    }
}
