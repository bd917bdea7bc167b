//! Location resolution and tree queries on the editor.

use crate::editing::{Editor, Match};
use crate::error::{EditorError, Result};
use crate::location::{Edge, Location, Path, Point, Range, Span};
use crate::editing::positions::NextOptions;
use crate::node::text::char_slice;
use crate::node::traverse::PassFn;
use crate::node::{Element, Node, NodeEntries, NodeEntry, Properties, Text, TraverseOptions};

/// Which matching nodes along one branch a query or transform acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    All,
    Highest,
    Lowest,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PathOptions {
    pub depth: Option<usize>,
    pub edge: Option<Edge>,
}

impl PathOptions {
    pub fn edge(edge: Edge) -> Self {
        PathOptions {
            edge: Some(edge),
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub struct NodesOptions<'a> {
    /// Defaults to the selection; nothing is yielded without either.
    pub at: Option<Location>,
    /// Walk between two paths instead of a location.
    pub span: Option<Span>,
    pub matches: Option<Match<'a>>,
    pub mode: Mode,
    /// Stop at the first leaf branch that has no match.
    pub universal: bool,
    pub reverse: bool,
    /// Descend into void and read-only elements.
    pub voids: bool,
    pub pass: Option<PassFn<'a>>,
    pub ignore_non_selectable: bool,
}

#[derive(Default, Clone)]
pub struct LevelsOptions<'a> {
    pub at: Option<Location>,
    pub matches: Option<Match<'a>>,
    pub reverse: bool,
    pub voids: bool,
}

#[derive(Clone)]
pub struct AboveOptions<'a> {
    pub at: Option<Location>,
    pub matches: Option<Match<'a>>,
    pub mode: Mode,
    pub voids: bool,
}

impl Default for AboveOptions<'_> {
    fn default() -> Self {
        AboveOptions {
            at: None,
            matches: None,
            mode: Mode::Lowest,
            voids: false,
        }
    }
}

/// Iterator returned by [`Editor::nodes`]. Matches are filtered and reduced by mode as
/// the underlying walk advances.
pub struct Nodes<'a, 'o> {
    editor: &'a Editor,
    entries: Option<NodeEntries<'a, 'o>>,
    matches: Match<'o>,
    mode: Mode,
    universal: bool,
    ignore_non_selectable: bool,
    /// Last match on the current branch; held back in `Mode::Lowest` until a deeper
    /// match replaces it or the branch ends.
    hit: Option<NodeEntry<'a>>,
}

impl<'a> Nodes<'a, '_> {
    pub(crate) fn empty(editor: &'a Editor) -> Self {
        Nodes {
            editor,
            entries: None,
            matches: Match::Any,
            mode: Mode::All,
            universal: false,
            ignore_non_selectable: false,
            hit: None,
        }
    }
}

impl<'a> Iterator for Nodes<'a, '_> {
    type Item = NodeEntry<'a>;

    fn next(&mut self) -> Option<NodeEntry<'a>> {
        let editor = self.editor;
        while let Some((node, path)) = self.entries.as_mut().and_then(Iterator::next) {
            if self.ignore_non_selectable && node.as_element().is_some_and(|e| !editor.is_selectable(e)) {
                continue;
            }
            let is_lower = self
                .hit
                .as_ref()
                .is_some_and(|(_, hit_path)| path.compare(hit_path).is_eq());

            if self.mode == Mode::Highest && is_lower {
                continue;
            }

            if !editor.is_match(&self.matches, node, &path) {
                if self.universal && !is_lower && node.is_text() {
                    self.entries = None;
                    self.hit = None;
                    return None;
                }
                continue;
            }

            if self.mode == Mode::Lowest {
                let emit = self.hit.replace((node, path));
                if is_lower || emit.is_none() {
                    continue;
                }
                return emit;
            }
            self.hit = Some((node, path.clone()));
            return Some((node, path));
        }

        self.entries = None;
        if self.mode == Mode::Lowest {
            self.hit.take()
        } else {
            None
        }
    }
}

impl Editor {
    pub(crate) fn resolve_at(&self, at: Option<Location>) -> Option<Location> {
        at.or_else(|| self.selection.clone().map(Location::Range))
    }

    /// Resolve a location to a single path. Ranges resolve to the common ancestor of
    /// their endpoints unless an edge is requested.
    pub fn path(&self, at: impl Into<Location>, options: PathOptions) -> Result<Path> {
        let path = match at.into() {
            Location::Path(path) => match options.edge {
                Some(Edge::Start) => self.root.first(&path)?.1,
                Some(Edge::End) => self.root.last(&path)?.1,
                None => path,
            },
            Location::Range(range) => match options.edge {
                Some(Edge::Start) => range.start().path,
                Some(Edge::End) => range.end().path,
                None => range.anchor.path.common(&range.focus.path),
            },
            Location::Point(point) => point.path,
        };
        Ok(match options.depth {
            Some(depth) => path.truncated(depth),
            None => path,
        })
    }

    /// Resolve a location to a point: the first or last text position of a path, or the
    /// requested edge of a range.
    pub fn point(&self, at: impl Into<Location>, edge: Edge) -> Result<Point> {
        match at.into() {
            Location::Path(at) => {
                let (node, path) = match edge {
                    Edge::Start => self.root.first(&at)?,
                    Edge::End => self.root.last(&at)?,
                };
                let Node::Text(text) = node else {
                    return Err(EditorError::NoEdgeText { edge, path: at });
                };
                let offset = match edge {
                    Edge::Start => 0,
                    Edge::End => text.len(),
                };
                Ok(Point::new(path, offset))
            }
            Location::Range(range) => Ok(match edge {
                Edge::Start => range.start(),
                Edge::End => range.end(),
            }),
            Location::Point(point) => Ok(point),
        }
    }

    pub fn start(&self, at: impl Into<Location>) -> Result<Point> {
        self.point(at, Edge::Start)
    }

    pub fn end(&self, at: impl Into<Location>) -> Result<Point> {
        self.point(at, Edge::End)
    }

    pub fn edges(&self, at: impl Into<Location>) -> Result<(Point, Point)> {
        let at = at.into();
        Ok((self.start(&at)?, self.end(&at)?))
    }

    /// A range from the start of `at` to the end of `to` (or of `at`). Ranges pass
    /// through unchanged.
    pub fn range(&self, at: impl Into<Location>, to: Option<Location>) -> Result<Range> {
        let at = at.into();
        if let (Location::Range(range), None) = (&at, &to) {
            return Ok(range.clone());
        }
        let start = self.start(&at)?;
        let end = self.end(to.unwrap_or(at))?;
        Ok(Range::new(start, end))
    }

    pub fn node(&self, at: impl Into<Location>, options: PathOptions) -> Result<NodeEntry<'_>> {
        let path = self.path(at, options)?;
        Ok((self.root.get(&path)?, path))
    }

    pub fn leaf(&self, at: impl Into<Location>, options: PathOptions) -> Result<(&Text, Path)> {
        let path = self.path(at, options)?;
        Ok((self.root.leaf(&path)?, path))
    }

    pub fn parent(&self, at: impl Into<Location>, options: PathOptions) -> Result<NodeEntry<'_>> {
        let path = self.path(at, options)?;
        let parent = path.parent()?;
        Ok((self.root.get(&parent)?, parent))
    }

    pub fn first(&self, at: impl Into<Location>) -> Result<NodeEntry<'_>> {
        self.node(at, PathOptions::edge(Edge::Start))
    }

    pub fn last(&self, at: impl Into<Location>) -> Result<NodeEntry<'_>> {
        self.node(at, PathOptions::edge(Edge::End))
    }

    pub fn has_path(&self, path: &Path) -> bool {
        self.root.has(path)
    }

    /// Matching nodes from the root down to `at`, stopping below the first void or
    /// read-only element unless `voids` is set.
    pub fn levels(&self, options: LevelsOptions<'_>) -> Result<Vec<NodeEntry<'_>>> {
        let Some(at) = self.resolve_at(options.at) else {
            return Ok(Vec::new());
        };
        let path = self.path(at, PathOptions::default())?;
        let matches = options.matches.unwrap_or_default();
        let mut levels = Vec::new();
        for (node, path) in self.root.levels(&path)? {
            if !self.is_match(&matches, node, &path) {
                continue;
            }
            let stop = !options.voids
                && node
                    .as_element()
                    .is_some_and(|e| self.is_void(e) || self.is_element_read_only(e));
            levels.push((node, path));
            if stop {
                break;
            }
        }
        if options.reverse {
            levels.reverse();
        }
        Ok(levels)
    }

    /// Depth-first nodes inside a location, filtered by `matches` and reduced by `mode`.
    pub fn nodes<'a, 'o>(&'a self, options: NodesOptions<'o>) -> Result<Nodes<'a, 'o>>
    where
        'a: 'o,
    {
        let NodesOptions {
            at,
            span,
            matches,
            mode,
            universal,
            reverse,
            voids,
            pass,
            ignore_non_selectable,
        } = options;

        let (from, to) = match span {
            Some(span) => (span.from, span.to),
            None => {
                let Some(at) = self.resolve_at(at) else {
                    return Ok(Nodes::empty(self));
                };
                let first = self.path(&at, PathOptions::edge(Edge::Start))?;
                let last = self.path(&at, PathOptions::edge(Edge::End))?;
                if reverse { (last, first) } else { (first, last) }
            }
        };

        let entries = self.root.entries(TraverseOptions {
            from,
            to: Some(to),
            reverse,
            pass: Some(Box::new(move |node: &Node, path: &Path| {
                if pass.as_ref().is_some_and(|pass| pass(node, path)) {
                    return true;
                }
                let Node::Element(element) = node else {
                    return false;
                };
                if !voids && (self.is_void(element) || self.is_element_read_only(element)) {
                    return true;
                }
                ignore_non_selectable && !self.is_selectable(element)
            })),
        });

        Ok(Nodes {
            editor: self,
            entries: Some(entries),
            matches: matches.unwrap_or_default(),
            mode,
            universal,
            ignore_non_selectable,
            hit: None,
        })
    }

    /// The closest (or, with `Mode::Highest`, furthest) matching ancestor of `at`.
    ///
    /// For a path or point the node itself is skipped; for a range the ancestor must
    /// contain both endpoints.
    pub fn above(&self, options: AboveOptions<'_>) -> Result<Option<NodeEntry<'_>>> {
        let Some(at) = self.resolve_at(options.at) else {
            return Ok(None);
        };
        let path = self.path(&at, PathOptions::default())?;
        let levels = self.levels(LevelsOptions {
            at: Some(Location::Path(path.clone())),
            matches: options.matches,
            reverse: options.mode == Mode::Lowest,
            voids: options.voids,
        })?;
        for (node, level) in levels {
            if node.is_text() {
                continue;
            }
            let found = match &at {
                Location::Range(range) => {
                    level.is_ancestor(&range.anchor.path) && level.is_ancestor(&range.focus.path)
                }
                _ => level != path,
            };
            if found {
                return Ok(Some((node, level)));
            }
        }
        Ok(None)
    }

    /// The closest void element above `at`.
    pub fn void(&self, options: AboveOptions<'_>) -> Result<Option<NodeEntry<'_>>> {
        self.above(AboveOptions {
            matches: Some(Match::Void),
            ..options
        })
    }

    /// The closest read-only element above `at`.
    pub fn element_read_only(&self, options: AboveOptions<'_>) -> Result<Option<NodeEntry<'_>>> {
        self.above(AboveOptions {
            matches: Some(Match::custom(|node: &Node, _: &Path| {
                node.as_element()
                    .is_some_and(|e| self.is_element_read_only(e))
            })),
            ..options
        })
    }

    /// The closest block above `at`.
    pub fn block_above(&self, at: impl Into<Location>, voids: bool) -> Result<Option<NodeEntry<'_>>> {
        self.above(AboveOptions {
            at: Some(at.into()),
            matches: Some(Match::Block),
            voids,
            ..Default::default()
        })
    }

    /// Text of `at` with no separators between blocks. Void content is skipped unless
    /// `voids` is set.
    pub fn string(&self, at: impl Into<Location>) -> Result<String> {
        self.string_with(at, false)
    }

    pub fn string_with(&self, at: impl Into<Location>, voids: bool) -> Result<String> {
        match self.collect_string(at.into(), voids) {
            Ok(text) => Ok(text),
            Err(err) => self.report(err, Some(String::new())),
        }
    }

    fn collect_string(&self, at: Location, voids: bool) -> Result<String> {
        let range = self.range(at, None)?;
        let (start, end) = range.edges();
        let texts = self.nodes(NodesOptions {
            at: Some(Location::Range(range)),
            matches: Some(Match::Text),
            voids,
            ..Default::default()
        })?;
        let mut text = String::new();
        for (node, path) in texts {
            let Some(leaf) = node.as_text() else {
                continue;
            };
            let mut to = leaf.len();
            if path == end.path {
                to = end.offset.min(to);
            }
            let from = if path == start.path { start.offset.min(to) } else { 0 };
            text.push_str(char_slice(&leaf.text, from, to));
        }
        Ok(text)
    }

    /// Detached copy of the content covered by `at`.
    pub fn fragment(&self, at: impl Into<Location>) -> Result<Vec<Node>> {
        let fragment = self
            .range(at, None)
            .and_then(|range| self.root.fragment(&range));
        match fragment {
            Ok(fragment) => Ok(fragment),
            Err(err) => self.report(err, Some(Vec::new())),
        }
    }

    pub fn is_empty(&self, element: &Element) -> bool {
        match element.children.as_slice() {
            [] => true,
            [only] => only.as_text().is_some_and(Text::is_empty) && !self.is_void(element),
            _ => false,
        }
    }

    pub fn has_blocks(&self, element: &Element) -> bool {
        element
            .children
            .iter()
            .any(|child| child.as_element().is_some_and(|e| self.is_block(e)))
    }

    pub fn has_inlines(&self, element: &Element) -> bool {
        element.children.iter().all(|child| {
            child.is_text() || child.as_element().is_some_and(|e| self.is_inline(e))
        })
    }

    pub fn has_texts(&self, element: &Element) -> bool {
        element.children.iter().all(|child| child.is_text())
    }

    pub fn is_start(&self, point: &Point, at: impl Into<Location>) -> Result<bool> {
        if point.offset != 0 {
            return Ok(false);
        }
        Ok(*point == self.start(at)?)
    }

    pub fn is_end(&self, point: &Point, at: impl Into<Location>) -> Result<bool> {
        Ok(*point == self.end(at)?)
    }

    pub fn is_edge(&self, point: &Point, at: impl Into<Location>) -> Result<bool> {
        let at = at.into();
        Ok(self.is_start(point, &at)? || self.is_end(point, &at)?)
    }

    /// Pull the end of a range that hangs into the start of the next block back to the
    /// end of the last non-empty text before it.
    pub fn unhang_range(&self, range: &Range, voids: bool) -> Result<Range> {
        let (start, mut end) = range.edges();
        if start.offset != 0 || end.offset != 0 || range.is_collapsed() || end.path.has_previous() {
            return Ok(range.clone());
        }

        let block_path = self
            .block_above(&end, voids)?
            .map(|(_, path)| path)
            .unwrap_or_default();
        let before = Range::new(start.clone(), end.clone());
        let texts = self.nodes(NodesOptions {
            at: Some(Location::Range(before)),
            matches: Some(Match::Text),
            reverse: true,
            voids,
            ..Default::default()
        })?;
        for (node, path) in texts.skip(1) {
            let Some(text) = node.as_text() else {
                continue;
            };
            if !text.is_empty() || path.is_before(&block_path) {
                end = Point::new(path, text.len());
                break;
            }
        }
        Ok(Range::new(start, end))
    }

    /// Marks that text inserted at the selection would carry.
    pub fn marks(&self) -> Result<Option<Properties>> {
        let Some(selection) = self.selection.clone() else {
            return Ok(None);
        };
        if let Some(marks) = &self.marks {
            return Ok(Some(marks.clone()));
        }

        if selection.is_expanded() {
            let (mut anchor, focus) = selection.edges();
            if self.is_end(&anchor, &anchor.path)? {
                if let Some(after) = self.after(&anchor, Default::default())? {
                    anchor = after;
                }
            }
            let first_text = self
                .nodes(NodesOptions {
                    at: Some(Location::Range(Range::new(anchor, focus))),
                    matches: Some(Match::Text),
                    ..Default::default()
                })?
                .next();
            return Ok(Some(
                first_text.map(|(node, _)| node.extract_props()).unwrap_or_default(),
            ));
        }

        let anchor = selection.anchor;
        let (mut node, _) = self.leaf(&anchor.path, PathOptions::default())?;
        if anchor.offset == 0 {
            let previous = self.previous(NextOptions {
                at: Some(Location::Path(anchor.path.clone())),
                matches: Some(Match::Text),
                ..Default::default()
            })?;
            let marked_void = self.above(AboveOptions {
                matches: Some(Match::custom(|n: &Node, _: &Path| {
                    n.as_element()
                        .is_some_and(|e| self.is_void(e) && self.markable_void(e))
                })),
                ..Default::default()
            })?;
            if marked_void.is_none() {
                let block = self.above(AboveOptions {
                    matches: Some(Match::Block),
                    ..Default::default()
                })?;
                if let (Some((prev_node, prev_path)), Some((_, block_path))) = (previous, block) {
                    if block_path.is_ancestor(&prev_path) {
                        if let Some(text) = prev_node.as_text() {
                            node = text;
                        }
                    }
                }
            }
        }
        Ok(Some(node.marks.clone()))
    }
}
