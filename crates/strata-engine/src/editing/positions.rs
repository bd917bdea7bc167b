//! Caret positions: stepping through the document by offset, character, word, line or
//! block, and the `before`/`after`/`next`/`previous` queries built on it.

use std::collections::VecDeque;
use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::editing::queries::{Mode, Nodes, NodesOptions};
use crate::editing::{Editor, Match};
use crate::error::{EditorError, Result};
use crate::location::{Location, Path, Point, Range, Span};
use crate::node::text::char_len;
use crate::node::{Node, NodeEntry};

/// Step size for [`Editor::positions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Offset,
    Character,
    Word,
    Line,
    Block,
}

#[derive(Debug, Clone, Default)]
pub struct PositionsOptions {
    pub at: Option<Location>,
    pub unit: Unit,
    pub reverse: bool,
    pub voids: bool,
    pub ignore_non_selectable: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BeforeOptions {
    pub distance: usize,
    pub unit: Unit,
    pub voids: bool,
    /// Step over positions inside non-selectable elements.
    pub ignore_non_selectable: bool,
}

impl Default for BeforeOptions {
    fn default() -> Self {
        BeforeOptions {
            distance: 1,
            unit: Unit::Offset,
            voids: false,
            ignore_non_selectable: false,
        }
    }
}

#[derive(Clone)]
pub struct NextOptions<'a> {
    pub at: Option<Location>,
    pub matches: Option<Match<'a>>,
    pub mode: Mode,
    pub voids: bool,
}

impl Default for NextOptions<'_> {
    fn default() -> Self {
        NextOptions {
            at: None,
            matches: None,
            mode: Mode::Lowest,
            voids: false,
        }
    }
}

/// Lazy walk over caret positions. Each leaf's positions are computed when the walk
/// reaches it, so callers that stop early never visit the rest of the document.
pub struct Positions<'a> {
    editor: &'a Editor,
    entries: Nodes<'a, 'a>,
    unit: Unit,
    reverse: bool,
    voids: bool,
    start: Point,
    end: Point,
    first: Point,
    is_new_block: bool,
    block_text: String,
    distance: isize,
    pending: VecDeque<Point>,
}

impl Editor {
    pub fn positions(&self, options: PositionsOptions) -> Result<Positions<'_>> {
        let at = match options.at.or_else(|| self.selection.clone().map(Location::Range)) {
            Some(at) => at,
            None => {
                return Ok(Positions::empty(self, options.unit));
            }
        };
        let range = self.range(&at, None)?;
        let (start, end) = range.edges();
        let first = if options.reverse { end.clone() } else { start.clone() };
        let entries = self.nodes(NodesOptions {
            at: Some(at),
            reverse: options.reverse,
            voids: options.voids,
            ignore_non_selectable: options.ignore_non_selectable,
            ..Default::default()
        })?;
        Ok(Positions {
            editor: self,
            entries,
            unit: options.unit,
            reverse: options.reverse,
            voids: options.voids,
            start,
            end,
            first,
            is_new_block: false,
            block_text: String::new(),
            distance: 0,
            pending: VecDeque::new(),
        })
    }

    /// The point `distance` units before `at`, if the document has one.
    pub fn before(&self, at: impl Into<Location>, options: BeforeOptions) -> Result<Option<Point>> {
        let anchor = self.start(Path::root())?;
        let focus = self.point(at, crate::location::Edge::Start)?;
        let positions = self.positions(PositionsOptions {
            at: Some(Location::Range(Range::new(anchor, focus))),
            unit: options.unit,
            reverse: true,
            voids: options.voids,
            ignore_non_selectable: options.ignore_non_selectable,
        })?;
        Ok(step(positions, options.distance))
    }

    /// The point `distance` units after `at`, if the document has one.
    pub fn after(&self, at: impl Into<Location>, options: BeforeOptions) -> Result<Option<Point>> {
        let anchor = self.point(at, crate::location::Edge::End)?;
        let focus = self.end(Path::root())?;
        let positions = self.positions(PositionsOptions {
            at: Some(Location::Range(Range::new(anchor, focus))),
            unit: options.unit,
            reverse: false,
            voids: options.voids,
            ignore_non_selectable: options.ignore_non_selectable,
        })?;
        Ok(step(positions, options.distance))
    }

    /// The first matching node after `at`. Without a match, a path location looks for
    /// its next sibling.
    pub fn next(&self, options: NextOptions<'_>) -> Result<Option<NodeEntry<'_>>> {
        self.sibling_node(options, false)
    }

    /// The first matching node before `at`. Without a match, a path location looks for
    /// its previous sibling.
    pub fn previous(&self, options: NextOptions<'_>) -> Result<Option<NodeEntry<'_>>> {
        self.sibling_node(options, true)
    }

    fn sibling_node(&self, options: NextOptions<'_>, reverse: bool) -> Result<Option<NodeEntry<'_>>> {
        let Some(at) = options.at.or_else(|| self.selection.clone().map(Location::Range)) else {
            return Ok(None);
        };
        let direction = if reverse { "previous" } else { "next" };
        if matches!(&at, Location::Path(path) if path.is_empty()) {
            return Err(EditorError::SiblingOfRoot { direction });
        }

        let step_options = BeforeOptions {
            voids: options.voids,
            ..Default::default()
        };
        let point = if reverse {
            self.before(&at, step_options)?
        } else {
            self.after(&at, step_options)?
        };
        let Some(point) = point else {
            return Ok(None);
        };
        let (_, to) = if reverse {
            self.first(Path::root())?
        } else {
            self.last(Path::root())?
        };

        let matches = match (options.matches, &at) {
            (Some(matches), _) => matches,
            (None, Location::Path(path)) => Match::ChildOf(path.parent()?),
            (None, _) => Match::Any,
        };
        let mut found = self.nodes(NodesOptions {
            span: Some(Span::new(point.path, to)),
            matches: Some(matches),
            mode: options.mode,
            voids: options.voids,
            reverse,
            ..Default::default()
        })?;
        Ok(found.next())
    }
}

fn step(positions: Positions<'_>, distance: usize) -> Option<Point> {
    let mut target = None;
    for (d, point) in positions.enumerate() {
        if d > distance {
            break;
        }
        if d != 0 {
            target = Some(point);
        }
    }
    target
}

impl<'a> Positions<'a> {
    fn empty(editor: &'a Editor, unit: Unit) -> Self {
        let origin = Point::new(Path::root(), 0);
        Positions {
            editor,
            entries: Nodes::empty(editor),
            unit,
            reverse: false,
            voids: false,
            start: origin.clone(),
            end: origin.clone(),
            first: origin,
            is_new_block: false,
            block_text: String::new(),
            distance: 0,
            pending: VecDeque::new(),
        }
    }

    fn visit(&mut self, node: &Node, path: Path) {
        match node {
            Node::Element(element) => {
                let editor = self.editor;
                if !self.voids && (editor.is_void(element) || editor.is_element_read_only(element)) {
                    if let Ok(start) = editor.start(&path) {
                        self.pending.push_back(start);
                    }
                    return;
                }
                if editor.is_inline(element) || !editor.has_inlines(element) {
                    return;
                }
                let end = if path.is_ancestor(&self.end.path) {
                    Ok(self.end.clone())
                } else {
                    editor.end(&path)
                };
                let start = if path.is_ancestor(&self.start.path) {
                    Ok(self.start.clone())
                } else {
                    editor.start(&path)
                };
                if let (Ok(start), Ok(end)) = (start, end) {
                    self.block_text = editor
                        .string_with(Range::new(start, end), self.voids)
                        .unwrap_or_default();
                    self.is_new_block = true;
                }
            }
            Node::Text(text) => {
                let len = text.len() as isize;
                let is_first = path == self.first.path;
                let first_offset = self.first.offset as isize;
                let (mut remaining, mut offset) = if is_first {
                    let remaining = if self.reverse { first_offset } else { len - first_offset };
                    (remaining, first_offset)
                } else {
                    (len, if self.reverse { len } else { 0 })
                };

                if is_first || self.is_new_block || self.unit == Unit::Offset {
                    self.pending.push_back(Point::new(path.clone(), offset.max(0) as usize));
                    self.is_new_block = false;
                }

                loop {
                    if self.distance == 0 {
                        if self.block_text.is_empty() {
                            break;
                        }
                        let distance = calc_distance(&self.block_text, self.unit, self.reverse).max(1);
                        self.block_text = split_by_distance(&self.block_text, distance, self.reverse)
                            .1
                            .to_string();
                        self.distance = distance as isize;
                    }
                    offset = if self.reverse {
                        offset - self.distance
                    } else {
                        offset + self.distance
                    };
                    remaining -= self.distance;
                    if remaining < 0 {
                        self.distance = -remaining;
                        break;
                    }
                    self.distance = 0;
                    self.pending.push_back(Point::new(path.clone(), offset as usize));
                }
            }
        }
    }
}

impl Iterator for Positions<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        loop {
            if let Some(point) = self.pending.pop_front() {
                return Some(point);
            }
            let (node, path) = self.entries.next()?;
            self.visit(node, path);
        }
    }
}

fn calc_distance(text: &str, unit: Unit, reverse: bool) -> usize {
    match unit {
        Unit::Offset => 1,
        Unit::Character => character_distance(text, reverse),
        Unit::Word => word_distance(text, reverse),
        Unit::Line | Unit::Block => char_len(text),
    }
}

/// Split off `distance` characters from the front (or back, in reverse), returning
/// `(taken, rest)`.
fn split_by_distance(text: &str, distance: usize, reverse: bool) -> (&str, &str) {
    let len = char_len(text);
    if reverse {
        let at = crate::node::text::byte_index(text, len.saturating_sub(distance));
        (&text[at..], &text[..at])
    } else {
        let at = crate::node::text::byte_index(text, distance);
        (&text[..at], &text[at..])
    }
}

/// Length in characters of the first (or last) grapheme cluster.
pub(crate) fn character_distance(text: &str, reverse: bool) -> usize {
    let grapheme = if reverse {
        text.graphemes(true).next_back()
    } else {
        text.graphemes(true).next()
    };
    grapheme.map_or(0, char_len)
}

fn split_grapheme(text: &str, reverse: bool) -> (&str, &str) {
    split_by_distance(text, character_distance(text, reverse), reverse)
}

/// Characters up to the end of the next word, including any leading non-word run.
pub(crate) fn word_distance(text: &str, reverse: bool) -> usize {
    let mut distance = 0;
    let mut started = false;
    let mut rest = text;
    while !rest.is_empty() {
        let (grapheme, remaining) = split_grapheme(rest, reverse);
        if is_word_character(grapheme, remaining, reverse) {
            started = true;
            distance += char_len(grapheme);
        } else if !started {
            distance += char_len(grapheme);
        } else {
            break;
        }
        rest = remaining;
    }
    distance
}

/// Apostrophes count as word characters only when followed (in walking direction) by
/// one.
fn is_word_character(grapheme: &str, remaining: &str, reverse: bool) -> bool {
    static SPACE: OnceLock<Regex> = OnceLock::new();
    static CHAMELEON: OnceLock<Regex> = OnceLock::new();
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    let space = SPACE.get_or_init(|| Regex::new(r"^\s$").expect("Invalid space regex"));
    let chameleon = CHAMELEON
        .get_or_init(|| Regex::new(r"^['\u{2018}\u{2019}]$").expect("Invalid apostrophe regex"));
    let punctuation =
        PUNCTUATION.get_or_init(|| Regex::new(r"^[\p{P}+]$").expect("Invalid punctuation regex"));

    if space.is_match(grapheme) {
        return false;
    }
    if chameleon.is_match(grapheme) && !remaining.is_empty() {
        let (next, rest) = split_grapheme(remaining, reverse);
        if is_word_character(next, rest, reverse) {
            return true;
        }
    }
    !punctuation.is_match(grapheme)
}
