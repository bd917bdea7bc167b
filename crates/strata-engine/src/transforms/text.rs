use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::editing::{AboveOptions, BeforeOptions, Editor, Match, Mode, NodesOptions, PathOptions, Unit};
use crate::error::{EditorError, Result};
use crate::location::{Affinity, Location, Path, Point, Range};
use crate::node::text::char_slice;
use crate::node::{detached_root, Node, TraverseOptions};
use crate::operation::{Operation, SelectionPatch};
use crate::transforms::{InsertNodesOptions, NodeOptions, SplitNodesOptions};

static THAI_REGEX: OnceLock<Regex> = OnceLock::new();

fn thai_regex() -> &'static Regex {
    THAI_REGEX.get_or_init(|| Regex::new(r"[\u{0E00}-\u{0E7F}]+").expect("Invalid Thai script regex"))
}

#[derive(Debug, Clone)]
pub struct DeleteOptions {
    /// Defaults to the selection.
    pub at: Option<Location>,
    /// How far a point location reaches, in `unit`s.
    pub distance: usize,
    pub unit: Unit,
    pub reverse: bool,
    pub hanging: bool,
    pub voids: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        DeleteOptions {
            at: None,
            distance: 1,
            unit: Unit::Character,
            reverse: false,
            hanging: false,
            voids: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsertTextOptions {
    /// Defaults to the selection, then the end of the document.
    pub at: Option<Location>,
    pub voids: bool,
}

#[derive(Debug, Clone)]
pub struct InsertFragmentOptions {
    pub at: Option<Location>,
    pub hanging: bool,
    pub voids: bool,
    pub batch_dirty: bool,
}

impl Default for InsertFragmentOptions {
    fn default() -> Self {
        InsertFragmentOptions {
            at: None,
            hanging: false,
            voids: false,
            batch_dirty: true,
        }
    }
}

impl Editor {
    fn remove_path(&mut self, path: Path, voids: bool) -> Result<()> {
        self.remove_nodes(NodeOptions {
            at: Some(Location::Path(path)),
            voids,
            ..Default::default()
        })
    }

    fn is_non_editable(&self, point: &Point) -> Result<bool> {
        let at = || AboveOptions {
            at: Some(Location::Point(point.clone())),
            mode: Mode::Highest,
            ..Default::default()
        };
        Ok(self.void(at())?.is_some() || self.element_read_only(at())?.is_some())
    }

    /// Delete content at a location. A point deletes `distance` units in the given
    /// direction, a path removes the node, and a range removes everything inside it,
    /// merging the blocks it spans.
    pub fn delete(&mut self, options: DeleteOptions) -> Result<()> {
        let explicit_at = options.at.is_some();
        self.without_normalizing(|editor| {
            let DeleteOptions {
                at,
                distance,
                unit,
                reverse,
                mut hanging,
                voids,
            } = options;
            let Some(at) = editor.resolve_at(at) else {
                return Ok(());
            };

            let mut is_collapsed = false;
            let at = match at {
                Location::Range(range) if range.is_collapsed() => {
                    is_collapsed = true;
                    Location::Point(range.anchor)
                }
                other => other,
            };

            let range = match at {
                Location::Path(path) => return editor.remove_path(path, voids),
                Location::Range(range) => range,
                Location::Point(point) => {
                    let furthest_void = editor
                        .void(AboveOptions {
                            at: Some(Location::Point(point.clone())),
                            mode: Mode::Highest,
                            ..Default::default()
                        })?
                        .map(|(_, path)| path);
                    if let (false, Some(void_path)) = (voids, furthest_void) {
                        return editor.remove_path(void_path, voids);
                    }
                    let step = BeforeOptions {
                        distance,
                        unit,
                        ..Default::default()
                    };
                    let target = if reverse {
                        match editor.before(&point, step)? {
                            Some(target) => target,
                            None => editor.start(Path::root())?,
                        }
                    } else {
                        match editor.after(&point, step)? {
                            Some(target) => target,
                            None => editor.end(Path::root())?,
                        }
                    };
                    hanging = true;
                    Range::new(point, target)
                }
            };

            if range.is_collapsed() {
                return Ok(());
            }
            let range = if hanging || range.end() == editor.end(Path::root())? {
                range
            } else {
                editor.unhang_range(&range, voids)?
            };

            let (mut start, mut end) = range.edges();
            let start_block = editor.block_above(&start, voids)?.map(|(_, path)| path);
            let end_block = editor.block_above(&end, voids)?.map(|(_, path)| path);
            let is_across_blocks = matches!((&start_block, &end_block), (Some(a), Some(b)) if a != b);
            let is_single_text = start.path == end.path;
            let start_non_editable = !voids && editor.is_non_editable(&start)?;
            let end_non_editable = !voids && editor.is_non_editable(&end)?;

            if start_non_editable {
                if let Some(before) = editor.before(&start, BeforeOptions::default())? {
                    if start_block.as_ref().is_some_and(|block| block.is_ancestor(&before.path)) {
                        start = before;
                    }
                }
            }
            if end_non_editable {
                if let Some(after) = editor.after(&end, BeforeOptions::default())? {
                    if end_block.as_ref().is_some_and(|block| block.is_ancestor(&after.path)) {
                        end = after;
                    }
                }
            }

            let mut inside: Vec<Path> = Vec::new();
            for (node, path) in editor.nodes(NodesOptions {
                at: Some(Location::Range(range)),
                voids,
                ..Default::default()
            })? {
                if inside.last().is_some_and(|last| path.compare(last) == Ordering::Equal) {
                    continue;
                }
                let locked = !voids
                    && node
                        .as_element()
                        .is_some_and(|e| editor.is_void(e) || editor.is_element_read_only(e));
                if locked || (!path.is_common(&start.path) && !path.is_common(&end.path)) {
                    inside.push(path);
                }
            }

            let path_refs: Vec<_> = inside
                .into_iter()
                .map(|path| editor.path_ref(path, Some(Affinity::Forward)))
                .collect();
            let start_ref = editor.point_ref(start.clone(), Some(Affinity::Forward));
            let end_ref = editor.point_ref(end.clone(), Some(Affinity::Forward));
            let mut removed = String::new();

            if !is_single_text && !start_non_editable {
                if let Some(point) = start_ref.current(editor) {
                    let leaf = editor.leaf(&point, PathOptions::default())?.0;
                    let text = char_slice(&leaf.text, start.offset, leaf.len()).to_string();
                    if !text.is_empty() {
                        editor.apply(Operation::RemoveText {
                            path: point.path,
                            offset: start.offset,
                            text: text.clone(),
                        })?;
                        removed = text;
                    }
                }
            }

            let doomed: Vec<Path> = path_refs
                .into_iter()
                .rev()
                .filter_map(|path_ref| path_ref.unref(editor))
                .collect();
            for path in doomed {
                editor.remove_path(path, voids)?;
            }

            if !end_non_editable {
                if let Some(point) = end_ref.current(editor) {
                    let leaf = editor.leaf(&point, PathOptions::default())?.0;
                    let offset = if is_single_text { start.offset } else { 0 };
                    let text = char_slice(&leaf.text, offset, end.offset).to_string();
                    if !text.is_empty() {
                        editor.apply(Operation::RemoveText {
                            path: point.path,
                            offset,
                            text: text.clone(),
                        })?;
                        removed = text;
                    }
                }
            }

            if !is_single_text && is_across_blocks && start_ref.current(editor).is_some() {
                if let Some(end_point) = end_ref.current(editor) {
                    editor.merge_nodes(NodeOptions {
                        at: Some(Location::Point(end_point)),
                        hanging: true,
                        voids,
                        ..Default::default()
                    })?;
                }
            }

            // Backspace over Thai removes a code point, not the whole cluster.
            let removed_len = removed.chars().count();
            if is_collapsed
                && reverse
                && unit == Unit::Character
                && removed_len > 1
                && thai_regex().is_match(&removed)
            {
                let keep: String = removed.chars().take(removed_len.saturating_sub(distance)).collect();
                editor.insert_text_at(&keep, InsertTextOptions::default())?;
            }

            let start_point = start_ref.unref(editor);
            let end_point = end_ref.unref(editor);
            let point = if reverse {
                start_point.or(end_point)
            } else {
                end_point.or(start_point)
            };
            if let (false, Some(point)) = (explicit_at, point) {
                editor.select(point)?;
            }
            Ok(())
        })
    }

    /// Insert a string at a location. An expanded range is deleted first and the
    /// selection collapsed onto where it was.
    pub fn insert_text_at(&mut self, text: &str, options: InsertTextOptions) -> Result<()> {
        self.without_normalizing(|editor| {
            let voids = options.voids;
            let at = match options.at {
                Some(at) => at,
                None => editor.default_insert_location()?,
            };
            let point = match at {
                Location::Point(point) => point,
                other => {
                    let range = editor.range(&other, None)?;
                    if range.is_collapsed() {
                        range.anchor
                    } else {
                        let end = range.end();
                        if !voids
                            && editor
                                .void(AboveOptions {
                                    at: Some(Location::Point(end.clone())),
                                    ..Default::default()
                                })?
                                .is_some()
                        {
                            return Ok(());
                        }
                        let start_ref = editor.point_ref(range.start(), Some(Affinity::Forward));
                        let end_ref = editor.point_ref(end, Some(Affinity::Forward));
                        editor.delete(DeleteOptions {
                            at: Some(Location::Range(range)),
                            voids,
                            ..Default::default()
                        })?;
                        let start = start_ref.unref(editor);
                        let end = end_ref.unref(editor);
                        let Some(point) = start.or(end) else {
                            return Ok(());
                        };
                        editor.set_selection(SelectionPatch::from(Range::collapsed(point.clone())))?;
                        point
                    }
                }
            };

            let at_point = || AboveOptions {
                at: Some(Location::Point(point.clone())),
                ..Default::default()
            };
            if (!voids && editor.void(at_point())?.is_some())
                || editor.element_read_only(at_point())?.is_some()
            {
                return Ok(());
            }
            if !text.is_empty() {
                editor.apply(Operation::InsertText {
                    path: point.path.clone(),
                    offset: point.offset,
                    text: text.to_string(),
                })?;
            }
            Ok(())
        })
    }

    /// Insert a list of nodes at a location, merging the fragment's first and last
    /// blocks into the blocks around the insertion point where possible.
    pub fn insert_fragment(&mut self, fragment: Vec<Node>, options: InsertFragmentOptions) -> Result<()> {
        if fragment.is_empty() {
            return Ok(());
        }
        let explicit_at = options.at.is_some();
        self.without_normalizing(|editor| {
            let InsertFragmentOptions {
                at,
                hanging,
                voids,
                batch_dirty,
            } = options;
            let at = match at {
                Some(at) => at,
                None => editor.default_insert_location()?,
            };

            let mut at = match at {
                Location::Range(range) => {
                    let range = if hanging {
                        range
                    } else {
                        editor.unhang_range(&range, voids)?
                    };
                    if range.is_collapsed() {
                        range.anchor
                    } else {
                        let end = range.end();
                        if !voids
                            && editor
                                .void(AboveOptions {
                                    at: Some(Location::Point(end.clone())),
                                    ..Default::default()
                                })?
                                .is_some()
                        {
                            return Ok(());
                        }
                        let end_ref = editor.point_ref(end, Some(Affinity::Forward));
                        editor.delete(DeleteOptions {
                            at: Some(Location::Range(range)),
                            ..Default::default()
                        })?;
                        match end_ref.unref(editor) {
                            Some(point) => point,
                            None => return Ok(()),
                        }
                    }
                }
                Location::Path(path) => editor.start(&path)?,
                Location::Point(point) => point,
            };

            if !voids
                && editor
                    .void(AboveOptions {
                        at: Some(Location::Point(at.clone())),
                        ..Default::default()
                    })?
                    .is_some()
            {
                return Ok(());
            }

            // A point on the edge of an inline moves outside it so the inline stays whole.
            let inline_above = editor
                .above(AboveOptions {
                    at: Some(Location::Point(at.clone())),
                    matches: Some(Match::Inline),
                    mode: Mode::Highest,
                    voids,
                })?
                .map(|(_, path)| path);
            if let Some(inline_path) = inline_above {
                if editor.is_end(&at, &inline_path)? {
                    if let Some(after) = editor.after(&inline_path, BeforeOptions::default())? {
                        at = after;
                    }
                } else if editor.is_start(&at, &inline_path)? {
                    if let Some(before) = editor.before(&inline_path, BeforeOptions::default())? {
                        at = before;
                    }
                }
            }

            let Some((_, block_path)) = editor.block_above(&at, voids)? else {
                return Err(EditorError::NoBlockAbove { point: at });
            };
            let is_block_start = editor.is_start(&at, &block_path)?;
            let is_block_end = editor.is_end(&at, &block_path)?;
            let is_block_empty = is_block_start && is_block_end;
            let merge_start = !is_block_start || is_block_empty;
            let merge_end = !is_block_end;

            let (starts, middles, ends) = {
                let root = detached_root(&fragment);
                let (_, first_path) = root.first(&Path::root())?;
                let (_, last_path) = root.last(&Path::root())?;
                let view: &Editor = editor;
                let keep = |node: &Node, path: &Path| -> bool {
                    if path.is_empty() {
                        return false;
                    }
                    if is_block_empty {
                        return true;
                    }
                    let mergeable_block = node
                        .as_element()
                        .is_some_and(|e| !view.is_void(e) && !view.is_inline(e));
                    if merge_start && path.is_ancestor(&first_path) && mergeable_block {
                        return false;
                    }
                    if merge_end && path.is_ancestor(&last_path) && mergeable_block {
                        return false;
                    }
                    true
                };
                let kept: Vec<Node> = root
                    .entries(TraverseOptions {
                        pass: Some(Box::new(keep)),
                        ..Default::default()
                    })
                    .filter(|(node, path)| keep(node, path))
                    .map(|(node, _)| node.clone())
                    .collect();

                let mut starts = Vec::new();
                let mut middles = Vec::new();
                let mut ends = Vec::new();
                let mut starting = true;
                for node in kept {
                    match &node {
                        Node::Element(element) if !view.is_inline(element) => {
                            starting = false;
                            middles.push(node);
                        }
                        _ if starting => starts.push(node),
                        _ => ends.push(node),
                    }
                }
                (starts, middles, ends)
            };
            let has_blocks = !middles.is_empty();

            let Some((_, inline_path)) = editor
                .nodes(NodesOptions {
                    at: Some(Location::Point(at.clone())),
                    matches: Some(Match::InlineOrText),
                    mode: Mode::Highest,
                    voids,
                    ..Default::default()
                })?
                .next()
            else {
                return Ok(());
            };
            let is_inline_start = editor.is_start(&at, &inline_path)?;
            let is_inline_end = editor.is_end(&at, &inline_path)?;

            let middle_target = if is_block_end && ends.is_empty() {
                block_path.next()?
            } else {
                block_path.clone()
            };
            let middle_ref = editor.path_ref(middle_target, Some(Affinity::Forward));
            let end_target = if is_inline_end {
                inline_path.next()?
            } else {
                inline_path.clone()
            };
            let end_ref = editor.path_ref(end_target, Some(Affinity::Forward));

            editor.split_nodes(SplitNodesOptions {
                at: Some(Location::Point(at.clone())),
                matches: Some(if has_blocks { Match::Block } else { Match::InlineOrText }),
                mode: if has_blocks { Mode::Lowest } else { Mode::Highest },
                always: has_blocks && (!is_block_start || is_block_end) && (!is_block_end || !ends.is_empty()),
                voids,
                ..Default::default()
            })?;

            let start_target = if !is_inline_start || is_inline_end {
                inline_path.next()?
            } else {
                inline_path
            };
            let start_ref = editor.path_ref(start_target, Some(Affinity::Forward));

            let inline_insert = |at: Option<Path>| InsertNodesOptions {
                at: at.map(Location::Path),
                matches: Some(Match::InlineOrText),
                mode: Mode::Highest,
                select: Some(false),
                voids,
                batch_dirty,
                ..Default::default()
            };

            let (has_starts, has_middles, has_ends) = (!starts.is_empty(), has_blocks, !ends.is_empty());
            if let Some(at) = start_ref.current(editor) {
                editor.insert_nodes(starts, inline_insert(Some(at)))?;
            }
            if is_block_empty && !has_starts && has_middles && !has_ends {
                editor.remove_path(block_path, voids)?;
            }
            if let Some(at) = middle_ref.current(editor) {
                editor.insert_nodes(
                    middles,
                    InsertNodesOptions {
                        at: Some(Location::Path(at)),
                        matches: Some(Match::Block),
                        mode: Mode::Lowest,
                        select: Some(false),
                        voids,
                        batch_dirty,
                        ..Default::default()
                    },
                )?;
            }
            if let Some(at) = end_ref.current(editor) {
                editor.insert_nodes(ends, inline_insert(Some(at)))?;
            }

            let start_path = start_ref.unref(editor);
            let middle_path = middle_ref.unref(editor);
            let end_path = end_ref.unref(editor);
            if !explicit_at {
                let last = if has_ends {
                    end_path
                } else if has_middles {
                    middle_path
                } else {
                    start_path
                };
                if let Some(path) = last.and_then(|path| path.previous().ok()) {
                    let point = editor.end(&path)?;
                    editor.select(point)?;
                }
            }
            Ok(())
        })
    }
}
