use std::rc::Rc;

use log::trace;
use serde_json::Value;

use crate::editing::{AboveOptions, BeforeOptions, Editor, LevelsOptions, Match, Mode, NextOptions, NodesOptions, PathOptions};
use crate::error::{EditorError, Result};
use crate::location::{Affinity, Location, Path, Point, Range, RangeAffinity};
use crate::node::{Element, Node, Properties, RESERVED_KEYS};
use crate::operation::Operation;
use crate::transforms::DeleteOptions;

/// Options shared by the node transforms that act on the matches at a location.
#[derive(Clone)]
pub struct NodeOptions<'a> {
    /// Defaults to the selection; the transform is a no-op without either.
    pub at: Option<Location>,
    /// Defaults to the node at `at` for paths and to blocks otherwise.
    pub matches: Option<Match<'a>>,
    pub mode: Mode,
    /// Keep a range that ends at offset 0 of the next block as is.
    pub hanging: bool,
    /// Split the matched nodes at the range edges first.
    pub split: bool,
    pub voids: bool,
}

impl Default for NodeOptions<'_> {
    fn default() -> Self {
        NodeOptions {
            at: None,
            matches: None,
            mode: Mode::Lowest,
            hanging: false,
            split: false,
            voids: false,
        }
    }
}

#[derive(Clone)]
pub struct InsertNodesOptions<'a> {
    /// Defaults to the selection, then the end of the document.
    pub at: Option<Location>,
    pub matches: Option<Match<'a>>,
    pub mode: Mode,
    pub hanging: bool,
    /// Select the end of the last inserted node. Defaults to true only when `at` is unset.
    pub select: Option<bool>,
    pub voids: bool,
    /// Fold the dirty paths of all inserted nodes into one update.
    pub batch_dirty: bool,
}

impl Default for InsertNodesOptions<'_> {
    fn default() -> Self {
        InsertNodesOptions {
            at: None,
            matches: None,
            mode: Mode::Lowest,
            hanging: false,
            select: None,
            voids: false,
            batch_dirty: true,
        }
    }
}

#[derive(Clone)]
pub struct SplitNodesOptions<'a> {
    pub at: Option<Location>,
    pub matches: Option<Match<'a>>,
    pub mode: Mode,
    /// Split even when the point sits on an edge of the node.
    pub always: bool,
    /// Number of levels above the leaf to leave unsplit.
    pub height: usize,
    pub voids: bool,
}

impl Default for SplitNodesOptions<'_> {
    fn default() -> Self {
        SplitNodesOptions {
            at: None,
            matches: None,
            mode: Mode::Lowest,
            always: false,
            height: 0,
            voids: false,
        }
    }
}

/// Decides whether a property differs from the node's current value.
pub type CompareFn = Rc<dyn Fn(&Value, Option<&Value>) -> bool>;
/// Combines the node's current value with the new one.
pub type MergeFn = Rc<dyn Fn(Option<&Value>, &Value) -> Value>;

#[derive(Clone, Default)]
pub struct SetNodesOptions<'a> {
    pub node: NodeOptions<'a>,
    pub compare: Option<CompareFn>,
    pub merge: Option<MergeFn>,
}

impl<'a> From<NodeOptions<'a>> for SetNodesOptions<'a> {
    fn from(node: NodeOptions<'a>) -> Self {
        SetNodesOptions {
            node,
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct MoveNodesOptions<'a> {
    pub at: Option<Location>,
    pub matches: Option<Match<'a>>,
    pub mode: Mode,
    pub to: Path,
    pub voids: bool,
}

impl MoveNodesOptions<'_> {
    pub fn to(to: Path) -> Self {
        MoveNodesOptions {
            at: None,
            matches: None,
            mode: Mode::Lowest,
            to,
            voids: false,
        }
    }
}

fn default_match(at: &Location) -> Match<'static> {
    match at {
        Location::Path(path) => Match::Path(path.clone()),
        _ => Match::Block,
    }
}

/// Nodes down the single-child chain under `node` end in a text leaf or a void.
fn has_single_child_nest(editor: &Editor, node: &Node) -> bool {
    match node {
        Node::Element(element) if editor.is_void(element) => true,
        Node::Element(element) if element.children.len() == 1 => {
            has_single_child_nest(editor, &element.children[0])
        }
        Node::Element(_) => false,
        Node::Text(_) => true,
    }
}

impl Editor {
    fn matching_paths(
        &self,
        at: Location,
        matches: Match<'_>,
        mode: Mode,
        voids: bool,
    ) -> Result<Vec<Path>> {
        Ok(self
            .nodes(NodesOptions {
                at: Some(at),
                matches: Some(matches),
                mode,
                voids,
                ..Default::default()
            })?
            .map(|(_, path)| path)
            .collect())
    }

    fn first_match(
        &self,
        at: Location,
        matches: Match<'_>,
        mode: Mode,
        voids: bool,
    ) -> Result<Option<(Node, Path)>> {
        Ok(self
            .nodes(NodesOptions {
                at: Some(at),
                matches: Some(matches),
                mode,
                voids,
                ..Default::default()
            })?
            .next()
            .map(|(node, path)| (node.clone(), path)))
    }

    pub(crate) fn default_insert_location(&self) -> Result<Location> {
        if let Some(selection) = &self.selection {
            Ok(Location::Range(selection.clone()))
        } else if !self.root.children().is_empty() {
            Ok(Location::Point(self.end(Path::root())?))
        } else {
            Ok(Location::Path(Path::from([0])))
        }
    }

    /// Delete an expanded range and return where its end ended up. Collapsed ranges
    /// resolve to their anchor.
    pub(crate) fn delete_range(&mut self, range: Range) -> Result<Option<Point>> {
        if range.is_collapsed() {
            return Ok(Some(range.anchor));
        }
        let end_ref = self.point_ref(range.end(), Some(Affinity::Forward));
        self.delete(DeleteOptions {
            at: Some(Location::Range(range)),
            ..Default::default()
        })?;
        Ok(end_ref.unref(self))
    }

    /// Insert `nodes` at a location, splitting the surrounding nodes when the target is
    /// a point inside them.
    pub fn insert_nodes(&mut self, nodes: Vec<Node>, options: InsertNodesOptions<'_>) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        self.without_normalizing(|editor| {
            let InsertNodesOptions {
                at,
                matches,
                mode,
                hanging,
                select,
                voids,
                batch_dirty,
            } = options;

            let (at, select) = match at {
                Some(at) => (at, select.unwrap_or(false)),
                None => (editor.default_insert_location()?, select.unwrap_or(true)),
            };

            let at = match at {
                Location::Range(range) => {
                    let range = if hanging {
                        range
                    } else {
                        editor.unhang_range(&range, voids)?
                    };
                    match editor.delete_range(range)? {
                        Some(point) => Location::Point(point),
                        None => return Ok(()),
                    }
                }
                other => other,
            };

            let at = match at {
                Location::Point(point) => {
                    let matches = matches.unwrap_or_else(|| match &nodes[0] {
                        Node::Text(_) => Match::Text,
                        Node::Element(element) if editor.is_inline(element) => Match::InlineOrText,
                        Node::Element(_) => Match::Block,
                    });
                    let found = editor.first_match(
                        Location::Path(point.path.clone()),
                        matches.clone(),
                        mode,
                        voids,
                    )?;
                    let Some((_, match_path)) = found else {
                        return Ok(());
                    };
                    let path_ref = editor.path_ref(match_path.clone(), Some(Affinity::Forward));
                    let is_at_end = editor.is_end(&point, &match_path)?;
                    editor.split_nodes(SplitNodesOptions {
                        at: Some(Location::Point(point)),
                        matches: Some(matches),
                        mode,
                        voids,
                        ..Default::default()
                    })?;
                    let Some(path) = path_ref.unref(editor) else {
                        return Ok(());
                    };
                    if is_at_end { path.next()? } else { path }
                }
                Location::Path(path) => path,
                Location::Range(range) => range.anchor.path,
            };

            let parent_path = at.parent()?;
            let index = at.last().unwrap_or(0);
            if !voids
                && editor
                    .void(AboveOptions {
                        at: Some(Location::Path(parent_path.clone())),
                        ..Default::default()
                    })?
                    .is_some()
            {
                return Ok(());
            }

            let count = nodes.len();
            trace!("insert {count} node(s) at {at}");
            let mut fresh = parent_path.levels();
            let mut ops = Vec::with_capacity(count);
            for (offset, node) in nodes.into_iter().enumerate() {
                let path = parent_path.child(index + offset);
                fresh.extend(node.entries(Default::default()).map(|(_, p)| path.join(&p)));
                ops.push(Operation::InsertNode { path, node });
            }
            if batch_dirty {
                editor.apply_batch(ops, fresh)?;
            } else {
                for op in ops {
                    editor.apply(op)?;
                }
            }

            if select {
                let last = parent_path.child(index + count - 1);
                let point = editor.end(&last)?;
                editor.select(point)?;
            }
            Ok(())
        })
    }

    /// Remove the matching nodes at a location.
    pub fn remove_nodes(&mut self, options: NodeOptions<'_>) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options.at) else {
                return Ok(());
            };
            let matches = options.matches.unwrap_or_else(|| default_match(&at));
            let at = match at {
                Location::Range(range) if !options.hanging => {
                    Location::Range(editor.unhang_range(&range, options.voids)?)
                }
                other => other,
            };
            let refs: Vec<_> = editor
                .matching_paths(at, matches, options.mode, options.voids)?
                .into_iter()
                .map(|path| editor.path_ref(path, Some(Affinity::Forward)))
                .collect();
            for path_ref in refs {
                if let Some(path) = path_ref.unref(editor) {
                    let node = editor.root.get(&path)?.clone();
                    editor.apply(Operation::RemoveNode { path, node })?;
                }
            }
            Ok(())
        })
    }

    /// Set properties on the matching nodes. A `null` value removes the property.
    pub fn set_nodes<'o>(&mut self, props: Properties, options: impl Into<SetNodesOptions<'o>>) -> Result<()> {
        let SetNodesOptions {
            node: options,
            compare,
            merge,
        } = options.into();
        let explicit_at = options.at.is_some();
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options.at) else {
                return Ok(());
            };
            let matches = options.matches.unwrap_or_else(|| default_match(&at));
            let mut at = match at {
                Location::Range(range) if !options.hanging => {
                    Location::Range(editor.unhang_range(&range, options.voids)?)
                }
                other => other,
            };

            if options.split {
                if let Location::Range(range) = &at {
                    if range.is_collapsed() && !editor.leaf(&range.anchor, PathOptions::default())?.0.is_empty() {
                        return Ok(());
                    }
                    let range_ref = editor.range_ref(range.clone(), Some(RangeAffinity::Inward));
                    let (start, end) = range.edges();
                    let split_mode = if options.mode == Mode::Lowest {
                        Mode::Lowest
                    } else {
                        Mode::Highest
                    };
                    let end_at_end = editor.is_end(&end, &end.path)?;
                    editor.split_nodes(SplitNodesOptions {
                        at: Some(Location::Point(end)),
                        matches: Some(matches.clone()),
                        mode: split_mode,
                        voids: options.voids,
                        always: !end_at_end,
                        ..Default::default()
                    })?;
                    let start_at_start = editor.is_start(&start, &start.path)?;
                    editor.split_nodes(SplitNodesOptions {
                        at: Some(Location::Point(start)),
                        matches: Some(matches.clone()),
                        mode: split_mode,
                        voids: options.voids,
                        always: !start_at_start,
                        ..Default::default()
                    })?;
                    let Some(range) = range_ref.unref(editor) else {
                        return Ok(());
                    };
                    if !explicit_at {
                        editor.select(&range)?;
                    }
                    at = Location::Range(range);
                }
            }

            let targets: Vec<(Properties, Path)> = editor
                .nodes(NodesOptions {
                    at: Some(at),
                    matches: Some(matches),
                    mode: options.mode,
                    voids: options.voids,
                    ..Default::default()
                })?
                .filter(|(_, path)| !path.is_empty())
                .map(|(node, path)| (node.props().clone(), path))
                .collect();

            for (current, path) in targets {
                let mut properties = Properties::new();
                let mut new_properties = Properties::new();
                let mut changed = false;
                for (key, value) in &props {
                    if RESERVED_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    let existing = current.get(key);
                    let differs = match &compare {
                        Some(compare) => compare(value, existing),
                        None => existing.map_or(!value.is_null(), |existing| existing != value),
                    };
                    if !differs {
                        continue;
                    }
                    changed = true;
                    if let Some(existing) = existing {
                        properties.insert(key.clone(), existing.clone());
                    }
                    if !value.is_null() {
                        let value = match &merge {
                            Some(merge) => merge(existing, value),
                            None => value.clone(),
                        };
                        new_properties.insert(key.clone(), value);
                    }
                }
                if changed {
                    editor.apply(Operation::SetNode {
                        path,
                        properties,
                        new_properties,
                    })?;
                }
            }
            Ok(())
        })
    }

    /// Remove the named properties from the matching nodes.
    pub fn unset_nodes(&mut self, keys: &[&str], options: NodeOptions<'_>) -> Result<()> {
        let props = keys
            .iter()
            .map(|key| (key.to_string(), Value::Null))
            .collect();
        self.set_nodes(props, options)
    }

    /// Split the matching nodes at a point, or the parent of a path before that path.
    pub fn split_nodes(&mut self, options: SplitNodesOptions<'_>) -> Result<()> {
        self.without_normalizing(|editor| {
            let SplitNodesOptions {
                at,
                matches,
                mode,
                mut always,
                mut height,
                voids,
            } = options;
            let explicit_at = at.is_some();
            let mut matches = matches.unwrap_or(Match::Block);
            let Some(at) = editor.resolve_at(at) else {
                return Ok(());
            };

            let mut at = match at {
                Location::Range(range) => match editor.delete_range(range)? {
                    Some(point) => point,
                    None => return Ok(()),
                },
                Location::Path(path) => {
                    let point = editor.start(&path)?;
                    matches = Match::Path(path.parent()?);
                    height = point.path.len() - path.len() + 1;
                    always = true;
                    point
                }
                Location::Point(point) => point,
            };

            let before_ref = editor.point_ref(at.clone(), Some(Affinity::Backward));
            let Some((_, highest_path)) =
                editor.first_match(Location::Point(at.clone()), matches, mode, voids)?
            else {
                before_ref.unref(editor);
                return Ok(());
            };

            let void_match = editor
                .void(AboveOptions {
                    at: Some(Location::Point(at.clone())),
                    mode: Mode::Highest,
                    ..Default::default()
                })?
                .map(|(node, path)| (node.clone(), path));
            if !voids {
                if let Some((void_node, void_path)) = void_match {
                    if void_node.as_element().is_some_and(|e| editor.is_inline(e)) {
                        at = match editor.after(&void_path, BeforeOptions::default())? {
                            Some(after) => after,
                            None => {
                                let after_path = void_path.next()?;
                                editor.insert_nodes(
                                    vec![Node::text("")],
                                    InsertNodesOptions {
                                        at: Some(Location::Path(after_path.clone())),
                                        voids,
                                        ..Default::default()
                                    },
                                )?;
                                editor.start(&after_path)?
                            }
                        };
                    }
                    height = (at.path.len() + 1).saturating_sub(void_path.len());
                    always = true;
                }
            }

            let after_ref = editor.point_ref(at.clone(), Some(Affinity::Forward));
            let depth = at.path.len().saturating_sub(height);
            let lowest_path = at.path.truncated(depth);
            let mut position = if height == 0 {
                at.offset
            } else {
                at.path.get(depth).copied().unwrap_or(0)
            };

            let levels: Vec<(Node, Path)> = editor
                .levels(LevelsOptions {
                    at: Some(Location::Path(lowest_path)),
                    reverse: true,
                    voids,
                    ..Default::default()
                })?
                .into_iter()
                .map(|(node, path)| (node.clone(), path))
                .collect();

            let mut result = Ok(());
            for (node, path) in levels {
                if path.len() < highest_path.len()
                    || path.is_empty()
                    || (!voids && node.as_element().is_some_and(|e| editor.is_void(e)))
                {
                    break;
                }
                let Some(point) = before_ref.current(editor) else {
                    break;
                };
                let split = always || !editor.is_edge(&point, &path)?;
                let is_end = editor.is_end(&point, &path)?;
                if split {
                    let op = Operation::SplitNode {
                        path: path.clone(),
                        position,
                        properties: node.extract_props(),
                    };
                    if let Err(err) = editor.apply(op) {
                        result = Err(err);
                        break;
                    }
                }
                position = path.last().unwrap_or(0) + usize::from(split || is_end);
            }

            before_ref.unref(editor);
            let after = after_ref.unref(editor);
            result?;
            if !explicit_at {
                let point = match after {
                    Some(point) => point,
                    None => editor.end(Path::root())?,
                };
                editor.select(point)?;
            }
            Ok(())
        })
    }

    /// Merge the matching node into its previous sibling, moving it next to that
    /// sibling first when the two are cousins.
    pub fn merge_nodes(&mut self, options: NodeOptions<'_>) -> Result<()> {
        let explicit_at = options.at.is_some();
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options.at) else {
                return Ok(());
            };
            let voids = options.voids;
            let matches = match (options.matches, &at) {
                (Some(matches), _) => matches,
                (None, Location::Path(path)) => Match::ChildOf(path.parent()?),
                (None, _) => Match::Block,
            };
            let at = match at {
                Location::Range(range) => {
                    let range = if options.hanging {
                        range
                    } else {
                        editor.unhang_range(&range, voids)?
                    };
                    let expanded = range.is_expanded();
                    let Some(point) = editor.delete_range(range)? else {
                        return Ok(());
                    };
                    if expanded && !explicit_at {
                        editor.select(&point)?;
                    }
                    Location::Point(point)
                }
                other => other,
            };

            let current = editor.first_match(at.clone(), matches.clone(), options.mode, voids)?;
            let prev = editor
                .previous(NextOptions {
                    at: Some(at),
                    matches: Some(matches),
                    mode: options.mode,
                    voids,
                })?
                .map(|(node, path)| (node.clone(), path));
            let (Some((node, path)), Some((prev_node, prev_path))) = (current, prev) else {
                return Ok(());
            };
            if path.is_empty() || prev_path.is_empty() {
                return Ok(());
            }

            let new_path = prev_path.next()?;
            let common = path.common(&prev_path);
            let is_previous_sibling = path.is_sibling(&prev_path);
            let between: Vec<Path> = (common.len()..path.len()).map(|d| path.truncated(d)).collect();
            let empty_ancestor = editor
                .above(AboveOptions {
                    at: Some(Location::Path(path.clone())),
                    mode: Mode::Highest,
                    matches: Some(Match::predicate(|editor, n, p| {
                        !p.is_empty() && between.contains(p) && has_single_child_nest(editor, n)
                    })),
                    voids: false,
                })?
                .map(|(_, path)| path);
            let empty_ref = empty_ancestor.map(|p| editor.path_ref(p, Some(Affinity::Forward)));

            let (position, properties) = match (&node, &prev_node) {
                (Node::Text(_), Node::Text(prev)) => (prev.len(), node.extract_props()),
                (Node::Element(_), Node::Element(prev)) => (prev.children.len(), node.extract_props()),
                _ => return Err(EditorError::MergeKindMismatch { path }),
            };

            if !is_previous_sibling {
                editor.move_nodes(MoveNodesOptions {
                    at: Some(Location::Path(path.clone())),
                    voids,
                    ..MoveNodesOptions::to(new_path.clone())
                })?;
            }

            if let Some(empty_ref) = &empty_ref {
                if let Some(empty_path) = empty_ref.current(editor) {
                    editor.remove_nodes(NodeOptions {
                        at: Some(Location::Path(empty_path)),
                        voids,
                        ..Default::default()
                    })?;
                }
            }

            let schema = editor.schema();
            if schema.should_merge_nodes_remove_prev_node(editor, (&prev_node, &prev_path), (&node, &path)) {
                editor.remove_nodes(NodeOptions {
                    at: Some(Location::Path(prev_path)),
                    voids,
                    ..Default::default()
                })?;
            } else {
                editor.apply(Operation::MergeNode {
                    path: new_path,
                    position,
                    properties,
                })?;
            }

            if let Some(empty_ref) = empty_ref {
                empty_ref.unref(editor);
            }
            Ok(())
        })
    }

    /// Move the matching nodes to `to`, keeping their document order.
    pub fn move_nodes(&mut self, options: MoveNodesOptions<'_>) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options.at) else {
                return Ok(());
            };
            let matches = options.matches.unwrap_or_else(|| default_match(&at));
            let to_ref = editor.path_ref(options.to, Some(Affinity::Forward));
            let refs: Vec<_> = editor
                .matching_paths(at, matches, options.mode, options.voids)?
                .into_iter()
                .map(|path| editor.path_ref(path, Some(Affinity::Forward)))
                .collect();

            let mut result = Ok(());
            for path_ref in refs {
                let (Some(path), Some(new_path)) = (path_ref.unref(editor), to_ref.current(editor)) else {
                    continue;
                };
                if !path.is_empty() {
                    if let Err(err) = editor.apply(Operation::MoveNode {
                        path: path.clone(),
                        new_path: new_path.clone(),
                    }) {
                        result = Err(err);
                        break;
                    }
                }
                if let Some(current) = to_ref.current(editor) {
                    if new_path.is_sibling(&path) && new_path.is_after(&path) {
                        to_ref.set_current(editor, current.next()?);
                    }
                }
            }
            to_ref.unref(editor);
            result
        })
    }

    /// Lift the matching nodes out of their parent, splitting it when they sit in the
    /// middle.
    pub fn lift_nodes(&mut self, options: NodeOptions<'_>) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options.at) else {
                return Ok(());
            };
            let voids = options.voids;
            let matches = options.matches.unwrap_or_else(|| default_match(&at));
            let refs: Vec<_> = editor
                .matching_paths(at, matches, options.mode, voids)?
                .into_iter()
                .map(|path| editor.path_ref(path, Some(Affinity::Forward)))
                .collect();

            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else {
                    continue;
                };
                if path.len() < 2 {
                    return Err(EditorError::LiftTooShallow { path });
                }
                let parent_path = path.parent()?;
                let length = editor.root.get(&parent_path)?.children().len();
                let index = path.last().unwrap_or(0);
                let move_to = |to: Path| MoveNodesOptions {
                    at: Some(Location::Path(path.clone())),
                    voids,
                    ..MoveNodesOptions::to(to)
                };

                if length == 1 {
                    editor.move_nodes(move_to(parent_path.next()?))?;
                    editor.remove_nodes(NodeOptions {
                        at: Some(Location::Path(parent_path)),
                        voids,
                        ..Default::default()
                    })?;
                } else if index == 0 {
                    editor.move_nodes(move_to(parent_path))?;
                } else if index == length - 1 {
                    editor.move_nodes(move_to(parent_path.next()?))?;
                } else {
                    editor.split_nodes(SplitNodesOptions {
                        at: Some(Location::Path(path.next()?)),
                        voids,
                        ..Default::default()
                    })?;
                    editor.move_nodes(move_to(parent_path.next()?))?;
                }
            }
            Ok(())
        })
    }

    /// Replace each matching element with its children.
    pub fn unwrap_nodes(&mut self, options: NodeOptions<'_>) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options.at) else {
                return Ok(());
            };
            let voids = options.voids;
            let matches = options.matches.unwrap_or_else(|| default_match(&at));
            let at = match at {
                Location::Path(path) => Location::Range(editor.range(&path, None)?),
                other => other,
            };
            let range_ref = match &at {
                Location::Range(range) => Some(editor.range_ref(range.clone(), Some(RangeAffinity::Inward))),
                _ => None,
            };
            let mut refs: Vec<_> = editor
                .matching_paths(at, matches, options.mode, voids)?
                .into_iter()
                .map(|path| editor.path_ref(path, Some(Affinity::Forward)))
                .collect();
            refs.reverse();

            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else {
                    continue;
                };
                let mut range = editor.range(&path, None)?;
                if options.split {
                    if let Some(current) = range_ref.as_ref().and_then(|r| r.current(editor)) {
                        match current.intersection(&range) {
                            Some(intersection) => range = intersection,
                            None => continue,
                        }
                    }
                }
                editor.lift_nodes(NodeOptions {
                    at: Some(Location::Range(range)),
                    matches: Some(Match::ChildOf(path)),
                    voids,
                    ..Default::default()
                })?;
            }

            if let Some(range_ref) = range_ref {
                range_ref.unref(editor);
            }
            Ok(())
        })
    }

    /// Wrap the matching nodes in a copy of `element`, one wrapper per common parent.
    pub fn wrap_nodes(&mut self, element: Element, options: NodeOptions<'_>) -> Result<()> {
        let explicit_at = options.at.is_some();
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options.at) else {
                return Ok(());
            };
            let voids = options.voids;
            let wrapper_is_inline = editor.is_inline(&element);
            let matches = match (options.matches, &at) {
                (Some(matches), _) => matches,
                (None, Location::Path(path)) => Match::Path(path.clone()),
                (None, _) if wrapper_is_inline => Match::InlineOrText,
                (None, _) => Match::Block,
            };

            let mut at = at;
            if options.split {
                if let Location::Range(range) = &at {
                    let (start, end) = range.edges();
                    let range_ref = editor.range_ref(range.clone(), Some(RangeAffinity::Inward));
                    for point in [end, start] {
                        editor.split_nodes(SplitNodesOptions {
                            at: Some(Location::Point(point)),
                            matches: Some(matches.clone()),
                            voids,
                            ..Default::default()
                        })?;
                    }
                    let Some(range) = range_ref.unref(editor) else {
                        return Ok(());
                    };
                    if !explicit_at {
                        editor.select(&range)?;
                    }
                    at = Location::Range(range);
                }
            }

            let roots = editor.matching_paths(
                at.clone(),
                if wrapper_is_inline { Match::Block } else { Match::Root },
                Mode::Lowest,
                voids,
            )?;

            for root_path in roots {
                let scope = match &at {
                    Location::Range(range) => match range.intersection(&editor.range(&root_path, None)?) {
                        Some(intersection) => Location::Range(intersection),
                        None => continue,
                    },
                    other => other.clone(),
                };
                let matched = editor.matching_paths(scope, matches.clone(), options.mode, voids)?;
                let (Some(first_path), Some(last_path)) = (matched.first(), matched.last()) else {
                    continue;
                };
                if first_path.is_empty() && last_path.is_empty() {
                    continue;
                }

                let common = if first_path == last_path {
                    first_path.parent()?
                } else {
                    first_path.common(last_path)
                };
                let range = editor.range(first_path, Some(Location::Path(last_path.clone())))?;
                let depth = common.len() + 1;
                let wrapper_path = last_path.truncated(depth).next()?;
                let wrapper = Element {
                    children: Vec::new(),
                    props: element.props.clone(),
                };

                editor.insert_nodes(
                    vec![Node::Element(wrapper)],
                    InsertNodesOptions {
                        at: Some(Location::Path(wrapper_path.clone())),
                        voids,
                        ..Default::default()
                    },
                )?;
                editor.move_nodes(MoveNodesOptions {
                    at: Some(Location::Range(range)),
                    matches: Some(Match::ChildOf(common)),
                    voids,
                    ..MoveNodesOptions::to(wrapper_path.child(0))
                })?;
            }
            Ok(())
        })
    }
}
