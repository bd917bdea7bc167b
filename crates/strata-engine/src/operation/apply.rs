use log::trace;

use crate::error::{EditorError, Result};
use crate::location::{Affinity, Path, Point, Range};
use crate::node::text::{char_len, insert_at_char, remove_chars, split_at_char};
use crate::node::{Element, Node, RESERVED_KEYS, Text};
use crate::operation::Operation;

/// Apply `op` to `root` and move `selection` along with it.
///
/// Validation happens before the tree is touched, so a rejected operation leaves both
/// the tree and the selection as they were.
pub fn apply(root: &mut Node, selection: &mut Option<Range>, op: &Operation) -> Result<()> {
    trace!("apply {}", op.kind());
    match op {
        Operation::InsertNode { path, node } => {
            if path.is_empty() {
                return Err(EditorError::InsertPastEnd { path: path.clone() });
            }
            root.insert_at(path, node.clone())?;
            transform_selection(selection, op);
        }

        Operation::InsertText { path, offset, text } => {
            let leaf = root.leaf_mut(path)?;
            let len = leaf.len();
            if *offset > len {
                return Err(EditorError::OffsetOutOfRange {
                    path: path.clone(),
                    offset: *offset,
                    len,
                });
            }
            insert_at_char(&mut leaf.text, *offset, text);
            transform_selection(selection, op);
        }

        Operation::MergeNode { path, .. } => {
            let previous_path = path.previous()?;
            let same_kind = root.get(&previous_path)?.is_text() == root.get(path)?.is_text();
            if !same_kind {
                return Err(EditorError::MergeKindMismatch { path: path.clone() });
            }
            let merged = root.remove_at(path)?;
            match (root.get_mut(&previous_path)?, merged) {
                (Node::Text(previous), Node::Text(node)) => previous.text.push_str(&node.text),
                (Node::Element(previous), Node::Element(node)) => {
                    previous.children.extend(node.children)
                }
                _ => return Err(EditorError::MergeKindMismatch { path: path.clone() }),
            }
            transform_selection(selection, op);
        }

        Operation::MoveNode { path, new_path } => {
            if path.is_ancestor(new_path) {
                return Err(EditorError::MoveIntoSelf {
                    path: path.clone(),
                    new_path: new_path.clone(),
                });
            }
            if path.is_empty() || new_path.is_empty() {
                return Err(EditorError::RootHasNoParent);
            }
            let true_path = path
                .transform(op, Some(Affinity::Forward))
                .unwrap_or_else(|| new_path.clone());
            let node = root.remove_at(path)?;
            if let Err(err) = root.insert_at(&true_path, node.clone()) {
                root.insert_at(path, node)?;
                return Err(err);
            }
            transform_selection(selection, op);
        }

        Operation::RemoveNode { path, .. } => {
            if path.is_empty() {
                return Err(EditorError::RootIsNotDescendant);
            }
            root.remove_at(path)?;
            if let Some(range) = selection.as_ref() {
                *selection = repair_after_removal(root, range, op, path);
            }
        }

        Operation::RemoveText { path, offset, text } => {
            let count = char_len(text);
            if count == 0 {
                return Ok(());
            }
            let leaf = root.leaf_mut(path)?;
            let len = leaf.len();
            if offset + count > len {
                return Err(EditorError::OffsetOutOfRange {
                    path: path.clone(),
                    offset: offset + count,
                    len,
                });
            }
            remove_chars(&mut leaf.text, *offset, count);
            transform_selection(selection, op);
        }

        Operation::SetNode {
            path,
            properties,
            new_properties,
        } => {
            if path.is_empty() {
                return Err(EditorError::RootProperties);
            }
            if let Some(key) = new_properties
                .keys()
                .find(|key| RESERVED_KEYS.contains(&key.as_str()))
            {
                return Err(EditorError::ReservedProperty { key: key.clone() });
            }
            let props = root.get_mut(path)?.props_mut();
            for (key, value) in new_properties {
                if value.is_null() {
                    props.remove(key);
                } else {
                    props.insert(key.clone(), value.clone());
                }
            }
            for key in properties.keys() {
                if !new_properties.contains_key(key) {
                    props.remove(key);
                }
            }
        }

        Operation::SetSelection { new_properties, .. } => match new_properties {
            None => *selection = None,
            Some(patch) => match selection {
                Some(range) => {
                    if let Some(anchor) = &patch.anchor {
                        range.anchor = anchor.clone();
                    }
                    if let Some(focus) = &patch.focus {
                        range.focus = focus.clone();
                    }
                }
                None => {
                    let range = patch.as_range().ok_or(EditorError::IncompleteSelection)?;
                    *selection = Some(range);
                }
            },
        },

        Operation::SplitNode {
            path,
            position,
            properties,
        } => {
            if path.is_empty() {
                return Err(EditorError::SplitRoot);
            }
            let next_path = path.next()?;
            let second = match root.get_mut(path)? {
                Node::Text(text) => {
                    let len = text.len();
                    if *position > len {
                        return Err(EditorError::OffsetOutOfRange {
                            path: path.clone(),
                            offset: *position,
                            len,
                        });
                    }
                    let (before, after) = split_at_char(&text.text, *position);
                    let second = Node::Text(Text {
                        text: after.to_string(),
                        marks: properties.clone(),
                    });
                    text.text = before.to_string();
                    second
                }
                Node::Element(element) => {
                    let len = element.children.len();
                    if *position > len {
                        return Err(EditorError::OffsetOutOfRange {
                            path: path.clone(),
                            offset: *position,
                            len,
                        });
                    }
                    Node::Element(Element {
                        children: element.children.split_off(*position),
                        props: properties.clone(),
                    })
                }
            };
            root.insert_at(&next_path, second)?;
            transform_selection(selection, op);
        }
    }
    Ok(())
}

fn transform_selection(selection: &mut Option<Range>, op: &Operation) {
    if let Some(range) = selection.as_mut() {
        let forward = Some(Affinity::Forward);
        if let Some(anchor) = range.anchor.transform(op, forward) {
            range.anchor = anchor;
        }
        if let Some(focus) = range.focus.transform(op, forward) {
            range.focus = focus;
        }
    }
}

/// Move selection endpoints that sat inside a removed node to the nearest surviving text
/// leaf; the selection is cleared when no leaf is left.
fn repair_after_removal(
    root: &Node,
    range: &Range,
    op: &Operation,
    removed: &Path,
) -> Option<Range> {
    let anchor = relocate(root, &range.anchor, op, removed)?;
    let focus = relocate(root, &range.focus, op, removed)?;
    Some(Range::new(anchor, focus))
}

fn relocate(root: &Node, point: &Point, op: &Operation, removed: &Path) -> Option<Point> {
    if let Some(point) = point.transform(op, Some(Affinity::Forward)) {
        return Some(point);
    }

    let mut previous: Option<(&Text, Path)> = None;
    let mut next: Option<(&Text, Path)> = None;
    for (text, path) in root.texts() {
        if path.compare(removed).is_lt() {
            previous = Some((text, path));
        } else {
            next = Some((text, path));
            break;
        }
    }

    let prefer_next = match (&previous, &next) {
        (Some((_, prev_path)), Some((_, next_path))) => {
            if prev_path.is_sibling(removed) {
                false
            } else if next_path == removed {
                true
            } else {
                prev_path.common(removed).len() < next_path.common(removed).len()
            }
        }
        _ => false,
    };

    match (previous, next) {
        (Some((text, path)), _) if !prefer_next => Some(Point::new(path, text.len())),
        (_, Some((_, path))) => Some(Point::new(path, 0)),
        _ => None,
    }
}
