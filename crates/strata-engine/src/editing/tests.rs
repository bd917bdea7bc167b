use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use strata_config::EditorConfig;

use super::*;
use crate::error::{EditorError, Result};
use crate::location::{Affinity, Location, Path, Point, Range, RangeAffinity};
use crate::node::{Element, Node, NodeEntry, Text};
use crate::operation::Operation;

fn editor(children: Value) -> Editor {
    Editor::new(DefaultSchema).with_children(serde_json::from_value(children).unwrap())
}

fn children(editor: &Editor) -> Value {
    serde_json::to_value(editor.value().children).unwrap()
}

fn paragraphs(texts: &[&str]) -> Value {
    Value::Array(
        texts
            .iter()
            .map(|text| json!({ "type": "paragraph", "children": [{ "text": text }] }))
            .collect(),
    )
}

fn paths<'a>(entries: impl IntoIterator<Item = NodeEntry<'a>>) -> Vec<Path> {
    entries.into_iter().map(|(_, path)| path).collect()
}

#[derive(Default)]
struct Counting {
    changes: Rc<Cell<usize>>,
}

impl Schema for Counting {
    fn on_change(&self, _change: &Change) {
        self.changes.set(self.changes.get() + 1);
    }
}

struct Lenient;

impl Schema for Lenient {
    fn on_error(&self, _error: &EditorError) -> ErrorAction {
        ErrorAction::Recover
    }
}

struct Wrapping;

impl Schema for Wrapping {
    fn fallback_element(&self) -> Option<Element> {
        Some(Element::typed("paragraph", vec![]))
    }
}

struct Inlines;

impl Schema for Inlines {
    fn is_inline(&self, element: &Element) -> bool {
        element.kind() == Some("link")
    }
}

struct Locked;

impl Schema for Locked {
    fn is_element_read_only(&self, element: &Element) -> bool {
        element.kind() == Some("locked")
    }
}

/// Grows the document every time the root is normalized.
struct Restless;

impl Schema for Restless {
    fn normalize_node(&self, editor: &mut Editor, path: &Path, _: &NormalizeNodeOptions) -> Result<()> {
        if path.is_empty() {
            editor.apply(Operation::InsertNode {
                path: Path::from([0]),
                node: Node::element("paragraph", vec![Node::text("")]),
            })?;
        }
        Ok(())
    }
}

mod pipeline {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_then_flush_reports_one_change() {
        let changes = Rc::new(Cell::new(0));
        let mut editor = Editor::new(Counting {
            changes: changes.clone(),
        })
        .with_children(serde_json::from_value(paragraphs(&["ab"])).unwrap());

        editor
            .apply(Operation::InsertText {
                path: Path::from([0, 0]),
                offset: 1,
                text: "X".into(),
            })
            .unwrap();

        assert_eq!(editor.version(), 1);
        assert_eq!(changes.get(), 0);

        let change = editor.flush().unwrap();
        assert_eq!(change.operations.len(), 1);
        assert_eq!(change.version, 1);
        assert!(change.content_changed);
        assert!(!change.selection_changed);
        assert_eq!(changes.get(), 1);

        assert!(editor.operations().is_empty());
        assert_eq!(editor.flush(), None);
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn test_transform_flushes_as_single_change() {
        let mut editor = editor(paragraphs(&["hello"]));
        editor
            .select(Range::collapsed(Point::new([0, 0], 2)))
            .unwrap();
        editor.flush();

        editor.insert_break().unwrap();

        let change = editor.flush().unwrap();
        assert!(change.operations.len() > 1);
        assert!(change.content_changed);
        assert!(change.selection_changed);
        assert_eq!(change.version, editor.version());
    }

    #[test]
    fn test_rejected_operation_changes_nothing() {
        let mut editor = editor(paragraphs(&["ab"]));

        let err = editor
            .apply(Operation::InsertText {
                path: Path::from([0, 0]),
                offset: 10,
                text: "X".into(),
            })
            .unwrap_err();

        assert!(matches!(err, EditorError::OffsetOutOfRange { .. }));
        assert_eq!(children(&editor), paragraphs(&["ab"]));
        assert_eq!(editor.version(), 0);
        assert_eq!(editor.flush(), None);
    }

    #[test]
    fn test_selection_change_clears_pending_marks() {
        let mut editor = editor(paragraphs(&["abc"]));
        editor
            .select(Range::collapsed(Point::new([0, 0], 1)))
            .unwrap();
        editor.add_mark("bold", true).unwrap();
        assert!(editor.pending_marks().is_some());

        editor
            .select(Range::collapsed(Point::new([0, 0], 2)))
            .unwrap();

        assert_eq!(editor.pending_marks(), None);
        let change = editor.flush().unwrap();
        assert!(change.marks_changed);
        assert!(!change.content_changed);
    }

    #[test]
    fn test_json_round_trip_keeps_state() {
        let json = r#"{"children":[{"type":"paragraph","children":[{"text":"hi","bold":true}]}],"selection":{"anchor":{"path":[0,0],"offset":1},"focus":{"path":[0,0],"offset":1}}}"#;

        let editor = Editor::from_json(DefaultSchema, json).unwrap();

        assert_eq!(
            editor.selection(),
            Some(&Range::collapsed(Point::new([0, 0], 1)))
        );
        let reloaded = Editor::from_json(DefaultSchema, &editor.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.value(), editor.value());
    }
}

mod refs {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_ref_follows_insert_and_dies_on_remove() {
        let mut editor = editor(paragraphs(&["a", "b"]));
        let path_ref = editor.path_ref(Path::from([1]), None);

        editor
            .apply(Operation::InsertNode {
                path: Path::from([0]),
                node: Node::element("paragraph", vec![Node::text("z")]),
            })
            .unwrap();
        assert_eq!(path_ref.current(&editor), Some(Path::from([2])));

        editor
            .apply(Operation::RemoveNode {
                path: Path::from([2]),
                node: Node::element("paragraph", vec![Node::text("b")]),
            })
            .unwrap();
        assert_eq!(path_ref.current(&editor), None);
        assert_eq!(editor.live_refs(), 0);
        assert_eq!(path_ref.unref(&mut editor), None);
    }

    #[rstest]
    #[case(Affinity::Forward, 2)]
    #[case(Affinity::Backward, 1)]
    fn test_point_ref_affinity_at_insertion(#[case] affinity: Affinity, #[case] expected: usize) {
        let mut editor = editor(paragraphs(&["ab"]));
        let point_ref = editor.point_ref(Point::new([0, 0], 1), Some(affinity));

        editor
            .apply(Operation::InsertText {
                path: Path::from([0, 0]),
                offset: 1,
                text: "X".into(),
            })
            .unwrap();

        assert_eq!(
            point_ref.unref(&mut editor),
            Some(Point::new([0, 0], expected))
        );
    }

    #[test]
    fn test_range_ref_inward_keeps_inserted_text_outside() {
        let mut editor = editor(paragraphs(&["abcd"]));
        let range_ref = editor.range_ref(
            Range::new(Point::new([0, 0], 1), Point::new([0, 0], 3)),
            Some(RangeAffinity::Inward),
        );

        for offset in [3, 1] {
            editor
                .apply(Operation::InsertText {
                    path: Path::from([0, 0]),
                    offset,
                    text: "X".into(),
                })
                .unwrap();
        }

        assert_eq!(
            range_ref.current(&editor),
            Some(Range::new(Point::new([0, 0], 2), Point::new([0, 0], 4)))
        );
        range_ref.unref(&mut editor);
    }

    #[test]
    fn test_transforms_release_their_refs() {
        let mut editor = editor(paragraphs(&["one", "two"]));
        editor
            .select(Range::new(Point::new([0, 0], 1), Point::new([1, 0], 2)))
            .unwrap();

        editor.insert_text("x").unwrap();
        editor.insert_break().unwrap();
        editor.delete_backward(Unit::Character).unwrap();

        assert_eq!(editor.live_refs(), 0);
    }
}

mod recovery {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_path_raises_by_default() {
        let editor = editor(paragraphs(&["a"]));

        assert!(editor.string(Path::from([5])).is_err());
        assert!(editor.fragment(Path::from([5])).is_err());
    }

    #[test]
    fn test_error_hook_recovers() {
        let editor = Editor::new(Lenient)
            .with_children(serde_json::from_value(paragraphs(&["a"])).unwrap());

        assert_eq!(editor.string(Path::from([5])).unwrap(), "");
        assert!(editor.fragment(Path::from([5])).unwrap().is_empty());
    }

    #[test]
    fn test_configured_key_recovers() {
        let key = editor(paragraphs(&["a"]))
            .string(Path::from([5]))
            .unwrap_err()
            .key();
        let mut config = EditorConfig::default();
        config.errors.recover.push(key.to_string());
        let editor = Editor::with_config(DefaultSchema, config)
            .with_children(serde_json::from_value(paragraphs(&["a"])).unwrap());

        assert_eq!(editor.string(Path::from([5])).unwrap(), "");
    }

    #[test]
    fn test_report_without_recovery_value_raises() {
        let editor = Editor::new(Lenient);

        let result: Result<()> = editor.report(EditorError::SplitRoot, None);

        assert_eq!(result, Err(EditorError::SplitRoot));
    }
}

mod queries {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested() -> Editor {
        editor(json!([
            { "type": "quote", "children": paragraphs(&["a", "b"]) },
            { "type": "paragraph", "children": [{ "text": "c" }] },
        ]))
    }

    #[rstest]
    #[case(Mode::Lowest, vec![Path::from([0, 0]), Path::from([0, 1]), Path::from([1])])]
    #[case(Mode::Highest, vec![Path::from([0]), Path::from([1])])]
    #[case(Mode::All, vec![Path::from([0]), Path::from([0, 0]), Path::from([0, 1]), Path::from([1])])]
    fn test_nodes_modes(#[case] mode: Mode, #[case] expected: Vec<Path>) {
        let editor = nested();

        let found = editor
            .nodes(NodesOptions {
                at: Some(Path::root().into()),
                matches: Some(Match::Block),
                mode,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(paths(found), expected);
    }

    #[test]
    fn test_nodes_without_location_is_empty() {
        let editor = nested();

        assert_eq!(editor.nodes(NodesOptions::default()).unwrap().count(), 0);
    }

    #[test]
    fn test_nodes_with_custom_match() {
        let editor = nested();

        let found = editor
            .nodes(NodesOptions {
                at: Some(Path::root().into()),
                matches: Some(Match::custom(|node, _| {
                    node.as_text().is_some_and(|t| t.text != "b")
                })),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(paths(found), vec![Path::from([0, 0, 0]), Path::from([1, 0])]);
    }

    #[test]
    fn test_nodes_walks_only_as_far_as_consumed() {
        let editor = nested();
        let visited = Cell::new(0);

        let first = editor
            .nodes(NodesOptions {
                at: Some(Path::root().into()),
                matches: Some(Match::custom(|node, _| {
                    visited.set(visited.get() + 1);
                    node.is_text()
                })),
                ..Default::default()
            })
            .unwrap()
            .next()
            .map(|(_, path)| path);

        assert_eq!(first, Some(Path::from([0, 0, 0])));
        assert_eq!(visited.get(), 4);
    }

    #[test]
    fn test_levels_stop_at_read_only_element() {
        let editor = Editor::new(Locked).with_children(
            serde_json::from_value(json!([
                { "type": "locked", "children": paragraphs(&["a"]) },
            ]))
            .unwrap(),
        );
        let at = Location::Path(Path::from([0, 0, 0]));

        let outside = editor
            .levels(LevelsOptions {
                at: Some(at.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paths(outside), vec![Path::root(), Path::from([0])]);

        let inside = editor
            .levels(LevelsOptions {
                at: Some(at.clone()),
                voids: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paths(inside).len(), 4);

        let block = editor
            .above(AboveOptions {
                at: Some(at),
                matches: Some(Match::Block),
                ..Default::default()
            })
            .unwrap()
            .map(|(_, path)| path);
        assert_eq!(block, Some(Path::from([0])));
    }

    #[test]
    fn test_above_lowest_and_highest() {
        let editor = nested();
        let at = Location::Point(Point::new([0, 1, 0], 0));

        let lowest = editor
            .above(AboveOptions {
                at: Some(at.clone()),
                matches: Some(Match::Block),
                ..Default::default()
            })
            .unwrap()
            .map(|(_, path)| path);
        let highest = editor
            .above(AboveOptions {
                at: Some(at),
                matches: Some(Match::Block),
                mode: Mode::Highest,
                ..Default::default()
            })
            .unwrap()
            .map(|(_, path)| path);

        assert_eq!(lowest, Some(Path::from([0, 1])));
        assert_eq!(highest, Some(Path::from([0])));
    }

    #[test]
    fn test_string_spans_blocks_without_separators() {
        let editor = nested();

        assert_eq!(editor.string(Path::root()).unwrap(), "abc");
        assert_eq!(
            editor
                .string(Range::new(Point::new([0, 0, 0], 0), Point::new([0, 1, 0], 1)))
                .unwrap(),
            "ab"
        );
    }

    #[test]
    fn test_positions_visit_every_offset() {
        let editor = editor(paragraphs(&["ab", "c"]));

        let points: Vec<Point> = editor
            .positions(PositionsOptions {
                at: Some(Path::root().into()),
                ..Default::default()
            })
            .unwrap()
            .collect();

        assert_eq!(
            points,
            vec![
                Point::new([0, 0], 0),
                Point::new([0, 0], 1),
                Point::new([0, 0], 2),
                Point::new([1, 0], 0),
                Point::new([1, 0], 1),
            ]
        );
    }

    #[test]
    fn test_before_and_after_by_word() {
        let editor = editor(paragraphs(&["hello world"]));
        let word = BeforeOptions {
            unit: Unit::Word,
            ..Default::default()
        };

        assert_eq!(
            editor.after(Point::new([0, 0], 0), word).unwrap(),
            Some(Point::new([0, 0], 5))
        );
        assert_eq!(
            editor.before(Point::new([0, 0], 11), word).unwrap(),
            Some(Point::new([0, 0], 6))
        );
        assert_eq!(
            editor.before(Point::new([0, 0], 0), BeforeOptions::default()).unwrap(),
            None
        );
    }

    #[test]
    fn test_next_sibling_and_root_has_none() {
        let editor = editor(paragraphs(&["a", "b"]));

        let next = editor
            .next(NextOptions {
                at: Some(Path::from([0]).into()),
                ..Default::default()
            })
            .unwrap()
            .map(|(_, path)| path);
        assert_eq!(next, Some(Path::from([1])));

        let err = editor
            .next(NextOptions {
                at: Some(Path::root().into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::SiblingOfRoot { .. }));
    }

    #[test]
    fn test_marks_of_collapsed_selection() {
        let mut editor = editor(json!([
            { "type": "paragraph", "children": [{ "text": "ab", "bold": true }] },
        ]));
        assert_eq!(editor.marks().unwrap(), None);

        editor
            .select(Range::collapsed(Point::new([0, 0], 1)))
            .unwrap();

        assert_eq!(
            editor.marks().unwrap(),
            Some(Text::new("").with_mark("bold", true).marks)
        );
    }

    #[test]
    fn test_unhang_range_pulls_end_back() {
        let editor = editor(paragraphs(&["one", "two"]));

        let range = editor
            .unhang_range(
                &Range::new(Point::new([0, 0], 0), Point::new([1, 0], 0)),
                false,
            )
            .unwrap();

        assert_eq!(
            range,
            Range::new(Point::new([0, 0], 0), Point::new([0, 0], 3))
        );
    }

    #[test]
    fn test_block_classification() {
        let editor = Editor::new(Inlines);
        let link = Element::typed("link", vec![Node::text("x")]);
        let paragraph = Element::typed("paragraph", vec![Node::text("")]);

        assert!(editor.is_inline(&link));
        assert!(!editor.is_block(&link));
        assert!(editor.is_block(&paragraph));
        assert!(editor.is_empty(&paragraph));
        assert!(editor.has_inlines(&paragraph));
        assert!(!editor.has_blocks(&paragraph));
    }
}

mod normalization {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_element_gets_text_leaf() {
        let mut editor = editor(json!([{ "type": "paragraph", "children": [] }]));

        editor.normalize(true).unwrap();

        assert_eq!(children(&editor), paragraphs(&[""]));
    }

    #[test]
    fn test_block_inside_inline_container_is_unwrapped() {
        let mut editor = editor(json!([
            { "type": "paragraph", "children": [
                { "text": "a" },
                { "type": "paragraph", "children": [{ "text": "b" }] },
            ]},
        ]));

        editor.normalize(true).unwrap();

        assert_eq!(children(&editor), paragraphs(&["ab"]));
    }

    #[test]
    fn test_stray_text_at_root_is_removed() {
        let mut editor = editor(json!([
            { "text": "x" },
            { "type": "paragraph", "children": [{ "text": "a" }] },
        ]));

        editor.normalize(true).unwrap();

        assert_eq!(children(&editor), paragraphs(&["a"]));
    }

    #[test]
    fn test_stray_text_is_wrapped_with_fallback_element() {
        let mut editor = Editor::new(Wrapping).with_children(
            serde_json::from_value(json!([
                { "text": "x" },
                { "type": "paragraph", "children": [{ "text": "a" }] },
            ]))
            .unwrap(),
        );

        editor.normalize(true).unwrap();

        assert_eq!(children(&editor), paragraphs(&["x", "a"]));
    }

    #[test]
    fn test_inline_is_padded_with_text() {
        let mut editor = Editor::new(Inlines).with_children(
            serde_json::from_value(json!([
                { "type": "paragraph", "children": [
                    { "type": "link", "children": [{ "text": "x" }] },
                ]},
            ]))
            .unwrap(),
        );

        editor.normalize(true).unwrap();

        assert_eq!(
            children(&editor),
            json!([{ "type": "paragraph", "children": [
                { "text": "" },
                { "type": "link", "children": [{ "text": "x" }] },
                { "text": "" },
            ]}])
        );
    }

    #[test]
    fn test_adjacent_equal_texts_merge() {
        let mut editor = editor(json!([
            { "type": "paragraph", "children": [
                { "text": "a" },
                { "text": "b" },
                { "text": "c", "bold": true },
            ]},
        ]));

        editor.normalize(true).unwrap();

        assert_eq!(
            children(&editor),
            json!([{ "type": "paragraph", "children": [
                { "text": "ab" },
                { "text": "c", "bold": true },
            ]}])
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut editor = editor(json!([
            { "type": "paragraph", "children": [] },
            { "text": "stray" },
        ]));
        editor.normalize(true).unwrap();
        let version = editor.version();

        editor.normalize(true).unwrap();

        assert_eq!(editor.version(), version);
    }

    #[test]
    fn test_without_normalizing_defers_repairs() {
        let mut editor = editor(paragraphs(&["a"]));

        editor
            .without_normalizing(|editor| {
                editor.apply(Operation::RemoveNode {
                    path: Path::from([0, 0]),
                    node: Node::text("a"),
                })?;
                assert!(!editor.is_normalizing());
                assert!(editor.root().get(&Path::from([0])).unwrap().children().is_empty());
                Ok(())
            })
            .unwrap();

        assert!(editor.is_normalizing());
        assert_eq!(children(&editor), paragraphs(&[""]));
    }

    #[test]
    fn test_runaway_normalizer_fails() {
        let mut editor = Editor::new(Restless)
            .with_children(serde_json::from_value(paragraphs(&["a"])).unwrap());

        let err = editor.normalize(true).unwrap_err();

        assert!(matches!(err, EditorError::NormalizationDiverged { .. }));
        assert!(editor.is_normalizing());
    }

    #[test]
    fn test_iteration_factor_comes_from_config() {
        let mut config = EditorConfig::default();
        config.normalization.max_iterations_factor = 1;
        let mut editor = Editor::with_config(Restless, config)
            .with_children(serde_json::from_value(paragraphs(&["a"])).unwrap());

        let err = editor.normalize(true).unwrap_err();

        assert_eq!(err, EditorError::NormalizationDiverged { iterations: 3 });
    }
}
