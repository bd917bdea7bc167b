use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use super::*;
use crate::editing::{DefaultSchema, Direction, Editor, Match, Schema, Unit};
use crate::error::EditorError;
use crate::location::{Location, Path, Point, Range};
use crate::node::{Element, Node, Properties, Text};
use crate::operation::Operation;

struct Inlines;

impl Schema for Inlines {
    fn is_inline(&self, element: &Element) -> bool {
        element.kind() == Some("link")
    }
}

struct InlineVoids;

impl Schema for InlineVoids {
    fn is_inline(&self, element: &Element) -> bool {
        matches!(element.kind(), Some("link" | "image"))
    }

    fn is_void(&self, element: &Element) -> bool {
        element.kind() == Some("image")
    }
}

fn editor(children: Value) -> Editor {
    Editor::new(DefaultSchema).with_children(serde_json::from_value(children).unwrap())
}

fn inline_editor(children: Value) -> Editor {
    Editor::new(Inlines).with_children(serde_json::from_value(children).unwrap())
}

fn children(editor: &Editor) -> Value {
    serde_json::to_value(editor.value().children).unwrap()
}

fn point(path: &[usize], offset: usize) -> Point {
    Point::new(path, offset)
}

fn caret(path: &[usize], offset: usize) -> Range {
    Range::collapsed(point(path, offset))
}

fn paragraphs(texts: &[&str]) -> Value {
    Value::Array(
        texts
            .iter()
            .map(|text| json!({ "type": "paragraph", "children": [{ "text": text }] }))
            .collect(),
    )
}

fn at(location: impl Into<Location>) -> NodeOptions<'static> {
    NodeOptions {
        at: Some(location.into()),
        ..Default::default()
    }
}

#[test]
fn test_insert_text_at_selection_moves_caret() {
    let mut editor = editor(paragraphs(&["hello"]));
    editor.select(caret(&[0, 0], 5)).unwrap();

    editor.insert_text_at(" world", InsertTextOptions::default()).unwrap();

    assert_eq!(editor.string(Path::root()).unwrap(), "hello world");
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 11)));
}

#[test]
fn test_insert_text_replaces_expanded_selection() {
    let mut editor = editor(paragraphs(&["hello"]));
    editor
        .select(Range::new(point(&[0, 0], 1), point(&[0, 0], 4)))
        .unwrap();

    editor.insert_text("i").unwrap();

    assert_eq!(children(&editor), paragraphs(&["hio"]));
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 2)));
}

#[test]
fn test_insert_break_splits_block() {
    let mut editor = editor(paragraphs(&["hello"]));
    editor.select(caret(&[0, 0], 2)).unwrap();

    editor.insert_break().unwrap();

    assert_eq!(children(&editor), paragraphs(&["he", "llo"]));
    assert_eq!(editor.selection(), Some(&caret(&[1, 0], 0)));
}

#[test]
fn test_insert_nodes_after_block_end_selects_new_block() {
    let mut editor = editor(paragraphs(&["one"]));
    editor.select(caret(&[0, 0], 3)).unwrap();

    editor
        .insert_nodes(
            vec![Node::element("paragraph", vec![Node::text("two")])],
            InsertNodesOptions::default(),
        )
        .unwrap();

    assert_eq!(children(&editor), paragraphs(&["one", "two"]));
    assert_eq!(editor.selection(), Some(&caret(&[1, 0], 3)));
}

#[test]
fn test_insert_text_node_inside_leaf_merges_back() {
    let mut editor = editor(paragraphs(&["ab"]));

    editor
        .insert_nodes(
            vec![Node::text("X")],
            InsertNodesOptions {
                at: Some(point(&[0, 0], 1).into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(children(&editor), paragraphs(&["aXb"]));
    assert_eq!(editor.selection(), None);
}

#[test]
fn test_insert_inline_then_unwrap_it() {
    let mut editor = inline_editor(paragraphs(&["ab"]));

    editor
        .insert_nodes(
            vec![Node::element("link", vec![Node::text("x")])],
            InsertNodesOptions {
                at: Some(point(&[0, 0], 1).into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(
        children(&editor),
        json!([{ "type": "paragraph", "children": [
            { "text": "a" },
            { "type": "link", "children": [{ "text": "x" }] },
            { "text": "b" },
        ]}])
    );

    editor.unwrap_nodes(at(Path::from([0, 1]))).unwrap();
    assert_eq!(children(&editor), paragraphs(&["axb"]));
}

#[test]
fn test_delete_across_blocks_merges_them() {
    let mut editor = editor(paragraphs(&["one", "two"]));
    editor
        .select(Range::new(point(&[0, 0], 1), point(&[1, 0], 2)))
        .unwrap();

    editor.delete(DeleteOptions::default()).unwrap();

    assert_eq!(children(&editor), paragraphs(&["oo"]));
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 1)));
}

#[test]
fn test_delete_backward_character() {
    let mut editor = editor(paragraphs(&["abc"]));
    editor.select(caret(&[0, 0], 2)).unwrap();

    editor.delete_backward(Unit::Character).unwrap();

    assert_eq!(children(&editor), paragraphs(&["ac"]));
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 1)));
}

#[test]
fn test_delete_backward_keeps_leading_thai_code_point() {
    let mut editor = editor(paragraphs(&["\u{0E01}\u{0E35}"]));
    editor.select(caret(&[0, 0], 2)).unwrap();

    editor.delete_backward(Unit::Character).unwrap();

    assert_eq!(children(&editor), paragraphs(&["\u{0E01}"]));
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 1)));
}

#[test]
fn test_delete_forward_word() {
    let mut editor = editor(paragraphs(&["hello world"]));
    editor.select(caret(&[0, 0], 0)).unwrap();

    editor.delete_forward(Unit::Word).unwrap();

    assert_eq!(children(&editor), paragraphs(&[" world"]));
}

#[test]
fn test_delete_commands_respect_selection_shape() {
    let mut editor = editor(paragraphs(&["abc"]));
    editor
        .select(Range::new(point(&[0, 0], 0), point(&[0, 0], 2)))
        .unwrap();

    editor.delete_backward(Unit::Character).unwrap();
    assert_eq!(children(&editor), paragraphs(&["abc"]));

    editor.delete_fragment(Direction::Backward).unwrap();
    assert_eq!(children(&editor), paragraphs(&["c"]));
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 0)));

    editor.delete_fragment(Direction::Forward).unwrap();
    assert_eq!(children(&editor), paragraphs(&["c"]));
}

#[test]
fn test_delete_path_removes_node() {
    let mut editor = editor(paragraphs(&["a", "b"]));

    editor
        .delete(DeleteOptions {
            at: Some(Path::from([0]).into()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(children(&editor), paragraphs(&["b"]));
}

#[test]
fn test_remove_nodes_in_selection() {
    let mut editor = editor(paragraphs(&["a", "b", "c"]));
    editor
        .select(Range::new(point(&[0, 0], 0), point(&[1, 0], 1)))
        .unwrap();

    editor.remove_nodes(NodeOptions::default()).unwrap();

    assert_eq!(children(&editor), paragraphs(&["c"]));
}

#[test]
fn test_set_nodes_and_unset_nodes() {
    let mut editor = editor(paragraphs(&["a", "b"]));
    let mut props = Properties::new();
    props.insert("type".into(), json!("heading"));
    props.insert("level".into(), json!(2));

    editor.set_nodes(props, at(Path::from([1]))).unwrap();
    assert_eq!(
        children(&editor),
        json!([
            { "type": "paragraph", "children": [{ "text": "a" }] },
            { "type": "heading", "level": 2, "children": [{ "text": "b" }] },
        ])
    );

    editor.unset_nodes(&["level"], at(Path::from([1]))).unwrap();
    assert_eq!(
        children(&editor),
        json!([
            { "type": "paragraph", "children": [{ "text": "a" }] },
            { "type": "heading", "children": [{ "text": "b" }] },
        ])
    );
}

#[test]
fn test_set_nodes_skips_unchanged_values() {
    let mut editor = editor(paragraphs(&["a"]));
    let mut props = Properties::new();
    props.insert("type".into(), json!("paragraph"));

    editor.set_nodes(props, at(Path::from([0]))).unwrap();

    assert!(editor.operations().is_empty());
}

#[test]
fn test_set_nodes_merge_hook_combines_values() {
    let mut editor = editor(json!([
        { "type": "paragraph", "count": 2, "children": [{ "text": "a" }] },
    ]));
    let mut props = Properties::new();
    props.insert("count".into(), json!(3));
    let merge: MergeFn = std::rc::Rc::new(|old: Option<&Value>, new: &Value| {
        json!(old.and_then(Value::as_i64).unwrap_or(0) + new.as_i64().unwrap_or(0))
    });

    editor
        .set_nodes(
            props,
            SetNodesOptions {
                node: at(Path::from([0])),
                merge: Some(merge),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(
        children(&editor),
        json!([{ "type": "paragraph", "count": 5, "children": [{ "text": "a" }] }])
    );
}

#[test]
fn test_merge_nodes_joins_with_previous_block() {
    let mut editor = editor(paragraphs(&["a", "b"]));

    editor.merge_nodes(at(Path::from([1]))).unwrap();

    assert_eq!(children(&editor), paragraphs(&["ab"]));
}

#[test]
fn test_merge_nodes_into_empty_block_keeps_current() {
    let mut editor = editor(json!([
        { "type": "heading", "children": [{ "text": "" }] },
        { "type": "paragraph", "children": [{ "text": "b" }] },
    ]));

    editor.merge_nodes(at(Path::from([1]))).unwrap();

    assert_eq!(children(&editor), paragraphs(&["b"]));
}

#[test]
fn test_remove_sole_child_refills_element() {
    let mut editor = editor(json!([{ "type": "p", "children": [{ "text": "x" }] }]));

    editor.remove_nodes(at(Path::from([0, 0]))).unwrap();

    assert_eq!(
        children(&editor),
        json!([{ "type": "p", "children": [{ "text": "" }] }])
    );
}

#[test]
fn test_move_nodes_undone_by_inverse_operations() {
    let mut editor = editor(json!([{ "type": "p", "children": [
        { "text": "a", "bold": true },
        { "text": "b" },
    ]}]));
    let original = editor.value();

    editor
        .move_nodes(MoveNodesOptions {
            at: Some(Path::from([0, 1]).into()),
            ..MoveNodesOptions::to(Path::from([0, 0]))
        })
        .unwrap();
    assert_eq!(
        children(&editor),
        json!([{ "type": "p", "children": [{ "text": "b" }, { "text": "a", "bold": true }] }])
    );

    let operations = editor.flush().unwrap().operations;
    editor
        .without_normalizing(|editor| {
            for op in operations.iter().rev() {
                editor.apply(op.inverse()?)?;
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(editor.value(), original);
}

#[test]
fn test_move_nodes_to_end() {
    let mut editor = editor(paragraphs(&["a", "b", "c"]));

    editor
        .move_nodes(MoveNodesOptions {
            at: Some(Path::from([0]).into()),
            ..MoveNodesOptions::to(Path::from([2]))
        })
        .unwrap();

    assert_eq!(children(&editor), paragraphs(&["b", "c", "a"]));
}

#[test]
fn test_wrap_and_unwrap_blocks() {
    let mut editor = editor(paragraphs(&["a", "b"]));

    editor
        .wrap_nodes(
            Element::typed("quote", vec![]),
            at(Range::new(point(&[0, 0], 0), point(&[1, 0], 1))),
        )
        .unwrap();
    assert_eq!(
        children(&editor),
        json!([{ "type": "quote", "children": paragraphs(&["a", "b"]) }])
    );

    editor.unwrap_nodes(at(Path::from([0]))).unwrap();
    assert_eq!(children(&editor), paragraphs(&["a", "b"]));
}

#[test]
fn test_wrap_inline_splits_text() {
    let mut editor = inline_editor(paragraphs(&["abc"]));

    editor
        .wrap_nodes(
            Element::typed("link", vec![]),
            NodeOptions {
                at: Some(Range::new(point(&[0, 0], 1), point(&[0, 0], 2)).into()),
                split: true,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(
        children(&editor),
        json!([{ "type": "paragraph", "children": [
            { "text": "a" },
            { "type": "link", "children": [{ "text": "b" }] },
            { "text": "c" },
        ]}])
    );
}

#[test]
fn test_lift_middle_child_splits_parent() {
    let item = |text: &str| json!({ "type": "item", "children": [{ "text": text }] });
    let mut editor = editor(json!([
        { "type": "list", "children": [item("a"), item("b"), item("c")] },
    ]));

    editor.lift_nodes(at(Path::from([0, 1]))).unwrap();

    assert_eq!(
        children(&editor),
        json!([
            { "type": "list", "children": [item("a")] },
            item("b"),
            { "type": "list", "children": [item("c")] },
        ])
    );
}

#[test]
fn test_lift_top_level_node_fails() {
    let mut editor = editor(paragraphs(&["a"]));

    let err = editor.lift_nodes(at(Path::from([0]))).unwrap_err();

    assert_eq!(err, EditorError::LiftTooShallow { path: Path::from([0]) });
}

#[test]
fn test_insert_fragment_inline_content_joins_block() {
    let mut editor = editor(paragraphs(&["hello"]));
    editor.select(caret(&[0, 0], 2)).unwrap();

    editor
        .insert_fragment(
            vec![Node::element("paragraph", vec![Node::text("XY")])],
            InsertFragmentOptions::default(),
        )
        .unwrap();

    assert_eq!(children(&editor), paragraphs(&["heXYllo"]));
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 4)));
}

#[test]
fn test_get_fragment_copies_selection() {
    let mut editor = editor(paragraphs(&["hello", "world"]));
    assert!(editor.get_fragment().unwrap().is_empty());

    editor
        .select(Range::new(point(&[0, 0], 1), point(&[1, 0], 2)))
        .unwrap();

    let fragment = serde_json::to_value(editor.get_fragment().unwrap()).unwrap();
    assert_eq!(fragment, paragraphs(&["ello", "wo"]));
}

#[test]
fn test_add_mark_on_expanded_selection_splits_text() {
    let mut editor = editor(paragraphs(&["hello"]));
    editor
        .select(Range::new(point(&[0, 0], 1), point(&[0, 0], 4)))
        .unwrap();

    editor.add_mark("bold", true).unwrap();

    assert_eq!(
        children(&editor),
        json!([{ "type": "paragraph", "children": [
            { "text": "h" },
            { "text": "ell", "bold": true },
            { "text": "o" },
        ]}])
    );
    assert_eq!(
        editor.selection(),
        Some(&Range::new(point(&[0, 1], 0), point(&[0, 1], 3)))
    );

    editor.remove_mark("bold").unwrap();
    assert_eq!(children(&editor), paragraphs(&["hello"]));
}

#[test]
fn test_pending_mark_applies_to_next_insert() {
    let mut editor = editor(paragraphs(&["ab"]));
    editor.select(caret(&[0, 0], 1)).unwrap();

    editor.add_mark("bold", true).unwrap();
    assert_eq!(
        editor.pending_marks(),
        Some(&Text::new("").with_mark("bold", true).marks)
    );

    editor.insert_text("x").unwrap();

    assert_eq!(
        children(&editor),
        json!([{ "type": "paragraph", "children": [
            { "text": "a" },
            { "text": "x", "bold": true },
            { "text": "b" },
        ]}])
    );
    assert_eq!(editor.pending_marks(), None);
    assert_eq!(editor.selection(), Some(&caret(&[0, 1], 1)));
}

#[test]
fn test_selection_transforms() {
    let mut editor = editor(paragraphs(&["abc"]));
    editor.select(caret(&[0, 0], 0)).unwrap();

    editor
        .move_selection(MoveOptions {
            reverse: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 0)));

    editor.move_selection(MoveOptions::default()).unwrap();
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 1)));

    editor
        .set_point(
            PointPatch {
                offset: Some(3),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    assert_eq!(
        editor.selection(),
        Some(&Range::new(point(&[0, 0], 1), point(&[0, 0], 3)))
    );

    editor
        .move_selection(MoveOptions {
            edge: Some(SelectionEdge::Start),
            reverse: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(
        editor.selection(),
        Some(&Range::new(point(&[0, 0], 0), point(&[0, 0], 3)))
    );

    editor.collapse(SelectionEdge::End).unwrap();
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 3)));

    editor.deselect().unwrap();
    assert_eq!(editor.selection(), None);

    editor.set_selection(caret(&[0, 0], 1).into()).unwrap();
    assert_eq!(editor.selection(), None);
}

#[test]
fn test_move_selection_steps_over_combining_marks() {
    let mut editor = editor(paragraphs(&["e\u{301}x"]));
    editor.select(caret(&[0, 0], 0)).unwrap();

    editor.move_selection(MoveOptions::default()).unwrap();
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 2)));

    editor
        .move_selection(MoveOptions {
            reverse: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 0)));
}

#[test]
fn test_collapse_to_start_of_backward_selection() {
    let mut editor = editor(paragraphs(&["abc"]));
    editor
        .select(Range::new(point(&[0, 0], 3), point(&[0, 0], 1)))
        .unwrap();

    editor.collapse(SelectionEdge::Start).unwrap();

    assert_eq!(editor.selection(), Some(&caret(&[0, 0], 1)));
}

#[test]
fn test_split_nodes_at_path_splits_parent() {
    let mut editor = editor(json!([
        { "type": "quote", "children": paragraphs(&["a", "b"]) },
    ]));

    editor
        .split_nodes(SplitNodesOptions {
            at: Some(Path::from([0, 1]).into()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(
        children(&editor),
        json!([
            { "type": "quote", "children": paragraphs(&["a"]) },
            { "type": "quote", "children": paragraphs(&["b"]) },
        ])
    );
}

#[test]
fn test_transforms_without_location_do_nothing() {
    let mut editor = editor(paragraphs(&["a"]));

    editor.remove_nodes(NodeOptions::default()).unwrap();
    editor.delete(DeleteOptions::default()).unwrap();
    editor
        .set_nodes(Properties::new(), NodeOptions::default())
        .unwrap();
    editor
        .move_nodes(MoveNodesOptions::to(Path::from([0])))
        .unwrap();

    assert!(editor.operations().is_empty());
    assert_eq!(editor.live_refs(), 0);
}

#[test]
fn test_match_by_kind_limits_transform() {
    let mut editor = editor(json!([
        { "type": "heading", "children": [{ "text": "a" }] },
        { "type": "paragraph", "children": [{ "text": "b" }] },
    ]));
    editor
        .select(Range::new(point(&[0, 0], 0), point(&[1, 0], 1)))
        .unwrap();

    editor
        .remove_nodes(NodeOptions {
            matches: Some(Match::kind("heading")),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(children(&editor), paragraphs(&["b"]));
}

#[test]
fn test_split_inside_nested_inline_void_moves_past_it() {
    let mut editor = Editor::new(InlineVoids).with_children(
        serde_json::from_value(json!([
            { "type": "paragraph", "children": [
                { "text": "a" },
                { "type": "link", "children": [
                    { "text": "" },
                    { "type": "link", "children": [
                        { "text": "" },
                        { "type": "image", "children": [{ "text": "" }] },
                    ]},
                ]},
            ]},
            { "type": "paragraph", "children": [{ "text": "b" }] },
        ]))
        .unwrap(),
    );

    let result = editor.split_nodes(SplitNodesOptions {
        at: Some(point(&[0, 1, 1, 1, 0], 0).into()),
        ..Default::default()
    });

    assert_eq!(result, Ok(()));
    assert_eq!(editor.string(Path::root()).unwrap(), "ab");
}
