use plate_core::query::TextUnit;
use plate_core::transforms::{
    self, MergeOptions, SplitOptions, UnwrapOptions, WrapOptions, move_children,
};
use plate_core::{
    AttrPatch, Document, Editor, EditorError, ElementNode, Match, PluginRegistry, Point,
    QueryOptions, Range,
};
use serde_json::json;

fn doc(children: serde_json::Value) -> Document {
    serde_json::from_value(json!({ "children": children })).unwrap()
}

fn caret(path: Vec<usize>, offset: usize) -> Option<Range> {
    Some(Range::collapsed(Point::new(path, offset)))
}

fn two_paragraphs() -> Editor {
    Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "hello" }] },
            { "type": "p", "children": [{ "text": "world" }] },
        ])),
        caret(vec![0, 0], 0),
        PluginRegistry::core(),
    )
}

#[test]
fn move_children_moves_from_start_index_and_counts() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "a" }] },
                { "type": "p", "children": [{ "text": "b" }] },
                { "type": "p", "children": [{ "text": "c" }] },
            ]},
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "x" }] },
            ]},
        ])),
        caret(vec![0, 0, 0], 0),
        PluginRegistry::core(),
    );

    let moved = move_children(&mut editor, &[0], &[1, 0], 1, None).unwrap();

    assert_eq!(moved, 2);
    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "a" }] },
            ]},
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "b" }] },
                { "type": "p", "children": [{ "text": "c" }] },
                { "type": "p", "children": [{ "text": "x" }] },
            ]},
        ]))
    );
}

#[test]
fn move_children_back_restores_both_parents() {
    let original = doc(json!([
        { "type": "blockquote", "children": [
            { "type": "p", "children": [{ "text": "a" }] },
            { "type": "p", "children": [{ "text": "b" }] },
            { "type": "p", "children": [{ "text": "c" }] },
        ]},
        { "type": "blockquote", "children": [
            { "type": "p", "children": [{ "text": "x" }] },
        ]},
    ]));
    let mut editor = Editor::new(original.clone(), None, PluginRegistry::core());

    assert_eq!(move_children(&mut editor, &[0], &[1, 1], 1, None).unwrap(), 2);
    assert_eq!(editor.doc().children[1].string(), "xbc");

    assert_eq!(move_children(&mut editor, &[1], &[0, 1], 1, None).unwrap(), 2);
    assert_eq!(editor.doc(), &original);
}

#[test]
fn delete_fragment_removes_enclosed_blocks() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "aa" }] },
            { "type": "p", "children": [{ "text": "bb" }] },
            { "type": "p", "children": [{ "text": "cc" }] },
            { "type": "p", "children": [{ "text": "dd" }] },
        ])),
        Some(Range::new(Point::new(vec![0, 0], 1), Point::new(vec![3, 0], 1))),
        PluginRegistry::core(),
    );

    editor.delete_fragment().unwrap();

    assert_eq!(
        editor.doc(),
        &doc(json!([{ "type": "p", "children": [{ "text": "ad" }] }]))
    );
    assert_eq!(editor.selection(), caret(vec![0, 0], 1).as_ref());
}

#[test]
fn move_children_ignores_non_blocks_and_filters_by_match() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "a" }] },
                { "type": "h1", "children": [{ "text": "b" }] },
            ]},
            { "type": "p", "children": [{ "text": "x" }] },
        ])),
        caret(vec![0, 0, 0], 0),
        PluginRegistry::richtext(),
    );

    assert_eq!(move_children(&mut editor, &[0, 0, 0], &[1], 0, None).unwrap(), 0);

    let moved = move_children(&mut editor, &[0], &[2], 0, Some(&Match::kind("h1"))).unwrap();
    assert_eq!(moved, 1);
    assert_eq!(editor.doc().children.len(), 3);
    assert_eq!(editor.doc().children[2].kind(), Some("h1"));
    assert_eq!(editor.doc().children[0].children().len(), 1);
}

#[test]
fn insert_break_splits_block_and_moves_cursor() {
    let mut editor = Editor::new(
        doc(json!([{ "type": "p", "children": [{ "text": "hello" }] }])),
        caret(vec![0, 0], 2),
        PluginRegistry::core(),
    );

    editor.insert_break().unwrap();

    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "p", "children": [{ "text": "he" }] },
            { "type": "p", "children": [{ "text": "llo" }] },
        ]))
    );
    assert_eq!(editor.selection(), caret(vec![1, 0], 0).as_ref());
}

#[test]
fn split_nodes_at_path_splits_parent_before_it() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "a" }] },
                { "type": "p", "children": [{ "text": "b" }] },
            ]},
        ])),
        caret(vec![0, 0, 0], 0),
        PluginRegistry::core(),
    );

    transforms::split_nodes(
        &mut editor,
        SplitOptions {
            at: Some(vec![0, 1].into()),
            ..SplitOptions::default()
        },
    )
    .unwrap();

    assert_eq!(editor.doc().children.len(), 2);
    assert_eq!(editor.doc().children[0].string(), "a");
    assert_eq!(editor.doc().children[1].string(), "b");
    assert_eq!(editor.doc().children[1].kind(), Some("blockquote"));
}

#[test]
fn delete_fragment_across_blocks_merges_the_ends() {
    let mut editor = two_paragraphs();
    editor.set_selection(Some(Range::new(
        Point::new(vec![0, 0], 3),
        Point::new(vec![1, 0], 3),
    )));

    editor.delete_fragment().unwrap();

    assert_eq!(
        editor.doc(),
        &doc(json!([{ "type": "p", "children": [{ "text": "helld" }] }]))
    );
    assert_eq!(editor.selection(), caret(vec![0, 0], 3).as_ref());
}

#[test]
fn delete_backward_at_block_start_merges_with_previous() {
    let mut editor = two_paragraphs();
    editor.set_selection(caret(vec![1, 0], 0));

    editor.delete_backward(TextUnit::Character).unwrap();

    assert_eq!(
        editor.doc(),
        &doc(json!([{ "type": "p", "children": [{ "text": "helloworld" }] }]))
    );
    assert_eq!(editor.selection(), caret(vec![0, 0], 5).as_ref());
}

#[test]
fn delete_backward_removes_one_character() {
    let mut editor = two_paragraphs();
    editor.set_selection(caret(vec![0, 0], 5));

    editor.delete_backward(TextUnit::Character).unwrap();

    assert_eq!(editor.doc().children[0].string(), "hell");
    assert_eq!(editor.selection(), caret(vec![0, 0], 4).as_ref());
}

#[test]
fn merge_nodes_at_path_joins_previous_sibling() {
    let mut editor = two_paragraphs();

    transforms::merge_nodes(&mut editor, MergeOptions::at(vec![1])).unwrap();

    assert_eq!(editor.doc().children.len(), 1);
    assert_eq!(editor.doc().children[0].string(), "helloworld");
}

#[test]
fn merging_an_element_into_a_text_is_rejected() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [
                { "text": "x" },
                { "type": "a", "url": "https://example.com", "children": [{ "text": "y" }] },
                { "text": "" },
            ]},
        ])),
        None,
        PluginRegistry::richtext(),
    );
    let before = editor.doc().clone();

    let err = transforms::merge_nodes(&mut editor, MergeOptions::at(vec![0, 1])).unwrap_err();

    assert!(matches!(err, EditorError::MergeMismatch { ref path, .. } if *path == vec![0, 1]));
    assert_eq!(editor.doc(), &before);
}

#[test]
fn wrap_and_unwrap_round_the_matched_block() {
    let mut editor = two_paragraphs();

    let wrapper = transforms::wrap_nodes(
        &mut editor,
        ElementNode::new("blockquote", Vec::new()),
        WrapOptions::at(vec![0]),
    )
    .unwrap();

    assert_eq!(wrapper, Some(vec![0]));
    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "hello" }] },
            ]},
            { "type": "p", "children": [{ "text": "world" }] },
        ]))
    );

    let unwrapped = transforms::unwrap_nodes(&mut editor, UnwrapOptions::at(vec![0])).unwrap();
    assert_eq!(unwrapped, 1);
    assert_eq!(editor.doc(), two_paragraphs().doc());
}

#[test]
fn set_nodes_patches_matching_blocks() {
    let mut editor = two_paragraphs();
    editor.set_selection(Some(Range::new(
        Point::new(vec![0, 0], 0),
        Point::new(vec![1, 0], 2),
    )));

    let changed = transforms::set_nodes(
        &mut editor,
        AttrPatch::kind("h2"),
        QueryOptions::new().matcher(Match::kind("p")),
    )
    .unwrap();

    assert_eq!(changed, 2);
    assert!(editor.doc().children.iter().all(|n| n.kind() == Some("h2")));
}

#[test]
fn insert_text_replaces_expanded_selection() {
    let mut editor = two_paragraphs();
    editor.set_selection(Some(Range::new(
        Point::new(vec![0, 0], 1),
        Point::new(vec![0, 0], 4),
    )));

    editor.insert_text("EY").unwrap();

    assert_eq!(editor.doc().children[0].string(), "hEYo");
    assert_eq!(editor.selection(), caret(vec![0, 0], 3).as_ref());
}

#[test]
fn refs_follow_edits_and_release_on_drop() {
    let mut editor = two_paragraphs();
    let second = editor.path_ref(vec![1]);
    assert_eq!(editor.live_refs(), 1);

    transforms::insert_node(&mut editor, &[0], plate_core::Node::paragraph("new")).unwrap();
    assert_eq!(second.current(), Some(vec![2]));

    transforms::remove_node(&mut editor, &[2]).unwrap();
    assert_eq!(second.current(), None);

    drop(second);
    assert_eq!(editor.live_refs(), 0);
}
