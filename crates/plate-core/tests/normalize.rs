use plate_core::transforms::move_children;
use plate_core::{Document, Editor, Node, PluginRegistry};
use serde_json::json;

fn doc(children: serde_json::Value) -> Document {
    serde_json::from_value(json!({ "children": children })).unwrap()
}

#[test]
fn empty_document_gets_a_paragraph() {
    let editor = Editor::new(Document::default(), None, PluginRegistry::richtext());

    assert_eq!(
        editor.doc(),
        &doc(json!([{ "type": "p", "children": [{ "text": "" }] }]))
    );
}

#[test]
fn childless_elements_are_filled_or_dropped() {
    let editor = Editor::new(
        doc(json!([
            { "type": "h1", "children": [] },
            { "type": "ul", "children": [] },
            { "type": "p", "children": [{ "text": "a" }, { "text": "b" }, { "text": "" }] },
        ])),
        None,
        PluginRegistry::richtext(),
    );

    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "h1", "children": [{ "text": "" }] },
            { "type": "p", "children": [{ "text": "ab" }] },
        ]))
    );
}

#[test]
fn empty_containers_get_their_default_child() {
    let editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "x" }] },
            { "type": "code_block", "children": [] },
            { "type": "tr", "children": [] },
        ])),
        None,
        PluginRegistry::richtext(),
    );

    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "p", "children": [{ "text": "x" }] },
            { "type": "code_block", "children": [
                { "type": "code_line", "children": [{ "text": "" }] },
            ]},
            { "type": "tr", "children": [
                { "type": "td", "children": [{ "type": "p", "children": [{ "text": "" }] }] },
            ]},
        ]))
    );
}

#[test]
fn text_mixed_in_with_blocks_is_dropped() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "a" }] },
                { "type": "p", "children": [{ "text": "b" }] },
            ]},
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "x" }] },
            ]},
        ])),
        None,
        PluginRegistry::core(),
    );

    move_children(&mut editor, &[0], &[1, 0], 0, None).unwrap();
    assert_eq!(
        editor.doc().children[0],
        serde_json::from_value::<Node>(json!({ "type": "blockquote", "children": [{ "text": "" }] }))
            .unwrap()
    );

    move_children(&mut editor, &[1], &[0, 0], 0, None).unwrap();
    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "blockquote", "children": [
                { "type": "p", "children": [{ "text": "a" }] },
                { "type": "p", "children": [{ "text": "b" }] },
                { "type": "p", "children": [{ "text": "x" }] },
            ]},
            { "type": "blockquote", "children": [{ "text": "" }] },
        ]))
    );
}

#[test]
fn normalized_document_is_a_fixed_point() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "ul", "children": [
                { "type": "p", "children": [{ "text": "x" }] },
                { "type": "li", "children": [
                    { "type": "p", "children": [{ "text": "y" }] },
                    { "type": "ol", "children": [] },
                ]},
            ]},
            { "type": "table", "children": [
                { "type": "tr", "children": [{ "type": "td", "children": [] }] },
            ]},
            { "type": "code_block", "children": [{ "text": "let a = 1;" }] },
        ])),
        None,
        PluginRegistry::richtext(),
    );
    let settled = editor.doc().clone();
    assert!(editor.operations().is_empty());

    editor.normalize().unwrap();

    assert!(editor.operations().is_empty());
    assert_eq!(editor.doc(), &settled);
    assert_eq!(editor.doc().string(), "xylet a = 1;");
}

#[test]
fn operations_are_recorded_and_can_be_taken() {
    let mut editor = Editor::with_richtext_plugins();

    editor.insert_text("abc").unwrap();
    let ops = editor.take_operations();

    assert_eq!(ops.len(), 1);
    assert!(editor.operations().is_empty());
    assert_eq!(editor.doc().string(), "abc");
}
