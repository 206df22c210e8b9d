use plate_core::{Document, Editor, Hotkey, Node, PluginRegistry, Point, Range};
use serde_json::json;

fn doc(children: serde_json::Value) -> Document {
    serde_json::from_value(json!({ "children": children })).unwrap()
}

fn caret(path: Vec<usize>, offset: usize) -> Option<Range> {
    Some(Range::collapsed(Point::new(path, offset)))
}

fn code(lines: &[&str]) -> serde_json::Value {
    let lines: Vec<_> = lines
        .iter()
        .map(|line| json!({ "type": "code_line", "children": [{ "text": line }] }))
        .collect();
    json!([{ "type": "code_block", "children": lines }])
}

fn code_editor(lines: &[&str], selection: Option<Range>) -> Editor {
    Editor::new(doc(code(lines)), selection, PluginRegistry::richtext())
}

#[test]
fn shift_tab_removes_at_most_one_indent_level() {
    let mut editor = code_editor(&["  foo"], caret(vec![0, 0, 0], 0));

    assert!(editor.key_down(Hotkey::ShiftTab).unwrap());
    assert_eq!(editor.doc(), &doc(code(&["foo"])));

    let mut editor = code_editor(&["   x"], caret(vec![0, 0, 0], 4));
    editor.key_down(Hotkey::ShiftTab).unwrap();
    assert_eq!(editor.doc(), &doc(code(&[" x"])));

    let mut editor = code_editor(&["bare"], caret(vec![0, 0, 0], 0));
    editor.key_down(Hotkey::ShiftTab).unwrap();
    assert_eq!(editor.doc(), &doc(code(&["bare"])));
}

#[test]
fn tab_indents_at_line_start_or_at_cursor() {
    let mut editor = code_editor(&["foo"], caret(vec![0, 0, 0], 0));
    assert!(editor.key_down(Hotkey::Tab).unwrap());
    assert_eq!(editor.doc(), &doc(code(&["  foo"])));

    let mut editor = code_editor(&["foo"], caret(vec![0, 0, 0], 3));
    editor.key_down(Hotkey::Tab).unwrap();
    assert_eq!(editor.doc(), &doc(code(&["foo  "])));
}

#[test]
fn tab_on_expanded_selection_indents_every_line() {
    let mut editor = code_editor(
        &["a", "b", "c"],
        Some(Range::new(
            Point::new(vec![0, 0, 0], 0),
            Point::new(vec![0, 1, 0], 1),
        )),
    );

    editor.key_down(Hotkey::Tab).unwrap();

    assert_eq!(editor.doc(), &doc(code(&["  a", "  b", "c"])));
}

#[test]
fn enter_keeps_the_line_indent() {
    let mut editor = code_editor(&["  foo"], caret(vec![0, 0, 0], 5));

    editor.insert_break().unwrap();

    assert_eq!(editor.doc(), &doc(code(&["  foo", "  "])));
    assert_eq!(editor.selection(), caret(vec![0, 1, 0], 2).as_ref());
}

#[test]
fn code_block_toggle_updates_block_and_query() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "a" }] },
            { "type": "p", "children": [{ "text": "b" }] },
        ])),
        Some(Range::new(
            Point::new(vec![0, 0], 0),
            Point::new(vec![1, 0], 1),
        )),
        PluginRegistry::richtext(),
    );
    assert!(
        !editor
            .run_query::<bool>("code_block.is_active", None)
            .unwrap()
    );

    editor.run_command("code_block.toggle", None).unwrap();

    assert_eq!(editor.doc(), &doc(code(&["a", "b"])));
    assert!(
        editor
            .run_query::<bool>("code_block.is_active", None)
            .unwrap()
    );

    editor.run_command("code_block.toggle", None).unwrap();

    let Node::Element(block) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(block.kind, "p");
    assert_eq!(editor.doc().children.len(), 2);
    assert!(
        !editor
            .run_query::<bool>("code_block.is_active", None)
            .unwrap()
    );
}

#[test]
fn normalize_keeps_code_lines_inside_code_blocks() {
    let editor = Editor::new(
        doc(json!([
            { "type": "code_line", "children": [{ "text": "x" }] },
            { "type": "code_block", "children": [
                { "type": "p", "children": [{ "text": "y" }] },
                { "text": "z" },
            ]},
        ])),
        None,
        PluginRegistry::richtext(),
    );

    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "p", "children": [{ "text": "x" }] },
            { "type": "code_block", "children": [
                { "type": "code_line", "children": [{ "text": "y" }] },
                { "type": "code_line", "children": [{ "text": "z" }] },
            ]},
        ]))
    );
}

#[test]
fn empty_code_block_gets_a_line_and_stays_editable() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "x" }] },
            { "type": "code_block", "children": [] },
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
        ]))
    );

    editor.set_selection(caret(vec![1, 0, 0], 0));
    assert!(editor.key_down(Hotkey::Tab).unwrap());
    assert_eq!(editor.doc().children[1].string(), "  ");
}
