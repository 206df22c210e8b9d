use plate_core::{Document, Editor, Hotkey, Node, PluginRegistry, Point, Range, TextUnit};
use serde_json::json;

fn doc(children: serde_json::Value) -> Document {
    serde_json::from_value(json!({ "children": children })).unwrap()
}

fn table_shape(editor: &Editor, at: usize) -> Vec<usize> {
    let Node::Element(table) = &editor.doc().children[at] else {
        panic!("expected table element");
    };
    assert_eq!(table.kind, "table");
    table.children.iter().map(|row| row.children().len()).collect()
}

fn cell(text: &str) -> serde_json::Value {
    json!({ "type": "td", "children": [{ "type": "p", "children": [{ "text": text }] }] })
}

#[test]
fn table_insert_creates_rectangular_table_and_moves_selection() {
    let mut editor = Editor::with_richtext_plugins();

    editor
        .run_command("table.insert", Some(json!({ "rows": 2, "cols": 2 })))
        .unwrap();

    assert_eq!(editor.doc().children.len(), 2);
    let table = match editor.doc().children.get(1).unwrap() {
        Node::Element(el) => el,
        _ => unreachable!(),
    };
    assert_eq!(table.kind, "table");
    assert_eq!(table.children.len(), 2);
    for row in &table.children {
        let Node::Element(row) = row else {
            panic!("Expected tr element");
        };
        assert_eq!(row.kind, "tr");
        assert_eq!(row.children.len(), 2);
        for cell in &row.children {
            let Node::Element(cell) = cell else {
                panic!("Expected td element");
            };
            assert_eq!(cell.kind, "td");
            assert_eq!(cell.children.len(), 1);
        }
    }

    assert_eq!(editor.selection().unwrap().focus.path, vec![1, 0, 0, 0, 0]);
    assert!(editor.run_query::<bool>("table.is_active", None).unwrap());
}

#[test]
fn table_row_and_col_commands_keep_table_rectangular() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("table.insert", Some(json!({ "rows": 2, "cols": 2 })))
        .unwrap();

    editor.run_command("table.insert_row_below", None).unwrap();
    assert_eq!(table_shape(&editor, 1), vec![2, 2, 2]);
    assert_eq!(editor.selection().unwrap().focus.path, vec![1, 1, 0, 0, 0]);

    editor.run_command("table.insert_col_right", None).unwrap();
    assert_eq!(table_shape(&editor, 1), vec![3, 3, 3]);
    assert_eq!(editor.selection().unwrap().focus.path, vec![1, 1, 1, 0, 0]);

    editor.run_command("table.insert_col_left", None).unwrap();
    assert_eq!(table_shape(&editor, 1), vec![4, 4, 4]);
    assert_eq!(editor.selection().unwrap().focus.path, vec![1, 1, 1, 0, 0]);

    editor.run_command("table.delete_col", None).unwrap();
    assert_eq!(table_shape(&editor, 1), vec![3, 3, 3]);

    editor.run_command("table.insert_row_above", None).unwrap();
    assert_eq!(table_shape(&editor, 1), vec![3, 3, 3, 3]);
    assert_eq!(editor.selection().unwrap().focus.path[..2].to_vec(), vec![1, 1]);

    editor.run_command("table.delete_row", None).unwrap();
    assert_eq!(table_shape(&editor, 1), vec![3, 3, 3]);
}

#[test]
fn delete_row_keeps_the_last_row() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("table.insert", Some(json!({ "rows": 2, "cols": 2 })))
        .unwrap();

    editor.run_command("table.delete_row", None).unwrap();
    assert_eq!(table_shape(&editor, 1), vec![2]);
    assert_eq!(editor.selection().unwrap().focus.path, vec![1, 0, 0, 0, 0]);

    let before = editor.doc().clone();
    editor.run_command("table.delete_row", None).unwrap();
    assert_eq!(editor.doc(), &before);
    assert_eq!(table_shape(&editor, 1), vec![2]);
}

#[test]
fn delete_col_keeps_the_last_column() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("table.insert", Some(json!({ "rows": 2, "cols": 1 })))
        .unwrap();

    editor.run_command("table.delete_col", None).unwrap();

    assert_eq!(table_shape(&editor, 1), vec![1, 1]);
}

#[test]
fn delete_table_leaves_a_paragraph() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("table.insert", Some(json!({ "rows": 1, "cols": 1 })))
        .unwrap();

    editor.run_command("table.delete_table", None).unwrap();

    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "p", "children": [{ "text": "" }] },
            { "type": "p", "children": [{ "text": "" }] },
        ]))
    );
    assert!(!editor.run_query::<bool>("table.is_active", None).unwrap());
}

#[test]
fn tab_moves_between_cells_and_wraps_rows() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "table", "children": [
                { "type": "tr", "children": [cell("a"), cell("b")] },
                { "type": "tr", "children": [cell("c"), cell("d")] },
            ]},
        ])),
        Some(Range::collapsed(Point::new(vec![0, 0, 0, 0, 0], 0))),
        PluginRegistry::richtext(),
    );

    assert!(editor.key_down(Hotkey::Tab).unwrap());
    assert_eq!(
        editor.selection(),
        Some(&Range::collapsed(Point::new(vec![0, 0, 1, 0, 0], 0)))
    );

    assert!(editor.key_down(Hotkey::Tab).unwrap());
    assert_eq!(editor.selection().unwrap().focus.path, vec![0, 1, 0, 0, 0]);

    assert!(editor.key_down(Hotkey::ShiftTab).unwrap());
    assert_eq!(editor.selection().unwrap().focus.path, vec![0, 0, 1, 0, 0]);

    editor.set_selection(Some(Range::collapsed(Point::new(vec![0, 1, 1, 0, 0], 0))));
    assert!(editor.key_down(Hotkey::Tab).unwrap());
    assert_eq!(editor.selection().unwrap().focus.path, vec![0, 1, 1, 0, 0]);
}

#[test]
fn deleting_at_a_cell_edge_keeps_cell_content_apart() {
    let table = json!([
        { "type": "table", "children": [
            { "type": "tr", "children": [cell("a"), cell("b")] },
        ]},
    ]);
    let mut editor = Editor::new(
        doc(table.clone()),
        Some(Range::collapsed(Point::new(vec![0, 0, 1, 0, 0], 0))),
        PluginRegistry::richtext(),
    );

    editor.delete_backward(TextUnit::Character).unwrap();
    assert_eq!(editor.doc(), &doc(table.clone()));

    editor.set_selection(Some(Range::collapsed(Point::new(vec![0, 0, 0, 0, 0], 1))));
    editor.delete_forward(TextUnit::Character).unwrap();
    assert_eq!(editor.doc(), &doc(table));

    editor.delete_backward(TextUnit::Character).unwrap();
    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "table", "children": [
                { "type": "tr", "children": [cell(""), cell("b")] },
            ]},
        ]))
    );
}

#[test]
fn deleting_across_cells_clears_them() {
    let mut editor = Editor::new(
        doc(json!([
            { "type": "table", "children": [
                { "type": "tr", "children": [cell("a"), cell("b")] },
                { "type": "tr", "children": [cell("c"), cell("d")] },
            ]},
        ])),
        Some(Range::new(
            Point::new(vec![0, 0, 0, 0, 0], 0),
            Point::new(vec![0, 1, 0, 0, 0], 1),
        )),
        PluginRegistry::richtext(),
    );

    editor.delete_fragment().unwrap();

    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "table", "children": [
                { "type": "tr", "children": [cell(""), cell("b")] },
                { "type": "tr", "children": [cell(""), cell("d")] },
            ]},
        ]))
    );
    assert_eq!(
        editor.selection(),
        Some(&Range::collapsed(Point::new(vec![0, 0, 0, 0, 0], 0)))
    );
}

#[test]
fn normalize_repairs_table_structure() {
    let editor = Editor::new(
        doc(json!([
            { "type": "table", "children": [
                { "type": "tr", "children": [cell("a")] },
                { "type": "tr", "children": [cell("b"), cell("c")] },
                { "type": "td", "children": [{ "type": "p", "children": [{ "text": "d" }] }] },
            ]},
            { "type": "p", "children": [{ "text": "" }] },
        ])),
        Some(Range::collapsed(Point::new(vec![1, 0], 0))),
        PluginRegistry::richtext(),
    );

    assert_eq!(table_shape(&editor, 0), vec![2, 2, 2]);
    assert_eq!(editor.doc().children[0].string(), "abcd");
    let Node::Element(row) = &editor.doc().children[0].children()[2] else {
        panic!("expected row");
    };
    assert_eq!(row.kind, "tr");
}

#[test]
fn normalize_wraps_loose_cell_text_in_a_paragraph() {
    let editor = Editor::new(
        doc(json!([
            { "type": "table", "children": [
                { "type": "tr", "children": [
                    { "type": "td", "children": [{ "text": "loose" }] },
                ]},
            ]},
        ])),
        None,
        PluginRegistry::richtext(),
    );

    assert_eq!(
        editor.doc(),
        &doc(json!([
            { "type": "table", "children": [
                { "type": "tr", "children": [cell("loose")] },
            ]},
        ]))
    );
}
