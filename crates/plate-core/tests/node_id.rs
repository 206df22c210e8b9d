use plate_core::plugins::node_id::NodeIdPlugin;
use plate_core::{
    Document, Editor, EditorConfig, Node, NodeIdConfig, PlatePlugin, PluginRegistry, Point, Range,
};
use serde_json::json;

fn registry() -> PluginRegistry {
    let mut plugins: Vec<Box<dyn PlatePlugin>> = PluginRegistry::richtext_plugins();
    plugins.push(Box::new(NodeIdPlugin));
    PluginRegistry::new(plugins).unwrap()
}

fn id_of<'a>(editor: &'a Editor, at: &[usize], key: &str) -> Option<&'a str> {
    editor.doc().element(at)?.attr_str(key)
}

fn hello() -> Document {
    serde_json::from_value(json!({ "children": [
        { "type": "p", "id": "first", "children": [{ "text": "hello" }] },
    ]}))
    .unwrap()
}

#[test]
fn split_gives_the_new_half_a_fresh_id() {
    let mut editor = Editor::new(
        hello(),
        Some(Range::collapsed(Point::new(vec![0, 0], 2))),
        registry(),
    );

    editor.insert_break().unwrap();

    assert_eq!(id_of(&editor, &[0], "id"), Some("first"));
    let second = id_of(&editor, &[1], "id").unwrap();
    assert_ne!(second, "first");
    assert!(editor.doc().text(&[1, 0]).unwrap().marks.is_empty());

    let found: Option<Vec<usize>> = editor
        .run_query("node_id.path", Some(json!({ "id": second })))
        .unwrap();
    assert_eq!(found, Some(vec![1]));
}

#[test]
fn inserted_subtrees_are_stamped_deeply() {
    let mut editor = Editor::new(
        hello(),
        Some(Range::collapsed(Point::new(vec![0, 0], 0))),
        registry(),
    );

    editor
        .run_command("table.insert", Some(json!({ "rows": 2, "cols": 2 })))
        .unwrap();

    let mut ids = Vec::new();
    for at in [vec![1], vec![1, 0], vec![1, 1, 1], vec![1, 1, 1, 0]] {
        ids.push(id_of(&editor, &at, "id").unwrap().to_string());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[test]
fn existing_ids_are_kept_and_config_filters_kinds() {
    let config = EditorConfig {
        node_id: NodeIdConfig {
            key: "uid".to_string(),
            exclude: vec!["p".to_string()],
            ..NodeIdConfig::default()
        },
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(
        hello(),
        Some(Range::collapsed(Point::new(vec![0, 0], 5))),
        registry(),
        config,
    );

    let keep = plate_core::ElementNode::new("h1", vec![Node::text("kept")]).with_attr("uid", "fixed");
    plate_core::transforms::insert_node(&mut editor, &[1], keep.into()).unwrap();
    plate_core::transforms::insert_node(&mut editor, &[2], Node::paragraph("plain")).unwrap();

    assert_eq!(id_of(&editor, &[1], "uid"), Some("fixed"));
    assert_eq!(id_of(&editor, &[2], "uid"), None);
    assert_eq!(
        editor.run_query::<Option<Vec<usize>>>("node_id.path", Some(json!({ "id": "fixed" }))).unwrap(),
        Some(vec![1])
    );
    assert_eq!(editor.run_query_json("node_id.path", None).unwrap(), json!(null));
}
