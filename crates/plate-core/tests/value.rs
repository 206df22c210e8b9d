use plate_core::{Editor, PlateValue, PluginRegistry};
use serde_json::json;

#[test]
fn envelope_defaults_schema_and_version() {
    let value = PlateValue::from_json_str(
        r#"{ "document": { "children": [{ "type": "p", "children": [{ "text": "hi", "bold": true }] }] } }"#,
    )
    .unwrap();

    assert_eq!(value.schema, "plate-core");
    assert_eq!(value.version, 1);
    assert_eq!(value.document.string(), "hi");
}

#[test]
fn editor_document_serializes_in_slate_shape() {
    let mut editor = Editor::with_richtext_plugins();
    editor.insert_text("abc").unwrap();

    let value = PlateValue::from_document(editor.doc().clone());
    let json: serde_json::Value = serde_json::from_str(&value.to_json_pretty().unwrap()).unwrap();

    assert_eq!(
        json,
        json!({
            "schema": "plate-core",
            "version": 1,
            "document": { "children": [{ "type": "p", "children": [{ "text": "abc" }] }] },
        })
    );

    let reopened = Editor::new(
        PlateValue::from_json_str(&value.to_json_pretty().unwrap())
            .unwrap()
            .into_document(),
        None,
        PluginRegistry::richtext(),
    );
    assert_eq!(reopened.doc(), editor.doc());
}
