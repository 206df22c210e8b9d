use std::sync::Arc;

use plate_core::plugins::core::CorePlugin;
use plate_core::{
    CommandSpec, Document, Editor, EditorConfig, EditorError, EditorHandler, Next, NodeSpec,
    NormalizePass, PlatePlugin, PluginRegistry, Point, QuerySpec, Range, RegistryError,
};
use serde_json::{Value, json};

struct Shout;

impl EditorHandler for Shout {
    fn id(&self) -> &'static str {
        "shout"
    }

    fn insert_text(&self, editor: &mut Editor, text: &str, next: Next<'_>) -> Result<(), EditorError> {
        next.insert_text(editor, &text.to_uppercase())
    }
}

struct Bracket;

impl EditorHandler for Bracket {
    fn id(&self) -> &'static str {
        "bracket"
    }

    fn insert_text(&self, editor: &mut Editor, text: &str, next: Next<'_>) -> Result<(), EditorError> {
        next.insert_text(editor, &format!("[{text}]"))
    }
}

struct HandlerPlugin {
    id: &'static str,
    handler: Arc<dyn EditorHandler>,
}

impl PlatePlugin for HandlerPlugin {
    fn id(&self) -> &'static str {
        self.id
    }

    fn handler(&self) -> Option<Arc<dyn EditorHandler>> {
        Some(self.handler.clone())
    }
}

struct Counter;

impl PlatePlugin for Counter {
    fn id(&self) -> &'static str {
        "counter"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("counter")]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("counter.append", "Append", |editor, args| {
                let text = args
                    .as_ref()
                    .and_then(|args| args.get("text"))
                    .and_then(Value::as_str)
                    .unwrap_or("+");
                editor.insert_text(text).map_err(Into::into)
            })
            .description("Append text at the cursor.")
            .keywords(["counter"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("counter.length", |editor, _args| {
            Ok(json!(editor.doc().string().len()))
        })]
    }
}

struct NeverSettles;

impl NormalizePass for NeverSettles {
    fn id(&self) -> &'static str {
        "never_settles"
    }

    fn run(&self, _editor: &mut Editor) -> Result<bool, EditorError> {
        Ok(true)
    }
}

struct Unstable;

impl PlatePlugin for Unstable {
    fn id(&self) -> &'static str {
        "unstable"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NeverSettles)]
    }
}

fn empty_doc() -> Document {
    serde_json::from_value(json!({ "children": [{ "type": "p", "children": [{ "text": "" }] }] }))
        .unwrap()
}

fn caret() -> Option<Range> {
    Some(Range::collapsed(Point::new(vec![0, 0], 0)))
}

#[test]
fn later_plugins_run_first_and_call_next() {
    let plugins: Vec<Box<dyn PlatePlugin>> = vec![
        Box::new(CorePlugin),
        Box::new(HandlerPlugin {
            id: "shout",
            handler: Arc::new(Shout),
        }),
        Box::new(HandlerPlugin {
            id: "bracket",
            handler: Arc::new(Bracket),
        }),
    ];
    let registry = PluginRegistry::new(plugins).unwrap();
    let ids: Vec<_> = registry.handlers().iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec!["bracket", "shout"]);

    let mut editor = Editor::new(empty_doc(), caret(), registry);
    editor.insert_text("hi").unwrap();

    assert_eq!(editor.doc().string(), "[HI]");
    assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new(vec![0, 0], 4))));
}

#[test]
fn commands_and_queries_are_dispatched_by_id() -> anyhow::Result<()> {
    let plugins: Vec<Box<dyn PlatePlugin>> = vec![Box::new(CorePlugin), Box::new(Counter)];
    let mut editor = Editor::new(empty_doc(), caret(), PluginRegistry::new(plugins)?);

    editor.run_command("counter.append", Some(json!({ "text": "abc" })))?;
    editor.run_command("counter.append", None)?;

    assert_eq!(editor.doc().string(), "abc+");
    assert_eq!(editor.run_query::<usize>("counter.length", None)?, 4);

    let spec = editor.registry().command("counter.append").unwrap();
    assert_eq!(spec.label, "Append");
    assert_eq!(spec.keywords, vec!["counter".to_string()]);

    let err = editor.run_command("counter.missing", None).unwrap_err();
    assert_eq!(err.message(), "Unknown command: counter.missing");
    Ok(())
}

#[test]
fn duplicate_registrations_are_rejected() {
    let twice: Vec<Box<dyn PlatePlugin>> = vec![Box::new(Counter), Box::new(Counter)];
    assert!(matches!(
        PluginRegistry::new(twice),
        Err(RegistryError::DuplicateNodeKind(kind)) if kind == "counter"
    ));

    let mut registry = PluginRegistry::richtext();
    let err = registry.register_plugin(Box::new(CorePlugin)).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateNodeKind("p".to_string()));
}

#[test]
fn richtext_registry_covers_every_plugin() {
    let editor = Editor::with_richtext_plugins();
    let registry = editor.registry();

    for kind in ["p", "h1", "img", "code_block", "code_line", "table", "tr", "td", "ul", "ol", "li"] {
        assert!(registry.is_known_kind(kind), "missing node spec {kind}");
    }
    for command in [
        "list.toggle_bulleted",
        "list.indent",
        "table.insert",
        "table.delete_row",
        "code_block.toggle",
    ] {
        assert!(registry.command(command).is_some(), "missing command {command}");
    }
    let handlers: Vec<_> = registry.handlers().iter().map(|h| h.id()).collect();
    assert_eq!(handlers, vec!["list", "table", "code_block"]);
}

#[test]
fn normalization_stops_at_the_iteration_cap() {
    let plugins: Vec<Box<dyn PlatePlugin>> = vec![Box::new(CorePlugin), Box::new(Unstable)];
    let config = EditorConfig {
        max_normalize_iterations: 5,
        ..EditorConfig::default()
    };
    let mut editor =
        Editor::with_config(empty_doc(), caret(), PluginRegistry::new(plugins).unwrap(), config);

    let err = editor.normalize().unwrap_err();
    assert!(matches!(err, EditorError::NormalizeDidNotConverge(5)));
}
