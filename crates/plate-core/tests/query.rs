use plate_core::query::{self, AboveOptions, Mode, QueryOptions};
use plate_core::{Document, Editor, Location, Match, PluginRegistry, Point, Range};
use serde_json::json;

fn doc(children: serde_json::Value) -> Document {
    serde_json::from_value(json!({ "children": children })).unwrap()
}

fn caret(path: Vec<usize>, offset: usize) -> Option<Range> {
    Some(Range::collapsed(Point::new(path, offset)))
}

fn nested_list_editor() -> Editor {
    Editor::new(
        doc(json!([
            { "type": "ul", "children": [
                { "type": "li", "children": [
                    { "type": "p", "children": [{ "text": "a" }] },
                    { "type": "ul", "children": [
                        { "type": "li", "children": [
                            { "type": "p", "children": [{ "text": "b" }] },
                        ]},
                    ]},
                ]},
            ]},
        ])),
        caret(vec![0, 0, 1, 0, 0, 0], 0),
        PluginRegistry::richtext(),
    )
}

#[test]
fn find_node_is_none_without_a_match_in_scope() {
    let editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "a" }] },
            { "type": "h2", "children": [{ "text": "b" }] },
        ])),
        caret(vec![0, 0], 0),
        PluginRegistry::richtext(),
    );

    let found = query::find_node(
        &editor,
        QueryOptions::new().at(vec![0]).matcher(Match::kind("h1")),
    );
    assert!(found.is_none());

    let (node, path) = query::find_node(
        &editor,
        QueryOptions::new().at(vec![1]).matcher(Match::kind("h2")),
    )
    .unwrap();
    assert_eq!(path, vec![1]);
    assert_eq!(node.string(), "b");
}

#[test]
fn path_scope_skips_ancestors_but_range_scope_does_not() {
    let editor = nested_list_editor();

    let in_path = query::find_node(
        &editor,
        QueryOptions::new()
            .at(vec![0, 0, 1])
            .matcher(Match::kind("li")),
    )
    .map(|(_, p)| p);
    assert_eq!(in_path, Some(vec![0, 0, 1, 0]));

    let selection = editor.selection().cloned().unwrap();
    let in_range = query::find_node(
        &editor,
        QueryOptions::new().at(selection).matcher(Match::kind("li")),
    )
    .map(|(_, p)| p);
    assert_eq!(in_range, Some(vec![0, 0]));
}

#[test]
fn get_nodes_modes_report_highest_and_lowest_matches() {
    let editor = nested_list_editor();
    let lists = |mode| -> Vec<Vec<usize>> {
        query::get_nodes(
            &editor,
            QueryOptions::new()
                .at(vec![0])
                .matcher(Match::kinds(["ul", "ol"]))
                .mode(mode),
        )
        .map(|(_, p)| p)
        .collect()
    };

    assert_eq!(lists(Mode::All), vec![vec![0], vec![0, 0, 1]]);
    assert_eq!(lists(Mode::Highest), vec![vec![0]]);
    assert_eq!(lists(Mode::Lowest), vec![vec![0, 0, 1]]);
}

#[test]
fn get_nodes_reverse_walks_backwards() {
    let editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "a" }] },
            { "type": "p", "children": [{ "text": "b" }] },
            { "type": "p", "children": [{ "text": "c" }] },
        ])),
        Some(Range::new(
            Point::new(vec![0, 0], 0),
            Point::new(vec![2, 0], 1),
        )),
        PluginRegistry::richtext(),
    );

    let paths: Vec<_> = query::get_nodes(
        &editor,
        QueryOptions::new().matcher(Match::kind("p")).reverse(true),
    )
    .map(|(_, p)| p)
    .collect();
    assert_eq!(paths, vec![vec![2], vec![1], vec![0]]);
}

#[test]
fn get_above_finds_closest_or_highest_ancestor() {
    let editor = nested_list_editor();

    let closest = query::get_above(&editor, AboveOptions::new().matcher(Match::kind("li")))
        .map(|(_, p)| p);
    assert_eq!(closest, Some(vec![0, 0, 1, 0]));

    let highest = query::get_above(
        &editor,
        AboveOptions::new()
            .matcher(Match::kind("li"))
            .mode(Mode::Highest),
    )
    .map(|(_, p)| p);
    assert_eq!(highest, Some(vec![0, 0]));

    let none = query::get_above(
        &editor,
        AboveOptions::new()
            .at(Location::Path(vec![0]))
            .matcher(Match::kind("li")),
    );
    assert!(none.is_none());
}

#[test]
fn point_queries_resolve_edges_and_strings() {
    let editor = Editor::new(
        doc(json!([
            { "type": "p", "children": [{ "text": "hello" }] },
            { "type": "p", "children": [{ "text": "world" }] },
        ])),
        caret(vec![0, 0], 0),
        PluginRegistry::richtext(),
    );

    let whole = Location::Path(Vec::new());
    assert_eq!(query::start(&editor, &whole), Some(Point::new(vec![0, 0], 0)));
    assert_eq!(query::end(&editor, &whole), Some(Point::new(vec![1, 0], 5)));
    assert_eq!(query::string(&editor, &Location::Path(vec![1])), "world");

    let span = Location::Range(Range::new(
        Point::new(vec![0, 0], 3),
        Point::new(vec![1, 0], 2),
    ));
    assert_eq!(query::string(&editor, &span), "lowo");
    assert!(query::is_selection_at_block_start(&editor));
}

#[test]
fn registered_queries_report_active_state() {
    let editor = nested_list_editor();

    let active: Option<String> = editor.run_query("list.active_type", None).unwrap();
    assert_eq!(active.as_deref(), Some("ul"));
    assert!(
        editor
            .run_query::<bool>("list.is_active", Some(json!({ "type": "ul" })))
            .unwrap()
    );
    assert!(editor.run_query_json("list.is_active", None).is_err());
    assert!(!editor.run_query::<bool>("table.is_active", None).unwrap());
    assert!(editor.run_query_json("no.such_query", None).is_err());
}
