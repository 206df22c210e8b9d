//! Nested bulleted and ordered lists.
//!
//! A list (`ul`/`ol`) holds list items (`li`); each item holds one text block,
//! optionally followed by one nested list. Indenting moves an item into the
//! previous item's sublist, outdenting moves it after its parent item.

mod handler;
mod normalize;
pub mod queries;
pub mod transforms;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{CommandError, QueryError};
use crate::plugin::{CommandSpec, EditorHandler, NodeSpec, NormalizePass, PlatePlugin, QuerySpec};
use crate::plugins::arg_str;

pub use queries::{
    ListItemEntry, active_list_kind, get_list_item_entry, has_list_child, is_list, is_list_item,
    is_list_nested,
};
pub use transforms::{
    insert_list_item, move_list_item_down, move_list_item_up, move_list_items, toggle_list,
    unwrap_list,
};

pub const UL: &str = "ul";
pub const OL: &str = "ol";
pub const LI: &str = "li";
pub const LIST_KINDS: [&str; 2] = [UL, OL];

pub struct ListPlugin;

impl PlatePlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::container(UL).default_child(LI),
            NodeSpec::container(OL).default_child(LI),
            NodeSpec::container(LI),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(normalize::NormalizeList)]
    }

    fn handler(&self) -> Option<Arc<dyn EditorHandler>> {
        Some(Arc::new(handler::ListHandler))
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.toggle_bulleted", "Toggle bulleted list", |editor, _args| {
                toggle_list(editor, UL)
                    .map_err(|e| CommandError::new(format!("Failed to toggle list: {e}")))
            })
            .description("Toggle bulleted list for the active block(s).")
            .keywords(["list", "bulleted", "unordered", "ul"]),
            CommandSpec::new("list.toggle_ordered", "Toggle ordered list", |editor, _args| {
                toggle_list(editor, OL)
                    .map_err(|e| CommandError::new(format!("Failed to toggle list: {e}")))
            })
            .description("Toggle ordered list for the active block(s).")
            .keywords(["list", "ordered", "numbered", "ol"]),
            CommandSpec::new("list.indent", "Indent list item", |editor, _args| {
                move_list_items(editor, true).map(|_| ()).map_err(CommandError::from)
            })
            .description("Nest the selected list items one level deeper.")
            .keywords(["list", "indent", "nest"]),
            CommandSpec::new("list.outdent", "Outdent list item", |editor, _args| {
                move_list_items(editor, false).map(|_| ()).map_err(CommandError::from)
            })
            .description("Lift the selected list items one level.")
            .keywords(["list", "outdent", "lift"]),
            CommandSpec::new("list.unwrap", "Unwrap list item", |editor, _args| {
                unwrap_list(editor).map_err(CommandError::from)
            })
            .description("Convert the active list item back to a paragraph.")
            .keywords(["list", "unwrap", "paragraph"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("list.active_type", |editor, _args| {
                Ok(active_list_kind(editor).map_or(Value::Null, Value::String))
            }),
            QuerySpec::new("list.is_active", |editor, args| {
                let expected =
                    arg_str(&args, "type").ok_or_else(|| QueryError::new("Missing args.type"))?;
                Ok(Value::Bool(active_list_kind(editor).as_deref() == Some(expected)))
            }),
        ]
    }
}
