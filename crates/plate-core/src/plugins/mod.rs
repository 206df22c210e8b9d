pub mod code_block;
pub mod core;
pub mod heading;
pub mod list;
pub mod media;
pub mod node_id;
pub mod table;

use serde_json::Value;

use crate::editor::Editor;
use crate::error::CommandError;
use crate::location::Range;
use crate::node::{Document, ElementNode};
use crate::path::Path;
use crate::query::Descendants;

/// Paths of every element satisfying `pred`, in document order.
pub(crate) fn element_paths(
    doc: &Document,
    mut pred: impl FnMut(&ElementNode, &[usize]) -> bool,
) -> Vec<Path> {
    Descendants::new(doc, Vec::new(), None, false)
        .filter_map(|(node, path)| {
            let el = node.as_element()?;
            pred(el, &path).then_some(path)
        })
        .collect()
}

pub(crate) fn selection_or_err(editor: &Editor) -> Result<Range, CommandError> {
    editor
        .selection()
        .cloned()
        .ok_or_else(|| CommandError::new("No selection"))
}

pub(crate) fn arg_str<'a>(args: &'a Option<Value>, key: &str) -> Option<&'a str> {
    args.as_ref()?.get(key)?.as_str()
}

pub(crate) fn arg_u64(args: &Option<Value>, key: &str) -> Option<u64> {
    args.as_ref()?.get(key)?.as_u64()
}
