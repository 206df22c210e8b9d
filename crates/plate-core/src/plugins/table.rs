//! Tables: `table > tr > (td|th) > blocks`, kept rectangular.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::editor::Editor;
use crate::error::{CommandError, EditorError};
use crate::location::{Edge, Location, Point, Range};
use crate::matcher::Match;
use crate::node::{Node, PARAGRAPH};
use crate::ops::{Op, Transaction};
use crate::path::{self, Path};
use crate::plugin::{CommandSpec, EditorHandler, Hotkey, Next, NormalizePass, NodeSpec, PlatePlugin, QuerySpec};
use crate::plugins::{arg_u64, element_paths};
use crate::query::{self, AboveOptions, TextUnit};
use crate::transforms::{insert_node, move_node, remove_node};

pub const TABLE: &str = "table";
pub const ROW: &str = "tr";
pub const CELL: &str = "td";
pub const HEADER_CELL: &str = "th";
pub const CELL_KINDS: [&str; 2] = [CELL, HEADER_CELL];

pub struct TablePlugin;

impl PlatePlugin for TablePlugin {
    fn id(&self) -> &'static str {
        "table"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::container(TABLE).default_child(ROW),
            NodeSpec::container(ROW).default_child(CELL),
            NodeSpec::container(CELL),
            NodeSpec::container(HEADER_CELL),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeTableStructure)]
    }

    fn handler(&self) -> Option<Arc<dyn EditorHandler>> {
        Some(Arc::new(TableHandler))
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("table.insert", "Insert table", |editor, args| {
                let rows = arg_u64(&args, "rows").unwrap_or(2).clamp(1, 32) as usize;
                let cols = arg_u64(&args, "cols").unwrap_or(2).clamp(1, 32) as usize;
                insert_table(editor, rows, cols)
                    .map_err(|e| CommandError::new(format!("Failed to insert table: {e}")))
            })
            .description("Insert a table after the current block.")
            .keywords(["table", "grid"])
            .args_example(serde_json::json!({ "rows": 2, "cols": 3 })),
            CommandSpec::new("table.insert_row_above", "Insert row above", |editor, _args| {
                add_row(editor, true)
                    .map(|_| ())
                    .map_err(|e| CommandError::new(format!("Failed to insert row above: {e}")))
            })
            .description("Insert a new row above the current row.")
            .keywords(["table", "row", "insert"]),
            CommandSpec::new("table.insert_row_below", "Insert row below", |editor, _args| {
                add_row(editor, false)
                    .map(|_| ())
                    .map_err(|e| CommandError::new(format!("Failed to insert row below: {e}")))
            })
            .description("Insert a new row below the current row.")
            .keywords(["table", "row", "insert"]),
            CommandSpec::new("table.insert_col_left", "Insert column left", |editor, _args| {
                add_column(editor, true)
                    .map(|_| ())
                    .map_err(|e| CommandError::new(format!("Failed to insert column left: {e}")))
            })
            .description("Insert a new column to the left of the current column.")
            .keywords(["table", "column", "insert"]),
            CommandSpec::new("table.insert_col_right", "Insert column right", |editor, _args| {
                add_column(editor, false)
                    .map(|_| ())
                    .map_err(|e| CommandError::new(format!("Failed to insert column right: {e}")))
            })
            .description("Insert a new column to the right of the current column.")
            .keywords(["table", "column", "insert"]),
            CommandSpec::new("table.delete_row", "Delete row", |editor, _args| {
                delete_row(editor)
                    .map(|_| ())
                    .map_err(|e| CommandError::new(format!("Failed to delete row: {e}")))
            })
            .description("Delete the current table row, unless it is the last one.")
            .keywords(["table", "row", "delete", "remove"]),
            CommandSpec::new("table.delete_col", "Delete column", |editor, _args| {
                delete_column(editor)
                    .map(|_| ())
                    .map_err(|e| CommandError::new(format!("Failed to delete column: {e}")))
            })
            .description("Delete the current table column, unless it is the last one.")
            .keywords(["table", "column", "delete", "remove"]),
            CommandSpec::new("table.delete_table", "Delete table", |editor, _args| {
                delete_table(editor)
                    .map_err(|e| CommandError::new(format!("Failed to delete table: {e}")))
            })
            .description("Delete the current table and replace it with a paragraph.")
            .keywords(["table", "delete", "remove"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("table.is_active", |editor, _args| {
            Ok(Value::Bool(get_table_cell_entry(editor, None).is_some()))
        })]
    }
}

/// The cell holding a location, with its row and table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCellEntry {
    pub table: Path,
    pub row: Path,
    pub cell: Path,
}

impl TableCellEntry {
    pub fn row_index(&self) -> usize {
        path::last_index(&self.row).unwrap_or_default()
    }

    pub fn col_index(&self) -> usize {
        path::last_index(&self.cell).unwrap_or_default()
    }
}

fn is_kind(editor: &Editor, at: &[usize], kind: &str) -> bool {
    editor.doc().node(at).and_then(Node::kind) == Some(kind)
}

fn child_count(editor: &Editor, at: &[usize]) -> usize {
    editor.doc().children_at(at).map_or(0, <[Node]>::len)
}

/// Closest cell above `at` (the selection focus by default).
pub fn get_table_cell_entry(editor: &Editor, at: Option<Location>) -> Option<TableCellEntry> {
    let at = match at {
        Some(Location::Range(range)) => Location::Point(range.focus),
        Some(at) => at,
        None => Location::Point(editor.selection()?.focus.clone()),
    };
    let (_, cell) = query::get_above(editor, AboveOptions::new().at(at).matcher(Match::kinds(CELL_KINDS)))?;
    let row = path::parent(&cell).filter(|row| is_kind(editor, row, ROW))?;
    let table = path::parent(&row).filter(|table| is_kind(editor, table, TABLE))?;
    Some(TableCellEntry { table, row, cell })
}

pub fn cell_node() -> Node {
    Node::element(CELL, vec![Node::paragraph("")])
}

pub fn row_node(cols: usize) -> Node {
    Node::element(ROW, (0..cols.max(1)).map(|_| cell_node()).collect())
}

pub fn table_node(rows: usize, cols: usize) -> Node {
    Node::element(TABLE, (0..rows.max(1)).map(|_| row_node(cols)).collect())
}

fn cell_start(cell: &[usize]) -> Range {
    let mut text = cell.to_vec();
    text.extend([0, 0]);
    Range::collapsed(Point::new(text, 0))
}

fn select_cell_start(editor: &mut Editor, cell: &[usize]) {
    if let Some(start) = query::start(editor, &Location::Path(cell.to_vec())) {
        editor.set_selection(Some(Range::collapsed(start)));
    }
}

pub fn insert_table(editor: &mut Editor, rows: usize, cols: usize) -> Result<(), EditorError> {
    let selection = editor.selection().cloned().ok_or(EditorError::NoSelection)?;
    let block = query::block_path_of(editor, &selection.focus.path);
    let at = match path::next(&block) {
        Some(at) => at,
        None => vec![editor.doc().children.len()],
    };
    let first_cell = [at.clone(), vec![0, 0]].concat();
    let tx = Transaction::new(vec![Op::InsertNode {
        path: at.clone(),
        node: table_node(rows, cols),
    }])
    .selection_after(cell_start(&first_cell))
    .source("command:table.insert");
    editor.apply(tx)?;
    debug!(?at, rows, cols, "insert table");
    Ok(())
}

/// Inserts a row as wide as the current one, above or below it.
pub fn add_row(editor: &mut Editor, above: bool) -> Result<bool, EditorError> {
    let Some(entry) = get_table_cell_entry(editor, None) else {
        return Ok(false);
    };
    let cols = child_count(editor, &entry.row);
    let row_ix = entry.row_index() + usize::from(!above);
    let at = path::child(&entry.table, row_ix);
    let cell = path::child(&at, entry.col_index().min(cols.saturating_sub(1)));

    let tx = Transaction::new(vec![Op::InsertNode {
        path: at.clone(),
        node: row_node(cols),
    }])
    .selection_after(cell_start(&cell))
    .source(if above {
        "command:table.insert_row_above"
    } else {
        "command:table.insert_row_below"
    });
    editor.apply(tx)?;
    debug!(row = ?at, "add table row");
    Ok(true)
}

/// Inserts a cell into every row, left or right of the current column.
pub fn add_column(editor: &mut Editor, left: bool) -> Result<bool, EditorError> {
    let Some(entry) = get_table_cell_entry(editor, None) else {
        return Ok(false);
    };
    let col_ix = entry.col_index() + usize::from(!left);
    let rows = child_count(editor, &entry.table);
    let ops = (0..rows)
        .map(|row_ix| {
            let row = path::child(&entry.table, row_ix);
            let ix = col_ix.min(child_count(editor, &row));
            Op::InsertNode {
                path: path::child(&row, ix),
                node: cell_node(),
            }
        })
        .collect();
    let cell = path::child(&entry.row, col_ix);

    let tx = Transaction::new(ops)
        .selection_after(cell_start(&cell))
        .source(if left {
            "command:table.insert_col_left"
        } else {
            "command:table.insert_col_right"
        });
    editor.apply(tx)?;
    debug!(table = ?entry.table, col = col_ix, "add table column");
    Ok(true)
}

/// Removes the current row. The last remaining row is kept.
pub fn delete_row(editor: &mut Editor) -> Result<bool, EditorError> {
    let Some(entry) = get_table_cell_entry(editor, None) else {
        return Ok(false);
    };
    let rows = child_count(editor, &entry.table);
    if rows <= 1 {
        debug!(table = ?entry.table, "refuse to delete the last row");
        return Ok(false);
    }
    let row_ix = entry.row_index();
    let target_row = path::child(&entry.table, row_ix.min(rows - 2));

    editor.without_normalizing(|editor| {
        remove_node(editor, &entry.row)?;
        let cols = child_count(editor, &target_row);
        let cell = path::child(&target_row, entry.col_index().min(cols.saturating_sub(1)));
        select_cell_start(editor, &cell);
        Ok(())
    })?;
    debug!(row = ?entry.row, "delete table row");
    Ok(true)
}

/// Removes the current column from every row. The last remaining column is
/// kept.
pub fn delete_column(editor: &mut Editor) -> Result<bool, EditorError> {
    let Some(entry) = get_table_cell_entry(editor, None) else {
        return Ok(false);
    };
    let cols = child_count(editor, &entry.row);
    if cols <= 1 {
        debug!(table = ?entry.table, "refuse to delete the last column");
        return Ok(false);
    }
    let col_ix = entry.col_index();
    let rows = child_count(editor, &entry.table);

    editor.without_normalizing(|editor| {
        for row_ix in (0..rows).rev() {
            let row = path::child(&entry.table, row_ix);
            if col_ix < child_count(editor, &row) {
                remove_node(editor, &path::child(&row, col_ix))?;
            }
        }
        let cell = path::child(&entry.row, col_ix.min(cols - 2));
        select_cell_start(editor, &cell);
        Ok(())
    })?;
    debug!(table = ?entry.table, col = col_ix, "delete table column");
    Ok(true)
}

pub fn delete_table(editor: &mut Editor) -> Result<(), EditorError> {
    let Some(entry) = get_table_cell_entry(editor, None) else {
        return Ok(());
    };
    let tx = Transaction::new(vec![
        Op::RemoveNode {
            path: entry.table.clone(),
        },
        Op::InsertNode {
            path: entry.table.clone(),
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Range::collapsed(Point::new(path::child(&entry.table, 0), 0)))
    .source("command:table.delete_table");
    editor.apply(tx)
}

/// The cell after (or before) the entry's cell, wrapping across rows.
pub fn sibling_cell(editor: &Editor, entry: &TableCellEntry, forward: bool) -> Option<Path> {
    let col = entry.col_index();
    let row = entry.row_index();
    if forward {
        if col + 1 < child_count(editor, &entry.row) {
            return Some(path::child(&entry.row, col + 1));
        }
        let next_row = path::child(&entry.table, row + 1);
        (child_count(editor, &next_row) > 0).then(|| path::child(&next_row, 0))
    } else {
        if col > 0 {
            return Some(path::child(&entry.row, col - 1));
        }
        let prev_row = path::child(&entry.table, row.checked_sub(1)?);
        let cols = child_count(editor, &prev_row);
        (cols > 0).then(|| path::child(&prev_row, cols - 1))
    }
}

/// Cells of the rectangle spanned by two cells of the same table.
pub fn table_grid(editor: &Editor, anchor: &TableCellEntry, focus: &TableCellEntry) -> Vec<Path> {
    if anchor.table != focus.table {
        return Vec::new();
    }
    let (row_lo, row_hi) = min_max(anchor.row_index(), focus.row_index());
    let (col_lo, col_hi) = min_max(anchor.col_index(), focus.col_index());
    let mut cells = Vec::new();
    for row_ix in row_lo..=row_hi {
        let row = path::child(&anchor.table, row_ix);
        let cols = child_count(editor, &row);
        for col_ix in col_lo..=col_hi.min(cols.saturating_sub(1)) {
            cells.push(path::child(&row, col_ix));
        }
    }
    cells
}

fn min_max(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Cells covered by an expanded selection spanning more than one cell.
fn selected_cells(editor: &Editor) -> Option<Vec<Path>> {
    let selection = editor.selection()?;
    if selection.is_collapsed() {
        return None;
    }
    let anchor = get_table_cell_entry(editor, Some(Location::Point(selection.anchor.clone())))?;
    let focus = get_table_cell_entry(editor, Some(Location::Point(selection.focus.clone())))?;
    if anchor.cell == focus.cell {
        return None;
    }
    let cells = table_grid(editor, &anchor, &focus);
    (cells.len() > 1).then_some(cells)
}

/// Empties every cell down to a single empty paragraph and collapses the
/// selection into the first one.
fn clear_cells(editor: &mut Editor, cells: &[Path]) -> Result<(), EditorError> {
    editor.without_normalizing(|editor| {
        for cell in cells {
            for ix in (0..child_count(editor, cell)).rev() {
                remove_node(editor, &path::child(cell, ix))?;
            }
            insert_node(editor, &path::child(cell, 0), Node::paragraph(""))?;
        }
        if let Some(first) = cells.first() {
            editor.set_selection(Some(cell_start(first)));
        }
        debug!(cells = cells.len(), "clear table cells");
        Ok(())
    })
}

struct TableHandler;

impl EditorHandler for TableHandler {
    fn id(&self) -> &'static str {
        "table"
    }

    fn delete_fragment(&self, editor: &mut Editor, next: Next<'_>) -> Result<(), EditorError> {
        match selected_cells(editor) {
            Some(cells) => clear_cells(editor, &cells),
            None => next.delete_fragment(editor),
        }
    }

    fn insert_text(&self, editor: &mut Editor, text: &str, next: Next<'_>) -> Result<(), EditorError> {
        if let Some(cells) = selected_cells(editor) {
            clear_cells(editor, &cells)?;
        }
        next.insert_text(editor, text)
    }

    fn key_down(&self, editor: &mut Editor, hotkey: Hotkey) -> Result<bool, EditorError> {
        let Some(entry) = get_table_cell_entry(editor, None) else {
            return Ok(false);
        };
        let forward = hotkey == Hotkey::Tab;
        if let Some(cell) = sibling_cell(editor, &entry, forward) {
            select_cell_start(editor, &cell);
        }
        Ok(true)
    }

    fn delete_backward(
        &self,
        editor: &mut Editor,
        unit: TextUnit,
        next: Next<'_>,
    ) -> Result<(), EditorError> {
        if at_cell_edge(editor, Edge::Start) {
            return Ok(());
        }
        next.delete_backward(editor, unit)
    }

    fn delete_forward(
        &self,
        editor: &mut Editor,
        unit: TextUnit,
        next: Next<'_>,
    ) -> Result<(), EditorError> {
        if at_cell_edge(editor, Edge::End) {
            return Ok(());
        }
        next.delete_forward(editor, unit)
    }
}

/// A collapsed selection sitting on the given edge of its cell. Deleting from
/// there would pull content across cells.
fn at_cell_edge(editor: &Editor, edge: Edge) -> bool {
    let Some(selection) = editor.selection().filter(|s| s.is_collapsed()) else {
        return false;
    };
    let Some(entry) = get_table_cell_entry(editor, None) else {
        return false;
    };
    let cell = Location::Path(entry.cell);
    match edge {
        Edge::Start => query::is_start(editor, &selection.focus, &cell),
        Edge::End => query::is_end(editor, &selection.focus, &cell),
    }
}

/// Rows only hold cells, tables only hold rows, cells hold blocks, and every
/// row is as wide as the widest one.
struct NormalizeTableStructure;

impl NormalizePass for NormalizeTableStructure {
    fn id(&self) -> &'static str {
        "table.normalize_structure"
    }

    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        let targets = element_paths(editor.doc(), |el, _| {
            el.kind == TABLE || el.kind == ROW || CELL_KINDS.contains(&el.kind.as_str())
        });

        let mut repaired = false;
        for at in targets.iter().rev() {
            let Some(kind) = editor.doc().element(at).map(|el| el.kind.clone()) else {
                continue;
            };
            repaired |= match kind.as_str() {
                TABLE => normalize_table(editor, at)?,
                ROW => wrap_children(editor, at, CELL, |node| {
                    node.kind().is_some_and(|k| CELL_KINDS.contains(&k))
                })?,
                _ => normalize_cell(editor, at)?,
            };
        }
        Ok(repaired)
    }
}

/// Wraps each child rejected by `keep` into a new `kind` element.
fn wrap_children(
    editor: &mut Editor,
    at: &[usize],
    kind: &str,
    keep: impl Fn(&Node) -> bool,
) -> Result<bool, EditorError> {
    let stray: Vec<usize> = editor
        .doc()
        .children_at(at)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter(|(_, child)| !keep(child))
        .map(|(ix, _)| ix)
        .collect();
    for ix in stray.iter().rev() {
        let child = path::child(at, *ix);
        insert_node(editor, &child, Node::element(kind, Vec::new()))?;
        if let Some(wrapped) = path::next(&child) {
            move_node(editor, &wrapped, &path::child(&child, 0))?;
        }
    }
    Ok(!stray.is_empty())
}

fn normalize_table(editor: &mut Editor, at: &[usize]) -> Result<bool, EditorError> {
    if child_count(editor, at) == 0 {
        insert_node(editor, &path::child(at, 0), row_node(1))?;
        return Ok(true);
    }
    if wrap_children(editor, at, ROW, |node| node.kind() == Some(ROW))? {
        return Ok(true);
    }

    let widths: Vec<usize> = (0..child_count(editor, at))
        .map(|ix| child_count(editor, &path::child(at, ix)))
        .collect();
    let max_cols = widths.iter().copied().max().unwrap_or_default().max(1);
    let mut repaired = false;
    for (ix, width) in widths.into_iter().enumerate() {
        let row = path::child(at, ix);
        for col in width..max_cols {
            insert_node(editor, &path::child(&row, col), cell_node())?;
            repaired = true;
        }
    }
    if repaired {
        debug!(table = ?at, max_cols, "pad table rows");
    }
    Ok(repaired)
}

/// Cells hold blocks: an empty cell gets a paragraph, and a run of text or
/// inline children is wrapped into one.
fn normalize_cell(editor: &mut Editor, at: &[usize]) -> Result<bool, EditorError> {
    let inline: Vec<bool> = editor
        .doc()
        .children_at(at)
        .unwrap_or_default()
        .iter()
        .map(|child| child.is_text() || editor.is_inline(child))
        .collect();
    if inline.is_empty() {
        insert_node(editor, &path::child(at, 0), Node::paragraph(""))?;
        return Ok(true);
    }
    let Some(start) = inline.iter().position(|is_inline| *is_inline) else {
        return Ok(false);
    };
    let run = inline[start..].iter().take_while(|is_inline| **is_inline).count();

    let wrapper = path::child(at, start);
    insert_node(editor, &wrapper, Node::element(PARAGRAPH, Vec::new()))?;
    for offset in 0..run {
        move_node(editor, &path::child(at, start + 1), &path::child(&wrapper, offset))?;
    }
    debug!(cell = ?at, run, "wrap cell content");
    Ok(true)
}
