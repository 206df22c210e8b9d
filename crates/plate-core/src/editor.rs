use std::cmp::Ordering;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{CommandError, EditorError, QueryError};
use crate::location::{Affinity, Point, Range};
use crate::node::{Document, Node};
use crate::ops::{Op, Transaction, apply_op_to, transform_point};
use crate::path::{self, Path};
use crate::plugin::{Hotkey, Next, PluginRegistry};
use crate::query::{Descendants, TextUnit};
use crate::refs::{PathRef, PointRef, RefRegistry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Shift+Tab on a top-level item turns it back into a plain block.
    pub reset_on_shift_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeBlockConfig {
    pub indent_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeIdConfig {
    pub key: String,
    /// Element kinds that receive ids; empty means all.
    pub allow: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_normalize_iterations: usize,
    pub list: ListConfig,
    pub code_block: CodeBlockConfig,
    pub node_id: NodeIdConfig,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 1000;
        }
        if self.code_block.indent_depth == 0 {
            self.code_block.indent_depth = 2;
        }
        if self.node_id.key.is_empty() {
            self.node_id.key = "id".to_string();
        }
        self
    }
}

/// Owns the document and is the only place operations are applied. The
/// selection and every live ref are carried through each operation.
pub struct Editor {
    doc: Document,
    selection: Option<Range>,
    registry: Arc<PluginRegistry>,
    config: EditorConfig,
    operations: Vec<Op>,
    refs: RefRegistry,
    suspended: usize,
    normalizing: bool,
}

impl Editor {
    pub fn new(doc: Document, selection: Option<Range>, registry: PluginRegistry) -> Self {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Option<Range>,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry: Arc::new(registry),
            config: config.with_defaults(),
            operations: Vec::new(),
            refs: RefRegistry::default(),
            suspended: 0,
            normalizing: false,
        };
        if let Err(err) = editor.normalize() {
            warn!(%err, "initial normalization failed");
        }
        editor.operations.clear();
        editor
    }

    pub fn with_core_plugins() -> Self {
        Self::new(
            Document::new(vec![Node::paragraph("")]),
            Some(Range::collapsed(Point::new(vec![0, 0], 0))),
            PluginRegistry::core(),
        )
    }

    pub fn with_richtext_plugins() -> Self {
        Self::new(
            Document::new(vec![Node::paragraph("")]),
            Some(Range::collapsed(Point::new(vec![0, 0], 0))),
            PluginRegistry::richtext(),
        )
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Range>) {
        self.selection = selection;
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub(crate) fn registry_handle(&self) -> Arc<PluginRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Every operation applied since construction, normalization included.
    pub fn operations(&self) -> &[Op] {
        &self.operations
    }

    pub fn take_operations(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.operations)
    }

    pub fn is_void(&self, node: &Node) -> bool {
        self.registry.is_void(node)
    }

    pub fn is_inline(&self, node: &Node) -> bool {
        self.registry.is_inline(node)
    }

    pub fn is_block(&self, node: &Node) -> bool {
        self.registry.is_block(node)
    }

    pub fn is_text_block(&self, node: &Node) -> bool {
        self.registry.is_text_block(node)
    }

    /// True while inside `without_normalizing` or a normalization run.
    pub fn normalization_suspended(&self) -> bool {
        self.normalizing || self.suspended > 0
    }

    pub fn apply_op(&mut self, op: Op) -> Result<(), EditorError> {
        let registry = self.registry.clone();
        let mut op = op;
        for transform in registry.op_transforms() {
            op = transform.transform(self, op);
        }

        trace!(?op, "apply op");
        apply_op_to(&mut self.doc, &op)?;
        self.transform_selection(&op);
        self.refs.transform(&op);
        self.operations.push(op);

        if self.suspended == 0 && !self.normalizing {
            self.normalize()?;
        }
        Ok(())
    }

    /// Applies a batch of operations as one unit, normalizing once at the end.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), EditorError> {
        if let Some(source) = &tx.meta.source {
            debug!(source, ops = tx.ops.len(), "apply transaction");
        }
        self.without_normalizing(|editor| {
            for op in tx.ops {
                editor.apply_op(op)?;
            }
            if let Some(selection) = tx.selection_after {
                editor.selection = Some(selection);
            }
            Ok(())
        })
    }

    /// Runs `f` with normalization suspended. Nested scopes only normalize
    /// when the outermost one exits.
    pub fn without_normalizing<T>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        self.suspended += 1;
        let result = f(self);
        self.suspended -= 1;
        if self.suspended == 0 && !self.normalizing {
            let normalized = self.normalize();
            let value = result?;
            normalized?;
            return Ok(value);
        }
        result
    }

    pub fn normalize(&mut self) -> Result<(), EditorError> {
        if self.normalizing {
            return Ok(());
        }
        self.normalizing = true;
        let result = self.run_normalize_passes();
        self.normalizing = false;
        result
    }

    fn run_normalize_passes(&mut self) -> Result<(), EditorError> {
        let registry = self.registry.clone();
        let max = self.config.max_normalize_iterations;
        for _ in 0..max {
            let mut repaired = false;
            for pass in registry.normalize_passes() {
                if pass.run(self)? {
                    debug!(pass = pass.id(), "normalize repair");
                    repaired = true;
                    break;
                }
            }
            if !repaired {
                return Ok(());
            }
        }
        warn!(max, "normalization did not converge");
        Err(EditorError::NormalizeDidNotConverge(max))
    }

    pub fn path_ref(&mut self, path: Path) -> PathRef {
        self.refs.path_ref(path, Affinity::Forward)
    }

    pub fn path_ref_with(&mut self, path: Path, affinity: Affinity) -> PathRef {
        self.refs.path_ref(path, affinity)
    }

    pub fn point_ref(&mut self, point: Point) -> PointRef {
        self.refs.point_ref(point, Affinity::Forward)
    }

    pub fn point_ref_with(&mut self, point: Point, affinity: Affinity) -> PointRef {
        self.refs.point_ref(point, affinity)
    }

    /// Number of refs still being tracked.
    pub fn live_refs(&self) -> usize {
        self.refs.live()
    }

    pub fn delete_backward(&mut self, unit: TextUnit) -> Result<(), EditorError> {
        let registry = self.registry.clone();
        self.without_normalizing(|editor| Next::new(registry.handlers()).delete_backward(editor, unit))
    }

    pub fn delete_forward(&mut self, unit: TextUnit) -> Result<(), EditorError> {
        let registry = self.registry.clone();
        self.without_normalizing(|editor| Next::new(registry.handlers()).delete_forward(editor, unit))
    }

    pub fn delete_fragment(&mut self) -> Result<(), EditorError> {
        let registry = self.registry.clone();
        self.without_normalizing(|editor| Next::new(registry.handlers()).delete_fragment(editor))
    }

    pub fn insert_break(&mut self) -> Result<(), EditorError> {
        let registry = self.registry.clone();
        self.without_normalizing(|editor| Next::new(registry.handlers()).insert_break(editor))
    }

    pub fn insert_text(&mut self, text: &str) -> Result<(), EditorError> {
        let registry = self.registry.clone();
        self.without_normalizing(|editor| Next::new(registry.handlers()).insert_text(editor, text))
    }

    /// Offers the key to each handler in order; `true` when one handled it.
    pub fn key_down(&mut self, hotkey: Hotkey) -> Result<bool, EditorError> {
        let registry = self.registry.clone();
        self.without_normalizing(|editor| {
            for handler in registry.handlers() {
                if handler.key_down(editor, hotkey)? {
                    debug!(handler = handler.id(), ?hotkey, "key handled");
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        let Some(command) = self.registry.command(id) else {
            return Err(CommandError::new(format!("Unknown command: {id}")));
        };
        debug!(command = id, "run command");
        let mut outcome = Ok(());
        self.without_normalizing(|editor| {
            outcome = (command.handler)(editor, args);
            Ok(())
        })?;
        outcome
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let Some(query) = self.registry.query(id) else {
            return Err(QueryError::new(format!("Unknown query: {id}")));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Failed to decode query result: {err}")))
    }

    fn transform_selection(&mut self, op: &Op) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        let anchor = transform_point(&selection.anchor, op, Affinity::Forward)
            .or_else(|| self.removal_fallback(op));
        let focus = transform_point(&selection.focus, op, Affinity::Forward)
            .or_else(|| self.removal_fallback(op));
        self.selection = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Some(Range::new(anchor, focus)),
            (Some(point), None) | (None, Some(point)) => Some(Range::collapsed(point)),
            (None, None) => None,
        };
    }

    /// Where a point inside a removed node goes: the end of the previous text
    /// unless the next text is a closer relative.
    fn removal_fallback(&self, op: &Op) -> Option<Point> {
        let Op::RemoveNode { path: removed } = op else {
            return None;
        };
        let mut prev: Option<(Path, usize)> = None;
        let mut next: Option<Path> = None;
        for (node, p) in Descendants::new(&self.doc, Vec::new(), None, false) {
            let Node::Text(t) = node else {
                continue;
            };
            if path::compare(&p, removed) == Ordering::Less {
                prev = Some((p, t.text.len()));
            } else {
                next = Some(p);
                break;
            }
        }

        let prefer_next = match (&prev, &next) {
            (Some((prev_path, _)), Some(next_path)) => {
                if next_path == removed {
                    !path::has_previous(next_path)
                } else {
                    path::common(prev_path, removed).len() < path::common(next_path, removed).len()
                }
            }
            _ => false,
        };
        if let Some((p, len)) = prev
            && !prefer_next
        {
            return Some(Point::new(p, len));
        }
        next.map(|p| Point::new(p, 0))
    }
}
