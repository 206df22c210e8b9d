use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::Editor;
use crate::error::{CommandError, EditorError, QueryError, RegistryError};
use crate::node::Node;
use crate::ops::Op;
use crate::plugins::code_block::CodeBlockPlugin;
use crate::plugins::core::CorePlugin;
use crate::plugins::heading::HeadingPlugin;
use crate::plugins::list::ListPlugin;
use crate::plugins::media::MediaPlugin;
use crate::plugins::table::TablePlugin;
use crate::query::TextUnit;
use crate::transforms;

pub type CommandHandler =
    Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync>;
pub type QueryHandler = Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<Value>,
    pub hidden: bool,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            args_example: None,
            hidden: false,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub role: NodeRole,
    pub is_void: bool,
    pub children: ChildConstraint,
    /// Kind of the element a `BlockOnly` container is filled with when it has
    /// no children. Paragraph when unset.
    #[serde(default)]
    pub default_child: Option<String>,
}

impl NodeSpec {
    /// A block whose children are inline content.
    pub fn text_block(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            role: NodeRole::Block,
            is_void: false,
            children: ChildConstraint::InlineOnly,
            default_child: None,
        }
    }

    pub fn container(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            role: NodeRole::Block,
            is_void: false,
            children: ChildConstraint::BlockOnly,
            default_child: None,
        }
    }

    pub fn default_child(mut self, kind: impl Into<String>) -> Self {
        self.default_child = Some(kind.into());
        self
    }

    pub fn void(kind: impl Into<String>, role: NodeRole) -> Self {
        Self {
            kind: kind.into(),
            role,
            is_void: true,
            children: ChildConstraint::None,
            default_child: None,
        }
    }

    pub fn inline(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            role: NodeRole::Inline,
            is_void: false,
            children: ChildConstraint::InlineOnly,
            default_child: None,
        }
    }
}

/// Repairs one class of structural problem. Returns whether anything changed;
/// the editor keeps re-running passes until none reports a repair.
pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, editor: &mut Editor) -> Result<bool, EditorError>;
}

/// Rewrites an operation right before it is applied.
pub trait OpTransform: Send + Sync {
    fn id(&self) -> &'static str;
    fn transform(&self, editor: &Editor, op: Op) -> Op;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hotkey {
    Tab,
    ShiftTab,
}

/// One stage of the editing pipeline. Each hook receives the rest of the
/// pipeline as `next` and decides whether to call it.
pub trait EditorHandler: Send + Sync {
    fn id(&self) -> &'static str;

    fn delete_backward(
        &self,
        editor: &mut Editor,
        unit: TextUnit,
        next: Next<'_>,
    ) -> Result<(), EditorError> {
        next.delete_backward(editor, unit)
    }

    fn delete_forward(
        &self,
        editor: &mut Editor,
        unit: TextUnit,
        next: Next<'_>,
    ) -> Result<(), EditorError> {
        next.delete_forward(editor, unit)
    }

    fn delete_fragment(&self, editor: &mut Editor, next: Next<'_>) -> Result<(), EditorError> {
        next.delete_fragment(editor)
    }

    fn insert_break(&self, editor: &mut Editor, next: Next<'_>) -> Result<(), EditorError> {
        next.insert_break(editor)
    }

    fn insert_text(
        &self,
        editor: &mut Editor,
        text: &str,
        next: Next<'_>,
    ) -> Result<(), EditorError> {
        next.insert_text(editor, text)
    }

    /// `Ok(true)` when the key was handled and later handlers must not see it.
    fn key_down(&self, _editor: &mut Editor, _hotkey: Hotkey) -> Result<bool, EditorError> {
        Ok(false)
    }
}

/// The remainder of a handler pipeline; its tail is the core behavior.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    handlers: &'a [Arc<dyn EditorHandler>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(handlers: &'a [Arc<dyn EditorHandler>]) -> Self {
        Self { handlers }
    }

    fn split(self) -> Option<(&'a Arc<dyn EditorHandler>, Next<'a>)> {
        self.handlers
            .split_first()
            .map(|(first, rest)| (first, Next { handlers: rest }))
    }

    pub fn delete_backward(self, editor: &mut Editor, unit: TextUnit) -> Result<(), EditorError> {
        match self.split() {
            Some((handler, next)) => handler.delete_backward(editor, unit, next),
            None => transforms::text::delete_backward_default(editor, unit),
        }
    }

    pub fn delete_forward(self, editor: &mut Editor, unit: TextUnit) -> Result<(), EditorError> {
        match self.split() {
            Some((handler, next)) => handler.delete_forward(editor, unit, next),
            None => transforms::text::delete_forward_default(editor, unit),
        }
    }

    pub fn delete_fragment(self, editor: &mut Editor) -> Result<(), EditorError> {
        match self.split() {
            Some((handler, next)) => handler.delete_fragment(editor, next),
            None => transforms::text::delete_fragment_default(editor),
        }
    }

    pub fn insert_break(self, editor: &mut Editor) -> Result<(), EditorError> {
        match self.split() {
            Some((handler, next)) => handler.insert_break(editor, next),
            None => transforms::text::insert_break_default(editor),
        }
    }

    pub fn insert_text(self, editor: &mut Editor, text: &str) -> Result<(), EditorError> {
        match self.split() {
            Some((handler, next)) => handler.insert_text(editor, text, next),
            None => transforms::text::insert_text_default(editor, text),
        }
    }
}

pub trait PlatePlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn op_transforms(&self) -> Vec<Box<dyn OpTransform>> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn handler(&self) -> Option<Arc<dyn EditorHandler>> {
        None
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

/// Composed plugin set. A plugin registered later sees hooks and normalizes
/// before the ones registered earlier, so the core plugin always runs last.
#[derive(Default)]
pub struct PluginRegistry {
    node_specs: HashMap<String, NodeSpec>,
    op_transforms: Vec<Box<dyn OpTransform>>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    handlers: Vec<Arc<dyn EditorHandler>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    pub fn new(
        plugins: impl IntoIterator<Item = Box<dyn PlatePlugin>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    pub fn core() -> Self {
        let plugins: Vec<Box<dyn PlatePlugin>> = vec![Box::new(CorePlugin)];
        Self::new(plugins).expect("core registry must be valid")
    }

    pub fn richtext() -> Self {
        Self::new(Self::richtext_plugins()).expect("richtext registry must be valid")
    }

    pub fn richtext_plugins() -> Vec<Box<dyn PlatePlugin>> {
        vec![
            Box::new(CorePlugin),
            Box::new(HeadingPlugin),
            Box::new(MediaPlugin),
            Box::new(CodeBlockPlugin),
            Box::new(TablePlugin),
            Box::new(ListPlugin),
        ]
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn PlatePlugin>) -> Result<(), RegistryError> {
        for spec in plugin.node_specs() {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(RegistryError::DuplicateNodeKind(spec.kind));
            }
            self.node_specs.insert(spec.kind.clone(), spec);
        }

        self.op_transforms.extend(plugin.op_transforms());

        self.normalize_passes.splice(0..0, plugin.normalize_passes());

        if let Some(handler) = plugin.handler() {
            self.handlers.insert(0, handler);
        }

        for cmd in plugin.commands() {
            if self.commands.contains_key(&cmd.id) {
                return Err(RegistryError::DuplicateCommand(cmd.id));
            }
            self.commands.insert(cmd.id.clone(), cmd);
        }

        for query in plugin.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(RegistryError::DuplicateQuery(query.id));
            }
            self.queries.insert(query.id.clone(), query);
        }

        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.node_specs
    }

    pub fn node_spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.node_specs.get(kind)
    }

    pub fn op_transforms(&self) -> &[Box<dyn OpTransform>] {
        &self.op_transforms
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    pub fn handlers(&self) -> &[Arc<dyn EditorHandler>] {
        &self.handlers
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn queries(&self) -> &HashMap<String, QuerySpec> {
        &self.queries
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    pub fn is_known_kind(&self, kind: &str) -> bool {
        self.node_specs.contains_key(kind)
    }

    pub fn is_void(&self, node: &Node) -> bool {
        node.kind()
            .and_then(|kind| self.node_specs.get(kind))
            .is_some_and(|spec| spec.is_void)
    }

    pub fn is_inline(&self, node: &Node) -> bool {
        node.kind()
            .and_then(|kind| self.node_specs.get(kind))
            .is_some_and(|spec| spec.role == NodeRole::Inline)
    }

    pub fn is_block(&self, node: &Node) -> bool {
        node.is_element() && !self.is_inline(node)
    }

    /// A non-void block holding inline content. Unknown kinds qualify when all
    /// their children are texts or inlines.
    pub fn is_text_block(&self, node: &Node) -> bool {
        let Node::Element(el) = node else {
            return false;
        };
        if !self.is_block(node) || self.is_void(node) {
            return false;
        }
        match self.node_specs.get(&el.kind) {
            Some(spec) => spec.children == ChildConstraint::InlineOnly,
            None => {
                !el.children.is_empty()
                    && el
                        .children
                        .iter()
                        .all(|child| child.is_text() || self.is_inline(child))
            }
        }
    }
}
