//! Document-tree query and transform engine for a Slate-style rich-text
//! model, with list, table and code-block plugins composed onto one editor.

mod error;
mod location;
mod node;
mod ops;
mod refs;
mod value;

pub mod editor;
pub mod matcher;
pub mod path;
pub mod plugin;
pub mod plugins;
pub mod query;
pub mod transforms;

pub use crate::editor::{CodeBlockConfig, Editor, EditorConfig, ListConfig, NodeIdConfig};
pub use crate::error::{CommandError, EditorError, QueryError, RegistryError};
pub use crate::location::{Affinity, Edge, Location, Point, Range};
pub use crate::matcher::{Match, matches};
pub use crate::node::{Attrs, Document, ElementKind, ElementNode, Node, PARAGRAPH, TextNode};
pub use crate::ops::{AttrPatch, Op, Transaction, TransactionMeta, transform_path, transform_point};
pub use crate::path::Path;
pub use crate::plugin::{
    ChildConstraint, CommandSpec, EditorHandler, Hotkey, Next, NodeRole, NodeSpec, NormalizePass,
    OpTransform, PlatePlugin, PluginRegistry, QuerySpec,
};
pub use crate::query::{Mode, NodeEntry, QueryOptions, TextUnit};
pub use crate::refs::{PathRef, PointRef};
pub use crate::value::PlateValue;
