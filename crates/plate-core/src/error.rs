use thiserror::Error;

use crate::node::Node;
use crate::path::Path;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: Path, reason: String },

    #[error(
        "Cannot merge the node at path {path:?} with the previous node because it is not the same kind: {node} {prev}"
    )]
    MergeMismatch {
        path: Path,
        node: String,
        prev: String,
    },

    #[error("Cannot move a node into itself: {path:?} -> {new_path:?}")]
    MoveIntoItself { path: Path, new_path: Path },

    #[error("Normalization did not converge after {0} iterations")]
    NormalizeDidNotConverge(usize),

    #[error("No selection")]
    NoSelection,
}

impl EditorError {
    pub fn invalid_path(path: &[usize], reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }

    pub(crate) fn merge_mismatch(path: &[usize], node: &Node, prev: &Node) -> Self {
        Self::MergeMismatch {
            path: path.to_vec(),
            node: serde_json::to_string(node).unwrap_or_default(),
            prev: serde_json::to_string(prev).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<EditorError> for CommandError {
    fn from(value: EditorError) -> Self {
        CommandError::new(value.to_string())
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Duplicate node spec kind: {0}")]
    DuplicateNodeKind(String),
    #[error("Duplicate command id: {0}")]
    DuplicateCommand(String),
    #[error("Duplicate query id: {0}")]
    DuplicateQuery(String),
}
