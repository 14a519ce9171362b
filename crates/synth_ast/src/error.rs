//! Tree store error types.

use thiserror::Error;

use crate::NodeId;

/// Errors raised by the tree store and its serializers.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A node id does not exist in the tree.
    #[error("Invalid node id: {0}")]
    InvalidNodeId(NodeId),

    /// A tree invariant is violated.
    #[error("Tree structure error: {0}")]
    Structure(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A binary buffer is malformed or uses an unsupported layout.
    #[error("Invalid binary format: {0}")]
    BinaryFormat(String),
}

impl TreeError {
    /// Creates a new structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    /// Creates a new binary format error.
    pub fn binary_format(message: impl Into<String>) -> Self {
        Self::BinaryFormat(message.into())
    }
}
