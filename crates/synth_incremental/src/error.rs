//! Orchestrator error types.

use synth_parser::ParseError;
use thiserror::Error;

/// Errors that can occur while driving incremental sessions.
#[derive(Debug, Error)]
pub enum IncrementalError {
    /// The operation needs a tree, but nothing has been parsed yet.
    #[error("Tree structure error: {0}")]
    TreeStructure(String),

    /// No open session has this uri.
    #[error("Session not found: {uri}")]
    SessionNotFound { uri: String },

    /// The language module failed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl IncrementalError {
    /// Creates a tree structure error.
    pub fn tree_structure(message: impl Into<String>) -> Self {
        Self::TreeStructure(message.into())
    }

    /// Creates a session not found error.
    pub fn session_not_found(uri: impl Into<String>) -> Self {
        Self::SessionNotFound { uri: uri.into() }
    }
}
