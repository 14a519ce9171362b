//! Engine error types.

use synth_ast::TreeError;
use synth_incremental::IncrementalError;
use synth_parser::ParseError;
use synth_plugin::PluginError;
use thiserror::Error;

/// Errors that can occur in the engine.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Incremental(#[from] IncrementalError),
}

impl SynthError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// A synchronous entry point was given an asynchronous plugin.
    pub fn is_async_plugin_in_sync_path(&self) -> bool {
        matches!(self, Self::Plugin(PluginError::AsyncPluginInSyncPath { .. }))
    }

    /// An operation referenced a session that is not open.
    pub fn is_session_not_found(&self) -> bool {
        matches!(
            self,
            Self::Incremental(IncrementalError::SessionNotFound { .. })
        )
    }

    /// An operation needed a tree that does not exist or is malformed.
    pub fn is_tree_structure(&self) -> bool {
        matches!(
            self,
            Self::Incremental(IncrementalError::TreeStructure(_))
                | Self::Tree(TreeError::Structure(_))
        )
    }

    /// The input could not be parsed.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::Incremental(IncrementalError::Parse(_))
        )
    }
}
