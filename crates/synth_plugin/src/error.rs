//! Plugin error types.

use thiserror::Error;

/// Error type returned by plugin transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while running a pipeline.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The synchronous entry point was handed an asynchronous plugin.
    #[error("plugin `{plugin}` is asynchronous; use the async entry point instead")]
    AsyncPluginInSyncPath { plugin: String },

    /// A transform failed. The pipeline stops at the failing plugin.
    #[error("plugin `{plugin}` failed: {source}")]
    Transform {
        plugin: String,
        #[source]
        source: BoxError,
    },
}

impl PluginError {
    /// Creates an async-in-sync-path error.
    pub fn async_plugin_in_sync_path(plugin: impl Into<String>) -> Self {
        Self::AsyncPluginInSyncPath {
            plugin: plugin.into(),
        }
    }

    /// Wraps a transform failure.
    pub fn transform(plugin: impl Into<String>, source: BoxError) -> Self {
        Self::Transform {
            plugin: plugin.into(),
            source,
        }
    }

    /// Returns the name of the plugin involved.
    pub fn plugin(&self) -> &str {
        match self {
            Self::AsyncPluginInSyncPath { plugin } | Self::Transform { plugin, .. } => plugin,
        }
    }
}
