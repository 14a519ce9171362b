//! Ordered plugin execution.

use synth_ast::Tree;
use tracing::{debug, warn};

use crate::{Plugin, PluginError, Transform};

/// Registered plugins, run in registration order.
///
/// Per-call plugins passed to [`Pipeline::run`] or [`Pipeline::run_async`]
/// run after the registered ones and are not kept.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    plugins: Vec<Plugin>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin for every later run.
    pub fn use_plugin(&mut self, plugin: Plugin) -> &mut Self {
        debug!(
            "Registered plugin {}@{} ({})",
            plugin.name(),
            plugin.version(),
            if plugin.is_async() { "async" } else { "sync" }
        );
        self.plugins.push(plugin);
        self
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Returns true if the registered or `extra` plugins include an
    /// asynchronous one.
    pub fn has_async(&self, extra: &[Plugin]) -> bool {
        self.plugins.iter().chain(extra).any(Plugin::is_async)
    }

    /// Runs every plugin synchronously.
    ///
    /// All plugins are checked before the first transform runs. If any is
    /// asynchronous nothing runs and [`PluginError::AsyncPluginInSyncPath`]
    /// names the first offender.
    pub fn run(&self, tree: Tree, extra: &[Plugin]) -> Result<Tree, PluginError> {
        let steps = self
            .plugins
            .iter()
            .chain(extra)
            .map(|plugin| match plugin.transform() {
                Transform::Sync(f) => Ok((plugin.name(), f)),
                Transform::Async(_) => {
                    warn!("Plugin {} is asynchronous, refusing sync run", plugin.name());
                    Err(PluginError::async_plugin_in_sync_path(plugin.name()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tree = tree;
        for (name, f) in steps {
            debug!("Running plugin {}", name);
            tree = f(tree).map_err(|source| PluginError::transform(name, source))?;
        }
        Ok(tree)
    }

    /// Runs every plugin in order, awaiting asynchronous transforms one at a
    /// time. Each plugin receives the previous plugin's output.
    pub async fn run_async(&self, tree: Tree, extra: &[Plugin]) -> Result<Tree, PluginError> {
        let mut tree = tree;
        for plugin in self.plugins.iter().chain(extra) {
            debug!("Running plugin {}", plugin.name());
            let result = match plugin.transform() {
                Transform::Sync(f) => f(tree),
                Transform::Async(f) => f(tree).await,
            };
            tree = result.map_err(|source| PluginError::transform(plugin.name(), source))?;
        }
        Ok(tree)
    }
}
