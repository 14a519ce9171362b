//! The engine facade.

use std::fs;
use std::path::Path;

use synth_ast::{PoolHandle, Tree};
use synth_incremental::{SessionManager, Updated};
use synth_parser::{BuildContext, Edit, LanguageRegistry, Parser};
use synth_plugin::{Pipeline, Plugin, PluginError};
use tracing::{debug, info};

use crate::{Parsed, SynthConfig, SynthError};

/// Per-call parse options.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Overrides [`SynthConfig::build_index`].
    pub build_index: Option<bool>,
    /// Run after the engine's registered plugins.
    pub plugins: Vec<Plugin>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, build_index: bool) -> Self {
        self.build_index = Some(build_index);
        self
    }

    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }
}

/// Parses documents through registered language modules and plugins.
///
/// Each engine owns its node pool, plugin pipeline and session manager;
/// nothing is shared between engines.
pub struct Synth {
    config: SynthConfig,
    registry: LanguageRegistry,
    pool: PoolHandle,
    pipeline: Pipeline,
    sessions: SessionManager,
}

impl Synth {
    /// Creates an engine with the built-in languages.
    pub fn new(config: SynthConfig) -> Result<Self, SynthError> {
        config.validate()?;
        let pool = PoolHandle::with_max_retained(config.pool.max_retained);
        let sessions = SessionManager::new(config.incremental.clone(), Some(pool.clone()));
        let registry = LanguageRegistry::with_builtins();
        info!("Synth engine ready with languages {:?}", registry.names());
        Ok(Self {
            config,
            registry,
            pool,
            pipeline: Pipeline::new(),
            sessions,
        })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Registry for adding language modules.
    pub fn registry_mut(&mut self) -> &mut LanguageRegistry {
        &mut self.registry
    }

    pub fn pool(&self) -> &PoolHandle {
        &self.pool
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Registers a plugin for every later parse.
    pub fn use_plugin(&mut self, plugin: Plugin) -> &mut Self {
        self.pipeline.use_plugin(plugin);
        self
    }

    /// Parses `source` as `language` and runs all plugins synchronously.
    ///
    /// Fails with [`PluginError::AsyncPluginInSyncPath`] before parsing if any
    /// registered or per-call plugin is asynchronous.
    pub fn parse(&self, language: &str, source: &str, options: &ParseOptions) -> Result<Parsed, SynthError> {
        self.ensure_sync(options)?;
        let tree = self.build(language, source)?;
        let tree = self.pipeline.run(tree, &options.plugins)?;
        Ok(self.finish(tree, options))
    }

    /// Parses `source` as `language` and awaits every plugin in order.
    pub async fn parse_async(
        &self,
        language: &str,
        source: &str,
        options: &ParseOptions,
    ) -> Result<Parsed, SynthError> {
        let tree = self.build(language, source)?;
        let tree = self.pipeline.run_async(tree, &options.plugins).await?;
        Ok(self.finish(tree, options))
    }

    /// Reads and parses a file, picking the language from its extension.
    pub fn parse_path(&self, path: impl AsRef<Path>, options: &ParseOptions) -> Result<Parsed, SynthError> {
        let path = path.as_ref();
        self.ensure_sync(options)?;
        let language = self.language_for_path(path)?;
        let source = fs::read_to_string(path)?;
        let mut tree = self.build(&language, &source)?;
        tree.set_metadata("path", path.display().to_string());
        let tree = self.pipeline.run(tree, &options.plugins)?;
        Ok(self.finish(tree, options))
    }

    /// Name of the language registered for `path`'s extension.
    pub fn language_for_path(&self, path: &Path) -> Result<String, SynthError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| SynthError::config(format!("{} has no file extension", path.display())))?;
        Ok(self.registry.for_extension(extension)?.name().to_string())
    }

    /// Returns a tree's node records to the engine's pool.
    pub fn recycle(&self, parsed: Parsed) -> usize {
        self.pool.release_tree(parsed.into_tree())
    }

    /// Opens an incremental session for `uri` and runs the registered
    /// plugins over its first tree.
    ///
    /// Sessions only run synchronously, so an asynchronous registered plugin
    /// fails the call before anything is parsed.
    pub fn open_session(
        &mut self,
        uri: impl Into<String>,
        language: &str,
        text: &str,
    ) -> Result<&Tree, SynthError> {
        self.ensure_sync(&ParseOptions::default())?;
        let language = self.registry.incremental(language)?;
        let uri = uri.into();
        self.sessions.open(uri.as_str(), language, text)?;
        self.transform_session(&uri)
    }

    /// Applies an edit to an open session and runs the registered plugins
    /// over the rebuilt tree.
    pub fn update_session(
        &mut self,
        uri: &str,
        new_text: &str,
        edit: &Edit,
    ) -> Result<Updated<'_>, SynthError> {
        self.ensure_sync(&ParseOptions::default())?;
        let stats = self.sessions.update(uri, new_text, edit)?.stats;
        let tree = self.transform_session(uri)?;
        Ok(Updated { tree, stats })
    }

    /// Like [`Synth::update_session`], detecting the edit from the texts.
    pub fn update_session_text(&mut self, uri: &str, new_text: &str) -> Result<Updated<'_>, SynthError> {
        self.ensure_sync(&ParseOptions::default())?;
        let stats = self.sessions.update_text(uri, new_text)?.stats;
        let tree = self.transform_session(uri)?;
        Ok(Updated { tree, stats })
    }

    /// Sessions without engine plugins. Updates made through this manager
    /// hand back the tree exactly as the language module built it.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    fn transform_session(&mut self, uri: &str) -> Result<&Tree, SynthError> {
        if self.pipeline.is_empty() {
            return Ok(self.sessions.tree(uri)?);
        }
        let tree = self.sessions.tree(uri)?.clone();
        let tree = self.pipeline.run(tree, &[])?;
        debug!("Ran {} plugins over session {}", self.pipeline.plugins().len(), uri);
        Ok(self.sessions.set_tree(uri, tree)?)
    }

    fn ensure_sync(&self, options: &ParseOptions) -> Result<(), PluginError> {
        match self
            .pipeline
            .plugins()
            .iter()
            .chain(&options.plugins)
            .find(|p| p.is_async())
        {
            Some(plugin) => Err(PluginError::async_plugin_in_sync_path(plugin.name())),
            None => Ok(()),
        }
    }

    fn build(&self, language: &str, source: &str) -> Result<Tree, SynthError> {
        let parser = self.registry.get(language)?;
        let tree = parser.parse(source, &BuildContext::with_pool(self.pool.clone()))?;
        debug!(
            "Parsed {} bytes as {} into {} nodes",
            source.len(),
            parser.name(),
            tree.node_count()
        );
        Ok(tree)
    }

    fn finish(&self, tree: Tree, options: &ParseOptions) -> Parsed {
        Parsed::new(tree, options.build_index.unwrap_or(self.config.build_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use synth_ast::NodeData;

    fn engine() -> Synth {
        Synth::new(SynthConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_css_example() {
        let parsed = engine()
            .parse("css", "a{color:red}", &ParseOptions::new())
            .unwrap();
        let tree = parsed.tree();
        let rules = tree.children(tree.root());
        assert_eq!(rules.len(), 1);
        let decl = tree.children(rules[0])[0];
        assert_eq!(
            tree.node(decl).unwrap().data,
            NodeData::declaration("color", "red", false)
        );
        assert!(!parsed.has_index());
    }

    #[test]
    fn test_parse_empty_in_every_language() {
        let synth = engine();
        for language in ["css", "markdown", "mdast"] {
            let parsed = synth.parse(language, "", &ParseOptions::new()).unwrap();
            assert!(parsed.tree().children(parsed.tree().root()).is_empty(), "{language}");
        }
    }

    #[test]
    fn test_build_index_option_overrides_config() {
        let config = SynthConfig {
            build_index: true,
            ..Default::default()
        };
        let synth = Synth::new(config).unwrap();
        assert!(synth.parse("css", "a{}", &ParseOptions::new()).unwrap().has_index());
        assert!(
            !synth
                .parse("css", "a{}", &ParseOptions::new().with_index(false))
                .unwrap()
                .has_index()
        );
    }

    #[test]
    fn test_unknown_language() {
        let err = engine()
            .parse("cobol", "", &ParseOptions::new())
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_recycle_fills_pool() {
        let synth = engine();
        let parsed = synth.parse("css", "a{b:c}", &ParseOptions::new()).unwrap();
        assert_eq!(synth.recycle(parsed), 3);
        assert_eq!(synth.pool().available(), 3);

        synth.parse("css", "x{}", &ParseOptions::new()).unwrap();
        assert_eq!(synth.pool().available(), 1);
        assert_eq!(synth.pool().stats().reused, 2);
    }

    #[test]
    fn test_open_session_requires_incremental_language() {
        let mut synth = engine();
        assert!(synth.open_session("a.md", "markdown", "# a").is_ok());
        assert!(synth.open_session("b.md", "mdast", "# b").unwrap_err().is_parse());
        assert_eq!(synth.sessions().len(), 1);
    }
}
