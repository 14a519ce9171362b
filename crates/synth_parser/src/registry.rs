//! Language registry.

use std::sync::Arc;

use crate::{CssLanguage, IncrementalLanguage, MarkdownLanguage, MdastParser, ParseError, Parser};

enum Entry {
    Plain(Arc<dyn Parser>),
    Incremental(Arc<dyn IncrementalLanguage>),
}

impl Entry {
    fn parser(&self) -> &dyn Parser {
        match self {
            Entry::Plain(parser) => parser.as_ref(),
            Entry::Incremental(language) => language.as_ref(),
        }
    }
}

/// Language modules looked up by name or file extension.
///
/// Later registrations shadow earlier ones with the same name.
#[derive(Default)]
pub struct LanguageRegistry {
    entries: Vec<Entry>,
}

impl LanguageRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `css`, `markdown` and `mdast`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_incremental(Arc::new(CssLanguage::new()));
        registry.register_incremental(Arc::new(MarkdownLanguage::new()));
        registry.register(Arc::new(MdastParser::new()));
        registry
    }

    pub fn register(&mut self, parser: Arc<dyn Parser>) -> &mut Self {
        self.entries.push(Entry::Plain(parser));
        self
    }

    pub fn register_incremental(&mut self, language: Arc<dyn IncrementalLanguage>) -> &mut Self {
        self.entries.push(Entry::Incremental(language));
        self
    }

    fn find(&self, pred: impl Fn(&dyn Parser) -> bool) -> Option<&Entry> {
        self.entries.iter().rev().find(|e| pred(e.parser()))
    }

    /// Looks up a parser by language name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Parser>, ParseError> {
        match self.find(|p| p.name() == name) {
            Some(Entry::Plain(parser)) => Ok(Arc::clone(parser)),
            Some(Entry::Incremental(language)) => Ok(Arc::clone(language) as Arc<dyn Parser>),
            None => Err(ParseError::unknown_language(name)),
        }
    }

    /// Looks up a parser by file extension (without the dot).
    pub fn for_extension(&self, extension: &str) -> Result<Arc<dyn Parser>, ParseError> {
        let entry = self
            .find(|p| p.can_parse(extension))
            .ok_or_else(|| ParseError::unknown_language(format!(".{extension}")))?;
        self.get(entry.parser().name())
    }

    /// Looks up a language that supports incremental updates.
    pub fn incremental(&self, name: &str) -> Result<Arc<dyn IncrementalLanguage>, ParseError> {
        match self.find(|p| p.name() == name) {
            Some(Entry::Incremental(language)) => Ok(Arc::clone(language)),
            Some(Entry::Plain(_)) => Err(ParseError::unsupported(format!(
                "incremental parsing for `{name}`"
            ))),
            None => Err(ParseError::unknown_language(name)),
        }
    }

    /// Registered language names, most recent last.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.parser().name()).collect()
    }
}
