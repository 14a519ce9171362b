//! Parser trait definitions.

use std::sync::Arc;

use synth_ast::{PoolHandle, Tree};

use crate::{Lexer, ParseError, TokenStream};

/// Shared state handed to a language module while it builds a tree.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pool: Option<PoolHandle>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds trees whose node records come from `pool`.
    pub fn with_pool(pool: PoolHandle) -> Self {
        Self { pool: Some(pool) }
    }

    pub fn pool(&self) -> Option<&PoolHandle> {
        self.pool.as_ref()
    }

    /// Allocates an empty tree holding only its root.
    pub fn create_tree(&self, language: &str, source: Arc<str>) -> Tree {
        match &self.pool {
            Some(pool) => Tree::with_pool(language, source, pool.clone()),
            None => Tree::new(language, source),
        }
    }
}

/// Trait for parsing source text into a [`Tree`].
///
/// Implementations only touch the tree through [`Tree::add_node`] and
/// [`Tree::append_child`], so the engine does not care how the tree was
/// produced.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use synth_ast::{NodeData, NodeSpec, Tree};
/// use synth_parser::{BuildContext, ParseError, Parser};
///
/// struct LineParser;
///
/// impl Parser for LineParser {
///     fn name(&self) -> &str {
///         "lines"
///     }
///
///     fn extensions(&self) -> &[&str] {
///         &["txt"]
///     }
///
///     fn parse(&self, source: &str, cx: &BuildContext) -> Result<Tree, ParseError> {
///         let mut tree = cx.create_tree(self.name(), Arc::from(source));
///         let mut offset = 0;
///         for line in source.split_inclusive('\n') {
///             let end = offset + line.len() as u32;
///             let span = tree.span(offset, end);
///             let id = tree.add_node(NodeSpec::new("line", span).with_data(NodeData::text(line.trim_end())));
///             tree.append_child(tree.root(), id)?;
///             offset = end;
///         }
///         Ok(tree)
///     }
/// }
///
/// let tree = LineParser.parse("a\nb\n", &BuildContext::new()).unwrap();
/// assert_eq!(tree.children(tree.root()).len(), 2);
/// assert!(LineParser.can_parse("TXT"));
/// ```
pub trait Parser: Send + Sync {
    /// Returns the name of this parser, which is also the tree's language.
    fn name(&self) -> &str;

    /// Returns the file extensions this parser handles.
    ///
    /// Extensions should not include the leading dot (e.g., `["css"]`).
    fn extensions(&self) -> &[&str];

    /// Parses the source text into a tree.
    fn parse(&self, source: &str, cx: &BuildContext) -> Result<Tree, ParseError>;

    /// Returns true if this parser can handle the given file extension.
    fn can_parse(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// A language whose trees are built from a token stream, which lets the
/// incremental orchestrator reuse tokens across edits.
///
/// `parse(source)` must equal `build(tokenize(source))`.
pub trait IncrementalLanguage: Parser {
    /// Lexer shared by full and incremental tokenization.
    fn lexer(&self) -> Arc<dyn Lexer>;

    /// Builds a tree from a complete token stream.
    fn build(&self, tokens: &TokenStream, cx: &BuildContext) -> Result<Tree, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tree_uses_pool() {
        let pool = PoolHandle::new();
        let cx = BuildContext::with_pool(pool.clone());
        let tree = cx.create_tree("css", Arc::from("a{}"));
        assert!(tree.pool().is_some_and(|p| p.same_pool(&pool)));
        assert_eq!(tree.language(), "css");

        let plain = BuildContext::new().create_tree("css", Arc::from(""));
        assert!(plain.pool().is_none());
        assert!(plain.children(plain.root()).is_empty());
    }
}
