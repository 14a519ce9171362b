//! Block-level Markdown language module.
//!
//! Recognizes ATX headings, paragraphs, fenced code, thematic breaks,
//! blockquotes and list items (with task markers). Inline markup is left as
//! plain text; use [`crate::MdastParser`] for a full mdast conversion.

mod lexer;
mod parser;

use std::sync::Arc;

use synth_ast::Tree;
use tracing::debug;

pub use lexer::MarkdownLexer;

use crate::{BuildContext, IncrementalLanguage, Lexer, ParseError, Parser, TokenStream, tokenize_with};
use parser::MarkdownBuilder;

/// Token kinds produced by [`MarkdownLexer`].
pub mod kinds {
    pub use super::lexer::{
        BLANK_LINE, BLOCKQUOTE, CODE_FENCE, HEADING, LIST_ITEM, PARAGRAPH, THEMATIC_BREAK,
    };
}

/// Incremental Markdown parser.
#[derive(Debug, Clone, Default)]
pub struct MarkdownLanguage {
    lexer: Arc<MarkdownLexer>,
}

impl MarkdownLanguage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parser for MarkdownLanguage {
    fn name(&self) -> &str {
        "markdown"
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown", "mdown", "mkdn", "mkd"]
    }

    fn parse(&self, source: &str, cx: &BuildContext) -> Result<Tree, ParseError> {
        let tokens = tokenize_with(self.lexer.as_ref(), Arc::from(source));
        self.build(&tokens, cx)
    }
}

impl IncrementalLanguage for MarkdownLanguage {
    fn lexer(&self) -> Arc<dyn Lexer> {
        self.lexer.clone()
    }

    fn build(&self, tokens: &TokenStream, cx: &BuildContext) -> Result<Tree, ParseError> {
        let tree = cx.create_tree(self.name(), Arc::clone(&tokens.source));
        let tree = MarkdownBuilder::new(tokens.source(), tree).build(&tokens.tokens)?;
        debug!(
            "Built markdown tree: {} nodes from {} tokens",
            tree.node_count(),
            tokens.len()
        );
        Ok(tree)
    }
}
