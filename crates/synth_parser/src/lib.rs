//! # synth_parser
//!
//! Tokenizer contract and language modules for the synth AST engine.
//!
//! This crate provides:
//! - [`Token`], [`TokenStream`] and [`Edit`], the units of incremental work
//! - The [`Lexer`] trait and the shared [`IncrementalTokenizer`], which
//!   re-lexes only the tokens around an edit
//! - The [`Parser`] and [`IncrementalLanguage`] traits through which language
//!   modules build a [`synth_ast::Tree`]
//! - Built-in CSS and block-level Markdown modules, plus an adapter over
//!   `markdown-rs`
//!
//! ## Example
//!
//! ```rust
//! use synth_parser::{BuildContext, IncrementalLanguage, IncrementalTokenizer, apply_edit};
//! use synth_parser::CssLanguage;
//!
//! let css = CssLanguage::new();
//! let mut tokenizer = IncrementalTokenizer::new(css.lexer());
//! tokenizer.tokenize("a{color:red}");
//!
//! let (text, edit) = apply_edit("a{color:red}", 8, 11, "blue").unwrap();
//! let result = tokenizer.retokenize(&text, &edit);
//! assert!(result.stats.reuse_rate > 0.0);
//!
//! let tree = css.build(&result.stream, &BuildContext::new()).unwrap();
//! assert_eq!(tree.children(tree.root()).len(), 1);
//! ```

pub mod css;
mod edit;
mod error;
mod incremental;
mod lexer;
pub mod markdown;
mod mdast;
mod registry;
mod token;
mod traits;

pub use css::CssLanguage;
pub use edit::{Edit, apply_edit};
pub use error::ParseError;
pub use incremental::{IncrementalTokenizer, RetokenizeStats, Retokenized};
pub use lexer::{Lexer, RawToken, TokenRange, tokenize_with};
pub use markdown::MarkdownLanguage;
pub use mdast::MdastParser;
pub use registry::LanguageRegistry;
pub use token::{Token, TokenFlags, TokenStream};
pub use traits::{BuildContext, IncrementalLanguage, Parser};
