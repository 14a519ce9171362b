//! # synth_incremental
//!
//! Incremental parse orchestration for the synth AST engine.
//!
//! [`IncrementalParser`] owns one document: its text, token stream and tree.
//! Each [`IncrementalParser::update`] re-lexes only the tokens around the
//! edit, then picks between rebuilding from the incrementally updated stream
//! and a full re-parse (see [`should_use_incremental`]).
//! [`SessionManager`] keeps a bounded set of parsers keyed by uri.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use synth_incremental::{IncrementalConfig, IncrementalParser};
//! use synth_parser::{CssLanguage, apply_edit};
//!
//! let mut parser = IncrementalParser::new(
//!     Arc::new(CssLanguage::new()),
//!     IncrementalConfig::default(),
//!     None,
//! );
//! parser.parse("a{color:red}").unwrap();
//!
//! let (text, edit) = apply_edit("a{color:red}", 8, 11, "blue").unwrap();
//! let updated = parser.update(&text, &edit).unwrap();
//! assert!(updated.stats.token_reuse_rate > 0.0);
//! ```

mod config;
mod error;
mod parser;
mod session;
mod strategy;

pub use config::{EvictionPolicy, IncrementalConfig};
pub use error::IncrementalError;
pub use parser::{IncrementalParser, ParserState, UpdateStats, Updated, detect_affected_nodes};
pub use session::{Session, SessionManager, SessionStats};
pub use strategy::{Strategy, affected_ratio, should_use_incremental};
