//! # synth_ast
//!
//! Arena tree store for the synth AST engine.
//!
//! This crate provides:
//! - [`Tree`]: flat node arena addressed by [`NodeId`], with interned type
//!   names and document metadata
//! - [`PoolHandle`]: injected free list for recycling node records
//! - [`QueryIndex`]: snapshot index for type and offset lookups
//! - [`Zipper`]: persistent path-copying cursor for local edits
//! - JSON and versioned binary serialization
//! - [`BatchProcessor`] and [`visit`] helpers
//!
//! ## Example
//!
//! ```rust
//! use synth_ast::{NodeData, NodeSpec, QueryIndex, Tree};
//!
//! let mut tree = Tree::new("css", "a{color:red}");
//! let span = tree.span(0, 12);
//! let rule = tree.add_node(
//!     NodeSpec::new("StyleRule", span).with_data(NodeData::StyleRule { selector: "a".into() }),
//! );
//! tree.append_child(tree.root(), rule).unwrap();
//!
//! let index = QueryIndex::build(&tree);
//! assert_eq!(index.find_by_type("StyleRule"), &[rule]);
//! assert_eq!(index.find_containing(4), Some(rule));
//! ```

mod batch;
pub mod binary;
mod error;
mod interner;
mod json;
mod node;
mod pool;
mod query;
mod span;
mod tree;
pub mod visit;
mod zipper;

pub use batch::{BatchProcessor, DEFAULT_CHUNK_SIZE};
pub use binary::{BinaryNode, BinaryTree};
pub use error::TreeError;
pub use interner::{StringInterner, Symbol};
pub use node::{Attrs, Node, NodeData, NodeId, NodeSpec};
pub use pool::{DEFAULT_MAX_RETAINED, NodePool, PoolHandle, PoolStats};
pub use query::QueryIndex;
pub use span::{Position, SourceMap, Span};
pub use tree::{ROOT_KIND, Tree, TreeMeta};
pub use zipper::{ZNode, Zipper};
