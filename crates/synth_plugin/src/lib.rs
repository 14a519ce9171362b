//! # synth_plugin
//!
//! Ordered tree-transform pipeline for the synth AST engine.
//!
//! A [`Plugin`] is a named, versioned transform that takes a
//! [`synth_ast::Tree`] and returns a new one. Plugins are either synchronous
//! or asynchronous, decided when the plugin is built. A [`Pipeline`] runs them
//! in order: [`Pipeline::run`] refuses asynchronous plugins up front and
//! [`Pipeline::run_async`] awaits them one after another.
//!
//! ## Example
//!
//! ```rust
//! use synth_ast::Tree;
//! use synth_plugin::{Pipeline, Plugin, node_stats};
//!
//! let mut pipeline = Pipeline::new();
//! pipeline
//!     .use_plugin(node_stats())
//!     .use_plugin(Plugin::sync("mark", "1.0.0", |mut tree| {
//!         tree.set_metadata("marked", true);
//!         Ok(tree)
//!     }));
//!
//! let tree = pipeline.run(Tree::new("css", ""), &[]).unwrap();
//! assert_eq!(tree.meta().metadata["marked"], true);
//! ```

mod builtin;
mod error;
mod pipeline;
mod plugin;

pub use builtin::{NODE_STATS_KEY, node_stats, strip_comments};
pub use error::{BoxError, PluginError};
pub use pipeline::Pipeline;
pub use plugin::{BoxFuture, Plugin, Transform, TransformResult};
