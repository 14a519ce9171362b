//! # synth_core
//!
//! Engine facade for the synth incremental AST engine.
//!
//! This crate provides:
//! - [`Synth`], which ties the language registry, node pool, plugin pipeline
//!   and session manager together
//! - [`SynthConfig`] loading and validation
//! - [`SynthError`], the aggregate error type
//!
//! ## Example
//!
//! ```rust
//! use synth_core::{ParseOptions, Synth, SynthConfig};
//!
//! let synth = Synth::new(SynthConfig::default()).unwrap();
//! let parsed = synth
//!     .parse("css", "a{color:red}", &ParseOptions::new().with_index(true))
//!     .unwrap();
//! assert_eq!(parsed.index().find_by_type("Declaration").len(), 1);
//! ```

mod config;
mod engine;
mod error;
mod parsed;

pub use config::{PoolConfig, SynthConfig};
pub use engine::{ParseOptions, Synth};
pub use error::SynthError;
pub use parsed::Parsed;

pub use synth_ast::{QueryIndex, Tree};
pub use synth_incremental::{IncrementalConfig, SessionManager, UpdateStats, Updated};
pub use synth_plugin::{Pipeline, Plugin};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
