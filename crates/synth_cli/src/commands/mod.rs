//! Subcommand implementations

use std::fs;
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use synth_core::{ParseOptions, Parsed, Synth};

pub mod edit;
pub mod parse;
pub mod query;

/// Language for `file`: the explicit one, or the one registered for its
/// extension.
pub fn resolve_language(synth: &Synth, file: &Path, language: Option<&str>) -> Result<String> {
    match language {
        Some(language) => Ok(language.to_string()),
        None => synth.language_for_path(file).into_diagnostic(),
    }
}

/// Reads and parses `file`.
pub fn parse_file(
    synth: &Synth,
    file: &Path,
    language: Option<&str>,
    options: &ParseOptions,
) -> Result<Parsed> {
    match language {
        None => synth.parse_path(file, options).into_diagnostic(),
        Some(language) => {
            let source = fs::read_to_string(file).into_diagnostic()?;
            synth.parse(language, &source, options).into_diagnostic()
        }
    }
}
