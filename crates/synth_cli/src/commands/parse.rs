//! Parse command implementation

use std::io::Write;
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use synth_core::{ParseOptions, Synth};
use synth_plugin::strip_comments as strip_comments_plugin;

use crate::cli::OutputFormat;

pub fn run(
    synth: &Synth,
    file: &Path,
    language: Option<&str>,
    format: OutputFormat,
    index: bool,
    strip_comments: bool,
) -> Result<()> {
    let mut options = ParseOptions::new().with_index(index);
    if strip_comments {
        options = options.with_plugin(strip_comments_plugin());
    }
    let parsed = super::parse_file(synth, file, language, &options)?;
    let tree = parsed.tree();

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Tree => {
            write!(stdout, "{}", tree.dump()).into_diagnostic()?;
        }
        OutputFormat::Json => {
            writeln!(stdout, "{}", tree.to_json_pretty().into_diagnostic()?).into_diagnostic()?;
        }
        OutputFormat::Binary => {
            stdout
                .write_all(&tree.to_binary().into_diagnostic()?)
                .into_diagnostic()?;
        }
    }

    if index && format == OutputFormat::Tree {
        writeln!(stdout).into_diagnostic()?;
        for (kind, count) in parsed.index().type_counts() {
            writeln!(stdout, "{kind}: {count}").into_diagnostic()?;
        }
    }
    Ok(())
}
