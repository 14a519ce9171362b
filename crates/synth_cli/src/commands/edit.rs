//! Edit command implementation

use std::fs;
use std::io::Write;
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use synth_core::Synth;
use synth_parser::apply_edit;
use tracing::info;

pub fn run(
    mut synth: Synth,
    file: &Path,
    language: Option<&str>,
    (start, end): (u32, u32),
    replacement: &str,
    print_tree: bool,
) -> Result<()> {
    let language = super::resolve_language(&synth, file, language)?;
    let source = fs::read_to_string(file).into_diagnostic()?;
    let uri = file.display().to_string();

    synth
        .open_session(uri.as_str(), &language, &source)
        .into_diagnostic()?;
    let (text, edit) = apply_edit(&source, start, end, replacement).into_diagnostic()?;
    let updated = synth
        .update_session(&uri, &text, &edit)
        .into_diagnostic()?;
    info!(
        "Updated {} with {:?} strategy ({} of {} tokens affected)",
        uri, updated.stats.strategy, updated.stats.affected_tokens, updated.stats.total_tokens
    );

    let mut stdout = std::io::stdout().lock();
    let stats = serde_json::to_string_pretty(&updated.stats).into_diagnostic()?;
    writeln!(stdout, "{stats}").into_diagnostic()?;
    if print_tree {
        write!(stdout, "{}", updated.tree.dump()).into_diagnostic()?;
    }
    Ok(())
}
