//! Query command implementation

use std::io::Write;
use std::path::Path;

use miette::{IntoDiagnostic, Result, miette};
use synth_ast::{NodeId, Tree};
use synth_core::{ParseOptions, Synth};

pub fn run(
    synth: &Synth,
    file: &Path,
    language: Option<&str>,
    kind: Option<&str>,
    offset: Option<u32>,
) -> Result<()> {
    if kind.is_none() && offset.is_none() {
        return Err(miette!("query needs --type or --offset"));
    }

    let options = ParseOptions::new().with_index(true);
    let parsed = super::parse_file(synth, file, language, &options)?;
    let tree = parsed.tree();
    let index = parsed.index();

    let mut stdout = std::io::stdout().lock();
    if let Some(kind) = kind {
        for &id in index.find_by_type(kind) {
            writeln!(stdout, "{}", describe(tree, id)).into_diagnostic()?;
        }
    }
    if let Some(offset) = offset {
        match index.find_containing(offset) {
            Some(id) => writeln!(stdout, "{}", describe(tree, id)).into_diagnostic()?,
            None => return Err(miette!("no node contains offset {offset}")),
        }
    }
    Ok(())
}

/// One line per node: id, type, location and a short text preview.
fn describe(tree: &Tree, id: NodeId) -> String {
    let Some(node) = tree.get(id) else {
        return format!("#{id} <detached>");
    };
    let span = node.span;
    let text = tree.text(id);
    let preview: String = text.chars().take(40).collect();
    let ellipsis = if preview.len() < text.len() { "..." } else { "" };
    format!(
        "#{id} {} {}:{}-{}:{} {:?}{ellipsis}",
        tree.kind_name(id),
        span.start.line,
        span.start.column,
        span.end.line,
        span.end.column,
        preview,
    )
}
