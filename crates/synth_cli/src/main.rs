//! Synth CLI
//!
//! Parses, queries and incrementally edits documents from the command line.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use synth_core::{Synth, SynthConfig};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SynthConfig::from_file(path).into_diagnostic()?,
        None => SynthConfig::default(),
    };
    debug!("Using configuration {:?}", config);
    let synth = Synth::new(config).into_diagnostic()?;

    match cli.command {
        Commands::Parse {
            file,
            language,
            format,
            index,
            strip_comments,
        } => commands::parse::run(&synth, &file, language.as_deref(), format, index, strip_comments),
        Commands::Query {
            file,
            language,
            kind,
            offset,
        } => commands::query::run(&synth, &file, language.as_deref(), kind.as_deref(), offset),
        Commands::Edit {
            file,
            language,
            start,
            end,
            text,
            print_tree,
        } => commands::edit::run(
            synth,
            &file,
            language.as_deref(),
            (start, end),
            &text,
            print_tree,
        ),
    }
}
