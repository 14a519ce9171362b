//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Synth - incremental AST engine
#[derive(Parser)]
#[command(name = "synth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a file and print its tree
    Parse {
        /// File to parse
        file: PathBuf,

        /// Language name (defaults to the one registered for the extension)
        #[arg(short, long)]
        language: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,

        /// Print node counts per type after the tree
        #[arg(long)]
        index: bool,

        /// Drop comment nodes before printing
        #[arg(long)]
        strip_comments: bool,
    },

    /// Look up nodes by type or offset
    Query {
        /// File to parse
        file: PathBuf,

        /// Language name
        #[arg(short, long)]
        language: Option<String>,

        /// Print every node of this type
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// Print the innermost node containing this byte offset
        #[arg(short, long)]
        offset: Option<u32>,
    },

    /// Apply one edit incrementally and print the update statistics
    Edit {
        /// File to parse
        file: PathBuf,

        /// Language name
        #[arg(short, long)]
        language: Option<String>,

        /// Start byte of the replaced range
        #[arg(long)]
        start: u32,

        /// End byte of the replaced range
        #[arg(long)]
        end: u32,

        /// Replacement text
        #[arg(long, default_value = "")]
        text: String,

        /// Print the updated tree after the statistics
        #[arg(long)]
        print_tree: bool,
    },
}

/// Output format for `parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented tree dump
    Tree,
    /// JSON document
    Json,
    /// Versioned binary layout
    Binary,
}
