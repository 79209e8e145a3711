//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// empsync - Employee project history kept in sync between JSON and SQLite
#[derive(Parser, Debug)]
#[command(name = "empsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.empsync/data/empsync.db)
    #[arg(long, global = true, env = "EMPSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Document mirror path (default: ~/.empsync/data/employees.json)
    #[arg(long, global = true, env = "EMPSYNC_DOCUMENT")]
    pub document: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database schema and an empty document mirror
    Init,

    /// Validate an employee document without touching any store
    Validate {
        /// Path to the JSON document
        file: PathBuf,
    },

    /// Add a project to an employee already in the document mirror
    Add(AddArgs),

    /// Sync every employee of a batch document into both stores
    Sync {
        /// Path to the batch JSON document
        file: PathBuf,

        /// Preview changes without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show an employee's current project versions
    Current {
        /// Employee phone
        phone: String,
    },

    /// Show an employee's full project timeline
    History {
        /// Employee phone
        phone: String,
    },

    /// List employee → project edges across all versions
    Edges,

    /// Export the full history to JSONL
    Export {
        /// Output file (default: history.jsonl beside the database)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Employee phone
    pub phone: String,

    /// Project id
    #[arg(long)]
    pub id: i64,

    /// Project name
    #[arg(long)]
    pub name: String,

    /// Project budget
    #[arg(long, allow_negative_numbers = true)]
    pub budget: f64,

    /// Project status
    #[arg(long, default_value = "ongoing")]
    pub status: String,

    /// Status the caller expects superseded projects to take (logged only)
    #[arg(long)]
    pub target_status: Option<String>,

    /// Preview changes without writing
    #[arg(long)]
    pub dry_run: bool,
}
