//! Core CLI definitions

use clap::{ArgAction, Parser, Subcommand};
use mechdb::EnrichmentMode;
use std::path::PathBuf;

use super::catalog::CatalogCommand;
use super::jobs::JobsCommand;

/// Output format for report commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "mechdb")]
#[command(about = "BattleTech unit document ingestion", long_about = None)]
pub struct Cli {
    /// Path to database file (can also set MECHDB_DATABASE env var)
    #[arg(short, long, global = true, env = "MECHDB_DATABASE")]
    pub database: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema
    Init,

    /// Stage every .mtf and .blk document under a path
    #[command(visible_alias = "i")]
    Ingest {
        /// File or directory to ingest
        path: PathBuf,

        /// Override the configured enrichment mode (enqueue, skip)
        #[arg(long)]
        enrichment: Option<EnrichmentMode>,

        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Resolve staged equipment against the catalog
    #[command(visible_alias = "r")]
    Reconcile {
        /// Also promote resolved rows into slots
        #[arg(long)]
        finalize: bool,

        /// Number of unresolved tokens to report
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Promote resolved staging rows into slots and weapon instances
    #[command(visible_alias = "f")]
    Finalize,

    /// List equipment tokens with no catalog match
    #[command(visible_alias = "u")]
    Unresolved {
        /// Maximum number of tokens
        #[arg(short, long, default_value = "25")]
        limit: usize,

        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Manage the canonical weapon catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },

    /// Inspect and update battle-value enrichment jobs
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },

    /// Show database statistics
    Stats {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show recent per-document ingestion results
    Log {
        /// Number of entries
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only show failed documents
        #[arg(long)]
        failed: bool,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set the default database path
        #[arg(long)]
        set_database: Option<PathBuf>,

        /// Set the default enrichment mode (enqueue, skip)
        #[arg(long)]
        enrichment: Option<EnrichmentMode>,

        /// Write the built-in classifier rules into the config file for editing
        #[arg(long)]
        write_rules: bool,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
