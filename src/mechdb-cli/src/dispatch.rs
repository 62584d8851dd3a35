//! Command dispatch functions
//!
//! Breaks up the main match statement into focused dispatch functions.

use std::path::Path;

use anyhow::Result;
use mechdb::PipelineConfig;

use crate::cli::*;
use crate::commands;

/// Dispatch catalog subcommands
pub fn dispatch_catalog(command: CatalogCommand, db: &Path, config: &PipelineConfig) -> Result<()> {
    match command {
        CatalogCommand::AddWeapon {
            name,
            category,
            damage,
        } => commands::catalog::add_weapon(db, &name, category.as_deref(), damage),

        CatalogCommand::AddAlias { alias, weapon } => {
            commands::catalog::add_alias(db, &alias, &weapon)
        }

        CatalogCommand::Lookup { text } => commands::catalog::lookup(db, config, &text),
    }
}

/// Dispatch jobs subcommands
pub fn dispatch_jobs(command: JobsCommand, db: &Path) -> Result<()> {
    match command {
        JobsCommand::List { status } => commands::jobs::list(db, status),
        JobsCommand::Claim { limit } => commands::jobs::claim(db, limit),
        JobsCommand::Complete { id, bv, pv } => commands::jobs::complete(db, id, bv, pv),
        JobsCommand::Fail { id, error } => commands::jobs::fail(db, id, &error),
    }
}
