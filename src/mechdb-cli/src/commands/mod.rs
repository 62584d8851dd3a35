//! Command handlers for mechdb CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod catalog;
pub mod configure;
pub mod ingest;
pub mod init;
pub mod jobs;
pub mod reconcile;
pub mod stats;

use anyhow::{Context, Result};
use mechdb::SqliteDb;
use std::path::Path;

/// Open the database, creating its directory and schema if needed
pub fn open_db(db: &Path) -> Result<SqliteDb> {
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let wdb = SqliteDb::open(db)
        .with_context(|| format!("Failed to open database {}", db.display()))?;
    wdb.init().context("Failed to initialize database schema")?;
    Ok(wdb)
}

/// Truncate to `width` characters, marking the cut with an ellipsis
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}
