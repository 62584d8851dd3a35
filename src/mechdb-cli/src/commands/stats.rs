//! Database statistics and the loader log

use anyhow::Result;
use mechdb::pipeline::LOAD_FAILED;
use std::path::Path;

use crate::cli::OutputFormat;

/// Handle `stats`
pub fn stats(db: &Path, format: OutputFormat) -> Result<()> {
    let wdb = super::open_db(db)?;
    let stats = wdb.stats()?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Unit Database Statistics");
    println!("  Units:            {}", stats.unit_count);
    println!("  Locations:        {}", stats.location_count);
    println!(
        "  Staging rows:     {} ({} resolved)",
        stats.staging_count, stats.staging_resolved
    );
    println!("  Slots:            {}", stats.slot_count);
    println!("  Weapon instances: {}", stats.weapon_instance_count);
    println!("  Catalog weapons:  {}", stats.weapon_count);
    println!("  Aliases:          {}", stats.alias_count);
    println!("  Component types:  {}", stats.component_type_count);
    println!("  Unresolved:       {}", stats.unresolved_token_count);
    println!("  Pending jobs:     {}", stats.pending_job_count);
    Ok(())
}

/// Handle `log`
pub fn log(db: &Path, limit: usize, failed_only: bool) -> Result<()> {
    let wdb = super::open_db(db)?;
    let status = failed_only.then_some(LOAD_FAILED);
    let entries = wdb.loader_log(limit, status)?;

    if entries.is_empty() {
        println!("No log entries");
        return Ok(());
    }

    for entry in &entries {
        match &entry.message {
            Some(message) => println!(
                "{}  {:<6} {}: {}",
                entry.created_at, entry.status, entry.file_name, message
            ),
            None => println!("{}  {:<6} {}", entry.created_at, entry.status, entry.file_name),
        }
    }
    Ok(())
}
