//! Database initialization

use anyhow::Result;
use std::path::Path;

/// Handle `init`
pub fn handle(db: &Path) -> Result<()> {
    let wdb = super::open_db(db)?;
    let stats = wdb.stats()?;
    println!("Your database is ready at {}", db.display());
    println!(
        "  {} units, {} catalog weapons, {} aliases",
        stats.unit_count, stats.weapon_count, stats.alias_count
    );
    Ok(())
}
