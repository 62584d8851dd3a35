//! Resolution, finalization and unresolved-token reports

use anyhow::{Context, Result};
use mechdb::{Pipeline, PipelineConfig, ResolutionEngine, UnresolvedToken};
use std::path::Path;

use super::truncate;
use crate::cli::OutputFormat;

/// Handle `reconcile`
pub fn handle(db: &Path, config: &PipelineConfig, finalize: bool, top: usize) -> Result<()> {
    let wdb = super::open_db(db)?;
    let pipeline = Pipeline::new(&wdb, config).context("Invalid classifier rules")?;

    let summary = pipeline.resolve()?;
    println!("Resolved {} staging rows", summary.newly_resolved);
    println!("{} distinct tokens still unresolved", summary.outstanding_tokens);

    if top > 0 && summary.outstanding_tokens > 0 {
        let tokens = ResolutionEngine::new(&wdb).top_unresolved(top)?;
        println!();
        print_table(&tokens);
    }

    if finalize {
        println!();
        let summary = pipeline.finalize()?;
        print_finalize(&summary);
    }
    Ok(())
}

/// Handle `finalize`
pub fn finalize(db: &Path, config: &PipelineConfig) -> Result<()> {
    let wdb = super::open_db(db)?;
    let pipeline = Pipeline::new(&wdb, config).context("Invalid classifier rules")?;
    let summary = pipeline.finalize()?;
    print_finalize(&summary);
    Ok(())
}

/// Handle `unresolved`
pub fn unresolved(db: &Path, limit: usize, format: OutputFormat) -> Result<()> {
    let wdb = super::open_db(db)?;
    let tokens = wdb.unresolved_tokens(limit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tokens)?),
        OutputFormat::Table if tokens.is_empty() => println!("No unresolved tokens"),
        OutputFormat::Table => print_table(&tokens),
    }
    Ok(())
}

fn print_finalize(summary: &mechdb::FinalizeSummary) {
    println!("Slots created:            {}", summary.slots_created);
    println!("Weapon instances created: {}", summary.weapon_instances_created);
    if summary.orphaned_rows > 0 {
        println!("Rows with no matching unit: {}", summary.orphaned_rows);
    }
}

fn print_table(tokens: &[UnresolvedToken]) {
    println!("{:>6}  {:<32} {}", "seen", "token", "sample");
    println!("{}", "-".repeat(72));
    for token in tokens {
        println!(
            "{:>6}  {:<32} {}",
            token.seen_count,
            truncate(&token.token, 32),
            truncate(token.sample_raw.as_deref().unwrap_or(""), 32)
        );
    }
}
