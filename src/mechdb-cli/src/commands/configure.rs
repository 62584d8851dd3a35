//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up mechdb CLI defaults.

use crate::config::Config;
use anyhow::Result;
use mechdb::{ClassifierRules, EnrichmentMode, DEFAULT_DB_PATH};
use std::path::{Path, PathBuf};

/// Handle the configure command
///
/// # Arguments
/// * `set_database` - Default database path to store
/// * `enrichment` - Default enrichment mode to store
/// * `write_rules` - Copy the built-in classifier rules into the config file
/// * `show` - If true, show current configuration
pub fn handle(
    config: Config,
    set_database: Option<PathBuf>,
    enrichment: Option<EnrichmentMode>,
    write_rules: bool,
    show: bool,
) -> Result<()> {
    if show {
        show_config(&config);
        return Ok(());
    }

    if set_database.is_none() && enrichment.is_none() && !write_rules {
        show_usage();
        return Ok(());
    }

    let path = Config::config_path()?;
    let config = apply(config, set_database, enrichment, write_rules);
    save(&config, &path)
}

/// Apply requested changes without touching the filesystem
fn apply(
    mut config: Config,
    set_database: Option<PathBuf>,
    enrichment: Option<EnrichmentMode>,
    write_rules: bool,
) -> Config {
    if let Some(path) = set_database {
        println!("Database: {}", path.display());
        config.database = Some(path);
    }
    if let Some(mode) = enrichment {
        println!("Enrichment: {}", mode);
        config.enrichment = Some(mode);
    }
    if write_rules && config.classifier.is_none() {
        println!("Classifier rules: built-in defaults written");
        config.classifier = Some(ClassifierRules::default());
    } else if write_rules {
        println!("Classifier rules already present; left unchanged");
    }
    config
}

fn save(config: &Config, path: &Path) -> Result<()> {
    config.save_to(path)?;
    println!("Config saved to: {}", path.display());
    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.database {
        Some(path) => println!("Database: {}", path.display()),
        None => println!("Database: {} (default)", DEFAULT_DB_PATH),
    }
    match config.enrichment {
        Some(mode) => println!("Enrichment: {}", mode),
        None => println!("Enrichment: {} (default)", EnrichmentMode::default()),
    }
    match &config.classifier {
        Some(rules) => println!("Classifier: {} custom rules", rules.rules.len()),
        None => println!("Classifier: built-in rules"),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: mechdb configure --set-database PATH");
    println!("   or: mechdb configure --enrichment enqueue|skip");
    println!("   or: mechdb configure --write-rules");
    println!("   or: mechdb configure --show");
    println!();
    println!("Note: --write-rules copies the built-in classifier table into the");
    println!("      config file so it can be edited.");
}
