//! Canonical weapon catalog maintenance

use anyhow::{bail, Context, Result};
use mechdb::normalize::normalize_token;
use mechdb::{Category, CatalogRepository, PipelineConfig};
use std::path::Path;

/// Handle `catalog add-weapon`
pub fn add_weapon(db: &Path, name: &str, category: Option<&str>, damage: Option<i64>) -> Result<()> {
    let wdb = super::open_db(db)?;
    let id = wdb.get_or_create_weapon(name, category, damage)?;
    println!("Weapon '{}' has ID {}", name, id);
    Ok(())
}

/// Handle `catalog add-alias`
pub fn add_alias(db: &Path, alias: &str, weapon: &str) -> Result<()> {
    let wdb = super::open_db(db)?;
    let Some(weapon_id) = wdb.find_weapon_by_name(weapon)? else {
        bail!("No weapon named '{}'. Add it first with `mechdb catalog add-weapon`", weapon);
    };
    wdb.set_weapon_alias(alias, weapon_id)?;
    println!("Alias '{}' -> {} (ID {})", alias, weapon, weapon_id);
    Ok(())
}

/// Handle `catalog lookup`
pub fn lookup(db: &Path, config: &PipelineConfig, text: &str) -> Result<()> {
    let wdb = super::open_db(db)?;
    let classifier = config.build_classifier().context("Invalid classifier rules")?;

    let classification = classifier.classify(text);
    let token = normalize_token(text, classifier.sentinels());

    println!("Line:      {}", text.trim());
    println!("Category:  {}", classification.category);
    if let Some(component) = classification.component_type {
        println!("Component: {}", component);
    }
    match token.as_deref() {
        Some(token) => println!("Token:     {}", token),
        None => println!("Token:     (none)"),
    }

    if classification.category != Category::Weapon {
        return Ok(());
    }
    let index = wdb.load_index()?;
    match token.as_deref().and_then(|t| index.lookup(t)) {
        Some((weapon_id, hint)) => println!("Match:     weapon {} ({})", weapon_id, hint),
        None => println!("Match:     none"),
    }
    Ok(())
}
