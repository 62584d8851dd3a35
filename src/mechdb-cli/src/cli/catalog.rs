//! Catalog command CLI definitions

use clap::Subcommand;

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Add a canonical weapon (no-op if the name exists)
    AddWeapon {
        /// Weapon name (e.g. "Large Laser")
        name: String,

        /// Weapon category (e.g. "energy")
        #[arg(long)]
        category: Option<String>,

        /// Damage per shot
        #[arg(long)]
        damage: Option<i64>,
    },

    /// Point an alias at an existing weapon
    AddAlias {
        /// Alias as it appears in documents (e.g. "ISLargeLaser")
        alias: String,

        /// Canonical weapon name
        weapon: String,
    },

    /// Show how an equipment line would be classified and matched
    Lookup {
        /// Raw equipment line
        text: String,
    },
}
