//! Repository traits for catalog access.
//!
//! The canonical catalog (weapons, aliases, component types) is seeded by an
//! external loader. The pipeline only reads it, except for the lazily created
//! component types behind the classifier.

use crate::types::ParseError;
use std::collections::HashMap;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid classifier rule '{pattern}': {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Returns true when the error is a UNIQUE/PRIMARY KEY conflict.
///
/// SQLite rolls back only the failing statement on a constraint violation,
/// so callers can skip it and keep the surrounding transaction.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Catalog lookups used by classification and resolution
pub trait CatalogRepository {
    /// Find a canonical weapon id by name
    fn find_weapon_by_name(&self, name: &str) -> RepoResult<Option<i64>>;

    /// Find the weapon id an alias points to
    fn find_weapon_by_alias(&self, alias: &str) -> RepoResult<Option<i64>>;

    /// Look up a weapon by name, creating it if missing
    fn get_or_create_weapon(
        &self,
        name: &str,
        category: Option<&str>,
        damage: Option<i64>,
    ) -> RepoResult<i64>;

    /// Point an alias at a weapon (replaces an existing alias)
    fn set_weapon_alias(&self, alias: &str, weapon_id: i64) -> RepoResult<()>;

    /// Look up a component type by name, creating it if missing
    fn get_or_create_component_type(&self, name: &str, category: &str) -> RepoResult<i64>;

    /// Load the whole weapon/alias catalog for one resolution pass
    fn load_index(&self) -> RepoResult<CatalogIndex>;
}

/// In-memory snapshot of weapon names and aliases, keyed by normalized token
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    names: HashMap<String, i64>,
    aliases: HashMap<String, i64>,
}

impl CatalogIndex {
    /// Build from (name, weapon id) and (alias, weapon id) pairs.
    ///
    /// Keys are normalized the same way equipment lines are. On collision
    /// the first pair wins, so callers should pass rows in id order.
    pub fn new<N, A>(names: N, aliases: A) -> Self
    where
        N: IntoIterator<Item = (String, i64)>,
        A: IntoIterator<Item = (String, i64)>,
    {
        let mut index = Self::default();
        for (name, id) in names {
            if let Some(key) = crate::normalize::normalize_catalog_key(&name) {
                index.names.entry(key).or_insert(id);
            }
        }
        for (alias, id) in aliases {
            if let Some(key) = crate::normalize::normalize_catalog_key(&alias) {
                index.aliases.entry(key).or_insert(id);
            }
        }
        index
    }

    pub fn exact(&self, token: &str) -> Option<i64> {
        self.names.get(token).copied()
    }

    pub fn alias(&self, token: &str) -> Option<i64> {
        self.aliases.get(token).copied()
    }

    /// Exact name first, then alias
    pub fn lookup(&self, token: &str) -> Option<(i64, crate::types::ResolutionHint)> {
        use crate::types::ResolutionHint;
        self.exact(token)
            .map(|id| (id, ResolutionHint::Exact))
            .or_else(|| self.alias(token).map(|id| (id, ResolutionHint::Alias)))
    }

    pub fn weapon_count(&self) -> usize {
        self.names.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolutionHint;

    #[test]
    fn test_index_prefers_exact_over_alias() {
        let index = CatalogIndex::new(
            vec![("Large Laser".to_string(), 1)],
            vec![("large laser".to_string(), 2), ("ll".to_string(), 1)],
        );
        assert_eq!(index.lookup("large laser"), Some((1, ResolutionHint::Exact)));
        assert_eq!(index.lookup("ll"), Some((1, ResolutionHint::Alias)));
        assert_eq!(index.lookup("ppc"), None);
    }

    #[test]
    fn test_index_first_name_wins_on_collision() {
        let index = CatalogIndex::new(
            vec![("AC/10".to_string(), 7), ("ac 10".to_string(), 9)],
            Vec::new(),
        );
        assert_eq!(index.exact("ac 10"), Some(7));
        assert_eq!(index.weapon_count(), 1);
        assert_eq!(index.alias_count(), 0);
    }
}
