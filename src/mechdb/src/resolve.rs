//! Resolution pass: link staged weapon lines to the canonical catalog.
//!
//! The pass is system-wide and runs in one transaction. It only moves rows
//! forward (unresolved to resolved), so running it again against an
//! unchanged catalog resolves nothing new.

use crate::repository::{CatalogRepository, RepoResult};
use crate::sqlite::SqliteDb;
use crate::types::{Category, ResolutionHint, UnresolvedToken};
use rusqlite::{params, Connection};
use serde::Serialize;

/// Counts reported by one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    /// Rows resolved by this pass (weapons, components and empties)
    pub newly_resolved: usize,
    /// Distinct weapon tokens still without a catalog match
    pub outstanding_tokens: usize,
}

pub struct ResolutionEngine<'a> {
    db: &'a SqliteDb,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(db: &'a SqliteDb) -> Self {
        Self { db }
    }

    /// Run one pass over every outstanding staging row
    pub fn run(&self) -> RepoResult<ResolutionSummary> {
        let tx = self.db.transaction()?;

        let weapons = resolve_weapons(&tx)?;
        let components = auto_resolve(&tx, Category::Component, ResolutionHint::Component)?;
        let empties = auto_resolve(&tx, Category::Empty, ResolutionHint::Empty)?;
        let outstanding_tokens = record_unresolved(&tx)?;

        tx.commit()?;

        let summary = ResolutionSummary {
            newly_resolved: weapons + components + empties,
            outstanding_tokens,
        };
        tracing::info!(
            weapons,
            components,
            empties,
            outstanding = outstanding_tokens,
            "resolution pass complete"
        );
        Ok(summary)
    }

    /// Unresolved tokens, most frequently seen first
    pub fn top_unresolved(&self, limit: usize) -> RepoResult<Vec<UnresolvedToken>> {
        self.db.unresolved_tokens(limit)
    }
}

/// Match weapon rows that are not yet linked: exact catalog name first, then
/// alias. Rows with no match are left for a later pass.
fn resolve_weapons(conn: &Connection) -> RepoResult<usize> {
    let index = conn.load_index()?;
    tracing::debug!(
        weapons = index.weapon_count(),
        aliases = index.alias_count(),
        "loaded catalog index"
    );

    let candidates: Vec<(i64, String)> = {
        let mut stmt = conn.prepare(
            "SELECT id, normalized_token FROM staging_row
             WHERE category = ?1 AND normalized_token IS NOT NULL
               AND NOT (resolved = 1 AND weapon_id IS NOT NULL)
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![Category::Weapon.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let mut resolved = 0;
    for (id, token) in candidates {
        let Some((weapon_id, hint)) = index.lookup(&token) else {
            continue;
        };
        conn.execute(
            "UPDATE staging_row SET weapon_id = ?2, resolved = 1, resolution_hint = ?3
             WHERE id = ?1",
            params![id, weapon_id, hint.to_string()],
        )?;
        tracing::debug!(id, token = token.as_str(), weapon_id, %hint, "resolved weapon");
        resolved += 1;
    }
    Ok(resolved)
}

/// Mark outstanding rows of a category resolved. Components qualify only
/// once staging attached a component type.
fn auto_resolve(conn: &Connection, category: Category, hint: ResolutionHint) -> RepoResult<usize> {
    let extra = match category {
        Category::Component => " AND component_type_id IS NOT NULL",
        _ => "",
    };
    let sql = format!(
        "UPDATE staging_row SET resolved = 1, resolution_hint = ?2
         WHERE category = ?1 AND resolved = 0{}",
        extra
    );
    let changed = conn.execute(&sql, params![category.as_str(), hint.to_string()])?;
    Ok(changed)
}

/// Fold every still-unmatched weapon token into the unresolved aggregate.
/// Counts are added to what earlier passes recorded. Returns the number of
/// distinct tokens seen in this pass.
fn record_unresolved(conn: &Connection) -> RepoResult<usize> {
    let groups: Vec<(String, i64, i64)> = {
        let mut stmt = conn.prepare(
            "SELECT normalized_token, COUNT(*), MIN(id) FROM staging_row
             WHERE category = ?1 AND normalized_token IS NOT NULL
               AND (weapon_id IS NULL OR resolved = 0)
             GROUP BY normalized_token
             ORDER BY normalized_token",
        )?;
        let rows = stmt
            .query_map(params![Category::Weapon.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    for (token, count, example_id) in &groups {
        let sample: String = conn.query_row(
            "SELECT raw_text FROM staging_row WHERE id = ?1",
            params![example_id],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO unresolved_token (token, sample_raw, example_staging_id, seen_count, last_seen)
             VALUES (?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)
             ON CONFLICT(token) DO UPDATE SET
                seen_count = seen_count + excluded.seen_count,
                sample_raw = excluded.sample_raw,
                example_staging_id = excluded.example_staging_id,
                last_seen = CURRENT_TIMESTAMP",
            params![token, sample, example_id, count],
        )?;
    }
    Ok(groups.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::parser::mtf;
    use crate::staging::StagingWriter;

    fn setup_db() -> SqliteDb {
        let db = SqliteDb::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    fn stage(db: &SqliteDb, name: &str, text: &str) {
        let classifier = Classifier::default();
        StagingWriter::new(db, &classifier)
            .stage(&mtf::parse(text), name)
            .unwrap();
    }

    #[test]
    fn test_exact_alias_and_auto_resolution() {
        let db = setup_db();
        let ll = db.get_or_create_weapon("Large Laser", None, None).unwrap();
        let ac = db.get_or_create_weapon("AC/20", None, None).unwrap();
        db.set_weapon_alias("Autocannon/20", ac).unwrap();
        stage(
            &db,
            "a.mtf",
            "mul id:1\nRight Arm:\nLarge Laser\nAutocannon/20\n-Empty-\nHand Actuator\nAC/20 Ammo\nMystery Cannon\n",
        );

        let summary = ResolutionEngine::new(&db).run().unwrap();
        assert_eq!(summary.newly_resolved, 4);
        assert_eq!(summary.outstanding_tokens, 1);

        let rows = db.staging_rows(false).unwrap();
        assert_eq!(rows[0].weapon_id, Some(ll));
        assert_eq!(rows[0].resolution_hint, Some(ResolutionHint::Exact));
        assert_eq!(rows[1].weapon_id, Some(ac));
        assert_eq!(rows[1].resolution_hint, Some(ResolutionHint::Alias));
        assert_eq!(rows[2].resolution_hint, Some(ResolutionHint::Empty));
        assert_eq!(rows[3].resolution_hint, Some(ResolutionHint::Component));
        // ammo and unmatched weapons stay unresolved
        assert!(!rows[4].resolved);
        assert!(!rows[5].resolved);
    }

    #[test]
    fn test_exact_preferred_over_alias() {
        let db = setup_db();
        let ppc = db.get_or_create_weapon("PPC", None, None).unwrap();
        let er = db.get_or_create_weapon("ER PPC", None, None).unwrap();
        db.set_weapon_alias("ppc", er).unwrap();
        stage(&db, "a.mtf", "mul id:2\nLeft Torso:\nPPC\n");

        ResolutionEngine::new(&db).run().unwrap();
        let row = db.staging_rows(false).unwrap().remove(0);
        assert_eq!(row.weapon_id, Some(ppc));
        assert_eq!(row.resolution_hint, Some(ResolutionHint::Exact));
    }

    #[test]
    fn test_second_pass_resolves_nothing() {
        let db = setup_db();
        db.get_or_create_weapon("Medium Laser", None, None).unwrap();
        stage(&db, "a.mtf", "mul id:3\nHead:\nMedium Laser\nCockpit\n-Empty-\n");

        let engine = ResolutionEngine::new(&db);
        assert_eq!(engine.run().unwrap().newly_resolved, 3);
        assert_eq!(engine.run().unwrap().newly_resolved, 0);
    }

    #[test]
    fn test_catalog_growth_resolves_later() {
        let db = setup_db();
        stage(&db, "a.mtf", "mul id:4\nHead:\nSmall Laser\n");
        let engine = ResolutionEngine::new(&db);
        assert_eq!(engine.run().unwrap(), ResolutionSummary { newly_resolved: 0, outstanding_tokens: 1 });

        db.get_or_create_weapon("Small Laser", None, None).unwrap();
        assert_eq!(engine.run().unwrap(), ResolutionSummary { newly_resolved: 1, outstanding_tokens: 0 });
    }

    #[test]
    fn test_unresolved_counts_across_documents() {
        let db = setup_db();
        for n in 0..3 {
            stage(
                &db,
                &format!("unit{}.mtf", n),
                &format!("mul id:{}\nLeft Arm:\nClan ER Micro Laser\n", 100 + n),
            );
        }
        stage(&db, "other.mtf", "mul id:200\nLeft Arm:\nRotary AC/5\n");

        let engine = ResolutionEngine::new(&db);
        let summary = engine.run().unwrap();
        assert_eq!(summary.outstanding_tokens, 2);

        let top = engine.top_unresolved(10).unwrap();
        assert_eq!(top[0].token, "clan er micro laser");
        assert_eq!(top[0].seen_count, 3);
        assert_eq!(top[0].sample_raw.as_deref(), Some("Clan ER Micro Laser"));
        assert_eq!(top[1].token, "rotary ac 5");
        assert_eq!(top[1].seen_count, 1);
        assert_eq!(engine.top_unresolved(1).unwrap().len(), 1);
    }
}
