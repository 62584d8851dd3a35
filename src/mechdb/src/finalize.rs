//! Finalization: promote resolved staging rows into slots and weapon
//! instances.
//!
//! A slot is identified by (location, slot index). Existing slots are never
//! touched, which makes the pass safe to repeat.

use crate::normalize::EmptySentinels;
use crate::repository::RepoResult;
use crate::sqlite::{row_to_staging_row, SqliteDb};
use crate::staging::get_or_create_location;
use crate::types::StagingRow;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;

/// Note stored on slots whose raw text is an empty-slot sentinel
pub const EMPTY_SLOT_NOTE: &str = "Empty";

/// Counts reported by one finalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinalizeSummary {
    pub slots_created: usize,
    pub weapon_instances_created: usize,
    /// Resolved rows whose unit reference matched no unit
    pub orphaned_rows: usize,
}

pub struct Finalizer<'a> {
    db: &'a SqliteDb,
    sentinels: EmptySentinels,
}

impl<'a> Finalizer<'a> {
    pub fn new(db: &'a SqliteDb) -> Self {
        Self {
            db,
            sentinels: EmptySentinels::default(),
        }
    }

    /// Use the classifier's configured sentinels for the empty-slot note
    pub fn with_sentinels(mut self, sentinels: EmptySentinels) -> Self {
        self.sentinels = sentinels;
        self
    }

    pub fn run(&self) -> RepoResult<FinalizeSummary> {
        let tx = self.db.transaction()?;

        let rows: Vec<StagingRow> = {
            let mut stmt = tx.prepare(
                "SELECT id, file_name, unit_ref, location_name, slot_index, raw_text,
                        normalized_token, category, weapon_id, component_type_id, resolved,
                        resolution_hint, created_at
                 FROM staging_row WHERE resolved = 1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], row_to_staging_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut summary = FinalizeSummary::default();
        let mut units: HashMap<String, Option<i64>> = HashMap::new();

        for row in &rows {
            let Some(reference) = row.unit_ref.as_deref() else {
                summary.orphaned_rows += 1;
                continue;
            };
            let unit_id = match units.get(reference) {
                Some(cached) => *cached,
                None => {
                    let found = find_unit(&tx, reference)?;
                    units.insert(reference.to_string(), found);
                    found
                }
            };
            let Some(unit_id) = unit_id else {
                tracing::debug!(row = row.id, reference, "no unit for staging row");
                summary.orphaned_rows += 1;
                continue;
            };

            let location_id = get_or_create_location(&tx, unit_id, &row.location_name, None)?;
            if slot_exists(&tx, location_id, row.slot_index)? {
                continue;
            }

            let note = self
                .sentinels
                .matches(&row.raw_text)
                .then_some(EMPTY_SLOT_NOTE);
            tx.execute(
                "INSERT INTO slot (location_id, slot_index, raw_text, component_type_id, note)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    location_id,
                    row.slot_index,
                    row.raw_text,
                    row.component_type_id,
                    note
                ],
            )?;
            let slot_id = tx.last_insert_rowid();
            summary.slots_created += 1;

            if let Some(weapon_id) = row.weapon_id {
                tx.execute(
                    "INSERT INTO weapon_instance (slot_id, weapon_id, qty) VALUES (?1, ?2, 1)",
                    params![slot_id, weapon_id],
                )?;
                summary.weapon_instances_created += 1;
            }
        }

        tx.commit()?;

        tracing::info!(
            slots = summary.slots_created,
            weapons = summary.weapon_instances_created,
            orphaned = summary.orphaned_rows,
            "finalization pass complete"
        );
        Ok(summary)
    }
}

/// Resolve a staging row's unit reference: external id first, then unit
/// name for references that are not numeric ids.
fn find_unit(conn: &Connection, reference: &str) -> RepoResult<Option<i64>> {
    let by_external: Option<i64> = conn
        .query_row(
            "SELECT id FROM unit WHERE external_id = ?1",
            params![reference],
            |row| row.get(0),
        )
        .optional()?;
    if by_external.is_some() || reference.parse::<i64>().is_ok() {
        return Ok(by_external);
    }

    Ok(conn
        .query_row(
            "SELECT id FROM unit WHERE name = ?1 ORDER BY id LIMIT 1",
            params![reference],
            |row| row.get(0),
        )
        .optional()?)
}

fn slot_exists(conn: &Connection, location_id: i64, slot_index: i64) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM slot WHERE location_id = ?1 AND slot_index = ?2",
            params![location_id, slot_index],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::parser::{blk, mtf};
    use crate::repository::CatalogRepository;
    use crate::resolve::ResolutionEngine;
    use crate::staging::StagingWriter;

    fn setup_db() -> SqliteDb {
        let db = SqliteDb::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    fn stage_and_resolve(db: &SqliteDb, name: &str, unit: &crate::parser::ParsedUnit) -> i64 {
        let classifier = Classifier::default();
        let staged = StagingWriter::new(db, &classifier).stage(unit, name).unwrap();
        ResolutionEngine::new(db).run().unwrap();
        staged.unit_id
    }

    #[test]
    fn test_three_line_scenario() {
        let db = setup_db();
        let ll = db.get_or_create_weapon("large laser", None, None).unwrap();
        let unit_id = stage_and_resolve(
            &db,
            "a.mtf",
            &mtf::parse("mul id:77\nRight Torso:\nLarge Laser\n-Empty-\nJump Jet\n"),
        );

        let summary = Finalizer::new(&db).run().unwrap();
        assert_eq!(summary.slots_created, 3);
        assert_eq!(summary.weapon_instances_created, 1);

        let slots = db.slots_for_location(unit_id, "Right Torso").unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(db.slot_weapon(slots[0].id).unwrap(), Some(ll));
        assert_eq!(slots[1].note.as_deref(), Some(EMPTY_SLOT_NOTE));
        assert_eq!(db.slot_weapon(slots[1].id).unwrap(), None);
        assert!(slots[2].component_type_id.is_some());
    }

    #[test]
    fn test_second_run_creates_nothing() {
        let db = setup_db();
        db.get_or_create_weapon("Medium Laser", None, None).unwrap();
        stage_and_resolve(&db, "a.mtf", &mtf::parse("mul id:5\nHead:\nMedium Laser\nSensors\n"));

        let finalizer = Finalizer::new(&db);
        assert_eq!(finalizer.run().unwrap().slots_created, 2);
        let again = finalizer.run().unwrap();
        assert_eq!(again.slots_created, 0);
        assert_eq!(again.weapon_instances_created, 0);
        assert_eq!(db.stats().unwrap().slot_count, 2);
        assert_eq!(db.stats().unwrap().weapon_instance_count, 1);
    }

    #[test]
    fn test_spaced_empty_sentinel_note() {
        let db = setup_db();
        let unit_id = stage_and_resolve(&db, "a.mtf", &mtf::parse("mul id:6\nLeft Leg:\n- EMPTY -\n"));
        Finalizer::new(&db).run().unwrap();
        let slots = db.slots_for_location(unit_id, "Left Leg").unwrap();
        assert_eq!(slots[0].note.as_deref(), Some("Empty"));
        assert_eq!(slots[0].raw_text.as_deref(), Some("- EMPTY -"));
        assert_eq!(db.stats().unwrap().weapon_instance_count, 0);
    }

    #[test]
    fn test_mech_without_external_id_is_not_finalized() {
        let db = setup_db();
        stage_and_resolve(&db, "a.mtf", &mtf::parse("chassis:Nameless\nHead:\nCockpit\n"));
        let summary = Finalizer::new(&db).run().unwrap();
        assert_eq!(summary.slots_created, 0);
        assert_eq!(summary.orphaned_rows, 1);
    }

    #[test]
    fn test_vehicle_found_by_name() {
        let db = setup_db();
        let unit = blk::parse("<Name>\nSkulker\n</Name>\n<Body Equipment>\nCASE\n</Body Equipment>\n");
        let unit_id = stage_and_resolve(&db, "skulker.blk", &unit);
        let summary = Finalizer::new(&db).run().unwrap();
        assert_eq!(summary.slots_created, 1);
        assert_eq!(db.slots_for_location(unit_id, "Body").unwrap().len(), 1);
    }

    #[test]
    fn test_reingested_vehicle_without_id_finalizes_onto_oldest_unit() {
        let db = setup_db();
        let text = "<Name>\nSkulker\n</Name>\n<Body Equipment>\nCASE\n</Body Equipment>\n";
        let first = stage_and_resolve(&db, "skulker.blk", &blk::parse(text));
        let second = stage_and_resolve(&db, "skulker-copy.blk", &blk::parse(text));
        assert_ne!(first, second);

        let summary = Finalizer::new(&db).run().unwrap();
        assert_eq!(summary.slots_created, 1);
        assert_eq!(summary.orphaned_rows, 0);
        assert_eq!(db.slots_for_location(first, "Body").unwrap().len(), 1);
        assert!(db.slots_for_location(second, "Body").unwrap().is_empty());
    }

    #[test]
    fn test_find_unit_numeric_reference_does_not_fall_back_to_name() {
        let db = setup_db();
        db.conn()
            .execute("INSERT INTO unit (kind, name) VALUES ('mech', '42')", [])
            .unwrap();
        assert_eq!(find_unit(db.conn(), "42").unwrap(), None);
        assert!(find_unit(db.conn(), "Unknown Tank").unwrap().is_none());
    }
}
