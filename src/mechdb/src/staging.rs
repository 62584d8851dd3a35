//! Staging writer: persist one parsed document.
//!
//! Each equipment line becomes a staging row carrying its raw text, the
//! normalized token and its classification. Weapon lines are linked to the
//! catalog later by the resolution pass, so staging never depends on the
//! catalog being complete.

use crate::classify::Classifier;
use crate::config::EnrichmentMode;
use crate::jobs::{EnrichmentKey, JobQueue};
use crate::normalize::normalize_token;
use crate::parser::ParsedUnit;
use crate::repository::{is_constraint_violation, RepoResult};
use crate::sqlite::SqliteDb;
use rusqlite::{params, Connection, OptionalExtension};

/// Outcome of staging one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUnit {
    pub unit_id: i64,
    /// The unit already existed (matched by external id) and was left as is
    pub reused: bool,
    /// Staging row ids in document order
    pub staging_ids: Vec<i64>,
}

/// Canonical name table plus its unit association table
struct Association {
    table: &'static str,
    column: &'static str,
    link_table: &'static str,
    link_column: &'static str,
}

const MANUFACTURERS: Association = Association {
    table: "manufacturer",
    column: "name",
    link_table: "unit_manufacturer",
    link_column: "manufacturer_id",
};

const FACTORIES: Association = Association {
    table: "factory",
    column: "name",
    link_table: "unit_factory",
    link_column: "factory_id",
};

const QUIRKS: Association = Association {
    table: "quirk",
    column: "code",
    link_table: "unit_quirk",
    link_column: "quirk_id",
};

/// Writes parsed documents into the staging schema
pub struct StagingWriter<'a> {
    db: &'a SqliteDb,
    classifier: &'a Classifier,
    enrichment: EnrichmentMode,
}

impl<'a> StagingWriter<'a> {
    pub fn new(db: &'a SqliteDb, classifier: &'a Classifier) -> Self {
        Self {
            db,
            classifier,
            enrichment: EnrichmentMode::default(),
        }
    }

    pub fn with_enrichment(mut self, enrichment: EnrichmentMode) -> Self {
        self.enrichment = enrichment;
        self
    }

    /// Stage one document. All rows are written in a single transaction;
    /// any error leaves the database untouched.
    pub fn stage(&self, parsed: &ParsedUnit, document_name: &str) -> RepoResult<StagedUnit> {
        let tx = self.db.transaction()?;
        let staged = self.stage_in(&tx, parsed, document_name)?;
        tx.commit()?;

        tracing::debug!(
            document = document_name,
            unit = staged.unit_id,
            reused = staged.reused,
            rows = staged.staging_ids.len(),
            "staged document"
        );
        Ok(staged)
    }

    fn stage_in(
        &self,
        conn: &Connection,
        parsed: &ParsedUnit,
        document_name: &str,
    ) -> RepoResult<StagedUnit> {
        let (unit_id, reused) = insert_or_reuse_unit(conn, parsed)?;
        let unit_ref = parsed.unit_reference();

        let mut staging_ids = Vec::with_capacity(parsed.equipment_count());
        for (position, block) in parsed.locations.iter().enumerate() {
            get_or_create_location(conn, unit_id, &block.location, Some(position as i64 + 1))?;

            for (index, line) in block.lines.iter().enumerate() {
                let id = self.insert_staging_row(
                    conn,
                    document_name,
                    unit_ref.as_deref(),
                    &block.location,
                    index as i64 + 1,
                    line,
                )?;
                staging_ids.push(id);
            }
        }

        write_narrative(conn, unit_id, parsed)?;
        associate(conn, unit_id, &MANUFACTURERS, &parsed.manufacturers)?;
        associate(conn, unit_id, &FACTORIES, &parsed.factories)?;
        associate(conn, unit_id, &QUIRKS, &parsed.quirks)?;
        write_system_manufacturers(conn, unit_id, parsed)?;
        write_armor(conn, unit_id, parsed)?;

        if self.enrichment == EnrichmentMode::Enqueue {
            match EnrichmentKey::for_unit(parsed) {
                Some(key) => {
                    JobQueue::new(conn).enqueue(&key)?;
                }
                None => tracing::debug!(document = document_name, "no unit name, enrichment skipped"),
            }
        }

        Ok(StagedUnit {
            unit_id,
            reused,
            staging_ids,
        })
    }

    fn insert_staging_row(
        &self,
        conn: &Connection,
        document_name: &str,
        unit_ref: Option<&str>,
        location: &str,
        slot_index: i64,
        line: &str,
    ) -> RepoResult<i64> {
        let raw = line.trim();
        let token = normalize_token(raw, self.classifier.sentinels());
        let (category, component_type_id) = self.classifier.classify_and_resolve(raw, conn)?;

        conn.execute(
            "INSERT INTO staging_row (file_name, unit_ref, location_name, slot_index, raw_text,
                normalized_token, category, component_type_id, resolved)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
            params![
                document_name,
                unit_ref,
                location,
                slot_index,
                raw,
                token,
                category.as_str(),
                component_type_id
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::trace!(id, location, slot_index, raw, %category, "staging row");
        Ok(id)
    }
}

/// Insert the unit, or return the existing one with the same external id
/// without touching its fields.
fn insert_or_reuse_unit(conn: &Connection, parsed: &ParsedUnit) -> RepoResult<(i64, bool)> {
    let external_id = parsed.external_id();
    if let Some(ext) = &external_id {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM unit WHERE external_id = ?1",
                params![ext],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok((id, true));
        }
    }

    let f = &parsed.fields;
    let specs_json = serde_json::to_string(&parsed.specs)?;
    conn.execute(
        "INSERT INTO unit (kind, name, model, external_id, unit_type, config, techbase, era,
            source, rules_level, role, year, original_build_year, type_classification,
            motion_type, cruise_mp, engine_type, tonnage, fuel_type, specs_json, raw_doc)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
            ?18, ?19, ?20, ?21)",
        params![
            parsed.kind.to_string(),
            parsed.display_name(),
            f.model,
            external_id,
            f.unit_type,
            f.config,
            f.techbase,
            f.era,
            f.source,
            f.rules_level,
            f.role,
            f.year,
            f.original_build_year,
            f.type_classification,
            f.motion_type,
            f.cruise_mp,
            f.engine_type,
            f.tonnage,
            f.fuel_type,
            specs_json,
            parsed.raw_text
        ],
    )?;
    Ok((conn.last_insert_rowid(), false))
}

/// Find a unit's location by name, creating it if missing. Without an
/// explicit position the location is appended after the existing ones.
pub(crate) fn get_or_create_location(
    conn: &Connection,
    unit_id: i64,
    name: &str,
    position: Option<i64>,
) -> RepoResult<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM location WHERE unit_id = ?1 AND name = ?2",
            params![unit_id, name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO location (unit_id, name, position_order)
         VALUES (?1, ?2, COALESCE(?3,
            (SELECT COALESCE(MAX(position_order), 0) + 1 FROM location WHERE unit_id = ?1)))",
        params![unit_id, name, position],
    )?;
    Ok(conn.last_insert_rowid())
}

fn write_narrative(conn: &Connection, unit_id: i64, parsed: &ParsedUnit) -> RepoResult<()> {
    let section = |name: &str| parsed.narratives.get(name).filter(|s| !s.is_empty());
    let notes = parsed.specs.get("notes").filter(|s| !s.is_empty());
    let sections = [
        section("overview"),
        section("capabilities"),
        section("deployment"),
        section("history"),
        notes,
    ];
    if sections.iter().all(Option::is_none) {
        return Ok(());
    }

    conn.execute(
        "INSERT INTO unit_narrative (unit_id, overview, capabilities, deployment, history, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(unit_id) DO NOTHING",
        params![
            unit_id,
            sections[0],
            sections[1],
            sections[2],
            sections[3],
            sections[4]
        ],
    )?;
    Ok(())
}

/// Look up or create each canonical row, then link it to the unit. A link
/// that already exists is skipped.
fn associate(
    conn: &Connection,
    unit_id: i64,
    assoc: &Association,
    names: &[String],
) -> RepoResult<usize> {
    let insert_name = format!(
        "INSERT INTO {table} ({column}) VALUES (?1) ON CONFLICT({column}) DO NOTHING",
        table = assoc.table,
        column = assoc.column
    );
    let select_id = format!(
        "SELECT id FROM {table} WHERE {column} = ?1",
        table = assoc.table,
        column = assoc.column
    );
    let insert_link = format!(
        "INSERT INTO {link} (unit_id, {link_column}) VALUES (?1, ?2)",
        link = assoc.link_table,
        link_column = assoc.link_column
    );

    let mut linked = 0;
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        conn.execute(&insert_name, params![name])?;
        let id: i64 = conn.query_row(&select_id, params![name], |row| row.get(0))?;
        match conn.execute(&insert_link, params![unit_id, id]) {
            Ok(_) => linked += 1,
            Err(e) if is_constraint_violation(&e) => {
                tracing::debug!(unit = unit_id, table = assoc.link_table, name, "already linked");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(linked)
}

fn write_system_manufacturers(
    conn: &Connection,
    unit_id: i64,
    parsed: &ParsedUnit,
) -> RepoResult<()> {
    for (system, manufacturer) in &parsed.system_manufacturers {
        conn.execute(
            "INSERT INTO unit_system_manufacturer (unit_id, system_type, manufacturer_name)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(unit_id, system_type) DO NOTHING",
            params![unit_id, system, manufacturer],
        )?;
    }
    Ok(())
}

fn write_armor(conn: &Connection, unit_id: i64, parsed: &ParsedUnit) -> RepoResult<()> {
    for (location, points) in parsed.armor_by_location() {
        conn.execute(
            "INSERT INTO unit_armor (unit_id, location, points) VALUES (?1, ?2, ?3)
             ON CONFLICT(unit_id, location) DO NOTHING",
            params![unit_id, location, points],
        )?;
    }
    Ok(())
}
