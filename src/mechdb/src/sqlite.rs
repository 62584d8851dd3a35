//! SQLite store using rusqlite (synchronous).
//!
//! Every pipeline phase borrows the single [`Connection`] held here. Phases
//! that must be all-or-nothing open their own transaction through
//! [`SqliteDb::transaction`].

use crate::repository::*;
use crate::types::*;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;
use std::path::Path;

/// Default database location
pub const DEFAULT_DB_PATH: &str = "share/mechdb.db";

/// SQLite-backed unit database
pub struct SqliteDb {
    conn: Connection,
}

const UNIT_SELECT_COLUMNS: &str = "id, kind, name, model, external_id, unit_type, techbase, era, \
     source, rules_level, role, year, tonnage, bv, pv, created_at";

const STAGING_SELECT_COLUMNS: &str = "id, file_name, unit_ref, location_name, slot_index, \
     raw_text, normalized_token, category, weapon_id, component_type_id, resolved, \
     resolution_hint, created_at";

/// Decode an enum stored as text. Unrecognized text is a conversion error,
/// not a silent default.
pub(crate) fn parse_text_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = ParseError>,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn parse_optional_text_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: std::str::FromStr<Err = ParseError>,
{
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => parse_text_column(row, idx).map(Some),
        None => Ok(None),
    }
}

fn row_to_unit(row: &rusqlite::Row<'_>) -> rusqlite::Result<Unit> {
    Ok(Unit {
        id: row.get(0)?,
        kind: parse_text_column(row, 1)?,
        name: row.get(2)?,
        model: row.get(3)?,
        external_id: row.get(4)?,
        unit_type: row.get(5)?,
        techbase: row.get(6)?,
        era: row.get(7)?,
        source: row.get(8)?,
        rules_level: row.get(9)?,
        role: row.get(10)?,
        year: row.get(11)?,
        tonnage: row.get(12)?,
        bv: row.get(13)?,
        pv: row.get(14)?,
        created_at: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
    })
}

pub(crate) fn row_to_staging_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StagingRow> {
    Ok(StagingRow {
        id: row.get(0)?,
        file_name: row.get(1)?,
        unit_ref: row.get(2)?,
        location_name: row.get(3)?,
        slot_index: row.get(4)?,
        raw_text: row.get(5)?,
        normalized_token: row.get(6)?,
        category: parse_text_column(row, 7)?,
        weapon_id: row.get(8)?,
        component_type_id: row.get(9)?,
        resolved: row.get(10)?,
        resolution_hint: parse_optional_text_column(row, 11)?,
        created_at: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
    })
}

fn row_to_slot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Slot> {
    Ok(Slot {
        id: row.get(0)?,
        location_id: row.get(1)?,
        slot_index: row.get(2)?,
        raw_text: row.get(3)?,
        component_type_id: row.get(4)?,
        note: row.get(5)?,
    })
}

impl SqliteDb {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path.as_ref())?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create the schema if needed. Safe to call on every start.
    pub fn init(&self) -> RepoResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version TEXT PRIMARY KEY NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        self.run_migrations()
    }

    /// Borrow the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction that rolls back unless committed
    pub fn transaction(&self) -> RepoResult<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    fn is_migration_applied(&self, version: &str) -> RepoResult<bool> {
        let result: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result.is_some())
    }

    fn mark_migration_applied(&self, version: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            params![version],
        )?;
        Ok(())
    }

    /// Run pending migrations
    #[allow(clippy::too_many_lines)] // SQL schema definition
    fn run_migrations(&self) -> RepoResult<()> {
        // Migration 0001: units, catalog, staging and the finalized slot schema
        if !self.is_migration_applied("0001_base_schema")? {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS unit (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind TEXT NOT NULL,
                    name TEXT NOT NULL,
                    model TEXT,
                    external_id TEXT UNIQUE,
                    unit_type TEXT,
                    config TEXT,
                    techbase TEXT,
                    era TEXT,
                    source TEXT,
                    rules_level INTEGER,
                    role TEXT,
                    year INTEGER,
                    original_build_year INTEGER,
                    type_classification TEXT,
                    motion_type TEXT,
                    cruise_mp INTEGER,
                    engine_type INTEGER,
                    tonnage REAL,
                    fuel_type TEXT,
                    specs_json TEXT,
                    raw_doc TEXT,
                    bv INTEGER,
                    pv INTEGER,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS location (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    unit_id INTEGER NOT NULL REFERENCES unit(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    position_order INTEGER,
                    UNIQUE(unit_id, name)
                );

                CREATE TABLE IF NOT EXISTS weapon (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    category TEXT,
                    damage INTEGER,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS weapon_alias (
                    alias TEXT PRIMARY KEY NOT NULL,
                    weapon_id INTEGER NOT NULL REFERENCES weapon(id) ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS component_type (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    category TEXT
                );

                CREATE TABLE IF NOT EXISTS staging_row (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    file_name TEXT,
                    unit_ref TEXT,
                    location_name TEXT NOT NULL,
                    slot_index INTEGER NOT NULL,
                    raw_text TEXT NOT NULL,
                    normalized_token TEXT,
                    category TEXT NOT NULL,
                    weapon_id INTEGER REFERENCES weapon(id),
                    component_type_id INTEGER REFERENCES component_type(id),
                    resolved BOOLEAN NOT NULL DEFAULT FALSE,
                    resolution_hint TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS unresolved_token (
                    token TEXT PRIMARY KEY NOT NULL,
                    sample_raw TEXT,
                    example_staging_id INTEGER,
                    seen_count INTEGER NOT NULL DEFAULT 0,
                    last_seen TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS slot (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    location_id INTEGER NOT NULL REFERENCES location(id) ON DELETE CASCADE,
                    slot_index INTEGER NOT NULL,
                    raw_text TEXT,
                    component_type_id INTEGER REFERENCES component_type(id),
                    note TEXT,
                    UNIQUE(location_id, slot_index)
                );

                CREATE TABLE IF NOT EXISTS weapon_instance (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    slot_id INTEGER NOT NULL UNIQUE REFERENCES slot(id) ON DELETE CASCADE,
                    weapon_id INTEGER NOT NULL REFERENCES weapon(id),
                    qty INTEGER NOT NULL DEFAULT 1
                );
                "#,
            )?;

            self.mark_migration_applied("0001_base_schema")?;
            tracing::info!("SQLite: Applied migration 0001_base_schema");
        }

        // Migration 0002: descriptive satellite tables, loader log, enrichment jobs
        if !self.is_migration_applied("0002_unit_details")? {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS manufacturer (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                );

                CREATE TABLE IF NOT EXISTS unit_manufacturer (
                    unit_id INTEGER NOT NULL REFERENCES unit(id) ON DELETE CASCADE,
                    manufacturer_id INTEGER NOT NULL REFERENCES manufacturer(id),
                    PRIMARY KEY (unit_id, manufacturer_id)
                );

                CREATE TABLE IF NOT EXISTS factory (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                );

                CREATE TABLE IF NOT EXISTS unit_factory (
                    unit_id INTEGER NOT NULL REFERENCES unit(id) ON DELETE CASCADE,
                    factory_id INTEGER NOT NULL REFERENCES factory(id),
                    PRIMARY KEY (unit_id, factory_id)
                );

                CREATE TABLE IF NOT EXISTS quirk (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    code TEXT NOT NULL UNIQUE
                );

                CREATE TABLE IF NOT EXISTS unit_quirk (
                    unit_id INTEGER NOT NULL REFERENCES unit(id) ON DELETE CASCADE,
                    quirk_id INTEGER NOT NULL REFERENCES quirk(id),
                    PRIMARY KEY (unit_id, quirk_id)
                );

                CREATE TABLE IF NOT EXISTS unit_system_manufacturer (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    unit_id INTEGER NOT NULL REFERENCES unit(id) ON DELETE CASCADE,
                    system_type TEXT NOT NULL,
                    manufacturer_name TEXT,
                    UNIQUE(unit_id, system_type)
                );

                CREATE TABLE IF NOT EXISTS unit_narrative (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    unit_id INTEGER NOT NULL UNIQUE REFERENCES unit(id) ON DELETE CASCADE,
                    overview TEXT,
                    capabilities TEXT,
                    deployment TEXT,
                    history TEXT,
                    notes TEXT
                );

                CREATE TABLE IF NOT EXISTS unit_armor (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    unit_id INTEGER NOT NULL REFERENCES unit(id) ON DELETE CASCADE,
                    location TEXT NOT NULL,
                    points INTEGER NOT NULL,
                    UNIQUE(unit_id, location)
                );

                CREATE TABLE IF NOT EXISTS loader_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    file_name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    message TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS enrichment_job (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    unit_kind TEXT NOT NULL,
                    name TEXT,
                    variant TEXT,
                    type_filter TEXT,
                    status TEXT NOT NULL DEFAULT 'pending',
                    attempts INTEGER NOT NULL DEFAULT 0,
                    last_error TEXT,
                    bv INTEGER,
                    pv INTEGER,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );
                "#,
            )?;

            self.mark_migration_applied("0002_unit_details")?;
            tracing::info!("SQLite: Applied migration 0002_unit_details");
        }

        self.conn.execute_batch(
            r#"
            CREATE INDEX IF NOT EXISTS idx_unit_name ON unit(name);
            CREATE INDEX IF NOT EXISTS idx_staging_row_category ON staging_row(category, resolved);
            CREATE INDEX IF NOT EXISTS idx_staging_row_token ON staging_row(normalized_token);
            CREATE INDEX IF NOT EXISTS idx_staging_row_file ON staging_row(file_name);
            CREATE INDEX IF NOT EXISTS idx_enrichment_job_status ON enrichment_job(status);
            "#,
        )?;

        Ok(())
    }

    fn count(&self, sql: &str) -> RepoResult<i64> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    /// Get a unit by id
    pub fn get_unit(&self, id: i64) -> RepoResult<Option<Unit>> {
        let sql = format!("SELECT {} FROM unit WHERE id = ?1", UNIT_SELECT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_unit)
            .optional()?)
    }

    /// Get a unit by its external id
    pub fn find_unit_by_external_id(&self, external_id: &str) -> RepoResult<Option<Unit>> {
        let sql = format!(
            "SELECT {} FROM unit WHERE external_id = ?1",
            UNIT_SELECT_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![external_id], row_to_unit)
            .optional()?)
    }

    /// List units ordered by name
    pub fn list_units(&self) -> RepoResult<Vec<Unit>> {
        let sql = format!("SELECT {} FROM unit ORDER BY name, id", UNIT_SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let units = stmt
            .query_map([], row_to_unit)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }

    /// Decode the spec map stored with a unit
    pub fn unit_specs(&self, unit_id: i64) -> RepoResult<BTreeMap<String, String>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT specs_json FROM unit WHERE id = ?1",
                params![unit_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(json
            .and_then(|j| serde_json::from_str(&j).ok())
            .unwrap_or_default())
    }

    /// Location names of a unit in document order
    pub fn unit_locations(&self, unit_id: i64) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM location WHERE unit_id = ?1 ORDER BY position_order, id",
        )?;
        let names = stmt
            .query_map(params![unit_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Armor points by location
    pub fn unit_armor(&self, unit_id: i64) -> RepoResult<Vec<(String, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT location, points FROM unit_armor WHERE unit_id = ?1 ORDER BY id")?;
        let armor = stmt
            .query_map(params![unit_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(armor)
    }

    /// Manufacturer names associated with a unit
    pub fn unit_manufacturers(&self, unit_id: i64) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.name FROM unit_manufacturer um
             JOIN manufacturer m ON m.id = um.manufacturer_id
             WHERE um.unit_id = ?1 ORDER BY m.name",
        )?;
        let names = stmt
            .query_map(params![unit_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Narrative section text of a unit, if any was recorded
    pub fn unit_narrative(&self, unit_id: i64, section: &str) -> RepoResult<Option<String>> {
        let column = match section {
            "overview" | "capabilities" | "deployment" | "history" | "notes" => section,
            other => return Err(RepoError::NotFound(format!("narrative section {}", other))),
        };
        let sql = format!("SELECT {} FROM unit_narrative WHERE unit_id = ?1", column);
        Ok(self
            .conn
            .query_row(&sql, params![unit_id], |row| row.get(0))
            .optional()?
            .flatten())
    }

    /// Staging rows in id order, optionally only those still unresolved
    pub fn staging_rows(&self, unresolved_only: bool) -> RepoResult<Vec<StagingRow>> {
        let filter = if unresolved_only {
            " WHERE resolved = 0"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM staging_row{} ORDER BY id",
            STAGING_SELECT_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_staging_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Staging rows written for one document
    pub fn staging_rows_for_document(&self, file_name: &str) -> RepoResult<Vec<StagingRow>> {
        let sql = format!(
            "SELECT {} FROM staging_row WHERE file_name = ?1 ORDER BY id",
            STAGING_SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![file_name], row_to_staging_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Slots of one unit location in index order
    pub fn slots_for_location(&self, unit_id: i64, location: &str) -> RepoResult<Vec<Slot>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.location_id, s.slot_index, s.raw_text, s.component_type_id, s.note
             FROM slot s JOIN location l ON l.id = s.location_id
             WHERE l.unit_id = ?1 AND l.name = ?2
             ORDER BY s.slot_index",
        )?;
        let slots = stmt
            .query_map(params![unit_id, location], row_to_slot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slots)
    }

    /// Weapon id mounted in a slot, if any
    pub fn slot_weapon(&self, slot_id: i64) -> RepoResult<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT weapon_id FROM weapon_instance WHERE slot_id = ?1",
                params![slot_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Unresolved tokens, most frequently seen first
    pub fn unresolved_tokens(&self, limit: usize) -> RepoResult<Vec<UnresolvedToken>> {
        let mut stmt = self.conn.prepare(
            "SELECT token, sample_raw, example_staging_id, seen_count, last_seen
             FROM unresolved_token
             ORDER BY seen_count DESC, token
             LIMIT ?1",
        )?;
        let tokens = stmt
            .query_map(params![limit as i64], |row| {
                Ok(UnresolvedToken {
                    token: row.get(0)?,
                    sample_raw: row.get(1)?,
                    example_staging_id: row.get(2)?,
                    seen_count: row.get(3)?,
                    last_seen: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tokens)
    }

    /// Append a loader log entry
    pub fn record_load(&self, file_name: &str, status: &str, message: Option<&str>) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO loader_log (file_name, status, message) VALUES (?1, ?2, ?3)",
            params![file_name, status, message],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent loader log entries first, optionally only those with `status`
    pub fn loader_log(&self, limit: usize, status: Option<&str>) -> RepoResult<Vec<LoaderLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_name, status, message, created_at
             FROM loader_log
             WHERE ?2 IS NULL OR status = ?2
             ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64, status], |row| {
                Ok(LoaderLogEntry {
                    id: row.get(0)?,
                    file_name: row.get(1)?,
                    status: row.get(2)?,
                    message: row.get(3)?,
                    created_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn stats(&self) -> RepoResult<DbStats> {
        Ok(DbStats {
            unit_count: self.count("SELECT COUNT(*) FROM unit")?,
            location_count: self.count("SELECT COUNT(*) FROM location")?,
            staging_count: self.count("SELECT COUNT(*) FROM staging_row")?,
            staging_resolved: self.count("SELECT COUNT(*) FROM staging_row WHERE resolved = 1")?,
            slot_count: self.count("SELECT COUNT(*) FROM slot")?,
            weapon_instance_count: self.count("SELECT COUNT(*) FROM weapon_instance")?,
            weapon_count: self.count("SELECT COUNT(*) FROM weapon")?,
            alias_count: self.count("SELECT COUNT(*) FROM weapon_alias")?,
            component_type_count: self.count("SELECT COUNT(*) FROM component_type")?,
            unresolved_token_count: self.count("SELECT COUNT(*) FROM unresolved_token")?,
            pending_job_count: self
                .count("SELECT COUNT(*) FROM enrichment_job WHERE status = 'pending'")?,
        })
    }
}

/// Catalog access over any connection, including an open transaction
impl CatalogRepository for Connection {
    fn find_weapon_by_name(&self, name: &str) -> RepoResult<Option<i64>> {
        Ok(self
            .query_row(
                "SELECT id FROM weapon WHERE lower(name) = lower(?1) ORDER BY id LIMIT 1",
                params![name.trim()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn find_weapon_by_alias(&self, alias: &str) -> RepoResult<Option<i64>> {
        Ok(self
            .query_row(
                "SELECT weapon_id FROM weapon_alias WHERE lower(alias) = lower(?1) LIMIT 1",
                params![alias.trim()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_or_create_weapon(
        &self,
        name: &str,
        category: Option<&str>,
        damage: Option<i64>,
    ) -> RepoResult<i64> {
        if let Some(id) = self.find_weapon_by_name(name)? {
            return Ok(id);
        }
        self.execute(
            "INSERT INTO weapon (name, category, damage) VALUES (?1, ?2, ?3)",
            params![name.trim(), category, damage],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn set_weapon_alias(&self, alias: &str, weapon_id: i64) -> RepoResult<()> {
        self.execute(
            "INSERT INTO weapon_alias (alias, weapon_id) VALUES (?1, ?2)
             ON CONFLICT(alias) DO UPDATE SET weapon_id = excluded.weapon_id",
            params![alias.trim(), weapon_id],
        )?;
        Ok(())
    }

    fn get_or_create_component_type(&self, name: &str, category: &str) -> RepoResult<i64> {
        self.execute(
            "INSERT INTO component_type (name, category) VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING",
            params![name, category],
        )?;
        Ok(self.query_row(
            "SELECT id FROM component_type WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?)
    }

    fn load_index(&self) -> RepoResult<CatalogIndex> {
        let mut stmt = self.prepare("SELECT name, id FROM weapon ORDER BY id")?;
        let names = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, i64)>, _>>()?;

        let mut stmt = self.prepare("SELECT alias, weapon_id FROM weapon_alias ORDER BY rowid")?;
        let aliases = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, i64)>, _>>()?;

        Ok(CatalogIndex::new(names, aliases))
    }
}

impl CatalogRepository for SqliteDb {
    fn find_weapon_by_name(&self, name: &str) -> RepoResult<Option<i64>> {
        self.conn.find_weapon_by_name(name)
    }

    fn find_weapon_by_alias(&self, alias: &str) -> RepoResult<Option<i64>> {
        self.conn.find_weapon_by_alias(alias)
    }

    fn get_or_create_weapon(
        &self,
        name: &str,
        category: Option<&str>,
        damage: Option<i64>,
    ) -> RepoResult<i64> {
        self.conn.get_or_create_weapon(name, category, damage)
    }

    fn set_weapon_alias(&self, alias: &str, weapon_id: i64) -> RepoResult<()> {
        self.conn.set_weapon_alias(alias, weapon_id)
    }

    fn get_or_create_component_type(&self, name: &str, category: &str) -> RepoResult<i64> {
        self.conn.get_or_create_component_type(name, category)
    }

    fn load_index(&self) -> RepoResult<CatalogIndex> {
        self.conn.load_index()
    }
}
