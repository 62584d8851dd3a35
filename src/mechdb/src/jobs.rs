//! Battle-value enrichment job queue.
//!
//! Staging queues one lookup per unit; an external worker claims jobs,
//! fetches BV/PV from a third-party service and reports back through
//! [`JobQueue::complete`] or [`JobQueue::fail`]. Nothing else in the
//! pipeline depends on these jobs.

use crate::parser::ParsedUnit;
use crate::repository::{RepoError, RepoResult};
use crate::sqlite::parse_text_column;
use crate::types::{JobStatus, UnitKind};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Identity of a lookup. Two jobs with equal keys are the same lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentKey {
    pub unit_kind: UnitKind,
    pub name: Option<String>,
    pub variant: Option<String>,
    pub type_filter: Option<String>,
}

impl EnrichmentKey {
    /// Key for a parsed unit: chassis and model, plus the unit type for vehicles.
    /// `None` when the document declares no name; there is nothing to look up.
    pub fn for_unit(unit: &ParsedUnit) -> Option<Self> {
        let name = unit.declared_name()?;
        let type_filter = match unit.kind {
            UnitKind::Mech => None,
            UnitKind::Vehicle => unit.fields.unit_type.clone(),
        };
        Some(Self {
            unit_kind: unit.kind,
            name: Some(name.to_string()),
            variant: unit.fields.model.clone(),
            type_filter,
        })
    }
}

/// A queued lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentJob {
    pub id: i64,
    pub key: EnrichmentKey,
    pub status: JobStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub bv: Option<i64>,
    pub pv: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

const JOB_SELECT_COLUMNS: &str = "id, unit_kind, name, variant, type_filter, status, attempts, \
     last_error, bv, pv, created_at, updated_at";

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<EnrichmentJob> {
    Ok(EnrichmentJob {
        id: row.get(0)?,
        key: EnrichmentKey {
            unit_kind: parse_text_column(row, 1)?,
            name: row.get(2)?,
            variant: row.get(3)?,
            type_filter: row.get(4)?,
        },
        status: parse_text_column(row, 5)?,
        attempts: row.get(6)?,
        last_error: row.get(7)?,
        bv: row.get(8)?,
        pv: row.get(9)?,
        created_at: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
    })
}

/// Queue over any connection or open transaction
pub struct JobQueue<'a> {
    conn: &'a Connection,
}

impl<'a> JobQueue<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Queue a lookup unless an equal key is already pending, processing or
    /// done. Returns the job id and whether a new job was created.
    pub fn enqueue(&self, key: &EnrichmentKey) -> RepoResult<(i64, bool)> {
        // IS compares NULLs as equal
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM enrichment_job
                 WHERE unit_kind = ?1 AND name IS ?2 AND variant IS ?3 AND type_filter IS ?4
                   AND status IN ('pending', 'processing', 'done')
                 ORDER BY id LIMIT 1",
                params![
                    key.unit_kind.to_string(),
                    key.name,
                    key.variant,
                    key.type_filter
                ],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok((id, false));
        }

        self.conn.execute(
            "INSERT INTO enrichment_job (unit_kind, name, variant, type_filter, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.unit_kind.to_string(),
                key.name,
                key.variant,
                key.type_filter,
                JobStatus::Pending.to_string()
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(job = id, name = ?key.name, variant = ?key.variant, "queued enrichment job");
        Ok((id, true))
    }

    pub fn get(&self, id: i64) -> RepoResult<Option<EnrichmentJob>> {
        let sql = format!("SELECT {} FROM enrichment_job WHERE id = ?1", JOB_SELECT_COLUMNS);
        Ok(self.conn.query_row(&sql, params![id], row_to_job).optional()?)
    }

    /// Jobs in id order, optionally filtered by status
    pub fn list(&self, status: Option<JobStatus>) -> RepoResult<Vec<EnrichmentJob>> {
        let mut sql = format!("SELECT {} FROM enrichment_job", JOB_SELECT_COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(status) = status {
            sql.push_str(" WHERE status = ?1");
            params_vec.push(Box::new(status.to_string()));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let jobs = stmt
            .query_map(params_refs.as_slice(), row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    /// Move up to `limit` pending jobs to processing, oldest first
    pub fn claim_next(&self, limit: usize) -> RepoResult<Vec<EnrichmentJob>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM enrichment_job WHERE status = 'pending' ORDER BY id LIMIT ?1",
        )?;
        let ids = stmt
            .query_map(params![limit as i64], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut claimed = Vec::with_capacity(ids.len());
        for id in ids {
            let changed = self.conn.execute(
                "UPDATE enrichment_job
                 SET status = 'processing', attempts = attempts + 1,
                     updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1 AND status = 'pending'",
                params![id],
            )?;
            if changed == 1 {
                if let Some(job) = self.get(id)? {
                    claimed.push(job);
                }
            }
        }
        Ok(claimed)
    }

    /// Record a successful lookup and copy BV/PV onto the matching units.
    /// Returns the number of units updated. Both writes share one
    /// transaction, so this must not be called inside another one.
    pub fn complete(&self, id: i64, bv: Option<i64>, pv: Option<i64>) -> RepoResult<usize> {
        let job = self
            .get(id)?
            .ok_or_else(|| RepoError::NotFound(format!("enrichment job {}", id)))?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE enrichment_job
             SET status = 'done', bv = ?2, pv = ?3, last_error = NULL,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?1",
            params![id, bv, pv],
        )?;

        let updated = tx.execute(
            "UPDATE unit SET bv = COALESCE(?1, bv), pv = COALESCE(?2, pv)
             WHERE kind = ?3 AND name IS ?4 AND model IS ?5",
            params![
                bv,
                pv,
                job.key.unit_kind.to_string(),
                job.key.name,
                job.key.variant
            ],
        )?;
        tx.commit()?;

        tracing::debug!(job = id, units = updated, "completed enrichment job");
        Ok(updated)
    }

    /// Record a failed lookup
    pub fn fail(&self, id: i64, error: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE enrichment_job
             SET status = 'failed', last_error = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?1",
            params![id, error],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(format!("enrichment job {}", id)));
        }
        tracing::warn!(job = id, error, "enrichment job failed");
        Ok(())
    }
}
