//! Battle-value enrichment job queue
//!
//! The lookups themselves run outside mechdb. These handlers let an external
//! worker claim jobs and report results back.

use anyhow::Result;
use mechdb::{EnrichmentJob, JobQueue, JobStatus};
use std::path::Path;

use super::truncate;

/// Handle `jobs list`
pub fn list(db: &Path, status: Option<JobStatus>) -> Result<()> {
    let wdb = super::open_db(db)?;
    let jobs = JobQueue::new(wdb.conn()).list(status)?;

    if jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }

    println!(
        "{:>5}  {:<10} {:<8} {:<28} {:<12} {:>3}  {}",
        "id", "status", "kind", "name", "variant", "try", "result"
    );
    println!("{}", "-".repeat(84));
    for job in &jobs {
        println!(
            "{:>5}  {:<10} {:<8} {:<28} {:<12} {:>3}  {}",
            job.id,
            job.status,
            job.key.unit_kind,
            truncate(job.key.name.as_deref().unwrap_or("-"), 28),
            truncate(job.key.variant.as_deref().unwrap_or("-"), 12),
            job.attempts,
            outcome(job)
        );
    }
    Ok(())
}

fn outcome(job: &EnrichmentJob) -> String {
    match job.status {
        JobStatus::Done => format!(
            "bv={} pv={}",
            job.bv.map_or("-".to_string(), |v| v.to_string()),
            job.pv.map_or("-".to_string(), |v| v.to_string())
        ),
        JobStatus::Failed => job.last_error.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Handle `jobs claim`
pub fn claim(db: &Path, limit: usize) -> Result<()> {
    let wdb = super::open_db(db)?;
    let jobs = JobQueue::new(wdb.conn()).claim_next(limit)?;
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

/// Handle `jobs complete`
pub fn complete(db: &Path, id: i64, bv: Option<i64>, pv: Option<i64>) -> Result<()> {
    let wdb = super::open_db(db)?;
    let updated = JobQueue::new(wdb.conn()).complete(id, bv, pv)?;
    println!("Job {} done, {} unit(s) updated", id, updated);
    Ok(())
}

/// Handle `jobs fail`
pub fn fail(db: &Path, id: i64, error: &str) -> Result<()> {
    let wdb = super::open_db(db)?;
    JobQueue::new(wdb.conn()).fail(id, error)?;
    println!("Job {} marked failed", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechdb::{Document, Grammar, Pipeline, PipelineConfig};
    use tempfile::TempDir;

    fn db_with_job(dir: &TempDir) -> std::path::PathBuf {
        let db = dir.path().join("mechdb.db");
        let wdb = super::super::open_db(&db).unwrap();
        let pipeline = Pipeline::new(&wdb, &PipelineConfig::default()).unwrap();
        pipeline
            .ingest(vec![Document::new(
                "wasp.mtf",
                Grammar::Mtf,
                "chassis:Wasp\nmodel:WSP-1A\nmul id:3\n",
            )])
            .unwrap();
        db
    }

    #[test]
    fn test_claim_then_complete() {
        let dir = TempDir::new().unwrap();
        let db = db_with_job(&dir);

        claim(&db, 5).unwrap();
        complete(&db, 1, Some(386), Some(12)).unwrap();
        list(&db, None).unwrap();

        let wdb = super::super::open_db(&db).unwrap();
        let job = JobQueue::new(wdb.conn()).get(1).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.attempts, 1);
        let unit = wdb.find_unit_by_external_id("3").unwrap().unwrap();
        assert_eq!(unit.bv, Some(386));
    }

    #[test]
    fn test_fail_unknown_job() {
        let dir = TempDir::new().unwrap();
        let db = db_with_job(&dir);
        assert!(fail(&db, 99, "timeout").is_err());
        fail(&db, 1, "timeout").unwrap();
        list(&db, Some(JobStatus::Failed)).unwrap();
    }
}
