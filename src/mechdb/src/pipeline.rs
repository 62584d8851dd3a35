//! Batch driver tying the phases together.
//!
//! [`Pipeline::ingest`] parses and stages documents one by one. A document
//! that fails to stage is rolled back, logged to `loader_log` and skipped;
//! the batch keeps going. Resolution and finalization are separate,
//! system-wide passes the caller runs after ingestion.

use crate::classify::Classifier;
use crate::config::{EnrichmentMode, PipelineConfig};
use crate::finalize::{FinalizeSummary, Finalizer};
use crate::parser::{self, Grammar};
use crate::repository::RepoResult;
use crate::resolve::{ResolutionEngine, ResolutionSummary};
use crate::sqlite::SqliteDb;
use crate::staging::{StagedUnit, StagingWriter};
use serde::Serialize;
use std::path::Path;

/// Loader log status for a staged document
pub const LOAD_OK: &str = "ok";
/// Loader log status for a document that could not be read or staged
pub const LOAD_FAILED: &str = "failed";

/// One source document
#[derive(Debug, Clone)]
pub struct Document {
    /// Name recorded on staging rows and in the loader log
    pub name: String,
    pub grammar: Grammar,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, grammar: Grammar, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grammar,
            text: text.into(),
        }
    }

    /// Build a document from a file path and its contents, detecting the
    /// grammar from the extension or the text.
    pub fn from_path(path: &Path, text: String) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let grammar = Grammar::detect(path, &text);
        Self {
            name,
            grammar,
            text,
        }
    }
}

/// A document that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub name: String,
    pub message: String,
}

/// Totals for one ingestion batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents_ingested: usize,
    pub documents_failed: usize,
    pub staging_rows: usize,
    pub units_reused: usize,
    pub failures: Vec<DocumentFailure>,
}

impl IngestReport {
    fn record_failure(&mut self, name: &str, message: String) {
        self.documents_failed += 1;
        self.failures.push(DocumentFailure {
            name: name.to_string(),
            message,
        });
    }
}

pub struct Pipeline<'a> {
    db: &'a SqliteDb,
    classifier: Classifier,
    enrichment: EnrichmentMode,
}

impl<'a> Pipeline<'a> {
    /// Build a pipeline. Fails if a configured classifier rule is invalid.
    pub fn new(db: &'a SqliteDb, config: &PipelineConfig) -> RepoResult<Self> {
        Ok(Self {
            db,
            classifier: config.build_classifier()?,
            enrichment: config.enrichment,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Parse and stage a single document without touching the loader log
    pub fn stage_document(&self, document: &Document) -> RepoResult<StagedUnit> {
        let parsed = parser::parse(&document.text, document.grammar);
        StagingWriter::new(self.db, &self.classifier)
            .with_enrichment(self.enrichment)
            .stage(&parsed, &document.name)
    }

    /// Stage every document, continuing past failures
    pub fn ingest<I>(&self, documents: I) -> RepoResult<IngestReport>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut report = IngestReport::default();

        for document in documents {
            match self.stage_document(&document) {
                Ok(staged) => {
                    self.db.record_load(&document.name, LOAD_OK, Some("ingested"))?;
                    report.documents_ingested += 1;
                    report.staging_rows += staged.staging_ids.len();
                    if staged.reused {
                        report.units_reused += 1;
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(document = %document.name, error = %message, "failed to stage document");
                    self.db
                        .record_load(&document.name, LOAD_FAILED, Some(&message))?;
                    report.record_failure(&document.name, message);
                }
            }
        }

        tracing::info!(
            ingested = report.documents_ingested,
            failed = report.documents_failed,
            rows = report.staging_rows,
            reused = report.units_reused,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Record a document the caller could not read
    pub fn record_read_failure(
        &self,
        report: &mut IngestReport,
        name: &str,
        error: &dyn std::fmt::Display,
    ) -> RepoResult<()> {
        let message = error.to_string();
        tracing::warn!(document = name, error = %message, "failed to read document");
        self.db.record_load(name, LOAD_FAILED, Some(&message))?;
        report.record_failure(name, message);
        Ok(())
    }

    pub fn resolve(&self) -> RepoResult<ResolutionSummary> {
        ResolutionEngine::new(self.db).run()
    }

    pub fn finalize(&self) -> RepoResult<FinalizeSummary> {
        Finalizer::new(self.db)
            .with_sentinels(self.classifier.sentinels().clone())
            .run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> SqliteDb {
        let db = SqliteDb::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn test_document_from_path() {
        let doc = Document::from_path(Path::new("units/Atlas AS7-D.mtf"), "chassis:Atlas".into());
        assert_eq!(doc.name, "Atlas AS7-D.mtf");
        assert_eq!(doc.grammar, Grammar::Mtf);
        let doc = Document::from_path(Path::new("units/odd.txt"), "<Name>\nX\n</Name>".into());
        assert_eq!(doc.grammar, Grammar::Blk);
    }

    #[test]
    fn test_ingest_logs_every_document() {
        let db = setup_db();
        let pipeline = Pipeline::new(&db, &PipelineConfig::default()).unwrap();
        let docs = vec![
            Document::new("a.mtf", Grammar::Mtf, "mul id:1\nHead:\nCockpit\n"),
            Document::new("b.mtf", Grammar::Mtf, "mul id:1\nHead:\nSensors\n"),
        ];
        let report = pipeline.ingest(docs).unwrap();
        assert_eq!(report.documents_ingested, 2);
        assert_eq!(report.units_reused, 1);
        assert_eq!(report.staging_rows, 2);
        assert!(report.failures.is_empty());

        let log = db.loader_log(10, None).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e.status == LOAD_OK));
    }

    #[test]
    fn test_read_failure_is_recorded() {
        let db = setup_db();
        let pipeline = Pipeline::new(&db, &PipelineConfig::default()).unwrap();
        let mut report = IngestReport::default();
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        pipeline.record_read_failure(&mut report, "locked.mtf", &err).unwrap();
        assert_eq!(report.documents_failed, 1);
        assert_eq!(report.failures[0].message, "denied");
        assert_eq!(db.loader_log(1, None).unwrap()[0].status, LOAD_FAILED);
    }
}
