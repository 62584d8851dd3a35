//! Unit Document Ingestion Library for BattleTech
//!
//! This library turns MTF (mech) and BLK (vehicle) unit documents into a
//! normalized SQLite database, linking free-text equipment lines to a
//! canonical weapon catalog.
//!
//! Ingestion runs in phases:
//!
//! 1. **Stage** - parse each document and write one staging row per
//!    equipment line ([`StagingWriter`], one transaction per document)
//! 2. **Resolve** - match staged weapon tokens against the catalog
//!    ([`ResolutionEngine`]) and count what stays unmatched
//! 3. **Finalize** - promote resolved rows into slots and weapon instances
//!    ([`Finalizer`])
//!
//! Every phase can be re-run safely.
//!
//! # Example
//!
//! ```no_run
//! use mechdb::{Document, Grammar, Pipeline, PipelineConfig, SqliteDb};
//!
//! let db = SqliteDb::open("mechdb.db").unwrap();
//! db.init().unwrap();
//!
//! let pipeline = Pipeline::new(&db, &PipelineConfig::default()).unwrap();
//! let text = std::fs::read_to_string("Atlas AS7-D.mtf").unwrap();
//! pipeline
//!     .ingest([Document::new("Atlas AS7-D.mtf", Grammar::Mtf, text)])
//!     .unwrap();
//! pipeline.resolve().unwrap();
//! pipeline.finalize().unwrap();
//! ```

pub mod classify;
pub mod config;
pub mod finalize;
pub mod jobs;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod repository;
pub mod resolve;
pub mod sqlite;
pub mod staging;
pub mod types;

// Re-export types
pub use types::*;

pub use classify::{Classifier, ClassifierRules, MatchKind, RuleSpec};
pub use config::{EnrichmentMode, PipelineConfig};
pub use finalize::{FinalizeSummary, Finalizer};
pub use jobs::{EnrichmentJob, EnrichmentKey, JobQueue};
pub use parser::{Grammar, ParsedUnit};
pub use pipeline::{Document, IngestReport, Pipeline};
pub use repository::{CatalogIndex, CatalogRepository, RepoError, RepoResult};
pub use resolve::{ResolutionEngine, ResolutionSummary};
pub use sqlite::{SqliteDb, DEFAULT_DB_PATH};
pub use staging::{StagedUnit, StagingWriter};
