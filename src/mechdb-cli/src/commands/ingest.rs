//! Batch ingestion of unit documents

use anyhow::{Context, Result};
use mechdb::{Document, Grammar, IngestReport, Pipeline, PipelineConfig};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::OutputFormat;

/// Every .mtf/.blk file under `path`, sorted. A file path is taken as-is.
pub fn collect_documents(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("{} is not a file or directory", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if entry.file_type().is_file() && Grammar::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Read all files; unreadable ones come back as (name, error)
fn read_documents(files: &[PathBuf]) -> (Vec<Document>, Vec<(String, std::io::Error)>) {
    let mut documents = Vec::with_capacity(files.len());
    let mut unreadable = Vec::new();
    for file in files {
        match std::fs::read(file) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                documents.push(Document::from_path(file, text));
            }
            Err(e) => unreadable.push((file.display().to_string(), e)),
        }
    }
    (documents, unreadable)
}

/// Handle `ingest`
pub fn handle(db: &Path, path: &Path, config: &PipelineConfig, format: OutputFormat) -> Result<()> {
    let files = collect_documents(path)?;
    if files.is_empty() {
        println!("No .mtf or .blk files found under {}", path.display());
        return Ok(());
    }

    let wdb = super::open_db(db)?;
    let pipeline = Pipeline::new(&wdb, config).context("Invalid classifier rules")?;

    tracing::info!(files = files.len(), path = %path.display(), "ingesting");
    let (documents, unreadable) = read_documents(&files);
    let mut report = pipeline.ingest(documents)?;
    for (name, err) in &unreadable {
        pipeline.record_read_failure(&mut report, name, err)?;
    }

    print_report(&report, format)
}

fn print_report(report: &IngestReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            println!("Ingestion Summary");
            println!("  Documents ingested: {}", report.documents_ingested);
            println!("  Documents failed:   {}", report.documents_failed);
            println!("  Staging rows:       {}", report.staging_rows);
            println!("  Units reused:       {}", report.units_reused);
            if !report.failures.is_empty() {
                println!();
                println!("Failures:");
                for failure in &report.failures {
                    println!("  {}: {}", failure.name, failure.message);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOCUST: &str = "chassis:Locust\nmodel:LCT-1V\nmul id:1\n\nLeft Arm:\nMachine Gun\n-Empty-\n";
    const SAVANNAH: &str = "<Name>\nSavannah Master Hovercraft\n</Name>\n<type>\nHovercraft\n</type>\n<Body Equipment>\nMedium Laser\n</Body Equipment>\n";

    #[test]
    fn test_collect_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("mechs")).unwrap();
        std::fs::write(dir.path().join("mechs").join("b.MTF"), LOCUST).unwrap();
        std::fs::write(dir.path().join("a.blk"), SAVANNAH).unwrap();
        std::fs::write(dir.path().join("readme.txt"), "ignore").unwrap();

        let files = collect_documents(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.blk", "b.MTF"]);
    }

    #[test]
    fn test_collect_missing_path() {
        assert!(collect_documents(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn test_ingest_directory() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("locust.mtf"), LOCUST).unwrap();
        std::fs::write(data.join("savannah.blk"), SAVANNAH).unwrap();
        let db = dir.path().join("mechdb.db");

        handle(&db, &data, &PipelineConfig::default(), OutputFormat::Table).unwrap();

        let wdb = super::super::open_db(&db).unwrap();
        let stats = wdb.stats().unwrap();
        assert_eq!(stats.unit_count, 2);
        assert_eq!(stats.staging_count, 3);
        assert_eq!(wdb.loader_log(10, None).unwrap().len(), 2);
    }

    #[test]
    fn test_read_documents_lossy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd.mtf");
        std::fs::write(&path, b"chassis:Odd\xff\nmodel:X\n").unwrap();
        let (docs, unreadable) = read_documents(&[path, dir.path().join("gone.mtf")]);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].text.contains('\u{FFFD}'));
        assert_eq!(docs[0].grammar, Grammar::Mtf);
        assert_eq!(unreadable.len(), 1);
    }
}
