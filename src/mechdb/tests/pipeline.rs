//! End-to-end tests for the ingestion pipeline.
//!
//! Stage → Resolve → Finalize against a database file on disk.

use mechdb::jobs::EnrichmentKey;
use mechdb::{
    CatalogRepository, Document, EnrichmentMode, Grammar, JobQueue, JobStatus, Pipeline,
    PipelineConfig, SqliteDb, UnitKind,
};
use tempfile::TempDir;

const ATLAS: &str = "\
Version:1.0
chassis:Atlas
model:AS7-D
mul id:140
Config:Biped
techbase:Inner Sphere
era:2755
rules level:1
Manufacturer:Defiance Industries

Left Arm:
Shoulder
Upper Arm Actuator
Medium Laser
-Empty-

Right Torso:
Large Laser
- EMPTY -
Jump Jet
IS Ammo LRM-20

Center Torso:
Fusion Engine
Gyro
Heavy Gauss Rifle

overview:The Atlas is a walking fortress.
";

const DEMOLISHER: &str = "\
<Name>
Demolisher Heavy Tank
</Name>
<Model>
(Standard)
</Model>
<mul id:>
862
</mul id:>
<UnitType>
Tank
</UnitType>
<armor>
10
8
8
5
6
99
</armor>
<Turret Equipment>
Autocannon/20
Autocannon/20
</Turret Equipment>
<Body Equipment>
IS Ammo AC/20
</Body Equipment>
";

struct Fixture {
    _dir: TempDir,
    db: SqliteDb,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db = SqliteDb::open(dir.path().join("mechdb.db")).unwrap();
    db.init().unwrap();

    db.get_or_create_weapon("Medium Laser", Some("energy"), Some(5)).unwrap();
    db.get_or_create_weapon("Large Laser", Some("energy"), Some(8)).unwrap();
    let ac20 = db.get_or_create_weapon("AC/20", Some("ballistic"), Some(20)).unwrap();
    db.set_weapon_alias("Autocannon/20", ac20).unwrap();

    Fixture { _dir: dir, db }
}

fn documents() -> Vec<Document> {
    vec![
        Document::new("Atlas AS7-D.mtf", Grammar::Mtf, ATLAS),
        Document::new("Demolisher.blk", Grammar::Blk, DEMOLISHER),
    ]
}

#[test]
fn test_full_pipeline() {
    let f = fixture();
    let pipeline = Pipeline::new(&f.db, &PipelineConfig::default()).unwrap();

    let report = pipeline.ingest(documents()).unwrap();
    assert_eq!(report.documents_ingested, 2);
    assert_eq!(report.documents_failed, 0);
    assert_eq!(report.staging_rows, 11 + 3);

    let resolution = pipeline.resolve().unwrap();
    // weapons: medium laser, large laser, 2x autocannon/20
    // components: shoulder, upper arm actuator, jump jet, fusion engine, gyro
    // empties: -Empty-, - EMPTY -
    assert_eq!(resolution.newly_resolved, 4 + 5 + 2);
    assert_eq!(resolution.outstanding_tokens, 1);

    let finalized = pipeline.finalize().unwrap();
    assert_eq!(finalized.slots_created, 11);
    assert_eq!(finalized.weapon_instances_created, 4);

    let atlas = f.db.find_unit_by_external_id("140").unwrap().unwrap();
    assert_eq!(atlas.kind, UnitKind::Mech);
    assert_eq!(atlas.name, "Atlas");
    assert_eq!(atlas.rules_level, Some(1));
    assert_eq!(
        f.db.unit_locations(atlas.id).unwrap(),
        vec!["Left Arm", "Right Torso", "Center Torso"]
    );

    let right_torso = f.db.slots_for_location(atlas.id, "Right Torso").unwrap();
    let indices: Vec<i64> = right_torso.iter().map(|s| s.slot_index).collect();
    // ammo at index 4 stays staged
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(right_torso[1].note.as_deref(), Some("Empty"));

    let tank = f.db.find_unit_by_external_id("862").unwrap().unwrap();
    assert_eq!(tank.kind, UnitKind::Vehicle);
    let armor = f.db.unit_armor(tank.id).unwrap();
    assert_eq!(armor.len(), 5);
    assert_eq!(armor[4], ("turret".to_string(), 6));

    let classifier = pipeline.classifier();
    assert_eq!(classifier.classify("Heavy Gauss Rifle").category, mechdb::Category::Weapon);
    let unresolved = mechdb::ResolutionEngine::new(&f.db).top_unresolved(5).unwrap();
    assert_eq!(unresolved[0].token, "heavy gauss rifle");
}

#[test]
fn test_reruns_are_idempotent() {
    let f = fixture();
    let pipeline = Pipeline::new(&f.db, &PipelineConfig::default()).unwrap();
    pipeline.ingest(documents()).unwrap();

    assert!(pipeline.resolve().unwrap().newly_resolved > 0);
    assert_eq!(pipeline.resolve().unwrap().newly_resolved, 0);

    let first = pipeline.finalize().unwrap();
    let second = pipeline.finalize().unwrap();
    assert!(first.slots_created > 0);
    assert_eq!(second.slots_created, 0);
    assert_eq!(second.weapon_instances_created, 0);

    let stats = f.db.stats().unwrap();
    assert_eq!(stats.slot_count as usize, first.slots_created);
}

#[test]
fn test_reingest_reuses_units_and_slots() {
    let f = fixture();
    let pipeline = Pipeline::new(&f.db, &PipelineConfig::default()).unwrap();
    pipeline.ingest(documents()).unwrap();
    pipeline.resolve().unwrap();
    let first = pipeline.finalize().unwrap();

    let report = pipeline.ingest(documents()).unwrap();
    assert_eq!(report.units_reused, 2);
    pipeline.resolve().unwrap();
    let second = pipeline.finalize().unwrap();
    assert_eq!(second.slots_created, 0);

    let stats = f.db.stats().unwrap();
    assert_eq!(stats.unit_count, 2);
    assert_eq!(stats.slot_count as usize, first.slots_created);
    // both batches staged their rows
    assert_eq!(stats.staging_count, 28);
}

#[test]
fn test_unresolved_token_seen_count() {
    let f = fixture();
    let pipeline = Pipeline::new(&f.db, &PipelineConfig::default()).unwrap();
    let n = 4;
    let docs = (0..n).map(|i| {
        Document::new(
            format!("raven-{}.mtf", i),
            Grammar::Mtf,
            format!("chassis:Raven\nmul id:{}\nHead:\nNarc Missile Beacon\n", 500 + i),
        )
    });
    pipeline.ingest(docs).unwrap();
    pipeline.resolve().unwrap();

    let tokens = f.db.unresolved_tokens(10).unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token, "narc missile beacon");
    assert_eq!(tokens[0].seen_count, n);
}

#[test]
fn test_failed_document_is_rolled_back_and_logged() {
    let f = fixture();
    f.db.conn()
        .execute_batch(
            "CREATE TRIGGER reject_gyro BEFORE INSERT ON staging_row
             WHEN NEW.raw_text = 'Gyro'
             BEGIN SELECT RAISE(ABORT, 'gyro rejected'); END;",
        )
        .unwrap();

    let pipeline = Pipeline::new(&f.db, &PipelineConfig::default()).unwrap();
    let report = pipeline.ingest(documents()).unwrap();
    assert_eq!(report.documents_failed, 1);
    assert_eq!(report.documents_ingested, 1);
    assert_eq!(report.failures[0].name, "Atlas AS7-D.mtf");
    assert!(report.failures[0].message.contains("gyro rejected"));

    assert!(f.db.find_unit_by_external_id("140").unwrap().is_none());
    assert!(f.db.find_unit_by_external_id("862").unwrap().is_some());
    assert!(f.db.staging_rows_for_document("Atlas AS7-D.mtf").unwrap().is_empty());

    let log = f.db.loader_log(10, None).unwrap();
    let atlas_entry = log.iter().find(|e| e.file_name == "Atlas AS7-D.mtf").unwrap();
    assert_eq!(atlas_entry.status, "failed");
    let tank_entry = log.iter().find(|e| e.file_name == "Demolisher.blk").unwrap();
    assert_eq!(tank_entry.status, "ok");
}

#[test]
fn test_enrichment_queue_across_batches() {
    let f = fixture();
    let pipeline = Pipeline::new(&f.db, &PipelineConfig::default()).unwrap();
    pipeline.ingest(documents()).unwrap();
    pipeline.ingest(documents()).unwrap();

    let queue = JobQueue::new(f.db.conn());
    let pending = queue.list(Some(JobStatus::Pending)).unwrap();
    assert_eq!(pending.len(), 2);

    let atlas_key = EnrichmentKey {
        unit_kind: UnitKind::Mech,
        name: Some("Atlas".to_string()),
        variant: Some("AS7-D".to_string()),
        type_filter: None,
    };
    let (_, created) = queue.enqueue(&atlas_key).unwrap();
    assert!(!created);

    let skip = PipelineConfig {
        enrichment: EnrichmentMode::Skip,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(&f.db, &skip).unwrap();
    pipeline
        .ingest([Document::new("locust.mtf", Grammar::Mtf, "chassis:Locust\nmul id:9\n")])
        .unwrap();
    assert_eq!(queue.list(None).unwrap().len(), 2);
}
