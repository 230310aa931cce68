//! Persistence and backend-parity tests.
//!
//! Both storage backends hold the same in-memory graph and differ only in
//! how they put it on disk, so an ingest-reopen cycle must round-trip every
//! field through either one, and the two must answer queries identically.

use std::path::Path;

use kith::entity::{EntityId, EntityType};
use kith::pipeline::{IngestMode, Pipeline};
use kith::query::query_context;
use kith::store::{open_store, Backend, GraphStore, JsonStore, SqliteStore, StoreConfig};
use kith::triplet::{Predicate, TripletKey};

const SAMPLE: &str = "\
## 👤 Identity
- Name: Will Wade
- Lives in: Manchester

## 👥 People
- Daisy: SLT

## 🏢 Workplaces
- Ace Centre (2016-present)

## 🎉 Events & Memories
- \"CM 2023\" → met Daisy in Leeds

## 🌱 Interests
- sailing
";

fn sample_file(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("will.md");
    std::fs::write(&path, SAMPLE).unwrap();
    path
}

fn works_at_key() -> TripletKey {
    TripletKey {
        subject: EntityId::derive("Will Wade"),
        predicate: Predicate::WorksAt,
        object: EntityId::derive("Ace Centre"),
    }
}

#[test]
fn json_graph_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = sample_file(dir.path());
    let graph = dir.path().join("graph.json");

    let created_at;
    // First session: ingest and persist.
    {
        let mut pipeline = Pipeline::new(Box::new(JsonStore::new(&graph)));
        pipeline.ingest_file(&file, IngestMode::Merge).unwrap();
        created_at = pipeline.store().get_triplet(&works_at_key()).unwrap().created_at;
    }

    // Second session: reopen and verify every field came back.
    {
        let mut store = JsonStore::new(&graph);
        store.load().unwrap();
        assert_eq!(store.entity_count(), 8);
        assert_eq!(store.triplet_count(), 8);

        let ace = store.get_entity(&EntityId::derive("Ace Centre")).unwrap();
        assert_eq!(ace.kind, EntityType::Organization);
        assert_eq!(ace.properties.get("dateRange").map(String::as_str), Some("2016-present"));

        let works = store.get_triplet(&works_at_key()).unwrap();
        assert_eq!(works.confidence, 0.8);
        assert_eq!(works.created_at, created_at);
        assert!(works
            .provenance
            .iter()
            .any(|p| p.source == "will.md" && p.rule == "workplaces.works_at"));
    }
}

#[test]
fn sqlite_graph_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = sample_file(dir.path());
    let graph = dir.path().join("graph.db");

    let created_at;
    // First session: ingest and persist.
    {
        let store = SqliteStore::open(&graph).unwrap();
        let mut pipeline = Pipeline::new(Box::new(store));
        pipeline.ingest_file(&file, IngestMode::Merge).unwrap();
        created_at = pipeline.store().get_triplet(&works_at_key()).unwrap().created_at;
    }

    // Second session: reopen and verify every field came back.
    {
        let mut store = SqliteStore::open(&graph).unwrap();
        store.load().unwrap();
        assert_eq!(store.entity_count(), 8);
        assert_eq!(store.triplet_count(), 8);

        let daisy = store.get_entity(&EntityId::derive("Daisy")).unwrap();
        assert_eq!(daisy.kind, EntityType::Person);

        let works = store.get_triplet(&works_at_key()).unwrap();
        assert_eq!(works.confidence, 0.8);
        assert_eq!(works.created_at, created_at);
        assert!(works
            .provenance
            .iter()
            .any(|p| p.source == "will.md" && p.rule == "workplaces.works_at"));
    }
}

#[test]
fn backends_agree_on_query_results() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = sample_file(dir.path());

    let mut json_pipeline = Pipeline::new(Box::new(JsonStore::new(dir.path().join("graph.json"))));
    json_pipeline.ingest_file(&file, IngestMode::Merge).unwrap();

    let sqlite = SqliteStore::open(dir.path().join("graph.db")).unwrap();
    let mut sqlite_pipeline = Pipeline::new(Box::new(sqlite));
    sqlite_pipeline.ingest_file(&file, IngestMode::Merge).unwrap();

    // Reopen both from disk so the comparison covers persistence too.
    let mut json_store = JsonStore::new(dir.path().join("graph.json"));
    json_store.load().unwrap();
    let mut sqlite_store = SqliteStore::open(dir.path().join("graph.db")).unwrap();
    sqlite_store.load().unwrap();

    let stats_json = serde_json::to_value(json_store.statistics()).unwrap();
    let stats_sqlite = serde_json::to_value(sqlite_store.statistics()).unwrap();
    assert_eq!(stats_json, stats_sqlite);

    for name in ["Will Wade", "Daisy", "Ace Centre"] {
        let from_json = query_context(&json_store, name).unwrap();
        let from_sqlite = query_context(&sqlite_store, name).unwrap();
        assert_eq!(
            serde_json::to_value(&from_json).unwrap(),
            serde_json::to_value(&from_sqlite).unwrap(),
            "context for {name} differs between backends"
        );
    }
}

#[test]
fn replace_mode_persists_through_sqlite() {
    let daisy_only = "\
## 👤 Identity
- Name: Daisy
- Lives in: Leeds
";
    let dir = tempfile::TempDir::new().unwrap();
    let will = sample_file(dir.path());
    let daisy = dir.path().join("daisy.md");
    std::fs::write(&daisy, daisy_only).unwrap();
    let graph = dir.path().join("graph.db");

    {
        let store = SqliteStore::open(&graph).unwrap();
        let mut pipeline = Pipeline::new(Box::new(store));
        pipeline.ingest_file(&will, IngestMode::Merge).unwrap();
        pipeline.ingest_file(&daisy, IngestMode::Replace).unwrap();
    }

    let mut store = SqliteStore::open(&graph).unwrap();
    store.load().unwrap();
    assert_eq!(store.entity_count(), 2);
    assert!(store.get_entity(&EntityId::derive("Will Wade")).is_none());
    assert!(store.get_entity(&EntityId::derive("Daisy")).is_some());
}

#[test]
fn open_store_appends_the_backend_extension() {
    let dir = tempfile::TempDir::new().unwrap();

    let json_config = StoreConfig::new(Backend::Json, dir.path().join("graph"));
    let mut store = open_store(&json_config).unwrap();
    store.persist().unwrap();
    assert!(dir.path().join("graph.json").exists());

    let sqlite_config = StoreConfig::new(Backend::Sqlite, dir.path().join("graph"));
    let store = open_store(&sqlite_config).unwrap();
    drop(store);
    assert!(dir.path().join("graph.db").exists());

    // An explicit extension is left alone.
    let explicit = StoreConfig::new(Backend::Json, dir.path().join("custom.json"));
    let mut store = open_store(&explicit).unwrap();
    store.persist().unwrap();
    assert!(dir.path().join("custom.json").exists());
}

#[test]
fn json_document_shape_is_stable() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = sample_file(dir.path());
    let graph = dir.path().join("graph.json");

    let mut pipeline = Pipeline::new(Box::new(JsonStore::new(&graph)));
    pipeline.ingest_file(&file, IngestMode::Merge).unwrap();

    let text = std::fs::read_to_string(&graph).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();

    let entities = doc["entities"].as_array().unwrap();
    let triplets = doc["triplets"].as_array().unwrap();
    assert_eq!(entities.len(), 8);
    assert_eq!(triplets.len(), 8);

    let entity = &entities[0];
    for key in ["id", "type", "displayName", "properties", "confidence"] {
        assert!(entity.get(key).is_some(), "entity is missing {key}");
    }
    let triplet = &triplets[0];
    for key in ["subjectId", "predicate", "objectId", "confidence", "provenance", "createdAt"] {
        assert!(triplet.get(key).is_some(), "triplet is missing {key}");
    }
}
