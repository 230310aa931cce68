//! Relational backend: entities and triplets tables in one SQLite file.
//!
//! The working graph lives in memory like the flat-file backend; persist
//! rewrites both tables inside a single transaction, so the database always
//! holds a complete graph state. `position` keeps triplet insertion order
//! across the rewrite (entities reload in `rowid` order).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::entity::{Entity, EntityId, EntityType};
use crate::error::{StoreError, StoreResult};
use crate::store::mem::GraphData;
use crate::store::{EntityFilter, GraphStats, GraphStore, TripletFilter, ensure_parent_dir};
use crate::triplet::{Predicate, Provenance, Triplet, TripletKey};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    id              TEXT PRIMARY KEY,
    type            TEXT NOT NULL,
    display_name    TEXT NOT NULL,
    properties_json TEXT NOT NULL,
    confidence      REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS triplets (
    subject_id      TEXT NOT NULL,
    predicate       TEXT NOT NULL,
    object_id       TEXT NOT NULL,
    confidence      REAL NOT NULL,
    provenance_json TEXT NOT NULL,
    created_at      INTEGER NOT NULL,
    position        INTEGER NOT NULL,
    PRIMARY KEY (subject_id, predicate, object_id)
);

CREATE INDEX IF NOT EXISTS idx_triplets_subject ON triplets(subject_id, predicate);
CREATE INDEX IF NOT EXISTS idx_triplets_object ON triplets(object_id, predicate);
"#;

/// SQLite-file graph store.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
    data: GraphData,
}

impl SqliteStore {
    /// Open or create the database file and ensure the schema exists.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let conn = Connection::open(&path).map_err(Self::sqlite_err)?;
        let store = Self {
            conn,
            path,
            data: GraphData::new(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// An in-memory database, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(Self::sqlite_err)?;
        let store = Self {
            conn,
            path: PathBuf::from(":memory:"),
            data: GraphData::new(),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA).map_err(Self::sqlite_err)
    }

    fn sqlite_err(e: rusqlite::Error) -> StoreError {
        StoreError::Sqlite {
            message: e.to_string(),
        }
    }

    fn serde_err(e: serde_json::Error) -> StoreError {
        StoreError::Serialization {
            message: e.to_string(),
        }
    }
}

impl GraphStore for SqliteStore {
    fn add_entity(&mut self, entity: Entity) -> StoreResult<EntityId> {
        self.data.add_entity(entity)
    }

    fn get_entity(&self, id: &EntityId) -> Option<Entity> {
        self.data.get_entity(id)
    }

    fn find_entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        self.data.find_entities(filter)
    }

    fn add_triplet(&mut self, triplet: Triplet) -> StoreResult<()> {
        self.data.add_triplet(triplet)
    }

    fn get_triplet(&self, key: &TripletKey) -> Option<Triplet> {
        self.data.get_triplet(key)
    }

    fn find_triplets(&self, filter: &TripletFilter) -> Vec<Triplet> {
        self.data.find_triplets(filter)
    }

    fn statistics(&self) -> GraphStats {
        self.data.statistics()
    }

    fn entity_count(&self) -> usize {
        self.data.entity_count()
    }

    fn triplet_count(&self) -> usize {
        self.data.triplet_count()
    }

    fn persist(&mut self) -> StoreResult<()> {
        let snapshot = self.data.to_snapshot();
        let tx = self.conn.transaction().map_err(Self::sqlite_err)?;
        tx.execute("DELETE FROM triplets", []).map_err(Self::sqlite_err)?;
        tx.execute("DELETE FROM entities", []).map_err(Self::sqlite_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO entities (id, type, display_name, properties_json, confidence) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(Self::sqlite_err)?;
            for entity in &snapshot.entities {
                let properties =
                    serde_json::to_string(&entity.properties).map_err(Self::serde_err)?;
                stmt.execute(params![
                    entity.id.as_str(),
                    entity.kind.as_str(),
                    entity.display_name,
                    properties,
                    f64::from(entity.confidence),
                ])
                .map_err(Self::sqlite_err)?;
            }
        }
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO triplets (subject_id, predicate, object_id, confidence, \
                     provenance_json, created_at, position) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(Self::sqlite_err)?;
            for (position, triplet) in snapshot.triplets.iter().enumerate() {
                let provenance =
                    serde_json::to_string(&triplet.provenance).map_err(Self::serde_err)?;
                stmt.execute(params![
                    triplet.subject_id.as_str(),
                    triplet.predicate.as_str(),
                    triplet.object_id.as_str(),
                    f64::from(triplet.confidence),
                    provenance,
                    triplet.created_at as i64,
                    position as i64,
                ])
                .map_err(Self::sqlite_err)?;
            }
        }
        tx.commit().map_err(Self::sqlite_err)?;
        tracing::debug!(
            path = %self.path.display(),
            entities = self.data.entity_count(),
            triplets = self.data.triplet_count(),
            "persisted sqlite store"
        );
        Ok(())
    }

    fn load(&mut self) -> StoreResult<()> {
        let mut data = GraphData::new();
        {
            let mut stmt = self
                .conn
                .prepare(
                    "SELECT id, type, display_name, properties_json, confidence \
                     FROM entities ORDER BY rowid",
                )
                .map_err(Self::sqlite_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, f64>(4)?,
                    ))
                })
                .map_err(Self::sqlite_err)?;
            for row in rows {
                let (id, kind, display_name, properties_json, confidence) =
                    row.map_err(Self::sqlite_err)?;
                let kind = kind
                    .parse::<EntityType>()
                    .map_err(|message| StoreError::Serialization { message })?;
                let properties: BTreeMap<String, String> =
                    serde_json::from_str(&properties_json).map_err(Self::serde_err)?;
                data.add_entity(Entity {
                    id: EntityId::from_raw(id),
                    kind,
                    display_name,
                    properties,
                    confidence: confidence as f32,
                })?;
            }
        }
        {
            let mut stmt = self
                .conn
                .prepare(
                    "SELECT subject_id, predicate, object_id, confidence, provenance_json, \
                     created_at FROM triplets ORDER BY position",
                )
                .map_err(Self::sqlite_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                })
                .map_err(Self::sqlite_err)?;
            for row in rows {
                let (subject, predicate, object, confidence, provenance_json, created_at) =
                    row.map_err(Self::sqlite_err)?;
                let provenance: BTreeSet<Provenance> =
                    serde_json::from_str(&provenance_json).map_err(Self::serde_err)?;
                data.add_triplet(Triplet {
                    subject_id: EntityId::from_raw(subject),
                    predicate: Predicate::from(predicate),
                    object_id: EntityId::from_raw(object),
                    confidence: confidence as f32,
                    provenance,
                    created_at: created_at as u64,
                })?;
            }
        }
        self.data = data;
        Ok(())
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .field("entities", &self.data.entity_count())
            .field("triplets", &self.data.triplet_count())
            .finish()
    }
}
