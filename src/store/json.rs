//! Flat-file backend: the whole graph as one pretty-printed JSON document.
//!
//! Durability is whole-document replacement: persist serializes the working
//! graph to a sibling temp file and renames it over the target, so readers
//! see either the old document or the new one, never a partial write.

use std::fs;
use std::path::{Path, PathBuf};

use crate::entity::{Entity, EntityId};
use crate::error::{StoreError, StoreResult};
use crate::store::mem::{GraphData, GraphSnapshot};
use crate::store::{EntityFilter, GraphStats, GraphStore, TripletFilter, ensure_parent_dir};
use crate::triplet::{Triplet, TripletKey};

/// JSON-document graph store.
#[derive(Debug, Default)]
pub struct JsonStore {
    path: PathBuf,
    data: GraphData,
}

impl JsonStore {
    /// Create a store over the given document path. No I/O happens until
    /// [`GraphStore::load`] or [`GraphStore::persist`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: GraphData::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_err(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl GraphStore for JsonStore {
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
        ensure_parent_dir(&self.path)?;
        let json = serde_json::to_string_pretty(&self.data.to_snapshot()).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| Self::io_err(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| Self::io_err(&self.path, e))?;
        tracing::debug!(
            path = %self.path.display(),
            entities = self.data.entity_count(),
            triplets = self.data.triplet_count(),
            "persisted json store"
        );
        Ok(())
    }

    fn load(&mut self) -> StoreResult<()> {
        if !self.path.exists() {
            // First run: start from an empty graph.
            self.data = GraphData::new();
            return Ok(());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| Self::io_err(&self.path, e))?;
        let snapshot: GraphSnapshot =
            serde_json::from_str(&text).map_err(|e| StoreError::Serialization {
                message: e.to_string(),
            })?;
        self.data = GraphData::from_snapshot(snapshot)?;
        Ok(())
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}
