//! The in-memory working graph shared by every backend.
//!
//! [`GraphData`] keeps entities and triplets in insertion order with id/key
//! indices and subject/object adjacency lists on top. Backends delegate all
//! graph semantics here and add only their persistence medium, which keeps
//! upsert and integrity behavior identical across backends.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::error::{StoreError, StoreResult};
use crate::store::{EntityFilter, GraphStats, TripletFilter};
use crate::triplet::{Triplet, TripletKey};

/// Insertion-ordered entity and triplet tables with lookup indices.
#[derive(Debug, Default)]
pub struct GraphData {
    entities: Vec<Entity>,
    entity_index: HashMap<EntityId, usize>,
    triplets: Vec<Triplet>,
    triplet_index: HashMap<TripletKey, usize>,
    by_subject: HashMap<EntityId, Vec<usize>>,
    by_object: HashMap<EntityId, Vec<usize>>,
}

impl GraphData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entity.
    ///
    /// An existing id keeps its position and its type: re-adding with the
    /// same type replaces the record in place, re-adding with a different
    /// type fails and leaves the graph unchanged.
    pub fn add_entity(&mut self, entity: Entity) -> StoreResult<EntityId> {
        let id = entity.id.clone();
        match self.entity_index.get(&id) {
            Some(&pos) => {
                let existing = &self.entities[pos];
                if existing.kind != entity.kind {
                    return Err(StoreError::TypeConflict {
                        id: id.to_string(),
                        existing: existing.kind.to_string(),
                        incoming: entity.kind.to_string(),
                    });
                }
                self.entities[pos] = entity;
            }
            None => {
                self.entity_index.insert(id.clone(), self.entities.len());
                self.entities.push(entity);
            }
        }
        Ok(id)
    }

    pub fn get_entity(&self, id: &EntityId) -> Option<Entity> {
        self.entity_index.get(id).map(|&pos| self.entities[pos].clone())
    }

    pub fn contains_entity(&self, id: &EntityId) -> bool {
        self.entity_index.contains_key(id)
    }

    pub fn find_entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// Insert or overwrite a triplet.
    ///
    /// Both endpoints must already exist as entities; on violation the graph
    /// is unchanged. An existing `(subject, predicate, object)` key keeps its
    /// position and is replaced in place. Merge semantics (max confidence,
    /// provenance union, earliest timestamp) belong to the reconciler, not
    /// the store.
    pub fn add_triplet(&mut self, triplet: Triplet) -> StoreResult<()> {
        for endpoint in [&triplet.subject_id, &triplet.object_id] {
            if !self.entity_index.contains_key(endpoint) {
                return Err(StoreError::IntegrityViolation {
                    subject: triplet.subject_id.to_string(),
                    predicate: triplet.predicate.to_string(),
                    object: triplet.object_id.to_string(),
                    missing: endpoint.to_string(),
                });
            }
        }
        let key = triplet.key();
        match self.triplet_index.get(&key) {
            Some(&pos) => {
                // Same key means same endpoints, so adjacency stays valid.
                self.triplets[pos] = triplet;
            }
            None => {
                let pos = self.triplets.len();
                self.by_subject
                    .entry(triplet.subject_id.clone())
                    .or_default()
                    .push(pos);
                self.by_object
                    .entry(triplet.object_id.clone())
                    .or_default()
                    .push(pos);
                self.triplet_index.insert(key, pos);
                self.triplets.push(triplet);
            }
        }
        Ok(())
    }

    pub fn get_triplet(&self, key: &TripletKey) -> Option<Triplet> {
        self.triplet_index.get(key).map(|&pos| self.triplets[pos].clone())
    }

    /// Filtered triplets in insertion order, using the adjacency lists when
    /// an endpoint is pinned.
    pub fn find_triplets(&self, filter: &TripletFilter) -> Vec<Triplet> {
        let narrowed = match (&filter.subject, &filter.object) {
            (Some(subject), _) => self.by_subject.get(subject),
            (None, Some(object)) => self.by_object.get(object),
            (None, None) => None,
        };
        match narrowed {
            // Adjacency lists are appended in insertion order.
            Some(positions) => positions
                .iter()
                .map(|&pos| &self.triplets[pos])
                .filter(|t| filter.matches(t))
                .cloned()
                .collect(),
            None if filter.subject.is_some() || filter.object.is_some() => Vec::new(),
            None => self
                .triplets
                .iter()
                .filter(|t| filter.matches(t))
                .cloned()
                .collect(),
        }
    }

    pub fn statistics(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_entities: self.entities.len(),
            total_triplets: self.triplets.len(),
            ..GraphStats::default()
        };
        for entity in &self.entities {
            *stats.entity_types.entry(entity.kind.to_string()).or_insert(0) += 1;
        }
        for triplet in &self.triplets {
            *stats.predicates.entry(triplet.predicate.to_string()).or_insert(0) += 1;
        }
        stats
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn triplet_count(&self) -> usize {
        self.triplets.len()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.entity_index.clear();
        self.triplets.clear();
        self.triplet_index.clear();
        self.by_subject.clear();
        self.by_object.clear();
    }

    /// Copy the graph into its serializable form, preserving order.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            entities: self.entities.clone(),
            triplets: self.triplets.clone(),
        }
    }

    /// Rebuild a graph from a snapshot through the checked insert paths, so
    /// a hand-edited or corrupt file fails with the same integrity errors a
    /// live write would.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> StoreResult<Self> {
        let mut data = GraphData::new();
        for entity in snapshot.entities {
            data.add_entity(entity)?;
        }
        for triplet in snapshot.triplets {
            data.add_triplet(triplet)?;
        }
        Ok(data)
    }
}

/// Serializable whole-graph state: what backends persist and reload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub triplets: Vec<Triplet>,
}
