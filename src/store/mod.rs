//! Graph storage: the backend-agnostic contract and its two backends.
//!
//! A [`GraphStore`] owns the canonical entities and triplets. Both backends
//! keep the working graph in memory behind the shared [`mem::GraphData`] core
//! and differ only in the persistence medium:
//!
//! - [`JsonStore`] — one JSON document, atomically replaced on every persist
//! - [`SqliteStore`] — two tables rewritten inside one transaction
//!
//! There is no delete operation in the contract; the only destructive path is
//! [`GraphStore::clear`], used by replace-mode ingestion.

pub mod json;
pub mod mem;
pub mod sqlite;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityType};
use crate::error::StoreResult;
use crate::triplet::{Predicate, Triplet, TripletKey};

pub use json::JsonStore;
pub use sqlite::SqliteStore;

/// Entity query filter; an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    /// Restrict to one entity type.
    pub kind: Option<EntityType>,
    /// Case-insensitive substring match on the display name.
    pub name_pattern: Option<String>,
}

impl EntityFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: EntityType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = Some(pattern.into());
        self
    }

    pub(crate) fn matches(&self, entity: &Entity) -> bool {
        if let Some(kind) = self.kind {
            if entity.kind != kind {
                return false;
            }
        }
        if let Some(pattern) = &self.name_pattern {
            if !entity
                .display_name
                .to_lowercase()
                .contains(&pattern.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Triplet query filter; any subset of endpoints/predicate may be set.
#[derive(Debug, Clone, Default)]
pub struct TripletFilter {
    pub subject: Option<EntityId>,
    pub predicate: Option<Predicate>,
    pub object: Option<EntityId>,
}

impl TripletFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: EntityId) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_object(mut self, object: EntityId) -> Self {
        self.object = Some(object);
        self
    }

    pub(crate) fn matches(&self, triplet: &Triplet) -> bool {
        if let Some(subject) = &self.subject {
            if triplet.subject_id != *subject {
                return false;
            }
        }
        if let Some(predicate) = &self.predicate {
            if triplet.predicate != *predicate {
                return false;
            }
        }
        if let Some(object) = &self.object {
            if triplet.object_id != *object {
                return false;
            }
        }
        true
    }
}

/// Graph totals plus per-type and per-predicate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_entities: usize,
    pub total_triplets: usize,
    pub entity_types: BTreeMap<String, usize>,
    pub predicates: BTreeMap<String, usize>,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entities: {}", self.total_entities)?;
        writeln!(f, "Triplets: {}", self.total_triplets)?;
        if !self.entity_types.is_empty() {
            writeln!(f, "By entity type:")?;
            for (kind, count) in &self.entity_types {
                writeln!(f, "  {kind}: {count}")?;
            }
        }
        if !self.predicates.is_empty() {
            writeln!(f, "By predicate:")?;
            for (predicate, count) in &self.predicates {
                writeln!(f, "  {predicate}: {count}")?;
            }
        }
        Ok(())
    }
}

/// The backend-agnostic storage contract.
///
/// Writes go through [`add_entity`](GraphStore::add_entity) /
/// [`add_triplet`](GraphStore::add_triplet) against the in-memory working
/// graph; [`persist`](GraphStore::persist) makes the whole state durable
/// atomically. Reads never touch the medium and never mutate state.
pub trait GraphStore {
    /// Insert an entity, or overwrite the record in place when the id exists
    /// with the same type. A type mismatch is an error: ids keep the type
    /// they were first written with.
    fn add_entity(&mut self, entity: Entity) -> StoreResult<EntityId>;

    /// Look up one entity by canonical id.
    fn get_entity(&self, id: &EntityId) -> Option<Entity>;

    /// Entities matching the filter, in insertion order.
    fn find_entities(&self, filter: &EntityFilter) -> Vec<Entity>;

    /// Insert a triplet, or overwrite the record at its key's existing
    /// position. Fails with an integrity violation when either endpoint is
    /// not in the entity set; the store is left unchanged on failure.
    fn add_triplet(&mut self, triplet: Triplet) -> StoreResult<()>;

    /// Look up one triplet by its `(subject, predicate, object)` key.
    fn get_triplet(&self, key: &TripletKey) -> Option<Triplet>;

    /// Triplets matching the filter, in insertion order.
    fn find_triplets(&self, filter: &TripletFilter) -> Vec<Triplet>;

    /// Totals and per-type/per-predicate counts.
    fn statistics(&self) -> GraphStats;

    fn entity_count(&self) -> usize;

    fn triplet_count(&self) -> usize;

    /// Write the working graph to the backend's medium atomically.
    fn persist(&mut self) -> StoreResult<()>;

    /// Replace the working graph with the persisted state (empty when
    /// nothing was persisted yet).
    fn load(&mut self) -> StoreResult<()>;

    /// Drop the working graph. Nothing touches the medium until the next
    /// [`persist`](GraphStore::persist); this is the replace-mode entry
    /// point.
    fn clear(&mut self);
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Json,
    Sqlite,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Json => "json",
            Backend::Sqlite => "sqlite",
        }
    }

    /// Default file extension for this backend's store path.
    pub fn extension(&self) -> &'static str {
        match self {
            Backend::Json => "json",
            Backend::Sqlite => "db",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend \"{other}\" (expected json or sqlite)")),
        }
    }
}

/// Where and how a graph is stored.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: Backend,
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn new(backend: Backend, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }

    /// The store path, with the backend's extension appended when the
    /// configured path has none.
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.extension().is_some() {
            self.path.clone()
        } else {
            self.path.with_extension(self.backend.extension())
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Json,
            path: PathBuf::from("memory-graph"),
        }
    }
}

/// Open the configured backend and load its persisted state.
pub fn open_store(config: &StoreConfig) -> StoreResult<Box<dyn GraphStore>> {
    let path = config.resolved_path();
    match config.backend {
        Backend::Json => {
            let mut store = JsonStore::new(path);
            store.load()?;
            Ok(Box::new(store))
        }
        Backend::Sqlite => {
            let mut store = SqliteStore::open(path)?;
            store.load()?;
            Ok(Box::new(store))
        }
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| crate::error::StoreError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_from_str() {
        assert_eq!("json".parse::<Backend>().unwrap(), Backend::Json);
        assert_eq!(" SQLITE ".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert!("redis".parse::<Backend>().is_err());
    }

    #[test]
    fn config_appends_backend_extension() {
        let config = StoreConfig::new(Backend::Sqlite, "data/graph");
        assert_eq!(config.resolved_path(), PathBuf::from("data/graph.db"));

        let explicit = StoreConfig::new(Backend::Sqlite, "data/graph.sqlite3");
        assert_eq!(explicit.resolved_path(), PathBuf::from("data/graph.sqlite3"));
    }

    #[test]
    fn entity_filter_matches_kind_and_pattern() {
        let entity = Entity::new(EntityType::Person, "Will Wade");
        assert!(EntityFilter::any().matches(&entity));
        assert!(EntityFilter::any().with_kind(EntityType::Person).matches(&entity));
        assert!(!EntityFilter::any().with_kind(EntityType::Place).matches(&entity));
        assert!(EntityFilter::any().with_name_pattern("WADE").matches(&entity));
        assert!(!EntityFilter::any().with_name_pattern("daisy").matches(&entity));
    }

    #[test]
    fn triplet_filter_combines_fields() {
        let t = Triplet::new(
            EntityId::derive("a"),
            Predicate::Knows,
            EntityId::derive("b"),
        );
        assert!(TripletFilter::any().matches(&t));
        assert!(
            TripletFilter::any()
                .with_subject(EntityId::derive("a"))
                .with_predicate(Predicate::Knows)
                .matches(&t)
        );
        assert!(
            !TripletFilter::any()
                .with_predicate(Predicate::WorksAt)
                .matches(&t)
        );
    }

    #[test]
    fn stats_render_counts() {
        let stats = GraphStats {
            total_entities: 2,
            total_triplets: 1,
            entity_types: BTreeMap::from([("person".to_string(), 2)]),
            predicates: BTreeMap::from([("knows".to_string(), 1)]),
        };
        let text = stats.to_string();
        assert!(text.contains("Entities: 2"));
        assert!(text.contains("  knows: 1"));
    }
}
