//! Context queries: everything the graph knows about one entity.
//!
//! Lookups canonicalize the requested name the same way extraction does, so
//! `"Will Wade"`, `"will_wade"`, and `"WILL WADE"` resolve identically. An
//! entity with no relationships is a valid, empty result; an unknown name is
//! [`QueryError::NotFound`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityType};
use crate::error::{QueryError, QueryResult};
use crate::store::{GraphStore, TripletFilter};
use crate::triplet::Triplet;

/// A related entity as seen through one relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub display_name: String,
    /// Confidence of the connecting triplet, not of the entity.
    pub confidence: f32,
}

/// A bare entity reference for the deduplicated related list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub display_name: String,
}

/// Aggregated context for one entity.
///
/// `outgoing` groups triplets where the entity is subject, `incoming` those
/// where it is object, both keyed by predicate with targets in triplet
/// insertion order. `related` lists each directly connected entity once, in
/// first-seen order (outgoing targets before incoming sources).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResult {
    pub entity: Entity,
    pub outgoing: BTreeMap<String, Vec<RelatedEntity>>,
    pub incoming: BTreeMap<String, Vec<RelatedEntity>>,
    pub related: Vec<EntitySummary>,
}

/// Resolve a name or canonical id and assemble its context.
pub fn query_context(store: &dyn GraphStore, name_or_id: &str) -> QueryResult<ContextResult> {
    let id = EntityId::derive(name_or_id);
    let entity = store.get_entity(&id).ok_or_else(|| QueryError::NotFound {
        name: name_or_id.to_string(),
        canonical: id.to_string(),
    })?;

    let outgoing_triplets = store.find_triplets(&TripletFilter::any().with_subject(id.clone()));
    let incoming_triplets = store.find_triplets(&TripletFilter::any().with_object(id.clone()));

    let mut outgoing: BTreeMap<String, Vec<RelatedEntity>> = BTreeMap::new();
    let mut incoming: BTreeMap<String, Vec<RelatedEntity>> = BTreeMap::new();
    let mut related: Vec<EntitySummary> = Vec::new();
    let mut seen: HashSet<EntityId> = HashSet::new();

    let collect = |map: &mut BTreeMap<String, Vec<RelatedEntity>>,
                   related: &mut Vec<EntitySummary>,
                   seen: &mut HashSet<EntityId>,
                   triplet: &Triplet,
                   other_id: &EntityId| {
        // Integrity guarantees the endpoint exists; a miss just drops the row.
        let Some(other) = store.get_entity(other_id) else {
            return;
        };
        map.entry(triplet.predicate.to_string())
            .or_default()
            .push(RelatedEntity {
                id: other.id.clone(),
                kind: other.kind,
                display_name: other.display_name.clone(),
                confidence: triplet.confidence,
            });
        if seen.insert(other.id.clone()) {
            related.push(EntitySummary {
                id: other.id,
                kind: other.kind,
                display_name: other.display_name,
            });
        }
    };

    for triplet in &outgoing_triplets {
        let object_id = triplet.object_id.clone();
        collect(&mut outgoing, &mut related, &mut seen, triplet, &object_id);
    }
    for triplet in &incoming_triplets {
        let subject_id = triplet.subject_id.clone();
        collect(&mut incoming, &mut related, &mut seen, triplet, &subject_id);
    }

    Ok(ContextResult {
        entity,
        outgoing,
        incoming,
        related,
    })
}

impl fmt::Display for ContextResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.entity.display_name, self.entity.kind)?;
        writeln!(f, "Canonical id: {}", self.entity.id)?;
        if !self.entity.properties.is_empty() {
            writeln!(f, "Properties:")?;
            for (key, value) in &self.entity.properties {
                writeln!(f, "  {key}: {value}")?;
            }
        }
        if !self.outgoing.is_empty() {
            writeln!(f, "Outgoing:")?;
            for (predicate, targets) in &self.outgoing {
                writeln!(f, "  {predicate}:")?;
                for target in targets {
                    writeln!(
                        f,
                        "    {} ({}) @{:.2}",
                        target.display_name, target.kind, target.confidence
                    )?;
                }
            }
        }
        if !self.incoming.is_empty() {
            writeln!(f, "Incoming:")?;
            for (predicate, sources) in &self.incoming {
                writeln!(f, "  {predicate}:")?;
                for source in sources {
                    writeln!(
                        f,
                        "    {} ({}) @{:.2}",
                        source.display_name, source.kind, source.confidence
                    )?;
                }
            }
        }
        if self.outgoing.is_empty() && self.incoming.is_empty() {
            writeln!(f, "No relationships recorded.")?;
        }
        if !self.related.is_empty() {
            let names: Vec<&str> = self
                .related
                .iter()
                .map(|e| e.display_name.as_str())
                .collect();
            writeln!(f, "Related: {}", names.join(", "))?;
        }
        Ok(())
    }
}
