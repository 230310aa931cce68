//! Entity canonicalization: display names to stable identities.
//!
//! A [`Canonicalizer`] tracks which canonical id belongs to which entity type
//! and applies the first-writer-wins policy when two differently-typed names
//! collide on one id ("Phoenix" the place vs. "Phoenix" the company). The id
//! derivation itself lives in [`crate::entity::canonical_id`] and is pure;
//! this layer adds the type bookkeeping.
//!
//! Known limitation: two sources using the same name for the same type
//! resolve to one entity. The engine does not attempt to distinguish
//! same-named individuals beyond canonical naming.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::{EntityId, EntityType};

/// A non-fatal id collision between entity types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConflict {
    /// The contested canonical id.
    pub id: EntityId,
    /// Display name that triggered the collision.
    pub display_name: String,
    /// Type the id was first written with (kept).
    pub kept: EntityType,
    /// Type the colliding candidate asked for (rejected).
    pub rejected: EntityType,
}

/// Maps display names to canonical ids with first-writer-wins type resolution.
#[derive(Debug, Default)]
pub struct Canonicalizer {
    known: HashMap<EntityId, EntityType>,
    conflicts: Vec<TypeConflict>,
}

impl Canonicalizer {
    /// A canonicalizer with no known entities (fresh extraction batch).
    pub fn new() -> Self {
        Self::default()
    }

    /// A canonicalizer seeded with already-known `(id, type)` pairs,
    /// typically read from a persisted store before reconciliation.
    pub fn seeded(pairs: impl IntoIterator<Item = (EntityId, EntityType)>) -> Self {
        Self {
            known: pairs.into_iter().collect(),
            conflicts: Vec::new(),
        }
    }

    /// Resolve a display name + type hint to `(canonical id, governing type)`.
    ///
    /// Deterministic in the id: the same name always yields the same id. The
    /// returned type is the hint unless the id is already known under a
    /// different type, in which case the original type governs and the
    /// collision is recorded (retrievable via [`Canonicalizer::conflicts`]).
    pub fn canonicalize(&mut self, display_name: &str, kind: EntityType) -> (EntityId, EntityType) {
        let id = EntityId::derive(display_name);
        match self.known.get(&id) {
            None => {
                if !id.is_empty() {
                    self.known.insert(id.clone(), kind);
                }
                (id, kind)
            }
            Some(existing) if *existing == kind => (id, kind),
            Some(existing) => {
                let kept = *existing;
                warn!(
                    id = %id,
                    kept = %kept,
                    rejected = %kind,
                    "entity type collision, keeping first-written type"
                );
                self.conflicts.push(TypeConflict {
                    id: id.clone(),
                    display_name: display_name.to_string(),
                    kept,
                    rejected: kind,
                });
                (id, kept)
            }
        }
    }

    /// The type currently governing an id, if known.
    pub fn type_of(&self, id: &EntityId) -> Option<EntityType> {
        self.known.get(id).copied()
    }

    /// Collisions observed so far, in occurrence order.
    pub fn conflicts(&self) -> &[TypeConflict] {
        &self.conflicts
    }

    /// Drain the recorded collisions (for ingest reports).
    pub fn take_conflicts(&mut self) -> Vec<TypeConflict> {
        std::mem::take(&mut self.conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_type_reuses_id() {
        let mut canon = Canonicalizer::new();
        let (a, _) = canon.canonicalize("Will Wade", EntityType::Person);
        let (b, _) = canon.canonicalize("will_wade", EntityType::Person);
        assert_eq!(a, b);
        assert!(canon.conflicts().is_empty());
    }

    #[test]
    fn different_type_keeps_first_writer_and_reports() {
        let mut canon = Canonicalizer::new();
        let (a, kind_a) = canon.canonicalize("Phoenix", EntityType::Place);
        let (b, kind_b) = canon.canonicalize("Phoenix", EntityType::Organization);

        assert_eq!(a, b, "the id is still returned on conflict");
        assert_eq!(kind_a, EntityType::Place);
        assert_eq!(kind_b, EntityType::Place, "original type governs");

        let conflicts = canon.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kept, EntityType::Place);
        assert_eq!(conflicts[0].rejected, EntityType::Organization);
    }

    #[test]
    fn seeded_canonicalizer_sees_persisted_types() {
        let mut canon = Canonicalizer::seeded([(
            EntityId::derive("Ace Centre"),
            EntityType::Organization,
        )]);
        let (_, kind) = canon.canonicalize("ace centre", EntityType::Place);
        assert_eq!(kind, EntityType::Organization);
        assert_eq!(canon.conflicts().len(), 1);
    }

    #[test]
    fn take_conflicts_drains() {
        let mut canon = Canonicalizer::new();
        canon.canonicalize("Phoenix", EntityType::Place);
        canon.canonicalize("Phoenix", EntityType::Organization);
        assert_eq!(canon.take_conflicts().len(), 1);
        assert!(canon.conflicts().is_empty());
    }

    #[test]
    fn empty_derivations_are_not_remembered() {
        let mut canon = Canonicalizer::new();
        let (id, _) = canon.canonicalize("!!!", EntityType::Person);
        assert!(id.is_empty());
        let (_, kind) = canon.canonicalize("...", EntityType::Place);
        assert_eq!(kind, EntityType::Place, "empty ids never collide");
    }
}
