//! Merge reconciliation: extraction batches into a persisted graph.
//!
//! The default ingestion mode. Candidate entities resolve through a
//! [`Canonicalizer`] seeded from the store, so cross-ingestion type collisions
//! surface here; duplicate records union instead of duplicating. Replace-mode
//! ingestion bypasses nothing in this module — the pipeline clears the store
//! first and then merges into the empty graph.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canon::{Canonicalizer, TypeConflict};
use crate::error::StoreResult;
use crate::extract::ExtractionBatch;
use crate::store::{EntityFilter, GraphStore};

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub entities_added: usize,
    pub entities_merged: usize,
    pub triplets_added: usize,
    pub triplets_merged: usize,
    /// Cross-ingestion id collisions, resolved first-writer-wins.
    pub type_conflicts: Vec<TypeConflict>,
}

impl MergeReport {
    /// Fold another report's counts into this one (directory batches).
    pub fn absorb(&mut self, other: MergeReport) {
        self.entities_added += other.entities_added;
        self.entities_merged += other.entities_merged;
        self.triplets_added += other.triplets_added;
        self.triplets_merged += other.triplets_merged;
        self.type_conflicts.extend(other.type_conflicts);
    }
}

/// Merges extraction batches into a store with dedup semantics.
#[derive(Debug, Default)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    /// Reconcile one batch against the store's working graph.
    ///
    /// Entities: known ids union properties (incoming values overwrite) and
    /// keep the max confidence; type collisions keep the stored type and are
    /// reported. Triplets: known `(subject, predicate, object)` keys take the
    /// max confidence, the provenance union, and the earliest `createdAt`.
    /// Nothing is persisted here; the caller decides when the graph is
    /// durable.
    pub fn merge(
        &self,
        store: &mut dyn GraphStore,
        batch: ExtractionBatch,
    ) -> StoreResult<MergeReport> {
        let mut canon = Canonicalizer::seeded(
            store
                .find_entities(&EntityFilter::any())
                .into_iter()
                .map(|e| (e.id, e.kind)),
        );
        let mut report = MergeReport::default();
        let (entities, triplets) = batch.into_parts();

        for mut incoming in entities {
            let (id, kind) = canon.canonicalize(&incoming.display_name, incoming.kind);
            if id.is_empty() {
                continue;
            }
            incoming.id = id.clone();
            incoming.kind = kind;
            match store.get_entity(&id) {
                Some(mut existing) => {
                    existing.confidence = existing.confidence.max(incoming.confidence);
                    existing.properties.extend(incoming.properties);
                    store.add_entity(existing)?;
                    report.entities_merged += 1;
                }
                None => {
                    store.add_entity(incoming)?;
                    report.entities_added += 1;
                }
            }
        }

        for incoming in triplets {
            match store.get_triplet(&incoming.key()) {
                Some(mut existing) => {
                    existing.confidence = existing.confidence.max(incoming.confidence);
                    existing.provenance.extend(incoming.provenance);
                    existing.created_at = existing.created_at.min(incoming.created_at);
                    store.add_triplet(existing)?;
                    report.triplets_merged += 1;
                }
                None => {
                    store.add_triplet(incoming)?;
                    report.triplets_added += 1;
                }
            }
        }

        report.type_conflicts = canon.take_conflicts();
        debug!(
            entities_added = report.entities_added,
            entities_merged = report.entities_merged,
            triplets_added = report.triplets_added,
            triplets_merged = report.triplets_merged,
            conflicts = report.type_conflicts.len(),
            "reconciled batch"
        );
        Ok(report)
    }
}
