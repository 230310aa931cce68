//! Triplet extraction: normalized memory records to candidate batches.
//!
//! The extractor walks each section of a [`MemoryRecord`] and emits canonical
//! entity candidates plus provenance-tagged triplet candidates. Direct
//! statements carry confidence 1.0; anything a heuristic inferred carries 0.8.
//! The batch deduplicates internally, so re-mentioning a name or re-deriving
//! an edge merges instead of duplicating.

pub mod rules;

use std::collections::HashMap;

use tracing::warn;

use crate::canon::Canonicalizer;
use crate::entity::{Entity, EntityId, EntityType};
use crate::error::{ExtractError, ExtractResult};
use crate::record::MemoryRecord;
use crate::triplet::{Predicate, Provenance, Triplet, TripletKey};

use rules::rule_id;

/// Confidence for facts stated directly in the record.
pub const CONFIDENCE_DIRECT: f32 = 1.0;
/// Confidence for facts a heuristic inferred.
pub const CONFIDENCE_HEURISTIC: f32 = 0.8;

/// A deduplicated set of entity and triplet candidates from one record.
#[derive(Debug, Default, Clone)]
pub struct ExtractionBatch {
    entities: Vec<Entity>,
    entity_index: HashMap<EntityId, usize>,
    triplets: Vec<Triplet>,
    triplet_index: HashMap<TripletKey, usize>,
    unmatched_phrases: Vec<String>,
}

impl ExtractionBatch {
    /// Add an entity candidate; a repeat mention merges into the original
    /// (property union with incoming overwrite, confidence max).
    pub fn push_entity(&mut self, entity: Entity) {
        if entity.id.is_empty() {
            return;
        }
        match self.entity_index.get(&entity.id) {
            Some(&idx) => {
                let existing = &mut self.entities[idx];
                existing.confidence = existing.confidence.max(entity.confidence);
                existing.properties.extend(entity.properties);
            }
            None => {
                self.entity_index.insert(entity.id.clone(), self.entities.len());
                self.entities.push(entity);
            }
        }
    }

    /// Add a triplet candidate; a repeat `(subject, predicate, object)` key
    /// merges (confidence max, provenance union, earliest `createdAt`).
    pub fn push_triplet(&mut self, triplet: Triplet) {
        if triplet.subject_id.is_empty() || triplet.object_id.is_empty() {
            return;
        }
        match self.triplet_index.get(&triplet.key()) {
            Some(&idx) => {
                let existing = &mut self.triplets[idx];
                existing.confidence = existing.confidence.max(triplet.confidence);
                existing.provenance.extend(triplet.provenance);
                existing.created_at = existing.created_at.min(triplet.created_at);
            }
            None => {
                self.triplet_index.insert(triplet.key(), self.triplets.len());
                self.triplets.push(triplet);
            }
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    /// Phrases the rule table did not classify (kept as descriptions).
    pub fn unmatched_phrases(&self) -> &[String] {
        &self.unmatched_phrases
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.triplets.is_empty()
    }

    /// Consume the batch for writing into a store.
    pub fn into_parts(self) -> (Vec<Entity>, Vec<Triplet>) {
        (self.entities, self.triplets)
    }
}

/// Rule-based extractor over normalized memory records.
#[derive(Debug, Default)]
pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a candidate batch from one record.
    ///
    /// Fails only when the record has no subject name; everything else
    /// degrades to the `hasDescription` fallback rather than dropping input.
    pub fn extract(&self, record: &MemoryRecord) -> ExtractResult<ExtractionBatch> {
        let subject_name = record
            .subject_name()
            .ok_or_else(|| ExtractError::MissingSubject {
                source_id: record.source.clone(),
            })?;

        let mut canon = Canonicalizer::new();
        let mut batch = ExtractionBatch::default();
        let source = record.source.as_str();

        let subject_id = self
            .entity(&mut canon, &mut batch, subject_name, EntityType::Person, CONFIDENCE_DIRECT)
            .ok_or_else(|| ExtractError::MissingSubject {
                source_id: record.source.clone(),
            })?;
        if let Some(pronouns) = record.identity.pronouns.as_deref() {
            batch.push_entity(
                Entity::new(EntityType::Person, subject_name).with_property("pronouns", pronouns),
            );
        }

        self.extract_identity(&mut canon, &mut batch, record, &subject_id, source);
        self.extract_people(&mut canon, &mut batch, record, &subject_id, source);
        self.extract_workplaces(&mut canon, &mut batch, record, &subject_id, source);
        self.extract_events(&mut canon, &mut batch, record, &subject_id, source);
        self.extract_interests(&mut canon, &mut batch, record, &subject_id, source);
        self.extract_phrases(&mut canon, &mut batch, record, &subject_id, source);

        Ok(batch)
    }

    /// Canonicalize a name and push the entity candidate; `None` when the
    /// name normalizes to nothing.
    fn entity(
        &self,
        canon: &mut Canonicalizer,
        batch: &mut ExtractionBatch,
        display_name: &str,
        kind: EntityType,
        confidence: f32,
    ) -> Option<EntityId> {
        let (id, kind) = canon.canonicalize(display_name, kind);
        if id.is_empty() {
            return None;
        }
        batch.push_entity(Entity {
            id: id.clone(),
            kind,
            display_name: display_name.trim().to_string(),
            properties: Default::default(),
            confidence,
        });
        Some(id)
    }

    fn extract_identity(
        &self,
        canon: &mut Canonicalizer,
        batch: &mut ExtractionBatch,
        record: &MemoryRecord,
        subject_id: &EntityId,
        source: &str,
    ) {
        if let Some(employer) = record.identity.employer.as_deref() {
            if let Some(org) =
                self.entity(canon, batch, employer, EntityType::Organization, CONFIDENCE_DIRECT)
            {
                batch.push_triplet(
                    Triplet::new(subject_id.clone(), Predicate::WorksAt, org)
                        .with_confidence(CONFIDENCE_DIRECT)
                        .with_provenance(Provenance::new(source, rule_id::IDENTITY_WORKS_AT)),
                );
            }
        }
        if let Some(location) = record.identity.location.as_deref() {
            if let Some(place) =
                self.entity(canon, batch, location, EntityType::Place, CONFIDENCE_DIRECT)
            {
                batch.push_triplet(
                    Triplet::new(subject_id.clone(), Predicate::LivesIn, place)
                        .with_confidence(CONFIDENCE_DIRECT)
                        .with_provenance(Provenance::new(source, rule_id::IDENTITY_LIVES_IN)),
                );
            }
        }
        if let Some(role) = record.identity.role.as_deref() {
            if let Some(role_id) =
                self.entity(canon, batch, role, EntityType::Role, CONFIDENCE_DIRECT)
            {
                batch.push_triplet(
                    Triplet::new(subject_id.clone(), Predicate::HasRole, role_id)
                        .with_confidence(CONFIDENCE_DIRECT)
                        .with_provenance(Provenance::new(source, rule_id::IDENTITY_ROLE)),
                );
            }
        }
    }

    fn extract_people(
        &self,
        canon: &mut Canonicalizer,
        batch: &mut ExtractionBatch,
        record: &MemoryRecord,
        subject_id: &EntityId,
        source: &str,
    ) {
        for entry in &record.people {
            let Some(person_id) =
                self.entity(canon, batch, &entry.name, EntityType::Person, CONFIDENCE_DIRECT)
            else {
                continue;
            };
            batch.push_triplet(
                Triplet::new(subject_id.clone(), Predicate::Knows, person_id.clone())
                    .with_confidence(CONFIDENCE_DIRECT)
                    .with_provenance(Provenance::new(source, rule_id::PEOPLE_KNOWS)),
            );

            for phrase in entry.description.split(',') {
                let phrase = phrase.trim();
                if phrase.is_empty() {
                    continue;
                }
                match rules::classify(phrase) {
                    Some((rule, object_text)) => {
                        if let Some(object_id) = self.entity(
                            canon,
                            batch,
                            &object_text,
                            rule.object_kind,
                            CONFIDENCE_HEURISTIC,
                        ) {
                            batch.push_triplet(
                                Triplet::new(person_id.clone(), rule.predicate.clone(), object_id)
                                    .with_confidence(CONFIDENCE_HEURISTIC)
                                    .with_provenance(Provenance::new(source, rule.id)),
                            );
                        }
                    }
                    None => {
                        warn!(
                            person = %entry.name,
                            phrase,
                            "no classification rule matched, keeping as description"
                        );
                        batch.unmatched_phrases.push(phrase.to_string());
                        if let Some(object_id) = self.entity(
                            canon,
                            batch,
                            phrase,
                            EntityType::Attribute,
                            CONFIDENCE_HEURISTIC,
                        ) {
                            batch.push_triplet(
                                Triplet::new(
                                    person_id.clone(),
                                    Predicate::HasDescription,
                                    object_id,
                                )
                                .with_confidence(CONFIDENCE_HEURISTIC)
                                .with_provenance(
                                    Provenance::new(source, rule_id::PEOPLE_DESCRIPTION),
                                ),
                            );
                        }
                    }
                }
            }
        }
    }

    fn extract_workplaces(
        &self,
        canon: &mut Canonicalizer,
        batch: &mut ExtractionBatch,
        record: &MemoryRecord,
        subject_id: &EntityId,
        source: &str,
    ) {
        for entry in &record.workplaces {
            let Some(org_id) = self.entity(
                canon,
                batch,
                &entry.organization,
                EntityType::Organization,
                CONFIDENCE_HEURISTIC,
            ) else {
                continue;
            };
            if let Some(range) = entry.date_range.as_deref() {
                batch.push_entity(
                    Entity::new(EntityType::Organization, &entry.organization)
                        .with_confidence(CONFIDENCE_HEURISTIC)
                        .with_property("dateRange", range),
                );
            }
            batch.push_triplet(
                Triplet::new(subject_id.clone(), Predicate::WorksAt, org_id)
                    .with_confidence(CONFIDENCE_HEURISTIC)
                    .with_provenance(Provenance::new(source, rule_id::WORKPLACE_WORKS_AT)),
            );
        }
    }

    fn extract_events(
        &self,
        canon: &mut Canonicalizer,
        batch: &mut ExtractionBatch,
        record: &MemoryRecord,
        subject_id: &EntityId,
        source: &str,
    ) {
        for entry in &record.events {
            let Some(event_id) =
                self.entity(canon, batch, &entry.title, EntityType::Event, CONFIDENCE_DIRECT)
            else {
                continue;
            };
            batch.push_triplet(
                Triplet::new(subject_id.clone(), Predicate::AttendedEvent, event_id.clone())
                    .with_confidence(CONFIDENCE_DIRECT)
                    .with_provenance(Provenance::new(source, rule_id::EVENT_ATTENDED)),
            );

            for place in rules::infer_places(&entry.details) {
                if let Some(place_id) =
                    self.entity(canon, batch, &place, EntityType::Place, CONFIDENCE_HEURISTIC)
                {
                    batch.push_triplet(
                        Triplet::new(event_id.clone(), Predicate::HappenedIn, place_id)
                            .with_confidence(CONFIDENCE_HEURISTIC)
                            .with_provenance(Provenance::new(source, rule_id::EVENT_PLACE)),
                    );
                }
            }

            for participant in rules::infer_participants(&entry.details) {
                if let Some(person_id) = self.entity(
                    canon,
                    batch,
                    &participant,
                    EntityType::Person,
                    CONFIDENCE_HEURISTIC,
                ) {
                    batch.push_triplet(
                        Triplet::new(person_id, Predicate::AttendedEvent, event_id.clone())
                            .with_confidence(CONFIDENCE_HEURISTIC)
                            .with_provenance(Provenance::new(source, rule_id::EVENT_PARTICIPANT)),
                    );
                }
            }
        }
    }

    fn extract_interests(
        &self,
        canon: &mut Canonicalizer,
        batch: &mut ExtractionBatch,
        record: &MemoryRecord,
        subject_id: &EntityId,
        source: &str,
    ) {
        for interest in &record.interests {
            if let Some(interest_id) =
                self.entity(canon, batch, interest, EntityType::Interest, CONFIDENCE_DIRECT)
            {
                batch.push_triplet(
                    Triplet::new(subject_id.clone(), Predicate::HasInterest, interest_id)
                        .with_confidence(CONFIDENCE_DIRECT)
                        .with_provenance(Provenance::new(source, rule_id::INTEREST_LISTED)),
                );
            }
        }
    }

    fn extract_phrases(
        &self,
        canon: &mut Canonicalizer,
        batch: &mut ExtractionBatch,
        record: &MemoryRecord,
        subject_id: &EntityId,
        source: &str,
    ) {
        for phrase in &record.phrases {
            if let Some(phrase_id) =
                self.entity(canon, batch, phrase, EntityType::Phrase, CONFIDENCE_DIRECT)
            {
                batch.push_triplet(
                    Triplet::new(subject_id.clone(), Predicate::SaidPhrase, phrase_id)
                        .with_confidence(CONFIDENCE_DIRECT)
                        .with_provenance(Provenance::new(source, rule_id::PHRASE_SAID)),
                );
            }
        }
    }
}
