//! Triplets: directed, typed edges between canonical entities.
//!
//! A triplet `(subject, predicate, object)` carries a confidence score, a
//! provenance set recording which source file and extraction rule produced it,
//! and the timestamp of its first observation. The `(subject, predicate,
//! object)` key is unique in a graph; re-derived triplets merge instead of
//! duplicating.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Relationship vocabulary: curated predicates plus an open escape hatch.
///
/// Unknown predicate strings deserialize as [`Predicate::Custom`] and survive
/// round-trips unchanged, so graphs written by newer vocabularies stay
/// readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Predicate {
    Knows,
    WorksAt,
    LivesIn,
    HasRole,
    HasInterest,
    AttendedEvent,
    HappenedIn,
    SaidPhrase,
    HasChildren,
    Coauthored,
    Wears,
    /// Fallback for free-text phrases no rule classified.
    HasDescription,
    Custom(String),
}

impl Predicate {
    /// Wire-format name (camelCase for the curated set).
    pub fn as_str(&self) -> &str {
        match self {
            Predicate::Knows => "knows",
            Predicate::WorksAt => "worksAt",
            Predicate::LivesIn => "livesIn",
            Predicate::HasRole => "hasRole",
            Predicate::HasInterest => "hasInterest",
            Predicate::AttendedEvent => "attendedEvent",
            Predicate::HappenedIn => "happenedIn",
            Predicate::SaidPhrase => "saidPhrase",
            Predicate::HasChildren => "hasChildren",
            Predicate::Coauthored => "coauthored",
            Predicate::Wears => "wears",
            Predicate::HasDescription => "hasDescription",
            Predicate::Custom(s) => s,
        }
    }

    /// The curated vocabulary in a fixed order (excludes `Custom`).
    pub fn curated() -> [Predicate; 12] {
        [
            Predicate::Knows,
            Predicate::WorksAt,
            Predicate::LivesIn,
            Predicate::HasRole,
            Predicate::HasInterest,
            Predicate::AttendedEvent,
            Predicate::HappenedIn,
            Predicate::SaidPhrase,
            Predicate::HasChildren,
            Predicate::Coauthored,
            Predicate::Wears,
            Predicate::HasDescription,
        ]
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Predicate {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();
        for known in Predicate::curated() {
            if known.as_str().to_lowercase() == lowered {
                return known;
            }
        }
        Predicate::Custom(trimmed.to_string())
    }
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Predicate::from(s.to_string())
    }
}

impl From<Predicate> for String {
    fn from(p: Predicate) -> Self {
        p.as_str().to_string()
    }
}

/// One (source file, extraction rule) pair that produced a triplet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provenance {
    /// Source identifier, usually the ingested file's name.
    pub source: String,
    /// Id of the extraction rule that fired.
    pub rule: String,
}

impl Provenance {
    pub fn new(source: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            rule: rule.into(),
        }
    }
}

/// Unique key of a triplet within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripletKey {
    pub subject: EntityId,
    pub predicate: Predicate,
    pub object: EntityId,
}

/// A directed, typed edge in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triplet {
    /// Canonical id of the subject entity.
    pub subject_id: EntityId,
    /// Relationship predicate.
    pub predicate: Predicate,
    /// Canonical id of the object entity.
    pub object_id: EntityId,
    /// Certainty in [0, 1].
    pub confidence: f32,
    /// Which source file(s) and rule(s) produced this edge.
    #[serde(default)]
    pub provenance: BTreeSet<Provenance>,
    /// Seconds since UNIX epoch at first observation; earliest wins on merge.
    pub created_at: u64,
}

impl Triplet {
    /// Create a triplet with full confidence and the current timestamp.
    pub fn new(subject_id: EntityId, predicate: Predicate, object_id: EntityId) -> Self {
        Self {
            subject_id,
            predicate,
            object_id,
            confidence: 1.0,
            provenance: BTreeSet::new(),
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Set the confidence score, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Record a provenance pair.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance.insert(provenance);
        self
    }

    /// Override the first-observation timestamp.
    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// The triplet's unique `(subject, predicate, object)` key.
    pub fn key(&self) -> TripletKey {
        TripletKey {
            subject: self.subject_id.clone(),
            predicate: self.predicate.clone(),
            object: self.object_id.clone(),
        }
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}) @{:.2}",
            self.subject_id, self.predicate, self.object_id, self.confidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> EntityId {
        EntityId::derive(name)
    }

    #[test]
    fn predicate_round_trips_as_camel_case() {
        let json = serde_json::to_string(&Predicate::WorksAt).unwrap();
        assert_eq!(json, "\"worksAt\"");
        let back: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Predicate::WorksAt);
    }

    #[test]
    fn unknown_predicate_survives_as_custom() {
        let back: Predicate = serde_json::from_str("\"mentoredBy\"").unwrap();
        assert_eq!(back, Predicate::Custom("mentoredBy".into()));
        assert_eq!(serde_json::to_string(&back).unwrap(), "\"mentoredBy\"");
    }

    #[test]
    fn predicate_recognition_is_case_insensitive() {
        assert_eq!(Predicate::from("worksat"), Predicate::WorksAt);
        assert_eq!(Predicate::from("KNOWS"), Predicate::Knows);
    }

    #[test]
    fn triplet_serializes_with_wire_field_names() {
        let t = Triplet::new(id("Will Wade"), Predicate::Knows, id("Daisy"))
            .with_provenance(Provenance::new("will.md", "people.knows"))
            .with_created_at(1_700_000_000);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["subjectId"], "will_wade");
        assert_eq!(json["predicate"], "knows");
        assert_eq!(json["objectId"], "daisy");
        assert_eq!(json["createdAt"], 1_700_000_000_u64);
        assert_eq!(json["provenance"][0]["source"], "will.md");
        assert_eq!(json["provenance"][0]["rule"], "people.knows");
    }

    #[test]
    fn confidence_is_clamped() {
        let t = Triplet::new(id("a"), Predicate::Knows, id("b")).with_confidence(2.0);
        assert_eq!(t.confidence, 1.0);
    }

    #[test]
    fn key_ignores_confidence_and_provenance() {
        let a = Triplet::new(id("a"), Predicate::Knows, id("b")).with_confidence(0.8);
        let b = Triplet::new(id("a"), Predicate::Knows, id("b"))
            .with_provenance(Provenance::new("x.md", "people.knows"));
        assert_eq!(a.key(), b.key());
    }
}
