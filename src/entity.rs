//! Entities: canonical identities for the people, places, and things a
//! memory file talks about.
//!
//! Identity is derived, not assigned: [`EntityId::derive`] maps a display name
//! to a stable canonical key, so the same name written with different casing
//! or spacing always lands on the same node across ingestions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Derive the canonical id string for a display name.
///
/// Lowercases, collapses runs of whitespace (and underscores, so canonical
/// ids re-canonicalize to themselves) into a single `_`, and strips all other
/// punctuation outright. `"Will Wade"`, `"will_wade"`, and `"WILL  WADE"` all
/// produce `will_wade`; `"O'Brien"` produces `obrien`.
pub fn canonical_id(display_name: &str) -> String {
    let mut id = String::with_capacity(display_name.len());
    let mut pending_sep = false;
    for ch in display_name.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            for lower in ch.to_lowercase() {
                id.push(lower);
            }
        } else if ch.is_whitespace() || ch == '_' {
            pending_sep = true;
        }
        // Other punctuation vanishes without acting as a separator.
    }
    id
}

/// Canonical entity identifier.
///
/// Always holds the output of [`canonical_id`]; construct via
/// [`EntityId::derive`] so the invariant cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Derive the canonical id for a display name.
    pub fn derive(display_name: &str) -> Self {
        Self(canonical_id(display_name))
    }

    /// Wrap an already-canonical id string (backend reloads).
    pub(crate) fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the display name normalized to nothing (pure punctuation).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The closed entity-type vocabulary.
///
/// New types are declared here before use; free-form type strings are not
/// accepted anywhere in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Place,
    Event,
    Organization,
    Interest,
    Phrase,
    Role,
    /// Co-authored works (papers, projects, books).
    Work,
    /// Free-standing descriptive objects: things worn, counts, and the
    /// targets of unclassified description phrases.
    Attribute,
}

impl EntityType {
    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Place => "place",
            EntityType::Event => "event",
            EntityType::Organization => "organization",
            EntityType::Interest => "interest",
            EntityType::Phrase => "phrase",
            EntityType::Role => "role",
            EntityType::Work => "work",
            EntityType::Attribute => "attribute",
        }
    }

    /// All declared entity types.
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Person,
            EntityType::Place,
            EntityType::Event,
            EntityType::Organization,
            EntityType::Interest,
            EntityType::Phrase,
            EntityType::Role,
            EntityType::Work,
            EntityType::Attribute,
        ]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        EntityType::all()
            .iter()
            .find(|t| t.as_str() == lowered)
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown entity type \"{s}\" (expected one of: {})",
                    EntityType::all()
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// A canonical node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Canonical id, derived from the display name.
    pub id: EntityId,
    /// Declared type; first writer wins on id collisions across types.
    #[serde(rename = "type")]
    pub kind: EntityType,
    /// Original human-readable name, preserved for rendering.
    pub display_name: String,
    /// String key/value annotations (pronouns, date ranges, ...).
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Certainty in [0, 1].
    pub confidence: f32,
}

impl Entity {
    /// Create an entity with full confidence and no properties.
    pub fn new(kind: EntityType, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            id: EntityId::derive(&display_name),
            kind,
            display_name,
            properties: BTreeMap::new(),
            confidence: 1.0,
        }
    }

    /// Set the confidence score, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
