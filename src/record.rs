//! The normalized intermediate memory record.
//!
//! Source adapters (markdown files, pre-normalized JSON, future social-export
//! or genealogy formats) all produce this one shape; the extractor consumes it
//! without knowing where it came from.

use serde::{Deserialize, Serialize};

/// A person's memory file, normalized: who they are, who they know, where
/// they've worked, what happened, what they like, what they say.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Source identifier carried into provenance (usually the file stem).
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub identity: Identity,
    #[serde(default)]
    pub people: Vec<PersonEntry>,
    #[serde(default)]
    pub workplaces: Vec<WorkplaceEntry>,
    #[serde(default)]
    pub events: Vec<EventEntry>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
}

impl MemoryRecord {
    /// An empty record tagged with a source identifier.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// The subject's name, if the identity block carries a usable one.
    pub fn subject_name(&self) -> Option<&str> {
        self.identity
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// The identity block: every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One person the subject knows, with free-text description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEntry {
    pub name: String,
    /// Comma-separated free text; classified phrase by phrase at extraction.
    #[serde(default, rename = "freeTextDescription")]
    pub description: String,
}

impl PersonEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// One work-history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkplaceEntry {
    pub organization: String,
    #[serde(default)]
    pub date_range: Option<String>,
}

impl WorkplaceEntry {
    pub fn new(organization: impl Into<String>, date_range: Option<String>) -> Self {
        Self {
            organization: organization.into(),
            date_range,
        }
    }
}

/// One remembered event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub title: String,
    /// Free-text details; places and participants are inferred from these.
    #[serde(default, rename = "freeTextDetails")]
    pub details: String,
}

impl EventEntry {
    pub fn new(title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_parses_from_contract_field_names() {
        let json = r#"{
            "source": "will",
            "identity": {"name": "Will Wade", "pronouns": "he/him"},
            "people": [{"name": "Daisy", "freeTextDescription": "SLT, glasses"}],
            "workplaces": [{"organization": "Ace Centre", "dateRange": "2016-present"}],
            "events": [{"title": "ATIA 2024", "freeTextDetails": "met Daisy in Orlando"}],
            "interests": ["sailing"],
            "phrases": ["Let's have a brew."]
        }"#;
        let record: MemoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.subject_name(), Some("Will Wade"));
        assert_eq!(record.people[0].description, "SLT, glasses");
        assert_eq!(record.workplaces[0].date_range.as_deref(), Some("2016-present"));
        assert_eq!(record.events[0].details, "met Daisy in Orlando");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let record: MemoryRecord = serde_json::from_str(r#"{"identity": {"name": "A"}}"#).unwrap();
        assert!(record.people.is_empty());
        assert!(record.phrases.is_empty());
        assert_eq!(record.source, "");
    }

    #[test]
    fn blank_subject_name_is_treated_as_absent() {
        let record: MemoryRecord =
            serde_json::from_str(r#"{"identity": {"name": "   "}}"#).unwrap();
        assert_eq!(record.subject_name(), None);
    }
}
