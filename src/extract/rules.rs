//! The fixed, ordered phrase-classification rule table.
//!
//! Free text from a person entry is split on commas and each phrase is run
//! through [`phrase_rules`] in table order; the first matching rule classifies
//! the phrase. Precedence therefore lives in one place and never depends on
//! match strength. Phrases no rule claims fall back to `hasDescription` in the
//! extractor, so the table does not need a catch-all row.

use std::sync::LazyLock;

use regex::Regex;

use crate::entity::EntityType;
use crate::triplet::Predicate;

/// Extraction rule ids, recorded in triplet provenance.
pub mod rule_id {
    pub const IDENTITY_WORKS_AT: &str = "identity.works_at";
    pub const IDENTITY_LIVES_IN: &str = "identity.lives_in";
    pub const IDENTITY_ROLE: &str = "identity.role";
    pub const PEOPLE_KNOWS: &str = "people.knows";
    pub const PEOPLE_ROLE: &str = "people.role";
    pub const PEOPLE_WORKS_AT: &str = "people.works_at";
    pub const PEOPLE_CHILDREN: &str = "people.children";
    pub const PEOPLE_COAUTHORED: &str = "people.coauthored";
    pub const PEOPLE_WEARS: &str = "people.wears";
    pub const PEOPLE_DESCRIPTION: &str = "people.description";
    pub const WORKPLACE_WORKS_AT: &str = "workplaces.works_at";
    pub const EVENT_ATTENDED: &str = "events.attended";
    pub const EVENT_PARTICIPANT: &str = "events.participant";
    pub const EVENT_PLACE: &str = "events.place";
    pub const INTEREST_LISTED: &str = "interests.listed";
    pub const PHRASE_SAID: &str = "phrases.said";
}

/// One row of the phrase table: pattern → predicate → object type.
#[derive(Debug)]
pub struct PhraseRule {
    /// Rule id recorded in provenance.
    pub id: &'static str,
    /// Predicate of the emitted triplet.
    pub predicate: Predicate,
    /// Entity type of the triplet's object.
    pub object_kind: EntityType,
    pattern: Regex,
}

impl PhraseRule {
    fn new(
        id: &'static str,
        predicate: Predicate,
        object_kind: EntityType,
        pattern: &str,
    ) -> Self {
        Self {
            id,
            predicate,
            object_kind,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    /// Try this rule against a phrase; on a match, return the object text
    /// (the first non-empty capture group).
    pub fn apply(&self, phrase: &str) -> Option<String> {
        let caps = self.pattern.captures(phrase)?;
        (1..caps.len())
            .filter_map(|i| caps.get(i))
            .map(|m| m.as_str().trim())
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }
}

static PHRASE_RULES: LazyLock<Vec<PhraseRule>> = LazyLock::new(|| {
    vec![
        PhraseRule::new(
            rule_id::PEOPLE_ROLE,
            Predicate::HasRole,
            EntityType::Role,
            r"(?i)\b(slt|speech therapist|teacher|manager|director|researcher|developer)\b",
        ),
        PhraseRule::new(
            rule_id::PEOPLE_WORKS_AT,
            Predicate::WorksAt,
            EntityType::Organization,
            r"(?i)\bworks?\s+at\s+(.+)$",
        ),
        PhraseRule::new(
            rule_id::PEOPLE_CHILDREN,
            Predicate::HasChildren,
            EntityType::Attribute,
            r"(?i)\b(\d+)\s*(?:children|child|kids?)\b",
        ),
        PhraseRule::new(
            rule_id::PEOPLE_COAUTHORED,
            Predicate::Coauthored,
            EntityType::Work,
            r"(?i)\bco-?authored\s+(.+)$",
        ),
        PhraseRule::new(
            rule_id::PEOPLE_WEARS,
            Predicate::Wears,
            EntityType::Attribute,
            r"(?i)(?:\bwears\s+(.+)$|\b(glasses)\b)",
        ),
    ]
});

/// The phrase table in evaluation order.
pub fn phrase_rules() -> &'static [PhraseRule] {
    &PHRASE_RULES
}

/// Classify a phrase: first matching rule wins.
pub fn classify(phrase: &str) -> Option<(&'static PhraseRule, String)> {
    phrase_rules()
        .iter()
        .find_map(|rule| rule.apply(phrase).map(|object| (rule, object)))
}

// ── Event detail heuristics ─────────────────────────────────────────────

static RE_EVENT_PLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:in|at)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap()
});

static RE_EVENT_PARTICIPANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:met|with)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap()
});

/// Capitalized place names after "in"/"at" in event details.
pub fn infer_places(details: &str) -> Vec<String> {
    RE_EVENT_PLACE
        .captures_iter(details)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// Capitalized person names after "met"/"with" in event details.
pub fn infer_participants(details: &str) -> Vec<String> {
    RE_EVENT_PARTICIPANT
        .captures_iter(details)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}
