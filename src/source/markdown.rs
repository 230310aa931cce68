//! Markdown memory files: `##` sections holding `- ` bullets.
//!
//! Headings are matched on their text with any leading emoji or decoration
//! ignored, case-insensitively, so `## 🧑 Identity` and `## identity` open
//! the same section. Unknown sections are skipped wholesale; unknown bullet
//! shapes inside known sections are skipped line by line. Structure problems
//! therefore never fail a parse — the only hard failure is an unreadable
//! file. A record with no subject name is rejected later, at extraction.

use std::fs;
use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::record::{EventEntry, MemoryRecord, PersonEntry, WorkplaceEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Identity,
    People,
    Workplaces,
    Events,
    Interests,
    Phrases,
}

/// Strip decoration from a heading and lowercase it for matching.
fn normalize_heading(raw: &str) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '&' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

fn section_for(heading: &str) -> Option<Section> {
    match normalize_heading(heading).as_str() {
        "identity" => Some(Section::Identity),
        "people" => Some(Section::People),
        "workplaces" => Some(Section::Workplaces),
        "events & memories" => Some(Section::Events),
        "interests" => Some(Section::Interests),
        "phrases i often say" => Some(Section::Phrases),
        _ => None,
    }
}

/// Split a `Value (Parenthetical)` bullet into its two parts.
///
/// Only a trailing parenthetical counts; anything else stays part of the
/// value (`"Foo (Bar) Ltd"` is one name).
fn split_parenthetical(value: &str) -> (String, Option<String>) {
    if let Some((head, tail)) = value.split_once('(') {
        if let Some(inner) = tail.strip_suffix(')') {
            let inner = inner.trim();
            let head = head.trim().to_string();
            if inner.is_empty() {
                return (head, None);
            }
            return (head, Some(inner.to_string()));
        }
    }
    (value.trim().to_string(), None)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_identity_bullet(item: &str, record: &mut MemoryRecord) {
    if let Some(value) = item.strip_prefix("Name:") {
        record.identity.name = non_empty(value);
    } else if let Some(value) = item.strip_prefix("Pronouns:") {
        record.identity.pronouns = non_empty(value);
    } else if let Some(value) = item.strip_prefix("Lives in:") {
        record.identity.location = non_empty(value);
    } else if let Some(value) = item.strip_prefix("Works at:") {
        // `Company (Role)` carries the current role alongside the employer.
        let (company, role) = split_parenthetical(value.trim());
        record.identity.employer = non_empty(&company);
        if let Some(role) = role {
            record.identity.role = Some(role);
        }
    }
}

fn parse_event_bullet(item: &str) -> EventEntry {
    match item.split_once('→') {
        Some((title, details)) => {
            EventEntry::new(title.trim().trim_matches('"'), details.trim())
        }
        None => EventEntry::new(item.trim_matches('"'), ""),
    }
}

/// Parse markdown text into a normalized record tagged with `source`.
pub fn parse_str(text: &str, source: impl Into<String>) -> MemoryRecord {
    let mut record = MemoryRecord::new(source);
    let mut current: Option<Section> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("##") {
            if !heading.starts_with('#') {
                // An unrecognized heading closes the current section.
                current = section_for(heading);
                continue;
            }
        }
        let Some(section) = current else { continue };
        let Some(item) = trimmed.strip_prefix("- ") else {
            continue;
        };
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        match section {
            Section::Identity => parse_identity_bullet(item, &mut record),
            Section::People => {
                if let Some((name, description)) = item.split_once(':') {
                    if !name.trim().is_empty() {
                        record
                            .people
                            .push(PersonEntry::new(name.trim(), description.trim()));
                    }
                }
            }
            Section::Workplaces => {
                let (organization, range) = split_parenthetical(item);
                if !organization.is_empty() {
                    record.workplaces.push(WorkplaceEntry::new(organization, range));
                }
            }
            Section::Events => record.events.push(parse_event_bullet(item)),
            Section::Interests => record.interests.extend(
                item.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            ),
            Section::Phrases => {
                let phrase = item.trim_matches('"').trim();
                if !phrase.is_empty() {
                    record.phrases.push(phrase.to_string());
                }
            }
        }
    }

    record
}

/// Read and parse a markdown memory file.
pub fn parse_file(path: &Path) -> ParseResult<MemoryRecord> {
    let text = fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(parse_str(&text, source))
}
