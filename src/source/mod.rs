//! Source adapters: each format produces a normalized [`MemoryRecord`].
//!
//! Formats are variants of one capability behind [`SourceFormat`]; the engine
//! downstream of the record never branches on where it came from. New formats
//! (social-media exports, genealogy files) slot in as new variants.

pub mod markdown;

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::record::MemoryRecord;

/// The recognized input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A `##`-sectioned markdown memory file.
    Markdown,
    /// An already-normalized memory record as a JSON document.
    Record,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Markdown => "markdown",
            SourceFormat::Record => "record",
        }
    }

    /// Pick a format from a file extension, if any matches.
    pub fn detect(path: &Path) -> Option<SourceFormat> {
        match path
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase()
            .as_str()
        {
            "md" | "markdown" => Some(SourceFormat::Markdown),
            "json" => Some(SourceFormat::Record),
            _ => None,
        }
    }

    /// Parse a file of this format into a normalized record.
    pub fn parse(&self, path: &Path) -> ParseResult<MemoryRecord> {
        match self {
            SourceFormat::Markdown => markdown::parse_file(path),
            SourceFormat::Record => parse_record_file(path),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the format from the path and parse it.
pub fn parse_path(path: &Path) -> ParseResult<MemoryRecord> {
    let format = SourceFormat::detect(path).ok_or_else(|| ParseError::UnknownFormat {
        path: path.display().to_string(),
    })?;
    format.parse(path)
}

fn parse_record_file(path: &Path) -> ParseResult<MemoryRecord> {
    let text = fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut record: MemoryRecord =
        serde_json::from_str(&text).map_err(|e| ParseError::InvalidRecord {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    if record.source.is_empty() {
        record.source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
    }
    Ok(record)
}
