//! Rich diagnostic error types for the kith engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the kith engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source chains) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum KithError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),
}

// ---------------------------------------------------------------------------
// Parse errors (source adapters)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    #[diagnostic(
        code(kith::parse::io),
        help(
            "A filesystem operation failed while reading input. Check that the \
             path exists and is readable."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no source format matches {path}")]
    #[diagnostic(
        code(kith::parse::unknown_format),
        help(
            "Memory files are recognized by extension: `.md` for markdown memory \
             files, `.json` for normalized records. Rename the file or pass an \
             explicit format."
        )
    )]
    UnknownFormat { path: String },

    #[error("invalid record in {path}: {message}")]
    #[diagnostic(
        code(kith::parse::invalid_record),
        help(
            "The file did not parse as a normalized memory record. The section \
             named in the message is the one to fix."
        )
    )]
    InvalidRecord { path: String, message: String },
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("record from {source_id} has no subject name")]
    #[diagnostic(
        code(kith::extract::missing_subject),
        help(
            "Every memory record needs a subject to attach facts to. Add a \
             `- Name:` line to the Identity section of the source file."
        )
    )]
    MissingSubject { source_id: String },
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(kith::store::io),
        help(
            "A filesystem operation failed. Check that the storage directory \
             exists, has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(kith::store::serde),
        help(
            "Failed to serialize or deserialize graph data. This usually means \
             the stored file was edited by hand or written by an incompatible \
             version. Re-ingest your memory files."
        )
    )]
    Serialization { message: String },

    #[error("sqlite error: {message}")]
    #[diagnostic(
        code(kith::store::sqlite),
        help(
            "The relational backend reported an error. If the database file is \
             corrupt, move it aside and re-ingest; the flat-file backend can \
             serve as a fallback."
        )
    )]
    Sqlite { message: String },

    #[error("triplet ({subject}, {predicate}, {object}) references unknown entity \"{missing}\"")]
    #[diagnostic(
        code(kith::store::integrity),
        help(
            "Both endpoints of a triplet must exist as entities before the \
             triplet is added. The store was left unchanged."
        )
    )]
    IntegrityViolation {
        subject: String,
        predicate: String,
        object: String,
        missing: String,
    },

    #[error("entity \"{id}\" already exists as {existing}, cannot re-add as {incoming}")]
    #[diagnostic(
        code(kith::store::type_conflict),
        help(
            "An entity id keeps the type it was first written with. Resolve \
             candidates through the canonicalizer (first-writer-wins) instead \
             of writing entities to the store directly."
        )
    )]
    TypeConflict {
        id: String,
        existing: String,
        incoming: String,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("no entity found for \"{name}\" (canonical id \"{canonical}\")")]
    #[diagnostic(
        code(kith::query::not_found),
        help(
            "Lookups are case- and spacing-insensitive, so this name resolves \
             to no known entity at all. List known entities with \
             `kith list-entities`."
        )
    )]
    NotFound { name: String, canonical: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Convenience alias for functions returning kith results.
pub type KithResult<T> = std::result::Result<T, KithError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_kith_error() {
        let err = StoreError::IntegrityViolation {
            subject: "will_wade".into(),
            predicate: "knows".into(),
            object: "daisy".into(),
            missing: "daisy".into(),
        };
        let kith: KithError = err.into();
        assert!(matches!(
            kith,
            KithError::Store(StoreError::IntegrityViolation { .. })
        ));
    }

    #[test]
    fn query_error_wraps_store_error() {
        let store_err = StoreError::Serialization {
            message: "bad json".into(),
        };
        let query_err: QueryError = store_err.into();
        assert!(matches!(query_err, QueryError::Store(_)));
    }

    #[test]
    fn integrity_message_names_the_missing_id() {
        let err = StoreError::IntegrityViolation {
            subject: "will_wade".into(),
            predicate: "knows".into(),
            object: "daisy".into(),
            missing: "daisy".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("daisy"));
        assert!(msg.contains("knows"));
    }

    #[test]
    fn not_found_is_explanatory() {
        let err = QueryError::NotFound {
            name: "WILL WADE".into(),
            canonical: "will_wade".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("WILL WADE"));
        assert!(msg.contains("will_wade"));
    }
}
