// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # kith
//!
//! A knowledge graph store and reconciliation engine for personal memory
//! records, built for AAC (augmentative and alternative communication)
//! context lookup: who someone is, who they know, where they work, what
//! they like to talk about.
//!
//! ## Architecture
//!
//! - **Source adapters** (`source`): Markdown memory documents and JSON records
//! - **Extraction** (`extract`): An ordered rule table turning records into entity and triplet candidates
//! - **Reconciliation** (`merge`): Canonical-id upserts with confidence, property and provenance merge math
//! - **Storage** (`store`): Swappable JSON-document and SQLite backends behind one trait
//! - **Query** (`query`): Entity context lookup across both edge directions
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use kith::pipeline::{IngestMode, Pipeline};
//! use kith::query::query_context;
//! use kith::store::JsonStore;
//!
//! let store = JsonStore::new("memory-graph.json");
//! let mut pipeline = Pipeline::new(Box::new(store));
//! pipeline.ingest_file(Path::new("will.md"), IngestMode::Merge).unwrap();
//! let context = query_context(pipeline.store(), "Will Wade").unwrap();
//! println!("{context}");
//! ```

pub mod canon;
pub mod entity;
pub mod error;
pub mod extract;
pub mod merge;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod source;
pub mod store;
pub mod triplet;
