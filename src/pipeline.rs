//! Ingestion pipeline: parse, extract, reconcile, persist.
//!
//! [`Pipeline`] wires a source adapter, the [`Extractor`] and the
//! [`Reconciler`] around one [`GraphStore`]. Every ingestion runs the same
//! four stages and persists exactly once, at the end, so a failure anywhere
//! leaves the on-disk graph as it was. In directory mode a file that fails to
//! parse or extract is recorded and skipped; only storage errors abort the
//! batch.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{KithError, KithResult, ParseError};
use crate::extract::Extractor;
use crate::merge::{MergeReport, Reconciler};
use crate::source::{self, SourceFormat};
use crate::store::GraphStore;

/// How an ingestion treats the previously persisted graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Reconcile incoming batches with the existing graph.
    #[default]
    Merge,
    /// Discard the existing graph, then ingest as into an empty one.
    Replace,
}

/// A file the pipeline gave up on, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    pub path: String,
    pub message: String,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Files parsed, extracted and merged successfully.
    pub files_processed: usize,
    /// Aggregated reconciliation counters across all processed files.
    pub merge: MergeReport,
    /// Phrases no classification rule matched, kept as descriptions.
    pub unmatched_phrases: Vec<String>,
    /// Files skipped because parsing or extraction failed.
    pub failures: Vec<IngestFailure>,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files processed: {}", self.files_processed)?;
        writeln!(
            f,
            "Entities: {} added, {} merged",
            self.merge.entities_added, self.merge.entities_merged
        )?;
        writeln!(
            f,
            "Triplets: {} added, {} merged",
            self.merge.triplets_added, self.merge.triplets_merged
        )?;
        if !self.merge.type_conflicts.is_empty() {
            writeln!(f, "Type conflicts:")?;
            for conflict in &self.merge.type_conflicts {
                writeln!(
                    f,
                    "  {}: kept {}, rejected {}",
                    conflict.id, conflict.kept, conflict.rejected
                )?;
            }
        }
        if !self.unmatched_phrases.is_empty() {
            writeln!(f, "Unclassified phrases (kept as descriptions):")?;
            for phrase in &self.unmatched_phrases {
                writeln!(f, "  {phrase}")?;
            }
        }
        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(f, "  {}: {}", failure.path, failure.message)?;
            }
        }
        Ok(())
    }
}

/// The ingestion pipeline over one graph store.
pub struct Pipeline {
    store: Box<dyn GraphStore>,
    extractor: Extractor,
    reconciler: Reconciler,
}

impl Pipeline {
    pub fn new(store: Box<dyn GraphStore>) -> Self {
        Self {
            store,
            extractor: Extractor::new(),
            reconciler: Reconciler::new(),
        }
    }

    /// The store this pipeline writes into.
    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    /// Ingest a single source file and persist the result.
    ///
    /// Nothing is persisted on failure; the on-disk graph stays as it was,
    /// and [`GraphStore::load`] restores the working copy if needed.
    pub fn ingest_file(&mut self, path: &Path, mode: IngestMode) -> KithResult<IngestReport> {
        if mode == IngestMode::Replace {
            self.store.clear();
        }
        let mut report = IngestReport::default();
        let (merge, unmatched) = self.ingest_one(path)?;
        report.files_processed = 1;
        report.merge = merge;
        report.unmatched_phrases = unmatched;
        self.store.persist()?;
        info!(
            path = %path.display(),
            entities_added = report.merge.entities_added,
            triplets_added = report.merge.triplets_added,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Ingest every recognized source file directly under `dir`, in
    /// lexicographic path order, and persist once at the end.
    ///
    /// `pattern` restricts the batch to file names ending with the given
    /// suffix. Files that fail to parse or extract are recorded in the
    /// report and skipped; a storage error aborts the whole batch without
    /// persisting.
    pub fn ingest_directory(
        &mut self,
        dir: &Path,
        pattern: Option<&str>,
        mode: IngestMode,
    ) -> KithResult<IngestReport> {
        let paths = collect_sources(dir, pattern)?;
        info!(dir = %dir.display(), files = paths.len(), "ingesting directory");
        if mode == IngestMode::Replace {
            self.store.clear();
        }

        let mut report = IngestReport::default();
        for path in &paths {
            match self.ingest_one(path) {
                Ok((merge, unmatched)) => {
                    report.files_processed += 1;
                    report.merge.absorb(merge);
                    report.unmatched_phrases.extend(unmatched);
                }
                Err(err @ KithError::Store(_)) => return Err(err),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping source file");
                    report.failures.push(IngestFailure {
                        path: path.display().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
        self.store.persist()?;
        info!(
            dir = %dir.display(),
            processed = report.files_processed,
            failed = report.failures.len(),
            entities_added = report.merge.entities_added,
            triplets_added = report.merge.triplets_added,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Run parse, extract and reconcile for one file. Persisting is the
    /// caller's job.
    fn ingest_one(&mut self, path: &Path) -> KithResult<(MergeReport, Vec<String>)> {
        info!(path = %path.display(), "processing memory file");
        let record = source::parse_path(path)?;
        let batch = self.extractor.extract(&record)?;
        info!(
            source = %record.source,
            entities = batch.entities().len(),
            triplets = batch.triplets().len(),
            "extracted candidate batch"
        );
        let unmatched = batch.unmatched_phrases().to_vec();
        let merge = self.reconciler.merge(self.store.as_mut(), batch)?;
        Ok((merge, unmatched))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("entities", &self.store.entity_count())
            .field("triplets", &self.store.triplet_count())
            .finish()
    }
}

/// Recognized source files directly under `dir`, sorted by path.
fn collect_sources(dir: &Path, pattern: Option<&str>) -> KithResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| ParseError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ParseError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || SourceFormat::detect(&path).is_none() {
            continue;
        }
        if let Some(suffix) = pattern {
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(suffix) {
                continue;
            }
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::store::JsonStore;
    use tempfile::TempDir;

    const WILL: &str = "\
# Notes

## 👤 Identity
- Name: Will Wade
- Lives in: Manchester

## 🏢 Workplaces
- Ace Centre (2016-present)

## 🌱 Interests
- sailing, hiking
";

    const DAISY: &str = "\
# Notes

## 👤 Identity
- Name: Daisy
- Lives in: Leeds
";

    const NAMELESS: &str = "\
## 👤 Identity
- Pronouns: she/her
";

    fn pipeline_at(dir: &Path) -> Pipeline {
        Pipeline::new(Box::new(JsonStore::new(dir.join("graph.json"))))
    }

    #[test]
    fn single_file_ingest_populates_and_persists() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("will.md");
        std::fs::write(&file, WILL).unwrap();

        let mut pipeline = pipeline_at(dir.path());
        let report = pipeline.ingest_file(&file, IngestMode::Merge).unwrap();

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.merge.entities_added, 5);
        assert_eq!(report.merge.triplets_added, 4);
        assert!(report.failures.is_empty());

        let mut reopened = JsonStore::new(dir.path().join("graph.json"));
        reopened.load().unwrap();
        assert_eq!(reopened.entity_count(), 5);
        assert_eq!(reopened.triplet_count(), 4);
    }

    #[test]
    fn reingesting_the_same_file_only_merges() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("will.md");
        std::fs::write(&file, WILL).unwrap();

        let mut pipeline = pipeline_at(dir.path());
        pipeline.ingest_file(&file, IngestMode::Merge).unwrap();
        let second = pipeline.ingest_file(&file, IngestMode::Merge).unwrap();

        assert_eq!(second.merge.entities_added, 0);
        assert_eq!(second.merge.entities_merged, 5);
        assert_eq!(second.merge.triplets_added, 0);
        assert_eq!(second.merge.triplets_merged, 4);
        assert_eq!(pipeline.store().entity_count(), 5);
        assert_eq!(pipeline.store().triplet_count(), 4);
    }

    #[test]
    fn replace_mode_discards_previous_graph() {
        let dir = TempDir::new().unwrap();
        let will = dir.path().join("will.md");
        let daisy = dir.path().join("daisy.md");
        std::fs::write(&will, WILL).unwrap();
        std::fs::write(&daisy, DAISY).unwrap();

        let mut pipeline = pipeline_at(dir.path());
        pipeline.ingest_file(&will, IngestMode::Merge).unwrap();
        pipeline.ingest_file(&daisy, IngestMode::Replace).unwrap();

        assert!(pipeline.store().get_entity(&EntityId::derive("Will Wade")).is_none());
        assert!(pipeline.store().get_entity(&EntityId::derive("Daisy")).is_some());
        assert_eq!(pipeline.store().entity_count(), 2);

        let mut reopened = JsonStore::new(dir.path().join("graph.json"));
        reopened.load().unwrap();
        assert_eq!(reopened.entity_count(), 2);
    }

    #[test]
    fn directory_ingest_collects_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        let sources = dir.path().join("sources");
        std::fs::create_dir(&sources).unwrap();
        std::fs::write(sources.join("b.md"), WILL).unwrap();
        std::fs::write(sources.join("a.md"), DAISY).unwrap();
        std::fs::write(sources.join("c.md"), NAMELESS).unwrap();
        std::fs::write(sources.join("notes.txt"), "not a memory file").unwrap();

        let mut pipeline = pipeline_at(dir.path());
        let report = pipeline
            .ingest_directory(&sources, None, IngestMode::Merge)
            .unwrap();

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("c.md"));
        assert!(pipeline.store().get_entity(&EntityId::derive("Will Wade")).is_some());
        assert!(pipeline.store().get_entity(&EntityId::derive("Daisy")).is_some());
    }

    #[test]
    fn directory_pattern_filters_by_suffix() {
        let dir = TempDir::new().unwrap();
        let sources = dir.path().join("sources");
        std::fs::create_dir(&sources).unwrap();
        std::fs::write(sources.join("will_memory.md"), WILL).unwrap();
        std::fs::write(sources.join("daisy.md"), DAISY).unwrap();

        let mut pipeline = pipeline_at(dir.path());
        let report = pipeline
            .ingest_directory(&sources, Some("_memory.md"), IngestMode::Merge)
            .unwrap();

        assert_eq!(report.files_processed, 1);
        assert!(pipeline.store().get_entity(&EntityId::derive("Will Wade")).is_some());
        assert!(pipeline.store().get_entity(&EntityId::derive("Daisy")).is_none());
    }

    #[test]
    fn report_display_lists_counts_and_failures() {
        let report = IngestReport {
            files_processed: 2,
            merge: MergeReport {
                entities_added: 5,
                entities_merged: 1,
                triplets_added: 4,
                triplets_merged: 0,
                type_conflicts: Vec::new(),
            },
            unmatched_phrases: vec!["lovely person".to_string()],
            failures: vec![IngestFailure {
                path: "c.md".to_string(),
                message: "no subject".to_string(),
            }],
        };
        let text = report.to_string();
        assert!(text.contains("Files processed: 2"));
        assert!(text.contains("Entities: 5 added, 1 merged"));
        assert!(text.contains("Triplets: 4 added, 0 merged"));
        assert!(text.contains("lovely person"));
        assert!(text.contains("c.md: no subject"));
    }
}
