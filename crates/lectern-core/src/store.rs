//! Persistence seam for derived section records.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::{ExtractionResult, Section, TocEntry};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which stored file a course's derived records were produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfSyncRecord {
    pub course_id: i64,
    pub name: String,
    pub table_of_contents: Vec<TocEntry>,
}

/// Storage for the per-course sync record and its sections.
pub trait SectionStore {
    fn sync_record(&self, course_id: i64) -> Result<Option<PdfSyncRecord>, StoreError>;

    /// Record `name` as the source file, overwrite the table of contents, and
    /// replace every stored section with `result.sections`.
    fn write_extraction(
        &self,
        course_id: i64,
        name: &str,
        result: &ExtractionResult,
    ) -> Result<(), StoreError>;

    /// Delete the sync record and all its sections. Returns whether a record
    /// existed.
    fn clear_extraction(&self, course_id: i64) -> Result<bool, StoreError>;

    /// Stored sections ordered by `order`.
    fn sections(&self, course_id: i64) -> Result<Vec<Section>, StoreError>;

    fn table_of_contents(&self, course_id: i64) -> Result<Vec<TocEntry>, StoreError> {
        Ok(self
            .sync_record(course_id)?
            .map(|record| record.table_of_contents)
            .unwrap_or_default())
    }
}

type Records = HashMap<i64, (PdfSyncRecord, Vec<Section>)>;

/// In-process [`SectionStore`], used by tests and dry runs.
///
/// Counts writes so callers can assert that a save did not touch the records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
    write_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `write_extraction` / `clear_extraction` calls that changed state.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl SectionStore for MemoryStore {
    fn sync_record(&self, course_id: i64) -> Result<Option<PdfSyncRecord>, StoreError> {
        Ok(self.lock()?.get(&course_id).map(|(record, _)| record.clone()))
    }

    fn write_extraction(
        &self,
        course_id: i64,
        name: &str,
        result: &ExtractionResult,
    ) -> Result<(), StoreError> {
        let record = PdfSyncRecord {
            course_id,
            name: name.to_string(),
            table_of_contents: result.table_of_contents.clone(),
        };
        self.lock()?.insert(course_id, (record, result.sections.clone()));
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear_extraction(&self, course_id: i64) -> Result<bool, StoreError> {
        let existed = self.lock()?.remove(&course_id).is_some();
        if existed {
            self.write_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(existed)
    }

    fn sections(&self, course_id: i64) -> Result<Vec<Section>, StoreError> {
        let mut sections = self
            .lock()?
            .get(&course_id)
            .map(|(_, sections)| sections.clone())
            .unwrap_or_default();
        sections.sort_by_key(|s| s.order);
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(titles: &[&str]) -> ExtractionResult {
        let sections: Vec<Section> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| Section {
                title: title.to_string(),
                content: format!("body of {title}\n"),
                order: i as u32,
            })
            .collect();
        ExtractionResult {
            table_of_contents: sections.iter().map(TocEntry::from).collect(),
            sections,
        }
    }

    #[test]
    fn write_replaces_previous_sections() {
        let store = MemoryStore::new();
        store
            .write_extraction(7, "a.pdf", &result(&["I. One", "II. Two"]))
            .unwrap();
        store.write_extraction(7, "b.pdf", &result(&["1. Fresh"])).unwrap();

        let sections = store.sections(7).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "1. Fresh");
        assert_eq!(sections[0].order, 0);
        assert_eq!(store.sync_record(7).unwrap().unwrap().name, "b.pdf");
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn clear_removes_record_and_toc() {
        let store = MemoryStore::new();
        store.write_extraction(3, "a.pdf", &result(&["I. One"])).unwrap();
        assert!(store.clear_extraction(3).unwrap());
        assert!(!store.clear_extraction(3).unwrap());
        assert!(store.sections(3).unwrap().is_empty());
        assert!(store.table_of_contents(3).unwrap().is_empty());
        assert_eq!(store.write_count(), 2);
    }
}
