//! Section extraction for course PDFs and the policy that keeps the derived
//! section / table-of-contents records in step with a course's document.
//!
//! The extraction pipeline is backend-agnostic: a [`PdfBackend`] turns a PDF
//! into per-page text blocks, [`extractor::segment_pages`] folds the blocks
//! into titled sections, and [`sync::CourseSync`] decides on every course
//! write whether the stored records must be rebuilt, cleared, or left alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod extractor;
pub mod headings;
pub mod store;
pub mod sync;

// Re-export for convenience
pub use backend::{BackendError, BlockBounds, PageBlocks, PdfBackend, TextBlock};
pub use config_file::{ConfigError, ConfigFile};
pub use extractor::{SectionExtractor, segment_pages};
pub use headings::{HeadingKind, HeadingRules, HeadingRulesBuilder};
pub use store::{MemoryStore, PdfSyncRecord, SectionStore, StoreError};
pub use sync::{CourseSync, ExtractReason, SyncAction, SyncOutcome, plan_sync};

/// A contiguous span of document text under one detected heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    /// 0-based position within one extraction run.
    pub order: u32,
}

/// One table-of-contents line: a [`Section`] without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    pub order: u32,
}

impl From<&Section> for TocEntry {
    fn from(section: &Section) -> Self {
        Self {
            title: section.title.clone(),
            order: section.order,
        }
    }
}

/// Output of one extraction run. Both sequences are ordered by `order` and
/// are either produced together or both empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub sections: Vec<Section>,
    pub table_of_contents: Vec<TocEntry>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

/// Declared media kind of a course's primary material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    #[default]
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Pdf => "pdf",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown media kind: {0:?} (expected \"pdf\" or \"video\")")]
pub struct ParseMediaKindError(pub String);

impl FromStr for MediaKind {
    type Err = ParseMediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(MediaKind::Pdf),
            "video" => Ok(MediaKind::Video),
            other => Err(ParseMediaKindError(other.to_string())),
        }
    }
}

/// The slice of a course the sync policy is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDocument {
    pub course_id: i64,
    pub title: String,
    /// Stored path of the PDF, relative to the document root.
    pub file: Option<String>,
    pub kind: MediaKind,
}

impl CourseDocument {
    /// The stored PDF name, if the course currently has one and declares
    /// itself a PDF course. An empty name counts as no file.
    pub fn pdf_file(&self) -> Option<&str> {
        match self.kind {
            MediaKind::Pdf => self.file.as_deref().filter(|name| !name.is_empty()),
            MediaKind::Video => None,
        }
    }
}
