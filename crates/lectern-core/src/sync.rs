//! Keep a course's derived sections in step with its PDF.
//!
//! The course write path calls [`CourseSync::on_course_saved`] after every
//! create or update, passing a [`CourseDocument`] snapshot. The decision is
//! made by [`plan_sync`] from that snapshot and the stored
//! [`PdfSyncRecord`]:
//!
//! - a new PDF course, a course that became a PDF course, or a PDF course
//!   whose stored file name changed is re-extracted;
//! - a course that lost its file or stopped being a PDF course has its
//!   derived records deleted;
//! - any other save leaves the records untouched.

use std::fmt;

use crate::backend::PdfBackend;
use crate::extractor::SectionExtractor;
use crate::store::{PdfSyncRecord, SectionStore};
use crate::CourseDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractReason {
    NewCourse,
    BecamePdf,
    FileChanged,
}

impl fmt::Display for ExtractReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtractReason::NewCourse => "new course with pdf",
            ExtractReason::BecamePdf => "course updated to pdf",
            ExtractReason::FileChanged => "pdf file changed",
        })
    }
}

/// What a save requires of the derived records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Extract { file: String, reason: ExtractReason },
    Clear,
    /// PDF course saved with the same file it was extracted from.
    Unchanged,
    /// Not a PDF course and nothing stored.
    Skip,
}

/// Result of [`CourseSync::on_course_saved`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Extracted { sections: usize },
    Cleared,
    Unchanged,
    Skipped,
    /// The store failed; the course write itself is unaffected.
    Failed { reason: String },
}

pub fn plan_sync(
    course: &CourseDocument,
    created: bool,
    existing: Option<&PdfSyncRecord>,
) -> SyncAction {
    match (course.pdf_file(), existing) {
        (Some(file), _) if created => SyncAction::Extract {
            file: file.to_string(),
            reason: ExtractReason::NewCourse,
        },
        (Some(file), None) => SyncAction::Extract {
            file: file.to_string(),
            reason: ExtractReason::BecamePdf,
        },
        (Some(file), Some(record)) if record.name != file => SyncAction::Extract {
            file: file.to_string(),
            reason: ExtractReason::FileChanged,
        },
        (Some(_), Some(_)) => SyncAction::Unchanged,
        (None, Some(_)) if !created => SyncAction::Clear,
        (None, _) => SyncAction::Skip,
    }
}

/// Entry point of the course write path into the extractor.
pub struct CourseSync<B> {
    extractor: SectionExtractor<B>,
}

impl<B: PdfBackend> CourseSync<B> {
    pub fn new(extractor: SectionExtractor<B>) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &SectionExtractor<B> {
        &self.extractor
    }

    /// Bring the derived records of `course` up to date after a write.
    ///
    /// Never fails: store errors are logged and reported as
    /// [`SyncOutcome::Failed`], extraction errors as an empty section set.
    pub fn on_course_saved<S: SectionStore + ?Sized>(
        &self,
        store: &S,
        course: &CourseDocument,
        created: bool,
    ) -> SyncOutcome {
        let existing = match store.sync_record(course.course_id) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!(course = course.course_id, error = %e, "failed to read pdf sync record");
                return SyncOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        match plan_sync(course, created, existing.as_ref()) {
            SyncAction::Extract { file, reason } => {
                tracing::info!(
                    course = course.course_id,
                    title = %course.title,
                    file = %file,
                    %reason,
                    "starting pdf processing"
                );
                // The file name is recorded even for an empty result, so a
                // broken file is not re-parsed on the next unrelated save.
                let result = self.extractor.extract(Some(file.as_str()), course.kind);
                match store.write_extraction(course.course_id, &file, &result) {
                    Ok(()) => {
                        tracing::info!(
                            course = course.course_id,
                            sections = result.sections.len(),
                            toc_entries = result.table_of_contents.len(),
                            "saved extracted sections"
                        );
                        SyncOutcome::Extracted {
                            sections: result.sections.len(),
                        }
                    }
                    Err(e) => {
                        tracing::error!(course = course.course_id, error = %e, "failed to save extracted sections");
                        SyncOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            SyncAction::Clear => {
                tracing::info!(
                    course = course.course_id,
                    title = %course.title,
                    "pdf removed or kind changed, deleting derived records"
                );
                match store.clear_extraction(course.course_id) {
                    Ok(_) => SyncOutcome::Cleared,
                    Err(e) => {
                        tracing::error!(course = course.course_id, error = %e, "failed to delete derived records");
                        SyncOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            SyncAction::Unchanged => {
                tracing::debug!(course = course.course_id, "pdf unchanged, skipping extraction");
                SyncOutcome::Unchanged
            }
            SyncAction::Skip => SyncOutcome::Skipped,
        }
    }
}
