//! SQLite-backed course catalog.
//!
//! Stores categories and courses, and implements [`SectionStore`] for the
//! per-course PDF sync record and its sections. Course writes run the sync
//! policy after the row is persisted, so derived sections always follow the
//! course's current document.

mod db;
mod models;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

use lectern_core::{
    CourseSync, ExtractionResult, PdfBackend, PdfSyncRecord, Section, SectionStore, StoreError,
    SyncOutcome, TocEntry,
};

pub use db::SCHEMA_VERSION;
pub use models::{Category, Course, CourseChanges, NewCategory, NewCourse};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid table of contents: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            CatalogError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
        )
    }
}

impl From<CatalogError> for StoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Json(e) => StoreError::Serialization(e),
            CatalogError::Io(e) => StoreError::Io(e),
            CatalogError::Database(e) => StoreError::Database(e.to_string()),
        }
    }
}

/// Handle to an opened course catalog.
pub struct CourseStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl CourseStore {
    /// Open (or create) a catalog file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(CatalogError::from)?;
        db::init_database(&conn, true)?;
        tracing::debug!(path = %path.display(), "opened course catalog");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(CatalogError::from)?;
        db::init_database(&conn, false)?;
        Ok(Self { conn, path: None })
    }

    /// `None` for in-memory catalogs.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<Option<String>, StoreError> {
        Ok(db::schema_version(&self.conn)?)
    }

    pub fn create_category(&self, new: NewCategory) -> Result<Category, StoreError> {
        let id = db::insert_category(&self.conn, &new).map_err(|e| {
            if e.is_unique_violation() {
                StoreError::Conflict(format!("category {:?} already exists", new.name))
            } else {
                e.into()
            }
        })?;
        Ok(Category {
            id,
            name: new.name,
            description: new.description,
            image: new.image,
        })
    }

    pub fn category(&self, id: i64) -> Result<Category, StoreError> {
        db::get_category(&self.conn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(db::list_categories(&self.conn)?)
    }

    pub fn course(&self, id: i64) -> Result<Course, StoreError> {
        db::get_course(&self.conn, id)?.ok_or_else(|| StoreError::NotFound(format!("course {id}")))
    }

    pub fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        Ok(db::list_courses(&self.conn, None)?)
    }

    pub fn courses_in_category(&self, category_id: i64) -> Result<Vec<Course>, StoreError> {
        Ok(db::list_courses(&self.conn, Some(category_id))?)
    }

    /// Insert a course, then run the sync policy on the stored row.
    pub fn create_course<B: PdfBackend>(
        &self,
        new: NewCourse,
        sync: &CourseSync<B>,
    ) -> Result<(Course, SyncOutcome), StoreError> {
        self.category(new.category_id)?;
        let id = db::insert_course(&self.conn, &new, unix_now())?;
        let course = self.course(id)?;
        tracing::info!(course_id = id, title = %course.title, "created course");

        let outcome = sync.on_course_saved(self, &course.document(), true);
        Ok((course, outcome))
    }

    /// Apply `changes` to a stored course, then run the sync policy.
    pub fn update_course<B: PdfBackend>(
        &self,
        id: i64,
        changes: CourseChanges,
        sync: &CourseSync<B>,
    ) -> Result<(Course, SyncOutcome), StoreError> {
        let mut course = self.course(id)?;
        if let Some(category_id) = changes.category_id {
            self.category(category_id)?;
        }
        changes.apply(&mut course);
        db::update_course(&self.conn, &course)?;
        tracing::info!(course_id = id, "updated course");

        let outcome = sync.on_course_saved(self, &course.document(), false);
        Ok((course, outcome))
    }

    /// Delete a course together with its sync record and sections.
    pub fn delete_course(&self, id: i64) -> Result<bool, StoreError> {
        let deleted = db::delete_course(&self.conn, id)?;
        if deleted {
            tracing::info!(course_id = id, "deleted course");
        }
        Ok(deleted)
    }
}

impl SectionStore for CourseStore {
    fn sync_record(&self, course_id: i64) -> Result<Option<PdfSyncRecord>, StoreError> {
        let Some((name, toc_json)) = db::get_pdf_data(&self.conn, course_id)? else {
            return Ok(None);
        };
        Ok(Some(PdfSyncRecord {
            course_id,
            name,
            table_of_contents: db::parse_toc(&toc_json)?,
        }))
    }

    fn write_extraction(
        &self,
        course_id: i64,
        name: &str,
        result: &ExtractionResult,
    ) -> Result<(), StoreError> {
        let toc_json = serde_json::to_string(&result.table_of_contents)?;
        db::replace_pdf_data(&self.conn, course_id, name, &toc_json, &result.sections)?;
        Ok(())
    }

    fn clear_extraction(&self, course_id: i64) -> Result<bool, StoreError> {
        Ok(db::delete_pdf_data(&self.conn, course_id)?)
    }

    fn sections(&self, course_id: i64) -> Result<Vec<Section>, StoreError> {
        Ok(db::get_sections(&self.conn, course_id)?)
    }

    fn table_of_contents(&self, course_id: i64) -> Result<Vec<TocEntry>, StoreError> {
        match db::get_pdf_data(&self.conn, course_id)? {
            Some((_, toc_json)) => Ok(db::parse_toc(&toc_json)?),
            None => Ok(Vec::new()),
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
