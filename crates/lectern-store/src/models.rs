use lectern_core::{CourseDocument, MediaKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Stored PDF path, relative to the document root.
    pub pdf_file: Option<String>,
    pub video_file: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "file_type")]
    pub kind: MediaKind,
    pub duration: String,
    pub rating: f64,
    /// Unix seconds.
    pub created_at: i64,
    pub professor_id: i64,
    pub category_id: i64,
}

impl Course {
    /// Snapshot handed to the sync policy after a write.
    pub fn document(&self) -> CourseDocument {
        CourseDocument {
            course_id: self.id,
            title: self.title.clone(),
            file: self.pdf_file.clone(),
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub pdf_file: Option<String>,
    pub video_file: Option<String>,
    pub image: Option<String>,
    pub kind: MediaKind,
    pub duration: String,
    pub professor_id: i64,
    pub category_id: i64,
}

/// Partial update of a course. `None` leaves a field unchanged; for the
/// optional file fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pdf_file: Option<Option<String>>,
    pub video_file: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub kind: Option<MediaKind>,
    pub duration: Option<String>,
    pub rating: Option<f64>,
    pub category_id: Option<i64>,
}

impl CourseChanges {
    pub fn apply(self, course: &mut Course) {
        if let Some(title) = self.title {
            course.title = title;
        }
        if let Some(description) = self.description {
            course.description = description;
        }
        if let Some(pdf_file) = self.pdf_file {
            course.pdf_file = pdf_file;
        }
        if let Some(video_file) = self.video_file {
            course.video_file = video_file;
        }
        if let Some(image) = self.image {
            course.image = image;
        }
        if let Some(kind) = self.kind {
            course.kind = kind;
        }
        if let Some(duration) = self.duration {
            course.duration = duration;
        }
        if let Some(rating) = self.rating {
            course.rating = rating;
        }
        if let Some(category_id) = self.category_id {
            course.category_id = category_id;
        }
    }
}
