//! Course writes against an on-disk catalog, with a canned PDF backend.

use std::path::Path;

use lectern_core::{
    BackendError, BlockBounds, CourseSync, MediaKind, PageBlocks, PdfBackend, SectionExtractor,
    SectionStore, StoreError, SyncOutcome, TextBlock,
};
use lectern_store::{CourseChanges, CourseStore, NewCategory, NewCourse};

/// Serves one page per file: the file stem as a numbered heading plus a body.
struct StemBackend;

impl PdfBackend for StemBackend {
    fn extract_blocks(&self, path: &Path) -> Result<Vec<PageBlocks>, BackendError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BackendError::OpenError("no file stem".into()))?;
        if stem == "corrupt" {
            return Err(BackendError::ExtractionError("bad xref".into()));
        }
        let block = |y: f32, text: String| {
            TextBlock::new(
                BlockBounds {
                    x0: 50.0,
                    y0: y,
                    x1: 500.0,
                    y1: y + 12.0,
                },
                text,
            )
        };
        Ok(vec![vec![
            block(100.0, format!("1. {stem} overview")),
            block(130.0, "Welcome.".to_string()),
            block(160.0, "2. Assessment".to_string()),
            block(190.0, "Two quizzes.".to_string()),
        ]])
    }

    fn extract_blocks_from_bytes(&self, _data: &[u8]) -> Result<Vec<PageBlocks>, BackendError> {
        Err(BackendError::ExtractionError("unsupported".into()))
    }
}

fn sync() -> CourseSync<StemBackend> {
    CourseSync::new(SectionExtractor::new(StemBackend, "/srv/media"))
}

fn new_course(category_id: i64, pdf: Option<&str>, kind: MediaKind) -> NewCourse {
    NewCourse {
        title: "Statistics".into(),
        description: "Intro course".into(),
        pdf_file: pdf.map(String::from),
        kind,
        duration: "6 weeks".into(),
        professor_id: 3,
        category_id,
        ..Default::default()
    }
}

fn category(store: &CourseStore) -> i64 {
    store
        .create_category(NewCategory {
            name: "Science".into(),
            description: "Natural sciences".into(),
            image: Some("categories/science.png".into()),
        })
        .unwrap()
        .id
}

#[test]
fn creating_a_pdf_course_extracts_sections() {
    let store = CourseStore::open_in_memory().unwrap();
    let cat = category(&store);

    let (course, outcome) = store
        .create_course(new_course(cat, Some("courses/pdfs/stats.pdf"), MediaKind::Pdf), &sync())
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Extracted { sections: 2 });
    assert_eq!(course.rating, 0.0);
    assert!(course.created_at > 0);

    let sections = store.sections(course.id).unwrap();
    assert_eq!(sections[0].title, "1. stats overview");
    assert_eq!(sections[0].content, "Welcome.\n");
    assert_eq!(sections[1].title, "2. Assessment");

    let toc: Vec<_> = store
        .table_of_contents(course.id)
        .unwrap()
        .into_iter()
        .map(|e| (e.title, e.order))
        .collect();
    assert_eq!(
        toc,
        [
            ("1. stats overview".to_string(), 0),
            ("2. Assessment".to_string(), 1)
        ]
    );
}

#[test]
fn video_course_has_no_derived_records() {
    let store = CourseStore::open_in_memory().unwrap();
    let cat = category(&store);

    let (course, outcome) = store
        .create_course(new_course(cat, None, MediaKind::Video), &sync())
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Skipped);
    assert_eq!(course.kind, MediaKind::Video);
    assert!(store.sync_record(course.id).unwrap().is_none());
}

#[test]
fn update_policy_follows_the_stored_file() {
    let store = CourseStore::open_in_memory().unwrap();
    let cat = category(&store);
    let sync = sync();

    let (course, _) = store
        .create_course(new_course(cat, None, MediaKind::Video), &sync)
        .unwrap();

    let became_pdf = CourseChanges {
        pdf_file: Some(Some("courses/pdfs/probability.pdf".into())),
        kind: Some(MediaKind::Pdf),
        ..Default::default()
    };
    let (_, outcome) = store.update_course(course.id, became_pdf, &sync).unwrap();
    assert_eq!(outcome, SyncOutcome::Extracted { sections: 2 });

    let retitle = CourseChanges {
        title: Some("Probability".into()),
        ..Default::default()
    };
    let (updated, outcome) = store.update_course(course.id, retitle, &sync).unwrap();
    assert_eq!(outcome, SyncOutcome::Unchanged);
    assert_eq!(updated.title, "Probability");

    let replaced = CourseChanges {
        pdf_file: Some(Some("courses/pdfs/inference.pdf".into())),
        ..Default::default()
    };
    store.update_course(course.id, replaced, &sync).unwrap();
    assert_eq!(store.sections(course.id).unwrap()[0].title, "1. inference overview");

    let removed = CourseChanges {
        pdf_file: Some(None),
        ..Default::default()
    };
    let (_, outcome) = store.update_course(course.id, removed, &sync).unwrap();
    assert_eq!(outcome, SyncOutcome::Cleared);
    assert!(store.sections(course.id).unwrap().is_empty());
    assert!(store.sync_record(course.id).unwrap().is_none());
}

#[test]
fn corrupt_pdf_still_saves_the_course() {
    let store = CourseStore::open_in_memory().unwrap();
    let cat = category(&store);

    let (course, outcome) = store
        .create_course(new_course(cat, Some("courses/pdfs/corrupt.pdf"), MediaKind::Pdf), &sync())
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Extracted { sections: 0 });
    assert_eq!(store.course(course.id).unwrap().pdf_file.as_deref(), Some("courses/pdfs/corrupt.pdf"));
    assert_eq!(
        store.sync_record(course.id).unwrap().unwrap().name,
        "courses/pdfs/corrupt.pdf"
    );
}

#[test]
fn unknown_category_is_rejected_before_insert() {
    let store = CourseStore::open_in_memory().unwrap();
    let err = store
        .create_course(new_course(42, None, MediaKind::Video), &sync())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(store.list_courses().unwrap().is_empty());
}

#[test]
fn deleting_a_course_cascades_to_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("catalog.db");
    let store = CourseStore::open(&path).unwrap();
    let cat = category(&store);

    let (course, _) = store
        .create_course(new_course(cat, Some("courses/pdfs/stats.pdf"), MediaKind::Pdf), &sync())
        .unwrap();
    assert!(store.delete_course(course.id).unwrap());
    assert!(store.sync_record(course.id).unwrap().is_none());
    assert!(store.sections(course.id).unwrap().is_empty());
}

#[test]
fn catalog_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");

    let course_id = {
        let store = CourseStore::open(&path).unwrap();
        let cat = category(&store);
        store
            .create_course(new_course(cat, Some("courses/pdfs/stats.pdf"), MediaKind::Pdf), &sync())
            .unwrap()
            .0
            .id
    };

    let store = CourseStore::open(&path).unwrap();
    assert_eq!(store.path(), Some(path.as_path()));
    assert_eq!(store.list_categories().unwrap()[0].name, "Science");
    assert_eq!(store.course(course_id).unwrap().kind, MediaKind::Pdf);
    assert_eq!(store.sections(course_id).unwrap().len(), 2);
    assert_eq!(store.courses_in_category(store.list_categories().unwrap()[0].id).unwrap().len(), 1);
}
