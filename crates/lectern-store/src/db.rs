//! SQLite schema and row-level operations for the course catalog.

use lectern_core::{MediaKind, Section, TocEntry};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{Category, Course, NewCategory, NewCourse};
use crate::CatalogError;

pub const SCHEMA_VERSION: &str = "1";

const COURSE_COLUMNS: &str = "id, title, description, pdf_file, video_file, image, file_type, \
     duration, rating, created_at, professor_id, category_id";

/// Create tables and set connection pragmas. Foreign keys must be on for the
/// cascade from courses to their section records.
pub fn init_database(conn: &Connection, wal: bool) -> Result<(), CatalogError> {
    if wal {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
    }
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            image TEXT
        );

        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            pdf_file TEXT,
            video_file TEXT,
            image TEXT,
            file_type TEXT NOT NULL DEFAULT 'video',
            duration TEXT NOT NULL DEFAULT '',
            rating REAL NOT NULL DEFAULT 0.0,
            created_at INTEGER NOT NULL,
            professor_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS course_pdf_data (
            id INTEGER PRIMARY KEY,
            course_id INTEGER NOT NULL UNIQUE REFERENCES courses(id) ON DELETE CASCADE,
            name TEXT NOT NULL DEFAULT '',
            table_of_contents TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS course_sections (
            id INTEGER PRIMARY KEY,
            pdf_data_id INTEGER NOT NULL REFERENCES course_pdf_data(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_courses_category ON courses(category_id);
        CREATE INDEX IF NOT EXISTS idx_sections_pdf_data ON course_sections(pdf_data_id, position);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        params![SCHEMA_VERSION],
    )?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<Option<String>, CatalogError> {
    Ok(conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?)
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
    })
}

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    let kind: String = row.get(6)?;
    let kind = kind
        .parse::<MediaKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        pdf_file: row.get(3)?,
        video_file: row.get(4)?,
        image: row.get(5)?,
        kind,
        duration: row.get(7)?,
        rating: row.get(8)?,
        created_at: row.get(9)?,
        professor_id: row.get(10)?,
        category_id: row.get(11)?,
    })
}

pub fn insert_category(conn: &Connection, new: &NewCategory) -> Result<i64, CatalogError> {
    conn.execute(
        "INSERT INTO categories (name, description, image) VALUES (?1, ?2, ?3)",
        params![new.name, new.description, new.image],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Option<Category>, CatalogError> {
    let mut stmt =
        conn.prepare_cached("SELECT id, name, description, image FROM categories WHERE id = ?1")?;
    Ok(stmt.query_row(params![id], category_from_row).optional()?)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>, CatalogError> {
    let mut stmt =
        conn.prepare_cached("SELECT id, name, description, image FROM categories ORDER BY name")?;
    let rows = stmt.query_map([], category_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn insert_course(
    conn: &Connection,
    new: &NewCourse,
    created_at: i64,
) -> Result<i64, CatalogError> {
    conn.execute(
        "INSERT INTO courses (title, description, pdf_file, video_file, image, file_type, \
         duration, rating, created_at, professor_id, category_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0.0, ?8, ?9, ?10)",
        params![
            new.title,
            new.description,
            new.pdf_file,
            new.video_file,
            new.image,
            new.kind.as_str(),
            new.duration,
            created_at,
            new.professor_id,
            new.category_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_course(conn: &Connection, course: &Course) -> Result<(), CatalogError> {
    conn.execute(
        "UPDATE courses SET title = ?2, description = ?3, pdf_file = ?4, video_file = ?5, \
         image = ?6, file_type = ?7, duration = ?8, rating = ?9, category_id = ?10 \
         WHERE id = ?1",
        params![
            course.id,
            course.title,
            course.description,
            course.pdf_file,
            course.video_file,
            course.image,
            course.kind.as_str(),
            course.duration,
            course.rating,
            course.category_id,
        ],
    )?;
    Ok(())
}

pub fn get_course(conn: &Connection, id: i64) -> Result<Option<Course>, CatalogError> {
    let mut stmt =
        conn.prepare_cached(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"))?;
    Ok(stmt.query_row(params![id], course_from_row).optional()?)
}

pub fn list_courses(
    conn: &Connection,
    category_id: Option<i64>,
) -> Result<Vec<Course>, CatalogError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses \
         WHERE ?1 IS NULL OR category_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![category_id], course_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn delete_course(conn: &Connection, id: i64) -> Result<bool, CatalogError> {
    Ok(conn.execute("DELETE FROM courses WHERE id = ?1", params![id])? > 0)
}

/// Returns `(name, table_of_contents JSON)` for a course's sync record.
pub fn get_pdf_data(
    conn: &Connection,
    course_id: i64,
) -> Result<Option<(String, String)>, CatalogError> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, table_of_contents FROM course_pdf_data WHERE course_id = ?1",
    )?;
    Ok(stmt
        .query_row(params![course_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?)
}

/// Upsert the sync record and replace its sections in one transaction.
pub fn replace_pdf_data(
    conn: &Connection,
    course_id: i64,
    name: &str,
    toc_json: &str,
    sections: &[Section],
) -> Result<(), CatalogError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO course_pdf_data (course_id, name, table_of_contents) VALUES (?1, ?2, ?3) \
         ON CONFLICT(course_id) DO UPDATE SET name = excluded.name, \
         table_of_contents = excluded.table_of_contents",
        params![course_id, name, toc_json],
    )?;
    let pdf_data_id: i64 = tx.query_row(
        "SELECT id FROM course_pdf_data WHERE course_id = ?1",
        params![course_id],
        |row| row.get(0),
    )?;

    tx.execute(
        "DELETE FROM course_sections WHERE pdf_data_id = ?1",
        params![pdf_data_id],
    )?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO course_sections (pdf_data_id, title, content, position) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for section in sections {
            stmt.execute(params![
                pdf_data_id,
                section.title,
                section.content,
                section.order
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Sections cascade with the record.
pub fn delete_pdf_data(conn: &Connection, course_id: i64) -> Result<bool, CatalogError> {
    Ok(conn.execute(
        "DELETE FROM course_pdf_data WHERE course_id = ?1",
        params![course_id],
    )? > 0)
}

pub fn get_sections(conn: &Connection, course_id: i64) -> Result<Vec<Section>, CatalogError> {
    let mut stmt = conn.prepare_cached(
        "SELECT s.title, s.content, s.position FROM course_sections s \
         JOIN course_pdf_data d ON d.id = s.pdf_data_id \
         WHERE d.course_id = ?1 ORDER BY s.position",
    )?;
    let rows = stmt.query_map(params![course_id], |row| {
        Ok(Section {
            title: row.get(0)?,
            content: row.get(1)?,
            order: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn parse_toc(json: &str) -> Result<Vec<TocEntry>, CatalogError> {
    Ok(serde_json::from_str(json)?)
}
