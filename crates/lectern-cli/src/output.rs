use std::io::Write;

use lectern_core::{Section, SyncOutcome, TocEntry};
use lectern_store::{Category, Course};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn heading(w: &mut dyn Write, text: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", text.bold())
    } else {
        writeln!(w, "{}", text)
    }
}

/// Print sections with their bodies, one block per section.
pub fn print_sections(
    w: &mut dyn Write,
    sections: &[Section],
    color: ColorMode,
) -> std::io::Result<()> {
    if sections.is_empty() {
        writeln!(w, "No sections.")?;
        return Ok(());
    }
    for section in sections {
        heading(w, &format!("[{}] {}", section.order, section.title), color)?;
        let body = section.content.trim_end();
        if !body.is_empty() {
            writeln!(w, "{}", body)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn print_toc(w: &mut dyn Write, toc: &[TocEntry], color: ColorMode) -> std::io::Result<()> {
    if toc.is_empty() {
        writeln!(w, "No table of contents.")?;
        return Ok(());
    }
    for entry in toc {
        if color.enabled() {
            writeln!(w, "{:>3}  {}", entry.order.dimmed(), entry.title)?;
        } else {
            writeln!(w, "{:>3}  {}", entry.order, entry.title)?;
        }
    }
    Ok(())
}

pub fn print_categories(
    w: &mut dyn Write,
    categories: &[Category],
    color: ColorMode,
) -> std::io::Result<()> {
    for category in categories {
        if color.enabled() {
            writeln!(w, "{:>4}  {}  {}", category.id, category.name.bold(), category.description.dimmed())?;
        } else {
            writeln!(w, "{:>4}  {}  {}", category.id, category.name, category.description)?;
        }
    }
    Ok(())
}

pub fn print_courses(w: &mut dyn Write, courses: &[Course], color: ColorMode) -> std::io::Result<()> {
    for course in courses {
        let file = match course.kind {
            lectern_core::MediaKind::Pdf => course.pdf_file.as_deref(),
            lectern_core::MediaKind::Video => course.video_file.as_deref(),
        }
        .unwrap_or("-");
        if color.enabled() {
            writeln!(
                w,
                "{:>4}  {}  [{}] {}",
                course.id,
                course.title.bold(),
                course.kind.cyan(),
                file.dimmed()
            )?;
        } else {
            writeln!(w, "{:>4}  {}  [{}] {}", course.id, course.title, course.kind, file)?;
        }
    }
    Ok(())
}

/// One-line summary of a course write and what happened to its sections.
pub fn print_saved(
    w: &mut dyn Write,
    verb: &str,
    course: &Course,
    outcome: &SyncOutcome,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "{} course {}: {}", verb, course.id, course.title)?;
    let detail = match outcome {
        SyncOutcome::Extracted { sections } => format!("extracted {} sections", sections),
        SyncOutcome::Cleared => "cleared derived sections".to_string(),
        SyncOutcome::Unchanged => "sections unchanged".to_string(),
        SyncOutcome::Skipped => "no pdf to process".to_string(),
        SyncOutcome::Failed { reason } => format!("section sync failed: {}", reason),
    };
    match (color.enabled(), outcome) {
        (true, SyncOutcome::Failed { .. }) => writeln!(w, "  {}", detail.red())?,
        (true, SyncOutcome::Extracted { .. }) => writeln!(w, "  {}", detail.green())?,
        (true, _) => writeln!(w, "  {}", detail.dimmed())?,
        (false, _) => writeln!(w, "  {}", detail)?,
    }
    Ok(())
}
