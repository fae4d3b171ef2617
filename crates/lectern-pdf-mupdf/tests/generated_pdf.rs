//! Runs the MuPDF backend over small PDFs generated on the fly.

use lectern_core::{HeadingRules, MediaKind, PdfBackend, SectionExtractor, segment_pages};
use lectern_pdf_mupdf::MupdfBackend;

/// Build a single-page PDF with one Helvetica text object per `(y, text)`.
fn minimal_pdf(lines: &[(u32, &str)]) -> Vec<u8> {
    let mut content = String::new();
    for (y, text) in lines {
        content.push_str(&format!("BT /F1 12 Tf 72 {y} Td ({text}) Tj ET\n"));
    }

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}endstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }
    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

fn course_pdf() -> Vec<u8> {
    minimal_pdf(&[
        (740, "Course handout"),
        (640, "I. Introduction"),
        (560, "Body text one."),
        (400, "II. Methods"),
        (320, "Body text two."),
    ])
}

#[test]
fn blocks_carry_page_text() {
    let pages = MupdfBackend::new()
        .extract_blocks_from_bytes(&course_pdf())
        .unwrap();
    assert_eq!(pages.len(), 1);

    let text: String = pages[0].iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n");
    assert!(text.contains("I. Introduction"));
    assert!(text.contains("Body text two."));
}

#[test]
fn sections_come_out_in_reading_order() {
    let pages = MupdfBackend::new()
        .extract_blocks_from_bytes(&course_pdf())
        .unwrap();
    let result = segment_pages(pages, &HeadingRules::default());

    assert!(!result.sections.is_empty());
    assert_eq!(result.sections[0].title, "I. Introduction");
    assert_eq!(result.sections[0].order, 0);
    assert!(result.sections[0].content.contains("Body text one."));
    assert!(
        result
            .sections
            .iter()
            .all(|s| !s.content.contains("Course handout"))
    );
}

#[test]
fn extractor_reads_files_under_the_document_root() {
    let root = tempfile::tempdir().unwrap();
    let stored = root.path().join("courses").join("pdfs");
    std::fs::create_dir_all(&stored).unwrap();
    std::fs::write(stored.join("handout.pdf"), course_pdf()).unwrap();

    let extractor = SectionExtractor::new(MupdfBackend::new(), root.path());
    let result = extractor.extract(Some("courses/pdfs/handout.pdf"), MediaKind::Pdf);
    assert_eq!(result.sections[0].title, "I. Introduction");
    assert_eq!(result.table_of_contents[0].title, "I. Introduction");

    let missing = extractor.extract(Some("courses/pdfs/missing.pdf"), MediaKind::Pdf);
    assert!(missing.is_empty());
}
