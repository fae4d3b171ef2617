//! Segment a PDF's text blocks into titled sections.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::backend::{PageBlocks, PdfBackend, sort_reading_order};
use crate::headings::HeadingRules;
use crate::{CourseDocument, ExtractionResult, MediaKind, Section, TocEntry};

/// Accumulator threaded through the ordered block sequence.
struct SectionFold<'r> {
    rules: &'r HeadingRules,
    sections: Vec<Section>,
    table_of_contents: Vec<TocEntry>,
    seen_titles: HashSet<String>,
    current: Option<Section>,
    next_order: u32,
}

impl<'r> SectionFold<'r> {
    fn new(rules: &'r HeadingRules) -> Self {
        Self {
            rules,
            sections: Vec::new(),
            table_of_contents: Vec::new(),
            seen_titles: HashSet::new(),
            current: None,
            next_order: 0,
        }
    }

    fn push_block(&mut self, raw: &str) {
        let block_text = raw.trim();
        let mut lines = block_text.split('\n');
        let first_line = lines.next().unwrap_or_default().trim();

        if self.rules.is_section_title(first_line) && !self.seen_titles.contains(first_line) {
            if let Some(done) = self.current.take() {
                self.sections.push(done);
            }
            let section = Section {
                title: first_line.to_string(),
                content: lines.collect::<Vec<_>>().join("\n"),
                order: self.next_order,
            };
            self.table_of_contents.push(TocEntry::from(&section));
            self.seen_titles.insert(section.title.clone());
            self.current = Some(section);
            self.next_order += 1;
        } else if let Some(current) = self.current.as_mut() {
            current.content.push_str(block_text);
            current.content.push('\n');
        }
        // Text before the first heading has no section to land in.
    }

    fn finish(mut self) -> ExtractionResult {
        if let Some(done) = self.current.take() {
            self.sections.push(done);
        }
        ExtractionResult {
            sections: self.sections,
            table_of_contents: self.table_of_contents,
        }
    }
}

/// Fold the pages of a document into sections.
///
/// Pages are taken in order; the blocks of each page are first put into
/// reading order with [`sort_reading_order`].
pub fn segment_pages(pages: Vec<PageBlocks>, rules: &HeadingRules) -> ExtractionResult {
    let mut fold = SectionFold::new(rules);
    for mut page in pages {
        sort_reading_order(&mut page);
        for block in &page {
            fold.push_block(&block.text);
        }
    }
    fold.finish()
}

/// Runs a [`PdfBackend`] over stored course documents.
///
/// Extraction is best-effort: every failure is logged and turned into an
/// empty [`ExtractionResult`], never returned to the caller.
pub struct SectionExtractor<B> {
    backend: B,
    document_root: PathBuf,
    rules: HeadingRules,
}

impl<B: PdfBackend> SectionExtractor<B> {
    pub fn new(backend: B, document_root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            document_root: document_root.into(),
            rules: HeadingRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: HeadingRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    pub fn rules(&self) -> &HeadingRules {
        &self.rules
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resolve a stored relative name under the document root.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.document_root.join(name)
    }

    /// Extract sections from a stored document. Anything but a PDF with a
    /// file name short-circuits to an empty result.
    pub fn extract(&self, file: Option<&str>, kind: MediaKind) -> ExtractionResult {
        let name = match file.filter(|name| !name.is_empty()) {
            Some(name) if kind == MediaKind::Pdf => name,
            _ => {
                tracing::debug!(
                    file = file.unwrap_or("N/A"),
                    kind = %kind,
                    "extraction skipped: not a pdf or no file"
                );
                return ExtractionResult::default();
            }
        };
        self.extract_path(&self.resolve(name))
    }

    pub fn extract_document(&self, document: &CourseDocument) -> ExtractionResult {
        self.extract(document.file.as_deref(), document.kind)
    }

    /// Extract sections from a PDF at an absolute or caller-relative path.
    pub fn extract_path(&self, path: &Path) -> ExtractionResult {
        match self.backend.extract_blocks(path) {
            Ok(pages) => {
                let result = segment_pages(pages, &self.rules);
                tracing::info!(
                    path = %path.display(),
                    sections = result.sections.len(),
                    "extracted sections"
                );
                result
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to extract sections from pdf");
                ExtractionResult::default()
            }
        }
    }

    /// Extract sections from an in-memory PDF.
    pub fn extract_bytes(&self, data: &[u8], kind: MediaKind) -> ExtractionResult {
        if kind != MediaKind::Pdf {
            tracing::debug!(kind = %kind, "extraction skipped: not a pdf");
            return ExtractionResult::default();
        }
        match self.backend.extract_blocks_from_bytes(data) {
            Ok(pages) => {
                let result = segment_pages(pages, &self.rules);
                tracing::info!(
                    bytes = data.len(),
                    sections = result.sections.len(),
                    "extracted sections"
                );
                result
            }
            Err(e) => {
                tracing::error!(bytes = data.len(), error = %e, "failed to extract sections from pdf");
                ExtractionResult::default()
            }
        }
    }
}
