use std::path::Path;

use mupdf::{Document, TextPageFlags};

use lectern_core::{BackendError, BlockBounds, PageBlocks, PdfBackend, TextBlock};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency so
/// that the rest of the workspace does not transitively depend on it.
///
/// Every text block of every page is returned with its bounds and its lines
/// joined by `\n`. Blocks without text lines (images) are dropped. Header and
/// footer bands can optionally be excluded, as a fraction of page height;
/// both are disabled by default.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    header_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    fn read_document(&self, document: &Document) -> Result<Vec<PageBlocks>, BackendError> {
        let mut pages = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let page_bounds = page
                .bounds()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let bands = Bands::new(
                page_bounds.y0,
                page_bounds.y1,
                self.header_exclusion_ratio,
                self.footer_exclusion_ratio,
            );

            let mut blocks = Vec::new();
            for block in text_page.blocks() {
                let rect = block.bounds();
                let bounds = BlockBounds {
                    x0: rect.x0,
                    y0: rect.y0,
                    x1: rect.x1,
                    y1: rect.y1,
                };
                if !bands.keeps(&bounds) {
                    continue;
                }

                let lines: Vec<String> = block
                    .lines()
                    .map(|line| {
                        line.chars()
                            .map(|c| c.char().unwrap_or('\u{FFFD}'))
                            .collect()
                    })
                    .collect();
                if lines.is_empty() {
                    continue;
                }
                blocks.push(TextBlock::new(bounds, lines.join("\n")));
            }
            pages.push(blocks);
        }

        Ok(pages)
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_blocks(&self, path: &Path) -> Result<Vec<PageBlocks>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;
        if !path.exists() {
            return Err(BackendError::OpenError(format!(
                "no such file: {}",
                path.display()
            )));
        }

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        self.read_document(&document)
    }

    fn extract_blocks_from_bytes(&self, data: &[u8]) -> Result<Vec<PageBlocks>, BackendError> {
        let document =
            Document::from_bytes(data, "pdf").map_err(|e| BackendError::OpenError(e.to_string()))?;
        self.read_document(&document)
    }
}

/// Vertical cut-offs for header/footer exclusion on one page.
#[derive(Debug, Clone, Copy)]
struct Bands {
    header: Option<f32>,
    footer: Option<f32>,
}

impl Bands {
    fn new(page_y0: f32, page_y1: f32, header_ratio: Option<f32>, footer_ratio: Option<f32>) -> Self {
        let height = page_y1 - page_y0;
        Self {
            header: header_ratio.map(|r| page_y0 + height * r),
            footer: footer_ratio.map(|r| page_y1 - height * r),
        }
    }

    /// Blocks entirely inside the header band, or starting inside the footer
    /// band, are dropped.
    fn keeps(&self, bounds: &BlockBounds) -> bool {
        if let Some(threshold) = self.header {
            if bounds.y1 <= threshold {
                return false;
            }
        }
        if let Some(threshold) = self.footer {
            if bounds.y0 >= threshold {
                return false;
            }
        }
        true
    }
}
