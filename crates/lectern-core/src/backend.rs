use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text blocks: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page-space rectangle of a text block, origin at the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockBounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// One layout block of a page. `text` holds the block's lines joined by `\n`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub bounds: BlockBounds,
    pub text: String,
}

impl TextBlock {
    pub fn new(bounds: BlockBounds, text: impl Into<String>) -> Self {
        Self {
            bounds,
            text: text.into(),
        }
    }
}

/// The text blocks of a single page, in whatever order the backend found them.
pub type PageBlocks = Vec<TextBlock>;

/// Trait for PDF text-block extraction backends.
///
/// Implementors only surface the raw blocks of each page; reading order and
/// section segmentation live in [`crate::extractor`].
pub trait PdfBackend: Send + Sync {
    /// Extract the text blocks of every page of the PDF at `path`.
    fn extract_blocks(&self, path: &Path) -> Result<Vec<PageBlocks>, BackendError>;

    /// Extract the text blocks of every page of an in-memory PDF.
    fn extract_blocks_from_bytes(&self, data: &[u8]) -> Result<Vec<PageBlocks>, BackendError>;
}

/// Sort a page's blocks top-to-bottom, then left-to-right.
///
/// Keyed on the bottom edge and then the left edge of each block. The sort is
/// stable, so blocks with identical keys keep their backend order.
pub fn sort_reading_order(blocks: &mut [TextBlock]) {
    blocks.sort_by(|a, b| {
        a.bounds
            .y1
            .total_cmp(&b.bounds.y1)
            .then(a.bounds.x0.total_cmp(&b.bounds.x0))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x0: f32, y1: f32, text: &str) -> TextBlock {
        TextBlock::new(
            BlockBounds {
                x0,
                y0: y1 - 10.0,
                x1: x0 + 100.0,
                y1,
            },
            text,
        )
    }

    #[test]
    fn sorts_by_bottom_then_left() {
        let mut blocks = vec![
            block(300.0, 120.0, "right column"),
            block(50.0, 300.0, "footer-ish"),
            block(50.0, 120.0, "left column"),
            block(50.0, 40.0, "title"),
        ];
        sort_reading_order(&mut blocks);
        let order: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(order, ["title", "left column", "right column", "footer-ish"]);
    }

    #[test]
    fn equal_keys_keep_backend_order() {
        let mut blocks = vec![block(10.0, 10.0, "first"), block(10.0, 10.0, "second")];
        sort_reading_order(&mut blocks);
        assert_eq!(blocks[0].text, "first");
        assert_eq!(blocks[1].text, "second");
    }
}
