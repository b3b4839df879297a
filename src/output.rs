//! Output types: per-page results, per-operation outputs, and statistics.
//!
//! Every operation returns `Ok` even when individual pages failed — the
//! failures travel inside the per-page results so callers can inspect
//! partial success. Use the `into_result` methods to upgrade any page
//! failure into a [`PagemillError::PartialFailure`] when strict behaviour
//! is wanted.

use crate::error::{PageError, PagemillError};
use serde::{Deserialize, Serialize};

pub use crate::pipeline::layout::Table;

/// Document-level metadata read from the PDF info dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    /// Total pages in the document (not the selection).
    pub page_count: usize,
    pub pdf_version: String,
}

/// Timing and page-count statistics for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Total pages in the source document.
    pub total_pages: usize,
    /// Selected pages that converted successfully.
    pub processed_pages: usize,
    /// Selected pages that failed.
    pub failed_pages: usize,
    /// Selected pages that were skipped (out of range).
    pub skipped_pages: usize,
    /// Wall-clock duration of the whole conversion.
    pub total_duration_ms: u64,
    /// Time spent in pdfium (rendering or text-layer reads).
    pub render_duration_ms: u64,
    /// Time spent in layout/tone transforms and output assembly.
    pub transform_duration_ms: u64,
}

// ── Per-page results ─────────────────────────────────────────────────────

/// One page's extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Reconstructed (and cleaned) page text; empty when `error` is set.
    pub text: String,
    /// Number of glyph runs the text layer produced for this page.
    pub glyph_count: usize,
    /// Wall-clock time spent on this page.
    pub duration_ms: u64,
    /// Set when the page failed; the other fields are then empty defaults.
    pub error: Option<PageError>,
}

/// One page's extracted tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTables {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Tables in encounter order; empty when the page had none (prose-only
    /// pages are normal, not an error).
    pub tables: Vec<Table>,
    /// Number of glyph runs the text layer produced for this page.
    pub glyph_count: usize,
    /// Wall-clock time spent on this page.
    pub duration_ms: u64,
    /// Set when the page failed.
    pub error: Option<PageError>,
}

/// One page rendered (and possibly tone-transformed) to an encoded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Pixel dimensions of the encoded image.
    pub width: u32,
    pub height: u32,
    /// The encoded bytes. Skipped in JSON output — serialise the metadata,
    /// not megabytes of pixels.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Wall-clock time spent on this page.
    pub duration_ms: u64,
    /// Set when the page failed.
    pub error: Option<PageError>,
}

/// A named sheet: one extracted table destined for one CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name, `Page {page} Table {n}`.
    pub name: String,
    /// 1-indexed source page.
    pub page_num: usize,
    /// Cell grid, ragged rows allowed.
    pub rows: Vec<Vec<String>>,
}

// ── Per-operation outputs ────────────────────────────────────────────────

/// Result of the text operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextOutput {
    /// The assembled document text.
    pub text: String,
    /// Per-page results, sorted by page number.
    pub pages: Vec<PageText>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

/// Result of the tables operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutput {
    /// One sheet per extracted table, in page order.
    pub sheets: Vec<Sheet>,
    /// Per-page results, sorted by page number.
    pub pages: Vec<PageTables>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

/// Result of the images operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOutput {
    /// Per-page encoded images, sorted by page number.
    pub pages: Vec<PageImage>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

/// Result of the grayscale-PDF operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfOutput {
    /// The assembled PDF. Skipped in JSON output.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Number of pages in the output document.
    pub page_count: usize,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

fn strict(stats: &ConversionStats) -> Result<(), PagemillError> {
    if stats.failed_pages > 0 {
        Err(PagemillError::PartialFailure {
            success: stats.processed_pages,
            failed: stats.failed_pages,
            total: stats.processed_pages + stats.failed_pages,
        })
    } else {
        Ok(())
    }
}

impl TextOutput {
    /// Treat any page failure as an error.
    pub fn into_result(self) -> Result<Self, PagemillError> {
        strict(&self.stats)?;
        Ok(self)
    }
}

impl TableOutput {
    /// Treat any page failure as an error.
    pub fn into_result(self) -> Result<Self, PagemillError> {
        strict(&self.stats)?;
        Ok(self)
    }
}

impl ImageOutput {
    /// Treat any page failure as an error.
    pub fn into_result(self) -> Result<Self, PagemillError> {
        strict(&self.stats)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(processed: usize, failed: usize) -> ConversionStats {
        ConversionStats {
            total_pages: processed + failed,
            processed_pages: processed,
            failed_pages: failed,
            ..Default::default()
        }
    }

    fn meta() -> DocumentMetadata {
        DocumentMetadata {
            title: None,
            author: None,
            subject: None,
            creator: None,
            producer: None,
            creation_date: None,
            modification_date: None,
            page_count: 0,
            pdf_version: String::new(),
        }
    }

    #[test]
    fn into_result_passes_clean_output() {
        let output = TextOutput {
            text: "ok\n".into(),
            pages: vec![],
            metadata: meta(),
            stats: stats(3, 0),
        };
        assert!(output.into_result().is_ok());
    }

    #[test]
    fn into_result_rejects_partial_failure() {
        let output = TextOutput {
            text: "ok\n".into(),
            pages: vec![],
            metadata: meta(),
            stats: stats(2, 1),
        };
        let err = output.into_result().unwrap_err();
        assert!(matches!(
            err,
            PagemillError::PartialFailure {
                success: 2,
                failed: 1,
                total: 3
            }
        ));
    }

    #[test]
    fn page_image_bytes_are_not_serialised() {
        let page = PageImage {
            page_num: 1,
            width: 10,
            height: 10,
            bytes: vec![1, 2, 3],
            duration_ms: 5,
            error: None,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(!json.contains("bytes"));
        assert!(json.contains("\"width\":10"));
    }
}
