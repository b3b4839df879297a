//! Error types for the pagemill library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PagemillError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad input file, wrong password, invalid configuration). Returned as
//!   `Err(PagemillError)` from the top-level conversion functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (render glitch,
//!   broken text layer) but all other pages are fine. Stored inside the
//!   per-page result types in [`crate::output`] so callers can inspect
//!   partial success rather than losing the whole document to one bad page.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! page failure, log and continue, or collect all errors for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pagemill library.
///
/// Page-level failures use [`PageError`] and are stored in the per-page
/// result types rather than propagated here.
#[derive(Debug, Error)]
pub enum PagemillError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// Every selected page failed; output would be empty.
    #[error("All {total} pages failed during conversion.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by the `into_result` methods in [`crate::output`] when the
    /// caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed during conversion")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    /// A table sheet could not be serialised to CSV.
    #[error("Failed to encode sheet '{sheet}' as CSV: {detail}")]
    SheetEncodingFailed { sheet: String, detail: String },

    /// The output PDF could not be assembled from the transformed pages.
    #[error("Failed to assemble output PDF: {0}")]
    PdfAssemblyFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Job errors ────────────────────────────────────────────────────────
    /// A [`crate::job::Job`] action was attempted in a state that does not
    /// permit it.
    #[error("Cannot {action} while the job is {state}")]
    InvalidJobTransition {
        state: &'static str,
        action: &'static str,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside the per-page results in [`crate::output`] when a page
/// fails. The overall conversion continues unless ALL pages fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The page's text layer could not be read.
    #[error("Page {page}: text layer unreadable: {detail}")]
    TextLayerFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } => *page,
            PageError::TextLayerFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = PagemillError::PartialFailure {
            success: 9,
            failed: 1,
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
    }

    #[test]
    fn all_pages_failed_display() {
        let e = PagemillError::AllPagesFailed {
            total: 3,
            first_error: "text layer unreadable".into(),
        };
        assert!(e.to_string().contains("All 3 pages"));
        assert!(e.to_string().contains("text layer unreadable"));
    }

    #[test]
    fn invalid_transition_display() {
        let e = PagemillError::InvalidJobTransition {
            state: "idle",
            action: "convert",
        };
        assert_eq!(e.to_string(), "Cannot convert while the job is idle");
    }

    #[test]
    fn page_error_reports_page_number() {
        let e = PageError::TextLayerFailed {
            page: 7,
            detail: "broken".into(),
        };
        assert_eq!(e.page(), 7);
        assert!(e.to_string().contains("Page 7"));
    }
}
