//! # pagemill
//!
//! Convert PDF documents to plain text, CSV tables, page images, and
//! grayscale PDFs.
//!
//! ## Why this crate?
//!
//! The everyday PDF chores — "get me the text", "pull that table into a
//! spreadsheet", "make a grayscale copy for printing" — don't need OCR or a
//! hosted conversion service when the document has a text layer. This crate
//! reads positioned text straight out of the PDF via pdfium, reconstructs
//! lines and tables from glyph baselines, and pushes rendered pages through
//! a small pixel pipeline for the image-shaped outputs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2a. Text    read the text layer, group glyph runs (CPU, spawn_blocking)
//!  │   └─ Layout  baseline grouping → lines and tables → txt / CSV sheets
//!  ├─ 2b. Render  rasterise pages via pdfium (CPU, spawn_blocking)
//!  │   └─ Tone    BT.601 grayscale + contrast/brightness → PNG/JPEG/PDF
//!  └─ 3. Output   assembled document + per-page results and stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagemill::{to_text, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = to_text("document.pdf", &config).await?;
//!     println!("{}", output.text);
//!     eprintln!("{}/{} pages in {}ms",
//!         output.stats.processed_pages,
//!         output.stats.total_pages,
//!         output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagemill` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pagemill = { version = "0.3", default-features = false }
//! ```
//!
//! ## Table extraction, honestly
//!
//! Table detection is a positional heuristic over glyph baselines — no cell
//! borders, no font metrics. It is fast and works well on plainly set
//! tables; it will mis-group merged cells, multi-line cells, and tables with
//! irregular row heights. Check `TableOutput::sheets` before trusting the
//! grid. The thresholds live in [`LayoutThresholds`] if your documents need
//! different spacing.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ImageQuality, PageImageFormat, PageSelection,
    PageSeparator, TextLayout,
};
pub use convert::{
    inspect, to_grayscale_pdf, to_grayscale_pdf_from_bytes, to_grayscale_pdf_sync, to_images,
    to_images_from_bytes, to_images_sync, to_tables, to_tables_from_bytes, to_tables_sync,
    to_text, to_text_file, to_text_from_bytes, to_text_sync, write_output_file,
};
pub use error::{PageError, PagemillError};
pub use job::{Job, JobOutput, JobState, Operation};
pub use output::{
    ConversionStats, DocumentMetadata, ImageOutput, PageImage, PageTables, PageText, PdfOutput,
    Sheet, Table, TableOutput, TextOutput,
};
pub use pipeline::assemble::sheet_to_csv;
pub use pipeline::layout::{
    extract_tables, reconstruct_text, LayoutThresholds, PositionedGlyph, ROW_BREAK_THRESHOLD,
    TABLE_BREAK_THRESHOLD,
};
pub use pipeline::tone::{apply_tone, tone_value, ToneOptions};
pub use progress::{ConversionProgressCallback, ProgressCallback};
pub use stream::{stream_images, stream_text, ImageStream, TextStream};
