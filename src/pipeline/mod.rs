//! Pipeline stages for PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! text path:   input ──▶ text ──▶ layout ──▶ postprocess ──▶ assemble
//!              (URL/path) (glyphs) (lines/tables) (cleanup)    (txt/csv)
//!
//! raster path: input ──▶ render ──▶ tone ──▶ assemble
//!              (URL/path) (pdfium)  (pixels)  (png/jpeg/pdf)
//! ```
//!
//! 1. [`input`]  — canonicalise the user-supplied path or URL to a local file
//! 2. [`text`]   — read positioned characters from the page text layer and
//!    group them into glyph runs; runs in `spawn_blocking` because pdfium is
//!    not async-safe
//! 3. [`layout`] — pure layout reconstruction: glyph runs → lines and tables
//! 4. [`render`] — rasterise selected pages; also `spawn_blocking`
//! 5. [`tone`]   — pure per-pixel grayscale/contrast/brightness transform
//! 6. [`postprocess`] — deterministic text-cleanup rules
//! 7. [`assemble`] — per-page results → output bytes (txt, CSV, PNG/JPEG, PDF)

pub mod assemble;
pub mod input;
pub mod layout;
pub mod postprocess;
pub mod render;
pub mod text;
pub mod tone;
