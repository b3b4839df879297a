//! End-to-end integration tests for pagemill.
//!
//! These tests use real PDF files in `./test_cases/` and need a pdfium
//! library on the loader path. They are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly
//! requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_inspect -- --nocapture

use pagemill::{
    to_grayscale_pdf, to_images, to_tables, to_text, inspect, ConversionConfig, PageImageFormat,
    PageSelection, TextLayout,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Assert the extracted text passes basic quality checks.
fn assert_text_quality(text: &str, context: &str) {
    assert!(!text.trim().is_empty(), "[{context}] Text is empty");

    // Must end with newline (normalised by the cleanup pass)
    assert!(
        text.ends_with('\n'),
        "[{context}] Text must end with a newline"
    );

    // No carriage returns after cleanup
    assert!(!text.contains('\r'), "[{context}] Text contains CR");

    // No invisible Unicode junk
    let invisible = ['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'];
    for ch in invisible {
        assert!(
            !text.contains(ch),
            "[{context}] Text contains invisible char U+{:04X}",
            ch as u32
        );
    }

    println!("[{context}] ✓  {} bytes, quality checks passed", text.len());
}

// ── Inspect tests (instant) ──────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_sample() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let meta = inspect(path.to_str().unwrap())
        .await
        .expect("inspect() should succeed");

    assert!(meta.page_count >= 1, "Sample should have at least one page");
    assert!(!meta.pdf_version.is_empty());

    println!("Metadata: {:?}", meta);
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }

    let result = inspect("/definitely/not/a/real/file.pdf").await;
    assert!(
        result.is_err(),
        "inspect() should return Err for nonexistent file"
    );
}

// ── Page-selection unit tests (no pdfium) ────────────────────────────────────

#[test]
fn test_page_selection_out_of_range_is_empty() {
    // Page 100 of a 4-page doc should yield no indices
    assert_eq!(
        PageSelection::Single(100).to_indices(4),
        Vec::<usize>::new()
    );
}

#[test]
fn test_page_selection_range_clipping() {
    // Range 3-10 on a 4-page doc → pages 3 and 4 (indices 2, 3)
    let indices = PageSelection::Range(3, 10).to_indices(4);
    assert_eq!(indices, vec![2, 3]);
}

// ── Text extraction ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_text_extraction() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ConversionConfig::default();
    let result = to_text(path.to_str().unwrap(), &config)
        .await
        .expect("text extraction should succeed");

    assert!(result.stats.processed_pages >= 1);
    assert_eq!(result.stats.failed_pages, 0, "No pages should fail");
    assert_text_quality(&result.text, "text");

    std::fs::write(output_dir().join("sample.txt"), &result.text).ok();
}

#[tokio::test]
async fn test_text_structured_headers() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ConversionConfig::builder()
        .text_layout(TextLayout::Structured)
        .pages(PageSelection::Single(1))
        .build()
        .expect("valid config");

    let result = to_text(path.to_str().unwrap(), &config)
        .await
        .expect("text extraction should succeed");

    assert!(
        result.text.starts_with("Page 1\n"),
        "Structured layout should start with a page header, got: {:?}",
        result.text.lines().next()
    );
    assert!(result.text.contains(&"-".repeat(40)));
}

// ── Table extraction ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_table_extraction() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("tables.pdf"));

    let config = ConversionConfig::default();
    let result = to_tables(path.to_str().unwrap(), &config)
        .await
        .expect("table extraction should succeed");

    assert_eq!(result.stats.failed_pages, 0);

    // Sheet naming contract: Page {p} Table {n}
    for sheet in &result.sheets {
        assert!(
            sheet.name.starts_with("Page "),
            "Sheet name format: {}",
            sheet.name
        );
        assert!(!sheet.rows.is_empty(), "Sheets never carry empty grids");
        // The emission heuristic: first row always has more than one cell
        assert!(
            sheet.rows[0].len() > 1,
            "First row of an emitted table must have >1 cell"
        );
    }

    println!("{} sheets extracted", result.sheets.len());
}

// ── Image rendering ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_images_png() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .build()
        .expect("valid config");

    let result = to_images(path.to_str().unwrap(), &config)
        .await
        .expect("image rendering should succeed");

    assert_eq!(result.pages.len(), 1);
    let page = &result.pages[0];
    assert!(page.error.is_none());
    assert!(page.width > 0 && page.height > 0);
    assert_eq!(
        &page.bytes[..8],
        &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        "PNG magic bytes"
    );
}

#[tokio::test]
async fn test_images_grayscale_jpeg() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .image_format(PageImageFormat::Jpeg)
        .grayscale_images(true)
        .contrast(1.2)
        .build()
        .expect("valid config");

    let result = to_images(path.to_str().unwrap(), &config)
        .await
        .expect("image rendering should succeed");

    let page = &result.pages[0];
    assert_eq!(&page.bytes[..2], &[0xFF, 0xD8], "JPEG magic bytes");
}

// ── Grayscale PDF ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_grayscale_pdf() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let config = ConversionConfig::builder()
        .contrast(1.0)
        .brightness(1.0)
        .build()
        .expect("valid config");

    let result = to_grayscale_pdf(path.to_str().unwrap(), &config)
        .await
        .expect("grayscale conversion should succeed");

    assert!(result.page_count >= 1);
    assert_eq!(&result.bytes[..4], b"%PDF", "Output must be a PDF");
    assert!(
        result.bytes.len() > 500,
        "Output suspiciously small: {} bytes",
        result.bytes.len()
    );

    std::fs::write(output_dir().join("grayscale.pdf"), &result.bytes).ok();
}
