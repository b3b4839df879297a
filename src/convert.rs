//! Eager (full-document) conversion entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: wait for all pages, then return.
//! It collects every per-page result into memory and assembles the final
//! output before returning. Use [`crate::stream`] instead when you want
//! pages progressively or need to limit peak memory use on documents with
//! hundreds of pages.
//!
//! Every operation shares the same prologue (resolve input → read metadata
//! → expand the page selection) and the same page-failure policy: per-page
//! errors are collected, not propagated, and only an all-pages failure is
//! fatal. The grayscale operation is the one exception — a grayscale copy
//! with silently missing pages would change pagination, so there any page
//! failure is an error.

use crate::config::ConversionConfig;
use crate::error::{PageError, PagemillError};
use crate::output::{
    ConversionStats, DocumentMetadata, ImageOutput, PageImage, PageTables, PageText, PdfOutput,
    Sheet, TableOutput, TextOutput,
};
use crate::pipeline::{assemble, input, layout, postprocess, render, text, tone};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

// ── Shared prologue ──────────────────────────────────────────────────────

/// Everything every operation needs before page work can start.
struct Prepared {
    resolved: input::ResolvedInput,
    metadata: DocumentMetadata,
    page_indices: Vec<usize>,
}

/// Resolve the input, read document metadata, and expand the page selection.
///
/// Fires `on_conversion_start` once the number of selected pages is known.
async fn prepare(input_str: &str, config: &ConversionConfig) -> Result<Prepared, PagemillError> {
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    let metadata = render::extract_metadata(resolved.path(), config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(PagemillError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for conversion", page_indices.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(page_indices.len());
    }

    Ok(Prepared {
        resolved,
        metadata,
        page_indices,
    })
}

/// Fail the conversion when no page succeeded at all.
fn ensure_any_success<E: std::fmt::Display>(
    errors: impl Iterator<Item = E>,
    processed: usize,
    total: usize,
) -> Result<(), PagemillError> {
    if processed == 0 {
        let first_error = errors
            .map(|e| e.to_string())
            .next()
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(PagemillError::AllPagesFailed { total, first_error });
    }
    Ok(())
}

// ── Text operation ───────────────────────────────────────────────────────

/// Convert a PDF file or URL to plain text.
///
/// # Returns
/// `Ok(TextOutput)` on success, even if some pages failed
/// (check `output.stats.failed_pages`, or call `into_result()`).
///
/// # Errors
/// Returns `Err(PagemillError)` only for fatal errors:
/// - File not found / permission denied / not a valid PDF
/// - Wrong or missing password
/// - All pages failed and no output produced
pub async fn to_text(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TextOutput, PagemillError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting text conversion: {}", input_str);

    let prepared = prepare(input_str, config).await?;
    let pdf_path = prepared.resolved.path().to_path_buf();

    // ── Read the text layer ──────────────────────────────────────────────
    let extract_start = Instant::now();
    let extracted = text::extract_glyphs(&pdf_path, config, &prepared.page_indices).await?;
    let render_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Reconstruct and clean each page ──────────────────────────────────
    let transform_start = Instant::now();
    let total = extracted.len();
    let mut pages: Vec<PageText> = Vec::with_capacity(total);

    for (idx, glyphs) in extracted {
        let page_num = idx + 1;
        let page_start = Instant::now();
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total);
        }

        let page = match glyphs {
            Ok(glyphs) => {
                let raw = layout::reconstruct_text(&glyphs, &config.thresholds);
                let cleaned = if config.normalize_whitespace {
                    format!("{}\n", postprocess::normalise_whitespace(&raw))
                } else {
                    postprocess::clean_text(&raw)
                };
                PageText {
                    page_num,
                    text: cleaned,
                    glyph_count: glyphs.len(),
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Page {} failed: {}", page_num, e);
                PageText {
                    page_num,
                    text: String::new(),
                    glyph_count: 0,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: Some(e),
                }
            }
        };

        if let Some(ref cb) = config.progress_callback {
            match &page.error {
                None => cb.on_page_complete(page_num, total, page.text.len()),
                Some(e) => cb.on_page_error(page_num, total, e.to_string()),
            }
        }
        pages.push(page);
    }

    pages.sort_by_key(|p| p.page_num);
    let transform_duration_ms = transform_start.elapsed().as_millis() as u64;

    let processed = pages.iter().filter(|p| p.error.is_none()).count();
    let failed = pages.len() - processed;
    ensure_any_success(
        pages.iter().filter_map(|p| p.error.as_ref()),
        processed,
        pages.len(),
    )?;

    // ── Assemble the document ────────────────────────────────────────────
    let text = assemble::assemble_text(&pages, config, &prepared.metadata);

    let stats = ConversionStats {
        total_pages: prepared.metadata.page_count,
        processed_pages: processed,
        failed_pages: failed,
        skipped_pages: prepared.page_indices.len().saturating_sub(pages.len()),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        transform_duration_ms,
    };

    info!(
        "Text conversion complete: {}/{} pages, {}ms total",
        processed, stats.total_pages, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, processed);
    }

    Ok(TextOutput {
        text,
        pages,
        metadata: prepared.metadata,
        stats,
    })
}

// ── Tables operation ─────────────────────────────────────────────────────

/// Extract tables from a PDF file or URL into CSV-ready sheets.
///
/// Every detected table becomes one [`Sheet`] named `Page {p} Table {n}`.
/// A page without tables is a normal success with an empty table list —
/// prose pages are expected, not errors.
pub async fn to_tables(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TableOutput, PagemillError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting table extraction: {}", input_str);

    let prepared = prepare(input_str, config).await?;
    let pdf_path = prepared.resolved.path().to_path_buf();

    let extract_start = Instant::now();
    let extracted = text::extract_glyphs(&pdf_path, config, &prepared.page_indices).await?;
    let render_duration_ms = extract_start.elapsed().as_millis() as u64;

    let transform_start = Instant::now();
    let total = extracted.len();
    let mut pages: Vec<PageTables> = Vec::with_capacity(total);

    for (idx, glyphs) in extracted {
        let page_num = idx + 1;
        let page_start = Instant::now();
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total);
        }

        let page = match glyphs {
            Ok(glyphs) => {
                let tables = layout::extract_tables(&glyphs, &config.thresholds);
                debug!("Page {}: {} tables", page_num, tables.len());
                PageTables {
                    page_num,
                    tables,
                    glyph_count: glyphs.len(),
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Page {} failed: {}", page_num, e);
                PageTables {
                    page_num,
                    tables: Vec::new(),
                    glyph_count: 0,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: Some(e),
                }
            }
        };

        if let Some(ref cb) = config.progress_callback {
            match &page.error {
                None => {
                    let cells: usize = page
                        .tables
                        .iter()
                        .flat_map(|t| t.rows.iter())
                        .map(|r| r.iter().map(String::len).sum::<usize>())
                        .sum();
                    cb.on_page_complete(page_num, total, cells);
                }
                Some(e) => cb.on_page_error(page_num, total, e.to_string()),
            }
        }
        pages.push(page);
    }

    pages.sort_by_key(|p| p.page_num);
    let transform_duration_ms = transform_start.elapsed().as_millis() as u64;

    let processed = pages.iter().filter(|p| p.error.is_none()).count();
    let failed = pages.len() - processed;
    ensure_any_success(
        pages.iter().filter_map(|p| p.error.as_ref()),
        processed,
        pages.len(),
    )?;

    // ── Fold tables into named sheets, in page order ─────────────────────
    let mut sheets: Vec<Sheet> = Vec::new();
    for page in pages.iter().filter(|p| p.error.is_none()) {
        for (table_idx, table) in page.tables.iter().enumerate() {
            sheets.push(Sheet {
                name: format!("Page {} Table {}", page.page_num, table_idx + 1),
                page_num: page.page_num,
                rows: table.rows.clone(),
            });
        }
    }

    let stats = ConversionStats {
        total_pages: prepared.metadata.page_count,
        processed_pages: processed,
        failed_pages: failed,
        skipped_pages: prepared.page_indices.len().saturating_sub(pages.len()),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        transform_duration_ms,
    };

    info!(
        "Table extraction complete: {} sheets from {}/{} pages, {}ms total",
        sheets.len(),
        processed,
        stats.total_pages,
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, processed);
    }

    Ok(TableOutput {
        sheets,
        pages,
        metadata: prepared.metadata,
        stats,
    })
}

// ── Images operation ─────────────────────────────────────────────────────

/// Render a PDF's pages to encoded images (PNG or JPEG).
///
/// With `grayscale_images` set, each page goes through the tone transform
/// first. Pages are transformed concurrently — they are independent, and
/// results are re-sorted by page number afterwards.
pub async fn to_images(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ImageOutput, PagemillError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting image conversion: {}", input_str);

    let prepared = prepare(input_str, config).await?;
    let pdf_path = prepared.resolved.path().to_path_buf();

    let render_start = Instant::now();
    let rendered = render::render_pages(&pdf_path, config, &prepared.page_indices).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", rendered.len(), render_duration_ms);

    let transform_start = Instant::now();
    let total = rendered.len();

    let mut pages: Vec<PageImage> = stream::iter(rendered.into_iter().map(|page| {
        let config = config.clone();
        async move {
            let page_num = page.index + 1;
            let page_start = Instant::now();
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_start(page_num, total);
            }

            let result = match page.image {
                Ok(img) => {
                    let cfg = config.clone();
                    tokio::task::spawn_blocking(move || transform_and_encode(img, &cfg))
                        .await
                        .map_err(|e| PageError::RenderFailed {
                            page: page_num,
                            detail: format!("transform task panicked: {}", e),
                        })
                        .and_then(|r| {
                            r.map_err(|e| PageError::RenderFailed {
                                page: page_num,
                                detail: e.to_string(),
                            })
                        })
                }
                Err(e) => Err(e),
            };

            let page = match result {
                Ok((bytes, width, height)) => PageImage {
                    page_num,
                    width,
                    height,
                    bytes,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: None,
                },
                Err(e) => {
                    warn!("Page {} failed: {}", page_num, e);
                    PageImage {
                        page_num,
                        width: 0,
                        height: 0,
                        bytes: Vec::new(),
                        duration_ms: page_start.elapsed().as_millis() as u64,
                        error: Some(e),
                    }
                }
            };

            if let Some(ref cb) = config.progress_callback {
                match &page.error {
                    None => cb.on_page_complete(page_num, total, page.bytes.len()),
                    Some(e) => cb.on_page_error(page_num, total, e.to_string()),
                }
            }
            page
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    pages.sort_by_key(|p| p.page_num);
    let transform_duration_ms = transform_start.elapsed().as_millis() as u64;

    let processed = pages.iter().filter(|p| p.error.is_none()).count();
    let failed = pages.len() - processed;
    ensure_any_success(
        pages.iter().filter_map(|p| p.error.as_ref()),
        processed,
        pages.len(),
    )?;

    let stats = ConversionStats {
        total_pages: prepared.metadata.page_count,
        processed_pages: processed,
        failed_pages: failed,
        skipped_pages: prepared.page_indices.len().saturating_sub(pages.len()),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        transform_duration_ms,
    };

    info!(
        "Image conversion complete: {}/{} pages, {}ms total",
        processed, stats.total_pages, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, processed);
    }

    Ok(ImageOutput {
        pages,
        metadata: prepared.metadata,
        stats,
    })
}

/// Tone (optionally) and encode one rendered page. CPU-bound; runs inside
/// `spawn_blocking`.
pub(crate) fn transform_and_encode(
    img: DynamicImage,
    config: &ConversionConfig,
) -> Result<(Vec<u8>, u32, u32), PagemillError> {
    let img = if config.grayscale_images {
        DynamicImage::ImageRgba8(tone::apply_tone(&img.to_rgba8(), &config.tone))
    } else {
        img
    };
    let (width, height) = (img.width(), img.height());
    let bytes = assemble::encode_image(&img, config.image_format, config.image_quality)?;
    Ok((bytes, width, height))
}

// ── Grayscale operation ──────────────────────────────────────────────────

/// Convert a PDF to a grayscale copy.
///
/// Every selected page is rendered, tone-transformed, and re-embedded as a
/// full-page image at the source page's point size. Unlike the other
/// operations, any page failure is fatal here: a grayscale copy with
/// missing pages would silently change pagination.
pub async fn to_grayscale_pdf(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<PdfOutput, PagemillError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting grayscale conversion: {}", input_str);

    let prepared = prepare(input_str, config).await?;
    let pdf_path = prepared.resolved.path().to_path_buf();

    let render_start = Instant::now();
    let rendered = render::render_pages(&pdf_path, config, &prepared.page_indices).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let transform_start = Instant::now();
    let total = rendered.len();

    let mut toned: Vec<(usize, Result<assemble::PdfPageImage, PageError>)> =
        stream::iter(rendered.into_iter().map(|page| {
            let config = config.clone();
            async move {
                let page_num = page.index + 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_start(page_num, total);
                }

                let result = match page.image {
                    Ok(img) => {
                        let tone_options = config.tone;
                        let (width_pts, height_pts) = (page.width_pts, page.height_pts);
                        tokio::task::spawn_blocking(move || {
                            let gray = tone::apply_tone(&img.to_rgba8(), &tone_options);
                            assemble::PdfPageImage {
                                image: DynamicImage::ImageRgba8(gray),
                                width_pts,
                                height_pts,
                            }
                        })
                        .await
                        .map_err(|e| PageError::RenderFailed {
                            page: page_num,
                            detail: format!("tone task panicked: {}", e),
                        })
                    }
                    Err(e) => Err(e),
                };

                if let Some(ref cb) = config.progress_callback {
                    match &result {
                        Ok(p) => cb.on_page_complete(
                            page_num,
                            total,
                            (p.image.width() * p.image.height() * 4) as usize,
                        ),
                        Err(e) => cb.on_page_error(page_num, total, e.to_string()),
                    }
                }
                (page.index, result)
            }
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    toned.sort_by_key(|(idx, _)| *idx);

    let failed: Vec<&PageError> = toned
        .iter()
        .filter_map(|(_, r)| r.as_ref().err())
        .collect();
    if !failed.is_empty() {
        let success = toned.len() - failed.len();
        if success == 0 {
            return Err(PagemillError::AllPagesFailed {
                total: toned.len(),
                first_error: failed[0].to_string(),
            });
        }
        return Err(PagemillError::PartialFailure {
            success,
            failed: failed.len(),
            total: toned.len(),
        });
    }

    let page_images: Vec<assemble::PdfPageImage> = toned
        .into_iter()
        .filter_map(|(_, r)| r.ok())
        .collect();

    let title = prepared
        .metadata
        .title
        .clone()
        .unwrap_or_else(|| "Grayscale document".to_string());
    let bytes = assemble::assemble_pdf(&title, &page_images)?;
    let transform_duration_ms = transform_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        total_pages: prepared.metadata.page_count,
        processed_pages: page_images.len(),
        failed_pages: 0,
        skipped_pages: prepared.page_indices.len().saturating_sub(total),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        transform_duration_ms,
    };

    info!(
        "Grayscale conversion complete: {} pages, {} bytes, {}ms total",
        stats.processed_pages,
        bytes.len(),
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, stats.processed_pages);
    }

    Ok(PdfOutput {
        bytes,
        page_count: stats.processed_pages,
        metadata: prepared.metadata,
        stats,
    })
}

// ── Inspect ──────────────────────────────────────────────────────────────

/// Extract PDF metadata without converting content.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, PagemillError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    render::extract_metadata(&pdf_path, None).await
}

// ── File output ──────────────────────────────────────────────────────────

/// Write output bytes to a file atomically (temp file + rename), creating
/// parent directories as needed. Prevents partial files on interruption.
pub async fn write_output_file(
    path: impl AsRef<Path>,
    bytes: &[u8],
) -> Result<(), PagemillError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PagemillError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| PagemillError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| PagemillError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}

/// Convert a PDF to text and write the result directly to a file.
pub async fn to_text_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, PagemillError> {
    let output = to_text(input_str, config).await?;
    write_output_file(output_path, output.text.as_bytes()).await?;
    Ok(output.stats)
}

// ── Sync wrappers ────────────────────────────────────────────────────────

fn block_on<F, T>(fut: F) -> Result<T, PagemillError>
where
    F: std::future::Future<Output = Result<T, PagemillError>>,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| PagemillError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(fut)
}

/// Synchronous wrapper around [`to_text`]. Creates a temporary tokio
/// runtime internally.
pub fn to_text_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TextOutput, PagemillError> {
    block_on(to_text(input_str, config))
}

/// Synchronous wrapper around [`to_tables`].
pub fn to_tables_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TableOutput, PagemillError> {
    block_on(to_tables(input_str, config))
}

/// Synchronous wrapper around [`to_images`].
pub fn to_images_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ImageOutput, PagemillError> {
    block_on(to_images(input_str, config))
}

/// Synchronous wrapper around [`to_grayscale_pdf`].
pub fn to_grayscale_pdf_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<PdfOutput, PagemillError> {
    block_on(to_grayscale_pdf(input_str, config))
}

// ── In-memory input ──────────────────────────────────────────────────────

/// Write PDF bytes to a managed temp file and return its path holder.
///
/// The temp file is deleted when the returned guard drops, even on panic.
/// This is the recommended bridge when PDF data comes from a database,
/// network stream, or in-memory buffer rather than a file on disk.
fn bytes_to_temp(bytes: &[u8]) -> Result<tempfile::NamedTempFile, PagemillError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| PagemillError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| PagemillError::Internal(format!("tempfile write: {e}")))?;
    Ok(tmp)
}

/// Convert PDF bytes in memory to plain text.
pub async fn to_text_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<TextOutput, PagemillError> {
    let tmp = bytes_to_temp(bytes)?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when the conversion returns
    to_text(&path, config).await
}

/// Extract tables from PDF bytes in memory.
pub async fn to_tables_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<TableOutput, PagemillError> {
    let tmp = bytes_to_temp(bytes)?;
    let path = tmp.path().to_string_lossy().to_string();
    to_tables(&path, config).await
}

/// Render PDF bytes in memory to page images.
pub async fn to_images_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ImageOutput, PagemillError> {
    let tmp = bytes_to_temp(bytes)?;
    let path = tmp.path().to_string_lossy().to_string();
    to_images(&path, config).await
}

/// Convert PDF bytes in memory to a grayscale PDF.
pub async fn to_grayscale_pdf_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<PdfOutput, PagemillError> {
    let tmp = bytes_to_temp(bytes)?;
    let path = tmp.path().to_string_lossy().to_string();
    to_grayscale_pdf(&path, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_any_success_passes_with_one_success() {
        let errors: Vec<PageError> = vec![PageError::TextLayerFailed {
            page: 1,
            detail: "x".into(),
        }];
        assert!(ensure_any_success(errors.iter(), 1, 2).is_ok());
    }

    #[test]
    fn ensure_any_success_fails_when_all_failed() {
        let errors = vec![
            PageError::TextLayerFailed {
                page: 1,
                detail: "first".into(),
            },
            PageError::TextLayerFailed {
                page: 2,
                detail: "second".into(),
            },
        ];
        let err = ensure_any_success(errors.iter(), 0, 2).unwrap_err();
        match err {
            PagemillError::AllPagesFailed { total, first_error } => {
                assert_eq!(total, 2);
                assert!(first_error.contains("first"));
            }
            other => panic!("expected AllPagesFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_output_file_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        write_output_file(&path, b"hello").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        // No stray temp file left behind
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn missing_input_is_fatal() {
        let config = ConversionConfig::default();
        let err = to_text("/no/such/file.pdf", &config).await.unwrap_err();
        assert!(matches!(err, PagemillError::FileNotFound { .. }));
    }
}
