//! PDF rasterisation: render selected pages to `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why cap pixels, not just DPI?
//!
//! Page sizes vary wildly: an A0 poster at 150 DPI would produce a
//! 12,000 × 17,000 px image. The render width is derived from the page's
//! point size and the requested DPI, then capped by `max_rendered_pixels`
//! so memory stays bounded regardless of physical page size.

use crate::config::ConversionConfig;
use crate::error::{PageError, PagemillError};
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// One rasterised page, or the reason it could not be rasterised.
///
/// Render failures are per-page: one damaged page must not lose the rest of
/// the document. Callers decide whether a failed page is fatal.
pub struct RenderedPage {
    /// 0-based page index in the source document.
    pub index: usize,
    /// Source page width in PDF points, for output reassembly.
    pub width_pts: f32,
    /// Source page height in PDF points.
    pub height_pts: f32,
    /// The rasterised bitmap, or the per-page failure.
    pub image: Result<DynamicImage, PageError>,
}

/// Rasterise selected pages of a PDF into images.
///
/// This runs inside `spawn_blocking` since pdfium operations are CPU-bound.
/// Pages whose index exceeds the document length are skipped with a warning;
/// pages that fail to render are returned with `image: Err(..)`.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ConversionConfig,
    page_indices: &[usize],
) -> Result<Vec<RenderedPage>, PagemillError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, password.as_deref(), &indices)
    })
    .await
    .map_err(|e| PagemillError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<RenderedPage>, PagemillError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = match pages.get(idx as u16) {
            Ok(p) => p,
            Err(e) => {
                results.push(RenderedPage {
                    index: idx,
                    width_pts: 0.0,
                    height_pts: 0.0,
                    image: Err(PageError::RenderFailed {
                        page: idx + 1,
                        detail: format!("{:?}", e),
                    }),
                });
                continue;
            }
        };

        let width_pts = page.width().value;
        let height_pts = page.height().value;

        // Page points are 1/72 inch; derive the pixel width from the
        // requested DPI, capped by the safety limit.
        let target_width = ((width_pts * dpi as f32 / 72.0) as u32)
            .clamp(1, max_pixels);
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width as i32)
            .set_maximum_height(max_pixels as i32);

        let image = page
            .render_with_config(&render_config)
            .map(|bitmap| bitmap.as_image())
            .map_err(|e| PageError::RenderFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            });

        if let Ok(ref img) = image {
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                img.width(),
                img.height()
            );
        }

        results.push(RenderedPage {
            index: idx,
            width_pts,
            height_pts,
            image,
        });
    }

    Ok(results)
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, PagemillError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| PagemillError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, PagemillError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

/// Open a PDF, mapping pdfium's load errors onto the crate's taxonomy.
///
/// Password problems are distinguished from structural corruption so the
/// caller's error message can say "provide --password" rather than
/// "corrupt file".
pub(crate) fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PagemillError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                PagemillError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                PagemillError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            PagemillError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}
