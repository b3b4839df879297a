//! Streaming conversion API: emit pages as they complete.
//!
//! ## Why stream?
//!
//! Large documents take a while. A streams-based API lets callers display
//! partial results immediately, wire up progress bars, or write pages to
//! disk incrementally instead of buffering the entire document in memory.
//!
//! Unlike the eager entry points in [`crate::convert`] which return only
//! after all pages finish, these functions yield per-page results via a
//! `Stream` as each page completes. In the image stream pages may arrive
//! out of order (sort by `page_num` if order matters); the text stream is
//! emitted in page order since the text layer is read sequentially anyway.

use crate::config::ConversionConfig;
use crate::error::{PageError, PagemillError};
use crate::output::{PageImage, PageText};
use crate::pipeline::{input, layout, postprocess, render, text};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::time::Instant;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-page text results.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<PageText, PageError>> + Send>>;

/// A boxed stream of per-page image results.
pub type ImageStream = Pin<Box<dyn Stream<Item = Result<PageImage, PageError>> + Send>>;

/// Convert a PDF to text, streaming pages as they are ready.
///
/// # Returns
/// - `Ok(TextStream)` — a stream of `Result<PageText, PageError>`
/// - `Err(PagemillError)` — fatal error (file not found, not a PDF, etc.)
pub async fn stream_text(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TextStream, PagemillError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming text conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    let metadata = render::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let page_indices = config.pages.to_indices(metadata.page_count);
    if page_indices.is_empty() {
        return Err(PagemillError::PageOutOfRange {
            page: 0,
            total: metadata.page_count,
        });
    }

    // The text layer is read in one blocking pass; the per-page layout
    // reconstruction is cheap and happens lazily as the stream is polled.
    let extracted = text::extract_glyphs(&pdf_path, config, &page_indices).await?;

    let thresholds = config.thresholds;
    let normalize = config.normalize_whitespace;

    let s = stream::iter(extracted.into_iter().map(move |(idx, glyphs)| {
        let page_num = idx + 1;
        let start = Instant::now();
        match glyphs {
            Ok(glyphs) => {
                let raw = layout::reconstruct_text(&glyphs, &thresholds);
                let cleaned = if normalize {
                    format!("{}\n", postprocess::normalise_whitespace(&raw))
                } else {
                    postprocess::clean_text(&raw)
                };
                Ok(PageText {
                    page_num,
                    text: cleaned,
                    glyph_count: glyphs.len(),
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: None,
                })
            }
            Err(e) => Err(e),
        }
    }));

    Ok(Box::pin(s))
}

/// Render a PDF to page images, streaming pages as they complete.
///
/// Pages are emitted in completion order, not page order — the tone
/// transform and encoding fan out over the blocking pool. Sort by
/// `page_num` if order matters.
pub async fn stream_images(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ImageStream, PagemillError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming image conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    let metadata = render::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let page_indices = config.pages.to_indices(metadata.page_count);
    if page_indices.is_empty() {
        return Err(PagemillError::PageOutOfRange {
            page: 0,
            total: metadata.page_count,
        });
    }

    let rendered = render::render_pages(&pdf_path, config, &page_indices).await?;

    let concurrency = config.concurrency;
    let config_clone = config.clone();

    let s = stream::iter(rendered.into_iter().map(move |page| {
        let cfg = config_clone.clone();
        async move {
            let page_num = page.index + 1;
            let start = Instant::now();
            let img = page.image?;
            let (bytes, width, height) =
                tokio::task::spawn_blocking(move || crate::convert::transform_and_encode(img, &cfg))
                    .await
                    .map_err(|e| PageError::RenderFailed {
                        page: page_num,
                        detail: format!("transform task panicked: {}", e),
                    })?
                    .map_err(|e| PageError::RenderFailed {
                        page: page_num,
                        detail: e.to_string(),
                    })?;
            Ok(PageImage {
                page_num,
                width,
                height,
                bytes,
                duration_ms: start.elapsed().as_millis() as u64,
                error: None,
            })
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
