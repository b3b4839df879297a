//! Output assembly: the last pipeline stage for every operation.
//!
//! Four assemblers live here because they share nothing with the stages
//! before them and everything with each other — they all turn per-page
//! intermediate results into caller-facing bytes:
//!
//! * [`assemble_text`] — page texts → one document, with separators,
//!   optional structured page headers, optional metadata front matter
//! * [`sheet_to_csv`] — one extracted table → RFC-4180 CSV bytes (ragged
//!   rows allowed, so the writer runs in flexible mode)
//! * [`encode_image`] — a rendered page → PNG or JPEG bytes
//! * [`assemble_pdf`] — tone-transformed page bitmaps → a new PDF with one
//!   full-page image per page, sized to the source page's point dimensions

use crate::config::{ConversionConfig, ImageQuality, PageImageFormat, TextLayout};
use crate::error::PagemillError;
use crate::output::{DocumentMetadata, PageText, Sheet};
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use std::io::Cursor;
use tracing::debug;

// ── Text assembly ────────────────────────────────────────────────────────────

/// Assemble the final text document from per-page results.
///
/// Failed pages are omitted; the separator is rendered between surviving
/// pages only.
pub fn assemble_text(
    pages: &[PageText],
    config: &ConversionConfig,
    metadata: &DocumentMetadata,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if config.include_metadata {
        parts.push(format_front_matter(metadata));
    }

    let successful: Vec<&PageText> = pages.iter().filter(|p| p.error.is_none()).collect();

    for (i, page) in successful.iter().enumerate() {
        if i > 0 {
            parts.push(config.page_separator.render(page.page_num));
        }
        match config.text_layout {
            TextLayout::Flowed => parts.push(page.text.clone()),
            TextLayout::Structured => parts.push(format!(
                "Page {}\n{}\n{}",
                page.page_num,
                "-".repeat(40),
                page.text
            )),
        }
    }

    parts.join("")
}

/// Format document metadata as a plain-text front-matter block.
fn format_front_matter(meta: &DocumentMetadata) -> String {
    let mut block = String::new();

    if let Some(ref t) = meta.title {
        block.push_str(&format!("Title: {}\n", t));
    }
    if let Some(ref a) = meta.author {
        block.push_str(&format!("Author: {}\n", a));
    }
    if let Some(ref s) = meta.subject {
        block.push_str(&format!("Subject: {}\n", s));
    }
    if let Some(ref p) = meta.producer {
        block.push_str(&format!("Producer: {}\n", p));
    }
    block.push_str(&format!("Pages: {}\n", meta.page_count));
    if !meta.pdf_version.is_empty() {
        block.push_str(&format!("PDF Version: {}\n", meta.pdf_version));
    }

    block.push('\n');
    block
}

// ── Sheet assembly ───────────────────────────────────────────────────────────

/// Serialise one sheet as CSV bytes.
///
/// Rows from the table extractor are ragged (a heuristic table has no
/// column schema), so the writer runs with `flexible(true)` rather than
/// padding rows to a common width.
pub fn sheet_to_csv(sheet: &Sheet) -> Result<Vec<u8>, PagemillError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for row in &sheet.rows {
        writer
            .write_record(row)
            .map_err(|e| PagemillError::SheetEncodingFailed {
                sheet: sheet.name.clone(),
                detail: e.to_string(),
            })?;
    }

    writer
        .into_inner()
        .map_err(|e| PagemillError::SheetEncodingFailed {
            sheet: sheet.name.clone(),
            detail: e.to_string(),
        })
}

// ── Image encoding ───────────────────────────────────────────────────────────

/// Encode a rendered page in the requested format.
///
/// PNG is lossless and ignores the quality tier; JPEG re-encodes through
/// RGB8 at the tier's quality setting.
pub fn encode_image(
    img: &DynamicImage,
    format: PageImageFormat,
    quality: ImageQuality,
) -> Result<Vec<u8>, PagemillError> {
    let mut buf = Vec::new();
    match format {
        PageImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .map_err(|e| PagemillError::Internal(format!("PNG encoding failed: {}", e)))?;
        }
        PageImageFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.jpeg_quality());
            rgb.write_with_encoder(encoder)
                .map_err(|e| PagemillError::Internal(format!("JPEG encoding failed: {}", e)))?;
        }
    }
    debug!("Encoded image → {} bytes", buf.len());
    Ok(buf)
}

// ── PDF assembly ─────────────────────────────────────────────────────────────

/// One page of an output PDF: the (already transformed) bitmap plus the
/// source page's size in points.
pub struct PdfPageImage {
    pub image: DynamicImage,
    pub width_pts: f32,
    pub height_pts: f32,
}

/// Build a PDF with one full-page image per entry.
///
/// Each page keeps its source point dimensions; the bitmap is placed at the
/// page origin and scaled to cover the page exactly (the image was rendered
/// from that page, so the aspect ratio already matches).
pub fn assemble_pdf(title: &str, page_images: &[PdfPageImage]) -> Result<Vec<u8>, PagemillError> {
    if page_images.is_empty() {
        return Err(PagemillError::PdfAssemblyFailed(
            "no pages to assemble".into(),
        ));
    }

    let mut doc = PdfDocument::new(title);
    let mut pages: Vec<PdfPage> = Vec::with_capacity(page_images.len());

    for p in page_images {
        let rgb = p.image.to_rgb8();
        let (w_px, h_px) = (rgb.width() as usize, rgb.height() as usize);

        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: w_px,
            height: h_px,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let page_w = Mm(p.width_pts * 25.4 / 72.0);
        let page_h = Mm(p.height_pts * 25.4 / 72.0);

        // The effective DPI that makes the bitmap span the page width
        // exactly. Guard against a zero-width page record.
        let dpi = if p.width_pts > 0.0 {
            w_px as f32 * 72.0 / p.width_pts
        } else {
            150.0
        };

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(dpi),
                rotate: None,
            },
        }];

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    debug!(
        pages = page_images.len(),
        bytes = output.len(),
        "Assembled output PDF"
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSeparator;
    use image::{Rgba, RgbaImage};

    fn page(n: usize, text: &str) -> PageText {
        PageText {
            page_num: n,
            text: text.to_string(),
            glyph_count: 1,
            duration_ms: 0,
            error: None,
        }
    }

    fn meta() -> DocumentMetadata {
        DocumentMetadata {
            title: Some("Quarterly Report".into()),
            author: None,
            subject: None,
            creator: None,
            producer: None,
            creation_date: None,
            modification_date: None,
            page_count: 2,
            pdf_version: "Pdf17".into(),
        }
    }

    #[test]
    fn sheet_csv_quotes_and_raggedness() {
        let sheet = Sheet {
            name: "Page 1 Table 1".into(),
            page_num: 1,
            rows: vec![
                vec!["Name".into(), "Qty, total".into()],
                vec!["only".into()],
            ],
        };
        let bytes = sheet_to_csv(&sheet).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        assert_eq!(csv, "Name,\"Qty, total\"\nonly\n");
    }

    #[test]
    fn assemble_text_flowed_with_separator() {
        let config = ConversionConfig::default();
        let pages = vec![page(1, "first\n"), page(2, "second\n")];
        let text = assemble_text(&pages, &config, &meta());
        assert_eq!(text, "first\n\n\nsecond\n");
    }

    #[test]
    fn assemble_text_form_feed_separator() {
        let mut config = ConversionConfig::default();
        config.page_separator = PageSeparator::FormFeed;
        let pages = vec![page(1, "a\n"), page(2, "b\n")];
        let text = assemble_text(&pages, &config, &meta());
        assert!(text.contains('\u{0C}'));
    }

    #[test]
    fn assemble_text_structured_headers() {
        let mut config = ConversionConfig::default();
        config.text_layout = TextLayout::Structured;
        let pages = vec![page(3, "content\n")];
        let text = assemble_text(&pages, &config, &meta());
        assert!(text.starts_with("Page 3\n"));
        assert!(text.contains(&"-".repeat(40)));
    }

    #[test]
    fn assemble_text_front_matter() {
        let mut config = ConversionConfig::default();
        config.include_metadata = true;
        let pages = vec![page(1, "body\n")];
        let text = assemble_text(&pages, &config, &meta());
        assert!(text.starts_with("Title: Quarterly Report\n"));
        assert!(text.contains("Pages: 2\n"));
        assert!(text.contains("body"));
    }

    #[test]
    fn assemble_text_skips_failed_pages() {
        let config = ConversionConfig::default();
        let mut bad = page(2, "");
        bad.error = Some(crate::error::PageError::TextLayerFailed {
            page: 2,
            detail: "x".into(),
        });
        let pages = vec![page(1, "ok\n"), bad, page(3, "also ok\n")];
        let text = assemble_text(&pages, &config, &meta());
        assert!(text.contains("ok"));
        assert!(!text.contains("\n\n\n\n"));
    }

    #[test]
    fn encode_png_magic() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([128, 128, 128, 255]),
        ));
        let bytes = encode_image(&img, PageImageFormat::Png, ImageQuality::Medium).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn encode_jpeg_magic() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([128, 128, 128, 255]),
        ));
        let bytes = encode_image(&img, PageImageFormat::Jpeg, ImageQuality::High).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn assemble_pdf_rejects_empty_input() {
        let err = assemble_pdf("empty", &[]).unwrap_err();
        assert!(matches!(err, PagemillError::PdfAssemblyFailed(_)));
    }

    #[test]
    fn assemble_pdf_produces_pdf_bytes() {
        let page_images = vec![PdfPageImage {
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                60,
                80,
                Rgba([90, 90, 90, 255]),
            )),
            width_pts: 612.0,
            height_pts: 792.0,
        }];
        let bytes = assemble_pdf("grayscale", &page_images).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
    }
}
