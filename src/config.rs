//! Configuration types for PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::PagemillError;
use crate::pipeline::layout::LayoutThresholds;
use crate::pipeline::tone::ToneOptions;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for a PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pagemill::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .contrast(1.2)
///     .brightness(0.9)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 150.
    ///
    /// 150 DPI keeps text legible in page images while staying well below
    /// the memory cost of print-resolution renders. Increase to 200–300 for
    /// small-font documents; decrease to 96 when output size matters more
    /// than pixel density. The text and tables operations never rasterise,
    /// so this knob does not affect them.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// A safety cap independent of DPI. A 200-DPI render of an A0 poster
    /// could produce a 13 000 × 18 000 px image and exhaust memory. This
    /// field caps either dimension so pdfium never allocates more than
    /// roughly `max_rendered_pixels²` bytes of pixels.
    pub max_rendered_pixels: u32,

    /// Number of pages transformed concurrently in the raster path. Default: 4.
    ///
    /// The tone transform is CPU-bound and pages are independent, so the
    /// images and grayscale operations fan page transforms out over the
    /// blocking thread pool. Matching the physical core count is a sensible
    /// upper bound; higher values only add scheduling overhead.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Page separator in assembled text output. Default: None.
    pub page_separator: PageSeparator,

    /// Layout of assembled text output. Default: [`TextLayout::Flowed`].
    pub text_layout: TextLayout,

    /// Flatten each page's whitespace runs to single spaces. Default: false.
    ///
    /// The page loses its line structure and becomes one long line; page
    /// separators still apply. Useful when the consumer does its own
    /// reflowing (search indexing, NLP pipelines).
    pub normalize_whitespace: bool,

    /// Contrast/brightness factors for the tone transform. Default: 1.0 / 1.0.
    pub tone: ToneOptions,

    /// Baseline thresholds for row and table grouping. Defaults: 5.0 / 20.0
    /// page units — the long-standing heuristic values; see
    /// [`LayoutThresholds`] before changing them.
    pub thresholds: LayoutThresholds,

    /// Encoding for the images operation. Default: PNG.
    pub image_format: PageImageFormat,

    /// JPEG quality tier for the images operation. Default: Medium.
    pub image_quality: ImageQuality,

    /// Apply the tone transform to page images too. Default: false.
    ///
    /// When set, the images operation produces grayscale pages using the
    /// same pixel pipeline as the grayscale-PDF operation.
    pub grayscale_images: bool,

    /// Include a metadata front-matter block in text output. Default: false.
    pub include_metadata: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 4000,
            concurrency: 4,
            password: None,
            pages: PageSelection::default(),
            page_separator: PageSeparator::default(),
            text_layout: TextLayout::default(),
            normalize_whitespace: false,
            tone: ToneOptions::default(),
            thresholds: LayoutThresholds::default(),
            image_format: PageImageFormat::default(),
            image_quality: ImageQuality::default(),
            grayscale_images: false,
            include_metadata: false,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("concurrency", &self.concurrency)
            .field("pages", &self.pages)
            .field("page_separator", &self.page_separator)
            .field("text_layout", &self.text_layout)
            .field("normalize_whitespace", &self.normalize_whitespace)
            .field("tone", &self.tone)
            .field("thresholds", &self.thresholds)
            .field("image_format", &self.image_format)
            .field("image_quality", &self.image_quality)
            .field("grayscale_images", &self.grayscale_images)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn text_layout(mut self, layout: TextLayout) -> Self {
        self.config.text_layout = layout;
        self
    }

    pub fn normalize_whitespace(mut self, v: bool) -> Self {
        self.config.normalize_whitespace = v;
        self
    }

    /// Contrast factor, clamped to the 0.0–2.0 range the controls expose.
    pub fn contrast(mut self, factor: f32) -> Self {
        self.config.tone.contrast = factor.clamp(0.0, 2.0);
        self
    }

    /// Brightness factor, clamped to the 0.0–2.0 range the controls expose.
    pub fn brightness(mut self, factor: f32) -> Self {
        self.config.tone.brightness = factor.clamp(0.0, 2.0);
        self
    }

    pub fn thresholds(mut self, thresholds: LayoutThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn image_format(mut self, format: PageImageFormat) -> Self {
        self.config.image_format = format;
        self
    }

    pub fn image_quality(mut self, quality: ImageQuality) -> Self {
        self.config.image_quality = quality;
        self
    }

    pub fn grayscale_images(mut self, v: bool) -> Self {
        self.config.grayscale_images = v;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, PagemillError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(PagemillError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(PagemillError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.thresholds.row_break <= 0.0 || c.thresholds.table_break <= 0.0 {
            return Err(PagemillError::InvalidConfig(
                "Layout thresholds must be positive".into(),
            ));
        }
        if c.thresholds.table_break < c.thresholds.row_break {
            return Err(PagemillError::InvalidConfig(format!(
                "Table-break threshold ({}) must not be below the row-break threshold ({})",
                c.thresholds.table_break, c.thresholds.row_break
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// How to separate pages in assembled text output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// ASCII form feed between pages — the classic plain-text page break.
    FormFeed,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string for the given page number (1-indexed).
    pub fn render(&self, _page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::FormFeed => "\n\u{0C}\n".to_string(),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}

/// Layout of assembled text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextLayout {
    /// Just the reconstructed text, page after page. (default)
    #[default]
    Flowed,
    /// Each page preceded by a `Page N` header and a 40-dash rule.
    Structured,
}

/// Encoding for the images operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageImageFormat {
    /// Lossless PNG. (default)
    #[default]
    Png,
    /// JPEG at the configured [`ImageQuality`].
    Jpeg,
}

impl PageImageFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            PageImageFormat::Png => "png",
            PageImageFormat::Jpeg => "jpg",
        }
    }
}

/// JPEG quality tier for the images operation.
///
/// Three tiers rather than a raw 1–100 knob: the original controls exposed
/// exactly these steps, and they cover the useful range (95 is visually
/// lossless, 60 is the small-file end before text smears).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageQuality {
    /// Quality 95.
    High,
    /// Quality 80. (default)
    #[default]
    Medium,
    /// Quality 60 — smaller files.
    Low,
}

impl ImageQuality {
    /// The JPEG encoder quality setting for this tier.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            ImageQuality::High => 95,
            ImageQuality::Medium => 80,
            ImageQuality::Low => 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![1, 3, 5]).to_indices(5),
            vec![0, 2, 4]
        );
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2] // deduplicated and sorted
        );
    }

    #[test]
    fn builder_clamps_tone_factors() {
        let config = ConversionConfig::builder()
            .contrast(7.5)
            .brightness(-3.0)
            .build()
            .unwrap();
        assert_eq!(config.tone.contrast, 2.0);
        assert_eq!(config.tone.brightness, 0.0);
    }

    #[test]
    fn builder_clamps_dpi() {
        let config = ConversionConfig::builder().dpi(9000).build().unwrap();
        assert_eq!(config.dpi, 400);
        let config = ConversionConfig::builder().dpi(10).build().unwrap();
        assert_eq!(config.dpi, 72);
    }

    #[test]
    fn builder_rejects_inverted_thresholds() {
        use crate::pipeline::layout::LayoutThresholds;
        let err = ConversionConfig::builder()
            .thresholds(LayoutThresholds {
                row_break: 30.0,
                table_break: 20.0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, PagemillError::InvalidConfig(_)));
    }

    #[test]
    fn default_thresholds_are_compat_values() {
        let config = ConversionConfig::default();
        assert_eq!(config.thresholds.row_break, 5.0);
        assert_eq!(config.thresholds.table_break, 20.0);
    }

    #[test]
    fn separator_render() {
        assert_eq!(PageSeparator::None.render(2), "\n\n");
        assert_eq!(PageSeparator::FormFeed.render(2), "\n\u{0C}\n");
        assert_eq!(
            PageSeparator::Custom("* * *".into()).render(2),
            "\n\n* * *\n\n"
        );
    }

    #[test]
    fn quality_tiers_map_to_encoder_settings() {
        assert_eq!(ImageQuality::High.jpeg_quality(), 95);
        assert_eq!(ImageQuality::Medium.jpeg_quality(), 80);
        assert_eq!(ImageQuality::Low.jpeg_quality(), 60);
    }
}
