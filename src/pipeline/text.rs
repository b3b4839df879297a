//! Text-layer extraction: positioned characters → glyph runs.
//!
//! pdfium exposes the text layer one character at a time, each with a tight
//! bounding rectangle in page points. The layout pass wants coarser units —
//! runs of text comparable to a table cell or a word group — so this module
//! rebuilds runs from the character stream:
//!
//! * characters on the same baseline with ordinary spacing accumulate into
//!   the current run, with single spaces inserted at word-sized gaps;
//! * a baseline shift or a horizontal gap large relative to the run's mean
//!   character width starts a new run (large gaps are what separate table
//!   cells, which is exactly the granularity the table extractor needs).
//!
//! Characters without a usable bounding box (some synthetic or control
//! glyphs) are dropped, matching what the text layer itself does for them.

use crate::config::ConversionConfig;
use crate::error::{PageError, PagemillError};
use crate::pipeline::layout::PositionedGlyph;
use crate::pipeline::render::load_document;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Baseline wobble tolerated inside one run, in page points. Row grouping
/// proper happens later in the layout pass with its own threshold.
const BASELINE_JITTER: f32 = 0.5;

/// A gap wider than this multiple of the run's mean character width gets a
/// space inserted.
const WORD_GAP_FACTOR: f32 = 0.3;

/// A gap wider than this multiple of the run's mean character width starts
/// a new run.
const CELL_GAP_FACTOR: f32 = 2.5;

/// One character from the page text layer, with its tight bounds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageChar {
    pub ch: char,
    /// Left edge in PDF points.
    pub x: f32,
    /// Baseline (bottom edge) in PDF points, bottom-up coordinates.
    pub y: f32,
    pub width: f32,
}

/// Extract glyph runs for the selected pages.
///
/// Returns one entry per in-range page index, in selection order. A page
/// whose text layer cannot be opened yields `Err(PageError)` in its slot;
/// the other pages are unaffected.
pub async fn extract_glyphs(
    pdf_path: &Path,
    config: &ConversionConfig,
    page_indices: &[usize],
) -> Result<Vec<(usize, Result<Vec<PositionedGlyph>, PageError>)>, PagemillError> {
    let path = pdf_path.to_path_buf();
    let password = config.password.clone();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        extract_glyphs_blocking(&path, password.as_deref(), &indices)
    })
    .await
    .map_err(|e| PagemillError::Internal(format!("Text-layer task panicked: {}", e)))?
}

/// Blocking implementation of glyph extraction.
fn extract_glyphs_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, Result<Vec<PositionedGlyph>, PageError>)>, PagemillError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;

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

        let glyphs = match pages.get(idx as u16) {
            Ok(page) => match page.text() {
                Ok(text) => {
                    let chars = collect_chars(&text);
                    let runs = glyph_runs(&chars);
                    debug!(
                        "Page {}: {} chars → {} glyph runs",
                        idx + 1,
                        chars.len(),
                        runs.len()
                    );
                    Ok(runs)
                }
                Err(e) => Err(PageError::TextLayerFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }),
            },
            Err(e) => Err(PageError::TextLayerFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }),
        };

        results.push((idx, glyphs));
    }

    Ok(results)
}

/// Collect positioned characters from a page's text layer.
#[allow(deprecated)] // PdfRect field access deprecated in 0.8.28, removed in 0.9.0
fn collect_chars(text: &PdfPageText) -> Vec<PageChar> {
    let mut chars = Vec::new();
    for ch in text.chars().iter() {
        if let (Some(unicode_ch), Ok(rect)) = (ch.unicode_char(), ch.tight_bounds()) {
            chars.push(PageChar {
                ch: unicode_ch,
                x: rect.left.value,
                y: rect.bottom.value,
                width: (rect.right.value - rect.left.value).abs(),
            });
        }
    }
    chars
}

/// Group a character stream into [`PositionedGlyph`] runs.
///
/// Pure over its input; see the module docs for the grouping rules.
pub(crate) fn glyph_runs(chars: &[PageChar]) -> Vec<PositionedGlyph> {
    let mut runs: Vec<PositionedGlyph> = Vec::new();

    let mut text = String::new();
    let mut run_x = 0.0f32;
    let mut run_y = 0.0f32;
    let mut width_sum = 0.0f32;
    let mut width_count = 0usize;
    let mut prev: Option<PageChar> = None;

    let mut flush = |text: &mut String, run_x: f32, run_y: f32| {
        let trimmed = text.trim_end();
        if !trimmed.is_empty() {
            runs.push(PositionedGlyph {
                text: trimmed.to_string(),
                baseline_x: run_x,
                baseline_y: run_y,
            });
        }
        text.clear();
    };

    for &ch in chars {
        if ch.ch.is_whitespace() {
            // Explicit whitespace collapses to one separator inside a run
            // and never starts one.
            if !text.is_empty() && !text.ends_with(' ') {
                text.push(' ');
            }
            prev = Some(ch);
            continue;
        }

        if text.is_empty() {
            run_x = ch.x;
            run_y = ch.y;
            width_sum = 0.0;
            width_count = 0;
        } else {
            // A non-empty run always holds at least one non-whitespace char.
            let mean_width = width_sum / width_count as f32;
            let gap = prev.map(|p| ch.x - (p.x + p.width)).unwrap_or(0.0);

            if (ch.y - run_y).abs() > BASELINE_JITTER || gap > mean_width * CELL_GAP_FACTOR {
                flush(&mut text, run_x, run_y);
                run_x = ch.x;
                run_y = ch.y;
                width_sum = 0.0;
                width_count = 0;
            } else if gap > mean_width * WORD_GAP_FACTOR && !text.ends_with(' ') {
                text.push(' ');
            }
        }

        text.push(ch.ch);
        width_sum += ch.width;
        width_count += 1;
        prev = Some(ch);
    }

    flush(&mut text, run_x, run_y);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out a word's characters left to right from `x`, 6pt advance.
    fn word(s: &str, x: f32, y: f32) -> Vec<PageChar> {
        s.chars()
            .enumerate()
            .map(|(i, ch)| PageChar {
                ch,
                x: x + i as f32 * 6.0,
                y,
                width: 5.0,
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_no_runs() {
        assert!(glyph_runs(&[]).is_empty());
    }

    #[test]
    fn adjacent_chars_form_one_run() {
        let chars = word("total", 10.0, 100.0);
        let runs = glyph_runs(&chars);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "total");
        assert_eq!(runs[0].baseline_x, 10.0);
        assert_eq!(runs[0].baseline_y, 100.0);
    }

    #[test]
    fn word_gap_becomes_a_space() {
        // 3pt gap between words: above 0.3 × mean width (5pt), below the
        // cell factor, so the words stay in one run separated by a space.
        let mut chars = word("unit", 10.0, 100.0);
        chars.extend(word("price", 37.0, 100.0));
        let runs = glyph_runs(&chars);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "unit price");
    }

    #[test]
    fn cell_gap_splits_runs() {
        // 60pt gap: far beyond 2.5 × mean width, a column boundary.
        let mut chars = word("name", 10.0, 100.0);
        chars.extend(word("qty", 94.0, 100.0));
        let runs = glyph_runs(&chars);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "name");
        assert_eq!(runs[1].text, "qty");
        assert_eq!(runs[1].baseline_x, 94.0);
    }

    #[test]
    fn baseline_shift_splits_runs() {
        let mut chars = word("above", 10.0, 100.0);
        chars.extend(word("below", 10.0, 88.0));
        let runs = glyph_runs(&chars);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].baseline_y, 100.0);
        assert_eq!(runs[1].baseline_y, 88.0);
    }

    #[test]
    fn explicit_spaces_collapse_and_never_lead() {
        let mut chars = vec![PageChar {
            ch: ' ',
            x: 4.0,
            y: 100.0,
            width: 3.0,
        }];
        chars.extend(word("a", 10.0, 100.0));
        chars.push(PageChar {
            ch: ' ',
            x: 16.0,
            y: 100.0,
            width: 3.0,
        });
        chars.push(PageChar {
            ch: ' ',
            x: 20.0,
            y: 100.0,
            width: 3.0,
        });
        chars.extend(word("b", 24.0, 100.0));
        let runs = glyph_runs(&chars);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "a b");
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let mut chars = word("end", 10.0, 100.0);
        chars.push(PageChar {
            ch: ' ',
            x: 28.0,
            y: 100.0,
            width: 3.0,
        });
        let runs = glyph_runs(&chars);
        assert_eq!(runs[0].text, "end");
    }
}
