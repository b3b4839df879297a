//! Layout reconstruction: group positioned glyphs into lines and tables.
//!
//! The text layer hands us a flat stream of positioned glyph runs in content
//! order. Two single-pass routines turn that stream into something useful:
//!
//! * [`extract_tables`] — group glyphs into rows, rows into tables, using
//!   baseline proximity alone. A candidate table is kept only when its first
//!   row has more than one cell; single-column sequences are flowing prose,
//!   not tabular data.
//! * [`reconstruct_text`] — group glyphs into visual lines with the same
//!   row-break rule and join them into plain text.
//!
//! This is a positional heuristic, not a structural parser: merged cells,
//! spanning cells, and multi-line cell content will mis-group. Tables whose
//! rows sit further apart than [`LayoutThresholds::table_break`] split into
//! separate tables. That accuracy trade-off is deliberate — the alternative
//! is font-metric awareness, which the text layer does not provide.

use serde::{Deserialize, Serialize};

/// One unit of recognised text on a page, positioned by its baseline.
///
/// Coordinates are PDF user-space points: origin bottom-left, Y increasing
/// upward. Produced by the text-layer stage ([`crate::pipeline::text`]);
/// immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
    /// The glyph run's text content.
    pub text: String,
    /// Left edge of the run's first character.
    pub baseline_x: f32,
    /// Baseline the run rests on.
    pub baseline_y: f32,
}

impl PositionedGlyph {
    /// Convenience constructor, mostly for tests.
    pub fn new(text: impl Into<String>, baseline_x: f32, baseline_y: f32) -> Self {
        Self {
            text: text.into(),
            baseline_x,
            baseline_y,
        }
    }
}

/// A detected table: ordered rows of cell text, ragged rows allowed.
///
/// Cells appear in encounter order from the glyph stream — grouping never
/// reorders glyphs within a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Cell contents: `rows[row_idx][col_idx]`.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, in cells.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Baseline-delta thresholds driving row and table grouping.
///
/// The defaults reproduce the long-standing fixed heuristics (5 and 20
/// user-space points). They are exposed as configuration rather than
/// literals so callers can tune them for unusual documents, but note that
/// glyph baselines come from the PDF text layer in user-space points and do
/// not change with render DPI — the defaults are correct at any `--dpi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutThresholds {
    /// Minimum baseline delta splitting glyphs into a new row.
    pub row_break: f32,
    /// Minimum baseline delta closing accumulated rows off as one table.
    pub table_break: f32,
}

/// Default row-break threshold, in PDF user-space points.
pub const ROW_BREAK_THRESHOLD: f32 = 5.0;

/// Default table-break threshold, in PDF user-space points.
pub const TABLE_BREAK_THRESHOLD: f32 = 20.0;

impl Default for LayoutThresholds {
    fn default() -> Self {
        Self {
            row_break: ROW_BREAK_THRESHOLD,
            table_break: TABLE_BREAK_THRESHOLD,
        }
    }
}

/// Group a page's glyph stream into tables.
///
/// Single forward pass in input order:
///
/// * a baseline delta above `row_break` starts a new row;
/// * when a row just broke *and* the delta also exceeds `table_break`, the
///   accumulated rows close off as one table — emitted only if the first
///   row has more than one cell, discarded otherwise.
///
/// A table boundary can therefore only be detected coincident with a row
/// boundary. Tables are row-granular by construction; do not "fix" this by
/// checking the table threshold on every glyph, it changes grouping for
/// documents with sub-row vertical jitter.
///
/// Zero glyphs yield zero tables. Non-finite baselines are not rejected;
/// output for such input is unspecified.
pub fn extract_tables(glyphs: &[PositionedGlyph], thresholds: &LayoutThresholds) -> Vec<Table> {
    let mut tables: Vec<Table> = Vec::new();
    let mut current_table: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut last_y: Option<f32> = None;

    for glyph in glyphs {
        let row_break = match last_y {
            None => true,
            Some(y) => (glyph.baseline_y - y).abs() > thresholds.row_break,
        };

        if row_break {
            if !current_row.is_empty() {
                current_table.push(std::mem::take(&mut current_row));
            }

            if let Some(y) = last_y {
                if !current_table.is_empty()
                    && (glyph.baseline_y - y).abs() > thresholds.table_break
                {
                    if current_table[0].len() > 1 {
                        tables.push(Table {
                            rows: std::mem::take(&mut current_table),
                        });
                    } else {
                        current_table.clear();
                    }
                }
            }
        }

        current_row.push(glyph.text.clone());
        last_y = Some(glyph.baseline_y);
    }

    if !current_row.is_empty() {
        current_table.push(current_row);
    }
    if !current_table.is_empty() && current_table[0].len() > 1 {
        tables.push(Table {
            rows: current_table,
        });
    }

    tables
}

/// Reconstruct a page's plain text from its glyph stream.
///
/// Glyphs within `row_break` of the previous baseline join the current line
/// (space-separated, encounter order); larger deltas start a new line.
pub fn reconstruct_text(glyphs: &[PositionedGlyph], thresholds: &LayoutThresholds) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut last_y: Option<f32> = None;

    for glyph in glyphs {
        let line_break = match last_y {
            None => false,
            Some(y) => (glyph.baseline_y - y).abs() > thresholds.row_break,
        };

        if line_break && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&glyph.text);
        last_y = Some(glyph.baseline_y);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(text: &str, y: f32) -> PositionedGlyph {
        PositionedGlyph::new(text, 0.0, y)
    }

    #[test]
    fn empty_stream_yields_no_tables() {
        let tables = extract_tables(&[], &LayoutThresholds::default());
        assert!(tables.is_empty());
    }

    #[test]
    fn table_break_emits_leading_table() {
        // Two glyphs share a baseline, then an 80-unit jump: the first row
        // closes and is emitted as a one-row table; the trailing "C" stays
        // single-cell and is discarded at the end of the pass.
        let glyphs = [g("A", 100.0), g("B", 100.0), g("C", 20.0)];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert_eq!(
            tables,
            vec![Table {
                rows: vec![vec!["A".to_string(), "B".to_string()]],
            }]
        );
    }

    #[test]
    fn single_cell_rows_are_prose_not_tables() {
        // Every row break exceeds 5 units but each row has exactly one cell.
        let glyphs = [g("one", 700.0), g("two", 688.0), g("three", 676.0)];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert!(tables.is_empty());
    }

    #[test]
    fn close_baselines_form_at_most_one_table() {
        // All baselines within 5 units of each other: one row, one table,
        // emitted because the first row has more than one cell.
        let glyphs = [
            g("Name", 500.0),
            g("Qty", 502.0),
            g("Price", 498.5),
            g("Total", 501.0),
        ];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[0].rows[0].len(), 4);
    }

    #[test]
    fn multi_row_table_groups_by_baseline() {
        let glyphs = [
            g("Name", 500.0),
            g("Qty", 500.0),
            g("Apples", 488.0),
            g("3", 488.0),
            g("Pears", 476.0),
            g("5", 476.0),
        ];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["Apples".to_string(), "3".to_string()],
                vec!["Pears".to_string(), "5".to_string()],
            ]
        );
    }

    #[test]
    fn wide_gap_splits_two_tables() {
        let glyphs = [
            g("A", 700.0),
            g("B", 700.0),
            g("C", 688.0),
            g("D", 688.0),
            // 100-unit gap: the first table closes here.
            g("E", 588.0),
            g("F", 588.0),
        ];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[1].rows.len(), 1);
    }

    #[test]
    fn discarded_leading_table_does_not_leak_rows() {
        // A single-cell first table followed by a real table: the prose
        // block must be discarded, not merged into the table that follows.
        let glyphs = [
            g("Introduction", 700.0),
            // table break
            g("Col1", 600.0),
            g("Col2", 600.0),
            g("a", 588.0),
            g("b", 588.0),
        ];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["Col1".to_string(), "Col2".to_string()]);
    }

    #[test]
    fn rows_keep_encounter_order() {
        // Grouping is purely vertical: X positions never reorder cells.
        let glyphs = [
            PositionedGlyph::new("right", 400.0, 500.0),
            PositionedGlyph::new("left", 10.0, 500.0),
        ];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert_eq!(tables[0].rows[0], vec!["right".to_string(), "left".to_string()]);
    }

    #[test]
    fn ragged_rows_are_preserved() {
        let glyphs = [
            g("H1", 500.0),
            g("H2", 500.0),
            g("H3", 500.0),
            g("only", 488.0),
        ];
        let tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert_eq!(tables[0].rows[0].len(), 3);
        assert_eq!(tables[0].rows[1].len(), 1);
        assert_eq!(tables[0].column_count(), 3);
        assert_eq!(tables[0].row_count(), 2);
    }

    #[test]
    fn custom_thresholds_change_grouping() {
        let glyphs = [g("A", 100.0), g("B", 92.0), g("C", 91.0)];
        // Default thresholds: 8-unit delta breaks the row.
        let default_tables = extract_tables(&glyphs, &LayoutThresholds::default());
        assert!(default_tables.is_empty());
        // A looser row threshold keeps all three on one row.
        let loose = LayoutThresholds {
            row_break: 10.0,
            table_break: 20.0,
        };
        let tables = extract_tables(&glyphs, &loose);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0].len(), 3);
    }

    #[test]
    fn reconstruct_text_empty() {
        assert_eq!(reconstruct_text(&[], &LayoutThresholds::default()), "");
    }

    #[test]
    fn reconstruct_text_joins_lines() {
        let glyphs = [
            g("Hello", 700.0),
            g("world", 700.0),
            g("second", 688.0),
            g("line", 688.0),
        ];
        let text = reconstruct_text(&glyphs, &LayoutThresholds::default());
        assert_eq!(text, "Hello world\nsecond line");
    }

    #[test]
    fn reconstruct_text_tolerates_baseline_jitter() {
        let glyphs = [g("a", 100.0), g("b", 103.0), g("c", 98.0)];
        let text = reconstruct_text(&glyphs, &LayoutThresholds::default());
        assert_eq!(text, "a b c");
    }
}
