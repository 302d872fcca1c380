//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes stay in one file

use crate::app::pipeline::{Extraction, RunOutput};
use crate::domain::{DimensionAxis, WideTable};

/// Width of value columns in previews.
const VALUE_WIDTH: usize = 14;

/// Format the summary of one run (source, table shape, tables written).
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== indices - {} ===\n", run.location));
    out.push_str(&format!("Source: {}\n", run.source));
    out.push_str(&format!("Observations: {}\n", run.observations));

    match &run.extraction {
        Extraction::NoData => {
            out.push_str("No data for these parameters.\n");
        }
        Extraction::Data(table) => {
            let (first, last) = table.period_range().unwrap_or(("-", "-"));
            out.push_str(&format!(
                "Wide table: rows={} | series={} | cells={} | periods=[{first}, {last}]\n",
                table.rows.len(),
                table.columns.len(),
                table.populated_cells(),
            ));
        }
    }

    if !run.views.is_empty() {
        out.push_str("\nTables:\n");
        for (name, table) in &run.views {
            let note = if table.is_empty() { " (empty)" } else { "" };
            out.push_str(&format!(
                "- {:<24} rows={:<5} columns={}{note}\n",
                name,
                table.rows.len(),
                table.columns.len()
            ));
        }
    }

    out
}

/// Format the first `max_rows` rows of a table.
pub fn format_preview(table: &WideTable, max_rows: usize) -> String {
    let mut out = String::new();
    if table.is_empty() {
        out.push_str("(empty table)\n");
        return out;
    }

    let mut header = format!("{:<10}", "time");
    let mut rule = format!("{:-<10}", "");
    for col in &table.columns {
        header.push_str(&format!(" {:>VALUE_WIDTH$}", truncate(col, VALUE_WIDTH)));
        rule.push_str(&format!(" {:-<VALUE_WIDTH$}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for row in table.rows.iter().take(max_rows) {
        let mut line = format!("{:<10}", row.period);
        for v in &row.values {
            let cell = v.map(|x| format!("{x:.3}")).unwrap_or_default();
            line.push_str(&format!(" {cell:>VALUE_WIDTH$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if table.rows.len() > max_rows {
        out.push_str(&format!("... {} more rows\n", table.rows.len() - max_rows));
    }

    out
}

/// Format every axis with positional index, code and display name.
pub fn format_dimensions(axes: &[DimensionAxis]) -> String {
    let mut out = String::new();
    for (pos, axis) in axes.iter().enumerate() {
        out.push_str(&format!(
            "[{pos}] {} ({}) - {} values\n",
            axis.id,
            axis.name,
            axis.len()
        ));
        for entry in &axis.entries {
            out.push_str(
                format!("  {:>4}  {:<16} {}\n", entry.index, entry.code, entry.display_name)
                    .trim_end(),
            );
            out.push('\n');
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AxisEntry, WideRow};

    fn table() -> WideTable {
        WideTable {
            columns: vec!["PRINTO01_IXOBSA".into(), "CPI".into()],
            rows: vec![
                WideRow {
                    period: "2018-01".into(),
                    values: vec![Some(100.0), None],
                },
                WideRow {
                    period: "2018-02".into(),
                    values: vec![Some(101.25), Some(4.0)],
                },
            ],
        }
    }

    #[test]
    fn summary_reports_shape_and_tables() {
        let run = RunOutput {
            location: "IND".into(),
            source: "payload.json".into(),
            observations: 3,
            extraction: Extraction::Data(table()),
            views: vec![("gdp".into(), WideTable::empty())],
        };
        let text = format_run_summary(&run);
        assert!(text.contains("rows=2 | series=2 | cells=3 | periods=[2018-01, 2018-02]"));
        assert!(text.contains("gdp"));
        assert!(text.contains("(empty)"));
    }

    #[test]
    fn summary_distinguishes_no_data() {
        let run = RunOutput {
            location: "IND".into(),
            source: "x".into(),
            observations: 0,
            extraction: Extraction::NoData,
            views: vec![],
        };
        assert!(format_run_summary(&run).contains("No data for these parameters."));
    }

    #[test]
    fn preview_truncates_rows_and_long_names() {
        let text = format_preview(&table(), 1);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("time"));
        assert!(lines[0].contains("PRINTO01_IXOB."));
        assert!(lines[2].contains("100.000"));
        assert_eq!(lines[3], "... 1 more rows");
    }

    #[test]
    fn dimensions_list_codes_and_names() {
        let axes = vec![DimensionAxis {
            id: "SUBJECT".into(),
            name: "Subject".into(),
            entries: vec![AxisEntry {
                index: 0,
                code: "CCRETT01".into(),
                display_name: "Consumer prices".into(),
            }],
        }];
        let text = format_dimensions(&axes);
        assert!(text.starts_with("[0] SUBJECT (Subject) - 1 values\n"));
        assert!(text.contains("CCRETT01"));
        assert!(text.contains("Consumer prices"));
    }
}
