// Human and machine renderings of a comparison run.

use celldelta_engine::{format_summary, SummaryResult, Table};
use serde_json::{json, Value};

use crate::compare::{CompareReport, SheetError};

/// Column-aligned text table: names left-aligned, totals right-aligned.
///
/// ```text
/// Column  Initial Total  Updated Total
/// Sales        1,234.00       1,300.50
/// ```
pub fn render_summary(summary: &SummaryResult) -> String {
    render_table(&format_summary(summary))
}

fn render_table(table: &Table) -> String {
    let headers: Vec<&str> = table.column_names().collect();
    let rows: Vec<Vec<String>> = (0..table.row_count())
        .map(|row| headers.iter().map(|h| table.cell(row, h).to_string()).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, headers.iter().map(|h| h.to_string()), &widths);
    for row in rows {
        push_line(&mut out, row.into_iter(), &widths);
    }
    out
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| {
            if i == 0 {
                format!("{cell:<w$}")
            } else {
                format!("{cell:>w$}")
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Full run report for `--json`.
pub fn report_json(report: &CompareReport) -> Value {
    let sheets: Vec<Value> = report
        .sheets
        .iter()
        .map(|s| {
            json!({
                "sheet": s.sheet,
                "rows": s.diff.table.row_count(),
                "stats": s.diff.stats,
                "percent_columns": s.diff.percent_columns().collect::<Vec<_>>(),
                "summary": s.summary.rows.iter().map(|r| json!({
                    "column": r.column,
                    "initial_total": r.initial_total,
                    "updated_total": r.updated_total,
                    "delta": r.delta(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    let failures: Vec<Value> = report
        .failures
        .iter()
        .map(|f| {
            let side = match &f.error {
                SheetError::Load { side, .. } => Some(side.as_str()),
                SheetError::Engine(_) => None,
            };
            json!({ "sheet": f.sheet, "side": side, "error": f.to_string() })
        })
        .collect();

    json!({
        "output": report.output.display().to_string(),
        "summary_output": report.summary_output.as_ref().map(|p| p.display().to_string()),
        "changed_cells": report.changed_cells(),
        "sheets": sheets,
        "failures": failures,
    })
}
