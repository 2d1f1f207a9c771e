use log::warn;
use serde::Serialize;

use crate::cell::CellValue;
use crate::error::EngineError;
use crate::format::format_number;
use crate::table::{Column, Table};

pub const SUMMARY_COLUMN: &str = "Column";
pub const SUMMARY_INITIAL: &str = "Initial Total";
pub const SUMMARY_UPDATED: &str = "Updated Total";

/// Before/after totals for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub column: String,
    pub initial_total: f64,
    pub updated_total: f64,
}

impl SummaryRow {
    pub fn delta(&self) -> f64 {
        self.updated_total - self.initial_total
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryResult {
    pub rows: Vec<SummaryRow>,
}

impl SummaryResult {
    pub fn get(&self, column: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.column == column)
    }

    /// `Column | Initial Total | Updated Total` with numeric totals.
    pub fn to_table(&self) -> Table {
        self.build_table(|n| CellValue::Number(n))
    }

    /// Same layout, totals rendered as `1,234.50` text for display.
    pub fn to_display_table(&self) -> Table {
        self.build_table(|n| CellValue::Text(format_number(n)))
    }

    fn build_table(&self, total: impl Fn(f64) -> CellValue) -> Table {
        let names = self.rows.iter().map(|r| CellValue::text(&r.column)).collect();
        let initial = self.rows.iter().map(|r| total(r.initial_total)).collect();
        let updated = self.rows.iter().map(|r| total(r.updated_total)).collect();
        Table::assemble(
            vec![
                Column::new(SUMMARY_COLUMN, names),
                Column::new(SUMMARY_INITIAL, initial),
                Column::new(SUMMARY_UPDATED, updated),
            ],
            self.rows.len(),
        )
    }
}

/// Total every numeric column of `initial` in both tables.
///
/// Placeholder columns are ignored on both sides. A numeric column that the
/// updated table lacks is an error; one that turned textual there is left
/// out of the summary.
pub fn summarize(initial: &Table, updated: &Table) -> Result<SummaryResult, EngineError> {
    let initial = initial.without_artifacts();
    let updated = updated.without_artifacts();

    let mut rows = Vec::new();
    for column in initial.columns().iter().filter(|c| c.is_numeric()) {
        let Some(counterpart) = updated.column(&column.name) else {
            return Err(EngineError::MissingColumn { column: column.name.clone() });
        };
        if !counterpart.is_numeric() {
            warn!("column '{}' is not numeric in the updated table; left out of the summary", column.name);
            continue;
        }
        rows.push(SummaryRow {
            column: column.name.clone(),
            initial_total: column.sum(),
            updated_total: counterpart.sum(),
        });
    }

    Ok(SummaryResult { rows })
}
