// Positional table diff.
//
// Rows align by index, columns by exact name. The walk over the inputs only
// records decisions into a `DiffPlan`; the output table is built from the
// plan in a single pass afterwards.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::Serialize;

use crate::cell::CellValue;
use crate::table::{Column, Table};

/// Synthetic text column carrying per-row presence notes.
pub const COMMENTS_COLUMN: &str = "Comments";

/// Suffix of the synthetic percentage column for a numeric column.
pub const PERCENT_SUFFIX: &str = "_% Change";

/// Percentage marker used when the initial value is zero.
pub const NOT_APPLICABLE: &str = "N/A";

/// Comment for a result row that exists only in the initial table.
pub const ROW_ONLY_IN_INITIAL: &str = "This row was present in R1";

pub fn percent_column_name(column: &str) -> String {
    format!("{column}{PERCENT_SUFFIX}")
}

/// True for `Comments` and `<col>_% Change` headers.
pub fn is_synthetic_column(name: &str) -> bool {
    name == COMMENTS_COLUMN || name.ends_with(PERCENT_SUFFIX)
}

fn column_clause(column: &str) -> String {
    format!("{column} was present in R1; ")
}

/// Percentage change from `initial` to `updated`, `N/A` when `initial` is zero.
pub fn percent_change(initial: f64, updated: f64) -> CellValue {
    if initial == 0.0 {
        CellValue::text(NOT_APPLICABLE)
    } else {
        CellValue::Number((updated - initial) / initial * 100.0)
    }
}

/// Position of a cell inside `DiffResult::table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffStats {
    pub initial_rows: usize,
    pub updated_rows: usize,
    pub rows_only_in_initial: usize,
    pub rows_only_in_updated: usize,
    pub columns_only_in_initial: Vec<String>,
    pub columns_only_in_updated: Vec<String>,
    pub changed_cells: usize,
    pub percent_cells: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    /// Updated columns, then `Comments`, then `_% Change` columns.
    pub table: Table,
    /// Base-column cells whose value differs between the two inputs.
    pub changed: BTreeSet<CellPos>,
    pub stats: DiffStats,
}

impl DiffResult {
    pub fn is_changed(&self, row: usize, col: usize) -> bool {
        self.changed.contains(&CellPos { row, col })
    }

    /// Comment text for `row` (empty when the row had no anomalies).
    pub fn comment(&self, row: usize) -> &str {
        self.table.cell(row, COMMENTS_COLUMN).as_text().unwrap_or("")
    }

    /// Names of the `_% Change` columns in output order.
    pub fn percent_columns(&self) -> impl Iterator<Item = &str> {
        self.table.column_names().filter(|n| n.ends_with(PERCENT_SUFFIX))
    }

    /// No presence anomalies, no changed cells.
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty()
            && (0..self.table.row_count()).all(|row| self.comment(row).is_empty())
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DiffPlan<'a> {
    row_count: usize,
    comments: Vec<String>,
    /// Base column name -> (row -> percentage cell), in first-change order.
    percents: Vec<(&'a str, BTreeMap<usize, CellValue>)>,
}

impl<'a> DiffPlan<'a> {
    fn record_percent(&mut self, column: &'a str, row: usize, value: CellValue) {
        match self.percents.iter_mut().find(|(name, _)| *name == column) {
            Some((_, cells)) => {
                cells.insert(row, value);
            }
            None => {
                let mut cells = BTreeMap::new();
                cells.insert(row, value);
                self.percents.push((column, cells));
            }
        }
    }
}

fn plan<'a>(initial: &'a Table, updated: &Table) -> DiffPlan<'a> {
    let row_count = initial.row_count().max(updated.row_count());
    let mut plan = DiffPlan {
        row_count,
        comments: vec![String::new(); row_count],
        percents: Vec::new(),
    };

    for row in 0..row_count {
        if row >= updated.row_count() {
            plan.comments[row] = ROW_ONLY_IN_INITIAL.to_string();
            continue;
        }

        for column in initial.columns() {
            let name = column.name.as_str();
            let initial_value = column.get(row);
            let updated_column = updated.column(name);
            let updated_value = updated_column.map(|c| c.get(row)).unwrap_or(&CellValue::Missing);

            if updated_column.is_none() || (updated_value.is_missing() && !initial_value.is_missing()) {
                plan.comments[row].push_str(&column_clause(name));
            }

            if !initial_value.differs_from(updated_value) || !column.is_numeric() {
                continue;
            }
            if let (Some(before), Some(after)) = (initial_value.as_number(), updated_value.as_number()) {
                plan.record_percent(name, row, percent_change(before, after));
            }
        }
    }

    plan
}

fn change_mask(initial: &Table, updated: &Table, columns: &[Column], row_count: usize) -> BTreeSet<CellPos> {
    let mut changed = BTreeSet::new();
    for (col, column) in columns.iter().enumerate() {
        for row in 0..row_count {
            if initial.cell(row, &column.name).differs_from(updated.cell(row, &column.name)) {
                changed.insert(CellPos { row, col });
            }
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Compare `initial` against `updated` row by row.
///
/// The result keeps every updated column verbatim (padded with blanks to the
/// longer row count), appends `Comments`, then one `<col>_% Change` column
/// per numeric column that changed, in the order the first change of each
/// was met.
pub fn diff(initial: &Table, updated: &Table) -> DiffResult {
    let plan = plan(initial, updated);
    let row_count = plan.row_count;

    let mut columns: Vec<Column> = Vec::with_capacity(updated.column_count() + 1 + plan.percents.len());
    for column in updated.columns() {
        let synthetic_clash = column.name == COMMENTS_COLUMN
            || plan.percents.iter().any(|(base, _)| percent_column_name(base) == column.name);
        if synthetic_clash {
            warn!("updated column '{}' is replaced by the generated column of the same name", column.name);
            continue;
        }
        let mut cells = column.cells.clone();
        cells.resize(row_count, CellValue::Missing);
        columns.push(Column::new(column.name.clone(), cells));
    }

    let changed = change_mask(initial, updated, &columns, row_count);

    columns.push(Column::new(
        COMMENTS_COLUMN,
        plan.comments.into_iter().map(CellValue::Text).collect(),
    ));

    let mut percent_cells = 0;
    for (base, mut by_row) in plan.percents {
        percent_cells += by_row.len();
        let cells = (0..row_count)
            .map(|row| by_row.remove(&row).unwrap_or_default())
            .collect();
        columns.push(Column::new(percent_column_name(base), cells));
    }

    let stats = DiffStats {
        initial_rows: initial.row_count(),
        updated_rows: updated.row_count(),
        rows_only_in_initial: initial.row_count().saturating_sub(updated.row_count()),
        rows_only_in_updated: updated.row_count().saturating_sub(initial.row_count()),
        columns_only_in_initial: initial
            .column_names()
            .filter(|n| updated.column(n).is_none())
            .map(str::to_string)
            .collect(),
        columns_only_in_updated: updated
            .column_names()
            .filter(|n| initial.column(n).is_none())
            .map(str::to_string)
            .collect(),
        changed_cells: changed.len(),
        percent_cells,
    };
    debug!(
        "diff: {} x {} result, {} changed cells, {} percentage cells",
        row_count,
        columns.len(),
        stats.changed_cells,
        stats.percent_cells
    );

    DiffResult {
        table: Table::assemble(columns, row_count),
        changed,
        stats,
    }
}
