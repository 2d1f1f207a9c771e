// Header row + data rows -> Table.
//
// Shared by the workbook and CSV readers so both name columns the same way.

use celldelta_engine::table::ARTIFACT_PREFIX;
use celldelta_engine::{CellValue, Column, Table};

use crate::error::IoError;

/// Header text for a header cell; blank headers get a placeholder name.
fn header_name(cell: &CellValue, col: usize) -> String {
    match cell {
        CellValue::Missing => format!("{ARTIFACT_PREFIX}: {col}"),
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        CellValue::Number(n) => format!("{n}"),
        CellValue::Text(s) => s.clone(),
    }
}

/// Suffix repeated names `.1`, `.2`, ... in order of appearance.
fn dedupe_headers(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
            continue;
        }
        let mut n = 1;
        let renamed = loop {
            let candidate = format!("{name}.{n}");
            if !out.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        out.push(renamed);
    }
    out
}

/// Build a table from rows where `rows[0]` is the header.
///
/// Rows may be ragged; the widest row sets the column count. Trailing rows
/// with no values are dropped, blank rows in between are kept.
pub(crate) fn table_from_rows(sheet: &str, rows: Vec<Vec<CellValue>>) -> Result<Table, IoError> {
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    let mut data: Vec<Vec<CellValue>> = rows.collect();

    while data.last().is_some_and(|r| r.iter().all(CellValue::is_missing)) {
        data.pop();
    }

    let width = data.iter().map(Vec::len).chain(std::iter::once(header.len())).max().unwrap_or(0);
    let names = dedupe_headers(
        (0..width)
            .map(|col| header_name(header.get(col).unwrap_or(&CellValue::Missing), col))
            .collect(),
    );

    let mut columns: Vec<Column> = names.into_iter().map(|n| Column::new(n, Vec::with_capacity(data.len()))).collect();
    for record in data {
        let mut fields = record.into_iter();
        for column in columns.iter_mut() {
            column.cells.push(fields.next().unwrap_or_default());
        }
    }

    Table::new(columns).map_err(|source| IoError::Table { sheet: sheet.to_string(), source })
}
