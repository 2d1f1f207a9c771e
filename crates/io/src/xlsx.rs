// Excel import (xlsx, xlsm, xls, xlsb, ods) and highlighted export

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate};
use log::{debug, info};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook as XlsxWorkbook, Worksheet};

use celldelta_engine::differ::is_synthetic_column;
use celldelta_engine::{CellValue, DiffResult, SummaryResult};

use crate::error::{InputShapeError, IoError};
use crate::grid::table_from_rows;

/// Excel caps sheet names at 31 characters.
pub const MAX_SHEET_NAME: usize = 31;

/// Suffix for summary sheet names.
pub const SUMMARY_SHEET_SUFFIX: &str = " Summary";

/// Characters Excel rejects in sheet names.
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

// ============================================================================
// Import
// ============================================================================

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    let workbook = open_workbook_auto(path).map_err(|e| IoError::open(path, e))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Read `sheet` with its header on the 1-indexed `header_row`.
///
/// Rows above the header are skipped. Blank header cells are named
/// `Unnamed: <col>` so callers can drop them.
pub fn read_table(path: &Path, sheet: &str, header_row: usize) -> Result<celldelta_engine::Table, IoError> {
    let start_time = Instant::now();

    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::open(path, e))?;
    let available = workbook.sheet_names().to_vec();
    if !available.iter().any(|s| s == sheet) {
        return Err(InputShapeError::SheetNotFound { sheet: sheet.to_string(), available }.into());
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| IoError::open(path, format!("failed to read sheet '{sheet}': {e}")))?;

    let rows = rows_from_header(&range, sheet, header_row)?;
    let table = table_from_rows(sheet, rows)?;

    debug!(
        "read {}:{} -> {} rows x {} columns in {}ms",
        path.display(),
        sheet,
        table.row_count(),
        table.column_count(),
        start_time.elapsed().as_millis()
    );
    Ok(table)
}

/// Absolute rows `header_row - 1 ..= last used row`, columns from A.
fn rows_from_header(range: &Range<Data>, sheet: &str, header_row: usize) -> Result<Vec<Vec<CellValue>>, IoError> {
    let Some(end) = range.end() else {
        return Err(InputShapeError::EmptySheet { sheet: sheet.to_string() }.into());
    };
    let last_row = end.0 as usize;
    let width = end.1 as usize + 1;

    if header_row == 0 || header_row - 1 > last_row {
        return Err(InputShapeError::HeaderRowOutOfRange {
            sheet: sheet.to_string(),
            header_row,
            rows: last_row + 1,
        }
        .into());
    }

    let mut rows = Vec::with_capacity(last_row + 2 - header_row);
    for row in (header_row - 1)..=last_row {
        let record = (0..width)
            .map(|col| {
                range
                    .get_value((row as u32, col as u32))
                    .map(cell_from_data)
                    .unwrap_or_default()
            })
            .collect();
        rows.push(record);
    }
    Ok(rows)
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Missing,
        Data::String(s) if s.is_empty() => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::from(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => CellValue::Text(serial_to_text(dt.as_f64())),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Render an Excel serial date (1900 system) as ISO text.
///
/// Date-only serials give `YYYY-MM-DD`, time-only serials `HH:MM:SS`.
fn serial_to_text(serial: f64) -> String {
    let has_date = serial.floor() > 0.0;
    let has_time = serial.fract().abs() > 0.0001;

    // Serials before 1900-03-01 sit on the wrong side of Excel's phantom 1900-02-29.
    let epoch = if serial < 61.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    let Some(midnight) = epoch.and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return format!("{serial}");
    };

    let seconds = (serial * 86_400.0).round() as i64;
    let stamp = midnight + Duration::seconds(seconds);

    match (has_date, has_time) {
        (true, true) => stamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        (false, true) => stamp.format("%H:%M:%S").to_string(),
        _ => stamp.format("%Y-%m-%d").to_string(),
    }
}

// ============================================================================
// Export
// ============================================================================

/// Fill colors used when exporting a diff, as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightStyle {
    /// Data cells whose value changed.
    pub changed: u32,
    /// Header cells of `Comments` and `_% Change` columns.
    pub synthetic_header: u32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            changed: 0xFFB6C1,
            synthetic_header: 0xADD8E6,
        }
    }
}

/// One sheet of a diff workbook.
pub struct DiffSheet<'a> {
    pub name: &'a str,
    pub result: &'a DiffResult,
}

#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub sheets_exported: usize,
    /// Names as written, in order. May differ from the requested names.
    pub sheet_names: Vec<String>,
    pub cells_exported: usize,
    pub cells_highlighted: usize,
    pub export_duration_ms: u128,
}

/// Write each diff to its own sheet, header on the 1-indexed `header_row`.
pub fn write_diff_workbook(
    path: &Path,
    sheets: &[DiffSheet<'_>],
    header_row: usize,
    style: &HighlightStyle,
) -> Result<ExportResult, IoError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();

    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
    let synthetic_header_format = header_format.clone().set_background_color(Color::RGB(style.synthetic_header));
    let changed_format = Format::new().set_background_color(Color::RGB(style.changed));

    let header_row32 = header_row.saturating_sub(1) as u32;

    let mut names = SheetNames::default();
    for sheet in sheets {
        let name = names.claim(sheet.name, "");
        if name != sheet.name {
            debug!("sheet '{}' written as '{}'", sheet.name, name);
        }
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&name)
            .map_err(|e| IoError::write(path, format!("failed to create sheet '{name}': {e}")))?;

        let table = &sheet.result.table;
        for (col, column) in table.columns().iter().enumerate() {
            let format = if is_synthetic_column(&column.name) {
                &synthetic_header_format
            } else {
                &header_format
            };
            worksheet
                .write_string_with_format(header_row32, col as u16, &column.name, format)
                .map_err(|e| IoError::write(path, format!("failed to write header '{}': {e}", column.name)))?;

            for (row, cell) in column.cells.iter().enumerate() {
                let row32 = header_row32 + 1 + row as u32;
                let highlight = sheet.result.is_changed(row, col).then_some(&changed_format);
                if highlight.is_some() {
                    result.cells_highlighted += 1;
                }
                if write_cell(worksheet, row32, col as u16, cell, highlight)
                    .map_err(|e| IoError::write(path, format!("sheet '{}' row {} column '{}': {e}", sheet.name, row + 1, column.name)))?
                {
                    result.cells_exported += 1;
                }
            }
        }

        result.sheets_exported += 1;
        result.sheet_names.push(name);
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| IoError::write(path, format!("failed to save XLSX file: {e}")))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    info!(
        "wrote {} ({} sheets, {} cells, {} highlighted)",
        path.display(),
        result.sheets_exported,
        result.cells_exported,
        result.cells_highlighted
    );
    Ok(result)
}

/// Returns whether anything was written; blank cells are only written when highlighted.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    format: Option<&Format>,
) -> Result<bool, rust_xlsxwriter::XlsxError> {
    match (cell, format) {
        (CellValue::Missing, None) => return Ok(false),
        (CellValue::Missing, Some(format)) => {
            worksheet.write_blank(row, col, format)?;
        }
        (CellValue::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
        (CellValue::Number(n), Some(format)) => {
            worksheet.write_number_with_format(row, col, *n, format)?;
        }
        (CellValue::Text(s), None) => {
            worksheet.write_string(row, col, s)?;
        }
        (CellValue::Text(s), Some(format)) => {
            worksheet.write_string_with_format(row, col, s, format)?;
        }
    }
    Ok(true)
}

/// Sheet names handed out for one output workbook.
///
/// Names are cleaned of characters Excel forbids, cut to 31 characters and
/// made unique (case-insensitively, as Excel compares them) with ` (2)`,
/// ` (3)`, ... before the suffix.
#[derive(Debug, Default)]
struct SheetNames {
    taken: Vec<String>,
}

impl SheetNames {
    fn claim(&mut self, base: &str, suffix: &str) -> String {
        let cleaned: String = base
            .chars()
            .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
            .collect();
        let cleaned = cleaned.trim_matches('\'').trim();
        let cleaned = if cleaned.is_empty() { "Sheet" } else { cleaned };

        let mut n = 1;
        loop {
            let tag = if n == 1 { String::new() } else { format!(" ({n})") };
            let budget = MAX_SHEET_NAME.saturating_sub(suffix.chars().count() + tag.chars().count());
            let head: String = cleaned.chars().take(budget).collect();
            let name = format!("{}{tag}{suffix}", head.trim_end_matches('\'').trim_end());
            let key = name.to_lowercase();
            if !self.taken.contains(&key) {
                self.taken.push(key);
                return name;
            }
            n += 1;
        }
    }
}

/// Write one `<sheet> Summary` sheet per entry with display-formatted totals.
pub fn write_summary_workbook(path: &Path, summaries: &[(&str, &SummaryResult)]) -> Result<ExportResult, IoError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);

    let mut names = SheetNames::default();
    for (sheet, summary) in summaries {
        let name = names.claim(sheet, SUMMARY_SHEET_SUFFIX);
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&name)
            .map_err(|e| IoError::write(path, format!("failed to create sheet '{name}': {e}")))?;

        let table = celldelta_engine::format_summary(summary);
        for (col, column) in table.columns().iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, &column.name, &header_format)
                .map_err(|e| IoError::write(path, e))?;
            for (row, cell) in column.cells.iter().enumerate() {
                if write_cell(worksheet, row as u32 + 1, col as u16, cell, None).map_err(|e| IoError::write(path, e))? {
                    result.cells_exported += 1;
                }
            }
        }
        worksheet.autofit();
        result.sheets_exported += 1;
        result.sheet_names.push(name);
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| IoError::write(path, format!("failed to save XLSX file: {e}")))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    info!("wrote summary {} ({} sheets)", path.display(), result.sheets_exported);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use celldelta_engine::{diff, summarize, Column, Table};
    use tempfile::tempdir;

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    /// Sheet "Data" with a title row, header on row 2.
    fn write_fixture(path: &Path) {
        let mut wb = XlsxWorkbook::new();
        let ws = wb.add_worksheet().set_name("Data").unwrap();
        ws.write_string(0, 0, "Quarterly report").unwrap();
        ws.write_string(1, 0, "Region").unwrap();
        ws.write_string(1, 1, "Sales").unwrap();
        ws.write_string(1, 3, "Notes").unwrap();
        ws.write_string(2, 0, "North").unwrap();
        ws.write_number(2, 1, 100.0).unwrap();
        ws.write_string(3, 0, "South").unwrap();
        ws.write_number(3, 1, 250.5).unwrap();
        ws.write_string(3, 2, "stray").unwrap();
        ws.write_boolean(3, 3, true).unwrap();
        wb.add_worksheet().set_name("Other").unwrap();
        wb.save(path).unwrap();
    }

    #[test]
    fn lists_sheets_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_fixture(&path);
        assert_eq!(sheet_names(&path).unwrap(), vec!["Data", "Other"]);
    }

    #[test]
    fn reads_from_header_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_fixture(&path);

        let table = read_table(&path, "Data", 2).unwrap();
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["Region", "Sales", "Unnamed: 2", "Notes"]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "Region"), &CellValue::text("North"));
        assert_eq!(table.cell(1, "Sales"), &num(250.5));
        assert_eq!(table.cell(1, "Notes"), &CellValue::text("TRUE"));
        assert_eq!(table.cell(0, "Notes"), &CellValue::Missing);
    }

    #[test]
    fn missing_sheet_and_bad_header_row_are_shape_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_fixture(&path);

        match read_table(&path, "Nope", 2) {
            Err(IoError::Shape(InputShapeError::SheetNotFound { sheet, available })) => {
                assert_eq!(sheet, "Nope");
                assert_eq!(available, vec!["Data", "Other"]);
            }
            other => panic!("expected SheetNotFound, got {other:?}"),
        }
        assert!(matches!(
            read_table(&path, "Data", 0),
            Err(IoError::Shape(InputShapeError::HeaderRowOutOfRange { header_row: 0, .. }))
        ));
        assert!(matches!(
            read_table(&path, "Data", 9),
            Err(IoError::Shape(InputShapeError::HeaderRowOutOfRange { rows: 4, .. }))
        ));
        assert!(matches!(
            read_table(&path, "Other", 1),
            Err(IoError::Shape(InputShapeError::EmptySheet { .. }))
        ));
    }

    #[test]
    fn unreadable_file_is_open_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");
        assert!(matches!(sheet_names(&path), Err(IoError::Open { .. })));
    }

    #[test]
    fn serial_dates_render_as_iso() {
        assert_eq!(serial_to_text(45292.0), "2024-01-01");
        assert_eq!(serial_to_text(45292.5), "2024-01-01 12:00:00");
        assert_eq!(serial_to_text(0.25), "06:00:00");
        assert_eq!(serial_to_text(1.0), "1900-01-01");
    }

    #[test]
    fn diff_export_round_trips_values_at_header_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diff.xlsx");

        let initial = Table::new(vec![Column::new("Sales", vec![num(10.0), num(20.0)])]).unwrap();
        let updated = Table::new(vec![Column::new("Sales", vec![num(15.0)])]).unwrap();
        let result = diff(&initial, &updated);

        let stats = write_diff_workbook(
            &path,
            &[DiffSheet { name: "Data", result: &result }],
            3,
            &HighlightStyle::default(),
        )
        .unwrap();
        assert_eq!(stats.sheets_exported, 1);
        // Sales row 0 changed, row 1 dropped
        assert_eq!(stats.cells_highlighted, 2);

        let back = read_table(&path, "Data", 3).unwrap();
        assert_eq!(
            back.column_names().collect::<Vec<_>>(),
            vec!["Sales", "Comments", "Sales_% Change"]
        );
        assert_eq!(back.cell(0, "Sales"), &num(15.0));
        assert_eq!(back.cell(0, "Sales_% Change"), &num(50.0));
        assert_eq!(back.cell(1, "Comments"), &CellValue::text("This row was present in R1"));
    }

    #[test]
    fn summary_export_uses_suffixed_sheet_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.xlsx");
        let t = Table::new(vec![Column::new("N", vec![num(1234.5)])]).unwrap();
        let summary = summarize(&t, &t).unwrap();

        write_summary_workbook(&path, &[("Data", &summary)]).unwrap();
        assert_eq!(sheet_names(&path).unwrap(), vec!["Data Summary"]);

        let back = read_table(&path, "Data Summary", 1).unwrap();
        assert_eq!(back.cell(0, "Column"), &CellValue::text("N"));
        assert_eq!(back.cell(0, "Initial Total"), &CellValue::text("1,234.50"));
    }

    #[test]
    fn long_summary_names_are_truncated() {
        let mut names = SheetNames::default();
        let name = names.claim("A very long sheet name indeed!", SUMMARY_SHEET_SUFFIX);
        assert_eq!(name, "A very long sheet name Summary");
        assert!(name.chars().count() <= MAX_SHEET_NAME);
        assert_eq!(names.claim("Q1", SUMMARY_SHEET_SUFFIX), "Q1 Summary");
    }

    #[test]
    fn sheet_names_are_cleaned_and_cut() {
        let mut names = SheetNames::default();
        assert_eq!(names.claim("quarterly_forecast_export_2024_initial", ""), "quarterly_forecast_export_2024_");
        assert_eq!(names.claim("Q1/Q2 [draft]?", ""), "Q1_Q2 _draft__");
        assert_eq!(names.claim("'quoted'", ""), "quoted");
        assert_eq!(names.claim("", ""), "Sheet");
    }

    #[test]
    fn clashing_names_get_numbered() {
        let mut names = SheetNames::default();
        let first = names.claim("Regional forecast North America", SUMMARY_SHEET_SUFFIX);
        let second = names.claim("Regional forecast North Europe", SUMMARY_SHEET_SUFFIX);
        let third = names.claim("regional forecast north asia", SUMMARY_SHEET_SUFFIX);
        assert_eq!(first, "Regional forecast North Summary");
        assert_eq!(second, "Regional forecast N (2) Summary");
        assert_eq!(third, "regional forecast n (3) Summary");
        for name in [&first, &second, &third] {
            assert!(name.chars().count() <= MAX_SHEET_NAME);
        }
    }

    #[test]
    fn summary_export_survives_shared_prefixes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.xlsx");
        let t = Table::new(vec![Column::new("N", vec![num(1.0)])]).unwrap();
        let summary = summarize(&t, &t).unwrap();

        let stats = write_summary_workbook(
            &path,
            &[("Regional forecast North America", &summary), ("Regional forecast North Europe", &summary)],
        )
        .unwrap();
        assert_eq!(stats.sheets_exported, 2);
        assert_eq!(sheet_names(&path).unwrap(), stats.sheet_names);
    }

    #[test]
    fn diff_export_shortens_long_sheet_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diff.xlsx");
        let t = Table::new(vec![Column::new("N", vec![num(1.0)])]).unwrap();
        let result = diff(&t, &t);

        let stats = write_diff_workbook(
            &path,
            &[DiffSheet { name: "quarterly_forecast_export_2024_initial", result: &result }],
            1,
            &HighlightStyle::default(),
        )
        .unwrap();
        assert_eq!(stats.sheet_names, vec!["quarterly_forecast_export_2024_"]);
        assert_eq!(sheet_names(&path).unwrap(), stats.sheet_names);
    }
}
