// File I/O: load input tables, export diff and summary workbooks

pub mod csv;
mod error;
mod grid;
pub mod xlsx;

use std::path::Path;

use celldelta_engine::Table;

pub use error::{InputShapeError, IoError};
pub use xlsx::{DiffSheet, ExportResult, HighlightStyle};

/// Input file kind, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// xlsx, xlsm, xls, xlsb, ods
    Workbook,
    /// csv, tsv, txt: one sheet named after the file stem
    Delimited,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Self::Delimited,
            _ => Self::Workbook,
        }
    }
}

/// Sheets the file offers, in file order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    match SourceFormat::from_path(path) {
        SourceFormat::Workbook => xlsx::sheet_names(path),
        SourceFormat::Delimited => {
            if !path.is_file() {
                return Err(IoError::Open {
                    path: path.to_path_buf(),
                    detail: "no such file".to_string(),
                });
            }
            Ok(vec![csv::sheet_name(path)])
        }
    }
}

/// Load one sheet as a table, header on the 1-indexed `header_row`.
///
/// Delimited files have a single sheet, so `sheet` is ignored for them.
pub fn load_table(path: &Path, sheet: &str, header_row: usize) -> Result<Table, IoError> {
    match SourceFormat::from_path(path) {
        SourceFormat::Workbook => xlsx::read_table(path, sheet, header_row),
        SourceFormat::Delimited => csv::read_table(path, header_row),
    }
}
