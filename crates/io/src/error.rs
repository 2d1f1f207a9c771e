use std::fmt;
use std::path::{Path, PathBuf};

use celldelta_engine::EngineError;

/// The requested sheet or header position does not exist in the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum InputShapeError {
    SheetNotFound { sheet: String, available: Vec<String> },
    /// `header_row` is 1-indexed; `rows` is the sheet's used height.
    HeaderRowOutOfRange { sheet: String, header_row: usize, rows: usize },
    EmptySheet { sheet: String },
}

impl fmt::Display for InputShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SheetNotFound { sheet, available } => {
                write!(f, "sheet '{sheet}' not found (available: {})", available.join(", "))
            }
            Self::HeaderRowOutOfRange { sheet, header_row, rows } => {
                write!(f, "sheet '{sheet}': header row {header_row} is outside rows 1..={rows}")
            }
            Self::EmptySheet { sheet } => write!(f, "sheet '{sheet}' has no cells"),
        }
    }
}

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or parsed.
    Open { path: PathBuf, detail: String },
    Shape(InputShapeError),
    /// Loaded cells could not form a table.
    Table { sheet: String, source: EngineError },
    /// Output file could not be written.
    Write { path: PathBuf, detail: String },
}

impl IoError {
    pub(crate) fn open(path: &Path, detail: impl fmt::Display) -> Self {
        Self::Open { path: path.to_path_buf(), detail: detail.to_string() }
    }

    pub(crate) fn write(path: &Path, detail: impl fmt::Display) -> Self {
        Self::Write { path: path.to_path_buf(), detail: detail.to_string() }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, detail } => write!(f, "cannot read {}: {detail}", path.display()),
            Self::Shape(err) => write!(f, "{err}"),
            Self::Table { sheet, source } => write!(f, "sheet '{sheet}': {source}"),
            Self::Write { path, detail } => write!(f, "cannot write {}: {detail}", path.display()),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Table { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<InputShapeError> for IoError {
    fn from(err: InputShapeError) -> Self {
        Self::Shape(err)
    }
}
