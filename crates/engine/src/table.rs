// Column-oriented table with positional rows.

use serde::Serialize;

use crate::cell::CellValue;
use crate::error::EngineError;

/// Prefix given to headers generated for blank header cells.
pub const ARTIFACT_PREFIX: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self { name: name.into(), cells }
    }

    /// Cell at `row`, or `Missing` past the end.
    pub fn get(&self, row: usize) -> &CellValue {
        self.cells.get(row).unwrap_or(&CellValue::Missing)
    }

    /// True when every non-missing cell holds a number.
    ///
    /// An all-blank column is numeric, like a float column of NaNs.
    pub fn is_numeric(&self) -> bool {
        self.cells
            .iter()
            .all(|c| matches!(c, CellValue::Missing | CellValue::Number(_)))
    }

    /// Sum of the numeric cells, skipping everything else.
    pub fn sum(&self) -> f64 {
        self.cells.iter().filter_map(CellValue::as_number).sum()
    }

    pub fn is_artifact(&self) -> bool {
        is_artifact_name(&self.name)
    }
}

pub fn is_artifact_name(name: &str) -> bool {
    name.starts_with(ARTIFACT_PREFIX)
}

/// Ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, EngineError> {
        let rows = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.cells.len() != rows {
                return Err(EngineError::RaggedTable {
                    column: col.name.clone(),
                    expected: rows,
                    found: col.cells.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(EngineError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Columns already known to be unique and `rows` long.
    pub(crate) fn assemble(columns: Vec<Column>, rows: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.cells.len() == rows));
        Self { columns, rows }
    }

    /// Build from a header row and row-major records.
    ///
    /// Short records are padded with `Missing`; extra fields are dropped.
    pub fn from_rows<I, R>(headers: &[&str], records: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = CellValue>,
    {
        let mut columns: Vec<Column> = headers.iter().map(|h| Column::new(*h, Vec::new())).collect();
        for record in records {
            let mut fields = record.into_iter();
            for col in columns.iter_mut() {
                col.cells.push(fields.next().unwrap_or_default());
            }
        }
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell at (`row`, `column`), `Missing` for unknown columns or rows.
    pub fn cell(&self, row: usize, column: &str) -> &CellValue {
        match self.column(column) {
            Some(col) => col.get(row),
            None => &CellValue::Missing,
        }
    }

    /// Copy of the table without placeholder columns for blank headers.
    pub fn without_artifacts(&self) -> Table {
        Table {
            columns: self.columns.iter().filter(|c| !c.is_artifact()).cloned().collect(),
            rows: self.rows,
        }
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
