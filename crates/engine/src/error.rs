use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Summary asked to total a column the updated table does not have.
    MissingColumn { column: String },
    /// Column length disagrees with the table's row count.
    RaggedTable { column: String, expected: usize, found: usize },
    /// Two columns share a name.
    DuplicateColumn(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { column } => {
                write!(f, "column '{column}' is numeric in the initial table but missing from the updated table")
            }
            Self::RaggedTable { column, expected, found } => {
                write!(f, "column '{column}' has {found} rows, expected {expected}")
            }
            Self::DuplicateColumn(name) => write!(f, "duplicate column name '{name}'"),
        }
    }
}

impl std::error::Error for EngineError {}
