//! `celldelta-engine`: positional table diff and column totals.
//!
//! Pure engine crate: receives two pre-loaded tables, returns an annotated
//! diff table and a per-column summary. No IO, no CLI, no shared state.

pub mod cell;
pub mod differ;
pub mod error;
pub mod format;
pub mod summary;
pub mod table;

pub use cell::CellValue;
pub use differ::{diff, CellPos, DiffResult, DiffStats};
pub use error::EngineError;
pub use format::{format_number, format_summary};
pub use summary::{summarize, SummaryResult, SummaryRow};
pub use table::{Column, Table};
