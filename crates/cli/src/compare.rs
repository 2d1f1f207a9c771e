// Per-sheet comparison of two workbooks.
// Loads both sides, runs the engine, writes the highlighted diff workbook.
// No clap, no printing.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};

use celldelta_engine::{diff, summarize, DiffResult, EngineError, SummaryResult};
use celldelta_io::{DiffSheet, HighlightStyle, IoError};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub initial: PathBuf,
    pub updated: PathBuf,
    /// Empty = every sheet of the initial workbook.
    pub sheets: Vec<String>,
    /// 1-indexed header row, shared by input and output.
    pub header_row: usize,
    pub output: PathBuf,
    pub summary_output: Option<PathBuf>,
    pub style: HighlightStyle,
}

/// Report labels joined into an output file name.
///
/// `["Acme", "EU", "Forecast"]` + `Differences` -> `<dir>/Acme EU Forecast Differences.xlsx`.
/// Without labels the initial file's stem is used instead.
pub fn default_output_path(initial: &Path, labels: &[&str], suffix: &str) -> PathBuf {
    let labels: Vec<&str> = labels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    let stem = if labels.is_empty() {
        initial
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workbook".to_string())
    } else {
        labels.join(" ")
    };
    let dir = initial.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{stem} {suffix}.xlsx"))
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SheetReport {
    pub sheet: String,
    pub diff: DiffResult,
    pub summary: SummaryResult,
}

#[derive(Debug)]
pub enum SheetError {
    /// Reading the initial or updated side failed.
    Load { side: Side, source: IoError },
    /// The engine rejected the pair (e.g. a summary column vanished).
    Engine(EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Initial,
    Updated,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Initial => "initial",
            Side::Updated => "updated",
        }
    }
}

#[derive(Debug)]
pub struct SheetFailure {
    pub sheet: String,
    pub error: SheetError,
}

impl fmt::Display for SheetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            SheetError::Load { side, source } => {
                write!(f, "sheet '{}' ({} workbook): {source}", self.sheet, side.as_str())
            }
            SheetError::Engine(err) => write!(f, "sheet '{}': {err}", self.sheet),
        }
    }
}

#[derive(Debug)]
pub struct CompareReport {
    pub sheets: Vec<SheetReport>,
    pub failures: Vec<SheetFailure>,
    pub output: PathBuf,
    pub summary_output: Option<PathBuf>,
}

impl CompareReport {
    pub fn changed_cells(&self) -> usize {
        self.sheets.iter().map(|s| s.diff.stats.changed_cells).sum()
    }
}

#[derive(Debug)]
pub enum CompareError {
    /// Sheet enumeration of the initial workbook failed.
    ListSheets(IoError),
    /// No sheet could be compared; nothing was written.
    NoSheets(Vec<SheetFailure>),
    /// Output workbook could not be written.
    Write(IoError),
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListSheets(err) => write!(f, "cannot list sheets: {err}"),
            Self::NoSheets(failures) if failures.is_empty() => write!(f, "no sheets to compare"),
            Self::NoSheets(failures) => {
                write!(f, "no sheet could be compared:")?;
                for failure in failures {
                    write!(f, "\n  {failure}")?;
                }
                Ok(())
            }
            Self::Write(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CompareError {}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Load one sheet from both files and diff + summarize it.
pub fn compare_sheet(initial: &Path, updated: &Path, sheet: &str, header_row: usize) -> Result<SheetReport, SheetFailure> {
    let fail = |error| SheetFailure { sheet: sheet.to_string(), error };

    let initial_table = celldelta_io::load_table(initial, sheet, header_row)
        .map_err(|source| fail(SheetError::Load { side: Side::Initial, source }))?
        .without_artifacts();
    let updated_table = celldelta_io::load_table(updated, sheet, header_row)
        .map_err(|source| fail(SheetError::Load { side: Side::Updated, source }))?
        .without_artifacts();

    let result = diff(&initial_table, &updated_table);
    let summary = summarize(&initial_table, &updated_table).map_err(|e| fail(SheetError::Engine(e)))?;

    info!(
        "sheet '{}': {} rows compared, {} changed cells, {} summary columns",
        sheet,
        result.table.row_count(),
        result.stats.changed_cells,
        summary.rows.len()
    );

    Ok(SheetReport { sheet: sheet.to_string(), diff: result, summary })
}

/// Compare every requested sheet and write the output workbooks.
///
/// A failing sheet is recorded and skipped; the run only fails outright when
/// no sheet succeeds or an output cannot be written.
pub fn run(request: &CompareRequest) -> Result<CompareReport, CompareError> {
    let sheets = if request.sheets.is_empty() {
        celldelta_io::sheet_names(&request.initial).map_err(CompareError::ListSheets)?
    } else {
        request.sheets.clone()
    };

    let mut reports = Vec::with_capacity(sheets.len());
    let mut failures = Vec::new();
    for sheet in &sheets {
        match compare_sheet(&request.initial, &request.updated, sheet, request.header_row) {
            Ok(report) => reports.push(report),
            Err(failure) => {
                warn!("{failure}");
                failures.push(failure);
            }
        }
    }

    if reports.is_empty() {
        return Err(CompareError::NoSheets(failures));
    }

    let diff_sheets: Vec<DiffSheet<'_>> = reports
        .iter()
        .map(|r| DiffSheet { name: &r.sheet, result: &r.diff })
        .collect();
    celldelta_io::xlsx::write_diff_workbook(&request.output, &diff_sheets, request.header_row, &request.style)
        .map_err(CompareError::Write)?;

    if let Some(ref summary_path) = request.summary_output {
        let summaries: Vec<(&str, &SummaryResult)> = reports.iter().map(|r| (r.sheet.as_str(), &r.summary)).collect();
        celldelta_io::xlsx::write_summary_workbook(summary_path, &summaries).map_err(CompareError::Write)?;
    }

    Ok(CompareReport {
        sheets: reports,
        failures,
        output: request.output.clone(),
        summary_output: request.summary_output.clone(),
    })
}
