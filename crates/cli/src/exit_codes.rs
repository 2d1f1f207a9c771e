//! CLI exit code registry
//!
//! Every code the `celldelta` binary can return is defined here.
//! Scripts depend on these values.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Every requested sheet compared and written                 |
//! | 1    | Partial run (some sheets failed) or unspecified failure    |
//! | 2    | Usage error (bad arguments, missing input file)            |
//! | 3    | Input shape error (sheet missing, header row out of range) |
//! | 4    | Summary error (numeric column missing from updated)        |
//! | 5    | Output workbook could not be written                       |
//! | 6    | Settings file unreadable or invalid                        |

use celldelta_io::IoError;

use celldelta_cli::compare::{CompareError, SheetError, SheetFailure};

/// Every requested sheet compared and written.
pub const EXIT_SUCCESS: u8 = 0;

/// Some sheets failed while others succeeded, or an unclassified failure.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

/// Sheet missing, header row past the end, empty sheet, malformed table.
pub const EXIT_INPUT_SHAPE: u8 = 3;

/// A numeric column of the initial table is absent from the updated one.
pub const EXIT_SUMMARY: u8 = 4;

/// Diff or summary workbook could not be written.
pub const EXIT_WRITE: u8 = 5;

/// Settings file unreadable or invalid.
pub const EXIT_CONFIG: u8 = 6;

/// Exit code for a load error.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Open { .. } => EXIT_USAGE,
        IoError::Shape(_) | IoError::Table { .. } => EXIT_INPUT_SHAPE,
        IoError::Write { .. } => EXIT_WRITE,
    }
}

/// Exit code for a single failed sheet.
pub fn sheet_exit_code(failure: &SheetFailure) -> u8 {
    match &failure.error {
        SheetError::Load { source, .. } => io_exit_code(source),
        SheetError::Engine(_) => EXIT_SUMMARY,
    }
}

/// Exit code for a run that produced no output.
///
/// When every sheet failed the same way that code is used; mixed causes
/// collapse to `EXIT_ERROR`.
pub fn compare_exit_code(err: &CompareError) -> u8 {
    match err {
        CompareError::ListSheets(e) => io_exit_code(e),
        CompareError::Write(_) => EXIT_WRITE,
        CompareError::NoSheets(failures) => {
            let mut codes = failures.iter().map(sheet_exit_code);
            match codes.next() {
                None => EXIT_INPUT_SHAPE,
                Some(first) if codes.all(|c| c == first) => first,
                Some(_) => EXIT_ERROR,
            }
        }
    }
}
