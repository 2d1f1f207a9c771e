// CSV/TSV import as a single-sheet table

use std::path::Path;

use celldelta_engine::{CellValue, Table};
use encoding_rs::{Encoding, WINDOWS_1252};
use log::debug;

use crate::error::{InputShapeError, IoError};
use crate::grid::table_from_rows;

/// Field values read as blank cells.
const NA_VALUES: &[&str] = &["", "#N/A", "#NA", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None"];

/// Candidate delimiters, in tie-break order.
const DELIMITERS: &[u8] = &[b',', b'\t', b';', b'|'];

/// Lines looked at when guessing the delimiter.
const SNIFF_LINES: usize = 20;

/// Sheet name a CSV file stands for: its file stem.
pub fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string())
}

/// Read a CSV file with its header on the 1-indexed `header_row`.
pub fn read_table(path: &Path, header_row: usize) -> Result<Table, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::open(path, e))?;
    let content = decode(&bytes);
    let delimiter = sniff_delimiter(&content, header_row);
    debug!("csv {}: delimiter {:?}", path.display(), delimiter as char);
    import_from_string(path, &content, delimiter, header_row)
}

/// Text of a CSV file: a BOM picks the encoding, otherwise UTF-8 with a
/// Windows-1252 fallback for Excel exports.
fn decode(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding.decode_without_bom_handling(&bytes[bom_len..]).0.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

/// Delimiter whose records agree with the header's width most often.
///
/// Only records from `header_row` on are sampled, so a title line above
/// the header does not vote. Comma wins ties.
fn sniff_delimiter(content: &str, header_row: usize) -> u8 {
    let sample: String = content
        .lines()
        .skip(header_row.saturating_sub(1))
        .take(SNIFF_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    DELIMITERS
        .iter()
        .copied()
        .filter_map(|delimiter| {
            let widths: Vec<usize> = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .flexible(true)
                .from_reader(sample.as_bytes())
                .records()
                .filter_map(Result::ok)
                .map(|r| r.len())
                .collect();
            let header_width = *widths.first()?;
            if header_width < 2 {
                return None;
            }
            let agreeing = widths.iter().filter(|&&w| w == header_width).count();
            Some((agreeing, header_width, delimiter))
        })
        .fold(None, |best: Option<(usize, usize, u8)>, candidate| match best {
            Some(b) if (b.0, b.1) >= (candidate.0, candidate.1) => Some(b),
            _ => Some(candidate),
        })
        .map(|(_, _, delimiter)| delimiter)
        .unwrap_or(b',')
}

fn parse_field(field: &str) -> CellValue {
    if NA_VALUES.contains(&field) {
        return CellValue::Missing;
    }
    match field.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(field.to_string()),
    }
}

fn import_from_string(path: &Path, content: &str, delimiter: u8, header_row: usize) -> Result<Table, IoError> {
    let sheet = sheet_name(path);
    let sheet = sheet.as_str();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::open(path, e))?;
        rows.push(record.iter().map(parse_field).collect());
    }

    if rows.is_empty() {
        return Err(InputShapeError::EmptySheet { sheet: sheet.to_string() }.into());
    }
    if header_row == 0 || header_row > rows.len() {
        return Err(InputShapeError::HeaderRowOutOfRange {
            sheet: sheet.to_string(),
            header_row,
            rows: rows.len(),
        }
        .into());
    }

    let table = table_from_rows(sheet, rows.split_off(header_row - 1))?;
    debug!("csv {sheet}: {} rows x {} columns", table.row_count(), table.column_count());
    Ok(table)
}
