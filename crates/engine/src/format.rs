// Display formatting for summary totals.

use crate::summary::SummaryResult;
use crate::table::Table;

/// Two decimals with `,` thousands separators: `1234.5` -> `1,234.50`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    if n < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push('.');
    grouped.push_str(frac_part);
    grouped
}

/// Summary table with totals rendered for display.
///
/// Only meant for the final summary; totals are computed before this runs.
pub fn format_summary(summary: &SummaryResult) -> Table {
    summary.to_display_table()
}
