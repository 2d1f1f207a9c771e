// End-to-end tests for the celldelta binary.
//
// Each test builds its input workbooks in a temp dir, runs the binary with an
// empty settings file, and reads the written workbooks back with calamine.
//
// Run with: cargo test -p celldelta-cli --test compare_cli

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

#[derive(Clone, Copy)]
enum V<'a> {
    N(f64),
    S(&'a str),
    E,
}

use V::{E, N, S};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.toml"), "").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `sheets` with each sheet's first row on the 1-indexed `header_row`.
    fn workbook(&self, name: &str, header_row: u32, sheets: &[(&str, Vec<Vec<V<'_>>>)]) -> PathBuf {
        let path = self.path(name);
        let mut wb = Workbook::new();
        for (sheet, rows) in sheets {
            let ws = wb.add_worksheet().set_name(*sheet).unwrap();
            if header_row > 1 {
                ws.write_string(0, 0, "Snapshot export").unwrap();
            }
            for (r, row) in rows.iter().enumerate() {
                let r = header_row - 1 + r as u32;
                for (c, value) in row.iter().enumerate() {
                    match value {
                        N(n) => {
                            ws.write_number(r, c as u16, *n).unwrap();
                        }
                        S(s) => {
                            ws.write_string(r, c as u16, *s).unwrap();
                        }
                        E => {}
                    }
                }
            }
        }
        wb.save(&path).unwrap();
        path
    }

    fn celldelta(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_celldelta"));
        cmd.current_dir(self.dir.path());
        cmd.env("CELLDELTA_CONFIG", self.path("settings.toml"));
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn compare(&self, initial: &Path, updated: &Path, extra: &[&str]) -> Output {
        self.celldelta()
            .arg("compare")
            .arg(initial)
            .arg(updated)
            .args(extra)
            .output()
            .expect("run celldelta compare")
    }
}

fn read_sheet(path: &Path, sheet: &str) -> Range<Data> {
    let mut wb = open_workbook_auto(path).unwrap();
    wb.worksheet_range(sheet).unwrap()
}

fn at(range: &Range<Data>, row: u32, col: u32) -> Data {
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// `{A:[10,20], B:[x,y]}` vs `{A:[15,20], B:[x,z]}` on sheet "Data".
fn basic_pair(fx: &Fixture, header_row: u32) -> (PathBuf, PathBuf) {
    let initial = fx.workbook(
        "initial.xlsx",
        header_row,
        &[("Data", vec![vec![S("A"), S("B")], vec![N(10.0), S("x")], vec![N(20.0), S("y")]])],
    );
    let updated = fx.workbook(
        "updated.xlsx",
        header_row,
        &[("Data", vec![vec![S("A"), S("B")], vec![N(15.0), S("x")], vec![N(20.0), S("z")]])],
    );
    (initial, updated)
}

// ===========================================================================
// compare
// ===========================================================================

#[test]
fn compare_writes_diff_with_percent_column() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);
    let out = fx.path("diff.xlsx");

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "-o", out.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let range = read_sheet(&out, "Data");
    assert_eq!(at(&range, 0, 0), Data::String("A".into()));
    assert_eq!(at(&range, 0, 1), Data::String("B".into()));
    assert_eq!(at(&range, 0, 2), Data::String("Comments".into()));
    assert_eq!(at(&range, 0, 3), Data::String("A_% Change".into()));

    assert_eq!(at(&range, 1, 0), Data::Float(15.0));
    assert_eq!(at(&range, 1, 3), Data::Float(50.0));
    assert_eq!(at(&range, 2, 1), Data::String("z".into()));
    assert!(matches!(at(&range, 2, 3), Data::Empty));
}

#[test]
fn default_header_row_is_two() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 2);
    let out = fx.path("diff.xlsx");

    let output = fx.compare(&initial, &updated, &["-o", out.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let range = read_sheet(&out, "Data");
    assert_eq!(at(&range, 1, 0), Data::String("A".into()));
    assert_eq!(at(&range, 2, 0), Data::Float(15.0));
    assert_eq!(at(&range, 2, 3), Data::Float(50.0));
}

#[test]
fn default_output_name_uses_labels() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);

    let output = fx.compare(
        &initial,
        &updated,
        &["--header-row", "1", "--client", "Acme", "--market", "EU", "--type", "Forecast"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(fx.path("Acme EU Forecast Differences.xlsx").is_file());
}

#[test]
fn default_output_name_falls_back_to_initial_stem() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);

    let output = fx.compare(&initial, &updated, &["--header-row", "1"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(fx.path("initial Differences.xlsx").is_file());
}

#[test]
fn prints_summary_table() {
    let fx = Fixture::new();
    let initial = fx.workbook("initial.xlsx", 1, &[("Data", vec![vec![S("N")], vec![N(1.0)], vec![N(2.0)], vec![N(3.0)]])]);
    let updated = fx.workbook("updated.xlsx", 1, &[("Data", vec![vec![S("N")], vec![N(4.0)], vec![N(5.0)], vec![N(6.0)]])]);

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "-o", fx.path("d.xlsx").to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("Column  Initial Total  Updated Total"), "stdout: {text}");
    let row = text.lines().find(|l| l.starts_with("N ")).expect("summary row for N");
    assert!(row.contains("6.00") && row.contains("15.00"), "row: {row}");
}

#[test]
fn no_summary_print_keeps_stdout_empty() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);

    let output = fx.compare(
        &initial,
        &updated,
        &["--header-row", "1", "--no-summary-print", "-o", fx.path("d.xlsx").to_str().unwrap()],
    );
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn summary_workbook_has_formatted_totals() {
    let fx = Fixture::new();
    let initial = fx.workbook("initial.xlsx", 1, &[("Data", vec![vec![S("Sales")], vec![N(1000.0)], vec![E], vec![N(234.5)]])]);
    let updated = fx.workbook("updated.xlsx", 1, &[("Data", vec![vec![S("Sales")], vec![N(2000.0)], vec![N(0.25)]])]);
    let summary = fx.path("totals.xlsx");

    let output = fx.compare(
        &initial,
        &updated,
        &["--header-row", "1", "-o", fx.path("d.xlsx").to_str().unwrap(), "--summary", summary.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let range = read_sheet(&summary, "Data Summary");
    assert_eq!(at(&range, 0, 0), Data::String("Column".into()));
    assert_eq!(at(&range, 1, 0), Data::String("Sales".into()));
    assert_eq!(at(&range, 1, 1), Data::String("1,234.50".into()));
    assert_eq!(at(&range, 1, 2), Data::String("2,000.25".into()));
}

#[test]
fn summary_flag_without_path_uses_default_name() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "--client", "Acme", "--summary"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(fx.path("Acme Differences.xlsx").is_file());
    assert!(fx.path("Acme Summary.xlsx").is_file());
}

#[test]
fn fewer_updated_rows_are_annotated() {
    let fx = Fixture::new();
    let initial = fx.workbook("initial.xlsx", 1, &[("Data", vec![vec![S("A")], vec![N(1.0)], vec![N(2.0)]])]);
    let updated = fx.workbook("updated.xlsx", 1, &[("Data", vec![vec![S("A")], vec![N(1.0)]])]);
    let out = fx.path("diff.xlsx");

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "-o", out.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let range = read_sheet(&out, "Data");
    assert_eq!(at(&range, 0, 1), Data::String("Comments".into()));
    assert_eq!(at(&range, 2, 1), Data::String("This row was present in R1".into()));
}

#[test]
fn missing_sheet_is_input_shape_error() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "--sheet", "Nope"]);
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("Nope"), "stderr: {err}");
    assert!(err.contains("celldelta sheets"), "stderr: {err}");
}

#[test]
fn header_row_past_end_is_input_shape_error() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);

    let output = fx.compare(&initial, &updated, &["--header-row", "50"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn partial_failure_still_writes_good_sheets() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);
    let out = fx.path("diff.xlsx");

    let output = fx.compare(
        &initial,
        &updated,
        &["--header-row", "1", "--sheet", "Data", "--sheet", "Ghost", "-o", out.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Ghost"));

    let range = read_sheet(&out, "Data");
    assert_eq!(at(&range, 1, 0), Data::Float(15.0));
}

#[test]
fn numeric_column_missing_from_updated_is_summary_error() {
    let fx = Fixture::new();
    let initial = fx.workbook("initial.xlsx", 1, &[("Data", vec![vec![S("Name"), S("Sales")], vec![S("a"), N(1.0)]])]);
    let updated = fx.workbook("updated.xlsx", 1, &[("Data", vec![vec![S("Name")], vec![S("a")]])]);

    let output = fx.compare(&initial, &updated, &["--header-row", "1"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("Sales"));
}

#[test]
fn missing_input_is_usage_error() {
    let fx = Fixture::new();
    let (initial, _) = basic_pair(&fx, 1);

    let output = fx.compare(&initial, &fx.path("nope.xlsx"), &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("nope.xlsx"));
}

#[test]
fn invalid_settings_file_is_config_error() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);
    std::fs::write(fx.path("settings.toml"), "[highlight]\nchanged = \"pink\"\n").unwrap();

    let output = fx.compare(&initial, &updated, &["--header-row", "1"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("pink"));
}

#[test]
fn compare_json_report() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);
    let out = fx.path("diff.xlsx");

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "--json", "-o", out.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(stdout(&output).trim()).expect("stdout is one JSON value");
    assert_eq!(report["changed_cells"], serde_json::json!(2));
    let sheets = report["sheets"].as_array().unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0]["sheet"], "Data");
    assert_eq!(sheets[0]["percent_columns"], serde_json::json!(["A_% Change"]));
    assert_eq!(sheets[0]["summary"][0]["column"], "A");
    assert_eq!(sheets[0]["summary"][0]["initial_total"], serde_json::json!(30.0));
    assert_eq!(sheets[0]["summary"][0]["updated_total"], serde_json::json!(35.0));
    assert!(report["failures"].as_array().unwrap().is_empty());
}

#[test]
fn quiet_suppresses_status_lines() {
    let fx = Fixture::new();
    let (initial, updated) = basic_pair(&fx, 1);

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "-q", "-o", fx.path("d.xlsx").to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stderr(&output).is_empty(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn compares_csv_inputs() {
    let fx = Fixture::new();
    let initial = fx.path("initial.csv");
    let updated = fx.path("updated.csv");
    std::fs::write(&initial, "A,B\n10,x\n20,y\n").unwrap();
    std::fs::write(&updated, "A,B\n15,x\n20,z\n").unwrap();
    let out = fx.path("diff.xlsx");

    let output = fx.compare(&initial, &updated, &["--header-row", "1", "-o", out.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let range = read_sheet(&out, "initial");
    assert_eq!(at(&range, 1, 3), Data::Float(50.0));
}

#[test]
fn long_csv_names_fit_excel_sheet_limit() {
    let fx = Fixture::new();
    let initial = fx.path("quarterly_forecast_export_2024_initial.csv");
    let updated = fx.path("quarterly_forecast_export_2024_updated.csv");
    std::fs::write(&initial, "A,B\n10,x\n").unwrap();
    std::fs::write(&updated, "A,B\n15,x\n").unwrap();
    let out = fx.path("diff.xlsx");
    let summary = fx.path("totals.xlsx");

    let output = fx.compare(
        &initial,
        &updated,
        &["--header-row", "1", "-o", out.to_str().unwrap(), "--summary", summary.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let range = read_sheet(&out, "quarterly_forecast_export_2024_");
    assert_eq!(at(&range, 0, 3), Data::String("A_% Change".into()));
    assert_eq!(at(&range, 1, 3), Data::Float(50.0));

    let summary_sheets = open_workbook_auto(&summary).unwrap().sheet_names().to_vec();
    assert_eq!(summary_sheets, vec!["quarterly_forecast_expo Summary"]);
}

// ===========================================================================
// sheets
// ===========================================================================

#[test]
fn sheets_lists_in_order() {
    let fx = Fixture::new();
    let path = fx.workbook(
        "multi.xlsx",
        1,
        &[("Q1", vec![vec![S("A")]]), ("Q2", vec![vec![S("A")]]), ("Notes", vec![vec![S("x")]])],
    );

    let output = fx.celldelta().arg("sheets").arg(&path).output().unwrap();
    assert!(output.status.success());
    let lines: Vec<String> = stdout(&output).lines().map(|l| l.trim().to_string()).collect();
    assert_eq!(lines, vec!["1  Q1", "2  Q2", "3  Notes"]);
}

#[test]
fn sheets_json() {
    let fx = Fixture::new();
    let path = fx.workbook("multi.xlsx", 1, &[("Q1", vec![vec![S("A")]]), ("Q2", vec![vec![S("A")]])]);

    let output = fx.celldelta().args(["sheets", "--json"]).arg(&path).output().unwrap();
    assert!(output.status.success());
    let val: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(
        val,
        serde_json::json!([{ "index": 1, "name": "Q1" }, { "index": 2, "name": "Q2" }])
    );
}
