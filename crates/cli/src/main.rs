// celldelta - compare two snapshots of a workbook, sheet by sheet

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use celldelta_cli::compare::{self, CompareRequest};
use celldelta_cli::report;
use celldelta_config::{ConfigError, Settings};
use celldelta_io::{HighlightStyle, InputShapeError, IoError};

use exit_codes::{
    compare_exit_code, io_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "celldelta")]
#[command(about = "Compare two snapshots of a workbook and export the differences")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    #[command(after_help = "\
Examples:
  celldelta sheets forecast.xlsx
  celldelta sheets forecast.xlsx --json")]
    Sheets {
        /// Workbook (xlsx, xlsm, xls, xlsb, ods) or delimited file
        workbook: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare an initial and an updated workbook
    #[command(after_help = "\
Examples:
  celldelta compare initial.xlsx updated.xlsx
  celldelta compare initial.xlsx updated.xlsx --sheet Q1 --sheet Q2
  celldelta compare initial.xlsx updated.xlsx --client Acme --market EU --type Forecast
  celldelta compare initial.xlsx updated.xlsx --header-row 1 -o diff.xlsx --summary

Exit codes:
  0  Every sheet compared
  1  Some sheets failed
  2  Usage error
  3  Sheet missing or header row out of range
  4  Numeric column missing from the updated workbook
  5  Output could not be written
  6  Invalid settings file")]
    Compare(CompareArgs),

    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
struct CompareArgs {
    /// Earlier snapshot (R1)
    initial: PathBuf,

    /// Later snapshot
    updated: PathBuf,

    /// Sheet to compare; repeatable. Default: every sheet of the initial workbook.
    #[arg(long, short = 's', value_name = "NAME")]
    sheet: Vec<String>,

    /// 1-indexed row holding the column headers
    #[arg(long, value_name = "N")]
    header_row: Option<usize>,

    /// Diff workbook path. Default: next to the initial workbook.
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Client label used in the default output name
    #[arg(long, value_name = "NAME")]
    client: Option<String>,

    /// Market label used in the default output name
    #[arg(long, value_name = "NAME")]
    market: Option<String>,

    /// Report type label used in the default output name
    #[arg(long = "type", value_name = "NAME")]
    report_type: Option<String>,

    /// Also write the column totals workbook (default name when PATH is omitted)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    summary: Option<Option<PathBuf>>,

    /// Do not print the summary tables
    #[arg(long)]
    no_summary_print: bool,

    /// Print the run report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Settings file. Default: <config dir>/celldelta/settings.toml
    #[arg(long, value_name = "PATH", env = "CELLDELTA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the settings file location
    Path,
    /// Write a settings file with the defaults (existing file is kept)
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Sheets { workbook, json } => cmd_sheets(&workbook, json),
        Commands::Compare(args) => cmd_compare(args, cli.quiet),
        Commands::Config { command } => match command {
            ConfigCommands::Path => cmd_config_path(),
            ConfigCommands::Init => cmd_config_init(cli.quiet),
        },
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Parse(_) | ConfigError::Validation(_) => {
                Some(format!("check {} or run `celldelta config init`", Settings::config_path().display()))
            }
            ConfigError::Read { .. } => None,
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = match &err {
            IoError::Shape(InputShapeError::HeaderRowOutOfRange { .. }) => {
                Some("pass --header-row with the row that holds the column names".to_string())
            }
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}

// ============================================================================
// sheets
// ============================================================================

fn cmd_sheets(workbook: &Path, json: bool) -> Result<u8, CliError> {
    require_file(workbook)?;
    let names = celldelta_io::sheet_names(workbook)?;

    if json {
        let entries: Vec<serde_json::Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| serde_json::json!({ "index": i + 1, "name": name }))
            .collect();
        print_json(&serde_json::Value::Array(entries))?;
    } else {
        let width = names.len().to_string().len();
        for (i, name) in names.iter().enumerate() {
            println!("{:>width$}  {}", i + 1, name);
        }
    }
    Ok(EXIT_SUCCESS)
}

// ============================================================================
// compare
// ============================================================================

fn cmd_compare(args: CompareArgs, quiet: bool) -> Result<u8, CliError> {
    require_file(&args.initial)?;
    require_file(&args.updated)?;

    let settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let header_row = args.header_row.unwrap_or(settings.header_row);
    if header_row == 0 {
        return Err(CliError::usage("--header-row is 1-indexed and must be at least 1"));
    }

    let style = HighlightStyle {
        changed: settings.changed_color()?.0,
        synthetic_header: settings.synthetic_header_color()?.0,
    };

    let labels: Vec<&str> = [&args.client, &args.market, &args.report_type]
        .into_iter()
        .filter_map(|l| l.as_deref())
        .collect();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| compare::default_output_path(&args.initial, &labels, &settings.output.suffix));
    let summary_output = args.summary.clone().map(|path| {
        path.unwrap_or_else(|| compare::default_output_path(&args.initial, &labels, &settings.output.summary_suffix))
    });

    if summary_output.as_ref() == Some(&output) {
        return Err(CliError::usage(format!(
            "diff and summary would both be written to {}",
            output.display()
        ))
        .with_hint("pass a different --output or --summary path"));
    }

    let request = CompareRequest {
        initial: args.initial.clone(),
        updated: args.updated.clone(),
        sheets: args.sheet.clone(),
        header_row,
        output,
        summary_output,
        style,
    };

    let report = compare::run(&request).map_err(|err| {
        let code = compare_exit_code(&err);
        let hint = match &err {
            compare::CompareError::NoSheets(_) => Some(format!(
                "run `celldelta sheets {}` to list the available sheets",
                args.initial.display()
            )),
            _ => None,
        };
        CliError { code, message: err.to_string(), hint }
    })?;

    if args.json {
        print_json(&report::report_json(&report))?;
    } else if !args.no_summary_print && settings.output.print_summary && !quiet {
        for sheet in &report.sheets {
            println!("{}", sheet.sheet);
            print!("{}", report::render_summary(&sheet.summary));
            println!();
        }
    }

    for failure in &report.failures {
        eprintln!("error: {}", failure);
    }

    if !quiet {
        eprintln!(
            "Wrote {} ({} sheet{}, {} changed cell{})",
            report.output.display(),
            report.sheets.len(),
            if report.sheets.len() == 1 { "" } else { "s" },
            report.changed_cells(),
            if report.changed_cells() == 1 { "" } else { "s" },
        );
        if let Some(ref path) = report.summary_output {
            eprintln!("Wrote {}", path.display());
        }
    }

    if report.failures.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_ERROR)
    }
}

// ============================================================================
// config
// ============================================================================

fn cmd_config_path() -> Result<u8, CliError> {
    println!("{}", Settings::config_path().display());
    Ok(EXIT_SUCCESS)
}

fn cmd_config_init(quiet: bool) -> Result<u8, CliError> {
    let existed = Settings::config_path().exists();
    let path = Settings::create_default_file()?;
    if !quiet {
        if existed {
            eprintln!("Settings already exist at {}", path.display());
        } else {
            eprintln!("Created {}", path.display());
        }
    }
    Ok(EXIT_SUCCESS)
}

// ============================================================================
// helpers
// ============================================================================

fn require_file(path: &Path) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::usage(format!("file not found: {}", path.display())))
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError { code: EXIT_ERROR, message: format!("JSON encoding failed: {e}"), hint: None })?;
    println!("{}", text);
    Ok(())
}
