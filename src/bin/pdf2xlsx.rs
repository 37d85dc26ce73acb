use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use pdf_tables_xlsx::{
    ConversionReport, ConversionResult, ConvertOptions, DEFAULT_HEADER_FILL,
    FALLBACK_ROW_THRESHOLD, MERGE_MIN_COLUMNS, MIN_TABLE_ROWS, PageSelection,
    STRICT_RETRY_ROW_THRESHOLD, TEXT_RETRY_ROW_THRESHOLD, Thresholds, convert_pdf_to_xlsx,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2xlsx",
    version,
    about = "Extract tables from text PDFs into an XLSX workbook"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract tables and write one sheet per table.
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output XLSX path.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Retry ruled-line detection in strict mode below this many rows per page.
    #[arg(long, default_value_t = STRICT_RETRY_ROW_THRESHOLD)]
    strict_retry_rows: usize,

    /// Try text-alignment detection below this many rows per page.
    #[arg(long, default_value_t = TEXT_RETRY_ROW_THRESHOLD)]
    text_retry_rows: usize,

    /// Minimum shared column count for merging fragments of one page.
    #[arg(long = "merge-min-cols", default_value_t = MERGE_MIN_COLUMNS)]
    merge_min_columns: usize,

    /// Parse the page text when the best geometric table has fewer rows.
    #[arg(long, default_value_t = FALLBACK_ROW_THRESHOLD)]
    fallback_rows: usize,

    /// Minimum rows (header included) for a table to get a sheet.
    #[arg(long, default_value_t = MIN_TABLE_ROWS)]
    min_table_rows: usize,

    /// ARGB fill of the header row.
    #[arg(long, default_value = DEFAULT_HEADER_FILL)]
    header_fill: String,

    /// Print the result as a JSON envelope on stdout.
    #[arg(long)]
    json: bool,

    /// Enable debug logging and list every warning.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    success: bool,
    message: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ConversionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'a str>,
}

impl<'a> Envelope<'a> {
    fn from_result(result: &'a ConversionResult) -> Self {
        let timestamp = Utc::now().to_rfc3339();
        match result {
            ConversionResult::Success { output, report } => Self {
                success: true,
                message: format!(
                    "Successfully converted PDF to Excel. Found {} table(s).",
                    report.table_count
                ),
                timestamp,
                output: Some(output.as_path()),
                report: Some(report),
                error_code: None,
            },
            ConversionResult::Failure { code, message } => Self {
                success: false,
                message: message.clone(),
                timestamp,
                output: None,
                report: None,
                error_code: Some(code.as_str()),
            },
        }
    }
}

fn parse_options(args: &ConvertArgs) -> Result<ConvertOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    Ok(ConvertOptions {
        pages,
        thresholds: Thresholds {
            strict_retry_rows: args.strict_retry_rows,
            text_retry_rows: args.text_retry_rows,
            merge_min_columns: args.merge_min_columns,
            fallback_rows: args.fallback_rows,
            min_table_rows: args.min_table_rows,
        },
        header_fill: args.header_fill.to_ascii_uppercase(),
    })
}

fn log_report(report: &ConversionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} table={:?}: {}",
                warning.code, warning.page, warning.table_number, warning.message
            );
        }
    }
}

fn exit_code(result: &ConversionResult) -> ExitCode {
    match result {
        ConversionResult::Success { .. } => ExitCode::SUCCESS,
        ConversionResult::Failure { code, .. } if code == "no_tables" => ExitCode::from(2),
        ConversionResult::Failure { .. } => ExitCode::from(1),
    }
}

fn run_convert(args: &ConvertArgs) -> Result<ExitCode> {
    let options = parse_options(args)?;
    let result = convert_pdf_to_xlsx(&args.input, &args.output, &options);

    if args.json {
        let envelope = Envelope::from_result(&result);
        println!(
            "{}",
            serde_json::to_string_pretty(&envelope).context("failed to encode JSON result")?
        );
    } else {
        match &result {
            ConversionResult::Success { output, report } => {
                log_report(report, args.verbose);
                eprintln!(
                    "wrote {} table(s), {} row(s) to '{}'",
                    report.table_count,
                    report.row_count,
                    output.display()
                );
            }
            ConversionResult::Failure { message, .. } => {
                eprintln!("error: {message}");
            }
        }
    }

    Ok(exit_code(&result))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Convert(args) = cli.command;

    let default_level = if args.verbose {
        "pdf_tables_xlsx=debug"
    } else {
        "pdf_tables_xlsx=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run_convert(&args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
