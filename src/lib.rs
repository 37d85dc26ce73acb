mod error;
mod lattice;
mod layout;
mod merge;
mod model;
mod options;
mod pdf_reader;
mod stream;
mod table_detect;
mod table_parse;
mod warning;
mod workbook;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use lopdf::Document;
use serde::Serialize;

use crate::layout::read_page_layout;
use crate::pdf_reader::{library_page_texts, library_text, load_document, read_pdf_pages};
use crate::table_detect::extract_page_tables;
use crate::workbook::write_workbook;

pub use error::ConvertError;
pub use merge::normalize_page;
pub use model::{NormalizedTable, PageText, Row, TableFragment, TableSource, cell_to_text};
pub use options::{
    ConvertOptions, DEFAULT_HEADER_FILL, FALLBACK_ROW_THRESHOLD, MERGE_MIN_COLUMNS,
    MIN_TABLE_ROWS, PageSelection, STRICT_RETRY_ROW_THRESHOLD, TEXT_RETRY_ROW_THRESHOLD,
    Thresholds,
};
pub use table_parse::{DOMAIN_HEADERS, parse_text_table};
pub use warning::{ConvertWarning, WarningCode};
pub use workbook::{build_workbook, column_widths, sheet_names};

/// Which stage produced the tables of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Geometric,
    FallbackLibrary,
}

impl ExtractionMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geometric => "geometric",
            Self::FallbackLibrary => "fallback_library",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub page: u32,
    pub table_number: usize,
    pub source: TableSource,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub table_count: usize,
    /// Data rows across all sheets; header rows are not counted.
    pub row_count: usize,
    pub method: ExtractionMethod,
    pub sheets: Vec<SheetSummary>,
    pub warnings: Vec<ConvertWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTables {
    pub method: ExtractionMethod,
    pub tables: Vec<NormalizedTable>,
    pub warnings: Vec<ConvertWarning>,
}

/// Terminal value of one conversion call. Never a partial result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionResult {
    Success {
        output: PathBuf,
        report: ConversionReport,
    },
    Failure {
        code: String,
        message: String,
    },
}

impl ConversionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    fn failure(error: &ConvertError) -> Self {
        tracing::warn!(code = error.code(), %error, "conversion failed");
        Self::Failure {
            code: error.code().to_string(),
            message: error.diagnostic(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unexpected panic".to_string())
}

fn extract_geometric(
    document: &Document,
    library_text: Option<&str>,
    options: &ConvertOptions,
    warnings: &mut Vec<ConvertWarning>,
) -> Result<Vec<NormalizedTable>, ConvertError> {
    let pages = read_pdf_pages(document, library_text, options)?;

    let mut tables = Vec::new();
    for page in &pages {
        let layout = panic::catch_unwind(AssertUnwindSafe(|| {
            read_page_layout(document, page.page_number, page.object_id)
        }))
        .unwrap_or_else(|payload| {
            Err(ConvertError::PdfLayout {
                page: page.page_number,
                reason: panic_message(payload.as_ref()),
            })
        });

        let layout = match layout {
            Ok(layout) => Some(layout),
            Err(error) => {
                tracing::warn!(page = page.page_number, %error, "page geometry unavailable");
                warnings.push(
                    ConvertWarning::new(WarningCode::PageExtractionFailed, error.to_string())
                        .with_page(page.page_number),
                );
                None
            }
        };

        let fragments = extract_page_tables(
            page.page_number,
            layout.as_ref(),
            &page.text,
            &options.thresholds,
            warnings,
        );
        tables.extend(normalize_page(fragments, &options.thresholds, warnings));
    }

    Ok(tables)
}

fn extract_fallback(
    library_text: Option<&str>,
    options: &ConvertOptions,
    warnings: &mut Vec<ConvertWarning>,
) -> Vec<NormalizedTable> {
    let Some(text) = library_text else {
        return Vec::new();
    };

    let mut tables = Vec::new();
    for page in library_page_texts(text, options) {
        let Some(rows) = parse_text_table(&page.text) else {
            continue;
        };
        let fragment = TableFragment {
            page: page.page_number,
            sequence: 1,
            source: TableSource::FallbackText,
            rows,
        };
        tables.extend(normalize_page(vec![fragment], &options.thresholds, warnings));
    }
    tables
}

/// Normalized tables of a PDF without building a workbook.
///
/// The geometric stage runs first; only when it yields nothing (or the
/// document cannot be read) is the whole-document text of the fallback
/// library parsed page by page.
pub fn extract_tables_from_pdf_bytes(
    input_pdf: &[u8],
    options: &ConvertOptions,
) -> Result<ExtractedTables, ConvertError> {
    options.validate()?;

    let library_text = library_text(input_pdf);
    let mut warnings = Vec::new();

    let geometric = load_document(input_pdf).and_then(|document| {
        extract_geometric(&document, library_text.as_deref(), options, &mut warnings)
    });
    finish_extraction(geometric, library_text.as_deref(), options, warnings)
}

/// Keeps the geometric tables when there are any, otherwise runs the
/// fallback-library stage over the whole-document text.
fn finish_extraction(
    geometric: Result<Vec<NormalizedTable>, ConvertError>,
    library_text: Option<&str>,
    options: &ConvertOptions,
    mut warnings: Vec<ConvertWarning>,
) -> Result<ExtractedTables, ConvertError> {
    let geometric_error = match geometric {
        Ok(tables) if !tables.is_empty() => {
            return Ok(ExtractedTables {
                method: ExtractionMethod::Geometric,
                tables,
                warnings,
            });
        }
        Ok(_) => None,
        Err(error) => {
            tracing::debug!(%error, "geometric stage failed");
            Some(error)
        }
    };

    let tables = extract_fallback(library_text, options, &mut warnings);
    if tables.is_empty() {
        return Err(geometric_error.unwrap_or(ConvertError::NoTablesFound));
    }

    tracing::warn!(
        tables = tables.len(),
        "tables recovered from fallback library text"
    );
    warnings.push(ConvertWarning::new(
        WarningCode::FallbackLibraryUsed,
        "geometric extraction found no tables; used whole-document text instead",
    ));
    Ok(ExtractedTables {
        method: ExtractionMethod::FallbackLibrary,
        tables,
        warnings,
    })
}

fn build_report(extracted: ExtractedTables) -> ConversionReport {
    let sheets = sheet_names(&extracted.tables)
        .into_iter()
        .zip(&extracted.tables)
        .map(|(name, table)| SheetSummary {
            name,
            page: table.page,
            table_number: table.table_number,
            source: table.source,
            rows: table.rows.len(),
            columns: table.column_count(),
        })
        .collect();

    ConversionReport {
        table_count: extracted.tables.len(),
        row_count: extracted
            .tables
            .iter()
            .map(|table| table.data_rows().len())
            .sum(),
        method: extracted.method,
        sheets,
        warnings: extracted.warnings,
    }
}

fn run_conversion(
    input_pdf: &[u8],
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    let extracted = extract_tables_from_pdf_bytes(input_pdf, options)?;
    let book = build_workbook(&extracted.tables, &options.header_fill)?;
    write_workbook(&book, output)?;
    Ok(build_report(extracted))
}

/// Converts PDF bytes into an XLSX file at `output`.
///
/// Every error and panic is turned into [`ConversionResult::Failure`]; on
/// failure nothing is left at `output`.
pub fn convert_pdf_bytes_to_xlsx(
    input_pdf: &[u8],
    output: &Path,
    options: &ConvertOptions,
) -> ConversionResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_conversion(input_pdf, output, options)
    }))
    .unwrap_or_else(|payload| Err(ConvertError::Internal(panic_message(payload.as_ref()))));

    match outcome {
        Ok(report) => {
            tracing::info!(
                tables = report.table_count,
                rows = report.row_count,
                method = report.method.as_str(),
                output = %output.display(),
                "conversion finished"
            );
            ConversionResult::Success {
                output: output.to_path_buf(),
                report,
            }
        }
        Err(error) => ConversionResult::failure(&error),
    }
}

pub fn convert_pdf_to_xlsx(
    input_pdf: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> ConversionResult {
    match std::fs::read(input_pdf) {
        Ok(bytes) => convert_pdf_bytes_to_xlsx(&bytes, output, options),
        Err(error) => ConversionResult::failure(&ConvertError::Io(error)),
    }
}
