use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to read layout of page {page}: {reason}")]
    PdfLayout { page: u32, reason: String },

    #[error("failed to write workbook: {0}")]
    Workbook(String),

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,

    #[error("No tables found in the PDF. Make sure the PDF contains tabular data.")]
    NoTablesFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io_error",
            Self::PdfLoad(_) | Self::NoPagesSelected => "invalid_pdf",
            Self::PdfLayout { .. } => "page_layout",
            Self::Workbook(_) => "write_failed",
            Self::InvalidPageSelection(_) | Self::InvalidOption(_) => "invalid_option",
            Self::NoTablesFound => "no_tables",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message handed back to the caller of a failed conversion.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::NoTablesFound => self.to_string(),
            other => format!("failed to convert PDF: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConvertError;

    #[test]
    fn no_tables_diagnostic_is_the_fixed_message() {
        let error = ConvertError::NoTablesFound;
        assert_eq!(error.code(), "no_tables");
        assert_eq!(
            error.diagnostic(),
            "No tables found in the PDF. Make sure the PDF contains tabular data."
        );
    }

    #[test]
    fn write_failures_carry_the_cause() {
        let error = ConvertError::Workbook("disk full".to_string());
        assert_eq!(error.code(), "write_failed");
        assert_eq!(
            error.diagnostic(),
            "failed to convert PDF: failed to write workbook: disk full"
        );
    }
}
