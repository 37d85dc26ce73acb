use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    PageExtractionFailed,
    TextPatternFallback,
    FragmentsMerged,
    FragmentDiscarded,
    FallbackLibraryUsed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<usize>,
}

impl ConvertWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            table_number: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_table_number(mut self, table_number: usize) -> Self {
        self.table_number = Some(table_number);
        self
    }
}
