use serde::Serialize;

pub type Row = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Which extraction path produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    Lines,
    LinesStrict,
    Text,
    TextPattern,
    FallbackText,
}

impl TableSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lines => "lines",
            Self::LinesStrict => "lines_strict",
            Self::Text => "text",
            Self::TextPattern => "text_pattern",
            Self::FallbackText => "fallback_text",
        }
    }
}

/// Raw matrix produced by one extraction attempt on one page. Rows may be ragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFragment {
    pub page: u32,
    pub sequence: usize,
    pub source: TableSource,
    pub rows: Vec<Row>,
}

impl TableFragment {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// A padded fragment destined for exactly one sheet. The first row is the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedTable {
    pub page: u32,
    pub table_number: usize,
    pub source: TableSource,
    pub rows: Vec<Row>,
}

impl NormalizedTable {
    #[must_use]
    pub fn header(&self) -> &[String] {
        self.rows.first().map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or_default()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Coerces a cell of any origin into trimmed text; missing cells become empty.
#[must_use]
pub fn cell_to_text(cell: Option<&str>) -> String {
    cell.map(str::trim).unwrap_or_default().to_string()
}
