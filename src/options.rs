use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ConvertError;

/// Below this many rows on a page the ruled-line search is repeated in strict mode.
pub const STRICT_RETRY_ROW_THRESHOLD: usize = 5;
/// Below this many rows on a page the text-alignment strategy is tried.
pub const TEXT_RETRY_ROW_THRESHOLD: usize = 3;
/// Fragments on one page are merged only when they all share at least this many columns.
pub const MERGE_MIN_COLUMNS: usize = 5;
/// When the best geometric fragment has fewer rows, the page text is parsed instead.
pub const FALLBACK_ROW_THRESHOLD: usize = 3;
/// A header row plus one data row.
pub const MIN_TABLE_ROWS: usize = 2;

pub const DEFAULT_HEADER_FILL: &str = "FFCCCCCC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(selection: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

/// Row and column counts that steer the extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub strict_retry_rows: usize,
    pub text_retry_rows: usize,
    pub merge_min_columns: usize,
    pub fallback_rows: usize,
    pub min_table_rows: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            strict_retry_rows: STRICT_RETRY_ROW_THRESHOLD,
            text_retry_rows: TEXT_RETRY_ROW_THRESHOLD,
            merge_min_columns: MERGE_MIN_COLUMNS,
            fallback_rows: FALLBACK_ROW_THRESHOLD,
            min_table_rows: MIN_TABLE_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub pages: Option<PageSelection>,
    pub thresholds: Thresholds,
    pub header_fill: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            pages: None,
            thresholds: Thresholds::default(),
            header_fill: DEFAULT_HEADER_FILL.to_string(),
        }
    }
}

impl ConvertOptions {
    pub(crate) fn validate(&self) -> Result<(), ConvertError> {
        if self.thresholds.merge_min_columns < 2 {
            return Err(ConvertError::InvalidOption(
                "merge_min_columns must be at least 2".to_string(),
            ));
        }
        if self.thresholds.min_table_rows == 0 {
            return Err(ConvertError::InvalidOption(
                "min_table_rows must be at least 1".to_string(),
            ));
        }
        if self.header_fill.len() != 8 || !self.header_fill.chars().all(|ch| ch.is_ascii_hexdigit())
        {
            return Err(ConvertError::InvalidOption(format!(
                "header_fill must be an 8-digit ARGB hex color, got '{}'",
                self.header_fill
            )));
        }
        if self.pages.as_ref().is_some_and(PageSelection::is_empty) {
            return Err(ConvertError::InvalidPageSelection(
                "page selection cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn includes_page(&self, page: u32) -> bool {
        self.pages
            .as_ref()
            .is_none_or(|selection| selection.contains(page))
    }
}
