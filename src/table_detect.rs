use crate::lattice::{LatticeSettings, find_ruled_tables};
use crate::layout::{PageLayout, Word};
use crate::merge::merge_same_width;
use crate::model::{Row, TableFragment, TableSource};
use crate::options::Thresholds;
use crate::stream::find_aligned_tables;
use crate::table_parse::parse_text_table;
use crate::warning::{ConvertWarning, WarningCode};

/// Fragments found by one strategy on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StrategyOutcome {
    pub source: TableSource,
    pub fragments: Vec<TableFragment>,
}

impl StrategyOutcome {
    fn new(page: u32, source: TableSource, tables: Vec<Vec<Row>>) -> Self {
        let fragments = tables
            .into_iter()
            .enumerate()
            .map(|(index, rows)| TableFragment {
                page,
                sequence: index + 1,
                source,
                rows,
            })
            .collect();
        Self { source, fragments }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.fragments.iter().map(TableFragment::row_count).sum()
    }

    fn best_fragment_rows(&self) -> usize {
        self.fragments
            .iter()
            .map(TableFragment::row_count)
            .max()
            .unwrap_or(0)
    }
}

/// The candidate replaces the current outcome only with strictly more rows.
fn prefer(current: StrategyOutcome, candidate: StrategyOutcome) -> StrategyOutcome {
    if candidate.row_count() > current.row_count() {
        candidate
    } else {
        current
    }
}

fn run_strategy(
    layout: &PageLayout,
    source: TableSource,
    detect: impl FnOnce() -> Vec<Vec<Row>>,
) -> StrategyOutcome {
    let outcome = StrategyOutcome::new(layout.page_number, source, detect());
    tracing::debug!(
        page = layout.page_number,
        strategy = source.as_str(),
        rows = outcome.row_count(),
        fragments = outcome.fragments.len(),
        "table strategy finished"
    );
    outcome
}

pub(crate) fn lines_strategy(layout: &PageLayout, words: &[Word]) -> StrategyOutcome {
    run_strategy(layout, TableSource::Lines, || {
        find_ruled_tables(layout, words, &LatticeSettings::LINES)
    })
}

pub(crate) fn strict_lines_strategy(layout: &PageLayout, words: &[Word]) -> StrategyOutcome {
    run_strategy(layout, TableSource::LinesStrict, || {
        find_ruled_tables(layout, words, &LatticeSettings::STRICT)
    })
}

pub(crate) fn text_strategy(layout: &PageLayout, words: &[Word]) -> StrategyOutcome {
    run_strategy(layout, TableSource::Text, || find_aligned_tables(words))
}

fn geometric_outcome(
    layout: &PageLayout,
    thresholds: &Thresholds,
    warnings: &mut Vec<ConvertWarning>,
) -> StrategyOutcome {
    let words = layout.words();

    let mut best = lines_strategy(layout, &words);
    if best.row_count() < thresholds.strict_retry_rows {
        best = prefer(best, strict_lines_strategy(layout, &words));
    }
    if best.row_count() < thresholds.text_retry_rows {
        best = prefer(best, text_strategy(layout, &words));
    }

    if best.fragments.len() > 1
        && let Some(merged) = merge_same_width(&best.fragments, thresholds.merge_min_columns)
    {
        warnings.push(
            ConvertWarning::new(
                WarningCode::FragmentsMerged,
                format!(
                    "{} {} fragments share {} columns and were merged",
                    best.fragments.len(),
                    best.source.as_str(),
                    merged.column_count()
                ),
            )
            .with_page(layout.page_number),
        );
        best.fragments = vec![merged];
    }

    best
}

/// Table fragments for one page.
///
/// `layout` is `None` when the page geometry could not be read; the page
/// text is still given to the text-pattern parser in that case.
pub(crate) fn extract_page_tables(
    page_number: u32,
    layout: Option<&PageLayout>,
    page_text: &str,
    thresholds: &Thresholds,
    warnings: &mut Vec<ConvertWarning>,
) -> Vec<TableFragment> {
    let geometric = match layout {
        Some(layout) => geometric_outcome(layout, thresholds, warnings),
        None => StrategyOutcome {
            source: TableSource::Lines,
            fragments: Vec::new(),
        },
    };

    if geometric.fragments.is_empty() || geometric.best_fragment_rows() < thresholds.fallback_rows
    {
        if let Some(rows) = parse_text_table(page_text)
            && rows.len() > geometric.row_count()
        {
            tracing::debug!(
                page = page_number,
                rows = rows.len(),
                geometric_rows = geometric.row_count(),
                "text pattern parser replaced geometric result"
            );
            warnings.push(
                ConvertWarning::new(
                    WarningCode::TextPatternFallback,
                    format!(
                        "page text parsed into {} rows; geometric strategies found {}",
                        rows.len(),
                        geometric.row_count()
                    ),
                )
                .with_page(page_number),
            );
            return vec![TableFragment {
                page: page_number,
                sequence: 1,
                source: TableSource::TextPattern,
                rows,
            }];
        }
    }

    geometric.fragments
}
