use crate::model::{NormalizedTable, Row, TableFragment, cell_to_text};
use crate::options::Thresholds;
use crate::warning::{ConvertWarning, WarningCode};

/// Right-pads every row to `width`. Never truncates.
pub(crate) fn pad_rows(rows: &[Row], width: usize) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let mut padded = row
                .iter()
                .map(|cell| cell_to_text(Some(cell)))
                .collect::<Vec<_>>();
            if padded.len() < width {
                padded.resize(width, String::new());
            }
            padded
        })
        .collect()
}

/// Concatenates fragments in order when there are several and they all share
/// one column count of at least `min_columns`.
pub(crate) fn merge_same_width(
    fragments: &[TableFragment],
    min_columns: usize,
) -> Option<TableFragment> {
    let first = fragments.first()?;
    let width = first.column_count();
    if fragments.len() < 2
        || width < min_columns
        || fragments.iter().any(|fragment| fragment.column_count() != width)
    {
        return None;
    }

    Some(TableFragment {
        page: first.page,
        sequence: first.sequence,
        source: first.source,
        rows: fragments
            .iter()
            .flat_map(|fragment| fragment.rows.iter().cloned())
            .collect(),
    })
}

/// Turns the fragments of one page into sheet-ready tables.
pub fn normalize_page(
    fragments: Vec<TableFragment>,
    thresholds: &Thresholds,
    warnings: &mut Vec<ConvertWarning>,
) -> Vec<NormalizedTable> {
    let mut fragments = fragments
        .into_iter()
        .filter(|fragment| !fragment.rows.is_empty())
        .map(|fragment| {
            let width = fragment.column_count();
            TableFragment {
                rows: pad_rows(&fragment.rows, width),
                ..fragment
            }
        })
        .collect::<Vec<_>>();

    if fragments.len() > 1
        && let Some(merged) = merge_same_width(&fragments, thresholds.merge_min_columns)
    {
        tracing::debug!(
            page = merged.page,
            fragments = fragments.len(),
            rows = merged.row_count(),
            "merged same-width fragments"
        );
        warnings.push(
            ConvertWarning::new(
                WarningCode::FragmentsMerged,
                format!(
                    "{} fragments with {} columns merged into one table",
                    fragments.len(),
                    merged.column_count()
                ),
            )
            .with_page(merged.page),
        );
        fragments = vec![merged];
    }

    let mut tables = Vec::new();
    for fragment in fragments {
        if fragment.row_count() < thresholds.min_table_rows {
            tracing::debug!(
                page = fragment.page,
                sequence = fragment.sequence,
                rows = fragment.row_count(),
                "discarded fragment without data rows"
            );
            warnings.push(
                ConvertWarning::new(
                    WarningCode::FragmentDiscarded,
                    format!(
                        "fragment with {} row(s) has no data below its header",
                        fragment.row_count()
                    ),
                )
                .with_page(fragment.page)
                .with_table_number(fragment.sequence),
            );
            continue;
        }

        tables.push(NormalizedTable {
            page: fragment.page,
            table_number: tables.len() + 1,
            source: fragment.source,
            rows: fragment.rows,
        });
    }
    tables
}
