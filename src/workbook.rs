use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use umya_spreadsheet::{
    HorizontalAlignmentValues, Pane, PaneStateValues, PaneValues, SheetView, Spreadsheet,
    Worksheet,
};

use crate::error::ConvertError;
use crate::model::{NormalizedTable, Row, cell_to_text};

const MAX_SHEET_NAME_CHARS: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['/', '\\', '?', '*', '[', ']', ':'];
const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 50.0;
const COLUMN_PADDING: usize = 2;

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn sanitize_sheet_name(raw: &str) -> String {
    let replaced = raw
        .chars()
        .map(|ch| {
            if FORBIDDEN_SHEET_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .collect::<String>();
    truncate_chars(&replaced, MAX_SHEET_NAME_CHARS)
}

/// Final sheet name for every table, in order.
///
/// `Page_{page}` when there is exactly one table, `Page_{page}_Table_{n}`
/// otherwise. Names that collide (ignoring case) get `_2`, `_3`, ... with the
/// base shortened so the result still fits in 31 characters.
#[must_use]
pub fn sheet_names(tables: &[NormalizedTable]) -> Vec<String> {
    let single = tables.len() == 1;
    let mut taken = HashSet::new();

    tables
        .iter()
        .map(|table| {
            let raw = if single {
                format!("Page_{}", table.page)
            } else {
                format!("Page_{}_Table_{}", table.page, table.table_number)
            };
            let base = sanitize_sheet_name(&raw);

            let mut name = base.clone();
            let mut counter = 2_usize;
            while taken.contains(&name.to_lowercase()) {
                let suffix = format!("_{counter}");
                let room = MAX_SHEET_NAME_CHARS.saturating_sub(suffix.chars().count());
                name = format!("{}{suffix}", truncate_chars(&base, room));
                counter += 1;
            }
            taken.insert(name.to_lowercase());
            name
        })
        .collect()
}

/// Width per column: longest cell plus padding, clamped to 10..=50.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn column_widths(rows: &[Row]) -> Vec<f64> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|column| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            ((longest + COLUMN_PADDING) as f64).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn freeze_header_row(sheet: &mut Worksheet) {
    let mut pane = Pane::default();
    pane.set_vertical_split(1.0);
    pane.get_top_left_cell_mut().set_coordinate("A2");
    pane.set_active_pane(PaneValues::BottomLeft);
    pane.set_state(PaneStateValues::Frozen);

    let views = sheet.get_sheet_views_mut().get_sheet_view_list_mut();
    if views.is_empty() {
        views.push(SheetView::default());
    }
    if let Some(view) = views.first_mut() {
        view.set_pane(pane);
    }
}

fn fill_sheet(sheet: &mut Worksheet, table: &NormalizedTable, header_fill: &str) {
    for (row_index, row) in (1_u32..).zip(&table.rows) {
        for (column_index, cell) in (1_u32..).zip(row) {
            sheet
                .get_cell_mut((column_index, row_index))
                .set_value_string(cell_to_text(Some(cell)));

            if row_index == 1 {
                let style = sheet.get_style_mut((column_index, row_index));
                style.get_font_mut().set_bold(true);
                style.set_background_color(header_fill);
                style
                    .get_alignment_mut()
                    .set_horizontal(HorizontalAlignmentValues::Center);
            }
        }
    }

    for (column_index, width) in (1_u32..).zip(column_widths(&table.rows)) {
        sheet
            .get_column_dimension_by_number_mut(&column_index)
            .set_width(width);
    }

    if !table.rows.is_empty() {
        freeze_header_row(sheet);
    }
}

/// One styled sheet per table. An empty table list gives an empty workbook.
pub fn build_workbook(
    tables: &[NormalizedTable],
    header_fill: &str,
) -> Result<Spreadsheet, ConvertError> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for (table, name) in tables.iter().zip(sheet_names(tables)) {
        let sheet = book
            .new_sheet(&name)
            .map_err(|error| ConvertError::Workbook(format!("sheet '{name}': {error}")))?;
        fill_sheet(sheet, table, header_fill);
        tracing::debug!(
            sheet = %name,
            page = table.page,
            rows = table.rows.len(),
            columns = table.column_count(),
            "sheet written"
        );
    }
    Ok(book)
}

/// Writes next to `output` and renames into place only once the file is complete.
pub(crate) fn write_workbook(book: &Spreadsheet, output: &Path) -> Result<(), ConvertError> {
    let directory = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged = NamedTempFile::new_in(directory)?;
    umya_spreadsheet::writer::xlsx::write_writer(book, staged.as_file_mut())
        .map_err(|error| ConvertError::Workbook(error.to_string()))?;
    staged.as_file_mut().flush()?;
    staged
        .persist(output)
        .map_err(|error| ConvertError::Io(error.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{build_workbook, column_widths, sanitize_sheet_name, sheet_names, write_workbook};
    use crate::model::{NormalizedTable, TableSource};
    use pretty_assertions::assert_eq;
    use umya_spreadsheet::{HorizontalAlignmentValues, PaneStateValues};

    fn table(page: u32, table_number: usize, rows: &[&[&str]]) -> NormalizedTable {
        NormalizedTable {
            page,
            table_number,
            source: TableSource::Lines,
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn single_table_is_named_after_its_page() {
        let names = sheet_names(&[table(7, 1, &[&["a"], &["b"]])]);
        assert_eq!(names, vec!["Page_7"]);
    }

    #[test]
    fn several_tables_carry_table_numbers() {
        let names = sheet_names(&[table(1, 1, &[]), table(1, 2, &[]), table(2, 1, &[])]);
        assert_eq!(names, vec!["Page_1_Table_1", "Page_1_Table_2", "Page_2_Table_1"]);
    }

    #[test]
    fn replaces_forbidden_characters_and_truncates() {
        assert_eq!(sanitize_sheet_name("a/b\\c?d*e[f]g:h"), "a_b_c_d_e_f_g_h");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).chars().count(), 31);
    }

    #[test]
    fn colliding_names_stay_unique_and_short() {
        let tables = [
            table(4_294_967_295, 1_000_000_000, &[]),
            table(4_294_967_295, 1_000_000_001, &[]),
            table(4_294_967_295, 1_000_000_002, &[]),
        ];
        let names = sheet_names(&tables);

        assert_eq!(names[0], "Page_4294967295_Table_100000000");
        assert_eq!(names[1], "Page_4294967295_Table_1000000_2");
        assert_eq!(names[2], "Page_4294967295_Table_1000000_3");
        assert!(names.iter().all(|name| name.chars().count() <= 31));
    }

    #[test]
    fn duplicate_identities_get_numeric_suffixes() {
        let names = sheet_names(&[table(1, 1, &[]), table(1, 1, &[])]);
        assert_eq!(names, vec!["Page_1_Table_1", "Page_1_Table_1_2"]);
    }

    #[test]
    fn widths_are_clamped() {
        let long = "y".repeat(80);
        let rows = vec![
            vec!["id".to_string(), "description".to_string(), long],
            vec!["1".to_string(), "a".repeat(20), String::new()],
        ];
        assert_eq!(column_widths(&rows), vec![10.0, 22.0, 50.0]);
    }

    #[test]
    fn writes_one_sheet_per_table_with_styled_header() {
        let tables = [
            table(1, 1, &[&["Name", "Qty"], &["Apple", "3"]]),
            table(2, 1, &[&["k", "v"], &["x", "y"]]),
        ];
        let book = build_workbook(&tables, "FFCCCCCC").expect("workbook should build");

        let sheet = book
            .get_sheet_by_name("Page_1_Table_1")
            .expect("first sheet should exist");
        assert_eq!(sheet.get_value((1, 1)), "Name");
        assert_eq!(sheet.get_value((2, 2)), "3");
        assert_eq!(book.get_sheet_collection().len(), 2);

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let output = dir.path().join("out.xlsx");
        write_workbook(&book, &output).expect("workbook should be written");
        assert!(output.exists());
    }

    #[test]
    fn header_row_is_bold_filled_centred_and_frozen() {
        let tables = [table(
            1,
            1,
            &[&["Name", "Description"], &["Apple", "a fairly long description text"]],
        )];
        let book = build_workbook(&tables, "FF336699").expect("workbook should build");
        let sheet = book.get_sheet_by_name("Page_1").expect("sheet should exist");

        for column in 1..=2_u32 {
            let style = sheet.get_style((column, 1));
            let font = style.get_font().expect("header font should be set");
            assert!(*font.get_bold());
            let fill = style
                .get_background_color()
                .expect("header fill should be set");
            assert_eq!(fill.get_argb(), "FF336699");
            let alignment = style.get_alignment().expect("header alignment should be set");
            assert!(matches!(
                alignment.get_horizontal(),
                HorizontalAlignmentValues::Center
            ));
        }
        assert!(sheet.get_style((1, 2)).get_background_color().is_none());

        let pane = sheet.get_sheets_views().get_sheet_view_list()[0]
            .get_pane()
            .expect("header row should be frozen");
        assert_eq!(*pane.get_vertical_split(), 1.0);
        assert!(matches!(pane.get_state(), PaneStateValues::Frozen));

        let width = |column: u32| {
            *sheet
                .get_column_dimension_by_number(&column)
                .expect("column width should be set")
                .get_width()
        };
        assert_eq!(width(1), 10.0);
        assert_eq!(width(2), 32.0);
    }
}
