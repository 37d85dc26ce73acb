use std::str::FromStr;

use pdf_tables_xlsx::{
    DOMAIN_HEADERS, NormalizedTable, PageSelection, Row, TableFragment, TableSource, Thresholds,
    WarningCode, cell_to_text, column_widths, normalize_page, parse_text_table, sheet_names,
};
use pretty_assertions::assert_eq;

fn row(cells: &[&str]) -> Row {
    cells.iter().map(|cell| (*cell).to_string()).collect()
}

fn fragment(sequence: usize, rows: Vec<Row>) -> TableFragment {
    TableFragment {
        page: 3,
        sequence,
        source: TableSource::Lines,
        rows,
    }
}

#[test]
fn domain_rows_round_trip_through_the_parser() {
    let text = "\
1 100 Steel beam M 12.00 2024-02-01
Iron Works M 10.00 11.50 4%
2 101 Copper wire KG 8.75 2024-02-02
Wire House KG 7.00 8.10 2%
";
    let table = parse_text_table(text).expect("table should parse");

    assert_eq!(table.len(), 3);
    assert_eq!(table[0], DOMAIN_HEADERS.to_vec());
    assert_eq!(
        table[2],
        row(&[
            "2 101",
            "Copper wire",
            "KG",
            "8.75",
            "2024-02-02",
            "Wire House",
            "KG",
            "7.00",
            "8.10",
            "2%",
        ])
    );
}

#[test]
fn item_line_without_company_keeps_ten_columns() {
    let table = parse_text_table("5 200 Lamp UN 3.50 2024-05-05").expect("table should parse");
    assert_eq!(table[1].len(), DOMAIN_HEADERS.len());
    assert!(table[1][5..].iter().all(String::is_empty));
}

#[test]
fn plain_report_text_uses_numbered_headers() {
    let text = "Region    Sales    Growth\nNorth    120    4%\nSouth    95    -1%";
    let table = parse_text_table(text).expect("table should parse");

    assert_eq!(table[0], row(&["Column 1", "Column 2", "Column 3"]));
    assert_eq!(table[3], row(&["South", "95", "-1%"]));
}

#[test]
fn prose_without_columns_is_not_a_table() {
    assert_eq!(parse_text_table("Hello\nworld"), None);
    assert_eq!(parse_text_table("two words"), None);
}

#[test]
fn normalization_pads_rows_and_renumbers() {
    let mut warnings = Vec::new();
    let tables = normalize_page(
        vec![
            fragment(1, vec![row(&["only header"])]),
            fragment(2, Vec::new()),
            fragment(3, vec![row(&["a", "b", "c"]), row(&["1"])]),
        ],
        &Thresholds::default(),
        &mut warnings,
    );

    assert_eq!(
        tables,
        vec![NormalizedTable {
            page: 3,
            table_number: 1,
            source: TableSource::Lines,
            rows: vec![row(&["a", "b", "c"]), row(&["1", "", ""])],
        }]
    );
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, WarningCode::FragmentDiscarded);
    assert_eq!(warnings[0].table_number, Some(1));
}

#[test]
fn wide_fragments_of_equal_width_are_merged_in_order() {
    let wide = |label: &str| row(&[label, "b", "c", "d", "e"]);
    let mut warnings = Vec::new();
    let tables = normalize_page(
        vec![
            fragment(1, vec![wide("h"), wide("1")]),
            fragment(2, vec![wide("2"), wide("3")]),
        ],
        &Thresholds::default(),
        &mut warnings,
    );

    assert_eq!(tables.len(), 1);
    let first_cells = tables[0]
        .rows
        .iter()
        .map(|cells| cells[0].as_str())
        .collect::<Vec<_>>();
    assert_eq!(first_cells, vec!["h", "1", "2", "3"]);
    assert_eq!(warnings[0].code, WarningCode::FragmentsMerged);
}

#[test]
fn narrow_fragments_stay_separate() {
    let tables = normalize_page(
        vec![
            fragment(1, vec![row(&["a", "b"]), row(&["1", "2"])]),
            fragment(2, vec![row(&["c", "d"]), row(&["3", "4"])]),
        ],
        &Thresholds::default(),
        &mut Vec::new(),
    );

    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1].table_number, 2);
    assert_eq!(tables[1].header(), row(&["c", "d"]).as_slice());
}

#[test]
fn sheet_names_are_unique_and_valid() {
    let tables = (1..=3)
        .map(|table_number| NormalizedTable {
            page: 9,
            table_number,
            source: TableSource::Text,
            rows: Vec::new(),
        })
        .collect::<Vec<_>>();
    let names = sheet_names(&tables);

    assert_eq!(names, vec!["Page_9_Table_1", "Page_9_Table_2", "Page_9_Table_3"]);
    assert!(names.iter().all(|name| name.chars().count() <= 31));
}

#[test]
fn empty_cells_render_as_empty_text() {
    assert_eq!(cell_to_text(None), "");
    assert_eq!(cell_to_text(Some("x")), "x");
    assert_eq!(column_widths(&[row(&["", "abc"])]), vec![10.0, 10.0]);
}

#[test]
fn page_selection_rejects_reversed_ranges() {
    assert!(PageSelection::from_str("4-2").is_err());
    assert!(PageSelection::from_str("0").is_err());
    let selection = PageSelection::from_str("2, 4-5").expect("selection should parse");
    assert!(selection.contains(5));
    assert!(!selection.contains(3));
}
