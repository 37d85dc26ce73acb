use std::sync::LazyLock;

use regex::Regex;

use crate::model::Row;

/// Header row attached when every parsed row has the item/company shape.
pub const DOMAIN_HEADERS: [&str; 10] = [
    "ID",
    "Description",
    "Unit",
    "Value",
    "Date",
    "Company",
    "Company Unit",
    "Value 1",
    "Value 2",
    "Percentages",
];

static ITEM_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s+\d+").expect("hardcoded item header regex is valid"));

static WIDE_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("hardcoded wide gap regex is valid"));

/// Splits on runs of two or more whitespace characters.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    WIDE_GAP_RE
        .split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn is_item_header(line: &str) -> bool {
    ITEM_HEADER_RE.is_match(line)
}

fn item_row(tokens: &[&str]) -> Row {
    let count = tokens.len();
    vec![
        format!("{} {}", tokens[0], tokens[1]),
        tokens[2..count - 3].join(" "),
        tokens[count - 3].to_string(),
        tokens[count - 2].to_string(),
        tokens[count - 1].to_string(),
    ]
}

fn company_cells(line: Option<&str>) -> [String; 5] {
    let Some(line) = line else {
        return Default::default();
    };

    let tokens = line.split_whitespace().collect::<Vec<_>>();
    let count = tokens.len();
    if count < 5 {
        return [
            line.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ];
    }

    [
        tokens[..count - 4].join(" "),
        tokens[count - 4].to_string(),
        tokens[count - 3].to_string(),
        tokens[count - 2].to_string(),
        tokens[count - 1].to_string(),
    ]
}

/// Item lines (`<int> <int> description unit value date`) each followed by
/// an optional company line. Item-shaped lines with fewer than five tokens are
/// skipped. Returns the rows and how many item rows matched.
fn parse_domain_rows(lines: &[&str]) -> (Vec<Row>, usize) {
    let mut rows = Vec::new();
    let mut item_rows = 0_usize;
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index].trim();
        index += 1;
        if line.is_empty() {
            continue;
        }

        if is_item_header(line) {
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            if tokens.len() < 5 {
                continue;
            }
            let company = lines
                .get(index)
                .map(|next| next.trim())
                .filter(|next| !next.is_empty() && !is_item_header(next));
            if company.is_some() {
                index += 1;
            }

            let mut row = item_row(&tokens);
            row.extend(company_cells(company));
            rows.push(row);
            item_rows += 1;
            continue;
        }

        let cells = split_line_into_cells(line);
        if cells.len() >= 3 {
            rows.push(cells);
        }
    }

    (rows, item_rows)
}

fn parse_generic_rows(lines: &[&str]) -> Vec<Row> {
    let mut rows = Vec::new();
    for line in lines.iter().map(|line| line.trim()) {
        if line.is_empty() {
            continue;
        }

        let cells = split_line_into_cells(line);
        if cells.len() >= 2 {
            rows.push(cells);
            continue;
        }

        let tokens = soft_split_line_into_cells(line);
        if tokens.len() >= 3 {
            rows.push(tokens);
        }
    }
    rows
}

fn attach_headers(mut rows: Vec<Row>, domain: bool) -> Vec<Row> {
    if domain && rows.iter().all(|row| row.len() == DOMAIN_HEADERS.len()) {
        let mut out = Vec::with_capacity(rows.len() + 1);
        out.push(DOMAIN_HEADERS.iter().map(|header| (*header).to_string()).collect());
        out.extend(rows);
        return out;
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }

    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push((1..=width).map(|index| format!("Column {index}")).collect());
    out.extend(rows);
    out
}

/// Rebuilds a table from plain page text. The first returned row is a header.
///
/// The item/company pattern wins whenever it matches at least one item line;
/// otherwise every line with two or more wide-gap cells (or three or more
/// words) becomes a row. Returns `None` when no line qualifies.
#[must_use]
pub fn parse_text_table(text: &str) -> Option<Vec<Row>> {
    let lines = text.trim().lines().collect::<Vec<_>>();

    let (domain_rows, item_rows) = parse_domain_rows(&lines);
    let domain = item_rows > 0;
    let rows = if domain {
        domain_rows
    } else {
        parse_generic_rows(&lines)
    };

    if rows.is_empty() {
        return None;
    }

    Some(attach_headers(rows, domain))
}
