//! Table detection from text alignment alone, for pages without rulings.

use crate::layout::{LINE_Y_TOLERANCE, Word, cluster_rows};
use crate::model::Row;

const COLUMN_TOLERANCE: f64 = 5.0;
const MIN_ANCHOR_MEMBERS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
struct Phrase {
    text: String,
    x0: f64,
    x1: f64,
}

/// Words on one line joined while the gap stays below the font size.
fn phrases(mut line: Vec<Word>) -> Vec<Phrase> {
    line.sort_by(|left, right| left.x0.total_cmp(&right.x0));

    let mut phrases: Vec<Phrase> = Vec::new();
    let mut last_size = 0.0_f64;
    for word in line {
        if let Some(phrase) = phrases.last_mut()
            && word.x0 - phrase.x1 < last_size.max(word.size)
        {
            phrase.text.push(' ');
            phrase.text.push_str(&word.text);
            phrase.x1 = phrase.x1.max(word.x1);
            last_size = word.size;
            continue;
        }

        last_size = word.size;
        phrases.push(Phrase {
            text: word.text,
            x0: word.x0,
            x1: word.x1,
        });
    }
    phrases
}

/// Column index per phrase, `None` for phrases whose left edge is shared by
/// too few others to count as a column.
fn assign_columns(lines: &[Vec<Phrase>]) -> (Vec<Vec<Option<usize>>>, usize) {
    let mut starts = lines
        .iter()
        .enumerate()
        .flat_map(|(line, phrases)| {
            phrases
                .iter()
                .enumerate()
                .map(move |(index, phrase)| (phrase.x0, line, index))
        })
        .collect::<Vec<_>>();
    starts.sort_by(|left, right| left.0.total_cmp(&right.0));

    let mut assigned = lines
        .iter()
        .map(|phrases| vec![None; phrases.len()])
        .collect::<Vec<_>>();
    let mut columns = 0;

    let mut begin = 0;
    while begin < starts.len() {
        let mut end = begin + 1;
        while end < starts.len() && starts[end].0 - starts[end - 1].0 <= COLUMN_TOLERANCE {
            end += 1;
        }

        if end - begin >= MIN_ANCHOR_MEMBERS {
            for &(_, line, index) in &starts[begin..end] {
                assigned[line][index] = Some(columns);
            }
            columns += 1;
        }
        begin = end;
    }

    (assigned, columns)
}

fn line_to_row(phrases: &[Phrase], assigned: &[Option<usize>], columns: usize) -> Option<Row> {
    let occupied = assigned
        .iter()
        .flatten()
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    if occupied < 2 {
        return None;
    }

    let mut row = vec![String::new(); columns];
    let mut current = assigned.iter().flatten().next().copied().unwrap_or(0);
    for (phrase, column) in phrases.iter().zip(assigned) {
        if let Some(column) = column {
            current = *column;
        }
        let cell = &mut row[current];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(&phrase.text);
    }
    Some(row)
}

fn close_fragment(rows: &mut Vec<(Row, usize, usize)>, tables: &mut Vec<Vec<Row>>) {
    let pending = std::mem::take(rows);
    if pending.len() < 2 {
        return;
    }

    let first = pending.iter().map(|(_, low, _)| *low).min().unwrap_or(0);
    let last = pending.iter().map(|(_, _, high)| *high).max().unwrap_or(0);
    if last <= first {
        return;
    }

    tables.push(
        pending
            .into_iter()
            .map(|(row, _, _)| row[first..=last].to_vec())
            .collect(),
    );
}

/// Runs of consecutive lines that fill at least two aligned columns.
pub(crate) fn find_aligned_tables(words: &[Word]) -> Vec<Vec<Row>> {
    let lines = cluster_rows(words.to_vec(), |word| word.top, LINE_Y_TOLERANCE)
        .into_iter()
        .map(phrases)
        .collect::<Vec<_>>();
    let (assigned, columns) = assign_columns(&lines);
    if columns < 2 {
        return Vec::new();
    }

    let mut tables = Vec::new();
    let mut pending = Vec::new();
    for (phrases, assigned) in lines.iter().zip(&assigned) {
        match line_to_row(phrases, assigned, columns) {
            Some(row) => {
                let used = assigned.iter().flatten().copied();
                let low = used.clone().min().unwrap_or(0);
                let high = used.max().unwrap_or(0);
                pending.push((row, low, high));
            }
            None => close_fragment(&mut pending, &mut tables),
        }
    }
    close_fragment(&mut pending, &mut tables);
    tables
}
