#![allow(dead_code)]

use std::path::Path;

use calamine::{Reader, Xlsx, open_workbook};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

type FixtureResult = Result<(), Box<dyn std::error::Error>>;

/// `None` pages get a `Contents` reference to an object that does not exist.
fn save_pages(path: &Path, pages: Vec<Option<Vec<Operation>>>) -> FixtureResult {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for operations in pages {
        let content_id = match operations {
            Some(operations) => {
                let content = Content { operations };
                doc.add_object(Stream::new(dictionary! {}, content.encode()?))
            }
            None => doc.new_object_id(),
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

fn text_at(x: f64, y: f64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn stroke_line(from: (f64, f64), to: (f64, f64)) -> Vec<Operation> {
    vec![
        Operation::new("m", vec![from.0.into(), from.1.into()]),
        Operation::new("l", vec![to.0.into(), to.1.into()]),
        Operation::new("S", vec![]),
    ]
}

/// One text line per entry, 16pt apart, starting at (50, 780).
pub fn create_text_pdf(path: &Path, pages: &[Vec<&str>]) -> FixtureResult {
    let pages = pages
        .iter()
        .map(|lines| {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("TL", vec![16.into()]),
                Operation::new("Td", vec![50.into(), 780.into()]),
            ];
            for (index, line) in lines.iter().enumerate() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                if index + 1 < lines.len() {
                    operations.push(Operation::new("T*", vec![]));
                }
            }
            operations.push(Operation::new("ET", vec![]));
            Some(operations)
        })
        .collect();
    save_pages(path, pages)
}

/// Cells placed in columns at x = 50, 200, 350, one row every 16pt from y = 700.
pub fn create_columns_pdf(path: &Path, rows: &[Vec<&str>]) -> FixtureResult {
    let mut operations = Vec::new();
    for (row, cells) in rows.iter().enumerate() {
        for (column, cell) in cells.iter().enumerate() {
            let x = 50.0 + 150.0 * column as f64;
            let y = 700.0 - 16.0 * row as f64;
            operations.extend(text_at(x, y, cell));
        }
    }
    save_pages(path, vec![Some(operations)])
}

/// A grid of 100x20pt cells ruled with stroked lines, top-left corner at (50, 700).
pub fn create_ruled_pdf(path: &Path, rows: &[Vec<&str>]) -> FixtureResult {
    save_pages(path, vec![Some(ruled_operations(rows))])
}

/// Page 1 cannot be read; page 2 holds a ruled grid.
pub fn create_pdf_with_broken_first_page(path: &Path, rows: &[Vec<&str>]) -> FixtureResult {
    save_pages(path, vec![None, Some(ruled_operations(rows))])
}

fn ruled_operations(rows: &[Vec<&str>]) -> Vec<Operation> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let left = 50.0;
    let right = left + 100.0 * columns as f64;
    let top = 700.0;
    let bottom = top - 20.0 * rows.len() as f64;

    let mut operations = Vec::new();
    for row in 0..=rows.len() {
        let y = top - 20.0 * row as f64;
        operations.extend(stroke_line((left, y), (right, y)));
    }
    for column in 0..=columns {
        let x = left + 100.0 * column as f64;
        operations.extend(stroke_line((x, bottom), (x, top)));
    }
    for (row, cells) in rows.iter().enumerate() {
        for (column, cell) in cells.iter().enumerate() {
            let x = left + 100.0 * column as f64 + 5.0;
            let y = top - 20.0 * row as f64 - 15.0;
            operations.extend(text_at(x, y, cell));
        }
    }
    operations
}

pub fn create_blank_pdf(path: &Path) -> FixtureResult {
    save_pages(path, vec![Some(Vec::new())])
}

/// Every sheet of a workbook as `(name, rows)`, cells rendered as text.
pub fn read_workbook(path: &Path) -> Vec<(String, Vec<Vec<String>>)> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook should open");
    workbook
        .sheet_names()
        .into_iter()
        .map(|name| {
            let range = workbook
                .worksheet_range(&name)
                .expect("sheet should be readable");
            let rows = range
                .rows()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect();
            (name, rows)
        })
        .collect()
}
