use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use encoding_rs::{BIG5, Encoding, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::ConvertError;
use crate::model::PageText;
use crate::options::ConvertOptions;
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};

#[derive(Debug, Clone)]
pub(crate) struct PdfPage {
    pub page_number: u32,
    pub object_id: ObjectId,
    pub text: String,
}

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

const IDENTITY_H_PLACEHOLDER: &str = "?Identity-H Unimplemented?";
const WIDE_ENCODING_HINTS: [&str; 4] = ["identity-h", "ucs2", "utf16", "unicode"];
const BIG5_ENCODING_HINTS: [&str; 3] = ["big5", "b5", "eten"];
const TABULAR_LINE_WEIGHT: i64 = 50;
const BROKEN_TEXT_PENALTY: i64 = 800;
const EMPTY_TEXT_SCORE: i64 = i64::MIN / 4;

/// Too many replacement or control characters for the text to be usable.
fn looks_decoding_broken(text: &str) -> bool {
    if text.contains(IDENTITY_H_PLACEHOLDER) {
        return true;
    }

    let (mut total, mut replacement, mut control) = (0_usize, 0_usize, 0_usize);
    for ch in text.chars() {
        total += 1;
        if ch == char::REPLACEMENT_CHARACTER {
            replacement += 1;
        } else if ch.is_control() && !matches!(ch, '\n' | '\r' | '\t') {
            control += 1;
        }
    }
    total > 0 && (replacement * 8 > total || control * 5 > total)
}

fn decode_strictly(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

/// lopdf's decoding first; UTF-16 or Big5 when that comes out garbled and
/// the bytes or the font encoding name suggest either.
pub(crate) fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let hint = encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    let has_bom = bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]);
    let retry = if has_bom || WIDE_ENCODING_HINTS.iter().any(|name| hint.contains(name)) {
        decode_strictly(UTF_16BE, bytes)
    } else if BIG5_ENCODING_HINTS.iter().any(|name| hint.contains(name)) {
        decode_strictly(BIG5, bytes)
    } else {
        None
    };
    retry.unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

fn looks_tabular(line: &str) -> bool {
    split_line_into_cells(line).len() >= 2 || soft_split_line_into_cells(line).len() >= 3
}

/// Higher for text whose lines split into cells; empty or garbled text loses.
fn text_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return EMPTY_TEXT_SCORE;
    }

    let (lines, tabular) = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold((0_i64, 0_i64), |(lines, tabular), line| {
            (lines + 1, tabular + i64::from(looks_tabular(line)))
        });
    let penalty = if looks_decoding_broken(text) {
        BROKEN_TEXT_PENALTY
    } else {
        0
    };
    tabular * TABULAR_LINE_WEIGHT + lines - penalty
}

/// Best candidate by [`text_score`]; later candidates win ties.
fn choose_best_text(candidates: &[String]) -> String {
    candidates
        .iter()
        .max_by_key(|text| text_score(text))
        .cloned()
        .unwrap_or_default()
}

fn push_shown_text(out: &mut String, encoding: Option<&str>, operand: &Object) {
    match operand {
        Object::String(bytes, _) => out.push_str(&decode_pdf_bytes(encoding, bytes)),
        Object::Array(items) => {
            for item in items {
                push_shown_text(out, encoding, item);
            }
            out.push(' ');
        }
        Object::Integer(kern) if *kern < -100 => out.push(' '),
        Object::Real(kern) if f64::from(*kern) < -100.0 => out.push(' '),
        _ => {}
    }
}

/// Shown strings in content order, one line per text-positioning operator.
fn content_stream_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = Content::decode(&document.get_page_content(page_id).ok()?).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut encoding = None;
    let mut flush = |line: &mut String| {
        if !line.trim().is_empty() {
            lines.push(std::mem::take(line));
        }
    };

    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                    .and_then(|name| encodings.get(name).copied());
            }
            "Td" | "TD" | "Tm" | "T*" | "ET" => flush(&mut line),
            "'" | "\"" => {
                flush(&mut line);
                if let Some(text) = operation.operands.last() {
                    push_shown_text(&mut line, encoding, text);
                }
            }
            "Tj" | "TJ" => {
                for operand in &operation.operands {
                    push_shown_text(&mut line, encoding, operand);
                }
            }
            _ => {}
        }
    }
    flush(&mut line);

    (!lines.is_empty()).then(|| lines.join("\n"))
}

pub(crate) fn load_document(input_pdf: &[u8]) -> Result<Document, ConvertError> {
    Ok(Document::load_mem(input_pdf)?)
}

/// Whole-document text from pdf-extract, pages separated by form feeds.
///
/// pdf-extract panics on some malformed inputs; that is treated as "no text".
pub(crate) fn library_text(input_pdf: &[u8]) -> Option<String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(input_pdf)
    }));
    match outcome {
        Ok(Ok(text)) => Some(text),
        Ok(Err(error)) => {
            tracing::debug!(%error, "pdf-extract could not read the document");
            None
        }
        Err(_) => {
            tracing::warn!("pdf-extract panicked while reading the document");
            None
        }
    }
}

/// Per-page texts as seen by pdf-extract alone, for the fallback stage.
pub(crate) fn library_page_texts(library_text: &str, options: &ConvertOptions) -> Vec<PageText> {
    split_text_into_pages(library_text)
        .into_iter()
        .zip(1_u32..)
        .filter(|(text, page_number)| !text.trim().is_empty() && options.includes_page(*page_number))
        .map(|(text, page_number)| PageText { page_number, text })
        .collect()
}

pub(crate) fn read_pdf_pages(
    document: &Document,
    library_text: Option<&str>,
    options: &ConvertOptions,
) -> Result<Vec<PdfPage>, ConvertError> {
    let pages_map = document.get_pages();

    let (library_pages, library_whole) = match library_text {
        Some(text) => {
            let pages = split_text_into_pages(text);
            if pages.len() == pages_map.len() {
                (Some(pages), None)
            } else {
                (None, Some(text))
            }
        }
        None => (None, None),
    };

    let mut pages = Vec::new();
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        if !options.includes_page(*page_no) {
            continue;
        }

        let mut candidates = Vec::new();
        if let Some(text) = library_pages
            .as_ref()
            .and_then(|fallback| fallback.get(index).cloned())
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }
        if let Some(text) = content_stream_text(document, *page_id) {
            candidates.push(text);
        }
        if let Some(text) = document
            .extract_text(&[*page_no])
            .ok()
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }

        let local_best_score = candidates
            .iter()
            .map(|text| text_score(text))
            .max()
            .unwrap_or(EMPTY_TEXT_SCORE);
        if pages_map.len() == 1 && local_best_score < 80 {
            if let Some(text) = library_whole.filter(|text| !text.trim().is_empty()) {
                candidates.push(text.to_string());
            }
        }

        pages.push(PdfPage {
            page_number: *page_no,
            object_id: *page_id,
            text: choose_best_text(&candidates),
        });
    }

    if pages.is_empty() {
        return Err(ConvertError::NoPagesSelected);
    }

    Ok(pages)
}
