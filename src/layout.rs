//! Geometric view of a single page.
//!
//! The page content stream is replayed with enough of the graphics and text
//! state to place every glyph and every straight ruling on the page. All
//! coordinates are in points with the origin at the top-left of the MediaBox.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::ConvertError;
use crate::pdf_reader::decode_pdf_bytes;

const DEFAULT_PAGE_BOX: [f64; 4] = [0.0, 0.0, 595.0, 842.0];
const ASCENT: f64 = 0.8;
const DESCENT: f64 = 0.2;
const AXIS_TOLERANCE: f64 = 0.5;
const COURIER_WIDTH: f64 = 600.0;
const FALLBACK_WIDTH: f64 = 500.0;

pub(crate) const WORD_X_TOLERANCE: f64 = 3.0;
pub(crate) const LINE_Y_TOLERANCE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        Some(Self::new(
            operand(operands, 0)?,
            operand(operands, 1)?,
            operand(operands, 2)?,
            operand(operands, 3)?,
            operand(operands, 4)?,
            operand(operands, 5)?,
        ))
    }

    /// `self` applied first, then `next`.
    fn then(self, next: Self) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    fn apply(self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(self) -> f64 {
        self.c.hypot(self.d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub ch: char,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Word {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
    pub size: f64,
}

impl Word {
    fn from_glyph(glyph: &Glyph) -> Self {
        Self {
            text: glyph.ch.to_string(),
            x0: glyph.x0,
            x1: glyph.x1,
            top: glyph.top,
            bottom: glyph.bottom,
            size: glyph.size,
        }
    }

    fn push(&mut self, glyph: &Glyph) {
        self.text.push(glyph.ch);
        self.x0 = self.x0.min(glyph.x0);
        self.x1 = self.x1.max(glyph.x1);
        self.top = self.top.min(glyph.top);
        self.bottom = self.bottom.max(glyph.bottom);
        self.size = self.size.max(glyph.size);
    }

    pub(crate) fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeKind {
    Line,
    RectSide,
}

/// An axis-aligned ruling. `position` is the y of a horizontal edge or the
/// x of a vertical one; `start..end` spans the other axis.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Edge {
    pub orientation: Orientation,
    pub position: f64,
    pub start: f64,
    pub end: f64,
    pub kind: EdgeKind,
}

impl Edge {
    pub(crate) fn length(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PageLayout {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    pub glyphs: Vec<Glyph>,
    pub edges: Vec<Edge>,
}

impl PageLayout {
    /// Glyphs grouped into lines, then split on whitespace and wide gaps.
    pub(crate) fn words(&self) -> Vec<Word> {
        let mut words = Vec::new();
        for mut line in cluster_rows(self.glyphs.clone(), |glyph| glyph.top, LINE_Y_TOLERANCE) {
            line.sort_by(|left, right| left.x0.total_cmp(&right.x0));

            let mut current: Option<Word> = None;
            for glyph in &line {
                if glyph.ch.is_whitespace() {
                    words.extend(current.take());
                    continue;
                }

                let joins = current
                    .as_ref()
                    .is_some_and(|word| glyph.x0 - word.x1 <= WORD_X_TOLERANCE);
                if joins {
                    if let Some(word) = current.as_mut() {
                        word.push(glyph);
                    }
                } else {
                    words.extend(current.replace(Word::from_glyph(glyph)));
                }
            }
            words.extend(current);
        }
        words
    }
}

/// Groups items whose key lies within `tolerance` of the first item of the group.
pub(crate) fn cluster_rows<T>(
    mut items: Vec<T>,
    key: impl Fn(&T) -> f64,
    tolerance: f64,
) -> Vec<Vec<T>> {
    items.sort_by(|left, right| key(left).total_cmp(&key(right)));

    let mut rows: Vec<Vec<T>> = Vec::new();
    let mut anchor = f64::NEG_INFINITY;
    for item in items {
        let value = key(&item);
        if rows.is_empty() || value - anchor > tolerance {
            anchor = value;
            rows.push(vec![item]);
        } else if let Some(row) = rows.last_mut() {
            row.push(item);
        }
    }
    rows
}

#[allow(clippy::cast_precision_loss)]
fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn operand(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(number)
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn media_box(document: &Document, page_id: ObjectId) -> [f64; 4] {
    let mut current = document.get_dictionary(page_id).ok();
    let mut depth = 0;
    while let Some(dict) = current {
        let rect = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|object| resolve(document, object).as_array().ok())
            .and_then(|items| {
                let values = items.iter().filter_map(number).collect::<Vec<_>>();
                (values.len() == 4).then(|| {
                    [
                        values[0].min(values[2]),
                        values[1].min(values[3]),
                        values[0].max(values[2]),
                        values[1].max(values[3]),
                    ]
                })
            });
        if let Some(rect) = rect {
            return rect;
        }

        depth += 1;
        if depth > 32 {
            break;
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|parent| parent.as_reference().ok())
            .and_then(|id| document.get_dictionary(id).ok());
    }
    DEFAULT_PAGE_BOX
}

#[derive(Debug, Clone)]
struct FontInfo<'a> {
    encoding: Option<&'a str>,
    first_char: i64,
    widths: Vec<f64>,
    default_width: f64,
}

impl<'a> FontInfo<'a> {
    fn from_dictionary(document: &'a Document, font: &'a Dictionary) -> Self {
        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|object| resolve(document, object).as_i64().ok())
            .unwrap_or(0);
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|object| resolve(document, object).as_array().ok())
            .map(|items| {
                items
                    .iter()
                    .map(|item| number(resolve(document, item)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();
        let is_courier = font
            .get(b"BaseFont")
            .ok()
            .and_then(|object| object.as_name().ok())
            .is_some_and(|name| String::from_utf8_lossy(name).contains("Courier"));

        Self {
            encoding: Some(font.get_font_encoding()),
            first_char,
            widths,
            default_width: if is_courier {
                COURIER_WIDTH
            } else {
                FALLBACK_WIDTH
            },
        }
    }

    fn fallback() -> Self {
        Self {
            encoding: None,
            first_char: 0,
            widths: Vec::new(),
            default_width: FALLBACK_WIDTH,
        }
    }

    /// Advance of a single-byte code in thousandths of an em.
    fn width(&self, code: u8) -> f64 {
        usize::try_from(i64::from(code) - self.first_char)
            .ok()
            .and_then(|index| self.widths.get(index).copied())
            .filter(|width| *width > 0.0)
            .unwrap_or(self.default_width)
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    from: (f64, f64),
    to: (f64, f64),
    kind: EdgeKind,
}

struct Interpreter<'a> {
    fonts: BTreeMap<Vec<u8>, FontInfo<'a>>,
    fallback_font: FontInfo<'a>,
    origin_x: f64,
    page_top: f64,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: Vec<Segment>,
    current_point: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    glyphs: Vec<Glyph>,
    edges: Vec<Edge>,
}

impl<'a> Interpreter<'a> {
    fn new(fonts: BTreeMap<Vec<u8>, FontInfo<'a>>, origin_x: f64, page_top: f64) -> Self {
        Self {
            fonts,
            fallback_font: FontInfo::fallback(),
            origin_x,
            page_top,
            state: GraphicsState::default(),
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            path: Vec::new(),
            current_point: None,
            subpath_start: None,
            glyphs: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.saved.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.state.ctm = matrix.then(self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                self.state.font = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .map(<[u8]>::to_vec);
                self.state.font_size = operand(operands, 1).unwrap_or(0.0);
            }
            "Tc" => self.state.char_spacing = operand(operands, 0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = operand(operands, 0).unwrap_or(0.0),
            "Tz" => self.state.horizontal_scale = operand(operands, 0).unwrap_or(100.0) / 100.0,
            "TL" => self.state.leading = operand(operands, 0).unwrap_or(0.0),
            "Td" | "TD" => {
                let tx = operand(operands, 0).unwrap_or(0.0);
                let ty = operand(operands, 1).unwrap_or(0.0);
                if operator == "TD" {
                    self.state.leading = -ty;
                }
                self.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.text_matrix = matrix;
                    self.line_matrix = matrix;
                }
            }
            "T*" => self.next_line(),
            "Tj" => self.show_operand(operands.first()),
            "'" => {
                self.next_line();
                self.show_operand(operands.first());
            }
            "\"" => {
                self.state.word_spacing = operand(operands, 0).unwrap_or(0.0);
                self.state.char_spacing = operand(operands, 1).unwrap_or(0.0);
                self.next_line();
                self.show_operand(operands.get(2));
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show_string(bytes),
                            other => {
                                if let Some(offset) = number(other) {
                                    let tx = -offset / 1000.0
                                        * self.state.font_size
                                        * self.state.horizontal_scale;
                                    self.text_matrix =
                                        Matrix::translation(tx, 0.0).then(self.text_matrix);
                                }
                            }
                        }
                    }
                }
            }
            "m" => {
                if let (Some(x), Some(y)) = (operand(operands, 0), operand(operands, 1)) {
                    let point = self.state.ctm.apply(x, y);
                    self.current_point = Some(point);
                    self.subpath_start = Some(point);
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (operand(operands, 0), operand(operands, 1)) {
                    let point = self.state.ctm.apply(x, y);
                    if let Some(from) = self.current_point {
                        self.path.push(Segment {
                            from,
                            to: point,
                            kind: EdgeKind::Line,
                        });
                    }
                    self.current_point = Some(point);
                }
            }
            "c" | "v" | "y" => {
                let count = operands.len();
                if count >= 2 {
                    if let (Some(x), Some(y)) =
                        (operand(operands, count - 2), operand(operands, count - 1))
                    {
                        self.current_point = Some(self.state.ctm.apply(x, y));
                    }
                }
            }
            "re" => self.rectangle(operands),
            "h" => self.close_subpath(),
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint_path(),
            "s" | "b" | "b*" => {
                self.close_subpath();
                self.paint_path();
            }
            "n" => self.discard_path(),
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).then(self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn show_operand(&mut self, object: Option<&Object>) {
        if let Some(Object::String(bytes, _)) = object {
            self.show_string(bytes);
        }
    }

    fn show_string(&mut self, bytes: &[u8]) {
        let font = self
            .state
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback_font);

        let text = decode_pdf_bytes(font.encoding, bytes);
        let chars = text.chars().collect::<Vec<_>>();
        let single_byte = chars.len() == bytes.len();
        let font_size = self.state.font_size;
        let scale = self.state.horizontal_scale;

        for (index, ch) in chars.into_iter().enumerate() {
            let width = if single_byte {
                font.width(bytes[index])
            } else {
                font.default_width
            } / 1000.0;

            let rendering = self.text_matrix.then(self.state.ctm);
            let (x_start, baseline) = rendering.apply(0.0, 0.0);
            let (x_end, _) = rendering.apply(width * font_size * scale, 0.0);
            let size = font_size * rendering.vertical_scale();
            self.glyphs.push(Glyph {
                ch,
                x0: x_start.min(x_end) - self.origin_x,
                x1: x_start.max(x_end) - self.origin_x,
                top: self.page_top - (baseline + ASCENT * size),
                bottom: self.page_top - (baseline - DESCENT * size),
                size,
            });

            let word_spacing = if single_byte && bytes[index] == b' ' {
                self.state.word_spacing
            } else {
                0.0
            };
            let tx = (width * font_size + self.state.char_spacing + word_spacing) * scale;
            self.text_matrix = Matrix::translation(tx, 0.0).then(self.text_matrix);
        }
    }

    fn rectangle(&mut self, operands: &[Object]) {
        let (Some(x), Some(y), Some(width), Some(height)) = (
            operand(operands, 0),
            operand(operands, 1),
            operand(operands, 2),
            operand(operands, 3),
        ) else {
            return;
        };

        let corners = [
            self.state.ctm.apply(x, y),
            self.state.ctm.apply(x + width, y),
            self.state.ctm.apply(x + width, y + height),
            self.state.ctm.apply(x, y + height),
        ];
        for index in 0..corners.len() {
            self.path.push(Segment {
                from: corners[index],
                to: corners[(index + 1) % corners.len()],
                kind: EdgeKind::RectSide,
            });
        }
        self.current_point = Some(corners[0]);
        self.subpath_start = Some(corners[0]);
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(to)) = (self.current_point, self.subpath_start) {
            if from != to {
                self.path.push(Segment {
                    from,
                    to,
                    kind: EdgeKind::Line,
                });
            }
            self.current_point = Some(to);
        }
    }

    fn paint_path(&mut self) {
        let segments = std::mem::take(&mut self.path);
        for segment in segments {
            if let Some(edge) = self.to_edge(segment) {
                self.edges.push(edge);
            }
        }
        self.current_point = None;
        self.subpath_start = None;
    }

    fn discard_path(&mut self) {
        self.path.clear();
        self.current_point = None;
        self.subpath_start = None;
    }

    fn to_edge(&self, segment: Segment) -> Option<Edge> {
        let ((x0, y0), (x1, y1)) = (segment.from, segment.to);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();

        if dy <= AXIS_TOLERANCE && dx > AXIS_TOLERANCE {
            Some(Edge {
                orientation: Orientation::Horizontal,
                position: self.page_top - (y0 + y1) / 2.0,
                start: x0.min(x1) - self.origin_x,
                end: x0.max(x1) - self.origin_x,
                kind: segment.kind,
            })
        } else if dx <= AXIS_TOLERANCE && dy > AXIS_TOLERANCE {
            Some(Edge {
                orientation: Orientation::Vertical,
                position: (x0 + x1) / 2.0 - self.origin_x,
                start: self.page_top - y0.max(y1),
                end: self.page_top - y0.min(y1),
                kind: segment.kind,
            })
        } else {
            None
        }
    }
}

pub(crate) fn read_page_layout(
    document: &Document,
    page_number: u32,
    page_id: ObjectId,
) -> Result<PageLayout, ConvertError> {
    let layout_error = |reason: String| ConvertError::PdfLayout {
        page: page_number,
        reason,
    };

    for content_id in document.get_page_contents(page_id) {
        document
            .get_object(content_id)
            .and_then(Object::as_stream)
            .map_err(|error| layout_error(format!("content stream {content_id:?}: {error}")))?;
    }

    let raw_content = document
        .get_page_content(page_id)
        .map_err(|error| layout_error(error.to_string()))?;
    let content = Content::decode(&raw_content).map_err(|error| layout_error(error.to_string()))?;

    let [x0, y0, x1, y1] = media_box(document, page_id);
    let fonts = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, FontInfo::from_dictionary(document, font)))
        .collect();

    let mut interpreter = Interpreter::new(fonts, x0, y1);
    for operation in &content.operations {
        interpreter.apply(&operation.operator, &operation.operands);
    }

    Ok(PageLayout {
        page_number,
        width: x1 - x0,
        height: y1 - y0,
        glyphs: interpreter.glyphs,
        edges: interpreter.edges,
    })
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    use super::{EdgeKind, Glyph, Matrix, Orientation, PageLayout, read_page_layout};

    fn single_page_document(operations: Vec<Operation>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn layout_of(operations: Vec<Operation>) -> PageLayout {
        let document = single_page_document(operations);
        let page_id = *document
            .get_pages()
            .get(&1)
            .expect("document should have one page");
        read_page_layout(&document, 1, page_id).expect("layout should be readable")
    }

    fn text_at(x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn matrix_composition_applies_left_operand_first() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 5.0);
        let (x, y) = scale.then(shift).apply(1.0, 1.0);
        assert_close(x, 12.0);
        assert_close(y, 7.0);
    }

    #[test]
    fn places_courier_glyphs_from_the_top_left() {
        let layout = layout_of(text_at(100, 700, "AB"));

        assert_eq!(layout.glyphs.len(), 2);
        let first: &Glyph = &layout.glyphs[0];
        assert_eq!(first.ch, 'A');
        assert_close(first.x0, 100.0);
        assert_close(first.x1, 107.2);
        assert_close(first.top, 842.0 - (700.0 + 9.6));
        assert_close(first.bottom, 842.0 - (700.0 - 2.4));
        assert_close(layout.glyphs[1].x0, 107.2);
    }

    #[test]
    fn splits_words_on_spaces() {
        let layout = layout_of(text_at(50, 600, "Name  Age"));
        let words = layout.words();
        let texts = words.iter().map(|word| word.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["Name", "Age"]);
        assert_close(words[1].x0, 50.0 + 6.0 * 7.2);
    }

    #[test]
    fn next_line_uses_leading() {
        let layout = layout_of(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
            Operation::new("Tj", vec![Object::string_literal("a")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![Object::string_literal("b")]),
            Operation::new("ET", vec![]),
        ]);
        let words = layout.words();
        assert_eq!(words.len(), 2);
        assert_close(words[1].top - words[0].top, 16.0);
    }

    #[test]
    fn stroked_rectangle_becomes_four_edges() {
        let layout = layout_of(vec![
            Operation::new("re", vec![50.into(), 600.into(), 200.into(), 100.into()]),
            Operation::new("S", vec![]),
        ]);

        assert_eq!(layout.edges.len(), 4);
        assert!(layout.edges.iter().all(|edge| edge.kind == EdgeKind::RectSide));

        let mut horizontal = layout
            .edges
            .iter()
            .filter(|edge| edge.orientation == Orientation::Horizontal)
            .map(|edge| edge.position)
            .collect::<Vec<_>>();
        horizontal.sort_by(f64::total_cmp);
        assert_eq!(horizontal, vec![142.0, 242.0]);
    }

    #[test]
    fn discarded_and_diagonal_paths_leave_no_edges() {
        let layout = layout_of(vec![
            Operation::new("m", vec![0.into(), 0.into()]),
            Operation::new("l", vec![100.into(), 0.into()]),
            Operation::new("n", vec![]),
            Operation::new("m", vec![0.into(), 0.into()]),
            Operation::new("l", vec![100.into(), 100.into()]),
            Operation::new("S", vec![]),
        ]);
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn dangling_content_reference_is_a_layout_error() {
        let mut document = single_page_document(Vec::new());
        let page_id = *document
            .get_pages()
            .get(&1)
            .expect("document should have one page");
        let missing = document.new_object_id();
        document
            .get_dictionary_mut(page_id)
            .expect("page dictionary should exist")
            .set("Contents", missing);

        let error = read_page_layout(&document, 1, page_id).expect_err("page should not be readable");
        assert_eq!(error.code(), "page_layout");
    }

    #[test]
    fn transformation_matrix_scales_line_segments() {
        let layout = layout_of(vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![2.into(), 0.into(), 0.into(), 2.into(), 10.into(), 0.into()],
            ),
            Operation::new("m", vec![0.into(), 100.into()]),
            Operation::new("l", vec![50.into(), 100.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);

        assert_eq!(layout.edges.len(), 1);
        let edge = &layout.edges[0];
        assert_eq!(edge.orientation, Orientation::Horizontal);
        assert_eq!(edge.kind, EdgeKind::Line);
        assert_close(edge.position, 842.0 - 200.0);
        assert_close(edge.start, 10.0);
        assert_close(edge.end, 110.0);
    }
}
