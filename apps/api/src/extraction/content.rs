//! Content-stream interpretation: turns a page's text operators into
//! positioned raw text items.
//!
//! Only the state needed for positions is tracked (CTM, text and line
//! matrices, font, font size, leading). Shown strings are decoded through the
//! current font's encoding or ToUnicode map; glyph widths are estimated at
//! half an em per character.
//!
//! Form XObjects drawn with `Do` are interpreted in place, under their own
//! `/Matrix` and resources, up to `MAX_FORM_DEPTH` levels deep.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, Stream};
use tracing::debug;

use crate::extraction::glyph::RawTextItem;

/// Average glyph advance as a fraction of the font size.
const EM_ADVANCE: f64 = 0.5;

/// A `TJ` adjustment beyond this many thousandths of an em reads as a word gap.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

/// Forms nested deeper than this are skipped.
const MAX_FORM_DEPTH: usize = 8;

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
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f64, ty: f64) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: number(&operands[0])?,
            b: number(&operands[1])?,
            c: number(&operands[2])?,
            d: number(&operands[3])?,
            e: number(&operands[4])?,
            f: number(&operands[5])?,
        })
    }

    /// `self × other` in PDF row-vector convention.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn horizontal_scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resources
// ────────────────────────────────────────────────────────────────────────────

/// How the strings shown with one font turn into text.
struct FontDecoder<'a> {
    encoding: Option<Encoding<'a>>,
    /// Type0 font: two-byte codes that are glyph ids, meaningless without a map.
    composite: bool,
}

impl<'a> FontDecoder<'a> {
    fn load(doc: &'a Document, font: &'a Dictionary) -> Option<Self> {
        // get_font_encoding asserts on the dictionary type.
        if !font.type_is(b"Font") {
            return None;
        }
        let composite = font.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Type0".as_slice());
        Some(Self {
            encoding: font.get_font_encoding(doc).ok(),
            composite,
        })
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match &self.encoding {
            // A ToUnicode map on a simple font is keyed by single bytes.
            Some(Encoding::UnicodeMapEncoding(cmap)) if !self.composite => bytes
                .iter()
                .map(|&code| match cmap.get(u16::from(code)) {
                    Some(units) => String::from_utf16_lossy(&units),
                    None => char::from(code).to_string(),
                })
                .collect(),
            Some(encoding) => match Document::decode_text(encoding, bytes) {
                Ok(text) => text,
                Err(_) if self.composite => String::new(),
                Err(_) => decode_pdf_string(bytes),
            },
            None if self.composite => String::new(),
            None => decode_pdf_string(bytes),
        }
    }
}

/// Fonts and Form XObjects visible to one content stream.
///
/// `PageResources::default()` knows no fonts; strings are then decoded
/// without font information and `Do` draws nothing.
#[derive(Default)]
pub struct PageResources<'a> {
    doc: Option<&'a Document>,
    fonts: BTreeMap<Vec<u8>, FontDecoder<'a>>,
    forms: BTreeMap<Vec<u8>, &'a Stream>,
}

/// A Form XObject ready to be interpreted.
struct Form<'a> {
    operations: Vec<Operation>,
    matrix: Matrix,
    /// `None` when the form inherits the resources of the stream drawing it.
    resources: Option<PageResources<'a>>,
}

impl<'a> PageResources<'a> {
    /// Resources of a page, including those inherited from the page tree.
    pub fn for_page(doc: &'a Document, page_id: ObjectId) -> Self {
        let Ok((direct, inherited)) = doc.get_page_resources(page_id) else {
            return Self::from_dicts(doc, Vec::new());
        };
        let mut dicts: Vec<&'a Dictionary> = direct.into_iter().collect();
        dicts.extend(inherited.into_iter().filter_map(|id| doc.get_dictionary(id).ok()));
        Self::from_dicts(doc, dicts)
    }

    /// Earlier dictionaries win on name clashes.
    fn from_dicts(doc: &'a Document, dicts: Vec<&'a Dictionary>) -> Self {
        let mut resources = Self {
            doc: Some(doc),
            ..Self::default()
        };

        for dict in dicts {
            for (name, value) in named_entries(doc, dict, b"Font") {
                if resources.fonts.contains_key(name) {
                    continue;
                }
                let decoder = resolve(doc, value)
                    .and_then(|font| font.as_dict().ok())
                    .and_then(|font| FontDecoder::load(doc, font));
                if let Some(decoder) = decoder {
                    resources.fonts.insert(name.clone(), decoder);
                }
            }

            for (name, value) in named_entries(doc, dict, b"XObject") {
                if resources.forms.contains_key(name) {
                    continue;
                }
                let form = resolve(doc, value)
                    .and_then(|x| x.as_stream().ok())
                    .filter(|x| x.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Form".as_slice()));
                if let Some(stream) = form {
                    resources.forms.insert(name.clone(), stream);
                }
            }
        }

        resources
    }

    fn decode(&self, font: Option<&[u8]>, bytes: &[u8]) -> String {
        match font.and_then(|name| self.fonts.get(name)) {
            Some(decoder) => decoder.decode(bytes),
            None => decode_pdf_string(bytes),
        }
    }

    fn form(&self, name: &[u8]) -> Option<Form<'a>> {
        let doc = self.doc?;
        let stream = *self.forms.get(name)?;

        let content = match stream.get_plain_content() {
            Ok(content) => content,
            Err(e) => {
                debug!("skipping form /{}: {e}", String::from_utf8_lossy(name));
                return None;
            }
        };
        let operations = Content::decode(&content).ok()?.operations;
        let matrix = stream
            .dict
            .get(b"Matrix")
            .and_then(Object::as_array)
            .ok()
            .and_then(|m| Matrix::from_operands(m))
            .unwrap_or(Matrix::IDENTITY);
        let resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve(doc, r))
            .and_then(|r| r.as_dict().ok())
            .map(|dict| Self::from_dicts(doc, vec![dict]));

        Some(Form {
            operations,
            matrix,
            resources,
        })
    }
}

/// Entries of a name-keyed sub-dictionary such as `/Font` or `/XObject`.
fn named_entries<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> impl Iterator<Item = (&'a Vec<u8>, &'a Object)> {
    dict.get(key)
        .ok()
        .and_then(|entry| resolve(doc, entry))
        .and_then(|entry| entry.as_dict().ok())
        .into_iter()
        .flat_map(Dictionary::iter)
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    doc.dereference(object).ok().map(|(_, resolved)| resolved)
}

// ────────────────────────────────────────────────────────────────────────────
// Interpreter
// ────────────────────────────────────────────────────────────────────────────

/// Graphics state saved by `q` and restored by `Q`.
#[derive(Debug, Clone)]
struct SavedState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f64,
    leading: f64,
}

#[derive(Debug)]
struct TextState {
    ctm: Matrix,
    saved: Vec<SavedState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font: Option<Vec<u8>>,
    font_size: f64,
    leading: f64,
    /// True once a positioning operator ran since the last show operation.
    repositioned: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font: None,
            font_size: 12.0,
            leading: 0.0,
            repositioned: true,
        }
    }
}

impl TextState {
    fn save(&mut self) {
        self.saved.push(SavedState {
            ctm: self.ctm,
            font: self.font.clone(),
            font_size: self.font_size,
            leading: self.leading,
        });
    }

    fn restore(&mut self) {
        if let Some(saved) = self.saved.pop() {
            self.ctm = saved.ctm;
            self.font = saved.font;
            self.font_size = saved.font_size;
            self.leading = saved.leading;
        }
    }

    /// Fresh state for a form drawn under `matrix`.
    fn for_form(&self, matrix: &Matrix) -> Self {
        Self {
            ctm: matrix.then(&self.ctm),
            font: self.font.clone(),
            font_size: self.font_size,
            leading: self.leading,
            ..Self::default()
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
        self.repositioned = true;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, text_space_units: f64) {
        self.text_matrix = Matrix::translation(text_space_units, 0.0).then(&self.text_matrix);
    }
}

/// One decoded show operation: its text and its advance in text-space units.
struct Shown {
    text: String,
    advance: f64,
}

/// Interprets a page's operations and returns its text items in stream order.
pub fn text_items(operations: &[Operation], resources: &PageResources<'_>) -> Vec<RawTextItem> {
    let mut state = TextState::default();
    let mut items: Vec<RawTextItem> = Vec::new();
    interpret(operations, resources, &mut state, &mut items, 0);
    items
}

fn interpret(
    operations: &[Operation],
    resources: &PageResources<'_>,
    state: &mut TextState,
    items: &mut Vec<RawTextItem>,
    depth: usize,
) {
    for op in operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => state.save(),
            "Q" => state.restore(),
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    state.ctm = m.then(&state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = Matrix::IDENTITY;
                state.line_matrix = Matrix::IDENTITY;
                state.repositioned = true;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    state.font = Some(name.clone());
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    state.line_matrix = m;
                    state.text_matrix = m;
                    state.repositioned = true;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    let shown = show_string(bytes, state, resources);
                    emit(state, items, shown);
                }
            }
            "'" => {
                state.next_line();
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    let shown = show_string(bytes, state, resources);
                    emit(state, items, shown);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(bytes) = operands.get(2).and_then(string_bytes) {
                    let shown = show_string(bytes, state, resources);
                    emit(state, items, shown);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operands.first() {
                    let shown = show_array(parts, state, resources);
                    emit(state, items, shown);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    draw_form(name, resources, state, items, depth);
                }
            }
            _ => {}
        }
    }
}

fn draw_form(
    name: &[u8],
    resources: &PageResources<'_>,
    state: &mut TextState,
    items: &mut Vec<RawTextItem>,
    depth: usize,
) {
    if depth >= MAX_FORM_DEPTH {
        debug!(depth, "form /{} nested too deep, skipped", String::from_utf8_lossy(name));
        return;
    }
    // Images and unknown names resolve to nothing.
    let Some(form) = resources.form(name) else {
        return;
    };

    let mut inner = state.for_form(&form.matrix);
    let form_resources = form.resources.as_ref().unwrap_or(resources);
    interpret(&form.operations, form_resources, &mut inner, items, depth + 1);
    state.repositioned = true;
}

fn emit(state: &mut TextState, items: &mut Vec<RawTextItem>, shown: Shown) {
    let render = state.text_matrix.then(&state.ctm);
    let device_width = shown.advance * render.horizontal_scale();

    let continues = !state.repositioned && !items.is_empty();
    if continues {
        if let Some(last) = items.last_mut() {
            last.text.push_str(&shown.text);
            last.width = Some(last.width.unwrap_or(0.0) + device_width);
        }
    } else {
        let mut item = if render.e.is_finite() && render.f.is_finite() {
            RawTextItem::placed(shown.text, render.e, render.f)
        } else {
            RawTextItem::unplaced(shown.text)
        };
        item.width = Some(device_width).filter(|w| w.is_finite());
        items.push(item);
    }

    state.advance(shown.advance);
    state.repositioned = false;
}

fn show_string(bytes: &[u8], state: &TextState, resources: &PageResources<'_>) -> Shown {
    let text = resources.decode(state.font.as_deref(), bytes);
    let advance = text.chars().count() as f64 * EM_ADVANCE * state.font_size;
    Shown { text, advance }
}

fn show_array(parts: &[Object], state: &TextState, resources: &PageResources<'_>) -> Shown {
    let mut text = String::new();
    let mut advance = 0.0;

    for part in parts {
        match part {
            Object::String(bytes, _) => {
                let piece = show_string(bytes, state, resources);
                text.push_str(&piece.text);
                advance += piece.advance;
            }
            other => {
                if let Some(adjust) = number(other) {
                    // Positive adjustments move left, negative ones open a gap.
                    advance -= adjust / 1000.0 * state.font_size;
                    if -adjust > TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }
    }

    Shown { text, advance }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

/// Decodes a PDF string without font information: UTF-16BE when it carries a
/// BOM, UTF-8 when valid, Latin-1 otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, StringFormat};

    use super::*;
    use crate::extraction::lines::LineReconstructor;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn s(text: &str) -> Object {
        Object::string_literal(text)
    }

    fn int(n: i64) -> Object {
        Object::Integer(n)
    }

    fn origin(item: &RawTextItem) -> (f64, f64) {
        item.origin.expect("placed item")
    }

    #[test]
    fn test_td_positions_item() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), int(10)]),
            op("Td", vec![int(72), int(700)]),
            op("Tj", vec![s("Experience")]),
            op("ET", vec![]),
        ];
        let items = text_items(&ops, &PageResources::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Experience");
        assert_eq!(origin(&items[0]), (72.0, 700.0));
        // 10 chars * 0.5 em * 10pt
        assert_eq!(items[0].width, Some(50.0));
    }

    #[test]
    fn test_consecutive_show_ops_extend_previous_item() {
        let ops = vec![
            op("BT", vec![]),
            op("Td", vec![int(10), int(500)]),
            op("Tj", vec![s("Soft")]),
            op("Tj", vec![s("ware")]),
            op("ET", vec![]),
        ];
        let items = text_items(&ops, &PageResources::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Software");
    }

    #[test]
    fn test_repositioning_starts_new_item() {
        let ops = vec![
            op("BT", vec![]),
            op("Td", vec![int(10), int(500)]),
            op("Tj", vec![s("Name")]),
            op("Td", vec![int(0), int(-20)]),
            op("Tj", vec![s("Email")]),
            op("ET", vec![]),
        ];
        let items = text_items(&ops, &PageResources::default());
        assert_eq!(items.len(), 2);
        assert_eq!(origin(&items[1]), (10.0, 480.0));
    }

    #[test]
    fn test_tm_sets_absolute_position() {
        let ops = vec![
            op("BT", vec![]),
            op("Tm", vec![int(1), int(0), int(0), int(1), int(300), int(400)]),
            op("Tj", vec![s("Skills")]),
            op("ET", vec![]),
        ];
        assert_eq!(origin(&text_items(&ops, &PageResources::default())[0]), (300.0, 400.0));
    }

    #[test]
    fn test_t_star_uses_leading() {
        let ops = vec![
            op("BT", vec![]),
            op("TL", vec![int(14)]),
            op("Td", vec![int(50), int(600)]),
            op("Tj", vec![s("line one")]),
            op("T*", vec![]),
            op("Tj", vec![s("line two")]),
            op("ET", vec![]),
        ];
        let items = text_items(&ops, &PageResources::default());
        assert_eq!(items.len(), 2);
        assert_eq!(origin(&items[1]), (50.0, 586.0));
    }

    #[test]
    fn test_td_capital_sets_leading() {
        let ops = vec![
            op("BT", vec![]),
            op("TD", vec![int(20), int(-15)]),
            op("Tj", vec![s("a")]),
            op("'", vec![s("b")]),
            op("ET", vec![]),
        ];
        let items = text_items(&ops, &PageResources::default());
        assert_eq!(origin(&items[0]), (20.0, -15.0));
        assert_eq!(origin(&items[1]), (20.0, -30.0));
        assert_eq!(items[1].text, "b");
    }

    #[test]
    fn test_tj_array_large_gap_inserts_space() {
        let ops = vec![
            op("BT", vec![]),
            op(
                "TJ",
                vec![Object::Array(vec![s("Senior"), int(-300), s("Engineer"), int(-20), s("s")])],
            ),
            op("ET", vec![]),
        ];
        assert_eq!(text_items(&ops, &PageResources::default())[0].text, "Senior Engineers");
    }

    #[test]
    fn test_cm_translates_device_position() {
        let ops = vec![
            op("q", vec![]),
            op("cm", vec![int(1), int(0), int(0), int(1), int(100), int(50)]),
            op("BT", vec![]),
            op("Td", vec![int(10), int(10)]),
            op("Tj", vec![s("moved")]),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Td", vec![int(10), int(10)]),
            op("Tj", vec![s("restored")]),
            op("ET", vec![]),
        ];
        let items = text_items(&ops, &PageResources::default());
        assert_eq!(origin(&items[0]), (110.0, 60.0));
        assert_eq!(origin(&items[1]), (10.0, 10.0));
    }

    fn page_with_fonts(doc: &mut Document, fonts: Dictionary) -> ObjectId {
        doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => dictionary! { "Font" => fonts },
        })
    }

    fn to_unicode_font(doc: &mut Document, subtype: &str, encoding: Option<&str>) -> ObjectId {
        let cmap_id = doc.add_object(Stream::new(dictionary! {}, GLYPH_CMAP.as_bytes().to_vec()));
        let mut font = dictionary! {
            "Type" => "Font",
            "Subtype" => subtype,
            "BaseFont" => "Embedded",
            "ToUnicode" => cmap_id,
        };
        if let Some(encoding) = encoding {
            font.set("Encoding", Object::Name(encoding.as_bytes().to_vec()));
        }
        doc.add_object(font)
    }

    const GLYPH_CMAP: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
3 beginbfchar
<0024> <004A>
<0025> <006F>
<0026> <0068>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

    fn hex(bytes: &[u8]) -> Object {
        Object::String(bytes.to_vec(), StringFormat::Hexadecimal)
    }

    fn show_with_font(font: &str, shown: Object) -> Vec<Operation> {
        vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(font.as_bytes().to_vec()), int(10)]),
            op("Td", vec![int(72), int(700)]),
            op("Tj", vec![shown]),
            op("ET", vec![]),
        ]
    }

    #[test]
    fn test_composite_font_decodes_through_to_unicode() {
        let mut doc = Document::with_version("1.5");
        let font_id = to_unicode_font(&mut doc, "Type0", Some("Identity-H"));
        let page_id = page_with_fonts(&mut doc, dictionary! { "F1" => font_id });

        let resources = PageResources::for_page(&doc, page_id);
        let items = text_items(
            &show_with_font("F1", hex(&[0x00, 0x24, 0x00, 0x25, 0x00, 0x26])),
            &resources,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Joh");
        assert_eq!(origin(&items[0]), (72.0, 700.0));
    }

    #[test]
    fn test_composite_font_without_map_yields_no_text() {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Embedded",
            "Encoding" => "Identity-H",
        });
        let page_id = page_with_fonts(&mut doc, dictionary! { "F1" => font_id });

        let resources = PageResources::for_page(&doc, page_id);
        let items = text_items(&show_with_font("F1", hex(&[0x00, 0x24, 0x00, 0x25])), &resources);
        assert!(items.iter().all(|i| i.text.trim().is_empty()));
        assert_eq!(LineReconstructor::default().page_text(&items), "");
    }

    #[test]
    fn test_simple_font_with_to_unicode_maps_single_bytes() {
        let mut doc = Document::with_version("1.5");
        let font_id = to_unicode_font(&mut doc, "TrueType", None);
        let page_id = page_with_fonts(&mut doc, dictionary! { "F1" => font_id });

        let resources = PageResources::for_page(&doc, page_id);
        let items = text_items(&show_with_font("F1", hex(&[0x24, 0x25, 0x26, 0x21])), &resources);
        // 0x21 has no mapping and passes through as itself.
        assert_eq!(items[0].text, "Joh!");
    }

    #[test]
    fn test_win_ansi_font_decodes_curly_quote() {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let page_id = page_with_fonts(&mut doc, dictionary! { "F1" => font_id });

        let resources = PageResources::for_page(&doc, page_id);
        let shown = Object::String(vec![b'O', 0x92, b'N', b'e', b'i', b'l'], StringFormat::Literal);
        let items = text_items(&show_with_font("F1", shown), &resources);
        assert_eq!(items[0].text, "O\u{2019}Neil");
    }

    #[test]
    fn test_unknown_font_name_falls_back_to_plain_decoding() {
        let mut doc = Document::with_version("1.5");
        let page_id = page_with_fonts(&mut doc, dictionary! {});
        let resources = PageResources::for_page(&doc, page_id);
        let items = text_items(&show_with_font("Missing", s("Plain")), &resources);
        assert_eq!(items[0].text, "Plain");
    }

    fn form_stream(matrix: Option<Vec<Object>>, operations: Vec<Operation>) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![int(0), int(0), int(612), int(792)],
        };
        if let Some(matrix) = matrix {
            dict.set("Matrix", matrix);
        }
        Stream::new(dict, Content { operations }.encode().unwrap())
    }

    fn text_at(text: &str, x: i64, y: i64) -> Vec<Operation> {
        vec![
            op("BT", vec![]),
            op("Td", vec![int(x), int(y)]),
            op("Tj", vec![s(text)]),
            op("ET", vec![]),
        ]
    }

    #[test]
    fn test_form_xobject_text_is_extracted_under_its_matrix() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.add_object(form_stream(
            Some(vec![int(1), int(0), int(0), int(1), int(0), int(100)]),
            text_at("Header in a form", 72, 600),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => dictionary! { "XObject" => dictionary! { "Fm0" => form_id } },
        });

        let ops = vec![
            op("q", vec![]),
            op("cm", vec![int(1), int(0), int(0), int(1), int(10), int(0)]),
            op("Do", vec![Object::Name(b"Fm0".to_vec())]),
            op("Q", vec![]),
        ];
        let resources = PageResources::for_page(&doc, page_id);
        let items = text_items(&ops, &resources);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Header in a form");
        // form matrix (+100 y) then page cm (+10 x)
        assert_eq!(origin(&items[0]), (82.0, 700.0));
    }

    #[test]
    fn test_form_state_does_not_leak_into_page() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.add_object(form_stream(
            None,
            vec![op("cm", vec![int(1), int(0), int(0), int(1), int(500), int(500)])]
                .into_iter()
                .chain(text_at("inside", 0, 0))
                .collect(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => dictionary! { "XObject" => dictionary! { "Fm0" => form_id } },
        });

        let mut ops = vec![op("Do", vec![Object::Name(b"Fm0".to_vec())])];
        ops.extend(text_at("after", 10, 10));
        let resources = PageResources::for_page(&doc, page_id);
        let items = text_items(&ops, &resources);
        assert_eq!(items.len(), 2);
        assert_eq!(origin(&items[0]), (500.0, 500.0));
        assert_eq!(origin(&items[1]), (10.0, 10.0));
    }

    #[test]
    fn test_self_referencing_form_stops_at_depth_limit() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.new_object_id();
        let resources_dict = dictionary! { "XObject" => dictionary! { "Loop" => form_id } };
        let mut operations = text_at("again", 0, 0);
        operations.push(op("Do", vec![Object::Name(b"Loop".to_vec())]));
        let mut stream = form_stream(None, operations);
        stream.dict.set("Resources", resources_dict.clone());
        doc.objects.insert(form_id, Object::Stream(stream));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => resources_dict,
        });

        let ops = vec![op("Do", vec![Object::Name(b"Loop".to_vec())])];
        let resources = PageResources::for_page(&doc, page_id);
        let items = text_items(&ops, &resources);
        assert_eq!(items.len(), MAX_FORM_DEPTH);
    }

    #[test]
    fn test_do_without_resources_draws_nothing() {
        let ops = vec![op("Do", vec![Object::Name(b"Im1".to_vec())])];
        assert!(text_items(&ops, &PageResources::default()).is_empty());
    }

    #[test]
    fn test_utf16_strings_are_decoded() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x52, 0x00, 0x75, 0x00, 0x73, 0x00, 0x74];
        assert_eq!(decode_pdf_string(&bytes), "Rust");
    }

    #[test]
    fn test_latin1_fallback() {
        assert_eq!(decode_pdf_string(&[0x43, 0x61, 0x66, 0xE9]), "Caf\u{00E9}");
    }

    #[test]
    fn test_non_text_operators_are_ignored() {
        let ops = vec![
            op("re", vec![int(0), int(0), int(10), int(10)]),
            op("f", vec![]),
        ];
        assert!(text_items(&ops, &PageResources::default()).is_empty());
    }
}
