//! Positioned text runs decoded from page content streams with `lopdf`.
//!
//! Walks the text operators of every page (`BT`/`ET`, `Tf`, `Td`, `TD`,
//! `Tm`, `T*`, `TL`, `Tc`, `Tw`, `Tz`, `Tj`, `TJ`, `'`, `"`) together with the
//! graphics state (`q`, `Q`, `cm`) and emits one [`PositionedTextRun`] per
//! text-showing operator, in page coordinates.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;

use crate::error::CvtextError;
use crate::extraction::{PageRuns, RunSource};
use crate::model::{PositionedTextRun, CHAR_WIDTH_FACTOR};

/// A `TJ` adjustment larger than this (thousandths of an em, leftwards)
/// is treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Guard against malformed `Parent` cycles when looking up inherited resources.
const MAX_PARENT_DEPTH: usize = 32;

/// Largest `bfrange` expanded from a ToUnicode CMap.
const MAX_BFRANGE_SPAN: u32 = 0xFFFF;

/// Run source backed by lopdf's object model.
#[derive(Debug, Default)]
pub struct LopdfRunSource;

impl LopdfRunSource {
    pub fn new() -> Self {
        LopdfRunSource
    }
}

impl RunSource for LopdfRunSource {
    fn page_runs(&self, pdf_bytes: &[u8]) -> Result<PageRuns, CvtextError> {
        let doc = Document::load_mem(pdf_bytes)?;

        let mut pages = Vec::new();
        for (page_number, page_id) in doc.get_pages() {
            match decode_page(&doc, page_id) {
                Ok(runs) => pages.push(runs),
                Err(e) => {
                    // One bad page must not lose the rest of the document
                    warn!(page = page_number, error = %e, "skipping undecodable page");
                    pages.push(Vec::new());
                }
            }
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [oa, ob, oc, od, oe, of] = other.0;
        Matrix([
            a * oa + b * oc,
            a * ob + b * od,
            c * oa + d * oc,
            c * ob + d * od,
            e * oa + f * oc + oe,
            e * ob + f * od + of,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    /// Length of the transformed unit y-vector.
    fn vertical_scale(&self) -> f32 {
        (self.0[2] * self.0[2] + self.0[3] * self.0[3]).sqrt()
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
        }
    }
}

struct PageDecoder<'a> {
    fonts: &'a HashMap<Vec<u8>, FontInfo>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    state: TextState,
    runs: Vec<PositionedTextRun>,
}

fn decode_page(doc: &Document, page_id: ObjectId) -> Result<Vec<PositionedTextRun>, CvtextError> {
    let fonts = page_fonts(doc, page_id);
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;

    let mut decoder = PageDecoder {
        fonts: &fonts,
        ctm: Matrix::IDENTITY,
        ctm_stack: Vec::new(),
        text_matrix: Matrix::IDENTITY,
        line_matrix: Matrix::IDENTITY,
        state: TextState::default(),
        runs: Vec::new(),
    };

    for op in &content.operations {
        decoder.apply(&op.operator, &op.operands);
    }

    Ok(decoder.runs)
}

impl PageDecoder<'_> {
    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(m) = self.ctm_stack.pop() {
                    self.ctm = m;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.ctm = m.then(&self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.state.font = name.to_vec();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.state.font_size = size;
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(number) {
                    self.state.leading = l;
                }
            }
            "Tc" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.horizontal_scale = v / 100.0;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if operator == "TD" {
                    self.state.leading = -ty;
                }
                self.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    let text = self.decode(bytes);
                    self.show(text, 0.0);
                }
            }
            "'" => {
                self.next_line();
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    let text = self.decode(bytes);
                    self.show(text, 0.0);
                }
            }
            "\"" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.word_spacing = v;
                }
                if let Some(v) = operands.get(1).and_then(number) {
                    self.state.char_spacing = v;
                }
                self.next_line();
                if let Some(bytes) = operands.get(2).and_then(string_bytes) {
                    let text = self.decode(bytes);
                    self.show(text, 0.0);
                }
            }
            "TJ" => {
                if let Some(Ok(items)) = operands.first().map(|o| o.as_array()) {
                    self.show_array(items);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.state.leading != 0.0 {
            self.state.leading
        } else {
            // Producers that never set TL still expect a line feed
            self.state.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        decode_string(bytes, self.fonts.get(&self.state.font))
    }

    /// `TJ`: strings interleaved with kerning adjustments, emitted as one run.
    fn show_array(&mut self, items: &[Object]) {
        let mut text = String::new();
        let mut adjustment = 0.0;

        for item in items {
            if let Some(bytes) = string_bytes(item) {
                text.push_str(&self.decode(bytes));
            } else if let Some(n) = number(item) {
                if -n > TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
                adjustment += -n / 1000.0 * self.state.font_size;
            }
        }

        self.show(text, adjustment);
    }

    /// Record a run at the current text position and advance past it.
    fn show(&mut self, text: String, extra_advance: f32) {
        let rendering = self.text_matrix.then(&self.ctm);
        let (x, y) = rendering.origin();
        let scale = rendering.vertical_scale();
        let font_size = if scale > 0.0 {
            self.state.font_size * scale
        } else {
            self.state.font_size
        };

        let glyphs = text.chars().count() as f32;
        let spaces = text.chars().filter(|c| *c == ' ').count() as f32;
        let advance = (glyphs * self.state.font_size * CHAR_WIDTH_FACTOR
            + glyphs * self.state.char_spacing
            + spaces * self.state.word_spacing
            + extra_advance)
            * self.state.horizontal_scale;
        self.text_matrix = Matrix::translation(advance, 0.0).then(&self.text_matrix);

        if text.is_empty() {
            return;
        }

        self.runs.push(PositionedTextRun {
            x,
            y,
            content: text,
            font_size: font_size.abs(),
            font_name: String::from_utf8_lossy(&self.state.font).into_owned(),
        });
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(Matrix(m))
}

// ---------------------------------------------------------------------------
// Fonts and string decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct FontInfo {
    /// Composite (Type0) fonts use two-byte codes.
    two_byte: bool,
    to_unicode: Option<ToUnicodeMap>,
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Find the page's resource dictionary, following `Parent` inheritance.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(res) = node.get(b"Resources") {
            return resolve(doc, res).as_dict().ok();
        }
        node = resolve(doc, node.get(b"Parent").ok()?).as_dict().ok()?;
    }
    None
}

fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, FontInfo> {
    let mut fonts = HashMap::new();

    let Some(font_dict) = page_resources(doc, page_id)
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|f| resolve(doc, f).as_dict().ok())
    else {
        return fonts;
    };

    for (name, obj) in font_dict.iter() {
        let Ok(font) = resolve(doc, obj).as_dict() else {
            continue;
        };

        let two_byte = font
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name().ok())
            .is_some_and(|s| s == b"Type0");

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|t| resolve(doc, t).as_stream().ok())
            .map(|s| s.decompressed_content().unwrap_or_else(|_| s.content.clone()))
            .map(|data| ToUnicodeMap::parse(&data))
            .filter(|m| !m.is_empty());

        fonts.insert(name.clone(), FontInfo { two_byte, to_unicode });
    }

    fonts
}

fn decode_string(bytes: &[u8], font: Option<&FontInfo>) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        return decode_utf16be(&bytes[2..]);
    }

    let two_byte = font.is_some_and(|f| f.two_byte);
    if let Some(map) = font.and_then(|f| f.to_unicode.as_ref()) {
        let width = if two_byte { 2 } else { map.code_len };
        return map.decode(bytes, width);
    }

    if two_byte {
        // No ToUnicode: many producers still use Unicode code points as CIDs
        return decode_utf16be(bytes);
    }

    bytes.iter().map(|&b| win_ansi_char(b)).collect()
}

fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Single-byte codes as WinAnsiEncoding (Latin-1 plus the 0x80–0x9F block).
fn win_ansi_char(b: u8) -> char {
    match b {
        0x80 => '€',
        0x85 => '…',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x99 => '™',
        _ => b as char,
    }
}

/// Code-to-text mapping parsed from a ToUnicode CMap stream.
#[derive(Debug, Clone, Default)]
struct ToUnicodeMap {
    map: HashMap<u32, String>,
    /// Byte length of source codes, taken from the CMap entries.
    code_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

impl ToUnicodeMap {
    fn parse(data: &[u8]) -> ToUnicodeMap {
        let tokens = tokenize_cmap(data);
        let mut result = ToUnicodeMap {
            map: HashMap::new(),
            code_len: 1,
        };

        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                CMapToken::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(src)), Some(CMapToken::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        result.insert(src, decode_utf16be(dst));
                        i += 2;
                    }
                }
                CMapToken::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(lo)), Some(CMapToken::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let (lo_code, hi_code) = (code_value(lo), code_value(hi));
                        let span = hi_code.saturating_sub(lo_code).min(MAX_BFRANGE_SPAN);
                        match tokens.get(i + 2) {
                            Some(CMapToken::Hex(dst)) => {
                                for offset in 0..=span {
                                    let text = offset_utf16(dst, offset);
                                    result.insert_code(lo_code + offset, lo.len(), text);
                                }
                                i += 3;
                            }
                            Some(CMapToken::ArrayStart) => {
                                let mut j = i + 3;
                                let mut offset = 0;
                                while let Some(CMapToken::Hex(dst)) = tokens.get(j) {
                                    if offset <= span {
                                        result.insert_code(
                                            lo_code + offset,
                                            lo.len(),
                                            decode_utf16be(dst),
                                        );
                                    }
                                    offset += 1;
                                    j += 1;
                                }
                                // Skip the closing bracket
                                i = j + 1;
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        result
    }

    fn insert(&mut self, src: &[u8], text: String) {
        self.insert_code(code_value(src), src.len(), text);
    }

    fn insert_code(&mut self, code: u32, len: usize, text: String) {
        self.code_len = self.code_len.max(len.clamp(1, 2));
        self.map.insert(code, text);
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn decode(&self, bytes: &[u8], width: usize) -> String {
        let mut out = String::new();
        for chunk in bytes.chunks(width.max(1)) {
            let code = code_value(chunk);
            match self.map.get(&code) {
                Some(text) => out.push_str(text),
                // Unmapped single-byte ASCII is usually literal text
                None if width == 1 && (chunk[0].is_ascii_graphic() || chunk[0] == b' ') => {
                    out.push(chunk[0] as char)
                }
                None => {}
            }
        }
        out
    }
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Destination string of a `bfrange` entry with its last UTF-16 unit
/// incremented by `offset`.
fn offset_utf16(dst: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = dst
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}

fn tokenize_cmap(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let b = data[i];
        match b {
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&c| c == b'>')
                    .map_or(data.len(), |p| start + p);
                let hex: Vec<u8> = data[start..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                tokens.push(CMapToken::Hex(hex_bytes(&hex)));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CMapToken::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                tokens.push(CMapToken::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

fn hex_bytes(hex: &[u8]) -> Vec<u8> {
    let nibble = |c: u8| match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => c - b'A' + 10,
    };
    hex.chunks(2)
        .map(|pair| {
            let hi = nibble(pair[0]);
            let lo = pair.get(1).map_or(0, |&c| nibble(c));
            (hi << 4) | lo
        })
        .collect()
}
