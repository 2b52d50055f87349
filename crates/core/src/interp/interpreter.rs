//! Content-stream interpreter.
//!
//! Replays the operator stream against graphics/text/color/path state and
//! collects positioned draw commands. Output coordinates come straight from
//! the text/transform matrices; path geometry is flipped into a top-left
//! origin using the page height. Malformed pieces degrade to diagnostics,
//! never to a page failure.
//!
//! Operands stay raw bytes throughout: show strings index the font's
//! byte-to-glyph table, so a byte above 0x7f is a glyph code, not text.

use crate::error::{PdfError, Result};
use crate::font::Font;
use crate::interp::tokenizer::{Token, TokenKind, tokenize};
use crate::model::commands::{ImageCommand, PathCommand, TextCommand};
use crate::model::state::{
    ColorState, GraphicsState, Matrix, PathState, TextState, components_to_hex,
};
use rustc_hash::FxHashMap;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Draw commands collected from one content stream.
#[derive(Debug, Default)]
pub struct PageContent {
    pub texts: Vec<TextCommand>,
    pub images: Vec<ImageCommand>,
    pub paths: Vec<PathCommand>,
}

/// Interprets content streams against a page's resolved fonts.
pub struct ContentInterpreter<'a> {
    fonts: &'a FxHashMap<String, Font>,
    page_height: f64,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(fonts: &'a FxHashMap<String, Font>, page_height: f64) -> Self {
        Self { fonts, page_height }
    }

    /// Tokenize and replay a decoded content stream.
    pub fn run(&self, content: &[u8]) -> PageContent {
        let tokens = tokenize(content);
        let mut run = Run {
            fonts: self.fonts,
            page_height: self.page_height,
            gs_stack: vec![GraphicsState::new()],
            text: TextState::new(),
            path: PathState::default(),
            color: ColorState::default(),
            operands: Vec::new(),
            z: 0,
            out: PageContent::default(),
        };
        for token in tokens {
            match token.kind {
                TokenKind::Operand => run.operands.push(token.value),
                TokenKind::Operator => run.apply(&token),
            }
        }
        run.out
    }
}

struct Run<'a> {
    fonts: &'a FxHashMap<String, Font>,
    page_height: f64,
    gs_stack: Vec<GraphicsState>,
    text: TextState,
    path: PathState,
    color: ColorState,
    operands: Vec<Vec<u8>>,
    z: i64,
    out: PageContent,
}

impl Run<'_> {
    fn apply(&mut self, token: &Token) {
        match token.value.as_slice() {
            b"q" => {
                let top = self.ctm();
                self.gs_stack.push(GraphicsState { ctm: top });
                self.operands.clear();
            }
            b"Q" => {
                if self.gs_stack.len() > 1 {
                    self.gs_stack.pop();
                }
                self.operands.clear();
            }
            b"cm" => {
                if let Some(ops) = self.take(6, "cm") {
                    let m = matrix_from(&ops);
                    let top = self.ctm();
                    self.set_ctm(top.mul(&m));
                }
            }
            b"BT" => {
                self.text = TextState::new();
                self.operands.clear();
            }
            b"ET" => self.operands.clear(),
            b"Tf" => {
                if let Some(ops) = self.take(2, "Tf") {
                    self.text.font = name_operand(&ops[0]);
                    self.text.font_size = parse_float(&ops[1]);
                }
            }
            b"Tc" => {
                if let Some(ops) = self.take(1, "Tc") {
                    self.text.char_spacing = parse_float(&ops[0]);
                }
            }
            b"Tw" => {
                if let Some(ops) = self.take(1, "Tw") {
                    self.text.word_spacing = parse_float(&ops[0]);
                }
            }
            b"Tz" => {
                if let Some(ops) = self.take(1, "Tz") {
                    self.text.horizontal_scaling = parse_float(&ops[0]);
                }
            }
            b"TL" => {
                if let Some(ops) = self.take(1, "TL") {
                    self.text.leading = parse_float(&ops[0]);
                }
            }
            b"Tm" => {
                if let Some(ops) = self.take(6, "Tm") {
                    self.text.tm = matrix_from(&ops);
                    self.text.tlm = self.text.tm;
                }
            }
            b"Td" => {
                if let Some(ops) = self.take(2, "Td") {
                    let (tx, ty) = (parse_float(&ops[0]), parse_float(&ops[1]));
                    self.text.tm = self.text.tlm.mul(&Matrix::translation(tx, ty));
                    self.text.tlm = self.text.tm;
                }
            }
            b"TD" => {
                if let Some(ops) = self.take(2, "TD") {
                    let (tx, ty) = (parse_float(&ops[0]), parse_float(&ops[1]));
                    self.text.leading = -ty;
                    self.text.tm = self.text.tlm.mul(&Matrix::translation(tx, ty));
                    self.text.tlm = self.text.tm;
                }
            }
            b"T*" => {
                self.text.next_line();
                self.operands.clear();
            }
            b"'" => {
                if let Some(ops) = self.take(1, "'") {
                    self.text.next_line();
                    self.show_string(&ops[0]);
                }
            }
            b"\"" => {
                if let Some(ops) = self.take(3, "\"") {
                    self.text.word_spacing = parse_float(&ops[0]);
                    self.text.char_spacing = parse_float(&ops[1]);
                    self.text.next_line();
                    self.show_string(&ops[2]);
                }
            }
            b"Tj" => {
                if let Some(ops) = self.take(1, "Tj") {
                    self.show_string(&ops[0]);
                }
            }
            b"TJ" => {
                if let Some(ops) = self.take(1, "TJ") {
                    self.show_array(&ops[0]);
                }
            }
            b"Do" => {
                if let Some(ops) = self.take(1, "Do") {
                    let ctm = self.ctm();
                    let (x, y) = ctm.translation_xy();
                    self.out.images.push(ImageCommand {
                        x,
                        y,
                        z: self.z,
                        dw: ctm.0[0][0],
                        dh: ctm.0[1][1],
                        image_id: name_operand(&ops[0]),
                        clip_path: std::mem::take(&mut self.path.path),
                    });
                    self.z += 1;
                }
            }
            b"m" => {
                if let Some(ops) = self.take(2, "m") {
                    let (x, y) = (parse_float(&ops[0]), parse_float(&ops[1]));
                    let _ = write!(self.path.path, "M {:.6} {:.6} ", x, self.page_height - y);
                    self.path.x = x;
                    self.path.y = y;
                }
            }
            b"l" => {
                if let Some(ops) = self.take(2, "l") {
                    let (x, y) = (parse_float(&ops[0]), parse_float(&ops[1]));
                    let _ = write!(self.path.path, "L {:.6} {:.6} ", x, self.page_height - y);
                }
            }
            b"c" => {
                if let Some(ops) = self.take(6, "c") {
                    let v: Vec<f64> = ops.iter().map(|s| parse_float(s)).collect();
                    let h = self.page_height;
                    let _ = write!(
                        self.path.path,
                        "C {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} ",
                        v[0],
                        h - v[1],
                        v[2],
                        h - v[3],
                        v[4],
                        h - v[5]
                    );
                }
            }
            b"h" => {
                self.path.path.push('Z');
                self.operands.clear();
            }
            b"re" => {
                if let Some(ops) = self.take(4, "re") {
                    let v: Vec<f64> = ops.iter().map(|s| parse_float(s)).collect();
                    let (x, y, w, h) = (v[0], v[1], v[2], v[3]);
                    let fy = self.page_height - y;
                    let _ = write!(
                        self.path.path,
                        "M {x:.6} {fy:.6} L {:.6} {fy:.6} L {:.6} {:.6} L {x:.6} {:.6} Z ",
                        x + w,
                        x + w,
                        fy + h,
                        fy + h
                    );
                }
            }
            b"f" | b"f*" | b"S" => {
                self.out.paths.push(PathCommand {
                    x: self.path.x,
                    y: self.path.y,
                    z: self.z,
                    width: 0.0,
                    height: 0.0,
                    path: std::mem::take(&mut self.path.path),
                    stroke_color: self.color.stroke_color.clone(),
                    fill_color: self.color.fill_color.clone(),
                });
                self.z += 1;
                self.operands.clear();
            }
            b"sc" | b"scn" => {
                let components: Vec<f64> = self.operands.iter().map(|s| parse_float(s)).collect();
                self.color.fill_color = components_to_hex(&components);
                self.operands.clear();
            }
            b"SC" | b"SCN" => {
                let components: Vec<f64> = self.operands.iter().map(|s| parse_float(s)).collect();
                self.color.stroke_color = components_to_hex(&components);
                self.operands.clear();
            }
            // Acknowledged but not modelled; operands are consumed.
            b"w" | b"gs" | b"cs" | b"CS" | b"ri" | b"M" | b"Tr" | b"Ts" => {
                let op = String::from_utf8_lossy(&token.value).into_owned();
                let _ = self.take(1, &op);
            }
            b"W" | b"n" => self.operands.clear(),
            other => {
                debug!(operator = %String::from_utf8_lossy(other), "unknown content operator");
                self.operands.clear();
            }
        }
    }

    fn ctm(&self) -> Matrix {
        match self.gs_stack.last() {
            Some(gs) => gs.ctm,
            None => Matrix::default(),
        }
    }

    fn set_ctm(&mut self, m: Matrix) {
        if let Some(gs) = self.gs_stack.last_mut() {
            gs.ctm = m;
        }
    }

    /// Pop `n` operands from the front of the pending stack, or report the
    /// shortfall and leave the stack untouched.
    fn take(&mut self, n: usize, op: &str) -> Option<Vec<Vec<u8>>> {
        if self.operands.len() < n {
            warn!(operator = op, have = self.operands.len(), need = n, "missing operands");
            return None;
        }
        Some(self.operands.drain(..n).collect())
    }

    fn font_table(&self) -> Option<&FxHashMap<u8, String>> {
        self.fonts.get(&self.text.font).map(|f| &f.byte_to_unicode)
    }

    /// Emit one Text command for a `( ... )` show string at the current
    /// text-rendering position.
    fn show_string(&mut self, raw: &[u8]) {
        let glyphs = decode_show_string(raw, self.font_table());
        self.emit_text(glyphs);
    }

    /// TJ: kerning adjustments move the text matrix between fragments; a
    /// single Text command carries all fragments at the final position.
    fn show_array(&mut self, raw: &[u8]) {
        let items = match parse_show_array(raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "malformed TJ array");
                return;
            }
        };
        let mut glyphs = Vec::new();
        for item in items {
            match item {
                TjItem::Literal(s) => {
                    glyphs.extend(decode_show_string(&s, self.font_table()));
                }
                TjItem::Glyphs(g) => glyphs.extend(g),
                TjItem::Kern(n) => {
                    let tx = -n / 1000.0
                        * self.text.font_size
                        * (self.text.horizontal_scaling / 100.0);
                    self.text.tm = self.text.tm.mul(&Matrix::translation(tx, 0.0));
                }
            }
        }
        self.emit_text(glyphs);
    }

    fn emit_text(&mut self, glyphs: Vec<String>) {
        let trm = self.text.tm.mul(&self.ctm());
        let (x, y) = trm.translation_xy();
        self.out.texts.push(TextCommand {
            x,
            y,
            z: self.z,
            text: glyphs,
            font_id: self.text.font.clone(),
            font_size: self.text.font_size * trm.scale_y(),
            color: self.color.fill_color.clone(),
        });
        self.z += 1;
    }
}

fn matrix_from(ops: &[Vec<u8>]) -> Matrix {
    Matrix::from_operands(
        parse_float(&ops[0]),
        parse_float(&ops[1]),
        parse_float(&ops[2]),
        parse_float(&ops[3]),
        parse_float(&ops[4]),
        parse_float(&ops[5]),
    )
}

/// Numeric operand; a junk operand becomes 0 with a diagnostic rather than
/// aborting the page.
fn parse_float(s: &[u8]) -> f64 {
    let s = String::from_utf8_lossy(s);
    match s.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(operand = %s, "not a number, using 0");
            0.0
        }
    }
}

/// A `/Name` operand with the leading slash stripped.
fn name_operand(s: &[u8]) -> String {
    String::from_utf8_lossy(s)
        .trim_start_matches('/')
        .to_string()
}

/// Decode a `( ... )` show string byte-by-byte through the font's glyph
/// table. A backslash escapes the next byte; unmapped bytes map to empty
/// strings so positions stay aligned.
fn decode_show_string(pdf_string: &[u8], table: Option<&FxHashMap<u8, String>>) -> Vec<String> {
    if pdf_string.len() < 2 {
        return Vec::new();
    }
    let inner = &pdf_string[1..pdf_string.len() - 1];

    let mut out = Vec::new();
    let mut escape = false;
    for &b in inner {
        if !escape && b == b'\\' {
            escape = true;
            continue;
        }
        escape = false;
        let glyph = table.and_then(|t| t.get(&b)).cloned().unwrap_or_default();
        out.push(glyph);
    }
    out
}

enum TjItem {
    /// A `( ... )` string, still raw; decoded through the font table.
    Literal(Vec<u8>),
    /// Glyphs from a hex string, one per 4-hex-digit codepoint.
    Glyphs(Vec<String>),
    /// A kerning adjustment in thousandths of text space.
    Kern(f64),
}

fn parse_show_array(raw: &[u8]) -> Result<Vec<TjItem>> {
    let trimmed = raw.trim_ascii();
    let inner = trimmed
        .strip_prefix(b"[")
        .and_then(|s| s.strip_suffix(b"]"))
        .ok_or_else(|| {
            PdfError::Decode(format!("not an array: '{}'", String::from_utf8_lossy(trimmed)))
        })?;

    let mut items = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for &c in inner {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }
        if in_string {
            current.push(c);
            if c == b'\\' {
                escape_next = true;
            } else if c == b')' {
                in_string = false;
                items.push(TjItem::Literal(std::mem::take(&mut current)));
            }
            continue;
        }
        match c {
            b'(' => {
                in_string = true;
                current.push(c);
            }
            b' ' | b'\t' | b'\r' | b'\n' => {
                if !current.is_empty() {
                    items.push(classify_tj_token(&std::mem::take(&mut current))?);
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(classify_tj_token(&current)?);
    }
    Ok(items)
}

/// Hex strings and kern numbers are plain ASCII; anything else in an array
/// slot is malformed.
fn classify_tj_token(token: &[u8]) -> Result<TjItem> {
    let token = std::str::from_utf8(token).map_err(|_| {
        PdfError::Decode(format!(
            "bad array element '{}'",
            String::from_utf8_lossy(token)
        ))
    })?;
    if token.starts_with('<') || token.ends_with('>') {
        let hex: String = token.chars().filter(|c| *c != '<' && *c != '>').collect();
        let mut glyphs = Vec::new();
        let digits: Vec<char> = hex.chars().collect();
        for group in digits.chunks(4) {
            let group: String = group.iter().collect();
            let code = u32::from_str_radix(&group, 16)
                .map_err(|_| PdfError::Decode(format!("bad hex group '{group}'")))?;
            let glyph = char::from_u32(code)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string();
            glyphs.push(glyph);
        }
        return Ok(TjItem::Glyphs(glyphs));
    }
    token
        .parse::<f64>()
        .map(TjItem::Kern)
        .map_err(|_| PdfError::Decode(format!("bad array element '{token}'")))
}
