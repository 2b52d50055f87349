//! Recursive-descent parser for the PDF object grammar.
//!
//! Covers dictionaries, arrays, names, literal/hex strings, numbers,
//! booleans, null and indirect references. Encryption and object streams
//! are out of scope.

use crate::error::{PdfError, Result};
use crate::model::objects::{ObjRef, PdfObject};
use std::collections::HashMap;

/// PDF delimiter characters; these and whitespace terminate bare tokens.
const DELIMITERS: &[u8] = b"()<>[]{}/%";

const fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

/// A byte cursor over one indirect object's body.
pub struct ObjectParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ObjectParser<'a> {
    /// Create a parser positioned at the start of a PDF value.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset within the input.
    pub const fn pos(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Parse exactly one PDF value starting at the cursor.
    ///
    /// Consumes exactly the bytes of that value; fails with a syntax error
    /// on an unexpected character or an unterminated construct.
    pub fn parse_value(&mut self) -> Result<PdfObject> {
        self.skip_whitespace();
        let start = self.pos;
        let b = self
            .peek()
            .ok_or_else(|| PdfError::syntax(start, "unexpected end of input"))?;

        match b {
            b'<' => {
                if self.data.get(self.pos + 1) == Some(&b'<') {
                    self.pos += 2;
                    self.parse_dict()
                } else {
                    self.pos += 1;
                    self.parse_hex_string()
                }
            }
            b'(' => {
                self.pos += 1;
                self.parse_literal_string()
            }
            b'/' => {
                self.pos += 1;
                Ok(PdfObject::Name(self.read_bare_token()))
            }
            b'[' => {
                self.pos += 1;
                self.parse_array()
            }
            b'0'..=b'9' | b'-' | b'+' | b'.' => self.parse_number_or_ref(),
            _ => self.parse_keyword(),
        }
    }

    fn parse_dict(&mut self) -> Result<PdfObject> {
        let mut dict = HashMap::new();
        loop {
            self.skip_whitespace();
            let pos = self.pos;
            match self.bump() {
                Some(b'>') => {
                    if self.bump() == Some(b'>') {
                        return Ok(PdfObject::Dict(dict));
                    }
                    return Err(PdfError::syntax(pos, "expected '>>' to close dictionary"));
                }
                Some(b'/') => {
                    let key = self.read_bare_token();
                    let value = self.parse_value()?;
                    dict.insert(key, value);
                }
                Some(c) => {
                    return Err(PdfError::syntax(
                        pos,
                        format!("invalid dictionary key start: '{}'", c as char),
                    ));
                }
                None => return Err(PdfError::syntax(pos, "unterminated dictionary")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<PdfObject> {
        let mut arr = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(PdfObject::Array(arr));
                }
                Some(_) => arr.push(self.parse_value()?),
                None => return Err(PdfError::syntax(self.pos, "unterminated array")),
            }
        }
    }

    /// Literal string: backslash takes the next character verbatim; nested
    /// parentheses are balanced. No octal/special-escape table in scope.
    fn parse_literal_string(&mut self) -> Result<PdfObject> {
        let start = self.pos;
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let b = self
                .bump()
                .ok_or_else(|| PdfError::syntax(start, "unterminated literal string"))?;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b);
                }
                b'\\' => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| PdfError::syntax(start, "unterminated escape"))?;
                    out.push(escaped);
                }
                _ => out.push(b),
            }
        }
        Ok(PdfObject::String(String::from_utf8_lossy(&out).into_owned()))
    }

    /// Hex string: raw hex digits up to the matching '>'.
    fn parse_hex_string(&mut self) -> Result<PdfObject> {
        let start = self.pos;
        let mut out = Vec::new();
        loop {
            let b = self
                .bump()
                .ok_or_else(|| PdfError::syntax(start, "unterminated hex string"))?;
            if b == b'>' {
                break;
            }
            out.push(b);
        }
        Ok(PdfObject::String(String::from_utf8_lossy(&out).into_owned()))
    }

    fn read_bare_token(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_delimiter(b) || is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.data[start..self.pos]).into_owned()
    }

    /// Parse a number; an integer followed by a second integer and the
    /// keyword `R` folds into an indirect reference. The lookahead rewinds
    /// the cursor when the pattern does not match.
    fn parse_number_or_ref(&mut self) -> Result<PdfObject> {
        let start = self.pos;
        let token = self.read_bare_token();
        let first = parse_number(&token, start)?;

        let PdfObject::Int(objnum) = first else {
            return Ok(first);
        };
        if objnum < 0 {
            return Ok(first);
        }

        let rewind = self.pos;
        self.skip_whitespace();
        if !matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos = rewind;
            return Ok(first);
        }
        let second = self.read_bare_token();
        let Ok(gennum) = second.parse::<u32>() else {
            self.pos = rewind;
            return Ok(first);
        };

        self.skip_whitespace();
        if self.peek() == Some(b'R') {
            let after_r = self.data.get(self.pos + 1).copied();
            if after_r.is_none_or(|b| is_delimiter(b) || is_whitespace(b)) {
                self.pos += 1;
                return Ok(PdfObject::Ref(ObjRef::new(objnum as u32, gennum)));
            }
        }
        self.pos = rewind;
        Ok(first)
    }

    fn parse_keyword(&mut self) -> Result<PdfObject> {
        let start = self.pos;
        let token = self.read_bare_token();
        if token.is_empty() {
            let b = self.peek().unwrap_or(b'?');
            return Err(PdfError::syntax(
                start,
                format!("unexpected character '{}'", b as char),
            ));
        }
        Ok(match token.as_str() {
            "null" => PdfObject::Null,
            "true" => PdfObject::Bool(true),
            "false" => PdfObject::Bool(false),
            _ => PdfObject::Keyword(token),
        })
    }
}

fn parse_number(token: &str, pos: usize) -> Result<PdfObject> {
    if token.contains('.') {
        token
            .parse::<f64>()
            .map(PdfObject::Real)
            .map_err(|_| PdfError::syntax(pos, format!("invalid real number: {token}")))
    } else {
        token
            .parse::<i64>()
            .map(PdfObject::Int)
            .map_err(|_| PdfError::syntax(pos, format!("invalid integer: {token}")))
    }
}

/// Parse an indirect object body, which must be a dictionary.
///
/// Used for the trailer and for every object the document navigator and
/// stream extractor touch.
pub fn parse_object_dict(body: &str) -> Result<PdfObject> {
    let trimmed = body.trim();
    if !trimmed.starts_with("<<") {
        return Err(PdfError::Structure(
            "object body is not a dictionary".into(),
        ));
    }
    let mut parser = ObjectParser::new(trimmed.as_bytes());
    parser.parse_value()
}
