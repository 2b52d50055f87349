//! ToUnicode CMap parsing, limited to `bfrange` blocks.

use crate::error::{PdfError, Result};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

static BFRANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\d+\s+beginbfrange\s+(.*?)\s+endbfrange")
        .unwrap_or_else(|e| unreachable!("bfrange pattern: {e}"))
});

/// Expand every bfrange block of a CMap into a byte-to-glyph table.
///
/// Keys are assigned sequentially starting from the font's /FirstChar: the
/// n-th expanded mapping across all ranges maps code `first_char + n`.
/// Values are the Unicode scalar at the range's destination plus the
/// offset within the range.
pub fn parse_bfranges(cmap: &str, first_char: u8) -> Result<FxHashMap<u8, String>> {
    let mut table = FxHashMap::default();
    let mut code = first_char as u32;

    for cap in BFRANGE_RE.captures_iter(cmap) {
        let body = match cap.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let inner = line.trim_start_matches('<').trim_end_matches('>');
            let parts: Vec<&str> = inner.split("><").collect();
            if parts.len() != 3 {
                return Err(PdfError::Decode(format!(
                    "bfrange line malformed: '{line}'"
                )));
            }
            let start = parse_hex(parts[0], line)?;
            let end = parse_hex(parts[1], line)?;
            let dest = parse_hex(parts[2], line)?;
            if end < start {
                return Err(PdfError::Decode(format!(
                    "bfrange line inverted: '{line}'"
                )));
            }
            for i in 0..=(end - start) {
                let glyph = char::from_u32(dest + i)
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
                    .to_string();
                table.insert(code as u8, glyph);
                code += 1;
            }
        }
    }
    Ok(table)
}

fn parse_hex(field: &str, line: &str) -> Result<u32> {
    u32::from_str_radix(field.trim(), 16)
        .map_err(|_| PdfError::Decode(format!("bfrange hex field '{field}' in '{line}'")))
}
