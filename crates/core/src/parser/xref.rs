//! Cross-reference table and trailer resolution.
//!
//! Supports classic single-section xref tables only. Cross-reference
//! streams and incremental updates fail fast with a structure error naming
//! the missing feature.

use crate::error::{PdfError, Result};
use crate::model::objects::{ObjRef, PdfObject};
use crate::parser::object::parse_object_dict;
use rustc_hash::FxHashMap;

/// How far from the end of the file `startxref` is searched for.
const STARTXREF_WINDOW: usize = 256;

/// One in-use entry of the cross-reference table.
///
/// Built once per document open, immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    pub objnum: u32,
    pub gennum: u32,
    pub offset: usize,
}

/// Object-number -> entry index plus the parsed trailer.
#[derive(Debug)]
pub struct XrefSection {
    pub entries: FxHashMap<u32, XrefEntry>,
    pub trailer: PdfObject,
    /// The trailer's /Root reference, validated against the entry map.
    pub root: ObjRef,
}

/// Scan the final bytes of the file for the `startxref` token and return
/// the byte offset it announces.
pub fn locate_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(STARTXREF_WINDOW);
    let tail = &data[tail_start..];

    let key = b"startxref";
    let found = tail
        .windows(key.len())
        .rposition(|w| w == key)
        .ok_or_else(|| PdfError::Structure("startxref not found".into()))?;

    let mut pos = found + key.len();
    while pos < tail.len() && tail[pos].is_ascii_whitespace() {
        pos += 1;
    }
    let digits_start = pos;
    while pos < tail.len() && tail[pos].is_ascii_digit() {
        pos += 1;
    }
    let offset: usize = std::str::from_utf8(&tail[digits_start..pos])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PdfError::Structure("startxref offset is not an integer".into()))?;

    if offset >= data.len() {
        return Err(PdfError::Structure(format!(
            "startxref offset {} beyond end of file ({} bytes)",
            offset,
            data.len()
        )));
    }
    Ok(offset)
}

/// Parse the xref section at `offset` and the trailer dictionary that
/// follows it.
pub fn parse_xref_section(data: &[u8], offset: usize) -> Result<XrefSection> {
    let mut cursor = offset;

    let (line, next) = read_line(data, cursor);
    cursor = next;
    if line.trim() != "xref" {
        return Err(PdfError::Structure(format!(
            "expected 'xref' at offset {offset}; cross-reference streams are not supported"
        )));
    }

    let (header, next) = read_line(data, cursor);
    cursor = next;
    let mut parts = header.split_whitespace();
    let start_num: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PdfError::Structure("xref subsection header malformed".into()))?;
    let count: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PdfError::Structure("xref subsection header malformed".into()))?;
    if parts.next().is_some() {
        return Err(PdfError::Structure("xref subsection header malformed".into()));
    }

    let mut entries = FxHashMap::default();
    let mut saw_trailer = false;
    for i in 0..count {
        let (line, next) = read_line(data, cursor);
        cursor = next;
        let line = line.trim();
        if line == "trailer" {
            // Short section; the trailer line updates the effective count.
            saw_trailer = true;
            break;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(PdfError::Structure(format!(
                "xref entry {} malformed: '{}'",
                start_num + i,
                line
            )));
        }
        let entry_offset: usize = fields[0]
            .parse()
            .map_err(|_| PdfError::Structure(format!("xref entry {} offset invalid", start_num + i)))?;
        let gennum: u32 = fields[1]
            .parse()
            .map_err(|_| PdfError::Structure(format!("xref entry {} generation invalid", start_num + i)))?;
        if fields[2] == "n" {
            let objnum = start_num + i;
            entries.insert(
                objnum,
                XrefEntry {
                    objnum,
                    gennum,
                    offset: entry_offset,
                },
            );
        }
    }

    // Capture the raw trailer dictionary: everything after the `trailer`
    // keyword up to and including the next '>>'.
    let mut raw_trailer = String::new();
    loop {
        if cursor >= data.len() {
            return Err(PdfError::Structure("trailer dictionary not found".into()));
        }
        let (line, next) = read_line(data, cursor);
        cursor = next;
        if line.contains("trailer") {
            saw_trailer = true;
            continue;
        }
        if !saw_trailer {
            continue;
        }
        raw_trailer.push_str(&line);
        raw_trailer.push('\n');
        if line.contains(">>") {
            break;
        }
    }

    let trailer = parse_object_dict(&raw_trailer)?;
    if trailer.find("Prev").is_some() {
        return Err(PdfError::Structure(
            "incrementally updated documents (trailer /Prev) are not supported".into(),
        ));
    }
    let root = trailer
        .find_ref("Root")
        .ok_or_else(|| PdfError::Structure("trailer has no /Root reference".into()))?;
    if !entries.contains_key(&root.objnum) {
        return Err(PdfError::Structure(format!(
            "trailer /Root {} not present in xref table",
            root
        )));
    }

    Ok(XrefSection {
        entries,
        trailer,
        root,
    })
}

/// Read one text line starting at `pos`; returns the line (without its
/// terminator) and the position after the terminator. Handles LF, CRLF
/// and lone CR.
pub(crate) fn read_line(data: &[u8], pos: usize) -> (String, usize) {
    if pos >= data.len() {
        return (String::new(), data.len());
    }
    let mut end = pos;
    while end < data.len() && data[end] != b'\n' && data[end] != b'\r' {
        end += 1;
    }
    let line = String::from_utf8_lossy(&data[pos..end]).into_owned();
    let mut next = end;
    if next < data.len() && data[next] == b'\r' {
        next += 1;
    }
    if next < data.len() && data[next] == b'\n' {
        next += 1;
    }
    (line, next)
}
