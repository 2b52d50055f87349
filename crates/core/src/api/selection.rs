//! Page-selection header parsing and the base-out visitation order.

use crate::error::{PdfError, Result};

/// A requested page range, before clamping against a concrete document.
///
/// Parsed from a `start=N;end=N;base=N` header field. `base` is the page
/// the viewer is looking at; pages nearest to it stream first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageSelection {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub base: Option<i64>,
}

impl PageSelection {
    /// Parse the selection header. An empty field selects the whole
    /// document; unknown keys and malformed pairs are request errors.
    pub fn parse(field: &str) -> Result<Self> {
        let mut sel = Self::default();
        let field = field.trim().trim_end_matches(';');
        if field.is_empty() {
            return Ok(sel);
        }
        for pair in field.split(';') {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| PdfError::Range(format!("malformed selection pair '{pair}'")))?;
            let value: i64 = value.trim().parse().map_err(|_| {
                PdfError::Range(format!("selection value '{}' is not an integer", value.trim()))
            })?;
            match key.trim() {
                "start" => sel.start = Some(value),
                "end" => sel.end = Some(value),
                "base" => sel.base = Some(value),
                other => {
                    return Err(PdfError::Range(format!("unknown selection key '{other}'")));
                }
            }
        }
        Ok(sel)
    }

    /// Resolve the selection against a document's page count.
    ///
    /// Out-of-bounds endpoints clamp into `1..=page_count` and the base
    /// clamps into the resolved range; an inverted range is an error.
    pub fn resolve(&self, page_count: usize) -> Result<ResolvedSelection> {
        if page_count == 0 {
            return Err(PdfError::Range("document has no pages".into()));
        }
        let count = page_count as i64;
        let start = self.start.unwrap_or(1).clamp(1, count);
        let end = self.end.unwrap_or(count).clamp(1, count);
        if start > end {
            return Err(PdfError::Range(format!(
                "selection start {start} is after end {end}"
            )));
        }
        let base = self.base.unwrap_or(1).clamp(start, end);
        Ok(ResolvedSelection {
            start: start as usize,
            end: end as usize,
            base: base as usize,
        })
    }
}

/// A selection clamped to a concrete document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub start: usize,
    pub end: usize,
    pub base: usize,
}

impl ResolvedSelection {
    /// Pages of the range ordered by distance from the base, nearest
    /// first, with the lower page number breaking ties.
    pub fn visit_order(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = (self.start..=self.end).collect();
        pages.sort_by_key(|&p| (p.abs_diff(self.base), p));
        pages
    }
}
