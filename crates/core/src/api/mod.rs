//! Public streaming API: page selection, the event stream and the
//! document seam.

pub mod selection;
pub mod stream;

pub use selection::{PageSelection, ResolvedSelection};
pub use stream::{CancelToken, EventStream, STREAM_QUEUE_CAPACITY, stream_events};

use crate::document::{Catalog, Page, PdfDocument};
use crate::error::Result;
use crate::model::commands::ParsedData;
use crate::model::objects::{ObjRef, PdfObject};

/// Narrow seam over a parsed document.
///
/// Only one concrete backend exists; the trait is the substitution point
/// for consumers that want a test double in place of real file parsing.
pub trait ContentSource {
    fn catalog(&self) -> Result<Catalog>;
    fn object(&self, r: ObjRef) -> Result<PdfObject>;
    fn page_count(&self) -> usize;
    fn page_by_number(&self, page_num: usize) -> Result<&Page>;
    fn stream_page_contents(
        &self,
        selection: &PageSelection,
        cancel: &CancelToken,
        emit: &mut dyn FnMut(ParsedData) -> bool,
    ) -> Result<()>;
    fn close(&mut self);
}

impl ContentSource for PdfDocument {
    fn catalog(&self) -> Result<Catalog> {
        PdfDocument::catalog(self)
    }

    fn object(&self, r: ObjRef) -> Result<PdfObject> {
        PdfDocument::object(self, r)
    }

    fn page_count(&self) -> usize {
        PdfDocument::page_count(self)
    }

    fn page_by_number(&self, page_num: usize) -> Result<&Page> {
        PdfDocument::page_by_number(self, page_num)
    }

    fn stream_page_contents(
        &self,
        selection: &PageSelection,
        cancel: &CancelToken,
        emit: &mut dyn FnMut(ParsedData) -> bool,
    ) -> Result<()> {
        PdfDocument::stream_page_contents(self, selection, cancel, emit)
    }

    fn close(&mut self) {
        PdfDocument::close(self)
    }
}
