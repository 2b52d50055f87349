//! Document access: the page-tree navigator and the stream extractor.

mod catalog;
mod stream;

pub use catalog::{Catalog, Page, PdfDocument};
