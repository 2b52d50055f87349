//! pdtp-core - PDF content extraction and chunked streaming.
//!
//! Parses classic cross-reference PDFs, interprets page content streams
//! into positioned text/path/image events, and encodes them as binary
//! chunks for progressive delivery. Pages stream nearest-to-the-base
//! first; image payloads and repaired font programs follow the text.

pub mod api;
pub mod document;
pub mod error;
pub mod font;
pub mod interp;
pub mod model;
pub mod parser;
pub mod wire;

pub use api::selection::PageSelection;
pub use api::stream::{CancelToken, EventStream, stream_events};
pub use api::ContentSource;
pub use document::PdfDocument;
pub use error::{PdfError, Result};
pub use model::commands::ParsedData;
pub use wire::ChunkWriter;
