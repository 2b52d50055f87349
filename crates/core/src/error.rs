//! Error types for the pdtp PDF streaming library.

use thiserror::Error;

/// Primary error type for PDF parsing and streaming operations.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Malformed object grammar token.
    #[error("PDF syntax error at offset {pos}: {msg}")]
    Syntax { pos: usize, msg: String },

    /// Missing required key/reference, xref/trailer not found or
    /// inconsistent, or an unsupported document feature.
    #[error("PDF structure error: {0}")]
    Structure(String),

    /// Stream decompression failure.
    #[error("decode error: {0}")]
    Decode(String),

    /// Seek/read failure on the underlying file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid page selection bounds.
    #[error("invalid page selection: {0}")]
    Range(String),

    /// Object value had an unexpected type.
    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },
}

impl PdfError {
    /// Shorthand for a syntax error at a byte offset.
    pub fn syntax(pos: usize, msg: impl Into<String>) -> Self {
        Self::Syntax {
            pos,
            msg: msg.into(),
        }
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
