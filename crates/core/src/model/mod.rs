//! Core data model: object values, interpreter state, draw commands.

pub mod commands;
pub mod objects;
pub mod state;

pub use commands::{ExtractedImage, ImageCommand, ParsedData, PathCommand, TextCommand};
pub use objects::{ObjRef, PdfObject};
pub use state::{ColorState, GraphicsState, MATRIX_IDENTITY, Matrix, PathState, TextState};
