//! Draw commands produced by the content-stream interpreter and the typed
//! event stream consumed by the wire encoder.

use bytes::Bytes;

/// A positioned glyph run, in device space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub x: f64,
    pub y: f64,
    pub z: i64,
    /// Per-byte decoded glyph strings; unmapped bytes carry an empty string.
    pub text: Vec<String>,
    pub font_id: String,
    /// Effective font size after CTM/Tm vertical scaling.
    pub font_size: f64,
    pub color: String,
}

/// A painted path, in device space.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCommand {
    pub x: f64,
    pub y: f64,
    pub z: i64,
    pub width: f64,
    pub height: f64,
    pub path: String,
    pub stroke_color: String,
    pub fill_color: String,
}

/// An XObject placement discovered by `Do`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCommand {
    pub x: f64,
    pub y: f64,
    pub z: i64,
    /// Display width/height from the CTM scale terms
    pub dw: f64,
    pub dh: f64,
    /// XObject resource name with the leading slash stripped
    pub image_id: String,
    /// Pending clip path inherited from the path state
    pub clip_path: String,
}

/// Raw image bytes pulled out of an XObject stream.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub data: Bytes,
    pub mask_data: Bytes,
    /// Intrinsic pixel dimensions from the image dictionary
    pub width: f64,
    pub height: f64,
    /// "jpg" for DCTDecode streams, "png" otherwise
    pub ext: String,
}

/// Typed draw events emitted by the streaming orchestrator.
///
/// Produced in a well-defined order (page, then inline text/path events,
/// then deferred images, then fonts) and consumed exactly once.
#[derive(Debug, Clone)]
pub enum ParsedData {
    Page {
        width: f64,
        height: f64,
        page: i64,
    },
    Text {
        x: f64,
        y: f64,
        z: i64,
        text: String,
        font_id: String,
        font_size: f64,
        color: String,
        page: i64,
    },
    Path {
        x: f64,
        y: f64,
        z: i64,
        width: f64,
        height: f64,
        path: String,
        fill_color: String,
        stroke_color: String,
        page: i64,
    },
    Image {
        x: f64,
        y: f64,
        z: i64,
        width: f64,
        height: f64,
        dw: f64,
        dh: f64,
        data: Bytes,
        mask_data: Bytes,
        ext: String,
        clip_path: String,
        page: i64,
    },
    Font {
        font_id: String,
        data: Bytes,
    },
}
