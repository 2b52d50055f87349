//! Binary chunk protocol.
//!
//! Each chunk is a type byte, a big-endian u32 JSON length, the JSON
//! metadata, then any binary payloads (image data + mask, font program)
//! immediately after the JSON. The writer flushes after every chunk so a
//! consumer renders incrementally.

use crate::error::{PdfError, Result};
use crate::model::commands::ParsedData;
use byteorder::{BigEndian, WriteBytesExt};
use serde::Serialize;
use std::io::Write;

pub const DATA_TYPE_PAGE: u8 = 0x00;
pub const DATA_TYPE_TEXT: u8 = 0x01;
pub const DATA_TYPE_IMAGE: u8 = 0x02;
pub const DATA_TYPE_FONT: u8 = 0x03;
pub const DATA_TYPE_PATH: u8 = 0x04;
pub const DATA_TYPE_ERROR: u8 = 0xFF;

#[derive(Serialize)]
struct PageMeta {
    width: f64,
    height: f64,
    page: i64,
}

#[derive(Serialize)]
struct TextMeta<'a> {
    x: f64,
    y: f64,
    z: i64,
    text: &'a str,
    #[serde(rename = "fontID")]
    font_id: &'a str,
    #[serde(rename = "fontSize")]
    font_size: f64,
    page: i64,
    color: &'a str,
}

#[derive(Serialize)]
struct ImageMeta<'a> {
    x: f64,
    y: f64,
    z: i64,
    width: f64,
    height: f64,
    dw: f64,
    dh: f64,
    length: i64,
    #[serde(rename = "maskLength")]
    mask_length: i64,
    page: i64,
    ext: &'a str,
}

#[derive(Serialize)]
struct FontMeta<'a> {
    #[serde(rename = "fontID")]
    font_id: &'a str,
    length: i64,
}

#[derive(Serialize)]
struct PathMeta<'a> {
    x: f64,
    y: f64,
    z: i64,
    width: f64,
    height: f64,
    page: i64,
    path: &'a str,
    #[serde(rename = "fillColor")]
    fill_color: &'a str,
    #[serde(rename = "strokeColor")]
    stroke_color: &'a str,
}

#[derive(Serialize)]
struct ErrorMeta<'a> {
    message: &'a str,
}

/// Encodes draw events as protocol chunks onto any writer.
pub struct ChunkWriter<W: Write> {
    sink: W,
}

impl<W: Write> ChunkWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Encode one event as a chunk and flush it.
    pub fn send(&mut self, event: &ParsedData) -> Result<()> {
        match event {
            ParsedData::Page {
                width,
                height,
                page,
            } => self.write_chunk(
                DATA_TYPE_PAGE,
                &PageMeta {
                    width: *width,
                    height: *height,
                    page: *page,
                },
                &[],
            ),
            ParsedData::Text {
                x,
                y,
                z,
                text,
                font_id,
                font_size,
                color,
                page,
            } => self.write_chunk(
                DATA_TYPE_TEXT,
                &TextMeta {
                    x: *x,
                    y: *y,
                    z: *z,
                    text,
                    font_id,
                    font_size: *font_size,
                    color,
                    page: *page,
                },
                &[],
            ),
            ParsedData::Image {
                x,
                y,
                z,
                width,
                height,
                dw,
                dh,
                data,
                mask_data,
                ext,
                clip_path: _,
                page,
            } => self.write_chunk(
                DATA_TYPE_IMAGE,
                &ImageMeta {
                    x: *x,
                    y: *y,
                    z: *z,
                    width: *width,
                    height: *height,
                    dw: *dw,
                    dh: *dh,
                    length: data.len() as i64,
                    mask_length: mask_data.len() as i64,
                    page: *page,
                    ext,
                },
                &[data, mask_data],
            ),
            ParsedData::Font { font_id, data } => self.write_chunk(
                DATA_TYPE_FONT,
                &FontMeta {
                    font_id,
                    length: data.len() as i64,
                },
                &[data],
            ),
            ParsedData::Path {
                x,
                y,
                z,
                width,
                height,
                path,
                fill_color,
                stroke_color,
                page,
            } => self.write_chunk(
                DATA_TYPE_PATH,
                &PathMeta {
                    x: *x,
                    y: *y,
                    z: *z,
                    width: *width,
                    height: *height,
                    page: *page,
                    path,
                    fill_color,
                    stroke_color,
                },
                &[],
            ),
        }
    }

    /// Report a stream-level failure to the consumer as an error chunk.
    pub fn send_error(&mut self, message: &str) -> Result<()> {
        self.write_chunk(DATA_TYPE_ERROR, &ErrorMeta { message }, &[])
    }

    fn write_chunk(
        &mut self,
        data_type: u8,
        meta: &impl Serialize,
        payloads: &[&[u8]],
    ) -> Result<()> {
        let json = serde_json::to_vec(meta)
            .map_err(|e| PdfError::Decode(format!("chunk metadata: {e}")))?;
        self.sink.write_u8(data_type)?;
        self.sink.write_u32::<BigEndian>(json.len() as u32)?;
        self.sink.write_all(&json)?;
        for payload in payloads {
            self.sink.write_all(payload)?;
        }
        self.sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;

    #[test]
    fn test_page_chunk_layout() {
        let mut w = ChunkWriter::new(Vec::new());
        w.send(&ParsedData::Page {
            width: 612.0,
            height: 792.0,
            page: 1,
        })
        .unwrap();
        let buf = w.into_inner();
        assert_eq!(buf[0], DATA_TYPE_PAGE);
        let json_len = BigEndian::read_u32(&buf[1..5]) as usize;
        assert_eq!(buf.len(), 5 + json_len);
        let json: serde_json::Value = serde_json::from_slice(&buf[5..]).unwrap();
        assert_eq!(json["width"], 612.0);
        assert_eq!(json["page"], 1);
    }

    #[test]
    fn test_image_payloads_follow_json() {
        let mut w = ChunkWriter::new(Vec::new());
        w.send(&ParsedData::Image {
            x: 0.0,
            y: 0.0,
            z: 2,
            width: 4.0,
            height: 4.0,
            dw: 100.0,
            dh: 100.0,
            data: bytes::Bytes::from_static(b"IMG"),
            mask_data: bytes::Bytes::from_static(b"MK"),
            ext: "jpg".to_string(),
            clip_path: String::new(),
            page: 1,
        })
        .unwrap();
        let buf = w.into_inner();
        assert_eq!(buf[0], DATA_TYPE_IMAGE);
        let json_len = BigEndian::read_u32(&buf[1..5]) as usize;
        let json: serde_json::Value = serde_json::from_slice(&buf[5..5 + json_len]).unwrap();
        assert_eq!(json["length"], 3);
        assert_eq!(json["maskLength"], 2);
        assert_eq!(json["ext"], "jpg");
        assert_eq!(&buf[5 + json_len..], b"IMGMK");
    }

    #[test]
    fn test_text_metadata_field_names() {
        let mut w = ChunkWriter::new(Vec::new());
        w.send(&ParsedData::Text {
            x: 10.0,
            y: 20.0,
            z: 0,
            text: "Hi".to_string(),
            font_id: "F1".to_string(),
            font_size: 12.0,
            color: "#000000".to_string(),
            page: 3,
        })
        .unwrap();
        let buf = w.into_inner();
        assert_eq!(buf[0], DATA_TYPE_TEXT);
        let json: serde_json::Value = serde_json::from_slice(&buf[5..]).unwrap();
        assert_eq!(json["fontID"], "F1");
        assert_eq!(json["fontSize"], 12.0);
        assert_eq!(json["page"], 3);
    }

    #[test]
    fn test_error_chunk_type_byte() {
        let mut w = ChunkWriter::new(Vec::new());
        w.send_error("boom").unwrap();
        let buf = w.into_inner();
        assert_eq!(buf[0], DATA_TYPE_ERROR);
        let json: serde_json::Value = serde_json::from_slice(&buf[5..]).unwrap();
        assert_eq!(json["message"], "boom");
    }
}
