//! Stream extraction: content streams, embedded font programs and image
//! XObjects.

use crate::document::catalog::PdfDocument;
use crate::error::{PdfError, Result};
use crate::model::commands::ExtractedImage;
use crate::model::objects::{ObjRef, PdfObject};
use crate::parser::xref::read_line;
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use std::io::Read;

/// How many bytes past an object's offset the `stream` keyword is searched
/// for. Bounds the scan so a corrupt /Length cannot walk the whole file.
const STREAM_SCAN_WINDOW: usize = 64 * 1024;

impl PdfDocument {
    /// Extract a stream object's data, decoded if it is FlateDecode.
    ///
    /// The byte count comes from the stream dictionary's /Length; a stream
    /// truncated by the end of the file yields the bytes that are present.
    pub fn extract_stream(&self, r: ObjRef) -> Result<Bytes> {
        let dict = self.object(r)?;
        let raw = self.raw_stream_data(r, &dict)?;
        if stream_filter(&dict) == Some("FlateDecode") {
            return inflate(&raw).map_err(|e| {
                PdfError::Decode(format!("stream {}: {}", r, e))
            });
        }
        Ok(raw)
    }

    /// Extract an embedded TrueType font program.
    ///
    /// FontFile2 streams are flate-compressed with /Length1 recording the
    /// uncompressed program size; decoders may emit trailing bytes beyond
    /// it, so the output is truncated to /Length1 when present.
    pub fn extract_font_program(&self, r: ObjRef) -> Result<Bytes> {
        let dict = self.object(r)?;
        let raw = self.raw_stream_data(r, &dict)?;
        let mut data = if stream_filter(&dict) == Some("FlateDecode") {
            inflate(&raw)
                .map_err(|e| PdfError::Decode(format!("font stream {}: {}", r, e)))?
        } else {
            raw
        };
        if let Some(len1) = dict.find("Length1").and_then(|v| v.as_int().ok()) {
            let len1 = len1.max(0) as usize;
            if len1 < data.len() {
                data.truncate(len1);
            }
        }
        Ok(data)
    }

    /// Extract an image XObject: compressed bytes as-is, soft mask if any,
    /// intrinsic pixel size and a file extension inferred from the filter.
    pub fn extract_image(&self, r: ObjRef) -> Result<ExtractedImage> {
        let dict = self.object(r)?;
        let data = self.raw_stream_data(r, &dict)?;

        let ext = match stream_filter(&dict) {
            Some("DCTDecode") => "jpg",
            _ => "png",
        };
        let width = dict
            .find("Width")
            .ok_or_else(|| PdfError::Structure(format!("image {} has no /Width", r)))?
            .as_num()?;
        let height = dict
            .find("Height")
            .ok_or_else(|| PdfError::Structure(format!("image {} has no /Height", r)))?
            .as_num()?;

        // The soft mask travels as raw stream bytes next to the image data.
        let mask_data = match dict.find_ref("SMask") {
            Some(mask_ref) => {
                let mask_dict = self.object(mask_ref)?;
                self.raw_stream_data(mask_ref, &mask_dict)?
            }
            None => Bytes::new(),
        };

        Ok(ExtractedImage {
            data,
            mask_data,
            width,
            height,
            ext: ext.to_string(),
        })
    }

    /// Locate the `stream` keyword after the object's dictionary and slice
    /// out exactly /Length bytes of data.
    fn raw_stream_data(&self, r: ObjRef, dict: &PdfObject) -> Result<Bytes> {
        let length = dict
            .find("Length")
            .ok_or_else(|| PdfError::Structure(format!("stream {} has no /Length", r)))?
            .as_int()?;
        if length < 0 {
            return Err(PdfError::Structure(format!(
                "stream {} has negative /Length {}",
                r, length
            )));
        }
        let length = length as usize;

        let entry = self.xref_entry(r)?;
        let scan_end = (entry.offset + STREAM_SCAN_WINDOW).min(self.data.len());
        let mut pos = entry.offset;
        let data_start = loop {
            if pos >= scan_end {
                return Err(PdfError::Structure(format!(
                    "stream keyword not found for {}",
                    r
                )));
            }
            let (line, next) = read_line(&self.data, pos);
            if line.trim_end().ends_with("stream") && !line.contains("endstream") {
                break next;
            }
            pos = next;
        };

        let data_end = (data_start + length).min(self.data.len());
        Ok(Bytes::copy_from_slice(&self.data[data_start..data_end]))
    }
}

/// The stream's /Filter name, when it is a single name.
fn stream_filter(dict: &PdfObject) -> Option<&str> {
    dict.find("Filter").and_then(|f| f.as_name().ok())
}

fn inflate(data: &[u8]) -> std::io::Result<Bytes> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(Bytes::from(out))
}
