//! Per-page font resolution: walks a page's /Font resources and builds the
//! byte-to-glyph tables the interpreter decodes show strings with.

use crate::document::PdfDocument;
use crate::error::{PdfError, Result};
use crate::font::cmap::parse_bfranges;
use crate::model::objects::ObjRef;
use rustc_hash::FxHashMap;
use tracing::debug;

/// A resolved simple font.
#[derive(Debug, Clone)]
pub struct Font {
    /// Resource name the content stream selects the font by (`/F1` -> "F1").
    pub font_id: String,
    /// FontFile2 stream holding the embedded TrueType program, if any.
    pub program_ref: Option<ObjRef>,
    /// Single-byte code to glyph string, from the ToUnicode CMap.
    pub byte_to_unicode: FxHashMap<u8, String>,
}

/// Resolve every font declared in a page's resource dictionary.
///
/// Only simple TrueType fonts are handled; composite (Type0) and other
/// subtypes are skipped with a diagnostic. A missing /Font subdictionary
/// means the page declares no fonts.
pub fn resolve_fonts(doc: &PdfDocument, resources_ref: ObjRef) -> Result<Vec<Font>> {
    let resources = doc.object(resources_ref)?;
    let Some(font_dict) = resources.find("Font") else {
        return Ok(Vec::new());
    };
    let font_dict = font_dict.as_dict()?;

    let mut fonts = Vec::new();
    for (name, value) in font_dict {
        let font_ref = value.as_objref().map_err(|_| {
            PdfError::Structure(format!("font resource /{name} is not a reference"))
        })?;
        let font_obj = doc.object(font_ref)?;

        let subtype = font_obj
            .find("Subtype")
            .and_then(|s| s.as_name().ok())
            .unwrap_or("")
            .to_string();
        if subtype != "TrueType" {
            debug!(font = %name, %subtype, "skipping non-TrueType font");
            continue;
        }

        let first_char = font_obj
            .find("FirstChar")
            .and_then(|v| v.as_int().ok())
            .unwrap_or(0)
            .clamp(0, 255) as u8;

        let byte_to_unicode = match font_obj.find_ref("ToUnicode") {
            Some(cmap_ref) => {
                let cmap_data = doc.extract_stream(cmap_ref)?;
                let cmap_text = String::from_utf8_lossy(&cmap_data);
                parse_bfranges(&cmap_text, first_char)?
            }
            None => FxHashMap::default(),
        };

        let program_ref = font_obj
            .find_ref("FontDescriptor")
            .map(|descr_ref| doc.object(descr_ref))
            .transpose()?
            .and_then(|descr| descr.find_ref("FontFile2"));

        fonts.push(Font {
            font_id: name.clone(),
            program_ref,
            byte_to_unicode,
        });
    }
    Ok(fonts)
}

/// Map a page's /XObject resource names to their stream references.
pub fn resolve_xobjects(
    doc: &PdfDocument,
    resources_ref: ObjRef,
) -> Result<FxHashMap<String, ObjRef>> {
    let resources = doc.object(resources_ref)?;
    let mut map = FxHashMap::default();
    if let Some(xobjects) = resources.find("XObject") {
        for (name, value) in xobjects.as_dict()? {
            if let Ok(r) = value.as_objref() {
                map.insert(name.clone(), r);
            }
        }
    }
    Ok(map)
}
