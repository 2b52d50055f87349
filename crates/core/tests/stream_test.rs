use pdtp_core::api::stream::CancelToken;
use pdtp_core::wire::{
    ChunkWriter, DATA_TYPE_FONT, DATA_TYPE_PAGE, DATA_TYPE_PATH, DATA_TYPE_TEXT,
};
use pdtp_core::{PageSelection, ParsedData, PdfDocument, stream_events};

/// Assemble a PDF from numbered object bodies: object n is `bodies[n-1]`.
fn build_pdf(bodies: &[String]) -> Vec<u8> {
    let bodies: Vec<Vec<u8>> = bodies.iter().map(|b| b.clone().into_bytes()).collect();
    build_pdf_bytes(&bodies)
}

/// Same as `build_pdf` for bodies carrying binary stream payloads.
fn build_pdf_bytes(bodies: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets: Vec<usize> = Vec::new();
    for (i, body) in bodies.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_pos = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", bodies.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF",
            bodies.len() + 1,
            xref_pos
        )
        .as_bytes(),
    );
    out
}

fn stream_obj(dict_extra: &str, content: &str) -> String {
    format!(
        "<< /Length {}{} >>\nstream\n{}\nendstream",
        content.len(),
        dict_extra,
        content
    )
}

fn stream_obj_bytes(dict_extra: &str, content: &[u8]) -> Vec<u8> {
    let mut out =
        format!("<< /Length {}{} >>\nstream\n", content.len(), dict_extra).into_bytes();
    out.extend_from_slice(content);
    out.extend_from_slice(b"\nendstream");
    out
}

/// Three pages sharing one TrueType font whose ToUnicode maps byte 'A' to
/// "a" and 'B' to "b". Page content shows one string each.
fn three_page_pdf() -> Vec<u8> {
    let cmap = "1 beginbfrange\n<0041><0042><0061>\nendbfrange";
    build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 /MediaBox [0 0 300 400] >>"
            .to_string(),
        "<< /Type /Page /Parent 2 0 R /Contents 6 0 R /Resources 9 0 R >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /Contents 7 0 R /Resources 9 0 R >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /Contents 8 0 R /Resources 9 0 R >>".to_string(),
        stream_obj("", "BT /F1 12 Tf 1 0 0 1 10 20 Tm (A) Tj ET"),
        stream_obj("", "BT /F1 12 Tf 1 0 0 1 30 40 Tm (B) Tj ET"),
        stream_obj("", "BT /F1 12 Tf 1 0 0 1 50 60 Tm (AB) Tj ET"),
        "<< /Font << /F1 10 0 R >> >>".to_string(),
        "<< /Type /Font /Subtype /TrueType /FirstChar 65 /ToUnicode 11 0 R >>".to_string(),
        stream_obj("", cmap),
    ])
}

fn collect(data: Vec<u8>, selection: PageSelection) -> Vec<ParsedData> {
    let doc = PdfDocument::open(data).unwrap();
    let mut events = stream_events(doc, selection);
    let collected: Vec<ParsedData> = events.by_ref().collect();
    events.finish().unwrap();
    collected
}

#[test]
fn test_pages_stream_base_out() {
    let events = collect(three_page_pdf(), PageSelection::parse("base=2").unwrap());
    let page_order: Vec<i64> = events
        .iter()
        .filter_map(|e| match e {
            ParsedData::Page { page, .. } => Some(*page),
            _ => None,
        })
        .collect();
    assert_eq!(page_order, vec![2, 1, 3]);
}

#[test]
fn test_page_events_carry_inherited_size() {
    let events = collect(three_page_pdf(), PageSelection::default());
    let Some(ParsedData::Page { width, height, .. }) = events.first() else {
        panic!("first event must be a Page");
    };
    assert_eq!((*width, *height), (300.0, 400.0));
}

#[test]
fn test_text_decoded_through_to_unicode() {
    let events = collect(three_page_pdf(), PageSelection::default());
    let texts: Vec<(i64, String, f64, f64)> = events
        .iter()
        .filter_map(|e| match e {
            ParsedData::Text { page, text, x, y, .. } => {
                Some((*page, text.clone(), *x, *y))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            (1, "a".to_string(), 10.0, 20.0),
            (2, "b".to_string(), 30.0, 40.0),
            (3, "ab".to_string(), 50.0, 60.0),
        ]
    );
}

#[test]
fn test_selection_restricts_pages() {
    let events = collect(
        three_page_pdf(),
        PageSelection::parse("start=2;end=2").unwrap(),
    );
    let pages: Vec<i64> = events
        .iter()
        .filter_map(|e| match e {
            ParsedData::Page { page, .. } => Some(*page),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![2]);
}

#[test]
fn test_missing_xobject_is_skipped_not_fatal() {
    let data = build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 100 100] >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /Contents 4 0 R /Resources 5 0 R >>".to_string(),
        stream_obj("", "q 10 0 0 10 0 0 cm /Im1 Do Q"),
        "<< /Font << >> >>".to_string(),
    ]);
    let events = collect(data, PageSelection::default());
    assert!(events.iter().any(|e| matches!(e, ParsedData::Page { .. })));
    assert!(!events.iter().any(|e| matches!(e, ParsedData::Image { .. })));
}

#[test]
fn test_broken_contents_reference_fails_stream() {
    // Contents points at an object the xref does not know.
    let data = build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 100 100] >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /Contents 99 0 R >>".to_string(),
    ]);
    let doc = PdfDocument::open(data).unwrap();
    let mut events = stream_events(doc, PageSelection::default());
    let collected: Vec<ParsedData> = events.by_ref().collect();
    // The Page event precedes the failure.
    assert!(matches!(collected.first(), Some(ParsedData::Page { .. })));
    assert!(events.finish().is_err());
}

#[test]
fn test_emit_false_stops_walk() {
    let doc = PdfDocument::open(three_page_pdf()).unwrap();
    let cancel = CancelToken::new();
    let mut seen = 0usize;
    let result = doc.stream_page_contents(
        &PageSelection::default(),
        &cancel,
        &mut |_event| {
            seen += 1;
            false
        },
    );
    assert!(result.is_ok());
    assert_eq!(seen, 1);
}

#[test]
fn test_cancel_token_stops_between_pages() {
    let doc = PdfDocument::open(three_page_pdf()).unwrap();
    let cancel = CancelToken::new();
    let mut pages = 0usize;
    let cancel_inner = cancel.clone();
    let result = doc.stream_page_contents(
        &PageSelection::default(),
        &cancel,
        &mut |event| {
            if matches!(event, ParsedData::Page { .. }) {
                pages += 1;
                cancel_inner.cancel();
            }
            true
        },
    );
    assert!(result.is_ok());
    assert_eq!(pages, 1);
}

#[test]
fn test_chunk_stream_round_trip() {
    let doc = PdfDocument::open(three_page_pdf()).unwrap();
    let mut writer = ChunkWriter::new(Vec::new());
    let mut events = stream_events(doc, PageSelection::default());
    for event in events.by_ref() {
        writer.send(&event).unwrap();
    }
    events.finish().unwrap();

    // Walk the chunk framing: type byte + u32 length + JSON + payloads.
    let buf = writer.into_inner();
    let mut pos = 0usize;
    let mut types = Vec::new();
    while pos < buf.len() {
        let ty = buf[pos];
        let json_len =
            u32::from_be_bytes([buf[pos + 1], buf[pos + 2], buf[pos + 3], buf[pos + 4]]) as usize;
        let json: serde_json::Value =
            serde_json::from_slice(&buf[pos + 5..pos + 5 + json_len]).unwrap();
        let mut payload_len = 0usize;
        if ty == DATA_TYPE_FONT {
            payload_len = json["length"].as_i64().unwrap() as usize;
        }
        types.push(ty);
        pos += 5 + json_len + payload_len;
    }
    assert_eq!(pos, buf.len());
    assert_eq!(
        types,
        vec![
            DATA_TYPE_PAGE,
            DATA_TYPE_TEXT,
            DATA_TYPE_PAGE,
            DATA_TYPE_TEXT,
            DATA_TYPE_PAGE,
            DATA_TYPE_TEXT,
        ]
    );
    assert!(!types.contains(&DATA_TYPE_PATH));
}

/// One-table sfnt lacking OS/2, small enough to embed as a FontFile2.
fn sfnt_without_os2() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    data.extend_from_slice(&1u16.to_be_bytes()); // numTables
    data.extend_from_slice(&16u16.to_be_bytes()); // searchRange
    data.extend_from_slice(&0u16.to_be_bytes()); // entrySelector
    data.extend_from_slice(&0u16.to_be_bytes()); // rangeShift
    data.extend_from_slice(b"glyf");
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&28u32.to_be_bytes());
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]);
    data
}

/// One page showing "A" in /F1 and placing /Im1. /F1 embeds a FontFile2
/// padded past /Length1; /F2 shares the descriptor but is never shown.
/// The DCTDecode image carries an /SMask.
fn page_with_assets_pdf() -> Vec<u8> {
    let sfnt = sfnt_without_os2();
    let mut font_file = sfnt.clone();
    font_file.extend_from_slice(b"PAD!");
    let cmap = "1 beginbfrange\n<0041><0041><0061>\nendbfrange";
    build_pdf_bytes(&[
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R /Resources 5 0 R >>".to_vec(),
        stream_obj(
            "",
            "BT /F1 12 Tf 1 0 0 1 10 20 Tm (A) Tj ET q 50 0 0 40 30 60 cm /Im1 Do Q",
        )
        .into_bytes(),
        b"<< /Font << /F1 6 0 R /F2 7 0 R >> /XObject << /Im1 10 0 R >> >>".to_vec(),
        b"<< /Type /Font /Subtype /TrueType /FirstChar 65 /ToUnicode 8 0 R /FontDescriptor 9 0 R >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /TrueType /FontDescriptor 9 0 R >>".to_vec(),
        stream_obj("", cmap).into_bytes(),
        b"<< /FontFile2 11 0 R >>".to_vec(),
        stream_obj_bytes(
            " /Subtype /Image /Width 2 /Height 3 /Filter /DCTDecode /SMask 12 0 R",
            b"JPEGDATA",
        ),
        stream_obj_bytes(&format!(" /Length1 {}", sfnt.len()), &font_file),
        stream_obj_bytes("", b"MASK"),
    ])
}

#[test]
fn test_deferred_assets_follow_page_content() {
    let events = collect(page_with_assets_pdf(), PageSelection::default());
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            ParsedData::Page { .. } => "page",
            ParsedData::Text { .. } => "text",
            ParsedData::Path { .. } => "path",
            ParsedData::Image { .. } => "image",
            ParsedData::Font { .. } => "font",
        })
        .collect();
    assert_eq!(kinds, ["page", "text", "image", "font"]);

    let Some(ParsedData::Text { text, .. }) = events.get(1) else {
        panic!("second event must be Text");
    };
    assert_eq!(text, "a");

    let Some(ParsedData::Image {
        x,
        y,
        width,
        height,
        dw,
        dh,
        data,
        mask_data,
        ext,
        ..
    }) = events.get(2)
    else {
        panic!("third event must be Image");
    };
    assert_eq!((*x, *y), (30.0, 60.0));
    assert_eq!((*width, *height), (2.0, 3.0));
    assert_eq!((*dw, *dh), (50.0, 40.0));
    assert_eq!(&data[..], &b"JPEGDATA"[..]);
    assert_eq!(&mask_data[..], &b"MASK"[..]);
    assert_eq!(ext, "jpg");
}

#[test]
fn test_font_program_repaired_and_unused_font_skipped() {
    let events = collect(page_with_assets_pdf(), PageSelection::default());
    let fonts: Vec<(String, Vec<u8>)> = events
        .iter()
        .filter_map(|e| match e {
            ParsedData::Font { font_id, data } => Some((font_id.clone(), data.to_vec())),
            _ => None,
        })
        .collect();
    // Only the shown font's program streams; /F2 is declared but unused.
    assert_eq!(fonts.len(), 1);
    let (font_id, data) = &fonts[0];
    assert_eq!(font_id, "F1");
    // Repair grew the directory to two tables and appended OS/2.
    assert_eq!(u16::from_be_bytes([data[4], data[5]]), 2);
    assert!(data.windows(4).any(|w| w == b"OS/2"));
    // /Length1 cut the padding before the repair ran.
    assert!(!data.windows(4).any(|w| w == b"PAD!"));
}
