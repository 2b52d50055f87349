use pdtp_core::{PdfDocument, PdfError};

/// Assemble a PDF from numbered object bodies: object n is `bodies[n-1]`.
fn build_pdf(bodies: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets: Vec<usize> = Vec::new();
    for (i, body) in bodies.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
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

fn two_page_pdf() -> Vec<u8> {
    build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 612 792] >>".to_string(),
        "<< /Type /Page /Parent 2 0 R >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >>".to_string(),
    ])
}

#[test]
fn test_open_counts_pages_in_document_order() {
    let doc = PdfDocument::open(two_page_pdf()).unwrap();
    assert_eq!(doc.page_count(), 2);
}

#[test]
fn test_media_box_inherited_from_parent() {
    let doc = PdfDocument::open(two_page_pdf()).unwrap();
    let p1 = doc.page_by_number(1).unwrap();
    assert_eq!((p1.width, p1.height), (612.0, 792.0));
    // An explicit MediaBox on the page wins over the inherited one.
    let p2 = doc.page_by_number(2).unwrap();
    assert_eq!((p2.width, p2.height), (200.0, 100.0));
}

#[test]
fn test_page_without_contents_or_resources() {
    let doc = PdfDocument::open(two_page_pdf()).unwrap();
    let p1 = doc.page_by_number(1).unwrap();
    assert!(p1.contents_ref.is_none());
    assert!(p1.resources_ref.is_none());
}

#[test]
fn test_page_number_out_of_range() {
    let doc = PdfDocument::open(two_page_pdf()).unwrap();
    assert!(matches!(doc.page_by_number(0), Err(PdfError::Range(_))));
    assert!(matches!(doc.page_by_number(3), Err(PdfError::Range(_))));
}

#[test]
fn test_missing_startxref_is_structural() {
    let err = PdfDocument::open(b"%PDF-1.4\nnot a real pdf".to_vec()).unwrap_err();
    assert!(matches!(err, PdfError::Structure(_)));
}

#[test]
fn test_cyclic_page_tree_detected() {
    // The pages node lists itself as a kid.
    let data = build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [2 0 R] /Count 1 >>".to_string(),
    ]);
    let err = PdfDocument::open(data).unwrap_err();
    assert!(matches!(err, PdfError::Structure(_)));
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn test_nested_pages_nodes_flatten_in_order() {
    let data = build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 3 /MediaBox [0 0 10 10] >>".to_string(),
        "<< /Type /Pages /Parent 2 0 R /Kids [5 0 R 6 0 R] /Count 2 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 40 40] >>".to_string(),
        "<< /Type /Page /Parent 3 0 R /MediaBox [0 0 20 20] >>".to_string(),
        "<< /Type /Page /Parent 3 0 R /MediaBox [0 0 30 30] >>".to_string(),
    ]);
    let doc = PdfDocument::open(data).unwrap();
    assert_eq!(doc.page_count(), 3);
    let widths: Vec<f64> = (1..=3)
        .map(|n| doc.page_by_number(n).unwrap().width)
        .collect();
    assert_eq!(widths, vec![20.0, 30.0, 40.0]);
}

#[test]
fn test_incremental_update_rejected() {
    let data = build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [] /Count 0 >>".to_string(),
    ]);
    // Splice /Prev into the trailer dictionary.
    let data = String::from_utf8(data)
        .unwrap()
        .replace("/Root 1 0 R >>", "/Root 1 0 R /Prev 99 >>")
        .into_bytes();

    let err = PdfDocument::open(data).unwrap_err();
    assert!(err.to_string().contains("incrementally updated"));
}

#[test]
fn test_extract_uncompressed_stream() {
    let content = "BT (Hi) Tj ET";
    let data = build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 10 10] >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
    ]);
    let doc = PdfDocument::open(data).unwrap();
    let contents_ref = doc.page_by_number(1).unwrap().contents_ref.unwrap();
    let extracted = doc.extract_stream(contents_ref).unwrap();
    assert_eq!(&extracted[..], content.as_bytes());
}

#[test]
fn test_flate_stream_is_inflated() {
    use flate2::{Compression, write::ZlibEncoder};
    use std::io::Write;

    let plain = b"BT /F1 12 Tf (compressed) Tj ET";
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(plain).unwrap();
    let deflated = enc.finish().unwrap();

    // The stream body is binary, so assemble this object manually.
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();
    for body in [
        b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec(),
        b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 10 10] >>\nendobj\n"
            .to_vec(),
        b"3 0 obj\n<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>\nendobj\n".to_vec(),
        {
            let mut obj = format!(
                "4 0 obj\n<< /Length {} /Filter /FlateDecode >>\nstream\n",
                deflated.len()
            )
            .into_bytes();
            obj.extend_from_slice(&deflated);
            obj.extend_from_slice(b"\nendstream\nendobj\n");
            obj
        },
    ] {
        offsets.push(out.len());
        out.extend_from_slice(&body);
    }
    let xref_pos = out.len();
    out.extend_from_slice(b"xref\n0 5\n0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!("trailer\n<< /Size 5 /Root 1 0 R >>\nstartxref\n{}\n%%EOF", xref_pos).as_bytes(),
    );

    let doc = PdfDocument::open(out).unwrap();
    let contents_ref = doc.page_by_number(1).unwrap().contents_ref.unwrap();
    let extracted = doc.extract_stream(contents_ref).unwrap();
    assert_eq!(&extracted[..], plain);
}
