//! Minimal sfnt surgery: append an OS/2 table to TrueType programs that
//! lack one, so embedded fonts survive sanitizers that require it.

use crate::error::{PdfError, Result};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use bytes::Bytes;

const OFFSET_TABLE_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;
const OS2_TAG: &[u8; 4] = b"OS/2";

#[derive(Debug, Clone, Copy)]
struct TableRecord {
    tag: [u8; 4],
    checksum: u32,
    offset: u32,
    length: u32,
}

/// Return the font program with an OS/2 table guaranteed present.
///
/// A program that already carries the table is returned unchanged, so the
/// repair is idempotent. Otherwise a minimal version-3 table is appended
/// at the next 4-byte boundary and the table directory is regrown around
/// it. Existing record offsets are not rewritten and the head table's
/// checkSumAdjustment is left stale; sanitizers tolerate both.
pub fn ensure_os2(font_data: &[u8]) -> Result<Bytes> {
    if font_data.len() < OFFSET_TABLE_LEN {
        return Err(PdfError::Decode("font too short for sfnt header".into()));
    }
    let sfnt_version = BigEndian::read_u32(&font_data[0..4]);
    let num_tables = BigEndian::read_u16(&font_data[4..6]) as usize;

    let dir_end = OFFSET_TABLE_LEN + num_tables * TABLE_RECORD_LEN;
    if font_data.len() < dir_end {
        return Err(PdfError::Decode("font too short for table directory".into()));
    }

    let mut directory = Vec::with_capacity(num_tables + 1);
    for i in 0..num_tables {
        let at = OFFSET_TABLE_LEN + i * TABLE_RECORD_LEN;
        let rec = TableRecord {
            tag: [
                font_data[at],
                font_data[at + 1],
                font_data[at + 2],
                font_data[at + 3],
            ],
            checksum: BigEndian::read_u32(&font_data[at + 4..at + 8]),
            offset: BigEndian::read_u32(&font_data[at + 8..at + 12]),
            length: BigEndian::read_u32(&font_data[at + 12..at + 16]),
        };
        if &rec.tag == OS2_TAG {
            return Ok(Bytes::copy_from_slice(font_data));
        }
        directory.push(rec);
    }

    let os2 = build_minimal_os2();
    let aligned_len = align4(font_data.len());
    directory.push(TableRecord {
        tag: *OS2_TAG,
        checksum: table_checksum(&os2),
        offset: aligned_len as u32,
        length: os2.len() as u32,
    });

    let new_num = num_tables + 1;
    let (search_range, entry_selector, range_shift) = search_fields(new_num);

    let mut out = Vec::with_capacity(aligned_len + os2.len() + TABLE_RECORD_LEN);
    out.write_u32::<BigEndian>(sfnt_version)?;
    out.write_u16::<BigEndian>(new_num as u16)?;
    out.write_u16::<BigEndian>(search_range)?;
    out.write_u16::<BigEndian>(entry_selector)?;
    out.write_u16::<BigEndian>(range_shift)?;
    for rec in &directory {
        out.extend_from_slice(&rec.tag);
        out.write_u32::<BigEndian>(rec.checksum)?;
        out.write_u32::<BigEndian>(rec.offset)?;
        out.write_u32::<BigEndian>(rec.length)?;
    }
    out.extend_from_slice(&font_data[dir_end..]);
    out.resize(out.len() + (aligned_len - font_data.len()), 0);
    out.extend_from_slice(&os2);

    Ok(Bytes::from(out))
}

/// Binary-search fields of the offset table for `num_tables` entries.
fn search_fields(num_tables: usize) -> (u16, u16, u16) {
    let mut pow2 = 1usize;
    let mut shift = 0u16;
    while (pow2 << 1) <= num_tables {
        pow2 <<= 1;
        shift += 1;
    }
    let search_range = (pow2 * 16) as u16;
    let range_shift = (num_tables * 16) as u16 - search_range;
    (search_range, shift, range_shift)
}

const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Sum of big-endian u32 words, zero-padding the tail.
fn table_checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(BigEndian::read_u32(&word));
    }
    sum
}

/// A fixed version-3 OS/2 table with neutral metrics. Enough for font
/// sanitizers; real metrics would come from hmtx/head, out of scope here.
fn build_minimal_os2() -> Vec<u8> {
    let mut buf = Vec::with_capacity(86);
    let mut push16 = |buf: &mut Vec<u8>, v: i32| {
        buf.push((v >> 8) as u8);
        buf.push(v as u8);
    };
    push16(&mut buf, 3); // version
    push16(&mut buf, 512); // xAvgCharWidth
    push16(&mut buf, 400); // usWeightClass
    push16(&mut buf, 5); // usWidthClass
    push16(&mut buf, 0); // fsType
    push16(&mut buf, 650); // ySubscriptXSize
    push16(&mut buf, 600); // ySubscriptYSize
    push16(&mut buf, 0); // ySubscriptXOffset
    push16(&mut buf, 75); // ySubscriptYOffset
    push16(&mut buf, 650); // ySuperscriptXSize
    push16(&mut buf, 600); // ySuperscriptYSize
    push16(&mut buf, 0); // ySuperscriptXOffset
    push16(&mut buf, 175); // ySuperscriptYOffset
    push16(&mut buf, 50); // yStrikeoutSize
    push16(&mut buf, 258); // yStrikeoutPosition
    push16(&mut buf, 0); // sFamilyClass
    buf.extend_from_slice(&[2, 11, 6, 3, 2, 2, 0, 0, 0, 0]); // PANOSE
    buf.extend_from_slice(&[0u8; 16]); // ulUnicodeRange1..4
    buf.extend_from_slice(b"GoFt"); // achVendID
    push16(&mut buf, 0x0040); // fsSelection: REGULAR
    push16(&mut buf, 32); // usFirstCharIndex
    push16(&mut buf, 0xFFFF); // usLastCharIndex
    push16(&mut buf, 800); // sTypoAscender
    push16(&mut buf, -200); // sTypoDescender
    push16(&mut buf, 75); // sTypoLineGap
    push16(&mut buf, 900); // usWinAscent
    push16(&mut buf, 250); // usWinDescent
    buf.extend_from_slice(&[0u8; 8]); // ulCodePageRange1..2
    buf
}
