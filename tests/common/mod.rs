//! Builders that assemble SQLite database files byte by byte, so the
//! tests can exercise real multi-page btrees without shipping binary
//! fixtures.

use litescan::sql_value::SqlValue;
use litescan::varint::write_varint;

const MAGIC: &[u8] = b"SQLite format 3\0";

/// Encodes values into record format: a header of serial type varints
/// preceded by its own length, then the value bytes.
pub fn record(values: &[SqlValue]) -> Vec<u8> {
    let mut types: Vec<u8> = vec![];
    let mut body: Vec<u8> = vec![];
    for v in values {
        match v {
            SqlValue::Null() => types.extend(write_varint(0)),
            SqlValue::Int(i) => {
                if let Ok(b) = i8::try_from(*i) {
                    types.extend(write_varint(1));
                    body.extend(b.to_be_bytes());
                } else if let Ok(b) = i16::try_from(*i) {
                    types.extend(write_varint(2));
                    body.extend(b.to_be_bytes());
                } else if let Ok(b) = i32::try_from(*i) {
                    types.extend(write_varint(4));
                    body.extend(b.to_be_bytes());
                } else {
                    types.extend(write_varint(6));
                    body.extend(i.to_be_bytes());
                }
            }
            SqlValue::Real(f) => {
                types.extend(write_varint(7));
                body.extend(f.to_be_bytes());
            }
            SqlValue::Text(s) => {
                types.extend(write_varint(13 + 2 * s.len() as u64));
                body.extend(s.as_bytes());
            }
            SqlValue::Blob(b) => {
                types.extend(write_varint(12 + 2 * b.len() as u64));
                body.extend(b);
            }
        }
    }
    assert!(types.len() + 1 <= 127, "record header too long for the builder");
    let mut out = write_varint((types.len() + 1) as u64);
    out.extend(types);
    out.extend(body);
    out
}

/// A sqlite_schema row: (type, name, tbl_name, rootpage, sql).
pub fn schema_record(
    rowtype: &str,
    name: &str,
    tbl_name: &str,
    rootpage: i64,
    sql: Option<&str>,
) -> Vec<u8> {
    record(&[
        SqlValue::Text(rowtype.to_string()),
        SqlValue::Text(name.to_string()),
        SqlValue::Text(tbl_name.to_string()),
        SqlValue::Int(rootpage),
        match sql {
            Some(s) => SqlValue::Text(s.to_string()),
            None => SqlValue::Null(),
        },
    ])
}

/// Lays cells out at the tail of a fresh page and fills in the btree page
/// header and cell pointer array. `cells` must already be in key order;
/// the pointer array preserves it.
fn page_with_cells(
    page_size: usize,
    hdr_offset: usize,
    page_type: u8,
    cells: &[Vec<u8>],
    rightmost: Option<u32>,
) -> Vec<u8> {
    let mut page = vec![0_u8; page_size];
    let hdr_size = if rightmost.is_some() { 12 } else { 8 };

    let mut content_start = page_size;
    let mut offsets = Vec::with_capacity(cells.len());
    for cell in cells.iter().rev() {
        content_start -= cell.len();
        page[content_start..content_start + cell.len()].copy_from_slice(cell);
        offsets.push(content_start);
    }
    offsets.reverse();

    page[hdr_offset] = page_type;
    page[hdr_offset + 3..hdr_offset + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    page[hdr_offset + 5..hdr_offset + 7].copy_from_slice(&(content_start as u16).to_be_bytes());
    if let Some(rmp) = rightmost {
        page[hdr_offset + 8..hdr_offset + 12].copy_from_slice(&rmp.to_be_bytes());
    }
    let array_start = hdr_offset + hdr_size;
    assert!(
        array_start + 2 * cells.len() <= content_start,
        "cells do not fit on one page"
    );
    for (i, off) in offsets.iter().enumerate() {
        page[array_start + 2 * i..array_start + 2 * i + 2]
            .copy_from_slice(&(*off as u16).to_be_bytes());
    }
    page
}

/// Table leaf page (0x0d). Cells are (rowid, record payload), in rowid
/// order.
pub fn table_leaf_page(page_size: usize, hdr_offset: usize, rows: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = rows
        .iter()
        .map(|(rowid, payload)| {
            let mut c = write_varint(payload.len() as u64);
            c.extend(write_varint(*rowid));
            c.extend(payload);
            c
        })
        .collect();
    page_with_cells(page_size, hdr_offset, 0x0d, &cells, None)
}

/// Table interior page (0x05). Cells are (child page, max rowid of that
/// subtree), in rowid order.
pub fn table_interior_page(
    page_size: usize,
    hdr_offset: usize,
    children: &[(u32, u64)],
    rightmost: u32,
) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = children
        .iter()
        .map(|(child, max_rowid)| {
            let mut c = child.to_be_bytes().to_vec();
            c.extend(write_varint(*max_rowid));
            c
        })
        .collect();
    page_with_cells(page_size, hdr_offset, 0x05, &cells, Some(rightmost))
}

/// Index leaf page (0x0a). Cells are record payloads of
/// (key columns..., rowid), in key order.
pub fn index_leaf_page(page_size: usize, hdr_offset: usize, payloads: &[Vec<u8>]) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = payloads
        .iter()
        .map(|payload| {
            let mut c = write_varint(payload.len() as u64);
            c.extend(payload);
            c
        })
        .collect();
    page_with_cells(page_size, hdr_offset, 0x0a, &cells, None)
}

/// Index interior page (0x02). Cells are (child page, entry payload), in
/// key order.
pub fn index_interior_page(
    page_size: usize,
    hdr_offset: usize,
    children: &[(u32, Vec<u8>)],
    rightmost: u32,
) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = children
        .iter()
        .map(|(child, payload)| {
            let mut c = child.to_be_bytes().to_vec();
            c.extend(write_varint(payload.len() as u64));
            c.extend(payload);
            c
        })
        .collect();
    page_with_cells(page_size, hdr_offset, 0x02, &cells, Some(rightmost))
}

/// Concatenates pages into a database image, writing the 100-byte file
/// header over the front of page 1.
pub fn build_db(page_size: usize, mut pages: Vec<Vec<u8>>) -> Vec<u8> {
    assert!(!pages.is_empty());
    let mut header = vec![0_u8; 100];
    header[..16].copy_from_slice(MAGIC);
    let pagesize_field: u16 = if page_size == 65536 {
        1
    } else {
        page_size as u16
    };
    header[16..18].copy_from_slice(&pagesize_field.to_be_bytes());
    header[18] = 1; // file format write version
    header[19] = 1; // file format read version
    header[21] = 0x40; // max embedded payload fraction
    header[22] = 0x20; // min embedded payload fraction
    header[23] = 0x20; // leaf payload fraction
    header[28..32].copy_from_slice(&(pages.len() as u32).to_be_bytes());
    header[47] = 4; // schema format number
    header[59] = 1; // text encoding: UTF-8
    pages[0][..100].copy_from_slice(&header);
    pages.concat()
}

/// Writes a built database image to a temp file and returns its path.
/// Tests run concurrently, so every call gets its own file.
pub fn write_db_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static NEXT_FILE_ID: AtomicUsize = AtomicUsize::new(0);
    let mut path = std::env::temp_dir();
    path.push(format!(
        "litescan-test-{}-{}-{}.db",
        name,
        std::process::id(),
        NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, bytes).expect("Should have written the test database file");
    path
}
