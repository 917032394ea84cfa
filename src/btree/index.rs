//! index searches Index type btrees for the entries matching a key.
//!
//! An index entry is a record of the indexed column values followed by the
//! rowid of the table row it points at. Unlike table btrees, interior
//! index pages store real entries of their own, so an equality search has
//! to collect from both leaves and interior cells.

use byteorder::{BigEndian, ReadBytesExt};
use std::cmp::Ordering;
use std::io::Cursor;

use tracing::debug;

use super::{btree_start_offset, cell, header, Error, PageType, RowId};
use crate::pager::{PageNum, Pager};
use crate::record;
use crate::sql_value::{self, SqlValue};

/// One index entry: the first indexed column's value and the rowid it
/// points at.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: SqlValue,
    pub row_id: RowId,
}

/// Collects every entry of the index rooted at `root_page` whose key
/// equals `target`, in entry order (which is ascending rowid within equal
/// keys).
///
/// `num_key_columns` is the number of indexed columns; entry records hold
/// that many values plus the trailing rowid. Only the first key column is
/// compared.
pub fn find_equal<'p>(
    pager: &'p Pager,
    root_page: PageNum,
    target: &SqlValue,
    num_key_columns: usize,
) -> Result<Vec<Entry>, Error> {
    debug!(root = root_page, ?target, "index equality search");
    let mut out = Vec::new();
    search_page(pager, root_page, target, num_key_columns, &mut out)?;
    Ok(out)
}

/// Index B-Tree Leaf Cell (header 0x0a):
/// * A varint which is the total number of bytes of key payload, including
///   any overflow.
/// * The initial portion of the payload that does not spill to overflow
///   pages.
fn parse_leaf_cell(cell: &[u8]) -> Result<&[u8], Error> {
    let (payload_len, bytesread) = crate::varint::read_varint(cell)?;
    if cell.len() - bytesread < payload_len as usize {
        return Err(Error::PayloadOverflow {
            payload_size: payload_len,
        });
    }
    Ok(&cell[bytesread..bytesread + payload_len as usize])
}

/// Index B-Tree Interior Cell (header 0x02):
/// * A 4-byte big-endian page number which is the left child pointer.
/// * A varint which is the total number of bytes of key payload.
/// * The initial portion of the payload that does not spill to overflow
///   pages.
fn parse_interior_cell(cell: &[u8]) -> Result<(PageNum, &[u8]), Error> {
    let mut c = Cursor::new(cell);
    let left_child = c
        .read_u32::<BigEndian>()
        .map_err(|_| Error::TruncatedCell("left child page number"))?;
    let (payload_len, bytesread) = crate::varint::read_varint(&cell[4..])?;
    let start = 4 + bytesread;
    if cell.len() - start < payload_len as usize {
        return Err(Error::PayloadOverflow {
            payload_size: payload_len,
        });
    }
    Ok((
        left_child as PageNum,
        &cell[start..start + payload_len as usize],
    ))
}

fn parse_entry(payload: &[u8], num_key_columns: usize) -> Result<Entry, Error> {
    let mut values = record::parse_record(payload, num_key_columns + 1)?;
    let row_id = match values.pop() {
        Some(SqlValue::Int(i)) => i as RowId,
        _ => return Err(Error::MalformedIndexEntry),
    };
    let key = values
        .into_iter()
        .next()
        .ok_or(Error::MalformedIndexEntry)?;
    Ok(Entry { key, row_id })
}

/// Returns true when the search is over: a key greater than the target has
/// been passed, so no page to the right can hold another match.
fn search_page<'p>(
    pager: &'p Pager,
    pgnum: PageNum,
    target: &SqlValue,
    num_key_columns: usize,
    out: &mut Vec<Entry>,
) -> Result<bool, Error> {
    let page = pager.get_page_ro(pgnum)?;
    let offset = btree_start_offset(pgnum);
    let hdr = header::parse_header(page, offset)?;
    match hdr.btree_page_type {
        PageType::IndexLeaf => {
            // Keys ascend within the page: skip below the target, collect
            // the window of equal keys, stop at the first key past it.
            for cellbytes in cell::Iterator::new(page, &hdr, offset)? {
                let entry = parse_entry(parse_leaf_cell(cellbytes)?, num_key_columns)?;
                match sql_value::compare(&entry.key, target)? {
                    Ordering::Less => continue,
                    Ordering::Equal => out.push(entry),
                    Ordering::Greater => return Ok(true),
                }
            }
            Ok(false)
        }
        PageType::IndexInterior => {
            for cellbytes in cell::Iterator::new(page, &hdr, offset)? {
                let (child, payload) = parse_interior_cell(cellbytes)?;
                let entry = parse_entry(payload, num_key_columns)?;
                let ord = sql_value::compare(&entry.key, target)?;
                if ord == Ordering::Less {
                    // Everything under this cell is below the target too.
                    continue;
                }
                let had_matches = !out.is_empty();
                let before = out.len();
                let finished = search_page(pager, child, target, num_key_columns, out)?;
                if ord == Ordering::Equal {
                    // The interior cell is itself an entry; its left
                    // subtree's equal keys precede it in entry order.
                    out.push(entry);
                }
                if finished {
                    return Ok(true);
                }
                // Once matches exist, a subtree contributing nothing means
                // the window of equal keys has been passed.
                if had_matches && out.len() == before {
                    return Ok(true);
                }
            }
            let rightmost = hdr
                .rightmost_pointer
                .expect("Interior pages should always have rightmost pointer.");
            search_page(pager, rightmost, target, num_key_columns, out)
        }
        PageType::TableLeaf | PageType::TableInterior => Err(Error::NotAnIndexPage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        // Record: text "de" + one-byte int rowid 7.
        let payload: &[u8] = &[0x03, 0x11, 0x01, 0x64, 0x65, 0x07];
        let entry = parse_entry(payload, 1).unwrap();
        assert_eq!(entry.key, SqlValue::Text("de".to_string()));
        assert_eq!(entry.row_id, 7);
    }

    #[test]
    fn test_parse_entry_rejects_missing_rowid() {
        // Single-column record: no trailing rowid.
        let payload: &[u8] = &[0x02, 0x11, 0x64, 0x65];
        assert!(matches!(
            parse_entry(payload, 1),
            Err(Error::MalformedIndexEntry)
        ));
    }

    #[test]
    fn test_parse_leaf_cell() {
        let cell: &[u8] = &[0x03, 0xaa, 0xbb, 0xcc, 0xdd];
        assert_eq!(parse_leaf_cell(cell).unwrap(), &[0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_parse_interior_cell() {
        let cell: &[u8] = &[0x00, 0x00, 0x00, 0x09, 0x02, 0xaa, 0xbb, 0xcc];
        let (child, payload) = parse_interior_cell(cell).unwrap();
        assert_eq!(child, 9);
        assert_eq!(payload, &[0xaa, 0xbb]);
    }
}
