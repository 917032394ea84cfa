//! interior decodes the cells of table btree interior pages.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

use super::{cell, Error, RowId};
use crate::pager::PageNum;

/// One cell of a table interior page.
///
/// Table B-Tree Interior Cell (header 0x05):
/// * A 4-byte big-endian page number which is the left child pointer.
/// * A varint which is the integer key.
///
/// Every rowid in the child's subtree is less than or equal to `max_row_id`;
/// rowids greater than the last cell's key live under the page's right-most
/// pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRef {
    pub page: PageNum,
    pub max_row_id: RowId,
}

pub fn parse_cell(cell: &[u8]) -> Result<ChildRef, Error> {
    let mut c = Cursor::new(cell);
    let left_child = c
        .read_u32::<BigEndian>()
        .map_err(|_| Error::TruncatedCell("left child page number"))?;
    let (max_row_id, _) = crate::varint::read_varint(&cell[4..])?;
    Ok(ChildRef {
        page: left_child as PageNum,
        max_row_id,
    })
}

/// Iterator over the child pointers of a table btree interior page, in
/// rowid order, ending with the right-most pointer. Intended for full
/// scans.
pub struct ScanIterator<'a> {
    ci: cell::Iterator<'a>,
    returned_rightmost: bool,
    rightmost_pointer: PageNum,
}

impl<'a> ScanIterator<'a> {
    /// # Arguments
    ///
    /// * `ci` - A cell iterator for the page. Borrowed for the lifetime of
    ///   the iterator.
    /// * `rmp` - The rightmost pointer for this page.
    pub fn new(ci: cell::Iterator<'a>, rmp: PageNum) -> ScanIterator<'a> {
        ScanIterator {
            ci,
            returned_rightmost: false,
            rightmost_pointer: rmp,
        }
    }
}

impl<'a> core::iter::Iterator for ScanIterator<'a> {
    type Item = Result<PageNum, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.returned_rightmost {
            return None;
        }
        match self.ci.next() {
            None => {
                self.returned_rightmost = true;
                Some(Ok(self.rightmost_pointer))
            }
            Some(cell) => Some(parse_cell(cell).map(|c| c.page)),
        }
    }
}

/// Reads all the child references of an interior page at once, for pruned
/// walks that pick children by rowid range.
pub fn child_refs(ci: cell::Iterator<'_>) -> Result<Vec<ChildRef>, Error> {
    ci.map(|cell| parse_cell(cell)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        let cases: Vec<(&[u8], ChildRef)> = vec![
            (
                &[0x00, 0x00, 0x00, 0x04, 0x64],
                ChildRef {
                    page: 4,
                    max_row_id: 100,
                },
            ),
            (
                &[0x00, 0x00, 0x01, 0x00, 0x82, 0x2c],
                ChildRef {
                    page: 256,
                    max_row_id: 300,
                },
            ),
        ];
        for (bytes, expected) in cases {
            assert_eq!(parse_cell(bytes).unwrap(), expected);
        }
    }

    #[test]
    fn test_parse_cell_rejects_short_cell() {
        assert!(parse_cell(&[0x00, 0x00]).is_err());
        assert!(parse_cell(&[0x00, 0x00, 0x00, 0x04]).is_err());
    }
}
