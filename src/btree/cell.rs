//! cell::Iterator iterates over the cells in one btree page.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

use super::header::Header;
use super::Error;

/// Iterator over the cells of a page, without interpreting the cell
/// contents. Each item is the byte slice from the cell's start offset to
/// the end of the page; the cell decoders read only as much of it as the
/// cell format says is there.
pub struct Iterator<'a> {
    page: &'a [u8],
    cell_idx: usize,
    cell_offsets: Vec<usize>,
}

impl<'a> Iterator<'a> {
    /// Reads the cell pointer array of a single page of a btree.
    ///
    /// From the file format docs:
    /// "The cell pointer array of a b-tree page immediately follows the
    /// b-tree page header. Let K be the number of cells on the btree. The
    /// cell pointer array consists of K 2-byte integer offsets to the cell
    /// contents. The cell pointers are arranged in key order with left-most
    /// cell (the cell with the smallest key) first and the right-most cell
    /// (the cell with the largest key) last."
    ///
    /// # Arguments
    ///
    /// * `page` - the full page. Borrowed for the lifetime of the iterator.
    /// * `hdr` - the parsed btree header of this page.
    /// * `non_btree_header_bytes` - 100 on page 1, 0 elsewhere.
    pub fn new(
        page: &'a [u8],
        hdr: &Header,
        non_btree_header_bytes: usize,
    ) -> Result<Iterator<'a>, Error> {
        let array_start = non_btree_header_bytes + hdr.btree_page_type.header_size();
        let mut c = Cursor::new(page);
        c.seek(SeekFrom::Start(array_start as u64))
            .map_err(|_| Error::ShortPage)?;

        let mut cell_offsets = Vec::with_capacity(hdr.num_cells as usize);
        let content_floor = array_start + 2 * hdr.num_cells as usize;
        for _ in 0..hdr.num_cells {
            let off = c.read_u16::<BigEndian>().map_err(|_| Error::ShortPage)?;
            // Cell pointers count from the start of the page and must land
            // inside the cell content area, past the pointer array itself.
            if (off as usize) < content_floor || off as usize >= page.len() {
                return Err(Error::BadCellPointer(off));
            }
            cell_offsets.push(off as usize);
        }
        Ok(Iterator {
            page,
            cell_idx: 0,
            cell_offsets,
        })
    }
}

impl<'a> core::iter::Iterator for Iterator<'a> {
    type Item = &'a [u8];

    /// Returns the bytes of the next cell, in key order.
    fn next(&mut self) -> Option<Self::Item> {
        if self.cell_idx >= self.cell_offsets.len() {
            return None;
        }
        let b = self.cell_offsets[self.cell_idx];
        self.cell_idx += 1;
        Some(&self.page[b..])
    }
}

#[cfg(test)]
mod tests {
    use super::super::header::parse_header;
    use super::*;
    use hex::FromHex;

    // A 32-byte leaf "page" with two cells, whose pointers are in key order
    // but reversed physical order: cell 1 at 0x1b, cell 2 at 0x16.
    const TEST_PAGE: &str = "0d00 0000 0200 1600 001b 0016 0000 0000\
                             0000 0000 0000 0302 020f 4203 0102 0f41";

    fn test_page() -> Vec<u8> {
        Vec::from_hex(TEST_PAGE.replace(' ', "")).expect("Invalid hex string")
    }

    #[test]
    fn test_cell_iterator() {
        let p = test_page();
        assert_eq!(p.len(), 32);
        let hdr = parse_header(&p, 0).unwrap();
        let mut ci = Iterator::new(&p, &hdr, 0).unwrap();
        // Each item runs to the end of the page; only the leading bytes are
        // the cell itself.
        assert_eq!(&ci.next().unwrap()[..5], Vec::from_hex("030102 0f41".replace(' ', "")).unwrap().as_slice());
        assert_eq!(&ci.next().unwrap()[..5], Vec::from_hex("030202 0f42".replace(' ', "")).unwrap().as_slice());
        assert_eq!(ci.next(), None);
    }

    #[test]
    fn test_cell_iterator_rejects_pointer_outside_page() {
        let mut p = test_page();
        // Point the first cell past the end of the page.
        p[8..10].copy_from_slice(&0x0100_u16.to_be_bytes());
        let hdr = parse_header(&p, 0).unwrap();
        assert!(matches!(
            Iterator::new(&p, &hdr, 0),
            Err(Error::BadCellPointer(0x0100))
        ));
    }

    #[test]
    fn test_cell_iterator_rejects_pointer_into_header() {
        let mut p = test_page();
        p[8..10].copy_from_slice(&0x0004_u16.to_be_bytes());
        let hdr = parse_header(&p, 0).unwrap();
        assert!(matches!(
            Iterator::new(&p, &hdr, 0),
            Err(Error::BadCellPointer(0x0004))
        ));
    }
}
