//! header reads the header of a btree page.
//!
//! A btree page is divided into regions in the following order:
//! 1. The 100-byte database file header (found on page 1 only)
//! 2. The 8 or 12 byte btree page header
//! 3. The cell pointer array
//! 4. Unallocated space
//! 5. The cell content area
//! 6. The reserved region (assumed absent here)

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

use super::{Error, PageType};
use crate::pager::PageNum;

#[derive(Debug, Clone)]
pub struct Header {
    pub btree_page_type: PageType,
    pub freeblock_start: u16,
    pub num_cells: u16,
    pub cell_content_start: u32,
    pub rightmost_pointer: Option<PageNum>,
}

pub fn parse_header(page: &[u8], non_btree_header_bytes: usize) -> Result<Header, Error> {
    let mut c = Cursor::new(page);
    // On page 1 the cell pointers still count from the start of the page,
    // but the btree header itself sits after the file header.
    c.seek(SeekFrom::Start(non_btree_header_bytes as u64))
        .map_err(|_| Error::ShortPage)?;

    // Offset	Size	Description
    // 0	1	The one-byte flag at offset 0 indicating the b-tree page type.
    let btree_page_type = match c.read_u8().map_err(|_| Error::ShortPage)? {
        0x02 => PageType::IndexInterior,
        0x05 => PageType::TableInterior,
        0x0a => PageType::IndexLeaf,
        0x0d => PageType::TableLeaf,
        b => return Err(Error::InvalidPageType(b)),
    };

    // 1	2	The two-byte integer at offset 1 gives the start of the first freeblock on the page, or is zero if there are no freeblocks.
    let freeblock_start = c.read_u16::<BigEndian>().map_err(|_| Error::ShortPage)?;
    // 3	2	The two-byte integer at offset 3 gives the number of cells on the page.
    let num_cells = c.read_u16::<BigEndian>().map_err(|_| Error::ShortPage)?;
    // 5	2	The two-byte integer at offset 5 designates the start of the cell content area. A zero value for this integer is interpreted as 65536.
    let cell_content_start: u32 = match c.read_u16::<BigEndian>().map_err(|_| Error::ShortPage)? {
        0 => 65536,
        x => x as u32,
    };
    // 7	1	The one-byte integer at offset 7 gives the number of fragmented free bytes within the cell content area.
    let _fragmented_free_bytes = c.read_u8().map_err(|_| Error::ShortPage)?;
    // 8	4	The four-byte page number at offset 8 is the right-most pointer. This value appears in the header of interior b-tree pages only and is omitted from all other pages.
    let rightmost_pointer = match btree_page_type {
        PageType::IndexInterior | PageType::TableInterior => Some(
            c.read_u32::<BigEndian>().map_err(|_| Error::ShortPage)? as PageNum,
        ),
        PageType::IndexLeaf | PageType::TableLeaf => None,
    };

    Ok(Header {
        btree_page_type,
        freeblock_start,
        num_cells,
        cell_content_start,
        rightmost_pointer,
    })
}
