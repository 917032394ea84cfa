//! Manages pages of a sqlite3 file as defined at https://www.sqlite.org/fileformat.html
//!
//! The main database file consists of one or more fixed-size pages,
//! numbered from 1. A pager owns the data of every page and serves
//! read-only views of them. This reader never writes, so there is no
//! locking and no dirty-page tracking; the file handle is dropped as soon
//! as the pages are in memory.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The page number is higher than the file contains or the code supports.")]
    PageNumberBeyondLimits,
    #[error("The file ended before the end of page {0}.")]
    ShortRead(PageNum),
    #[error("Error accessing database file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error in database header: {0}")]
    DbHdr(#[from] crate::dbheader::Error),
}

// Page numbers are 1-based, to match how Sqlite numbers pages. PageNum
// ensures people pass something that is meant to be a page number to a
// function that expects a page number.
pub type PageNum = usize;

// Caps the memory one open database may use.
const MAX_PAGE_NUM: PageNum = 100_000; // 100_000 * 4k page ~= 400MB

/// A `Pager` holds the pages of one open database file.
///
/// All pages load when the file is opened, which keeps page views plain
/// byte slices; the borrow checker then guarantees they outlive every
/// iterator walking them.
pub struct Pager {
    pages: Vec<Vec<u8>>,
    page_size: u32,
}

impl Pager {
    /// Opens a database file, verifying the file header and loading every
    /// page it declares.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(false)
            .create(false)
            .open(path)?;
        let h = crate::dbheader::get_header_clone(&mut file)?;
        if h.numpages as usize > MAX_PAGE_NUM {
            return Err(Error::PageNumberBeyondLimits);
        }
        debug!(
            pagesize = h.pagesize,
            numpages = h.numpages,
            "loading database pages"
        );
        file.seek(SeekFrom::Start(0))?;
        let mut pages = Vec::with_capacity(h.numpages as usize);
        for pn in 1..=h.numpages as PageNum {
            let mut v = vec![0_u8; h.pagesize as usize];
            file.read_exact(&mut v[..]).map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => Error::ShortRead(pn),
                _ => Error::Io(e),
            })?;
            pages.push(v);
        }
        Ok(Pager {
            pages,
            page_size: h.pagesize,
        })
    }

    /// Read-only view of page `pn`.
    pub fn get_page_ro(&self, pn: PageNum) -> Result<&[u8], Error> {
        if pn == 0 || pn > self.pages.len() {
            return Err(Error::PageNumberBeyondLimits);
        }
        Ok(self.pages[pn - 1].as_slice())
    }

    pub fn get_page_size(&self) -> u32 {
        self.page_size
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }
}
