//! dbheader reads the 100-byte header at the start of a database file.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("The magic bytes for this file are wrong.")]
    WrongMagic,
    #[error("The pagesize is not supported by this code, though it may be valid Sqlite format.")]
    UnsupportedPagesize,
    #[error("WAL-mode files are not supported.")]
    UnsupportedWal,
    #[error("Only UTF-8 encoded databases are supported.")]
    UnsupportedEncoding,
    #[error("Error reading file header.")]
    ReadFailed,
}

// The database file header.
#[derive(Debug, Clone)]
pub struct DbfileHeader {
    pub pagesize: u32,
    pub numpages: u32,
}

pub const SQLITE_DB_HEADER_BYTES: usize = 100;
const SQLITE3_MAGIC_STRING: &[u8] = b"SQLite format 3\0";

pub fn get_header_clone(f: &mut std::fs::File) -> Result<DbfileHeader, Error> {
    let mut v = vec![0_u8; SQLITE_DB_HEADER_BYTES];
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    f.read_exact(&mut v[..]).map_err(|_| Error::ReadFailed)?;
    get_header(&mut Cursor::new(v))
}

pub fn get_header<R: Read + Seek>(f: &mut R) -> Result<DbfileHeader, Error> {
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;

    // Offset	Size	Description
    // 0        16	    The header string: "SQLite format 3\000"
    let mut fileid_buffer = [0; 16];
    f.read_exact(&mut fileid_buffer)
        .map_err(|_| Error::ReadFailed)?;
    if fileid_buffer != SQLITE3_MAGIC_STRING {
        return Err(Error::WrongMagic);
    }

    // Offset	Size	Description
    // 16	    2	    The database page size in bytes. Must be a power of two between 512 and 32768 inclusive, or the value 1 representing a page size of 65536.
    let pagesize: u32 = match f.read_u16::<BigEndian>().map_err(|_| Error::ReadFailed)? {
        1 => 65536,
        x if (512..=32768).contains(&x) && x.is_power_of_two() => x as u32,
        _ => return Err(Error::UnsupportedPagesize),
    };

    // Offset	Size	Description
    // 18	    1	    File format write version. 1 for legacy; 2 for WAL.
    // 19	    1	    File format read version. 1 for legacy; 2 for WAL.
    if f.read_u8().map_err(|_| Error::ReadFailed)? != 0x01 {
        return Err(Error::UnsupportedWal);
    }
    if f.read_u8().map_err(|_| Error::ReadFailed)? != 0x01 {
        return Err(Error::UnsupportedWal);
    }

    // Offset	Size	Description
    // 28	    4	    Size of the database file in pages. The "in-header database size".
    f.seek(SeekFrom::Start(28)).map_err(|_| Error::ReadFailed)?;
    let numpages: u32 = f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)?;

    // Offset	Size	Description
    // 56	    4	    The database text encoding. A value of 1 means UTF-8. A value of 2 means UTF-16le. A value of 3 means UTF-16be.
    f.seek(SeekFrom::Start(56)).map_err(|_| Error::ReadFailed)?;
    if f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)? != 1 {
        return Err(Error::UnsupportedEncoding);
    }

    Ok(DbfileHeader { pagesize, numpages })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header(pagesize_field: u16, numpages: u32, encoding: u32) -> Vec<u8> {
        let mut h = vec![0_u8; SQLITE_DB_HEADER_BYTES];
        h[..16].copy_from_slice(SQLITE3_MAGIC_STRING);
        h[16..18].copy_from_slice(&pagesize_field.to_be_bytes());
        h[18] = 1; // write version
        h[19] = 1; // read version
        h[28..32].copy_from_slice(&numpages.to_be_bytes());
        h[56..60].copy_from_slice(&encoding.to_be_bytes());
        h
    }

    #[test]
    fn test_get_header() {
        let cases = vec![(512_u16, 512_u32), (4096, 4096), (32768, 32768), (1, 65536)];
        for (field, expected) in cases {
            let h = get_header(&mut Cursor::new(minimal_header(field, 7, 1)))
                .expect("Should have parsed header.");
            assert_eq!(h.pagesize, expected);
            assert_eq!(h.numpages, 7);
        }
    }

    #[test]
    fn test_get_header_rejects_bad_magic() {
        let mut bytes = minimal_header(4096, 1, 1);
        bytes[0] = b'X';
        assert!(matches!(
            get_header(&mut Cursor::new(bytes)),
            Err(Error::WrongMagic)
        ));
    }

    #[test]
    fn test_get_header_rejects_bad_pagesize() {
        for field in [0_u16, 2, 256, 1000, 4097] {
            assert!(matches!(
                get_header(&mut Cursor::new(minimal_header(field, 1, 1))),
                Err(Error::UnsupportedPagesize)
            ));
        }
    }

    #[test]
    fn test_get_header_rejects_wal() {
        let mut bytes = minimal_header(4096, 1, 1);
        bytes[18] = 2;
        assert!(matches!(
            get_header(&mut Cursor::new(bytes)),
            Err(Error::UnsupportedWal)
        ));
    }

    #[test]
    fn test_get_header_rejects_utf16() {
        for encoding in [2_u32, 3] {
            assert!(matches!(
                get_header(&mut Cursor::new(minimal_header(4096, 1, encoding))),
                Err(Error::UnsupportedEncoding)
            ));
        }
    }
}
