//! Serial types are how SQLite stores values in a record.
//!
//! Every column of a record is described by one serial type code in the
//! record header:
//!
//! Serial Type   Content Size   Meaning
//! 0             0              Value is a NULL.
//! 1             1              8-bit twos-complement integer.
//! 2             2              big-endian 16-bit twos-complement integer.
//! 3             3              big-endian 24-bit twos-complement integer.
//! 4             4              big-endian 32-bit twos-complement integer.
//! 5             6              big-endian 48-bit twos-complement integer.
//! 6             8              big-endian 64-bit twos-complement integer.
//! 7             8              big-endian IEEE 754-2008 64-bit float.
//! 8             0              the integer 0. (schema format 4 and higher)
//! 9             0              the integer 1. (schema format 4 and higher)
//! 10,11         variable       reserved; never in a well-formed database.
//! N>=12, even   (N-12)/2       BLOB of that many bytes.
//! N>=13, odd    (N-13)/2       string in the text encoding.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

use crate::sql_value::SqlValue;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid serial type code: {0}.")]
    InvalidSerialTypeCode(u64),
    #[error("Value bytes ended before the serial type's full width: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bytes were not a valid string encoding.")]
    InvalidStringEncoding(#[from] std::string::FromUtf8Error),
}

/// One decoded serial type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    Zero,
    One,
    Blob(usize),
    Text(usize),
}

impl SerialType {
    /// Maps a code from a record header to a serial type.
    /// Codes 10 and 11 are reserved for SQLite's internal use and are
    /// rejected.
    pub fn from_code(code: u64) -> Result<SerialType, Error> {
        match code {
            0 => Ok(SerialType::Null),
            1 => Ok(SerialType::Int8),
            2 => Ok(SerialType::Int16),
            3 => Ok(SerialType::Int24),
            4 => Ok(SerialType::Int32),
            5 => Ok(SerialType::Int48),
            6 => Ok(SerialType::Int64),
            7 => Ok(SerialType::Float64),
            8 => Ok(SerialType::Zero),
            9 => Ok(SerialType::One),
            10 | 11 => Err(Error::InvalidSerialTypeCode(code)),
            x if x % 2 == 0 => Ok(SerialType::Blob((x as usize - 12) / 2)),
            x => Ok(SerialType::Text((x as usize - 13) / 2)),
        }
    }

    /// Number of bytes the value occupies in the record body.
    pub fn content_size(&self) -> usize {
        match self {
            SerialType::Null | SerialType::Zero | SerialType::One => 0,
            SerialType::Int8 => 1,
            SerialType::Int16 => 2,
            SerialType::Int24 => 3,
            SerialType::Int32 => 4,
            SerialType::Int48 => 6,
            SerialType::Int64 | SerialType::Float64 => 8,
            SerialType::Blob(n) | SerialType::Text(n) => *n,
        }
    }
}

/// Reads a big-endian twos-complement integer of `width` bytes, sign
/// extending into an i64.
fn read_int<R: Read>(c: &mut R, width: usize) -> Result<i64, Error> {
    let mut bytes = [0_u8; 8];
    c.read_exact(&mut bytes[8 - width..])?;
    let fill = match bytes[8 - width] & 0b1000_0000 {
        0 => 0x00,
        _ => 0xff,
    };
    for b in bytes.iter_mut().take(8 - width) {
        *b = fill;
    }
    Ok(i64::from_be_bytes(bytes))
}

/// Deserialize the bytes of one value into a `SqlValue`.
///
/// `data` must start at the value's first byte; exactly
/// `serial_type.content_size()` bytes are read from it.
pub fn to_sql_value(serial_type: &SerialType, data: &[u8]) -> Result<SqlValue, Error> {
    use SqlValue::*;

    let mut c = std::io::Cursor::new(data);
    match serial_type {
        SerialType::Null => Ok(Null()),
        SerialType::Int8 => Ok(Int(c.read_i8()? as i64)),
        SerialType::Int16 => Ok(Int(c.read_i16::<BigEndian>()? as i64)),
        SerialType::Int24 => Ok(Int(read_int(&mut c, 3)?)),
        SerialType::Int32 => Ok(Int(c.read_i32::<BigEndian>()? as i64)),
        SerialType::Int48 => Ok(Int(read_int(&mut c, 6)?)),
        SerialType::Int64 => Ok(Int(c.read_i64::<BigEndian>()?)),
        SerialType::Float64 => Ok(Real(c.read_f64::<BigEndian>()?)),
        SerialType::Zero => Ok(Int(0_i64)),
        SerialType::One => Ok(Int(1_i64)),
        SerialType::Blob(n) => {
            let mut buf = vec![0_u8; *n];
            c.read_exact(&mut buf[..])?;
            Ok(Blob(buf))
        }
        SerialType::Text(n) => {
            let mut buf = vec![0_u8; *n];
            c.read_exact(&mut buf[..])?;
            Ok(Text(String::from_utf8(buf)?))
        }
    }
}

#[test]
fn test_from_code() {
    let cases: Vec<(u64, SerialType)> = vec![
        (0, SerialType::Null),
        (1, SerialType::Int8),
        (2, SerialType::Int16),
        (3, SerialType::Int24),
        (4, SerialType::Int32),
        (5, SerialType::Int48),
        (6, SerialType::Int64),
        (7, SerialType::Float64),
        (8, SerialType::Zero),
        (9, SerialType::One),
        (12, SerialType::Blob(0)),
        (13, SerialType::Text(0)),
        (18, SerialType::Blob(3)),
        (19, SerialType::Text(3)),
        (1000, SerialType::Blob(494)),
        (1001, SerialType::Text(494)),
    ];
    for (code, expected) in cases {
        let st = SerialType::from_code(code).unwrap();
        assert_eq!(st, expected, "code {}", code);
        // Size is total over the valid domain.
        let _ = st.content_size();
    }
    assert!(SerialType::from_code(10).is_err());
    assert!(SerialType::from_code(11).is_err());
}

#[test]
fn test_to_sql_value() {
    use SqlValue::*;

    let cases: Vec<(u64, &[u8], SqlValue)> = vec![
        (0, b"", Null()),
        // One byte ints, including sign extension.
        (1, &[0x7f], Int(127)),
        (1, &[0xff], Int(-1)),
        (1, &[0x01], Int(1)),
        // Two byte ints.
        (2, &[0x00, 0x7f], Int(127)),
        (2, &[0xff, 0xff], Int(-1)),
        (2, &[0x01, 0x00], Int(256)),
        // Three byte ints.
        (3, &[0x00, 0x00, 0x7f], Int(127)),
        (3, &[0xff, 0xff, 0xff], Int(-1)),
        (3, &[0x01, 0x00, 0x00], Int(65536)),
        // Four byte ints.
        (4, &[0x7f, 0xff, 0xff, 0xff], Int(i32::MAX as i64)),
        (4, &[0xff, 0xff, 0xff, 0xfe], Int(-2)),
        // Six byte ints.
        (5, &[0x00, 0x00, 0x00, 0x00, 0x00, 0x2a], Int(42)),
        (5, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff], Int(-1)),
        (5, &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00], Int(1 << 40)),
        // Eight byte ints.
        (
            6,
            &[0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            Int(i64::MAX),
        ),
        (6, &[0xff; 8], Int(-1)),
        // Float: 3.1415.
        (
            7,
            &[0x40, 0x09, 0x21, 0xca, 0xc0, 0x83, 0x12, 0x6f],
            Real(3.1415),
        ),
        // Literal 0 and 1.
        (8, b"", Int(0)),
        (9, b"", Int(1)),
        // Text of various lengths.
        (13, b"", Text("".to_string())),
        (19, b"Foo", Text("Foo".to_string())),
        (25, b"FooBar", Text("FooBar".to_string())),
        // Blob.
        (18, &[0x00, 0x01, 0xff], Blob(vec![0, 1, 255])),
    ];
    for (i, (code, data, expected)) in cases.iter().enumerate() {
        let st = SerialType::from_code(*code).unwrap();
        assert_eq!(st.content_size(), data.len(), "case {}", i);
        assert_eq!(&to_sql_value(&st, data).unwrap(), expected, "case {}", i);
    }
}

#[test]
fn test_to_sql_value_short_data_is_an_error() {
    let cases: Vec<(u64, &[u8])> = vec![(2, &[0x01]), (6, &[0x00]), (19, b"Fo"), (7, &[0x40])];
    for (code, data) in cases {
        let st = SerialType::from_code(code).unwrap();
        assert!(to_sql_value(&st, data).is_err(), "code {}", code);
    }
}
