//! Decoding of records, the payloads of table and index btree cells.
//!
//! A record contains a header and a body, in that order. The header begins
//! with a single varint which determines the total number of bytes in the
//! header, followed by one serial type varint per column. The body holds
//! the columns' bytes in the same order.
//! See https://www.sqlite.org/fileformat.html#record_format.

use crate::serial_type::{self, SerialType};
use crate::sql_value::SqlValue;
use crate::varint;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Record header: {0}")]
    Varint(#[from] varint::Error),
    #[error("Record value: {0}")]
    SerialType(#[from] serial_type::Error),
    #[error("Record header length {0} exceeds the payload.")]
    HeaderTooLong(usize),
}

/// Reads the serial types from a record header, returning them along with
/// the header's total length (which is where the body starts).
fn serial_types(payload: &[u8]) -> Result<(Vec<SerialType>, usize), Error> {
    let (hdr_len, hdr_len_len) = varint::read_varint(payload)?;
    let hdr_len = hdr_len as usize;
    if hdr_len > payload.len() || hdr_len < hdr_len_len {
        return Err(Error::HeaderTooLong(hdr_len));
    }
    let mut types = vec![];
    let mut offset = hdr_len_len;
    while offset < hdr_len {
        let (code, bytes_read) = varint::read_varint(&payload[offset..hdr_len])?;
        offset += bytes_read;
        types.push(SerialType::from_code(code)?);
    }
    Ok((types, hdr_len))
}

/// Decodes one record into `num_columns` values.
///
/// Rows written before an ALTER TABLE ADD COLUMN carry fewer columns than
/// the current schema declares; the missing trailing columns read as NULL.
/// Columns stored beyond `num_columns` are dropped.
pub fn parse_record(payload: &[u8], num_columns: usize) -> Result<Vec<SqlValue>, Error> {
    let (types, hdr_len) = serial_types(payload)?;

    let mut values = Vec::with_capacity(num_columns);
    let mut offset = hdr_len;
    for st in types.iter().take(num_columns) {
        values.push(serial_type::to_sql_value(st, &payload[offset.min(payload.len())..])?);
        offset += st.content_size();
    }
    while values.len() < num_columns {
        values.push(SqlValue::Null());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_value::SqlValue::*;

    #[test]
    fn test_parse_record_literal_one() {
        // 2 byte record header, serial type is literal 1, empty body.
        let payload: &[u8] = &[0x02, 0x09];
        assert_eq!(parse_record(payload, 1).unwrap(), vec![Int(1)]);
    }

    #[test]
    fn test_parse_record_five_one_byte_ints() {
        // 06 0101 0101 01 | 0a 0b 0c 0d 0e
        let payload: &[u8] = &[
            0x06, 0x01, 0x01, 0x01, 0x01, 0x01, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        ];
        assert_eq!(
            parse_record(payload, 5).unwrap(),
            vec![Int(10), Int(11), Int(12), Int(13), Int(14)]
        );
    }

    #[test]
    fn test_parse_record_various_types() {
        // literal 0 | literal 1 | float 3.1415 | "Ten" | NULL
        let payload: &[u8] = &[
            0x06, 0x08, 0x09, 0x07, 0x13, 0x00, 0x40, 0x09, 0x21, 0xca, 0xc0, 0x83, 0x12, 0x6f,
            0x54, 0x65, 0x6e,
        ];
        assert_eq!(
            parse_record(payload, 5).unwrap(),
            vec![Int(0), Int(1), Real(3.1415), Text("Ten".to_string()), Null()]
        );
    }

    #[test]
    fn test_parse_record_short_record_pads_nulls() {
        // The record stores two columns; the schema expects four.
        let payload: &[u8] = &[0x03, 0x01, 0x13, 0x2a, 0x41, 0x42, 0x43];
        assert_eq!(
            parse_record(payload, 4).unwrap(),
            vec![Int(42), Text("ABC".to_string()), Null(), Null()]
        );
    }

    #[test]
    fn test_parse_record_extra_columns_are_dropped() {
        let payload: &[u8] = &[0x03, 0x01, 0x01, 0x0a, 0x0b];
        assert_eq!(parse_record(payload, 1).unwrap(), vec![Int(10)]);
    }

    #[test]
    fn test_parse_record_rejects_reserved_serial_type() {
        let payload: &[u8] = &[0x02, 0x0a];
        assert!(parse_record(payload, 1).is_err());
    }

    #[test]
    fn test_parse_record_rejects_truncated_header() {
        // Header claims 4 bytes but the payload ends first.
        let payload: &[u8] = &[0x04, 0x01];
        assert!(parse_record(payload, 1).is_err());
    }
}
