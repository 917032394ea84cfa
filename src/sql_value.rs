//! Defines an enum of all the possible values that a stored column can have.

use enum_as_inner::EnumAsInner;

#[derive(Debug, Clone, PartialEq, EnumAsInner)]
/// Holds any value a SQLite file can store in a column.
/// The variants are the storage classes of the file format:
/// NULL, INTEGER, REAL, TEXT and BLOB.
pub enum SqlValue {
    Int(i64),
    Text(String),
    Blob(Vec<u8>),
    Real(f64),
    Null(),
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Int(x) => write!(f, "{}", x),
            SqlValue::Text(x) => write!(f, "{}", x),
            SqlValue::Blob(_) => write!(f, "<BLOB>"),
            SqlValue::Real(x) => write!(f, "{}", x),
            // Row output renders NULL as nothing, like the sqlite3 shell in
            // list mode.
            SqlValue::Null() => Ok(()),
        }
    }
}

impl SqlValue {
    pub fn storage_class(&self) -> &'static str {
        match self {
            SqlValue::Int(_) => "INTEGER",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Blob(_) => "BLOB",
            SqlValue::Real(_) => "REAL",
            SqlValue::Null() => "NULL",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot compare a stored {stored} value with a {probe} value.")]
pub struct TypeMismatch {
    pub stored: &'static str,
    pub probe: &'static str,
}

/// Ordering of a stored value against a probe value.
///
/// INTEGER and REAL compare numerically with each other, TEXT compares
/// textually with TEXT, BLOB compares bytewise with BLOB. NULL sorts before
/// every other value, matching index key order. Any other pairing has no
/// defined order and is an error rather than a guess.
pub fn compare(stored: &SqlValue, probe: &SqlValue) -> Result<std::cmp::Ordering, TypeMismatch> {
    use std::cmp::Ordering;
    use SqlValue::*;

    let mismatch = || TypeMismatch {
        stored: stored.storage_class(),
        probe: probe.storage_class(),
    };
    match (stored, probe) {
        (Null(), Null()) => Ok(Ordering::Equal),
        (Null(), _) => Ok(Ordering::Less),
        (_, Null()) => Ok(Ordering::Greater),
        (Int(a), Int(b)) => Ok(a.cmp(b)),
        (Int(a), Real(b)) => (*a as f64).partial_cmp(b).ok_or_else(mismatch),
        (Real(a), Int(b)) => a.partial_cmp(&(*b as f64)).ok_or_else(mismatch),
        (Real(a), Real(b)) => a.partial_cmp(b).ok_or_else(mismatch),
        (Text(a), Text(b)) => Ok(a.as_str().cmp(b.as_str())),
        (Blob(a), Blob(b)) => Ok(a.cmp(b)),
        _ => Err(mismatch()),
    }
}

#[test]
fn test_compare_same_class() {
    use std::cmp::Ordering::*;
    use SqlValue::*;

    let cases = vec![
        (Int(1), Int(2), Less),
        (Int(2), Int(2), Equal),
        (Int(3), Int(2), Greater),
        (Real(1.5), Real(1.5), Equal),
        (Int(2), Real(2.0), Equal),
        (Real(2.5), Int(2), Greater),
        (Text("apple".to_string()), Text("banana".to_string()), Less),
        (Text("apple".to_string()), Text("apple".to_string()), Equal),
        (Blob(vec![0, 1]), Blob(vec![0, 2]), Less),
        (Null(), Int(0), Less),
        (Null(), Text(String::new()), Less),
        (Null(), Null(), Equal),
    ];
    for (stored, probe, expected) in cases {
        assert_eq!(compare(&stored, &probe), Ok(expected), "{:?} vs {:?}", stored, probe);
    }
}

#[test]
fn test_compare_mixed_class_is_an_error() {
    use SqlValue::*;

    let cases = vec![
        (Int(1), Text("1".to_string())),
        (Text("1".to_string()), Int(1)),
        (Text("x".to_string()), Real(1.0)),
        (Blob(vec![1]), Text("x".to_string())),
        (Blob(vec![1]), Int(1)),
    ];
    for (stored, probe) in cases {
        assert!(compare(&stored, &probe).is_err(), "{:?} vs {:?}", stored, probe);
    }
}
