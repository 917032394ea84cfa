//! Defines an enum of the 4 basic SQL column types and conversion from the
//! type names that appear in CREATE TABLE statements.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The declared column types this reader distinguishes.
/// SQLite accepts many alias spellings; only the ones its own tooling emits
/// are mapped here, and anything else is left undeclared by the caller.
pub enum SqlType {
    Int,
    Text,
    Blob,
    Real,
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlType::Int => write!(f, "INTEGER"),
            SqlType::Text => write!(f, "TEXT"),
            SqlType::Blob => write!(f, "BLOB"),
            SqlType::Real => write!(f, "REAL"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseSqlTypeError;

impl FromStr for SqlType {
    type Err = ParseSqlTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" => Ok(SqlType::Int),
            "TEXT" | "VARCHAR" | "CHAR" | "NVARCHAR" | "CLOB" | "STRING" => Ok(SqlType::Text),
            "BLOB" => Ok(SqlType::Blob),
            "REAL" | "DOUBLE" | "FLOAT" => Ok(SqlType::Real),
            _ => Err(ParseSqlTypeError),
        }
    }
}

#[test]
fn test_sql_type_from_str() {
    let cases = vec![
        ("int", Ok(SqlType::Int)),
        ("INTEGER", Ok(SqlType::Int)),
        ("Text", Ok(SqlType::Text)),
        ("varchar", Ok(SqlType::Text)),
        ("blob", Ok(SqlType::Blob)),
        ("real", Ok(SqlType::Real)),
        ("double", Ok(SqlType::Real)),
        ("numeric", Err(ParseSqlTypeError)),
        ("", Err(ParseSqlTypeError)),
    ];
    for (input, expected) in cases {
        assert_eq!(input.parse::<SqlType>(), expected, "input {:?}", input);
    }
}
