use clap::Parser;
use std::path::PathBuf;

/// Available commands for the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DbInfo,
    Tables,
    Query(String),
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let is_select = s
            .trim_start()
            .get(..6)
            .map_or(false, |p| p.eq_ignore_ascii_case("select"));
        match s {
            ".dbinfo" => Ok(Command::DbInfo),
            ".tables" => Ok(Command::Tables),
            _ if is_select => Ok(Command::Query(s.to_string())),
            _ => Err(format!("Unknown command: {}", s)),
        }
    }
}

/// Command line arguments for the reader.
#[derive(Debug, Parser)]
#[clap(name = "litescan", about = "Read-only reader for SQLite 3 database files")]
pub struct Args {
    /// Path to the database file.
    pub file: PathBuf,

    /// `.dbinfo`, `.tables`, or a SELECT statement.
    pub command: Command,

    /// Trace component entry and exit on stderr.
    #[clap(long)]
    pub debug: bool,

    /// Trace byte-level decoding detail on stderr.
    #[clap(long)]
    pub trace: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_from_str() {
        let cases = vec![
            (".dbinfo", Ok(Command::DbInfo)),
            (".tables", Ok(Command::Tables)),
            (
                "SELECT name FROM apples",
                Ok(Command::Query("SELECT name FROM apples".to_string())),
            ),
            (
                "select count(*) from t",
                Ok(Command::Query("select count(*) from t".to_string())),
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<Command>(), expected, "input {:?}", input);
        }
        assert!(".schema".parse::<Command>().is_err());
        assert!("DROP TABLE t".parse::<Command>().is_err());
    }
}
