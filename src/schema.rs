//! schema loads the database schema from the sqlite_schema table.
//!
//! Page 1 (the first page) is always a btree page, and it is the root page
//! of the schema table. Every row names an object of the database and, for
//! tables and indexes, the root page of its btree and the SQL text that
//! created it. The schema of the schema table itself is fixed:
//!
//!   CREATE TABLE sqlite_schema (type text, name text, tbl_name text,
//!                               rootpage integer, sql text)

use std::str::FromStr;

use tracing::debug;

use crate::btree;
use crate::pager::{PageNum, Pager};
use crate::pt_to_ast;
use crate::record;
use crate::sql_type::SqlType;
use crate::sql_value::SqlValue;

const SCHEMA_BTREE_ROOT_PAGENUM: PageNum = 1;
const SCHEMA_TABLE_NUM_COLS: usize = 5;
const SCHEMA_TABLE_TYPE_COLIDX: usize = 0;
const SCHEMA_TABLE_NAME_COLIDX: usize = 1;
const SCHEMA_TABLE_ROOTPAGE_COLIDX: usize = 3;
const SCHEMA_TABLE_SQL_COLIDX: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Schema row with invalid type {0:?}.")]
    InvalidSchemaType(String),
    #[error("Schema row column {0:?} has the wrong storage class.")]
    MalformedSchemaRow(&'static str),
    #[error("Could not parse the creation SQL of {name}: {cause}")]
    BadCreationSql { name: String, cause: anyhow::Error },
    #[error("{0}")]
    Btree(#[from] btree::Error),
    #[error("{0}")]
    Record(#[from] record::Error),
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Declared type, when the DDL declared one this reader knows.
    pub sql_type: Option<SqlType>,
}

/// One user or internal table: where its btree lives and what its rows
/// look like.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub root_page: PageNum,
    pub columns: Vec<Column>,
    /// Position of the INTEGER PRIMARY KEY column, when the table has one.
    /// That column aliases the rowid: its stored value is NULL and readers
    /// substitute the cell's rowid.
    pub identity_column: Option<usize>,
}

impl Table {
    /// Position of `name` among the columns. SQL identifiers compare
    /// case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
pub struct Index {
    pub name: String,
    pub root_page: PageNum,
    pub table_name: String,
    pub columns: Vec<String>,
}

/// All table and index descriptors of one database, built once after open.
#[derive(Debug, Clone)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub indexes: Vec<Index>,
}

fn text_column(row: &[SqlValue], idx: usize, what: &'static str) -> Result<String, Error> {
    row[idx]
        .as_text()
        .cloned()
        .ok_or(Error::MalformedSchemaRow(what))
}

fn parse_declared_type(decl: &str) -> Option<SqlType> {
    // "varchar(10)" carries its width along; only the base word maps to a
    // type.
    let base = decl.split('(').next().unwrap_or(decl).trim();
    SqlType::from_str(base).ok()
}

impl Schema {
    /// Walks the schema btree and builds the descriptors for every table
    /// and index row.
    ///
    /// The walk goes through the generic table iterator: a database with
    /// enough schema rows grows an interior root on page 1, and that shape
    /// must work too. `view` and `trigger` rows are tolerated but not
    /// represented; auto-indexes (whose `sql` is NULL) are skipped; any
    /// other row type fails the load.
    pub fn load(pager: &Pager) -> Result<Schema, Error> {
        let mut tables = vec![];
        let mut indexes = vec![];
        for item in btree::table::Iterator::new(SCHEMA_BTREE_ROOT_PAGENUM, pager) {
            let (_rowid, payload) = item?;
            let row = record::parse_record(payload, SCHEMA_TABLE_NUM_COLS)?;
            let rowtype = text_column(&row, SCHEMA_TABLE_TYPE_COLIDX, "type")?;
            let name = text_column(&row, SCHEMA_TABLE_NAME_COLIDX, "name")?;
            match rowtype.as_str() {
                "table" => {
                    let root_page = *row[SCHEMA_TABLE_ROOTPAGE_COLIDX]
                        .as_int()
                        .ok_or(Error::MalformedSchemaRow("rootpage"))?
                        as PageNum;
                    let sql = text_column(&row, SCHEMA_TABLE_SQL_COLIDX, "sql")?;
                    let cs = pt_to_ast::parse_create_table_statement(&sql).map_err(|e| {
                        Error::BadCreationSql {
                            name: name.clone(),
                            cause: e,
                        }
                    })?;
                    let identity_column = cs.coldefs.iter().position(|d| {
                        d.primary_key
                            && d.coltype
                                .as_deref()
                                .map_or(false, |t| t.eq_ignore_ascii_case("integer"))
                    });
                    let columns = cs
                        .coldefs
                        .into_iter()
                        .map(|d| Column {
                            name: d.colname,
                            sql_type: d.coltype.as_deref().and_then(parse_declared_type),
                        })
                        .collect();
                    debug!(table = %name, root_page, "loaded table descriptor");
                    tables.push(Table {
                        name,
                        root_page,
                        columns,
                        identity_column,
                    });
                }
                "index" => {
                    let root_page = *row[SCHEMA_TABLE_ROOTPAGE_COLIDX]
                        .as_int()
                        .ok_or(Error::MalformedSchemaRow("rootpage"))?
                        as PageNum;
                    // Indexes SQLite creates for UNIQUE and PRIMARY KEY
                    // constraints store no SQL text.
                    let sql = match row[SCHEMA_TABLE_SQL_COLIDX].as_text() {
                        Some(s) => s,
                        None => {
                            debug!(index = %name, "skipping auto-index without creation SQL");
                            continue;
                        }
                    };
                    let ci = pt_to_ast::parse_create_index_statement(sql).map_err(|e| {
                        Error::BadCreationSql {
                            name: name.clone(),
                            cause: e,
                        }
                    })?;
                    debug!(index = %name, table = %ci.tablename, root_page, "loaded index descriptor");
                    indexes.push(Index {
                        name,
                        root_page,
                        table_name: ci.tablename,
                        columns: ci.columns,
                    });
                }
                "view" | "trigger" => continue,
                _ => return Err(Error::InvalidSchemaType(rowtype)),
            }
        }
        Ok(Schema { tables, indexes })
    }

    /// The tables a user created. Only `sqlite_sequence`, the bookkeeping
    /// table behind AUTOINCREMENT, is dropped; `sqlite_schema` itself never
    /// produces a descriptor.
    pub fn user_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| t.name != "sqlite_sequence")
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// An index usable for an equality predicate on `column` of `table`:
    /// its target is that table and its first indexed column is that
    /// column.
    pub fn index_on(&self, table: &str, column: &str) -> Option<&Index> {
        self.indexes.iter().find(|ix| {
            ix.table_name.eq_ignore_ascii_case(table)
                && ix
                    .columns
                    .first()
                    .map_or(false, |c| c.eq_ignore_ascii_case(column))
        })
    }
}
