// System Layers
//
// "pager" - opens a database file and provides an array of fixed-size
// pages. Uses "dbheader" to validate the file and size the array.
pub mod dbheader;
pub mod pager;
// "btree" - walks the table and index btrees stored in the pages, built on
// the "varint", "serial_type" and "record" decoders for the bytes inside
// the cells.
pub mod btree;
pub mod record;
pub mod serial_type;
pub mod varint;
// "schema" - reads the sqlite_schema table on page 1 into table and index
// descriptors, parsing the stored CREATE statements with "parser" /
// "pt_to_ast".
pub mod schema;
pub mod sql_type;
pub mod sql_value;
// "parser" - parses the restricted SQL dialect into a parse tree with
// pest; "pt_to_ast" turns parse trees into the ASTs in "ast".
pub mod ast;
pub mod parser;
pub mod pt_to_ast;
// "exec" - runs a parsed SELECT: chooses between a full table scan and an
// index-driven scan, filters, and projects.
pub mod exec;

extern crate pest;
#[macro_use]
extern crate pest_derive;

use anyhow::{Context, Result};
use itertools::Itertools;

use exec::QueryOutput;
use pager::Pager;
use schema::Schema;

/// Summary metadata for the `.dbinfo` command.
pub struct DbInfo {
    pub page_size: u32,
    pub num_tables: usize,
}

pub fn db_info(pager: &Pager) -> Result<DbInfo> {
    let schema = Schema::load(pager)?;
    Ok(DbInfo {
        page_size: pager.get_page_size(),
        num_tables: schema.user_tables().count(),
    })
}

/// Names of the user tables, sorted, for the `.tables` command.
pub fn list_tables(pager: &Pager) -> Result<Vec<String>> {
    let schema = Schema::load(pager)?;
    Ok(schema.user_tables().map(|t| t.name.clone()).sorted().collect())
}

/// Parses and runs one SELECT statement.
pub fn run_query(pager: &Pager, query: &str) -> Result<QueryOutput> {
    let stmt = pt_to_ast::parse_select_statement(query).context("unsupported query")?;
    let schema = Schema::load(pager)?;
    Ok(exec::run_select(pager, &schema, &stmt)?)
}
