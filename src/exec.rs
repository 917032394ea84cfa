//! exec plans and runs one parsed SELECT statement against a database.
//!
//! Two row-producing paths exist. The general one scans the whole table
//! btree and filters in memory. When the statement has an equality
//! predicate and some index's first indexed column is the predicate
//! column, the index btree is searched for the matching rowids first and
//! the table btree walk is pruned to the pages that may contain them.
//! Both paths produce rows in ascending rowid order.

use std::cmp::Ordering;

use tracing::debug;

use crate::ast::{self, Projection};
use crate::btree;
use crate::pager::Pager;
use crate::record;
use crate::schema::{Schema, Table};
use crate::sql_type::SqlType;
use crate::sql_value::{self, SqlValue};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Table {0} not found in database.")]
    UnknownTable(String),
    #[error("Column {0} not found in table {1}.")]
    UnknownColumn(String, String),
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),
    #[error("{0}")]
    Btree(#[from] btree::Error),
    #[error("{0}")]
    Record(#[from] record::Error),
}

/// One output row: the projected values, in projection order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_id: u64,
    pub items: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Count(usize),
    Rows(Vec<Row>),
}

pub fn run_select(
    pager: &Pager,
    schema: &Schema,
    stmt: &ast::SelectStatement,
) -> Result<QueryOutput, Error> {
    let table = schema
        .table(&stmt.tablename)
        .ok_or_else(|| Error::UnknownTable(stmt.tablename.clone()))?;

    let rows = match &stmt.filter {
        Some(filter) => filtered_rows(pager, schema, table, filter)?,
        None => scan_rows(pager, table)?,
    };

    match &stmt.projection {
        Projection::CountStar => Ok(QueryOutput::Count(rows.len())),
        Projection::Columns(names) => {
            let positions = names
                .iter()
                .map(|n| {
                    table
                        .column_index(n)
                        .ok_or_else(|| Error::UnknownColumn(n.clone(), table.name.clone()))
                })
                .collect::<Result<Vec<usize>, Error>>()?;
            Ok(QueryOutput::Rows(
                rows.into_iter()
                    .map(|r| Row {
                        row_id: r.row_id,
                        items: positions.iter().map(|&i| r.items[i].clone()).collect(),
                    })
                    .collect(),
            ))
        }
    }
}

/// Decodes one cell into a full row of the table, substituting the rowid
/// for the identity column's stored NULL.
fn decode_row(table: &Table, row_id: u64, payload: &[u8]) -> Result<Row, Error> {
    let mut items = record::parse_record(payload, table.columns.len())?;
    if let Some(i) = table.identity_column {
        items[i] = SqlValue::Int(row_id as i64);
    }
    Ok(Row { row_id, items })
}

fn scan_rows(pager: &Pager, table: &Table) -> Result<Vec<Row>, Error> {
    debug!(table = %table.name, root_page = table.root_page, "full table scan");
    let mut rows = vec![];
    for item in btree::table::Iterator::new(table.root_page, pager) {
        let (row_id, payload) = item?;
        rows.push(decode_row(table, row_id, payload)?);
    }
    Ok(rows)
}

/// The comparison policy: the predicate literal has to agree with the
/// column's declared type before any row is read. Columns without a
/// declared type fall through to the storage-class comparison at run time.
fn check_literal_against_declared_type(
    table: &Table,
    col_idx: usize,
    probe: &SqlValue,
) -> Result<(), Error> {
    let col = &table.columns[col_idx];
    let agrees = match (col.sql_type, probe) {
        (None, _) => true,
        (Some(SqlType::Text), SqlValue::Text(_)) => true,
        (Some(SqlType::Int) | Some(SqlType::Real), SqlValue::Int(_) | SqlValue::Real(_)) => true,
        _ => false,
    };
    if agrees {
        Ok(())
    } else {
        Err(Error::UnsupportedQuery(format!(
            "cannot compare column {} with a {} literal",
            col.name,
            probe.storage_class()
        )))
    }
}

/// Mixed-type comparisons discovered inside the index walk surface as the
/// same unsupported-query failure the scan path reports.
fn index_search_error(e: btree::Error) -> Error {
    match e {
        btree::Error::KeyCompare(tm) => Error::UnsupportedQuery(tm.to_string()),
        other => Error::Btree(other),
    }
}

fn filtered_rows(
    pager: &Pager,
    schema: &Schema,
    table: &Table,
    filter: &ast::WhereEq,
) -> Result<Vec<Row>, Error> {
    let col_idx = table
        .column_index(&filter.column)
        .ok_or_else(|| Error::UnknownColumn(filter.column.clone(), table.name.clone()))?;
    let probe = filter.value.to_sql_value();
    check_literal_against_declared_type(table, col_idx, &probe)?;

    if let Some(index) = schema.index_on(&table.name, &filter.column) {
        debug!(index = %index.name, root_page = index.root_page, "index-driven scan");
        let entries =
            btree::index::find_equal(pager, index.root_page, &probe, index.columns.len())
                .map_err(index_search_error)?;
        let row_ids: Vec<u64> = entries.iter().map(|e| e.row_id).collect();
        let found = btree::table::lookup_rows(pager, table.root_page, &row_ids)?;
        return found
            .into_iter()
            .map(|(row_id, payload)| decode_row(table, row_id, payload))
            .collect();
    }

    debug!(table = %table.name, column = %filter.column, "full scan with in-memory filter");
    let mut rows = vec![];
    for item in btree::table::Iterator::new(table.root_page, pager) {
        let (row_id, payload) = item?;
        let row = decode_row(table, row_id, payload)?;
        // NULL never equals anything.
        if matches!(row.items[col_idx], SqlValue::Null()) {
            continue;
        }
        match sql_value::compare(&row.items[col_idx], &probe) {
            Ok(Ordering::Equal) => rows.push(row),
            Ok(_) => (),
            Err(tm) => return Err(Error::UnsupportedQuery(tm.to_string())),
        }
    }
    Ok(rows)
}
