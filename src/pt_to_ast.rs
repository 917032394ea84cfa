//! `pt_to_ast` has routines for converting parse trees to ASTs for SQL.
//! A pest parse tree has one enum for all possible terminals and
//! non-terminals. The AST has one type per statement form and discards
//! lexical detail like case, quoting and position in the input.

use anyhow::{bail, Context, Result};

use crate::ast;
use crate::parser::{Rule, SQLParser};
use crate::pest::Parser;

/// Text of a column/table/index name pair, with double-quoting removed.
fn name_text(pair: pest::iterators::Pair<'_, Rule>) -> String {
    let inner = pair
        .into_inner()
        .next()
        .expect("name rules wrap an identifier");
    match inner.as_rule() {
        Rule::bare_identifier => String::from(inner.as_str()),
        Rule::quoted_identifier => {
            let s = inner.as_str();
            s[1..s.len() - 1].replace("\"\"", "\"")
        }
        _ => unreachable!(),
    }
}

fn remove_single_quoting(s: &str) -> String {
    s[1..s.len() - 1].replace("''", "'")
}

#[test]
fn test_remove_single_quoting() {
    let cases = [
        ("''", ""),
        ("'hi'", "hi"),
        ("'h''i'", "h'i"),
        ("'h''''i'", "h''i"),
        ("'france'", "france"),
    ];
    for case in cases {
        assert_eq!(remove_single_quoting(case.0), case.1.to_string());
    }
}

pub fn parse_literal_from_rule(pair: pest::iterators::Pair<'_, Rule>) -> Result<ast::Literal> {
    match pair.as_rule() {
        Rule::literal => parse_literal_from_rule(
            pair.into_inner()
                .next()
                .expect("literal rules wrap one alternative"),
        ),
        Rule::string_literal => Ok(ast::Literal::String(remove_single_quoting(pair.as_str()))),
        Rule::integer_literal => Ok(ast::Literal::Int(
            str::parse::<i64>(pair.as_str()).context("integer literal out of range")?,
        )),
        Rule::decimal_literal => {
            // Danger: floating point conversion.
            Ok(ast::Literal::Real(
                str::parse::<f64>(pair.as_str()).context("decimal literal out of range")?,
            ))
        }
        _ => bail!(
            "parse_literal_from_rule does not handle {:?}",
            pair.as_rule()
        ),
    }
}

pub fn parse_select_statement(query: &str) -> Result<ast::SelectStatement> {
    let select_stmt = SQLParser::parse(Rule::select_stmt, query)?
        .next()
        .expect("a successful parse holds one select_stmt");

    let mut projection = None;
    let mut tablename = None;
    let mut filter = None;
    for s in select_stmt.into_inner() {
        match s.as_rule() {
            Rule::select_items => {
                let item = s
                    .into_inner()
                    .next()
                    .expect("select_items wraps one alternative");
                projection = Some(match item.as_rule() {
                    Rule::count_star => ast::Projection::CountStar,
                    Rule::column_list => {
                        ast::Projection::Columns(item.into_inner().map(name_text).collect())
                    }
                    _ => unreachable!(),
                });
            }
            Rule::table_identifier => tablename = Some(name_text(s)),
            Rule::where_clause => {
                let mut inner = s.into_inner();
                let column = name_text(inner.next().expect("where clause has a column"));
                let value =
                    parse_literal_from_rule(inner.next().expect("where clause has a literal"))?;
                filter = Some(ast::WhereEq { column, value });
            }
            Rule::EOI => (),
            _ => bail!("Unable to parse select statement at: {}", s.as_str()),
        }
    }
    Ok(ast::SelectStatement {
        projection: projection.expect("grammar guarantees select items"),
        tablename: tablename.expect("grammar guarantees a from table"),
        filter,
    })
}

pub fn parse_create_table_statement(c: &str) -> Result<ast::CreateTableStatement> {
    let create_stmt = SQLParser::parse(Rule::create_table_stmt, c)?
        .next()
        .expect("a successful parse holds one create_table_stmt");

    let mut tablename = String::new();
    let mut coldefs: Vec<ast::ColDef> = vec![];
    for p in create_stmt.into_inner() {
        match p.as_rule() {
            Rule::table_identifier => tablename = name_text(p),
            Rule::column_def => {
                let mut colname = None;
                let mut coltype = None;
                let mut primary_key = false;
                for q in p.into_inner() {
                    match q.as_rule() {
                        Rule::column_name => colname = Some(name_text(q)),
                        Rule::type_name => coltype = Some(String::from(q.as_str())),
                        Rule::column_constraint => {
                            let c0 = q
                                .into_inner()
                                .next()
                                .expect("column_constraint wraps one alternative");
                            if c0.as_rule() == Rule::primary_key {
                                primary_key = true;
                            }
                        }
                        _ => unreachable!(),
                    }
                }
                coldefs.push(ast::ColDef {
                    colname: colname.expect("grammar guarantees a column name"),
                    coltype,
                    primary_key,
                });
            }
            Rule::EOI => (),
            _ => bail!("Unable to parse create table statement at: {}", p.as_str()),
        }
    }
    Ok(ast::CreateTableStatement { tablename, coldefs })
}

pub fn parse_create_index_statement(c: &str) -> Result<ast::CreateIndexStatement> {
    let create_stmt = SQLParser::parse(Rule::create_index_stmt, c)?
        .next()
        .expect("a successful parse holds one create_index_stmt");

    let mut indexname = String::new();
    let mut tablename = String::new();
    let mut columns: Vec<String> = vec![];
    for p in create_stmt.into_inner() {
        match p.as_rule() {
            Rule::index_identifier => indexname = name_text(p),
            Rule::table_identifier => tablename = name_text(p),
            Rule::column_name => columns.push(name_text(p)),
            Rule::EOI => (),
            _ => bail!("Unable to parse create index statement at: {}", p.as_str()),
        }
    }
    Ok(ast::CreateIndexStatement {
        indexname,
        tablename,
        columns,
    })
}
