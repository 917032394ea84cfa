//! parser holds the pest-generated parser for the restricted SQL dialect.
//! The grammar lives in sql.pest; `pt_to_ast` turns the parse trees it
//! produces into the AST types in `ast`.

#[derive(Parser)]
#[grammar = "sql.pest"]
pub struct SQLParser;
