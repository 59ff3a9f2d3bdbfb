//! Syntax check of emitted SQL.
//!
//! Parses rendered SQL with sqlparser-rs in the matching dialect. Used by the
//! CLI's `--validate` flag and throughout the tests.

use sqlparser::dialect::{
    DuckDbDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Emitted SQL that the dialect's parser rejects.
#[derive(Debug, thiserror::Error)]
#[error("Invalid SQL for {dialect}: {message}\nSQL: {sql}")]
pub struct SqlSyntaxError {
    pub dialect: Dialect,
    pub message: String,
    pub sql: String,
}

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// ```ignore
/// use objformat::sql::{validate_sql, Dialect};
///
/// validate_sql("SELECT * FROM agent", Dialect::Postgres)?;
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), SqlSyntaxError> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| SqlSyntaxError {
            dialect,
            message: e.to_string(),
            sql: sql.to_string(),
        })
}
