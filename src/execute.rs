//! Run compiled queries against a SQLite database.
//!
//! Used by the CLI's `--execute` flag to preview formatted values and by the
//! integration tests. Rendering always uses the SQLite dialect, so the
//! query's bound parameters line up with rusqlite's `?` placeholders.

use std::path::Path;

use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use crate::sql::{Dialect, Literal, Query};

/// Errors raised while executing a compiled query.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Result set with every value rendered as text. NULL is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryRows {
    /// Values of one column, by name.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }
}

/// Open a database file read-only.
pub fn open_readonly<P: AsRef<Path>>(path: P) -> ExecuteResult<Connection> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

/// Render `query` for SQLite, bind its parameters and fetch all rows.
pub fn run_query(conn: &Connection, query: &Query) -> ExecuteResult<QueryRows> {
    let rendered = query.render(Dialect::Sqlite);
    log::debug!("executing {} with {} params", rendered.sql, rendered.params.len());

    let mut stmt = conn.prepare(&rendered.sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();
    let params = rendered.params.iter().map(to_value);

    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(value_text))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(QueryRows { columns, rows })
}

fn to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::Integer(*n),
        Literal::String(s) => Value::Text(s.clone()),
    }
}

fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(format!("<{} bytes>", b.len())),
    }
}
