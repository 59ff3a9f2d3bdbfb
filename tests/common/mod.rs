//! Shared fixtures: the sample collection catalog, its formatter definitions
//! and scope, and an in-memory SQLite database holding matching rows.

#![allow(dead_code)]

use objformat::catalog::Catalog;
use objformat::config::{CollectionScope, FormatterDefinitions};
use objformat::execute::{run_query, QueryRows};
use objformat::sql::Query;
use rusqlite::Connection;

pub const CATALOG: &str = include_str!("../fixtures/catalog.toml");
pub const DEFINITIONS: &str = include_str!("../fixtures/definitions.toml");
pub const SCOPE: &str = include_str!("../fixtures/scope.toml");
pub const DATABASE: &str = include_str!("../fixtures/collection.sql");

/// Path of the fixture settings file.
pub fn settings_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/objformat.toml")
}

pub struct Fixture {
    pub catalog: Catalog,
    pub definitions: FormatterDefinitions,
    pub scope: CollectionScope,
    pub conn: Connection,
}

impl Fixture {
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(DATABASE).unwrap();
        Self {
            catalog: Catalog::from_toml_str(CATALOG).unwrap(),
            definitions: FormatterDefinitions::from_toml_str(DEFINITIONS).unwrap(),
            scope: CollectionScope::from_toml_str(SCOPE).unwrap(),
            conn,
        }
    }

    pub fn run(&self, query: &Query) -> QueryRows {
        run_query(&self.conn, query).unwrap()
    }
}

/// `(id, value)` pairs of a two-column result.
pub fn pairs(rows: &QueryRows) -> Vec<(String, String)> {
    rows.rows
        .iter()
        .map(|row| {
            (
                row[0].clone().unwrap_or_default(),
                row[1].clone().unwrap_or_else(|| "NULL".to_string()),
            )
        })
        .collect()
}

/// Shorthand for building expected `(id, value)` pairs.
pub fn expected(rows: &[(&str, &str)]) -> Vec<(String, String)> {
    rows.iter()
        .map(|(id, value)| (id.to_string(), value.to_string()))
        .collect()
}
