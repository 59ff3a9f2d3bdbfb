//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible with extensions:
//! - ANSI identifier quoting (`"`)
//! - Numbered `$n` parameters
//! - Native booleans; no implicit casts from integers to text
//! - `strftime(value, format)` argument order (reversed from SQLite)
//! - DECIMAL precision capped at 38

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, n: usize) -> String {
        helpers::placeholder_dollar(n)
    }

    fn emit_text(&self, expr: &TokenStream) -> TokenStream {
        helpers::emit_cast(expr, self.emit_data_type(&DataType::Text))
    }

    fn emit_bool_flag(&self, expr: &TokenStream) -> TokenStream {
        helpers::emit_cast(expr, self.emit_data_type(&DataType::Integer))
    }

    fn emit_date_format(&self, expr: &TokenStream, pattern: &str) -> TokenStream {
        helpers::emit_date_format_value_first(
            "STRFTIME",
            expr,
            pattern,
            helpers::DateStyle::Strftime,
        )
    }

    fn max_decimal_precision(&self) -> u8 {
        38
    }
}
