//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (PG/DuckDB/SQLite), `` ` `` (MySQL), `[]` (T-SQL)
//! - Bound parameter placeholders: `?` vs `$n` vs `@Pn`
//! - Null coalescing: IFNULL vs COALESCE vs ISNULL
//! - String aggregation: GROUP_CONCAT vs STRING_AGG, and where ORDER BY goes
//! - Date formatting functions and their format-string syntax
//! - Whether non-text values must be cast before mixing with text
//!
//! # Usage
//!
//! ```ignore
//! use objformat::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! ```
//!
//! # Minimum Version Requirements
//!
//! | Feature | PostgreSQL | SQL Server | MySQL | DuckDB | SQLite |
//! |---------|-----------|------------|-------|--------|--------|
//! | Ordered string aggregate | 9.0+ | 2017+ | 5.0+ | ✓ | 3.44+ |
//! | Derived tables with LIMIT | ✓ | 2012+ (OFFSET FETCH) | ✓ | ✓ | ✓ |

mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;
mod tsql;

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};

use super::token::{Token, TokenStream};
use super::types::DataType;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - PostgreSQL/DuckDB/SQLite: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - T-SQL: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    /// Override for Unicode prefix (T-SQL N'...').
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Placeholder for the `n`-th bound parameter (1-based).
    ///
    /// - MySQL/SQLite: `?` (default)
    /// - PostgreSQL/DuckDB: `$n`
    /// - T-SQL: `@Pn`
    fn placeholder(&self, n: usize) -> String {
        helpers::placeholder_question(n)
    }

    // =========================================================================
    // Row Limits
    // =========================================================================

    /// Emit the clause keeping the first `limit` rows.
    ///
    /// - PostgreSQL/DuckDB/MySQL/SQLite: `LIMIT n` (default)
    /// - T-SQL: `OFFSET 0 ROWS FETCH NEXT n ROWS ONLY`
    fn emit_limit(&self, limit: u64) -> TokenStream {
        helpers::emit_limit_standard(limit)
    }

    /// Whether a row limit needs an ORDER BY clause (T-SQL OFFSET FETCH).
    fn requires_order_by_for_limit(&self) -> bool {
        false
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// String concatenation operator.
    ///
    /// - PostgreSQL/DuckDB/SQLite: `||`
    /// - T-SQL: `+`
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Whether concatenation uses [`concat_operator`](Self::concat_operator);
    /// otherwise it is emitted as `CONCAT(a, b)`.
    ///
    /// MySQL reads `||` as logical OR; T-SQL's `+` adds numeric operands.
    fn supports_concat_operator(&self) -> bool {
        true
    }

    // =========================================================================
    // Null Coalescing / Text Conversion
    // =========================================================================

    /// Two-argument function replacing NULL with a fallback value.
    ///
    /// - MySQL/SQLite: `IFNULL`
    /// - PostgreSQL/DuckDB: `COALESCE` (default)
    /// - T-SQL: `ISNULL`
    fn null_function(&self) -> &'static str {
        "COALESCE"
    }

    /// Emit `expr` converted to text before it meets `''`, a separator or
    /// another text value.
    ///
    /// MySQL and SQLite convert implicitly (default: unchanged). Strictly
    /// typed backends cast.
    fn emit_text(&self, expr: &TokenStream) -> TokenStream {
        expr.clone()
    }

    /// Emit a boolean column as an integer flag: 1, 0, or NULL.
    ///
    /// Default: `(x <> 0)` (MySQL, SQLite).
    fn emit_bool_flag(&self, expr: &TokenStream) -> TokenStream {
        helpers::emit_nonzero_test(expr)
    }

    // =========================================================================
    // String Aggregation
    // =========================================================================

    /// Emit an ordered string aggregation with a separator.
    ///
    /// Default: `STRING_AGG(x, sep ORDER BY o)` (PostgreSQL, DuckDB).
    fn emit_string_agg(
        &self,
        expr: &TokenStream,
        separator: &TokenStream,
        order_by: Option<&TokenStream>,
    ) -> TokenStream {
        helpers::emit_string_agg_inline_order("STRING_AGG", expr, separator, order_by)
    }

    // =========================================================================
    // Date/Time
    // =========================================================================

    /// Emit a call rendering `expr` as text with a Java-style date pattern
    /// (`yyyy-MM-dd`). The pattern is translated to the dialect's own syntax.
    ///
    /// Default: `TO_CHAR(x, 'YYYY-MM-DD')` (PostgreSQL).
    fn emit_date_format(&self, expr: &TokenStream, pattern: &str) -> TokenStream {
        helpers::emit_date_format_value_first(
            "TO_CHAR",
            expr,
            pattern,
            helpers::DateStyle::Postgres,
        )
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Largest decimal precision accepted in a `CAST`.
    fn max_decimal_precision(&self) -> u8 {
        65
    }

    /// Emit a `CAST` target type for this dialect.
    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_ansi(&dt.clamp_precision(self.max_decimal_precision()))
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    Sqlite,
    Postgres,
    DuckDb,
    TSql,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::MySql => &MySql,
            Dialect::Sqlite => &Sqlite,
            Dialect::Postgres => &Postgres,
            Dialect::DuckDb => &DuckDb,
            Dialect::TSql => &TSql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn placeholder(&self, n: usize) -> String {
        self.dialect().placeholder(n)
    }

    fn emit_limit(&self, limit: u64) -> TokenStream {
        self.dialect().emit_limit(limit)
    }

    fn requires_order_by_for_limit(&self) -> bool {
        self.dialect().requires_order_by_for_limit()
    }

    fn concat_operator(&self) -> &'static str {
        self.dialect().concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.dialect().supports_concat_operator()
    }

    fn null_function(&self) -> &'static str {
        self.dialect().null_function()
    }

    fn emit_text(&self, expr: &TokenStream) -> TokenStream {
        self.dialect().emit_text(expr)
    }

    fn emit_bool_flag(&self, expr: &TokenStream) -> TokenStream {
        self.dialect().emit_bool_flag(expr)
    }

    fn emit_string_agg(
        &self,
        expr: &TokenStream,
        separator: &TokenStream,
        order_by: Option<&TokenStream>,
    ) -> TokenStream {
        self.dialect().emit_string_agg(expr, separator, order_by)
    }

    fn emit_date_format(&self, expr: &TokenStream, pattern: &str) -> TokenStream {
        self.dialect().emit_date_format(expr, pattern)
    }

    fn max_decimal_precision(&self) -> u8 {
        self.dialect().max_decimal_precision()
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        self.dialect().emit_data_type(dt)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

/// Emit `fn(x, '')` using the dialect's null-coalescing function.
pub(crate) fn emit_blank_nulls(dialect: Dialect, expr: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName(dialect.null_function().into()))
        .lparen()
        .append(expr)
        .comma()
        .space()
        .push(Token::LitString(String::new()))
        .rparen();
    ts
}
