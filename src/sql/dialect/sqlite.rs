//! SQLite SQL dialect.
//!
//! SQLite differences from ANSI:
//! - Booleans are stored as integers 1/0
//! - Dynamic typing: any value concatenates as text
//! - `IFNULL(x, y)` for null coalescing
//! - `GROUP_CONCAT(x, sep ORDER BY o)` (ORDER BY inside aggregates needs 3.44+)
//! - `strftime(format, value)` argument order

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    // Uses default placeholder (?), emit_limit (LIMIT n), emit_text and
    // emit_bool_flag

    fn null_function(&self) -> &'static str {
        "IFNULL"
    }

    fn emit_string_agg(
        &self,
        expr: &TokenStream,
        separator: &TokenStream,
        order_by: Option<&TokenStream>,
    ) -> TokenStream {
        helpers::emit_string_agg_inline_order("GROUP_CONCAT", expr, separator, order_by)
    }

    fn emit_date_format(&self, expr: &TokenStream, pattern: &str) -> TokenStream {
        helpers::emit_date_format_pattern_first(
            "STRFTIME",
            expr,
            pattern,
            helpers::DateStyle::Strftime,
        )
    }
}
