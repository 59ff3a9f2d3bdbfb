//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - Native boolean type (true/false)
//! - Numbered `$n` parameters
//! - Strict typing: `COALESCE(int, '')` and mixed-type CASE branches fail
//! - `STRING_AGG(x, sep ORDER BY o)` for string aggregation
//! - `TO_CHAR` with `YYYY-MM-DD` style format strings

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, n: usize) -> String {
        helpers::placeholder_dollar(n)
    }

    // Uses default null_function (COALESCE), emit_string_agg (STRING_AGG)
    // and emit_date_format (TO_CHAR)

    fn emit_text(&self, expr: &TokenStream) -> TokenStream {
        helpers::emit_cast(expr, self.emit_data_type(&DataType::Text))
    }

    fn emit_bool_flag(&self, expr: &TokenStream) -> TokenStream {
        helpers::emit_cast(expr, self.emit_data_type(&DataType::Integer))
    }

    fn max_decimal_precision(&self) -> u8 {
        // NUMERIC allows up to 1000 digits
        u8::MAX
    }
}
