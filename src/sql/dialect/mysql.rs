//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Boolean is TINYINT(1), returns 1/0
//! - `||` is logical OR by default (use CONCAT())
//! - `IFNULL(x, y)` for null coalescing
//! - `GROUP_CONCAT` only takes a literal `SEPARATOR`
//! - `DATE_FORMAT` with `%i` for minutes

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    // Uses default placeholder (?), emit_limit (LIMIT n), emit_text and
    // emit_bool_flag

    fn supports_concat_operator(&self) -> bool {
        false
    }

    fn null_function(&self) -> &'static str {
        "IFNULL"
    }

    fn emit_string_agg(
        &self,
        expr: &TokenStream,
        separator: &TokenStream,
        order_by: Option<&TokenStream>,
    ) -> TokenStream {
        helpers::emit_group_concat_prefixed(expr, separator, order_by)
    }

    fn emit_date_format(&self, expr: &TokenStream, pattern: &str) -> TokenStream {
        helpers::emit_date_format_value_first(
            "DATE_FORMAT",
            expr,
            pattern,
            helpers::DateStyle::MySql,
        )
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_mysql(&dt.clamp_precision(self.max_decimal_precision()))
    }
}
