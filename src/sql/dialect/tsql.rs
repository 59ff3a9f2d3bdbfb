//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - OFFSET FETCH for row limits (requires ORDER BY)
//! - N'...' prefix for Unicode strings
//! - `@Pn` named parameters
//! - `ISNULL(x, y)` takes the type of `x`: `ISNULL(int, '')` yields `0`
//! - Predicates cannot be selected as values
//! - `STRING_AGG(x, sep) WITHIN GROUP (ORDER BY o)`
//! - `FORMAT` with .NET format strings
//! - CONCAT() for string concatenation (`+` adds numeric operands)

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn placeholder(&self, n: usize) -> String {
        helpers::placeholder_at(n)
    }

    fn emit_limit(&self, limit: u64) -> TokenStream {
        helpers::emit_limit_tsql(limit)
    }

    fn requires_order_by_for_limit(&self) -> bool {
        true
    }

    fn concat_operator(&self) -> &'static str {
        "+"
    }

    fn supports_concat_operator(&self) -> bool {
        false
    }

    fn null_function(&self) -> &'static str {
        "ISNULL"
    }

    fn emit_text(&self, expr: &TokenStream) -> TokenStream {
        helpers::emit_cast(expr, self.emit_data_type(&DataType::Text))
    }

    fn emit_bool_flag(&self, expr: &TokenStream) -> TokenStream {
        helpers::emit_nonzero_case(expr)
    }

    fn emit_string_agg(
        &self,
        expr: &TokenStream,
        separator: &TokenStream,
        order_by: Option<&TokenStream>,
    ) -> TokenStream {
        helpers::emit_string_agg_within_group(expr, separator, order_by)
    }

    fn emit_date_format(&self, expr: &TokenStream, pattern: &str) -> TokenStream {
        helpers::emit_date_format_value_first("FORMAT", expr, pattern, helpers::DateStyle::DotNet)
    }

    fn max_decimal_precision(&self) -> u8 {
        38
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_tsql(&dt.clamp_precision(self.max_decimal_precision()))
    }
}
