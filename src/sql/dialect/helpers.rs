//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::token::{Token, TokenStream};
use super::super::types::DataType;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL (SQL Server, Azure SQL)
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with N prefix for Unicode (T-SQL).
/// Used by: T-SQL for non-ASCII strings
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Parameter Placeholders
// =============================================================================

/// Positional `?` placeholder.
/// Used by: MySQL, SQLite
pub fn placeholder_question(_n: usize) -> String {
    "?".into()
}

/// Numbered `$n` placeholder.
/// Used by: Postgres, DuckDB
pub fn placeholder_dollar(n: usize) -> String {
    format!("${}", n)
}

/// Named `@Pn` placeholder.
/// Used by: T-SQL
pub fn placeholder_at(n: usize) -> String {
    format!("@P{}", n)
}

// =============================================================================
// Row Limits
// =============================================================================

/// Emit `LIMIT n`.
/// Used by: Postgres, DuckDB, MySQL, SQLite
pub fn emit_limit_standard(limit: u64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Limit)
        .space()
        .push(Token::LitInt(limit as i64));
    ts
}

/// Emit `OFFSET 0 ROWS FETCH NEXT n ROWS ONLY`.
/// Used by: T-SQL (requires ORDER BY)
pub fn emit_limit_tsql(limit: u64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Offset)
        .space()
        .push(Token::LitInt(0))
        .space()
        .push(Token::Rows)
        .space()
        .push(Token::Fetch)
        .space()
        .push(Token::Next)
        .space()
        .push(Token::LitInt(limit as i64))
        .space()
        .push(Token::Rows)
        .space()
        .push(Token::Only);
    ts
}

// =============================================================================
// Casts and Coercions
// =============================================================================

/// Emit `CAST(expr AS type_name)`.
pub fn emit_cast(expr: &TokenStream, type_name: String) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Cast)
        .lparen()
        .append(expr)
        .space()
        .push(Token::As)
        .space()
        .push(Token::TypeName(type_name))
        .rparen();
    ts
}

/// Emit `(expr <> 0)`.
/// Used by: MySQL, SQLite, where the comparison itself yields 1/0
pub fn emit_nonzero_test(expr: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.lparen()
        .append(expr)
        .space()
        .push(Token::Ne)
        .space()
        .push(Token::LitInt(0))
        .rparen();
    ts
}

/// Emit `CASE WHEN expr <> 0 THEN 1 WHEN expr = 0 THEN 0 END`.
/// Used by: T-SQL, which cannot select a predicate
pub fn emit_nonzero_case(expr: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Case);
    for (op, flag) in [(Token::Ne, 1), (Token::Eq, 0)] {
        ts.space()
            .push(Token::When)
            .space()
            .append(expr)
            .space()
            .push(op)
            .space()
            .push(Token::LitInt(0))
            .space()
            .push(Token::Then)
            .space()
            .push(Token::LitInt(flag));
    }
    ts.space().push(Token::End);
    ts
}

/// Emit data type for ANSI/Postgres style.
/// Used by: Postgres, DuckDB, SQLite (with precision clamped by the caller)
pub fn emit_data_type_ansi(dt: &DataType) -> String {
    dt.to_string()
}

/// Emit data type for MySQL.
///
/// MySQL only accepts a restricted set of `CAST` targets.
pub fn emit_data_type_mysql(dt: &DataType) -> String {
    match dt {
        DataType::Integer => "SIGNED".into(),
        DataType::Decimal(p, s) => format!("DECIMAL({}, {})", p, s),
        DataType::Text => "CHAR".into(),
    }
}

/// Emit data type for T-SQL.
pub fn emit_data_type_tsql(dt: &DataType) -> String {
    match dt {
        DataType::Integer => "INT".into(),
        DataType::Decimal(p, s) => format!("DECIMAL({}, {})", p, s),
        DataType::Text => "NVARCHAR(MAX)".into(),
    }
}

// =============================================================================
// String Aggregation
// =============================================================================

/// Emit `SUBSTRING(GROUP_CONCAT(CONCAT(sep, x) ORDER BY o SEPARATOR ''), CHAR_LENGTH(sep) + 1)`.
/// Used by: MySQL
///
/// MySQL only accepts a string literal after `SEPARATOR`. Each value is
/// prefixed with the bound separator instead, and the leading one is cut off,
/// so the separator is bound twice.
pub fn emit_group_concat_prefixed(
    expr: &TokenStream,
    separator: &TokenStream,
    order_by: Option<&TokenStream>,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("SUBSTRING".into()))
        .lparen()
        .push(Token::FunctionName("GROUP_CONCAT".into()))
        .lparen()
        .push(Token::FunctionName("CONCAT".into()))
        .lparen()
        .append(separator)
        .comma()
        .space()
        .append(expr)
        .rparen();
    if let Some(order) = order_by {
        ts.space().push(Token::OrderBy).space().append(order);
    }
    ts.space()
        .push(Token::Separator)
        .space()
        .push(Token::LitString(String::new()))
        .rparen()
        .comma()
        .space()
        .push(Token::FunctionName("CHAR_LENGTH".into()))
        .lparen()
        .append(separator)
        .rparen()
        .space()
        .push(Token::Plus)
        .space()
        .push(Token::LitInt(1))
        .rparen();
    ts
}

/// Emit `<name>(x, sep ORDER BY o)`.
/// Used by: SQLite (`GROUP_CONCAT`), Postgres and DuckDB (`STRING_AGG`)
pub fn emit_string_agg_inline_order(
    name: &str,
    expr: &TokenStream,
    separator: &TokenStream,
    order_by: Option<&TokenStream>,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName(name.into()))
        .lparen()
        .append(expr)
        .comma()
        .space()
        .append(separator);
    if let Some(order) = order_by {
        ts.space().push(Token::OrderBy).space().append(order);
    }
    ts.rparen();
    ts
}

/// Emit `STRING_AGG(x, sep) WITHIN GROUP (ORDER BY o)`.
/// Used by: T-SQL
pub fn emit_string_agg_within_group(
    expr: &TokenStream,
    separator: &TokenStream,
    order_by: Option<&TokenStream>,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("STRING_AGG".into()))
        .lparen()
        .append(expr)
        .comma()
        .space()
        .append(separator)
        .rparen();
    if let Some(order) = order_by {
        ts.space()
            .push(Token::WithinGroup)
            .space()
            .lparen()
            .push(Token::OrderBy)
            .space()
            .append(order)
            .rparen();
    }
    ts
}

// =============================================================================
// Date Formatting
// =============================================================================

/// Target syntax of a date format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `%Y-%m-%d` (SQLite, DuckDB `strftime`)
    Strftime,
    /// `%Y-%m-%d` with `%i` for minutes (MySQL `DATE_FORMAT`)
    MySql,
    /// `YYYY-MM-DD` (Postgres `TO_CHAR`)
    Postgres,
    /// `yyyy-MM-dd` (.NET custom format, T-SQL `FORMAT`)
    DotNet,
}

/// Translate a Java-style date pattern (`yyyy-MM-dd HH:mm:ss`) into the
/// dialect's format string.
///
/// Recognised fields are `yyyy`, `yy`, `MM`, `dd`, `HH`, `mm` and `ss`.
/// Any other letters are emitted as literal text, escaped for the target.
pub fn translate_date_pattern(pattern: &str, style: DateStyle) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        match date_field(c, run, style) {
            Some(field) => out.push_str(field),
            None if c.is_ascii_alphabetic() => {
                let literal: String = std::iter::repeat(c).take(run).collect();
                out.push_str(&escape_date_literal(&literal, style));
            }
            None => {
                for _ in 0..run {
                    out.push(c);
                }
            }
        }
        i += run;
    }

    out
}

fn date_field(c: char, run: usize, style: DateStyle) -> Option<&'static str> {
    use DateStyle::*;
    let field = match (c, run, style) {
        ('y', 4, Strftime | MySql) => "%Y",
        ('y', 2, Strftime | MySql) => "%y",
        ('y', 4, Postgres) => "YYYY",
        ('y', 2, Postgres) => "YY",
        ('M', 2, Strftime | MySql) => "%m",
        ('M', 2, Postgres) => "MM",
        ('d', 2, Strftime | MySql) => "%d",
        ('d', 2, Postgres) => "DD",
        ('H', 2, Strftime | MySql) => "%H",
        ('H', 2, Postgres) => "HH24",
        ('m', 2, Strftime) => "%M",
        ('m', 2, MySql) => "%i",
        ('m', 2, Postgres) => "MI",
        ('s', 2, Strftime) => "%S",
        ('s', 2, MySql) => "%s",
        ('s', 2, Postgres) => "SS",
        ('y', 4, DotNet) => "yyyy",
        ('y', 2, DotNet) => "yy",
        ('M', 2, DotNet) => "MM",
        ('d', 2, DotNet) => "dd",
        ('H', 2, DotNet) => "HH",
        ('m', 2, DotNet) => "mm",
        ('s', 2, DotNet) => "ss",
        _ => return None,
    };
    Some(field)
}

fn escape_date_literal(text: &str, style: DateStyle) -> String {
    match style {
        DateStyle::Strftime | DateStyle::MySql => text.to_string(),
        DateStyle::Postgres => format!("\"{}\"", text),
        DateStyle::DotNet => text.chars().map(|c| format!("\\{}", c)).collect(),
    }
}

/// Emit `fn(expr, 'fmt')`.
/// Used by: MySQL (`DATE_FORMAT`), Postgres (`TO_CHAR`), DuckDB (`STRFTIME`), T-SQL (`FORMAT`)
pub fn emit_date_format_value_first(
    name: &str,
    expr: &TokenStream,
    pattern: &str,
    style: DateStyle,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName(name.into()))
        .lparen()
        .append(expr)
        .comma()
        .space()
        .push(Token::LitString(translate_date_pattern(pattern, style)))
        .rparen();
    ts
}

/// Emit `fn('fmt', expr)`.
/// Used by: SQLite (`STRFTIME`)
pub fn emit_date_format_pattern_first(
    name: &str,
    expr: &TokenStream,
    pattern: &str,
    style: DateStyle,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName(name.into()))
        .lparen()
        .push(Token::LitString(translate_date_pattern(pattern, style)))
        .comma()
        .space()
        .append(expr)
        .rparen();
    ts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_full_date() {
        assert_eq!(
            translate_date_pattern("yyyy-MM-dd", DateStyle::Strftime),
            "%Y-%m-%d"
        );
        assert_eq!(
            translate_date_pattern("yyyy-MM-dd", DateStyle::Postgres),
            "YYYY-MM-DD"
        );
        assert_eq!(
            translate_date_pattern("dd/MM/yyyy", DateStyle::DotNet),
            "dd/MM/yyyy"
        );
    }

    #[test]
    fn test_translate_timestamp_minutes() {
        let pattern = "yyyy-MM-ddTHH:mm:ss";
        assert_eq!(
            translate_date_pattern("HH:mm:ss", DateStyle::MySql),
            "%H:%i:%s"
        );
        assert_eq!(
            translate_date_pattern("HH:mm:ss", DateStyle::Strftime),
            "%H:%M:%S"
        );
        assert_eq!(
            translate_date_pattern(pattern, DateStyle::Postgres),
            "YYYY-MM-DD\"T\"HH24:MI:SS"
        );
    }

    #[test]
    fn test_translate_literal_letters() {
        assert_eq!(
            translate_date_pattern("yyyy-MM-ddTHH", DateStyle::Strftime),
            "%Y-%m-%dT%H"
        );
        assert_eq!(
            translate_date_pattern("yyyy-MM-ddTHH", DateStyle::Postgres),
            "YYYY-MM-DD\"T\"HH24"
        );
        assert_eq!(
            translate_date_pattern("yyyy-MM-ddTHH", DateStyle::DotNet),
            "yyyy-MM-dd\\THH"
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholder_question(3), "?");
        assert_eq!(placeholder_dollar(3), "$3");
        assert_eq!(placeholder_at(3), "@P3");
    }

    #[test]
    fn test_limit_clauses() {
        assert_eq!(emit_limit_standard(2).serialize(crate::sql::Dialect::Sqlite), "LIMIT 2");
        assert_eq!(
            emit_limit_tsql(2).serialize(crate::sql::Dialect::TSql),
            "OFFSET 0 ROWS FETCH NEXT 2 ROWS ONLY"
        );
    }

    #[test]
    fn test_emit_data_type_mysql_cast_targets() {
        assert_eq!(emit_data_type_mysql(&DataType::Integer), "SIGNED");
        assert_eq!(emit_data_type_mysql(&DataType::Text), "CHAR");
        assert_eq!(
            emit_data_type_mysql(&DataType::Decimal(65, 0)),
            "DECIMAL(65, 0)"
        );
    }
}
