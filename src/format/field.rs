//! Scalar field formatting.

use crate::catalog::{FieldDef, FieldType, TableDef};
use crate::config::{CollectionScope, FormattingSettings};
use crate::construct::TableAlias;
use crate::sql::{
    as_text, bool_flag, cast, case_operand, concat_all, date_format, lit_int, lit_str, DataType,
    Expr,
};

/// Pattern for timestamps, independent of the configured date format.
pub const TIMESTAMP_PATTERN: &str = "yyyy-MM-ddTHH:mm:ss";

/// Pattern for dates with year precision.
pub const YEAR_PATTERN: &str = "yyyy";

/// Date precision codes stored in a date's precision field.
const PRECISION_MONTH: i64 = 2;
const PRECISION_YEAR: i64 = 3;

/// Expression for `field` of the table instance `owner`.
pub(crate) fn format_field(
    owner: &TableAlias,
    table: &TableDef,
    field: &FieldDef,
    options: &FormattingSettings,
    scope: &CollectionScope,
) -> Expr {
    let column = owner.col(&field.column);

    match field.field_type {
        FieldType::Boolean => bool_flag(column),
        FieldType::Date => {
            let full = date_format(column.clone(), &options.date_format);
            let precision = field
                .precision_field
                .as_deref()
                .and_then(|name| table.field(name));
            match precision {
                Some(precision) => case_operand(
                    owner.col(&precision.column),
                    vec![
                        (
                            lit_int(PRECISION_MONTH),
                            date_format(column.clone(), &month_pattern(&options.date_format)),
                        ),
                        (lit_int(PRECISION_YEAR), date_format(column, YEAR_PATTERN)),
                    ],
                    Some(full),
                ),
                None => full,
            }
        }
        FieldType::Timestamp => date_format(column, TIMESTAMP_PATTERN),
        _ if field.catalog_number
            && options.numeric_catalog_number
            && scope.is_numeric_catalog_number() =>
        {
            cast(column, DataType::Decimal(65, 0))
        }
        _ => column,
    }
}

/// `expr`, the formatted value of `field`, as text.
///
/// Booleans, numbers and the numeric catalog number are cast on backends
/// that will not mix them with text.
pub(crate) fn field_text(field: &FieldDef, expr: Expr) -> Expr {
    if field.field_type.is_textual() && !matches!(expr, Expr::Cast { .. }) {
        expr
    } else {
        as_text(expr)
    }
}

/// `pattern` with the day and one adjacent separator removed.
///
/// `yyyy-MM-dd` → `yyyy-MM`, `dd/MM/yyyy` → `MM/yyyy`, `MM/dd/yyyy` → `MM/yyyy`.
pub(crate) fn month_pattern(pattern: &str) -> String {
    let Some(start) = pattern.find("dd") else {
        return pattern.to_string();
    };
    let end = start + 2;
    let is_sep = |c: char| !c.is_ascii_alphabetic();

    let before = pattern[..start].chars().next_back();
    let after = pattern[end..].chars().next();
    let (from, to) = match (before, after) {
        (Some(c), _) if is_sep(c) => (start - c.len_utf8(), end),
        (_, Some(c)) if is_sep(c) => (start, end + c.len_utf8()),
        _ => (start, end),
    };

    format!("{}{}", &pattern[..from], &pattern[to..])
}

/// Substitute `expr` into the single `%s`/`%d` placeholder of `format`.
///
/// Without a placeholder the format text itself is the value.
pub(crate) fn apply_format_string(format: &str, expr: Expr) -> Expr {
    let position = ["%s", "%d"]
        .iter()
        .filter_map(|p| format.find(p))
        .min();

    match position {
        Some(i) => {
            let (prefix, suffix) = (&format[..i], &format[i + 2..]);
            let mut parts = Vec::with_capacity(3);
            if !prefix.is_empty() {
                parts.push(lit_str(prefix));
            }
            parts.push(expr);
            if !suffix.is_empty() {
                parts.push(lit_str(suffix));
            }
            concat_all(parts)
        }
        None => lit_str(format),
    }
}
