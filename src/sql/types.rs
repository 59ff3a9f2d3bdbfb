//! SQL-level data types used as `CAST` targets.
//!
//! These are distinct from the catalog's semantic [`FieldType`](crate::catalog::FieldType),
//! which describes what a column holds rather than what an expression is
//! converted into.

use std::fmt;

/// SQL data type for `CAST(expr AS <type>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed integer.
    Integer,

    /// Fixed-precision decimal: precision (total digits), then scale.
    Decimal(u8, u8),

    /// Variable-length string without a length limit.
    Text,
}

impl DataType {
    /// Same type with decimal precision limited to `max_precision`.
    ///
    /// Scale is reduced along with precision so it never exceeds it.
    pub fn clamp_precision(self, max_precision: u8) -> Self {
        match self {
            DataType::Decimal(p, s) if p > max_precision => {
                DataType::Decimal(max_precision, s.min(max_precision))
            }
            other => other,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Decimal(p, s) => write!(f, "DECIMAL({}, {})", p, s),
            DataType::Text => write!(f, "TEXT"),
        }
    }
}
