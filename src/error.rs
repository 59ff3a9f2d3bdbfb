//! Compilation errors.
//!
//! Missing formatter/aggregator definitions and formatter cycles are not
//! errors: they compile to literal placeholders. Everything here is fatal for
//! the whole compilation.

use crate::catalog::CatalogError;

/// Errors that abort a format or aggregate compilation.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Unknown rank '{rank}' for tree table {table}")]
    UnknownRank { table: String, rank: String },

    #[error("Rank '{rank}' matches more than one item in tree definition {tree_def} of {table}")]
    AmbiguousRank {
        table: String,
        rank: String,
        tree_def: i64,
    },

    #[error("Invalid definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },
}

pub type FormatResult<T> = Result<T, FormatError>;

impl FormatError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        FormatError::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
