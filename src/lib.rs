//! # objformat
//!
//! Compiles declarative object formatters and aggregators into composable,
//! multi-dialect SQL expressions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │   Configuration (settings, definitions, scope, catalog)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [format]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ObjectFormatter (switches, directives, cycles)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [construct]
//! ┌─────────────────────────────────────────────────────────┐
//! │   QueryConstruct (join reuse, tree ranks, sub-queries)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Expr / Query → per-dialect SQL + params       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Compiled expressions are plain [`Expr`] trees and can be embedded in any
//! caller-built [`Query`].

pub mod catalog;
pub mod config;
pub mod construct;
pub mod error;
pub mod execute;
pub mod format;
pub mod sql;

pub use error::{FormatError, FormatResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{
        Cardinality, Catalog, CatalogBuilder, CatalogError, FieldType, TableId, TableSpec,
    };
    pub use crate::config::{CollectionScope, Configuration, FormatterDefinitions, Settings};
    pub use crate::construct::{QueryConstruct, TableAlias};
    pub use crate::error::{FormatError, FormatResult};
    pub use crate::format::{CycleStack, FormatOp, ObjectFormatter};
    pub use crate::sql::{
        blank_nulls, col, lit_str, string_agg, table_col, Dialect, Expr, ExprExt, OrderByExpr,
        Query, SelectExpr, SqlDialect, TableRef,
    };
}

pub use format::ObjectFormatter;
pub use sql::{Dialect, Expr, ExprExt, Query};
