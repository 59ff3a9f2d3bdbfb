//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect SQL.
//! It includes:
//!
//! - [`query`] - SELECT query builder (left joins, derived tables, row limits)
//! - [`expr`] - Expression AST, including the null-coalescing and
//!   string-aggregation nodes
//! - [`token`] - Token types and parameter-aware rendering
//! - [`dialect`] - SQL dialect implementations
//! - [`types`] - CAST target types
//! - [`validate`] - syntax check of emitted SQL via sqlparser

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;
pub mod types;
pub mod validate;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    as_text, blank_nulls, bool_flag, case_operand, case_when, cast, col, concat_all, date_format,
    lit_int, lit_str, or_all, string_agg, table_col, BinaryOperator, Expr, ExprExt, Literal,
    DEFAULT_SEPARATOR,
};
pub use query::{Join, OrderByExpr, Query, SelectExpr, TableRef, TableSource};
pub use token::{RenderedSql, Token, TokenStream};
pub use types::DataType;
pub use validate::{validate_sql, SqlSyntaxError};
