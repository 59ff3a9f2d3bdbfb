//! Expression AST - the core of SQL expression building.
//!
//! This module provides a strongly-typed AST for SQL expressions
//! with exhaustive pattern matching enforced by the compiler.
//!
//! Besides the usual column/literal/operator nodes, a few node kinds carry the
//! formatting compiler's dialect-sensitive constructs:
//!
//! - [`Expr::NullToEmpty`] - replaces NULL with an empty string
//!   (`IFNULL`, `COALESCE` or `ISNULL` depending on the backend).
//! - [`Expr::StringAgg`] - ordered, separator-joined string aggregation
//!   (`GROUP_CONCAT` or `STRING_AGG`).
//! - [`Expr::AsText`] - a non-text value entering text context, cast on
//!   strictly typed backends.
//! - [`Expr::BoolFlag`] - a boolean column as a 1/0 flag.

use super::dialect::{emit_blank_nulls, helpers, Dialect, SqlDialect};
use super::query::Query;
use super::token::{RenderedSql, Token, TokenStream};
use super::types::DataType;

/// Separator used by [`Expr::StringAgg`] when none is configured.
pub const DEFAULT_SEPARATOR: &str = ",";

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Literal values, inlined into the SQL text.
    Literal(Literal),

    /// Bound parameter: a placeholder in the SQL text, value returned by
    /// [`Expr::render`].
    Param(Literal),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// CASE WHEN... THEN... ELSE... END
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    /// Scalar subquery: (SELECT ...)
    Subquery(Box<Query>),

    /// IN: expr IN (values...)
    In { expr: Box<Expr>, values: Vec<Expr> },

    /// CAST(expr AS type)
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
    },

    /// Render a date or timestamp as text with a Java-style pattern
    /// (`yyyy-MM-dd`), translated per dialect.
    DateFormat { expr: Box<Expr>, pattern: String },

    /// Null-coalescing node: NULL becomes `''`.
    ///
    /// Build with [`blank_nulls`], which never nests two of these.
    NullToEmpty(Box<Expr>),

    /// Non-text value used as text. Build with [`as_text`].
    AsText(Box<Expr>),

    /// Boolean column as an integer flag (1, 0 or NULL).
    BoolFlag(Box<Expr>),

    /// Ordered string aggregation with a separator.
    ///
    /// The separator is always sent as a bound parameter; a missing separator
    /// means [`DEFAULT_SEPARATOR`].
    StringAgg {
        expr: Box<Expr>,
        order_by: Option<Box<Expr>>,
        separator: Option<String>,
    },

    /// Parenthesized expression
    Paren(Box<Expr>),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    String(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    And,
    Or,
    Concat,
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(literal_to_token(lit));
            }

            Expr::Param(value) => {
                ts.push(Token::Param(value.clone()));
            }

            Expr::BinaryOp { left, op, right } => {
                // Dialects without a usable || operator get CONCAT(left, right)
                if *op == BinaryOperator::Concat && !dialect.supports_concat_operator() {
                    ts.push(Token::FunctionName("CONCAT".into()));
                    ts.lparen();
                    ts.append(&left.to_tokens(dialect));
                    ts.comma().space();
                    ts.append(&right.to_tokens(dialect));
                    ts.rparen();
                } else {
                    ts.append(&left.to_tokens(dialect));
                    ts.space();
                    ts.push(binary_op_to_token(*op));
                    ts.space();
                    ts.append(&right.to_tokens(dialect));
                }
            }

            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                ts.push(Token::Case);
                if let Some(op) = operand {
                    ts.space().append(&op.to_tokens(dialect));
                }
                for (when, then) in when_clauses {
                    ts.space().push(Token::When).space();
                    ts.append(&when.to_tokens(dialect));
                    ts.space().push(Token::Then).space();
                    ts.append(&then.to_tokens(dialect));
                }
                if let Some(else_expr) = else_clause {
                    ts.space().push(Token::Else).space();
                    ts.append(&else_expr.to_tokens(dialect));
                }
                ts.space().push(Token::End);
            }

            Expr::Subquery(query) => {
                ts.lparen();
                ts.append(&query.to_tokens(dialect));
                ts.rparen();
            }

            Expr::In { expr, values } => {
                // "x IN ()" is invalid SQL; an empty list matches nothing
                if values.is_empty() {
                    ts.push(Token::LitInt(1))
                        .space()
                        .push(Token::Eq)
                        .space()
                        .push(Token::LitInt(0));
                } else {
                    ts.append(&expr.to_tokens(dialect));
                    ts.space().push(Token::In).space().lparen();
                    for (i, val) in values.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.append(&val.to_tokens(dialect));
                    }
                    ts.rparen();
                }
            }

            Expr::Cast { expr, data_type } => {
                ts.append(&helpers::emit_cast(
                    &expr.to_tokens(dialect),
                    dialect.emit_data_type(data_type),
                ));
            }

            Expr::DateFormat { expr, pattern } => {
                ts.append(&dialect.emit_date_format(&expr.to_tokens(dialect), pattern));
            }

            Expr::NullToEmpty(inner) => {
                ts.append(&emit_blank_nulls(dialect, &inner.to_tokens(dialect)));
            }

            Expr::AsText(inner) => {
                ts.append(&dialect.emit_text(&inner.to_tokens(dialect)));
            }

            Expr::BoolFlag(inner) => {
                ts.append(&dialect.emit_bool_flag(&inner.to_tokens(dialect)));
            }

            Expr::StringAgg {
                expr,
                order_by,
                separator,
            } => {
                let sep = Expr::Param(Literal::String(
                    separator
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
                ));
                let order = order_by.as_ref().map(|o| o.to_tokens(dialect));
                ts.append(&dialect.emit_string_agg(
                    &expr.to_tokens(dialect),
                    &sep.to_tokens(dialect),
                    order.as_ref(),
                ));
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens(dialect));
                ts.rparen();
            }
        }

        ts
    }

    /// Render to SQL text plus the ordered values of its bound parameters.
    pub fn render(&self, dialect: Dialect) -> RenderedSql {
        self.to_tokens(dialect).render(dialect)
    }

    /// Render to SQL text only.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.render(dialect).sql
    }

    /// Whether this is a [`Expr::NullToEmpty`] node.
    pub fn is_blank_nulls(&self) -> bool {
        matches!(self, Expr::NullToEmpty(_))
    }

    /// Whether this expression always produces text on every backend.
    pub fn is_text(&self) -> bool {
        match self {
            Expr::Literal(Literal::String(_))
            | Expr::DateFormat { .. }
            | Expr::NullToEmpty(_)
            | Expr::AsText(_)
            | Expr::StringAgg { .. } => true,
            Expr::BinaryOp { op, .. } => *op == BinaryOperator::Concat,
            Expr::Paren(inner) => inner.is_text(),
            _ => false,
        }
    }
}

fn literal_to_token(lit: &Literal) -> Token {
    match lit {
        Literal::Int(n) => Token::LitInt(*n),
        Literal::String(s) => Token::LitString(s.clone()),
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Concat => Token::Concat,
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// CAST(expr AS data_type)
pub fn cast(expr: Expr, data_type: DataType) -> Expr {
    Expr::Cast {
        expr: Box::new(expr),
        data_type,
    }
}

/// Format a date/timestamp expression as text.
pub fn date_format(expr: Expr, pattern: &str) -> Expr {
    Expr::DateFormat {
        expr: Box::new(expr),
        pattern: pattern.into(),
    }
}

/// Searched CASE: `CASE WHEN c1 THEN v1 ... [ELSE e] END`.
pub fn case_when(when_clauses: Vec<(Expr, Expr)>, else_clause: Option<Expr>) -> Expr {
    Expr::Case {
        operand: None,
        when_clauses,
        else_clause: else_clause.map(Box::new),
    }
}

/// Simple CASE: `CASE operand WHEN v1 THEN r1 ... [ELSE e] END`.
pub fn case_operand(
    operand: Expr,
    when_clauses: Vec<(Expr, Expr)>,
    else_clause: Option<Expr>,
) -> Expr {
    Expr::Case {
        operand: Some(Box::new(operand)),
        when_clauses,
        else_clause: else_clause.map(Box::new),
    }
}

/// Wrap in the null-coalescing node.
///
/// Idempotent: an expression that is already wrapped is returned unchanged.
pub fn blank_nulls(expr: Expr) -> Expr {
    if expr.is_blank_nulls() {
        expr
    } else {
        Expr::NullToEmpty(Box::new(expr))
    }
}

/// `expr` as text. Expressions that are already text are returned unchanged.
pub fn as_text(expr: Expr) -> Expr {
    if expr.is_text() {
        expr
    } else {
        Expr::AsText(Box::new(expr))
    }
}

/// Boolean `expr` as a 1/0 flag.
pub fn bool_flag(expr: Expr) -> Expr {
    Expr::BoolFlag(Box::new(expr))
}

/// Ordered string aggregation of `expr`.
pub fn string_agg(expr: Expr, order_by: Option<Expr>, separator: Option<&str>) -> Expr {
    Expr::StringAgg {
        expr: Box::new(expr),
        order_by: order_by.map(Box::new),
        separator: separator.map(String::from),
    }
}

/// Concatenate parts left to right. An empty list yields `''`.
pub fn concat_all(parts: Vec<Expr>) -> Expr {
    let mut iter = parts.into_iter();
    match iter.next() {
        Some(first) => iter.fold(first, |acc, next| acc.concat(next)),
        None => lit_str(""),
    }
}

/// OR together all conditions. An empty list yields `None`.
pub fn or_all(conditions: Vec<Expr>) -> Option<Expr> {
    let mut iter = conditions.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, |acc, next| acc.or(next)))
}

// =============================================================================
// Fluent Extension Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt {
    fn into_expr(self) -> Expr;

    fn eq(self, other: impl Into<Expr>) -> Expr
    where
        Self: Sized,
    {
        binary(self.into_expr(), BinaryOperator::Eq, other.into())
    }

    fn and(self, other: impl Into<Expr>) -> Expr
    where
        Self: Sized,
    {
        binary(self.into_expr(), BinaryOperator::And, other.into())
    }

    fn or(self, other: impl Into<Expr>) -> Expr
    where
        Self: Sized,
    {
        binary(self.into_expr(), BinaryOperator::Or, other.into())
    }

    fn concat(self, other: impl Into<Expr>) -> Expr
    where
        Self: Sized,
    {
        binary(self.into_expr(), BinaryOperator::Concat, other.into())
    }

    fn in_list(self, values: Vec<Expr>) -> Expr
    where
        Self: Sized,
    {
        Expr::In {
            expr: Box::new(self.into_expr()),
            values,
        }
    }

    /// Alias this expression (for SELECT list).
    fn alias(self, name: &str) -> super::query::SelectExpr
    where
        Self: Sized,
    {
        super::query::SelectExpr {
            expr: self.into_expr(),
            alias: Some(name.into()),
        }
    }
}

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        lit_int(n as i64)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(Literal::String(s))
    }
}

impl From<Query> for Expr {
    /// Convert a Query into a scalar subquery expression.
    fn from(query: Query) -> Self {
        Expr::Subquery(Box::new(query))
    }
}

// =============================================================================
// Tests
// =============================================================================
