//! Query builder - construct SELECT queries with a fluent API.
//!
//! Only the shapes the formatter emits are supported: one FROM source
//! (table or derived), LEFT JOINs, an AND-ed WHERE clause, ascending ORDER BY
//! and a row limit.

use super::dialect::{Dialect, SqlDialect};
use super::expr::{Expr, ExprExt};
use super::token::{RenderedSql, Token, TokenStream};

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens(dialect);
        if let Some(alias) = &self.alias {
            push_alias(&mut ts, alias);
        }
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

fn push_alias(ts: &mut TokenStream, alias: &str) {
    ts.space()
        .push(Token::As)
        .space()
        .push(Token::Ident(alias.into()));
}

// =============================================================================
// Table Reference
// =============================================================================

/// Source of rows in a FROM or JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Named(String),
    /// `(SELECT ...)`; always aliased.
    Derived(Box<Query>),
}

/// A table reference with an optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub source: TableSource,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            source: TableSource::Named(table.into()),
            alias: None,
        }
    }

    /// Derived table over a subquery.
    pub fn derived(query: Query, alias: &str) -> Self {
        Self {
            source: TableSource::Derived(Box::new(query)),
            alias: Some(alias.into()),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        match &self.source {
            TableSource::Named(table) => {
                ts.push(Token::Ident(table.clone()));
            }
            TableSource::Derived(query) => {
                ts.lparen().append(&query.to_tokens(dialect)).rparen();
            }
        }
        if let Some(alias) = &self.alias {
            push_alias(&mut ts, alias);
        }
        ts
    }
}

// =============================================================================
// Joins
// =============================================================================

/// A LEFT JOIN clause. Related rows are optional, so every join is outer.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

impl Join {
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::LeftJoin).space();
        ts.append(&self.table.to_tokens(dialect));
        ts.space().push(Token::On).space();
        ts.append(&self.on.to_tokens(dialect));
        ts
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// An ascending ORDER BY expression.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct OrderByExpr {
    pub expr: Expr,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self { expr }
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens(dialect);
        ts.space().push(Token::Asc);
        ts
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// A SELECT query.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Query has no effect until converted to SQL with to_sql() or render()"]
pub struct Query {
    pub select: Vec<SelectExpr>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SELECT list.
    pub fn select(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.select = exprs.into_iter().map(|e| e.into()).collect();
        self
    }

    /// Set the FROM table.
    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    /// Add a LEFT JOIN.
    pub fn left_join(mut self, table: TableRef, on: Expr) -> Self {
        self.joins.push(Join { table, on });
        self
    }

    /// Add a WHERE condition (ANDed with existing conditions).
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(match self.where_clause {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Set the ORDER BY clause.
    pub fn order_by(mut self, exprs: Vec<OrderByExpr>) -> Self {
        self.order_by = exprs;
        self
    }

    /// Keep the first `limit` rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Select);
        for (i, select_expr) in self.select.iter().enumerate() {
            if i > 0 {
                ts.comma();
            }
            ts.newline().indent(1);
            ts.append(&select_expr.to_tokens(dialect));
        }

        if let Some(from) = &self.from {
            ts.newline().push(Token::From).space();
            ts.append(&from.to_tokens(dialect));
        }

        for join in &self.joins {
            ts.newline();
            ts.append(&join.to_tokens(dialect));
        }

        if let Some(where_clause) = &self.where_clause {
            ts.newline().push(Token::Where).space();
            ts.append(&where_clause.to_tokens(dialect));
        }

        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy).space();
            for (i, order_expr) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&order_expr.to_tokens(dialect));
            }
        } else if self.limit.is_some() && dialect.requires_order_by_for_limit() {
            // Row order is then non-deterministic
            ts.newline()
                .push(Token::OrderBy)
                .space()
                .lparen()
                .push(Token::Select)
                .space()
                .push(Token::Null)
                .rparen();
        }

        if let Some(limit) = self.limit {
            ts.newline();
            ts.append(&dialect.emit_limit(limit));
        }

        ts
    }

    /// Generate SQL text plus ordered bound parameters for a specific dialect.
    pub fn render(&self, dialect: Dialect) -> RenderedSql {
        self.to_tokens(dialect).render(dialect)
    }

    /// Generate SQL string for a specific dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.render(dialect).sql
    }
}

impl std::fmt::Display for Query {
    /// Formats the query using the default dialect (MySQL).
    ///
    /// For dialect-specific SQL, use [`Query::to_sql`] instead.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql(Dialect::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::{col, lit_int, table_col};
    use crate::sql::validate::validate_sql;

    #[test]
    fn test_filter_is_anded() {
        let query = Query::new()
            .select(vec![col("name")])
            .from(TableRef::new("agent"))
            .filter(col("AgentType").eq(1))
            .filter(col("DivisionID").eq(lit_int(3)));

        let sql = query.to_sql(Dialect::DuckDb);
        assert!(sql.contains("WHERE \"AgentType\" = 1 AND \"DivisionID\" = 3"));
    }

    #[test]
    fn test_left_join() {
        let query = Query::new()
            .select(vec![table_col("agent_1", "LastName")])
            .from(TableRef::new("collector").with_alias("collector"))
            .left_join(
                TableRef::new("agent").with_alias("agent_1"),
                table_col("agent_1", "AgentID").eq(table_col("collector", "AgentID")),
            );

        let sql = query.to_sql(Dialect::MySql);
        assert!(sql.contains("LEFT JOIN `agent` AS `agent_1` ON"));
        validate_sql(&sql, Dialect::MySql).unwrap();
        validate_sql(&query.to_sql(Dialect::TSql), Dialect::TSql).unwrap();
    }

    #[test]
    fn test_derived_table() {
        let inner = Query::new()
            .select(vec![col("x")])
            .from(TableRef::new("t"))
            .order_by(vec![OrderByExpr::asc(col("x"))])
            .limit(2);
        let outer = Query::new()
            .select(vec![col("x")])
            .from(TableRef::derived(inner, "lim"));

        let sql = outer.to_sql(Dialect::Postgres);
        assert!(sql.contains("FROM (SELECT"));
        assert!(sql.contains("LIMIT 2) AS \"lim\""));
        validate_sql(&sql, Dialect::Postgres).unwrap();
    }

    #[test]
    fn test_limit_tsql() {
        let query = Query::new()
            .select(vec![col("id")])
            .from(TableRef::new("agent"))
            .order_by(vec![OrderByExpr::asc(col("id"))])
            .limit(10);

        let sql = query.to_sql(Dialect::TSql);
        assert!(sql.contains("ORDER BY [id] ASC\nOFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"));
    }

    #[test]
    fn test_limit_tsql_without_order_by() {
        let query = Query::new()
            .select(vec![col("id")])
            .from(TableRef::new("agent"))
            .limit(10);

        let sql = query.to_sql(Dialect::TSql);
        assert!(
            sql.contains("ORDER BY (SELECT NULL)"),
            "Expected ORDER BY (SELECT NULL) placeholder, got: {}",
            sql
        );
    }
}
