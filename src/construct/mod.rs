//! Join graph construction for one compiled expression.
//!
//! A [`QueryConstruct`] owns everything that accumulates while a formatter is
//! compiled: the joins it needed, a cache so each relationship is joined only
//! once per source alias, the tree-rank ancestor chains and the extra filters
//! they register. It is threaded through the compiler by value:
//!
//! ```ignore
//! let qc = QueryConstruct::new(&catalog, collection_object.id);
//! let root = qc.root().clone();
//! let (qc, accession, field) = qc.build_join(&root, "accession.accessionNumber")?;
//! let query = qc.into_query(vec![table_col(&accession.alias, &field.unwrap().column)]);
//! ```
//!
//! Correlated sub-queries get a child construct whose aliases carry a scope
//! prefix derived from their position (`sq1_`, `sq1_sq2_`, ...), so aliases
//! and aggregate labels stay unique across the whole expression without any
//! shared counter.

mod tree_rank;

use log::debug;
use std::collections::HashMap;

use crate::catalog::{resolve_path, Catalog, FieldDef, RelationshipDef, TableId};
use crate::error::FormatResult;
use crate::sql::{or_all, table_col, Expr, ExprExt, Query, SelectExpr, TableRef};

/// A table instance in the FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub table: TableId,
    pub alias: String,
}

impl TableAlias {
    /// `alias.column`
    pub fn col(&self, column: &str) -> Expr {
        table_col(&self.alias, column)
    }
}

/// A LEFT JOIN registered on the construct.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    pub target: TableAlias,
    pub on: Expr,
}

/// Cached ancestor chain and resolved ranks of one tree-node alias.
#[derive(Debug, Clone, Default)]
pub(crate) struct TreeRankEntry {
    /// Level 0 is the node itself, then parent, grandparent, ...
    pub ancestors: Vec<String>,
    /// Lowercased rank → (tree definition id, tree definition item id) pairs.
    pub ranks: HashMap<String, Vec<(i64, i64)>>,
}

/// Request-scoped join graph builder.
#[derive(Debug, Clone)]
#[must_use = "QueryConstruct is threaded by value; use the returned construct"]
pub struct QueryConstruct<'a> {
    catalog: &'a Catalog,
    root: TableAlias,
    /// Alias prefix of this scope; empty at the top level.
    scope: String,
    joins: Vec<JoinStep>,
    /// (source alias, lowercased relationship name) → joined alias
    join_cache: HashMap<(String, String), TableAlias>,
    alias_seq: usize,
    subquery_seq: usize,
    tree_ranks: HashMap<String, TreeRankEntry>,
    filters: Vec<Expr>,
}

impl<'a> QueryConstruct<'a> {
    /// Top-level construct rooted at `table`.
    pub fn new(catalog: &'a Catalog, table: TableId) -> Self {
        Self::scoped(catalog, table, String::new())
    }

    fn scoped(catalog: &'a Catalog, table: TableId, scope: String) -> Self {
        let root = TableAlias {
            table,
            alias: format!("{}{}", scope, catalog.table(table).name.to_lowercase()),
        };
        Self {
            catalog,
            root,
            scope,
            joins: Vec::new(),
            join_cache: HashMap::new(),
            alias_seq: 0,
            subquery_seq: 0,
            tree_ranks: HashMap::new(),
            filters: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// The FROM table of this scope.
    pub fn root(&self) -> &TableAlias {
        &self.root
    }

    /// Alias prefix of this scope (empty at the top level).
    pub fn scope_id(&self) -> &str {
        &self.scope
    }

    /// Select label of an aggregate built in this scope.
    pub fn aggregate_label(&self) -> String {
        format!("{}agg", self.scope)
    }

    pub fn joins(&self) -> &[JoinStep] {
        &self.joins
    }

    pub fn filters(&self) -> &[Expr] {
        &self.filters
    }

    /// Open a correlated sub-query scope rooted at `table`.
    ///
    /// The child's scope id is derived from this scope's id and the number of
    /// sub-queries opened here so far.
    pub fn subquery(mut self, table: TableId) -> (Self, QueryConstruct<'a>) {
        self.subquery_seq += 1;
        let scope = format!("{}sq{}_", self.scope, self.subquery_seq);
        let child = QueryConstruct::scoped(self.catalog, table, scope);
        (self, child)
    }

    /// Fresh alias for another instance of `table`.
    fn next_alias(&mut self, table: TableId) -> TableAlias {
        self.alias_seq += 1;
        TableAlias {
            table,
            alias: format!(
                "{}{}_{}",
                self.scope,
                self.catalog.table(table).name.to_lowercase(),
                self.alias_seq
            ),
        }
    }

    /// Register a LEFT JOIN of a new instance of `table`.
    pub(crate) fn push_join(
        &mut self,
        table: TableId,
        on: impl FnOnce(&TableAlias) -> Expr,
    ) -> TableAlias {
        let target = self.next_alias(table);
        let on = on(&target);
        self.joins.push(JoinStep {
            target: target.clone(),
            on,
        });
        target
    }

    /// Join `relationship` from `from`, reusing an earlier join of the same
    /// relationship from the same alias.
    pub fn join(mut self, from: &TableAlias, relationship: &'a RelationshipDef) -> (Self, TableAlias) {
        let key = (from.alias.clone(), relationship.name.to_lowercase());
        if let Some(existing) = self.join_cache.get(&key) {
            debug!(
                "reusing join {} for {}.{}",
                existing.alias, from.alias, relationship.name
            );
            let existing = existing.clone();
            return (self, existing);
        }

        let catalog = self.catalog;
        let target = self.push_join(relationship.target, |to| {
            join_condition(catalog, from, relationship, to)
        });
        debug!(
            "joined {}.{} as {}",
            from.alias, relationship.name, target.alias
        );
        self.join_cache.insert(key, target.clone());
        (self, target)
    }

    /// Join each relationship in turn, starting at `from`.
    pub fn join_relationships(
        self,
        from: &TableAlias,
        relationships: &[&'a RelationshipDef],
    ) -> (Self, TableAlias) {
        relationships
            .iter()
            .fold((self, from.clone()), |(qc, alias), rel| qc.join(&alias, rel))
    }

    /// Join the relationship segments of `path` starting at `alias`.
    ///
    /// Returns the alias reached and, when the path ends in a scalar field,
    /// that field. Paths ending in a relationship or a tree rank stop before
    /// the final segment.
    pub fn build_join(
        self,
        alias: &TableAlias,
        path: &str,
    ) -> FormatResult<(Self, TableAlias, Option<&'a FieldDef>)> {
        let spec = resolve_path(self.catalog, alias.table, path)?;
        let (qc, reached) = self.join_relationships(alias, &spec.join_path);
        Ok((qc, reached, spec.field()))
    }

    /// Register an extra predicate for the WHERE clause.
    pub fn add_filter(mut self, filter: Expr) -> Self {
        self.filters.push(filter);
        self
    }

    /// All registered filters OR-combined, if any.
    pub fn filter_expr(&self) -> Option<Expr> {
        let combined = or_all(self.filters.clone())?;
        if self.filters.len() > 1 {
            Some(Expr::Paren(Box::new(combined)))
        } else {
            Some(combined)
        }
    }

    /// Apply this construct's joins and filters to a caller-built query whose
    /// FROM clause already names the root alias.
    pub fn apply_to(self, mut query: Query) -> Query {
        let filter = self.filter_expr();
        for step in self.joins {
            let table = self.catalog.table(step.target.table);
            query = query.left_join(
                TableRef::new(&table.sql_table).with_alias(&step.target.alias),
                step.on,
            );
        }
        match filter {
            Some(f) => query.filter(f),
            None => query,
        }
    }

    /// `SELECT <select> FROM root <joins> WHERE <filters>`
    pub fn into_query(self, select: Vec<SelectExpr>) -> Query {
        let root_table = self.catalog.table(self.root.table);
        let from = TableRef::new(&root_table.sql_table).with_alias(&self.root.alias);
        let query = Query::new().select(select).from(from);
        self.apply_to(query)
    }
}

/// Predicate joining `relationship` from `from` to the instance `to` of its
/// target table.
///
/// An owning side joins on its own column, a non-owning side on the column
/// of the inverse relationship.
pub fn join_condition(
    catalog: &Catalog,
    from: &TableAlias,
    relationship: &RelationshipDef,
    to: &TableAlias,
) -> Expr {
    let source = catalog.table(from.table);
    let target = catalog.table(relationship.target);

    if let Some(column) = &relationship.column {
        return to.col(&target.id_column).eq(from.col(column));
    }

    // Catalog validation guarantees the inverse exists and owns a column
    let inverse_column = relationship
        .other_side
        .as_deref()
        .and_then(|other| target.relationship(other))
        .and_then(|inverse| inverse.column.as_deref())
        .unwrap_or(&source.id_column);
    to.col(inverse_column).eq(from.col(&source.id_column))
}
