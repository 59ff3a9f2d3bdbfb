//! Aggregation of to-many relationships into correlated sub-queries.

use log::{info, warn};

use super::{CycleStack, ObjectFormatter};
use crate::catalog::RelationshipDef;
use crate::config::FieldDirective;
use crate::construct::{join_condition, QueryConstruct, TableAlias};
use crate::error::FormatResult;
use crate::sql::{
    blank_nulls, lit_str, string_agg, table_col, Expr, ExprExt, OrderByExpr, Query, TableRef,
};

/// Placeholder for a relationship whose aggregator cannot be resolved.
pub const AGGREGATOR_NOT_DEFINED: &str = "<Aggregator not defined.>";

impl<'a> ObjectFormatter<'a> {
    /// Aggregate the rows related to `owner` through the to-many
    /// `relationship` into one separator-joined string.
    ///
    /// Produces a null-coalesced correlated scalar sub-query. Its single
    /// select item is labelled `<scope>agg` after the sub-query's position,
    /// e.g. `sq1_agg` or `sq1_sq2_agg` when nested.
    ///
    /// The result is an expression, not a select item: it is usually
    /// concatenated into an enclosing format. Callers that select it directly
    /// give it their own alias, as [`ObjectFormatter::aggregate_query`] does
    /// with the relationship name.
    pub fn aggregate(
        &self,
        qc: QueryConstruct<'a>,
        owner: &TableAlias,
        relationship: &'a RelationshipDef,
        aggregator_name: Option<&str>,
        stack: &CycleStack,
    ) -> FormatResult<(QueryConstruct<'a>, Expr)> {
        let related = self.catalog.table(relationship.target);
        let Some(aggregator) = self.resolve_aggregator(related, aggregator_name) else {
            warn!(
                "no aggregator for {} (requested {:?})",
                related.name, aggregator_name
            );
            return Ok((qc, lit_str(AGGREGATOR_NOT_DEFINED)));
        };
        let limit = aggregator.limit()?;

        let (qc, sub) = qc.subquery(related.id);
        let rows = sub.root().clone();
        let label = sub.aggregate_label();
        info!(
            "aggregating {}.{} as {} with {}",
            owner.alias,
            relationship.name,
            label,
            aggregator.name.as_deref().unwrap_or(&related.name)
        );

        let (sub, formatted) = self.format(sub, &rows, aggregator.format.as_deref(), stack)?;

        let order_field = aggregator
            .orderfieldname
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let (sub, order) = match order_field {
            Some(path) => {
                let (sub, expr, _) = self.build_field_expression(
                    sub,
                    &rows,
                    &FieldDirective::path(path),
                    stack,
                    false,
                )?;
                (sub, expr)
            }
            None => (sub, rows.col(&related.id_column)),
        };

        let correlation = join_condition(self.catalog, owner, relationship, &rows);
        let separator = aggregator.separator.as_deref();

        let query = match limit {
            None => sub
                .into_query(vec![string_agg(formatted, Some(order), separator).alias(&label)])
                .filter(correlation),
            Some(count) => {
                // Limit first, aggregate outside
                let limited = format!("{}rows", sub.scope_id());
                let inner = sub
                    .into_query(vec![formatted.alias("value"), order.clone().alias("ord")])
                    .filter(correlation)
                    .order_by(vec![OrderByExpr::asc(order)])
                    .limit(count);
                Query::new()
                    .select(vec![string_agg(
                        table_col(&limited, "value"),
                        Some(table_col(&limited, "ord")),
                        separator,
                    )
                    .alias(&label)])
                    .from(TableRef::derived(inner, &limited))
            }
        };

        Ok((qc, blank_nulls(Expr::from(query))))
    }
}
