//! Object formatter and aggregator engine.
//!
//! Compiles formatter definitions into a single SQL expression per entity:
//!
//! ```text
//! FormatDef ─▶ switch case ─▶ field directives ─▶ scalar | tree rank | nested format | aggregate
//!                                                   │
//!                                                   ▼
//!                                  QueryConstruct (joins, rank chains, filters)
//! ```
//!
//! The engine only borrows immutable configuration. All per-request state
//! lives in the [`QueryConstruct`] and [`CycleStack`] values threaded through
//! each call, so one `ObjectFormatter` can serve concurrent requests.
//!
//! Missing definitions and recursive formatter chains never fail the
//! compilation; they produce literal placeholders instead.

mod aggregate;
mod cycle;
mod field;

pub use aggregate::AGGREGATOR_NOT_DEFINED;
pub use cycle::{CycleStack, FormatOp, CYCLE_DETECTED};
pub use field::{TIMESTAMP_PATTERN, YEAR_PATTERN};

use log::{info, warn};

use crate::catalog::{
    resolve_path, Catalog, CatalogError, FieldSpec, FieldType, PathTerminal, RelationshipDef,
    TableDef,
};
use crate::config::{
    AggregatorDef, CollectionScope, Configuration, FieldDirective, FieldsGroup, FormatDef,
    FormattingSettings, FormatterDefinitions, ScalarValue,
};
use crate::construct::{QueryConstruct, TableAlias};
use crate::error::{FormatError, FormatResult};
use crate::sql::{
    as_text, blank_nulls, case_operand, concat_all, lit_int, lit_str, Expr, ExprExt, OrderByExpr,
    Query,
};

use field::{apply_format_string, field_text, format_field};

/// Placeholder for an entity whose formatter cannot be resolved.
pub const FORMATTER_NOT_DEFINED: &str = "<Formatter not defined.>";

/// Compiles formatters and aggregators against borrowed configuration.
#[derive(Debug, Clone)]
pub struct ObjectFormatter<'a> {
    catalog: &'a Catalog,
    definitions: &'a FormatterDefinitions,
    scope: &'a CollectionScope,
    options: FormattingSettings,
}

impl<'a> ObjectFormatter<'a> {
    pub fn new(
        catalog: &'a Catalog,
        definitions: &'a FormatterDefinitions,
        scope: &'a CollectionScope,
    ) -> Self {
        Self {
            catalog,
            definitions,
            scope,
            options: FormattingSettings::default(),
        }
    }

    /// Formatter over a loaded configuration, using its formatting settings.
    pub fn from_config(config: &'a Configuration) -> Self {
        Self::new(&config.catalog, &config.definitions, &config.scope)
            .with_options(config.settings.formatting.clone())
    }

    #[must_use]
    pub fn with_options(mut self, options: FormattingSettings) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Explicit name, then the scope's default for the table, then the
    /// table's class default.
    pub fn resolve_formatter(&self, table: &TableDef, name: Option<&str>) -> Option<&'a FormatDef> {
        let definitions = self.definitions;
        name.and_then(|n| definitions.format_by_name(n))
            .or_else(|| {
                self.scope
                    .default_format(&table.name)
                    .and_then(|n| definitions.format_by_name(n))
            })
            .or_else(|| definitions.format_for_class(&table.name))
    }

    /// Explicit name, then the table's class default.
    pub fn resolve_aggregator(
        &self,
        table: &TableDef,
        name: Option<&str>,
    ) -> Option<&'a AggregatorDef> {
        let definitions = self.definitions;
        name.and_then(|n| definitions.aggregator_by_name(n))
            .or_else(|| definitions.aggregator_for_class(&table.name))
    }

    /// Format the table instance `alias` with its resolved formatter.
    pub fn format(
        &self,
        qc: QueryConstruct<'a>,
        alias: &TableAlias,
        formatter_name: Option<&str>,
        stack: &CycleStack,
    ) -> FormatResult<(QueryConstruct<'a>, Expr)> {
        let table = self.catalog.table(alias.table);
        let Some(def) = self.resolve_formatter(table, formatter_name) else {
            warn!(
                "no formatter for {} (requested {:?})",
                table.name, formatter_name
            );
            return Ok((qc, lit_str(FORMATTER_NOT_DEFINED)));
        };

        let def_name = def
            .name
            .as_deref()
            .or(def.class.as_deref())
            .unwrap_or(&table.name);
        info!("formatting {} as {} with {}", table.name, alias.alias, def_name);

        let switch = &def.switch;
        let Some(first) = switch.fields.first() else {
            return Err(FormatError::invalid(def_name, "switch has no fields groups"));
        };

        if switch.single {
            let (qc, expr) = self.format_case(qc, alias, first, stack)?;
            return Ok((qc, blank_nulls(expr)));
        }

        let field = switch
            .field
            .as_deref()
            .ok_or_else(|| FormatError::invalid(def_name, "switch without single needs a field"))?;
        let (mut qc, discriminant, spec) =
            self.build_field_expression(qc, alias, &FieldDirective::path(field), stack, false)?;
        let field_type = spec.field().map(|f| f.field_type);
        // Unmatched rows show the raw value, which must share the cases' text type
        let fallback = match field_type {
            Some(t) if t.is_textual() => discriminant.clone(),
            _ => as_text(discriminant.clone()),
        };

        let mut whens = Vec::with_capacity(switch.fields.len());
        for group in &switch.fields {
            let Some(value) = &group.value else {
                warn!("{}: case without value ignored", def_name);
                continue;
            };
            let (next, expr) = self.format_case(qc, alias, group, stack)?;
            qc = next;
            whens.push((case_label(value, field_type), expr));
        }

        let expr = if whens.is_empty() {
            fallback
        } else {
            case_operand(discriminant, whens, Some(fallback))
        };
        Ok((qc, blank_nulls(expr)))
    }

    /// Concatenation of a case's directives.
    fn format_case(
        &self,
        qc: QueryConstruct<'a>,
        alias: &TableAlias,
        group: &FieldsGroup,
        stack: &CycleStack,
    ) -> FormatResult<(QueryConstruct<'a>, Expr)> {
        let mut qc = qc;
        let mut parts = Vec::with_capacity(group.fields.len());
        for directive in &group.fields {
            let (next, expr, _) = self.build_field_expression(qc, alias, directive, stack, true)?;
            qc = next;
            parts.push(expr);
        }
        Ok((qc, concat_all(parts)))
    }

    /// Expression for one directive, relative to the table instance `alias`.
    ///
    /// `blank` null-coalesces the result; order-by expressions pass `false`.
    pub fn build_field_expression(
        &self,
        qc: QueryConstruct<'a>,
        alias: &TableAlias,
        directive: &FieldDirective,
        stack: &CycleStack,
        blank: bool,
    ) -> FormatResult<(QueryConstruct<'a>, Expr, FieldSpec<'a>)> {
        let spec = resolve_path(self.catalog, alias.table, &directive.path)?;
        let (qc, owner) = qc.join_relationships(alias, &spec.join_path);

        let (qc, mut expr) = match &spec.terminal {
            PathTerminal::Relationship(rel) => {
                self.relationship_expression(qc, &owner, *rel, directive, stack)?
            }
            PathTerminal::TreeRank { rank, attribute } => {
                let (qc, expr) = qc.tree_rank(&owner, rank, attribute.as_deref(), self.scope)?;
                if blank && !self.rank_attribute_is_textual(&owner, attribute.as_deref()) {
                    (qc, as_text(expr))
                } else {
                    (qc, expr)
                }
            }
            PathTerminal::Field(field) => {
                let table = self.catalog.table(owner.table);
                let expr = format_field(&owner, table, field, &self.options, self.scope);
                if blank {
                    (qc, field_text(field, expr))
                } else {
                    (qc, expr)
                }
            }
        };

        if blank {
            expr = blank_nulls(expr);
        }
        if let Some(format) = &directive.format {
            expr = apply_format_string(format, expr);
        }
        if let Some(sep) = &directive.sep {
            // Shown even when the value is empty
            expr = lit_str(sep).concat(expr);
        }
        if blank {
            expr = blank_nulls(expr);
        }

        Ok((qc, expr, spec))
    }

    /// Whether a tree rank's selected column holds text: `name` when no
    /// attribute is given, never the identifier.
    fn rank_attribute_is_textual(&self, node: &TableAlias, attribute: Option<&str>) -> bool {
        let table = self.catalog.table(node.table);
        match attribute {
            Some(attr) if attr.eq_ignore_ascii_case("id") => false,
            attr => table
                .field(attr.unwrap_or("name"))
                .map_or(true, |f| f.field_type.is_textual()),
        }
    }

    /// Nested format or aggregate of a relationship, unless it re-enters the
    /// active chain.
    fn relationship_expression(
        &self,
        qc: QueryConstruct<'a>,
        owner: &TableAlias,
        relationship: &'a RelationshipDef,
        directive: &FieldDirective,
        stack: &CycleStack,
    ) -> FormatResult<(QueryConstruct<'a>, Expr)> {
        let current = self.catalog.table(owner.table);
        let next = self.catalog.table(relationship.target);
        let op = if relationship.is_to_many() {
            FormatOp::Aggregating
        } else {
            FormatOp::Formatting
        };
        let extended = stack.push(current.id, &current.name, op);

        if stack.contains(next.id) {
            let placeholder = extended.placeholder(&next.name);
            info!("{}", placeholder);
            return Ok((qc, lit_str(&placeholder)));
        }

        match op {
            FormatOp::Aggregating => self.aggregate(
                qc,
                owner,
                relationship,
                directive.aggregator.as_deref(),
                &extended,
            ),
            FormatOp::Formatting => {
                let (qc, target) = qc.join(owner, relationship);
                self.format(qc, &target, directive.formatter.as_deref(), &extended)
            }
        }
    }

    /// `SELECT id, <formatted> FROM table ...` for every row of `table`.
    pub fn format_query(&self, table: &str, formatter_name: Option<&str>) -> FormatResult<Query> {
        let table = self.catalog.table_by_name(table)?;
        let qc = QueryConstruct::new(self.catalog, table.id);
        let root = qc.root().clone();

        let (qc, expr) = self.format(qc, &root, formatter_name, &CycleStack::new())?;
        let id = root.col(&table.id_column);
        Ok(qc
            .into_query(vec![id.clone().alias("id"), expr.alias("formatted")])
            .order_by(vec![OrderByExpr::asc(id)]))
    }

    /// `SELECT id, <aggregate of relationship> FROM table ...` for every row
    /// of `table`.
    pub fn aggregate_query(
        &self,
        table: &str,
        relationship: &str,
        aggregator_name: Option<&str>,
    ) -> FormatResult<Query> {
        let table = self.catalog.table_by_name(table)?;
        let rel = table
            .relationship(relationship)
            .ok_or_else(|| CatalogError::UnknownField {
                table: table.name.clone(),
                path: relationship.to_string(),
            })?;
        if !rel.is_to_many() {
            return Err(FormatError::invalid(
                &rel.name,
                format!("{}.{} is not a to-many relationship", table.name, rel.name),
            ));
        }

        let qc = QueryConstruct::new(self.catalog, table.id);
        let root = qc.root().clone();
        let stack = CycleStack::new().push(table.id, &table.name, FormatOp::Aggregating);

        let (qc, expr) = self.aggregate(qc, &root, rel, aggregator_name, &stack)?;
        let id = root.col(&table.id_column);
        Ok(qc
            .into_query(vec![id.clone().alias("id"), expr.alias(&rel.name)])
            .order_by(vec![OrderByExpr::asc(id)]))
    }
}

/// Case label for a switch value, typed after the discriminant field.
fn case_label(value: &ScalarValue, field_type: Option<FieldType>) -> Expr {
    match (field_type, value) {
        // Booleans are compared as their 1/0 flag
        (Some(FieldType::Boolean), ScalarValue::Bool(b)) => lit_int(i64::from(*b)),
        (Some(FieldType::Boolean), ScalarValue::Text(s)) if s.eq_ignore_ascii_case("true") => {
            lit_int(1)
        }
        (Some(FieldType::Boolean), ScalarValue::Text(s)) if s.eq_ignore_ascii_case("false") => {
            lit_int(0)
        }
        (Some(t), ScalarValue::Int(n)) if t.is_integer() => lit_int(*n),
        (Some(t), ScalarValue::Text(s)) if t.is_integer() => match s.trim().parse::<i64>() {
            Ok(n) => lit_int(n),
            Err(_) => lit_str(s),
        },
        (_, value) => lit_str(&value.to_string()),
    }
}
