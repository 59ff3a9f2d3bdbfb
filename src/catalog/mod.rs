//! Typed, read-only registry of tables, fields and relationships.
//!
//! The catalog is built once, either from a [`CatalogSpec`] document (TOML or
//! JSON) or programmatically through [`CatalogBuilder`]. Every cross reference
//! (relationship targets, other sides, precision fields) is resolved and
//! checked while building, so lookups during compilation only fail for names
//! that come from formatter definitions.
//!
//! Names are matched case-insensitively throughout.

mod path;

pub use path::{resolve_path, tables_in_path, FieldSpec, PathTerminal};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while loading the catalog or resolving names against it.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown field in path '{path}' on table {table}")]
    UnknownField { table: String, path: String },

    #[error("To-many relationship '{relationship}' cannot be joined through in path '{path}' on table {table}")]
    ToManyInPath {
        table: String,
        path: String,
        relationship: String,
    },

    #[error("Duplicate table name: {0}")]
    DuplicateTable(String),

    #[error("Duplicate field or relationship name '{name}' on table {table}")]
    DuplicateField { table: String, name: String },

    #[error("Invalid reference on {table}.{name}: {reason}")]
    InvalidReference {
        table: String,
        name: String,
        reason: String,
    },

    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Failed to parse catalog JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

// ============================================================================
// Catalog Types
// ============================================================================

/// Dense index of a table inside its [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub usize);

/// Semantic type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Short,
    Integer,
    Long,
    Decimal,
    Text,
    Date,
    Timestamp,
}

impl FieldType {
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Short | FieldType::Integer | FieldType::Long)
    }

    /// Whether field formatting yields text: text columns as-is, dates and
    /// timestamps through their date pattern.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Date | FieldType::Timestamp)
    }
}

/// Cardinality of a relationship, seen from its owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    ManyToOne,
    OneToOne,
    OneToMany,
}

impl Cardinality {
    /// Returns true if following the relationship can yield many rows.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Cardinality::OneToMany)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ManyToOne => write!(f, "N:1"),
            Cardinality::OneToOne => write!(f, "1:1"),
            Cardinality::OneToMany => write!(f, "1:N"),
        }
    }
}

/// A scalar field of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub column: String,
    pub field_type: FieldType,
    /// Name of the paired precision field (dates only).
    pub precision_field: Option<String>,
    /// Marks the schema-designated catalog number field.
    pub catalog_number: bool,
}

/// A relationship from one table to another.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDef {
    pub name: String,
    pub target: TableId,
    pub cardinality: Cardinality,
    /// Foreign-key column on this table; present exactly when this side owns
    /// the relationship.
    pub column: Option<String>,
    /// Name of the inverse relationship on the target table.
    pub other_side: Option<String>,
}

impl RelationshipDef {
    pub fn is_to_many(&self) -> bool {
        self.cardinality.is_to_many()
    }
}

/// Self-referential hierarchy columns of a tree table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeMeta {
    #[serde(default = "default_parent_column")]
    pub parent_column: String,
    pub def_column: String,
    pub def_item_column: String,
}

fn default_parent_column() -> String {
    "ParentID".to_string()
}

/// A table of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub id: TableId,
    pub name: String,
    pub sql_table: String,
    pub id_column: String,
    pub fields: Vec<FieldDef>,
    pub relationships: Vec<RelationshipDef>,
    pub tree: Option<TreeMeta>,
}

impl TableDef {
    /// Look up a scalar field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Look up a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Whether this is a hierarchical (tree) table.
    pub fn is_tree(&self) -> bool {
        self.tree.is_some()
    }
}

/// The typed metadata registry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableDef>,
    /// Lowercased table name → TableId
    by_name: HashMap<String, TableId>,
}

impl Catalog {
    /// Table by id. Ids handed out by this catalog are always valid.
    pub fn table(&self, id: TableId) -> &TableDef {
        &self.tables[id.0]
    }

    /// Table by name, if present.
    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|id| self.table(*id))
    }

    /// Table by name, or `CatalogError::UnknownTable`.
    pub fn table_by_name(&self, name: &str) -> CatalogResult<&TableDef> {
        self.get_table(name)
            .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }

    /// All tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Build and validate a catalog from its document form.
    pub fn from_spec(spec: CatalogSpec) -> CatalogResult<Self> {
        let mut catalog = Catalog::default();

        // Phase 1: register tables and fields
        for table in &spec.tables {
            catalog.add_table(table)?;
        }

        // Phase 2: resolve relationships now that every table has an id
        for (idx, table) in spec.tables.iter().enumerate() {
            let relationships = table
                .relationships
                .iter()
                .map(|rel| catalog.resolve_relationship(table, rel))
                .collect::<CatalogResult<Vec<_>>>()?;
            for rel in &relationships {
                if catalog.tables[idx].field(&rel.name).is_some() {
                    return Err(CatalogError::DuplicateField {
                        table: table.name.clone(),
                        name: rel.name.clone(),
                    });
                }
            }
            catalog.tables[idx].relationships = relationships;
        }

        // Phase 3: check inverse sides
        for table in &catalog.tables {
            for rel in &table.relationships {
                catalog.check_other_side(table, rel)?;
            }
        }

        Ok(catalog)
    }

    /// Parse and build a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        let spec: CatalogSpec = toml::from_str(content)?;
        Self::from_spec(spec)
    }

    /// Parse and build a catalog from JSON text.
    pub fn from_json_str(content: &str) -> CatalogResult<Self> {
        let spec: CatalogSpec = serde_json::from_str(content)?;
        Self::from_spec(spec)
    }

    /// Load a catalog file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if is_json(path) {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    fn add_table(&mut self, spec: &TableSpec) -> CatalogResult<()> {
        let key = spec.name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(CatalogError::DuplicateTable(spec.name.clone()));
        }

        let mut fields: Vec<FieldDef> = Vec::with_capacity(spec.fields.len() + 1);
        for field in &spec.fields {
            if fields.iter().any(|f| f.name.eq_ignore_ascii_case(&field.name)) {
                return Err(CatalogError::DuplicateField {
                    table: spec.name.clone(),
                    name: field.name.clone(),
                });
            }
            fields.push(FieldDef {
                name: field.name.clone(),
                column: field.column.clone().unwrap_or_else(|| field.name.clone()),
                field_type: field.field_type,
                precision_field: field.precision_field.clone(),
                catalog_number: field.catalog_number,
            });
        }

        // The identifier is always addressable as a field
        if !fields
            .iter()
            .any(|f| f.column.eq_ignore_ascii_case(&spec.id_column))
        {
            fields.push(FieldDef {
                name: spec.id_column.clone(),
                column: spec.id_column.clone(),
                field_type: FieldType::Integer,
                precision_field: None,
                catalog_number: false,
            });
        }

        for field in &fields {
            if let Some(precision) = &field.precision_field {
                let ok = fields
                    .iter()
                    .any(|f| f.name.eq_ignore_ascii_case(precision) && f.field_type.is_integer());
                if !ok || field.field_type != FieldType::Date {
                    return Err(CatalogError::InvalidReference {
                        table: spec.name.clone(),
                        name: field.name.clone(),
                        reason: format!(
                            "precision field '{}' must be an integer field paired with a date",
                            precision
                        ),
                    });
                }
            }
        }

        if fields.iter().filter(|f| f.catalog_number).count() > 1 {
            return Err(CatalogError::InvalidReference {
                table: spec.name.clone(),
                name: "catalog_number".into(),
                reason: "more than one catalog number field".into(),
            });
        }

        let id = TableId(self.tables.len());
        self.tables.push(TableDef {
            id,
            name: spec.name.clone(),
            sql_table: spec.table.clone().unwrap_or_else(|| key.clone()),
            id_column: spec.id_column.clone(),
            fields,
            relationships: Vec::new(),
            tree: spec.tree.clone(),
        });
        self.by_name.insert(key, id);
        Ok(())
    }

    fn resolve_relationship(
        &self,
        table: &TableSpec,
        rel: &RelationshipSpec,
    ) -> CatalogResult<RelationshipDef> {
        let invalid = |reason: String| CatalogError::InvalidReference {
            table: table.name.clone(),
            name: rel.name.clone(),
            reason,
        };

        let target = self
            .get_table(&rel.target)
            .ok_or_else(|| invalid(format!("unknown target table '{}'", rel.target)))?;

        match (rel.cardinality, &rel.column, &rel.other_side) {
            (Cardinality::ManyToOne, None, _) => {
                return Err(invalid("many-to-one relationship needs a column".into()))
            }
            (Cardinality::OneToMany, Some(_), _) => {
                return Err(invalid("one-to-many relationship cannot own a column".into()))
            }
            (_, None, None) => {
                return Err(invalid(
                    "non-owning relationship needs an other_side".into(),
                ))
            }
            _ => {}
        }

        Ok(RelationshipDef {
            name: rel.name.clone(),
            target: target.id,
            cardinality: rel.cardinality,
            column: rel.column.clone(),
            other_side: rel.other_side.clone(),
        })
    }

    fn check_other_side(&self, table: &TableDef, rel: &RelationshipDef) -> CatalogResult<()> {
        let Some(other) = &rel.other_side else {
            return Ok(());
        };
        let target = self.table(rel.target);
        let inverse = target
            .relationship(other)
            .ok_or_else(|| CatalogError::InvalidReference {
                table: table.name.clone(),
                name: rel.name.clone(),
                reason: format!("other side '{}' not found on {}", other, target.name),
            })?;

        // A non-owning side joins through the inverse's column
        if rel.column.is_none() && inverse.column.is_none() {
            return Err(CatalogError::InvalidReference {
                table: table.name.clone(),
                name: rel.name.clone(),
                reason: format!("neither side of {}.{} owns a column", target.name, other),
            });
        }
        if inverse.target != table.id {
            return Err(CatalogError::InvalidReference {
                table: table.name.clone(),
                name: rel.name.clone(),
                reason: format!("other side {}.{} points elsewhere", target.name, other),
            });
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

// ============================================================================
// Document Form
// ============================================================================

/// Serializable catalog description.
///
/// ```toml
/// [[table]]
/// name = "Collector"
/// table = "collector"
/// id_column = "CollectorID"
///
/// [[table.field]]
/// name = "orderNumber"
/// column = "OrderNumber"
/// type = "integer"
///
/// [[table.relationship]]
/// name = "agent"
/// target = "Agent"
/// type = "many-to-one"
/// column = "AgentID"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSpec {
    #[serde(default, rename = "table")]
    pub tables: Vec<TableSpec>,
}

/// One table in a [`CatalogSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    /// Physical table name; defaults to the lowercased logical name.
    #[serde(default)]
    pub table: Option<String>,
    pub id_column: String,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldSpecDoc>,
    #[serde(default, rename = "relationship")]
    pub relationships: Vec<RelationshipSpec>,
    #[serde(default)]
    pub tree: Option<TreeMeta>,
}

/// One scalar field in a [`TableSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpecDoc {
    pub name: String,
    /// Physical column; defaults to the field name.
    #[serde(default)]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub precision_field: Option<String>,
    #[serde(default)]
    pub catalog_number: bool,
}

/// One relationship in a [`TableSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    pub name: String,
    pub target: String,
    #[serde(rename = "type")]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub other_side: Option<String>,
}

// ============================================================================
// Programmatic Builder
// ============================================================================

/// Fluent construction of a [`Catalog`].
///
/// ```ignore
/// let catalog = CatalogBuilder::new()
///     .table(
///         TableSpec::new("Agent", "AgentID")
///             .field("lastName", "LastName", FieldType::Text),
///     )
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
#[must_use = "CatalogBuilder has no effect until build() is called"]
pub struct CatalogBuilder {
    spec: CatalogSpec,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: TableSpec) -> Self {
        self.spec.tables.push(table);
        self
    }

    pub fn build(self) -> CatalogResult<Catalog> {
        Catalog::from_spec(self.spec)
    }
}

impl TableSpec {
    pub fn new(name: &str, id_column: &str) -> Self {
        Self {
            name: name.into(),
            table: None,
            id_column: id_column.into(),
            fields: Vec::new(),
            relationships: Vec::new(),
            tree: None,
        }
    }

    #[must_use]
    pub fn sql_table(mut self, table: &str) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: &str, column: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpecDoc {
            name: name.into(),
            column: Some(column.into()),
            field_type,
            precision_field: None,
            catalog_number: false,
        });
        self
    }

    /// Date field with a paired precision field.
    #[must_use]
    pub fn date_field(mut self, name: &str, column: &str, precision_field: &str) -> Self {
        self.fields.push(FieldSpecDoc {
            name: name.into(),
            column: Some(column.into()),
            field_type: FieldType::Date,
            precision_field: Some(precision_field.into()),
            catalog_number: false,
        });
        self
    }

    #[must_use]
    pub fn catalog_number(mut self, name: &str, column: &str) -> Self {
        self.fields.push(FieldSpecDoc {
            name: name.into(),
            column: Some(column.into()),
            field_type: FieldType::Text,
            precision_field: None,
            catalog_number: true,
        });
        self
    }

    /// Owning to-one relationship through `column`.
    #[must_use]
    pub fn many_to_one(mut self, name: &str, target: &str, column: &str) -> Self {
        self.relationships.push(RelationshipSpec {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::ManyToOne,
            column: Some(column.into()),
            other_side: None,
        });
        self
    }

    /// Non-owning to-one relationship, joined through the inverse's column.
    #[must_use]
    pub fn one_to_one_inverse(mut self, name: &str, target: &str, other_side: &str) -> Self {
        self.relationships.push(RelationshipSpec {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::OneToOne,
            column: None,
            other_side: Some(other_side.into()),
        });
        self
    }

    #[must_use]
    pub fn one_to_many(mut self, name: &str, target: &str, other_side: &str) -> Self {
        self.relationships.push(RelationshipSpec {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::OneToMany,
            column: None,
            other_side: Some(other_side.into()),
        });
        self
    }

    #[must_use]
    pub fn tree(mut self, def_column: &str, def_item_column: &str) -> Self {
        self.tree = Some(TreeMeta {
            parent_column: default_parent_column(),
            def_column: def_column.into(),
            def_item_column: def_item_column.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_collector() -> CatalogBuilder {
        CatalogBuilder::new()
            .table(
                TableSpec::new("Agent", "AgentID")
                    .field("lastName", "LastName", FieldType::Text)
                    .one_to_many("collectors", "Collector", "agent"),
            )
            .table(
                TableSpec::new("Collector", "CollectorID")
                    .field("orderNumber", "OrderNumber", FieldType::Integer)
                    .many_to_one("agent", "Agent", "AgentID"),
            )
    }

    #[test]
    fn test_build_resolves_targets() {
        let catalog = agent_collector().build().unwrap();
        let collector = catalog.table_by_name("collector").unwrap();
        let rel = collector.relationship("AGENT").unwrap();
        assert_eq!(catalog.table(rel.target).name, "Agent");
        assert_eq!(collector.sql_table, "collector");
    }

    #[test]
    fn test_id_column_is_addressable() {
        let catalog = agent_collector().build().unwrap();
        let agent = catalog.table_by_name("Agent").unwrap();
        assert_eq!(agent.field("agentid").unwrap().column, "AgentID");
    }

    #[test]
    fn test_unknown_target_fails_at_load() {
        let err = CatalogBuilder::new()
            .table(TableSpec::new("Collector", "CollectorID").many_to_one(
                "agent",
                "Agent",
                "AgentID",
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidReference { .. }));
    }

    #[test]
    fn test_missing_other_side_fails_at_load() {
        let err = CatalogBuilder::new()
            .table(TableSpec::new("Agent", "AgentID").one_to_many(
                "collectors",
                "Collector",
                "agent",
            ))
            .table(TableSpec::new("Collector", "CollectorID"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("other side 'agent' not found"));
    }

    #[test]
    fn test_duplicate_table() {
        let err = CatalogBuilder::new()
            .table(TableSpec::new("Agent", "AgentID"))
            .table(TableSpec::new("agent", "AgentID"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateTable(_)));
    }

    #[test]
    fn test_precision_field_must_exist() {
        let err = CatalogBuilder::new()
            .table(TableSpec::new("Determination", "DeterminationID").date_field(
                "determinedDate",
                "DeterminedDate",
                "determinedDatePrecision",
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidReference { .. }));
    }

    #[test]
    fn test_from_toml() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[table]]
            name = "Taxon"
            id_column = "TaxonID"
            tree = { def_column = "TaxonTreeDefID", def_item_column = "TaxonTreeDefItemID" }

            [[table.field]]
            name = "name"
            column = "Name"
            type = "text"

            [[table.relationship]]
            name = "parent"
            target = "Taxon"
            type = "many-to-one"
            column = "ParentID"
            "#,
        )
        .unwrap();

        let taxon = catalog.table_by_name("taxon").unwrap();
        let tree = taxon.tree.as_ref().unwrap();
        assert_eq!(tree.parent_column, "ParentID");
        assert_eq!(taxon.relationship("parent").unwrap().cardinality, Cardinality::ManyToOne);
    }

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json_str(
            r#"{ "table": [ { "name": "Agent", "id_column": "AgentID",
                 "field": [ { "name": "lastName", "column": "LastName", "type": "text" } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.table_by_name("AGENT").unwrap().field("LASTNAME").unwrap().field_type,
            FieldType::Text
        );
    }
}
