//! Dotted path resolution against the catalog.
//!
//! A path such as `accession.accessionNumber` walks relationship segments from
//! a root table and ends in one of three terminals: a scalar field, a
//! relationship (format or aggregate the related entity), or, on a tree
//! table, a named rank optionally followed by one attribute segment.

use super::{Catalog, CatalogError, CatalogResult, FieldDef, RelationshipDef, TableDef, TableId};

/// What a resolved path points at.
#[derive(Debug, Clone, PartialEq)]
pub enum PathTerminal<'a> {
    /// Scalar field of the last table in the join path.
    Field(&'a FieldDef),
    /// Relationship of the last table in the join path; not joined yet.
    Relationship(&'a RelationshipDef),
    /// Named rank of a tree table, with an optional attribute (`name` when absent).
    TreeRank {
        rank: String,
        attribute: Option<String>,
    },
}

/// A fully resolved directive path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec<'a> {
    pub root: TableId,
    /// Relationship segments to join, in order. Never contains a to-many
    /// relationship.
    pub join_path: Vec<&'a RelationshipDef>,
    pub terminal: PathTerminal<'a>,
    /// The original dotted path.
    pub path: String,
}

impl<'a> FieldSpec<'a> {
    /// Table reached after walking `join_path`.
    pub fn table(&self) -> TableId {
        self.join_path.last().map(|r| r.target).unwrap_or(self.root)
    }

    /// Dotted form of `join_path` (`""` for the root table).
    pub fn join_path_string(&self) -> String {
        self.join_path
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The scalar field, if the path ends in one.
    pub fn field(&self) -> Option<&'a FieldDef> {
        match self.terminal {
            PathTerminal::Field(f) => Some(f),
            _ => None,
        }
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('.').map(str::trim).collect()
}

/// Resolve `path` starting at `root`.
///
/// Unknown segments, trailing segments after a field, and to-many
/// relationships anywhere but the end are errors naming the root table and
/// the full path.
pub fn resolve_path<'a>(
    catalog: &'a Catalog,
    root: TableId,
    path: &str,
) -> CatalogResult<FieldSpec<'a>> {
    let root_table = catalog.table(root);
    let unknown = || CatalogError::UnknownField {
        table: root_table.name.clone(),
        path: path.to_string(),
    };

    let segments = split(path);
    if segments.iter().any(|s| s.is_empty()) {
        return Err(unknown());
    }

    let mut current: &TableDef = root_table;
    let mut join_path: Vec<&RelationshipDef> = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        let segment = segments[i];
        let is_last = i + 1 == segments.len();

        if let Some(rel) = current.relationship(segment) {
            if is_last {
                return Ok(FieldSpec {
                    root,
                    join_path,
                    terminal: PathTerminal::Relationship(rel),
                    path: path.to_string(),
                });
            }
            if rel.is_to_many() {
                return Err(CatalogError::ToManyInPath {
                    table: root_table.name.clone(),
                    path: path.to_string(),
                    relationship: rel.name.clone(),
                });
            }
            join_path.push(rel);
            current = catalog.table(rel.target);
            i += 1;
            continue;
        }

        if let Some(field) = current.field(segment) {
            if !is_last {
                return Err(unknown());
            }
            return Ok(FieldSpec {
                root,
                join_path,
                terminal: PathTerminal::Field(field),
                path: path.to_string(),
            });
        }

        // On a tree table anything else names a rank, checked later against
        // the tree definitions in scope
        if current.is_tree() && segments.len() - i <= 2 {
            let attribute = segments.get(i + 1).map(|s| s.to_string());
            if let Some(attr) = &attribute {
                if current.field(attr).is_none() && !attr.eq_ignore_ascii_case("id") {
                    return Err(unknown());
                }
            }
            return Ok(FieldSpec {
                root,
                join_path,
                terminal: PathTerminal::TreeRank {
                    rank: segment.to_string(),
                    attribute,
                },
                path: path.to_string(),
            });
        }

        return Err(unknown());
    }

    // Empty path
    Err(unknown())
}

/// Tables reached by walking relationship segments of `path` from `root`,
/// root included. Stops at the first segment that is not a relationship.
pub fn tables_in_path<'a>(catalog: &'a Catalog, root: TableId, path: &str) -> Vec<&'a TableDef> {
    let mut current = catalog.table(root);
    let mut tables = vec![current];
    for segment in split(path) {
        match current.relationship(segment) {
            Some(rel) => {
                current = catalog.table(rel.target);
                tables.push(current);
            }
            None => break,
        }
    }
    tables
}
