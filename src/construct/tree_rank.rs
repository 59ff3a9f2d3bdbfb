//! Named ranks of hierarchical tables.
//!
//! A rank such as `Family` is not a column: depending on the tree definition
//! a node belongs to, the family may be the node itself, its parent, or any
//! ancestor further up. The resolver self-joins the tree table up to the
//! deepest definition in scope and picks, per row, the ancestor whose
//! definition item is the requested rank.

use log::debug;

use super::{QueryConstruct, TableAlias, TreeRankEntry};
use crate::catalog::CatalogError;
use crate::config::CollectionScope;
use crate::error::{FormatError, FormatResult};
use crate::sql::{case_when, lit_int, table_col, Expr, ExprExt};

impl<'a> QueryConstruct<'a> {
    /// Value of `rank` for the tree node at `node`.
    ///
    /// `attribute` selects the ancestor column: `name` when absent, `id` for
    /// the identifier, or any declared field. Registers a filter restricting
    /// `node` to the tree definitions that have the rank.
    pub fn tree_rank(
        mut self,
        node: &TableAlias,
        rank: &str,
        attribute: Option<&str>,
        scope: &CollectionScope,
    ) -> FormatResult<(Self, Expr)> {
        let catalog = self.catalog;
        let table = catalog.table(node.table);
        let unknown_rank = || FormatError::UnknownRank {
            table: table.name.clone(),
            rank: rank.to_string(),
        };

        let tree = table.tree.as_ref().ok_or_else(unknown_rank)?;
        let defs = scope.tree_defs_for(&table.name);
        if defs.is_empty() {
            return Err(unknown_rank());
        }

        let target_column = match attribute {
            Some(attr) if attr.eq_ignore_ascii_case("id") => table.id_column.as_str(),
            _ => {
                let name = attribute.unwrap_or("name");
                table
                    .field(name)
                    .map(|f| f.column.as_str())
                    .ok_or_else(|| CatalogError::UnknownField {
                        table: table.name.clone(),
                        path: format!("{}.{}", rank, name),
                    })?
            }
        };

        let mut entry = self
            .tree_ranks
            .remove(&node.alias)
            .unwrap_or_else(|| TreeRankEntry {
                ancestors: vec![node.alias.clone()],
                ..TreeRankEntry::default()
            });

        // Ancestor chain long enough for the deepest definition
        let depth = defs.iter().map(|d| d.items.len()).max().unwrap_or(1).max(1);
        while entry.ancestors.len() < depth {
            let child = entry.ancestors[entry.ancestors.len() - 1].clone();
            let ancestor = self.push_join(node.table, |parent| {
                parent
                    .col(&table.id_column)
                    .eq(table_col(&child, &tree.parent_column))
            });
            entry.ancestors.push(ancestor.alias);
        }

        let key = rank.to_lowercase();
        let pairs = match entry.ranks.get(&key) {
            Some(pairs) => {
                debug!("reusing rank {} on {}", rank, node.alias);
                pairs.clone()
            }
            None => {
                let mut pairs = Vec::new();
                for def in defs {
                    let items: Vec<_> = def.items_named(rank).collect();
                    match items.as_slice() {
                        [] => {}
                        [item] => pairs.push((def.id, item.id)),
                        _ => {
                            return Err(FormatError::AmbiguousRank {
                                table: table.name.clone(),
                                rank: rank.to_string(),
                                tree_def: def.id,
                            })
                        }
                    }
                }
                if pairs.is_empty() {
                    return Err(unknown_rank());
                }

                let defs_with_rank: Vec<Expr> = pairs.iter().map(|(d, _)| lit_int(*d)).collect();
                self.filters
                    .push(node.col(&tree.def_column).in_list(defs_with_rank));
                entry.ranks.insert(key, pairs.clone());
                pairs
            }
        };

        // Nearest level first, then definition order
        let mut whens = Vec::with_capacity(entry.ancestors.len() * pairs.len());
        for ancestor in &entry.ancestors {
            for (def_id, item_id) in &pairs {
                let condition = table_col(ancestor, &tree.def_column)
                    .eq(lit_int(*def_id))
                    .and(table_col(ancestor, &tree.def_item_column).eq(lit_int(*item_id)));
                whens.push((condition, table_col(ancestor, target_column)));
            }
        }

        self.tree_ranks.insert(node.alias.clone(), entry);
        Ok((self, case_when(whens, None)))
    }
}
