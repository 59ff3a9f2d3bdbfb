//! Per-collection request scope.
//!
//! ```toml
//! collection_id = 4
//! discipline_id = 3
//! catalog_number_format = "CatalogNumberNumeric"
//!
//! [default_formats]
//! Agent = "AgentShort"
//!
//! [[tree_defs.Taxon]]
//! id = 1
//! name = "Vertebrates"
//! items = [
//!     { id = 10, name = "Life", rank_id = 0 },
//!     { id = 11, name = "Family", rank_id = 140 },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::settings::{is_json, SettingsError};

/// Catalog number format that allows numeric casting.
pub const CATALOG_NUMBER_NUMERIC: &str = "CatalogNumberNumeric";

/// Collection and discipline context of a compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionScope {
    #[serde(default)]
    pub collection_id: Option<i64>,
    #[serde(default)]
    pub discipline_id: Option<i64>,
    #[serde(default)]
    pub catalog_number_format: Option<String>,
    /// Table name → schema-configured formatter name.
    #[serde(default)]
    pub default_formats: HashMap<String, String>,
    /// Tree table name → tree definitions in use by this discipline.
    #[serde(default)]
    pub tree_defs: HashMap<String, Vec<TreeDef>>,
}

/// A hierarchy schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<TreeDefItem>,
}

/// One named rank level of a [`TreeDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDefItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub rank_id: i32,
}

impl TreeDef {
    /// Items named `rank`, case-insensitively.
    pub fn items_named<'a>(&'a self, rank: &'a str) -> impl Iterator<Item = &'a TreeDefItem> {
        self.items
            .iter()
            .filter(move |item| item.name.eq_ignore_ascii_case(rank))
    }
}

impl CollectionScope {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        if is_json(path) {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Schema-configured formatter name for `table`.
    pub fn default_format(&self, table: &str) -> Option<&str> {
        self.default_formats
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(table))
            .map(|(_, v)| v.as_str())
    }

    /// Tree definitions applicable to `table`; empty when none are configured.
    pub fn tree_defs_for(&self, table: &str) -> &[TreeDef] {
        self.tree_defs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(table))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_numeric_catalog_number(&self) -> bool {
        self.catalog_number_format.as_deref() == Some(CATALOG_NUMBER_NUMERIC)
    }
}
