//! Configuration for objformat.
//!
//! Handles the settings file, formatter/aggregator definitions and the
//! per-collection scope, and loads all of them together with the catalog.

mod definitions;
mod scope;
mod settings;

pub use definitions::{
    AggregatorDef, FieldDirective, FieldsGroup, FormatDef, FormatterDefinitions, ScalarValue,
    Switch,
};
pub use scope::{CollectionScope, TreeDef, TreeDefItem, CATALOG_NUMBER_NUMERIC};
pub use settings::{
    expand_env_vars, FormattingSettings, PathSettings, Settings, SettingsError, SettingsResult,
};

use crate::catalog::Catalog;

/// Everything a compilation needs, loaded once and then only borrowed.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub settings: Settings,
    pub catalog: Catalog,
    pub definitions: FormatterDefinitions,
    pub scope: CollectionScope,
}

impl Configuration {
    /// Load the catalog, definitions and scope named by `settings`.
    pub fn load(settings: Settings) -> SettingsResult<Self> {
        let catalog_path = settings.catalog_path()?;
        log::debug!("loading catalog from {}", catalog_path.display());
        let catalog = Catalog::from_file(&catalog_path)?;

        let definitions_path = settings.definitions_path()?;
        log::debug!("loading definitions from {}", definitions_path.display());
        let definitions = FormatterDefinitions::from_file(&definitions_path)?;

        let scope = match settings.scope_path()? {
            Some(path) => {
                log::debug!("loading scope from {}", path.display());
                CollectionScope::from_file(&path)?
            }
            None => CollectionScope::default(),
        };

        log::info!(
            "loaded {} tables, {} formatters, {} aggregators",
            catalog.len(),
            definitions.formats.len(),
            definitions.aggregators.len()
        );

        Ok(Self {
            settings,
            catalog,
            definitions,
            scope,
        })
    }

    /// Check cross references between the documents.
    ///
    /// Returns one message per problem; an empty list means the configuration
    /// is consistent.
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = self.definitions.validate() {
            problems.push(e.to_string());
        }

        for def in &self.definitions.formats {
            if let Some(class) = &def.class {
                if self.catalog.get_table(class).is_none() {
                    problems.push(format!(
                        "formatter {:?} names unknown class {}",
                        def.name.as_deref().unwrap_or(""),
                        class
                    ));
                }
            }
        }

        for agg in &self.definitions.aggregators {
            if let Some(class) = &agg.class {
                if self.catalog.get_table(class).is_none() {
                    problems.push(format!(
                        "aggregator {:?} names unknown class {}",
                        agg.name.as_deref().unwrap_or(""),
                        class
                    ));
                }
            }
            if let Some(format) = &agg.format {
                if self.definitions.format_by_name(format).is_none() {
                    problems.push(format!(
                        "aggregator {:?} uses undefined formatter {}",
                        agg.name.as_deref().unwrap_or(""),
                        format
                    ));
                }
            }
        }

        for (table, format) in &self.scope.default_formats {
            if self.definitions.format_by_name(format).is_none() {
                problems.push(format!("default formatter {} for {} is undefined", format, table));
            }
        }

        for table in self.scope.tree_defs.keys() {
            match self.catalog.get_table(table) {
                Some(t) if t.is_tree() => {}
                Some(_) => problems.push(format!("tree definitions given for non-tree table {}", table)),
                None => problems.push(format!("tree definitions given for unknown table {}", table)),
            }
        }

        problems
    }
}
