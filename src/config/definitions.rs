//! Formatter and aggregator definitions.
//!
//! Definitions are loaded from TOML or JSON:
//!
//! ```toml
//! [[format]]
//! name = "Agent"
//! class = "Agent"
//! [format.switch]
//! field = "agentType"
//!
//! [[format.switch.fields]]
//! value = 1
//! [[format.switch.fields.field]]
//! path = "lastName"
//! [[format.switch.fields.field]]
//! path = "firstName"
//! sep = ", "
//!
//! [[aggregator]]
//! name = "Collectors"
//! class = "Collector"
//! format = "Collector"
//! separator = "; "
//! orderfieldname = "orderNumber"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use super::settings::{is_json, SettingsError};
use crate::error::{FormatError, FormatResult};

/// All formatter and aggregator definitions of one discipline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatterDefinitions {
    #[serde(default, rename = "format")]
    pub formats: Vec<FormatDef>,
    #[serde(default, rename = "aggregator")]
    pub aggregators: Vec<AggregatorDef>,
}

/// A formatter: turns one entity into a display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDef {
    #[serde(default)]
    pub name: Option<String>,
    /// Owning table name.
    #[serde(default)]
    pub class: Option<String>,
    /// Preferred formatter for its class.
    #[serde(default)]
    pub default: bool,
    pub switch: Switch,
}

/// Case selection of a formatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    #[serde(default)]
    pub single: bool,
    /// Discriminant path; required unless `single`.
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldsGroup>,
}

/// One case of a switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldsGroup {
    #[serde(default)]
    pub value: Option<ScalarValue>,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldDirective>,
}

/// One path entry inside a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDirective {
    pub path: String,
    /// Nested formatter for a to-one relationship.
    #[serde(default)]
    pub formatter: Option<String>,
    /// Aggregator for a to-many relationship.
    #[serde(default)]
    pub aggregator: Option<String>,
    /// sprintf-style text with one `%s` or `%d` placeholder.
    #[serde(default)]
    pub format: Option<String>,
    /// Literal text prepended to the value.
    #[serde(default)]
    pub sep: Option<String>,
}

impl FieldDirective {
    /// Bare path directive.
    pub fn path(path: &str) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// An aggregator: joins the formatted rows of a to-many relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatorDef {
    #[serde(default)]
    pub name: Option<String>,
    /// Aggregated table name.
    #[serde(default)]
    pub class: Option<String>,
    /// Formatter applied to each row.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub orderfieldname: Option<String>,
    /// Row limit; 0 or empty means unlimited.
    #[serde(default)]
    pub count: Option<ScalarValue>,
    #[serde(default)]
    pub default: bool,
}

impl AggregatorDef {
    /// Parsed row limit.
    pub fn limit(&self) -> FormatResult<Option<u64>> {
        let name = || self.name.clone().unwrap_or_default();
        match &self.count {
            None => Ok(None),
            Some(ScalarValue::Int(0)) => Ok(None),
            Some(ScalarValue::Int(n)) if *n > 0 => Ok(Some(*n as u64)),
            Some(ScalarValue::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(ScalarValue::Text(s)) => match s.trim().parse::<u64>() {
                Ok(0) => Ok(None),
                Ok(n) => Ok(Some(n)),
                Err(_) => Err(FormatError::invalid(name(), format!("count '{}' is not a number", s))),
            },
            Some(other) => Err(FormatError::invalid(name(), format!("invalid count '{}'", other))),
        }
    }
}

/// Untyped attribute value: case labels and counts may be written as
/// numbers, booleans or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(n) => write!(f, "{}", n),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Text(s) => write!(f, "{}", s),
        }
    }
}

fn matches_name(candidate: &Option<String>, name: &str) -> bool {
    candidate
        .as_deref()
        .map(|c| c.eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

impl FormatterDefinitions {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a definitions file; `.json` is parsed as JSON, anything else as TOML.
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

    pub fn format_by_name(&self, name: &str) -> Option<&FormatDef> {
        self.formats.iter().find(|f| matches_name(&f.name, name))
    }

    /// Class default: the flagged default, else the first for the class.
    pub fn format_for_class(&self, class: &str) -> Option<&FormatDef> {
        let mut candidates = self.formats.iter().filter(|f| matches_name(&f.class, class));
        let first = candidates.next()?;
        if first.default {
            return Some(first);
        }
        Some(candidates.find(|f| f.default).unwrap_or(first))
    }

    pub fn aggregator_by_name(&self, name: &str) -> Option<&AggregatorDef> {
        self.aggregators.iter().find(|a| matches_name(&a.name, name))
    }

    pub fn aggregator_for_class(&self, class: &str) -> Option<&AggregatorDef> {
        let mut candidates = self
            .aggregators
            .iter()
            .filter(|a| matches_name(&a.class, class));
        let first = candidates.next()?;
        if first.default {
            return Some(first);
        }
        Some(candidates.find(|a| a.default).unwrap_or(first))
    }

    /// Structural problems that would only surface mid-compilation.
    pub fn validate(&self) -> FormatResult<()> {
        for def in &self.formats {
            let name = def
                .name
                .clone()
                .or_else(|| def.class.clone())
                .unwrap_or_default();
            if def.switch.fields.is_empty() {
                return Err(FormatError::invalid(name, "switch has no fields groups"));
            }
            if !def.switch.single && def.switch.field.is_none() {
                return Err(FormatError::invalid(name, "switch without single needs a field"));
            }
        }
        for agg in &self.aggregators {
            agg.limit()?;
        }
        Ok(())
    }
}
