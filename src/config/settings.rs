//! TOML-based configuration for objformat.
//!
//! Supports a config file (objformat.toml) with environment variable expansion
//! in paths. Relative paths are resolved against the config file's directory.
//!
//! Example configuration:
//! ```toml
//! dialect = "mysql"
//!
//! [paths]
//! catalog = "${SCHEMA_DIR}/catalog.toml"
//! definitions = "./formatters.toml"
//! scope = "./scope.toml"
//!
//! [formatting]
//! date_format = "dd/MM/yyyy"
//! numeric_catalog_number = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::CatalogError;
use crate::sql::Dialect;

/// Error type for settings and configuration documents.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse JSON config file: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("No {0} path configured")]
    MissingPath(&'static str),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// SQL dialect to emit.
    pub dialect: Dialect,

    /// Locations of the configuration documents.
    pub paths: PathSettings,

    /// Field-level formatting options.
    pub formatting: FormattingSettings,

    /// Directory of the loaded config file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Configuration document paths (support ${ENV_VAR} expansion).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PathSettings {
    pub catalog: Option<String>,
    pub definitions: Option<String>,
    /// Optional; an empty scope is used when absent.
    pub scope: Option<String>,
}

/// Field-level formatting options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormattingSettings {
    /// Date pattern, e.g. `yyyy-MM-dd` or `dd/MM/yyyy`.
    pub date_format: String,

    /// Cast numeric catalog numbers to DECIMAL so they sort numerically.
    pub numeric_catalog_number: bool,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            date_format: "yyyy-MM-dd".to_string(),
            numeric_catalog_number: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut settings: Settings = toml::from_str(&content)?;
        settings.base_dir = path.parent().map(Path::to_path_buf);
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `OBJFORMAT_CONFIG`
    /// 2. `./objformat.toml`
    pub fn load() -> SettingsResult<Self> {
        if let Ok(path) = env::var("OBJFORMAT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("objformat.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Expand and anchor a configured path.
    pub fn resolve_path(&self, raw: &str) -> SettingsResult<PathBuf> {
        let path = PathBuf::from(expand_env_vars(raw)?);
        match &self.base_dir {
            Some(base) if path.is_relative() => Ok(base.join(path)),
            _ => Ok(path),
        }
    }

    pub fn catalog_path(&self) -> SettingsResult<PathBuf> {
        let raw = self
            .paths
            .catalog
            .as_deref()
            .ok_or(SettingsError::MissingPath("catalog"))?;
        self.resolve_path(raw)
    }

    pub fn definitions_path(&self) -> SettingsResult<PathBuf> {
        let raw = self
            .paths
            .definitions
            .as_deref()
            .ok_or(SettingsError::MissingPath("definitions"))?;
        self.resolve_path(raw)
    }

    pub fn scope_path(&self) -> SettingsResult<Option<PathBuf>> {
        self.paths
            .scope
            .as_deref()
            .map(|raw| self.resolve_path(raw))
            .transpose()
    }
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> SettingsResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            let name: String = chars.by_ref().take_while(|&ch| ch != '}').collect();
            name
        } else {
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
            name
        };

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
