//! Configuration file types (`walklint.toml`).
//!
//! These types exist for serde; [`crate::loader`] validates them and builds
//! the checks, filters and query engine of a run.

use crate::filter::RangeTarget;
use crate::types::Severity;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Preset of checks enabled before `[[checks]]` is applied
    /// (e.g. "recommended", "all").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Lowest severity that makes a run fail (default: error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<Severity>,

    /// Run settings.
    #[serde(default)]
    pub checker: CheckerConfig,

    /// Query engine settings.
    #[serde(default)]
    pub query: QueryConfig,

    /// Checks, in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckConfig>,

    /// Criteria and structural suppressions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppress: Vec<SuppressConfig>,

    /// Line or column ranges outside of which violations are dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keep_range: Vec<KeepRangeConfig>,

    /// Comment-delimited suppressions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppress_comments: Vec<SuppressCommentsConfig>,

    /// Suppressions by a nearby comment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppress_nearby: Vec<SuppressNearbyConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            origin: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            origin: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// The configured failure threshold.
    #[must_use]
    pub fn fail_on(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Error)
    }

    /// Serializes the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            origin: "<serialize>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Run settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CheckerConfig {
    /// Process files on a rayon pool.
    #[serde(default)]
    pub parallel: bool,

    /// Worker count for parallel runs; 0 uses rayon's default.
    #[serde(default)]
    pub jobs: usize,

    /// Glob patterns excluded from file discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Query engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct QueryConfig {
    /// Kinds exposing `@text`; the built-in set when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_kinds: Option<Vec<String>>,
}

/// One `[[checks]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CheckConfig {
    /// Registry identifier.
    pub name: String,

    /// Module id stamped on violations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Severity override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Subset of the check's acceptable kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<String>>,

    /// Whether the check runs.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Check-specific options.
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub options: toml::Table,
}

impl CheckConfig {
    /// An enabled entry with no overrides.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            severity: None,
            kinds: None,
            enabled: true,
            options: toml::Table::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One `[[suppress]]` entry. With `query` set it becomes a structural
/// element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SuppressConfig {
    /// File name pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,
    /// Check name pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<String>,
    /// Message pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Exact module id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Line list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<String>,
    /// Column list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<String>,
    /// Structural query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// One `[[keep-range]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KeepRangeConfig {
    /// Tested coordinate.
    #[serde(default)]
    pub target: RangeTarget,
    /// Inclusive lower bound.
    pub lower: usize,
    /// Inclusive upper bound.
    pub upper: usize,
}

/// One `[[suppress-comments]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SuppressCommentsConfig {
    /// Pattern of comments opening a region (default `LINT:OFF`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off: Option<String>,
    /// Pattern of comments closing a region (default `LINT:ON`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
    /// Check name pattern (default `.*`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<String>,
    /// Message pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Exact module id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One `[[suppress-nearby]]` entry.
///
/// `checks`, `message`, `id` and `influence` may refer to captures of
/// `comment` as `$1` or `${name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SuppressNearbyConfig {
    /// Pattern of suppression comments (default `LINT:IGNORE ([\w-]+)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Check name pattern (default `.*`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<String>,
    /// Message pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Module id pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Signed line offset (default `"0"`, the comment's own line).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influence: Option<String>,
}

/// Configuration file errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(walklint::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config {origin}: {message}")]
    #[diagnostic(code(walklint::config::parse))]
    Parse {
        /// Where the text came from.
        origin: String,
        /// Parse error message.
        message: String,
    },
}
