//! Locates, reads and assembles the configuration of a run.
//!
//! The file is picked in this order:
//!
//! 1. `--config` (or `WALKLINT_CONFIG`), trusted as given
//! 2. the nearest `walklint.toml` or `.walklint.toml`, searching the start
//!    directory and then its ancestors
//! 3. `config.toml` in `$WALKLINT_CONFIG_DIR`, else in `~/.walklint/`
//! 4. the built-in `recommended` preset
//!
//! Command-line [`Overrides`] are applied to the parsed [`Config`] before the
//! loader validates it, so `--checks` goes through the same preset merge as
//! `[[checks]]`.

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use walklint_core::config::CheckConfig;
use walklint_core::{load, CheckRegistry, Config, LoadedConfig};

/// Preset used when no configuration file is found.
pub const DEFAULT_PRESET: &str = "recommended";

const FILE_NAMES: [&str; 2] = ["walklint.toml", ".walklint.toml"];

const GLOBAL_FILE_NAME: &str = "config.toml";

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named on the command line.
    Flag(PathBuf),
    /// Nearest file in the start directory or an ancestor.
    Nearest(PathBuf),
    /// File in the global configuration directory.
    Global(PathBuf),
    /// No file; the built-in preset.
    Builtin,
}

impl ConfigSource {
    /// The configuration file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Flag(p) | Self::Nearest(p) | Self::Global(p) => Some(p),
            Self::Builtin => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(p) => write!(f, "{} (--config)", p.display()),
            Self::Nearest(p) => write!(f, "{}", p.display()),
            Self::Global(p) => write!(f, "{} (global)", p.display()),
            Self::Builtin => write!(f, "built-in `{DEFAULT_PRESET}` preset"),
        }
    }
}

/// Picks the configuration for a run starting at `start` (a file or a
/// directory).
#[must_use]
pub fn locate(start: &Path, flag: Option<&Path>) -> ConfigSource {
    locate_in(start, flag, global_dir())
}

fn locate_in(start: &Path, flag: Option<&Path>, global: Option<PathBuf>) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource::Flag(path.to_path_buf());
    }

    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    let dir = if start.is_file() {
        start.parent().map_or_else(PathBuf::new, Path::to_path_buf)
    } else {
        start
    };
    let nearest = dir
        .ancestors()
        .flat_map(|d| FILE_NAMES.iter().map(move |name| d.join(name)))
        .find(|candidate| candidate.is_file());
    if let Some(path) = nearest {
        return ConfigSource::Nearest(path);
    }

    global
        .map(|dir| dir.join(GLOBAL_FILE_NAME))
        .filter(|path| path.is_file())
        .map_or(ConfigSource::Builtin, ConfigSource::Global)
}

/// The global configuration directory: `$WALKLINT_CONFIG_DIR`, else
/// `~/.walklint`.
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    match std::env::var_os("WALKLINT_CONFIG_DIR") {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|h| h.join(".walklint")),
    }
}

/// Reads the configuration `source` points at.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read(source: &ConfigSource) -> Result<Config> {
    tracing::debug!("Using configuration from {source}");
    let Some(path) = source.path() else {
        return Ok(Config {
            preset: Some(DEFAULT_PRESET.to_string()),
            ..Config::new()
        });
    };
    Config::from_file(path)
        .map_err(diagnostic)
        .with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Command-line settings layered over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Comma-separated check names replacing the configured selection.
    pub checks: Option<String>,
    /// Exclude patterns added to `[checker] exclude`.
    pub exclude: Vec<String>,
    /// Force a parallel run.
    pub parallel: bool,
}

impl Overrides {
    /// Applies the overrides to `config`.
    ///
    /// `--checks` drops the preset and keeps only the named checks; a name
    /// that is already configured keeps its settings and is re-enabled.
    pub fn apply(&self, config: &mut Config) {
        if let Some(names) = &self.checks {
            let configured = std::mem::take(&mut config.checks);
            config.preset = None;
            config.checks = names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    let mut entry = configured
                        .iter()
                        .find(|c| c.name == name)
                        .cloned()
                        .unwrap_or_else(|| CheckConfig::named(name));
                    entry.enabled = true;
                    entry
                })
                .collect();
        }
        config.checker.exclude.extend(self.exclude.iter().cloned());
        config.checker.parallel |= self.parallel;
    }
}

/// Validates `config` against `registry`.
///
/// # Errors
///
/// Returns the loader's diagnostic if any check or filter is invalid.
pub fn assemble(config: &Config, registry: &CheckRegistry) -> Result<LoadedConfig> {
    load(config, registry)
        .map_err(diagnostic)
        .context("Invalid configuration")
}

/// Renders a diagnostic with its code and help text.
pub fn diagnostic<E>(err: E) -> anyhow::Error
where
    E: miette::Diagnostic + Send + Sync + 'static,
{
    anyhow!("{:?}", miette::Report::new(err))
}
