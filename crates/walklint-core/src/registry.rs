//! Stable-identifier check registry.
//!
//! Maps configuration names such as `"return-count"` to builders that turn
//! a typed options struct into a [`CheckFactory`].

use crate::check::{Check, CheckDescriptor, CheckFactory};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Options given to a check in configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOptions {
    table: toml::Table,
}

impl CheckOptions {
    /// Wraps a TOML table.
    #[must_use]
    pub fn new(table: toml::Table) -> Self {
        Self { table }
    }

    /// Whether no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Deserializes the options into `T`.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's message if the table does not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, String> {
        toml::Value::Table(self.table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| e.message().to_string())
    }
}

/// Errors from looking up or building a check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RegistryError {
    /// No check is registered under this name.
    #[error("unknown check `{name}`")]
    #[diagnostic(code(walklint::registry::unknown), help("known checks: {known}"))]
    UnknownCheck {
        /// Requested name.
        name: String,
        /// Comma-separated registered names.
        known: String,
    },

    /// The options do not fit the check's options type.
    #[error("invalid options for check `{check}`: {message}")]
    #[diagnostic(code(walklint::registry::options))]
    InvalidOptions {
        /// Check name.
        check: String,
        /// Deserializer message.
        message: String,
    },

    /// No preset is registered under this name.
    #[error("unknown preset `{name}`")]
    #[diagnostic(code(walklint::registry::preset), help("known presets: {known}"))]
    UnknownPreset {
        /// Requested preset.
        name: String,
        /// Comma-separated registered presets.
        known: String,
    },
}

type Builder = Arc<dyn Fn(&CheckOptions) -> Result<CheckFactory, String> + Send + Sync>;

struct Entry {
    name: &'static str,
    description: &'static str,
    build: Builder,
}

/// Options type for checks that take none.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoOptions {}

/// Registered checks and presets, in registration order.
#[derive(Default)]
pub struct CheckRegistry {
    entries: Vec<Entry>,
    presets: Vec<(&'static str, Vec<&'static str>)>,
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("checks", &self.names().collect::<Vec<_>>())
            .field("presets", &self.presets)
            .finish()
    }
}

impl CheckRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check whose instances are built from options of type `O`.
    ///
    /// `O` is deserialized from the configured options table, so its serde
    /// attributes decide defaults and whether unknown keys are rejected.
    /// Registering a name twice replaces the earlier entry.
    pub fn register<O, F>(&mut self, name: &'static str, description: &'static str, make: F)
    where
        O: DeserializeOwned + Send + Sync + 'static,
        F: Fn(&O) -> Box<dyn Check> + Send + Sync + 'static,
    {
        let make = Arc::new(make);
        let build: Builder = Arc::new(move |options: &CheckOptions| {
            let options: Arc<O> = Arc::new(options.parse()?);
            let make = Arc::clone(&make);
            let factory: CheckFactory = Arc::new(move || make(options.as_ref()));
            Ok(factory)
        });
        self.insert(Entry {
            name,
            description,
            build,
        });
    }

    /// Registers a check that takes no options.
    pub fn register_default<C>(&mut self)
    where
        C: Check + Default + 'static,
    {
        let prototype = C::default();
        self.register(prototype.name(), prototype.description(), |_: &NoOptions| {
            Box::new(C::default())
        });
    }

    fn insert(&mut self, entry: Entry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Registers a named list of check names.
    pub fn register_preset(&mut self, name: &'static str, checks: Vec<&'static str>) {
        self.presets.retain(|(n, _)| *n != name);
        self.presets.push((name, checks));
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Registered names with their descriptions.
    pub fn describe(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().map(|e| (e.name, e.description))
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of registered checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no check is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check names in a preset.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownPreset`] if no such preset exists.
    pub fn preset(&self, name: &str) -> Result<&[&'static str], RegistryError> {
        self.presets
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, checks)| checks.as_slice())
            .ok_or_else(|| RegistryError::UnknownPreset {
                name: name.to_string(),
                known: self
                    .presets
                    .iter()
                    .map(|(n, _)| *n)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Builds a descriptor for `name` from its options.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is unknown or the options do not fit.
    pub fn build(&self, name: &str, options: &CheckOptions) -> Result<CheckDescriptor, RegistryError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| RegistryError::UnknownCheck {
                name: name.to_string(),
                known: self.names().collect::<Vec<_>>().join(", "),
            })?;
        let factory = (entry.build)(options).map_err(|message| RegistryError::InvalidOptions {
            check: name.to_string(),
            message,
        })?;
        Ok(CheckDescriptor::new(factory))
    }
}
