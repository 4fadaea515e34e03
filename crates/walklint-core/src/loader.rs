//! Configuration → run objects, with validation.
//!
//! Everything is compiled here, before any file is processed: check options,
//! kind names, regular expressions and structural queries. The first error
//! aborts loading.

use crate::check::CheckDescriptor;
use crate::checker::CheckerBuilder;
use crate::config::{
    CheckConfig, Config, KeepRangeConfig, SuppressCommentsConfig, SuppressConfig,
    SuppressNearbyConfig,
};
use crate::dispatch::{register, RegistrationError};
use crate::filter::{
    CommentElement, CommentSpec, CriteriaSpec, FilterElement, FilterError, FilterSet,
    NearbyElement, NearbySpec, RangeElement, StructuralElement, SuppressElement,
};
use crate::kind::{KindSet, SyntaxKind};
use crate::query::{EngineOptions, QueryEngine};
use crate::registry::{CheckOptions, CheckRegistry, RegistryError};

use tracing::debug;

/// Errors while turning a [`Config`] into run objects.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LoadError {
    /// A check could not be built.
    #[error("{context}: {source}")]
    #[diagnostic(code(walklint::config::check))]
    Check {
        /// Where the error occurred (e.g., "checks[0]").
        context: String,
        /// The registry error.
        source: RegistryError,
    },

    /// An unknown kind name.
    #[error("{context}: unknown node kind `{value}`")]
    #[diagnostic(
        code(walklint::config::kind),
        help("kind names are SCREAMING_SNAKE_CASE, e.g. `LITERAL_NEW`")
    )]
    UnknownKind {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// A filter could not be built.
    #[error("{context}: {source}")]
    #[diagnostic(code(walklint::config::filter))]
    Filter {
        /// Where the error occurred (e.g., "suppress[2]").
        context: String,
        /// The filter error.
        source: FilterError,
    },

    /// Check kind sets are inconsistent.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registration(#[from] RegistrationError),
}

/// Validated run objects built from a [`Config`].
#[derive(Debug)]
pub struct LoadedConfig {
    /// Checks, in registration order.
    pub checks: Vec<CheckDescriptor>,
    /// Filters grouped by table (`[[suppress]]`, `[[keep-range]]`,
    /// `[[suppress-comments]]`, `[[suppress-nearby]]`), each table in file
    /// order.
    pub filters: FilterSet,
    /// The run's query engine.
    pub engine: QueryEngine,
    /// Process files in parallel.
    pub parallel: bool,
    /// Worker count for parallel runs.
    pub jobs: usize,
}

impl LoadedConfig {
    /// A checker builder carrying everything that was loaded.
    #[must_use]
    pub fn into_builder(self) -> CheckerBuilder {
        CheckerBuilder::new()
            .checks(self.checks)
            .filters(self.filters)
            .engine(self.engine)
            .parallel(self.parallel)
            .jobs(self.jobs)
    }
}

/// Validates `config` against `registry` and builds the run objects.
///
/// Checks come from the preset (if any) followed by `[[checks]]`; an entry
/// naming a preset check replaces it in place, and `enabled = false`
/// removes it.
///
/// # Errors
///
/// Returns the first error encountered.
pub fn load(config: &Config, registry: &CheckRegistry) -> Result<LoadedConfig, LoadError> {
    let engine = QueryEngine::new(engine_options(config)?);

    let entries = resolve_checks(config, registry)?;
    let checks = entries
        .iter()
        .map(|(context, entry)| convert_check(entry, context, registry))
        .collect::<Result<Vec<_>, _>>()?;
    register(&checks)?;

    let mut filters = FilterSet::new();
    for (i, dto) in config.suppress.iter().enumerate() {
        let context = format!("suppress[{i}]");
        filters.push(convert_suppress(dto, &engine).map_err(|source| LoadError::Filter {
            context,
            source,
        })?);
    }
    for (i, dto) in config.keep_range.iter().enumerate() {
        let context = format!("keep-range[{i}]");
        filters.push(convert_range(dto).map_err(|source| LoadError::Filter { context, source })?);
    }
    for (i, dto) in config.suppress_comments.iter().enumerate() {
        let context = format!("suppress-comments[{i}]");
        filters.push(convert_comments(dto).map_err(|source| LoadError::Filter { context, source })?);
    }
    for (i, dto) in config.suppress_nearby.iter().enumerate() {
        let context = format!("suppress-nearby[{i}]");
        filters.push(convert_nearby(dto).map_err(|source| LoadError::Filter { context, source })?);
    }

    debug!(
        checks = checks.len(),
        filters = filters.len(),
        "Configuration loaded"
    );

    Ok(LoadedConfig {
        checks,
        filters,
        engine,
        parallel: config.checker.parallel,
        jobs: config.checker.jobs,
    })
}

fn engine_options(config: &Config) -> Result<EngineOptions, LoadError> {
    let Some(names) = &config.query.text_kinds else {
        return Ok(EngineOptions::default());
    };
    let text_kinds = parse_kinds(names, "query.text-kinds")?;
    Ok(EngineOptions { text_kinds })
}

fn parse_kinds(names: &[String], context: &str) -> Result<KindSet, LoadError> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            name.parse::<SyntaxKind>()
                .map_err(|_| LoadError::UnknownKind {
                    context: format!("{context}[{i}]"),
                    value: name.clone(),
                })
        })
        .collect()
}

/// Preset entries followed by explicit ones, with their config context.
fn resolve_checks(
    config: &Config,
    registry: &CheckRegistry,
) -> Result<Vec<(String, CheckConfig)>, LoadError> {
    let mut entries: Vec<(String, CheckConfig)> = match &config.preset {
        Some(preset) => registry
            .preset(preset)
            .map_err(|source| LoadError::Check {
                context: "preset".to_string(),
                source,
            })?
            .iter()
            .map(|name| (format!("preset `{preset}`"), CheckConfig::named(*name)))
            .collect(),
        None => Vec::new(),
    };

    let preset_len = entries.len();
    for (i, entry) in config.checks.iter().enumerate() {
        let context = format!("checks[{i}]");
        match entries[..preset_len]
            .iter_mut()
            .find(|(_, e)| e.name == entry.name)
        {
            Some(slot) => *slot = (context, entry.clone()),
            None => entries.push((context, entry.clone())),
        }
    }

    entries.retain(|(_, e)| e.enabled);
    Ok(entries)
}

fn convert_check(
    dto: &CheckConfig,
    context: &str,
    registry: &CheckRegistry,
) -> Result<CheckDescriptor, LoadError> {
    let options = CheckOptions::new(dto.options.clone());
    let mut descriptor = registry
        .build(&dto.name, &options)
        .map_err(|source| LoadError::Check {
            context: context.to_string(),
            source,
        })?;

    if let Some(id) = &dto.id {
        descriptor = descriptor.with_module_id(id.clone());
    }
    if let Some(severity) = dto.severity {
        descriptor = descriptor.with_severity(severity);
    }
    if let Some(kinds) = &dto.kinds {
        descriptor = descriptor.with_kinds(parse_kinds(kinds, &format!("{context}.kinds"))?);
    }
    Ok(descriptor)
}

fn convert_suppress(
    dto: &SuppressConfig,
    engine: &QueryEngine,
) -> Result<FilterElement, FilterError> {
    let criteria = CriteriaSpec {
        files: dto.files.clone(),
        checks: dto.checks.clone(),
        message: dto.message.clone(),
        id: dto.id.clone(),
        lines: dto.lines.clone(),
        columns: dto.columns.clone(),
    };
    Ok(match &dto.query {
        Some(query) => StructuralElement::new(&criteria, Some(query), engine.clone())?.into(),
        None => SuppressElement::new(&criteria)?.into(),
    })
}

fn convert_range(dto: &KeepRangeConfig) -> Result<RangeElement, FilterError> {
    RangeElement::new(dto.target, dto.lower, dto.upper)
}

fn convert_comments(dto: &SuppressCommentsConfig) -> Result<CommentElement, FilterError> {
    let defaults = CommentSpec::default();
    CommentElement::new(&CommentSpec {
        off: dto.off.clone().unwrap_or(defaults.off),
        on: dto.on.clone().unwrap_or(defaults.on),
        checks: dto.checks.clone().unwrap_or(defaults.checks),
        message: dto.message.clone(),
        id: dto.id.clone(),
    })
}

fn convert_nearby(dto: &SuppressNearbyConfig) -> Result<NearbyElement, FilterError> {
    let defaults = NearbySpec::default();
    NearbyElement::new(&NearbySpec {
        comment: dto.comment.clone().unwrap_or(defaults.comment),
        checks: dto.checks.clone().unwrap_or(defaults.checks),
        message: dto.message.clone(),
        id: dto.id.clone(),
        influence: dto.influence.clone().unwrap_or(defaults.influence),
    })
}
