//! Check presets and the built-in registry.

use crate::illegal_instantiation::{self, IllegalInstantiation, IllegalInstantiationOptions};
use crate::nested_if_depth::{self, NestedIfDepth, NestedIfDepthOptions};
use crate::outer_type_number::{self, OuterTypeNumber, OuterTypeNumberOptions};
use crate::return_count::{self, ReturnCount, ReturnCountOptions};
use walklint_core::{Check, CheckRegistry};

/// Named check selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Checks that are useful with their defaults.
    Recommended,
    /// Every built-in check.
    All,
}

impl Preset {
    /// Every preset.
    pub const ALL: [Self; 2] = [Self::Recommended, Self::All];

    /// Name used in configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::All => "all",
        }
    }

    /// Check names in this preset.
    #[must_use]
    pub fn checks(self) -> Vec<&'static str> {
        match self {
            Self::Recommended => recommended_checks(),
            Self::All => all_checks(),
        }
    }
}

/// Returns the recommended set of checks.
///
/// Includes:
/// - `return-count` - Limits returns per method
/// - `nested-if-depth` - Limits `if` nesting
/// - `outer-type-number` - One top-level type per file
///
/// `illegal-instantiation` is left out because it does nothing until
/// `classes` is configured.
#[must_use]
pub fn recommended_checks() -> Vec<&'static str> {
    vec![
        return_count::NAME,
        nested_if_depth::NAME,
        outer_type_number::NAME,
    ]
}

/// Returns all available checks.
#[must_use]
pub fn all_checks() -> Vec<&'static str> {
    vec![
        illegal_instantiation::NAME,
        return_count::NAME,
        nested_if_depth::NAME,
        outer_type_number::NAME,
    ]
}

/// Creates a registry with every built-in check and preset.
#[must_use]
pub fn builtin_registry() -> CheckRegistry {
    let mut registry = CheckRegistry::new();
    registry.register(
        illegal_instantiation::NAME,
        "Forbids instantiating the configured classes",
        |o: &IllegalInstantiationOptions| -> Box<dyn Check> {
            Box::new(IllegalInstantiation::from_options(o))
        },
    );
    registry.register(
        return_count::NAME,
        "Limits the number of return statements per method, constructor and lambda",
        |o: &ReturnCountOptions| -> Box<dyn Check> { Box::new(ReturnCount::from_options(o)) },
    );
    registry.register(
        nested_if_depth::NAME,
        "Limits the nesting depth of if statements",
        |o: &NestedIfDepthOptions| -> Box<dyn Check> { Box::new(NestedIfDepth::from_options(o)) },
    );
    registry.register(
        outer_type_number::NAME,
        "Limits the number of top-level types per file",
        |o: &OuterTypeNumberOptions| -> Box<dyn Check> {
            Box::new(OuterTypeNumber::from_options(o))
        },
    );
    for preset in Preset::ALL {
        registry.register_preset(preset.name(), preset.checks());
    }
    tracing::debug!(checks = registry.len(), "Built-in registry ready");
    registry
}
