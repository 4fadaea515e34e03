//! Integer-range element.

use super::FilterError;
use crate::types::Violation;
use serde::{Deserialize, Serialize};

/// Which violation coordinate a [`RangeElement`] tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeTarget {
    /// The 1-based line.
    #[default]
    Line,
    /// The 1-based display column.
    Column,
}

/// Keeps violations whose target value lies in `lower..=upper`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeElement {
    target: RangeTarget,
    lower: usize,
    upper: usize,
}

impl RangeElement {
    /// Creates the element.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidBounds`] if `lower > upper`.
    pub fn new(target: RangeTarget, lower: usize, upper: usize) -> Result<Self, FilterError> {
        if lower > upper {
            return Err(FilterError::InvalidBounds { lower, upper });
        }
        Ok(Self {
            target,
            lower,
            upper,
        })
    }

    /// The tested coordinate.
    #[must_use]
    pub fn target(&self) -> RangeTarget {
        self.target
    }

    /// Whether the violation should be kept.
    #[must_use]
    pub fn accept(&self, violation: &Violation) -> bool {
        let value = match self.target {
            RangeTarget::Line => violation.line(),
            RangeTarget::Column => violation.location().display_column(),
        };
        (self.lower..=self.upper).contains(&value)
    }
}
