//! Criteria-only suppression element.

use super::criteria::{CriteriaSpec, SuppressCriteria};
use super::FilterError;
use crate::types::Violation;

/// Suppresses violations matching every configured criterion.
///
/// With no criteria configured it accepts everything.
#[derive(Debug, Clone)]
pub struct SuppressElement {
    criteria: SuppressCriteria,
}

impl SuppressElement {
    /// Builds the element, compiling its patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern or number list is invalid.
    pub fn new(spec: &CriteriaSpec) -> Result<Self, FilterError> {
        Ok(Self {
            criteria: SuppressCriteria::compile(spec)?,
        })
    }

    /// The compiled criteria.
    #[must_use]
    pub fn criteria(&self) -> &SuppressCriteria {
        &self.criteria
    }

    /// Whether the violation should be kept.
    #[must_use]
    pub fn accept(&self, violation: &Violation) -> bool {
        self.criteria.is_empty() || !self.criteria.matches(violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity};

    fn violation(file: &str, check: &str, id: Option<&str>) -> Violation {
        Violation::new(check, Severity::Warning, Location::new(file, 3, 0), "msg")
            .with_module_id(id.map(str::to_string))
    }

    #[test]
    fn all_set_criteria_must_match() {
        let element = SuppressElement::new(&CriteriaSpec {
            files: Some("Generated".into()),
            checks: Some("return".into()),
            ..CriteriaSpec::default()
        })
        .unwrap();

        assert!(!element.accept(&violation("src/GeneratedFoo.java", "return-count", None)));
        assert!(element.accept(&violation("src/Foo.java", "return-count", None)));
        assert!(element.accept(&violation("src/GeneratedFoo.java", "nested-if-depth", None)));
    }

    #[test]
    fn id_criterion_requires_an_id() {
        let element = SuppressElement::new(&CriteriaSpec {
            id: Some("returns".into()),
            ..CriteriaSpec::default()
        })
        .unwrap();
        assert!(!element.accept(&violation("A.java", "return-count", Some("returns"))));
        assert!(element.accept(&violation("A.java", "return-count", None)));
    }

    #[test]
    fn lines_compose_with_checks() {
        let element = SuppressElement::new(&CriteriaSpec {
            checks: Some("return-count".into()),
            lines: Some("1-5".into()),
            ..CriteriaSpec::default()
        })
        .unwrap();
        assert!(!element.accept(&violation("A.java", "return-count", None)));

        let outside = Violation::new(
            "return-count",
            Severity::Warning,
            Location::new("A.java", 6, 0),
            "msg",
        );
        assert!(element.accept(&outside));
    }

    #[test]
    fn invalid_pattern_fails_at_construction() {
        let err = SuppressElement::new(&CriteriaSpec {
            checks: Some("(".into()),
            ..CriteriaSpec::default()
        })
        .unwrap_err();
        assert!(matches!(err, FilterError::InvalidPattern { criterion: "checks", .. }));
    }
}
