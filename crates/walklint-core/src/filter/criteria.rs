//! Violation criteria shared by the regex and structural elements.

use super::FilterError;
use crate::types::Violation;
use regex::Regex;
use std::ops::RangeInclusive;

/// Uncompiled criteria, as they come from configuration.
///
/// Every field is optional; an unset field matches any violation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSpec {
    /// Pattern searched in the file name.
    pub files: Option<String>,
    /// Pattern searched in the check name.
    pub checks: Option<String>,
    /// Pattern searched in the message.
    pub message: Option<String>,
    /// Exact module id.
    pub id: Option<String>,
    /// Line list, e.g. `"1-10, 15"`.
    pub lines: Option<String>,
    /// Display-column list, e.g. `"1-40"`.
    pub columns: Option<String>,
}

/// Compiled criteria.
#[derive(Debug, Clone)]
pub struct SuppressCriteria {
    files: Option<Regex>,
    checks: Option<Regex>,
    message: Option<Regex>,
    id: Option<String>,
    lines: Option<IntSet>,
    columns: Option<IntSet>,
}

impl SuppressCriteria {
    /// Compiles every configured pattern.
    ///
    /// # Errors
    ///
    /// Returns an error naming the criterion and its text if a pattern or
    /// number list is invalid.
    pub fn compile(spec: &CriteriaSpec) -> Result<Self, FilterError> {
        Ok(Self {
            files: compile_pattern("files", spec.files.as_deref())?,
            checks: compile_pattern("checks", spec.checks.as_deref())?,
            message: compile_pattern("message", spec.message.as_deref())?,
            id: spec.id.clone(),
            lines: spec
                .lines
                .as_deref()
                .map(|text| IntSet::parse("lines", text))
                .transpose()?,
            columns: spec
                .columns
                .as_deref()
                .map(|text| IntSet::parse("columns", text))
                .transpose()?,
        })
    }

    /// Whether no criterion is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_none()
            && self.checks.is_none()
            && self.message.is_none()
            && self.id.is_none()
            && self.lines.is_none()
            && self.columns.is_none()
    }

    /// Whether every configured criterion matches the violation.
    ///
    /// Patterns are searched, not anchored. The module id must be equal.
    #[must_use]
    pub fn matches(&self, violation: &Violation) -> bool {
        let search = |pattern: &Option<Regex>, value: Option<&str>| match pattern {
            None => true,
            Some(regex) => value.is_some_and(|v| regex.is_match(v)),
        };

        search(&self.files, Some(violation.file()))
            && search(&self.checks, Some(violation.check()))
            && search(&self.message, Some(violation.message()))
            && self
                .id
                .as_deref()
                .map_or(true, |id| violation.module_id() == Some(id))
            && self
                .lines
                .as_ref()
                .map_or(true, |set| set.contains(violation.line()))
            && self
                .columns
                .as_ref()
                .map_or(true, |set| set.contains(violation.location().display_column()))
    }
}

pub(crate) fn compile_pattern(
    criterion: &'static str,
    pattern: Option<&str>,
) -> Result<Option<Regex>, FilterError> {
    pattern.map(|p| required_pattern(criterion, p)).transpose()
}

pub(crate) fn required_pattern(criterion: &'static str, pattern: &str) -> Result<Regex, FilterError> {
    Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
        criterion,
        pattern: pattern.to_string(),
        source,
    })
}

/// A set of non-negative integers written as comma-separated values and
/// inclusive ranges, e.g. `"1-10, 15"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntSet {
    ranges: Vec<RangeInclusive<usize>>,
}

impl IntSet {
    /// Parses a list.
    ///
    /// # Errors
    ///
    /// Returns an error if an item is not a number or a `lo-hi` range with
    /// `lo <= hi`.
    pub fn parse(criterion: &'static str, text: &str) -> Result<Self, FilterError> {
        let invalid = |reason: String| FilterError::InvalidIntSet {
            criterion,
            text: text.to_string(),
            reason,
        };

        let mut ranges = Vec::new();
        for item in text.split(',').map(str::trim) {
            if item.is_empty() {
                return Err(invalid("empty item".to_string()));
            }
            let parse = |s: &str| {
                s.trim()
                    .parse::<usize>()
                    .map_err(|_| invalid(format!("`{s}` is not a number")))
            };
            let range = match item.split_once('-') {
                Some((lo, hi)) => {
                    let (lo, hi) = (parse(lo)?, parse(hi)?);
                    if lo > hi {
                        return Err(invalid(format!("range `{item}` is reversed")));
                    }
                    lo..=hi
                }
                None => {
                    let value = parse(item)?;
                    value..=value
                }
            };
            ranges.push(range);
        }
        Ok(Self { ranges })
    }

    /// Whether `value` is in the set.
    #[must_use]
    pub fn contains(&self, value: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity};

    fn violation(message: &str) -> Violation {
        Violation::new(
            "return-count",
            Severity::Error,
            Location::new("src/main/Foo.java", 12, 4),
            message,
        )
        .with_module_id(Some("returns".to_string()))
    }

    #[test]
    fn int_set_parses_values_and_ranges() {
        let set = IntSet::parse("lines", "1-10, 15,20 - 22").unwrap();
        assert!(set.contains(1));
        assert!(set.contains(10));
        assert!(!set.contains(11));
        assert!(set.contains(15));
        assert!(set.contains(21));
        assert!(!set.contains(23));
    }

    #[test]
    fn int_set_rejects_garbage() {
        for text in ["", "1,,2", "a-3", "5-2", "1-"] {
            let err = IntSet::parse("lines", text).unwrap_err();
            assert!(err.to_string().contains("lines"), "{err}");
        }
    }

    #[test]
    fn unset_criteria_match_everything() {
        let criteria = SuppressCriteria::compile(&CriteriaSpec::default()).unwrap();
        assert!(criteria.is_empty());
        assert!(criteria.matches(&violation("anything")));
    }

    #[test]
    fn patterns_are_searched() {
        let criteria = SuppressCriteria::compile(&CriteriaSpec {
            files: Some("main".into()),
            checks: Some("count".into()),
            ..CriteriaSpec::default()
        })
        .unwrap();
        assert!(criteria.matches(&violation("x")));
    }

    #[test]
    fn module_id_is_exact() {
        let exact = SuppressCriteria::compile(&CriteriaSpec {
            id: Some("returns".into()),
            ..CriteriaSpec::default()
        })
        .unwrap();
        let prefix = SuppressCriteria::compile(&CriteriaSpec {
            id: Some("return".into()),
            ..CriteriaSpec::default()
        })
        .unwrap();
        assert!(exact.matches(&violation("x")));
        assert!(!prefix.matches(&violation("x")));
    }

    #[test]
    fn columns_use_display_column() {
        let criteria = SuppressCriteria::compile(&CriteriaSpec {
            lines: Some("12".into()),
            columns: Some("5".into()),
            ..CriteriaSpec::default()
        })
        .unwrap();
        assert!(criteria.matches(&violation("x")));
    }

    #[test]
    fn invalid_pattern_names_criterion() {
        let err = SuppressCriteria::compile(&CriteriaSpec {
            message: Some("MyMethod[".into()),
            ..CriteriaSpec::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("message"));
        assert!(err.to_string().contains("MyMethod["));
    }
}
