//! Nearby-comment suppression element.
//!
//! A comment matching the element's pattern suppresses violations on its own
//! line and, with an influence, on neighbouring lines:
//! ```text
//! // LINT:IGNORE return-count
//! int pick(int a) { ... }
//! ```
//!
//! The `checks`, `message`, `id` and `influence` settings are templates
//! expanded with the comment pattern's captures (`$1`, `${name}`), so one
//! element can read the check name and the line span from the comment
//! itself.

use super::criteria::{compile_pattern, required_pattern};
use super::{AuditEvent, FilterError};
use crate::ast::SyntaxTree;
use crate::kind::SyntaxKind;
use crate::types::Violation;
use regex::{Captures, Regex};
use tracing::warn;

/// Uncompiled nearby-comment element settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbySpec {
    /// Pattern of suppression comments.
    pub comment: String,
    /// Check name pattern template.
    pub checks: String,
    /// Message pattern template.
    pub message: Option<String>,
    /// Module id pattern template.
    pub id: Option<String>,
    /// Line offset template. A positive offset extends the span below the
    /// comment, a negative one above it.
    pub influence: String,
}

impl Default for NearbySpec {
    fn default() -> Self {
        Self {
            comment: r"LINT:IGNORE ([\w-]+)".to_string(),
            checks: ".*".to_string(),
            message: None,
            id: None,
            influence: "0".to_string(),
        }
    }
}

/// One suppression comment, with its templates expanded.
#[derive(Debug, Clone)]
pub(super) struct NearbyTag {
    first: usize,
    last: usize,
    checks: Regex,
    message: Option<Regex>,
    id: Option<Regex>,
}

impl NearbyTag {
    fn matches(&self, violation: &Violation) -> bool {
        (self.first..=self.last).contains(&violation.line())
            && self.checks.is_match(violation.check())
            && self
                .message
                .as_ref()
                .map_or(true, |m| m.is_match(violation.message()))
            && self.id.as_ref().map_or(true, |id| {
                violation.module_id().is_some_and(|v| id.is_match(v))
            })
    }
}

/// Suppresses violations near a suppression comment.
#[derive(Debug, Clone)]
pub struct NearbyElement {
    comment: Regex,
    checks: String,
    message: Option<String>,
    id: Option<String>,
    influence: String,
}

impl NearbyElement {
    /// Builds the element.
    ///
    /// The comment pattern is compiled here. Templates without capture
    /// references are checked here as well; the others are expanded per
    /// comment, and a comment whose expansion is invalid is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error naming the setting if a pattern does not compile or
    /// the influence is not an integer.
    pub fn new(spec: &NearbySpec) -> Result<Self, FilterError> {
        let comment = required_pattern("comment", &spec.comment)?;
        for (setting, template) in [
            ("checks", Some(spec.checks.as_str())),
            ("message", spec.message.as_deref()),
            ("id", spec.id.as_deref()),
        ] {
            if let Some(template) = template.filter(|t| !t.contains('$')) {
                compile_pattern(setting, Some(template))?;
            }
        }
        if !spec.influence.contains('$') {
            parse_influence(&spec.influence).map_err(|reason| FilterError::InvalidTemplate {
                setting: "influence",
                text: spec.influence.clone(),
                reason,
            })?;
        }
        Ok(Self {
            comment,
            checks: spec.checks.clone(),
            message: spec.message.clone(),
            id: spec.id.clone(),
            influence: spec.influence.clone(),
        })
    }

    /// Whether the violation should be kept.
    ///
    /// Scans the tree on every call; [`super::FilterSet::bind`] scans once
    /// per file.
    #[must_use]
    pub fn accept(&self, event: &AuditEvent<'_>) -> bool {
        match event.tree {
            Some(tree) => self.accept_tagged(event.violation, &self.tags(tree)),
            None => true,
        }
    }

    /// Whether the violation should be kept, given the file's `tags`.
    pub(super) fn accept_tagged(&self, violation: &Violation, tags: &[NearbyTag]) -> bool {
        !tags.iter().any(|tag| tag.matches(violation))
    }

    /// Suppression comments in the tree. Each line of a block comment is
    /// matched on its own.
    pub(super) fn tags(&self, tree: &SyntaxTree) -> Vec<NearbyTag> {
        tree.nodes()
            .filter(|n| n.kind() == SyntaxKind::CommentContent)
            .flat_map(|n| {
                n.text()
                    .split('\n')
                    .enumerate()
                    .map(move |(offset, text)| (n.line() + offset, text))
            })
            .filter_map(|(line, text)| {
                let captures = self.comment.captures(text)?;
                match self.tag(line, &captures) {
                    Ok(tag) => Some(tag),
                    Err(reason) => {
                        warn!("Ignoring suppression comment on line {line}: {reason}");
                        None
                    }
                }
            })
            .collect()
    }

    fn tag(&self, line: usize, captures: &Captures<'_>) -> Result<NearbyTag, String> {
        let expand = |template: &str| {
            let mut out = String::new();
            captures.expand(template, &mut out);
            out
        };
        let pattern = |template: &str| {
            let text = expand(template);
            Regex::new(&text).map_err(|e| format!("invalid pattern `{text}`: {e}"))
        };

        let influence = parse_influence(&expand(&self.influence))?;
        let span = usize::try_from(influence.unsigned_abs()).unwrap_or(usize::MAX);
        let (first, last) = if influence >= 1 {
            (line, line.saturating_add(span))
        } else {
            (line.saturating_sub(span), line)
        };
        Ok(NearbyTag {
            first,
            last,
            checks: pattern(&self.checks)?,
            message: self.message.as_deref().map(pattern).transpose()?,
            id: self.id.as_deref().map(pattern).transpose()?,
        })
    }
}

fn parse_influence(text: &str) -> Result<i64, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("`{text}` is not a line offset"))
}
