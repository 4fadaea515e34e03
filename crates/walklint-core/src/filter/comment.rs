//! Comment-pair suppression element.
//!
//! Regions of a file can be excluded with comments:
//! ```text
//! // LINT:OFF
//! ... violations here are suppressed ...
//! // LINT:ON
//! ```

use super::criteria::{compile_pattern, required_pattern};
use super::{AuditEvent, FilterError};
use crate::ast::SyntaxTree;
use crate::kind::SyntaxKind;
use crate::types::Violation;
use regex::Regex;

/// Uncompiled comment element settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSpec {
    /// Pattern of comments that open a suppressed region.
    pub off: String,
    /// Pattern of comments that close a suppressed region.
    pub on: String,
    /// Pattern of check names a tag applies to.
    pub checks: String,
    /// Pattern of messages a tag applies to.
    pub message: Option<String>,
    /// Module id a tag applies to.
    pub id: Option<String>,
}

impl Default for CommentSpec {
    fn default() -> Self {
        Self {
            off: "LINT:OFF".to_string(),
            on: "LINT:ON".to_string(),
            checks: ".*".to_string(),
            message: None,
            id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagState {
    Off,
    On,
}

/// A recognised *off* or *on* comment.
#[derive(Debug, Clone, Copy)]
pub(super) struct Tag {
    line: usize,
    column: usize,
    state: TagState,
}

/// Suppresses violations that follow an *off* comment until the next *on*
/// comment.
#[derive(Debug, Clone)]
pub struct CommentElement {
    off: Regex,
    on: Regex,
    checks: Regex,
    message: Option<Regex>,
    id: Option<String>,
}

impl CommentElement {
    /// Builds the element, compiling its patterns.
    ///
    /// # Errors
    ///
    /// Returns an error naming the pattern if one does not compile.
    pub fn new(spec: &CommentSpec) -> Result<Self, FilterError> {
        Ok(Self {
            off: required_pattern("off", &spec.off)?,
            on: required_pattern("on", &spec.on)?,
            checks: required_pattern("checks", &spec.checks)?,
            message: compile_pattern("message", spec.message.as_deref())?,
            id: spec.id.clone(),
        })
    }

    /// Whether the violation should be kept.
    ///
    /// Scans the tree for tags on every call; [`super::FilterSet::bind`]
    /// scans once per file.
    #[must_use]
    pub fn accept(&self, event: &AuditEvent<'_>) -> bool {
        match event.tree {
            Some(tree) => self.accept_tagged(event.violation, &self.tags(tree)),
            None => true,
        }
    }

    /// Whether the violation should be kept, given the file's `tags`.
    pub(super) fn accept_tagged(&self, violation: &Violation, tags: &[Tag]) -> bool {
        if !self.applies_to(violation) {
            return true;
        }
        let position = (violation.line(), violation.column());
        let preceding = tags.partition_point(|tag| (tag.line, tag.column) <= position);
        preceding == 0 || tags[preceding - 1].state != TagState::Off
    }

    fn applies_to(&self, violation: &Violation) -> bool {
        self.checks.is_match(violation.check())
            && self
                .message
                .as_ref()
                .map_or(true, |m| m.is_match(violation.message()))
            && self
                .id
                .as_deref()
                .map_or(true, |id| violation.module_id() == Some(id))
    }

    /// Tags in the tree, ordered by position.
    pub(super) fn tags(&self, tree: &SyntaxTree) -> Vec<Tag> {
        let mut tags: Vec<Tag> = tree
            .nodes()
            .filter(|n| n.kind() == SyntaxKind::CommentContent)
            .filter_map(|n| {
                let state = if self.on.is_match(n.text()) {
                    TagState::On
                } else if self.off.is_match(n.text()) {
                    TagState::Off
                } else {
                    return None;
                };
                Some(Tag {
                    line: n.line(),
                    column: n.column(),
                    state,
                })
            })
            .collect();
        tags.sort_by_key(|t| (t.line, t.column));
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeBuilder;
    use crate::types::{Location, Severity};
    use SyntaxKind::*;

    fn comment(b: &mut TreeBuilder, text: &str, line: usize) {
        b.start(SingleLineComment, "//", line, 0);
        b.leaf(CommentContent, text, line, 2);
        b.finish();
    }

    /// `LINT:OFF` on line 2, `LINT:ON` on line 6.
    fn sample() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "", 1, 0);
        b.leaf(Semi, ";", 1, 0);
        comment(&mut b, " LINT:OFF\n", 2);
        b.leaf(Semi, ";", 4, 0);
        comment(&mut b, " LINT:ON\n", 6);
        b.leaf(Semi, ";", 7, 0);
        b.finish();
        b.build().unwrap()
    }

    fn at(check: &str, line: usize) -> Violation {
        Violation::new(check, Severity::Warning, Location::new("A.java", line, 4), "msg")
    }

    fn kept_lines(element: &CommentElement, tree: &SyntaxTree, check: &str) -> Vec<usize> {
        (1..=8)
            .filter(|&line| {
                let v = at(check, line);
                element.accept(&AuditEvent::new(&v, Some(tree)))
            })
            .collect()
    }

    #[test]
    fn off_region_is_suppressed() {
        let tree = sample();
        let element = CommentElement::new(&CommentSpec::default()).unwrap();
        assert_eq!(kept_lines(&element, &tree, "return-count"), vec![1, 6, 7, 8]);
    }

    #[test]
    fn check_pattern_limits_scope() {
        let tree = sample();
        let element = CommentElement::new(&CommentSpec {
            checks: "^nested-".into(),
            ..CommentSpec::default()
        })
        .unwrap();
        assert_eq!(kept_lines(&element, &tree, "return-count"), (1..=8).collect::<Vec<_>>());
        assert_eq!(kept_lines(&element, &tree, "nested-if-depth"), vec![1, 6, 7, 8]);
    }

    #[test]
    fn unclosed_region_runs_to_end_of_file() {
        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "", 1, 0);
        comment(&mut b, " LINT:OFF", 3);
        b.finish();
        let tree = b.build().unwrap();

        let element = CommentElement::new(&CommentSpec::default()).unwrap();
        assert_eq!(kept_lines(&element, &tree, "any"), vec![1, 2]);
    }

    #[test]
    fn message_and_id_limit_scope() {
        let tree = sample();
        let element = CommentElement::new(&CommentSpec {
            message: Some("^Return count".into()),
            id: Some("tooManyReturns".into()),
            ..CommentSpec::default()
        })
        .unwrap();

        let tagged = |message: &str, id: Option<&str>| {
            Violation::new("return-count", Severity::Warning, Location::new("A.java", 4, 4), message)
                .with_module_id(id.map(str::to_string))
        };
        let accept = |v: &Violation| element.accept(&AuditEvent::new(v, Some(&tree)));

        assert!(!accept(&tagged("Return count is 3", Some("tooManyReturns"))));
        assert!(accept(&tagged("Return count is 3", Some("other"))));
        assert!(accept(&tagged("Return count is 3", None)));
        assert!(accept(&tagged("Nested if-else depth is 2", Some("tooManyReturns"))));
    }

    #[test]
    fn tags_on_one_line_are_ordered_by_column() {
        // `; /* LINT:OFF */ x; /* LINT:ON */ y;` on line 3.
        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "", 1, 0);
        b.start(BlockCommentBegin, "/*", 3, 2);
        b.leaf(CommentContent, " LINT:OFF ", 3, 4);
        b.finish();
        b.start(BlockCommentBegin, "/*", 3, 20);
        b.leaf(CommentContent, " LINT:ON ", 3, 22);
        b.finish();
        b.finish();
        let tree = b.build().unwrap();
        let element = CommentElement::new(&CommentSpec::default()).unwrap();

        let kept = |column: usize| {
            let v = Violation::new("any", Severity::Info, Location::new("A.java", 3, column), "m");
            element.accept(&AuditEvent::new(&v, Some(&tree)))
        };
        assert!(kept(0));
        assert!(!kept(10));
        assert!(kept(22));
        assert!(kept(30));
    }

    #[test]
    fn on_without_off_suppresses_nothing() {
        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "", 1, 0);
        comment(&mut b, " LINT:ON", 2);
        b.finish();
        let tree = b.build().unwrap();

        let element = CommentElement::new(&CommentSpec::default()).unwrap();
        assert_eq!(kept_lines(&element, &tree, "any"), (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn no_tree_keeps_everything() {
        let element = CommentElement::new(&CommentSpec::default()).unwrap();
        let v = at("any", 4);
        assert!(element.accept(&AuditEvent::new(&v, None)));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = CommentElement::new(&CommentSpec {
            off: "LINT:OFF(".into(),
            ..CommentSpec::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("`off`"));
    }
}
