//! Structural-query suppression element.

use super::criteria::{CriteriaSpec, SuppressCriteria};
use super::{AuditEvent, FilterError};
use crate::ast::SyntaxTree;
use crate::kind::SyntaxKind;
use crate::query::{CompiledQuery, QueryEngine};
use crate::types::Violation;
use std::collections::HashSet;

/// Kind, line and column of the nodes a query selected in one file.
pub(super) type Selection = HashSet<(SyntaxKind, usize, usize)>;

/// Suppresses violations matching the configured criteria and reported at a
/// node selected by the configured query.
///
/// A violation is at a selected node when some selected node has the same
/// kind, line and column as the violation. Violations without a node kind,
/// or from files without a tree, never match a query.
#[derive(Debug, Clone)]
pub struct StructuralElement {
    criteria: SuppressCriteria,
    query: Option<CompiledQuery>,
    engine: QueryEngine,
}

impl StructuralElement {
    /// Builds the element, compiling its patterns and query with `engine`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern, number list or the query is invalid.
    pub fn new(
        spec: &CriteriaSpec,
        query: Option<&str>,
        engine: QueryEngine,
    ) -> Result<Self, FilterError> {
        let criteria = SuppressCriteria::compile(spec)?;
        let query = query.map(|text| engine.compile(text)).transpose()?;
        Ok(Self {
            criteria,
            query,
            engine,
        })
    }

    /// The compiled query, if one is configured.
    #[must_use]
    pub fn query(&self) -> Option<&CompiledQuery> {
        self.query.as_ref()
    }

    /// Whether the violation should be kept.
    ///
    /// Evaluates the query on every call; [`super::FilterSet::bind`]
    /// evaluates it once per file.
    #[must_use]
    pub fn accept(&self, event: &AuditEvent<'_>) -> bool {
        self.accept_selected(event.violation, self.select(event.tree).as_ref())
    }

    /// Positions the query selects in `tree`, or `None` without a query.
    pub(super) fn select(&self, tree: Option<&SyntaxTree>) -> Option<Selection> {
        let query = self.query.as_ref()?;
        let tree = self.engine.adapt(tree);
        Some(
            self.engine
                .evaluate(query, &tree)
                .into_iter()
                .filter_map(|node| tree.syntax_node(node))
                .map(|node| (node.kind(), node.line(), node.column()))
                .collect(),
        )
    }

    /// Whether the violation should be kept, given the file's `selection`.
    pub(super) fn accept_selected(&self, violation: &Violation, selection: Option<&Selection>) -> bool {
        if self.criteria.is_empty() && self.query.is_none() {
            return true;
        }
        let at_selected = match selection {
            None => true,
            Some(selected) => violation
                .kind()
                .is_some_and(|kind| selected.contains(&(kind, violation.line(), violation.column()))),
        };
        !(self.criteria.matches(violation) && at_selected)
    }
}
