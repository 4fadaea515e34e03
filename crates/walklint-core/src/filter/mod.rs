//! Violation filters.
//!
//! A [`FilterSet`] is an ordered list of [`FilterElement`]s. A violation is
//! kept only if every element accepts it; an empty set keeps everything.
//! Elements compile their patterns and queries when they are built and are
//! immutable afterwards, so one set can be shared by any number of files
//! processed concurrently.
//!
//! Elements that read the file's tree (structural, comment and nearby
//! elements) scan it once per file through [`FilterSet::bind`].

mod comment;
mod criteria;
mod nearby;
mod range;
mod structural;
mod suppress;

pub use comment::{CommentElement, CommentSpec};
pub use criteria::{CriteriaSpec, IntSet, SuppressCriteria};
pub use nearby::{NearbyElement, NearbySpec};
pub use range::{RangeElement, RangeTarget};
pub use structural::StructuralElement;
pub use suppress::SuppressElement;

use comment::Tag;
use nearby::NearbyTag;
use structural::Selection;

use crate::ast::SyntaxTree;
use crate::query::QueryError;
use crate::types::Violation;

/// A violation together with the tree of the file it was reported in.
///
/// `tree` is `None` when the file has no tree; structural elements then
/// never match.
#[derive(Debug, Clone, Copy)]
pub struct AuditEvent<'a> {
    /// The violation under consideration.
    pub violation: &'a Violation,
    /// The file's tree.
    pub tree: Option<&'a SyntaxTree>,
}

impl<'a> AuditEvent<'a> {
    /// Creates an event.
    #[must_use]
    pub fn new(violation: &'a Violation, tree: Option<&'a SyntaxTree>) -> Self {
        Self { violation, tree }
    }
}

/// Errors detected while building a filter element.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum FilterError {
    /// A criterion's regular expression does not compile.
    #[error("invalid `{criterion}` pattern `{pattern}`: {source}")]
    #[diagnostic(code(walklint::filter::pattern))]
    InvalidPattern {
        /// Criterion name.
        criterion: &'static str,
        /// Pattern text.
        pattern: String,
        /// Regex compilation error.
        source: regex::Error,
    },

    /// The structural query does not compile.
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidQuery(#[from] QueryError),

    /// A line or column list is malformed.
    #[error("invalid `{criterion}` list `{text}`: {reason}")]
    #[diagnostic(
        code(walklint::filter::int_set),
        help("use comma-separated numbers and inclusive ranges, e.g. `1-10, 15`")
    )]
    InvalidIntSet {
        /// Criterion name.
        criterion: &'static str,
        /// List text.
        text: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A nearby-comment template that cannot be used.
    #[error("invalid `{setting}` template `{text}`: {reason}")]
    #[diagnostic(
        code(walklint::filter::template),
        help("`influence` must expand to a signed line offset such as `2` or `-1`")
    )]
    InvalidTemplate {
        /// Setting name.
        setting: &'static str,
        /// Template text.
        text: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A range element whose lower bound exceeds its upper bound.
    #[error("range lower bound {lower} exceeds upper bound {upper}")]
    #[diagnostic(code(walklint::filter::bounds))]
    InvalidBounds {
        /// Lower bound.
        lower: usize,
        /// Upper bound.
        upper: usize,
    },
}

/// One configured filter.
#[derive(Debug, Clone)]
pub enum FilterElement {
    /// Suppresses violations matching name, message, id and position
    /// criteria.
    Suppress(SuppressElement),
    /// Keeps only violations whose line or column lies in a range.
    Range(RangeElement),
    /// Suppresses violations matching criteria and a structural query.
    Structural(StructuralElement),
    /// Suppresses violations between off/on comment tags.
    Comment(CommentElement),
    /// Suppresses violations near a suppression comment.
    Nearby(NearbyElement),
}

impl FilterElement {
    /// Whether the violation should be kept.
    #[must_use]
    pub fn accept(&self, event: &AuditEvent<'_>) -> bool {
        match self {
            Self::Suppress(e) => e.accept(event.violation),
            Self::Range(e) => e.accept(event.violation),
            Self::Structural(e) => e.accept(event),
            Self::Comment(e) => e.accept(event),
            Self::Nearby(e) => e.accept(event),
        }
    }

    /// Short name of the element type, for logs.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Suppress(_) => "suppress",
            Self::Range(_) => "keep-range",
            Self::Structural(_) => "structural",
            Self::Comment(_) => "suppress-comments",
            Self::Nearby(_) => "suppress-nearby",
        }
    }
}

impl From<SuppressElement> for FilterElement {
    fn from(element: SuppressElement) -> Self {
        Self::Suppress(element)
    }
}

impl From<RangeElement> for FilterElement {
    fn from(element: RangeElement) -> Self {
        Self::Range(element)
    }
}

impl From<StructuralElement> for FilterElement {
    fn from(element: StructuralElement) -> Self {
        Self::Structural(element)
    }
}

impl From<CommentElement> for FilterElement {
    fn from(element: CommentElement) -> Self {
        Self::Comment(element)
    }
}

impl From<NearbyElement> for FilterElement {
    fn from(element: NearbyElement) -> Self {
        Self::Nearby(element)
    }
}

/// An ordered conjunction of filter elements.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    elements: Vec<FilterElement>,
}

impl FilterSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element.
    pub fn push(&mut self, element: impl Into<FilterElement>) {
        self.elements.push(element.into());
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the set has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The elements, in order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterElement> {
        self.elements.iter()
    }

    /// Whether every element accepts the violation.
    #[must_use]
    pub fn accept(&self, event: &AuditEvent<'_>) -> bool {
        self.elements.iter().all(|e| e.accept(event))
    }

    /// Binds the set to one file's tree, scanning the tree once for every
    /// element that reads it.
    #[must_use]
    pub fn bind<'a>(&'a self, tree: Option<&'a SyntaxTree>) -> FileFilters<'a> {
        let elements = self
            .elements
            .iter()
            .map(|element| match element {
                FilterElement::Structural(e) => Bound::Structural(e, e.select(tree)),
                FilterElement::Comment(e) => Bound::Comment(e, tree.map(|t| e.tags(t))),
                FilterElement::Nearby(e) => Bound::Nearby(e, tree.map(|t| e.tags(t))),
                other => Bound::Plain(other),
            })
            .collect();
        FileFilters { elements }
    }
}

/// A [`FilterSet`] bound to one file's tree.
#[derive(Debug)]
pub struct FileFilters<'a> {
    elements: Vec<Bound<'a>>,
}

#[derive(Debug)]
enum Bound<'a> {
    Plain(&'a FilterElement),
    Structural(&'a StructuralElement, Option<Selection>),
    Comment(&'a CommentElement, Option<Vec<Tag>>),
    Nearby(&'a NearbyElement, Option<Vec<NearbyTag>>),
}

impl FileFilters<'_> {
    /// Whether every element accepts a violation reported in this file.
    #[must_use]
    pub fn accept(&self, violation: &Violation) -> bool {
        self.elements.iter().all(|bound| match bound {
            Bound::Plain(e) => e.accept(&AuditEvent::new(violation, None)),
            Bound::Structural(e, selection) => e.accept_selected(violation, selection.as_ref()),
            Bound::Comment(e, tags) => tags.as_ref().map_or(true, |t| e.accept_tagged(violation, t)),
            Bound::Nearby(e, tags) => tags.as_ref().map_or(true, |t| e.accept_tagged(violation, t)),
        })
    }
}

impl FromIterator<FilterElement> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterElement>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}
