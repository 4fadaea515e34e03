//! Query compilation errors.

use miette::SourceSpan;

/// What went wrong while compiling a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryErrorKind {
    /// A character that starts no token.
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),

    /// A string literal without its closing quote.
    #[error("unterminated string literal")]
    UnterminatedLiteral,

    /// A token the grammar does not allow here.
    #[error("expected {expected}, found {found}")]
    Unexpected {
        /// What the parser was looking for.
        expected: String,
        /// What it found.
        found: String,
    },

    /// The query ended too early.
    #[error("expected {0}, found end of query")]
    UnexpectedEnd(String),

    /// An unsupported axis name.
    #[error("unknown axis `{0}`")]
    UnknownAxis(String),

    /// An unsupported function name.
    #[error("unknown function `{0}()`")]
    UnknownFunction(String),

    /// A function called with the wrong number of arguments.
    #[error("function `{name}()` takes {expected} argument(s), {found} given")]
    Arity {
        /// Function name.
        name: String,
        /// Accepted argument counts.
        expected: String,
        /// Number of arguments given.
        found: usize,
    },

    /// An element name that is not a syntax kind.
    #[error("unknown node kind `{0}`")]
    UnknownKind(String),

    /// An attribute other than `text`, `line` or `column`.
    #[error("unknown attribute `@{0}`")]
    UnknownAttribute(String),

    /// The query does not select syntax nodes.
    #[error("query must select nodes, not values or attributes")]
    NotANodeQuery,
}

/// A query that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("invalid query `{query}`: {kind}")]
#[diagnostic(code(walklint::query::invalid))]
pub struct QueryError {
    #[source_code]
    query: String,
    #[label("here")]
    span: Option<SourceSpan>,
    kind: QueryErrorKind,
}

impl QueryError {
    pub(crate) fn new(query: &str, position: Option<usize>, kind: QueryErrorKind) -> Self {
        Self {
            query: query.to_string(),
            span: position.map(|offset| SourceSpan::from((offset, 1))),
            kind,
        }
    }

    /// The offending query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Byte offset of the error, if it has one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.span.map(|span| span.offset())
    }

    /// The error category.
    #[must_use]
    pub fn kind(&self) -> &QueryErrorKind {
        &self.kind
    }
}
