//! Structural queries over syntax trees.
//!
//! Queries use an XPath-like syntax where element names are syntax kind
//! names and `@text`, `@line` and `@column` are attributes:
//!
//! ```
//! use walklint_core::{QueryEngine, SyntaxKind, TreeBuilder};
//!
//! let mut b = TreeBuilder::new();
//! b.start(SyntaxKind::CompilationUnit, "", 1, 0);
//! b.start(SyntaxKind::ClassDef, "", 1, 0);
//! b.leaf(SyntaxKind::Ident, "Foo", 1, 6);
//! b.finish();
//! b.finish();
//! let tree = b.build().unwrap();
//!
//! let engine = QueryEngine::default();
//! let query = engine.compile("//CLASS_DEF/IDENT[@text='Foo']").unwrap();
//! let found = engine.evaluate(&query, &engine.adapt(Some(&tree)));
//! assert_eq!(found.len(), 1);
//! ```
//!
//! A [`QueryEngine`] is an explicit value: its options apply to every query
//! it compiles and every tree it adapts.

mod error;
mod eval;
mod generate;
mod lexer;
mod parser;
mod tree;

pub use error::{QueryError, QueryErrorKind};
pub use generate::generate_queries;
pub use tree::{QueryNode, QueryTree};

use crate::ast::SyntaxTree;
use crate::kind::{KindSet, SyntaxKind};
use eval::Evaluator;
use parser::Expr;
use std::fmt;

/// Options shared by everything a [`QueryEngine`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Kinds whose text is exposed as `@text`.
    pub text_kinds: KindSet,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            text_kinds: SyntaxKind::ALL
                .iter()
                .copied()
                .filter(|k| k.has_text_attribute())
                .collect(),
        }
    }
}

/// A parsed, validated query.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    text: String,
    expr: Expr,
}

impl CompiledQuery {
    /// The query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compiles and evaluates structural queries.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    options: EngineOptions,
}

impl QueryEngine {
    /// Creates an engine with the given options.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// The engine's options.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parses and validates a query.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] carrying the query text if it is malformed,
    /// uses unknown kinds, attributes, axes or functions, or does not select
    /// nodes.
    pub fn compile(&self, text: &str) -> Result<CompiledQuery, QueryError> {
        let expr = parser::parse(text)?;
        if !expr.selects_nodes() {
            return Err(QueryError::new(text, None, QueryErrorKind::NotANodeQuery));
        }
        Ok(CompiledQuery {
            text: text.to_string(),
            expr,
        })
    }

    /// Wraps a tree for querying. `None` stands for a file that failed to
    /// parse.
    #[must_use]
    pub fn adapt<'a>(&'a self, tree: Option<&'a SyntaxTree>) -> QueryTree<'a> {
        QueryTree::new(tree, &self.options)
    }

    /// Evaluates a query, returning the selected nodes in document order.
    #[must_use]
    pub fn evaluate(&self, query: &CompiledQuery, tree: &QueryTree<'_>) -> Vec<QueryNode> {
        Evaluator::new(*tree).select(&query.expr)
    }

    /// Returns queries selecting each node at `line`/`column` (0-based).
    #[must_use]
    pub fn generate(
        &self,
        tree: &SyntaxTree,
        line: usize,
        column: usize,
        kind: Option<SyntaxKind>,
    ) -> Vec<String> {
        generate_queries(self.adapt(Some(tree)), line, column, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeBuilder;

    fn tree() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.start(SyntaxKind::CompilationUnit, "", 1, 0);
        b.leaf(SyntaxKind::Ident, "x", 1, 0);
        b.finish();
        b.build().unwrap()
    }

    #[test]
    fn compile_keeps_text() {
        let engine = QueryEngine::default();
        let query = engine.compile("//IDENT").unwrap();
        assert_eq!(query.as_str(), "//IDENT");
        assert_eq!(query.to_string(), "//IDENT");
    }

    #[test]
    fn invalid_queries_fail_at_compile_time() {
        let engine = QueryEngine::default();
        for text in ["//CLASS_DEF[", "//IDENT/@text", "count(//IDENT)", "", "//IDENT[@text='a'"] {
            let err = engine.compile(text).unwrap_err();
            assert_eq!(err.query(), text);
            assert!(err.to_string().contains(&format!("`{text}`")));
        }
    }

    #[test]
    fn missing_tree_selects_nothing() {
        let engine = QueryEngine::default();
        let query = engine.compile("/").unwrap();
        assert!(engine.evaluate(&query, &engine.adapt(None)).is_empty());
        assert_eq!(
            engine.evaluate(&query, &engine.adapt(Some(&tree()))),
            vec![QueryNode::Document]
        );
    }

    #[test]
    fn options_control_text_attribute() {
        let tree = tree();
        let engine = QueryEngine::new(EngineOptions {
            text_kinds: KindSet::EMPTY,
        });
        let query = engine.compile("//IDENT[@text='x']").unwrap();
        assert!(engine.evaluate(&query, &engine.adapt(Some(&tree))).is_empty());

        let engine = QueryEngine::default();
        assert_eq!(engine.evaluate(&query, &engine.adapt(Some(&tree))).len(), 1);
    }
}
