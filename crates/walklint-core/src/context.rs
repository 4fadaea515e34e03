//! Context handed to check callbacks.

use crate::ast::{SyntaxNode, SyntaxTree};
use crate::check::CheckDescriptor;
use crate::types::{Location, Severity, Violation};

/// Per-callback view of the file being walked.
///
/// Carries the file name, the tree and the identity of the running check,
/// and is the only way a check can report violations.
#[derive(Debug)]
pub struct CheckContext<'a> {
    file: &'a str,
    tree: &'a SyntaxTree,
    descriptor: &'a CheckDescriptor,
    sink: &'a mut Vec<Violation>,
}

impl<'a> CheckContext<'a> {
    /// Creates a context that appends to `sink`.
    pub(crate) fn new(
        file: &'a str,
        tree: &'a SyntaxTree,
        descriptor: &'a CheckDescriptor,
        sink: &'a mut Vec<Violation>,
    ) -> Self {
        Self {
            file,
            tree,
            descriptor,
            sink,
        }
    }

    /// File name.
    #[must_use]
    pub fn file(&self) -> &'a str {
        self.file
    }

    /// The whole tree of the file.
    #[must_use]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    /// Root node of the file.
    #[must_use]
    pub fn root(&self) -> SyntaxNode<'a> {
        self.tree.root()
    }

    /// Severity of the running check.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.descriptor.severity()
    }

    /// Module id of the running check.
    #[must_use]
    pub fn module_id(&self) -> Option<&'a str> {
        self.descriptor.module_id()
    }

    /// Reports a violation at `node`.
    pub fn log(&mut self, node: SyntaxNode<'_>, message: impl Into<String>) {
        let violation = self
            .violation(node.line(), node.column(), message)
            .with_node(node.id(), node.kind());
        self.sink.push(violation);
    }

    /// Reports a violation at a position that has no node of its own.
    pub fn log_at(&mut self, line: usize, column: usize, message: impl Into<String>) {
        let violation = self.violation(line, column, message);
        self.sink.push(violation);
    }

    fn violation(&self, line: usize, column: usize, message: impl Into<String>) -> Violation {
        Violation::new(
            self.descriptor.name(),
            self.descriptor.severity(),
            Location::new(self.file, line, column),
            message,
        )
        .with_module_id(self.descriptor.module_id().map(String::from))
    }
}
