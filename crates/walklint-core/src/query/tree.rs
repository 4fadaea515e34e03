//! Query-facing view of a syntax tree.

use super::EngineOptions;
use crate::ast::{NodeId, SyntaxNode, SyntaxTree};
use crate::kind::SyntaxKind;

/// A node as seen by the query engine.
///
/// The document node sits above the syntax root; its only child is the root.
/// Ordering is document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryNode {
    /// The document node.
    Document,
    /// A syntax node.
    Element(NodeId),
}

/// Adapter exposing one file's tree to the query engine.
///
/// A missing tree (the file failed to parse) is a document with no
/// children, so every query over it selects nothing.
#[derive(Debug, Clone, Copy)]
pub struct QueryTree<'a> {
    tree: Option<&'a SyntaxTree>,
    options: &'a EngineOptions,
}

impl<'a> QueryTree<'a> {
    pub(crate) fn new(tree: Option<&'a SyntaxTree>, options: &'a EngineOptions) -> Self {
        Self { tree, options }
    }

    /// The wrapped tree, if any.
    #[must_use]
    pub fn syntax_tree(&self) -> Option<&'a SyntaxTree> {
        self.tree
    }

    /// Whether there is no tree to query.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_none()
    }

    /// Resolves an element to its syntax node.
    #[must_use]
    pub fn syntax_node(&self, node: QueryNode) -> Option<SyntaxNode<'a>> {
        match node {
            QueryNode::Document => None,
            QueryNode::Element(id) => self.tree.and_then(|tree| tree.node(id)),
        }
    }

    /// Kind of an element.
    #[must_use]
    pub fn kind(&self, node: QueryNode) -> Option<SyntaxKind> {
        self.syntax_node(node).map(SyntaxNode::kind)
    }

    /// Name the query language matches element tests against.
    #[must_use]
    pub fn name(&self, node: QueryNode) -> &'static str {
        self.kind(node).map_or("", SyntaxKind::name)
    }

    /// The `@text` attribute: present only on configured text kinds. String
    /// literals are exposed without their quotes.
    #[must_use]
    pub fn text(&self, node: QueryNode) -> Option<&'a str> {
        let node = self.syntax_node(node)?;
        if !self.options.text_kinds.contains(node.kind()) {
            return None;
        }
        let text = node.text();
        if node.kind() == SyntaxKind::StringLiteral {
            Some(
                text.strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .unwrap_or(text),
            )
        } else {
            Some(text)
        }
    }

    /// The `@line` attribute (1-based).
    #[must_use]
    pub fn line(&self, node: QueryNode) -> Option<usize> {
        self.syntax_node(node).map(SyntaxNode::line)
    }

    /// The `@column` attribute (0-based).
    #[must_use]
    pub fn column(&self, node: QueryNode) -> Option<usize> {
        self.syntax_node(node).map(SyntaxNode::column)
    }

    /// Parent axis.
    #[must_use]
    pub fn parent(&self, node: QueryNode) -> Option<QueryNode> {
        match node {
            QueryNode::Document => None,
            QueryNode::Element(_) => Some(
                self.syntax_node(node)
                    .and_then(SyntaxNode::parent)
                    .map_or(QueryNode::Document, |p| QueryNode::Element(p.id())),
            ),
        }
    }

    /// Child axis, in order.
    #[must_use]
    pub fn children(&self, node: QueryNode) -> Vec<QueryNode> {
        match node {
            QueryNode::Document => self
                .tree
                .map(|_| QueryNode::Element(NodeId::ROOT))
                .into_iter()
                .collect(),
            QueryNode::Element(_) => self
                .syntax_node(node)
                .map(|n| n.children().map(element).collect())
                .unwrap_or_default(),
        }
    }

    /// Following siblings, nearest first.
    #[must_use]
    pub fn following_siblings(&self, node: QueryNode) -> Vec<QueryNode> {
        let mut siblings = Vec::new();
        let mut current = self.syntax_node(node).and_then(SyntaxNode::next_sibling);
        while let Some(sibling) = current {
            siblings.push(element(sibling));
            current = sibling.next_sibling();
        }
        siblings
    }

    /// Preceding siblings, nearest first.
    #[must_use]
    pub fn preceding_siblings(&self, node: QueryNode) -> Vec<QueryNode> {
        let mut siblings = Vec::new();
        let mut current = self.syntax_node(node).and_then(SyntaxNode::prev_sibling);
        while let Some(sibling) = current {
            siblings.push(element(sibling));
            current = sibling.prev_sibling();
        }
        siblings
    }

    /// Ancestors, nearest first, ending with the document.
    #[must_use]
    pub fn ancestors(&self, node: QueryNode) -> Vec<QueryNode> {
        std::iter::successors(self.parent(node), |n| self.parent(*n)).collect()
    }

    /// Descendants in document order.
    #[must_use]
    pub fn descendants(&self, node: QueryNode) -> Vec<QueryNode> {
        match (node, self.tree) {
            (_, None) => Vec::new(),
            (QueryNode::Document, Some(tree)) => tree.nodes().map(element).collect(),
            (QueryNode::Element(_), Some(_)) => self
                .syntax_node(node)
                .map(|n| n.descendants().map(element).collect())
                .unwrap_or_default(),
        }
    }

    /// Nodes after `node` in document order, excluding its descendants.
    #[must_use]
    pub fn following(&self, node: QueryNode) -> Vec<QueryNode> {
        let (Some(tree), Some(n)) = (self.tree, self.syntax_node(node)) else {
            return Vec::new();
        };
        let last = n.descendants().last().unwrap_or(n).id();
        tree.nodes()
            .skip(last.index() + 1)
            .map(element)
            .collect()
    }

    /// Nodes before `node` in document order, excluding its ancestors,
    /// nearest first.
    #[must_use]
    pub fn preceding(&self, node: QueryNode) -> Vec<QueryNode> {
        let (Some(tree), Some(n)) = (self.tree, self.syntax_node(node)) else {
            return Vec::new();
        };
        let mut preceding: Vec<QueryNode> = tree
            .nodes()
            .take(n.id().index())
            .filter(|p| !p.is_ancestor_of(n))
            .map(element)
            .collect();
        preceding.reverse();
        preceding
    }
}

fn element(node: SyntaxNode<'_>) -> QueryNode {
    QueryNode::Element(node.id())
}
