//! Generates queries that select the node at a given position.
//!
//! Used to help users write structural suppressions: given where a
//! violation was reported, produce absolute paths that select exactly that
//! node.

use super::tree::{QueryNode, QueryTree};
use crate::ast::SyntaxNode;
use crate::kind::SyntaxKind;

/// Returns one query per node at `line`/`column` (0-based), optionally
/// restricted to `kind`, in document order.
#[must_use]
pub fn generate_queries(
    tree: QueryTree<'_>,
    line: usize,
    column: usize,
    kind: Option<SyntaxKind>,
) -> Vec<String> {
    let Some(syntax) = tree.syntax_tree() else {
        return Vec::new();
    };
    let generator = Generator { tree };
    syntax
        .nodes()
        .filter(|n| n.line() == line && n.column() == column)
        .filter(|n| kind.map_or(true, |k| n.kind() == k))
        .map(|n| generator.query_for(n))
        .collect()
}

struct Generator<'a> {
    tree: QueryTree<'a>,
}

/// What tells a step's node apart from its same-kind siblings.
#[derive(Clone, Copy)]
enum Anchor<'a> {
    /// The node's own text.
    Text(&'a str),
    /// The text of a child of the given kind.
    Child(SyntaxKind, &'a str),
}

impl<'a> Generator<'a> {
    /// Absolute path to `node`, one step per ancestor.
    fn query_for(&self, node: SyntaxNode<'a>) -> String {
        let mut steps: Vec<String> = std::iter::successors(Some(node), |n| n.parent())
            .map(|step| self.step(step, node))
            .collect();
        steps.reverse();
        steps.concat()
    }

    /// A step selecting `node` and none of its siblings. Falls back to the
    /// position among same-kind siblings when no text anchor is unique.
    fn step(&self, node: SyntaxNode<'a>, target: SyntaxNode<'a>) -> String {
        let kind = node.kind();
        let anchor = self.anchor(node, target);
        let mut rivals = same_kind_siblings(node);
        let unique = match anchor {
            Some(anchor) => !rivals.any(|s| self.is_anchored(s, anchor)),
            None => rivals.next().is_none(),
        };
        match anchor {
            _ if !unique => format!("/{kind}[{}]", position_among_siblings(node)),
            Some(Anchor::Text(text)) => format!("/{kind}[@text={}]", quote(text)),
            Some(Anchor::Child(child, text)) => format!("/{kind}[./{child}[@text={}]]", quote(text)),
            None => format!("/{kind}"),
        }
    }

    /// The node's text, else its first text child unless that child is the
    /// target itself.
    fn anchor(&self, node: SyntaxNode<'a>, target: SyntaxNode<'a>) -> Option<Anchor<'a>> {
        if let Some(text) = self.text(node) {
            return Some(Anchor::Text(text));
        }
        node.children()
            .filter(|c| *c != target)
            .find_map(|c| self.text(c).map(|text| Anchor::Child(c.kind(), text)))
    }

    fn is_anchored(&self, node: SyntaxNode<'a>, anchor: Anchor<'_>) -> bool {
        match anchor {
            Anchor::Text(text) => self.text(node) == Some(text),
            Anchor::Child(kind, text) => node
                .children()
                .any(|c| c.kind() == kind && self.text(c) == Some(text)),
        }
    }

    fn text(&self, node: SyntaxNode<'a>) -> Option<&'a str> {
        self.tree.text(QueryNode::Element(node.id()))
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn same_kind_siblings<'a>(node: SyntaxNode<'a>) -> impl Iterator<Item = SyntaxNode<'a>> {
    node.parent()
        .into_iter()
        .flat_map(SyntaxNode::children)
        .filter(move |sibling| *sibling != node && sibling.kind() == node.kind())
}

/// 1-based position among preceding siblings of the same kind.
fn position_among_siblings(node: SyntaxNode<'_>) -> usize {
    let preceding = std::iter::successors(node.prev_sibling(), |n| n.prev_sibling())
        .filter(|n| n.kind() == node.kind())
        .count();
    preceding + 1
}
