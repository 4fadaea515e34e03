//! Arena-backed syntax tree.
//!
//! A [`SyntaxTree`] owns every node of one file in a flat arena. Nodes are
//! addressed by [`NodeId`]; each node stores its parent id and its ordered
//! child ids, so navigation in every direction is O(1) and no reference
//! cycles exist. [`SyntaxNode`] is a cheap `Copy` handle pairing a tree with
//! an id.
//!
//! Node ids are assigned in pre-order, so comparing two ids of the same tree
//! compares their document order.
//!
//! Trees are produced by an external parser, either in-process through
//! [`TreeBuilder`] or as a JSON interchange file (see [`NodeDto`]).

use crate::kind::SyntaxKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: Self = Self(0);

    /// Returns the arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    text: String,
    line: usize,
    column: usize,
    parent: Option<NodeId>,
    index_in_parent: usize,
    children: Vec<NodeId>,
}

/// A whole-file syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// Returns the node with the given id, if it belongs to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (id.index() < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates every node in document (pre-) order.
    pub fn nodes(&self) -> impl Iterator<Item = SyntaxNode<'_>> {
        (0..self.nodes.len()).map(move |i| SyntaxNode {
            tree: self,
            id: NodeId(i as u32),
        })
    }

    /// Builds a tree from its interchange representation.
    ///
    /// # Errors
    ///
    /// Returns an error if a node has an invalid position.
    pub fn from_dto(dto: &NodeDto) -> Result<Self, TreeError> {
        let mut builder = TreeBuilder::new();
        push_dto(&mut builder, dto);
        builder.build()
    }

    /// Converts the tree back into its interchange representation.
    #[must_use]
    pub fn to_dto(&self) -> NodeDto {
        to_dto(self.root())
    }

    /// Reads a JSON interchange document.
    ///
    /// The document is either `{"tree": <node>}` or
    /// `{"parse-error": {"message": ..., "line": .., "column": ..}}`.
    /// Malformed JSON and malformed trees are reported the same way as an
    /// explicit parse error, so a bad input file never aborts a run.
    ///
    /// # Errors
    ///
    /// Returns the parse failure for this file.
    pub fn from_interchange(json: &str) -> Result<Self, ParseFailure> {
        let document: InterchangeDto =
            serde_json::from_str(json).map_err(|e| ParseFailure {
                message: format!("invalid tree document: {e}"),
                line: Some(e.line()),
                column: Some(e.column()),
            })?;
        match document {
            InterchangeDto::Tree(dto) => Self::from_dto(&dto).map_err(|e| ParseFailure {
                message: e.to_string(),
                line: None,
                column: None,
            }),
            InterchangeDto::ParseError(failure) => Err(failure),
        }
    }

    /// Writes this tree as a JSON interchange document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_interchange(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&InterchangeDto::Tree(self.to_dto()))
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

fn push_dto(builder: &mut TreeBuilder, dto: &NodeDto) {
    builder.start(dto.kind, &dto.text, dto.line, dto.column);
    for child in &dto.children {
        push_dto(builder, child);
    }
    builder.finish();
}

/// Builds the DTO with an explicit stack of unfinished parents.
fn to_dto(root: SyntaxNode<'_>) -> NodeDto {
    let shell = |node: SyntaxNode<'_>| NodeDto {
        kind: node.kind(),
        text: node.text().to_string(),
        line: node.line(),
        column: node.column(),
        children: Vec::with_capacity(node.child_count()),
    };
    let mut current = (shell(root), root.children());
    let mut parents = Vec::new();
    loop {
        if let Some(child) = current.1.next() {
            parents.push(std::mem::replace(&mut current, (shell(child), child.children())));
            continue;
        }
        match parents.pop() {
            Some(parent) => {
                let (done, _) = std::mem::replace(&mut current, parent);
                current.0.children.push(done);
            }
            None => return current.0,
        }
    }
}

/// A read-only handle to one node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

impl<'a> SyntaxNode<'a> {
    /// The node's id within its tree.
    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    #[must_use]
    pub fn tree(self) -> &'a SyntaxTree {
        self.tree
    }

    /// Syntax category.
    #[must_use]
    pub fn kind(self) -> SyntaxKind {
        self.tree.data(self.id).kind
    }

    /// Raw source text of the node.
    #[must_use]
    pub fn text(self) -> &'a str {
        &self.tree.data(self.id).text
    }

    /// Line number (1-based).
    #[must_use]
    pub fn line(self) -> usize {
        self.tree.data(self.id).line
    }

    /// Column number (0-based).
    #[must_use]
    pub fn column(self) -> usize {
        self.tree.data(self.id).column
    }

    /// Parent node, `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        self.tree.data(self.id).parent.map(|id| self.with_id(id))
    }

    /// Ordered children.
    pub fn children(self) -> impl DoubleEndedIterator<Item = SyntaxNode<'a>> + ExactSizeIterator {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(self) -> usize {
        self.tree.data(self.id).children.len()
    }

    /// Child at `index`.
    #[must_use]
    pub fn child(self, index: usize) -> Option<Self> {
        self.tree
            .data(self.id)
            .children
            .get(index)
            .map(|&id| self.with_id(id))
    }

    /// First child.
    #[must_use]
    pub fn first_child(self) -> Option<Self> {
        self.child(0)
    }

    /// Last child.
    #[must_use]
    pub fn last_child(self) -> Option<Self> {
        self.tree
            .data(self.id)
            .children
            .last()
            .map(|&id| self.with_id(id))
    }

    /// First child of the given kind.
    #[must_use]
    pub fn first_child_of_kind(self, kind: SyntaxKind) -> Option<Self> {
        self.children().find(|child| child.kind() == kind)
    }

    /// Position of this node among its parent's children (0 for the root).
    #[must_use]
    pub fn index_in_parent(self) -> usize {
        self.tree.data(self.id).index_in_parent
    }

    /// Next sibling in source order.
    #[must_use]
    pub fn next_sibling(self) -> Option<Self> {
        self.parent()?.child(self.index_in_parent() + 1)
    }

    /// Previous sibling in source order.
    #[must_use]
    pub fn prev_sibling(self) -> Option<Self> {
        let index = self.index_in_parent().checked_sub(1)?;
        self.parent()?.child(index)
    }

    /// Ancestors, nearest first, excluding this node.
    pub fn ancestors(self) -> impl Iterator<Item = SyntaxNode<'a>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// This node and all its descendants in document order.
    pub fn descendants(self) -> impl Iterator<Item = SyntaxNode<'a>> {
        // Pre-order ids are contiguous: a subtree spans [id, next id outside it).
        let end = self.subtree_end();
        let tree = self.tree;
        (self.id.0..end).map(move |i| SyntaxNode { tree, id: NodeId(i) })
    }

    /// Whether `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(self, other: Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id < other.id && other.id.0 < self.subtree_end()
    }

    fn subtree_end(self) -> u32 {
        let mut node = self;
        loop {
            if let Some(next) = node.next_sibling() {
                return next.id.0;
            }
            match node.parent() {
                Some(parent) => node = parent,
                None => return self.tree.nodes.len() as u32,
            }
        }
    }

    fn with_id(self, id: NodeId) -> Self {
        Self {
            tree: self.tree,
            id,
        }
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{} {:?}",
            self.kind(),
            self.line(),
            self.column(),
            self.text()
        )
    }
}

/// Errors from building a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// No node was started.
    #[error("tree has no root node")]
    Empty,

    /// A second top-level node was started after the root was finished.
    #[error("tree has more than one root ({kind} at {line}:{column})")]
    MultipleRoots {
        /// Kind of the extra root.
        kind: SyntaxKind,
        /// Its line.
        line: usize,
        /// Its column.
        column: usize,
    },

    /// `finish` was called with no open node.
    #[error("finish() called without a matching start()")]
    Unbalanced,

    /// Nodes were left open when building.
    #[error("{0} node(s) left unfinished")]
    Unfinished(usize),

    /// A node was given line 0.
    #[error("{kind} has line 0; lines are 1-based")]
    InvalidLine {
        /// Kind of the offending node.
        kind: SyntaxKind,
    },
}

/// Incremental, in-order tree construction.
///
/// ```
/// use walklint_core::{SyntaxKind, TreeBuilder};
///
/// let mut b = TreeBuilder::new();
/// b.start(SyntaxKind::CompilationUnit, "", 1, 0);
/// b.start(SyntaxKind::ClassDef, "class", 1, 0);
/// b.leaf(SyntaxKind::Ident, "Foo", 1, 6);
/// b.finish();
/// b.finish();
/// let tree = b.build().unwrap();
/// assert_eq!(tree.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
    error: Option<TreeError>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a node; subsequent nodes become its children until [`finish`](Self::finish).
    pub fn start(&mut self, kind: SyntaxKind, text: &str, line: usize, column: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.open.last().copied();

        if line == 0 {
            self.fail(TreeError::InvalidLine { kind });
        }
        if parent.is_none() && !self.nodes.is_empty() {
            self.fail(TreeError::MultipleRoots { kind, line, column });
        }

        let index_in_parent = match parent {
            Some(p) => {
                let siblings = &mut self.nodes[p.index()].children;
                siblings.push(id);
                siblings.len() - 1
            }
            None => 0,
        };

        self.nodes.push(NodeData {
            kind,
            text: text.to_string(),
            line,
            column,
            parent,
            index_in_parent,
            children: Vec::new(),
        });
        self.open.push(id);
        id
    }

    /// Closes the most recently opened node.
    pub fn finish(&mut self) {
        if self.open.pop().is_none() {
            self.fail(TreeError::Unbalanced);
        }
    }

    /// Adds a childless node.
    pub fn leaf(&mut self, kind: SyntaxKind, text: &str, line: usize, column: usize) -> NodeId {
        let id = self.start(kind, text, line, column);
        self.finish();
        id
    }

    /// Finishes construction.
    ///
    /// # Errors
    ///
    /// Returns the first structural error encountered while building.
    pub fn build(self) -> Result<SyntaxTree, TreeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.nodes.is_empty() {
            return Err(TreeError::Empty);
        }
        if !self.open.is_empty() {
            return Err(TreeError::Unfinished(self.open.len()));
        }
        Ok(SyntaxTree { nodes: self.nodes })
    }

    fn fail(&mut self, error: TreeError) {
        self.error.get_or_insert(error);
    }
}

/// Serialized form of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDto {
    /// Syntax category.
    pub kind: SyntaxKind,
    /// Raw text.
    #[serde(default)]
    pub text: String,
    /// Line (1-based).
    pub line: usize,
    /// Column (0-based).
    pub column: usize,
    /// Ordered children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDto>,
}

/// A parser's explicit failure signal for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ParseFailure {
    /// Parser message.
    pub message: String,
    /// Line of the failure, if known.
    #[serde(default)]
    pub line: Option<usize>,
    /// Column of the failure, if known.
    #[serde(default)]
    pub column: Option<usize>,
}

impl ParseFailure {
    /// Creates a failure without a position.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum InterchangeDto {
    Tree(NodeDto),
    ParseError(ParseFailure),
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxKind::*;

    /// ```text
    /// COMPILATION_UNIT
    ///   CLASS_DEF
    ///     IDENT Foo
    ///     OBJBLOCK
    ///       METHOD_DEF
    ///         IDENT bar
    ///       METHOD_DEF
    ///         IDENT baz
    /// ```
    fn sample() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "", 1, 0);
        b.start(ClassDef, "class", 1, 0);
        b.leaf(Ident, "Foo", 1, 6);
        b.start(ObjBlock, "{", 1, 10);
        b.start(MethodDef, "void", 2, 4);
        b.leaf(Ident, "bar", 2, 9);
        b.finish();
        b.start(MethodDef, "void", 3, 4);
        b.leaf(Ident, "baz", 3, 9);
        b.finish();
        b.finish();
        b.finish();
        b.finish();
        b.build().unwrap()
    }

    #[test]
    fn parent_children_contains_self_exactly_once() {
        let tree = sample();
        for node in tree.nodes().skip(1) {
            let parent = node.parent().unwrap();
            let hits = parent.children().filter(|c| *c == node).count();
            assert_eq!(hits, 1, "{node:?}");
            assert_eq!(parent.child(node.index_in_parent()), Some(node));
        }
        assert!(tree.root().parent().is_none());
    }

    #[test]
    fn sibling_navigation() {
        let tree = sample();
        let obj = tree.root().child(0).unwrap().child(1).unwrap();
        let first = obj.first_child().unwrap();
        let second = obj.last_child().unwrap();

        assert_eq!(first.next_sibling(), Some(second));
        assert_eq!(second.prev_sibling(), Some(first));
        assert_eq!(first.prev_sibling(), None);
        assert_eq!(second.next_sibling(), None);
        assert_eq!(tree.root().next_sibling(), None);
    }

    #[test]
    fn descendants_are_contiguous_preorder() {
        let tree = sample();
        let obj = tree.root().child(0).unwrap().child(1).unwrap();
        let kinds: Vec<SyntaxKind> = obj.descendants().map(SyntaxNode::kind).collect();
        assert_eq!(kinds, vec![ObjBlock, MethodDef, Ident, MethodDef, Ident]);

        let ident = tree.root().child(0).unwrap().child(0).unwrap();
        assert_eq!(ident.descendants().count(), 1);
        assert_eq!(tree.root().descendants().count(), tree.len());
    }

    #[test]
    fn ancestry() {
        let tree = sample();
        let baz = tree.nodes().find(|n| n.text() == "baz").unwrap();
        let kinds: Vec<SyntaxKind> = baz.ancestors().map(SyntaxNode::kind).collect();
        assert_eq!(kinds, vec![MethodDef, ObjBlock, ClassDef, CompilationUnit]);
        assert!(tree.root().is_ancestor_of(baz));
        assert!(!baz.is_ancestor_of(tree.root()));
        let bar = tree.nodes().find(|n| n.text() == "bar").unwrap();
        assert!(!bar.parent().unwrap().is_ancestor_of(baz));
    }

    #[test]
    fn builder_rejects_malformed_input() {
        let mut b = TreeBuilder::new();
        b.leaf(CompilationUnit, "", 1, 0);
        b.leaf(ClassDef, "", 2, 0);
        assert!(matches!(b.build(), Err(TreeError::MultipleRoots { .. })));

        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "", 1, 0);
        assert_eq!(b.build().unwrap_err(), TreeError::Unfinished(1));

        let mut b = TreeBuilder::new();
        b.leaf(CompilationUnit, "", 0, 0);
        assert!(matches!(b.build(), Err(TreeError::InvalidLine { .. })));

        let mut b = TreeBuilder::new();
        b.finish();
        assert_eq!(b.build().unwrap_err(), TreeError::Unbalanced);

        assert_eq!(TreeBuilder::new().build().unwrap_err(), TreeError::Empty);
    }

    #[test]
    fn interchange_round_trip_preserves_structure() {
        let tree = sample();
        let json = tree.to_interchange().unwrap();
        let back = SyntaxTree::from_interchange(&json).unwrap();
        assert_eq!(back.to_dto(), tree.to_dto());
    }

    #[test]
    fn deep_tree_converts_to_dto() {
        const DEPTH: usize = 100_000;
        let mut b = TreeBuilder::new();
        for line in 1..=DEPTH {
            b.start(Slist, "{", line, 0);
        }
        b.leaf(Semi, ";", DEPTH, 1);
        for _ in 0..DEPTH {
            b.finish();
        }
        let tree = b.build().unwrap();

        // Unwound by hand: dropping the nested DTO would recurse.
        let mut node = tree.to_dto();
        let mut depth = 1;
        while let Some(child) = node.children.pop() {
            assert!(node.children.is_empty());
            assert_eq!(node.line, depth);
            node = child;
            depth += 1;
        }
        assert_eq!(depth, DEPTH + 1);
        assert_eq!(node.kind, Semi);
    }

    #[test]
    fn interchange_parse_error_is_surfaced() {
        let json = r#"{"parse-error": {"message": "unexpected token", "line": 4, "column": 2}}"#;
        let failure = SyntaxTree::from_interchange(json).unwrap_err();
        assert_eq!(failure.message, "unexpected token");
        assert_eq!(failure.line, Some(4));
    }

    #[test]
    fn malformed_json_becomes_parse_failure() {
        let failure = SyntaxTree::from_interchange("{\"tree\": ").unwrap_err();
        assert!(failure.message.starts_with("invalid tree document"));

        let failure =
            SyntaxTree::from_interchange(r#"{"tree": {"kind": "NOPE", "line": 1, "column": 0}}"#)
                .unwrap_err();
        assert!(failure.message.contains("NOPE"));
    }
}
