//! Query evaluation over a [`QueryTree`].

use super::parser::{Attr, Axis, BinOp, Expr, Function, NodeTest, Step};
use super::tree::{QueryNode, QueryTree};
use crate::ast::NodeId;

/// An item of a node-set: a node or one attribute of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Node(QueryNode),
    Attr(NodeId, Attr),
}

impl Item {
    /// Document-order key. Attributes sort after their element and before
    /// its children.
    fn order_key(self) -> (usize, usize) {
        match self {
            Self::Node(QueryNode::Document) => (0, 0),
            Self::Node(QueryNode::Element(id)) => (id.index() + 1, 0),
            Self::Attr(id, attr) => (id.index() + 1, 1 + attr as usize),
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    Items(Vec<Item>),
    Str(String),
    Num(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy)]
struct Focus {
    item: Item,
    position: usize,
    size: usize,
}

pub(crate) struct Evaluator<'t> {
    tree: QueryTree<'t>,
}

impl<'t> Evaluator<'t> {
    pub(crate) fn new(tree: QueryTree<'t>) -> Self {
        Self { tree }
    }

    /// Evaluates a node-selecting query from the document node.
    pub(crate) fn select(&self, expr: &Expr) -> Vec<QueryNode> {
        if self.tree.is_empty() {
            return Vec::new();
        }
        let focus = Focus {
            item: Item::Node(QueryNode::Document),
            position: 1,
            size: 1,
        };
        match self.eval(expr, focus) {
            Value::Items(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Item::Node(node) => Some(node),
                    Item::Attr(..) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn eval(&self, expr: &Expr, focus: Focus) -> Value {
        match expr {
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    Item::Node(QueryNode::Document)
                } else {
                    focus.item
                };
                Value::Items(self.apply_steps(vec![start], steps))
            }
            Expr::Filter {
                base,
                predicates,
                steps,
            } => match self.eval(base, focus) {
                Value::Items(items) => {
                    let items = self.apply_predicates(items, predicates);
                    Value::Items(self.apply_steps(items, steps))
                }
                _ => Value::Items(Vec::new()),
            },
            Expr::Union(lhs, rhs) => {
                let mut items = match self.eval(lhs, focus) {
                    Value::Items(items) => items,
                    _ => Vec::new(),
                };
                if let Value::Items(more) = self.eval(rhs, focus) {
                    items.extend(more);
                }
                Value::Items(document_order(items))
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => Value::Bool(
                self.boolean(&self.eval(lhs, focus)) || self.boolean(&self.eval(rhs, focus)),
            ),
            Expr::Binary(BinOp::And, lhs, rhs) => Value::Bool(
                self.boolean(&self.eval(lhs, focus)) && self.boolean(&self.eval(rhs, focus)),
            ),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, focus);
                let rhs = self.eval(rhs, focus);
                Value::Bool(self.compare(*op, &lhs, &rhs))
            }
            Expr::Call(function, args) => self.call(*function, args, focus),
            Expr::Literal(text) => Value::Str(text.clone()),
            Expr::Number(n) => Value::Num(*n),
        }
    }

    fn apply_steps(&self, start: Vec<Item>, steps: &[Step]) -> Vec<Item> {
        let mut current = start;
        for step in steps {
            let mut next = Vec::new();
            for item in &current {
                let candidates: Vec<Item> = self
                    .axis(*item, step.axis)
                    .into_iter()
                    .filter(|candidate| matches_test(&self.tree, *candidate, &step.test))
                    .collect();
                next.extend(self.apply_predicates(candidates, &step.predicates));
            }
            current = document_order(next);
        }
        current
    }

    /// Filters `items` (in axis order) through each predicate in turn.
    fn apply_predicates(&self, mut items: Vec<Item>, predicates: &[Expr]) -> Vec<Item> {
        for predicate in predicates {
            let size = items.len();
            items = items
                .into_iter()
                .enumerate()
                .filter(|(index, item)| {
                    let focus = Focus {
                        item: *item,
                        position: index + 1,
                        size,
                    };
                    match self.eval(predicate, focus) {
                        #[allow(clippy::cast_precision_loss)]
                        Value::Num(n) => (n - focus.position as f64).abs() < f64::EPSILON,
                        other => self.boolean(&other),
                    }
                })
                .map(|(_, item)| item)
                .collect();
        }
        items
    }

    fn axis(&self, item: Item, axis: Axis) -> Vec<Item> {
        let tree = &self.tree;
        match item {
            Item::Attr(id, _) => {
                let owner = QueryNode::Element(id);
                match axis {
                    Axis::SelfNode => vec![item],
                    Axis::Parent => vec![Item::Node(owner)],
                    Axis::Ancestor | Axis::AncestorOrSelf => {
                        let mut items = Vec::new();
                        if axis == Axis::AncestorOrSelf {
                            items.push(item);
                        }
                        items.push(Item::Node(owner));
                        items.extend(tree.ancestors(owner).into_iter().map(Item::Node));
                        items
                    }
                    _ => Vec::new(),
                }
            }
            Item::Node(node) => {
                let nodes = |nodes: Vec<QueryNode>| -> Vec<Item> {
                    nodes.into_iter().map(Item::Node).collect()
                };
                match axis {
                    Axis::Child => nodes(tree.children(node)),
                    Axis::Descendant => nodes(tree.descendants(node)),
                    Axis::DescendantOrSelf => {
                        let mut items = vec![item];
                        items.extend(tree.descendants(node).into_iter().map(Item::Node));
                        items
                    }
                    Axis::Parent => nodes(tree.parent(node).into_iter().collect()),
                    Axis::Ancestor => nodes(tree.ancestors(node)),
                    Axis::AncestorOrSelf => {
                        let mut items = vec![item];
                        items.extend(tree.ancestors(node).into_iter().map(Item::Node));
                        items
                    }
                    Axis::FollowingSibling => nodes(tree.following_siblings(node)),
                    Axis::PrecedingSibling => nodes(tree.preceding_siblings(node)),
                    Axis::Following => nodes(tree.following(node)),
                    Axis::Preceding => nodes(tree.preceding(node)),
                    Axis::SelfNode => vec![item],
                    Axis::Attribute => match node {
                        QueryNode::Document => Vec::new(),
                        QueryNode::Element(id) => Attr::ALL
                            .into_iter()
                            .filter(|attr| *attr != Attr::Text || tree.text(node).is_some())
                            .map(|attr| Item::Attr(id, attr))
                            .collect(),
                    },
                }
            }
        }
    }

    fn call(&self, function: Function, args: &[Expr], focus: Focus) -> Value {
        let arg = |i: usize| self.eval(&args[i], focus);
        let string_arg = |i: usize| self.string(&arg(i));
        let context_or_arg = || {
            args.first()
                .map_or_else(|| Value::Items(vec![focus.item]), |expr| self.eval(expr, focus))
        };

        match function {
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
            Function::Not => Value::Bool(!self.boolean(&arg(0))),
            Function::Boolean => Value::Bool(self.boolean(&arg(0))),
            #[allow(clippy::cast_precision_loss)]
            Function::Count => Value::Num(match arg(0) {
                Value::Items(items) => items.len() as f64,
                _ => f64::NAN,
            }),
            #[allow(clippy::cast_precision_loss)]
            Function::Position => Value::Num(focus.position as f64),
            #[allow(clippy::cast_precision_loss)]
            Function::Last => Value::Num(focus.size as f64),
            Function::String => Value::Str(self.string(&context_or_arg())),
            #[allow(clippy::cast_precision_loss)]
            Function::StringLength => {
                Value::Num(self.string(&context_or_arg()).chars().count() as f64)
            }
            Function::StartsWith => Value::Bool(string_arg(0).starts_with(&string_arg(1))),
            Function::EndsWith => Value::Bool(string_arg(0).ends_with(&string_arg(1))),
            Function::Contains => Value::Bool(string_arg(0).contains(&string_arg(1))),
            Function::Concat => Value::Str((0..args.len()).map(string_arg).collect()),
            Function::Name => Value::Str(match context_or_arg() {
                Value::Items(items) => items.first().map_or(String::new(), |item| self.item_name(*item)),
                _ => String::new(),
            }),
            Function::Number => Value::Num(self.number(&context_or_arg())),
        }
    }

    fn item_name(&self, item: Item) -> String {
        match item {
            Item::Node(node) => self.tree.name(node).to_string(),
            Item::Attr(_, Attr::Text) => "text".to_string(),
            Item::Attr(_, Attr::Line) => "line".to_string(),
            Item::Attr(_, Attr::Column) => "column".to_string(),
        }
    }

    fn item_string(&self, item: Item) -> String {
        let node = QueryNode::Element;
        match item {
            Item::Node(_) => String::new(),
            Item::Attr(id, Attr::Text) => self.tree.text(node(id)).unwrap_or_default().to_string(),
            Item::Attr(id, Attr::Line) => self.tree.line(node(id)).unwrap_or_default().to_string(),
            Item::Attr(id, Attr::Column) => {
                self.tree.column(node(id)).unwrap_or_default().to_string()
            }
        }
    }

    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::Items(items) => !items.is_empty(),
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Items(items) => items
                .first()
                .map_or(String::new(), |item| self.item_string(*item)),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Num(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            other => self.string(other).trim().parse().unwrap_or(f64::NAN),
        }
    }

    /// XPath 1.0 comparison, existential over node-sets.
    fn compare(&self, op: BinOp, lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::Items(a), Value::Items(b)) => a.iter().any(|x| {
                let x = Value::Str(self.item_string(*x));
                b.iter()
                    .any(|y| self.compare_atoms(op, &x, &Value::Str(self.item_string(*y))))
            }),
            (Value::Items(a), Value::Bool(_)) => {
                self.compare_atoms(op, &Value::Bool(!a.is_empty()), rhs)
            }
            (Value::Bool(_), Value::Items(b)) => {
                self.compare_atoms(op, lhs, &Value::Bool(!b.is_empty()))
            }
            (Value::Items(a), atom) => a
                .iter()
                .any(|x| self.compare_atoms(op, &Value::Str(self.item_string(*x)), atom)),
            (atom, Value::Items(b)) => b
                .iter()
                .any(|y| self.compare_atoms(op, atom, &Value::Str(self.item_string(*y)))),
            (a, b) => self.compare_atoms(op, a, b),
        }
    }

    fn compare_atoms(&self, op: BinOp, lhs: &Value, rhs: &Value) -> bool {
        match op {
            BinOp::Eq | BinOp::NotEq => {
                let equal = match (lhs, rhs) {
                    (Value::Bool(_), _) | (_, Value::Bool(_)) => self.boolean(lhs) == self.boolean(rhs),
                    (Value::Num(_), _) | (_, Value::Num(_)) => {
                        #[allow(clippy::float_cmp)]
                        let equal = self.number(lhs) == self.number(rhs);
                        equal
                    }
                    _ => self.string(lhs) == self.string(rhs),
                };
                equal == (op == BinOp::Eq)
            }
            BinOp::Lt => self.number(lhs) < self.number(rhs),
            BinOp::Le => self.number(lhs) <= self.number(rhs),
            BinOp::Gt => self.number(lhs) > self.number(rhs),
            BinOp::Ge => self.number(lhs) >= self.number(rhs),
            BinOp::And | BinOp::Or => self.boolean(lhs) && self.boolean(rhs),
        }
    }
}

fn matches_test(tree: &QueryTree<'_>, item: Item, test: &NodeTest) -> bool {
    match (test, item) {
        (NodeTest::AnyNode, _) => true,
        (NodeTest::AnyElement, Item::Node(QueryNode::Element(_))) => true,
        (NodeTest::Kind(kind), Item::Node(node)) => tree.kind(node) == Some(*kind),
        (NodeTest::AnyAttr, Item::Attr(..)) => true,
        (NodeTest::Attr(wanted), Item::Attr(_, attr)) => *wanted == attr,
        _ => false,
    }
}

fn document_order(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by_key(|item| item.order_key());
    items.dedup();
    items
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = n as i64;
        whole.to_string()
    } else {
        n.to_string()
    }
}
