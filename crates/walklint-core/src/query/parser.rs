//! Recursive-descent parser for structural queries.
//!
//! Supports the location-path subset of XPath 1.0: absolute and relative
//! paths, `//`, explicit axes, `.`/`..`, `*`, `node()`, attributes,
//! predicates, `and`/`or`, comparisons, unions, literals and a small
//! function library.

use super::error::{QueryError, QueryErrorKind};
use super::lexer::{tokenize, Spanned, Token};
use crate::kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    SelfNode,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "following" => Self::Following,
            "preceding" => Self::Preceding,
            "self" => Self::SelfNode,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }
}

/// Attributes exposed on element nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Attr {
    Text,
    Line,
    Column,
}

impl Attr {
    pub(crate) const ALL: [Self; 3] = [Self::Text, Self::Line, Self::Column];

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "line" => Some(Self::Line),
            "column" => Some(Self::Column),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeTest {
    /// `node()`: anything on the axis.
    AnyNode,
    /// `*` on an element axis.
    AnyElement,
    /// A kind name.
    Kind(SyntaxKind),
    /// `*` on the attribute axis.
    AnyAttr,
    /// A named attribute.
    Attr(Attr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    True,
    False,
    Not,
    Boolean,
    Count,
    Position,
    Last,
    String,
    StringLength,
    StartsWith,
    EndsWith,
    Contains,
    Concat,
    Name,
    Number,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "true" => Self::True,
            "false" => Self::False,
            "not" => Self::Not,
            "boolean" => Self::Boolean,
            "count" => Self::Count,
            "position" => Self::Position,
            "last" => Self::Last,
            "string" => Self::String,
            "string-length" => Self::StringLength,
            "starts-with" => Self::StartsWith,
            "ends-with" => Self::EndsWith,
            "contains" => Self::Contains,
            "concat" => Self::Concat,
            "name" | "local-name" => Self::Name,
            "number" => Self::Number,
            _ => return None,
        })
    }

    /// Accepted argument counts as `(min, max)`.
    fn arity(self) -> (usize, usize) {
        match self {
            Self::True | Self::False | Self::Position | Self::Last => (0, 0),
            Self::Not | Self::Boolean | Self::Count => (1, 1),
            Self::String | Self::StringLength | Self::Name | Self::Number => (0, 1),
            Self::StartsWith | Self::EndsWith | Self::Contains => (2, 2),
            Self::Concat => (2, usize::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    /// A location path; absolute paths start at the document node.
    Path { absolute: bool, steps: Vec<Step> },
    /// A primary expression filtered by predicates and followed by steps.
    Filter {
        base: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Union(Box<Expr>, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
    Literal(String),
    Number(f64),
}

impl Expr {
    /// Whether the expression yields syntax nodes (not values or attributes).
    pub(crate) fn selects_nodes(&self) -> bool {
        match self {
            Self::Path { steps, .. } => steps.last().map_or(true, |s| s.axis != Axis::Attribute),
            Self::Filter { base, steps, .. } => match steps.last() {
                Some(step) => step.axis != Axis::Attribute,
                None => base.selects_nodes(),
            },
            Self::Union(lhs, rhs) => lhs.selects_nodes() && rhs.selects_nodes(),
            _ => false,
        }
    }
}

pub(crate) fn parse(query: &str) -> Result<Expr, QueryError> {
    let tokens = tokenize(query)?;
    let mut parser = Parser {
        query,
        tokens,
        pos: 0,
    };
    let expr = parser.or_expr()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(parser.error_at(
            extra.offset,
            QueryErrorKind::Unexpected {
                expected: "end of query".into(),
                found: extra.token.describe(),
            },
        ));
    }
    Ok(expr)
}

struct Parser<'q> {
    query: &'q str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.query.len(), |s| s.offset)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(n)) if n == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), QueryError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&token.describe()))
        }
    }

    fn error_at(&self, offset: usize, kind: QueryErrorKind) -> QueryError {
        QueryError::new(self.query, Some(offset), kind)
    }

    fn unexpected(&self, expected: &str) -> QueryError {
        let kind = match self.tokens.get(self.pos) {
            Some(found) => QueryErrorKind::Unexpected {
                expected: expected.to_string(),
                found: found.token.describe(),
            },
            None => QueryErrorKind::UnexpectedEnd(expected.to_string()),
        };
        self.error_at(self.offset(), kind)
    }

    fn or_expr(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.and_expr()?;
        while self.eat_keyword("or") {
            let rhs = self.and_expr()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.equality_expr()?;
        while self.eat_keyword("and") {
            let rhs = self.equality_expr()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::NotEq,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.relational_expr()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn relational_expr(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.union_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Ge) => BinOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.union_expr()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn union_expr(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.path_expr()?;
        while self.eat(&Token::Pipe) {
            let rhs = self.path_expr()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn path_expr(&mut self) -> Result<Expr, QueryError> {
        match self.peek() {
            Some(Token::Literal(_) | Token::Number(_) | Token::LParen) => self.filter_expr(),
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen) && name != "node" =>
            {
                self.filter_expr()
            }
            Some(Token::Slash) => {
                self.pos += 1;
                let steps = if self.starts_step() {
                    self.relative_path(Vec::new())?
                } else {
                    Vec::new()
                };
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let steps = self.relative_path(vec![descendant_or_self()])?;
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            Some(_) => {
                let steps = self.relative_path(Vec::new())?;
                Ok(Expr::Path {
                    absolute: false,
                    steps,
                })
            }
            None => Err(self.unexpected("an expression")),
        }
    }

    fn filter_expr(&mut self) -> Result<Expr, QueryError> {
        let base = self.primary_expr()?;
        let predicates = self.predicates()?;
        let steps = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                self.relative_path(Vec::new())?
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                self.relative_path(vec![descendant_or_self()])?
            }
            _ => Vec::new(),
        };
        if predicates.is_empty() && steps.is_empty() {
            Ok(base)
        } else {
            Ok(Expr::Filter {
                base: Box::new(base),
                predicates,
                steps,
            })
        }
    }

    fn primary_expr(&mut self) -> Result<Expr, QueryError> {
        let offset = self.offset();
        match self.bump() {
            Some(Token::Literal(text)) => Ok(Expr::Literal(text)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                let function = Function::from_name(&name).ok_or_else(|| {
                    self.error_at(offset, QueryErrorKind::UnknownFunction(name.clone()))
                })?;
                self.expect(&Token::LParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.or_expr()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(&Token::Comma)?;
                    }
                }
                let (min, max) = function.arity();
                if args.len() < min || args.len() > max {
                    let expected = match (min, max) {
                        (min, max) if min == max => min.to_string(),
                        (min, usize::MAX) => format!("at least {min}"),
                        (min, max) => format!("{min} to {max}"),
                    };
                    return Err(self.error_at(
                        offset,
                        QueryErrorKind::Arity {
                            name,
                            expected,
                            found: args.len(),
                        },
                    ));
                }
                Ok(Expr::Call(function, args))
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.unexpected("an expression"))
            }
            None => Err(self.unexpected("an expression")),
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn relative_path(&mut self, mut steps: Vec<Step>) -> Result<Vec<Step>, QueryError> {
        steps.push(self.step()?);
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(descendant_or_self());
                steps.push(self.step()?);
            } else {
                return Ok(steps);
            }
        }
    }

    fn step(&mut self) -> Result<Step, QueryError> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfNode,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::ColonColon)) =
            (self.peek(), self.peek_at(1))
        {
            let offset = self.offset();
            let axis = Axis::from_name(name)
                .ok_or_else(|| self.error_at(offset, QueryErrorKind::UnknownAxis(name.clone())))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.node_test(axis)?;
        let predicates = self.predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self, axis: Axis) -> Result<NodeTest, QueryError> {
        let offset = self.offset();
        match self.peek().cloned() {
            Some(Token::Star) => {
                self.pos += 1;
                Ok(if axis == Axis::Attribute {
                    NodeTest::AnyAttr
                } else {
                    NodeTest::AnyElement
                })
            }
            Some(Token::Name(name)) if name == "node" && self.peek_at(1) == Some(&Token::LParen) => {
                self.pos += 2;
                self.expect(&Token::RParen)?;
                Ok(NodeTest::AnyNode)
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                if axis == Axis::Attribute {
                    Attr::from_name(&name)
                        .map(NodeTest::Attr)
                        .ok_or_else(|| self.error_at(offset, QueryErrorKind::UnknownAttribute(name)))
                } else {
                    name.parse::<SyntaxKind>()
                        .map(NodeTest::Kind)
                        .map_err(|_| self.error_at(offset, QueryErrorKind::UnknownKind(name)))
                }
            }
            _ => Err(self.unexpected("a node test")),
        }
    }

    fn predicates(&mut self) -> Result<Vec<Expr>, QueryError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.or_expr()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(predicates)
    }
}

fn descendant_or_self() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::AnyNode,
        predicates: Vec::new(),
    }
}
