//! Check that limits the number of `return` statements per method,
//! constructor and lambda.
//!
//! # Rationale
//!
//! Many exit points make a method harder to follow. Guard clauses are fine in
//! moderation, which is why the limits are configurable.
//!
//! # Detected Patterns
//!
//! - Methods and lambdas returning a value with more than `max` returns
//! - Void methods, constructors and lambdas with more than `max-for-void`
//!   returns
//!
//! Each scope counts only its own returns: a lambda nested in a method has a
//! separate counter. Methods whose name matches `format` are skipped.
//!
//! # Configuration
//!
//! - `max`: returns allowed in non-void scopes (default: 2)
//! - `max-for-void`: returns allowed in void scopes (default: 1)
//! - `format`: names of exempt methods (default: `^equals$`)

use regex::Regex;
use serde::{Deserialize, Deserializer};
use walklint_core::{
    Check, CheckContext, CheckError, CheckResult, KindSet, SyntaxKind, SyntaxNode,
};

/// Check name for return-count.
pub const NAME: &str = "return-count";

/// Options for [`ReturnCount`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ReturnCountOptions {
    /// Returns allowed in scopes that return a value.
    pub max: usize,
    /// Returns allowed in void scopes.
    pub max_for_void: usize,
    /// Exempt method names; `None` exempts `equals` only.
    #[serde(deserialize_with = "deserialize_regex")]
    pub format: Option<Regex>,
}

impl Default for ReturnCountOptions {
    fn default() -> Self {
        Self {
            max: 2,
            max_for_void: 1,
            format: None,
        }
    }
}

impl ReturnCountOptions {
    fn is_exempt(&self, method: &str) -> bool {
        match &self.format {
            Some(format) => format.is_match(method),
            None => method == "equals",
        }
    }
}

fn deserialize_regex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Regex>, D::Error> {
    let pattern = String::deserialize(deserializer)?;
    Regex::new(&pattern)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Return counter of one method, constructor or lambda.
#[derive(Debug, Clone)]
struct Scope {
    checking: bool,
    count: usize,
    /// Set by the first return seen, which decides void-ness.
    limit: Option<(usize, bool)>,
}

impl Scope {
    fn new(checking: bool) -> Self {
        Self {
            checking,
            count: 0,
            limit: None,
        }
    }
}

/// Limits `return` statements per scope.
#[derive(Debug, Clone)]
pub struct ReturnCount {
    options: ReturnCountOptions,
    current: Scope,
    stack: Vec<Scope>,
}

impl Default for ReturnCount {
    fn default() -> Self {
        Self::new()
    }
}

impl ReturnCount {
    /// Creates a check with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::from_options(&ReturnCountOptions::default())
    }

    /// Creates a check from its options.
    #[must_use]
    pub fn from_options(options: &ReturnCountOptions) -> Self {
        Self {
            options: options.clone(),
            current: Scope::new(false),
            stack: Vec::new(),
        }
    }

    /// Sets the limit for non-void scopes.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.options.max = max;
        self
    }

    /// Sets the limit for void scopes.
    #[must_use]
    pub fn max_for_void(mut self, max: usize) -> Self {
        self.options.max_for_void = max;
        self
    }

    /// Sets the pattern of exempt method names.
    #[must_use]
    pub fn format(mut self, format: Regex) -> Self {
        self.options.format = Some(format);
        self
    }

    fn push(&mut self, scope: Scope) {
        let outer = std::mem::replace(&mut self.current, scope);
        self.stack.push(outer);
    }
}

impl Check for ReturnCount {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Limits the number of return statements per method, constructor and lambda"
    }

    fn acceptable_kinds(&self) -> KindSet {
        KindSet::of(&[
            SyntaxKind::CtorDef,
            SyntaxKind::MethodDef,
            SyntaxKind::Lambda,
            SyntaxKind::LiteralReturn,
        ])
    }

    fn required_kinds(&self) -> KindSet {
        KindSet::of(&[SyntaxKind::LiteralReturn])
    }

    fn begin_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
        self.current = Scope::new(false);
        self.stack.clear();
        Ok(())
    }

    fn enter_node(&mut self, node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        match node.kind() {
            SyntaxKind::CtorDef | SyntaxKind::MethodDef => {
                let name = node
                    .first_child_of_kind(SyntaxKind::Ident)
                    .ok_or(CheckError::MissingChild {
                        parent: node.kind(),
                        expected: SyntaxKind::Ident,
                    })?
                    .text();
                let checking = !self.options.is_exempt(name);
                self.push(Scope::new(checking));
            }
            SyntaxKind::Lambda => self.push(Scope::new(true)),
            SyntaxKind::LiteralReturn => {
                let is_void = node.first_child().map(SyntaxNode::kind) == Some(SyntaxKind::Semi);
                let max = if is_void {
                    self.options.max_for_void
                } else {
                    self.options.max
                };
                self.current.limit = Some((max, is_void));
                self.current.count += 1;
            }
            _ => {}
        }
        Ok(())
    }

    fn leave_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
        if node.kind() == SyntaxKind::LiteralReturn {
            return Ok(());
        }

        let scope = &self.current;
        if let (true, Some((max, is_void))) = (scope.checking, scope.limit) {
            if scope.count > max {
                let message = if is_void {
                    format!(
                        "Return count is {} (max allowed for void methods/constructors/lambdas is {max}).",
                        scope.count
                    )
                } else {
                    format!(
                        "Return count is {} (max allowed for non-void methods/lambdas is {max}).",
                        scope.count
                    )
                };
                ctx.log(node, message);
            }
        }

        self.current = self
            .stack
            .pop()
            .ok_or(CheckError::UnbalancedScope(node.kind()))?;
        Ok(())
    }
}
