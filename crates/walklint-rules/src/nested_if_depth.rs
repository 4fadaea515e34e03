//! Check that limits how deeply `if` statements nest.
//!
//! # Rationale
//!
//! Deeply nested conditionals are hard to read. Early returns or extracted
//! methods usually flatten them.
//!
//! # Detected Patterns
//!
//! - An `if` enclosed by more than `max` other `if` statements
//!
//! An `else if` continues the chain it belongs to and does not deepen it.
//!
//! # Configuration
//!
//! - `max`: enclosing `if` statements allowed (default: 1)

use serde::Deserialize;
use walklint_core::{Check, CheckContext, CheckResult, KindSet, SyntaxKind, SyntaxNode};

/// Check name for nested-if-depth.
pub const NAME: &str = "nested-if-depth";

/// Options for [`NestedIfDepth`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct NestedIfDepthOptions {
    /// Allowed nesting depth.
    pub max: usize,
}

impl Default for NestedIfDepthOptions {
    fn default() -> Self {
        Self { max: 1 }
    }
}

/// Limits nesting of `if` statements.
#[derive(Debug, Clone)]
pub struct NestedIfDepth {
    max: usize,
    depth: usize,
}

impl Default for NestedIfDepth {
    fn default() -> Self {
        Self::new()
    }
}

impl NestedIfDepth {
    /// Creates a check with the default depth.
    #[must_use]
    pub fn new() -> Self {
        Self::from_options(&NestedIfDepthOptions::default())
    }

    /// Creates a check from its options.
    #[must_use]
    pub fn from_options(options: &NestedIfDepthOptions) -> Self {
        Self {
            max: options.max,
            depth: 0,
        }
    }

    /// Sets the allowed depth.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }
}

fn is_else_if(node: SyntaxNode<'_>) -> bool {
    node.parent()
        .is_some_and(|p| p.kind() == SyntaxKind::LiteralElse)
}

impl Check for NestedIfDepth {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Limits the nesting depth of if statements"
    }

    fn acceptable_kinds(&self) -> KindSet {
        KindSet::of(&[SyntaxKind::LiteralIf])
    }

    fn required_kinds(&self) -> KindSet {
        KindSet::of(&[SyntaxKind::LiteralIf])
    }

    fn begin_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
        self.depth = 0;
        Ok(())
    }

    fn enter_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
        if is_else_if(node) {
            return Ok(());
        }
        if self.depth > self.max {
            ctx.log(
                node,
                format!(
                    "Nested if-else depth is {} (max allowed is {}).",
                    self.depth, self.max
                ),
            );
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_node(&mut self, node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        if !is_else_if(node) {
            self.depth = self.depth.saturating_sub(1);
        }
        Ok(())
    }
}
