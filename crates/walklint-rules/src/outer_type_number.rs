//! Check that limits the number of top-level types in a file.
//!
//! # Detected Patterns
//!
//! - More than `max` outer classes, interfaces, enums, records or annotation
//!   types in one file
//!
//! Nested types do not count. The violation is reported once per file, at the
//! root node.
//!
//! # Configuration
//!
//! - `max`: outer types allowed (default: 1)

use serde::Deserialize;
use walklint_core::{Check, CheckContext, CheckResult, KindSet, SyntaxKind, SyntaxNode};

/// Check name for outer-type-number.
pub const NAME: &str = "outer-type-number";

/// Options for [`OuterTypeNumber`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct OuterTypeNumberOptions {
    /// Allowed number of outer types.
    pub max: usize,
}

impl Default for OuterTypeNumberOptions {
    fn default() -> Self {
        Self { max: 1 }
    }
}

/// Limits top-level type declarations per file.
#[derive(Debug, Clone)]
pub struct OuterTypeNumber {
    max: usize,
    depth: usize,
    outer: usize,
}

impl Default for OuterTypeNumber {
    fn default() -> Self {
        Self::new()
    }
}

impl OuterTypeNumber {
    /// Creates a check with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::from_options(&OuterTypeNumberOptions::default())
    }

    /// Creates a check from its options.
    #[must_use]
    pub fn from_options(options: &OuterTypeNumberOptions) -> Self {
        Self {
            max: options.max,
            depth: 0,
            outer: 0,
        }
    }

    /// Sets the allowed number of outer types.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }
}

impl Check for OuterTypeNumber {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Limits the number of top-level types per file"
    }

    fn acceptable_kinds(&self) -> KindSet {
        KindSet::of(&[
            SyntaxKind::ClassDef,
            SyntaxKind::InterfaceDef,
            SyntaxKind::EnumDef,
            SyntaxKind::AnnotationDef,
            SyntaxKind::RecordDef,
        ])
    }

    fn begin_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
        self.depth = 0;
        self.outer = 0;
        Ok(())
    }

    fn enter_node(&mut self, _node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        if self.depth == 0 {
            self.outer += 1;
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_node(&mut self, _node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn end_file(&mut self, ctx: &mut CheckContext<'_>) -> CheckResult {
        if self.outer > self.max {
            let root = ctx.root();
            ctx.log(
                root,
                format!(
                    "Outer types defined is {} (max allowed is {}).",
                    self.outer, self.max
                ),
            );
        }
        Ok(())
    }
}
