//! Check capability trait and descriptors.

use crate::ast::SyntaxNode;
use crate::context::CheckContext;
use crate::kind::{KindSet, SyntaxKind};
use crate::types::Severity;
use std::fmt;
use std::sync::Arc;

/// Result type returned by every check callback.
pub type CheckResult = Result<(), CheckError>;

/// A pluggable rule that inspects syntax nodes and reports violations.
///
/// A check declares the node kinds it can handle and receives callbacks from
/// the tree walker: [`begin_file`](Check::begin_file) once per file before any
/// node, [`enter_node`](Check::enter_node) in pre-order,
/// [`leave_node`](Check::leave_node) in post-order and
/// [`end_file`](Check::end_file) after the last node. Per-file state must be
/// reset in `begin_file`.
///
/// # Example
///
/// ```
/// use walklint_core::{Check, CheckContext, CheckResult, KindSet, SyntaxKind, SyntaxNode};
///
/// #[derive(Default)]
/// struct NoNew;
///
/// impl Check for NoNew {
///     fn name(&self) -> &'static str { "no-new" }
///
///     fn acceptable_kinds(&self) -> KindSet {
///         KindSet::of(&[SyntaxKind::LiteralNew])
///     }
///
///     fn enter_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
///         ctx.log(node, "Instantiation is not allowed.");
///         Ok(())
///     }
/// }
/// ```
pub trait Check: Send {
    /// Returns the kebab-case name of this check (e.g., "return-count").
    fn name(&self) -> &'static str;

    /// Returns a brief description of what this check reports.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this check.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Every node kind this check knows how to handle.
    fn acceptable_kinds(&self) -> KindSet;

    /// Kinds the check cannot work without. Must be a subset of
    /// [`acceptable_kinds`](Check::acceptable_kinds).
    fn required_kinds(&self) -> KindSet {
        KindSet::EMPTY
    }

    /// Called once per file before any node is dispatched.
    ///
    /// # Errors
    ///
    /// An error aborts the walk of the current file.
    fn begin_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
        Ok(())
    }

    /// Called in pre-order for every node of an interesting kind.
    ///
    /// # Errors
    ///
    /// An error aborts the walk of the current file.
    fn enter_node(&mut self, _node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        Ok(())
    }

    /// Called in post-order for every node of an interesting kind.
    ///
    /// # Errors
    ///
    /// An error aborts the walk of the current file.
    fn leave_node(&mut self, _node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        Ok(())
    }

    /// Called once per file after the last node was left.
    ///
    /// # Errors
    ///
    /// An error aborts the walk of the current file.
    fn end_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
        Ok(())
    }
}

/// Errors raised by check callbacks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// The tree does not have the shape the check relies on.
    #[error("{parent} has no {expected} child")]
    MissingChild {
        /// Kind of the inspected node.
        parent: SyntaxKind,
        /// Kind of the child that was expected.
        expected: SyntaxKind,
    },

    /// A scope stack was popped more often than pushed.
    #[error("unbalanced scope at {0}")]
    UnbalancedScope(SyntaxKind),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl CheckError {
    /// Creates a free-form error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Produces fresh check instances.
pub type CheckFactory = Arc<dyn Fn() -> Box<dyn Check> + Send + Sync>;

/// A configured check: its factory plus the configuration that applies to
/// every instance it produces.
///
/// Built once and reused across files. Instances are created per walk
/// session, never shared between concurrently walked files.
#[derive(Clone)]
pub struct CheckDescriptor {
    name: &'static str,
    description: &'static str,
    module_id: Option<String>,
    severity: Severity,
    acceptable: KindSet,
    required: KindSet,
    configured: Option<KindSet>,
    factory: CheckFactory,
}

impl CheckDescriptor {
    /// Creates a descriptor from a factory.
    ///
    /// A prototype instance is created once to read the check's name and
    /// kind sets.
    #[must_use]
    pub fn new(factory: CheckFactory) -> Self {
        let prototype = factory();
        Self {
            name: prototype.name(),
            description: prototype.description(),
            module_id: None,
            severity: prototype.default_severity(),
            acceptable: prototype.acceptable_kinds(),
            required: prototype.required_kinds(),
            configured: None,
            factory,
        }
    }

    /// Creates a descriptor for a check type with a `Default` constructor.
    #[must_use]
    pub fn of<C>() -> Self
    where
        C: Check + Default + 'static,
    {
        Self::new(Arc::new(|| -> Box<dyn Check> { Box::new(C::default()) }))
    }

    /// Sets the module id.
    #[must_use]
    pub fn with_module_id(mut self, id: impl Into<String>) -> Self {
        self.module_id = Some(id.into());
        self
    }

    /// Overrides the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Restricts the check to a configured subset of its acceptable kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: KindSet) -> Self {
        self.configured = Some(kinds);
        self
    }

    /// Check name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Module id, if configured.
    #[must_use]
    pub fn module_id(&self) -> Option<&str> {
        self.module_id.as_deref()
    }

    /// Module id if set, otherwise the check name.
    #[must_use]
    pub fn identity(&self) -> &str {
        self.module_id.as_deref().unwrap_or(self.name)
    }

    /// Severity stamped on reported violations.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Kinds the check can handle.
    #[must_use]
    pub fn acceptable_kinds(&self) -> KindSet {
        self.acceptable
    }

    /// Kinds the check cannot work without.
    #[must_use]
    pub fn required_kinds(&self) -> KindSet {
        self.required
    }

    /// The configured kind subset, if any.
    #[must_use]
    pub fn configured_kinds(&self) -> Option<KindSet> {
        self.configured
    }

    /// Kinds this check is dispatched for.
    #[must_use]
    pub fn interest(&self) -> KindSet {
        match self.configured {
            Some(configured) => configured.union(self.required),
            None => self.acceptable,
        }
    }

    /// Creates a fresh instance.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Check> {
        (self.factory)()
    }
}

impl fmt::Debug for CheckDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDescriptor")
            .field("name", &self.name)
            .field("module_id", &self.module_id)
            .field("severity", &self.severity)
            .field("acceptable", &self.acceptable)
            .field("required", &self.required)
            .field("configured", &self.configured)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxKind::*;

    #[derive(Default)]
    struct Scoped;

    impl Check for Scoped {
        fn name(&self) -> &'static str {
            "scoped"
        }

        fn default_severity(&self) -> Severity {
            Severity::Warning
        }

        fn acceptable_kinds(&self) -> KindSet {
            KindSet::of(&[MethodDef, CtorDef, Lambda, LiteralReturn])
        }

        fn required_kinds(&self) -> KindSet {
            KindSet::of(&[LiteralReturn])
        }
    }

    #[test]
    fn descriptor_reads_prototype() {
        let d = CheckDescriptor::of::<Scoped>();
        assert_eq!(d.name(), "scoped");
        assert_eq!(d.severity(), Severity::Warning);
        assert_eq!(d.identity(), "scoped");
        assert_eq!(d.interest(), d.acceptable_kinds());
    }

    #[test]
    fn configured_kinds_keep_required() {
        let d = CheckDescriptor::of::<Scoped>().with_kinds(KindSet::of(&[MethodDef]));
        assert_eq!(d.interest(), KindSet::of(&[MethodDef, LiteralReturn]));
    }

    #[test]
    fn module_id_becomes_identity() {
        let d = CheckDescriptor::of::<Scoped>()
            .with_module_id("returns")
            .with_severity(Severity::Error);
        assert_eq!(d.identity(), "returns");
        assert_eq!(d.severity(), Severity::Error);
    }

    #[test]
    fn instances_are_independent() {
        let d = CheckDescriptor::of::<Scoped>();
        let a = d.instantiate();
        let b = d.instantiate();
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn check_error_messages() {
        let e = CheckError::MissingChild {
            parent: LiteralNew,
            expected: Ident,
        };
        assert_eq!(e.to_string(), "LITERAL_NEW has no IDENT child");
        assert_eq!(CheckError::other("boom").to_string(), "boom");
    }
}
