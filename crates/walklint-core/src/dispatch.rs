//! Kind-to-check dispatch table.

use crate::check::CheckDescriptor;
use crate::kind::{KindSet, SyntaxKind};
use tracing::debug;

/// Errors detected while registering checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RegistrationError {
    /// A check requires kinds it does not accept.
    #[error("check `{check}` requires kinds it does not accept: {kinds}")]
    #[diagnostic(
        code(walklint::registration::required_not_acceptable),
        help("a check's required kinds must be a subset of its acceptable kinds")
    )]
    RequiredNotAcceptable {
        /// Identity of the offending check.
        check: String,
        /// The kinds outside the acceptable set.
        kinds: KindSet,
    },

    /// Configured kinds fall outside the acceptable set.
    #[error("check `{check}` cannot be configured for kinds {kinds}")]
    #[diagnostic(
        code(walklint::registration::unacceptable_kinds),
        help("remove these kinds from the check's `kinds` list")
    )]
    UnacceptableKinds {
        /// Identity of the offending check.
        check: String,
        /// The kinds outside the acceptable set.
        kinds: KindSet,
    },
}

/// Per-kind, order-preserving index of interested checks.
///
/// Entries are indices into the descriptor list the table was built from.
/// Read-only after construction.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    by_kind: Vec<Vec<usize>>,
    check_count: usize,
}

impl DispatchTable {
    /// Checks interested in `kind`, in registration order.
    #[must_use]
    pub fn interested(&self, kind: SyntaxKind) -> &[usize] {
        &self.by_kind[kind.index()]
    }

    /// Number of registered checks.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.check_count
    }

    /// Kinds with at least one interested check.
    #[must_use]
    pub fn kinds(&self) -> KindSet {
        SyntaxKind::ALL
            .iter()
            .copied()
            .filter(|k| !self.by_kind[k.index()].is_empty())
            .collect()
    }
}

/// Builds the dispatch table for an ordered list of checks.
///
/// # Errors
///
/// Returns an error naming the first check whose required kinds are not
/// acceptable, or whose configured kinds are not acceptable.
pub fn register(checks: &[CheckDescriptor]) -> Result<DispatchTable, RegistrationError> {
    let mut by_kind = vec![Vec::new(); SyntaxKind::COUNT];

    for (index, check) in checks.iter().enumerate() {
        let acceptable = check.acceptable_kinds();

        let missing = check.required_kinds().difference(acceptable);
        if !missing.is_empty() {
            return Err(RegistrationError::RequiredNotAcceptable {
                check: check.identity().to_string(),
                kinds: missing,
            });
        }

        if let Some(configured) = check.configured_kinds() {
            let extra = configured.difference(acceptable);
            if !extra.is_empty() {
                return Err(RegistrationError::UnacceptableKinds {
                    check: check.identity().to_string(),
                    kinds: extra,
                });
            }
        }

        let interest = check.interest();
        debug!(check = check.identity(), kinds = %interest, "Registered check");
        for kind in interest.iter() {
            by_kind[kind.index()].push(index);
        }
    }

    Ok(DispatchTable {
        by_kind,
        check_count: checks.len(),
    })
}
