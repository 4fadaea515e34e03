//! Core types for violations and audit results.

use crate::ast::NodeId;
use crate::kind::SyntaxKind;
use crate::walker::FileFailure;
use serde::{Deserialize, Serialize};

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the run.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown severity `{other}`, expected: error, warning, info"
            )),
        }
    }
}

/// Source location of a violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File name as handed to the engine.
    pub file: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (0-indexed, same convention as syntax nodes).
    pub column: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Column as shown to users (1-indexed).
    #[must_use]
    pub fn display_column(&self) -> usize {
        self.column + 1
    }
}

/// A rule deviation reported by a check during traversal.
///
/// Violations are immutable: filters and reporters only ever see shared
/// references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    check: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    module_id: Option<String>,
    severity: Severity,
    location: Location,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<SyntaxKind>,
}

impl Violation {
    /// Creates a violation that is not tied to a node.
    #[must_use]
    pub fn new(
        check: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            module_id: None,
            severity,
            location,
            message: message.into(),
            node: None,
            kind: None,
        }
    }

    /// Attaches the module id of the reporting check.
    #[must_use]
    pub fn with_module_id(mut self, module_id: Option<String>) -> Self {
        self.module_id = module_id;
        self
    }

    /// Attaches the triggering node.
    #[must_use]
    pub fn with_node(mut self, node: NodeId, kind: SyntaxKind) -> Self {
        self.node = Some(node);
        self.kind = Some(kind);
        self
    }

    /// Identity (name) of the check that reported this violation.
    #[must_use]
    pub fn check(&self) -> &str {
        &self.check
    }

    /// Module id of the reporting check, if one was configured.
    #[must_use]
    pub fn module_id(&self) -> Option<&str> {
        self.module_id.as_deref()
    }

    /// Severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Location.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// File name.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.location.file
    }

    /// Line (1-indexed).
    #[must_use]
    pub fn line(&self) -> usize {
        self.location.line
    }

    /// Column (0-indexed).
    #[must_use]
    pub fn column(&self) -> usize {
        self.location.column
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Triggering node, if the violation was logged against one.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Kind of the triggering node.
    #[must_use]
    pub fn kind(&self) -> Option<SyntaxKind> {
        self.kind
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} at {}:{}:{}\n",
            self.check,
            self.location.file,
            self.location.line,
            self.location.display_column(),
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(id) = &self.module_id {
            let _ = writeln!(output, "  = id: {id}");
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file,
            self.location.line,
            self.location.display_column(),
            self.severity,
            self.module_id.as_deref().unwrap_or(&self.check),
            self.message
        )
    }
}

/// Outcome of processing a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// File name.
    pub file: String,
    /// Accepted violations, in emission order.
    pub violations: Vec<Violation>,
    /// Number of violations rejected by filters.
    pub suppressed: usize,
    /// File-processing failure, if the walk was aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FileFailure>,
}

impl FileReport {
    /// Creates a report for a successfully walked file.
    #[must_use]
    pub fn completed(file: impl Into<String>, violations: Vec<Violation>, suppressed: usize) -> Self {
        Self {
            file: file.into(),
            violations,
            suppressed,
            failure: None,
        }
    }

    /// Creates a report for a file whose processing failed.
    #[must_use]
    pub fn failed(file: impl Into<String>, failure: FileFailure) -> Self {
        Self {
            file: file.into(),
            violations: Vec::new(),
            suppressed: 0,
            failure: Some(failure),
        }
    }

    /// Whether processing failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Result of a run over many files.
#[derive(Debug, Default, Serialize)]
pub struct AuditReport {
    /// Per-file reports, in input order.
    pub files: Vec<FileReport>,
}

impl AuditReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All accepted violations, file by file.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.files.iter().flat_map(|f| f.violations.iter())
    }

    /// Files whose processing failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_failed())
    }

    /// Number of files processed (including failed ones).
    #[must_use]
    pub fn files_checked(&self) -> usize {
        self.files.len()
    }

    /// Total number of suppressed violations.
    #[must_use]
    pub fn suppressed(&self) -> usize {
        self.files.iter().map(|f| f.suppressed).sum()
    }

    /// Returns true if there are any error-level violations.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations().any(|v| v.severity() == Severity::Error)
    }

    /// Returns true if any file failed to process.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations().any(|v| v.severity() >= severity)
    }

    /// Counts violations by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |s: Severity| self.violations().filter(|v| v.severity() == s).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Formats the whole report as plain text.
    #[must_use]
    pub fn format_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        for violation in self.violations() {
            let _ = writeln!(report, "{}", violation.format());
        }
        for failed in self.failures() {
            if let Some(failure) = &failed.failure {
                let _ = writeln!(report, "{}: failed: {failure}\n", failed.file);
            }
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = write!(
            report,
            "Found {} error(s), {} warning(s), {} info(s) in {} file(s)",
            errors,
            warnings,
            infos,
            self.files_checked()
        );
        let failed = self.failures().count();
        if failed > 0 {
            let _ = write!(report, "; {failed} file(s) failed");
        }
        report
    }

    /// Adds the files of another report.
    pub fn extend(&mut self, other: Self) {
        self.files.extend(other.files);
    }
}
