//! Multi-file orchestration: walk, filter, report.

use crate::ast::{ParseFailure, SyntaxTree};
use crate::check::CheckDescriptor;
use crate::dispatch::RegistrationError;
use crate::filter::{FilterElement, FilterSet};
use crate::query::QueryEngine;
use crate::types::{AuditReport, FileReport};
use crate::walker::{Cancellation, FileFailure, TreeWalker, WalkSession};

use rayon::prelude::*;
use tracing::{debug, info, warn};

/// One input file: its name and either its tree or the parser's failure.
#[derive(Debug)]
pub struct SourceUnit {
    /// File name stamped on violations.
    pub path: String,
    /// The parsed tree.
    pub tree: Result<SyntaxTree, ParseFailure>,
    /// Cancellation flag polled while this file is walked.
    pub cancellation: Option<Cancellation>,
}

impl SourceUnit {
    /// A successfully parsed file.
    #[must_use]
    pub fn parsed(path: impl Into<String>, tree: SyntaxTree) -> Self {
        Self {
            path: path.into(),
            tree: Ok(tree),
            cancellation: None,
        }
    }

    /// A file the parser could not handle.
    #[must_use]
    pub fn failed(path: impl Into<String>, failure: ParseFailure) -> Self {
        Self {
            path: path.into(),
            tree: Err(failure),
            cancellation: None,
        }
    }

    /// Attaches a cancellation flag to this file only.
    ///
    /// Cancelling it turns this file's walk into [`FileFailure::Cancelled`];
    /// other files of the run are not affected.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }
}

/// Builder for a [`Checker`].
#[derive(Debug, Default)]
pub struct CheckerBuilder {
    checks: Vec<CheckDescriptor>,
    filters: FilterSet,
    engine: QueryEngine,
    parallel: bool,
    jobs: usize,
}

impl CheckerBuilder {
    /// Creates a builder with no checks and no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check. Registration order is dispatch order.
    #[must_use]
    pub fn check(mut self, descriptor: CheckDescriptor) -> Self {
        self.checks.push(descriptor);
        self
    }

    /// Registers several checks, in order.
    #[must_use]
    pub fn checks(mut self, descriptors: impl IntoIterator<Item = CheckDescriptor>) -> Self {
        self.checks.extend(descriptors);
        self
    }

    /// Appends a filter element.
    #[must_use]
    pub fn filter(mut self, element: impl Into<FilterElement>) -> Self {
        self.filters.push(element);
        self
    }

    /// Replaces the filter set.
    #[must_use]
    pub fn filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the run's query engine.
    #[must_use]
    pub fn engine(mut self, engine: QueryEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Processes files on a rayon pool (default: false).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Worker count for parallel runs; 0 uses rayon's default.
    #[must_use]
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Registers the checks and builds the checker.
    ///
    /// # Errors
    ///
    /// Returns an error if any check's kind sets are inconsistent.
    pub fn build(self) -> Result<Checker, RegistrationError> {
        let walker = TreeWalker::new(self.checks)?;
        info!(
            checks = walker.descriptors().len(),
            filters = self.filters.len(),
            parallel = self.parallel,
            "Checker configured"
        );
        Ok(Checker {
            walker,
            filters: self.filters,
            engine: self.engine,
            parallel: self.parallel,
            jobs: self.jobs,
        })
    }
}

/// Runs registered checks over files and filters what they report.
///
/// Use [`Checker::builder()`] to construct an instance.
#[derive(Debug)]
pub struct Checker {
    walker: TreeWalker,
    filters: FilterSet,
    engine: QueryEngine,
    parallel: bool,
    jobs: usize,
}

impl Checker {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> CheckerBuilder {
        CheckerBuilder::new()
    }

    /// The tree walker.
    #[must_use]
    pub fn walker(&self) -> &TreeWalker {
        &self.walker
    }

    /// The filter set.
    #[must_use]
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// The run's query engine.
    #[must_use]
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Number of registered checks.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.walker.descriptors().len()
    }

    /// Whether files are processed in parallel.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Checks every unit. Reports are in input order regardless of mode.
    #[must_use]
    pub fn run(&self, units: &[SourceUnit]) -> AuditReport {
        info!(files = units.len(), parallel = self.parallel, "Starting check run");

        let files: Vec<FileReport> = if self.parallel {
            self.run_parallel(units)
        } else {
            let mut session = self.walker.session();
            units
                .iter()
                .map(|unit| self.check_unit(&mut session, unit))
                .collect()
        };

        let report = AuditReport { files };
        let (errors, warnings, infos) = report.count_by_severity();
        info!(
            files = report.files_checked(),
            errors,
            warnings,
            infos,
            suppressed = report.suppressed(),
            failures = report.failures().count(),
            "Check run finished"
        );
        report
    }

    fn run_parallel(&self, units: &[SourceUnit]) -> Vec<FileReport> {
        let work = || -> Vec<FileReport> {
            units
                .par_iter()
                .map_init(|| self.walker.session(), |session, unit| self.check_unit(session, unit))
                .collect()
        };
        if self.jobs == 0 {
            return work();
        }
        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool.install(work),
            Err(e) => {
                warn!("Could not build a {}-thread pool, using the global pool: {e}", self.jobs);
                work()
            }
        }
    }

    /// Checks one file with a throwaway session.
    #[must_use]
    pub fn check_file(&self, unit: &SourceUnit) -> FileReport {
        self.check_unit(&mut self.walker.session(), unit)
    }

    fn check_unit(&self, session: &mut WalkSession, unit: &SourceUnit) -> FileReport {
        let tree = match &unit.tree {
            Ok(tree) => tree,
            Err(failure) => {
                warn!("Failed to parse {}: {}", unit.path, failure);
                return FileReport::failed(&unit.path, FileFailure::Parse(failure.clone()));
            }
        };

        let violations = match session.walk_with(&unit.path, tree, unit.cancellation.as_ref()) {
            Ok(violations) => violations,
            Err(failure) => {
                warn!("Failed to check {}: {}", unit.path, failure);
                return FileReport::failed(&unit.path, failure);
            }
        };

        let total = violations.len();
        let filters = self.filters.bind(Some(tree));
        let accepted: Vec<_> = violations.into_iter().filter(|v| filters.accept(v)).collect();
        let suppressed = total - accepted.len();
        if suppressed > 0 {
            debug!(file = %unit.path, suppressed, "Suppressed violations");
        }
        FileReport::completed(&unit.path, accepted, suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeBuilder;
    use crate::check::{Check, CheckError, CheckResult};
    use crate::context::CheckContext;
    use crate::filter::{CriteriaSpec, RangeElement, RangeTarget, SuppressElement};
    use crate::kind::{KindSet, SyntaxKind};
    use crate::types::Severity;
    use crate::ast::SyntaxNode;
    use std::sync::Arc;

    /// Reports every `LITERAL_NEW`; fails on `new Boom()`.
    #[derive(Default)]
    struct NoNew;

    impl Check for NoNew {
        fn name(&self) -> &'static str {
            "no-new"
        }

        fn acceptable_kinds(&self) -> KindSet {
            KindSet::of(&[SyntaxKind::LiteralNew])
        }

        fn enter_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
            let class = node
                .first_child_of_kind(SyntaxKind::Ident)
                .map_or("", |n| n.text());
            if class == "Boom" {
                return Err(CheckError::other("cannot instantiate Boom"));
            }
            ctx.log(node, format!("avoid `new {class}`"));
            Ok(())
        }
    }

    fn unit(path: &str, classes: &[&str]) -> SourceUnit {
        let mut b = TreeBuilder::new();
        b.start(SyntaxKind::CompilationUnit, "", 1, 0);
        for (i, class) in classes.iter().enumerate() {
            b.start(SyntaxKind::LiteralNew, "new", i + 1, 8);
            b.leaf(SyntaxKind::Ident, class, i + 1, 12);
            b.finish();
        }
        b.finish();
        SourceUnit::parsed(path, b.build().unwrap())
    }

    fn checker(parallel: bool) -> Checker {
        Checker::builder()
            .check(CheckDescriptor::of::<NoNew>().with_severity(Severity::Warning))
            .parallel(parallel)
            .build()
            .unwrap()
    }

    #[test]
    fn failure_is_isolated_to_its_file() {
        let units = vec![
            unit("A.java", &["Foo", "Boom"]),
            unit("B.java", &["Bar"]),
            SourceUnit::failed("C.java", ParseFailure::new("unexpected token")),
        ];
        let report = checker(false).run(&units);

        assert_eq!(report.files_checked(), 3);
        assert!(report.files[0].is_failed());
        assert!(report.files[0].violations.is_empty());
        assert_eq!(report.files[1].violations.len(), 1);
        assert_eq!(report.files[1].violations[0].message(), "avoid `new Bar`");
        assert!(matches!(report.files[2].failure, Some(FileFailure::Parse(_))));
        assert!(report.has_failures());
    }

    #[test]
    fn parallel_run_keeps_input_order() {
        let units: Vec<_> = (0..32)
            .map(|i| unit(&format!("F{i}.java"), &["A"; 3][..(i % 3) + 1]))
            .collect();
        let sequential = checker(false).run(&units);
        let parallel = checker(true).run(&units);

        let names = |r: &AuditReport| r.files.iter().map(|f| f.file.clone()).collect::<Vec<_>>();
        assert_eq!(names(&sequential), names(&parallel));
        let formatted = |r: &AuditReport| r.violations().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(formatted(&sequential), formatted(&parallel));
    }

    #[test]
    fn filters_are_applied_and_counted() {
        let checker = Checker::builder()
            .check(CheckDescriptor::of::<NoNew>())
            .filter(RangeElement::new(RangeTarget::Line, 1, 2).unwrap())
            .filter(
                SuppressElement::new(&CriteriaSpec {
                    message: Some("Bar".into()),
                    ..CriteriaSpec::default()
                })
                .unwrap(),
            )
            .build()
            .unwrap();

        let report = checker.run(&[unit("A.java", &["Foo", "Bar", "Baz"])]);
        let kept: Vec<_> = report.violations().map(|v| v.message().to_string()).collect();
        assert_eq!(kept, vec!["avoid `new Foo`"]);
        assert_eq!(report.suppressed(), 2);
    }

    /// Reports every `LITERAL_NEW` and cancels `stop` on `new Stop()`.
    struct StopOnStop {
        stop: Cancellation,
    }

    impl Check for StopOnStop {
        fn name(&self) -> &'static str {
            "stop-on-stop"
        }

        fn acceptable_kinds(&self) -> KindSet {
            KindSet::of(&[SyntaxKind::LiteralNew])
        }

        fn enter_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
            if node.first_child_of_kind(SyntaxKind::Ident).is_some_and(|n| n.text() == "Stop") {
                self.stop.cancel();
            }
            ctx.log(node, "seen");
            Ok(())
        }
    }

    fn cancelling_checker(stop: &Cancellation, parallel: bool) -> Checker {
        let stop = stop.clone();
        Checker::builder()
            .check(CheckDescriptor::new(Arc::new(move || -> Box<dyn Check> {
                Box::new(StopOnStop { stop: stop.clone() })
            })))
            .parallel(parallel)
            .build()
            .unwrap()
    }

    #[test]
    fn cancellation_is_scoped_to_its_file() {
        for parallel in [false, true] {
            let stop = Cancellation::new();
            let units = vec![
                unit("A.java", &["Stop", "Foo"]).with_cancellation(stop.clone()),
                unit("B.java", &["Bar", "Baz"]),
                unit("C.java", &["Qux"]).with_cancellation(Cancellation::new()),
            ];
            let report = cancelling_checker(&stop, parallel).run(&units);

            assert_eq!(report.files[0].failure, Some(FileFailure::Cancelled), "parallel={parallel}");
            assert!(report.files[0].violations.is_empty());
            assert_eq!(report.files[1].failure, None, "parallel={parallel}");
            assert_eq!(report.files[1].violations.len(), 2);
            assert_eq!(report.files[2].failure, None, "parallel={parallel}");
            assert_eq!(report.files[2].violations.len(), 1);
        }
    }

    #[test]
    fn cancelled_before_the_walk() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let report = checker(false).run(&[
            unit("A.java", &["Foo"]).with_cancellation(cancel),
            unit("B.java", &["Bar"]),
        ]);
        assert_eq!(report.files[0].failure, Some(FileFailure::Cancelled));
        assert_eq!(report.files[1].violations.len(), 1);
    }
}
