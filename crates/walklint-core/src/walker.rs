//! Depth-first tree walker.
//!
//! [`TreeWalker`] holds the immutable, shareable part of a run: the ordered
//! check descriptors and their [`DispatchTable`]. A [`WalkSession`] owns one
//! live instance of every check and walks one file at a time. Concurrent
//! callers create one session per thread.
//!
//! For every node the interested checks are entered in registration order,
//! the children are walked in order, and the same checks are left in reverse
//! order.

use crate::ast::{NodeId, ParseFailure, SyntaxNode, SyntaxTree};
use crate::check::{Check, CheckDescriptor, CheckResult};
use crate::context::CheckContext;
use crate::dispatch::{register, DispatchTable, RegistrationError};
use crate::types::Violation;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// The callback during which a check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// [`Check::begin_file`].
    BeginFile,
    /// [`Check::enter_node`].
    EnterNode,
    /// [`Check::leave_node`].
    LeaveNode,
    /// [`Check::end_file`].
    EndFile,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeginFile => "begin-file",
            Self::EnterNode => "enter-node",
            Self::LeaveNode => "leave-node",
            Self::EndFile => "end-file",
        })
    }
}

/// Why a file could not be processed.
///
/// File failures are distinct from violations: the file's partial results are
/// discarded and other files are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FileFailure {
    /// A check callback returned an error.
    #[error("check `{check}` failed in {phase}{}: {message}", at(.line, .column))]
    Check {
        /// Identity of the failing check.
        check: String,
        /// Callback phase.
        phase: Phase,
        /// Line of the node being visited, if any.
        line: Option<usize>,
        /// Column of the node being visited, if any.
        column: Option<usize>,
        /// Error message.
        message: String,
    },

    /// A check callback panicked.
    #[error("check `{check}` panicked in {phase}{}: {message}", at(.line, .column))]
    Panicked {
        /// Identity of the failing check.
        check: String,
        /// Callback phase.
        phase: Phase,
        /// Line of the node being visited, if any.
        line: Option<usize>,
        /// Column of the node being visited, if any.
        column: Option<usize>,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The parser reported a failure instead of a tree.
    #[error("parse failure: {0}")]
    Parse(ParseFailure),

    /// The walk was cancelled.
    #[error("walk cancelled")]
    Cancelled,
}

fn at(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at {line}:{}", column + 1),
        _ => String::new(),
    }
}

/// Shared cancellation flag, polled at every visited node.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every walk polling this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Walk state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// No file walked yet, or ready for the next file.
    NotStarted,
    /// A file is being walked.
    Walking,
    /// The last file was walked to completion.
    Finished,
}

/// Immutable walk configuration, cheap to clone and share across threads.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    descriptors: Arc<[CheckDescriptor]>,
    table: Arc<DispatchTable>,
}

impl TreeWalker {
    /// Registers the checks and builds the dispatch table.
    ///
    /// # Errors
    ///
    /// Returns an error if any check's kind sets are inconsistent.
    pub fn new(descriptors: Vec<CheckDescriptor>) -> Result<Self, RegistrationError> {
        let table = register(&descriptors)?;
        Ok(Self {
            descriptors: descriptors.into(),
            table: Arc::new(table),
        })
    }

    /// Registered checks, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[CheckDescriptor] {
        &self.descriptors
    }

    /// The dispatch table.
    #[must_use]
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Creates a session with fresh check instances.
    #[must_use]
    pub fn session(&self) -> WalkSession {
        debug!(checks = self.descriptors.len(), "Creating walk session");
        WalkSession {
            walker: self.clone(),
            checks: self.instantiate(),
            state: WalkState::NotStarted,
        }
    }

    /// Walks one file with a throwaway session.
    ///
    /// # Errors
    ///
    /// Returns a [`FileFailure`] if any check callback fails.
    pub fn walk(&self, file: &str, tree: &SyntaxTree) -> Result<Vec<Violation>, FileFailure> {
        self.session().walk(file, tree)
    }

    fn instantiate(&self) -> Vec<Box<dyn Check>> {
        self.descriptors.iter().map(CheckDescriptor::instantiate).collect()
    }
}

/// One live set of check instances, walking one file at a time.
pub struct WalkSession {
    walker: TreeWalker,
    checks: Vec<Box<dyn Check>>,
    state: WalkState,
}

impl fmt::Debug for WalkSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkSession")
            .field("checks", &self.checks.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

impl WalkSession {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Walks one file.
    ///
    /// # Errors
    ///
    /// Returns a [`FileFailure`] if any check callback fails.
    pub fn walk(&mut self, file: &str, tree: &SyntaxTree) -> Result<Vec<Violation>, FileFailure> {
        self.walk_with(file, tree, None)
    }

    /// Walks one file, polling `cancel` at every node.
    ///
    /// # Errors
    ///
    /// Returns a [`FileFailure`] if any check callback fails or the walk is
    /// cancelled.
    pub fn walk_with(
        &mut self,
        file: &str,
        tree: &SyntaxTree,
        cancel: Option<&Cancellation>,
    ) -> Result<Vec<Violation>, FileFailure> {
        debug!(file, nodes = tree.len(), "Walking file");
        self.state = WalkState::Walking;

        let result = self.run(file, tree, cancel);
        match &result {
            Ok(violations) => {
                self.state = WalkState::Finished;
                debug!(file, violations = violations.len(), "Finished file");
            }
            Err(failure) => {
                self.state = WalkState::NotStarted;
                if matches!(failure, FileFailure::Panicked { .. }) {
                    self.checks = self.walker.instantiate();
                }
            }
        }
        result
    }

    fn run(
        &mut self,
        file: &str,
        tree: &SyntaxTree,
        cancel: Option<&Cancellation>,
    ) -> Result<Vec<Violation>, FileFailure> {
        let mut violations = Vec::new();
        let descriptors = &self.walker.descriptors;
        let table = &self.walker.table;
        let checks = &mut self.checks;

        for (descriptor, check) in descriptors.iter().zip(checks.iter_mut()) {
            let mut ctx = CheckContext::new(file, tree, descriptor, &mut violations);
            invoke(descriptor, Phase::BeginFile, None, || check.begin_file(&mut ctx))?;
        }

        let mut stack = vec![Step::Enter(NodeId::ROOT)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    if cancel.is_some_and(Cancellation::is_cancelled) {
                        return Err(FileFailure::Cancelled);
                    }
                    let Some(node) = tree.node(id) else { continue };
                    for &index in table.interested(node.kind()) {
                        let descriptor = &descriptors[index];
                        let check = &mut checks[index];
                        let mut ctx = CheckContext::new(file, tree, descriptor, &mut violations);
                        invoke(descriptor, Phase::EnterNode, Some(node), || {
                            check.enter_node(node, &mut ctx)
                        })?;
                    }
                    stack.push(Step::Leave(id));
                    stack.extend(node.children().rev().map(|child| Step::Enter(child.id())));
                }
                Step::Leave(id) => {
                    let Some(node) = tree.node(id) else { continue };
                    for &index in table.interested(node.kind()).iter().rev() {
                        let descriptor = &descriptors[index];
                        let check = &mut checks[index];
                        let mut ctx = CheckContext::new(file, tree, descriptor, &mut violations);
                        invoke(descriptor, Phase::LeaveNode, Some(node), || {
                            check.leave_node(node, &mut ctx)
                        })?;
                    }
                }
            }
        }

        for (descriptor, check) in descriptors.iter().zip(checks.iter_mut()) {
            let mut ctx = CheckContext::new(file, tree, descriptor, &mut violations);
            invoke(descriptor, Phase::EndFile, None, || check.end_file(&mut ctx))?;
        }

        Ok(violations)
    }
}

fn invoke(
    descriptor: &CheckDescriptor,
    phase: Phase,
    node: Option<SyntaxNode<'_>>,
    callback: impl FnOnce() -> CheckResult,
) -> Result<(), FileFailure> {
    let line = node.map(SyntaxNode::line);
    let column = node.map(SyntaxNode::column);
    let check = || descriptor.identity().to_string();

    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(FileFailure::Check {
            check: check(),
            phase,
            line,
            column,
            message: error.to_string(),
        }),
        Err(payload) => Err(FileFailure::Panicked {
            check: check(),
            phase,
            line,
            column,
            message: payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeBuilder;
    use crate::check::CheckError;
    use crate::kind::{KindSet, SyntaxKind};
    use std::sync::Mutex;
    use SyntaxKind::*;

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records every callback into a shared journal.
    struct Recorder {
        tag: &'static str,
        kinds: KindSet,
        journal: Journal,
    }

    impl Check for Recorder {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn acceptable_kinds(&self) -> KindSet {
            self.kinds
        }

        fn begin_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
            self.journal.lock().unwrap().push(format!("{}:begin", self.tag));
            Ok(())
        }

        fn enter_node(&mut self, node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:enter:{}", self.tag, node.text()));
            Ok(())
        }

        fn leave_node(&mut self, node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:leave:{}", self.tag, node.text()));
            Ok(())
        }

        fn end_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
            self.journal.lock().unwrap().push(format!("{}:end", self.tag));
            Ok(())
        }
    }

    fn recorder(tag: &'static str, kinds: KindSet, journal: &Journal) -> CheckDescriptor {
        let journal = Arc::clone(journal);
        CheckDescriptor::new(Arc::new(move || -> Box<dyn Check> {
            Box::new(Recorder {
                tag,
                kinds,
                journal: Arc::clone(&journal),
            })
        }))
    }

    /// Reports every `LITERAL_NEW` and fails on an `IDENT` named `boom`.
    #[derive(Default)]
    struct Fussy {
        seen: usize,
    }

    impl Check for Fussy {
        fn name(&self) -> &'static str {
            "fussy"
        }

        fn acceptable_kinds(&self) -> KindSet {
            KindSet::of(&[LiteralNew, Ident])
        }

        fn begin_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
            self.seen = 0;
            Ok(())
        }

        fn enter_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
            match (node.kind(), node.text()) {
                (Ident, "boom") => Err(CheckError::other("cannot handle boom")),
                (Ident, "panic") => panic!("panicking on purpose"),
                (LiteralNew, _) => {
                    self.seen += 1;
                    ctx.log(node, format!("new #{}", self.seen));
                    Ok(())
                }
                _ => Ok(()),
            }
        }
    }

    /// ```text
    /// COMPILATION_UNIT "cu"
    ///   CLASS_DEF "a"
    ///     LITERAL_NEW "b"
    ///       IDENT <ident>
    ///     LITERAL_NEW "c"
    /// ```
    fn sample(ident: &str) -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "cu", 1, 0);
        b.start(ClassDef, "a", 1, 0);
        b.start(LiteralNew, "b", 2, 4);
        b.leaf(Ident, ident, 2, 8);
        b.finish();
        b.leaf(LiteralNew, "c", 3, 4);
        b.finish();
        b.finish();
        b.build().unwrap()
    }

    #[test]
    fn enters_in_order_and_leaves_in_reverse() {
        let journal = Journal::default();
        let all = KindSet::of(&[CompilationUnit, ClassDef, LiteralNew]);
        let walker = TreeWalker::new(vec![
            recorder("x", all, &journal),
            recorder("y", KindSet::of(&[ClassDef]), &journal),
        ])
        .unwrap();

        walker.walk("A.java", &sample("id")).unwrap();

        let journal = journal.lock().unwrap().clone();
        assert_eq!(
            journal,
            [
                "x:begin", "y:begin",
                "x:enter:cu",
                "x:enter:a", "y:enter:a",
                "x:enter:b", "x:leave:b",
                "x:enter:c", "x:leave:c",
                "y:leave:a", "x:leave:a",
                "x:leave:cu",
                "x:end", "y:end",
            ]
        );
    }

    #[test]
    fn only_interested_kinds_are_dispatched() {
        let journal = Journal::default();
        let walker =
            TreeWalker::new(vec![recorder("n", KindSet::of(&[LiteralNew]), &journal)]).unwrap();

        walker.walk("A.java", &sample("id")).unwrap();

        let enters = journal
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with("n:enter"))
            .count();
        assert_eq!(enters, 2);
    }

    #[test]
    fn session_resets_between_files() {
        let walker = TreeWalker::new(vec![CheckDescriptor::of::<Fussy>()]).unwrap();
        let mut session = walker.session();
        assert_eq!(session.state(), WalkState::NotStarted);

        let first = session.walk("A.java", &sample("id")).unwrap();
        let second = session.walk("B.java", &sample("id")).unwrap();

        assert_eq!(session.state(), WalkState::Finished);
        assert_eq!(first.len(), 2);
        let messages: Vec<_> = second.iter().map(Violation::message).collect();
        assert_eq!(messages, ["new #1", "new #2"]);
        assert_eq!(second[0].file(), "B.java");
    }

    #[test]
    fn check_error_becomes_file_failure() {
        let walker = TreeWalker::new(vec![CheckDescriptor::of::<Fussy>().with_module_id("f1")]).unwrap();
        let mut session = walker.session();

        let failure = session.walk("A.java", &sample("boom")).unwrap_err();
        assert_eq!(
            failure,
            FileFailure::Check {
                check: "f1".to_string(),
                phase: Phase::EnterNode,
                line: Some(2),
                column: Some(8),
                message: "cannot handle boom".to_string(),
            }
        );
        assert_eq!(
            failure.to_string(),
            "check `f1` failed in enter-node at 2:9: cannot handle boom"
        );
        assert_eq!(session.state(), WalkState::NotStarted);

        let next = session.walk("B.java", &sample("id")).unwrap();
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn panic_is_contained() {
        let walker = TreeWalker::new(vec![CheckDescriptor::of::<Fussy>()]).unwrap();
        let mut session = walker.session();

        let failure = session.walk("A.java", &sample("panic")).unwrap_err();
        assert!(matches!(
            failure,
            FileFailure::Panicked { ref check, ref message, .. }
                if check == "fussy" && message == "panicking on purpose"
        ));

        assert_eq!(session.walk("B.java", &sample("id")).unwrap().len(), 2);
    }

    #[test]
    fn cancellation_aborts_walk() {
        let walker = TreeWalker::new(vec![CheckDescriptor::of::<Fussy>()]).unwrap();
        let cancel = Cancellation::new();
        cancel.cancel();

        let failure = walker
            .session()
            .walk_with("A.java", &sample("id"), Some(&cancel))
            .unwrap_err();
        assert_eq!(failure, FileFailure::Cancelled);
    }

    #[test]
    fn deep_trees_do_not_overflow() {
        let mut b = TreeBuilder::new();
        b.start(CompilationUnit, "", 1, 0);
        for _ in 0..100_000 {
            b.start(LiteralNew, "n", 1, 0);
        }
        for _ in 0..=100_000 {
            b.finish();
        }
        let tree = b.build().unwrap();

        let walker = TreeWalker::new(vec![CheckDescriptor::of::<Fussy>()]).unwrap();
        assert_eq!(walker.walk("Deep.java", &tree).unwrap().len(), 100_000);
    }
}
