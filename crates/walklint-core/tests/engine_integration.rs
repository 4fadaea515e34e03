//! Integration test: tree → walker → filters → report, through the public API.
//!
//! Uses the fixture tree under `tests/fixtures/` (a small Java-like file in
//! the JSON interchange format).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use walklint_core::filter::{CriteriaSpec, RangeElement, RangeTarget, StructuralElement};
use walklint_core::{
    load, Check, CheckContext, CheckDescriptor, CheckError, CheckRegistry, CheckResult, Checker,
    Config, FileFailure, KindSet, ParseFailure, QueryEngine, SourceUnit, SyntaxKind, SyntaxNode,
    SyntaxTree, TreeBuilder, TreeWalker,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn sample_tree() -> SyntaxTree {
    let json = std::fs::read_to_string(fixture("Sample.ast.json")).expect("fixture should exist");
    SyntaxTree::from_interchange(&json).expect("fixture should be a tree")
}

type Journal = Arc<Mutex<Vec<String>>>;

/// Records enter/leave calls as `tag>KIND@line` / `tag<KIND@line`.
struct Tracer {
    tag: &'static str,
    kinds: KindSet,
    journal: Journal,
}

impl Check for Tracer {
    fn name(&self) -> &'static str {
        self.tag
    }

    fn acceptable_kinds(&self) -> KindSet {
        self.kinds
    }

    fn enter_node(&mut self, node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        let entry = format!("{}>{}@{}", self.tag, node.kind(), node.line());
        self.journal.lock().unwrap().push(entry);
        Ok(())
    }

    fn leave_node(&mut self, node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        let entry = format!("{}<{}@{}", self.tag, node.kind(), node.line());
        self.journal.lock().unwrap().push(entry);
        Ok(())
    }
}

fn tracer(tag: &'static str, kinds: KindSet, journal: &Journal) -> CheckDescriptor {
    let journal = Arc::clone(journal);
    CheckDescriptor::new(Arc::new(move || -> Box<dyn Check> {
        Box::new(Tracer {
            tag,
            kinds,
            journal: Arc::clone(&journal),
        })
    }))
}

/// Reports every identifier; fails on one named `explode`.
#[derive(Default)]
struct Names;

impl Check for Names {
    fn name(&self) -> &'static str {
        "names"
    }

    fn acceptable_kinds(&self) -> KindSet {
        KindSet::of(&[SyntaxKind::Ident])
    }

    fn enter_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
        if node.text() == "explode" {
            return Err(CheckError::other("refusing to look at `explode`"));
        }
        ctx.log(node, format!("Name '{}' is reported.", node.text()));
        Ok(())
    }
}

fn names_checker() -> Checker {
    Checker::builder()
        .check(CheckDescriptor::of::<Names>())
        .build()
        .expect("checker should build")
}

// ── Walk ordering ──

#[test]
fn walk_is_deterministic() {
    let tree = sample_tree();
    let checker = names_checker();
    let first = checker.run(&[SourceUnit::parsed("Sample.java", tree.clone())]);
    let second = checker.run(&[SourceUnit::parsed("Sample.java", tree)]);

    let render = |r: &walklint_core::AuditReport| {
        r.violations().map(ToString::to_string).collect::<Vec<_>>()
    };
    assert!(!render(&first).is_empty());
    assert_eq!(render(&first), render(&second));
}

#[test]
fn every_interested_node_is_entered_and_left_once() {
    let tree = sample_tree();
    let journal = Journal::default();
    let kinds = KindSet::of(&[SyntaxKind::MethodDef, SyntaxKind::Ident]);
    let walker = TreeWalker::new(vec![tracer("t", kinds, &journal)]).unwrap();
    walker.walk("Sample.java", &tree).unwrap();

    let journal = journal.lock().unwrap();
    let interesting = tree.nodes().filter(|n| kinds.contains(n.kind())).count();
    let enters = journal.iter().filter(|e| e.starts_with("t>")).count();
    let leaves = journal.iter().filter(|e| e.starts_with("t<")).count();
    assert_eq!(enters, interesting);
    assert_eq!(leaves, interesting);
    assert!(journal
        .iter()
        .all(|e| e.contains("METHOD_DEF") || e.contains("IDENT")));
}

#[test]
fn ancestors_enclose_descendants() {
    let tree = sample_tree();
    let journal = Journal::default();
    let kinds = KindSet::of(&[SyntaxKind::ClassDef, SyntaxKind::MethodDef]);
    let walker = TreeWalker::new(vec![tracer("t", kinds, &journal)]).unwrap();
    walker.walk("Sample.java", &tree).unwrap();

    let journal = journal.lock().unwrap();
    let position = |entry: &str| journal.iter().position(|e| e == entry).unwrap();
    let class_enter = position("t>CLASS_DEF@3");
    let class_leave = position("t<CLASS_DEF@3");
    for method_line in [4, 9] {
        assert!(class_enter < position(&format!("t>METHOD_DEF@{method_line}")));
        assert!(position(&format!("t<METHOD_DEF@{method_line}")) < class_leave);
    }
}

#[test]
fn leave_runs_in_reverse_registration_order() {
    let tree = sample_tree();
    let journal = Journal::default();
    let kinds = KindSet::of(&[SyntaxKind::ClassDef]);
    let walker = TreeWalker::new(vec![
        tracer("a", kinds, &journal),
        tracer("b", kinds, &journal),
    ])
    .unwrap();
    walker.walk("Sample.java", &tree).unwrap();

    assert_eq!(
        *journal.lock().unwrap(),
        vec!["a>CLASS_DEF@3", "b>CLASS_DEF@3", "b<CLASS_DEF@3", "a<CLASS_DEF@3"]
    );
}

#[test]
fn only_literal_new_nodes_reach_a_literal_new_check() {
    let mut b = TreeBuilder::new();
    b.start(SyntaxKind::CompilationUnit, "", 1, 0);
    b.start(SyntaxKind::LiteralNew, "new", 2, 4);
    b.leaf(SyntaxKind::Ident, "Foo", 2, 8);
    b.finish();
    b.leaf(SyntaxKind::Semi, ";", 2, 13);
    b.start(SyntaxKind::LiteralNew, "new", 3, 4);
    b.leaf(SyntaxKind::Ident, "Bar", 3, 8);
    b.finish();
    b.finish();
    let tree = b.build().unwrap();

    let journal = Journal::default();
    let walker = TreeWalker::new(vec![tracer(
        "n",
        KindSet::of(&[SyntaxKind::LiteralNew]),
        &journal,
    )])
    .unwrap();
    walker.walk("A.java", &tree).unwrap();

    let journal = journal.lock().unwrap();
    let enters: Vec<_> = journal.iter().filter(|e| e.starts_with("n>")).collect();
    assert_eq!(enters, vec!["n>LITERAL_NEW@2", "n>LITERAL_NEW@3"]);
}

// ── Failure isolation ──

#[test]
fn failing_file_does_not_affect_later_files() {
    let mut b = TreeBuilder::new();
    b.start(SyntaxKind::CompilationUnit, "", 1, 0);
    b.leaf(SyntaxKind::Ident, "fine", 1, 0);
    b.leaf(SyntaxKind::Ident, "explode", 2, 0);
    b.finish();
    let bad = b.build().unwrap();

    let units = vec![
        SourceUnit::parsed("A.java", bad),
        SourceUnit::failed("Broken.java", ParseFailure::new("unexpected `}`")),
        SourceUnit::parsed("B.java", sample_tree()),
    ];
    let report = names_checker().run(&units);

    let failure = report.files[0].failure.as_ref().unwrap();
    assert!(matches!(failure, FileFailure::Check { check, .. } if check == "names"));
    assert_eq!(
        failure.to_string(),
        "check `names` failed in enter-node at 2:1: refusing to look at `explode`"
    );
    assert!(report.files[0].violations.is_empty());
    assert!(matches!(report.files[1].failure, Some(FileFailure::Parse(_))));
    assert!(!report.files[2].violations.is_empty());
    assert!(report.files[2].failure.is_none());
}

// ── Filters ──

#[test]
fn range_filter_keeps_inclusive_bounds() {
    let mut b = TreeBuilder::new();
    b.start(SyntaxKind::CompilationUnit, "", 1, 0);
    for line in [9, 10, 15, 20, 21] {
        b.leaf(SyntaxKind::Ident, &format!("v{line}"), line, 0);
    }
    b.finish();
    let tree = b.build().unwrap();

    let checker = Checker::builder()
        .check(CheckDescriptor::of::<Names>())
        .filter(RangeElement::new(RangeTarget::Line, 10, 20).unwrap())
        .build()
        .unwrap();
    let report = checker.run(&[SourceUnit::parsed("A.java", tree)]);
    let lines: Vec<_> = report.violations().map(walklint_core::Violation::line).collect();
    assert_eq!(lines, vec![10, 15, 20]);
    assert_eq!(report.suppressed(), 2);
}

#[test]
fn structural_filter_matches_by_position_not_identity() {
    let tree = sample_tree();
    let engine = QueryEngine::default();
    let element = StructuralElement::new(
        &CriteriaSpec::default(),
        Some("//METHOD_DEF/IDENT[@text='main']"),
        engine.clone(),
    )
    .unwrap();
    let checker = Checker::builder()
        .check(CheckDescriptor::of::<Names>())
        .filter(element)
        .engine(engine)
        .build()
        .unwrap();

    // A structurally equal tree built independently of the one the query
    // will be evaluated against.
    let copy = SyntaxTree::from_dto(&tree.to_dto()).unwrap();
    let report = checker.run(&[SourceUnit::parsed("Sample.java", copy)]);
    let messages: Vec<_> = report.violations().map(|v| v.message().to_string()).collect();
    assert!(!messages.contains(&"Name 'main' is reported.".to_string()));
    assert!(messages.contains(&"Name 'Sample' is reported.".to_string()));
    assert_eq!(report.suppressed(), 1);
}

#[test]
fn invalid_query_is_a_configuration_error() {
    let config = Config::parse("[[suppress]]\nquery = \"//CLASS_DEF[./IDENT\"\n").unwrap();
    let err = load(&config, &CheckRegistry::new()).unwrap_err();
    assert!(err.to_string().contains("//CLASS_DEF[./IDENT"), "{err}");
}

#[test]
fn configured_run_end_to_end() {
    let mut registry = CheckRegistry::new();
    registry.register_default::<Names>();

    let config = Config::parse(
        &std::fs::read_to_string(fixture("walklint.toml")).expect("fixture config should exist"),
    )
    .unwrap();
    let checker = load(&config, &registry)
        .unwrap()
        .into_builder()
        .build()
        .unwrap();

    let report = checker.run(&[SourceUnit::parsed("Sample.java", sample_tree())]);
    let kept: Vec<_> = report.violations().map(|v| v.message().to_string()).collect();
    insta::assert_debug_snapshot!(kept, @r#"
    [
        "Name 'Sample' is reported.",
        "Name 'args' is reported.",
    ]
    "#);
}
