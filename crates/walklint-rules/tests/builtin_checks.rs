//! Runs the built-in checks through configuration, the way the CLI does.

use walklint_core::{load, Config, SourceUnit, SyntaxKind, SyntaxTree, TreeBuilder};
use walklint_rules::builtin_registry;

/// ```java
/// package app;                           // 1
///                                        // 2
/// class Main {                           // 3
///     int pick(int v) {                  // 4
///         if (v > 0) {                   // 5
///             if (v > 1) {               // 6
///                 if (v > 2) {           // 7
///                     return 3;          // 8
///                 }                      // 9
///                 return 2;              // 10
///             }                          // 11
///         }                              // 12
///         Boolean b = new Boolean(true); // 13
///         return 0;                      // 14
///     }                                  // 15
/// }                                      // 16
/// class Helper {}                        // 17
/// ```
fn sample() -> SyntaxTree {
    let mut b = TreeBuilder::new();
    b.start(SyntaxKind::CompilationUnit, "", 1, 0);

    b.start(SyntaxKind::PackageDef, "package", 1, 0);
    b.leaf(SyntaxKind::Annotations, "", 1, 0);
    b.leaf(SyntaxKind::Ident, "app", 1, 8);
    b.leaf(SyntaxKind::Semi, ";", 1, 11);
    b.finish();

    b.start(SyntaxKind::ClassDef, "", 3, 0);
    b.leaf(SyntaxKind::Ident, "Main", 3, 6);
    b.start(SyntaxKind::ObjBlock, "", 3, 11);
    b.start(SyntaxKind::MethodDef, "", 4, 4);
    b.leaf(SyntaxKind::Ident, "pick", 4, 8);
    b.start(SyntaxKind::Slist, "{", 4, 20);

    b.start(SyntaxKind::LiteralIf, "if", 5, 8);
    b.start(SyntaxKind::Slist, "{", 5, 19);
    b.start(SyntaxKind::LiteralIf, "if", 6, 12);
    b.start(SyntaxKind::Slist, "{", 6, 23);
    b.start(SyntaxKind::LiteralIf, "if", 7, 16);
    b.start(SyntaxKind::Slist, "{", 7, 27);
    return_value(&mut b, 8, 20);
    b.finish();
    b.finish();
    return_value(&mut b, 10, 16);
    b.finish();
    b.finish();
    b.finish();
    b.finish();

    b.start(SyntaxKind::VariableDef, "", 13, 8);
    b.start(SyntaxKind::Assign, "=", 13, 18);
    b.start(SyntaxKind::Expr, "", 13, 20);
    b.start(SyntaxKind::LiteralNew, "new", 13, 20);
    b.leaf(SyntaxKind::Ident, "Boolean", 13, 24);
    b.leaf(SyntaxKind::Lparen, "(", 13, 31);
    b.leaf(SyntaxKind::Rparen, ")", 13, 36);
    b.finish();
    b.finish();
    b.finish();
    b.finish();

    return_value(&mut b, 14, 8);
    b.finish();
    b.finish();
    b.finish();
    b.finish();

    b.start(SyntaxKind::ClassDef, "", 17, 0);
    b.leaf(SyntaxKind::Ident, "Helper", 17, 6);
    b.finish();

    b.finish();
    b.build().unwrap()
}

fn return_value(b: &mut TreeBuilder, line: usize, column: usize) {
    b.start(SyntaxKind::LiteralReturn, "return", line, column);
    b.leaf(SyntaxKind::Expr, "", line, column + 7);
    b.leaf(SyntaxKind::Semi, ";", line, column + 8);
    b.finish();
}

fn run(config: &str) -> Vec<String> {
    let config = Config::parse(config).unwrap();
    let checker = load(&config, &builtin_registry())
        .unwrap()
        .into_builder()
        .build()
        .unwrap();
    let report = checker.run(&[SourceUnit::parsed("app/Main.java", sample())]);
    assert!(!report.has_failures());
    report.violations().map(ToString::to_string).collect()
}

#[test]
fn all_preset_reports_each_check() {
    let violations = run(
        r#"
preset = "all"

[[checks]]
name = "illegal-instantiation"
options = { classes = ["java.lang.Boolean"] }
"#,
    );
    insta::assert_debug_snapshot!(violations, @r#"
    [
        "app/Main.java:7:17: error [nested-if-depth] Nested if-else depth is 2 (max allowed is 1).",
        "app/Main.java:4:5: error [return-count] Return count is 3 (max allowed for non-void methods/lambdas is 2).",
        "app/Main.java:13:21: error [illegal-instantiation] Instantiation of java.lang.Boolean should be avoided.",
        "app/Main.java:1:1: error [outer-type-number] Outer types defined is 2 (max allowed is 1).",
    ]
    "#);
}

#[test]
fn options_and_identity_come_from_configuration() {
    let violations = run(
        r#"
[[checks]]
name = "return-count"
id = "tooManyReturns"
severity = "warning"

[[checks]]
name = "nested-if-depth"
options = { max = 2 }
"#,
    );
    assert_eq!(
        violations,
        vec!["app/Main.java:4:5: warning [tooManyReturns] Return count is 3 (max allowed for non-void methods/lambdas is 2)."]
    );
}

#[test]
fn disabled_preset_entry_is_removed() {
    let violations = run(
        r#"
preset = "recommended"

[[checks]]
name = "return-count"
enabled = false

[[suppress]]
checks = "outer-type-number"
"#,
    );
    assert_eq!(
        violations,
        vec!["app/Main.java:7:17: error [nested-if-depth] Nested if-else depth is 2 (max allowed is 1)."]
    );
}
