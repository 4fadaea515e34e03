//! Test helpers shared by the check modules.

use walklint_core::{CheckDescriptor, SyntaxKind, SyntaxTree, TreeBuilder, TreeWalker};

/// Builds a tree from an outline with one node per line:
///
/// ```text
/// COMPILATION_UNIT 1:0
///   CLASS_DEF 1:0
///     IDENT 1:6 Foo
/// ```
///
/// Children are indented two spaces deeper than their parent. The text after
/// the position is optional.
pub(crate) fn tree(outline: &str) -> SyntaxTree {
    let lines: Vec<&str> = outline.lines().filter(|l| !l.trim().is_empty()).collect();
    let base = lines
        .iter()
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut builder = TreeBuilder::new();
    let mut open = 0;
    for line in lines {
        let depth = (line.len() - line.trim_start().len() - base) / 2;
        while open > depth {
            builder.finish();
            open -= 1;
        }

        let mut parts = line.trim().splitn(3, ' ');
        let kind: SyntaxKind = parts.next().unwrap().parse().unwrap();
        let (row, column) = parts.next().unwrap().split_once(':').unwrap();
        let text = parts.next().unwrap_or("");
        builder.start(kind, text, row.parse().unwrap(), column.parse().unwrap());
        open += 1;
    }
    for _ in 0..open {
        builder.finish();
    }
    builder.build().unwrap()
}

/// Walks `tree` with a single check and renders each violation as
/// `line:column: message` (1-based column).
pub(crate) fn run(descriptor: CheckDescriptor, tree: &SyntaxTree) -> Vec<String> {
    let walker = TreeWalker::new(vec![descriptor]).unwrap();
    walker
        .walk("Test.java", tree)
        .unwrap()
        .iter()
        .map(|v| {
            format!(
                "{}:{}: {}",
                v.line(),
                v.location().display_column(),
                v.message()
            )
        })
        .collect()
}
