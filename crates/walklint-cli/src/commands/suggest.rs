//! Suggest command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;
use walklint_core::{QueryEngine, SyntaxKind, SyntaxTree};
use walklint_rules::builtin_registry;

use crate::config_resolver::{self, ConfigSource};

/// Runs the suggest command.
pub fn run(
    file: &Path,
    line: usize,
    column: usize,
    kind: Option<&str>,
    source: &ConfigSource,
) -> Result<()> {
    let config = config_resolver::read(source)?;
    let engine = config_resolver::assemble(&config, &builtin_registry())?.engine;

    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let tree = SyntaxTree::from_interchange(&json)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let queries = suggest(&engine, &tree, line, column, kind)?;
    if queries.is_empty() {
        bail!("No node starts at {line}:{column} in {}", file.display());
    }
    for query in queries {
        println!("{query}");
    }
    Ok(())
}

/// Queries selecting the nodes at `line`/`column` (both 1-based).
fn suggest(
    engine: &QueryEngine,
    tree: &SyntaxTree,
    line: usize,
    column: usize,
    kind: Option<&str>,
) -> Result<Vec<String>> {
    let Some(column) = column.checked_sub(1) else {
        bail!("Columns start at 1");
    };
    let kind = kind
        .map(str::parse::<SyntaxKind>)
        .transpose()
        .context("Invalid --kind")?;
    Ok(engine.generate(tree, line, column, kind))
}
