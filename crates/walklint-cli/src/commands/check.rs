//! Check command implementation.

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;
use walklint_core::{ParseFailure, SourceUnit, SyntaxTree};
use walklint_rules::builtin_registry;

use crate::config_resolver::{self, ConfigSource, Overrides};
use crate::OutputFormat;

/// Suffix of tree files picked up from directories.
pub const TREE_SUFFIX: &str = ".ast.json";

/// Arguments of the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Files or directories to check.
    pub paths: Vec<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Settings layered over the configuration file.
    pub overrides: Overrides,
}

/// Runs the check command.
pub fn run(options: &CheckOptions, source: &ConfigSource) -> Result<ExitCode> {
    let mut config = config_resolver::read(source)?;
    options.overrides.apply(&mut config);

    let checker = config_resolver::assemble(&config, &builtin_registry())?
        .into_builder()
        .build()
        .map_err(config_resolver::diagnostic)?;

    let files = discover(&options.paths, &config.checker.exclude)?;

    tracing::info!(
        "Checking {} file(s) with {} check(s)",
        files.len(),
        checker.check_count()
    );

    let units: Vec<SourceUnit> = files.iter().map(|path| read_unit(path)).collect();
    let report = checker.run(&units);

    super::output::print(&report, options.format)?;

    if report.has_failures() || report.has_violations_at(config.fail_on()) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Finds tree files under `paths`, in a stable order.
///
/// Files named explicitly are always included; directories contribute the
/// files ending in [`TREE_SUFFIX`] that no exclude pattern matches.
pub fn discover(paths: &[PathBuf], exclude: &[String]) -> Result<Vec<PathBuf>> {
    let patterns = exclude
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid exclude pattern `{p}`")))
        .collect::<Result<Vec<_>>>()?;
    let excluded = |path: &Path| patterns.iter().any(|p| p.matches_path(path));

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            let path = entry.path();
            let is_tree = entry.file_type().is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(TREE_SUFFIX));
            if is_tree && !excluded(path) {
                files.push(path.to_path_buf());
            }
        }
    }
    tracing::debug!("Discovered {} tree file(s)", files.len());
    Ok(files)
}

/// Reads a tree file. Unreadable or malformed files become parse failures.
fn read_unit(path: &Path) -> SourceUnit {
    let name = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(json) => match SyntaxTree::from_interchange(&json) {
            Ok(tree) => SourceUnit::parsed(name, tree),
            Err(failure) => SourceUnit::failed(name, failure),
        },
        Err(err) => SourceUnit::failed(name, ParseFailure::new(format!("cannot read file: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CLASS_TREE: &str = r#"{"tree": {"kind": "COMPILATION_UNIT", "text": "", "line": 1, "column": 0,
        "children": [{"kind": "CLASS_DEF", "text": "", "line": 1, "column": 0},
                     {"kind": "CLASS_DEF", "text": "", "line": 2, "column": 0}]}}"#;

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/generated")).unwrap();
        fs::write(tmp.path().join("src/A.ast.json"), CLASS_TREE).unwrap();
        fs::write(tmp.path().join("src/B.ast.json"), "{\"parse-error\": {\"message\": \"bad\"}}").unwrap();
        fs::write(tmp.path().join("src/generated/G.ast.json"), CLASS_TREE).unwrap();
        fs::write(tmp.path().join("src/notes.json"), "{}").unwrap();
        tmp
    }

    fn relative(tmp: &TempDir, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(tmp.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn discovers_tree_files_in_order() {
        let tmp = project();
        let files = discover(&[tmp.path().to_path_buf()], &[]).unwrap();
        assert_eq!(
            relative(&tmp, &files),
            vec!["src/A.ast.json", "src/B.ast.json", "src/generated/G.ast.json"]
        );
    }

    #[test]
    fn exclude_patterns_skip_directories() {
        let tmp = project();
        let files = discover(&[tmp.path().to_path_buf()], &["**/generated/**".to_string()]).unwrap();
        assert_eq!(relative(&tmp, &files), vec!["src/A.ast.json", "src/B.ast.json"]);
    }

    #[test]
    fn explicit_files_are_always_included() {
        let tmp = project();
        let notes = tmp.path().join("src/notes.json");
        let files = discover(&[notes.clone()], &["**/*.json".to_string()]).unwrap();
        assert_eq!(files, vec![notes]);
    }

    #[test]
    fn invalid_exclude_pattern_is_an_error() {
        let err = discover(&[], &["[".to_string()]).unwrap_err();
        assert!(err.to_string().contains('['), "{err}");
    }

    #[test]
    fn unreadable_and_malformed_files_become_parse_failures() {
        let tmp = project();
        let malformed = read_unit(&tmp.path().join("src/B.ast.json"));
        assert_eq!(malformed.tree.unwrap_err().message, "bad");

        let missing = read_unit(&tmp.path().join("src/Missing.ast.json"));
        assert!(missing.tree.unwrap_err().message.starts_with("cannot read file"));

        let fine = read_unit(&tmp.path().join("src/A.ast.json"));
        assert!(fine.tree.is_ok());
    }

    #[test]
    fn failing_run_sets_exit_code() {
        let tmp = project();
        let options = CheckOptions {
            paths: vec![tmp.path().join("src")],
            format: OutputFormat::Compact,
            overrides: Overrides {
                checks: Some("outer-type-number".to_string()),
                ..Overrides::default()
            },
        };
        let code = run(&options, &ConfigSource::Builtin).unwrap();
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
    }
}
