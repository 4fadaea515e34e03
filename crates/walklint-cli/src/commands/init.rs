//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_NAME: &str = "walklint.toml";

const DEFAULT_CONFIG: &str = r#"# walklint configuration

# Checks enabled before [[checks]] is applied: "recommended" or "all"
preset = "recommended"

# Lowest severity that fails the run: "info", "warning" or "error"
fail-on = "error"

[checker]
parallel = false
# Worker threads for parallel runs (0 = one per CPU)
jobs = 0
# Glob patterns excluded from discovery
exclude = [
    "**/generated/**",
]

# Each entry enables a check, or overrides a preset entry of the same name.
# [[checks]]
# name = "illegal-instantiation"
# id = "noBooleanCtor"
# severity = "warning"
# options = { classes = ["java.lang.Boolean"] }

# [[checks]]
# name = "return-count"
# options = { max = 3, max-for-void = 1 }

# Drop violations by file, check, message, id, lines or columns.
# [[suppress]]
# files = "Generated"
# checks = "return-count"

# Drop violations on nodes selected by a query (see `walklint suggest`).
# [[suppress]]
# checks = "return-count"
# query = "//METHOD_DEF[./IDENT[@text='equals']]"

# Keep only violations inside an inclusive line range.
# [[keep-range]]
# target = "line"
# lower = 1
# upper = 500

# Honour LINT:OFF / LINT:ON comments.
[[suppress-comments]]

# Honour "// LINT:IGNORE <check> <lines>" comments.
# [[suppress-nearby]]
# comment = 'LINT:IGNORE ([\w-]+) ([+-]?\d+)'
# checks = "^$1$"
# influence = "$2"
"#;

/// Runs the init command, writing the starter configuration into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure checks");
    println!("  2. Run: walklint check");

    Ok(())
}
