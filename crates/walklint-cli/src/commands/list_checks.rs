//! List checks command implementation.

use std::fmt::Write;
use walklint_core::CheckRegistry;
use walklint_rules::{builtin_registry, Preset};

/// Runs the list-checks command.
pub fn run() {
    print!("{}", render(&builtin_registry()));
}

fn render(registry: &CheckRegistry) -> String {
    let mut out = String::from("Available checks:\n\n");
    let _ = writeln!(out, "{:<25} Description", "Name");
    let _ = writeln!(out, "{}", "-".repeat(80));
    for (name, description) in registry.describe() {
        let _ = writeln!(out, "{name:<25} {description}");
    }

    out.push_str("\nPresets:\n");
    for preset in Preset::ALL {
        if let Ok(checks) = registry.preset(preset.name()) {
            let _ = writeln!(out, "  {:<12} - {}", preset.name(), checks.join(", "));
        }
    }

    out.push_str("\nUse --checks to run specific checks, e.g.:\n");
    out.push_str("  walklint check --checks return-count,nested-if-depth\n");
    out
}
