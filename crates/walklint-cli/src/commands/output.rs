//! Shared output formatting for check results.

use anyhow::Result;
use std::fmt::Write;
use walklint_core::{AuditReport, Severity};

use crate::OutputFormat;

/// Print check results in the specified format.
pub fn print(report: &AuditReport, format: OutputFormat) -> Result<()> {
    let color = format == OutputFormat::Text && std::env::var_os("NO_COLOR").is_none();
    print!("{}", render(report, format, color)?);
    Ok(())
}

/// Renders check results in the specified format.
pub fn render(report: &AuditReport, format: OutputFormat, color: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(report, color),
        OutputFormat::Json => serde_json::to_string_pretty(report)? + "\n",
        OutputFormat::Compact => render_compact(report),
    })
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn render_text(report: &AuditReport, color: bool) -> String {
    let mut out = String::new();
    let (errors, warnings, infos) = report.count_by_severity();

    for violation in report.violations() {
        let severity = match violation.severity() {
            Severity::Error => paint("error", "31", color),
            Severity::Warning => paint("warning", "33", color),
            Severity::Info => paint("info", "34", color),
        };
        let location = violation.location();
        let _ = writeln!(
            out,
            "{} at {}:{}:{}",
            violation.check(),
            location.file,
            location.line,
            location.display_column(),
        );
        let _ = writeln!(out, "  {severity}: {}", violation.message());
        if let Some(id) = violation.module_id() {
            let _ = writeln!(out, "  = id: {id}");
        }
        out.push('\n');
    }

    for file in report.failures() {
        if let Some(failure) = &file.failure {
            let _ = writeln!(out, "{}: {}: {failure}\n", file.file, paint("failed", "31", color));
        }
    }

    let summary_color = if errors > 0 || report.has_failures() {
        "31"
    } else if warnings > 0 {
        "33"
    } else {
        "32"
    };
    let mut summary = format!(
        "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)",
        report.files_checked()
    );
    let failed = report.failures().count();
    if failed > 0 {
        let _ = write!(summary, ", {failed} file(s) failed");
    }
    if report.suppressed() > 0 {
        let _ = write!(summary, " ({} suppressed)", report.suppressed());
    }
    let _ = writeln!(out, "{}", paint(&summary, summary_color, color));
    out
}

fn render_compact(report: &AuditReport) -> String {
    let mut out = String::new();
    for violation in report.violations() {
        let _ = writeln!(out, "{violation}");
    }
    for file in report.failures() {
        if let Some(failure) = &file.failure {
            let _ = writeln!(out, "{}: failed: {failure}", file.file);
        }
    }
    out
}
