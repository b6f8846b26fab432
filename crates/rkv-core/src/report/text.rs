//! Console report

use crate::checks::Criticality;
use crate::verifier::VerificationReport;
use std::fmt::Write;

const HINT_INDENT: &str = "       ";

pub fn generate(report: &VerificationReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Verifying {}", report.install_dir.display());
    let _ = writeln!(out);

    for (i, step) in report.steps.iter().enumerate() {
        let tag = match step.criticality {
            Criticality::Critical => "",
            Criticality::Advisory => " (advisory)",
        };
        let _ = writeln!(out, "[{}/{}] {}{}", i + 1, report.total_steps, step.name, tag);
        for result in &step.results {
            let _ = writeln!(out, "  {} {}", result.severity.glyph(), result.message);
            if let Some(hint) = &result.hint {
                let _ = writeln!(out, "  {}hint: {}", HINT_INDENT, hint);
            }
        }
        let _ = writeln!(out);
    }

    if let Some(sha) = &report.primary_sha256 {
        let _ = writeln!(out, "sha256: {}", sha);
    }

    if report.passed() {
        let warnings = report.warnings();
        if warnings > 0 {
            let plural = if warnings == 1 { "" } else { "s" };
            let _ = writeln!(out, "RESULT: PASS ({} warning{})", warnings, plural);
        } else {
            let _ = writeln!(out, "RESULT: PASS");
        }
        if !report.deployment.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Deployment:");
            for line in &report.deployment {
                let _ = writeln!(out, "  {}", line);
            }
        }
    } else {
        let step = report.aborted_at.as_deref().unwrap_or("unknown step");
        let _ = writeln!(out, "RESULT: FAIL at {}", step);
        if let Some(hint) = report.failed_step().and_then(|s| s.failure_hint()) {
            let _ = writeln!(out, "Fix: {}", hint);
        }
    }

    out
}
