//! Markdown report formatter.
//!
//! Plain Markdown without ANSI colors, so the output can be pasted into a
//! pull-request comment or written to a file as is.

use crate::finding::{Finding, Report, Severity};
use std::fmt::Write;

/// Formats a [`Report`] as Markdown.
///
/// Sections rendered (in order):
/// 1. **Header**: source label and signal.
/// 2. **Findings**: grouped HIGH → MEDIUM → LOW → INFO, emission order kept
///    inside each group.
/// 3. **Suppressed**: suppressed findings with their reasons.
/// 4. **Parsed Sections**: every section title the parser found.
pub fn format(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# SKILL.md Security Report: {}\n", report.file);
    let _ = writeln!(out, "## Signal: {}\n", report.signal);

    if report.finding_count == 0 {
        out.push_str("No security concerns detected.\n\n");
    } else {
        let _ = writeln!(out, "**Findings:** {}\n", report.finding_count);
        for severity in Severity::DESCENDING {
            let bucket: Vec<&Finding> = report.findings_with(severity).collect();
            if bucket.is_empty() {
                continue;
            }
            let _ = writeln!(out, "### {severity} Severity ({})\n", bucket.len());
            for (i, finding) in bucket.iter().enumerate() {
                write_finding(&mut out, i + 1, finding);
            }
        }
    }

    if !report.suppressed.is_empty() {
        let _ = writeln!(out, "### Suppressed ({})\n", report.suppressed.len());
        for finding in &report.suppressed {
            let reason = finding
                .suppression_reason
                .as_deref()
                .unwrap_or("no reason given");
            let _ = writeln!(
                out,
                "- [{}] {} (line {}): {}",
                finding.layer, finding.rule, finding.line, reason
            );
        }
        out.push('\n');
    }

    if !report.sections.is_empty() {
        out.push_str("### Parsed Sections\n\n");
        for title in &report.sections {
            let _ = writeln!(out, "- {title}");
        }
        out.push('\n');
    }

    out
}

fn write_finding(out: &mut String, index: usize, f: &Finding) {
    let _ = writeln!(out, "**{index}. [{}] {}**", f.layer, f.rule);
    let _ = writeln!(out, "- Line {}, Section: {}", f.line, f.section);
    let _ = writeln!(out, "- {}", f.description);
    if let Some(ref evidence) = f.evidence {
        let _ = writeln!(out, "- Evidence: {}", inline_code(evidence));
    }
    out.push('\n');
}

/// Wraps `text` in an inline code span that survives embedded backticks.
fn inline_code(text: &str) -> String {
    if text.contains('`') {
        format!("`` {text} ``")
    } else {
        format!("`{text}`")
    }
}
