//! Output formatting for analysis reports.
//!
//! | Format | Module | Use case |
//! |--------|--------|----------|
//! | [`Markdown`](OutputFormat::Markdown) | [`markdown`] | Human review, PR comments |
//! | [`Json`](OutputFormat::Json)         | [`json`]     | Automation / scripting    |
//! | [`Sarif`](OutputFormat::Sarif)       | [`sarif`]    | CI/CD integration         |

pub mod json;
pub mod markdown;
pub mod sarif;

use crate::finding::Report;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown report grouped by severity.
    Markdown,
    /// Machine-readable JSON.
    Json,
    /// [SARIF 2.1.0](https://sarifweb.azurewebsites.net/) for CI/CD tool integration.
    Sarif,
}

/// Formats a [`Report`] in the requested [`OutputFormat`].
///
/// Only the serializing formats can fail.
///
/// # Examples
///
/// ```rust
/// use skill_check::analyze::analyze;
/// use skill_check::output::{format_report, OutputFormat};
///
/// let report = analyze("# Notes\n", "SKILL.md");
/// let json = format_report(&report, OutputFormat::Json).unwrap();
/// assert!(json.contains("\"signal\""));
/// ```
pub fn format_report(report: &Report, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Markdown => Ok(markdown::format(report)),
        OutputFormat::Json => json::format(report),
        OutputFormat::Sarif => sarif::format(report),
    }
}
