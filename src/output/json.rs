//! JSON output formatter.

use crate::finding::Report;

/// Formats a [`Report`] as pretty-printed JSON.
///
/// Field names are stable: `file`, `signal`, `finding_count`, `findings`,
/// `sections`, `suppressed`. Findings omit `evidence` when there is none.
pub fn format(report: &Report) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}
