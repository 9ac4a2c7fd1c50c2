//! Analysis orchestration.
//!
//! [`analyze`] is the main entry point: it parses the content once, runs
//! every enabled [`Layer`](crate::layers::Layer) over the same immutable
//! [`Document`] in parallel via [rayon], and folds the results into a
//! [`Report`].

use crate::config::{Config, Suppression};
use crate::document::Document;
use crate::finding::{Finding, Report};
use crate::layers;
use rayon::prelude::*;
use std::time::Instant;

/// Analyses `content` with the default configuration and no suppressions.
///
/// `source` is an opaque display label (file path or URL) copied into the
/// report.
///
/// # Examples
///
/// ```
/// use skill_check::analyze::analyze;
/// use skill_check::finding::Signal;
///
/// let report = analyze("no frontmatter here", "SKILL.md");
/// assert_eq!(report.signal, Signal::Suspicious);
/// ```
pub fn analyze(content: &str, source: &str) -> Report {
    analyze_with(content, source, &Config::default(), &[])
}

/// Analyses `content` with an explicit configuration and suppression list.
///
/// # Pipeline
///
/// 1. Parses `content` into a [`Document`].
/// 2. Filters the registered layers down to those enabled in
///    [`Config::layers`](crate::config::Config::layers).
/// 3. Runs them **in parallel**. Results are collected in layer order
///    (unicode, structure, injection, coherence) regardless of completion
///    order, so output is deterministic.
/// 4. Builds the [`Report`], applying `suppressions`.
pub fn analyze_with(
    content: &str,
    source: &str,
    config: &Config,
    suppressions: &[Suppression],
) -> Report {
    let doc = Document::parse(content);

    let active: Vec<_> = layers::all_layers()
        .into_iter()
        .filter(|l| config.is_layer_enabled(l.kind()))
        .collect();

    let per_layer: Vec<Vec<Finding>> = active
        .par_iter()
        .map(|layer| {
            let start = Instant::now();
            let findings = layer.scan(&doc, config);
            tracing::debug!(
                layer = %layer.kind(),
                findings = findings.len(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "layer finished"
            );
            findings
        })
        .collect();

    let findings: Vec<Finding> = per_layer.into_iter().flatten().collect();
    let report = Report::from_findings(source, findings, doc.section_titles(), suppressions);

    tracing::info!(
        source,
        signal = %report.signal,
        findings = report.finding_count,
        suppressed = report.suppressed.len(),
        "analysis complete"
    );
    report
}
