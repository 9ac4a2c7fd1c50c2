//! Core report data types.
//!
//! A [`Finding`] is one concern raised by exactly one detection layer. The
//! [`Report`] folds all findings of one analysis into a single [`Signal`].

use std::fmt;
use std::path::Path;

/// Finding severity, ordered `Info < Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities, most severe first. This is the order reports are
    /// bucketed in for human-readable output.
    pub const DESCENDING: [Severity; 4] = [
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// One step more severe, saturating at [`Severity::High`].
    pub fn raise(self) -> Severity {
        match self {
            Severity::Info => Severity::Low,
            Severity::Low => Severity::Medium,
            Severity::Medium | Severity::High => Severity::High,
        }
    }

    /// One step less severe, saturating at [`Severity::Info`].
    pub fn lower(self) -> Severity {
        match self {
            Severity::High => Severity::Medium,
            Severity::Medium => Severity::Low,
            Severity::Low | Severity::Info => Severity::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The detection layer that produced a finding.
///
/// Declaration order is the fixed merge order of the analysis pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Unicode,
    Structure,
    Injection,
    Coherence,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Unicode => "unicode",
            LayerKind::Structure => "structure",
            LayerKind::Injection => "injection",
            LayerKind::Coherence => "coherence",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum length of an evidence snippet, in characters.
pub const MAX_EVIDENCE_CHARS: usize = 80;

/// Truncates `s` to at most [`MAX_EVIDENCE_CHARS`] characters.
///
/// Strings longer than the limit keep their first 77 characters followed by
/// `...`. Truncation is done on `char` boundaries, so multi-byte text never
/// panics.
///
/// # Examples
///
/// ```
/// use skill_check::finding::truncate_evidence;
///
/// assert_eq!(truncate_evidence("short"), "short");
/// let long = "x".repeat(100);
/// let cut = truncate_evidence(&long);
/// assert_eq!(cut.chars().count(), 80);
/// assert!(cut.ends_with("..."));
/// ```
pub fn truncate_evidence(s: &str) -> String {
    if s.chars().count() <= MAX_EVIDENCE_CHARS {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .nth(MAX_EVIDENCE_CHARS - 3)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    format!("{}...", &s[..cut])
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub layer: LayerKind,
    pub severity: Severity,
    pub section: String,
    /// 1-based line number.
    pub line: usize,
    pub rule: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppression_reason: Option<String>,
}

impl Finding {
    pub fn new(
        layer: LayerKind,
        severity: Severity,
        section: impl Into<String>,
        line: usize,
        rule: &str,
        description: impl Into<String>,
    ) -> Self {
        Finding {
            layer,
            severity,
            section: section.into(),
            line,
            rule: rule.to_string(),
            description: description.into(),
            evidence: None,
            suppression_reason: None,
        }
    }

    /// Attaches an evidence snippet, truncated with [`truncate_evidence`].
    pub fn with_evidence(mut self, evidence: &str) -> Self {
        self.evidence = Some(truncate_evidence(evidence));
        self
    }
}

/// Composite verdict for a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Safe,
    Suspicious,
    Dangerous,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Safe => f.write_str("SAFE"),
            Signal::Suspicious => f.write_str("SUSPICIOUS"),
            Signal::Dangerous => f.write_str("DANGEROUS"),
        }
    }
}

/// Derives the composite [`Signal`] from a set of findings.
///
/// Any HIGH finding makes the document DANGEROUS, otherwise any MEDIUM makes
/// it SUSPICIOUS. LOW and INFO findings are advisory and never change the
/// signal. The result does not depend on finding order.
pub fn compute_signal(findings: &[Finding]) -> Signal {
    match findings.iter().map(|f| f.severity).max() {
        Some(Severity::High) => Signal::Dangerous,
        Some(Severity::Medium) => Signal::Suspicious,
        _ => Signal::Safe,
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Report {
    /// Display label of the analysed content (file path or URL).
    pub file: String,
    pub signal: Signal,
    pub finding_count: usize,
    /// Active findings in layer-emission order.
    pub findings: Vec<Finding>,
    /// Titles of every parsed section, in document order.
    pub sections: Vec<String>,
    pub suppressed: Vec<Finding>,
}

impl Report {
    /// Builds a report from merged layer findings, moving any finding matched
    /// by `suppressions` into [`Report::suppressed`].
    pub fn from_findings(
        file: &str,
        findings: Vec<Finding>,
        sections: Vec<String>,
        suppressions: &[crate::config::Suppression],
    ) -> Self {
        let mut active = Vec::new();
        let mut suppressed = Vec::new();

        for finding in findings {
            match find_suppression(file, &finding, suppressions) {
                Some(s) => {
                    let mut f = finding;
                    f.suppression_reason = Some(s.reason.clone());
                    suppressed.push(f);
                }
                None => active.push(finding),
            }
        }

        let signal = compute_signal(&active);

        Report {
            file: file.to_string(),
            signal,
            finding_count: active.len(),
            findings: active,
            sections,
            suppressed,
        }
    }

    /// Returns `true` when the report should fail the calling process.
    ///
    /// DANGEROUS always fails; SUSPICIOUS fails only in strict mode.
    pub fn fails(&self, strict: bool) -> bool {
        match self.signal {
            Signal::Dangerous => true,
            Signal::Suspicious => strict,
            Signal::Safe => false,
        }
    }

    /// Active findings of one severity, in emission order.
    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Counts active findings per severity in a single pass.
    ///
    /// Returns `(high, medium, low, info)`.
    pub fn count_by_severity(&self) -> (usize, usize, usize, usize) {
        self.findings
            .iter()
            .fold((0, 0, 0, 0), |(h, m, l, i), f| match f.severity {
                Severity::High => (h + 1, m, l, i),
                Severity::Medium => (h, m + 1, l, i),
                Severity::Low => (h, m, l + 1, i),
                Severity::Info => (h, m, l, i + 1),
            })
    }
}

fn find_suppression<'a>(
    file: &str,
    finding: &Finding,
    suppressions: &'a [crate::config::Suppression],
) -> Option<&'a crate::config::Suppression> {
    suppressions.iter().find(|s| {
        if s.rule != finding.rule {
            return false;
        }
        // Path::ends_with matches whole components: "SKILL.md" matches
        // "skills/x/SKILL.md" but "L.md" does not.
        if !s.file.is_empty() && !Path::new(file).ends_with(Path::new(&s.file)) {
            return false;
        }
        if let Some(ref lines) = s.lines {
            match parse_line_range(lines) {
                Some((start, end)) if finding.line >= start && finding.line <= end => {}
                _ => return false,
            }
        }
        true
    })
}

/// Parses `"15"` or `"10-20"` into an inclusive line range.
pub fn parse_line_range(lines: &str) -> Option<(usize, usize)> {
    let parts: Vec<&str> = lines.split('-').map(str::trim).collect();
    match parts.as_slice() {
        [single] => {
            let line = single.parse().ok()?;
            Some((line, line))
        }
        [start, end] => {
            let start = start.parse().ok()?;
            let end = end.parse().ok()?;
            if start > end {
                return None;
            }
            Some((start, end))
        }
        _ => None,
    }
}
