//! Coherence layer: does the document do what it says it does?
//!
//! Three lexical checks, no semantic model:
//!
//! - `suspicious-verbs`: destructive or exfiltrating verbs in the
//!   Instructions section.
//! - `frontmatter-mismatch`: the name and description share almost no
//!   vocabulary with the Instructions section.
//! - `self-reference-contradiction`: text telling the reader to disregard
//!   the document's own stated purpose.

use super::{Layer, RuleInfo};
use crate::config::Config;
use crate::document::Document;
use crate::finding::{Finding, LayerKind, Severity};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const SUSPICIOUS_VERBS: &[&str] = &[
    "delete",
    "destroy",
    "steal",
    "exfiltrate",
    "inject",
    "overwrite",
    "upload",
    "transmit",
    "corrupt",
    "wipe",
    "erase",
    "purge",
    "hack",
    "exploit",
    "breach",
    "compromise",
];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "shall", "can",
    "and", "but", "or", "nor", "not", "so", "yet", "both", "either", "neither", "of", "in", "on",
    "at", "to", "for", "with", "by", "from", "as", "into", "through", "during", "before",
    "after", "above", "below", "between", "this", "that", "these", "those", "it", "its", "if",
    "then", "than", "when", "where", "how", "what", "which", "who", "whom", "whose", "why",
    "use", "using", "used", "see", "also", "each", "all", "any",
];

/// Fewer significant frontmatter terms than this carries too little signal.
const MIN_SIGNIFICANT_WORDS: usize = 5;

/// Below this share of matched terms the instructions are considered
/// unrelated to the declared purpose.
const MIN_MATCH_RATIO: f64 = 0.1;

static SELF_REFERENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ignore\s+the\s+(description|title|name)\s+(above|in\s+the\s+frontmatter)",
        r"(?i)the\s+real\s+(instructions?|purpose|goal)\s+(is|are)\b",
        r"(?i)despite\s+what\s+the\s+(title|description|name|frontmatter)\s+says",
        r"(?i)contrary\s+to\s+(the\s+)?(above|description|stated\s+purpose)",
        r"(?i)do\s+not\s+(actually|really)\s+(do|perform|execute)\s+what",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub struct CoherenceLayer;

impl Layer for CoherenceLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Coherence
    }

    fn description(&self) -> &'static str {
        "Declared purpose vs. actual instructions"
    }

    fn scan(&self, doc: &Document, _config: &Config) -> Vec<Finding> {
        let mut findings = Vec::new();
        findings.extend(analyze_instruction_verbs(doc));
        findings.extend(check_frontmatter_overlap(doc));
        findings.extend(detect_self_references(doc));
        findings
    }
}

/// Splits text into runs of letters, digits, `-`, and `_`.
pub fn tokenize_words(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Lowercased, deduplicated, non-stop-word terms of at least three
/// characters, in first-seen order. Hyphenated and snake_case tokens are
/// split into their parts.
pub fn extract_significant_words(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut significant = Vec::new();

    for word in tokenize_words(text) {
        for part in word.split(['-', '_']).filter(|p| !p.is_empty()) {
            let lower = part.to_lowercase();
            if lower.chars().count() < 3 || STOP_WORDS.contains(&lower.as_str()) {
                continue;
            }
            if seen.insert(lower.clone()) {
                significant.push(lower);
            }
        }
    }

    significant
}

fn analyze_instruction_verbs(doc: &Document) -> Option<Finding> {
    let section = doc.instructions()?;

    let mut found: Vec<String> = Vec::new();
    for word in tokenize_words(&section.content) {
        let lower = word.to_lowercase();
        if SUSPICIOUS_VERBS.contains(&lower.as_str()) && !found.contains(&lower) {
            found.push(lower);
        }
    }
    if found.is_empty() {
        return None;
    }

    let joined = found.join(", ");
    Some(
        Finding::new(
            LayerKind::Coherence,
            Severity::Medium,
            section.title.as_str(),
            section.start_line + 1,
            "suspicious-verbs",
            format!("Instructions section contains suspicious action verbs: {joined}"),
        )
        .with_evidence(&joined),
    )
}

fn check_frontmatter_overlap(doc: &Document) -> Option<Finding> {
    let fm = doc.frontmatter.as_ref()?;
    if fm.name.is_none() && fm.description.is_none() {
        return None;
    }
    let section = doc.instructions()?;

    let purpose = format!(
        "{} {}",
        fm.name.as_deref().unwrap_or_default(),
        fm.description.as_deref().unwrap_or_default()
    );
    let terms = extract_significant_words(&purpose);
    if terms.len() < MIN_SIGNIFICANT_WORDS {
        return None;
    }

    let body = doc.section_lines(section).join("\n").to_lowercase();
    let matched = terms.iter().filter(|t| body.contains(t.as_str())).count();
    let ratio = matched as f64 / terms.len() as f64;
    if ratio >= MIN_MATCH_RATIO {
        return None;
    }

    Some(
        Finding::new(
            LayerKind::Coherence,
            Severity::Medium,
            section.title.as_str(),
            section.start_line + 1,
            "frontmatter-mismatch",
            format!(
                "Instructions content has low overlap with frontmatter purpose ({:.0}% of key terms matched: {})",
                ratio * 100.0,
                terms.join(", ")
            ),
        )
        .with_evidence(&format!("matched {matched} of {} terms", terms.len())),
    )
}

fn detect_self_references(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, line) in doc.lines.iter().enumerate() {
        for re in SELF_REFERENCE_PATTERNS.iter() {
            if re.is_match(line) {
                findings.push(
                    Finding::new(
                        LayerKind::Coherence,
                        Severity::High,
                        doc.section_for_line(idx),
                        idx + 1,
                        "self-reference-contradiction",
                        "Cross-section contradiction: text explicitly references and contradicts other sections",
                    )
                    .with_evidence(line.trim()),
                );
            }
        }
    }
    findings
}

pub fn rules() -> Vec<RuleInfo> {
    vec![
        RuleInfo {
            id: "suspicious-verbs",
            severity: Severity::Medium,
            layer: LayerKind::Coherence,
            message: "Instructions section contains destructive or exfiltrating verbs",
            remediation: "Confirm each flagged action matches the skill's declared purpose",
        },
        RuleInfo {
            id: "frontmatter-mismatch",
            severity: Severity::Medium,
            layer: LayerKind::Coherence,
            message: "Instructions share under 10% of key terms with the frontmatter purpose",
            remediation: "Make the name and description describe what the instructions actually do",
        },
        RuleInfo {
            id: "self-reference-contradiction",
            severity: Severity::High,
            layer: LayerKind::Coherence,
            message: "Text tells the reader to disregard the document's stated purpose",
            remediation: "Remove language that contradicts the title, description, or frontmatter",
        },
    ]
}
