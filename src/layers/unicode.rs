//! Unicode layer: hidden and deceptive characters.
//!
//! Every character of every line is classified, first match wins:
//!
//! | ID | Sev | What it catches |
//! |----|-----|-----------------|
//! | `bidi-control` | HIGH | Embedding/override/isolate controls (Trojan Source) |
//! | `invisible-char` | HIGH | Zero-width characters, directional marks, BOM, soft hyphen |
//! | `variation-selector` | HIGH | Both variation-selector blocks |
//! | `private-use-char` | MEDIUM | General category `Co` |
//! | `control-char` | MEDIUM | General category `Cc` except tab, LF, CR |
//! | `format-char` | MEDIUM | Remaining general category `Cf` |
//!
//! Outside code blocks, word tokens mixing Latin, Cyrillic, and Greek raise
//! `mixed-script` (HIGH when the token holds a known confusable).
//!
//! A byte-order mark as the very first character of the document is a file
//! marker and is never reported.

use super::confusables::is_confusable;
use super::{Layer, RuleInfo};
use crate::config::Config;
use crate::document::Document;
use crate::finding::{Finding, LayerKind, Severity};
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_script::{Script, UnicodeScript};

const BOM: char = '\u{FEFF}';

pub struct UnicodeLayer;

impl Layer for UnicodeLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Unicode
    }

    fn description(&self) -> &'static str {
        "Hidden Unicode characters and mixed-script homoglyphs"
    }

    fn scan(&self, doc: &Document, _config: &Config) -> Vec<Finding> {
        let mut findings = scan_characters(doc);
        findings.extend(scan_homoglyphs(doc));
        findings
    }
}

/// Classification of a single dangerous character.
struct CharClass {
    rule: &'static str,
    severity: Severity,
    label: &'static str,
}

pub fn is_bidi_control(c: char) -> bool {
    matches!(c, '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}')
}

pub fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}'
            | BOM
            | '\u{00AD}'
            | '\u{034F}'
            | '\u{2060}'..='\u{2064}'
    )
}

pub fn is_variation_selector(c: char) -> bool {
    matches!(c, '\u{FE00}'..='\u{FE0F}' | '\u{E0100}'..='\u{E01EF}')
}

fn classify(c: char) -> Option<CharClass> {
    if matches!(c, '\t' | '\n' | '\r') {
        return None;
    }
    if is_bidi_control(c) {
        return Some(CharClass {
            rule: "bidi-control",
            severity: Severity::High,
            label: "Bidirectional control character",
        });
    }
    if is_invisible(c) {
        return Some(CharClass {
            rule: "invisible-char",
            severity: Severity::High,
            label: "Invisible character",
        });
    }
    if is_variation_selector(c) {
        return Some(CharClass {
            rule: "variation-selector",
            severity: Severity::High,
            label: "Variation selector",
        });
    }
    match get_general_category(c) {
        GeneralCategory::PrivateUse => Some(CharClass {
            rule: "private-use-char",
            severity: Severity::Medium,
            label: "Private Use Area character",
        }),
        GeneralCategory::Control => Some(CharClass {
            rule: "control-char",
            severity: Severity::Medium,
            label: "Control character",
        }),
        GeneralCategory::Format => Some(CharClass {
            rule: "format-char",
            severity: Severity::Medium,
            label: "Unicode format character",
        }),
        _ => None,
    }
}

fn scan_characters(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (idx, line) in doc.lines.iter().enumerate() {
        for (col, c) in line.chars().enumerate() {
            if c == BOM && idx == 0 && col == 0 {
                continue;
            }
            let Some(class) = classify(c) else {
                continue;
            };
            findings.push(
                Finding::new(
                    LayerKind::Unicode,
                    class.severity,
                    doc.section_for_line(idx),
                    idx + 1,
                    class.rule,
                    format!("{} U+{:04X} detected", class.label, c as u32),
                )
                .with_evidence(&format!("column {}", col + 1)),
            );
        }
    }

    findings
}

/// Splits a line into maximal runs of letters and digits.
pub fn extract_words(line: &str) -> Vec<&str> {
    line.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Scripts from {Latin, Cyrillic, Greek} present in `word`, in that order.
pub fn detect_scripts(word: &str) -> Vec<&'static str> {
    let (mut latin, mut cyrillic, mut greek) = (false, false, false);
    for c in word.chars() {
        match c.script() {
            Script::Latin => latin = true,
            Script::Cyrillic => cyrillic = true,
            Script::Greek => greek = true,
            _ => {}
        }
    }
    [(latin, "Latin"), (cyrillic, "Cyrillic"), (greek, "Greek")]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect()
}

fn scan_homoglyphs(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (idx, line) in doc.lines.iter().enumerate() {
        if doc.is_in_code_block(idx) {
            continue;
        }
        for word in extract_words(line) {
            let scripts = detect_scripts(word);
            if scripts.len() < 2 {
                continue;
            }
            let severity = if word.chars().any(is_confusable) {
                Severity::High
            } else {
                Severity::Medium
            };
            findings.push(
                Finding::new(
                    LayerKind::Unicode,
                    severity,
                    doc.section_for_line(idx),
                    idx + 1,
                    "mixed-script",
                    format!(
                        "Mixed-script word detected (scripts: {}) — potential homoglyph attack",
                        scripts.join(", ")
                    ),
                )
                .with_evidence(word),
            );
        }
    }

    findings
}

pub fn rules() -> Vec<RuleInfo> {
    vec![
        RuleInfo {
            id: "bidi-control",
            severity: Severity::High,
            layer: LayerKind::Unicode,
            message: "Bidirectional control character (Trojan Source attack vector)",
            remediation: "Remove U+202A–U+202E and U+2066–U+2069 characters from the file",
        },
        RuleInfo {
            id: "invisible-char",
            severity: Severity::High,
            layer: LayerKind::Unicode,
            message: "Invisible or zero-width character",
            remediation: "Remove zero-width and invisible characters; they can hide text from reviewers",
        },
        RuleInfo {
            id: "variation-selector",
            severity: Severity::High,
            layer: LayerKind::Unicode,
            message: "Variation selector character (can smuggle encoded payloads)",
            remediation: "Remove variation selectors unless they are part of a visible emoji sequence",
        },
        RuleInfo {
            id: "private-use-char",
            severity: Severity::Medium,
            layer: LayerKind::Unicode,
            message: "Private Use Area character",
            remediation: "Replace private-use code points with standard characters",
        },
        RuleInfo {
            id: "control-char",
            severity: Severity::Medium,
            layer: LayerKind::Unicode,
            message: "Control character other than tab, LF, or CR",
            remediation: "Strip non-printing control characters from the file",
        },
        RuleInfo {
            id: "format-char",
            severity: Severity::Medium,
            layer: LayerKind::Unicode,
            message: "Unicode format character",
            remediation: "Remove invisible formatting characters from the file",
        },
        RuleInfo {
            id: "mixed-script",
            severity: Severity::High,
            layer: LayerKind::Unicode,
            message: "Word mixes Latin, Cyrillic, or Greek letters (homoglyph spoofing)",
            remediation: "Retype the word using a single script",
        },
    ]
}
