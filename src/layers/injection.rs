//! Injection layer: line-level prompt-injection and payload patterns.
//!
//! Five rule categories are applied to every line except `---` delimiters:
//!
//! | Category | Base | Applied |
//! |----------|------|---------|
//! | Direct injection | HIGH | Everywhere except example code blocks; context-adjusted |
//! | Instruction hierarchy | HIGH | Everywhere except example code blocks; context-adjusted |
//! | Suspicious operations | MEDIUM | Outside code blocks |
//! | Hidden text | HIGH | Everywhere, code blocks included |
//! | Encoding payloads | MEDIUM | Outside code blocks |
//!
//! Context adjustment: a match inside the frontmatter is raised one step, a
//! match inside a code block under an "example" section is lowered one step.
//! Hierarchy matches inside the section titled "Instructions" start from
//! MEDIUM before adjustment.
//!
//! A separate whole-document pass reports HTML comments that span several
//! lines as `hidden-html-comment-multiline`. The per-line
//! `hidden-html-comment` rule also fires on a comment's opening line; the two
//! are distinct signals and both are kept.

use super::{Layer, RuleInfo};
use crate::config::Config;
use crate::document::{Document, FRONTMATTER_SECTION};
use crate::finding::{Finding, LayerKind, Severity};
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Direct,
    Hierarchy,
    SuspiciousOp,
    HiddenText,
    Encoding,
}

struct InjectionPattern {
    id: &'static str,
    category: Category,
    severity: Severity,
    regex: &'static LazyLock<Regex>,
    message: &'static str,
    remediation: &'static str,
}

// Direct injection (HIGH)

static RE_OVERRIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ignore|disregard|forget|override|bypass)\s+(all\s+)?(previous|prior|original|above|earlier)\s+(instructions?|prompts?|rules?|guidelines?|directives?)").unwrap()
});

static RE_ROLE_SWITCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)you\s+are\s+now\s+(a|an|in)\s+").unwrap());

static RE_MODE_SWITCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(enter|switch\s+to|enable|activate)\s+(developer|admin|system|unrestricted|god|debug|root|sudo)\s*(mode|access)?").unwrap()
});

static RE_PRIV_ESCALATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(system|administrative|root)\s+(override|access|privilege|escalation)")
        .unwrap()
});

static RE_PROMPT_LEAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(reveal|show|disclose|display|output|print|dump)\s+(your\s+)?(system\s+)?(prompt|instructions?|configuration|rules?|guidelines?|context)").unwrap()
});

// Instruction hierarchy (HIGH, MEDIUM inside Instructions)

static RE_HIERARCHY_OVERRIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(the\s+following|this)\s+(overrides?|supersedes?|replaces?)\s+(all|any|previous|prior|the\s+above)").unwrap()
});

static RE_HIERARCHY_CONTRADICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)do\s+not\s+follow\s+(the\s+)?(above|previous|prior|other|original)").unwrap()
});

static RE_HIDDEN_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(actual|real|true|hidden)\s+(instruction|task|goal|purpose|objective)\s+(is|are)\b").unwrap()
});

// Suspicious operations (MEDIUM, outside code blocks)

static RE_DESTRUCTIVE_RM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brm\s+-rf\b").unwrap());

static RE_FORCE_PUSH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bgit\s+push\s+--force\b").unwrap());

static RE_DROP_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(drop|truncate)\s+(table|database|schema)\b").unwrap());

static RE_DD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bdd\s+if=").unwrap());

static RE_DATA_EXFIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(curl|wget|nc|netcat)\s+[^|]*[^a-zA-Z](--data|--post|-d|-X\s*POST)\b")
        .unwrap()
});

// Word boundaries sit only next to word characters: a leading `\b` before
// `$` or `~` never matches after whitespace.
static RE_ENV_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\bprintenv\b|\$HOME\b|\$SSH_KEY\b|~/\.ssh\b|~/\.aws\b|~/\.gnupg\b)")
        .unwrap()
});

static RE_CREDENTIAL_READ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(cat|less|head|tail|type)\s+[^\n]*(\.env|credentials|\.pem|\.key|id_rsa|\.aws/config|password|secret)\b").unwrap()
});

// Hidden text (HIGH, everywhere)

static RE_HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Start of an HTML comment, used for the per-line rule so that the opening
/// line of a multi-line comment is also reported.
static RE_HTML_COMMENT_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--").unwrap());

static RE_ZERO_FONT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)font-size\s*:\s*0").unwrap());

static RE_INVISIBLE_CSS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(color\s*:\s*(white|#fff(fff)?|rgb\(\s*255\s*,\s*255\s*,\s*255\s*\))|opacity\s*:\s*0\b|display\s*:\s*none)").unwrap()
});

// Encoding payloads (MEDIUM, outside code blocks)

static RE_BASE64: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/]{40,}={0,2}").unwrap());

static RE_HEX_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\\x[0-9a-fA-F]{2}){4,}").unwrap());

static RE_UNICODE_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\\u[0-9a-fA-F]{4}){3,}").unwrap());

static PATTERNS: &[InjectionPattern] = &[
    // Direct injection
    InjectionPattern {
        id: "injection-override",
        category: Category::Direct,
        severity: Severity::High,
        regex: &RE_OVERRIDE,
        message: "Direct prompt injection: attempts to override previous instructions",
        remediation: "Remove instruction override language",
    },
    InjectionPattern {
        id: "injection-role-switch",
        category: Category::Direct,
        severity: Severity::High,
        regex: &RE_ROLE_SWITCH,
        message: "Direct prompt injection: attempts to reassign AI role",
        remediation: "Remove role reassignment language",
    },
    InjectionPattern {
        id: "injection-mode-switch",
        category: Category::Direct,
        severity: Severity::High,
        regex: &RE_MODE_SWITCH,
        message: "Direct prompt injection: attempts to switch to privileged mode",
        remediation: "Remove privileged-mode activation language",
    },
    InjectionPattern {
        id: "injection-privilege-escalation",
        category: Category::Direct,
        severity: Severity::High,
        regex: &RE_PRIV_ESCALATION,
        message: "Direct prompt injection: attempts system/administrative override",
        remediation: "Remove privilege escalation language",
    },
    InjectionPattern {
        id: "injection-prompt-leak",
        category: Category::Direct,
        severity: Severity::High,
        regex: &RE_PROMPT_LEAK,
        message: "Direct prompt injection: attempts to extract system prompt or configuration",
        remediation: "Remove instructions that ask the agent to reveal its prompt or configuration",
    },
    // Instruction hierarchy
    InjectionPattern {
        id: "injection-hierarchy-override",
        category: Category::Hierarchy,
        severity: Severity::High,
        regex: &RE_HIERARCHY_OVERRIDE,
        message: "Instruction hierarchy attack: claims to override other instructions",
        remediation: "Remove claims that this text supersedes other instructions",
    },
    InjectionPattern {
        id: "injection-hierarchy-contradict",
        category: Category::Hierarchy,
        severity: Severity::High,
        regex: &RE_HIERARCHY_CONTRADICT,
        message: "Instruction hierarchy attack: instructs to ignore other sections",
        remediation: "Remove language telling the agent not to follow other sections",
    },
    InjectionPattern {
        id: "injection-hidden-intent",
        category: Category::Hierarchy,
        severity: Severity::High,
        regex: &RE_HIDDEN_INTENT,
        message: "Instruction hierarchy attack: claims different real intent",
        remediation: "State the skill's purpose once, in the frontmatter description",
    },
    // Suspicious operations
    InjectionPattern {
        id: "suspicious-destructive-rm",
        category: Category::SuspiciousOp,
        severity: Severity::Medium,
        regex: &RE_DESTRUCTIVE_RM,
        message: "Potentially destructive command: rm -rf",
        remediation: "Scope deletions to explicit paths, or move commands into a reviewed script",
    },
    InjectionPattern {
        id: "suspicious-force-push",
        category: Category::SuspiciousOp,
        severity: Severity::Medium,
        regex: &RE_FORCE_PUSH,
        message: "Potentially destructive command: git push --force",
        remediation: "Use --force-with-lease or avoid rewriting remote history",
    },
    InjectionPattern {
        id: "suspicious-drop-table",
        category: Category::SuspiciousOp,
        severity: Severity::Medium,
        regex: &RE_DROP_TABLE,
        message: "Potentially destructive SQL command",
        remediation: "Remove destructive SQL from agent instructions",
    },
    InjectionPattern {
        id: "suspicious-dd",
        category: Category::SuspiciousOp,
        severity: Severity::Medium,
        regex: &RE_DD,
        message: "Potentially destructive command: dd (disk write)",
        remediation: "Remove raw disk writes from agent instructions",
    },
    InjectionPattern {
        id: "suspicious-data-exfil",
        category: Category::SuspiciousOp,
        severity: Severity::Medium,
        regex: &RE_DATA_EXFIL,
        message: "Potential data exfiltration: HTTP POST to external endpoint",
        remediation: "Remove instructions that upload local data to remote endpoints",
    },
    InjectionPattern {
        id: "suspicious-env-access",
        category: Category::SuspiciousOp,
        severity: Severity::Medium,
        regex: &RE_ENV_ACCESS,
        message: "Suspicious access to environment variables or credential directories",
        remediation: "Do not direct the agent at credential directories or the environment",
    },
    InjectionPattern {
        id: "suspicious-credential-read",
        category: Category::SuspiciousOp,
        severity: Severity::Medium,
        regex: &RE_CREDENTIAL_READ,
        message: "Suspicious attempt to read credential or secret files",
        remediation: "Remove instructions that read secret or key files",
    },
    // Hidden text
    InjectionPattern {
        id: "hidden-html-comment",
        category: Category::HiddenText,
        severity: Severity::High,
        regex: &RE_HTML_COMMENT_OPEN,
        message: "Hidden HTML comment — may contain concealed instructions",
        remediation: "Remove HTML comments; anything the agent reads should be visible",
    },
    InjectionPattern {
        id: "hidden-zero-font",
        category: Category::HiddenText,
        severity: Severity::High,
        regex: &RE_ZERO_FONT,
        message: "Zero font-size CSS — text invisible to human readers",
        remediation: "Remove CSS that hides text",
    },
    InjectionPattern {
        id: "hidden-invisible-css",
        category: Category::HiddenText,
        severity: Severity::High,
        regex: &RE_INVISIBLE_CSS,
        message: "CSS that hides text (white text, zero opacity, or display:none)",
        remediation: "Remove CSS that hides text",
    },
    // Encoding payloads
    InjectionPattern {
        id: "encoding-base64",
        category: Category::Encoding,
        severity: Severity::Medium,
        regex: &RE_BASE64,
        message: "Large Base64-encoded blob detected — may hide malicious content",
        remediation: "Decode and inline the content, or move the blob into a reviewed file",
    },
    InjectionPattern {
        id: "encoding-hex",
        category: Category::Encoding,
        severity: Severity::Medium,
        regex: &RE_HEX_ESCAPE,
        message: "Hex escape sequence detected — may hide malicious content",
        remediation: "Replace escape sequences with readable text",
    },
    InjectionPattern {
        id: "encoding-unicode-escape",
        category: Category::Encoding,
        severity: Severity::Medium,
        regex: &RE_UNICODE_ESCAPE,
        message: "Unicode escape sequence detected — may hide malicious content",
        remediation: "Replace escape sequences with readable text",
    },
];

const MULTILINE_COMMENT_RULE: &str = "hidden-html-comment-multiline";

/// Where a line sits, as far as the injection rules care.
struct LineContext<'a> {
    section: &'a str,
    in_code_block: bool,
    /// Inside a code block whose owning section title contains "example".
    in_example_code: bool,
}

impl<'a> LineContext<'a> {
    fn new(doc: &'a Document, idx: usize) -> Self {
        let section = doc.section_for_line(idx);
        let block = doc.code_block_at(idx);
        let in_example_code = block
            .and_then(|b| b.section.as_deref())
            .is_some_and(|s| s.to_lowercase().contains("example"));
        LineContext {
            section,
            in_code_block: block.is_some(),
            in_example_code,
        }
    }

    fn applies(&self, category: Category) -> bool {
        match category {
            // Sample text in example code blocks is skipped outright for the
            // phrasing categories rather than lowered.
            Category::Direct | Category::Hierarchy => !self.in_example_code,
            Category::SuspiciousOp | Category::Encoding => !self.in_code_block,
            Category::HiddenText => true,
        }
    }

    fn severity_for(&self, pattern: &InjectionPattern) -> Severity {
        match pattern.category {
            Category::Direct => adjust_severity(pattern.severity, self.section, self.in_code_block),
            Category::Hierarchy => {
                let base = if self.section.eq_ignore_ascii_case("Instructions") {
                    Severity::Medium
                } else {
                    pattern.severity
                };
                adjust_severity(base, self.section, self.in_code_block)
            }
            _ => pattern.severity,
        }
    }
}

/// Section-aware adjustment for the phrasing categories.
pub fn adjust_severity(severity: Severity, section: &str, in_code_block: bool) -> Severity {
    let lower = section.to_lowercase();
    if lower == FRONTMATTER_SECTION {
        return severity.raise();
    }
    if in_code_block && lower.contains("example") {
        return severity.lower();
    }
    severity
}

pub struct InjectionLayer;

impl Layer for InjectionLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Injection
    }

    fn description(&self) -> &'static str {
        "Prompt injection, destructive operations, hidden text, and encoded payloads"
    }

    fn scan(&self, doc: &Document, _config: &Config) -> Vec<Finding> {
        let mut findings = scan_lines(doc);
        findings.extend(scan_multiline_comments(doc));
        findings
    }
}

fn scan_lines(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (idx, line) in doc.lines.iter().enumerate() {
        if line.trim() == "---" {
            continue;
        }
        let ctx = LineContext::new(doc, idx);

        for pattern in PATTERNS {
            if !ctx.applies(pattern.category) || !pattern.regex.is_match(line) {
                continue;
            }
            findings.push(
                Finding::new(
                    LayerKind::Injection,
                    ctx.severity_for(pattern),
                    ctx.section,
                    idx + 1,
                    pattern.id,
                    pattern.message,
                )
                .with_evidence(line.trim()),
            );
        }
    }

    findings
}

/// Reports every HTML comment spanning more than one line, once, at the line
/// it opens on.
pub fn scan_multiline_comments(doc: &Document) -> Vec<Finding> {
    let content = doc.lines.join("\n");

    RE_HTML_COMMENT
        .find_iter(&content)
        .filter(|m| m.as_str().contains('\n'))
        .map(|m| {
            let start_line = content[..m.start()].matches('\n').count();
            let span = m.as_str().matches('\n').count() + 1;
            Finding::new(
                LayerKind::Injection,
                Severity::High,
                doc.section_for_line(start_line),
                start_line + 1,
                MULTILINE_COMMENT_RULE,
                format!("Multi-line HTML comment ({span} lines) — may contain concealed instructions"),
            )
            // Evidence stays on one line so report list items are not split.
            .with_evidence(&m.as_str().replace('\n', "⏎"))
        })
        .collect()
}

pub fn rules() -> Vec<RuleInfo> {
    let mut rules: Vec<RuleInfo> = PATTERNS
        .iter()
        .map(|p| RuleInfo {
            id: p.id,
            severity: p.severity,
            layer: LayerKind::Injection,
            message: p.message,
            remediation: p.remediation,
        })
        .collect();
    rules.push(RuleInfo {
        id: MULTILINE_COMMENT_RULE,
        severity: Severity::High,
        layer: LayerKind::Injection,
        message: "HTML comment spanning multiple lines — may conceal instructions",
        remediation: "Remove HTML comments; anything the agent reads should be visible",
    });
    rules
}
