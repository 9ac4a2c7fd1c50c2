//! Structure layer: frontmatter completeness, section naming, link safety.
//!
//! # Rules
//!
//! | ID | Sev | What it checks |
//! |----|-----|----------------|
//! | `missing-frontmatter` | MEDIUM | Document must open with a `---` block |
//! | `missing-name` | MEDIUM | Frontmatter must set `name` |
//! | `missing-description` | MEDIUM | Frontmatter must set `description` |
//! | `extra-frontmatter-keys` | LOW | Only `name` and `description` are expected |
//! | `long-description` | LOW | Description should stay under 500 characters |
//! | `no-sections` | MEDIUM | At least one `#`/`##` heading |
//! | `unexpected-section` | INFO | Section titles outside the usual vocabulary |
//! | `dangerous-uri-scheme` | HIGH | `javascript:`, `data:`, `vbscript:` links |
//! | `ip-address-url` | MEDIUM | Links to a literal IPv4 host |
//! | `non-standard-port` | LOW | Links with an explicit port |
//! | `url-shortener` | MEDIUM | Links through a known shortener |
//! | `external-url` | INFO | Links to hosts outside the allowlist |

use super::{Layer, RuleInfo};
use crate::config::Config;
use crate::document::{Document, Link, FRONTMATTER_SECTION};
use crate::finding::{Finding, LayerKind, Severity};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Substrings of lowercase section titles that are considered standard.
const EXPECTED_SECTIONS: &[&str] = &[
    "contents",
    "quick start",
    "workflow",
    "scan workflow",
    "audit workflow",
    "analysis workflow",
    "understanding results",
    "example output",
    "validation loop",
    "instructions",
    "patterns detected",
];

const URL_SHORTENERS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "t.co",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "rebrand.ly",
];

const MAX_DESCRIPTION_CHARS: usize = 500;

static RE_DANGEROUS_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(javascript|data|vbscript):").unwrap());

/// `scheme://[userinfo@]host[:port]`
static RE_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://(?:[^/?#@\s]*@)?([^/?#:\s]*)(?::(\d+))?").unwrap()
});

static RE_IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").unwrap());

pub struct StructureLayer;

impl Layer for StructureLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Structure
    }

    fn description(&self) -> &'static str {
        "Frontmatter, section, and link validation"
    }

    fn scan(&self, doc: &Document, config: &Config) -> Vec<Finding> {
        let mut findings = validate_frontmatter(doc);
        findings.extend(validate_sections(doc));
        findings.extend(validate_links(doc, config));
        findings
    }
}

fn emit(severity: Severity, section: &str, line: usize, rule: &str, msg: String) -> Finding {
    Finding::new(LayerKind::Structure, severity, section, line, rule, msg)
}

fn validate_frontmatter(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();

    let Some(fm) = &doc.frontmatter else {
        findings.push(emit(
            Severity::Medium,
            FRONTMATTER_SECTION,
            1,
            "missing-frontmatter",
            "SKILL.md is missing YAML frontmatter (expected --- delimited block with name and description)".into(),
        ));
        return findings;
    };
    let line = fm.start_line + 1;

    if fm.name.is_none() {
        findings.push(emit(
            Severity::Medium,
            FRONTMATTER_SECTION,
            line,
            "missing-name",
            "Frontmatter is missing required 'name' field".into(),
        ));
    }

    if fm.description.is_none() {
        findings.push(emit(
            Severity::Medium,
            FRONTMATTER_SECTION,
            line,
            "missing-description",
            "Frontmatter is missing required 'description' field".into(),
        ));
    }

    if !fm.extra_keys.is_empty() {
        // Sorted and deduplicated so the report is reproducible.
        let keys: BTreeSet<&str> = fm.extra_keys.iter().map(String::as_str).collect();
        let joined = keys.into_iter().collect::<Vec<_>>().join(", ");
        findings.push(
            emit(
                Severity::Low,
                FRONTMATTER_SECTION,
                line,
                "extra-frontmatter-keys",
                format!(
                    "Frontmatter contains unexpected keys: {joined} (expected only name and description)"
                ),
            )
            .with_evidence(&joined),
        );
    }

    if let Some(desc) = &fm.description {
        let len = desc.chars().count();
        if len > MAX_DESCRIPTION_CHARS {
            findings.push(emit(
                Severity::Low,
                FRONTMATTER_SECTION,
                line,
                "long-description",
                format!(
                    "Frontmatter description is unusually long ({len} chars, expected < {MAX_DESCRIPTION_CHARS})"
                ),
            ));
        }
    }

    findings
}

fn validate_sections(doc: &Document) -> Vec<Finding> {
    if doc.sections.is_empty() {
        return vec![emit(
            Severity::Medium,
            "document",
            1,
            "no-sections",
            "SKILL.md contains no markdown sections (expected headings like ## Contents, ## Instructions)".into(),
        )];
    }

    doc.sections
        .iter()
        .filter(|s| s.level <= 2)
        .filter(|s| {
            let lower = s.title.to_lowercase();
            !EXPECTED_SECTIONS.iter().any(|exp| lower.contains(exp))
        })
        .map(|s| {
            emit(
                Severity::Info,
                &s.title,
                s.start_line + 1,
                "unexpected-section",
                format!("Section '{}' is not a standard SKILL.md section", s.title),
            )
        })
        .collect()
}

/// Host (lowercased) and explicit port of a `scheme://` URL.
pub fn url_authority(url: &str) -> Option<(String, Option<&str>)> {
    let caps = RE_AUTHORITY.captures(url.trim())?;
    let host = caps.get(1)?.as_str().to_lowercase();
    let port = caps.get(2).map(|m| m.as_str());
    Some((host, port))
}

fn validate_links(doc: &Document, config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();
    for link in &doc.links {
        check_link(link, config, &mut findings);
    }
    findings
}

fn check_link(link: &Link, config: &Config, findings: &mut Vec<Finding>) {
    // `[x](<url>)` is a valid link target; the link regex keeps the `<`.
    let url = link.url.trim().trim_start_matches('<').trim_end_matches('>');
    if url.starts_with('#') {
        return;
    }

    let emit_link = |findings: &mut Vec<Finding>, severity: Severity, rule: &str, msg: &str| {
        findings.push(
            emit(severity, &link.section, link.line + 1, rule, msg.to_string()).with_evidence(url),
        );
    };

    // These schemes carry no `//` authority, so they are checked before the
    // scheme-separator gate below.
    if RE_DANGEROUS_SCHEME.is_match(url) {
        emit_link(
            findings,
            Severity::High,
            "dangerous-uri-scheme",
            "Link uses a dangerous URI scheme (javascript:, data:, or vbscript:)",
        );
        return;
    }

    if !url.contains("://") {
        return;
    }
    let Some((host, port)) = url_authority(url) else {
        return;
    };

    let is_ip = RE_IPV4.is_match(&host);
    if is_ip {
        emit_link(
            findings,
            Severity::Medium,
            "ip-address-url",
            "Link points to an IP address instead of a domain name",
        );
    }

    if port.is_some_and(|p| (2..=5).contains(&p.len())) {
        emit_link(
            findings,
            Severity::Low,
            "non-standard-port",
            "Link uses a non-standard port number",
        );
    }

    if !is_ip && URL_SHORTENERS.contains(&host.as_str()) {
        emit_link(
            findings,
            Severity::Medium,
            "url-shortener",
            "Link uses a URL shortener — destination cannot be verified",
        );
    }

    if !config.allowlist.allows_host(&host) {
        emit_link(
            findings,
            Severity::Info,
            "external-url",
            "Link points to an external URL outside the allowlist",
        );
    }
}

pub fn rules() -> Vec<RuleInfo> {
    vec![
        RuleInfo {
            id: "missing-frontmatter",
            severity: Severity::Medium,
            layer: LayerKind::Structure,
            message: "SKILL.md is missing YAML frontmatter",
            remediation: "Start the file with a --- block containing name and description",
        },
        RuleInfo {
            id: "missing-name",
            severity: Severity::Medium,
            layer: LayerKind::Structure,
            message: "Frontmatter is missing required 'name' field",
            remediation: "Add a 'name:' line to the frontmatter",
        },
        RuleInfo {
            id: "missing-description",
            severity: Severity::Medium,
            layer: LayerKind::Structure,
            message: "Frontmatter is missing required 'description' field",
            remediation: "Add a 'description:' line to the frontmatter",
        },
        RuleInfo {
            id: "extra-frontmatter-keys",
            severity: Severity::Low,
            layer: LayerKind::Structure,
            message: "Frontmatter contains keys other than name and description",
            remediation: "Remove unexpected frontmatter keys or confirm they are intended",
        },
        RuleInfo {
            id: "long-description",
            severity: Severity::Low,
            layer: LayerKind::Structure,
            message: "Frontmatter description exceeds 500 characters",
            remediation: "Shorten the description; move detail into the body",
        },
        RuleInfo {
            id: "no-sections",
            severity: Severity::Medium,
            layer: LayerKind::Structure,
            message: "SKILL.md contains no markdown sections",
            remediation: "Organise the body under headings such as ## Instructions",
        },
        RuleInfo {
            id: "unexpected-section",
            severity: Severity::Info,
            layer: LayerKind::Structure,
            message: "Section title is not a standard SKILL.md section",
            remediation: "Review non-standard sections for content aimed at the agent",
        },
        RuleInfo {
            id: "dangerous-uri-scheme",
            severity: Severity::High,
            layer: LayerKind::Structure,
            message: "Link uses a javascript:, data:, or vbscript: URI",
            remediation: "Remove the link or replace it with an https:// URL",
        },
        RuleInfo {
            id: "ip-address-url",
            severity: Severity::Medium,
            layer: LayerKind::Structure,
            message: "Link points to a literal IP address",
            remediation: "Link to a named, verifiable domain instead",
        },
        RuleInfo {
            id: "url-shortener",
            severity: Severity::Medium,
            layer: LayerKind::Structure,
            message: "Link uses a URL shortener",
            remediation: "Replace the shortened link with its full destination URL",
        },
        RuleInfo {
            id: "non-standard-port",
            severity: Severity::Low,
            layer: LayerKind::Structure,
            message: "Link uses an explicit port number",
            remediation: "Confirm the service on that port is intended",
        },
        RuleInfo {
            id: "external-url",
            severity: Severity::Info,
            layer: LayerKind::Structure,
            message: "Link points to a host outside the allowlist",
            remediation: "Add trusted hosts to [allowlist] domains in skill-check.toml",
        },
    ]
}
