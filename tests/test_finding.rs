use skill_check::config::Suppression;
use skill_check::finding::{
    compute_signal, parse_line_range, truncate_evidence, Finding, LayerKind, Report, Severity,
    Signal,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_finding(rule: &str, severity: Severity, line: usize) -> Finding {
    Finding::new(
        LayerKind::Structure,
        severity,
        "Instructions",
        line,
        rule,
        "test finding",
    )
}

fn make_suppression(rule: &str, file: &str, lines: Option<&str>) -> Suppression {
    Suppression {
        rule: rule.to_string(),
        file: file.to_string(),
        lines: lines.map(str::to_string),
        reason: "approved".to_string(),
        ticket: None,
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

#[test]
fn empty_findings_are_safe() {
    assert_eq!(compute_signal(&[]), Signal::Safe);
}

#[test]
fn low_and_info_never_change_the_signal() {
    let findings = vec![
        make_finding("a", Severity::Low, 1),
        make_finding("b", Severity::Info, 2),
    ];
    assert_eq!(compute_signal(&findings), Signal::Safe);
}

#[test]
fn medium_is_suspicious_and_high_is_dangerous() {
    let medium = vec![make_finding("a", Severity::Medium, 1)];
    assert_eq!(compute_signal(&medium), Signal::Suspicious);

    let high = vec![
        make_finding("a", Severity::Info, 1),
        make_finding("b", Severity::High, 2),
        make_finding("c", Severity::Medium, 3),
    ];
    assert_eq!(compute_signal(&high), Signal::Dangerous);
}

#[test]
fn signal_is_monotonic_under_added_findings() {
    let mut findings = Vec::new();
    let mut previous = compute_signal(&findings);
    for severity in [Severity::Info, Severity::Medium, Severity::Low, Severity::High, Severity::Info] {
        findings.push(make_finding("r", severity, 1));
        let current = compute_signal(&findings);
        assert!(current >= previous, "{current} < {previous}");
        previous = current;
    }
    assert_eq!(previous, Signal::Dangerous);
}

#[test]
fn signal_ignores_order() {
    let mut findings = vec![
        make_finding("a", Severity::Medium, 1),
        make_finding("b", Severity::Low, 2),
    ];
    let forward = compute_signal(&findings);
    findings.reverse();
    assert_eq!(compute_signal(&findings), forward);
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[test]
fn severity_raise_and_lower_saturate() {
    assert_eq!(Severity::Info.raise(), Severity::Low);
    assert_eq!(Severity::High.raise(), Severity::High);
    assert_eq!(Severity::High.lower(), Severity::Medium);
    assert_eq!(Severity::Info.lower(), Severity::Info);
}

#[test]
fn severity_serializes_uppercase() {
    assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"MEDIUM\"");
    assert_eq!(serde_json::to_string(&LayerKind::Coherence).unwrap(), "\"coherence\"");
    assert_eq!(serde_json::to_string(&Signal::Dangerous).unwrap(), "\"DANGEROUS\"");
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

#[test]
fn evidence_at_limit_is_kept() {
    let exact = "a".repeat(80);
    assert_eq!(truncate_evidence(&exact), exact);
}

#[test]
fn evidence_over_limit_is_cut_on_char_boundaries() {
    let long = "é".repeat(100);
    let cut = truncate_evidence(&long);
    assert_eq!(cut.chars().count(), 80);
    assert!(cut.starts_with(&"é".repeat(77)));
    assert!(cut.ends_with("..."));
}

#[test]
fn with_evidence_truncates() {
    let f = make_finding("r", Severity::Low, 1).with_evidence(&"x".repeat(200));
    assert_eq!(f.evidence.unwrap().chars().count(), 80);
}

// ---------------------------------------------------------------------------
// Report and suppressions
// ---------------------------------------------------------------------------

#[test]
fn report_counts_and_signal() {
    let report = Report::from_findings(
        "skills/demo/SKILL.md",
        vec![
            make_finding("a", Severity::High, 1),
            make_finding("b", Severity::Info, 2),
        ],
        vec!["Instructions".to_string()],
        &[],
    );
    assert_eq!(report.signal, Signal::Dangerous);
    assert_eq!(report.finding_count, 2);
    assert_eq!(report.count_by_severity(), (1, 0, 0, 1));
    assert!(report.fails(false));
    assert_eq!(report.sections, vec!["Instructions"]);
}

#[test]
fn suspicious_fails_only_in_strict_mode() {
    let report = Report::from_findings(
        "SKILL.md",
        vec![make_finding("a", Severity::Medium, 1)],
        vec![],
        &[],
    );
    assert!(!report.fails(false));
    assert!(report.fails(true));
}

#[test]
fn suppression_by_rule_and_path_suffix() {
    let report = Report::from_findings(
        "skills/demo/SKILL.md",
        vec![
            make_finding("a", Severity::High, 3),
            make_finding("b", Severity::Medium, 4),
        ],
        vec![],
        &[make_suppression("a", "demo/SKILL.md", None)],
    );
    assert_eq!(report.finding_count, 1);
    assert_eq!(report.findings[0].rule, "b");
    assert_eq!(report.suppressed.len(), 1);
    assert_eq!(report.suppressed[0].suppression_reason.as_deref(), Some("approved"));
    assert_eq!(report.signal, Signal::Suspicious);
}

#[test]
fn suppression_file_must_match_whole_components() {
    let report = Report::from_findings(
        "skills/demo/SKILL.md",
        vec![make_finding("a", Severity::High, 3)],
        vec![],
        &[make_suppression("a", "L.md", None)],
    );
    assert!(report.suppressed.is_empty());
    assert_eq!(report.signal, Signal::Dangerous);
}

#[test]
fn empty_suppression_file_matches_any_source() {
    let report = Report::from_findings(
        "https://github.com/o/r/blob/main/SKILL.md",
        vec![make_finding("a", Severity::High, 3)],
        vec![],
        &[make_suppression("a", "", None)],
    );
    assert_eq!(report.signal, Signal::Safe);
}

#[test]
fn suppression_line_range() {
    let findings = vec![
        make_finding("a", Severity::High, 9),
        make_finding("a", Severity::High, 10),
        make_finding("a", Severity::High, 20),
        make_finding("a", Severity::High, 21),
    ];
    let report = Report::from_findings(
        "SKILL.md",
        findings,
        vec![],
        &[make_suppression("a", "SKILL.md", Some("10-20"))],
    );
    let kept: Vec<usize> = report.findings.iter().map(|f| f.line).collect();
    let dropped: Vec<usize> = report.suppressed.iter().map(|f| f.line).collect();
    assert_eq!(kept, vec![9, 21]);
    assert_eq!(dropped, vec![10, 20]);
}

#[test]
fn malformed_line_range_never_matches() {
    let report = Report::from_findings(
        "SKILL.md",
        vec![make_finding("a", Severity::High, 5)],
        vec![],
        &[make_suppression("a", "SKILL.md", Some("five"))],
    );
    assert!(report.suppressed.is_empty());
}

#[test]
fn line_range_parsing() {
    assert_eq!(parse_line_range("15"), Some((15, 15)));
    assert_eq!(parse_line_range("10-20"), Some((10, 20)));
    assert_eq!(parse_line_range(" 3 - 4 "), Some((3, 4)));
    assert_eq!(parse_line_range("20-10"), None);
    assert_eq!(parse_line_range("1-2-3"), None);
    assert_eq!(parse_line_range(""), None);
}

#[test]
fn findings_with_preserves_emission_order() {
    let report = Report::from_findings(
        "SKILL.md",
        vec![
            make_finding("first", Severity::Low, 7),
            make_finding("high", Severity::High, 1),
            make_finding("second", Severity::Low, 2),
        ],
        vec![],
        &[],
    );
    let low: Vec<&str> = report
        .findings_with(Severity::Low)
        .map(|f| f.rule.as_str())
        .collect();
    assert_eq!(low, vec!["first", "second"]);
}
