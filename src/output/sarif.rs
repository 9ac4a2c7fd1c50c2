//! SARIF 2.1.0 output formatter.
//!
//! One rule descriptor per distinct rule id (sorted), with short description
//! and help text taken from the rule catalogue. Suppressed findings are
//! emitted alongside active ones, carrying an external `suppressions` entry
//! with the recorded reason so code-scanning tools do not raise them.

use crate::finding::{Finding, Report, Severity};
use crate::layers;
use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation, Region,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Suppression, Tool,
    ToolComponent,
};
use std::collections::{BTreeMap, HashMap};

fn level_for(severity: Severity) -> ResultLevel {
    match severity {
        Severity::High => ResultLevel::Error,
        Severity::Medium => ResultLevel::Warning,
        Severity::Low | Severity::Info => ResultLevel::Note,
    }
}

fn suppression(reason: &str) -> Result<Suppression, serde_json::Error> {
    serde_json::from_value(serde_json::json!({
        "kind": "external",
        "justification": reason,
    }))
}

pub fn format(report: &Report) -> Result<String, serde_json::Error> {
    let all_findings: Vec<&Finding> = report
        .findings
        .iter()
        .chain(report.suppressed.iter())
        .collect();

    // BTreeMap keeps rule ids sorted.
    let mut rule_map: BTreeMap<&str, &Finding> = BTreeMap::new();
    for f in &all_findings {
        rule_map.entry(f.rule.as_str()).or_insert(f);
    }

    let rule_index: HashMap<&str, i64> = rule_map
        .keys()
        .enumerate()
        .map(|(i, id)| (*id, i as i64))
        .collect();

    let catalogue = layers::all_rules();

    let rules: Vec<ReportingDescriptor> = rule_map
        .iter()
        .map(|(id, f)| {
            let info = catalogue.iter().find(|r| r.id == *id);
            let mut rule = ReportingDescriptor::builder().id(id.to_string()).build();
            let short = info.map_or_else(|| f.description.clone(), |r| r.message.to_string());
            rule.short_description =
                Some(MultiformatMessageString::builder().text(short).build());
            if let Some(info) = info {
                rule.help = Some(
                    MultiformatMessageString::builder()
                        .text(info.remediation.to_string())
                        .build(),
                );
            }
            rule
        })
        .collect();

    let uri = report.file.replace('\\', "/");

    let results = all_findings
        .iter()
        .map(|f| -> Result<SarifResult, serde_json::Error> {
            let mut result = SarifResult::builder()
                .message(Message::builder().text(f.description.clone()).build())
                .build();

            result.rule_id = Some(f.rule.clone());
            result.level = Some(level_for(f.severity));
            result.rule_index = rule_index.get(f.rule.as_str()).copied();

            let mut physical = PhysicalLocation::builder().build();
            physical.artifact_location = Some(ArtifactLocation::builder().uri(uri.clone()).build());
            physical.region = Some(Region::builder().start_line(f.line as i64).build());

            let mut location = Location::builder().build();
            location.physical_location = Some(physical);
            result.locations = Some(vec![location]);

            if let Some(reason) = &f.suppression_reason {
                result.suppressions = Some(vec![suppression(reason)?]);
            }

            Ok(result)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let driver = ToolComponent::builder()
        .name("skill-check")
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();
    let run = Run::builder().tool(tool).results(results).build();
    let sarif = Sarif::builder().version("2.1.0").runs(vec![run]).build();

    let mut out = serde_json::to_string_pretty(&sarif)?;
    out.push('\n');
    Ok(out)
}
