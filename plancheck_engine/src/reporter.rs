//! Text, JSON and SARIF output for the plan check engine.
//!
//! Produces three output formats:
//!
//! 1. **Text**: human-readable report per artifact, issues grouped by
//!    priority (root causes, then derived symptoms) and by table, followed
//!    by the suggestion records.
//!
//! 2. **JSON**: native format via `serde_json` serialization of
//!    [`CheckResult`].
//!
//! 3. **SARIF v2.1.0**: Static Analysis Results Interchange Format, compatible
//!    with GitHub Code Scanning.
//!
//! ## SARIF Field Mapping
//!
//! | DetectedIssue field | SARIF location |
//! |---|---|
//! | `kind` | `result.ruleId` (one rule per issue kind) |
//! | `table` + `description` | `result.message.text` |
//! | `severity` | `result.level` (Error→error, Warning→warning, Info→note) |
//! | `artifact` | `result.locations[0].physicalLocation.artifactLocation.uri` |
//! | matching suggestion | `result.fixes[0].description.text` |

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::types::{
    ArtifactReport, CheckResult, DetectedIssue, IssueKind, Priority, Severity, SuggestionRecord,
};

/// Engine version for SARIF tool metadata.
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SARIF schema URL.
const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json";

/// Rule id used for artifacts that could not be analyzed.
const INTERNAL_RULE: &str = "INTERNAL";

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

/// Render a [`CheckResult`] as a human-readable report.
#[must_use]
pub fn to_text(result: &CheckResult) -> String {
    let mut out = String::new();
    for report in &result.reports {
        write_report(&mut out, report);
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} artifact(s), {} issue(s): {} error(s), {} warning(s), {} info(s). {} in {}ms",
        result.total_artifacts,
        result.total_issues,
        result.total_errors,
        result.total_warnings,
        result.total_infos,
        if result.passed { "Passed" } else { "Failed" },
        result.elapsed_ms,
    );
    out
}

fn write_report(out: &mut String, report: &ArtifactReport) {
    let _ = writeln!(out, "{}", report.artifact);

    if let Some(ref error) = report.error {
        let _ = writeln!(out, "  error: {error}");
        return;
    }
    if report.issues.is_empty() && report.findings.is_empty() {
        let _ = writeln!(out, "  no issues");
        return;
    }

    for (title, priority) in [("Root causes", Priority::Root), ("Derived symptoms", Priority::Derived)] {
        let grouped = group_by_table(report.issues.iter().filter(|i| i.priority == priority));
        if grouped.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {title}:");
        for (table, issues) in grouped {
            let _ = writeln!(out, "    {table}");
            for issue in issues {
                let _ = writeln!(
                    out,
                    "      [{}] {}: {}",
                    issue.severity, issue.kind, issue.description
                );
            }
        }
    }

    if !report.findings.is_empty() {
        let kinds: Vec<String> = report.findings.iter().map(|f| f.kind.to_string()).collect();
        let _ = writeln!(out, "  Matched rules: {}", kinds.join(", "));
    }

    if !report.suggestions.is_empty() {
        let _ = writeln!(out, "  Suggestions:");
        for (table, records) in &report.suggestions {
            let _ = writeln!(out, "    {table}");
            for record in records {
                write_suggestion(out, record);
            }
        }
    }
}

fn write_suggestion(out: &mut String, record: &SuggestionRecord) {
    let _ = writeln!(out, "      - {}: {}", record.kind, record.description);
    for line in record.example.lines() {
        let _ = writeln!(out, "          {line}");
    }
    for (label, items) in [
        ("do", &record.recommendations),
        ("note", &record.considerations),
        ("or", &record.alternatives),
    ] {
        for item in items {
            let _ = writeln!(out, "        {label}: {item}");
        }
    }
}

/// Group issues by table, tables in first-seen order.
fn group_by_table<'a>(
    issues: impl Iterator<Item = &'a DetectedIssue>,
) -> Vec<(&'a str, Vec<&'a DetectedIssue>)> {
    let mut groups: Vec<(&str, Vec<&DetectedIssue>)> = Vec::new();
    for issue in issues {
        match groups.iter_mut().find(|(t, _)| *t == issue.table) {
            Some((_, list)) => list.push(issue),
            None => groups.push((issue.table.as_str(), vec![issue])),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// JSON output
// ---------------------------------------------------------------------------

/// Serialize a [`CheckResult`] to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error message if serialization fails (should not happen for valid data).
pub fn to_json(result: &CheckResult) -> Result<String, String> {
    serde_json::to_string_pretty(result).map_err(|e| format!("JSON serialization failed: {e}"))
}

// ---------------------------------------------------------------------------
// SARIF output
// ---------------------------------------------------------------------------

/// Serialize a [`CheckResult`] to SARIF v2.1.0 JSON.
///
/// # Errors
///
/// Returns an error message if serialization fails.
pub fn to_sarif(result: &CheckResult) -> Result<String, String> {
    let sarif = build_sarif_log(result);
    serde_json::to_string_pretty(&sarif).map_err(|e| format!("SARIF serialization failed: {e}"))
}

fn build_sarif_log(result: &CheckResult) -> SarifLog {
    // BTreeMap keeps the rule list sorted by id.
    let mut rule_map: BTreeMap<String, SarifRule> = BTreeMap::new();
    let mut results = Vec::new();

    for report in &result.reports {
        if let Some(ref error) = report.error {
            rule_map
                .entry(INTERNAL_RULE.to_owned())
                .or_insert_with(|| SarifRule {
                    id: INTERNAL_RULE.to_owned(),
                    name: "InternalError".to_owned(),
                    short_description: SarifMessage {
                        text: "Capture could not be loaded or analyzed".to_owned(),
                    },
                    default_configuration: SarifDefaultConfiguration {
                        level: severity_to_sarif_level(Severity::Error),
                    },
                });
            results.push(SarifResult {
                rule_id: INTERNAL_RULE.to_owned(),
                level: severity_to_sarif_level(Severity::Error),
                message: SarifMessage { text: error.clone() },
                locations: vec![location(&report.artifact)],
                fixes: None,
            });
            continue;
        }

        for issue in &report.issues {
            let id = issue.kind.as_str();
            rule_map.entry(id.to_owned()).or_insert_with(|| SarifRule {
                id: id.to_owned(),
                name: kind_to_rule_name(issue.kind),
                short_description: SarifMessage {
                    text: kind_to_short_description(issue.kind).to_owned(),
                },
                default_configuration: SarifDefaultConfiguration {
                    level: severity_to_sarif_level(issue.priority.default_severity()),
                },
            });
            results.push(build_sarif_result(report, issue));
        }
    }

    SarifLog {
        schema: SARIF_SCHEMA.to_owned(),
        version: "2.1.0".to_owned(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "plancheck".to_owned(),
                    version: ENGINE_VERSION.to_owned(),
                    rules: rule_map.into_values().collect(),
                },
            },
            results,
        }],
    }
}

fn build_sarif_result(report: &ArtifactReport, issue: &DetectedIssue) -> SarifResult {
    let fixes = report
        .suggestions
        .get(&issue.table)
        .and_then(|records| records.iter().find(|r| r.kind == issue.kind))
        .map(|record| {
            vec![SarifFix {
                description: SarifMessage {
                    text: format!("{}\n{}", record.description, record.example),
                },
            }]
        });

    SarifResult {
        rule_id: issue.kind.as_str().to_owned(),
        level: severity_to_sarif_level(issue.severity),
        message: SarifMessage {
            text: format!("[{}] {}", issue.table, issue.description),
        },
        locations: vec![location(
            issue.artifact.as_deref().unwrap_or(report.artifact.as_str()),
        )],
        fixes,
    }
}

fn location(uri: &str) -> SarifLocation {
    SarifLocation {
        physical_location: SarifPhysicalLocation {
            artifact_location: SarifArtifactLocation {
                uri: uri.to_owned(),
            },
        },
    }
}

/// Map check engine severity to SARIF level string.
fn severity_to_sarif_level(severity: Severity) -> String {
    match severity {
        Severity::Error => "error".to_owned(),
        Severity::Warning => "warning".to_owned(),
        Severity::Info => "note".to_owned(),
    }
}

/// PascalCase rule name from the snake_case kind.
fn kind_to_rule_name(kind: IssueKind) -> String {
    kind.as_str()
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn kind_to_short_description(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::FullTableScan => "Every row of the table is read",
        IssueKind::UnusedAvailableIndex => "Candidate indexes exist but none was chosen",
        IssueKind::InefficientJoin => "Join falls back to a join buffer",
        IssueKind::FunctionOnColumn => "Function on a column prevents index use",
        IssueKind::InefficientLike => "LIKE pattern starts with a wildcard",
        IssueKind::LowSelectivity => "Filter keeps most rows of a large scan",
        IssueKind::FilesortRequired => "ORDER BY needs a filesort",
        IssueKind::TempTableRequired => "GROUP BY needs a temporary table",
        IssueKind::ImplicitTypeConversion => "Column converted to another type for comparison",
        IssueKind::Unknown => "Unrecognized issue",
    }
}

// ---------------------------------------------------------------------------
// SARIF data structures
// ---------------------------------------------------------------------------

/// Top-level SARIF log.
#[derive(Debug, Serialize)]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: String,
    name: String,
    short_description: SarifMessage,
    default_configuration: SarifDefaultConfiguration,
}

#[derive(Debug, Serialize)]
struct SarifDefaultConfiguration {
    level: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixes: Option<Vec<SarifFix>>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
struct SarifFix {
    description: SarifMessage,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
