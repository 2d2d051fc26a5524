//! Check engine orchestrator: the main entry point for running plan checks.
//!
//! Coordinates capture discovery, per-artifact analysis, configuration
//! (rule selection and severity overrides), suggestion mapping, and result
//! assembly.
//!
//! Every per-artifact analysis is wrapped in `catch_unwind` so that a panic
//! on one plan yields a failed report for that artifact instead of crashing
//! the Python process.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;

use crate::analyzer;
use crate::config::CheckConfig;
use crate::discovery::{load_capture, walk_captures, PlanArtifact};
use crate::suggestions::SuggestionMapper;
use crate::types::{ArtifactReport, CheckResult, DetectedIssue, Severity};

/// The main plan check engine.
pub struct PlanCheckEngine {
    config: CheckConfig,
}

impl PlanCheckEngine {
    /// Create a new engine with the given configuration.
    #[must_use]
    pub fn new(config: CheckConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Discover every capture under `root` and check it.
    ///
    /// Captures that cannot be read or parsed become failed reports and
    /// count as errors.
    pub fn check(&self, root: &Path) -> CheckResult {
        let start = Instant::now();

        let captures = walk_captures(root, &self.config);

        let reports: Vec<ArtifactReport> = captures
            .par_iter()
            .map(|rel_path| match load_capture(root, rel_path) {
                Ok(artifact) => self.analyze_artifact(&artifact),
                Err(e) => {
                    log::warn!("Skipping analysis of {rel_path}: {e}");
                    ArtifactReport::failed(rel_path.as_str(), e.to_string())
                }
            })
            .collect();

        self.assemble(reports, start)
    }

    /// Check artifacts that were built in memory.
    pub fn check_artifacts(&self, artifacts: &[PlanArtifact]) -> CheckResult {
        let start = Instant::now();
        let reports: Vec<ArtifactReport> = artifacts
            .par_iter()
            .map(|artifact| self.analyze_artifact(artifact))
            .collect();
        self.assemble(reports, start)
    }

    /// Analyze one artifact, applying the configuration for its path.
    ///
    /// # Panics
    ///
    /// Never: a panic inside analysis is caught and returned as a failed
    /// report.
    pub fn analyze_artifact(&self, artifact: &PlanArtifact) -> ArtifactReport {
        match catch_unwind(AssertUnwindSafe(|| self.analyze_unguarded(artifact))) {
            Ok(report) => report,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                log::error!("Internal error while analyzing {}: {msg}", artifact.id);
                ArtifactReport::failed(
                    artifact.id.as_str(),
                    format!("Internal error while analyzing plan: {msg}. This is a bug, please report it."),
                )
            }
        }
    }

    fn analyze_unguarded(&self, artifact: &PlanArtifact) -> ArtifactReport {
        let analysis = analyzer::analyze(
            &artifact.plan,
            &artifact.messages,
            &self.config.selectivity,
        );

        let issues: Vec<DetectedIssue> = analysis
            .merged_issues()
            .into_iter()
            .filter(|issue| self.config.is_kind_enabled_for_path(issue.kind, &artifact.id))
            .map(|mut issue| {
                issue.severity = self.config.effective_severity_for_path(
                    issue.kind,
                    &artifact.id,
                    issue.priority.default_severity(),
                );
                issue.artifact = Some(artifact.id.clone());
                issue
            })
            .collect();

        let suggestions = if self.config.include_suggestions {
            SuggestionMapper::suggest_all(&issues, &artifact.schema)
        } else {
            BTreeMap::new()
        };

        ArtifactReport {
            artifact: artifact.id.clone(),
            issues,
            findings: analysis.findings,
            suggestions,
            error: None,
        }
    }

    fn assemble(&self, mut reports: Vec<ArtifactReport>, start: Instant) -> CheckResult {
        reports.sort_by(|a, b| a.artifact.cmp(&b.artifact));

        let max_issues = self.config.max_issues;
        if max_issues > 0 {
            truncate_issues(&mut reports, max_issues);
        }

        let count = |severity: Severity| -> u32 {
            reports.iter().map(|r| r.count(severity)).sum::<usize>() as u32
        };
        let failed = reports.iter().filter(|r| r.error.is_some()).count() as u32;
        let total_errors = count(Severity::Error) + failed;
        let total_warnings = count(Severity::Warning);
        let total_infos = count(Severity::Info);
        let total_issues = reports.iter().map(|r| r.issues.len()).sum::<usize>() as u32;

        let passed = if self.config.fail_on_warnings {
            total_errors == 0 && total_warnings == 0
        } else {
            total_errors == 0
        };

        let elapsed = start.elapsed();
        log::debug!(
            "Checked {} artifact(s) in {}ms: {total_errors} error(s), {total_warnings} warning(s)",
            reports.len(),
            elapsed.as_millis()
        );

        CheckResult {
            total_artifacts: reports.len() as u32,
            reports,
            total_issues,
            total_errors,
            total_warnings,
            total_infos,
            elapsed_ms: elapsed.as_millis() as u64,
            passed,
        }
    }
}

/// Keep the first `max_issues` issues across the (already sorted) reports.
/// Suggestions for dropped issues go with them.
fn truncate_issues(reports: &mut [ArtifactReport], max_issues: usize) {
    let mut remaining = max_issues;
    for report in reports.iter_mut() {
        if report.issues.len() <= remaining {
            remaining -= report.issues.len();
            continue;
        }
        log::info!(
            "Issue limit of {max_issues} reached; truncating report for {}",
            report.artifact
        );
        report.issues.truncate(remaining);
        remaining = 0;

        let kept = &report.issues;
        for records in report.suggestions.values_mut() {
            records.retain(|rec| {
                kept.iter()
                    .any(|i| i.kind == rec.kind && i.table == rec.table)
            });
        }
        report.suggestions.retain(|_, records| !records.is_empty());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic".to_owned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
