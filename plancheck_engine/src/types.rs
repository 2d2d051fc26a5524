//! Core type definitions for the plan check engine.
//!
//! These types form the contract between the analyzer, the suggestion mapper,
//! the reporters, and Python via PyO3:
//!
//! - [`Severity`] is the CI-facing level that decides pass/fail
//! - [`Priority`] separates root causes from derived symptoms
//! - [`IssueKind`] names every anti-pattern the per-node walk can report
//! - [`DiagnosticMessage`] is one `SHOW WARNINGS` row
//! - [`DetectedIssue`] is the atomic unit of analyzer output
//! - [`SuggestionRecord`] is a remediation template filled in for one issue
//! - [`ArtifactReport`] and [`CheckResult`] aggregate a run

use std::collections::BTreeMap;

use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rules::RuleFinding;

/// Check engine severity level.
///
/// | Priority | Default severity |
/// |---|---|
/// | `Root` | `Warning` |
/// | `Derived` | `Info` |
///
/// Both defaults can be overridden per issue kind in the configuration.
#[pyclass(eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before the query ships.
    Error,
    /// Should be addressed but does not block.
    Warning,
    /// Informational notice, no action required.
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Whether an issue names a primary cause or a downstream symptom.
///
/// `Root` sorts before `Derived`; output lists rely on that ordering.
#[pyclass(eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Primary cause, e.g. a missing index.
    Root,
    /// Symptom that usually co-occurs with a root cause, e.g. low selectivity.
    Derived,
}

impl Priority {
    /// Severity used when the configuration has no override for the kind.
    #[must_use]
    pub fn default_severity(self) -> Severity {
        match self {
            Self::Root => Severity::Warning,
            Self::Derived => Severity::Info,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Derived => write!(f, "derived"),
        }
    }
}

/// Anti-pattern kinds reported by the per-node walk.
///
/// Serialized as snake_case. Any other string decodes as [`IssueKind::Unknown`],
/// which the suggestion mapper skips.
#[pyclass(eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The table is read row by row (`access_type = ALL`).
    FullTableScan,
    /// Candidate indexes exist but the optimizer chose none.
    UnusedAvailableIndex,
    /// The join falls back to a join buffer instead of an index.
    InefficientJoin,
    /// A function wraps an indexed column in the filter.
    FunctionOnColumn,
    /// A LIKE pattern starts with a wildcard.
    InefficientLike,
    /// Most examined rows survive the filter on a large scan.
    LowSelectivity,
    /// ORDER BY needs an explicit sort pass.
    FilesortRequired,
    /// GROUP BY materializes a temporary table.
    TempTableRequired,
    /// The engine converted a column's type to compare it.
    ImplicitTypeConversion,
    /// Any kind this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl IssueKind {
    /// Every recognized kind, in catalog order.
    pub const KNOWN: [IssueKind; 9] = [
        IssueKind::FullTableScan,
        IssueKind::UnusedAvailableIndex,
        IssueKind::InefficientJoin,
        IssueKind::FunctionOnColumn,
        IssueKind::InefficientLike,
        IssueKind::LowSelectivity,
        IssueKind::FilesortRequired,
        IssueKind::TempTableRequired,
        IssueKind::ImplicitTypeConversion,
    ];

    /// Stable snake_case identifier, also used as the config key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullTableScan => "full_table_scan",
            Self::UnusedAvailableIndex => "unused_available_index",
            Self::InefficientJoin => "inefficient_join",
            Self::FunctionOnColumn => "function_on_column",
            Self::InefficientLike => "inefficient_like",
            Self::LowSelectivity => "low_selectivity",
            Self::FilesortRequired => "filesort_required",
            Self::TempTableRequired => "temp_table_required",
            Self::ImplicitTypeConversion => "implicit_type_conversion",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a kind name, mapping anything unrecognized to `Unknown`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::KNOWN
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(Self::Unknown)
    }

    /// Priority an issue of this kind is created with.
    #[must_use]
    pub fn priority(self) -> Priority {
        match self {
            Self::LowSelectivity => Priority::Derived,
            _ => Priority::Root,
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the engine's auxiliary diagnostics (`SHOW WARNINGS`).
///
/// Order within a list carries no meaning; repeated texts are allowed.
#[pyclass(get_all)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// `Note`, `Warning` or `Error`.
    #[serde(default)]
    pub level: String,

    /// Engine-specific numeric code (e.g. 1739 for a conversion warning).
    #[serde(default)]
    pub code: u32,

    /// Message text.
    #[serde(alias = "message")]
    pub text: String,
}

impl DiagnosticMessage {
    /// Build a message from its three parts.
    pub fn new(level: impl Into<String>, code: u32, text: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            code,
            text: text.into(),
        }
    }
}

#[pymethods]
impl DiagnosticMessage {
    #[new]
    fn py_new(level: String, code: u32, text: String) -> Self {
        Self::new(level, code, text)
    }

    fn __repr__(&self) -> String {
        format!(
            "DiagnosticMessage(level={:?}, code={}, text={:?})",
            self.level, self.code, self.text
        )
    }
}

/// A single anti-pattern found in a plan.
///
/// Created once per qualifying plan node during one analysis pass. Only the
/// `artifact` tag and the configured `severity` are filled in afterwards.
#[pyclass(get_all)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedIssue {
    /// What was found.
    pub kind: IssueKind,

    /// Table the issue is attributed to (`"unknown"` when none applies).
    pub table: String,

    /// Human-readable, table-specific explanation.
    pub description: String,

    /// Root cause or derived symptom.
    pub priority: Priority,

    /// CI severity after configuration overrides.
    pub severity: Severity,

    /// Columns involved (LIKE targets, function arguments).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    /// Candidate indexes the optimizer considered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<String>,

    /// Identifier of the analyzed artifact, usually its capture path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl DetectedIssue {
    /// Create an issue with the kind's priority and its default severity.
    pub fn new(kind: IssueKind, table: impl Into<String>, description: impl Into<String>) -> Self {
        let priority = kind.priority();
        Self {
            kind,
            table: table.into(),
            description: description.into(),
            priority,
            severity: priority.default_severity(),
            columns: Vec::new(),
            indexes: Vec::new(),
            artifact: None,
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_indexes(mut self, indexes: Vec<String>) -> Self {
        self.indexes = indexes;
        self
    }
}

#[pymethods]
impl DetectedIssue {
    fn __repr__(&self) -> String {
        format!(
            "DetectedIssue(kind={}, table={:?}, priority={}, severity={})",
            self.kind, self.table, self.priority, self.severity,
        )
    }
}

/// Structured remediation for one detected issue.
#[pyclass(get_all)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    /// Issue kind this record answers.
    pub kind: IssueKind,

    /// Table the advice applies to.
    pub table: String,

    /// What to change and why it helps.
    pub description: String,

    /// Example corrective statement.
    pub example: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub considerations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

#[pymethods]
impl SuggestionRecord {
    fn __repr__(&self) -> String {
        format!(
            "SuggestionRecord(kind={}, table={:?})",
            self.kind, self.table
        )
    }
}

/// Everything the engine produced for one analyzed artifact.
#[pyclass(get_all)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactReport {
    /// Artifact identifier (capture path relative to the project root).
    pub artifact: String,

    /// Per-node issues, root issues first.
    pub issues: Vec<DetectedIssue>,

    /// Rule catalog matches, in catalog order.
    pub findings: Vec<RuleFinding>,

    /// Remediation records keyed by table name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub suggestions: BTreeMap<String, Vec<SuggestionRecord>>,

    /// Set when the artifact could not be loaded or analyzed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArtifactReport {
    /// Report for an artifact that failed before or during analysis.
    pub fn failed(artifact: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Number of issues at the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

#[pymethods]
impl ArtifactReport {
    fn __repr__(&self) -> String {
        format!(
            "ArtifactReport(artifact={:?}, issues={}, findings={}, error={:?})",
            self.artifact,
            self.issues.len(),
            self.findings.len(),
            self.error,
        )
    }
}

/// Aggregate result of checking a set of artifacts.
#[pyclass(get_all)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Per-artifact reports, sorted by artifact identifier.
    pub reports: Vec<ArtifactReport>,

    /// Number of artifacts analyzed (including failed ones).
    pub total_artifacts: u32,

    /// Number of detected issues across all reports.
    pub total_issues: u32,

    /// Issues with severity `Error` plus failed artifacts.
    pub total_errors: u32,

    /// Issues with severity `Warning`.
    pub total_warnings: u32,

    /// Issues with severity `Info`.
    pub total_infos: u32,

    /// Wall-clock milliseconds elapsed for the run.
    pub elapsed_ms: u64,

    /// Whether the gate passed.
    pub passed: bool,
}

#[pymethods]
impl CheckResult {
    /// Serialize the result to pretty-printed JSON.
    fn to_json(&self) -> PyResult<String> {
        crate::reporter::to_json(self).map_err(pyo3::exceptions::PyValueError::new_err)
    }

    /// Serialize the result to SARIF v2.1.0 JSON for code scanning upload.
    fn to_sarif_json(&self) -> PyResult<String> {
        crate::reporter::to_sarif(self).map_err(pyo3::exceptions::PyValueError::new_err)
    }

    /// Render the human-readable report.
    fn to_text(&self) -> String {
        crate::reporter::to_text(self)
    }

    fn __repr__(&self) -> String {
        format!(
            "CheckResult(passed={}, errors={}, warnings={}, infos={}, artifacts={}, elapsed_ms={})",
            self.passed,
            self.total_errors,
            self.total_warnings,
            self.total_infos,
            self.total_artifacts,
            self.elapsed_ms,
        )
    }
}
