//! PyO3 bindings exposing the plan check engine to Python.
//!
//! The Python module is importable as:
//! ```python
//! from plancheck_engine import PlanCheckEngine, CheckConfig, analyze_plan, suggest
//! ```

use std::path::Path;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::CheckConfig;
use crate::discovery::PlanArtifact;
use crate::engine::PlanCheckEngine;
use crate::plan::ExplainPlan;
use crate::rules::{RuleFinding, RuleKind};
use crate::suggestions::SuggestionMapper;
use crate::types::{
    ArtifactReport, CheckResult, DetectedIssue, DiagnosticMessage, IssueKind, Priority, Severity,
    SuggestionRecord,
};

/// Identifier given to plans analyzed without an artifact name.
const INLINE_ARTIFACT: &str = "<inline>";

/// Python-facing engine wrapper.
///
/// Usage from Python:
/// ```python
/// engine = PlanCheckEngine(CheckConfig.load("/path/to/project"))
/// result = engine.check("/path/to/project")
/// print(result.to_text())
/// ```
#[pyclass(name = "PlanCheckEngine")]
pub struct PyPlanCheckEngine {
    inner: PlanCheckEngine,
}

#[pymethods]
impl PyPlanCheckEngine {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<CheckConfig>) -> Self {
        Self {
            inner: PlanCheckEngine::new(config.unwrap_or_default()),
        }
    }

    /// Check every capture under the given project directory.
    fn check(&self, path: &str) -> PyResult<CheckResult> {
        let root = Path::new(path);
        if !root.is_dir() {
            return Err(PyValueError::new_err(format!(
                "Path '{path}' is not a directory"
            )));
        }
        Ok(self.inner.check(root))
    }

    /// Analyze one capture document given as JSON text.
    #[pyo3(signature = (capture_json, artifact=None))]
    fn analyze_capture(&self, capture_json: &str, artifact: Option<String>) -> PyResult<ArtifactReport> {
        let id = artifact.unwrap_or_else(|| INLINE_ARTIFACT.to_owned());
        let parsed = PlanArtifact::from_capture_json(id, capture_json)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(self.inner.analyze_artifact(&parsed))
    }

    fn __repr__(&self) -> String {
        format!(
            "PlanCheckEngine(max_issues={}, fail_on_warnings={})",
            self.inner.config().max_issues,
            self.inner.config().fail_on_warnings
        )
    }
}

/// Analyze a single `EXPLAIN FORMAT=JSON` document with default settings.
///
/// # Errors
///
/// Raises `ValueError` if `plan_json` is not a decodable plan.
#[pyfunction]
#[pyo3(signature = (plan_json, messages=None, artifact=None))]
pub fn analyze_plan(
    plan_json: &str,
    messages: Option<Vec<DiagnosticMessage>>,
    artifact: Option<String>,
) -> PyResult<ArtifactReport> {
    let plan = ExplainPlan::from_json(plan_json).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let id = artifact.unwrap_or_else(|| INLINE_ARTIFACT.to_owned());
    let parsed = PlanArtifact::new(id, plan).with_messages(messages.unwrap_or_default());
    let engine = PlanCheckEngine::new(CheckConfig::default());
    Ok(engine.analyze_artifact(&parsed))
}

/// Remediation record for an issue kind name, or `None` for unknown kinds.
#[pyfunction]
pub fn suggest(kind: &str, table: &str) -> Option<SuggestionRecord> {
    SuggestionMapper::suggest_kind(kind, table)
}

/// Register all PyO3 classes and functions into the Python module.
pub fn register_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPlanCheckEngine>()?;
    m.add_class::<CheckConfig>()?;
    m.add_class::<CheckResult>()?;
    m.add_class::<ArtifactReport>()?;
    m.add_class::<DetectedIssue>()?;
    m.add_class::<SuggestionRecord>()?;
    m.add_class::<DiagnosticMessage>()?;
    m.add_class::<RuleFinding>()?;
    m.add_class::<Severity>()?;
    m.add_class::<Priority>()?;
    m.add_class::<IssueKind>()?;
    m.add_class::<RuleKind>()?;
    m.add_function(wrap_pyfunction!(analyze_plan, m)?)?;
    m.add_function(wrap_pyfunction!(suggest, m)?)?;
    Ok(())
}
