//! Capture discovery for the plan check engine.
//!
//! A capture is one JSON document written by the database-facing
//! collaborator: the `EXPLAIN FORMAT=JSON` output for a statement, the
//! `SHOW WARNINGS` rows that came with it, and optionally schema metadata for
//! the tables involved.
//!
//! ```json
//! {
//!   "sql": "SELECT ... FROM users WHERE email LIKE '%@example.com'",
//!   "params": {"domain": "example.com"},
//!   "plan": {"query_block": {...}},
//!   "warnings": [{"level": "Warning", "code": 1739, "message": "..."}],
//!   "schema": {"users": {"columns": [...], "indexes": [...], "row_count": 500}}
//! }
//! ```
//!
//! `sql` and `params` are kept by the collaborator for humans and are not
//! read. `plan` may also be the EXPLAIN text as a JSON string, and a file
//! holding a bare plan (top-level `query_block`) is accepted as a capture
//! with no warnings.
//!
//! Walking uses the `ignore` crate for `.gitignore`-aware traversal, plus
//! `.plancheckignore` files with gitignore-compatible syntax.

use std::collections::HashMap;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Deserialize;

use crate::config::CheckConfig;
use crate::plan::ExplainPlan;
use crate::suggestions::TableSchema;
use crate::types::DiagnosticMessage;

/// Directory names that are never walked.
const HARDCODED_EXCLUDES: &[&str] = &[".git", "target", "node_modules", ".venv", "__pycache__"];

/// Per-directory ignore file honored next to `.gitignore`.
const IGNORE_FILENAME: &str = ".plancheckignore";

// ---------------------------------------------------------------------------
// Artifact model
// ---------------------------------------------------------------------------

/// One plan ready for analysis.
#[derive(Debug, Clone, Default)]
pub struct PlanArtifact {
    /// Identifier used in reports (capture path relative to the root).
    pub id: String,
    pub plan: ExplainPlan,
    pub messages: Vec<DiagnosticMessage>,
    /// Schema metadata keyed by table name.
    pub schema: HashMap<String, TableSchema>,
}

impl PlanArtifact {
    pub fn new(id: impl Into<String>, plan: ExplainPlan) -> Self {
        Self {
            id: id.into(),
            plan,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<DiagnosticMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Parse a capture document.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Parse`] if the text is not a capture or a bare
    /// plan, or if the embedded plan does not decode.
    pub fn from_capture_json(id: impl Into<String>, text: &str) -> Result<Self, CaptureError> {
        let id = id.into();
        let parse_err = |e: String| CaptureError::Parse(id.clone(), e);

        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?;

        if value.get("plan").is_none() && value.get("query_block").is_some() {
            let plan = ExplainPlan::from_value(value).map_err(|e| parse_err(e.to_string()))?;
            return Ok(Self::new(id, plan));
        }

        let doc: CaptureDocument =
            serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
        let plan = match doc.plan {
            serde_json::Value::String(ref text) => ExplainPlan::from_json(text),
            other => ExplainPlan::from_value(other),
        }
        .map_err(|e| parse_err(e.to_string()))?;

        Ok(Self {
            id,
            plan,
            messages: doc.warnings,
            schema: doc.schema,
        })
    }
}

/// On-disk capture layout.
#[derive(Debug, Deserialize)]
struct CaptureDocument {
    plan: serde_json::Value,
    #[serde(default)]
    warnings: Vec<DiagnosticMessage>,
    #[serde(default)]
    schema: HashMap<String, TableSchema>,
}

// ---------------------------------------------------------------------------
// Walking
// ---------------------------------------------------------------------------

/// Walk the project directory and return the relative paths of all captures.
///
/// Respects `.gitignore`, `.plancheckignore`, hardcoded exclusions and the
/// config's `exclude` list; keeps files matching an `include` glob. Paths use
/// forward slashes and are sorted.
pub fn walk_captures(root: &Path, config: &CheckConfig) -> Vec<String> {
    let include = build_globset(&config.include);

    let mut builder = WalkBuilder::new(root);
    builder.git_ignore(true);
    builder.git_global(false);
    builder.git_exclude(false);
    builder.add_custom_ignore_filename(IGNORE_FILENAME);

    let mut captures = Vec::new();

    for entry in builder.build().flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let rel_path = match path.strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };

        if is_in_excluded_dir(&rel_path) || is_config_excluded(&rel_path, config) {
            continue;
        }
        if !include.is_match(&rel_path) {
            continue;
        }

        captures.push(rel_path);
    }

    captures.sort();
    log::debug!("Discovered {} capture(s) under {}", captures.len(), root.display());
    captures
}

/// Read and parse one capture.
///
/// # Errors
///
/// Returns [`CaptureError::Read`] if the file cannot be read and
/// [`CaptureError::Parse`] if it is not a valid capture.
pub fn load_capture(root: &Path, rel_path: &str) -> Result<PlanArtifact, CaptureError> {
    let content = std::fs::read_to_string(root.join(rel_path))
        .map_err(|e| CaptureError::Read(rel_path.to_owned(), e.to_string()))?;
    PlanArtifact::from_capture_json(rel_path, &content)
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => log::warn!("Ignoring invalid include glob '{pattern}': {e}"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        log::warn!("Failed to build include globs: {e}");
        GlobSet::empty()
    })
}

fn is_in_excluded_dir(rel_path: &str) -> bool {
    let mut parts: Vec<&str> = rel_path.split('/').collect();
    parts.pop();
    parts.iter().any(|p| HARDCODED_EXCLUDES.contains(p))
}

fn is_config_excluded(rel_path: &str, config: &CheckConfig) -> bool {
    for pattern in &config.exclude {
        // Directory-style patterns ("fixtures/") match by prefix or segment.
        let normalized = pattern.trim_end_matches('/');
        if !normalized.is_empty()
            && (rel_path.starts_with(&format!("{normalized}/"))
                || rel_path.contains(&format!("/{normalized}/")))
        {
            return true;
        }

        if let Ok(glob) = Glob::new(pattern) {
            if glob.compile_matcher().is_match(rel_path) {
                return true;
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while loading a capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The capture file could not be read.
    #[error("Failed to read capture '{0}': {1}")]
    Read(String, String),

    /// The capture file is not a valid capture document.
    #[error("Failed to parse capture '{0}': {1}")]
    Parse(String, String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::tempdir;

    const BARE_PLAN: &str = r#"{"query_block": {"table": {"table_name": "t", "access_type": "ALL"}}}"#;

    #[test]
    fn test_walk_captures_basic() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("users.explain.json"), BARE_PLAN).unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.md"), "# notes\n").unwrap();

        let captures = walk_captures(dir.path(), &CheckConfig::default());
        assert_eq!(captures, vec!["users.explain.json"]);
    }

    #[test]
    fn test_walk_captures_nested_sorted_forward_slashes() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("api").join("orders");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("list.explain.json"), BARE_PLAN).unwrap();
        fs::write(dir.path().join("api").join("a.explain.json"), BARE_PLAN).unwrap();

        let captures = walk_captures(dir.path(), &CheckConfig::default());
        assert_eq!(captures, vec!["api/a.explain.json", "api/orders/list.explain.json"]);
    }

    #[test]
    fn test_walk_captures_excludes_gitignored() {
        let dir = tempdir().unwrap();
        // The ignore crate only honors .gitignore inside a repository.
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".gitignore"), "stale.explain.json\n").unwrap();
        fs::write(dir.path().join("good.explain.json"), BARE_PLAN).unwrap();
        fs::write(dir.path().join("stale.explain.json"), BARE_PLAN).unwrap();

        let captures = walk_captures(dir.path(), &CheckConfig::default());
        assert_eq!(captures, vec!["good.explain.json"]);
    }

    #[test]
    fn test_walk_captures_honors_plancheckignore() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILENAME), "draft_*\n").unwrap();
        fs::write(dir.path().join("draft_report.explain.json"), BARE_PLAN).unwrap();
        fs::write(dir.path().join("report.explain.json"), BARE_PLAN).unwrap();

        let captures = walk_captures(dir.path(), &CheckConfig::default());
        assert_eq!(captures, vec!["report.explain.json"]);
    }

    #[test]
    fn test_walk_captures_excludes_hardcoded_and_config_dirs() {
        let dir = tempdir().unwrap();
        for sub in ["node_modules", "fixtures"] {
            let d = dir.path().join(sub);
            fs::create_dir_all(&d).unwrap();
            fs::write(d.join("x.explain.json"), BARE_PLAN).unwrap();
        }
        fs::write(dir.path().join("kept.explain.json"), BARE_PLAN).unwrap();

        let config = CheckConfig {
            exclude: vec!["fixtures/".to_owned()],
            ..CheckConfig::default()
        };
        let captures = walk_captures(dir.path(), &config);
        assert_eq!(captures, vec!["kept.explain.json"]);
    }

    #[test]
    fn test_walk_captures_custom_include() {
        let dir = tempdir().unwrap();
        let d = dir.path().join("plans");
        fs::create_dir_all(&d).unwrap();
        fs::write(d.join("q1.json"), BARE_PLAN).unwrap();
        fs::write(dir.path().join("q2.json"), BARE_PLAN).unwrap();

        let config = CheckConfig {
            include: vec!["plans/*.json".to_owned()],
            ..CheckConfig::default()
        };
        assert_eq!(walk_captures(dir.path(), &config), vec!["plans/q1.json"]);
    }

    #[test]
    fn test_load_full_capture() {
        let dir = tempdir().unwrap();
        let capture = indoc! {r#"
            {
              "sql": "SELECT * FROM users WHERE code = 42",
              "params": {"code": 42},
              "plan": {"query_block": {"table": {"table_name": "users", "access_type": "ALL"}}},
              "warnings": [
                {"level": "Warning", "code": 1739, "message": "Cannot use ref access on index 'idx_code' due to type or collation conversion on field 'code'"}
              ],
              "schema": {"users": {"columns": [{"name": "code", "type": "varchar(8)"}], "row_count": 900}}
            }
        "#};
        fs::write(dir.path().join("users.explain.json"), capture).unwrap();

        let artifact = load_capture(dir.path(), "users.explain.json").unwrap();
        assert_eq!(artifact.id, "users.explain.json");
        assert_eq!(artifact.messages.len(), 1);
        assert_eq!(artifact.messages[0].code, 1739);
        assert_eq!(artifact.schema["users"].row_count, Some(900));
        assert!(artifact.plan.query_block.is_some());
    }

    #[test]
    fn test_plan_as_embedded_string() {
        let text = r#"{"plan": "{\"query_block\": {\"select_id\": 1}}"}"#;
        let artifact = PlanArtifact::from_capture_json("s.explain.json", text).unwrap();
        assert_eq!(artifact.plan.query_block.unwrap().select_id, Some(1));
        assert!(artifact.messages.is_empty());
    }

    #[test]
    fn test_bare_plan_is_a_capture() {
        let artifact = PlanArtifact::from_capture_json("bare.explain.json", BARE_PLAN).unwrap();
        assert!(artifact.plan.query_block.is_some());
        assert!(artifact.schema.is_empty());
    }

    #[test]
    fn test_missing_plan_is_parse_error() {
        let err = PlanArtifact::from_capture_json("x.explain.json", r#"{"sql": "SELECT 1"}"#)
            .unwrap_err();
        assert!(matches!(err, CaptureError::Parse(ref id, _) if id == "x.explain.json"));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = load_capture(dir.path(), "gone.explain.json").unwrap_err();
        assert!(matches!(err, CaptureError::Read(..)));
        assert!(err.to_string().contains("gone.explain.json"));
    }
}
