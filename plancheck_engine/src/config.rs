//! Configuration loading and resolution for the plan check engine.
//!
//! Supports a 4-level configuration resolution order:
//! 1. `plancheck.toml` (project root)
//! 2. `[tool.plancheck.check]` section in `pyproject.toml`
//! 3. `[check]` section in `plancheck.yaml` / `plancheck.yml`
//! 4. Built-in defaults
//!
//! Per-path overrides allow different severities for different capture
//! subtrees (e.g., treating `reports/` sorts as info but `api/` sorts as
//! errors).

use std::collections::HashMap;
use std::path::Path;

use globset::Glob;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analyzer::SelectivityThresholds;
use crate::types::{IssueKind, Severity};

// ---------------------------------------------------------------------------
// Rule severity override
// ---------------------------------------------------------------------------

/// Per-kind severity override, or `Off` to drop the kind entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverityOverride {
    Error,
    Warning,
    Info,
    Off,
}

impl RuleSeverityOverride {
    fn severity(self) -> Option<Severity> {
        match self {
            Self::Error => Some(Severity::Error),
            Self::Warning => Some(Severity::Warning),
            Self::Info => Some(Severity::Info),
            Self::Off => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-path override
// ---------------------------------------------------------------------------

/// Per-path overrides using glob patterns.
///
/// The last matching entry wins when several globs match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerPathOverride {
    /// Glob matched against the capture path relative to the project root.
    pub path: String,
    /// Issue kind → severity override for captures matching this glob.
    pub rules: HashMap<String, RuleSeverityOverride>,
}

// ---------------------------------------------------------------------------
// Main config
// ---------------------------------------------------------------------------

/// Complete check engine configuration.
///
/// Loaded via the 4-level resolution order, then optionally overridden
/// from Python before the engine is built.
#[pyclass]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Whether warnings should fail the check.
    pub fail_on_warnings: bool,

    /// Maximum number of issues to report across all artifacts (0 = unlimited).
    pub max_issues: usize,

    /// Globs selecting capture files.
    pub include: Vec<String>,

    /// Additional exclusion globs (beyond `.gitignore` / `.plancheckignore`).
    pub exclude: Vec<String>,

    /// Whether reports carry suggestion records.
    pub include_suggestions: bool,

    /// Cut-offs for the `low_selectivity` check.
    pub selectivity: SelectivityThresholds,

    /// Per-kind severity overrides (issue kind name → override).
    pub rules: HashMap<String, RuleSeverityOverride>,

    /// Per-path overrides (last match wins).
    pub per_path: Vec<PerPathOverride>,

    /// Comma-separated issue kinds (or prefixes) to keep.
    pub select: Option<String>,

    /// Comma-separated issue kinds (or prefixes) to drop.
    pub exclude_rules: Option<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            fail_on_warnings: false,
            max_issues: 500,
            include: vec!["**/*.explain.json".to_owned()],
            exclude: vec!["target/".to_owned(), "node_modules/".to_owned(), ".venv/".to_owned()],
            include_suggestions: true,
            selectivity: SelectivityThresholds::default(),
            rules: HashMap::new(),
            per_path: Vec::new(),
            select: None,
            exclude_rules: None,
        }
    }
}

#[pymethods]
impl CheckConfig {
    /// Create a new `CheckConfig` with built-in defaults.
    #[new]
    fn py_new() -> Self {
        Self::default()
    }

    /// Resolve the configuration for a project root.
    #[staticmethod]
    #[pyo3(name = "load")]
    fn py_load(root: &str) -> PyResult<Self> {
        Self::load_from_project(Path::new(root))
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[getter]
    fn get_fail_on_warnings(&self) -> bool {
        self.fail_on_warnings
    }

    #[setter]
    fn set_fail_on_warnings(&mut self, value: bool) {
        self.fail_on_warnings = value;
    }

    /// Maximum number of issues to report.
    #[getter]
    fn get_max_issues(&self) -> usize {
        self.max_issues
    }

    #[setter]
    fn set_max_issues(&mut self, value: usize) {
        self.max_issues = value;
    }

    #[getter]
    fn get_include_suggestions(&self) -> bool {
        self.include_suggestions
    }

    #[setter]
    fn set_include_suggestions(&mut self, value: bool) {
        self.include_suggestions = value;
    }

    /// `filtered` percentage above which a large scan is flagged.
    #[getter]
    fn get_filtered_pct(&self) -> f64 {
        self.selectivity.filtered_pct
    }

    #[setter]
    fn set_filtered_pct(&mut self, value: f64) {
        self.selectivity.filtered_pct = value;
    }

    /// Rows examined per scan above which selectivity is checked.
    #[getter]
    fn get_min_rows_examined(&self) -> u64 {
        self.selectivity.min_rows_examined
    }

    #[setter]
    fn set_min_rows_examined(&mut self, value: u64) {
        self.selectivity.min_rows_examined = value;
    }

    /// Comma-separated issue kinds to select.
    #[getter]
    fn get_select(&self) -> Option<String> {
        self.select.clone()
    }

    #[setter]
    fn set_select(&mut self, value: Option<String>) {
        self.select = value;
    }

    /// Comma-separated issue kinds to exclude.
    #[getter]
    fn get_exclude_rules(&self) -> Option<String> {
        self.exclude_rules.clone()
    }

    #[setter]
    fn set_exclude_rules(&mut self, value: Option<String>) {
        self.exclude_rules = value;
    }

    /// Set a global severity override (`error`, `warning`, `info` or `off`).
    fn set_rule(&mut self, kind: &str, level: &str) -> PyResult<()> {
        let level = parse_rule_severity(level).ok_or_else(|| {
            pyo3::exceptions::PyValueError::new_err(format!("Unknown rule level '{level}'"))
        })?;
        let known = IssueKind::from_name(kind);
        if known == IssueKind::Unknown {
            return Err(pyo3::exceptions::PyValueError::new_err(format!(
                "Unknown issue kind '{kind}'"
            )));
        }
        self.rules.insert(known.as_str().to_owned(), level);
        Ok(())
    }

    fn __repr__(&self) -> String {
        format!(
            "CheckConfig(fail_on_warnings={}, max_issues={}, filtered_pct={}, min_rows_examined={})",
            self.fail_on_warnings,
            self.max_issues,
            self.selectivity.filtered_pct,
            self.selectivity.min_rows_examined,
        )
    }
}

// ---------------------------------------------------------------------------
// File deserialization helpers
// ---------------------------------------------------------------------------

/// Raw TOML structure for `plancheck.toml`.
#[derive(Debug, Deserialize)]
struct TomlCheckFile {
    check: Option<CheckSection>,
}

/// The `[check]` section, shared by all three file formats.
#[derive(Debug, Deserialize)]
struct CheckSection {
    fail_on_warnings: Option<bool>,
    max_issues: Option<usize>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    include_suggestions: Option<bool>,
    selectivity: Option<SelectivitySection>,
    rules: Option<HashMap<String, String>>,
    per_path: Option<Vec<PerPathSection>>,
}

#[derive(Debug, Deserialize)]
struct SelectivitySection {
    filtered_pct: Option<f64>,
    min_rows_examined: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PerPathSection {
    path: String,
    rules: Option<HashMap<String, String>>,
}

/// Raw TOML structure for `pyproject.toml` with `[tool.plancheck.check]`.
#[derive(Debug, Deserialize)]
struct PyprojectToml {
    tool: Option<PyprojectTool>,
}

#[derive(Debug, Deserialize)]
struct PyprojectTool {
    plancheck: Option<PyprojectPlancheck>,
}

#[derive(Debug, Deserialize)]
struct PyprojectPlancheck {
    check: Option<CheckSection>,
}

/// Raw YAML structure for `plancheck.yaml`.
#[derive(Debug, Deserialize)]
struct PlancheckYaml {
    check: Option<CheckSection>,
}

/// Parse a string level into a [`RuleSeverityOverride`].
fn parse_rule_severity(s: &str) -> Option<RuleSeverityOverride> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(RuleSeverityOverride::Error),
        "warning" | "warn" => Some(RuleSeverityOverride::Warning),
        "info" => Some(RuleSeverityOverride::Info),
        "off" | "disabled" | "false" => Some(RuleSeverityOverride::Off),
        _ => None,
    }
}

/// Parse a `kind = level` table, skipping entries that name no known kind
/// or no known level.
fn parse_rule_table(rules: &HashMap<String, String>) -> HashMap<String, RuleSeverityOverride> {
    let mut parsed = HashMap::new();
    for (kind, level) in rules {
        let known = IssueKind::from_name(kind);
        if known == IssueKind::Unknown {
            log::warn!("Ignoring config override for unknown issue kind '{kind}'");
            continue;
        }
        match parse_rule_severity(level) {
            Some(sev) => {
                parsed.insert(known.as_str().to_owned(), sev);
            }
            None => log::warn!("Ignoring unknown level '{level}' for issue kind '{kind}'"),
        }
    }
    parsed
}

/// Apply a [`CheckSection`] onto a [`CheckConfig`], overriding any set values.
fn apply_section(config: &mut CheckConfig, section: &CheckSection) {
    if let Some(v) = section.fail_on_warnings {
        config.fail_on_warnings = v;
    }
    if let Some(v) = section.max_issues {
        config.max_issues = v;
    }
    if let Some(ref v) = section.include {
        config.include = v.clone();
    }
    if let Some(ref v) = section.exclude {
        config.exclude = v.clone();
    }
    if let Some(v) = section.include_suggestions {
        config.include_suggestions = v;
    }
    if let Some(ref sel) = section.selectivity {
        if let Some(v) = sel.filtered_pct {
            config.selectivity.filtered_pct = v;
        }
        if let Some(v) = sel.min_rows_examined {
            config.selectivity.min_rows_examined = v;
        }
    }
    if let Some(ref rules) = section.rules {
        config.rules.extend(parse_rule_table(rules));
    }
    if let Some(ref per_path) = section.per_path {
        for pp in per_path {
            config.per_path.push(PerPathOverride {
                path: pp.path.clone(),
                rules: pp.rules.as_ref().map(parse_rule_table).unwrap_or_default(),
            });
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.display().to_string(), e.to_string()))
}

impl CheckConfig {
    /// Load configuration from the project root using the 4-level resolution order.
    ///
    /// 1. `plancheck.toml` (project root)
    /// 2. `[tool.plancheck.check]` in `pyproject.toml`
    /// 3. `[check]` in `plancheck.yaml` / `plancheck.yml`
    /// 4. Built-in defaults
    ///
    /// First file found wins; later files are not consulted. A
    /// `pyproject.toml` or YAML file without the section is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `plancheck.toml` cannot be read or parsed, or if a
    /// found `pyproject.toml` / YAML file cannot be read.
    pub fn load_from_project(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // 1. plancheck.toml
        let check_toml = root.join("plancheck.toml");
        if check_toml.is_file() {
            let content = read_file(&check_toml)?;
            let parsed: TomlCheckFile = toml::from_str(&content).map_err(|e| {
                ConfigError::ParseError(check_toml.display().to_string(), e.to_string())
            })?;
            if let Some(ref section) = parsed.check {
                apply_section(&mut config, section);
            }
            log::debug!("Loaded configuration from {}", check_toml.display());
            return Ok(config);
        }

        // 2. pyproject.toml [tool.plancheck.check]
        let pyproject = root.join("pyproject.toml");
        if pyproject.is_file() {
            let content = read_file(&pyproject)?;
            if let Ok(parsed) = toml::from_str::<PyprojectToml>(&content) {
                if let Some(section) = parsed
                    .tool
                    .and_then(|t| t.plancheck)
                    .and_then(|p| p.check)
                {
                    apply_section(&mut config, &section);
                    log::debug!("Loaded configuration from {}", pyproject.display());
                    return Ok(config);
                }
            }
        }

        // 3. plancheck.yaml [check] or plancheck.yml [check]
        for name in &["plancheck.yaml", "plancheck.yml"] {
            let yaml_path = root.join(name);
            if yaml_path.is_file() {
                let content = read_file(&yaml_path)?;
                if let Ok(parsed) = serde_yaml::from_str::<PlancheckYaml>(&content) {
                    if let Some(ref section) = parsed.check {
                        apply_section(&mut config, section);
                        log::debug!("Loaded configuration from {}", yaml_path.display());
                        return Ok(config);
                    }
                }
            }
        }

        // 4. Built-in defaults (already set)
        Ok(config)
    }

    /// Whether issues of `kind` are reported at all, considering the
    /// select/exclude filters and the global override.
    #[must_use]
    pub fn is_kind_enabled(&self, kind: IssueKind) -> bool {
        self.is_selected(kind) && self.rules.get(kind.as_str()) != Some(&RuleSeverityOverride::Off)
    }

    /// Like [`is_kind_enabled`](Self::is_kind_enabled), but a per-path
    /// override for the capture takes precedence over the global one.
    #[must_use]
    pub fn is_kind_enabled_for_path(&self, kind: IssueKind, file_path: &str) -> bool {
        match self.path_override(kind, file_path) {
            Some(over) => over != RuleSeverityOverride::Off && self.is_selected(kind),
            None => self.is_kind_enabled(kind),
        }
    }

    fn is_selected(&self, kind: IssueKind) -> bool {
        let name = kind.as_str();
        if let Some(ref select) = self.select {
            if !list_matches(select, name) {
                return false;
            }
        }
        if let Some(ref exclude) = self.exclude_rules {
            if list_matches(exclude, name) {
                return false;
            }
        }
        true
    }

    /// Severity for `kind`: the global override if configured, else `default`.
    #[must_use]
    pub fn effective_severity(&self, kind: IssueKind, default: Severity) -> Severity {
        self.rules
            .get(kind.as_str())
            .and_then(|o| o.severity())
            .unwrap_or(default)
    }

    /// Severity for `kind` in one capture: per-path override first (last
    /// matching entry wins), then the global override, then `default`.
    #[must_use]
    pub fn effective_severity_for_path(
        &self,
        kind: IssueKind,
        file_path: &str,
        default: Severity,
    ) -> Severity {
        match self.path_override(kind, file_path).and_then(|o| o.severity()) {
            Some(sev) => sev,
            None => self.effective_severity(kind, default),
        }
    }

    fn path_override(&self, kind: IssueKind, file_path: &str) -> Option<RuleSeverityOverride> {
        for pp in self.per_path.iter().rev() {
            let Some(over) = pp.rules.get(kind.as_str()) else {
                continue;
            };
            match Glob::new(&pp.path) {
                Ok(glob) if glob.compile_matcher().is_match(file_path) => return Some(*over),
                Ok(_) => {}
                Err(e) => log::warn!("Invalid per_path glob '{}': {e}", pp.path),
            }
        }
        None
    }
}

/// Whether a comma-separated selection list names `kind` exactly or by prefix.
fn list_matches(list: &str, kind: &str) -> bool {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .any(|s| kind == s || kind.starts_with(s))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{0}': {1}")]
    ReadError(String, String),

    /// Failed to parse a configuration file.
    #[error("Failed to parse config file '{0}': {1}")]
    ParseError(String, String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert!(!config.fail_on_warnings);
        assert_eq!(config.max_issues, 500);
        assert_eq!(config.include, vec!["**/*.explain.json"]);
        assert!(config.include_suggestions);
        assert_eq!(config.selectivity.filtered_pct, 90.0);
        assert_eq!(config.selectivity.min_rows_examined, 100);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_kind_enabled_by_default() {
        let config = CheckConfig::default();
        for kind in IssueKind::KNOWN {
            assert!(config.is_kind_enabled(kind));
        }
    }

    #[test]
    fn test_kind_override_off() {
        let mut config = CheckConfig::default();
        config
            .rules
            .insert("low_selectivity".to_owned(), RuleSeverityOverride::Off);
        assert!(!config.is_kind_enabled(IssueKind::LowSelectivity));
        assert!(config.is_kind_enabled(IssueKind::FullTableScan));
    }

    #[test]
    fn test_effective_severity_override() {
        let mut config = CheckConfig::default();
        config
            .rules
            .insert("full_table_scan".to_owned(), RuleSeverityOverride::Error);
        assert_eq!(
            config.effective_severity(IssueKind::FullTableScan, Severity::Warning),
            Severity::Error
        );
        assert_eq!(
            config.effective_severity(IssueKind::FilesortRequired, Severity::Warning),
            Severity::Warning
        );
    }

    #[test]
    fn test_select_filter() {
        let config = CheckConfig {
            select: Some("full_table_scan, inefficient".to_owned()),
            ..CheckConfig::default()
        };
        assert!(config.is_kind_enabled(IssueKind::FullTableScan));
        assert!(config.is_kind_enabled(IssueKind::InefficientJoin));
        assert!(config.is_kind_enabled(IssueKind::InefficientLike));
        assert!(!config.is_kind_enabled(IssueKind::FilesortRequired));
    }

    #[test]
    fn test_exclude_filter() {
        let config = CheckConfig {
            exclude_rules: Some("low_selectivity".to_owned()),
            ..CheckConfig::default()
        };
        assert!(!config.is_kind_enabled(IssueKind::LowSelectivity));
        assert!(config.is_kind_enabled(IssueKind::TempTableRequired));
    }

    #[test]
    fn test_load_nonexistent_dir() {
        let config = CheckConfig::load_from_project(Path::new("/nonexistent/plancheck"));
        assert!(config.is_ok());
        assert_eq!(config.unwrap().max_issues, 500);
    }

    #[test]
    fn test_parse_rule_severity() {
        assert_eq!(parse_rule_severity("ERROR"), Some(RuleSeverityOverride::Error));
        assert_eq!(parse_rule_severity("warn"), Some(RuleSeverityOverride::Warning));
        assert_eq!(parse_rule_severity("info"), Some(RuleSeverityOverride::Info));
        assert_eq!(parse_rule_severity("disabled"), Some(RuleSeverityOverride::Off));
        assert_eq!(parse_rule_severity("fatal"), None);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let content = indoc! {r#"
            [check]
            fail_on_warnings = true
            max_issues = 50
            include = ["captures/**/*.json"]
            include_suggestions = false

            [check.selectivity]
            filtered_pct = 75.0
            min_rows_examined = 1000

            [check.rules]
            filesort_required = "error"
            low_selectivity = "off"
            not_a_kind = "error"

            [[check.per_path]]
            path = "reports/**"
            rules = { filesort_required = "info" }
        "#};
        std::fs::write(dir.path().join("plancheck.toml"), content).unwrap();
        let config = CheckConfig::load_from_project(dir.path()).unwrap();
        assert!(config.fail_on_warnings);
        assert_eq!(config.max_issues, 50);
        assert_eq!(config.include, vec!["captures/**/*.json"]);
        assert!(!config.include_suggestions);
        assert_eq!(config.selectivity.filtered_pct, 75.0);
        assert_eq!(config.selectivity.min_rows_examined, 1000);
        assert_eq!(config.rules.len(), 2);
        assert!(!config.is_kind_enabled(IssueKind::LowSelectivity));
        assert_eq!(
            config.effective_severity_for_path(
                IssueKind::FilesortRequired,
                "api/list.explain.json",
                Severity::Warning
            ),
            Severity::Error
        );
        assert_eq!(
            config.effective_severity_for_path(
                IssueKind::FilesortRequired,
                "reports/monthly.explain.json",
                Severity::Warning
            ),
            Severity::Info
        );
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plancheck.toml"), "[check\nmax_issues = ").unwrap();
        let err = CheckConfig::load_from_project(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_load_from_pyproject_toml() {
        let dir = tempfile::tempdir().unwrap();
        let content = indoc! {r#"
            [project]
            name = "shop-api"

            [tool.plancheck.check]
            fail_on_warnings = true
            exclude = ["fixtures/"]
        "#};
        std::fs::write(dir.path().join("pyproject.toml"), content).unwrap();
        let config = CheckConfig::load_from_project(dir.path()).unwrap();
        assert!(config.fail_on_warnings);
        assert_eq!(config.exclude, vec!["fixtures/"]);
    }

    #[test]
    fn test_pyproject_without_section_falls_through_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"x\"\n").unwrap();
        let yaml = indoc! {"
            check:
              max_issues: 7
              rules:
                temp_table_required: error
        "};
        std::fs::write(dir.path().join("plancheck.yml"), yaml).unwrap();
        let config = CheckConfig::load_from_project(dir.path()).unwrap();
        assert_eq!(config.max_issues, 7);
        assert_eq!(
            config.effective_severity(IssueKind::TempTableRequired, Severity::Warning),
            Severity::Error
        );
    }

    #[test]
    fn test_toml_file_wins_over_pyproject() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plancheck.toml"), "[check]\nmax_issues = 1\n").unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.plancheck.check]\nmax_issues = 2\n",
        )
        .unwrap();
        let config = CheckConfig::load_from_project(dir.path()).unwrap();
        assert_eq!(config.max_issues, 1);
    }

    #[test]
    fn test_per_path_override() {
        let mut config = CheckConfig::default();
        config.per_path.push(PerPathOverride {
            path: "legacy/**".to_owned(),
            rules: HashMap::from([("full_table_scan".to_owned(), RuleSeverityOverride::Off)]),
        });
        assert!(!config.is_kind_enabled_for_path(IssueKind::FullTableScan, "legacy/report.explain.json"));
        assert!(config.is_kind_enabled_for_path(IssueKind::FullTableScan, "api/users.explain.json"));
    }

    #[test]
    fn test_per_path_reenables_globally_disabled_kind() {
        let mut config = CheckConfig::default();
        config
            .rules
            .insert("inefficient_like".to_owned(), RuleSeverityOverride::Off);
        config.per_path.push(PerPathOverride {
            path: "search/**".to_owned(),
            rules: HashMap::from([("inefficient_like".to_owned(), RuleSeverityOverride::Error)]),
        });
        assert!(config.is_kind_enabled_for_path(IssueKind::InefficientLike, "search/q.explain.json"));
        assert!(!config.is_kind_enabled_for_path(IssueKind::InefficientLike, "api/q.explain.json"));
    }

    #[test]
    fn test_last_matching_per_path_wins() {
        let mut config = CheckConfig::default();
        config.per_path.push(PerPathOverride {
            path: "api/**".to_owned(),
            rules: HashMap::from([("filesort_required".to_owned(), RuleSeverityOverride::Info)]),
        });
        config.per_path.push(PerPathOverride {
            path: "api/orders/**".to_owned(),
            rules: HashMap::from([("filesort_required".to_owned(), RuleSeverityOverride::Error)]),
        });
        assert_eq!(
            config.effective_severity_for_path(
                IssueKind::FilesortRequired,
                "api/orders/list.explain.json",
                Severity::Warning
            ),
            Severity::Error
        );
        assert_eq!(
            config.effective_severity_for_path(
                IssueKind::FilesortRequired,
                "api/users.explain.json",
                Severity::Warning
            ),
            Severity::Info
        );
    }
}
