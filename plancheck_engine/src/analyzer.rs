//! Per-node plan classification, the diagnostic pass.
//!
//! Walks every container of the plan (query blocks, ordering and grouping
//! steps, join sequences, derived tables) and classifies each table access:
//!
//! 1. candidate indexes but none chosen → `unused_available_index`
//! 2. otherwise, `access_type = ALL` → `full_table_scan`
//! 3. join buffer in use → `inefficient_join`
//! 4. function wrapping a column in the condition → `function_on_column`
//! 5. leading-wildcard LIKE in the condition → one `inefficient_like`
//!    listing every affected column
//! 6. large scan whose filter keeps most rows → `low_selectivity` (derived)
//!
//! Checks 3-6 are independent of 1-2 and of each other. An ordering step
//! with `using_filesort` yields `filesort_required`; a grouping step with
//! `using_temporary_table` yields `temp_table_required`. Both are checked
//! before descending into the step.
//!
//! The pass is a pure function of its inputs. Root issues keep discovery
//! order and always precede derived ones.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::matcher::{self, PlanNode};
use crate::plan::{ExplainPlan, GroupingOperation, OrderingOperation, PlanBody, TableAccess};
use crate::rules::{self, RuleFinding};
use crate::types::{DetectedIssue, DiagnosticMessage, IssueKind};

/// `filtered` percentage above which a scan counts as barely narrowing.
pub const DEFAULT_FILTERED_PCT: f64 = 90.0;

/// Rows examined per scan above which low selectivity matters.
pub const DEFAULT_MIN_ROWS_EXAMINED: u64 = 100;

/// Attribution used when no table can be named.
pub const UNKNOWN_TABLE: &str = "unknown";

/// Cut-offs for the `low_selectivity` check. Both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectivityThresholds {
    pub filtered_pct: f64,
    pub min_rows_examined: u64,
}

impl Default for SelectivityThresholds {
    fn default() -> Self {
        Self {
            filtered_pct: DEFAULT_FILTERED_PCT,
            min_rows_examined: DEFAULT_MIN_ROWS_EXAMINED,
        }
    }
}

/// Output of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// Per-node issues, root issues first.
    pub issues: Vec<DetectedIssue>,
    /// Rule catalog matches, in catalog order.
    pub findings: Vec<RuleFinding>,
}

impl Analysis {
    /// Per-node issues plus an issue for every message-only catalog finding
    /// (implicit conversions show up in the engine's messages, never in a
    /// plan node). Findings over plan nodes are already classified per node,
    /// where `unused_available_index` stands in for `full_table_scan`.
    /// Still root-first.
    #[must_use]
    pub fn merged_issues(&self) -> Vec<DetectedIssue> {
        let mut merged = self.issues.clone();
        for finding in self.findings.iter().filter(|f| f.kind.is_message_only()) {
            let kind = finding.kind.issue_kind();
            if !self.issues.iter().any(|i| i.kind == kind) {
                merged.push(DetectedIssue::new(kind, UNKNOWN_TABLE, finding.message.clone()));
            }
        }
        merged.sort_by_key(|i| i.priority);
        merged
    }
}

/// Run the per-node walk and the rule catalog over one plan.
#[must_use]
pub fn analyze(
    plan: &ExplainPlan,
    messages: &[DiagnosticMessage],
    thresholds: &SelectivityThresholds,
) -> Analysis {
    let issues = detect_issues(plan, thresholds);
    let findings = rules::evaluate_rules(plan, messages);
    log::debug!(
        "plan analysis: {} issue(s), {} catalog finding(s)",
        issues.len(),
        findings.len()
    );
    Analysis { issues, findings }
}

/// Classify every node of the plan.
///
/// A plan without a query block yields no issues.
#[must_use]
pub fn detect_issues(plan: &ExplainPlan, thresholds: &SelectivityThresholds) -> Vec<DetectedIssue> {
    let mut issues = Vec::new();
    if let Some(ref qb) = plan.query_block {
        walk_body(&qb.body, thresholds, &mut issues);
    }
    finalize(issues)
}

fn walk_body(body: &PlanBody, thresholds: &SelectivityThresholds, out: &mut Vec<DetectedIssue>) {
    if let Some(ref table) = body.table {
        classify_table(table, thresholds, out);
    }
    for step in &body.nested_loop {
        classify_table(&step.table, thresholds, out);
    }
    if let Some(ref ordering) = body.ordering_operation {
        classify_ordering(ordering, thresholds, out);
    }
    if let Some(ref grouping) = body.grouping_operation {
        classify_grouping(grouping, thresholds, out);
    }
}

fn classify_ordering(
    ordering: &OrderingOperation,
    thresholds: &SelectivityThresholds,
    out: &mut Vec<DetectedIssue>,
) {
    if ordering.using_filesort {
        let table = attribution(PlanNode::Ordering(ordering));
        out.push(DetectedIssue::new(
            IssueKind::FilesortRequired,
            table,
            format!(
                "ORDER BY on `{table}` needs a filesort: no index returns rows in the requested order"
            ),
        ));
    }
    walk_body(&ordering.body, thresholds, out);
}

fn classify_grouping(
    grouping: &GroupingOperation,
    thresholds: &SelectivityThresholds,
    out: &mut Vec<DetectedIssue>,
) {
    if grouping.using_temporary_table {
        let table = attribution(PlanNode::Grouping(grouping));
        out.push(DetectedIssue::new(
            IssueKind::TempTableRequired,
            table,
            format!("GROUP BY on `{table}` materializes an internal temporary table"),
        ));
    }
    walk_body(&grouping.body, thresholds, out);
}

fn attribution(node: PlanNode<'_>) -> &str {
    matcher::first_table(node).unwrap_or(UNKNOWN_TABLE)
}

fn classify_table(table: &TableAccess, thresholds: &SelectivityThresholds, out: &mut Vec<DetectedIssue>) {
    let name = if table.table_name.is_empty() {
        UNKNOWN_TABLE
    } else {
        table.table_name.as_str()
    };

    // An ignored candidate index explains the scan better than the scan itself.
    let candidates: Vec<String> = table.candidate_keys().map(str::to_owned).collect();
    if !candidates.is_empty() && table.chosen_key().is_none() {
        out.push(
            DetectedIssue::new(
                IssueKind::UnusedAvailableIndex,
                name,
                format!(
                    "`{name}` has candidate indexes ({}) but the optimizer chose none",
                    candidates.join(", ")
                ),
            )
            .with_indexes(candidates),
        );
    } else if table.access_type.is_full_scan() {
        let rows = table
            .rows_examined_per_scan
            .map(|r| format!(", examining ~{r} rows per scan"))
            .unwrap_or_default();
        out.push(DetectedIssue::new(
            IssueKind::FullTableScan,
            name,
            format!("Full table scan on `{name}`{rows}"),
        ));
    }

    if let Some(buffer) = table.join_buffer() {
        out.push(DetectedIssue::new(
            IssueKind::InefficientJoin,
            name,
            format!("Join on `{name}` uses a join buffer ({buffer}) instead of an index lookup"),
        ));
    }

    if let Some(condition) = table.attached_condition.as_deref() {
        classify_condition(name, condition, out);
    }

    if is_low_selectivity(table, thresholds) {
        let rows = table.rows_examined_per_scan.unwrap_or_default();
        let filtered = table.filtered.unwrap_or_default();
        out.push(DetectedIssue::new(
            IssueKind::LowSelectivity,
            name,
            format!(
                "{filtered:.1}% of the {rows} rows examined per scan on `{name}` pass the filter; \
                 the access path barely narrows the data"
            ),
        ));
    }

    if let Some(qb) = table
        .materialized_from_subquery
        .as_ref()
        .and_then(|sq| sq.query_block.as_ref())
    {
        walk_body(&qb.body, thresholds, out);
    }
}

fn classify_condition(name: &str, condition: &str, out: &mut Vec<DetectedIssue>) {
    let calls = rules::function_calls(condition);
    if !calls.is_empty() {
        let mut functions: Vec<String> = Vec::new();
        let mut columns: Vec<String> = Vec::new();
        for call in &calls {
            let function = format!("{}()", call.function.to_uppercase());
            if !functions.contains(&function) {
                functions.push(function);
            }
            if let Some(ref column) = call.column {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        let target = if columns.is_empty() {
            String::new()
        } else {
            format!(" to {}", quoted_list(&columns))
        };
        out.push(
            DetectedIssue::new(
                IssueKind::FunctionOnColumn,
                name,
                format!(
                    "{} applied{target} in the condition on `{name}` prevents index use",
                    functions.join(", ")
                ),
            )
            .with_columns(columns),
        );
    }

    let like_columns = rules::like_wildcard_columns(condition);
    if !like_columns.is_empty() {
        out.push(
            DetectedIssue::new(
                IssueKind::InefficientLike,
                name,
                format!(
                    "LIKE with a leading wildcard on {} of `{name}` cannot use an index",
                    quoted_list(&like_columns)
                ),
            )
            .with_columns(like_columns),
        );
    }
}

fn is_low_selectivity(table: &TableAccess, thresholds: &SelectivityThresholds) -> bool {
    match (table.filtered, table.rows_examined_per_scan) {
        (Some(filtered), Some(rows)) => {
            filtered > thresholds.filtered_pct && rows > thresholds.min_rows_examined
        }
        _ => false,
    }
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|c| format!("`{c}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drop exact repeats, then put root issues ahead of derived ones.
fn finalize(issues: Vec<DetectedIssue>) -> Vec<DetectedIssue> {
    let mut seen: HashSet<(IssueKind, String, String)> = HashSet::new();
    let mut unique: Vec<DetectedIssue> = issues
        .into_iter()
        .filter(|i| seen.insert((i.kind, i.table.clone(), i.description.clone())))
        .collect();
    // Stable: discovery order survives inside each tier.
    unique.sort_by_key(|i| i.priority);
    unique
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
