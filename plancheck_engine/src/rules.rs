//! Rule catalog: the fixed table of plan-level anti-patterns.
//!
//! Every [`RuleDefinition`] carries one or more [`Predicate`]s; a rule
//! matches when all of them hold for the `(plan, messages)` pair. Rules are
//! stateless and independent, and [`evaluate_rules`] reports matches in
//! catalog order.
//!
//! This module also owns the text extraction run over `attached_condition`
//! strings: function calls that wrap a column, and LIKE patterns that start
//! with a wildcard.

use once_cell::sync::Lazy;
use pyo3::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matcher::{self, FieldMatch, FieldValue, PlanKey, PlanNode};
use crate::plan::{AccessType, ExplainPlan};
use crate::types::{DiagnosticMessage, IssueKind};

// ---------------------------------------------------------------------------
// Rule kinds and findings
// ---------------------------------------------------------------------------

/// Plan-level anti-pattern kinds, in catalog order.
#[pyclass(eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    FullTableScan,
    IneffectiveJoin,
    FunctionInvalidatesIndex,
    IneffectiveLikePattern,
    ImplicitTypeConversion,
    IneffectiveSort,
    TemporaryTableGrouping,
}

impl RuleKind {
    /// Per-node issue kind describing the same anti-pattern.
    #[must_use]
    pub fn issue_kind(self) -> IssueKind {
        match self {
            Self::FullTableScan => IssueKind::FullTableScan,
            Self::IneffectiveJoin => IssueKind::InefficientJoin,
            Self::FunctionInvalidatesIndex => IssueKind::FunctionOnColumn,
            Self::IneffectiveLikePattern => IssueKind::InefficientLike,
            Self::ImplicitTypeConversion => IssueKind::ImplicitTypeConversion,
            Self::IneffectiveSort => IssueKind::FilesortRequired,
            Self::TemporaryTableGrouping => IssueKind::TempTableRequired,
        }
    }

    /// Whether the rule reads only the engine's messages. Every other rule
    /// inspects plan nodes the per-node walk also classifies.
    #[must_use]
    pub fn is_message_only(self) -> bool {
        RULE_CATALOG
            .iter()
            .filter(|rule| rule.kind == self)
            .all(|rule| {
                rule.predicates
                    .iter()
                    .all(|p| matches!(p, Predicate::MessageContains(_)))
            })
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A catalog rule that matched.
#[pyclass(get_all)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFinding {
    pub kind: RuleKind,
    pub message: String,
}

#[pymethods]
impl RuleFinding {
    fn __repr__(&self) -> String {
        format!("RuleFinding(kind={}, message={:?})", self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Shared interface of everything a rule can test.
pub trait PlanPredicate {
    /// Whether the predicate holds for this plan and message list.
    fn holds(&self, plan: &ExplainPlan, messages: &[DiagnosticMessage]) -> bool;
}

/// Text test applied to a table node's `attached_condition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTest {
    /// A date-extraction or cast function wraps a column.
    FunctionCall,
    /// A LIKE pattern on a quoted identifier starts with a wildcard.
    LeadingWildcardLike,
}

impl ConditionTest {
    #[must_use]
    pub fn matches(self, condition: &str) -> bool {
        match self {
            Self::FunctionCall => has_function_call(condition),
            Self::LeadingWildcardLike => LIKE_WILDCARD_RE.is_match(condition),
        }
    }
}

/// One condition of a rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    /// Some node in the tree carries `key` matching `expected`.
    TreeField {
        key: PlanKey,
        expected: FieldMatch,
    },
    /// Some table node's `attached_condition` passes the test.
    Condition(ConditionTest),
    /// Some message contains one of the substrings.
    MessageContains(&'static [&'static str]),
}

impl PlanPredicate for Predicate {
    fn holds(&self, plan: &ExplainPlan, messages: &[DiagnosticMessage]) -> bool {
        match *self {
            Self::TreeField { key, ref expected } => matcher::exists(plan, key, expected),
            Self::Condition(test) => matcher::any_node(plan, &|node: PlanNode<'_>| match node {
                PlanNode::Table(t) => t
                    .attached_condition
                    .as_deref()
                    .is_some_and(|cond| test.matches(cond)),
                _ => false,
            }),
            Self::MessageContains(needles) => messages
                .iter()
                .any(|m| needles.iter().any(|needle| m.text.contains(needle))),
        }
    }
}

/// A catalog entry: kind, message template and AND-ed predicates.
#[derive(Debug, Clone, Copy)]
pub struct RuleDefinition {
    pub kind: RuleKind,
    pub message: &'static str,
    pub predicates: &'static [Predicate],
}

impl PlanPredicate for RuleDefinition {
    fn holds(&self, plan: &ExplainPlan, messages: &[DiagnosticMessage]) -> bool {
        !self.predicates.is_empty() && self.predicates.iter().all(|p| p.holds(plan, messages))
    }
}

/// Message substrings MySQL emits when it converts a column to compare it.
pub const CONVERSION_MARKERS: &[&str] = &["Converting column", "Implicit conversion"];

/// The catalog. Order here is the order findings are reported in.
pub static RULE_CATALOG: &[RuleDefinition] = &[
    RuleDefinition {
        kind: RuleKind::FullTableScan,
        message: "Full table scan: every row of a table is read",
        predicates: &[Predicate::TreeField {
            key: PlanKey::AccessType,
            expected: FieldMatch::Equals(FieldValue::Access(AccessType::All)),
        }],
    },
    RuleDefinition {
        kind: RuleKind::IneffectiveJoin,
        message: "Join without a usable index falls back to a join buffer",
        predicates: &[Predicate::TreeField {
            key: PlanKey::UsingJoinBuffer,
            expected: FieldMatch::Present,
        }],
    },
    RuleDefinition {
        kind: RuleKind::FunctionInvalidatesIndex,
        message: "A function applied to a column prevents index use",
        predicates: &[Predicate::Condition(ConditionTest::FunctionCall)],
    },
    RuleDefinition {
        kind: RuleKind::IneffectiveLikePattern,
        message: "LIKE pattern with a leading wildcard cannot use an index",
        predicates: &[Predicate::Condition(ConditionTest::LeadingWildcardLike)],
    },
    RuleDefinition {
        kind: RuleKind::ImplicitTypeConversion,
        message: "Implicit type conversion on a compared column",
        predicates: &[Predicate::MessageContains(CONVERSION_MARKERS)],
    },
    RuleDefinition {
        kind: RuleKind::IneffectiveSort,
        message: "ORDER BY requires a filesort",
        predicates: &[Predicate::TreeField {
            key: PlanKey::UsingFilesort,
            expected: FieldMatch::Equals(FieldValue::Bool(true)),
        }],
    },
    RuleDefinition {
        kind: RuleKind::TemporaryTableGrouping,
        message: "GROUP BY materializes a temporary table",
        predicates: &[Predicate::TreeField {
            key: PlanKey::UsingTemporaryTable,
            expected: FieldMatch::Equals(FieldValue::Bool(true)),
        }],
    },
];

/// Evaluate every catalog rule against the plan and messages.
///
/// Findings come back in catalog order, at most one per rule.
#[must_use]
pub fn evaluate_rules(plan: &ExplainPlan, messages: &[DiagnosticMessage]) -> Vec<RuleFinding> {
    RULE_CATALOG
        .iter()
        .filter(|rule| rule.holds(plan, messages))
        .map(|rule| RuleFinding {
            kind: rule.kind,
            message: rule.message.to_owned(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Condition text extraction
// ---------------------------------------------------------------------------

/// Functions that hide a column from the index: date extraction and casts.
/// The argument's first back-quoted identifier is the wrapped column.
static FUNCTION_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(year|month|day|date|date_format|extract|cast|convert)\s*\(\s*(?:[^`()]*?)(?:`[^`]+`\.)*`([^`]+)`",
    )
    .expect("function call regex is valid")
});

/// Bare function-name marker, used when no quoted column follows.
static FUNCTION_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(year|month|day|date|date_format|extract|cast|convert)\s*\(")
        .expect("function marker regex is valid")
});

/// `` `col` like '%…' `` with an optional charset introducer.
static LIKE_WILDCARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)`([^`]+)`\s+like\s+(?:_[a-z0-9]+\s*)?'[%_]")
        .expect("like wildcard regex is valid")
});

/// A function call found in a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// Lowercased function name.
    pub function: String,
    /// The column wrapped by the call, qualifiers stripped.
    pub column: Option<String>,
}

fn has_function_call(condition: &str) -> bool {
    FUNCTION_MARKER_RE.is_match(condition)
}

/// Every recognized function call in `condition`, deduplicated in
/// first-seen order.
#[must_use]
pub fn function_calls(condition: &str) -> Vec<FunctionCall> {
    let mut calls: Vec<FunctionCall> = Vec::new();

    for marker in FUNCTION_MARKER_RE.find_iter(condition) {
        let rest = &condition[marker.start()..];
        let call = match FUNCTION_CALL_RE.captures(rest) {
            // Only accept a column match that belongs to this call.
            Some(cap) if cap.get(0).is_some_and(|m| m.start() == 0) => FunctionCall {
                function: cap[1].to_lowercase(),
                column: Some(cap[2].to_owned()),
            },
            _ => FunctionCall {
                function: FUNCTION_MARKER_RE
                    .captures(rest)
                    .map(|c| c[1].to_lowercase())
                    .unwrap_or_default(),
                column: None,
            },
        };
        if !calls.contains(&call) {
            calls.push(call);
        }
    }

    calls
}

/// Columns compared with a LIKE pattern that starts with `%` or `_`.
///
/// Qualified names (`` `db`.`t`.`col` ``) yield the bare column. Duplicates
/// are dropped, first-seen order kept.
#[must_use]
pub fn like_wildcard_columns(condition: &str) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for cap in LIKE_WILDCARD_RE.captures_iter(condition) {
        let column = cap[1].to_owned();
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    columns
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
