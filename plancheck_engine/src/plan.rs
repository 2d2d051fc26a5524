//! Typed model of a MySQL `EXPLAIN FORMAT=JSON` document.
//!
//! The document is a tree whose shape is not fixed: a query block may hold a
//! single table, a `nested_loop` of join steps, an `ordering_operation`, a
//! `grouping_operation`, or any mix of them, and the two operations wrap the
//! same body shape again. [`PlanBody`] is that shared shape; every container
//! flattens one in, so nesting depth is unbounded.
//!
//! Keys the analyzer does not look at (cost info, used columns, ...) are
//! ignored when decoding.

use serde::{Deserialize, Deserializer, Serialize};

/// Root of a decoded plan.
///
/// A document without `query_block` is still valid; it simply has nothing
/// to analyze.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_block: Option<QueryBlock>,
}

impl ExplainPlan {
    /// Decode a plan from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Decode`] if the text is not valid JSON or a known
    /// key has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a plan from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Decode`] if a known key has the wrong type.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PlanError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Root container of a (sub)query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_id: Option<u64>,

    #[serde(flatten)]
    pub body: PlanBody,
}

/// The sub-nodes any container may hold. All of them are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableAccess>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_loop: Vec<JoinStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering_operation: Option<Box<OrderingOperation>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping_operation: Option<Box<GroupingOperation>>,
}

/// One entry of a `nested_loop` join sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinStep {
    pub table: TableAccess,
}

/// ORDER BY step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderingOperation {
    #[serde(default)]
    pub using_filesort: bool,

    #[serde(flatten)]
    pub body: PlanBody,
}

/// GROUP BY step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingOperation {
    #[serde(default)]
    pub using_temporary_table: bool,

    #[serde(default)]
    pub using_filesort: bool,

    #[serde(flatten)]
    pub body: PlanBody,
}

/// Derived table materialized from a subquery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subquery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_block: Option<QueryBlock>,
}

/// Access to a single table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableAccess {
    /// Table name or alias as the optimizer reports it.
    #[serde(default)]
    pub table_name: String,

    #[serde(default)]
    pub access_type: AccessType,

    /// Indexes the optimizer considered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_keys: Option<Vec<String>>,

    /// Index actually chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(
        default,
        alias = "rows",
        deserialize_with = "lenient_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub rows_examined_per_scan: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub rows_produced_per_join: Option<u64>,

    /// Estimated percentage (0-100) of examined rows that survive the filter.
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub filtered: Option<f64>,

    /// Raw pushed-down predicate text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_condition: Option<String>,

    /// Join buffer strategy, e.g. `"hash join"` or `"Block Nested Loop"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using_join_buffer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materialized_from_subquery: Option<Box<Subquery>>,
}

impl TableAccess {
    /// Candidate indexes, ignoring blank names.
    pub fn candidate_keys(&self) -> impl Iterator<Item = &str> {
        self.possible_keys
            .iter()
            .flatten()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }

    /// The chosen index, treating an empty string as no index.
    #[must_use]
    pub fn chosen_key(&self) -> Option<&str> {
        self.key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Join buffer strategy, treating an empty string as absent.
    #[must_use]
    pub fn join_buffer(&self) -> Option<&str> {
        self.using_join_buffer
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

/// How rows are read from a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "const")]
    Const,
    #[serde(rename = "eq_ref")]
    EqRef,
    #[serde(rename = "ref")]
    Ref,
    #[serde(rename = "fulltext")]
    Fulltext,
    #[serde(rename = "ref_or_null")]
    RefOrNull,
    #[serde(rename = "index_merge")]
    IndexMerge,
    #[serde(rename = "unique_subquery")]
    UniqueSubquery,
    #[serde(rename = "index_subquery")]
    IndexSubquery,
    /// Index range scan.
    #[serde(rename = "range")]
    Range,
    /// Full index scan.
    #[serde(rename = "index")]
    Index,
    /// Full table scan.
    #[serde(rename = "ALL")]
    All,
    #[default]
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl AccessType {
    /// Whether every row of the table is read.
    #[must_use]
    pub fn is_full_scan(self) -> bool {
        self == Self::All
    }
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::Const => "const",
            Self::EqRef => "eq_ref",
            Self::Ref => "ref",
            Self::Fulltext => "fulltext",
            Self::RefOrNull => "ref_or_null",
            Self::IndexMerge => "index_merge",
            Self::UniqueSubquery => "unique_subquery",
            Self::IndexSubquery => "index_subquery",
            Self::Range => "range",
            Self::Index => "index",
            Self::All => "ALL",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Lenient numeric decoding
// ---------------------------------------------------------------------------

/// MySQL prints some estimates as strings (`"filtered": "95.00"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| E::custom(format!("invalid number {s:?}: {e}"))),
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_f64)
        .transpose()
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_f64(deserializer)?;
    // Estimates are never negative; clamp instead of rejecting the plan.
    Ok(value.map(|v| v.max(0.0).round() as u64))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while decoding a plan document.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The document is not valid JSON or does not fit the plan shape.
    #[error("Failed to decode execution plan: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
