//! Suggestion mapper: issue kind → remediation template.
//!
//! A fixed, exhaustive lookup with no database access. Every template embeds
//! the table name in its description and example. When per-table schema
//! metadata is available the templates mention existing indexes, row counts
//! and column types; without it they fall back to generic text.
//!
//! [`IssueKind::Unknown`] maps to `None` and callers skip it.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::{DetectedIssue, IssueKind, SuggestionRecord};

// ---------------------------------------------------------------------------
// Schema metadata
// ---------------------------------------------------------------------------

/// Optional metadata about one table, supplied by the capture collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    /// Approximate row count (`information_schema.TABLES.TABLE_ROWS`).
    pub row_count: Option<u64>,
    /// Data size in bytes.
    pub data_length: Option<u64>,
}

impl TableSchema {
    fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Indexes whose leading column is `column`.
    fn indexes_leading_with(&self, column: &str) -> Vec<&IndexInfo> {
        self.indexes
            .iter()
            .filter(|i| {
                i.columns
                    .first()
                    .is_some_and(|c| c.eq_ignore_ascii_case(column))
            })
            .collect()
    }

    fn size_note(&self) -> String {
        match (self.row_count, self.data_length) {
            (Some(rows), Some(bytes)) => format!(" (~{rows} rows, {})", human_size(bytes)),
            (Some(rows), None) => format!(" (~{rows} rows)"),
            (None, Some(bytes)) => format!(" ({})", human_size(bytes)),
            (None, None) => String::new(),
        }
    }

    fn index_summary(&self) -> Option<String> {
        if self.indexes.is_empty() {
            return None;
        }
        Some(
            self.indexes
                .iter()
                .map(|i| format!("{} ({})", i.name, i.columns.join(", ")))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnInfo {
    pub name: String,
    /// SQL type as reported by the server, e.g. `varchar(64)`.
    #[serde(alias = "type")]
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexInfo {
    pub name: String,
    /// Indexed columns in key order.
    pub columns: Vec<String>,
    pub unique: bool,
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

/// Stateless issue → suggestion mapper.
pub struct SuggestionMapper;

impl SuggestionMapper {
    /// Remediation for one issue, or `None` for an unrecognized kind.
    #[must_use]
    pub fn suggest(issue: &DetectedIssue, schema: Option<&TableSchema>) -> Option<SuggestionRecord> {
        let ctx = Context {
            table: issue.table.as_str(),
            columns: &issue.columns,
            indexes: &issue.indexes,
            schema,
        };
        let record = match issue.kind {
            IssueKind::FullTableScan => full_table_scan(&ctx),
            IssueKind::UnusedAvailableIndex => unused_available_index(&ctx),
            IssueKind::InefficientJoin => inefficient_join(&ctx),
            IssueKind::FunctionOnColumn => function_on_column(&ctx),
            IssueKind::InefficientLike => inefficient_like(&ctx),
            IssueKind::LowSelectivity => low_selectivity(&ctx),
            IssueKind::FilesortRequired => filesort_required(&ctx),
            IssueKind::TempTableRequired => temp_table_required(&ctx),
            IssueKind::ImplicitTypeConversion => implicit_type_conversion(&ctx),
            IssueKind::Unknown => return None,
        };
        Some(SuggestionRecord {
            kind: issue.kind,
            table: issue.table.clone(),
            ..record
        })
    }

    /// Remediation for a raw kind name. Unrecognized names give `None`.
    #[must_use]
    pub fn suggest_kind(kind_name: &str, table: &str) -> Option<SuggestionRecord> {
        let kind = IssueKind::from_name(kind_name);
        if kind == IssueKind::Unknown {
            log::debug!("no suggestion template for issue kind {kind_name:?}");
            return None;
        }
        Self::suggest(&DetectedIssue::new(kind, table, String::new()), None)
    }

    /// One record per issue, grouped by table. Unknown kinds are skipped.
    #[must_use]
    pub fn suggest_all(
        issues: &[DetectedIssue],
        schemas: &HashMap<String, TableSchema>,
    ) -> BTreeMap<String, Vec<SuggestionRecord>> {
        let mut grouped: BTreeMap<String, Vec<SuggestionRecord>> = BTreeMap::new();
        for issue in issues {
            if let Some(record) = Self::suggest(issue, schemas.get(&issue.table)) {
                grouped.entry(issue.table.clone()).or_default().push(record);
            }
        }
        grouped
    }
}

struct Context<'a> {
    table: &'a str,
    columns: &'a [String],
    indexes: &'a [String],
    schema: Option<&'a TableSchema>,
}

impl Context<'_> {
    fn first_column(&self) -> &str {
        self.columns.first().map_or("column_name", String::as_str)
    }

    fn size_note(&self) -> String {
        self.schema.map(TableSchema::size_note).unwrap_or_default()
    }

    fn existing_indexes(&self) -> Option<String> {
        self.schema.and_then(TableSchema::index_summary)
    }
}

fn record(description: String, example: String) -> SuggestionRecord {
    SuggestionRecord {
        kind: IssueKind::Unknown,
        table: String::new(),
        description,
        example,
        recommendations: Vec::new(),
        considerations: Vec::new(),
        alternatives: Vec::new(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

fn full_table_scan(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let mut rec = record(
        format!(
            "Add an index on the columns `{t}` is filtered or joined by so MySQL can seek instead of \
             reading every row{}.",
            ctx.size_note()
        ),
        format!("CREATE INDEX idx_{t}_filter ON {t} (filter_column);"),
    );
    rec.recommendations = strings(&[
        "Index the columns used in WHERE and JOIN ... ON, most selective first",
        "Re-run EXPLAIN and confirm access_type is ref, eq_ref or range",
    ]);
    if let Some(existing) = ctx.existing_indexes() {
        rec.considerations
            .push(format!("Existing indexes on {t}: {existing}; extend one before adding another"));
    }
    rec.considerations.push(
        "Every index slows INSERT/UPDATE on the table and costs storage".to_owned(),
    );
    rec.alternatives = strings(&["Add a LIMIT when only a sample of rows is needed"]);
    rec
}

fn unused_available_index(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let candidate = ctx.indexes.first().map_or("index_name", String::as_str);
    let listed = if ctx.indexes.is_empty() {
        String::new()
    } else {
        format!(" ({})", ctx.indexes.join(", "))
    };
    let mut rec = record(
        format!(
            "The optimizer considered indexes on `{t}`{listed} but rejected them. Refresh statistics \
             and check that the predicate can actually use the index prefix."
        ),
        format!("ANALYZE TABLE {t};\nSELECT ... FROM {t} FORCE INDEX ({candidate}) WHERE ...;"),
    );
    rec.recommendations = strings(&[
        "Run ANALYZE TABLE so cardinality estimates are current",
        "Make sure the filter uses the leading column of the index",
    ]);
    rec.considerations = strings(&[
        "The optimizer may be right: a scan beats an index when most rows match",
        "Index hints pin the plan and need revisiting when data changes",
    ]);
    rec
}

fn inefficient_join(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let mut rec = record(
        format!(
            "Index the join column of `{t}` so each outer row does an index lookup instead of \
             filling a join buffer{}.",
            ctx.size_note()
        ),
        format!("CREATE INDEX idx_{t}_join ON {t} (join_column);"),
    );
    rec.recommendations = strings(&[
        "Index the column compared in the ON clause on the inner table",
        "Make both sides of the join the same type and collation",
    ]);
    if let Some(existing) = ctx.existing_indexes() {
        rec.considerations.push(format!("Existing indexes on {t}: {existing}"));
    }
    rec.alternatives = strings(&["Raise join_buffer_size for one-off analytical queries"]);
    rec
}

fn function_on_column(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let col = ctx.first_column();
    let mut rec = record(
        format!(
            "Rewrite the condition on `{t}`.`{col}` so the bare column is compared to a constant \
             range; a function around the column hides it from the index."
        ),
        format!(
            "-- instead of WHERE YEAR({col}) = 2024\n\
             SELECT ... FROM {t} WHERE {col} >= '2024-01-01' AND {col} < '2025-01-01';"
        ),
    );
    rec.recommendations = strings(&[
        "Move the function to the constant side of the comparison",
        "Express date parts as half-open ranges",
    ]);
    if let Some(schema) = ctx.schema {
        let covering = schema.indexes_leading_with(col);
        if !covering.is_empty() {
            let names: Vec<&str> = covering.iter().map(|i| i.name.as_str()).collect();
            rec.considerations.push(format!(
                "{} already lead(s) with {col} and becomes usable after the rewrite",
                names.join(", ")
            ));
        }
    }
    rec.alternatives = vec![format!(
        "ALTER TABLE {t} ADD COLUMN {col}_key INT AS (YEAR({col})) STORED, ADD INDEX idx_{t}_{col}_key ({col}_key);"
    )];
    rec
}

fn inefficient_like(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let col = ctx.first_column();
    let listed = if ctx.columns.is_empty() {
        col.to_owned()
    } else {
        ctx.columns.join(", ")
    };
    let mut rec = record(
        format!(
            "A LIKE pattern starting with a wildcard on `{t}` ({listed}) cannot use a B-tree index. \
             Anchor the pattern or switch to full-text search."
        ),
        format!("ALTER TABLE {t} ADD FULLTEXT INDEX ft_{t}_{col} ({col});\n\
                 SELECT ... FROM {t} WHERE MATCH({col}) AGAINST ('term');"),
    );
    rec.recommendations = strings(&[
        "Use a prefix pattern ('abc%') when the search allows it",
        "Use a FULLTEXT index for word search",
    ]);
    rec.considerations = strings(&["FULLTEXT matching is word based and differs from LIKE semantics"]);
    rec.alternatives = vec![format!(
        "Store REVERSE({col}) in an indexed generated column to search suffixes"
    )];
    rec
}

fn low_selectivity(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let mut rec = record(
        format!(
            "Almost every row `{t}` examines passes the filter{}. Add a more selective predicate or a \
             composite index so fewer rows are read in the first place.",
            ctx.size_note()
        ),
        format!("CREATE INDEX idx_{t}_composite ON {t} (selective_column, other_column);"),
    );
    rec.recommendations = strings(&[
        "Put the most selective column first in composite indexes",
        "Fix the root issue on this table first; this one often disappears with it",
    ]);
    rec.considerations = strings(&["Reading most of a small table is cheap and may be fine"]);
    rec
}

fn filesort_required(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let mut rec = record(
        format!(
            "Create an index on `{t}` that matches the ORDER BY columns and direction so rows come \
             back already sorted."
        ),
        format!("CREATE INDEX idx_{t}_order ON {t} (filter_column, order_column);"),
    );
    rec.recommendations = strings(&[
        "Put equality-filtered columns before the ORDER BY columns in the index",
        "Keep ASC/DESC consistent with the index definition",
    ]);
    rec.considerations = strings(&["A filesort over a handful of rows is cheap"]);
    rec.alternatives = strings(&["Add a LIMIT so MySQL can use a priority-queue sort"]);
    rec
}

fn temp_table_required(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let mut rec = record(
        format!(
            "Index the GROUP BY columns of `{t}` in order so grouping streams from the index instead \
             of an internal temporary table{}.",
            ctx.size_note()
        ),
        format!("CREATE INDEX idx_{t}_group ON {t} (group_column_1, group_column_2);"),
    );
    rec.recommendations = strings(&[
        "Group by columns of a single table where possible",
        "Avoid mixing GROUP BY and a different ORDER BY",
    ]);
    rec.considerations = strings(&[
        "Large temporary tables spill to disk once they exceed tmp_table_size",
    ]);
    rec.alternatives = strings(&["Pre-aggregate into a summary table for reporting queries"]);
    rec
}

fn implicit_type_conversion(ctx: &Context<'_>) -> SuggestionRecord {
    let t = ctx.table;
    let mut rec = record(
        format!(
            "A column of `{t}` is compared with a value of another type, so MySQL converts the column \
             on every row and cannot use its index. Compare against a literal of the column's own type."
        ),
        format!("-- varchar column compared with a number\nSELECT ... FROM {t} WHERE code_column = '123';"),
    );
    rec.recommendations = strings(&[
        "Quote literals compared with string columns",
        "Give join columns identical types and collations",
    ]);
    if let Some(schema) = ctx.schema {
        if !schema.columns.is_empty() {
            let relevant: Vec<&ColumnInfo> = if ctx.columns.is_empty() {
                schema.columns.iter().collect()
            } else {
                ctx.columns.iter().filter_map(|c| schema.column(c)).collect()
            };
            let typed: Vec<String> = relevant
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect();
            if !typed.is_empty() {
                rec.considerations
                    .push(format!("Column types on {t}: {}", typed.join(", ")));
            }
        }
    }
    rec.alternatives = strings(&["Use CAST on the constant side when the types must differ"]);
    rec
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
