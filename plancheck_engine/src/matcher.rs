//! Depth-first search over a plan tree.
//!
//! [`PlanNode`] is a borrowed view that lets one recursive walker visit query
//! blocks, table accesses, ordering steps and grouping steps alike. Each
//! variant answers [`PlanNode::field`] for the keys it carries directly and
//! lists its sub-nodes through [`PlanNode::children`]. Scalars are leaves.

use crate::plan::{
    AccessType, ExplainPlan, GroupingOperation, OrderingOperation, PlanBody, QueryBlock,
    TableAccess,
};

/// A field a plan node may carry directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKey {
    AccessType,
    UsingJoinBuffer,
    UsingFilesort,
    UsingTemporaryTable,
    Key,
    TableName,
}

/// The value of a [`PlanKey`] on one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Bool(bool),
    Access(AccessType),
}

/// What a node's field must look like for a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldMatch {
    /// Field present and equal by value.
    Equals(FieldValue<'static>),
    /// Field present with any non-empty value.
    Present,
}

impl FieldMatch {
    fn accepts(&self, value: Option<FieldValue<'_>>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Self::Present, Some(_)) => true,
            (Self::Equals(expected), Some(actual)) => *expected == actual,
        }
    }
}

/// Borrowed view of one node in the plan tree.
#[derive(Debug, Clone, Copy)]
pub enum PlanNode<'a> {
    QueryBlock(&'a QueryBlock),
    Table(&'a TableAccess),
    Ordering(&'a OrderingOperation),
    Grouping(&'a GroupingOperation),
}

impl<'a> PlanNode<'a> {
    /// Value of `key` if this node carries it directly.
    ///
    /// Empty strings count as absent, matching how MySQL leaves out `key`
    /// when no index was chosen.
    #[must_use]
    pub fn field(self, key: PlanKey) -> Option<FieldValue<'a>> {
        match (self, key) {
            (Self::Table(t), PlanKey::AccessType) => Some(FieldValue::Access(t.access_type)),
            (Self::Table(t), PlanKey::UsingJoinBuffer) => t.join_buffer().map(FieldValue::Str),
            (Self::Table(t), PlanKey::Key) => t.chosen_key().map(FieldValue::Str),
            (Self::Table(t), PlanKey::TableName) => {
                Some(t.table_name.as_str()).filter(|n| !n.is_empty()).map(FieldValue::Str)
            }
            // A grouping step's own filesort is part of materializing the
            // groups, not an ORDER BY; only ordering steps answer this key.
            (Self::Ordering(o), PlanKey::UsingFilesort) => Some(FieldValue::Bool(o.using_filesort)),
            (Self::Grouping(g), PlanKey::UsingTemporaryTable) => {
                Some(FieldValue::Bool(g.using_temporary_table))
            }
            _ => None,
        }
    }

    /// Direct sub-nodes, in document order.
    #[must_use]
    pub fn children(self) -> Vec<PlanNode<'a>> {
        match self {
            Self::QueryBlock(qb) => body_children(&qb.body),
            Self::Ordering(o) => body_children(&o.body),
            Self::Grouping(g) => body_children(&g.body),
            Self::Table(t) => t
                .materialized_from_subquery
                .as_ref()
                .and_then(|sq| sq.query_block.as_ref())
                .map(PlanNode::QueryBlock)
                .into_iter()
                .collect(),
        }
    }
}

fn body_children(body: &PlanBody) -> Vec<PlanNode<'_>> {
    let mut children = Vec::with_capacity(body.nested_loop.len() + 3);
    if let Some(ref table) = body.table {
        children.push(PlanNode::Table(table));
    }
    children.extend(body.nested_loop.iter().map(|step| PlanNode::Table(&step.table)));
    if let Some(ref ordering) = body.ordering_operation {
        children.push(PlanNode::Ordering(ordering));
    }
    if let Some(ref grouping) = body.grouping_operation {
        children.push(PlanNode::Grouping(grouping));
    }
    children
}

/// Whether any node in the plan carries `key` matching `expected`.
///
/// A plan without a query block matches nothing.
#[must_use]
pub fn exists(plan: &ExplainPlan, key: PlanKey, expected: &FieldMatch) -> bool {
    any_node(plan, &|node: PlanNode<'_>| expected.accepts(node.field(key)))
}

/// Whether `predicate` holds for any node, searched depth-first.
///
/// Stops at the first node that satisfies it.
pub fn any_node<'a>(plan: &'a ExplainPlan, predicate: &dyn Fn(PlanNode<'a>) -> bool) -> bool {
    match plan.query_block {
        Some(ref qb) => node_any(PlanNode::QueryBlock(qb), predicate),
        None => false,
    }
}

fn node_any<'a>(node: PlanNode<'a>, predicate: &dyn Fn(PlanNode<'a>) -> bool) -> bool {
    predicate(node)
        || node
            .children()
            .into_iter()
            .any(|child| node_any(child, predicate))
}

/// Every table access below `node`, depth-first.
#[must_use]
pub fn tables(node: PlanNode<'_>) -> Vec<&TableAccess> {
    let mut out = Vec::new();
    collect_tables(node, &mut out);
    out
}

fn collect_tables<'a>(node: PlanNode<'a>, out: &mut Vec<&'a TableAccess>) {
    if let PlanNode::Table(t) = node {
        out.push(t);
    }
    for child in node.children() {
        collect_tables(child, out);
    }
}

/// Name of the first named table below `node`, used to attribute
/// ordering and grouping findings.
#[must_use]
pub fn first_table(node: PlanNode<'_>) -> Option<&str> {
    if let Some(FieldValue::Str(name)) = node.field(PlanKey::TableName) {
        return Some(name);
    }
    node.children().into_iter().find_map(first_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{JoinStep, Subquery};

    fn table(name: &str, access: AccessType) -> TableAccess {
        TableAccess {
            table_name: name.to_owned(),
            access_type: access,
            ..TableAccess::default()
        }
    }

    fn plan_with(body: PlanBody) -> ExplainPlan {
        ExplainPlan {
            query_block: Some(QueryBlock {
                select_id: Some(1),
                body,
            }),
        }
    }

    /// Wrap `inner` in `depth` alternating ordering/grouping layers.
    fn deeply_nested(depth: usize, inner: TableAccess) -> PlanBody {
        let mut body = PlanBody {
            table: Some(inner),
            ..PlanBody::default()
        };
        for level in 0..depth {
            body = if level % 2 == 0 {
                PlanBody {
                    ordering_operation: Some(Box::new(OrderingOperation {
                        using_filesort: false,
                        body,
                    })),
                    ..PlanBody::default()
                }
            } else {
                PlanBody {
                    grouping_operation: Some(Box::new(GroupingOperation {
                        using_temporary_table: false,
                        using_filesort: false,
                        body,
                    })),
                    ..PlanBody::default()
                }
            };
        }
        body
    }

    #[test]
    fn test_exists_on_root_table() {
        let plan = plan_with(PlanBody {
            table: Some(table("users", AccessType::All)),
            ..PlanBody::default()
        });
        assert!(exists(
            &plan,
            PlanKey::AccessType,
            &FieldMatch::Equals(FieldValue::Access(AccessType::All))
        ));
        assert!(!exists(
            &plan,
            PlanKey::AccessType,
            &FieldMatch::Equals(FieldValue::Access(AccessType::Ref))
        ));
    }

    #[test]
    fn test_exists_without_query_block() {
        let plan = ExplainPlan::default();
        assert!(!exists(&plan, PlanKey::UsingJoinBuffer, &FieldMatch::Present));
        assert!(!any_node(&plan, &|_| true));
    }

    #[test]
    fn test_exists_in_join_steps() {
        let mut joined = table("orders", AccessType::All);
        joined.using_join_buffer = Some("hash join".to_owned());
        let plan = plan_with(PlanBody {
            nested_loop: vec![
                JoinStep {
                    table: table("customers", AccessType::Range),
                },
                JoinStep { table: joined },
            ],
            ..PlanBody::default()
        });
        assert!(exists(&plan, PlanKey::UsingJoinBuffer, &FieldMatch::Present));
        assert!(exists(
            &plan,
            PlanKey::UsingJoinBuffer,
            &FieldMatch::Equals(FieldValue::Str("hash join"))
        ));
    }

    #[test]
    fn test_present_ignores_empty_strings() {
        let mut t = table("orders", AccessType::Ref);
        t.using_join_buffer = Some(String::new());
        let plan = plan_with(PlanBody {
            table: Some(t),
            ..PlanBody::default()
        });
        assert!(!exists(&plan, PlanKey::UsingJoinBuffer, &FieldMatch::Present));
    }

    #[test]
    fn test_exists_at_arbitrary_depth() {
        let plan = plan_with(deeply_nested(64, table("deep", AccessType::All)));
        assert!(exists(
            &plan,
            PlanKey::AccessType,
            &FieldMatch::Equals(FieldValue::Access(AccessType::All))
        ));
        assert!(exists(
            &plan,
            PlanKey::TableName,
            &FieldMatch::Equals(FieldValue::Str("deep"))
        ));
    }

    #[test]
    fn test_boolean_flags_compare_by_value() {
        let plan = plan_with(PlanBody {
            ordering_operation: Some(Box::new(OrderingOperation {
                using_filesort: false,
                body: PlanBody {
                    table: Some(table("t", AccessType::Index)),
                    ..PlanBody::default()
                },
            })),
            ..PlanBody::default()
        });
        let filesort = FieldMatch::Equals(FieldValue::Bool(true));
        assert!(!exists(&plan, PlanKey::UsingFilesort, &filesort));
        assert!(exists(
            &plan,
            PlanKey::UsingFilesort,
            &FieldMatch::Equals(FieldValue::Bool(false))
        ));
    }

    #[test]
    fn test_filesort_only_answered_by_ordering_steps() {
        let plan = plan_with(PlanBody {
            grouping_operation: Some(Box::new(GroupingOperation {
                using_temporary_table: false,
                using_filesort: true,
                body: PlanBody {
                    table: Some(table("events", AccessType::Index)),
                    ..PlanBody::default()
                },
            })),
            ..PlanBody::default()
        });
        assert!(!exists(&plan, PlanKey::UsingFilesort, &FieldMatch::Present));
        let qb = plan.query_block.as_ref().unwrap();
        let grouping = qb.body.grouping_operation.as_deref().unwrap();
        assert_eq!(PlanNode::Grouping(grouping).field(PlanKey::UsingFilesort), None);
    }

    #[test]
    fn test_walks_into_materialized_subquery() {
        let mut derived = table("dt", AccessType::All);
        derived.materialized_from_subquery = Some(Box::new(Subquery {
            query_block: Some(QueryBlock {
                select_id: Some(2),
                body: PlanBody {
                    grouping_operation: Some(Box::new(GroupingOperation {
                        using_temporary_table: true,
                        using_filesort: false,
                        body: PlanBody {
                            table: Some(table("events", AccessType::Index)),
                            ..PlanBody::default()
                        },
                    })),
                    ..PlanBody::default()
                },
            }),
        }));
        let plan = plan_with(PlanBody {
            table: Some(derived),
            ..PlanBody::default()
        });
        assert!(exists(
            &plan,
            PlanKey::UsingTemporaryTable,
            &FieldMatch::Equals(FieldValue::Bool(true))
        ));
        let qb = plan.query_block.as_ref().unwrap();
        let names: Vec<&str> = tables(PlanNode::QueryBlock(qb))
            .iter()
            .map(|t| t.table_name.as_str())
            .collect();
        assert_eq!(names, vec!["dt", "events"]);
    }

    #[test]
    fn test_first_table_attribution() {
        let ordering = OrderingOperation {
            using_filesort: true,
            body: PlanBody {
                nested_loop: vec![
                    JoinStep {
                        table: table("a", AccessType::All),
                    },
                    JoinStep {
                        table: table("b", AccessType::Ref),
                    },
                ],
                ..PlanBody::default()
            },
        };
        assert_eq!(first_table(PlanNode::Ordering(&ordering)), Some("a"));

        let empty = OrderingOperation::default();
        assert_eq!(first_table(PlanNode::Ordering(&empty)), None);
    }
}
