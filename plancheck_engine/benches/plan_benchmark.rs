//! Criterion benchmarks for the plan check engine.
//!
//! Plans are synthetic: a query block whose body nests ordering and grouping
//! operations `depth` levels deep, each level joining `width` tables that
//! trip a mix of per-node classifications.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use plancheck_engine::analyzer::{analyze, SelectivityThresholds};
use plancheck_engine::config::CheckConfig;
use plancheck_engine::discovery::PlanArtifact;
use plancheck_engine::engine::PlanCheckEngine;
use plancheck_engine::plan::ExplainPlan;
use plancheck_engine::rules::evaluate_rules;
use plancheck_engine::types::DiagnosticMessage;

fn table(level: usize, idx: usize) -> Value {
    let name = format!("t{level}_{idx}");
    match idx % 4 {
        0 => json!({"table": {
            "table_name": name,
            "access_type": "ALL",
            "rows_examined_per_scan": 5000,
            "filtered": "95.00",
            "attached_condition": format!("(`db`.`{name}`.`email` like '%@example.com')"),
        }}),
        1 => json!({"table": {
            "table_name": name,
            "access_type": "ALL",
            "possible_keys": ["idx_created"],
            "using_join_buffer": "hash join",
            "attached_condition": format!("(year(`db`.`{name}`.`created_at`) = 2024)"),
        }}),
        2 => json!({"table": {
            "table_name": name,
            "access_type": "ref",
            "key": "idx_user_id",
            "rows_examined_per_scan": 3,
            "filtered": "100.00",
        }}),
        _ => json!({"table": {
            "table_name": name,
            "access_type": "eq_ref",
            "key": "PRIMARY",
        }}),
    }
}

fn nested_plan(depth: usize, width: usize) -> ExplainPlan {
    let mut body = json!({
        "nested_loop": (0..width).map(|i| table(depth, i)).collect::<Vec<_>>(),
    });
    for level in (0..depth).rev() {
        let steps: Vec<Value> = (0..width).map(|i| table(level, i)).collect();
        body = if level % 2 == 0 {
            json!({"using_filesort": true, "nested_loop": steps, "grouping_operation": body})
        } else {
            json!({"using_temporary_table": true, "nested_loop": steps, "ordering_operation": body})
        };
    }
    let doc = json!({"query_block": {"select_id": 1, "ordering_operation": body}});
    ExplainPlan::from_value(doc).expect("synthetic plan decodes")
}

fn messages() -> Vec<DiagnosticMessage> {
    vec![DiagnosticMessage::new(
        "Warning",
        1739,
        "Cannot use ref access on index 'idx_code' due to type or collation conversion on field 'code'",
    )]
}

fn bench_analyze(c: &mut Criterion) {
    let thresholds = SelectivityThresholds::default();
    let msgs = messages();
    let mut group = c.benchmark_group("analyze");
    for depth in [1usize, 8, 32] {
        let plan = nested_plan(depth, 8);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &plan, |b, plan| {
            b.iter(|| analyze(black_box(plan), black_box(&msgs), &thresholds));
        });
    }
    group.finish();
}

fn bench_rule_catalog(c: &mut Criterion) {
    let plan = nested_plan(32, 8);
    let msgs = messages();
    c.bench_function("evaluate_rules/depth_32", |b| {
        b.iter(|| evaluate_rules(black_box(&plan), black_box(&msgs)));
    });
}

fn bench_check_artifacts(c: &mut Criterion) {
    let artifacts: Vec<PlanArtifact> = (0..200)
        .map(|i| {
            PlanArtifact::new(format!("q{i:03}.explain.json"), nested_plan(4 + i % 8, 6))
                .with_messages(messages())
        })
        .collect();
    let engine = PlanCheckEngine::new(CheckConfig::default());
    c.bench_function("check_artifacts/200", |b| {
        b.iter(|| engine.check_artifacts(black_box(&artifacts)));
    });
}

criterion_group!(benches, bench_analyze, bench_rule_catalog, bench_check_artifacts);
criterion_main!(benches);
