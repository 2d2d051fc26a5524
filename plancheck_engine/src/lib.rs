//! Plancheck Engine: static diagnosis of query performance anti-patterns.
//!
//! This crate provides the `plancheck_engine` Python module via PyO3. It reads
//! captured MySQL `EXPLAIN FORMAT=JSON` plans together with the engine's
//! `SHOW WARNINGS` rows, classifies what it finds (full scans, buffered joins,
//! filesorts, temporary tables, wildcard LIKE, functions on columns, implicit
//! conversions), and maps each issue to a remediation record.
//!
//! Imported from Python as:
//! ```python
//! from plancheck_engine import PlanCheckEngine, CheckConfig, analyze_plan
//! ```

// PyO3-generated code triggers this lint on PyResult return types; suppress globally.
#![allow(clippy::useless_conversion)]

pub mod analyzer;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod matcher;
pub mod plan;
pub mod pyo3_bindings;
pub mod reporter;
pub mod rules;
pub mod suggestions;
pub mod types;

use pyo3::prelude::*;

/// The Python module exposed by this crate.
#[pymodule]
fn plancheck_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Bridge Rust `log` records into Python `logging`.
    pyo3_log::init();

    pyo3_bindings::register_module(m)?;

    Ok(())
}
