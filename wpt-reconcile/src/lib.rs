//! Reconciliation of web-platform-tests results against per-file override
//! tables.
//!
//! The executor that actually runs a test file lives elsewhere; this crate
//! consumes its observed results, merges them with the declarative override
//! table, and turns the merge into per-file verdicts, a suite-level report,
//! a CI exit status, and advisory drift findings.

pub mod drift;
pub mod overrides;
pub mod reconcile;
pub mod report;
pub mod results;
pub mod runner;
pub mod validate;

pub use report::REPORT_SCHEMA_VERSION;
