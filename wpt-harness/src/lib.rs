//! Shared utilities for deterministic WPT conformance tooling.
//!
//! This crate is intentionally small and dependency-light so harness
//! binaries can share behavior without copy/pasting.

mod fail_on;
mod report;

pub use fail_on::FailOn;
pub use report::{print_json, render_json, write_json_file};
