use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Outcome of one test-case occurrence as observed by the executor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Pass,
  Fail,
  Error,
  Timeout,
}

impl Outcome {
  pub fn is_fail_like(self) -> bool {
    !matches!(self, Outcome::Pass)
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let value = match self {
      Outcome::Pass => "pass",
      Outcome::Fail => "fail",
      Outcome::Error => "error",
      Outcome::Timeout => "timeout",
    };
    f.write_str(value)
  }
}

/// One observed test-case occurrence.
///
/// Names need not be unique within a file (upstream suites legally contain
/// duplicate-named sub-tests); the empty string names an anonymous single
/// test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseResult {
  pub name: String,
  pub outcome: Outcome,
}

/// Everything the executor observed for one test file, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileResults {
  pub file: String,
  #[serde(default)]
  pub results: Vec<CaseResult>,
}

/// Quote a test-case name for human output. The empty string reads as
/// `<anonymous>`.
pub fn display_name(name: &str) -> String {
  if name.is_empty() {
    "<anonymous>".to_string()
  } else {
    format!("{name:?}")
  }
}

pub fn parse_results(raw: &str) -> Result<Vec<FileResults>> {
  serde_json::from_str(raw).context("deserialize executor results JSON")
}

pub fn load_results(path: &Path) -> Result<Vec<FileResults>> {
  let raw =
    fs::read_to_string(path).with_context(|| format!("read results {}", path.display()))?;
  parse_results(&raw).map_err(|err| anyhow!("{}: {err}", path.display()))
}
