use crate::drift::DriftFinding;
use crate::reconcile::{Classification, FileStatus, Verdict};
use serde::{Deserialize, Serialize};
use wpt_harness::FailOn;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Per-classification occurrence counts for one run (or one batch of it).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
  pub files: usize,
  pub cases: usize,
  pub expected_pass: usize,
  pub expected_failure: usize,
  pub unexpected_failure: usize,
  pub unexpected_pass: usize,
  pub skipped: usize,
}

impl Summary {
  pub fn record(&mut self, classification: Classification) {
    self.cases += 1;
    match classification {
      Classification::ExpectedPass => self.expected_pass += 1,
      Classification::ExpectedFailure => self.expected_failure += 1,
      Classification::UnexpectedFailure => self.unexpected_failure += 1,
      Classification::UnexpectedPass => self.unexpected_pass += 1,
      Classification::Skipped => self.skipped += 1,
    }
  }

  pub fn add_verdict(&mut self, verdict: &Verdict) {
    self.files += 1;
    for case in &verdict.cases {
      self.record(case.classification);
    }
  }

  /// Merging per-batch summaries gives the same counts as a single pass
  /// over the whole verdict sequence.
  pub fn merge(&mut self, other: &Summary) {
    self.files += other.files;
    self.cases += other.cases;
    self.expected_pass += other.expected_pass;
    self.expected_failure += other.expected_failure;
    self.unexpected_failure += other.unexpected_failure;
    self.unexpected_pass += other.unexpected_pass;
    self.skipped += other.skipped;
  }
}

/// Suite-level aggregation of per-file verdicts. Ephemeral: exists only for
/// the duration of one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
  pub summary: Summary,
  /// Broken file paths, in verdict input order.
  pub broken_files: Vec<String>,
  pub suite_passed: bool,
}

impl Report {
  pub fn should_fail(&self, fail_on: FailOn, drift_findings: usize) -> bool {
    fail_on.should_fail(self.broken_files.len(), drift_findings)
  }
}

/// Fold verdicts into a suite report. Purely additive; an empty input
/// yields zero counts and a passing suite. Partial verdict sequences (an
/// executor aborted mid-suite) aggregate the same way.
pub fn aggregate(verdicts: &[Verdict]) -> Report {
  let mut summary = Summary::default();
  let mut broken_files = Vec::new();

  for verdict in verdicts {
    summary.add_verdict(verdict);
    if verdict.status == FileStatus::Broken {
      broken_files.push(verdict.file.clone());
    }
  }

  let suite_passed = broken_files.is_empty();
  Report {
    summary,
    broken_files,
    suite_passed,
  }
}

/// The serialized artifact for one reconciliation run.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
  pub schema_version: u32,
  pub summary: &'a Summary,
  pub broken_files: &'a [String],
  pub suite_passed: bool,
  pub drift: &'a [DriftFinding],
  pub verdicts: &'a [Verdict],
}

impl<'a> ReportDocument<'a> {
  pub fn new(report: &'a Report, drift: &'a [DriftFinding], verdicts: &'a [Verdict]) -> Self {
    Self {
      schema_version: REPORT_SCHEMA_VERSION,
      summary: &report.summary,
      broken_files: &report.broken_files,
      suite_passed: report.suite_passed,
      drift,
      verdicts,
    }
  }
}
