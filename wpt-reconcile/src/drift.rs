use crate::reconcile::{Classification, Verdict};
use crate::results::display_name;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An advisory signal that the override table no longer matches reality.
///
/// Findings never affect whether the suite passed; they exist so the table
/// can shrink again after upstream churn or runtime fixes. A table that
/// only ever grows accumulates false expectations and masks regressions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriftFinding {
  /// A test listed as an expected failure passed: the underlying bug was
  /// fixed but the table was not updated.
  StaleExpectedFailure { file: String, test: String },
  /// An override-listed name never appeared in the file's results: upstream
  /// renamed or removed the test.
  UnmatchedOverrideEntry { file: String, test: String },
}

impl DriftFinding {
  pub fn file(&self) -> &str {
    match self {
      DriftFinding::StaleExpectedFailure { file, .. } => file,
      DriftFinding::UnmatchedOverrideEntry { file, .. } => file,
    }
  }

  pub fn test(&self) -> &str {
    match self {
      DriftFinding::StaleExpectedFailure { test, .. } => test,
      DriftFinding::UnmatchedOverrideEntry { test, .. } => test,
    }
  }
}

impl fmt::Display for DriftFinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DriftFinding::StaleExpectedFailure { file, test } => write!(
        f,
        "{file}: expected failure {} now passes; prune it from the override table",
        display_name(test)
      ),
      DriftFinding::UnmatchedOverrideEntry { file, test } => write!(
        f,
        "{file}: override entry {} matched no test occurrence",
        display_name(test)
      ),
    }
  }
}

/// Scan verdicts for staleness, in verdict order.
///
/// Stale expectations are reported once per passing occurrence (a test that
/// oscillates shows up each time it passes); unmatched entries once per
/// name.
pub fn detect_drift(verdicts: &[Verdict]) -> Vec<DriftFinding> {
  let mut findings = Vec::new();

  for verdict in verdicts {
    for case in &verdict.cases {
      if case.classification == Classification::UnexpectedPass {
        findings.push(DriftFinding::StaleExpectedFailure {
          file: verdict.file.clone(),
          test: case.name.clone(),
        });
      }
    }

    for name in &verdict.unmatched_overrides {
      findings.push(DriftFinding::UnmatchedOverrideEntry {
        file: verdict.file.clone(),
        test: name.clone(),
      });
    }
  }

  findings
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::overrides::{OverrideRecord, TestFilter};
  use crate::reconcile::reconcile;
  use crate::results::{CaseResult, Outcome};

  fn results(cases: &[(&str, Outcome)]) -> Vec<CaseResult> {
    cases
      .iter()
      .map(|(name, outcome)| CaseResult {
        name: name.to_string(),
        outcome: *outcome,
      })
      .collect()
  }

  #[test]
  fn stale_expectation_emits_one_finding_per_passing_occurrence() {
    let record = OverrideRecord {
      expected_failures: vec!["t1".to_string()],
      ..OverrideRecord::empty()
    };
    let verdicts = vec![reconcile(
      "f1",
      &record,
      &results(&[("t1", Outcome::Pass), ("t1", Outcome::Pass), ("t2", Outcome::Pass)]),
    )];

    let findings = detect_drift(&verdicts);
    assert_eq!(
      findings,
      vec![
        DriftFinding::StaleExpectedFailure {
          file: "f1".to_string(),
          test: "t1".to_string(),
        },
        DriftFinding::StaleExpectedFailure {
          file: "f1".to_string(),
          test: "t1".to_string(),
        },
      ]
    );
  }

  #[test]
  fn unmatched_entries_are_reported_per_name() {
    let record = OverrideRecord {
      disabled_tests: TestFilter::Names(vec!["renamed-upstream".to_string()]),
      expected_failures: vec!["removed-upstream".to_string()],
      ..OverrideRecord::empty()
    };
    let verdicts = vec![reconcile("f1", &record, &results(&[("t1", Outcome::Pass)]))];

    let findings = detect_drift(&verdicts);
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().all(|finding| finding.file() == "f1"));
    assert!(findings
      .iter()
      .any(|finding| finding.test() == "renamed-upstream"));
    assert!(findings
      .iter()
      .any(|finding| finding.test() == "removed-upstream"));
  }

  #[test]
  fn confirmed_expectations_produce_no_findings() {
    let record = OverrideRecord {
      expected_failures: vec!["t1".to_string()],
      ..OverrideRecord::empty()
    };
    let verdicts = vec![reconcile(
      "f1",
      &record,
      &results(&[("t1", Outcome::Fail), ("t2", Outcome::Pass)]),
    )];

    assert!(detect_drift(&verdicts).is_empty());
  }

  #[test]
  fn anonymous_names_render_readably() {
    let finding = DriftFinding::StaleExpectedFailure {
      file: "single.any.js".to_string(),
      test: String::new(),
    };
    assert!(finding.to_string().contains("<anonymous>"));
  }
}
