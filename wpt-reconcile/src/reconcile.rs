use crate::overrides::OverrideRecord;
use crate::results::{CaseResult, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How one observed occurrence relates to the override table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
  /// No override applied and the test passed.
  ExpectedPass,
  /// Listed as an expected failure, and it did fail.
  ExpectedFailure,
  /// No override applied and the test failed. Breaks the file.
  UnexpectedFailure,
  /// Listed as an expected failure but it passed: the override is stale.
  /// Advisory, never breaks the file.
  UnexpectedPass,
  /// Disabled or omitted; the outcome was never evaluated.
  Skipped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
  Ok,
  Broken,
}

/// One reconciled occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseVerdict {
  pub name: String,
  pub outcome: Outcome,
  pub classification: Classification,
}

/// The reconciled view of one file: every occurrence classified in emission
/// order, the file-level status, and the override-listed names that matched
/// no occurrence at all (input to drift detection).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
  pub file: String,
  pub status: FileStatus,
  pub cases: Vec<CaseVerdict>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub unmatched_overrides: Vec<String>,
}

pub fn classify(record: &OverrideRecord, name: &str, outcome: Outcome) -> Classification {
  if record.skips(name) {
    return Classification::Skipped;
  }

  if record.expects_failure(name) {
    return if outcome.is_fail_like() {
      Classification::ExpectedFailure
    } else {
      Classification::UnexpectedPass
    };
  }

  if outcome.is_fail_like() {
    Classification::UnexpectedFailure
  } else {
    Classification::ExpectedPass
  }
}

/// Merge one file's observed results with its override record.
///
/// Pure and synchronous: reads its own slice of the table and writes only
/// the returned verdict, so any number of files may reconcile concurrently.
/// A file with zero occurrences and an empty record is vacuously `Ok`.
pub fn reconcile(file: &str, record: &OverrideRecord, results: &[CaseResult]) -> Verdict {
  let mut cases = Vec::with_capacity(results.len());
  let mut seen = BTreeSet::new();
  let mut broken = false;

  for case in results {
    let classification = classify(record, &case.name, case.outcome);
    broken |= classification == Classification::UnexpectedFailure;
    seen.insert(case.name.as_str());
    cases.push(CaseVerdict {
      name: case.name.clone(),
      outcome: case.outcome,
      classification,
    });
  }

  Verdict {
    file: file.to_string(),
    status: if broken { FileStatus::Broken } else { FileStatus::Ok },
    cases,
    unmatched_overrides: unmatched_overrides(record, &seen),
  }
}

/// Override-listed names with zero matching occurrences.
///
/// `expected_failures` and list-form `disabled_tests` entries predict that
/// the named test exists, so a name that never shows up means upstream
/// renamed or removed it. List-form `omitted_tests` names predict the
/// opposite (a non-test produces no occurrences) and are not tracked, and
/// nothing is tracked under a file-wide skip.
fn unmatched_overrides(record: &OverrideRecord, seen: &BTreeSet<&str>) -> Vec<String> {
  if record.skips_file() {
    return Vec::new();
  }

  let mut unmatched = BTreeSet::new();
  for name in record
    .expected_failures
    .iter()
    .chain(record.disabled_tests.names())
  {
    if !seen.contains(name.as_str()) {
      unmatched.insert(name.clone());
    }
  }
  unmatched.into_iter().collect()
}
