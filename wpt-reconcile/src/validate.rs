use crate::overrides::{OverrideTable, TestFilter};
use crate::reconcile::reconcile;
use crate::results::{display_name, load_results, FileResults};
use anyhow::Result;
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct ValidateArgs {
  /// Override table: a TOML/JSON file, or a directory of them.
  #[arg(long, value_name = "PATH")]
  pub overrides: PathBuf,

  /// Executor results JSON to cross-check the table against.
  #[arg(long, value_name = "PATH")]
  pub results: Option<PathBuf>,

  /// Print per-file entry counts (useful for auditing).
  #[arg(long)]
  pub counts: bool,
}

pub fn run_cli(args: ValidateArgs) -> Result<ExitCode> {
  // Loading runs every fatal check: parse errors, duplicate file keys
  // across config files, names in mutually exclusive fields.
  let table = OverrideTable::from_path(&args.overrides)?;

  println!(
    "override table ok: {} file entr{}",
    table.len(),
    if table.len() == 1 { "y" } else { "ies" }
  );

  if args.counts {
    for (file, record) in table.iter() {
      println!(
        "  {file}: {} expected failure(s), disabled: {}, omitted: {}",
        record.expected_failures.len(),
        describe_filter(&record.disabled_tests),
        describe_filter(&record.omitted_tests),
      );
    }
  }

  if let Some(path) = &args.results {
    let results = load_results(path)?;
    for warning in cross_check(&table, &results) {
      eprintln!("warning: {warning}");
    }
  }

  Ok(ExitCode::SUCCESS)
}

fn describe_filter(filter: &TestFilter) -> String {
  match filter {
    TestFilter::All(true) => "all".to_string(),
    TestFilter::All(false) => "0".to_string(),
    TestFilter::Names(names) => names.len().to_string(),
  }
}

/// Advisory staleness checks against a results file: overridden files the
/// executor never reported, and override-listed names with zero matching
/// occurrences. Sorted for deterministic output.
fn cross_check(table: &OverrideTable, results: &[FileResults]) -> Vec<String> {
  let seen_files: BTreeSet<&str> = results.iter().map(|file| file.file.as_str()).collect();
  let mut warnings = Vec::new();

  for (file, _) in table.iter() {
    if !seen_files.contains(file) {
      warnings.push(format!("override for `{file}` matched no file in the results"));
    }
  }

  for file_results in results {
    let record = table.lookup(&file_results.file);
    let verdict = reconcile(&file_results.file, record, &file_results.results);
    for name in &verdict.unmatched_overrides {
      warnings.push(format!(
        "override for `{}` lists {} which matched no test occurrence",
        file_results.file,
        display_name(name)
      ));
    }
  }

  warnings.sort();
  warnings
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::results::{CaseResult, Outcome};

  fn file_results(file: &str, names: &[&str]) -> FileResults {
    FileResults {
      file: file.to_string(),
      results: names
        .iter()
        .map(|name| CaseResult {
          name: name.to_string(),
          outcome: Outcome::Pass,
        })
        .collect(),
    }
  }

  #[test]
  fn cross_check_reports_missing_files_and_names() {
    let table = OverrideTable::from_str(
      r#"
["gone.any.js"]
disabled_tests = true

["events.any.js"]
expected_failures = ["renamed-upstream"]
"#,
    )
    .unwrap();

    let results = vec![file_results("events.any.js", &["t1"])];
    let warnings = cross_check(&table, &results);

    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("`events.any.js`") && warnings[0].contains("renamed-upstream"));
    assert!(warnings[1].contains("`gone.any.js`") && warnings[1].contains("no file"));
  }

  #[test]
  fn cross_check_is_quiet_for_a_current_table() {
    let table = OverrideTable::from_str(
      r#"
["events.any.js"]
expected_failures = ["t1"]
"#,
    )
    .unwrap();

    let results = vec![file_results("events.any.js", &["t1", "t2"])];
    assert!(cross_check(&table, &results).is_empty());
  }
}
