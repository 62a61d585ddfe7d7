use crate::drift::{detect_drift, DriftFinding};
use crate::overrides::OverrideTable;
use crate::reconcile::{reconcile, Classification, FileStatus, Verdict};
use crate::report::{aggregate, Report, ReportDocument};
use crate::results::{display_name, load_results, FileResults};
use anyhow::{anyhow, bail, Result};
use clap::Args;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use regex::Regex;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use wpt_harness::FailOn;

#[derive(Debug, Clone)]
pub enum Filter {
  All,
  Glob(GlobSet),
  Regex(Regex),
}

pub fn build_filter(pattern: Option<&str>) -> Result<Filter> {
  match pattern {
    None => Ok(Filter::All),
    Some(raw) => {
      if let Ok(glob) = Glob::new(raw) {
        let mut builder = GlobSetBuilder::new();
        builder.add(glob);
        let set = builder
          .build()
          .map_err(|err| anyhow!("invalid glob: {err}"))?;
        return Ok(Filter::Glob(set));
      }

      let regex = Regex::new(raw).map_err(|err| anyhow!("invalid regex: {err}"))?;
      Ok(Filter::Regex(regex))
    }
  }
}

impl Filter {
  pub fn matches(&self, file: &str) -> bool {
    match self {
      Filter::All => true,
      Filter::Glob(set) => set.is_match(file),
      Filter::Regex(re) => re.is_match(file),
    }
  }
}

/// Reconcile every supplied result set against the shared table.
///
/// Files reconcile in parallel against the read-only table; the output
/// vector preserves input order, so downstream aggregation stays
/// deterministic.
pub fn reconcile_all(table: &OverrideTable, results: &[FileResults]) -> Vec<Verdict> {
  results
    .par_iter()
    .map(|file| reconcile(&file.file, table.lookup(&file.file), &file.results))
    .collect()
}

#[derive(Args, Debug)]
pub struct CheckArgs {
  /// Override table: a TOML/JSON file, or a directory of them.
  #[arg(long, value_name = "PATH")]
  pub overrides: Option<PathBuf>,

  /// Executor results JSON.
  #[arg(long, value_name = "PATH")]
  pub results: PathBuf,

  /// Glob or regex restricting which result files are reconciled.
  #[arg(long, value_name = "PATTERN")]
  pub filter: Option<String>,

  /// Print the JSON report document instead of the human summary.
  #[arg(long)]
  pub json: bool,

  /// Also write the JSON report document to a file.
  #[arg(long, value_name = "PATH")]
  pub report_out: Option<PathBuf>,

  /// When to exit non-zero.
  #[arg(long, value_enum, default_value_t = FailOn::default())]
  pub fail_on: FailOn,

  /// Enable tracing output on stderr.
  #[arg(long)]
  pub trace: bool,
}

pub fn run_cli(args: CheckArgs) -> Result<ExitCode> {
  let table = match &args.overrides {
    Some(path) => OverrideTable::from_path(path)?,
    None => OverrideTable::empty(),
  };
  info!(overrides = table.len(), "override table loaded");

  let all_results = load_results(&args.results)?;
  let filter = build_filter(args.filter.as_deref())?;
  let selected: Vec<FileResults> = all_results
    .into_iter()
    .filter(|file| filter.matches(&file.file))
    .collect();
  if selected.is_empty() && args.filter.is_some() {
    bail!("filter matched no result files");
  }

  debug!(files = selected.len(), "reconciling");
  let verdicts = reconcile_all(&table, &selected);
  let report = aggregate(&verdicts);
  let drift = detect_drift(&verdicts);
  info!(
    broken = report.broken_files.len(),
    drift = drift.len(),
    "reconciliation complete"
  );

  let document = ReportDocument::new(&report, &drift, &verdicts);
  if let Some(path) = &args.report_out {
    wpt_harness::write_json_file(path, &document)?;
  }
  if args.json {
    wpt_harness::print_json(&document)?;
  } else {
    render_human(&report, &drift, &verdicts);
  }

  Ok(if report.should_fail(args.fail_on, drift.len()) {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  })
}

fn render_human(report: &Report, drift: &[DriftFinding], verdicts: &[Verdict]) {
  let summary = &report.summary;
  println!(
    "reconciled {} file(s), {} case(s)",
    summary.files, summary.cases
  );
  println!(
    "  expected pass: {}, expected failure: {}, skipped: {}",
    summary.expected_pass, summary.expected_failure, summary.skipped
  );
  println!(
    "  unexpected failure: {}, unexpected pass: {}",
    summary.unexpected_failure, summary.unexpected_pass
  );

  if !report.broken_files.is_empty() {
    eprintln!();
    eprintln!("Broken files:");
    for verdict in verdicts.iter().filter(|v| v.status == FileStatus::Broken) {
      for case in &verdict.cases {
        if case.classification == Classification::UnexpectedFailure {
          eprintln!(
            "  {}: {} ({})",
            verdict.file,
            display_name(&case.name),
            case.outcome
          );
        }
      }
    }
  }

  if !drift.is_empty() {
    println!();
    println!("Drift findings (advisory):");
    for finding in drift {
      println!("  {finding}");
    }
  }

  println!();
  if report.suite_passed {
    println!("suite passed");
  } else {
    eprintln!(
      "suite failed: {} broken file(s)",
      report.broken_files.len()
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::results::{CaseResult, Outcome};

  fn file_results(file: &str, cases: &[(&str, Outcome)]) -> FileResults {
    FileResults {
      file: file.to_string(),
      results: cases
        .iter()
        .map(|(name, outcome)| CaseResult {
          name: name.to_string(),
          outcome: *outcome,
        })
        .collect(),
    }
  }

  #[test]
  fn glob_filters_select_by_path() {
    let glob = build_filter(Some("dom/**")).unwrap();
    assert!(glob.matches("dom/events.any.js"));
    assert!(!glob.matches("url/urlpattern.any.js"));

    assert!(build_filter(None).unwrap().matches("anything"));
  }

  #[test]
  fn regex_filters_select_by_pattern() {
    let regex = Filter::Regex(Regex::new(r"^(dom|url)/").unwrap());
    assert!(regex.matches("url/urlpattern.any.js"));
    assert!(!regex.matches("fetch/request.any.js"));
  }

  #[test]
  fn parallel_reconcile_preserves_input_order() {
    let table = OverrideTable::from_str(
      r#"
["b.any.js"]
expected_failures = ["t"]
"#,
    )
    .unwrap();

    let results = vec![
      file_results("z.any.js", &[("t", Outcome::Pass)]),
      file_results("b.any.js", &[("t", Outcome::Fail)]),
      file_results("a.any.js", &[("t", Outcome::Fail)]),
    ];

    let verdicts = reconcile_all(&table, &results);
    let files: Vec<_> = verdicts.iter().map(|v| v.file.as_str()).collect();
    assert_eq!(files, vec!["z.any.js", "b.any.js", "a.any.js"]);
    assert_eq!(verdicts[1].status, FileStatus::Ok);
    assert_eq!(verdicts[2].status, FileStatus::Broken);
  }
}
