use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// A per-field override that is either file-wide (a boolean) or a list of
/// exact test-case names.
///
/// The boolean form always applies to the whole file; the list form is the
/// only way to target individual names. Names are case- and
/// whitespace-exact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TestFilter {
  All(bool),
  Names(Vec<String>),
}

impl TestFilter {
  pub const fn empty() -> Self {
    TestFilter::All(false)
  }

  /// Whether the filter covers the entire file.
  pub fn is_file_wide(&self) -> bool {
    matches!(self, TestFilter::All(true))
  }

  /// Whether `name` is listed individually. The file-wide form never
  /// matches here; callers that want either form use [`OverrideRecord`].
  pub fn lists(&self, name: &str) -> bool {
    match self {
      TestFilter::All(_) => false,
      TestFilter::Names(names) => names.iter().any(|n| n == name),
    }
  }

  /// The individually listed names, empty for the boolean form.
  pub fn names(&self) -> &[String] {
    match self {
      TestFilter::All(_) => &[],
      TestFilter::Names(names) => names,
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      TestFilter::All(all) => !all,
      TestFilter::Names(names) => names.is_empty(),
    }
  }
}

impl Default for TestFilter {
  fn default() -> Self {
    TestFilter::empty()
  }
}

/// Known deviations from "every test in this file passes".
///
/// The absence of a record is equivalent to the all-empty record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OverrideRecord {
  /// Free-text rationale. Informational only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,

  /// Tests excluded from verdict computation regardless of outcome.
  #[serde(default, skip_serializing_if = "TestFilter::is_empty")]
  pub disabled_tests: TestFilter,

  /// Entries that are not runnable tests at all, e.g. a shared helper file
  /// loaded by other test files.
  #[serde(default, skip_serializing_if = "TestFilter::is_empty")]
  pub omitted_tests: TestFilter,

  /// Test-case names permitted to fail without breaking the build. The
  /// empty string names an anonymous single test. Duplicate entries are
  /// legal and harmless.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub expected_failures: Vec<String>,
}

impl OverrideRecord {
  pub const fn empty() -> Self {
    OverrideRecord {
      comment: None,
      disabled_tests: TestFilter::empty(),
      omitted_tests: TestFilter::empty(),
      expected_failures: Vec::new(),
    }
  }

  /// Whether every occurrence in the file is skipped without looking at
  /// outcomes.
  pub fn skips_file(&self) -> bool {
    self.disabled_tests.is_file_wide() || self.omitted_tests.is_file_wide()
  }

  /// Whether an occurrence of `name` is skipped, via either form of either
  /// field. Checked before expectations, so a skip always wins.
  pub fn skips(&self, name: &str) -> bool {
    self.skips_file() || self.disabled_tests.lists(name) || self.omitted_tests.lists(name)
  }

  pub fn expects_failure(&self, name: &str) -> bool {
    self.expected_failures.iter().any(|n| n == name)
  }

  fn validate(&self, file: &str) -> Result<()> {
    if self.skips_file() && !self.expected_failures.is_empty() {
      bail!(
        "override for `{file}` disables or omits the whole file but still lists expected failures"
      );
    }

    for name in &self.expected_failures {
      if self.disabled_tests.lists(name) || self.omitted_tests.lists(name) {
        bail!(
          "override for `{file}` lists {name:?} as both an expected failure and a disabled/omitted test"
        );
      }
    }

    Ok(())
  }
}

/// Immutable per-suite table mapping test-file paths to override records.
///
/// Loaded and validated once per run, then shared read-only by every
/// reconciliation. A malformed table makes all verdicts unreliable, so any
/// validation failure aborts before a single result is reconciled.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
  records: BTreeMap<String, OverrideRecord>,
}

impl OverrideTable {
  pub fn empty() -> Self {
    Self::default()
  }

  /// Parse a single override config, as TOML first and JSON on fallback.
  pub fn from_str(raw: &str) -> Result<Self> {
    Self::from_records(parse_records(raw)?)
  }

  /// Load a table from one config file, or from every `.toml`/`.json` file
  /// under a directory (upstream keeps one override file per API area).
  pub fn from_path(path: &Path) -> Result<Self> {
    if path.is_dir() {
      return Self::from_dir(path);
    }

    let raw =
      fs::read_to_string(path).with_context(|| format!("read overrides {}", path.display()))?;
    Self::from_str(&raw).map_err(|err| anyhow!("{}: {err}", path.display()))
  }

  pub fn from_records(records: BTreeMap<String, OverrideRecord>) -> Result<Self> {
    for (file, record) in &records {
      record.validate(file)?;
    }
    Ok(Self { records })
  }

  fn from_dir(dir: &Path) -> Result<Self> {
    let mut config_files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
      let entry =
        entry.with_context(|| format!("walk overrides directory {}", dir.display()))?;
      if !entry.file_type().is_file() {
        continue;
      }
      let path = entry.into_path();
      if matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("toml") | Some("json")
      ) {
        config_files.push(path);
      }
    }
    config_files.sort();

    if config_files.is_empty() {
      bail!(
        "no override config files (.toml/.json) found under {}",
        dir.display()
      );
    }

    let mut merged = BTreeMap::new();
    for path in &config_files {
      let raw =
        fs::read_to_string(path).with_context(|| format!("read overrides {}", path.display()))?;
      let records = parse_records(&raw).map_err(|err| anyhow!("{}: {err}", path.display()))?;
      for (file, record) in records {
        if merged.contains_key(&file) {
          bail!(
            "test file `{file}` is overridden by more than one config file (second claim in {})",
            path.display()
          );
        }
        merged.insert(file, record);
      }
    }

    Self::from_records(merged)
  }

  /// Total lookup: a file without an entry gets the all-empty record, i.e.
  /// every test in it is expected to pass.
  pub fn lookup(&self, file: &str) -> &OverrideRecord {
    static EMPTY: OverrideRecord = OverrideRecord::empty();
    self.records.get(file).unwrap_or(&EMPTY)
  }

  pub fn get(&self, file: &str) -> Option<&OverrideRecord> {
    self.records.get(file)
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideRecord)> {
    self.records.iter().map(|(file, record)| (file.as_str(), record))
  }
}

fn parse_records(raw: &str) -> Result<BTreeMap<String, OverrideRecord>> {
  match toml::from_str::<BTreeMap<String, OverrideRecord>>(raw) {
    Ok(records) => Ok(records),
    Err(toml_err) => serde_json::from_str::<BTreeMap<String, OverrideRecord>>(raw)
      .map_err(|json_err| {
        anyhow!("failed to parse overrides as TOML ({toml_err}) or JSON ({json_err})")
      }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn parses_boolean_and_list_forms() {
    let table = OverrideTable::from_str(
      r#"
["events.any.js"]
comment = "investigating"
expected_failures = ["Equivalence of option values", ""]

["event-constructors.any.js"]
disabled_tests = true

["helpers/scroll_support.js"]
comment = "Only used by HTML files"
omitted_tests = true

["removeEventListener.any.js"]
disabled_tests = ["removing a null event listener should succeed"]
"#,
    )
    .expect("table parsed");

    assert_eq!(table.len(), 4);

    let record = table.lookup("events.any.js");
    assert!(record.expects_failure("Equivalence of option values"));
    assert!(record.expects_failure(""));
    assert!(!record.skips("Equivalence of option values"));

    assert!(table.lookup("event-constructors.any.js").skips("anything"));
    assert!(table.lookup("helpers/scroll_support.js").skips_file());

    let listed = table.lookup("removeEventListener.any.js");
    assert!(listed.skips("removing a null event listener should succeed"));
    assert!(!listed.skips("some other test"));
  }

  #[test]
  fn falls_back_to_json() {
    let table = OverrideTable::from_str(
      r#"{ "a.any.js": { "expected_failures": ["t1"] }, "b.any.js": {} }"#,
    )
    .expect("JSON parsed");
    assert!(table.lookup("a.any.js").expects_failure("t1"));
    assert_eq!(table.get("b.any.js"), Some(&OverrideRecord::empty()));
  }

  #[test]
  fn lookup_is_total() {
    let table = OverrideTable::empty();
    let record = table.lookup("never-configured.any.js");
    assert_eq!(*record, OverrideRecord::empty());
    assert!(!record.skips(""));
    assert!(!record.expects_failure(""));
  }

  #[test]
  fn rejects_name_in_mutually_exclusive_fields() {
    let err = OverrideTable::from_str(
      r#"
["a.any.js"]
expected_failures = ["t1"]
disabled_tests = ["t1"]
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("both an expected failure"));
  }

  #[test]
  fn rejects_file_wide_skip_with_expected_failures() {
    let err = OverrideTable::from_str(
      r#"
["a.any.js"]
omitted_tests = true
expected_failures = ["t1"]
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("still lists expected failures"));
  }

  #[test]
  fn rejects_unknown_fields() {
    let err = OverrideTable::from_str(
      r#"
["a.any.js"]
expectedFailures = ["t1"]
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to parse overrides"));
  }

  #[test]
  fn directory_load_merges_and_rejects_duplicate_claims() {
    let temp = tempdir().unwrap();
    fs::write(
      temp.path().join("dom-events.toml"),
      "[\"events.any.js\"]\nexpected_failures = [\"t1\"]\n",
    )
    .unwrap();
    fs::write(
      temp.path().join("urlpattern.toml"),
      "[\"urlpattern.any.js\"]\nomitted_tests = true\n",
    )
    .unwrap();

    let table = OverrideTable::from_path(temp.path()).expect("merged");
    assert_eq!(table.len(), 2);

    fs::write(
      temp.path().join("zz-duplicate.toml"),
      "[\"events.any.js\"]\ndisabled_tests = true\n",
    )
    .unwrap();
    let err = OverrideTable::from_path(temp.path()).unwrap_err();
    assert!(err.to_string().contains("more than one config file"));
  }

  #[test]
  fn empty_directory_is_an_error() {
    let temp = tempdir().unwrap();
    let err = OverrideTable::from_path(temp.path()).unwrap_err();
    assert!(err.to_string().contains("no override config files"));
  }
}
