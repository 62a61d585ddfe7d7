use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum FailOn {
  /// Non-zero on broken files or any drift finding.
  All,
  /// Non-zero only for broken files (default).
  #[default]
  Broken,
  /// Always zero.
  None,
}

impl FailOn {
  pub fn should_fail(&self, broken_files: usize, drift_findings: usize) -> bool {
    match self {
      FailOn::All => broken_files > 0 || drift_findings > 0,
      FailOn::Broken => broken_files > 0,
      FailOn::None => false,
    }
  }
}
