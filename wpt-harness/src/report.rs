use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Render `value` as the canonical report artifact text: pretty JSON with a
/// trailing newline.
///
/// Deterministic output requires that `value` itself is deterministic:
/// - use a stable ordering for result lists (e.g. input order or sorted)
/// - prefer deterministic map types (`BTreeMap`) over `HashMap` for any
///   fields that are part of the serialized report
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
  let mut text = serde_json::to_string_pretty(value).context("format JSON report")?;
  text.push('\n');
  Ok(text)
}

/// Write the report artifact to `path`, creating parent directories as
/// needed.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
  let text = render_json(value)?;
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
  }
  fs::write(path, text).with_context(|| format!("write report to {}", path.display()))
}

/// Print the report artifact to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
  let text = render_json(value)?;
  let stdout = std::io::stdout();
  let mut handle = stdout.lock();
  handle
    .write_all(text.as_bytes())
    .context("write JSON report to stdout")?;
  Ok(())
}
