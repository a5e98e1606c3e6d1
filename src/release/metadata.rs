//! Project metadata version field
//!
//! `--update-version` writes the resolved version into `[project].version` of
//! the project metadata document (pyproject.toml by default). Only that value
//! changes; comments and formatting elsewhere are preserved.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use semver::Version;
use std::fs;
use std::path::Path;

/// Set `[project].version`. Returns the previous value if there was one.
pub fn update_project_version(path: &Path, version: &Version) -> ReleaseResult<Option<String>> {
  if !path.is_file() {
    return Err(ReleaseError::MissingAsset {
      path: path.to_path_buf(),
      required: true,
    });
  }

  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let mut doc: toml_edit::DocumentMut = content
    .parse()
    .map_err(|e| ReleaseError::message(format!("Failed to parse {}: {}", path.display(), e)))?;

  let Some(project) = doc.get_mut("project").and_then(|p| p.as_table_mut()) else {
    return Err(ReleaseError::with_help(
      format!("No [project] section in {}", path.display()),
      "Add a [project] table with a version key, or point version_file at another document",
    ));
  };

  let previous = project.get("version").and_then(|v| v.as_str()).map(str::to_string);
  match project.get_mut("version").and_then(|v| v.as_value_mut()) {
    Some(current) => {
      // Keep surrounding whitespace and a trailing comment on the line
      let decor = current.decor().clone();
      *current = toml_edit::Value::from(version.to_string());
      *current.decor_mut() = decor;
    }
    None => project["version"] = toml_edit::value(version.to_string()),
  }

  fs::write(path, doc.to_string()).with_context(|| format!("Failed to write {}", path.display()))?;
  tracing::info!(
    file = %path.display(),
    previous = previous.as_deref().unwrap_or("<none>"),
    version = %version,
    "updated project version"
  );

  Ok(previous)
}
