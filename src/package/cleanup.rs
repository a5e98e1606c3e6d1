//! Output directory cleanup
//!
//! Only artifacts this tool produces are removed; anything else in the output
//! directory is left alone, and the directory itself is only removed if empty.

use crate::core::error::{ReleaseResult, ResultExt};
use crate::package::archive::CHECKSUMS_FILE;
use crate::release::notes::NOTES_FILE;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// What a cleanup pass removed
#[derive(Debug, Default, Clone, Serialize)]
pub struct CleanupReport {
  pub removed: Vec<PathBuf>,
  /// The output directory itself was removed
  pub removed_dir: bool,
}

/// Remove generated artifacts from `output_dir`. A missing directory is not an error.
pub fn cleanup(output_dir: &Path) -> ReleaseResult<CleanupReport> {
  let mut report = CleanupReport::default();
  if !output_dir.is_dir() {
    tracing::debug!(dir = %output_dir.display(), "nothing to clean");
    return Ok(report);
  }

  let mut entries: Vec<PathBuf> = fs::read_dir(output_dir)
    .with_context(|| format!("Failed to list {}", output_dir.display()))?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .collect();
  entries.sort();

  for path in entries {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      continue;
    };

    if path.is_dir() && is_package_dir(name) {
      fs::remove_dir_all(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    } else if path.is_file() && is_generated_file(name) {
      fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    } else {
      continue;
    }
    report.removed.push(path);
  }

  let empty = fs::read_dir(output_dir)
    .with_context(|| format!("Failed to list {}", output_dir.display()))?
    .next()
    .is_none();
  if empty {
    fs::remove_dir(output_dir).with_context(|| format!("Failed to remove {}", output_dir.display()))?;
    report.removed_dir = true;
  }

  Ok(report)
}

fn is_package_dir(name: &str) -> bool {
  name.starts_with("sdd-") && name.ends_with("-package")
}

fn is_generated_file(name: &str) -> bool {
  name.ends_with(".zip") || name.ends_with(".zip.tmp") || name == CHECKSUMS_FILE || name == NOTES_FILE
}
