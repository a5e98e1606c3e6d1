//! Utility functions for cross-platform path handling

use std::path::{Component, Path, PathBuf};

/// Convert a relative path to a zip entry name (always forward slashes)
///
/// Zip readers expect `/` separators regardless of the platform that wrote
/// the archive. Only normal components are kept, so `./a/b` becomes `a/b`.
pub fn archive_entry_name(path: &Path) -> String {
  path
    .components()
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_string_lossy()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}

/// Resolve `path` against `root` unless it is already absolute
pub fn resolve_under(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  }
}

/// Split a comma-separated list, trimming whitespace and dropping empties
pub fn split_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}
