//! Path rewriting for nested installs
//!
//! Shared assets are authored for a flat project root (`/memory/...`,
//! `/scripts/...`) but are installed one level deeper, under the namespace
//! directory. Every `/<folder>` path segment in a text file becomes
//! `/<namespace>/<folder>`.
//!
//! Matching is scoped to whole path segments: the folder name must be followed
//! by `/`, a quote, whitespace, or the end of the text. A segment already
//! preceded by the namespace is left alone, which makes the rewrite idempotent.
//!
//! Known limitation: prose that happens to contain `/memory/` is rewritten too.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::package::assemble::PackageTree;
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Extensions treated as text
const TEXT_EXTENSIONS: &[&str] = &["md", "sh", "ps1", "toml", "yaml", "yml", "json", "txt"];

/// Summary of one rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
  pub files_scanned: usize,
  pub files_rewritten: usize,
  pub replacements: usize,
}

/// Rewrite shared-folder references in every text file of a package tree
pub fn rewrite(tree: &PackageTree, folder_names: &[String], namespace: &str) -> ReleaseResult<RewriteReport> {
  rewrite_dir(&tree.root, folder_names, namespace)
}

/// Rewrite every text file under `root` in place
pub fn rewrite_dir(root: &Path, folder_names: &[String], namespace: &str) -> ReleaseResult<RewriteReport> {
  let namespace = namespace.trim_matches('/');
  let mut report = RewriteReport::default();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry?;
    if !entry.file_type().is_file() || !is_text_path(entry.path()) {
      continue;
    }

    let bytes = fs::read(entry.path()).with_context(|| format!("Failed to read {}", entry.path().display()))?;
    let Some(content) = as_text(bytes) else {
      tracing::debug!(path = %entry.path().display(), "skipping binary file");
      continue;
    };
    report.files_scanned += 1;

    let (rewritten, count) = rewrite_text(&content, folder_names, namespace);
    if count == 0 {
      continue;
    }

    check_no_double_prefix(entry.path(), &content, &rewritten, folder_names, namespace)?;

    fs::write(entry.path(), rewritten).with_context(|| format!("Failed to write {}", entry.path().display()))?;
    report.files_rewritten += 1;
    report.replacements += count;
  }

  Ok(report)
}

/// Rewrite references in a string. Returns the new text and the number of replacements.
pub fn rewrite_text(content: &str, folder_names: &[String], namespace: &str) -> (String, usize) {
  let mut current = content.to_string();
  let mut total = 0;

  for folder in folder_names {
    let (next, count) = rewrite_folder(&current, folder, namespace);
    current = next;
    total += count;
  }

  (current, total)
}

fn rewrite_folder(content: &str, folder: &str, namespace: &str) -> (String, usize) {
  let needle = format!("/{}", folder);
  let prefix = format!("/{}", namespace);
  let mut out = String::with_capacity(content.len());
  let mut last = 0;
  let mut count = 0;

  for (start, _) in content.match_indices(&needle) {
    let after = content[start + needle.len()..].chars().next();
    if !is_segment_end(after) {
      continue;
    }
    if content[..start].ends_with(namespace) {
      continue;
    }

    out.push_str(&content[last..start]);
    out.push_str(&prefix);
    last = start;
    count += 1;
  }

  out.push_str(&content[last..]);
  (out, count)
}

fn is_segment_end(next: Option<char>) -> bool {
  match next {
    None => true,
    Some(c) => matches!(c, '/' | '"' | '\'' | '`') || c.is_whitespace(),
  }
}

fn check_no_double_prefix(
  path: &Path,
  before: &str,
  after: &str,
  folder_names: &[String],
  namespace: &str,
) -> ReleaseResult<()> {
  for folder in folder_names {
    let doubled = format!("{ns}/{ns}/{folder}", ns = namespace);
    if after.matches(&doubled).count() > before.matches(&doubled).count() {
      return Err(ReleaseError::PathRewriteConflict {
        file: path.to_path_buf(),
        folder: folder.clone(),
      });
    }
  }
  Ok(())
}

fn is_text_path(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)))
}

/// UTF-8 content without NUL bytes; anything else is treated as binary
fn as_text(bytes: Vec<u8>) -> Option<String> {
  if bytes.contains(&0) {
    return None;
  }
  String::from_utf8(bytes).ok()
}
