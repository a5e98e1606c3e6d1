//! Release notes from commit history
//!
//! ```markdown
//! # spec-kit v1.2.4
//!
//! Released 2026-10-18.
//!
//! ## Changes since v1.2.3
//!
//! - Fix plan template
//!
//! ## Packages
//!
//! - spec-kit-template-claude-v1.2.4.zip
//! ```
//!
//! On a first release (no previous tag) the last `limit` commits are listed
//! instead of a range.

use crate::core::error::{ReleaseResult, ResultExt};
use crate::core::vcs::SystemGit;
use crate::release::version::ResolvedVersion;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Notes file name in the output directory
pub const NOTES_FILE: &str = "release_notes.md";

/// Commit subjects and how they were selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLog {
  pub subjects: Vec<String>,
  /// Ranged log failed and the full history was used instead
  pub degraded: bool,
}

/// Rendered release notes
#[derive(Debug, Clone, Serialize)]
pub struct NotesDocument {
  pub tag: String,
  pub previous_tag: Option<String>,
  pub date: NaiveDate,
  pub subjects: Vec<String>,
  pub archives: Vec<String>,
  pub text: String,
}

impl NotesDocument {
  /// Write to `<output_dir>/release_notes.md`
  pub fn write(&self, output_dir: &Path) -> ReleaseResult<PathBuf> {
    fs::create_dir_all(output_dir).with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(NOTES_FILE);
    fs::write(&path, &self.text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
  }
}

/// Select the commit subjects for this release
///
/// Without a previous tag: the last `min(limit, total)` commits. With one:
/// `<previous>..HEAD`, falling back to the full log when the range can't be
/// resolved (shallow clones, deleted tags).
pub fn collect_subjects(git: &SystemGit, previous_tag: Option<&str>, limit: usize) -> ReleaseResult<CommitLog> {
  let Some(previous) = previous_tag else {
    let total = git.commit_count()?;
    let subjects = git.recent_subjects(limit.min(total))?;
    return Ok(CommitLog {
      subjects,
      degraded: false,
    });
  };

  match git.subjects_since(previous) {
    Ok(subjects) => Ok(CommitLog {
      subjects,
      degraded: false,
    }),
    Err(err) => {
      tracing::warn!(
        previous_tag = previous,
        error = %err,
        "commit range unavailable, listing full history in release notes"
      );
      Ok(CommitLog {
        subjects: git.all_subjects()?,
        degraded: true,
      })
    }
  }
}

/// Build the notes document. Pure.
pub fn synthesize(
  product: &str,
  version: &ResolvedVersion,
  subjects: &[String],
  archive_names: &[String],
  date: NaiveDate,
) -> NotesDocument {
  let tag = version.tag();
  let mut text = format!("# {} {}\n\nReleased {}.\n\n", product, tag, date.format("%Y-%m-%d"));

  match &version.previous_tag {
    Some(previous) => text.push_str(&format!("## Changes since {}\n\n", previous)),
    None => text.push_str("## Changes\n\n"),
  }

  if subjects.is_empty() {
    text.push_str("No changes recorded.\n");
  } else {
    for subject in subjects {
      text.push_str(&format!("- {}\n", subject));
    }
  }

  if !archive_names.is_empty() {
    text.push_str("\n## Packages\n\n");
    for name in archive_names {
      text.push_str(&format!("- {}\n", name));
    }
  }

  NotesDocument {
    tag,
    previous_tag: version.previous_tag.clone(),
    date,
    subjects: subjects.to_vec(),
    archives: archive_names.to_vec(),
    text,
  }
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
  chrono::Utc::now().date_naive()
}
