//! Source command templates
//!
//! ```text
//! ---
//! description: "Create a feature specification."
//! ---
//! Body text using {ARGS}
//! ```
//!
//! The body is everything after the second `---` line. Anything between the
//! markers is metadata; only `description:` is read.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Region marker line
pub const REGION_MARKER: &str = "---";

const DESCRIPTION_KEY: &str = "description:";

/// A raw command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
  /// File stem, used as the rendered command name
  pub stem: String,
  pub source: String,
}

/// Description and body extracted from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
  pub description: String,
  pub body: String,
}

impl CommandTemplate {
  #[cfg(test)]
  pub fn new(stem: impl Into<String>, source: impl Into<String>) -> Self {
    Self {
      stem: stem.into(),
      source: source.into(),
    }
  }

  /// Read one template file
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let stem = path
      .file_stem()
      .map(|s| s.to_string_lossy().to_string())
      .ok_or_else(|| ReleaseError::message(format!("Template has no file name: {}", path.display())))?;
    let source = fs::read_to_string(path).with_context(|| format!("Failed to read template {}", path.display()))?;
    Ok(Self { stem, source })
  }

  /// Load every `*.md` template in a directory, sorted by file name
  pub fn load_dir(dir: &Path) -> ReleaseResult<Vec<Self>> {
    if !dir.is_dir() {
      return Err(ReleaseError::MissingAsset {
        path: dir.to_path_buf(),
        required: true,
      });
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
      .with_context(|| format!("Failed to list templates in {}", dir.display()))?
      .filter_map(|entry| entry.ok().map(|e| e.path()))
      .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
      .collect();
    paths.sort();

    paths.iter().map(|p| Self::load(p)).collect()
  }

  /// Split into description and body
  pub fn parse(&self) -> ReleaseResult<ParsedTemplate> {
    // Description is only read from the front matter; body start is the byte
    // offset just past the second marker line (including its newline)
    let mut description = None;
    let mut markers_found = 0;
    let mut offset = 0;
    let mut body_start = None;
    for line in self.source.split_inclusive('\n') {
      offset += line.len();
      if line.trim() == REGION_MARKER {
        markers_found += 1;
        if markers_found == 2 {
          body_start = Some(offset);
          break;
        }
      } else if markers_found == 1 && description.is_none() {
        description = line
          .trim_end_matches(['\r', '\n'])
          .strip_prefix(DESCRIPTION_KEY)
          .map(|value| strip_quotes(value.trim()).to_string());
      }
    }
    let description = description.unwrap_or_default();

    let Some(body_start) = body_start else {
      return Err(ReleaseError::MalformedTemplate {
        template: self.stem.clone(),
        markers_found,
      });
    };

    Ok(ParsedTemplate {
      description,
      body: self.source[body_start..].to_string(),
    })
  }
}

fn strip_quotes(value: &str) -> &str {
  for quote in ['"', '\''] {
    if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
      return &value[1..value.len() - 1];
    }
  }
  value
}
