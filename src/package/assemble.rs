//! Package assembly
//!
//! Builds `<output>/sdd-<agent>-package/`:
//!
//! ```text
//! sdd-claude-package/
//!   .speckit/memory/...      shared assets, nested under the namespace
//!   .speckit/scripts/...
//!   .speckit/templates/...   minus excluded subpaths
//!   .claude/commands/*.md    rendered commands
//! ```
//!
//! Each tree is owned by exactly one worker. Source directories are only read.

use crate::core::config::SharedAsset;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::package::agent::AgentTarget;
use crate::package::transpile::RenderedCommand;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Everything needed to assemble one agent's package
pub struct AssemblyRequest<'a> {
  pub target: &'static AgentTarget,
  /// Project root the shared asset paths are relative to
  pub source_root: &'a Path,
  pub shared: &'a [SharedAsset],
  /// Subpaths relative to the namespace root
  pub exclusions: &'a [PathBuf],
  pub commands: &'a [RenderedCommand],
  pub namespace: &'a str,
  pub output_dir: &'a Path,
}

/// An assembled package on disk
#[derive(Debug)]
pub struct PackageTree {
  /// Package root; every archived path is relative to this
  pub root: PathBuf,
  pub namespace: String,
  /// Shared folders that were present and copied
  pub copied: Vec<String>,
  /// Optional shared folders that were absent
  pub skipped: Vec<String>,
}

impl PackageTree {
  /// Every file in the tree, relative to the root, in sorted traversal order
  pub fn files(&self) -> ReleaseResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(&self.root).sort_by_file_name() {
      let entry = entry?;
      if entry.file_type().is_file() {
        files.push(entry.path().strip_prefix(&self.root)?.to_path_buf());
      }
    }
    Ok(files)
  }
}

/// Assemble one agent's package tree
pub fn assemble(request: &AssemblyRequest<'_>) -> ReleaseResult<PackageTree> {
  let target = request.target;
  let root = request.output_dir.join(target.package_dir_name());

  // Required assets are checked up front so a failing target leaves no tree behind
  for asset in request.shared.iter().filter(|a| a.required) {
    let source = request.source_root.join(&asset.path);
    if !source.is_dir() {
      return Err(ReleaseError::MissingAsset {
        path: source,
        required: true,
      });
    }
  }

  if root.exists() {
    fs::remove_dir_all(&root).with_context(|| format!("Failed to clear previous package {}", root.display()))?;
  }
  let namespace_root = root.join(request.namespace);
  fs::create_dir_all(&namespace_root)
    .with_context(|| format!("Failed to create package root {}", namespace_root.display()))?;

  let mut copied = Vec::new();
  let mut skipped = Vec::new();

  for asset in request.shared {
    let source = request.source_root.join(&asset.path);
    let folder = asset.folder_name();

    if !source.is_dir() {
      tracing::warn!(agent = target.id, path = %source.display(), "optional shared asset missing, skipping");
      skipped.push(folder);
      continue;
    }

    copy_dir_all(&source, &namespace_root.join(&folder))?;
    tracing::debug!(agent = target.id, folder = %folder, "copied shared asset");
    copied.push(folder);
  }

  for excluded in request.exclusions {
    remove_if_present(&namespace_root, excluded)?;
  }

  for command in request.commands {
    write_command(&root, command)?;
  }

  Ok(PackageTree {
    root,
    namespace: request.namespace.to_string(),
    copied,
    skipped,
  })
}

/// Recursively copy a directory, preserving relative layout
pub fn copy_dir_all(source: &Path, dest: &Path) -> ReleaseResult<()> {
  for entry in WalkDir::new(source).sort_by_file_name() {
    let entry = entry?;
    let relative = entry.path().strip_prefix(source)?;
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).with_context(|| format!("Failed to create {}", target.display()))?;
    } else if entry.file_type().is_file() {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)
        .with_context(|| format!("Failed to copy {} to {}", entry.path().display(), target.display()))?;
    }
  }
  Ok(())
}

/// Remove `relative` under `base` if it exists. Paths escaping `base` are ignored.
fn remove_if_present(base: &Path, relative: &Path) -> ReleaseResult<()> {
  if relative.is_absolute() || relative.components().any(|c| c.as_os_str() == "..") {
    tracing::warn!(path = %relative.display(), "ignoring exclusion outside the package");
    return Ok(());
  }

  let path = base.join(relative);
  if path.is_dir() {
    fs::remove_dir_all(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
  } else if path.exists() {
    fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
  }
  Ok(())
}

fn write_command(root: &Path, command: &RenderedCommand) -> ReleaseResult<()> {
  let path = root.join(&command.relative_path);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  fs::write(&path, &command.content).with_context(|| format!("Failed to write command {}", path.display()))?;
  Ok(())
}
