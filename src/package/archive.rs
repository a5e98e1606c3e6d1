//! Deterministic zip archives
//!
//! Entries are written in sorted traversal order with forward-slash names,
//! a fixed timestamp (1980-01-01) and one of two permission modes (0644, or
//! 0755 when the source file is executable), so the same tree always produces
//! the same entry list and contents.
//!
//! The archive is written to `<name>.zip.tmp` and renamed into place only
//! once complete. A failure or timeout removes the temp file.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::package::assemble::PackageTree;
use crate::utils::archive_entry_name;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Name of the checksum manifest in the output directory
pub const CHECKSUMS_FILE: &str = "SHA256SUMS";

const TEMP_SUFFIX: &str = ".tmp";

const FILE_MODE: u32 = 0o644;
const EXECUTABLE_MODE: u32 = 0o755;

/// A finished archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveHandle {
  pub path: PathBuf,
  /// File name, e.g. `spec-kit-template-claude-v1.2.0.zip`
  pub name: String,
  pub entries: usize,
  pub sha256: String,
}

/// Archive a package tree into `<output_dir>/<name>`
pub fn archive(tree: &PackageTree, output_dir: &Path, name: &str, timeout: Duration) -> ReleaseResult<ArchiveHandle> {
  let files = tree.files()?;
  let path = output_dir.join(name);
  let temp = output_dir.join(format!("{}{}", name, TEMP_SUFFIX));

  let deadline = Instant::now() + timeout;
  let result = write_zip(&tree.root, &files, &temp, name, deadline, timeout);

  if let Err(err) = result {
    if temp.exists() {
      let _ = fs::remove_file(&temp);
    }
    return Err(err);
  }

  fs::rename(&temp, &path).map_err(|e| ReleaseError::ArchiveWrite {
    path: path.clone(),
    reason: format!("rename from {}: {}", temp.display(), e),
  })?;

  let sha256 = sha256_file(&path)?;
  tracing::debug!(archive = name, entries = files.len(), sha256 = %sha256, "archive written");

  Ok(ArchiveHandle {
    path,
    name: name.to_string(),
    entries: files.len(),
    sha256,
  })
}

fn write_zip(
  root: &Path,
  files: &[PathBuf],
  temp: &Path,
  name: &str,
  deadline: Instant,
  timeout: Duration,
) -> ReleaseResult<()> {
  let write_err = |reason: String| ReleaseError::ArchiveWrite {
    path: temp.to_path_buf(),
    reason,
  };

  let file = File::create(temp).map_err(|e| write_err(e.to_string()))?;
  let mut zip = ZipWriter::new(BufWriter::new(file));
  let options = FileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default());

  for relative in files {
    if Instant::now() >= deadline {
      return Err(ReleaseError::Timeout {
        operation: format!("archiving {}", name),
        after: timeout,
      });
    }

    let entry = archive_entry_name(relative);
    let source = root.join(relative);
    let metadata = fs::metadata(&source).map_err(|e| write_err(format!("{}: {}", relative.display(), e)))?;
    let bytes = fs::read(&source).map_err(|e| write_err(format!("{}: {}", relative.display(), e)))?;
    zip
      .start_file(entry.as_str(), options.unix_permissions(entry_mode(&metadata)))
      .map_err(|e| write_err(format!("{}: {}", entry, e)))?;
    zip.write_all(&bytes).map_err(|e| write_err(format!("{}: {}", entry, e)))?;
  }

  let mut writer = zip.finish().map_err(|e| write_err(e.to_string()))?;
  writer.flush().map_err(|e| write_err(e.to_string()))?;
  Ok(())
}

#[cfg(unix)]
fn entry_mode(metadata: &fs::Metadata) -> u32 {
  use std::os::unix::fs::PermissionsExt;
  if metadata.permissions().mode() & 0o111 != 0 {
    EXECUTABLE_MODE
  } else {
    FILE_MODE
  }
}

#[cfg(not(unix))]
fn entry_mode(_metadata: &fs::Metadata) -> u32 {
  FILE_MODE
}

/// Lowercase hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> ReleaseResult<String> {
  let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Write `SHA256SUMS` (`<hex>  <name>` per line, sorted by name)
pub fn write_checksums(output_dir: &Path, archives: &[ArchiveHandle]) -> ReleaseResult<PathBuf> {
  let mut sorted: Vec<&ArchiveHandle> = archives.iter().collect();
  sorted.sort_by(|a, b| a.name.cmp(&b.name));
  let lines: Vec<String> = sorted.iter().map(|a| format!("{}  {}\n", a.sha256, a.name)).collect();

  let path = output_dir.join(CHECKSUMS_FILE);
  fs::write(&path, lines.concat()).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(path)
}
