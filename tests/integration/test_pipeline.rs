//! End-to-end pipeline behavior

use crate::helpers::{TestRepo, run_release, run_release_json, run_release_raw, zip_entries};
use anyhow::Result;

#[test]
fn test_default_stages_are_package_and_notes() -> Result<()> {
  let repo = TestRepo::new()?;
  let summary = run_release_json(&repo.path, &[])?;

  assert_eq!(summary["packages"].as_array().map(Vec::len), Some(3));
  assert!(summary["notes"].is_string());
  assert!(summary["release"].is_null());
  assert!(repo.file_exists(".genreleases/release_notes.md"));
  assert!(repo.file_exists(".genreleases/spec-kit-template-gemini-v0.0.1.zip"));

  Ok(())
}

#[test]
fn test_rerun_produces_identical_archives() -> Result<()> {
  let repo = TestRepo::new()?;
  let zip = repo.path.join(".genreleases/spec-kit-template-copilot-v0.0.1.zip");

  run_release(&repo.path, &["--package"])?;
  let first = zip_entries(&zip)?;
  let first_sums = repo.read_file(".genreleases/SHA256SUMS")?;

  run_release(&repo.path, &["--package"])?;
  let second = zip_entries(&zip)?;
  let second_sums = repo.read_file(".genreleases/SHA256SUMS")?;

  assert_eq!(first, second);
  assert_eq!(first_sums, second_sums);
  assert!(!repo.file_exists(".genreleases/spec-kit-template-copilot-v0.0.1.zip.tmp"));

  Ok(())
}

#[test]
fn test_checksums_match_archives() -> Result<()> {
  use sha2::{Digest, Sha256};

  let repo = TestRepo::new()?;
  run_release(&repo.path, &["--package"])?;

  let sums = repo.read_file(".genreleases/SHA256SUMS")?;
  let lines: Vec<&str> = sums.lines().collect();
  assert_eq!(lines.len(), 3);

  for line in lines {
    let (digest, name) = line.split_once("  ").unwrap_or_default();
    let bytes = std::fs::read(repo.path.join(".genreleases").join(name))?;
    assert_eq!(digest, format!("{:x}", Sha256::digest(&bytes)), "{}", name);
  }

  Ok(())
}

#[test]
fn test_agent_selection() -> Result<()> {
  let repo = TestRepo::new()?;
  let summary = run_release_json(&repo.path, &["--package", "--agents", "claude,gemini"])?;

  let agents: Vec<&str> = summary["packages"]
    .as_array()
    .map(|p| p.iter().filter_map(|p| p["agent"].as_str()).collect())
    .unwrap_or_default();
  assert_eq!(agents, vec!["gemini", "claude"]);
  assert!(!repo.file_exists(".genreleases/spec-kit-template-copilot-v0.0.1.zip"));

  Ok(())
}

#[test]
fn test_unknown_agent_is_config_error() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = run_release_raw(&repo.path, &["--agents", "cursor"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("cursor"), "stderr: {}", stderr);
  assert!(stderr.contains("Known agents"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_unknown_switch_is_rejected() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = run_release_raw(&repo.path, &["--frobnicate"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Unknown argument: --frobnicate"), "stderr: {}", stderr);
  assert!(!repo.file_exists(".genreleases"));

  Ok(())
}

#[test]
fn test_output_dir_override() -> Result<()> {
  let repo = TestRepo::new()?;
  run_release(&repo.path, &["--package", "--output-dir", "dist"])?;

  assert!(repo.file_exists("dist/spec-kit-template-claude-v0.0.1.zip"));
  assert!(!repo.file_exists(".genreleases"));

  Ok(())
}

#[test]
fn test_root_flag() -> Result<()> {
  let repo = TestRepo::new()?;
  let elsewhere = tempfile::TempDir::new()?;
  let root = repo.path.to_string_lossy().to_string();

  run_release(elsewhere.path(), &["--notes", "--root", &root])?;
  assert!(repo.file_exists(".genreleases/release_notes.md"));

  Ok(())
}

#[test]
fn test_cleanup_removes_generated_artifacts() -> Result<()> {
  let repo = TestRepo::new()?;
  run_release(&repo.path, &[])?;
  assert!(repo.file_exists(".genreleases"));

  let summary = run_release_json(&repo.path, &["--cleanup"])?;
  assert_eq!(summary["cleanup"]["removed_dir"], true);
  assert!(!repo.file_exists(".genreleases"));

  // Nothing left to clean is not an error
  run_release(&repo.path, &["--cleanup"])?;

  Ok(())
}

#[test]
fn test_cleanup_outside_git_repository() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  std::fs::create_dir_all(dir.path().join(".genreleases/sdd-claude-package"))?;

  run_release(dir.path(), &["--cleanup"])?;
  assert!(!dir.path().join(".genreleases").exists());

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_publish_failure_is_reported() -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let repo = TestRepo::new()?;

  // A gh stub that rejects every call
  let bin = tempfile::TempDir::new()?;
  let gh = bin.path().join("gh");
  std::fs::write(&gh, "#!/bin/sh\necho 'HTTP 401: Bad credentials' >&2\nexit 1\n")?;
  std::fs::set_permissions(&gh, std::fs::Permissions::from_mode(0o755))?;
  let path = format!("{}:{}", bin.path().display(), std::env::var("PATH").unwrap_or_default());

  let output = std::process::Command::new(env!("CARGO_BIN_EXE_speckit-release"))
    .current_dir(&repo.path)
    .args(["--package", "--notes", "--publish"])
    .env("PATH", path)
    .output()?;

  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("[publish]"), "stderr: {}", stderr);
  assert!(stderr.contains("gh auth status"), "stderr: {}", stderr);
  // Artifacts from the earlier stages are kept
  assert!(repo.file_exists(".genreleases/spec-kit-template-claude-v0.0.1.zip"));
  assert!(repo.file_exists(".genreleases/release_notes.md"));

  Ok(())
}
