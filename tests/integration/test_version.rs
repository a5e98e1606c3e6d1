//! Version resolution through the CLI

use crate::helpers::{TestRepo, run_release_json, run_release_raw};
use anyhow::Result;

fn resolved_tag(repo: &TestRepo, bump: &str) -> Result<String> {
  let summary = run_release_json(&repo.path, &[bump, "--notes"])?;
  Ok(summary["version"]["tag"].as_str().unwrap_or_default().to_string())
}

#[test]
fn test_first_release_from_baseline() -> Result<()> {
  let repo = TestRepo::new()?;

  assert_eq!(resolved_tag(&repo, "major")?, "v1.0.0");
  assert_eq!(resolved_tag(&repo, "minor")?, "v0.1.0");
  assert_eq!(resolved_tag(&repo, "patch")?, "v0.0.1");

  Ok(())
}

#[test]
fn test_bumps_from_latest_tag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.tag("v1.2.3")?;
  repo.commit("Fix template typo")?;

  assert_eq!(resolved_tag(&repo, "patch")?, "v1.2.4");
  assert_eq!(resolved_tag(&repo, "minor")?, "v1.3.0");
  assert_eq!(resolved_tag(&repo, "major")?, "v2.0.0");

  Ok(())
}

#[test]
fn test_latest_tag_wins_and_non_version_tags_ignored() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.tag("v0.1.0")?;
  repo.commit("Second")?;
  repo.tag("v0.2.0")?;
  repo.commit("Third")?;
  repo.tag("nightly")?;

  let summary = run_release_json(&repo.path, &["--notes"])?;
  assert_eq!(summary["version"]["previous_tag"], "v0.2.0");
  assert_eq!(summary["version"]["tag"], "v0.2.1");

  Ok(())
}

#[test]
fn test_v_prefixed_non_version_tags_ignored() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.tag("v1.2.3")?;
  repo.commit("Vendor update")?;
  repo.tag("vendor-snapshot")?;

  let summary = run_release_json(&repo.path, &["--notes"])?;
  assert_eq!(summary["version"]["previous_tag"], "v1.2.3");
  assert_eq!(summary["version"]["tag"], "v1.2.4");

  let notes = repo.read_file(".genreleases/release_notes.md")?;
  assert!(notes.contains("## Changes since v1.2.3"), "notes: {}", notes);

  Ok(())
}

#[test]
fn test_default_bump_is_patch() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.tag("v3.4.5")?;

  let summary = run_release_json(&repo.path, &["--notes"])?;
  assert_eq!(summary["version"]["tag"], "v3.4.6");
  assert_eq!(summary["version"]["bump"], "patch");

  Ok(())
}

#[test]
fn test_invalid_bump_kind_is_user_error() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_release_raw(&repo.path, &["huge"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Invalid bump kind 'huge'"), "stderr: {}", stderr);
  assert!(!repo.file_exists(".genreleases"));

  Ok(())
}

#[test]
fn test_update_version_rewrites_project_metadata() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.tag("v0.3.9")?;

  let summary = run_release_json(&repo.path, &["minor", "--notes", "--update-version"])?;
  assert_eq!(summary["previous_version_field"], "0.0.1");

  let pyproject = repo.read_file("pyproject.toml")?;
  assert!(pyproject.contains("version = \"0.4.0\""), "pyproject: {}", pyproject);
  assert!(pyproject.contains("name = \"specify-cli\""));

  Ok(())
}

#[test]
fn test_update_version_with_cleanup_only_is_rejected() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.tag("v0.3.9")?;

  let output = run_release_raw(&repo.path, &["--cleanup", "--update-version"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("--update-version needs a resolved version"), "stderr: {}", stderr);

  let pyproject = repo.read_file("pyproject.toml")?;
  assert!(pyproject.contains("version = \"0.0.1\""), "pyproject: {}", pyproject);

  Ok(())
}

#[test]
fn test_resolution_does_not_create_tags() -> Result<()> {
  let repo = TestRepo::new()?;
  run_release_json(&repo.path, &["--notes"])?;

  let tags = crate::helpers::git(&repo.path, &["tag", "--list"])?;
  assert!(String::from_utf8_lossy(&tags.stdout).trim().is_empty());

  Ok(())
}
