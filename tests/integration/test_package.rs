//! Package assembly, transpiling, rewriting and archiving through the CLI

use crate::helpers::{TestRepo, run_release, run_release_json, run_release_raw, zip_names, zip_text};
use anyhow::Result;
use walkdir::WalkDir;

const CLAUDE_ZIP: &str = ".genreleases/spec-kit-template-claude-v0.0.1.zip";
const GEMINI_ZIP: &str = ".genreleases/spec-kit-template-gemini-v0.0.1.zip";
const COPILOT_ZIP: &str = ".genreleases/spec-kit-template-copilot-v0.0.1.zip";

#[test]
fn test_package_layout() -> Result<()> {
  let repo = TestRepo::new()?;
  run_release(&repo.path, &["--package"])?;

  let names = zip_names(&repo.path.join(CLAUDE_ZIP))?;
  assert_eq!(
    names,
    vec![
      ".claude/commands/plan.md",
      ".claude/commands/specify.md",
      ".speckit/memory/constitution.md",
      ".speckit/scripts/bash/common.sh",
      ".speckit/scripts/bash/create-new-feature.sh",
      ".speckit/templates/spec-template.md",
    ]
  );
  assert!(repo.file_exists(".genreleases/SHA256SUMS"));
  assert!(repo.file_exists(GEMINI_ZIP));
  assert!(repo.file_exists(COPILOT_ZIP));

  Ok(())
}

#[test]
fn test_archive_entries_match_tree() -> Result<()> {
  let repo = TestRepo::new()?;
  run_release(&repo.path, &["--package"])?;

  for agent in ["claude", "gemini", "copilot"] {
    let tree = repo.path.join(format!(".genreleases/sdd-{}-package", agent));
    let mut files: Vec<String> = WalkDir::new(&tree)
      .into_iter()
      .filter_map(|e| e.ok())
      .filter(|e| e.file_type().is_file())
      .map(|e| {
        e.path()
          .strip_prefix(&tree)
          .map(|p| p.to_string_lossy().replace('\\', "/"))
          .unwrap_or_default()
      })
      .collect();
    files.sort();

    let zip = repo.path.join(format!(".genreleases/spec-kit-template-{}-v0.0.1.zip", agent));
    let mut names = zip_names(&zip)?;
    names.sort();
    assert_eq!(files, names, "agent {}", agent);
  }

  Ok(())
}

#[test]
fn test_command_formats() -> Result<()> {
  let repo = TestRepo::new()?;
  run_release(&repo.path, &["--package"])?;

  let claude = zip_text(&repo.path.join(CLAUDE_ZIP), ".claude/commands/plan.md")?;
  assert_eq!(claude, "Plan for $ARGUMENTS. Read /.speckit/memory/constitution.md first.\n");

  let copilot = zip_text(&repo.path.join(COPILOT_ZIP), ".github/prompts/plan.prompt.md")?;
  assert!(copilot.starts_with("# Execute the implementation planning workflow\n\nPlan for $ARGUMENTS."));

  let gemini = zip_text(&repo.path.join(GEMINI_ZIP), ".gemini/commands/specify.toml")?;
  let doc: toml_edit::DocumentMut = gemini.parse()?;
  assert_eq!(
    doc["description"].as_str(),
    Some("Create or update the feature specification. Runs the setup script first.")
  );
  let prompt = doc["prompt"].as_str().unwrap_or_default();
  assert!(prompt.starts_with("The user input after the command is: {{args}}"));
  assert!(prompt.contains("`/.speckit/scripts/bash/create-new-feature.sh --json \"{{args}}\"`"));
  assert!(!prompt.contains("{ARGS}"));

  Ok(())
}

#[test]
fn test_shared_assets_are_rewritten() -> Result<()> {
  let repo = TestRepo::new()?;
  run_release(&repo.path, &["--package", "--agents", "claude"])?;

  let zip = repo.path.join(CLAUDE_ZIP);
  let script = zip_text(&zip, ".speckit/scripts/bash/create-new-feature.sh")?;
  assert!(script.contains("\"$REPO_ROOT/.speckit/scripts/bash/common.sh\""));
  assert!(script.contains("cat /.speckit/templates/spec-template.md"));

  let spec = zip_text(&zip, ".speckit/templates/spec-template.md")?;
  assert_eq!(spec, "# Spec\n\nSee /.speckit/memory/constitution.md\n");

  // Source assets are never modified
  assert_eq!(
    repo.read_file("templates/spec-template.md")?,
    "# Spec\n\nSee /memory/constitution.md\n"
  );

  Ok(())
}

#[test]
fn test_missing_optional_folder_still_packages() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.remove_dir("memory")?;

  let summary = run_release_json(&repo.path, &["--package"])?;
  let packages = summary["packages"].as_array().cloned().unwrap_or_default();
  assert_eq!(packages.len(), 3);
  for package in &packages {
    assert_eq!(package["status"], "built");
    assert_eq!(package["skipped"][0], "memory");
  }

  let names = zip_names(&repo.path.join(CLAUDE_ZIP))?;
  assert!(names.iter().all(|n| !n.starts_with(".speckit/memory/")));

  Ok(())
}

#[test]
fn test_missing_required_folder_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.remove_dir("templates")?;

  let output = run_release_raw(&repo.path, &["--package", "--json"])?;
  assert_eq!(output.status.code(), Some(1));

  let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  for package in summary["packages"].as_array().cloned().unwrap_or_default() {
    assert_eq!(package["status"], "failed");
    assert_eq!(package["kind"], "MissingAsset");
  }
  assert!(!repo.file_exists(CLAUDE_ZIP));

  Ok(())
}

#[test]
fn test_malformed_template_produces_no_output_for_any_agent() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write("templates/commands/broken.md", "description: no markers\n")?;

  let output = run_release_raw(&repo.path, &["--package"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Malformed command template 'broken'"), "stderr: {}", stderr);

  assert!(!repo.file_exists(".genreleases/sdd-claude-package"));
  assert!(!repo.file_exists(CLAUDE_ZIP));

  Ok(())
}

#[test]
fn test_exclusions_from_config() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write(
    "release.toml",
    "exclude = [\"templates/commands\", \"scripts/bash/common.sh\"]\n\n[agent_exclude]\ngemini = [\"memory\"]\n",
  )?;

  run_release(&repo.path, &["--package"])?;

  let claude = zip_names(&repo.path.join(CLAUDE_ZIP))?;
  assert!(!claude.contains(&".speckit/scripts/bash/common.sh".to_string()));
  assert!(claude.contains(&".speckit/memory/constitution.md".to_string()));

  let gemini = zip_names(&repo.path.join(GEMINI_ZIP))?;
  assert!(gemini.iter().all(|n| !n.starts_with(".speckit/memory/")));

  Ok(())
}
