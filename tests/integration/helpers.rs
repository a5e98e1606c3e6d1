//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const SPECIFY_TEMPLATE: &str = r#"---
description: "Create or update the feature specification. Runs the setup script first."
scripts:
  sh: scripts/bash/create-new-feature.sh --json "{ARGS}"
---
The user input after the command is: {ARGS}

1. Run `/scripts/bash/create-new-feature.sh --json "{ARGS}"` from the repo root.
2. Load `/templates/spec-template.md` and follow /memory/constitution.md
"#;

pub const PLAN_TEMPLATE: &str = r#"---
description: Execute the implementation planning workflow.
---
Plan for {ARGS}. Read /memory/constitution.md first.
"#;

/// A test project: git repository with shared assets and command templates
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Create a repository with the default spec-kit layout and one commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["config", "tag.gpgsign", "false"])?;

    let repo = Self { _root: root, path };
    repo.write("templates/commands/specify.md", SPECIFY_TEMPLATE)?;
    repo.write("templates/commands/plan.md", PLAN_TEMPLATE)?;
    repo.write("templates/spec-template.md", "# Spec\n\nSee /memory/constitution.md\n")?;
    repo.write("memory/constitution.md", "# Constitution\n")?;
    repo.write(
      "scripts/bash/create-new-feature.sh",
      "#!/usr/bin/env bash\nsource \"$REPO_ROOT/scripts/bash/common.sh\"\ncat /templates/spec-template.md\n",
    )?;
    repo.write("scripts/bash/common.sh", "#!/usr/bin/env bash\n")?;
    repo.write("pyproject.toml", "[project]\nname = \"specify-cli\"\nversion = \"0.0.1\"\n")?;
    repo.commit("Initial templates")?;

    Ok(repo)
  }

  /// Write a file relative to the repository root, creating parent directories
  pub fn write(&self, relative: &str, content: &str) -> Result<()> {
    let path = self.path.join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Remove a directory relative to the repository root
  pub fn remove_dir(&self, relative: &str) -> Result<()> {
    std::fs::remove_dir_all(self.path.join(relative))?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "-A"])?;
    git(&self.path, &["commit", "--allow-empty", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Add `count` empty commits named `<prefix> N`
  pub fn commit_many(&self, prefix: &str, count: usize) -> Result<()> {
    for n in 1..=count {
      git(
        &self.path,
        &["commit", "--allow-empty", "-m", &format!("{} {}", prefix, n)],
      )?;
    }
    Ok(())
  }

  /// Create a lightweight tag at HEAD
  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", name])?;
    Ok(())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run speckit-release and require success
pub fn run_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_release_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "speckit-release failed: speckit-release {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run speckit-release without checking the exit status
pub fn run_release_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_speckit-release");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run speckit-release")
}

/// Run with `--json` and parse the stdout summary
pub fn run_release_json(cwd: &Path, args: &[&str]) -> Result<serde_json::Value> {
  let mut all: Vec<&str> = args.to_vec();
  all.push("--json");
  let output = run_release(cwd, &all)?;
  serde_json::from_slice(&output.stdout).context("stdout is not a JSON summary")
}

/// Entry names and contents of a zip archive, in archive order
pub fn zip_entries(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
  let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
  let mut archive = zip::ZipArchive::new(file)?;

  let mut entries = Vec::new();
  for i in 0..archive.len() {
    let mut entry = archive.by_index(i)?;
    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    entries.push((entry.name().to_string(), content));
  }
  Ok(entries)
}

/// Entry names only
pub fn zip_names(path: &Path) -> Result<Vec<String>> {
  Ok(zip_entries(path)?.into_iter().map(|(name, _)| name).collect())
}

/// Text content of one archive entry
pub fn zip_text(path: &Path, name: &str) -> Result<String> {
  let (_, content) = zip_entries(path)?
    .into_iter()
    .find(|(entry, _)| entry == name)
    .with_context(|| format!("{} not in {}", name, path.display()))?;
  Ok(String::from_utf8(content)?)
}
