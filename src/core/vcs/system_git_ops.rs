//! Tag lookup and commit-log operations for SystemGit

use super::system_git::SystemGit;
use crate::core::error::ReleaseResult;

/// Release tags start with `v` and a digit
const VERSION_TAG_GLOB: &str = "v[0-9]*";

impl SystemGit {
  /// Most recent version tag (`v<digit>...`) reachable from HEAD, if any
  ///
  /// Uses `git describe --tags --abbrev=0`. Tags like `vendor-snapshot` never
  /// match. A repository with no tags (or no commits) yields `None` rather
  /// than an error.
  pub fn latest_version_tag(&self) -> ReleaseResult<Option<String>> {
    let output = self
      .git_cmd()
      .args(["describe", "--tags", "--abbrev=0", "--match", VERSION_TAG_GLOB])
      .output()?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      tracing::debug!(stderr = %stderr.trim(), "git describe found no version tag");
      return Ok(None);
    }

    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if tag.is_empty() { None } else { Some(tag) })
  }

  /// Number of commits reachable from HEAD (0 for an unborn branch)
  pub fn commit_count(&self) -> ReleaseResult<usize> {
    let output = self.git_cmd().args(["rev-list", "--count", "HEAD"]).output()?;

    if !output.status.success() {
      return Ok(0);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().parse()?)
  }

  /// Subjects of the last `limit` commits, newest first
  pub fn recent_subjects(&self, limit: usize) -> ReleaseResult<Vec<String>> {
    if limit == 0 {
      return Ok(Vec::new());
    }
    let max_count = format!("--max-count={}", limit);
    let output = self.run(&["log", &max_count, "--pretty=format:%s"])?;
    Ok(parse_subjects(&output.stdout))
  }

  /// Subjects of commits in `<since>..HEAD`, newest first
  pub fn subjects_since(&self, since: &str) -> ReleaseResult<Vec<String>> {
    let range = format!("{}..HEAD", since);
    let output = self.run(&["log", &range, "--pretty=format:%s"])?;
    Ok(parse_subjects(&output.stdout))
  }

  /// Subjects of every commit reachable from HEAD, newest first
  pub fn all_subjects(&self) -> ReleaseResult<Vec<String>> {
    let output = self.run(&["log", "--pretty=format:%s"])?;
    Ok(parse_subjects(&output.stdout))
  }
}

/// One subject per line; blank lines dropped
fn parse_subjects(stdout: &[u8]) -> Vec<String> {
  String::from_utf8_lossy(stdout)
    .lines()
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect()
}
