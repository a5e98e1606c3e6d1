//! Version resolution: latest `v*` tag + requested bump
//!
//! Tags are parsed leniently. A missing or non-numeric component counts as 0,
//! so `v1.2` resolves to `1.2.0` and `vX.3.1-rc1` to `0.3.1`.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::vcs::SystemGit;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
  /// Major version bump (resets minor and patch)
  Major,
  /// Minor version bump (resets patch)
  Minor,
  /// Patch version bump
  Patch,
}

impl BumpKind {
  /// Apply bump to a version. Pre-release and build metadata are dropped.
  pub fn apply(&self, version: &Version) -> Version {
    match self {
      BumpKind::Major => Version::new(version.major + 1, 0, 0),
      BumpKind::Minor => Version::new(version.major, version.minor + 1, 0),
      BumpKind::Patch => Version::new(version.major, version.minor, version.patch + 1),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      BumpKind::Major => "major",
      BumpKind::Minor => "minor",
      BumpKind::Patch => "patch",
    }
  }
}

impl FromStr for BumpKind {
  type Err = ReleaseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "major" => Ok(BumpKind::Major),
      "minor" => Ok(BumpKind::Minor),
      "patch" => Ok(BumpKind::Patch),
      other => Err(ReleaseError::InvalidBumpKind {
        value: other.to_string(),
      }),
    }
  }
}

impl fmt::Display for BumpKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Format a version as a release tag (`v1.2.3`)
pub fn tag_name(version: &Version) -> String {
  format!("v{}.{}.{}", version.major, version.minor, version.patch)
}

/// Parse a version tag, defaulting each malformed or missing component to 0
pub fn parse_tag_lenient(tag: &str) -> Version {
  let raw = tag.trim();
  let raw = raw.strip_prefix('v').unwrap_or(raw);
  let mut parts = raw.splitn(3, '.');

  let mut component = || -> u64 {
    parts
      .next()
      .map(|p| {
        // `3-rc1` / `3+build` keep their leading digits
        let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().unwrap_or(0)
      })
      .unwrap_or(0)
  };

  let major = component();
  let minor = component();
  let patch = component();
  Version::new(major, minor, patch)
}

/// Result of version resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
  /// Tag the bump was computed from; `None` when the repository has no version tag
  pub previous_tag: Option<String>,
  /// Version the bump was applied to (`0.0.0` for the baseline)
  pub previous: Version,
  pub bump: BumpKind,
  pub next: Version,
}

impl ResolvedVersion {
  /// Compute the next version from an optional latest tag
  pub fn from_latest_tag(latest: Option<&str>, bump: BumpKind) -> Self {
    let previous = latest.map(parse_tag_lenient).unwrap_or_else(|| Version::new(0, 0, 0));
    let next = bump.apply(&previous);
    Self {
      previous_tag: latest.map(str::to_string),
      previous,
      bump,
      next,
    }
  }

  /// Tag for the new release
  pub fn tag(&self) -> String {
    tag_name(&self.next)
  }
}

/// Resolve the next release version from tag history. Read-only.
pub fn resolve(git: &SystemGit, bump: BumpKind) -> ReleaseResult<ResolvedVersion> {
  let latest = git.latest_version_tag()?;
  let resolved = ResolvedVersion::from_latest_tag(latest.as_deref(), bump);

  tracing::info!(
    previous = %resolved.previous_tag.as_deref().unwrap_or("v0.0.0 (baseline)"),
    next = %resolved.tag(),
    bump = %bump,
    "resolved release version"
  );

  Ok(resolved)
}
