use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::package::agent::AgentTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for speckit-release
/// Searched in order: release.toml, .release.toml, .config/release.toml
///
/// Every field has a default matching the spec-kit repository layout, so the
/// file is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
  /// Product name used in archive names (`<product>-template-<agent>-<version>.zip`)
  #[serde(default = "default_product")]
  pub product: String,

  /// Installation root that shared assets are nested under inside each package
  #[serde(default = "default_namespace")]
  pub namespace: String,

  /// Directory for package trees, archives and notes (relative to the project root)
  #[serde(default = "default_output_dir")]
  pub output_dir: PathBuf,

  /// Directory holding the source command templates
  #[serde(default = "default_templates_dir")]
  pub templates_dir: PathBuf,

  /// Shared asset directories copied into every package
  #[serde(default = "default_shared")]
  pub shared: Vec<SharedAsset>,

  /// Subpaths (relative to the namespace root) removed from every package
  #[serde(default = "default_exclude")]
  pub exclude: Vec<PathBuf>,

  /// Additional per-agent exclusions, keyed by agent id
  #[serde(default)]
  pub agent_exclude: BTreeMap<String, Vec<PathBuf>>,

  /// Agents to build (default: every agent in the table)
  #[serde(default = "default_agents")]
  pub agents: Vec<String>,

  /// Project metadata document whose version field `--update-version` rewrites
  #[serde(default = "default_version_file")]
  pub version_file: PathBuf,

  #[serde(default = "default_archive_timeout")]
  pub archive_timeout_secs: u64,

  #[serde(default = "default_publish_timeout")]
  pub publish_timeout_secs: u64,

  /// Commit count used for notes when there is no previous release
  #[serde(default = "default_notes_commit_limit")]
  pub notes_commit_limit: usize,
}

/// A shared asset directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedAsset {
  /// Path relative to the project root; its file name is the folder name inside the package
  pub path: PathBuf,

  /// Absent required assets fail the agent's assembly; absent optional ones are skipped
  #[serde(default)]
  pub required: bool,
}

impl SharedAsset {
  /// Folder name the asset is installed under, and the name the rewriter looks for
  pub fn folder_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_else(|| self.path.to_string_lossy().to_string())
  }
}

fn default_product() -> String {
  "spec-kit".to_string()
}

fn default_namespace() -> String {
  ".speckit".to_string()
}

fn default_output_dir() -> PathBuf {
  PathBuf::from(".genreleases")
}

fn default_templates_dir() -> PathBuf {
  PathBuf::from("templates/commands")
}

fn default_shared() -> Vec<SharedAsset> {
  vec![
    SharedAsset {
      path: PathBuf::from("memory"),
      required: false,
    },
    SharedAsset {
      path: PathBuf::from("scripts"),
      required: false,
    },
    SharedAsset {
      path: PathBuf::from("templates"),
      required: true,
    },
  ]
}

fn default_exclude() -> Vec<PathBuf> {
  vec![PathBuf::from("templates/commands")]
}

fn default_agents() -> Vec<String> {
  crate::package::agent::known_agent_ids()
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_version_file() -> PathBuf {
  PathBuf::from("pyproject.toml")
}

fn default_archive_timeout() -> u64 {
  120
}

fn default_publish_timeout() -> u64 {
  300
}

fn default_notes_commit_limit() -> usize {
  10
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self {
      product: default_product(),
      namespace: default_namespace(),
      output_dir: default_output_dir(),
      templates_dir: default_templates_dir(),
      shared: default_shared(),
      exclude: default_exclude(),
      agent_exclude: BTreeMap::new(),
      agents: default_agents(),
      version_file: default_version_file(),
      archive_timeout_secs: default_archive_timeout(),
      publish_timeout_secs: default_publish_timeout(),
      notes_commit_limit: default_notes_commit_limit(),
    }
  }
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, falling back to defaults when no file exists
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!(root = %path.display(), "no release.toml found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ReleaseConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded release config");
    Ok(config)
  }

  /// Validate configuration
  pub fn validate(&self) -> ReleaseResult<()> {
    if self.product.trim().is_empty() {
      return Err(invalid("product", "must not be empty"));
    }

    let namespace = self.namespace.trim_matches('/');
    if namespace.is_empty() || namespace.contains('/') || namespace == "." || namespace == ".." {
      return Err(invalid(
        "namespace",
        "must be a single directory name such as '.speckit'",
      ));
    }

    for asset in &self.shared {
      if asset.path.is_absolute() || asset.path.components().any(|c| c.as_os_str() == "..") {
        return Err(invalid(
          "shared",
          &format!("'{}' must be relative to the project root", asset.path.display()),
        ));
      }
      if asset.folder_name() == namespace {
        return Err(invalid("shared", "a shared folder cannot share the namespace name"));
      }
    }

    for agent in self.agents.iter().chain(self.agent_exclude.keys()) {
      if AgentTarget::find(agent).is_none() {
        return Err(ReleaseError::Config(ConfigError::UnknownAgent { name: agent.clone() }));
      }
    }

    if self.archive_timeout_secs == 0 {
      return Err(invalid("archive_timeout_secs", "must be greater than zero"));
    }
    if self.publish_timeout_secs == 0 {
      return Err(invalid("publish_timeout_secs", "must be greater than zero"));
    }

    Ok(())
  }

  /// Namespace without surrounding slashes
  pub fn namespace_dir(&self) -> &str {
    self.namespace.trim_matches('/')
  }

  /// Folder names the path rewriter looks for
  pub fn folder_names(&self) -> Vec<String> {
    self.shared.iter().map(SharedAsset::folder_name).collect()
  }

  /// Global exclusions plus this agent's own
  pub fn exclusions_for(&self, agent_id: &str) -> Vec<PathBuf> {
    let mut paths = self.exclude.clone();
    if let Some(extra) = self.agent_exclude.get(agent_id) {
      paths.extend(extra.iter().cloned());
    }
    paths
  }
}

fn invalid(field: &str, reason: &str) -> ReleaseError {
  ReleaseError::Config(ConfigError::Invalid {
    field: field.to_string(),
    reason: reason.to_string(),
  })
}
