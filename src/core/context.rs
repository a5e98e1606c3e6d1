//! Unified release context - build once, pass everywhere
//!
//! `ReleaseContext` holds the project root, the loaded configuration and the
//! immutable `PipelineOptions` parsed from the command line. It is built once in
//! `main.rs` and handed by reference to the pipeline. No stage reads process-wide
//! flags; each receives the slice of the context it needs as an argument.

use crate::core::config::ReleaseConfig;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::package::agent::AgentTarget;
use crate::release::version::BumpKind;
use crate::utils::resolve_under;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Which pipeline stages run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Stages {
  pub package: bool,
  pub notes: bool,
  pub publish: bool,
  pub cleanup: bool,
}

impl Stages {
  /// No switch given means package + notes
  pub fn or_default(self) -> Self {
    if self.package || self.notes || self.publish || self.cleanup {
      self
    } else {
      Self {
        package: true,
        notes: true,
        ..Self::default()
      }
    }
  }

  /// Whether version resolution is needed at all (cleanup alone does not)
  pub fn needs_version(&self) -> bool {
    self.package || self.notes || self.publish
  }
}

/// Immutable run configuration from the command line
#[derive(Debug, Clone)]
pub struct PipelineOptions {
  pub bump: BumpKind,
  pub stages: Stages,
  /// Rewrite the version field of the project metadata document
  pub update_version: bool,
  /// Restrict the run to these agents (empty = config's agent list)
  pub agents: Vec<String>,
  /// Override the configured output directory
  pub output_dir: Option<PathBuf>,
  /// Print a JSON summary on stdout instead of the human report
  pub json: bool,
}

impl Default for PipelineOptions {
  fn default() -> Self {
    Self {
      bump: BumpKind::Patch,
      stages: Stages::default().or_default(),
      update_version: false,
      agents: Vec::new(),
      output_dir: None,
      json: false,
    }
  }
}

/// Everything a pipeline run needs, resolved once.
#[derive(Clone)]
pub struct ReleaseContext {
  /// Project root (absolute path)
  pub root: PathBuf,

  /// Release configuration (release.toml or defaults)
  /// Wrapped in Arc for sharing across rayon workers
  pub config: Arc<ReleaseConfig>,

  pub options: PipelineOptions,
}

impl ReleaseContext {
  /// Build the context from a project root and parsed options
  pub fn build(root: &Path, options: PipelineOptions) -> ReleaseResult<Self> {
    let config = ReleaseConfig::load(root)?;

    for agent in &options.agents {
      if !config.agents.iter().any(|a| a == agent) {
        return Err(ReleaseError::Config(ConfigError::UnknownAgent { name: agent.clone() }));
      }
    }

    Ok(Self {
      root: root.to_path_buf(),
      config: Arc::new(config),
      options,
    })
  }

  /// Agent targets selected for this run, in table order
  pub fn targets(&self) -> Vec<&'static AgentTarget> {
    self
      .config
      .agents
      .iter()
      .filter(|id| self.options.agents.is_empty() || self.options.agents.contains(id))
      .filter_map(|id| AgentTarget::find(id))
      .collect()
  }

  /// Absolute output directory
  pub fn output_dir(&self) -> PathBuf {
    let dir = self.options.output_dir.as_ref().unwrap_or(&self.config.output_dir);
    resolve_under(&self.root, dir)
  }

  pub fn archive_timeout(&self) -> Duration {
    Duration::from_secs(self.config.archive_timeout_secs)
  }

  pub fn publish_timeout(&self) -> Duration {
    Duration::from_secs(self.config.publish_timeout_secs)
  }

  /// Archive file name for an agent and version tag
  pub fn archive_name(&self, agent_id: &str, tag: &str) -> String {
    format!("{}-template-{}-{}.zip", self.config.product, agent_id, tag)
  }
}
