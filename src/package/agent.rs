//! Agent target table
//!
//! Each row describes one distribution flavour. Adding an agent means adding a
//! row here; only a new `FormatKind` needs a new render arm in the transpiler.

use serde::Serialize;
use std::path::PathBuf;

/// How a command is rendered for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatKind {
  /// TOML record with `description` and `prompt`
  StructuredConfig,
  /// Markdown with a heading derived from the description
  WrappedMarkdown,
  /// Markdown body as-is
  PlainMarkdown,
}

/// One destination format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTarget {
  /// Identifier used in archive names and on the command line
  pub id: &'static str,
  /// Human-readable tool name, used in run summaries
  pub display_name: &'static str,
  pub format: FormatKind,
  /// Replaces the generic argument placeholder in command bodies
  pub placeholder: &'static str,
  /// Extension appended to the template stem
  pub extension: &'static str,
  /// Directory (relative to the package root) receiving rendered commands
  pub command_dir: &'static str,
}

/// Generic argument placeholder used by source command templates
pub const SOURCE_PLACEHOLDER: &str = "{ARGS}";

/// Every known agent, in build order
pub const AGENT_TARGETS: &[AgentTarget] = &[
  AgentTarget {
    id: "gemini",
    display_name: "Gemini CLI",
    format: FormatKind::StructuredConfig,
    placeholder: "{{args}}",
    extension: ".toml",
    command_dir: ".gemini/commands",
  },
  AgentTarget {
    id: "copilot",
    display_name: "GitHub Copilot",
    format: FormatKind::WrappedMarkdown,
    placeholder: "$ARGUMENTS",
    extension: ".prompt.md",
    command_dir: ".github/prompts",
  },
  AgentTarget {
    id: "claude",
    display_name: "Claude Code",
    format: FormatKind::PlainMarkdown,
    placeholder: "$ARGUMENTS",
    extension: ".md",
    command_dir: ".claude/commands",
  },
];

impl AgentTarget {
  /// Look up an agent by id
  pub fn find(id: &str) -> Option<&'static AgentTarget> {
    AGENT_TARGETS.iter().find(|t| t.id == id)
  }

  /// Output file name for a template stem
  pub fn file_name(&self, stem: &str) -> String {
    format!("{}{}", stem, self.extension)
  }

  /// Path of a rendered command relative to the package root
  pub fn command_path(&self, stem: &str) -> PathBuf {
    PathBuf::from(self.command_dir).join(self.file_name(stem))
  }

  /// Package tree directory name under the output directory
  pub fn package_dir_name(&self) -> String {
    format!("sdd-{}-package", self.id)
  }
}

/// Ids of every known agent
pub fn known_agent_ids() -> Vec<&'static str> {
  AGENT_TARGETS.iter().map(|t| t.id).collect()
}
