//! Error types for speckit-release with contextual messages and exit codes
//!
//! Every pipeline failure is a `ReleaseError`. Failures inside a stage are
//! wrapped in [`ReleaseError::Stage`] so the user sees which stage (and which
//! agent, if any) failed alongside the underlying cause.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Exit codes for speckit-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, malformed inputs)
  User = 1,
  /// System error (git, network, I/O, timeouts)
  System = 2,
  /// Invariant violation (path rewrite conflicts)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Pipeline stage, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
  Arguments,
  Config,
  Version,
  Transpile,
  Assemble,
  Rewrite,
  Archive,
  Notes,
  Publish,
  Cleanup,
  VersionFile,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Arguments => "arguments",
      Stage::Config => "config",
      Stage::Version => "version",
      Stage::Transpile => "transpile",
      Stage::Assemble => "assemble",
      Stage::Rewrite => "rewrite",
      Stage::Archive => "archive",
      Stage::Notes => "notes",
      Stage::Publish => "publish",
      Stage::Cleanup => "cleanup",
      Stage::VersionFile => "version-file",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Main error type for speckit-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Bump kind was not one of major, minor, patch
  InvalidBumpKind { value: String },

  /// Command template lacks the two region markers
  MalformedTemplate { template: String, markers_found: usize },

  /// Shared asset directory is absent
  MissingAsset { path: PathBuf, required: bool },

  /// Archive could not be written
  ArchiveWrite { path: PathBuf, reason: String },

  /// Release host rejected or failed the publish
  Publish { tag: String, reason: String },

  /// A bounded operation ran past its deadline
  Timeout { operation: String, after: Duration },

  /// Unknown command-line switch
  UnknownArgument { argument: String },

  /// Rewriting would have double-prefixed a path
  PathRewriteConflict { file: PathBuf, folder: String },

  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// A failure attributed to a pipeline stage (and optionally an agent)
  Stage {
    stage: Stage,
    target: Option<String>,
    source: Box<ReleaseError>,
  },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Attribute this error to a stage. Already-attributed errors keep their original stage.
  pub fn in_stage(self, stage: Stage, target: Option<&str>) -> Self {
    match self {
      ReleaseError::Stage { .. } => self,
      other => ReleaseError::Stage {
        stage,
        target: target.map(str::to_string),
        source: Box::new(other),
      },
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      // Stays an I/O error so the exit code and error kind survive
      ReleaseError::Io(e) => ReleaseError::Io(io::Error::new(e.kind(), format!("{}: {}", ctx_str, e))),
      _ => self,
    }
  }

  /// The innermost error, unwrapping stage attribution
  pub fn root_cause(&self) -> &ReleaseError {
    match self {
      ReleaseError::Stage { source, .. } => source.root_cause(),
      other => other,
    }
  }

  /// Short machine-readable kind, used in `--json` summaries
  pub fn kind(&self) -> &'static str {
    match self.root_cause() {
      ReleaseError::InvalidBumpKind { .. } => "InvalidBumpKind",
      ReleaseError::MalformedTemplate { .. } => "MalformedTemplate",
      ReleaseError::MissingAsset { .. } => "MissingAsset",
      ReleaseError::ArchiveWrite { .. } => "ArchiveWriteError",
      ReleaseError::Publish { .. } => "PublishError",
      ReleaseError::Timeout { .. } => "Timeout",
      ReleaseError::UnknownArgument { .. } => "UnknownArgument",
      ReleaseError::PathRewriteConflict { .. } => "PathRewriteConflict",
      ReleaseError::Config(_) => "ConfigError",
      ReleaseError::Git(_) => "GitError",
      ReleaseError::Io(_) => "IoError",
      ReleaseError::Stage { .. } | ReleaseError::Message { .. } => "Error",
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::InvalidBumpKind { .. }
      | ReleaseError::MalformedTemplate { .. }
      | ReleaseError::MissingAsset { .. }
      | ReleaseError::UnknownArgument { .. }
      | ReleaseError::Config(_)
      | ReleaseError::Message { .. } => ExitCode::User,
      ReleaseError::ArchiveWrite { .. }
      | ReleaseError::Publish { .. }
      | ReleaseError::Timeout { .. }
      | ReleaseError::Git(_)
      | ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::PathRewriteConflict { .. } => ExitCode::Validation,
      ReleaseError::Stage { source, .. } => source.exit_code(),
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::InvalidBumpKind { .. } => Some("Use one of: major, minor, patch.".to_string()),
      ReleaseError::MalformedTemplate { .. } => Some(
        "Command templates need a metadata block opened and closed by `---` lines before the body.".to_string(),
      ),
      ReleaseError::MissingAsset { required: true, path } => Some(format!(
        "Create {} or mark it `required = false` under [[shared]] in release.toml.",
        path.display()
      )),
      ReleaseError::Publish { reason, .. } => {
        if reason.contains("auth") || reason.contains("401") || reason.contains("403") {
          Some("Check `gh auth status` and the GH_TOKEN / GITHUB_TOKEN environment.".to_string())
        } else {
          Some("Publishing is safe to re-run for the same tag; assets are re-uploaded with --clobber.".to_string())
        }
      }
      ReleaseError::Timeout { .. } => {
        Some("Raise archive_timeout_secs / publish_timeout_secs in release.toml if this is expected.".to_string())
      }
      ReleaseError::UnknownArgument { .. } => Some("Run with --help to list the accepted switches.".to_string()),
      ReleaseError::PathRewriteConflict { .. } => Some(
        "The file already contains a doubled namespace prefix. Fix the source asset before packaging.".to_string(),
      ),
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Stage { source, .. } => source.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::InvalidBumpKind { value } => {
        write!(f, "Invalid bump kind '{}'", value)
      }
      ReleaseError::MalformedTemplate { template, markers_found } => write!(
        f,
        "Malformed command template '{}': expected 2 region markers, found {}",
        template, markers_found
      ),
      ReleaseError::MissingAsset { path, required } => {
        let kind = if *required { "required" } else { "optional" };
        write!(f, "Missing {} shared asset: {}", kind, path.display())
      }
      ReleaseError::ArchiveWrite { path, reason } => {
        write!(f, "Failed to write archive {}: {}", path.display(), reason)
      }
      ReleaseError::Publish { tag, reason } => {
        write!(f, "Failed to publish release {}: {}", tag, reason)
      }
      ReleaseError::Timeout { operation, after } => {
        write!(f, "{} timed out after {}s", operation, after.as_secs())
      }
      ReleaseError::UnknownArgument { argument } => {
        write!(f, "Unknown argument: {}", argument)
      }
      ReleaseError::PathRewriteConflict { file, folder } => write!(
        f,
        "Path rewrite conflict in {}: '{}' would be double-prefixed",
        file.display(),
        folder
      ),
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Stage { stage, target, source } => match target {
        Some(target) => write!(f, "[{}] {}: {}", stage, target, source),
        None => write!(f, "[{}] {}", stage, source),
      },
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      ReleaseError::Stage { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<toml_edit::TomlError> for ReleaseError {
  fn from(err: toml_edit::TomlError) -> Self {
    ReleaseError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<std::num::ParseIntError> for ReleaseError {
  fn from(err: std::num::ParseIntError) -> Self {
    ReleaseError::message(format!("Parse error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<walkdir::Error> for ReleaseError {
  fn from(err: walkdir::Error) -> Self {
    match err.into_io_error() {
      Some(io) => ReleaseError::Io(io),
      None => ReleaseError::message("Directory walk failed (filesystem loop)"),
    }
  }
}

impl From<std::path::StripPrefixError> for ReleaseError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ReleaseError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config value is invalid
  Invalid { field: String, reason: String },

  /// Agent id is not in the agent table
  UnknownAgent { name: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::UnknownAgent { .. } => Some(format!(
        "Known agents: {}",
        crate::package::agent::known_agent_ids().join(", ")
      )),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid config value for '{}': {}", field, reason)
      }
      ConfigError::UnknownAgent { name } => {
        write!(f, "Unknown agent '{}'", name)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run from inside the spec-kit checkout or pass --root: {}",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } if stderr.contains("shallow") => {
        Some("Fetch full history (git fetch --unshallow) so tag ranges resolve.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Result type alias for speckit-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;

  /// Attribute an error result to a pipeline stage
  fn in_stage(self, stage: Stage, target: Option<&str>) -> ReleaseResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }

  fn in_stage(self, stage: Stage, target: Option<&str>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().in_stage(stage, target))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
