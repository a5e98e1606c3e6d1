//! GitHub release publishing via the gh CLI
//!
//! Publishing goes through the [`ReleaseHost`] trait so the pipeline can be
//! exercised without network access. [`GhCli`] is the production host.
//!
//! Re-running a publish for a tag that already has a release is idempotent:
//! assets are re-uploaded with `--clobber` and the notes are replaced.

use crate::core::error::{ReleaseError, ReleaseResult};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What to publish
#[derive(Debug, Clone)]
pub struct PublishRequest {
  pub tag: String,
  pub title: String,
  pub assets: Vec<PathBuf>,
  pub notes_file: PathBuf,
}

/// A published release
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseHandle {
  pub tag: String,
  /// Release URL as reported by the host
  pub url: Option<String>,
  pub assets: Vec<String>,
  /// The release already existed and was updated in place
  pub updated: bool,
}

/// A release hosting backend
pub trait ReleaseHost {
  /// Whether a release for `tag` already exists
  fn release_exists(&self, tag: &str) -> ReleaseResult<bool>;

  /// Create a new release with assets and notes. Returns the release URL if known.
  fn create(&self, request: &PublishRequest) -> ReleaseResult<Option<String>>;

  /// Replace assets and notes of an existing release
  fn update(&self, request: &PublishRequest) -> ReleaseResult<Option<String>>;
}

/// Publish a release. No automatic retry.
pub fn publish(host: &dyn ReleaseHost, request: &PublishRequest) -> ReleaseResult<ReleaseHandle> {
  for asset in request.assets.iter().chain(std::iter::once(&request.notes_file)) {
    if !asset.is_file() {
      return Err(ReleaseError::MissingAsset {
        path: asset.clone(),
        required: true,
      });
    }
  }

  let updated = host.release_exists(&request.tag)?;
  let url = if updated {
    tracing::info!(tag = %request.tag, "release exists, updating assets and notes");
    host.update(request)?
  } else {
    tracing::info!(tag = %request.tag, assets = request.assets.len(), "creating release");
    host.create(request)?
  };

  Ok(ReleaseHandle {
    tag: request.tag.clone(),
    url,
    assets: request
      .assets
      .iter()
      .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
      .collect(),
    updated,
  })
}

/// `gh` CLI release host
pub struct GhCli {
  program: PathBuf,
  work_dir: PathBuf,
  timeout: Duration,
}

impl GhCli {
  pub fn new(work_dir: &Path, timeout: Duration) -> Self {
    Self {
      program: PathBuf::from("gh"),
      work_dir: work_dir.to_path_buf(),
      timeout,
    }
  }

  /// Use a different executable
  #[cfg(test)]
  pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
    self.program = program.into();
    self
  }

  fn gh(&self, tag: &str, args: &[String]) -> ReleaseResult<Output> {
    let mut cmd = Command::new(&self.program);
    cmd.current_dir(&self.work_dir).args(args);
    tracing::debug!(program = %self.program.display(), ?args, "running gh");

    let operation = format!("gh {}", args.iter().take(2).cloned().collect::<Vec<_>>().join(" "));
    run_bounded(cmd, self.timeout, &operation).map_err(|err| match err {
      ReleaseError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ReleaseError::Publish {
        tag: tag.to_string(),
        reason: format!("'{}' not found on PATH", self.program.display()),
      },
      other => other,
    })
  }

  fn gh_checked(&self, tag: &str, args: &[String]) -> ReleaseResult<Output> {
    let output = self.gh(tag, args)?;
    if !output.status.success() {
      return Err(ReleaseError::Publish {
        tag: tag.to_string(),
        reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(output)
  }
}

impl ReleaseHost for GhCli {
  fn release_exists(&self, tag: &str) -> ReleaseResult<bool> {
    let output = self.gh(tag, &["release".into(), "view".into(), tag.into()])?;
    Ok(output.status.success())
  }

  fn create(&self, request: &PublishRequest) -> ReleaseResult<Option<String>> {
    let mut args: Vec<String> = vec!["release".into(), "create".into(), request.tag.clone()];
    args.extend(request.assets.iter().map(|p| p.display().to_string()));
    args.extend([
      "--title".into(),
      request.title.clone(),
      "--notes-file".into(),
      request.notes_file.display().to_string(),
    ]);

    let output = self.gh_checked(&request.tag, &args)?;
    Ok(first_line(&output.stdout))
  }

  fn update(&self, request: &PublishRequest) -> ReleaseResult<Option<String>> {
    let mut upload: Vec<String> = vec!["release".into(), "upload".into(), request.tag.clone()];
    upload.extend(request.assets.iter().map(|p| p.display().to_string()));
    upload.push("--clobber".into());
    self.gh_checked(&request.tag, &upload)?;

    let edit: Vec<String> = vec![
      "release".into(),
      "edit".into(),
      request.tag.clone(),
      "--title".into(),
      request.title.clone(),
      "--notes-file".into(),
      request.notes_file.display().to_string(),
    ];
    let output = self.gh_checked(&request.tag, &edit)?;
    Ok(first_line(&output.stdout))
  }
}

fn first_line(stdout: &[u8]) -> Option<String> {
  String::from_utf8_lossy(stdout)
    .lines()
    .map(str::trim)
    .find(|l| !l.is_empty())
    .map(str::to_string)
}

/// Run a command to completion, killing it if it outlives `timeout`
///
/// Output pipes are drained on helper threads so a chatty child can't block
/// on a full pipe while we poll `try_wait`.
pub fn run_bounded(mut cmd: Command, timeout: Duration, operation: &str) -> ReleaseResult<Output> {
  let mut child = cmd
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()?;

  let stdout = drain(child.stdout.take());
  let stderr = drain(child.stderr.take());

  let deadline = Instant::now() + timeout;
  let status = loop {
    if let Some(status) = child.try_wait()? {
      break status;
    }
    if Instant::now() >= deadline {
      kill_and_reap(&mut child);
      return Err(ReleaseError::Timeout {
        operation: operation.to_string(),
        after: timeout,
      });
    }
    thread::sleep(POLL_INTERVAL);
  };

  Ok(Output {
    status,
    stdout: stdout.join().unwrap_or_default(),
    stderr: stderr.join().unwrap_or_default(),
  })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
  thread::spawn(move || {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
      let _ = pipe.read_to_end(&mut buf);
    }
    buf
  })
}

fn kill_and_reap(child: &mut Child) {
  let _ = child.kill();
  let _ = child.wait();
}
