//! Progress indicators for the per-agent package pipelines
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars.
//! One bar per agent, advanced once per pipeline step. Bars are only drawn when
//! stderr is a terminal; otherwise every call is a no-op.

use linya::{Bar, Progress};
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};

/// Steps each agent pipeline reports (transpile, assemble, rewrite, archive)
pub const PACKAGE_STEPS: usize = 4;

/// Multi-bar progress for parallel operations
/// Thread-safe wrapper for concurrent progress tracking
#[derive(Clone)]
pub struct MultiProgress {
  progress: Option<Arc<Mutex<Progress>>>,
}

impl MultiProgress {
  /// Create a progress container, drawing only if stderr is a terminal
  pub fn new() -> Self {
    Self::with_enabled(std::io::stderr().is_terminal())
  }

  /// A container that never draws
  pub fn hidden() -> Self {
    Self::with_enabled(false)
  }

  fn with_enabled(enabled: bool) -> Self {
    Self {
      progress: enabled.then(|| Arc::new(Mutex::new(Progress::new()))),
    }
  }

  /// Add a new bar with a label and total
  pub fn add_bar(&self, total: usize, label: impl Into<String>) -> Option<Bar> {
    let progress = self.progress.as_ref()?;
    let mut progress = progress.lock().ok()?;
    Some(progress.bar(total, label.into()))
  }

  /// Increment a bar (thread-safe)
  pub fn inc(&self, bar: Option<&Bar>) {
    let (Some(progress), Some(bar)) = (self.progress.as_ref(), bar) else {
      return;
    };
    if let Ok(mut progress) = progress.lock() {
      progress.inc_and_draw(bar, 1);
    }
  }

  /// Fill a bar to its total, e.g. when a pipeline stops early
  pub fn finish(&self, bar: Option<&Bar>) {
    let (Some(progress), Some(bar)) = (self.progress.as_ref(), bar) else {
      return;
    };
    if let Ok(mut progress) = progress.lock() {
      progress.set_and_draw(bar, PACKAGE_STEPS);
    }
  }
}

impl Default for MultiProgress {
  fn default() -> Self {
    Self::new()
  }
}
