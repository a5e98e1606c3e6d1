//! Per-agent packaging
//!
//! Each selected agent runs its own pipeline:
//!
//! 1. **transpile** - render every command template for the agent
//! 2. **assemble** - build `sdd-<agent>-package/` from shared assets + commands
//! 3. **rewrite** - nest shared-folder references under the namespace
//! 4. **archive** - zip the tree
//!
//! Pipelines for different agents share nothing mutable and run in parallel.
//! Errors are attributed to the failing stage and agent.

pub mod agent;
pub mod archive;
pub mod assemble;
pub mod cleanup;
pub mod rewrite;
pub mod template;
pub mod transpile;

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseResult, ResultExt, Stage};
use crate::ui::progress::MultiProgress;
use agent::AgentTarget;
use archive::ArchiveHandle;
use assemble::AssemblyRequest;
use linya::Bar;
use rewrite::RewriteReport;
use serde::Serialize;
use std::path::PathBuf;
use template::CommandTemplate;

/// Result of one agent's pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PackageOutcome {
  pub tree: PathBuf,
  pub commands: usize,
  /// Optional shared folders that were absent
  pub skipped: Vec<String>,
  pub rewrite: RewriteReport,
  pub archive: ArchiveHandle,
}

/// Run the full pipeline for one agent
pub fn package_target(
  ctx: &ReleaseContext,
  target: &'static AgentTarget,
  tag: &str,
  progress: &MultiProgress,
  bar: Option<&Bar>,
) -> ReleaseResult<PackageOutcome> {
  let config = &ctx.config;
  let output_dir = ctx.output_dir();
  let agent = Some(target.id);

  let templates = CommandTemplate::load_dir(&ctx.root.join(&config.templates_dir)).in_stage(Stage::Transpile, agent)?;
  let commands = transpile::transpile_all(&templates, target).in_stage(Stage::Transpile, agent)?;
  tracing::debug!(agent = target.id, commands = commands.len(), "transpiled commands");
  progress.inc(bar);

  let exclusions = config.exclusions_for(target.id);
  let tree = assemble::assemble(&AssemblyRequest {
    target,
    source_root: &ctx.root,
    shared: &config.shared,
    exclusions: &exclusions,
    commands: &commands,
    namespace: config.namespace_dir(),
    output_dir: &output_dir,
  })
  .in_stage(Stage::Assemble, agent)?;
  tracing::debug!(
    agent = target.id,
    namespace = %tree.namespace,
    copied = ?tree.copied,
    skipped = ?tree.skipped,
    "assembled package tree"
  );
  progress.inc(bar);

  let rewrite = rewrite::rewrite(&tree, &config.folder_names(), config.namespace_dir()).in_stage(Stage::Rewrite, agent)?;
  progress.inc(bar);

  let archive_name = ctx.archive_name(target.id, tag);
  let archive = archive::archive(&tree, &output_dir, &archive_name, ctx.archive_timeout())
    .in_stage(Stage::Archive, agent)?;
  progress.inc(bar);

  tracing::info!(
    agent = target.id,
    archive = %archive.name,
    entries = archive.entries,
    rewritten = rewrite.files_rewritten,
    "package built"
  );

  Ok(PackageOutcome {
    tree: tree.root,
    commands: commands.len(),
    skipped: tree.skipped,
    rewrite,
    archive,
  })
}
