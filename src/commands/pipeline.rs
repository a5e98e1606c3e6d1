//! Release pipeline command
//!
//! Stage order: version → (packages ∥ notes) → checksums → publish → cleanup.
//! Version and notes failures abort the run. A failing agent does not stop the
//! other agents; the run reports every failure and exits non-zero.

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, Stage};
use crate::core::vcs::SystemGit;
use crate::package::archive::{self, ArchiveHandle};
use crate::package::cleanup::{self, CleanupReport};
use crate::package::{self, PackageOutcome};
use crate::release::metadata;
use crate::release::notes::{self, NOTES_FILE, NotesDocument};
use crate::release::publish::{self, GhCli, PublishRequest, ReleaseHandle, ReleaseHost};
use crate::release::version::{self, ResolvedVersion};
use crate::ui::progress::{MultiProgress, PACKAGE_STEPS};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one agent in this run
#[derive(Debug, Serialize)]
pub struct TargetReport {
  pub agent: &'static str,
  pub display_name: &'static str,
  #[serde(flatten)]
  pub status: TargetStatus,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
  Built(PackageOutcome),
  Failed { stage: Option<Stage>, kind: String, error: String },
}

/// Version summary for reports
#[derive(Debug, Serialize)]
pub struct VersionSummary {
  pub previous_tag: Option<String>,
  pub tag: String,
  pub bump: String,
}

/// Everything a run produced
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
  pub version: Option<VersionSummary>,
  pub previous_version_field: Option<String>,
  pub packages: Vec<TargetReport>,
  pub checksums: Option<PathBuf>,
  pub notes: Option<PathBuf>,
  pub release: Option<ReleaseHandle>,
  pub cleanup: Option<CleanupReport>,
  #[serde(skip)]
  failures: Vec<ReleaseError>,
}

impl RunSummary {
  pub fn failed(&self) -> usize {
    self.failures.len()
  }

  fn archives(&self) -> Vec<&ArchiveHandle> {
    self
      .packages
      .iter()
      .filter_map(|p| match &p.status {
        TargetStatus::Built(outcome) => Some(&outcome.archive),
        TargetStatus::Failed { .. } => None,
      })
      .collect()
  }
}

/// Run the pipeline and print the summary (human or JSON)
pub fn run_release(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let host = GhCli::new(&ctx.root, ctx.publish_timeout());
  let mut summary = run_pipeline(ctx, &host)?;

  if ctx.options.json {
    println!("{}", serde_json::to_string_pretty(&summary)?);
  } else {
    print_summary(&summary);
  }

  if summary.failures.is_empty() {
    return Ok(());
  }
  Err(summary.failures.remove(0))
}

/// Run every requested stage. Per-agent failures are collected in the summary.
pub fn run_pipeline(ctx: &ReleaseContext, host: &dyn ReleaseHost) -> ReleaseResult<RunSummary> {
  let stages = ctx.options.stages;
  let output_dir = ctx.output_dir();
  let mut summary = RunSummary::default();

  let resolved = if stages.needs_version() {
    let git = SystemGit::open(&ctx.root).in_stage(Stage::Version, None)?;
    let resolved = version::resolve(&git, ctx.options.bump).in_stage(Stage::Version, None)?;
    Some((git, resolved))
  } else {
    None
  };

  if let Some((git, resolved)) = &resolved {
    summary.version = Some(VersionSummary {
      previous_tag: resolved.previous_tag.clone(),
      tag: resolved.tag(),
      bump: resolved.bump.to_string(),
    });

    if ctx.options.update_version {
      let path = ctx.root.join(&ctx.config.version_file);
      summary.previous_version_field =
        metadata::update_project_version(&path, &resolved.next).in_stage(Stage::VersionFile, None)?;
    }

    let tag = resolved.tag();
    let (packages, notes) = rayon::join(
      || stages.package.then(|| build_packages(ctx, &tag)),
      || stages.notes.then(|| build_notes(ctx, git, resolved)),
    );

    if let Some(packages) = packages {
      for (target, result) in packages {
        let status = match result {
          Ok(outcome) => TargetStatus::Built(outcome),
          Err(err) => {
            tracing::error!(agent = target.id, error = %err, "package failed");
            let status = TargetStatus::Failed {
              stage: stage_of(&err),
              kind: err.kind().to_string(),
              error: err.to_string(),
            };
            summary.failures.push(err);
            status
          }
        };
        summary.packages.push(TargetReport {
          agent: target.id,
          display_name: target.display_name,
          status,
        });
      }

      let archives: Vec<ArchiveHandle> = summary.archives().into_iter().cloned().collect();
      if !archives.is_empty() {
        summary.checksums = Some(archive::write_checksums(&output_dir, &archives).in_stage(Stage::Archive, None)?);
      }
    }

    if let Some(notes) = notes {
      let doc = notes?;
      summary.notes = Some(doc.write(&output_dir).in_stage(Stage::Notes, None)?);
    }

    if stages.publish {
      if !summary.failures.is_empty() {
        tracing::warn!(failed = summary.failures.len(), "skipping publish, some packages failed");
      } else {
        summary.release = Some(publish_release(ctx, host, resolved)?);
      }
    }
  }

  if stages.cleanup {
    summary.cleanup = Some(cleanup::cleanup(&output_dir).in_stage(Stage::Cleanup, None)?);
  }

  Ok(summary)
}

fn build_packages(
  ctx: &ReleaseContext,
  tag: &str,
) -> Vec<(&'static package::agent::AgentTarget, ReleaseResult<PackageOutcome>)> {
  let targets = ctx.targets();
  let progress = if ctx.options.json {
    MultiProgress::hidden()
  } else {
    MultiProgress::new()
  };
  let bars: Vec<_> = targets
    .iter()
    .map(|t| progress.add_bar(PACKAGE_STEPS, t.id))
    .collect();

  targets
    .par_iter()
    .zip(bars.par_iter())
    .map(|(target, bar)| {
      let result = package::package_target(ctx, target, tag, &progress, bar.as_ref());
      if result.is_err() {
        progress.finish(bar.as_ref());
      }
      (*target, result)
    })
    .collect()
}

fn build_notes(ctx: &ReleaseContext, git: &SystemGit, resolved: &ResolvedVersion) -> ReleaseResult<NotesDocument> {
  let log = notes::collect_subjects(git, resolved.previous_tag.as_deref(), ctx.config.notes_commit_limit)
    .in_stage(Stage::Notes, None)?;
  tracing::debug!(commits = log.subjects.len(), degraded = log.degraded, "collected commit subjects");
  let tag = resolved.tag();
  let archive_names: Vec<String> = ctx.targets().iter().map(|t| ctx.archive_name(t.id, &tag)).collect();

  Ok(notes::synthesize(
    &ctx.config.product,
    resolved,
    &log.subjects,
    &archive_names,
    notes::today(),
  ))
}

fn publish_release(ctx: &ReleaseContext, host: &dyn ReleaseHost, resolved: &ResolvedVersion) -> ReleaseResult<ReleaseHandle> {
  let output_dir = ctx.output_dir();
  let tag = resolved.tag();

  let mut assets: Vec<PathBuf> = ctx
    .targets()
    .iter()
    .map(|t| output_dir.join(ctx.archive_name(t.id, &tag)))
    .collect();
  let checksums = output_dir.join(archive::CHECKSUMS_FILE);
  if checksums.is_file() {
    assets.push(checksums);
  }

  let request = PublishRequest {
    tag: tag.clone(),
    title: format!("{} templates {}", ctx.config.product, tag),
    assets,
    notes_file: output_dir.join(NOTES_FILE),
  };
  publish::publish(host, &request).in_stage(Stage::Publish, None)
}

fn stage_of(err: &ReleaseError) -> Option<Stage> {
  match err {
    ReleaseError::Stage { stage, .. } => Some(*stage),
    _ => None,
  }
}

fn print_summary(summary: &RunSummary) {
  if let Some(version) = &summary.version {
    println!(
      "🏷️  {} → {} ({})",
      version.previous_tag.as_deref().unwrap_or("v0.0.0"),
      version.tag,
      version.bump
    );
  }
  if let Some(previous) = &summary.previous_version_field {
    println!("📝 Project version updated (was {})", previous);
  }

  if !summary.packages.is_empty() {
    println!();
    println!("📦 Packages");
    for report in &summary.packages {
      match &report.status {
        TargetStatus::Built(outcome) => {
          println!(
            "   ✅ {:<8} {} ({} files, {} commands)",
            report.agent, outcome.archive.name, outcome.archive.entries, outcome.commands
          );
          if !outcome.skipped.is_empty() {
            println!("      ⚠️  missing optional: {}", outcome.skipped.join(", "));
          }
        }
        TargetStatus::Failed { error, .. } => println!("   ❌ {:<8} {}", report.agent, error),
      }
    }
  }

  if let Some(path) = &summary.checksums {
    println!("🔐 Checksums: {}", path.display());
  }
  if let Some(path) = &summary.notes {
    println!("📰 Release notes: {}", path.display());
  }
  if let Some(release) = &summary.release {
    let verb = if release.updated { "Updated" } else { "Published" };
    match &release.url {
      Some(url) => println!("🚀 {} {} ({})", verb, release.tag, url),
      None => println!("🚀 {} {}", verb, release.tag),
    }
  }
  if let Some(cleanup) = &summary.cleanup {
    println!("🧹 Removed {} artifact(s)", cleanup.removed.len());
  }

  if summary.failed() > 0 {
    println!();
    println!("❌ {} of {} package(s) failed", summary.failed(), summary.packages.len());
  }
}
