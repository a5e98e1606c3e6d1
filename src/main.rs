mod commands;
mod core;
mod package;
mod release;
mod ui;
mod utils;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser, ValueEnum};
use core::context::{PipelineOptions, ReleaseContext, Stages};
use core::error::{ReleaseError, ReleaseResult, ResultExt, Stage, print_error};
use release::version::BumpKind;
use std::path::PathBuf;

/// Build per-agent spec-kit template packages, release notes and GitHub releases
#[derive(Parser)]
#[command(name = "speckit-release")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Version bump applied to the latest v* tag: major, minor or patch
  #[arg(default_value = "patch")]
  bump: String,

  /// Build per-agent packages and archives
  #[arg(long)]
  package: bool,

  /// Generate release notes from commit history
  #[arg(long)]
  notes: bool,

  /// Publish archives and notes as a GitHub release (needs gh)
  #[arg(long)]
  publish: bool,

  /// Remove generated packages, archives and notes
  #[arg(long)]
  cleanup: bool,

  /// Write the resolved version into the project metadata document
  #[arg(long)]
  update_version: bool,

  /// Only build these agents (comma-separated)
  #[arg(long, value_delimiter = ',')]
  agents: Vec<String>,

  /// Output directory (default from release.toml, else .genreleases)
  #[arg(long)]
  output_dir: Option<PathBuf>,

  /// Project root (default: current directory)
  #[arg(long)]
  root: Option<PathBuf>,

  /// Print a JSON summary on stdout
  #[arg(long)]
  json: bool,

  /// Log line format on stderr
  #[arg(long, value_enum, default_value_t = LogFormat::Text)]
  log_format: LogFormat,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
  Text,
  Json,
}

impl Cli {
  fn into_options(self) -> ReleaseResult<(PathBuf, PipelineOptions)> {
    let bump: BumpKind = self.bump.parse().in_stage(Stage::Arguments, None)?;

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let root = match self.root {
      Some(root) => utils::resolve_under(&cwd, &root),
      None => cwd,
    };

    let agents = self.agents.iter().flat_map(|a| utils::split_list(a)).collect();
    let stages = Stages {
      package: self.package,
      notes: self.notes,
      publish: self.publish,
      cleanup: self.cleanup,
    }
    .or_default();

    if self.update_version && !stages.needs_version() {
      return Err(
        ReleaseError::with_help(
          "--update-version needs a resolved version, but only --cleanup was requested",
          "Add --package, --notes or --publish, or drop --update-version",
        )
        .in_stage(Stage::Arguments, None),
      );
    }

    Ok((
      root,
      PipelineOptions {
        bump,
        stages,
        update_version: self.update_version,
        agents,
        output_dir: self.output_dir,
        json: self.json,
      },
    ))
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if err.kind() == ErrorKind::UnknownArgument => handle_error(unknown_argument(&err)),
    Err(err) => err.exit(),
  };

  core::telemetry::init_tracing(
    cli.log_format == LogFormat::Json,
    core::telemetry::level_from_verbosity(cli.verbose),
  );

  let (root, options) = match cli.into_options() {
    Ok(parsed) => parsed,
    Err(err) => handle_error(err),
  };

  // Build the release context once (root, config, options)
  let ctx = match ReleaseContext::build(&root, options) {
    Ok(ctx) => ctx,
    Err(err) => handle_error(err.in_stage(Stage::Config, None)),
  };

  if let Err(err) = commands::run_release(&ctx) {
    handle_error(err);
  }
}

fn unknown_argument(err: &clap::Error) -> ReleaseError {
  let argument = match err.get(ContextKind::InvalidArg) {
    Some(ContextValue::String(arg)) => arg.clone(),
    _ => err.to_string().lines().next().unwrap_or_default().to_string(),
  };
  ReleaseError::UnknownArgument { argument }.in_stage(Stage::Arguments, None)
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
