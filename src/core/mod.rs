//! Core engine for speckit-release
//!
//! - **config**: release.toml parsing, defaults and validation
//! - **context**: release context and immutable pipeline options
//! - **error**: error taxonomy with stage attribution, help messages and exit codes
//! - **telemetry**: tracing subscriber setup
//! - **vcs**: system git access (tags, commit subjects)

pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;
pub mod vcs;
