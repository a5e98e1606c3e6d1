//! CLI commands for speckit-release
//!
//! - **pipeline**: version → packages + notes → publish → cleanup, driven by
//!   the stage switches in `PipelineOptions`
//!
//! Commands accept `&ReleaseContext` so configuration is loaded once.

pub mod pipeline;

pub use pipeline::run_release;
