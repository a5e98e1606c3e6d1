//! Integration tests for speckit-release
//!
//! Each test builds a throwaway git repository with spec-kit style shared
//! assets and drives the compiled binary against it.

mod helpers;
mod test_package;
mod test_pipeline;
mod test_version;
