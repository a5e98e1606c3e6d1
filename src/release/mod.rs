//! Versioning, release notes and publishing
//!
//! - **version**: next semantic version from the latest `v*` tag
//! - **notes**: release notes from commit subjects
//! - **publish**: GitHub release via the gh CLI
//! - **metadata**: write the resolved version back into the project metadata document

pub mod metadata;
pub mod notes;
pub mod publish;
pub mod version;
