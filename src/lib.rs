//! License Scout
//!
//! Walks a directory tree of Java archives or NPM modules, detects the
//! licenses each artifact carries, merges curated overrides and reports a
//! detection status and legal status per artifact.
pub mod archive;
pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod evaluation;
pub mod license;
pub mod logging;
pub mod output;
pub mod overrides;
pub mod pipeline;

pub use archive::{ArchiveKind, Artifact, DetectionStatus};
pub use config::ScanConfig;
pub use error::{Error, Result};
pub use license::{LegalStatus, License, LicenseCatalog};
