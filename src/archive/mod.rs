//! Discovery of artifacts below a scan root.

mod artifact;
pub mod digest;
pub mod entry;
pub mod java;
pub mod manifest;
pub mod npm;
pub mod pom;

pub use artifact::{ArchiveKind, Artifact, DetectedLicense, DetectionStatus};
pub use digest::{DigestAlgorithm, Digester};
pub use java::JavaArchiveWalker;
pub use npm::NpmPackageWalker;
pub use pom::{ArtifactRepository, BuildMetadataResolver, MavenPomResolver};

use std::path::Path;

use crate::error::{IoError, ScanError};

pub trait ArchiveWalker: Send + Sync {
    /// Walks `root` depth-first. Every artifact precedes its nested artifacts.
    fn walk(&self, root: &Path) -> Result<Vec<Artifact>, ScanError>;

    fn kind(&self) -> ArchiveKind;
}

/// Files worth feeding to the text detector.
pub fn is_license_candidate(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".class") {
        return false;
    }
    lower.ends_with("txt")
        || lower.ends_with("html")
        || lower.ends_with("htm")
        || names_license(&lower)
        || lower.contains("notice")
}

/// Stricter test: the file name itself says it is a license.
pub fn names_license(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower.contains("license") || lower.contains("licence")
}

pub(crate) fn check_root(root: &Path) -> Result<(), ScanError> {
    if !root.exists() {
        return Err(IoError::directory_not_found(root).into());
    }
    if !root.is_dir() {
        return Err(IoError::not_a_directory(root).into());
    }
    Ok(())
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
