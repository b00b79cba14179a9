use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::license::{LegalStatus, License, Notice, Provider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// Java archive: packaged jar/war/ear or an unpacked archive directory.
    Java,
    /// NPM package directory.
    Npm,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Java => "java",
            ArchiveKind::Npm => "npm",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStatus {
    Detected,
    MultipleDetected,
    NotDetected,
    ManualDetected,
    ManualSelected,
    ManualNotDetected,
}

impl DetectionStatus {
    pub const ALL: [DetectionStatus; 6] = [
        DetectionStatus::Detected,
        DetectionStatus::MultipleDetected,
        DetectionStatus::NotDetected,
        DetectionStatus::ManualDetected,
        DetectionStatus::ManualSelected,
        DetectionStatus::ManualNotDetected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStatus::Detected => "DETECTED",
            DetectionStatus::MultipleDetected => "MULTIPLE_DETECTED",
            DetectionStatus::NotDetected => "NOT_DETECTED",
            DetectionStatus::ManualDetected => "MANUAL_DETECTED",
            DetectionStatus::ManualSelected => "MANUAL_SELECTED",
            DetectionStatus::ManualNotDetected => "MANUAL_NOT_DETECTED",
        }
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A license attached to an artifact together with every path that produced it.
#[derive(Debug, Clone)]
pub struct DetectedLicense {
    pub license: Arc<License>,
    pub file_paths: Vec<String>,
}

/// One component found during a scan.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArchiveKind,
    pub file_name: String,
    version: String,
    /// Location within the scan root; `!` marks a step into an archive payload.
    pub path: String,
    pub vendor: Option<String>,
    pub message_digest: Option<Vec<u8>>,
    pub license_files: Vec<String>,
    licenses: Vec<DetectedLicense>,
    pub documentation_url: Option<String>,
    pub provider: Option<Arc<Provider>>,
    pub notice: Option<Arc<Notice>>,
    pub detection_status: Option<DetectionStatus>,
    pub legal_status: Option<LegalStatus>,
}

impl Artifact {
    pub fn new(kind: ArchiveKind, file_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
            version: String::new(),
            path: path.into(),
            vendor: None,
            message_digest: None,
            license_files: Vec::new(),
            licenses: Vec::new(),
            documentation_url: None,
            provider: None,
            notice: None,
            detection_status: None,
            legal_status: None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl AsRef<str>) {
        self.version = version.as_ref().trim().to_string();
    }

    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }

    pub fn digest_hex(&self) -> Option<String> {
        self.message_digest.as_ref().map(hex::encode)
    }

    pub fn add_license_file(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.license_files.contains(&path) {
            self.license_files.push(path);
        }
    }

    /// Adds a license; a license already present only gains `file_path` as provenance.
    pub fn add_license(&mut self, license: Arc<License>, file_path: impl Into<String>) {
        let file_path = file_path.into();
        match self
            .licenses
            .iter_mut()
            .find(|d| d.license.spdx_id == license.spdx_id)
        {
            Some(existing) => {
                if !existing.file_paths.contains(&file_path) {
                    existing.file_paths.push(file_path);
                }
            }
            None => self.licenses.push(DetectedLicense {
                license,
                file_paths: vec![file_path],
            }),
        }
    }

    pub fn remove_license(&mut self, spdx_id: &str) -> Option<DetectedLicense> {
        let index = self
            .licenses
            .iter()
            .position(|d| d.license.spdx_id == spdx_id)?;
        Some(self.licenses.remove(index))
    }

    pub fn clear_licenses(&mut self) {
        self.licenses.clear();
    }

    pub fn licenses(&self) -> &[DetectedLicense] {
        &self.licenses
    }

    pub fn license_count(&self) -> usize {
        self.licenses.len()
    }

    pub fn has_license(&self, spdx_id: &str) -> bool {
        self.licenses.iter().any(|d| d.license.spdx_id == spdx_id)
    }

    pub fn contains_no_manual_information(&self) -> bool {
        self.licenses
            .iter()
            .any(|d| d.license.is_no_manual_information())
    }

    pub fn is_evaluated(&self) -> bool {
        self.detection_status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mit() -> Arc<License> {
        Arc::new(License::new("MIT", "MIT License", LegalStatus::Accepted))
    }

    #[test]
    fn test_new_artifact_has_empty_version() {
        let artifact = Artifact::new(ArchiveKind::Java, "a.jar", "libs/a.jar");
        assert_eq!(artifact.version(), "");
        assert!(!artifact.has_version());
        assert!(artifact.digest_hex().is_none());
        assert!(!artifact.is_evaluated());
    }

    #[test]
    fn test_add_same_license_merges_provenance() {
        let mut artifact = Artifact::new(ArchiveKind::Java, "a.jar", "libs/a.jar");
        artifact.add_license(mit(), "libs/a.jar!/META-INF/LICENSE");
        artifact.add_license(mit(), "libs/a.jar!/README.txt");
        artifact.add_license(mit(), "libs/a.jar!/README.txt");

        assert_eq!(artifact.license_count(), 1);
        assert_eq!(artifact.licenses()[0].file_paths.len(), 2);
    }

    #[test]
    fn test_remove_license() {
        let mut artifact = Artifact::new(ArchiveKind::Npm, "left-pad", "node_modules/left-pad");
        artifact.add_license(mit(), "package.json");
        assert!(artifact.remove_license("MIT").is_some());
        assert!(artifact.remove_license("MIT").is_none());
        assert_eq!(artifact.license_count(), 0);
    }

    #[test]
    fn test_digest_hex() {
        let mut artifact = Artifact::new(ArchiveKind::Java, "a.jar", "a.jar");
        artifact.message_digest = Some(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(artifact.digest_hex().as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(DetectionStatus::ManualNotDetected.as_str(), "MANUAL_NOT_DETECTED");
        assert_eq!(ArchiveKind::Npm.to_string(), "npm");
    }
}
