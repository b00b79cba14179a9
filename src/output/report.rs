use serde::Serialize;

use crate::archive::{ArchiveKind, Artifact, DetectedLicense, DetectionStatus};
use crate::evaluation::Statistics;
use crate::license::{LegalStatus, Provider};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseReport {
    pub spdx_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub legal_status: LegalStatus,
    pub file_paths: Vec<String>,
}

impl LicenseReport {
    pub fn from_detected(detected: &DetectedLicense) -> Self {
        let license = &detected.license;
        Self {
            spdx_id: license.spdx_id.clone(),
            name: license.name.clone(),
            version: license
                .is_version_present()
                .then(|| license.version().to_string()),
            legal_status: license.legal_status,
            file_paths: detected.file_paths.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactReport {
    pub kind: ArchiveKind,
    pub file_name: String,
    pub version: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_status: Option<DetectionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_status: Option<LegalStatus>,
    pub licenses: Vec<LicenseReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub license_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl ArtifactReport {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            kind: artifact.kind,
            file_name: artifact.file_name.clone(),
            version: artifact.version().to_string(),
            path: artifact.path.clone(),
            vendor: artifact.vendor.clone(),
            digest: artifact.digest_hex(),
            detection_status: artifact.detection_status,
            legal_status: artifact.legal_status,
            licenses: artifact
                .licenses()
                .iter()
                .map(LicenseReport::from_detected)
                .collect(),
            license_files: artifact.license_files.clone(),
            documentation_url: artifact.documentation_url.clone(),
            provider: artifact.provider.as_deref().cloned(),
            notice: artifact.notice.as_ref().map(|n| n.id.clone()),
        }
    }

    /// License identifiers joined with `|`, the override table's list form.
    pub fn license_ids(&self) -> String {
        self.licenses
            .iter()
            .map(|l| l.spdx_id.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Everything a single run produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub root: String,
    pub archive_type: ArchiveKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    pub statistics: Statistics,
    pub artifacts: Vec<ArtifactReport>,
}

impl ScanReport {
    pub fn new(
        root: impl Into<String>,
        archive_type: ArchiveKind,
        artifacts: &[Artifact],
        statistics: Statistics,
    ) -> Self {
        Self {
            root: root.into(),
            archive_type,
            digest_algorithm: None,
            statistics,
            artifacts: artifacts.iter().map(ArtifactReport::from_artifact).collect(),
        }
    }

    pub fn with_digest_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.digest_algorithm = Some(algorithm.into());
        self
    }
}
