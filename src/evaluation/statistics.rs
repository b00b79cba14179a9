use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::archive::{ArchiveKind, Artifact, DetectionStatus};
use crate::license::LegalStatus;

/// Aggregate view over a set of evaluated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: usize,
    pub by_kind: BTreeMap<ArchiveKind, usize>,
    pub by_detection_status: BTreeMap<DetectionStatus, usize>,
    pub by_legal_status: BTreeMap<LegalStatus, usize>,
    pub distinct_licenses: usize,
    pub with_digest: usize,
    pub license_files: usize,
}

impl Statistics {
    pub fn collect(artifacts: &[Artifact]) -> Self {
        let mut stats = Self {
            total: artifacts.len(),
            ..Self::default()
        };
        for status in DetectionStatus::ALL {
            stats.by_detection_status.insert(status, 0);
        }
        for status in LegalStatus::ALL {
            stats.by_legal_status.insert(status, 0);
        }

        let mut licenses = BTreeSet::new();
        for artifact in artifacts {
            *stats.by_kind.entry(artifact.kind).or_default() += 1;
            if let Some(status) = artifact.detection_status {
                *stats.by_detection_status.entry(status).or_default() += 1;
            }
            if let Some(status) = artifact.legal_status {
                *stats.by_legal_status.entry(status).or_default() += 1;
            }
            if artifact.message_digest.is_some() {
                stats.with_digest += 1;
            }
            stats.license_files += artifact.license_files.len();
            licenses.extend(artifact.licenses().iter().map(|d| d.license.spdx_id.as_str()));
        }
        stats.distinct_licenses = licenses.len();
        stats
    }

    pub fn log(&self) {
        info!(
            total = self.total,
            distinct_licenses = self.distinct_licenses,
            with_digest = self.with_digest,
            license_files = self.license_files,
            "scan statistics"
        );
        for (status, count) in &self.by_detection_status {
            info!(status = %status, count = count, "detection status");
        }
        for (status, count) in &self.by_legal_status {
            info!(status = %status, count = count, "legal status");
        }
    }
}
