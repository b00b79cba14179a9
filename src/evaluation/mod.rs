//! Final per-artifact verdict: detection status and legal status, after
//! merging curated overrides into what the scan detected.

mod statistics;

pub use statistics::Statistics;

use std::sync::Arc;
use tracing::{debug, info};

use crate::archive::{Artifact, DetectionStatus};
use crate::license::combined_legal_status;
use crate::overrides::ManualOverrideTable;

/// Provenance recorded for licenses taken from the override table.
pub const OVERRIDE_PROVENANCE: &str = "manual override";

/// Where override licenses land relative to detected ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeMode {
    Overwrite,
    Add,
}

pub struct EvaluationEngine<'a> {
    overrides: &'a ManualOverrideTable,
}

impl<'a> EvaluationEngine<'a> {
    pub fn new(overrides: &'a ManualOverrideTable) -> Self {
        Self { overrides }
    }

    pub fn evaluate_all(&self, artifacts: &mut [Artifact]) {
        for artifact in artifacts.iter_mut() {
            self.evaluate(artifact);
        }
        info!(count = artifacts.len(), "artifacts evaluated");
    }

    pub fn evaluate(&self, artifact: &mut Artifact) {
        let manual = self.overrides.resolve(artifact);
        let mode = if artifact.license_count() > 0 {
            MergeMode::Overwrite
        } else {
            MergeMode::Add
        };

        let mut status = if manual.has_licenses() {
            if mode == MergeMode::Overwrite {
                debug!(artifact = %artifact.path, "override replaces detected licenses");
                artifact.clear_licenses();
            }
            for license in &manual.licenses {
                artifact.add_license(Arc::clone(license), OVERRIDE_PROVENANCE);
            }
            match mode {
                MergeMode::Overwrite => DetectionStatus::ManualSelected,
                MergeMode::Add => DetectionStatus::ManualDetected,
            }
        } else if artifact.license_count() > 1 {
            DetectionStatus::MultipleDetected
        } else {
            DetectionStatus::Detected
        };

        if artifact.contains_no_manual_information() {
            status = DetectionStatus::ManualNotDetected;
            artifact.clear_licenses();
        } else if artifact.license_count() == 0 {
            status = DetectionStatus::NotDetected;
        }

        if manual.documentation_url.is_some() {
            artifact.documentation_url = manual.documentation_url;
        }
        if manual.provider.is_some() {
            artifact.provider = manual.provider;
        }
        if manual.notice.is_some() {
            artifact.notice = manual.notice;
        }

        let legal_status = combined_legal_status(artifact.licenses().iter().map(|d| d.license.as_ref()));
        debug!(
            artifact = %artifact.path,
            detection_status = %status,
            legal_status = %legal_status,
            "artifact evaluated"
        );
        artifact.detection_status = Some(status);
        artifact.legal_status = Some(legal_status);
    }
}

/// Evaluates every artifact against `overrides` and returns the statistics.
pub fn evaluate(artifacts: &mut [Artifact], overrides: &ManualOverrideTable) -> Statistics {
    EvaluationEngine::new(overrides).evaluate_all(artifacts);
    Statistics::collect(artifacts)
}
