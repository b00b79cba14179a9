//! License definitions and the catalog that indexes them.

mod catalog;
pub mod loader;

pub use catalog::{DetectionEntry, LicenseCatalog};
pub use loader::CatalogLoader;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Identifier of the placeholder license a curator records when they know
/// that no license information exists for an artifact.
pub const NO_MANUAL_INFORMATION: &str = "no manual information";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegalStatus {
    Accepted,
    NotAccepted,
    Unknown,
    /// Only ever computed for an artifact, never carried by a single license.
    Conflicting,
}

impl LegalStatus {
    pub const ALL: [LegalStatus; 4] = [
        LegalStatus::Accepted,
        LegalStatus::NotAccepted,
        LegalStatus::Unknown,
        LegalStatus::Conflicting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LegalStatus::Accepted => "ACCEPTED",
            LegalStatus::NotAccepted => "NOT_ACCEPTED",
            LegalStatus::Unknown => "UNKNOWN",
            LegalStatus::Conflicting => "CONFLICTING",
        }
    }
}

impl fmt::Display for LegalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Catalog entry. Immutable once built; shared through `Arc`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub spdx_id: String,
    pub name: String,
    pub legal_status: LegalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternative_versions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secondary_urls: Vec<String>,
    #[serde(skip)]
    pub text: Option<String>,
    #[serde(skip)]
    pub notice: Option<Arc<Notice>>,
}

impl License {
    pub fn new(
        spdx_id: impl Into<String>,
        name: impl Into<String>,
        legal_status: LegalStatus,
    ) -> Self {
        Self {
            spdx_id: spdx_id.into(),
            name: name.into(),
            legal_status,
            author: None,
            version: None,
            alternative_versions: Vec::new(),
            public_url: None,
            secondary_urls: Vec::new(),
            text: None,
            notice: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.version = if version.trim().is_empty() {
            None
        } else {
            Some(version)
        };
        self
    }

    pub fn with_alternative_versions(mut self, versions: Vec<String>) -> Self {
        self.alternative_versions = versions;
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// The placeholder meaning "a human recorded that nothing is known".
    pub fn no_manual_information() -> Self {
        Self::new(
            NO_MANUAL_INFORMATION,
            NO_MANUAL_INFORMATION,
            LegalStatus::Unknown,
        )
    }

    pub fn is_no_manual_information(&self) -> bool {
        self.spdx_id == NO_MANUAL_INFORMATION
    }

    /// Primary version, `""` when the definition carries none.
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }

    pub fn is_version_present(&self) -> bool {
        self.version.is_some()
    }

    /// True if `version` equals the primary or any alternative version, ignoring case.
    pub fn matches_version(&self, version: &str) -> bool {
        self.version
            .iter()
            .chain(self.alternative_versions.iter())
            .any(|v| v.eq_ignore_ascii_case(version))
    }

    pub fn all_urls(&self) -> impl Iterator<Item = &String> {
        self.public_url.iter().chain(self.secondary_urls.iter())
    }
}

impl PartialEq for License {
    fn eq(&self, other: &Self) -> bool {
        self.spdx_id == other.spdx_id
    }
}

impl Eq for License {}

impl PartialOrd for License {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for License {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.version().cmp(other.version()))
            .then_with(|| self.spdx_id.cmp(&other.spdx_id))
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_version_present() {
            write!(f, "{} {}", self.name, self.version())
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Legal status of a combined license set.
///
/// Any `Unknown` member wins, then a mix of accepted and rejected licenses is
/// `Conflicting`. An empty set is `Unknown`.
pub fn combined_legal_status<'a, I>(licenses: I) -> LegalStatus
where
    I: IntoIterator<Item = &'a License>,
{
    let mut accepted = false;
    let mut not_accepted = false;
    for license in licenses {
        match license.legal_status {
            LegalStatus::Unknown | LegalStatus::Conflicting => return LegalStatus::Unknown,
            LegalStatus::Accepted => accepted = true,
            LegalStatus::NotAccepted => not_accepted = true,
        }
    }
    match (accepted, not_accepted) {
        (false, true) => LegalStatus::NotAccepted,
        (true, true) => LegalStatus::Conflicting,
        (true, false) => LegalStatus::Accepted,
        (false, false) => LegalStatus::Unknown,
    }
}
