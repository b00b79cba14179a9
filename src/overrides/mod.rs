//! Curated per-artifact license information that takes precedence over, or
//! complements, what the scan detected.

pub mod loader;

pub use loader::OverrideLoader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::archive::{ArchiveKind, Artifact};
use crate::license::{License, Notice, Provider};

/// What a pattern override is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternTarget {
    #[default]
    #[serde(alias = "file_name", alias = "fileName")]
    Filename,
    Path,
}

/// One curated record.
#[derive(Debug, Clone, Default)]
pub struct OverrideEntry {
    pub licenses: Vec<Arc<License>>,
    pub documentation_url: Option<String>,
    pub provider: Option<Arc<Provider>>,
    pub notice: Option<Arc<Notice>>,
}

#[derive(Debug, Clone)]
pub struct PatternOverride {
    pub kind: ArchiveKind,
    pub target: PatternTarget,
    pattern: Regex,
    source: String,
    pub entry: OverrideEntry,
}

impl PatternOverride {
    /// Compiles `pattern` so that it must match the whole target string.
    pub fn new(
        kind: ArchiveKind,
        pattern: &str,
        target: PatternTarget,
        entry: OverrideEntry,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            target,
            pattern: Regex::new(&format!("^(?:{pattern})$"))?,
            source: pattern.to_string(),
            entry,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, artifact: &Artifact) -> bool {
        if self.kind != artifact.kind {
            return false;
        }
        let subject = match self.target {
            PatternTarget::Filename => artifact.file_name.as_str(),
            PatternTarget::Path => artifact.path.as_str(),
        };
        self.pattern.is_match(subject)
    }
}

/// Accumulated outcome of an override lookup.
#[derive(Debug, Clone, Default)]
pub struct OverrideResult {
    pub licenses: Vec<Arc<License>>,
    pub documentation_url: Option<String>,
    pub provider: Option<Arc<Provider>>,
    pub notice: Option<Arc<Notice>>,
}

impl OverrideResult {
    fn apply(&mut self, entry: &OverrideEntry) {
        self.licenses.extend(entry.licenses.iter().cloned());
        if entry.documentation_url.is_some() {
            self.documentation_url = entry.documentation_url.clone();
        }
        if entry.provider.is_some() {
            self.provider = entry.provider.clone();
        }
        if entry.notice.is_some() {
            self.notice = entry.notice.clone();
        }
    }

    pub fn has_licenses(&self) -> bool {
        !self.licenses.is_empty()
    }

    pub fn contains_no_manual_information(&self) -> bool {
        self.licenses.iter().any(|l| l.is_no_manual_information())
    }
}

type ExactKey = (ArchiveKind, String, String);

#[derive(Debug, Default)]
pub struct ManualOverrideTable {
    by_version: HashMap<ExactKey, OverrideEntry>,
    by_digest: HashMap<ExactKey, OverrideEntry>,
    patterns: Vec<PatternOverride>,
}

impl ManualOverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_by_version(
        &mut self,
        kind: ArchiveKind,
        name: impl Into<String>,
        version: impl Into<String>,
        entry: OverrideEntry,
    ) -> Option<OverrideEntry> {
        self.by_version
            .insert((kind, name.into(), version.into()), entry)
    }

    /// `digest` is the hex form; case is ignored.
    pub fn insert_by_digest(
        &mut self,
        kind: ArchiveKind,
        name: impl Into<String>,
        digest: &str,
        entry: OverrideEntry,
    ) -> Option<OverrideEntry> {
        self.by_digest
            .insert((kind, name.into(), digest.trim().to_lowercase()), entry)
    }

    pub fn add_pattern(&mut self, pattern: PatternOverride) {
        self.patterns.push(pattern);
    }

    pub fn patterns(&self) -> &[PatternOverride] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.by_version.len() + self.by_digest.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Version and digest lookups both apply. Patterns are consulted only when
    /// neither produced a license.
    pub fn resolve(&self, artifact: &Artifact) -> OverrideResult {
        let mut result = OverrideResult::default();

        if artifact.has_version() {
            let key = (
                artifact.kind,
                artifact.file_name.clone(),
                artifact.version().to_string(),
            );
            if let Some(entry) = self.by_version.get(&key) {
                trace!(artifact = %artifact.path, "override matched by version");
                result.apply(entry);
            }
        }

        if let Some(digest) = artifact.digest_hex() {
            let key = (artifact.kind, artifact.file_name.clone(), digest);
            if let Some(entry) = self.by_digest.get(&key) {
                trace!(artifact = %artifact.path, "override matched by digest");
                result.apply(entry);
            }
        }

        if !result.has_licenses() {
            for pattern in self.patterns.iter().filter(|p| p.matches(artifact)) {
                trace!(artifact = %artifact.path, pattern = %pattern.pattern(), "override matched by pattern");
                result.apply(&pattern.entry);
            }
        }

        result
    }
}
