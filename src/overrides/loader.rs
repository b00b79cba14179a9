use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use super::{ManualOverrideTable, OverrideEntry, PatternOverride, PatternTarget};
use crate::archive::ArchiveKind;
use crate::error::OverrideError;
use crate::license::{LicenseCatalog, Notice, Provider, NO_MANUAL_INFORMATION};

/// One row of the override table, whatever the document format.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRow {
    pub kind: ArchiveKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub pattern_target: Option<PatternTarget>,
    /// `|`-separated license identifiers.
    #[serde(default)]
    pub licenses: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverridesFile {
    overrides: Vec<OverrideRow>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Builds a [`ManualOverrideTable`], resolving identifiers against the
/// catalog, notices and providers loaded before it.
pub struct OverrideLoader<'a> {
    catalog: &'a LicenseCatalog,
    notices: &'a HashMap<String, Arc<Notice>>,
    providers: &'a HashMap<String, Arc<Provider>>,
}

impl<'a> OverrideLoader<'a> {
    pub fn new(
        catalog: &'a LicenseCatalog,
        notices: &'a HashMap<String, Arc<Notice>>,
        providers: &'a HashMap<String, Arc<Provider>>,
    ) -> Self {
        Self {
            catalog,
            notices,
            providers,
        }
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ManualOverrideTable, OverrideError> {
        let path = path.as_ref();
        trace!(path = %path.display(), "loading override table");

        let content = fs::read_to_string(path)
            .map_err(|e| OverrideError::table_read_error(path, e.to_string()))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let rows = parse_rows(path, &content, extension)?;

        let table = self.build_table(rows);
        debug!(count = table.len(), "loaded manual overrides");
        Ok(table)
    }

    pub fn build_table(&self, rows: Vec<OverrideRow>) -> ManualOverrideTable {
        let mut table = ManualOverrideTable::new();
        for (index, row) in rows.into_iter().enumerate() {
            let entry = self.to_entry(&row);

            if let Some(pattern) = non_blank(&row.pattern) {
                let target = row.pattern_target.unwrap_or_default();
                match PatternOverride::new(row.kind, pattern, target, entry) {
                    Ok(pattern) => table.add_pattern(pattern),
                    Err(e) => error!(row = index + 1, pattern = %pattern, error = %e, "invalid override pattern, row skipped"),
                }
                continue;
            }

            let Some(name) = non_blank(&row.name) else {
                warn!(row = index + 1, "override row has neither name nor pattern, skipped");
                continue;
            };
            let version = non_blank(&row.version);
            let digest = non_blank(&row.digest);
            if version.is_none() && digest.is_none() {
                warn!(row = index + 1, name = %name, "override row needs a version or a digest, skipped");
                continue;
            }

            if let Some(version) = version {
                if table
                    .insert_by_version(row.kind, name, version, entry.clone())
                    .is_some()
                {
                    warn!(name = %name, version = %version, "duplicate override, last one wins");
                }
            }
            if let Some(digest) = digest {
                if table.insert_by_digest(row.kind, name, digest, entry).is_some() {
                    warn!(name = %name, digest = %digest, "duplicate override, last one wins");
                }
            }
        }
        table
    }

    fn to_entry(&self, row: &OverrideRow) -> OverrideEntry {
        let mut licenses = Vec::new();
        for id in non_blank(&row.licenses)
            .unwrap_or("")
            .split('|')
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            if id.eq_ignore_ascii_case(NO_MANUAL_INFORMATION) {
                licenses.push(Arc::clone(self.catalog.sentinel()));
                continue;
            }
            match self.catalog.license_by_id(id) {
                Some(license) => licenses.push(license),
                None => error!(spdx_id = %id, "override references unknown license"),
            }
        }

        let notice = non_blank(&row.notice).and_then(|id| {
            let notice = self.notices.get(id).cloned();
            if notice.is_none() {
                warn!(notice = %id, "override references unknown notice");
            }
            notice
        });
        let provider = non_blank(&row.provider).and_then(|id| {
            let provider = self.providers.get(id).cloned();
            if provider.is_none() {
                warn!(provider = %id, "override references unknown provider");
            }
            provider
        });

        OverrideEntry {
            licenses,
            documentation_url: non_blank(&row.documentation_url).map(str::to_string),
            provider,
            notice,
        }
    }
}

pub fn parse_rows(path: &Path, content: &str, format: &str) -> Result<Vec<OverrideRow>, OverrideError> {
    match format {
        "csv" => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(content.as_bytes());
            reader
                .deserialize()
                .collect::<Result<Vec<OverrideRow>, _>>()
                .map_err(|e| OverrideError::table_parse_error(path, e.to_string()))
        }
        "json" => serde_json::from_str::<OverridesFile>(content)
            .map(|file| file.overrides)
            .map_err(|e| OverrideError::table_parse_error(path, e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str::<OverridesFile>(content)
            .map(|file| file.overrides)
            .map_err(|e| OverrideError::table_parse_error(path, e.to_string())),
        _ => Err(OverrideError::unsupported_format(format)),
    }
}
