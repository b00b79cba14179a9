use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use super::{LegalStatus, License, LicenseCatalog, Notice, Provider};
use crate::error::CatalogError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseDefinition {
    spdx_id: String,
    name: String,
    legal_status: LegalStatus,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    alternative_versions: Vec<String>,
    #[serde(default)]
    public_url: Option<String>,
    #[serde(default)]
    secondary_urls: Vec<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    notice: Option<String>,
    #[serde(default)]
    detection_strings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    licenses: Vec<LicenseDefinition>,
    #[serde(default)]
    url_mappings: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    name_mappings: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct NoticesFile {
    notices: Vec<NoticeDefinition>,
}

#[derive(Debug, Deserialize)]
struct NoticeDefinition {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ProvidersFile {
    providers: Vec<ProviderDefinition>,
}

#[derive(Debug, Deserialize)]
struct ProviderDefinition {
    id: String,
    name: String,
    #[serde(default)]
    url: Option<String>,
}

/// Builds a [`LicenseCatalog`] from a license document, resolving notice
/// references against a previously loaded notices document.
#[derive(Debug, Default)]
pub struct CatalogLoader {
    notices: HashMap<String, Arc<Notice>>,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &HashMap<String, Arc<Notice>> {
        &self.notices
    }

    pub fn load_notices<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CatalogError> {
        let path = path.as_ref();
        trace!(path = %path.display(), "loading notices");

        let file: NoticesFile = read_document(path)?;
        for notice in file.notices {
            let id = notice.id.clone();
            if self
                .notices
                .insert(
                    id.clone(),
                    Arc::new(Notice {
                        id: notice.id,
                        text: notice.text,
                    }),
                )
                .is_some()
            {
                warn!(notice = %id, "duplicate notice identifier");
            }
        }
        debug!(count = self.notices.len(), "loaded notices");
        Ok(())
    }

    pub fn load_catalog<P: AsRef<Path>>(&self, path: P) -> Result<LicenseCatalog, CatalogError> {
        let path = path.as_ref();
        trace!(path = %path.display(), "loading license catalog");

        let file: CatalogFile = read_document(path)?;
        if file.licenses.is_empty() {
            return Err(CatalogError::EmptyCatalog {
                path: path.to_path_buf(),
            });
        }

        let catalog = self.build_catalog(file);
        debug!(count = catalog.len(), "loaded license catalog");
        Ok(catalog)
    }

    /// Parses a catalog document held in memory; `format` is `json` or `yaml`.
    pub fn parse_catalog(&self, content: &str, format: &str) -> Result<LicenseCatalog, CatalogError> {
        let file: CatalogFile = parse_document(Path::new("<memory>"), content, format)?;
        Ok(self.build_catalog(file))
    }

    fn build_catalog(&self, file: CatalogFile) -> LicenseCatalog {
        let mut catalog = LicenseCatalog::new();

        for definition in file.licenses {
            let detection_strings = definition.detection_strings.clone();
            let license = catalog.add_license(self.to_license(definition));
            for needle in &detection_strings {
                catalog.add_detection_string(needle, &license);
            }
        }

        for (url, ids) in &file.url_mappings {
            for id in ids {
                match catalog.license_by_id(id) {
                    Some(license) => catalog.add_url_mapping(url, &license),
                    None => error!(url = %url, spdx_id = %id, "URL mapping references unknown license"),
                }
            }
        }

        for (name, ids) in &file.name_mappings {
            for id in ids {
                match catalog.license_by_id(id) {
                    Some(license) => catalog.add_name_mapping(name, &license),
                    None => error!(name = %name, spdx_id = %id, "name mapping references unknown license"),
                }
            }
        }

        catalog.log_summary();
        catalog
    }

    fn to_license(&self, definition: LicenseDefinition) -> License {
        let legal_status = if definition.legal_status == LegalStatus::Conflicting {
            warn!(
                spdx_id = %definition.spdx_id,
                "license declares CONFLICTING legal status, treating it as UNKNOWN"
            );
            LegalStatus::Unknown
        } else {
            definition.legal_status
        };

        let notice = definition.notice.as_deref().and_then(|id| {
            let notice = self.notices.get(id).cloned();
            if notice.is_none() {
                warn!(spdx_id = %definition.spdx_id, notice = %id, "unknown notice reference");
            }
            notice
        });

        let mut license = License::new(definition.spdx_id, definition.name, legal_status)
            .with_version(definition.version.unwrap_or_default())
            .with_alternative_versions(definition.alternative_versions);
        license.author = definition.author;
        license.public_url = definition.public_url;
        license.secondary_urls = definition.secondary_urls;
        license.text = definition.text;
        license.notice = notice;
        license
    }
}

pub fn load_providers<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, Arc<Provider>>, CatalogError> {
    let path = path.as_ref();
    trace!(path = %path.display(), "loading providers");

    let file: ProvidersFile = read_document(path)?;
    let mut providers = HashMap::new();
    for provider in file.providers {
        let id = provider.id.clone();
        let previous = providers.insert(
            id.clone(),
            Arc::new(Provider {
                id: provider.id,
                name: provider.name,
                url: provider.url,
            }),
        );
        if previous.is_some() {
            warn!(provider = %id, "duplicate provider identifier");
        }
    }
    debug!(count = providers.len(), "loaded providers");
    Ok(providers)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = fs::read_to_string(path)
        .map_err(|e| CatalogError::catalog_file_read_error(path, e.to_string()))?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_document(path, &content, extension)
}

fn parse_document<T: DeserializeOwned>(
    path: &Path,
    content: &str,
    format: &str,
) -> Result<T, CatalogError> {
    match format {
        "json" => serde_json::from_str(content)
            .map_err(|e| CatalogError::catalog_parse_error(path, e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| CatalogError::catalog_parse_error(path, e.to_string())),
        _ => Err(CatalogError::unsupported_format(format)),
    }
}
