//! NPM module traversal. Every directory holding a `package.json` is a module.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{check_root, is_license_candidate, names_license, ArchiveKind, ArchiveWalker, Artifact};
use crate::detection::TextLicenseDetector;
use crate::error::{IoError, ScanError};
use crate::license::{LegalStatus, License, LicenseCatalog};

pub const PACKAGE_DESCRIPTOR: &str = "package.json";

const MIT_ID: &str = "MIT";

/// The fields of `package.json` the scanner cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub declared_licenses: Vec<String>,
}

impl PackageDescriptor {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(content)?;
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mut declared_licenses = Vec::new();
        if let Some(license) = value.get("license") {
            declared_licenses.extend(license_type(license));
        }
        if let Some(Value::Array(licenses)) = value.get("licenses") {
            declared_licenses.extend(licenses.iter().filter_map(license_type));
        }

        Ok(Self {
            name: text("name"),
            version: text("version"),
            author: value.get("author").and_then(author_name),
            declared_licenses,
        })
    }
}

/// `"MIT"` or the legacy `{ "type": "MIT", "url": ... }` form.
fn license_type(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("type").and_then(Value::as_str)?,
        _ => return None,
    };
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// `"Jane Doe <jane@example.com> (https://example.com)"` or `{ "name": ... }`.
fn author_name(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.split(['<', '(']).next().unwrap_or(""),
        Value::Object(map) => map.get("name").and_then(Value::as_str)?,
        _ => return None,
    };
    let name = raw.trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub struct NpmPackageWalker<'a> {
    catalog: &'a LicenseCatalog,
    excluded_dirs: Vec<String>,
}

impl<'a> NpmPackageWalker<'a> {
    pub fn new(catalog: &'a LicenseCatalog, excluded_dirs: Vec<String>) -> Self {
        Self {
            catalog,
            excluded_dirs,
        }
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|excluded| excluded == name)
    }

    fn scan_module(&self, dir: &Path, path: &str) -> Result<Artifact, ScanError> {
        let descriptor_path = dir.join(PACKAGE_DESCRIPTOR);
        let content = fs::read_to_string(&descriptor_path)
            .map_err(|e| IoError::read_error(&descriptor_path, e))?;
        let descriptor = PackageDescriptor::parse(&content).unwrap_or_else(|e| {
            warn!(path = %descriptor_path.display(), error = %e, "malformed package.json");
            PackageDescriptor::default()
        });

        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());
        let name = descriptor.name.clone().unwrap_or(dir_name);
        let mut artifact = Artifact::new(ArchiveKind::Npm, &name, path);
        if let Some(version) = &descriptor.version {
            artifact.set_version(version);
        }
        artifact.vendor = descriptor.author.clone();

        let descriptor_symbolic = module_file_path(path, PACKAGE_DESCRIPTOR);
        for declared in &descriptor.declared_licenses {
            let resolved = self.catalog.resolve_declared(declared);
            if resolved.is_empty() {
                debug!(module = %name, declared = %declared, "declared license not in catalog");
            }
            for license in resolved {
                artifact.add_license(license, &descriptor_symbolic);
            }
        }
        let declared_resolved = artifact.license_count() > 0;

        let mut files = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
            .map_err(|e| IoError::read_error(dir, e))?;
        files.sort_by_key(|entry| entry.file_name());

        let mut license_text: Option<(String, String)> = None;
        for file in files {
            let file_path = file.path();
            if !file_path.is_file() {
                continue;
            }
            let file_name = file.file_name().to_string_lossy().to_string();
            let symbolic = module_file_path(path, &file_name);

            if license_text.is_none() && names_license(&file_name) {
                let bytes = fs::read(&file_path).map_err(|e| IoError::read_error(&file_path, e))?;
                artifact.add_license_file(&symbolic);
                license_text = Some((symbolic.clone(), String::from_utf8_lossy(&bytes).into_owned()));
            }

            if !declared_resolved && is_license_candidate(&file_name) {
                let bytes = fs::read(&file_path).map_err(|e| IoError::read_error(&file_path, e))?;
                artifact.add_license_file(&symbolic);
                for license in TextLicenseDetector::new(self.catalog).detect_bytes(&bytes) {
                    artifact.add_license(license, &symbolic);
                }
            }
        }

        if let Some((text_path, text)) = license_text {
            attach_license_text(&mut artifact, &text_path, text);
        }
        Ok(artifact)
    }
}

/// Replaces a catalog MIT entry with the module's own MIT text, or records
/// the text as an unknown license when nothing else was found.
fn attach_license_text(artifact: &mut Artifact, text_path: &str, text: String) {
    let variant_id = format!("{}-{}", artifact.file_name, artifact.version());

    if let Some(mit) = artifact.remove_license(MIT_ID) {
        let variant = Arc::new(
            License::new(&variant_id, &variant_id, LegalStatus::Accepted).with_text(text),
        );
        for path in mit.file_paths {
            artifact.add_license(Arc::clone(&variant), path);
        }
    } else if artifact.license_count() == 0 {
        let unknown = License::new(&variant_id, &variant_id, LegalStatus::Unknown).with_text(text);
        artifact.add_license(Arc::new(unknown), text_path);
    }
}

fn module_file_path(module_path: &str, file_name: &str) -> String {
    if module_path.is_empty() || module_path == "." {
        file_name.to_string()
    } else {
        format!("{module_path}/{file_name}")
    }
}

impl ArchiveWalker for NpmPackageWalker<'_> {
    fn walk(&self, root: &Path) -> Result<Vec<Artifact>, ScanError> {
        check_root(root)?;
        info!(root = %root.display(), "scanning npm modules");

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if self.is_excluded(&name) {
                    info!(path = %entry.path().display(), "skipping excluded directory");
                    return false;
                }
                true
            });

        let mut artifacts = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| ScanError::DirectoryScanError {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_dir() || !entry.path().join(PACKAGE_DESCRIPTOR).is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            let path = if relative.is_empty() { ".".to_string() } else { relative };
            debug!(path = %path, "found npm module");
            artifacts.push(self.scan_module(entry.path(), &path)?);
        }

        info!(count = artifacts.len(), "npm module scan finished");
        Ok(artifacts)
    }

    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Npm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn catalog() -> LicenseCatalog {
        let mut catalog = LicenseCatalog::new();
        let mit = catalog.add_license(License::new("MIT", "MIT License", LegalStatus::Accepted));
        let isc = catalog.add_license(License::new("ISC", "ISC License", LegalStatus::Accepted));
        catalog.add_license(License::new("Apache-2.0", "Apache License", LegalStatus::Accepted));
        catalog.add_detection_string("ISC License", &isc);
        catalog.add_name_mapping("The MIT License", &mit);
        catalog
    }

    fn module(dir: &Path, package_json: &str, files: &[(&str, &str)]) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(PACKAGE_DESCRIPTOR), package_json).unwrap();
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    #[test]
    fn test_parse_descriptor_forms() {
        let descriptor = PackageDescriptor::parse(
            r#"{"name": "left-pad", "version": "1.3.0", "author": "Jane Doe <jane@example.com>",
                "license": {"type": "MIT"}, "licenses": [{"type": "ISC"}, "Apache-2.0"]}"#,
        )
        .unwrap();
        assert_eq!(descriptor.name.as_deref(), Some("left-pad"));
        assert_eq!(descriptor.author.as_deref(), Some("Jane Doe"));
        assert_eq!(descriptor.declared_licenses, vec!["MIT", "ISC", "Apache-2.0"]);

        let descriptor = PackageDescriptor::parse(r#"{"author": {"name": "ACME"}}"#).unwrap();
        assert_eq!(descriptor.author.as_deref(), Some("ACME"));
        assert!(descriptor.declared_licenses.is_empty());
    }

    #[test]
    fn test_declared_license_and_mit_variant() {
        let catalog = catalog();
        let temp_dir = TempDir::new().unwrap();
        module(
            &temp_dir.path().join("node_modules").join("left-pad"),
            r#"{"name": "left-pad", "version": "1.3.0", "license": "The MIT License"}"#,
            &[("LICENSE", "Copyright (c) left-pad authors")],
        );

        let artifacts = NpmPackageWalker::new(&catalog, Vec::new())
            .walk(temp_dir.path())
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        let artifact = &artifacts[0];
        assert_eq!(artifact.kind, ArchiveKind::Npm);
        assert_eq!(artifact.path, "node_modules/left-pad");
        assert_eq!(artifact.version(), "1.3.0");
        assert!(artifact.message_digest.is_none());
        assert!(!artifact.has_license("MIT"));
        let variant = &artifact.licenses()[0];
        assert_eq!(variant.license.spdx_id, "left-pad-1.3.0");
        assert_eq!(variant.license.legal_status, LegalStatus::Accepted);
        assert_eq!(variant.license.text.as_deref(), Some("Copyright (c) left-pad authors"));
        assert_eq!(variant.file_paths, vec!["node_modules/left-pad/package.json"]);
    }

    #[test]
    fn test_unresolved_license_uses_detector() {
        let catalog = catalog();
        let temp_dir = TempDir::new().unwrap();
        module(
            temp_dir.path(),
            r#"{"name": "root-app", "version": "0.1.0", "license": "SEE LICENSE IN LICENSE.md"}"#,
            &[("LICENSE.md", "ISC License\n\nPermission to use"), ("index.js", "module.exports = 1")],
        );

        let artifacts = NpmPackageWalker::new(&catalog, Vec::new())
            .walk(temp_dir.path())
            .unwrap();

        assert_eq!(artifacts[0].path, ".");
        assert!(artifacts[0].has_license("ISC"));
        assert_eq!(artifacts[0].license_files, vec!["LICENSE.md"]);
    }

    #[test]
    fn test_unknown_license_from_text() {
        let catalog = catalog();
        let temp_dir = TempDir::new().unwrap();
        module(
            &temp_dir.path().join("mystery"),
            r#"{"name": "mystery", "version": "2.0.0"}"#,
            &[("LICENCE", "All rights reserved")],
        );

        let artifacts = NpmPackageWalker::new(&catalog, Vec::new())
            .walk(temp_dir.path())
            .unwrap();

        let detected = &artifacts[0].licenses()[0];
        assert_eq!(detected.license.spdx_id, "mystery-2.0.0");
        assert_eq!(detected.license.legal_status, LegalStatus::Unknown);
        assert_eq!(detected.file_paths, vec!["mystery/LICENCE"]);
    }

    #[test]
    fn test_excluded_directories_skipped() {
        let catalog = catalog();
        let temp_dir = TempDir::new().unwrap();
        module(&temp_dir.path().join("a"), r#"{"name": "a", "license": "MIT"}"#, &[]);
        module(&temp_dir.path().join("test").join("b"), r#"{"name": "b"}"#, &[]);

        let artifacts = NpmPackageWalker::new(&catalog, vec!["test".to_string()])
            .walk(temp_dir.path())
            .unwrap();

        let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
        assert!(artifacts[0].has_license("MIT"));
    }

    #[test]
    fn test_nested_modules_in_preorder() {
        let catalog = catalog();
        let temp_dir = TempDir::new().unwrap();
        let outer = temp_dir.path().join("outer");
        module(&outer, r#"{"name": "outer"}"#, &[]);
        module(&outer.join("node_modules").join("inner"), r#"{"name": "inner"}"#, &[]);

        let artifacts = NpmPackageWalker::new(&catalog, Vec::new())
            .walk(temp_dir.path())
            .unwrap();

        let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["outer", "outer/node_modules/inner"]);
    }
}
