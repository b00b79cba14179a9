//! Java archive traversal: packaged archives, unpacked archive directories
//! and archives nested inside either.

use std::fs;
use std::path::Path;
use tracing::{debug, info, trace, warn};

use super::entry::{open_container, ArchiveEntry, FsEntry, ZipEntry};
use super::manifest::{parse_manifest, MANIFEST_PATH};
use super::pom::{is_pom_descriptor, BuildMetadataResolver};
use super::{check_root, is_license_candidate, join_path, ArchiveKind, ArchiveWalker, Artifact, Digester};
use crate::detection::TextLicenseDetector;
use crate::error::{IoError, ScanError};
use crate::license::LicenseCatalog;

pub const ARCHIVE_EXTENSIONS: [&str; 3] = [".jar", ".war", ".ear"];

/// Directories treated as archives whatever they contain.
pub const SPECIAL_ARCHIVES: [&str; 2] = ["jre", "jdk"];

/// Version given to special archives, which carry no readable metadata.
pub const SPECIAL_ARCHIVE_VERSION: &str = "special";

const METADATA_DIR: &str = "META-INF";

pub fn is_archive_file(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    ARCHIVE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn is_special_archive(name: &str) -> bool {
    SPECIAL_ARCHIVES.contains(&name)
}

pub struct JavaArchiveWalker<'a> {
    catalog: &'a LicenseCatalog,
    digester: Digester,
    pom_resolver: &'a dyn BuildMetadataResolver,
}

impl<'a> JavaArchiveWalker<'a> {
    pub fn new(
        catalog: &'a LicenseCatalog,
        digester: Digester,
        pom_resolver: &'a dyn BuildMetadataResolver,
    ) -> Self {
        Self {
            catalog,
            digester,
            pom_resolver,
        }
    }

    fn walk_directory(
        &self,
        dir: &Path,
        path: &str,
        current: Option<usize>,
        artifacts: &mut Vec<Artifact>,
    ) -> Result<(), ScanError> {
        let mut children = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
            .map_err(|e| IoError::read_error(dir, e))?;
        children.sort_by_key(|entry| entry.file_name());

        for child in children {
            let child_path = child.path();
            let name = child.file_name().to_string_lossy().to_string();
            let symbolic = join_path(path, &name);
            let file_type = child
                .file_type()
                .map_err(|e| IoError::read_error(&child_path, e))?;

            if file_type.is_dir() {
                if is_special_archive(&name) || child_path.join(METADATA_DIR).is_dir() {
                    let mut artifact = Artifact::new(ArchiveKind::Java, &name, &symbolic);
                    if is_special_archive(&name) {
                        artifact.set_version(SPECIAL_ARCHIVE_VERSION);
                    }
                    debug!(path = %symbolic, "found unpacked archive");
                    artifacts.push(artifact);
                    let index = artifacts.len() - 1;
                    self.walk_directory(&child_path, &symbolic, Some(index), artifacts)?;
                } else {
                    self.walk_directory(&child_path, &symbolic, current, artifacts)?;
                }
            } else if file_type.is_file() {
                let mut entry = FsEntry::new(&child_path, &name, false);
                if is_archive_file(&name) {
                    let bytes = entry.read_bytes()?;
                    self.visit_packaged_archive(&name, &symbolic, bytes, artifacts)?;
                } else if let Some(index) = current {
                    let artifact = &mut artifacts[index];
                    let relative = symbolic
                        .strip_prefix(artifact.path.as_str())
                        .unwrap_or(&symbolic)
                        .trim_start_matches('/')
                        .to_string();
                    self.handle_file(&mut entry, &relative, &symbolic, artifact)?;
                }
            } else {
                trace!(path = %symbolic, "skipping special file");
            }
        }
        Ok(())
    }

    /// Records the archive held in `bytes`, then visits its entries.
    fn visit_packaged_archive(
        &self,
        file_name: &str,
        path: &str,
        bytes: Vec<u8>,
        artifacts: &mut Vec<Artifact>,
    ) -> Result<(), ScanError> {
        let mut artifact = Artifact::new(ArchiveKind::Java, file_name, path);
        artifact.message_digest = Some(self.digester.digest(&bytes));
        debug!(path = %path, size = bytes.len(), "found packaged archive");
        artifacts.push(artifact);
        let index = artifacts.len() - 1;

        let payload = format!("{path}!");
        let mut container = open_container(bytes, path)?;
        for i in 0..container.len() {
            let file = container
                .by_index(i)
                .map_err(|e| ScanError::archive(path, e))?;
            let entry_name = file.name().to_string();
            let is_dir = file.is_dir();
            let entry_path = join_path(&payload, &entry_name);
            let mut entry = ZipEntry::new(entry_name, is_dir, file, entry_path.as_str());

            if entry.is_directory() {
                continue;
            }
            if is_archive_file(entry.file_name()) {
                let nested_name = entry.file_name().to_string();
                let nested = entry.read_bytes()?;
                drop(entry);
                self.visit_packaged_archive(&nested_name, &entry_path, nested, artifacts)?;
            } else {
                let relative = entry.entry_name().to_string();
                self.handle_file(&mut entry, &relative, &entry_path, &mut artifacts[index])?;
            }
        }
        Ok(())
    }

    /// Handles a regular file of `artifact`. `relative` is the path inside
    /// the artifact, `path` the full symbolic path used as provenance.
    fn handle_file(
        &self,
        entry: &mut dyn ArchiveEntry,
        relative: &str,
        path: &str,
        artifact: &mut Artifact,
    ) -> Result<(), ScanError> {
        if relative.eq_ignore_ascii_case(MANIFEST_PATH) {
            let bytes = entry.read_bytes()?;
            self.apply_manifest(artifact, &String::from_utf8_lossy(&bytes), path);
            return Ok(());
        }

        if is_pom_descriptor(relative) {
            let bytes = entry.read_bytes()?;
            if self
                .pom_resolver
                .resolve(&bytes, artifact, self.catalog, path)
            {
                debug!(artifact = %artifact.path, pom = %path, "licenses resolved from POM");
            }
            return Ok(());
        }

        if is_license_candidate(entry.file_name()) {
            artifact.add_license_file(path);
            let bytes = entry.read_bytes()?;
            for license in TextLicenseDetector::new(self.catalog).detect_bytes(&bytes) {
                trace!(artifact = %artifact.path, file = %path, license = %license.spdx_id, "license detected in text");
                artifact.add_license(license, path);
            }
        }
        Ok(())
    }

    fn apply_manifest(&self, artifact: &mut Artifact, content: &str, path: &str) {
        let metadata = parse_manifest(content);
        if !artifact.has_version() {
            if let Some(version) = &metadata.version {
                artifact.set_version(version);
            }
        }
        if artifact.vendor.is_none() {
            artifact.vendor = metadata.vendor.clone();
        }
        if metadata.license_urls.is_empty() {
            return;
        }

        let mut resolved = 0;
        for url in &metadata.license_urls {
            for license in self.catalog.licenses_by_url(url) {
                artifact.add_license(license, path);
                resolved += 1;
            }
        }
        if resolved == 0 {
            warn!(
                artifact = %artifact.path,
                urls = ?metadata.license_urls,
                "manifest license URLs not found in catalog"
            );
        }
    }
}

impl ArchiveWalker for JavaArchiveWalker<'_> {
    fn walk(&self, root: &Path) -> Result<Vec<Artifact>, ScanError> {
        check_root(root)?;
        info!(root = %root.display(), "scanning java archives");

        let mut artifacts = Vec::new();
        self.walk_directory(root, "", None, &mut artifacts)?;

        info!(count = artifacts.len(), "java archive scan finished");
        Ok(artifacts)
    }

    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Java
    }
}
