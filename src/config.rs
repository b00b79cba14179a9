use std::path::PathBuf;
use std::time::Duration;

use crate::archive::{ArchiveKind, DigestAlgorithm};
use crate::cli::{Args, OutputFormat};

/// Validated run configuration, independent of how it was collected.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub archive_kind: ArchiveKind,
    pub catalog_path: PathBuf,
    pub notices_path: Option<PathBuf>,
    pub providers_path: Option<PathBuf>,
    pub overrides_path: Option<PathBuf>,
    pub excluded_dirs: Vec<String>,
    pub digest: DigestAlgorithm,
    pub repository_url: Option<String>,
    pub timeout: Duration,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>, archive_kind: ArchiveKind, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            archive_kind,
            catalog_path: catalog_path.into(),
            notices_path: None,
            providers_path: None,
            overrides_path: None,
            excluded_dirs: Vec::new(),
            digest: DigestAlgorithm::default(),
            repository_url: None,
            timeout: Duration::from_secs(10),
            format: OutputFormat::Json,
            output_file: None,
        }
    }
}

impl From<&Args> for ScanConfig {
    fn from(args: &Args) -> Self {
        Self {
            root: args.path.clone(),
            archive_kind: args.archive_type.kind(),
            catalog_path: args.licenses.clone(),
            notices_path: args.notices.clone(),
            providers_path: args.providers.clone(),
            overrides_path: args.overrides.clone(),
            excluded_dirs: args.exclude.clone(),
            digest: args.digest,
            repository_url: args
                .repository_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            timeout: Duration::from_secs(args.timeout_secs),
            format: args.format,
            output_file: args.output_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_args() {
        let args = Args::try_parse_from([
            "license-scout",
            "--path",
            "/srv/app",
            "--licenses",
            "licenses.json",
            "--repository-url",
            "https://repo1.maven.org/maven2/",
            "--timeout-secs",
            "3",
        ])
        .unwrap();

        let config = ScanConfig::from(&args);
        assert_eq!(config.archive_kind, ArchiveKind::Java);
        assert_eq!(config.repository_url.as_deref(), Some("https://repo1.maven.org/maven2"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.digest, DigestAlgorithm::Sha256);
    }
}
