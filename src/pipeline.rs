//! One complete run: load the reference data, walk the tree, evaluate.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::archive::{
    ArchiveKind, ArchiveWalker, Artifact, ArtifactRepository, Digester, JavaArchiveWalker,
    MavenPomResolver, NpmPackageWalker,
};
use crate::config::ScanConfig;
use crate::error::Result;
use crate::evaluation;
use crate::license::{loader::load_providers, CatalogLoader, LicenseCatalog, Notice, Provider};
use crate::output::ScanReport;
use crate::overrides::{ManualOverrideTable, OverrideLoader};

/// Reference data loaded before traversal starts.
pub struct ScanInputs {
    pub catalog: LicenseCatalog,
    pub notices: HashMap<String, Arc<Notice>>,
    pub providers: HashMap<String, Arc<Provider>>,
    pub overrides: ManualOverrideTable,
}

impl ScanInputs {
    pub fn load(config: &ScanConfig) -> Result<Self> {
        let mut loader = CatalogLoader::new();
        if let Some(path) = &config.notices_path {
            loader.load_notices(path)?;
        }
        let catalog = loader.load_catalog(&config.catalog_path)?;

        let providers = match &config.providers_path {
            Some(path) => load_providers(path)?,
            None => HashMap::new(),
        };
        let notices = loader.notices().clone();

        let overrides = match &config.overrides_path {
            Some(path) => OverrideLoader::new(&catalog, &notices, &providers).load(path)?,
            None => ManualOverrideTable::new(),
        };

        Ok(Self {
            catalog,
            notices,
            providers,
            overrides,
        })
    }
}

fn pom_resolver(config: &ScanConfig) -> MavenPomResolver {
    let Some(url) = &config.repository_url else {
        return MavenPomResolver::offline();
    };
    match ArtifactRepository::new(url.as_str(), config.timeout) {
        Ok(repository) => MavenPomResolver::new(Some(repository)),
        Err(e) => {
            warn!(url = %url, error = %e, "cannot create repository client, parent POMs disabled");
            MavenPomResolver::offline()
        }
    }
}

/// Walks `config.root` with the walker for the configured kind.
pub fn scan(config: &ScanConfig, catalog: &LicenseCatalog) -> Result<Vec<Artifact>> {
    let artifacts = match config.archive_kind {
        ArchiveKind::Java => {
            let resolver = pom_resolver(config);
            JavaArchiveWalker::new(catalog, Digester::new(config.digest), &resolver).walk(&config.root)?
        }
        ArchiveKind::Npm => {
            NpmPackageWalker::new(catalog, config.excluded_dirs.clone()).walk(&config.root)?
        }
    };
    Ok(artifacts)
}

pub fn run(config: &ScanConfig) -> Result<ScanReport> {
    let inputs = ScanInputs::load(config)?;
    let mut artifacts = scan(config, &inputs.catalog)?;
    let statistics = evaluation::evaluate(&mut artifacts, &inputs.overrides);
    statistics.log();
    info!(root = %config.root.display(), artifacts = artifacts.len(), "scan complete");

    let report = ScanReport::new(
        config.root.display().to_string(),
        config.archive_kind,
        &artifacts,
        statistics,
    );
    Ok(match config.archive_kind {
        ArchiveKind::Java => report.with_digest_algorithm(config.digest.as_str()),
        ArchiveKind::Npm => report,
    })
}
