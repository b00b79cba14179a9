//! License resolution from Maven build descriptors.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Artifact;
use crate::license::{License, LicenseCatalog};

/// Parent POMs are followed at most this many levels up.
pub const MAX_PARENT_DEPTH: usize = 5;

static POM_PATH_PATTERN: OnceLock<Regex> = OnceLock::new();
static COMMENT_PATTERN: OnceLock<Regex> = OnceLock::new();

/// True for `META-INF/maven/<group>/<artifact>/pom.xml` style descriptors.
pub fn is_pom_descriptor(entry_name: &str) -> bool {
    POM_PATH_PATTERN
        .get_or_init(|| Regex::new(r"^META-INF/maven/.+/pom\.xml$").expect("valid pom path regex"))
        .is_match(entry_name)
}

pub trait BuildMetadataResolver: Send + Sync {
    /// Adds the licenses a build descriptor declares to `artifact`.
    /// Returns true if at least one license was added.
    fn resolve(
        &self,
        descriptor: &[u8],
        artifact: &mut Artifact,
        catalog: &LicenseCatalog,
        descriptor_path: &str,
    ) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredLicense {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PomDocument {
    pub version: Option<String>,
    pub organization: Option<String>,
    pub licenses: Vec<DeclaredLicense>,
    pub parent: Option<Coordinates>,
}

impl PomDocument {
    pub fn parse(xml: &str) -> Self {
        let xml = COMMENT_PATTERN
            .get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"))
            .replace_all(xml, "");

        let parent_block = tag_content(&xml, "parent");
        let parent = parent_block.and_then(|block| {
            Some(Coordinates {
                group_id: tag_text(block, "groupId")?,
                artifact_id: tag_text(block, "artifactId")?,
                version: tag_text(block, "version")?,
            })
        });

        // The project's own <version> is the first one outside nested blocks.
        let mut own = xml.to_string();
        for block in [
            "parent",
            "dependencies",
            "dependencyManagement",
            "build",
            "profiles",
            "reporting",
            "licenses",
            "organization",
        ] {
            own = remove_block(&own, block);
        }

        let licenses = tag_content(&xml, "licenses")
            .map(|block| {
                all_tag_contents(block, "license")
                    .into_iter()
                    .map(|license| DeclaredLicense {
                        name: tag_text(license, "name"),
                        url: tag_text(license, "url"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            version: tag_text(&own, "version").or_else(|| parent.as_ref().map(|p| p.version.clone())),
            organization: tag_content(&xml, "organization").and_then(|block| tag_text(block, "name")),
            licenses,
            parent,
        }
    }
}

/// Remote Maven repository used to fetch parent POMs.
#[derive(Debug)]
pub struct ArtifactRepository {
    base_url: String,
    client: reqwest::blocking::Client,
    reachable: OnceLock<bool>,
}

impl ArtifactRepository {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            reachable: OnceLock::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probes the repository once per run; the answer is cached.
    pub fn is_reachable(&self) -> bool {
        *self.reachable.get_or_init(|| match self.client.head(&self.base_url).send() {
            Ok(response) => {
                debug!(url = %self.base_url, status = %response.status(), "artifact repository reachable");
                true
            }
            Err(e) => {
                warn!(
                    url = %self.base_url,
                    error = %e,
                    "artifact repository unreachable, parent POM lookup disabled for this run"
                );
                false
            }
        })
    }

    pub fn pom_url(&self, coordinates: &Coordinates) -> String {
        format!(
            "{}/{}/{}/{}/{}-{}.pom",
            self.base_url,
            coordinates.group_id.replace('.', "/"),
            coordinates.artifact_id,
            coordinates.version,
            coordinates.artifact_id,
            coordinates.version
        )
    }

    pub fn fetch_pom(&self, coordinates: &Coordinates) -> Result<String, reqwest::Error> {
        self.client
            .get(self.pom_url(coordinates))
            .send()?
            .error_for_status()?
            .text()
    }
}

/// Reads `<licenses>` from a POM and, when nothing resolves, walks up the
/// parent chain through an optional [`ArtifactRepository`].
#[derive(Debug, Default)]
pub struct MavenPomResolver {
    repository: Option<ArtifactRepository>,
}

impl MavenPomResolver {
    pub fn new(repository: Option<ArtifactRepository>) -> Self {
        Self { repository }
    }

    pub fn offline() -> Self {
        Self { repository: None }
    }

    fn resolve_document(
        &self,
        pom: PomDocument,
        artifact: &mut Artifact,
        catalog: &LicenseCatalog,
        descriptor_path: &str,
        depth: usize,
    ) -> bool {
        if !artifact.has_version() {
            if let Some(version) = &pom.version {
                artifact.set_version(version);
            }
        }
        if artifact.vendor.is_none() {
            artifact.vendor = pom.organization.clone();
        }

        let mut added = false;
        for declared in &pom.licenses {
            let resolved = resolve_declared_license(catalog, declared);
            if resolved.is_empty() {
                debug!(
                    artifact = %artifact.path,
                    name = ?declared.name,
                    url = ?declared.url,
                    "POM license not in catalog"
                );
            }
            for license in resolved {
                artifact.add_license(license, descriptor_path);
                added = true;
            }
        }
        if added {
            return true;
        }

        let Some(parent) = pom.parent else {
            return false;
        };
        let Some(repository) = &self.repository else {
            return false;
        };
        if depth >= MAX_PARENT_DEPTH {
            warn!(artifact = %artifact.path, "parent POM chain too deep, giving up");
            return false;
        }
        if !repository.is_reachable() {
            return false;
        }

        let url = repository.pom_url(&parent);
        match repository.fetch_pom(&parent) {
            Ok(xml) => {
                info!(artifact = %artifact.path, url = %url, "resolving licenses from parent POM");
                self.resolve_document(PomDocument::parse(&xml), artifact, catalog, &url, depth + 1)
            }
            Err(e) => {
                warn!(artifact = %artifact.path, url = %url, error = %e, "failed to fetch parent POM");
                false
            }
        }
    }
}

impl BuildMetadataResolver for MavenPomResolver {
    fn resolve(
        &self,
        descriptor: &[u8],
        artifact: &mut Artifact,
        catalog: &LicenseCatalog,
        descriptor_path: &str,
    ) -> bool {
        let pom = PomDocument::parse(&String::from_utf8_lossy(descriptor));
        self.resolve_document(pom, artifact, catalog, descriptor_path, 0)
    }
}

fn resolve_declared_license(catalog: &LicenseCatalog, declared: &DeclaredLicense) -> Vec<Arc<License>> {
    if let Some(url) = &declared.url {
        let by_url = catalog.licenses_by_url(url);
        if !by_url.is_empty() {
            return by_url;
        }
    }
    declared
        .name
        .as_deref()
        .map(|name| catalog.resolve_declared(name))
        .unwrap_or_default()
}

/// Byte offsets of an opening tag: where `<` sits and where its content starts.
struct OpenTag {
    start: usize,
    content_start: usize,
    self_closing: bool,
}

/// Finds `<tag>`, `<tag attr="...">` or `<tag/>`, skipping longer names like `<tags>`.
fn find_open_tag(xml: &str, tag: &str) -> Option<OpenTag> {
    let prefix = format!("<{tag}");
    let mut from = 0;
    while let Some(found) = xml[from..].find(&prefix) {
        let start = from + found;
        let after = start + prefix.len();
        match xml[after..].chars().next() {
            Some('>') => {
                return Some(OpenTag {
                    start,
                    content_start: after + 1,
                    self_closing: false,
                })
            }
            Some(c) if c == '/' || c.is_whitespace() => {
                let gt = after + xml[after..].find('>')?;
                return Some(OpenTag {
                    start,
                    content_start: gt + 1,
                    self_closing: xml[..gt].ends_with('/'),
                });
            }
            _ => from = after,
        }
    }
    None
}

/// Content of the first `tag` element and the offset just past its end.
fn element<'x>(xml: &'x str, tag: &str) -> Option<(usize, &'x str, usize)> {
    let open = find_open_tag(xml, tag)?;
    if open.self_closing {
        return Some((open.start, "", open.content_start));
    }
    let close = format!("</{tag}>");
    let end = open.content_start + xml[open.content_start..].find(&close)?;
    Some((open.start, &xml[open.content_start..end], end + close.len()))
}

fn tag_content<'x>(xml: &'x str, tag: &str) -> Option<&'x str> {
    element(xml, tag).map(|(_, content, _)| content)
}

fn all_tag_contents<'x>(xml: &'x str, tag: &str) -> Vec<&'x str> {
    let mut contents = Vec::new();
    let mut rest = xml;
    while let Some((_, content, next)) = element(rest, tag) {
        contents.push(content);
        rest = &rest[next..];
    }
    contents
}

fn tag_text(xml: &str, tag: &str) -> Option<String> {
    let text = unescape(tag_content(xml, tag)?.trim());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn remove_block(xml: &str, tag: &str) -> String {
    let mut result = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(open) = find_open_tag(rest, tag) {
        result.push_str(&rest[..open.start]);
        match element(rest, tag) {
            Some((_, _, next)) => rest = &rest[next..],
            None => {
                rest = "";
                break;
            }
        }
    }
    result.push_str(rest);
    result
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
