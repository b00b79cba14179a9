use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{License, NO_MANUAL_INFORMATION};

/// One detection string and the licenses it may indicate, in load order.
#[derive(Debug, Clone)]
pub struct DetectionEntry {
    pub needle: String,
    pub candidates: Vec<Arc<License>>,
}

/// All license lookups the scanner needs, built once per run.
#[derive(Debug)]
pub struct LicenseCatalog {
    by_id: HashMap<String, Arc<License>>,
    by_url: HashMap<String, Arc<License>>,
    url_mappings: HashMap<String, Vec<Arc<License>>>,
    name_mappings: HashMap<String, Vec<Arc<License>>>,
    detection: Vec<DetectionEntry>,
    sentinel: Arc<License>,
}

impl LicenseCatalog {
    pub fn new() -> Self {
        let sentinel = Arc::new(License::no_manual_information());
        let mut by_id = HashMap::new();
        by_id.insert(NO_MANUAL_INFORMATION.to_string(), Arc::clone(&sentinel));
        Self {
            by_id,
            by_url: HashMap::new(),
            url_mappings: HashMap::new(),
            name_mappings: HashMap::new(),
            detection: Vec::new(),
            sentinel,
        }
    }

    /// Registers a license under its SPDX id and every URL it declares.
    /// Collisions are logged and the later definition wins.
    pub fn add_license(&mut self, license: License) -> Arc<License> {
        let license = Arc::new(license);
        if license.is_no_manual_information() {
            warn!("catalog entry reuses reserved identifier '{NO_MANUAL_INFORMATION}', ignoring it");
            return Arc::clone(&self.sentinel);
        }

        if let Some(previous) = self
            .by_id
            .insert(license.spdx_id.clone(), Arc::clone(&license))
        {
            warn!(spdx_id = %license.spdx_id, "duplicate license identifier in catalog");
            self.unregister(&previous);
        }

        for url in license.all_urls() {
            let key = normalize_url(url);
            if key.is_empty() {
                continue;
            }
            if let Some(previous) = self.by_url.insert(key, Arc::clone(&license)) {
                warn!(
                    url = %url,
                    previous = %previous.spdx_id,
                    current = %license.spdx_id,
                    "duplicate license URL in catalog"
                );
            }
        }
        license
    }

    /// Drops every registration that still points at a replaced definition.
    fn unregister(&mut self, previous: &Arc<License>) {
        self.by_url.retain(|_, license| !Arc::ptr_eq(license, previous));
        for licenses in self
            .url_mappings
            .values_mut()
            .chain(self.name_mappings.values_mut())
        {
            licenses.retain(|license| !Arc::ptr_eq(license, previous));
        }
        self.url_mappings.retain(|_, licenses| !licenses.is_empty());
        self.name_mappings.retain(|_, licenses| !licenses.is_empty());
        for entry in &mut self.detection {
            entry.candidates.retain(|license| !Arc::ptr_eq(license, previous));
        }
        self.detection.retain(|entry| !entry.candidates.is_empty());
    }

    pub fn add_detection_string(&mut self, needle: &str, license: &Arc<License>) {
        let needle = needle.trim().to_uppercase();
        if needle.is_empty() {
            return;
        }
        match self.detection.iter_mut().find(|e| e.needle == needle) {
            Some(entry) => entry.candidates.push(Arc::clone(license)),
            None => self.detection.push(DetectionEntry {
                needle,
                candidates: vec![Arc::clone(license)],
            }),
        }
    }

    pub fn add_url_mapping(&mut self, url: &str, license: &Arc<License>) {
        self.url_mappings
            .entry(normalize_url(url))
            .or_default()
            .push(Arc::clone(license));
    }

    pub fn add_name_mapping(&mut self, name: &str, license: &Arc<License>) {
        self.name_mappings
            .entry(normalize_name(name))
            .or_default()
            .push(Arc::clone(license));
    }

    pub fn license_by_id(&self, spdx_id: &str) -> Option<Arc<License>> {
        self.by_id.get(spdx_id.trim()).cloned()
    }

    /// Looks a URL up among the URLs the licenses declare themselves.
    pub fn license_by_public_url(&self, url: &str) -> Option<Arc<License>> {
        self.by_url.get(&normalize_url(url)).cloned()
    }

    /// Public URL index first, then the external URL mapping.
    pub fn licenses_by_url(&self, url: &str) -> Vec<Arc<License>> {
        if let Some(license) = self.license_by_public_url(url) {
            return vec![license];
        }
        self.url_mappings
            .get(&normalize_url(url))
            .cloned()
            .unwrap_or_default()
    }

    pub fn licenses_by_name(&self, name: &str) -> Vec<Arc<License>> {
        self.name_mappings
            .get(&normalize_name(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Exact identifier first, then the name mapping.
    pub fn resolve_declared(&self, declared: &str) -> Vec<Arc<License>> {
        match self.license_by_id(declared) {
            Some(license) if !license.is_no_manual_information() => vec![license],
            _ => self.licenses_by_name(declared),
        }
    }

    pub fn detection_entries(&self) -> &[DetectionEntry] {
        &self.detection
    }

    /// Index of the first detection entry contained in an uppercased line.
    pub fn find_detection(&self, upper_line: &str) -> Option<usize> {
        self.detection
            .iter()
            .position(|entry| upper_line.contains(entry.needle.as_str()))
    }

    pub fn sentinel(&self) -> &Arc<License> {
        &self.sentinel
    }

    pub fn licenses(&self) -> impl Iterator<Item = &Arc<License>> {
        self.by_id.values()
    }

    /// Number of licenses, the sentinel included.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.len() <= 1
    }

    pub fn log_summary(&self) {
        debug!(
            licenses = self.by_id.len(),
            urls = self.by_url.len(),
            url_mappings = self.url_mappings.len(),
            name_mappings = self.name_mappings.len(),
            detection_strings = self.detection.len(),
            "license catalog ready"
        );
    }
}

impl Default for LicenseCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_url(url: &str) -> String {
    let lower = url.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme.trim_end_matches('/').to_string()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}
