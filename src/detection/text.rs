use regex::Regex;
use std::collections::HashSet;
use std::io::BufRead;
use std::sync::{Arc, OnceLock};
use tracing::trace;

use crate::license::{DetectionEntry, License, LicenseCatalog};

/// Non-blank lines a pending candidate group waits for its version number.
pub const LINE_TOLERANCE: usize = 3;

static VERSION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn version_pattern() -> &'static Regex {
    VERSION_PATTERN.get_or_init(|| {
        Regex::new(r"(?i).*((VERSION|V).*(\d\.\d)|(VERSION|V) (\d)).*")
            .expect("version pattern is a valid regex")
    })
}

/// Pulls a version number such as `2.0` or `3` out of a line.
pub fn extract_version(line: &str) -> Option<String> {
    let captures = version_pattern().captures(line)?;
    captures
        .get(3)
        .or_else(|| captures.get(5))
        .map(|m| m.as_str().to_string())
}

pub struct TextLicenseDetector<'a> {
    catalog: &'a LicenseCatalog,
}

impl<'a> TextLicenseDetector<'a> {
    pub fn new(catalog: &'a LicenseCatalog) -> Self {
        Self { catalog }
    }

    pub fn detect_text(&self, text: &str) -> Vec<Arc<License>> {
        let mut state = DetectionState::new(self.catalog.detection_entries());
        for line in text.lines() {
            state.feed_line(self.catalog, line);
        }
        state.finish()
    }

    /// Decodes lossily; license files are not always UTF-8.
    pub fn detect_bytes(&self, bytes: &[u8]) -> Vec<Arc<License>> {
        self.detect_text(&String::from_utf8_lossy(bytes))
    }

    pub fn detect_reader<R: BufRead>(&self, mut reader: R) -> std::io::Result<Vec<Arc<License>>> {
        let mut state = DetectionState::new(self.catalog.detection_entries());
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            state.feed_line(self.catalog, &String::from_utf8_lossy(&buf));
        }
        Ok(state.finish())
    }
}

/// Per-document scan state. Candidate groups are identified by their index
/// in the catalog's detection list.
struct DetectionState<'c> {
    entries: &'c [DetectionEntry],
    found: Vec<Arc<License>>,
    processed: HashSet<usize>,
    current: Option<usize>,
    elapsed: usize,
}

impl<'c> DetectionState<'c> {
    fn new(entries: &'c [DetectionEntry]) -> Self {
        Self {
            entries,
            found: Vec::new(),
            processed: HashSet::new(),
            current: None,
            elapsed: 0,
        }
    }

    fn feed_line(&mut self, catalog: &LicenseCatalog, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let upper = line.to_uppercase();

        if self.current.is_some() {
            self.elapsed += 1;
            if self.elapsed > LINE_TOLERANCE {
                self.finalize(None);
            }
        }

        if let Some(index) = catalog.find_detection(&upper) {
            if self.processed.insert(index) {
                if self.current.is_some() {
                    self.finalize(None);
                }
                trace!(needle = %self.entries[index].needle, "detection string matched");
                self.current = Some(index);
                self.elapsed = 0;
            }
        }

        if self.current.is_some() {
            if let Some(version) = extract_version(&upper) {
                self.finalize(Some(&version));
            }
        }
    }

    fn finalize(&mut self, version: Option<&str>) {
        let Some(index) = self.current.take() else {
            return;
        };
        self.elapsed = 0;

        let entries = self.entries;
        let candidates = &entries[index].candidates;
        let selected = version
            .filter(|v| !v.is_empty())
            .and_then(|v| candidates.iter().find(|l| l.matches_version(v)))
            .or_else(|| candidates.first());

        if let Some(license) = selected {
            if !self.found.iter().any(|l| l.spdx_id == license.spdx_id) {
                self.found.push(Arc::clone(license));
            }
        }
    }

    fn finish(mut self) -> Vec<Arc<License>> {
        self.finalize(None);
        self.found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::LegalStatus;

    fn catalog() -> LicenseCatalog {
        let mut catalog = LicenseCatalog::new();
        let a11 = catalog.add_license(
            License::new("Apache-1.1", "Apache License", LegalStatus::Accepted).with_version("1.1"),
        );
        let a20 = catalog.add_license(
            License::new("Apache-2.0", "Apache License", LegalStatus::Accepted)
                .with_version("2.0")
                .with_alternative_versions(vec!["2".to_string()]),
        );
        let epl = catalog.add_license(
            License::new("EPL-1.0", "Eclipse Public License", LegalStatus::Accepted)
                .with_version("1.0"),
        );
        let mit = catalog.add_license(License::new("MIT", "MIT License", LegalStatus::Accepted));
        catalog.add_detection_string("Apache License", &a11);
        catalog.add_detection_string("Apache License", &a20);
        catalog.add_detection_string("Eclipse Public License", &epl);
        catalog.add_detection_string("MIT License", &mit);
        catalog
    }

    fn ids(licenses: &[Arc<License>]) -> Vec<&str> {
        licenses.iter().map(|l| l.spdx_id.as_str()).collect()
    }

    #[test]
    fn test_extract_version_dotted() {
        assert_eq!(
            extract_version("VERSION 2.0, JANUARY 2004"),
            Some("2.0".to_string())
        );
        assert_eq!(extract_version("- V 1.0"), Some("1.0".to_string()));
    }

    #[test]
    fn test_extract_version_single_digit() {
        assert_eq!(
            extract_version("GNU GENERAL PUBLIC LICENSE VERSION 3, 29 JUNE 2007"),
            Some("3".to_string())
        );
        assert_eq!(extract_version("ALL RIGHTS RESERVED"), None);
    }

    #[test]
    fn test_version_on_next_line() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let found = detector.detect_text("Apache License\nVersion 2.0, January 2004\n");
        assert_eq!(ids(&found), vec!["Apache-2.0"]);
    }

    #[test]
    fn test_version_on_same_line() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let found = detector.detect_text("Licensed under the Apache License, Version 2.0");
        assert_eq!(ids(&found), vec!["Apache-2.0"]);
    }

    #[test]
    fn test_alternative_version_matches() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let found = detector.detect_text("apache license version 2 applies");
        assert_eq!(ids(&found), vec!["Apache-2.0"]);
    }

    #[test]
    fn test_version_too_far_away_falls_back_to_first_candidate() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let text = "Apache License\nCopyright the authors\nAll rights reserved\nSee below\nVersion 2.0\n";
        let found = detector.detect_text(text);
        assert_eq!(ids(&found), vec!["Apache-1.1"]);
    }

    #[test]
    fn test_blank_lines_do_not_count() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let found = detector.detect_text("Apache License\n\n\n   \n\nVersion 2.0\n");
        assert_eq!(ids(&found), vec!["Apache-2.0"]);
    }

    #[test]
    fn test_pending_group_finalized_at_end_of_text() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let found = detector.detect_text("Released under the MIT License");
        assert_eq!(ids(&found), vec!["MIT"]);
    }

    #[test]
    fn test_new_group_finalizes_pending_one() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let found = detector.detect_text("Apache License\nMIT License\n");
        assert_eq!(ids(&found), vec!["Apache-1.1", "MIT"]);
    }

    #[test]
    fn test_group_processed_once_per_document() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let text = "Apache License\nVersion 1.1\nApache License\nVersion 2.0\n";
        let found = detector.detect_text(text);
        assert_eq!(ids(&found), vec!["Apache-1.1"]);
    }

    #[test]
    fn test_multiple_licenses_in_one_document() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let text = "This product bundles:\nApache License\nVersion 2.0\n\nEclipse Public License - v 1.0\n";
        let found = detector.detect_text(text);
        assert_eq!(ids(&found), vec!["Apache-2.0", "EPL-1.0"]);
    }

    #[test]
    fn test_no_detection_strings() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        assert!(detector.detect_text("Version 2.0\nnothing here\n").is_empty());
    }

    #[test]
    fn test_detect_reader_matches_detect_text() {
        let catalog = catalog();
        let detector = TextLicenseDetector::new(&catalog);
        let text = "Apache License\r\nVersion 2.0\r\n";
        let from_reader = detector.detect_reader(text.as_bytes()).unwrap();
        assert_eq!(ids(&from_reader), ids(&detector.detect_text(text)));
    }
}
