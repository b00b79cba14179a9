//! `META-INF/MANIFEST.MF` reading.

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestMetadata {
    pub version: Option<String>,
    pub vendor: Option<String>,
    pub license_urls: Vec<String>,
}

/// Main-section attributes in order, continuation lines joined.
pub fn parse_attributes(content: &str) -> Vec<(String, String)> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    for line in content.lines() {
        // The main section ends at the first blank line.
        if line.trim().is_empty() {
            if attributes.is_empty() {
                continue;
            }
            break;
        }
        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = attributes.last_mut() {
                value.push_str(continuation.trim_end_matches('\r'));
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            attributes.push((
                key.trim().to_string(),
                value.trim_end_matches('\r').trim_start().to_string(),
            ));
        }
    }
    attributes
}

pub fn parse_manifest(content: &str) -> ManifestMetadata {
    let attributes = parse_attributes(content);
    let get = |name: &str| {
        attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    ManifestMetadata {
        version: get("Bundle-Version").or_else(|| get("Implementation-Version")),
        vendor: get("Bundle-Vendor").or_else(|| get("Implementation-Vendor")),
        license_urls: get("Bundle-License")
            .map(|value| split_license_header(&value))
            .unwrap_or_default(),
    }
}

fn split_license_header(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|clause| {
            let url = clause
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .trim_matches('"');
            if url.is_empty() || url == "<<EXTERNAL>>" {
                None
            } else {
                Some(url.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_headers_preferred() {
        let manifest = "Manifest-Version: 1.0\r\n\
                        Implementation-Version: 0.9\r\n\
                        Bundle-Version: 1.2.3\r\n\
                        Bundle-Vendor: The Apache Software Foundation\r\n\
                        Bundle-License: http://www.apache.org/licenses/LICENSE-2.0.txt\r\n";
        let metadata = parse_manifest(manifest);
        assert_eq!(metadata.version.as_deref(), Some("1.2.3"));
        assert_eq!(
            metadata.vendor.as_deref(),
            Some("The Apache Software Foundation")
        );
        assert_eq!(
            metadata.license_urls,
            vec!["http://www.apache.org/licenses/LICENSE-2.0.txt"]
        );
    }

    #[test]
    fn test_implementation_fallback() {
        let metadata =
            parse_manifest("Implementation-Version: 4.1\nImplementation-Vendor: Example Corp\n");
        assert_eq!(metadata.version.as_deref(), Some("4.1"));
        assert_eq!(metadata.vendor.as_deref(), Some("Example Corp"));
        assert!(metadata.license_urls.is_empty());
    }

    #[test]
    fn test_continuation_lines_are_joined() {
        let manifest = "Bundle-License: http://www.eclipse.org/legal/epl-v1\n 0.html, https://opensource\n .org/licenses/MIT;description=MIT\n";
        let metadata = parse_manifest(manifest);
        assert_eq!(
            metadata.license_urls,
            vec![
                "http://www.eclipse.org/legal/epl-v10.html",
                "https://opensource.org/licenses/MIT"
            ]
        );
    }

    #[test]
    fn test_external_marker_ignored() {
        let metadata = parse_manifest("Bundle-License: <<EXTERNAL>>\n");
        assert!(metadata.license_urls.is_empty());
    }

    #[test]
    fn test_only_main_section_read() {
        let manifest = "Manifest-Version: 1.0\n\nName: org/example/\nImplementation-Version: 9.9\n";
        assert_eq!(parse_manifest(manifest).version, None);
    }
}
