use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog file '{path}': {message}")]
    CatalogFileReadError { path: PathBuf, message: String },

    #[error("failed to parse catalog file '{path}': {message}")]
    CatalogParseError { path: PathBuf, message: String },

    #[error("unsupported catalog format: {format} (expected json or yaml)")]
    UnsupportedFormat { format: String },

    #[error("license catalog '{path}' defines no licenses")]
    EmptyCatalog { path: PathBuf },
}

impl CatalogError {
    pub fn catalog_file_read_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CatalogFileReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn catalog_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CatalogParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_file_read_error_display() {
        let err = CatalogError::catalog_file_read_error("/path/to/licenses.json", "file not found");
        assert_eq!(
            err.to_string(),
            "failed to read catalog file '/path/to/licenses.json': file not found"
        );
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = CatalogError::unsupported_format("xml");
        assert_eq!(
            err.to_string(),
            "unsupported catalog format: xml (expected json or yaml)"
        );
    }
}
