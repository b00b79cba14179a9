use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("failed to read override table '{path}': {message}")]
    TableReadError { path: PathBuf, message: String },

    #[error("failed to parse override table '{path}': {message}")]
    TableParseError { path: PathBuf, message: String },

    #[error("unsupported override table format: {format} (expected csv, json or yaml)")]
    UnsupportedFormat { format: String },
}

impl OverrideError {
    pub fn table_read_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TableReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn table_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TableParseError {
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
    fn test_unsupported_format_display() {
        let err = OverrideError::unsupported_format("xlsx");
        assert_eq!(
            err.to_string(),
            "unsupported override table format: xlsx (expected csv, json or yaml)"
        );
    }
}
