use std::path::PathBuf;
use thiserror::Error;

use super::IoError;

/// Fatal traversal failures. A scan that hits any of these yields no artifacts.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("failed to open archive '{path}': {source}")]
    Archive {
        path: String,
        source: zip::result::ZipError,
    },

    #[error("failed to scan directory at {path}: {source}")]
    DirectoryScanError {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl ScanError {
    pub fn archive(path: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_error_display() {
        let err = ScanError::archive("libs/broken.jar", zip::result::ZipError::FileNotFound);
        assert!(err.to_string().contains("failed to open archive 'libs/broken.jar'"));
    }

    #[test]
    fn test_io_error_is_transparent() {
        let err: ScanError = IoError::directory_not_found("/scan/root").into();
        assert_eq!(err.to_string(), "directory not found: /scan/root");
    }
}
