use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::error::{IoError, ScanError};

/// A file or directory seen during traversal, either on disk or inside a
/// zip payload. The walker only ever reads it through this trait.
pub trait ArchiveEntry {
    /// `/`-separated path relative to the container the entry lives in.
    fn entry_name(&self) -> &str;

    fn is_directory(&self) -> bool;

    fn read_bytes(&mut self) -> Result<Vec<u8>, ScanError>;

    fn file_name(&self) -> &str {
        let name = self.entry_name().trim_end_matches('/');
        name.rsplit('/').next().unwrap_or(name)
    }

    fn is_file(&self) -> bool {
        !self.is_directory()
    }
}

#[derive(Debug, Clone)]
pub struct FsEntry {
    path: PathBuf,
    name: String,
    is_dir: bool,
}

impl FsEntry {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArchiveEntry for FsEntry {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.is_dir
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, ScanError> {
        fs::read(&self.path).map_err(|e| IoError::read_error(&self.path, e).into())
    }
}

/// Entry of an opened zip payload. `F` is the zip crate's entry reader.
pub struct ZipEntry<F: Read> {
    name: String,
    is_dir: bool,
    reader: F,
    label: String,
}

impl<F: Read> ZipEntry<F> {
    pub fn new(name: impl Into<String>, is_dir: bool, reader: F, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir,
            reader,
            label: label.into(),
        }
    }
}

impl<F: Read> ArchiveEntry for ZipEntry<F> {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.is_dir
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, ScanError> {
        let mut bytes = Vec::new();
        self.reader
            .read_to_end(&mut bytes)
            .map_err(|e| IoError::read_error(&self.label, e))?;
        Ok(bytes)
    }
}

/// Opens a fully buffered archive payload for entry iteration.
pub fn open_container(
    bytes: Vec<u8>,
    label: &str,
) -> Result<zip::ZipArchive<Cursor<Vec<u8>>>, ScanError> {
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ScanError::archive(label, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_fs_entry_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("LICENSE.txt");
        fs::write(&path, "MIT License").unwrap();

        let mut entry = FsEntry::new(&path, "LICENSE.txt", false);
        assert!(entry.is_file());
        assert_eq!(entry.file_name(), "LICENSE.txt");
        assert_eq!(entry.read_bytes().unwrap(), b"MIT License");
    }

    #[test]
    fn test_file_name_is_last_segment() {
        let entry = ZipEntry::new("META-INF/LICENSE", false, std::io::empty(), "a.jar");
        assert_eq!(entry.file_name(), "LICENSE");
        let dir = ZipEntry::new("META-INF/", true, std::io::empty(), "a.jar");
        assert_eq!(dir.file_name(), "META-INF");
        assert!(dir.is_directory());
    }

    #[test]
    fn test_open_container_lists_entries() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("META-INF/NOTICE", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"notice").unwrap();
            writer.finish().unwrap();
        }

        let mut archive = open_container(buffer.into_inner(), "test.jar").unwrap();
        assert_eq!(archive.len(), 1);
        let file = archive.by_index(0).unwrap();
        let name = file.name().to_string();
        let is_dir = file.is_dir();
        let mut entry = ZipEntry::new(name, is_dir, file, "test.jar!/META-INF/NOTICE");
        assert_eq!(entry.read_bytes().unwrap(), b"notice");
    }

    #[test]
    fn test_open_container_rejects_garbage() {
        let err = open_container(b"not a zip".to_vec(), "broken.jar").unwrap_err();
        assert!(matches!(err, ScanError::Archive { .. }));
    }
}
