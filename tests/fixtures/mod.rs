#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

pub const CATALOG: &str = r#"{
    "licenses": [
        {
            "spdxId": "Apache-2.0",
            "name": "Apache License",
            "legalStatus": "ACCEPTED",
            "version": "2.0",
            "publicUrl": "https://www.apache.org/licenses/LICENSE-2.0",
            "detectionStrings": ["Apache License"]
        },
        {
            "spdxId": "Apache-1.1",
            "name": "Apache License",
            "legalStatus": "ACCEPTED",
            "version": "1.1",
            "detectionStrings": ["Apache License"]
        },
        {
            "spdxId": "MIT",
            "name": "MIT License",
            "legalStatus": "ACCEPTED",
            "detectionStrings": ["MIT License"]
        },
        {
            "spdxId": "GPL-2.0",
            "name": "GNU General Public License",
            "legalStatus": "NOT_ACCEPTED",
            "version": "2.0",
            "detectionStrings": ["GNU General Public License"]
        }
    ],
    "nameMappings": {
        "The MIT License": ["MIT"]
    }
}"#;

pub const APACHE_TEXT: &str = "                                 Apache License\n                           Version 2.0, January 2004\n";

pub const MIT_TEXT: &str = "MIT License\n\nPermission is hereby granted, free of charge, to any person obtaining a copy\n";

pub const GPL_TEXT: &str = "GNU General Public License\nversion 2.0, June 1991\n";

/// Writes the shared catalog into `dir` and returns its path.
pub fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("licenses.json");
    fs::write(&path, CATALOG).unwrap();
    path
}

/// Builds an in-memory jar from `(entry name, content)` pairs.
pub fn build_jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
