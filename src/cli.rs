use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveKind, DigestAlgorithm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Txt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ArchiveType {
    Java,
    Npm,
}

#[derive(Parser, Debug)]
#[command(name = "license-scout")]
#[command(about = "License scanner for Java archives and NPM modules", long_about = None)]
pub struct Args {
    /// Root directory to scan
    #[arg(long, value_name = "PATH")]
    pub path: PathBuf,

    /// Kind of artifacts to look for
    #[arg(short = 'a', long, default_value = "java")]
    pub archive_type: ArchiveType,

    /// License catalog (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub licenses: PathBuf,

    /// License notices (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub notices: Option<PathBuf>,

    /// Providers referenced by the override table (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub providers: Option<PathBuf>,

    /// Manual override table (CSV, JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub overrides: Option<PathBuf>,

    /// Directory names skipped during NPM traversal. Can be specified multiple times.
    #[arg(long, value_name = "DIR")]
    pub exclude: Vec<String>,

    /// Message digest computed over packaged archives
    #[arg(long, default_value = "sha256")]
    pub digest: DigestAlgorithm,

    /// Maven repository used to fetch parent POMs
    #[arg(long, value_name = "URL")]
    pub repository_url: Option<String>,

    /// Timeout for repository requests, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Output format (json, csv, txt)
    #[arg(short = 'f', long, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'O', long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        validate_root(&self.path)?;
        validate_file("License catalog", &self.licenses)?;
        for (label, file) in [
            ("Notices file", &self.notices),
            ("Providers file", &self.providers),
            ("Override table", &self.overrides),
        ] {
            if let Some(file) = file {
                validate_file(label, file)?;
            }
        }
        if let Some(url) = &self.repository_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("Repository URL must use http or https: {url}");
            }
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("Timeout must be at least one second");
        }
        Ok(())
    }
}

pub fn validate_root(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", path.display());
    }
    std::fs::read_dir(path).with_context(|| format!("Cannot read directory: {}", path.display()))?;
    Ok(())
}

fn validate_file(label: &str, path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("{label} does not exist: {}", path.display());
    }
    Ok(())
}

impl ArchiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Java => "java",
            ArchiveType::Npm => "npm",
        }
    }

    pub fn kind(&self) -> ArchiveKind {
        match self {
            ArchiveType::Java => ArchiveKind::Java,
            ArchiveType::Npm => ArchiveKind::Npm,
        }
    }
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Txt => "txt",
        }
    }
}
