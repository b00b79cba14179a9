use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::error::IoError;

use super::{ArtifactReport, ScanReport};

/// Flat CSV row; one per artifact.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    kind: &'a str,
    file_name: &'a str,
    version: &'a str,
    path: &'a str,
    vendor: &'a str,
    digest: &'a str,
    detection_status: &'a str,
    legal_status: &'a str,
    licenses: String,
    license_files: String,
    documentation_url: &'a str,
    provider: &'a str,
    notice: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(artifact: &'a ArtifactReport) -> Self {
        Self {
            kind: artifact.kind.as_str(),
            file_name: &artifact.file_name,
            version: &artifact.version,
            path: &artifact.path,
            vendor: artifact.vendor.as_deref().unwrap_or(""),
            digest: artifact.digest.as_deref().unwrap_or(""),
            detection_status: artifact.detection_status.map(|s| s.as_str()).unwrap_or(""),
            legal_status: artifact.legal_status.map(|s| s.as_str()).unwrap_or(""),
            licenses: artifact.license_ids(),
            license_files: artifact.license_files.join("|"),
            documentation_url: artifact.documentation_url.as_deref().unwrap_or(""),
            provider: artifact.provider.as_ref().map(|p| p.id.as_str()).unwrap_or(""),
            notice: artifact.notice.as_deref().unwrap_or(""),
        }
    }
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format(report: &ScanReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Csv => Self::format_csv(report),
            OutputFormat::Txt => Ok(Self::format_txt(report)),
        }
    }

    /// Writes a rendered report to `path`, replacing any existing file.
    pub fn write_to(path: &Path, output: &str) -> std::result::Result<(), IoError> {
        fs::write(path, output).map_err(|e| IoError::write_error(path, e))
    }

    fn format_csv(report: &ScanReport) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for artifact in &report.artifacts {
            writer
                .serialize(CsvRow::new(artifact))
                .with_context(|| format!("Failed to write CSV row for {}", artifact.path))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }

    fn format_txt(report: &ScanReport) -> String {
        let rows: Vec<[String; 5]> = report
            .artifacts
            .iter()
            .map(|a| {
                [
                    a.path.clone(),
                    a.version.clone(),
                    a.detection_status.map(|s| s.to_string()).unwrap_or_default(),
                    a.legal_status.map(|s| s.to_string()).unwrap_or_default(),
                    a.license_ids(),
                ]
            })
            .collect();
        let header = ["PATH", "VERSION", "DETECTION", "LEGAL", "LICENSES"];

        let mut widths = header.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        let mut push_row = |cells: &[&str]| {
            let line = cells
                .iter()
                .zip(widths.iter())
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ");
            let _ = writeln!(out, "{}", line.trim_end());
        };
        push_row(&header);
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            push_row(&cells);
        }

        let stats = &report.statistics;
        let _ = writeln!(out);
        let _ = writeln!(out, "Artifacts: {}", stats.total);
        let _ = writeln!(out, "Distinct licenses: {}", stats.distinct_licenses);
        for (status, count) in &stats.by_detection_status {
            let _ = writeln!(out, "  {status}: {count}");
        }
        for (status, count) in &stats.by_legal_status {
            let _ = writeln!(out, "  {status}: {count}");
        }
        out
    }
}
