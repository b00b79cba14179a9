//! Report model and its renderings.

mod formatter;
mod report;

pub use formatter::OutputFormatter;
pub use report::{ArtifactReport, LicenseReport, ScanReport};
