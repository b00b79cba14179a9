//! Heuristic license detection in free text.
//!
//! A document is read line by line. When a line contains a detection string
//! the matching candidate licenses become pending, and the next few lines are
//! searched for a version number that picks one candidate out of the group.

mod text;

pub use text::{extract_version, TextLicenseDetector, LINE_TOLERANCE};
