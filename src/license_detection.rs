//! # License Detection Module
//!
//! This module contains the interfaces and implementations for license
//! detection. It allows for replacing the detection algorithm without
//! modifying the processor.
//!
//! The default [`PatternLicenseDetector`] searches the leading content of a
//! file for an ordered set of case-insensitive regular expressions. Patterns
//! are split into *project* patterns (this project's own header) and
//! *foreign* patterns (third-party licenses), so callers can decide how a
//! foreign license is treated.

use std::path::Path;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::processor::FileIO;
use crate::templates::YEAR_PLACEHOLDER;

/// Result of inspecting the leading content of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderStatus {
  /// No known license marker was found.
  Missing,
  /// This project's header is present.
  Project,
  /// A third-party license marker matched; carries the matching pattern.
  Foreign(String),
  /// The file could not be read, so presence could not be verified.
  Unreadable,
}

impl HeaderStatus {
  /// `true` unless the header is known to be missing.
  ///
  /// Unreadable files count as headered so that they are never written.
  pub const fn is_headered(&self) -> bool {
    !matches!(self, HeaderStatus::Missing)
  }
}

/// Trait for license detectors.
///
/// Implementations of this trait are responsible for determining whether a file
/// already contains a license header based on its content.
pub trait LicenseDetector: Send + Sync {
  /// Classifies the leading content of a file.
  fn detect(&self, content: &str) -> HeaderStatus;

  /// Checks if the content already has a license header of any kind.
  fn has_license(&self, content: &str) -> bool {
    self.detect(content).is_headered()
  }
}

/// Detector driven by ordered regular expressions.
#[derive(Debug, Clone)]
pub struct PatternLicenseDetector {
  project: Vec<Regex>,
  foreign: Vec<(String, Regex)>,
}

impl PatternLicenseDetector {
  /// Compiles the given patterns case-insensitively.
  ///
  /// # Errors
  ///
  /// Returns an error naming the first pattern that is not a valid regex.
  pub fn new(project_patterns: &[String], foreign_patterns: &[String]) -> Result<Self> {
    let project = project_patterns
      .iter()
      .map(|pattern| compile(pattern))
      .collect::<Result<Vec<_>>>()?;
    let foreign = foreign_patterns
      .iter()
      .map(|pattern| Ok((pattern.clone(), compile(pattern)?)))
      .collect::<Result<Vec<_>>>()?;

    debug!(
      "License detector: {} project patterns, {} foreign patterns",
      project.len(),
      foreign.len()
    );

    Ok(Self { project, foreign })
  }

  /// Reads up to `scan_bytes` from `path` and classifies them.
  ///
  /// Invalid UTF-8 is replaced rather than rejected. A file that cannot be
  /// opened or read yields [`HeaderStatus::Unreadable`].
  pub fn detect_file(&self, path: &Path, scan_bytes: usize) -> HeaderStatus {
    match FileIO::read_header_prefix(path, scan_bytes) {
      Ok(prefix) => self.detect(&prefix),
      Err(e) => {
        debug!("Treating {} as headered: {:#}", path.display(), e);
        HeaderStatus::Unreadable
      }
    }
  }

  /// Fail-safe presence check: `true` if any pattern matches within the first
  /// `scan_bytes`, or if the file cannot be read.
  pub fn has_existing_header(&self, path: &Path, scan_bytes: usize) -> bool {
    self.detect_file(path, scan_bytes).is_headered()
  }
}

impl LicenseDetector for PatternLicenseDetector {
  /// Project patterns are checked first, so a file carrying both this
  /// project's header and a third-party notice is reported as `Project`.
  fn detect(&self, content: &str) -> HeaderStatus {
    if self.project.iter().any(|regex| regex.is_match(content)) {
      return HeaderStatus::Project;
    }
    match self.foreign.iter().find(|(_, regex)| regex.is_match(content)) {
      Some((pattern, _)) => HeaderStatus::Foreign(pattern.clone()),
      None => HeaderStatus::Missing,
    }
  }
}

/// Derives a detection pattern from a template body.
///
/// The first line with an alphanumeric character is escaped literally, with
/// the `{{year}}` placeholder standing for any four digits. Returns `None` for
/// a body with no such line.
pub fn fingerprint(body: &str) -> Option<String> {
  let line = body
    .lines()
    .map(str::trim)
    .find(|line| line.replace(YEAR_PLACEHOLDER, "").chars().any(char::is_alphanumeric))?;

  let pattern = line
    .split(YEAR_PLACEHOLDER)
    .map(regex::escape)
    .collect::<Vec<_>>()
    .join(r"\d{4}");
  Some(pattern)
}

fn compile(pattern: &str) -> Result<Regex> {
  RegexBuilder::new(pattern)
    .case_insensitive(true)
    .build()
    .with_context(|| format!("Invalid license pattern: {}", pattern))
}
