//! # Report Module
//!
//! Per-file outcomes of a run and the aggregate summary built from them.
//!
//! Every visited file produces one [`FileReport`] carrying a
//! [`ProcessingResult`]. The [`ProcessingSummary`] is derived from those
//! reports after the run, so no counters are kept anywhere else. Reports can
//! be written out as JSON with [`ReportGenerator`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::styles::CommentStyleId;

/// Why a file was not considered for a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum SkipReason {
  /// Symbolic links are never followed or written
  Symlink,
  /// The file name is on the exclusion list
  ExcludedName,
  /// The file name matches a wildcard exclusion
  ExcludedPattern(String),
  /// A directory on the path is excluded
  ExcludedDirectory(String),
  /// Matched an `--ignore` glob or `.headerignore`
  Ignored,
  /// Larger than the size ceiling (actual size in bytes)
  TooLarge(u64),
  /// Looks like binary content
  Binary,
  /// Could not be opened or read
  Unreadable,
  /// No comment style is known for this file type
  NoCommentStyle,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::Symlink => write!(f, "symlink"),
      SkipReason::ExcludedName => write!(f, "excluded file name"),
      SkipReason::ExcludedPattern(pattern) => write!(f, "matches excluded pattern {pattern}"),
      SkipReason::ExcludedDirectory(dir) => write!(f, "inside excluded directory {dir}"),
      SkipReason::Ignored => write!(f, "matches ignore pattern"),
      SkipReason::TooLarge(size) => write!(f, "too large ({size} bytes)"),
      SkipReason::Binary => write!(f, "binary file"),
      SkipReason::Unreadable => write!(f, "unreadable"),
      SkipReason::NoCommentStyle => write!(f, "no comment style for this file type"),
    }
  }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "kebab-case")]
pub enum ProcessingResult {
  /// Not a candidate for a header
  Skipped(SkipReason),
  /// Already carries this project's header
  AlreadyHeadered,
  /// A header was inserted
  HeaderAdded,
  /// A header is missing and would be inserted (check-only and dry-run)
  HeaderMissing,
  /// Carries a third-party license; reported as a conflict
  ForeignLicense { pattern: String },
  /// Processing failed; the file was left untouched
  Error(String),
}

impl ProcessingResult {
  /// `true` for the outcomes that make `--check` fail.
  pub const fn is_problem(&self) -> bool {
    matches!(
      self,
      ProcessingResult::HeaderMissing | ProcessingResult::ForeignLicense { .. }
    )
  }
}

/// Information about a processed file for reporting
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
  /// Path relative to the run root
  #[serde(serialize_with = "serialize_path")]
  pub path: PathBuf,
  /// Comment style chosen for the file, if it was classified
  #[serde(skip_serializing_if = "Option::is_none")]
  pub style: Option<CommentStyleId>,
  /// What happened to the file
  pub result: ProcessingResult,
}

impl FileReport {
  pub const fn new(path: PathBuf, style: Option<CommentStyleId>, result: ProcessingResult) -> Self {
    Self { path, style, result }
  }

  pub const fn skipped(path: PathBuf, reason: SkipReason) -> Self {
    Self::new(path, None, ProcessingResult::Skipped(reason))
  }
}

fn serialize_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
  S: serde::Serializer,
{
  serializer.serialize_str(&path.to_string_lossy().replace('\\', "/"))
}

/// Summary of the processing results
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingSummary {
  /// Every file visited by the walk
  pub processed: usize,
  /// Files that received a header
  pub modified: usize,
  /// Files skipped, already headered or carrying a foreign license
  pub skipped: usize,
  /// Files whose processing failed
  pub errors: usize,
  /// Files that need a header but were not modified
  pub missing: usize,
  /// Files already carrying this project's header
  pub already_headered: usize,
  /// Files reported as carrying a third-party license
  pub foreign: usize,
  /// Files that needed a header, by comment style
  pub by_style: BTreeMap<CommentStyleId, usize>,
  /// Total processing time
  #[serde(skip_serializing)]
  pub processing_time: Duration,
  /// Processing time in seconds for serialization
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
}

impl ProcessingSummary {
  /// Create a ProcessingSummary from a collection of FileReports
  pub fn from_reports(files: &[FileReport], processing_time: Duration) -> Self {
    let mut summary = Self {
      processed: files.len(),
      processing_time,
      processing_time_secs: processing_time.as_secs_f64(),
      ..Self::default()
    };

    for file in files {
      match &file.result {
        ProcessingResult::Skipped(_) => summary.skipped += 1,
        ProcessingResult::AlreadyHeadered => {
          summary.skipped += 1;
          summary.already_headered += 1;
        }
        ProcessingResult::ForeignLicense { .. } => {
          summary.skipped += 1;
          summary.foreign += 1;
        }
        ProcessingResult::HeaderAdded => summary.modified += 1,
        ProcessingResult::HeaderMissing => summary.missing += 1,
        ProcessingResult::Error(_) => summary.errors += 1,
      }

      if matches!(
        file.result,
        ProcessingResult::HeaderAdded | ProcessingResult::HeaderMissing
      ) && let Some(style) = file.style
      {
        *summary.by_style.entry(style).or_insert(0) += 1;
      }
    }

    summary
  }
}

/// Writes a JSON report of a run.
pub struct ReportGenerator<'a> {
  /// Path where the report will be saved
  output_path: &'a Path,
}

impl<'a> ReportGenerator<'a> {
  pub const fn new(output_path: &'a Path) -> Self {
    Self { output_path }
  }

  /// Writes `files` and `summary` as pretty-printed JSON.
  ///
  /// # Errors
  ///
  /// Returns an error if serialization fails or the report cannot be written.
  pub fn generate(&self, root: &Path, files: &[FileReport], summary: &ProcessingSummary) -> Result<()> {
    let content = Self::render_json(root, files, summary)?;
    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write report to {}", self.output_path.display()))
  }

  fn render_json(root: &Path, files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
    let report = JsonReport {
      generated_at: Local::now().to_rfc3339(),
      root: root.to_string_lossy().into_owned(),
      summary,
      files,
    };
    serde_json::to_string_pretty(&report).with_context(|| "Failed to serialize report")
  }
}

#[derive(Serialize)]
struct JsonReport<'a> {
  generated_at: String,
  root: String,
  summary: &'a ProcessingSummary,
  files: &'a [FileReport],
}
