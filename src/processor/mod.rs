//! # Processor Module
//!
//! This module contains the core functionality for walking a tree, deciding
//! which files need a license header and inserting it.
//!
//! The module is organized into several submodules:
//! - [`file_io`] - File reading and atomic writing
//! - [`content_transformer`] - Header splicing around shebangs, XML prologues and DOCTYPE lines
//! - [`file_collector`] - Directory traversal
//!
//! A run has two phases. [`Processor::plan`] walks, filters, classifies and
//! inspects every file without writing anything. [`Processor::apply`] then
//! verifies that a template exists for every comment style the plan needs and
//! only afterwards renders and splices headers. A missing template therefore
//! never leaves a tree half processed.

mod content_transformer;
mod file_collector;
mod file_io;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
pub use content_transformer::ContentTransformer;
pub use file_collector::{CollectedPath, FileCollector};
pub use file_io::FileIO;
use tracing::{debug, warn};

use crate::classifier::{Classifier, MarkupKind};
use crate::diff::DiffManager;
use crate::file_filter::{CompositeFilter, FileFilter, create_eligibility_filter};
use crate::ignore::IgnoreManager;
use crate::license_detection::{HeaderStatus, PatternLicenseDetector};
use crate::profile::{ForeignLicensePolicy, RuleSet};
use crate::report::{FileReport, ProcessingResult, ProcessingSummary, SkipReason};
use crate::signal::CancellationToken;
use crate::styles::CommentStyleId;
use crate::templates::{LicenseData, TemplateStore};
use crate::verbose_log;

/// What a run does to files that need a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
  /// Insert headers
  #[default]
  Modify,
  /// Compute headers and diffs, write nothing
  DryRun,
  /// Only report files without a header
  CheckOnly,
}

/// Configuration for creating a Processor instance.
pub struct ProcessorConfig {
  pub rules: RuleSet,
  pub license_data: LicenseData,
  pub mode: RunMode,
  pub recursive: bool,

  /// Detection patterns derived from the loaded templates
  pub template_fingerprints: Vec<String>,

  // Optional components
  pub ignore_patterns: Vec<String>,
  pub diff_manager: Option<DiffManager>,
  pub cancel: CancellationToken,
}

impl ProcessorConfig {
  /// Creates a new ProcessorConfig with required fields and sensible defaults.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// ProcessorConfig {
  ///     mode: RunMode::CheckOnly,
  ///     ..ProcessorConfig::new(rules, license_data)
  /// }
  /// ```
  pub fn new(rules: RuleSet, license_data: LicenseData) -> Self {
    Self {
      rules,
      license_data,
      mode: RunMode::Modify,
      recursive: true,
      template_fingerprints: vec![],
      ignore_patterns: vec![],
      diff_manager: None,
      cancel: CancellationToken::new(),
    }
  }
}

/// A file that needs a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
  pub path: PathBuf,
  pub relative: PathBuf,
  pub style: CommentStyleId,
  pub kind: MarkupKind,
}

/// Result of the planning phase.
#[derive(Debug, Clone)]
pub struct Plan {
  pub root: PathBuf,
  /// Reports of files that need no further work
  pub reports: Vec<FileReport>,
  /// Files that need a header, in walk order
  pub pending: Vec<PendingFile>,
  /// Whether planning stopped early because of an interrupt
  pub cancelled: bool,
  started: Instant,
}

impl Plan {
  /// The distinct comment styles needed by pending files, sorted.
  pub fn required_styles(&self) -> Vec<CommentStyleId> {
    let mut styles: Vec<CommentStyleId> = self.pending.iter().map(|file| file.style).collect();
    styles.sort();
    styles.dedup();
    styles
  }
}

/// Outcome of a complete run.
#[derive(Debug, Clone)]
pub struct RunReport {
  pub root: PathBuf,
  /// One report per visited file, sorted by path
  pub reports: Vec<FileReport>,
  /// Whether the run stopped early because of an interrupt
  pub cancelled: bool,
  pub processing_time: Duration,
}

impl RunReport {
  pub fn summary(&self) -> ProcessingSummary {
    ProcessingSummary::from_reports(&self.reports, self.processing_time)
  }

  /// `true` if any file is missing a header or carries a flagged license.
  pub fn has_problems(&self) -> bool {
    self.reports.iter().any(|report| report.result.is_problem())
  }
}

/// Processor for inserting and verifying license headers.
///
/// The `Processor` is responsible for:
/// - Walking the run root
/// - Deciding eligibility and comment style per file
/// - Detecting existing headers
/// - Inserting headers, or showing the diff in dry-run mode
/// - Collecting a report per file
pub struct Processor {
  rules: RuleSet,
  classifier: Classifier,
  detector: PatternLicenseDetector,
  ignore_manager: IgnoreManager,
  license_data: LicenseData,
  mode: RunMode,
  recursive: bool,
  diff_manager: DiffManager,
  cancel: CancellationToken,
}

impl Processor {
  /// Creates a new processor with the specified configuration.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  /// - Any of the ignore patterns are invalid
  /// - Any of the license patterns is not a valid regex
  pub fn new(config: ProcessorConfig) -> Result<Self> {
    let ignore_manager = IgnoreManager::new(config.ignore_patterns)?;

    let mut project_patterns = config.rules.project_patterns.clone();
    project_patterns.extend(config.template_fingerprints);
    let detector = PatternLicenseDetector::new(&project_patterns, &config.rules.foreign_patterns)?;

    Ok(Self {
      classifier: config.rules.classifier(),
      rules: config.rules,
      detector,
      ignore_manager,
      license_data: config.license_data,
      mode: config.mode,
      recursive: config.recursive,
      diff_manager: config.diff_manager.unwrap_or_default(),
      cancel: config.cancel,
    })
  }

  /// Walks `root` and decides what to do with every file, without writing.
  ///
  /// # Errors
  ///
  /// Returns an error if `.headerignore` exists in `root` but cannot be
  /// loaded.
  pub fn plan(&self, root: &Path) -> Result<Plan> {
    let started = Instant::now();

    let mut ignore_manager = self.ignore_manager.clone();
    ignore_manager.load_headerignore(root)?;
    let filter = create_eligibility_filter(&self.rules, root, ignore_manager);

    let collector = FileCollector::new(&self.rules.exclusions, self.recursive, self.rules.skip_hidden_dirs);
    let mut plan = Plan {
      root: root.to_path_buf(),
      reports: Vec::new(),
      pending: Vec::new(),
      cancelled: false,
      started,
    };

    for entry in collector.collect(root) {
      if self.cancel.is_cancelled() {
        plan.cancelled = true;
        break;
      }

      let relative = relative_path(root, entry.path());

      match entry {
        CollectedPath::Symlink(_) => {
          verbose_log!("Skipping: {} (symlink)", relative.display());
          plan.reports.push(FileReport::skipped(relative, SkipReason::Symlink));
        }
        CollectedPath::File(ref path) => match self.inspect(path, &relative, &filter) {
          Inspection::Done(report) => plan.reports.push(report),
          Inspection::Pending(style) => plan.pending.push(PendingFile {
            path: path.clone(),
            relative,
            style,
            kind: MarkupKind::from_path(path),
          }),
        },
      }
    }

    debug!(
      "Planned {} files: {} need a header",
      plan.reports.len() + plan.pending.len(),
      plan.pending.len()
    );

    Ok(plan)
  }

  fn inspect(&self, path: &Path, relative: &Path, filter: &CompositeFilter) -> Inspection {
    match filter.should_process(path) {
      Ok(result) if !result.should_process => {
        let reason = result.reason.unwrap_or(SkipReason::Unreadable);
        verbose_log!("Skipping: {} ({})", relative.display(), reason);
        return Inspection::Done(FileReport::skipped(relative.to_path_buf(), reason));
      }
      Ok(_) => {}
      Err(e) => {
        warn!("Failed to check {}: {:#}", relative.display(), e);
        return Inspection::Done(FileReport::new(
          relative.to_path_buf(),
          None,
          ProcessingResult::Error(format!("{e:#}")),
        ));
      }
    }

    let Some(style) = self.classifier.classify(path) else {
      verbose_log!("Skipping: {} (no comment style)", relative.display());
      return Inspection::Done(FileReport::skipped(relative.to_path_buf(), SkipReason::NoCommentStyle));
    };

    let result = match self.detector.detect_file(path, self.rules.header_scan_bytes) {
      HeaderStatus::Missing => return Inspection::Pending(style),
      HeaderStatus::Project => ProcessingResult::AlreadyHeadered,
      HeaderStatus::Foreign(pattern) => match self.rules.foreign_policy {
        ForeignLicensePolicy::Skip => {
          verbose_log!("Skipping: {} (third-party license: {})", relative.display(), pattern);
          ProcessingResult::AlreadyHeadered
        }
        ForeignLicensePolicy::Flag => ProcessingResult::ForeignLicense { pattern },
      },
      HeaderStatus::Unreadable => ProcessingResult::Skipped(SkipReason::Unreadable),
    };

    Inspection::Done(FileReport::new(relative.to_path_buf(), Some(style), result))
  }

  /// Executes a plan.
  ///
  /// In check-only mode every pending file is reported as missing its header
  /// and `templates` is not consulted. Otherwise templates for all required
  /// styles must exist before the first file is touched. A failure on one
  /// file is recorded in its report and does not stop the run. A plan that
  /// was interrupted starts no file and skips the template check.
  ///
  /// # Errors
  ///
  /// Returns an error if a required template is missing or the diff file
  /// cannot be created. No file has been modified in that case.
  pub fn apply(&self, plan: Plan, templates: &TemplateStore) -> Result<RunReport> {
    let styles = plan.required_styles();
    let Plan {
      root,
      mut reports,
      pending,
      mut cancelled,
      started,
    } = plan;

    if self.mode == RunMode::CheckOnly {
      for file in pending {
        verbose_log!("Missing license header: {}", file.relative.display());
        reports.push(FileReport::new(file.relative, Some(file.style), ProcessingResult::HeaderMissing));
      }
    } else if cancelled {
      debug!("Interrupted while planning; {} files not started", pending.len());
    } else {
      templates.ensure_available(&styles)?;

      if self.mode == RunMode::DryRun {
        self.diff_manager.init()?;
      }

      for file in pending {
        if self.cancel.is_cancelled() {
          cancelled = true;
          break;
        }

        let result = match self.insert_header(&file, templates) {
          Ok(result) => result,
          Err(e) => {
            warn!("Failed to process {}: {:#}", file.relative.display(), e);
            ProcessingResult::Error(format!("{e:#}"))
          }
        };
        reports.push(FileReport::new(file.relative, Some(file.style), result));
      }
    }

    reports.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(RunReport {
      root,
      reports,
      cancelled,
      processing_time: started.elapsed(),
    })
  }

  /// Plans and applies in one go.
  ///
  /// # Errors
  ///
  /// See [`plan`](Self::plan) and [`apply`](Self::apply).
  pub fn run(&self, root: &Path, templates: &TemplateStore) -> Result<RunReport> {
    let plan = self.plan(root)?;
    self.apply(plan, templates)
  }

  fn insert_header(&self, file: &PendingFile, templates: &TemplateStore) -> Result<ProcessingResult> {
    let header = templates.render(file.style, &self.license_data)?;
    let original = FileIO::read_bytes(&file.path)?;
    let updated = ContentTransformer::insert_header(&original, &header, file.kind);

    match self.mode {
      RunMode::DryRun => {
        verbose_log!("Would add license header: {}", file.relative.display());
        self
          .diff_manager
          .display_diff(&file.relative, &original, &updated)
          .with_context(|| format!("Failed to render diff for {}", file.relative.display()))?;
        Ok(ProcessingResult::HeaderMissing)
      }
      _ => {
        FileIO::write_atomic(&file.path, &updated)?;
        verbose_log!("Added license header: {}", file.relative.display());
        Ok(ProcessingResult::HeaderAdded)
      }
    }
  }
}

enum Inspection {
  Done(FileReport),
  Pending(CommentStyleId),
}

fn relative_path(root: &Path, path: &Path) -> PathBuf {
  path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;
  use crate::profile::Profile;

  fn store_with(dir: &Path, styles: &[CommentStyleId]) -> Result<TemplateStore> {
    for style in styles {
      fs::write(dir.join(style.template_file_name()), "SAGE OS header\n")?;
    }
    Ok(TemplateStore::load(dir)?)
  }

  fn processor(mode: RunMode, templates: &TemplateStore) -> Result<Processor> {
    Processor::new(ProcessorConfig {
      mode,
      template_fingerprints: templates.fingerprints(),
      ..ProcessorConfig::new(
        RuleSet::new(Profile::Enhanced),
        LicenseData {
          year: "2025".to_string(),
        },
      )
    })
  }

  #[test]
  fn test_plan_classifies_without_writing() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path().join("repo");
    fs::create_dir(&root)?;
    fs::write(root.join("a.py"), "print(\"hi\")\n")?;
    fs::write(root.join("b.c"), "// SPDX-License-Identifier: BSD-3-Clause\n")?;
    fs::write(root.join("README.md"), "# readme\n")?;
    fs::write(root.join("data.bin"), b"\x00\x01")?;

    let templates = TemplateStore::load(&temp_dir.path().join("none"))?;
    let plan = processor(RunMode::Modify, &templates)?.plan(&root)?;

    assert_eq!(plan.pending.len(), 1);
    assert_eq!(plan.pending[0].relative, PathBuf::from("a.py"));
    assert_eq!(plan.required_styles(), vec![CommentStyleId::HashStyle]);
    assert_eq!(plan.reports.len(), 3);
    assert_eq!(fs::read_to_string(root.join("a.py"))?, "print(\"hi\")\n");
    Ok(())
  }

  #[test]
  fn test_apply_fails_before_touching_files_without_templates() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path().join("repo");
    let template_dir = temp_dir.path().join("templates");
    fs::create_dir(&root)?;
    fs::create_dir(&template_dir)?;
    fs::write(root.join("a.py"), "print(1)\n")?;
    fs::write(root.join("b.c"), "int x;\n")?;

    let templates = store_with(&template_dir, &[CommentStyleId::HashStyle])?;
    let processor = processor(RunMode::Modify, &templates)?;

    assert!(processor.run(&root, &templates).is_err());
    assert_eq!(fs::read_to_string(root.join("a.py"))?, "print(1)\n");
    assert_eq!(fs::read_to_string(root.join("b.c"))?, "int x;\n");
    Ok(())
  }

  #[test]
  fn test_modify_then_check_is_clean() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path().join("repo");
    let template_dir = temp_dir.path().join("templates");
    fs::create_dir(&root)?;
    fs::create_dir(&template_dir)?;
    fs::write(root.join("a.py"), "print(\"hi\")\n")?;

    let templates = store_with(&template_dir, &[CommentStyleId::HashStyle])?;

    let report = processor(RunMode::Modify, &templates)?.run(&root, &templates)?;
    assert_eq!(report.summary().modified, 1);
    assert_eq!(
      fs::read_to_string(root.join("a.py"))?,
      "# SAGE OS header\n\nprint(\"hi\")\n"
    );

    let report = processor(RunMode::CheckOnly, &templates)?.run(&root, &templates)?;
    assert!(!report.has_problems());
    assert_eq!(report.reports[0].result, ProcessingResult::AlreadyHeadered);
    Ok(())
  }

  #[test]
  fn test_foreign_policy_flag() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();
    fs::write(root.join("vendor.js"), "// MIT License\nexport {};\n")?;

    let templates = TemplateStore::load(&root.join("none"))?;
    let mut rules = RuleSet::new(Profile::Enhanced);
    rules.foreign_policy = ForeignLicensePolicy::Flag;
    let processor = Processor::new(ProcessorConfig {
      mode: RunMode::CheckOnly,
      ..ProcessorConfig::new(
        rules,
        LicenseData {
          year: "2025".to_string(),
        },
      )
    })?;

    let report = processor.run(root, &templates)?;
    assert!(report.has_problems());
    assert_eq!(
      report.reports[0].result,
      ProcessingResult::ForeignLicense {
        pattern: "MIT License".to_string()
      }
    );
    Ok(())
  }

  #[test]
  fn test_interrupted_plan_skips_template_check() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path().join("repo");
    fs::create_dir(&root)?;
    fs::write(root.join("a.py"), "print(1)\n")?;

    let templates = TemplateStore::load(&temp_dir.path().join("none"))?;
    let processor = processor(RunMode::Modify, &templates)?;
    let mut plan = processor.plan(&root)?;
    assert_eq!(plan.pending.len(), 1);
    plan.cancelled = true;

    let report = processor.apply(plan, &templates)?;
    assert!(report.cancelled);
    assert!(!report.reports.iter().any(|r| r.path == Path::new("a.py")));
    assert_eq!(fs::read_to_string(root.join("a.py"))?, "print(1)\n");
    Ok(())
  }

  #[test]
  fn test_cancelled_run_starts_no_file() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();
    fs::write(root.join("a.py"), "print(1)\n")?;

    let templates = TemplateStore::load(&root.join("none"))?;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let processor = Processor::new(ProcessorConfig {
      cancel,
      ..ProcessorConfig::new(
        RuleSet::new(Profile::Enhanced),
        LicenseData {
          year: "2025".to_string(),
        },
      )
    })?;

    let report = processor.run(root, &templates)?;
    assert!(report.cancelled);
    assert!(report.reports.is_empty());
    assert_eq!(fs::read_to_string(root.join("a.py"))?, "print(1)\n");
    Ok(())
  }
}
