//! # Check Command
//!
//! This module implements the one command of sage-headers: walk a directory
//! and add, verify or preview license headers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::Args;
use tracing::debug;

use crate::config::{Config, load_config};
use crate::diff::DiffManager;
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{
  CategorizedReports, print_added_files, print_all_files_ok, print_blank_line, print_cancelled, print_conflicts,
  print_created_templates, print_errors, print_hint, print_missing_files, print_start_message, print_style_stats,
  print_summary, print_supported,
};
use crate::processor::{Processor, ProcessorConfig, RunMode, RunReport};
use crate::profile::{ForeignLicensePolicy, Profile, RuleSet};
use crate::report::ReportGenerator;
use crate::signal::{CancellationToken, spawn_interrupt_listener};
use crate::templates::{DEFAULT_TEMPLATE_DIR, LicenseData, TemplateStore};

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
  /// Directory to process [default: current directory]
  #[arg(value_name = "DIR")]
  pub dir: Option<PathBuf>,

  /// Check only: report files without a header and exit with status 1 if any
  #[arg(long, conflicts_with = "dry_run")]
  pub check: bool,

  /// Dry run: show which files would get a header without writing them
  #[arg(long)]
  pub dry_run: bool,

  /// Only process files directly inside DIR
  #[arg(long)]
  pub no_recursive: bool,

  /// Directory containing one template per comment style [default:
  /// .github/license-templates in DIR]
  #[arg(long, short = 't', value_name = "DIR")]
  pub template_dir: Option<PathBuf>,

  /// Create missing templates with the default header and exit
  #[arg(long)]
  pub init_templates: bool,

  /// List the supported comment styles, extensions and file names and exit
  #[arg(long)]
  pub list_supported: bool,

  /// Built-in rule set [default: enhanced]
  #[arg(long, value_enum)]
  pub profile: Option<Profile>,

  /// Path to config file (default: .sage-headers.toml in DIR)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// File patterns to ignore (supports glob patterns)
  #[arg(long, short = 'i')]
  pub ignore: Vec<String>,

  /// Skip files larger than this many bytes
  #[arg(long, value_name = "BYTES")]
  pub max_file_size: Option<u64>,

  /// How to treat files that carry a third-party license
  #[arg(long, value_enum, value_name = "POLICY")]
  pub foreign_licenses: Option<ForeignLicensePolicy>,

  /// Copyright year for the {{year}} placeholder [default: current year]
  #[arg(long, value_parser = clap::value_parser!(u16).range(1000..=9999))]
  pub year: Option<u16>,

  /// Show the diff of each change (dry run only)
  #[arg(long, requires = "dry_run")]
  pub show_diff: bool,

  /// Save the diff of all changes to a file (dry run only)
  #[arg(long, value_name = "FILE", requires = "dry_run")]
  pub save_diff: Option<PathBuf>,

  /// Write a JSON report of every visited file
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Show per-style statistics
  #[arg(long)]
  pub stats: bool,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors and the list of problem files
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

impl CheckArgs {
  fn mode(&self) -> RunMode {
    if self.check {
      RunMode::CheckOnly
    } else if self.dry_run {
      RunMode::DryRun
    } else {
      RunMode::Modify
    }
  }
}

/// How a run ended, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// Nothing to report
  Success,
  /// Missing headers or conflicts in check mode, or per-file errors
  ProblemsFound,
  /// Interrupted by the user
  Cancelled,
}

impl RunOutcome {
  pub const fn exit_code(self) -> u8 {
    match self {
      RunOutcome::Success => 0,
      RunOutcome::ProblemsFound => 1,
      RunOutcome::Cancelled => 130,
    }
  }
}

/// Run the check command with the given arguments
///
/// # Errors
///
/// Returns an error for anything that prevents the run from starting: an
/// invalid directory, a bad config file, invalid patterns or missing
/// templates. No file has been modified in that case.
pub async fn run_check(args: CheckArgs) -> Result<RunOutcome> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  let root = absolutize_path(args.dir.as_deref().unwrap_or(Path::new(".")))?;
  if !root.is_dir() {
    bail!("Not a directory: {}", root.display());
  }
  debug!("Run root: {}", root.display());

  let config = load_config(args.config.as_deref(), &root, args.no_config)?;
  let profile = args
    .profile
    .or_else(|| config.as_ref().and_then(|c| c.profile))
    .unwrap_or_default();
  debug!("Using profile: {}", profile);

  let rules = build_rules(profile, config.as_ref(), &args);

  if args.list_supported {
    print_supported(&rules.extension_map);
    return Ok(RunOutcome::Success);
  }

  let template_dir = resolve_template_dir(&args, config.as_ref(), &root)?;

  if args.init_templates {
    let created = TemplateStore::bootstrap(&template_dir)?;
    print_created_templates(&template_dir, &created);
    return Ok(RunOutcome::Success);
  }

  let templates = TemplateStore::load(&template_dir)?;
  let mode = args.mode();

  let year = args
    .year
    .map(|year| year.to_string())
    .unwrap_or_else(|| chrono::Local::now().year().to_string());

  let mut ignore_patterns = config.as_ref().map(|c| c.ignore.clone()).unwrap_or_default();
  ignore_patterns.extend(args.ignore.iter().cloned());

  let cancel = CancellationToken::new();
  let processor = Processor::new(ProcessorConfig {
    mode,
    recursive: !args.no_recursive,
    template_fingerprints: templates.fingerprints(),
    ignore_patterns,
    diff_manager: Some(DiffManager::new(args.show_diff, args.save_diff.clone())),
    cancel: cancel.clone(),
    ..ProcessorConfig::new(rules, LicenseData { year })
  })?;

  let listener = spawn_interrupt_listener(cancel);
  let worker_root = root.clone();
  let result = tokio::task::spawn_blocking(move || -> Result<RunReport> {
    let plan = processor.plan(&worker_root)?;
    print_start_message(plan.reports.len() + plan.pending.len(), &worker_root, mode);
    processor.apply(plan, &templates)
  })
  .await;
  listener.abort();

  let run = result.context("Processing task failed")??;
  let outcome = print_run(&run, mode, &args);

  if let Some(ref output_path) = args.report_json {
    ReportGenerator::new(output_path).generate(&run.root, &run.reports, &run.summary())?;
    info_log!("Generated JSON report at {}", output_path.display());
  }

  Ok(outcome)
}

fn build_rules(profile: Profile, config: Option<&Config>, args: &CheckArgs) -> RuleSet {
  let mut rules = match config {
    Some(config) => config.build_rule_set(profile),
    None => RuleSet::new(profile),
  };
  if let Some(max_file_size) = args.max_file_size {
    rules.max_file_size = max_file_size;
  }
  if let Some(policy) = args.foreign_licenses {
    rules.foreign_policy = policy;
  }
  rules
}

/// `--template-dir` is relative to the current directory; the config value and
/// the default are relative to the run root.
fn resolve_template_dir(args: &CheckArgs, config: Option<&Config>, root: &Path) -> Result<PathBuf> {
  if let Some(ref dir) = args.template_dir {
    return absolutize_path(dir);
  }
  let dir = config
    .and_then(|c| c.template_dir.clone())
    .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR));
  Ok(if dir.is_absolute() { dir } else { root.join(dir) })
}

fn print_run(run: &RunReport, mode: RunMode, args: &CheckArgs) -> RunOutcome {
  let summary = run.summary();
  let categorized = CategorizedReports::from_reports(&run.reports);

  print_blank_line();

  let mut printed_list = false;
  if !categorized.missing.is_empty() {
    print_missing_files(&categorized.missing, mode);
    printed_list = true;
  }
  if !categorized.added.is_empty() {
    if printed_list {
      print_blank_line();
    }
    print_added_files(&categorized.added);
    printed_list = true;
  }
  if !categorized.foreign.is_empty() {
    if printed_list {
      print_blank_line();
    }
    print_conflicts(&categorized.foreign);
    printed_list = true;
  }
  print_errors(&categorized.errors);

  if !printed_list && categorized.errors.is_empty() && !run.cancelled {
    print_all_files_ok();
  }

  print_blank_line();
  print_summary(&summary);

  if args.stats || args.verbose > 0 {
    print_blank_line();
    print_style_stats(&summary);
  }

  if run.cancelled {
    print_cancelled();
    return RunOutcome::Cancelled;
  }

  match mode {
    RunMode::CheckOnly if !categorized.missing.is_empty() => {
      print_blank_line();
      print_hint("Run without --check to add the missing headers.");
    }
    RunMode::DryRun if !categorized.missing.is_empty() => {
      print_blank_line();
      print_hint("Run without --dry-run to write these headers.");
    }
    _ => {}
  }

  let check_failed = mode == RunMode::CheckOnly && run.has_problems();
  if check_failed || !categorized.errors.is_empty() {
    RunOutcome::ProblemsFound
  } else {
    RunOutcome::Success
  }
}

/// Converts a potentially relative path to an absolute path.
fn absolutize_path(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    Ok(path.to_path_buf())
  } else {
    let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
    Ok(current_dir.join(path))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::{FileReport, ProcessingResult};
  use crate::styles::CommentStyleId;

  fn run_with(results: Vec<ProcessingResult>, cancelled: bool) -> RunReport {
    RunReport {
      root: PathBuf::from("/repo"),
      reports: results
        .into_iter()
        .enumerate()
        .map(|(i, result)| FileReport::new(PathBuf::from(format!("f{i}.c")), Some(CommentStyleId::CStyle), result))
        .collect(),
      cancelled,
      processing_time: std::time::Duration::ZERO,
    }
  }

  #[test]
  fn test_exit_codes() {
    assert_eq!(RunOutcome::Success.exit_code(), 0);
    assert_eq!(RunOutcome::ProblemsFound.exit_code(), 1);
    assert_eq!(RunOutcome::Cancelled.exit_code(), 130);
  }

  #[test]
  fn test_outcome_by_mode() {
    let args = CheckArgs::default();
    let missing = || run_with(vec![ProcessingResult::HeaderMissing], false);

    assert_eq!(print_run(&missing(), RunMode::CheckOnly, &args), RunOutcome::ProblemsFound);
    assert_eq!(print_run(&missing(), RunMode::DryRun, &args), RunOutcome::Success);
    assert_eq!(
      print_run(
        &run_with(vec![ProcessingResult::Error("denied".to_string())], false),
        RunMode::Modify,
        &args
      ),
      RunOutcome::ProblemsFound
    );
    assert_eq!(print_run(&missing(), RunMode::CheckOnly, &args).exit_code(), 1);
    assert_eq!(
      print_run(&run_with(vec![], true), RunMode::Modify, &args),
      RunOutcome::Cancelled
    );
  }

  #[test]
  fn test_foreign_conflict_fails_check() {
    let run = run_with(
      vec![ProcessingResult::ForeignLicense {
        pattern: "MIT License".to_string(),
      }],
      false,
    );
    assert_eq!(
      print_run(&run, RunMode::CheckOnly, &CheckArgs::default()),
      RunOutcome::ProblemsFound
    );
  }

  #[test]
  fn test_template_dir_resolution() -> Result<()> {
    let root = Path::new("/repo");
    let args = CheckArgs::default();
    assert_eq!(
      resolve_template_dir(&args, None, root)?,
      PathBuf::from("/repo/.github/license-templates")
    );

    let config = Config {
      template_dir: Some(PathBuf::from("tools/templates")),
      ..Config::default()
    };
    assert_eq!(
      resolve_template_dir(&args, Some(&config), root)?,
      PathBuf::from("/repo/tools/templates")
    );

    let args = CheckArgs {
      template_dir: Some(PathBuf::from("/abs/templates")),
      ..CheckArgs::default()
    };
    assert_eq!(
      resolve_template_dir(&args, Some(&config), root)?,
      PathBuf::from("/abs/templates")
    );
    Ok(())
  }

  #[test]
  fn test_cli_overrides_win_over_config() {
    let config = Config {
      max_file_size: Some(10),
      foreign_licenses: Some(ForeignLicensePolicy::Skip),
      ..Config::default()
    };
    let args = CheckArgs {
      max_file_size: Some(20),
      foreign_licenses: Some(ForeignLicensePolicy::Flag),
      ..CheckArgs::default()
    };

    let rules = build_rules(Profile::Enhanced, Some(&config), &args);
    assert_eq!(rules.max_file_size, 20);
    assert_eq!(rules.foreign_policy, ForeignLicensePolicy::Flag);
  }
}
