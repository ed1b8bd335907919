//! # Output Module
//!
//! This module centralizes all user-facing output for the sage-headers tool.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! ## Design Goals
//!
//! - **Informative**: Show actionable information without requiring flags
//! - **Scannable**: Use formatting to make output easy to parse visually
//! - **Progressive**: More detail with `-v`, silence with `-q`
//! - **Scriptable**: Keep stdout predictable for piping/automation

use std::path::{Path, PathBuf};

use owo_colors::{OwoColorize, Stream};

use crate::classifier::ExtensionMap;
use crate::logging::{is_quiet, is_verbose};
use crate::processor::RunMode;
use crate::report::{FileReport, ProcessingResult, ProcessingSummary};
use crate::styles::CommentStyleId;

/// Symbols used in output
pub mod symbols {
  /// Success/has license
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Missing license/failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Conflict with a third-party license
  pub const CONFLICT: &str = "!";
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Print the initial "Checking N files in DIR..." message.
///
/// - In modify mode: "Processing N files in DIR..."
/// - In check and dry-run mode: "Checking N files in DIR..."
pub fn print_start_message(file_count: usize, root: &Path, mode: RunMode) {
  if is_quiet() {
    return;
  }

  let verb = if mode == RunMode::Modify { "Processing" } else { "Checking" };
  println!(
    "{} {} {} in {}...",
    verb,
    file_count,
    plural(file_count),
    display_root(root).display()
  );
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Print the list of files missing license headers.
///
/// In quiet mode only the paths are printed, one per line, so the list can be
/// piped. In verbose mode every file is shown.
pub fn print_missing_files(files: &[&FileReport], mode: RunMode) {
  if files.is_empty() {
    return;
  }

  if is_quiet() {
    for file in files {
      println!("{}", display_path(&file.path));
    }
    return;
  }

  let count = files.len();
  let title = if mode == RunMode::DryRun {
    format!("{} {} would get a license header:", count, plural(count))
  } else {
    format!("{} {} missing license headers:", count, plural(count))
  };
  println!(
    "{} {}",
    symbols::FAILURE.if_supports_color(Stream::Stdout, |s| s.red()),
    title
  );
  print_file_list(files, |_| None);
}

/// Print the list of files that had licenses added.
pub fn print_added_files(files: &[&FileReport]) {
  if is_quiet() || files.is_empty() {
    return;
  }

  let count = files.len();
  println!(
    "{} Added license header to {} {}:",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    count,
    plural(count)
  );
  print_file_list(files, |_| None);
}

/// Print the files carrying a third-party license, with the matching pattern.
pub fn print_conflicts(files: &[&FileReport]) {
  if files.is_empty() {
    return;
  }

  if is_quiet() {
    for file in files {
      println!("{}", display_path(&file.path));
    }
    return;
  }

  let count = files.len();
  println!(
    "{} {} {} with a third-party license:",
    symbols::CONFLICT.if_supports_color(Stream::Stdout, |s| s.yellow()),
    count,
    plural(count)
  );
  print_file_list(files, |file| match &file.result {
    ProcessingResult::ForeignLicense { pattern } => Some(format!("matches \"{}\"", pattern)),
    _ => None,
  });
}

/// Print the files whose processing failed. Errors go to stderr and are shown
/// even in quiet mode.
pub fn print_errors(files: &[&FileReport]) {
  if files.is_empty() {
    return;
  }

  let count = files.len();
  eprintln!(
    "{} Failed to process {} {}:",
    symbols::FAILURE.if_supports_color(Stream::Stderr, |s| s.red()),
    count,
    plural(count)
  );
  for file in files {
    if let ProcessingResult::Error(cause) = &file.result {
      eprintln!("  {}: {}", display_path(&file.path), cause);
    }
  }
}

/// Print the success message when all files have license headers.
pub fn print_all_files_ok() {
  if is_quiet() {
    return;
  }

  println!(
    "{} All files have license headers.",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())
  );
}

/// Print the processing summary.
///
/// Format: "Summary: N processed, M modified, S skipped, E errors"
/// In verbose mode, also shows timing.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }

  let modified_str = summary.modified.if_supports_color(Stream::Stdout, |s| s.green());
  let skipped_str = summary.skipped.if_supports_color(Stream::Stdout, |s| s.dimmed());
  let errors_str = if summary.errors > 0 {
    summary.errors.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  } else {
    summary.errors.to_string()
  };

  let mut summary_line = format!(
    "Summary: {} processed, {} modified, {} skipped, {} errors",
    summary.processed, modified_str, skipped_str, errors_str
  );

  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", summary.processing_time.as_secs_f64()));
  }

  println!("{}", summary_line);
}

/// Print how many files needed a header, per comment style.
pub fn print_style_stats(summary: &ProcessingSummary) {
  if is_quiet() || summary.by_style.is_empty() {
    return;
  }

  println!("Files needing a header, by comment style:");
  for (style, count) in &summary.by_style {
    println!("  {:<18} {}", style.as_str(), count);
  }
  if summary.already_headered > 0 {
    println!("  {:<18} {}", "already headered", summary.already_headered);
  }
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

/// Print the message shown when a run was interrupted.
pub fn print_cancelled() {
  eprintln!(
    "{}",
    "Interrupted: no further files were started.".if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

/// Print the template files created by `--init-templates`.
pub fn print_created_templates(dir: &Path, created: &[PathBuf]) {
  if is_quiet() {
    return;
  }

  if created.is_empty() {
    println!(
      "{} All templates already exist in {}",
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
      display_root(dir).display()
    );
    return;
  }

  println!(
    "{} Created {} {} in {}:",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    created.len(),
    if created.len() == 1 { "template" } else { "templates" },
    display_root(dir).display()
  );
  for path in created {
    let name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    println!("  {}", name);
  }
}

/// Print every supported comment style with its extensions and file names.
///
/// This is the requested output of `--list-supported`, so it ignores quiet
/// mode.
pub fn print_supported(map: &ExtensionMap) {
  let extensions = map.extensions();
  let filenames = map.filenames();

  for style in CommentStyleId::ALL {
    let exts: Vec<String> = extensions
      .iter()
      .filter(|(_, s)| *s == style)
      .map(|(ext, _)| format!(".{}", ext))
      .collect();
    let names: Vec<&str> = filenames
      .iter()
      .filter(|(_, s)| *s == style)
      .map(|(name, _)| *name)
      .collect();
    if exts.is_empty() && names.is_empty() {
      continue;
    }

    println!(
      "{} ({})",
      style.as_str().if_supports_color(Stream::Stdout, |s| s.bold()),
      style.style().description
    );
    if !exts.is_empty() {
      println!("  extensions: {}", exts.join(" "));
    }
    if !names.is_empty() {
      println!("  files:      {}", names.join(" "));
    }
  }
}

fn print_file_list(files: &[&FileReport], detail: impl Fn(&FileReport) -> Option<String>) {
  let count = files.len();
  let show_all = is_verbose();
  let limit = if show_all { count } else { DEFAULT_FILE_LIST_LIMIT };

  for file in files.iter().take(limit) {
    match detail(file) {
      Some(detail) => println!(
        "  {} {}",
        display_path(&file.path),
        format!("({})", detail).if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
      None => println!("  {}", display_path(&file.path)),
    }
  }

  if !show_all && count > limit {
    println!("  ... and {} more (use -v to see all)", count - limit);
  }
}

const fn plural(count: usize) -> &'static str {
  if count == 1 { "file" } else { "files" }
}

/// Categorize file reports into different groups for output.
pub struct CategorizedReports<'a> {
  /// Files missing license headers (check-only and dry-run)
  pub missing: Vec<&'a FileReport>,
  /// Files that had headers added
  pub added: Vec<&'a FileReport>,
  /// Files carrying a flagged third-party license
  pub foreign: Vec<&'a FileReport>,
  /// Files whose processing failed
  pub errors: Vec<&'a FileReport>,
  /// Files that already had a header
  pub ok: Vec<&'a FileReport>,
  /// Files that were not eligible
  pub skipped: Vec<&'a FileReport>,
}

impl<'a> CategorizedReports<'a> {
  /// Categorize a slice of file reports, keeping their order.
  pub fn from_reports(reports: &'a [FileReport]) -> Self {
    let mut categorized = Self {
      missing: Vec::new(),
      added: Vec::new(),
      foreign: Vec::new(),
      errors: Vec::new(),
      ok: Vec::new(),
      skipped: Vec::new(),
    };

    for report in reports {
      let bucket = match report.result {
        ProcessingResult::HeaderMissing => &mut categorized.missing,
        ProcessingResult::HeaderAdded => &mut categorized.added,
        ProcessingResult::ForeignLicense { .. } => &mut categorized.foreign,
        ProcessingResult::Error(_) => &mut categorized.errors,
        ProcessingResult::AlreadyHeadered => &mut categorized.ok,
        ProcessingResult::Skipped(_) => &mut categorized.skipped,
      };
      bucket.push(report);
    }

    categorized
  }
}

/// Formats a report path with forward slashes.
fn display_path(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

/// The run root relative to the current directory, when that is shorter.
fn display_root(root: &Path) -> PathBuf {
  let relative = std::env::current_dir()
    .ok()
    .and_then(|cwd| pathdiff::diff_paths(root, cwd));

  match relative {
    Some(path) if path.as_os_str().is_empty() => PathBuf::from("."),
    Some(path) if path.as_os_str().len() < root.as_os_str().len() => path,
    _ => root.to_path_buf(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::SkipReason;

  fn report(path: &str, result: ProcessingResult) -> FileReport {
    FileReport::new(PathBuf::from(path), Some(CommentStyleId::CStyle), result)
  }

  #[test]
  fn test_categorize_reports_mixed() {
    let reports = vec![
      report("src/ok.c", ProcessingResult::AlreadyHeadered),
      report("src/new.c", ProcessingResult::HeaderMissing),
      report("src/added.c", ProcessingResult::HeaderAdded),
      report(
        "src/vendor.c",
        ProcessingResult::ForeignLicense {
          pattern: "MIT License".to_string(),
        },
      ),
      report("src/broken.c", ProcessingResult::Error("denied".to_string())),
      FileReport::skipped(PathBuf::from("logo.png"), SkipReason::Binary),
    ];

    let categorized = CategorizedReports::from_reports(&reports);

    assert_eq!(categorized.ok.len(), 1);
    assert_eq!(categorized.missing.len(), 1);
    assert_eq!(categorized.added.len(), 1);
    assert_eq!(categorized.foreign.len(), 1);
    assert_eq!(categorized.errors.len(), 1);
    assert_eq!(categorized.skipped.len(), 1);
    assert_eq!(categorized.missing[0].path, PathBuf::from("src/new.c"));
  }

  #[test]
  fn test_display_path_uses_forward_slashes() {
    assert_eq!(display_path(Path::new("src/main.c")), "src/main.c");
  }

  #[test]
  fn test_display_root_of_current_dir() -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    assert_eq!(display_root(&cwd), PathBuf::from("."));
    assert_eq!(display_root(&cwd.join("sub")), PathBuf::from("sub"));
    Ok(())
  }

  #[test]
  fn test_plural() {
    assert_eq!(plural(1), "file");
    assert_eq!(plural(0), "files");
    assert_eq!(plural(2), "files");
  }
}
