//! # Diff Module
//!
//! This module renders the changes a dry run would make, either to stderr or
//! into a single consolidated diff file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use similar::{ChangeTag, TextDiff};

/// Manages diff creation and rendering for header insertions.
///
/// This struct handles:
/// - Generating diffs between original and modified content
/// - Displaying diffs to stderr with colorization
/// - Saving diffs to a file
#[derive(Debug, Clone, Default)]
pub struct DiffManager {
  /// Whether to show diffs on stderr
  pub show_diff: bool,

  /// Path to save the diffs to
  pub save_diff_path: Option<PathBuf>,
}

impl DiffManager {
  /// Creates a new DiffManager.
  ///
  /// # Parameters
  ///
  /// * `show_diff` - Whether to show diffs on stderr
  /// * `save_diff_path` - Path to save the diffs to
  pub const fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Self {
    Self {
      show_diff,
      save_diff_path,
    }
  }

  /// Whether any diff output was requested.
  pub const fn is_enabled(&self) -> bool {
    self.show_diff || self.save_diff_path.is_some()
  }

  /// Truncates the diff file so a run starts with an empty one.
  ///
  /// # Errors
  ///
  /// Returns an error if the diff file cannot be created.
  pub fn init(&self) -> Result<()> {
    if let Some(ref diff_path) = self.save_diff_path {
      fs::write(diff_path, "").with_context(|| format!("Failed to create diff file: {}", diff_path.display()))?;
    }
    Ok(())
  }

  /// Displays and/or saves a diff between the original and new content.
  ///
  /// Content that is not valid UTF-8 is shown lossily. Diffs of several files
  /// are appended to the same file.
  ///
  /// # Parameters
  ///
  /// * `path` - Display path of the file
  /// * `original` - Original file content
  /// * `new` - New file content with the header
  ///
  /// # Errors
  ///
  /// Returns an error if the diff file cannot be written.
  pub fn display_diff(&self, path: &Path, original: &[u8], new: &[u8]) -> Result<()> {
    if !self.is_enabled() {
      return Ok(());
    }

    let original = String::from_utf8_lossy(original);
    let new = String::from_utf8_lossy(new);
    let diff = TextDiff::from_lines(original.as_ref(), new.as_ref());

    let title = format!("Diff for {}:", path.display());
    let mut diff_content = format!("{title}\n");

    if self.show_diff {
      eprintln!("{}", title.if_supports_color(Stream::Stderr, |s| s.bold()));
    }

    for change in diff.iter_all_changes() {
      let sign = match change.tag() {
        ChangeTag::Delete => "-",
        ChangeTag::Insert => "+",
        ChangeTag::Equal => " ",
      };
      let line = format!("{}{}", sign, change);
      let line = if change.missing_newline() { line + "\n" } else { line };

      if self.show_diff {
        match change.tag() {
          ChangeTag::Insert => eprint!("{}", line.if_supports_color(Stream::Stderr, |s| s.green())),
          ChangeTag::Delete => eprint!("{}", line.if_supports_color(Stream::Stderr, |s| s.red())),
          ChangeTag::Equal => eprint!("{}", line),
        }
      }
      diff_content.push_str(&line);
    }

    if self.show_diff {
      eprintln!();
    }
    diff_content.push('\n');

    if let Some(ref diff_path) = self.save_diff_path {
      let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(diff_path)
        .with_context(|| format!("Failed to open diff file: {}", diff_path.display()))?;
      file
        .write_all(diff_content.as_bytes())
        .with_context(|| format!("Failed to write diff file: {}", diff_path.display()))?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_saved_diffs_are_consolidated() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let diff_path = temp_dir.path().join("changes.diff");
    fs::write(&diff_path, "stale\n")?;

    let manager = DiffManager::new(false, Some(diff_path.clone()));
    manager.init()?;
    manager.display_diff(Path::new("a.py"), b"print(1)\n", b"# h\n\nprint(1)\n")?;
    manager.display_diff(Path::new("b.sh"), b"echo", b"# h\n\necho")?;

    let saved = fs::read_to_string(&diff_path)?;
    assert!(!saved.contains("stale"));
    assert!(saved.contains("Diff for a.py:\n+# h\n+\n print(1)\n"));
    assert!(saved.contains("Diff for b.sh:\n+# h\n+\n echo\n"));
    Ok(())
  }

  #[test]
  fn test_disabled_manager_writes_nothing() -> Result<()> {
    let manager = DiffManager::default();
    assert!(!manager.is_enabled());
    manager.init()?;
    manager.display_diff(Path::new("a.py"), b"x\n", b"y\n")?;
    Ok(())
  }
}
