//! # Ignore Module
//!
//! User-supplied ignore rules, on top of the built-in exclusion tables.
//!
//! It supports:
//! - glob patterns from `--ignore` and the config file's `ignore` list
//! - a `.headerignore` file at the run root, using gitignore syntax

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::verbose_log;

/// Name of the per-tree ignore file.
pub const IGNORE_FILE_NAME: &str = ".headerignore";

/// Manager for handling ignore patterns from the command line, the config
/// file and `.headerignore`.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
///
/// use sage_headers::ignore::IgnoreManager;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut manager = IgnoreManager::new(vec!["**/*.json".to_string()])?;
/// manager.load_headerignore(Path::new("."))?;
///
/// assert!(manager.is_ignored(Path::new("src/config.json")));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IgnoreManager {
  /// Pre-compiled glob set from command-line and config patterns
  glob_set: GlobSet,

  /// Gitignore matcher for `.headerignore`
  gitignore: Option<Gitignore>,

  /// Run root used for `.headerignore` matching
  root_dir: Option<PathBuf>,
}

impl IgnoreManager {
  /// Creates a new ignore manager from glob patterns.
  ///
  /// # Errors
  ///
  /// Returns an error if any of the patterns are invalid.
  pub fn new(patterns: Vec<String>) -> Result<Self> {
    let mut builder = GlobSetBuilder::new();

    let add_pattern = |b: &mut GlobSetBuilder, p: &str| -> Result<()> {
      b.add(Glob::new(p).with_context(|| format!("Invalid glob pattern: {}", p))?);
      Ok(())
    };

    for pattern in patterns {
      let pattern = pattern.replace('\\', "/");

      if let Some(dir_pattern) = pattern.strip_suffix('/') {
        // Directory: everything below it, at any depth
        add_pattern(&mut builder, &format!("{}/**", dir_pattern))?;
        add_pattern(&mut builder, &format!("**/{}/**", dir_pattern))?;
      } else if !pattern.contains('*') && !pattern.contains('?') {
        // Plain name: the file itself or anything below a directory of that name
        add_pattern(&mut builder, &pattern)?;
        add_pattern(&mut builder, &format!("**/{}", pattern))?;
        add_pattern(&mut builder, &format!("{}/**", pattern))?;
        add_pattern(&mut builder, &format!("**/{}/**", pattern))?;
      } else {
        add_pattern(&mut builder, &pattern)?;
        if !pattern.starts_with("**/") {
          add_pattern(&mut builder, &format!("**/{}", pattern))?;
        }
      }
    }

    let glob_set = builder.build().with_context(|| "Failed to build glob set")?;

    Ok(Self {
      glob_set,
      gitignore: None,
      root_dir: None,
    })
  }

  /// Loads `.headerignore` from `root`, if present, and remembers `root` for
  /// relative matching.
  ///
  /// # Errors
  ///
  /// Returns an error if the file exists but cannot be read or contains an
  /// invalid pattern.
  pub fn load_headerignore(&mut self, root: &Path) -> Result<()> {
    self.root_dir = Some(root.to_path_buf());

    let ignore_path = root.join(IGNORE_FILE_NAME);
    if !ignore_path.is_file() {
      return Ok(());
    }

    verbose_log!("Loading {} file: {}", IGNORE_FILE_NAME, ignore_path.display());
    let content = fs::read_to_string(&ignore_path)
      .with_context(|| format!("Failed to read {} file: {}", IGNORE_FILE_NAME, ignore_path.display()))?;

    let mut builder = GitignoreBuilder::new(root);
    for line in content.lines() {
      if !line.trim().is_empty() && !line.trim().starts_with('#') {
        builder
          .add_line(Some(root.to_path_buf()), line)
          .with_context(|| format!("Failed to add line from {}: {}", ignore_path.display(), line))?;
      }
    }

    let gitignore = builder.build().with_context(|| "Failed to build gitignore matcher")?;
    self.gitignore = Some(gitignore);

    Ok(())
  }

  /// Checks if a file should be ignored.
  ///
  /// Relative paths are interpreted against the run root.
  pub fn is_ignored(&self, path: &Path) -> bool {
    let relative = match &self.root_dir {
      Some(root) => path.strip_prefix(root).unwrap_or(path),
      None => path,
    };

    if self.glob_set.is_match(relative) {
      verbose_log!("Skipping: {} (matches ignore pattern)", path.display());
      return true;
    }

    if let Some(ref gitignore) = self.gitignore
      && let Some(ref root_dir) = self.root_dir
    {
      let path = if path.is_absolute() {
        Cow::Borrowed(path)
      } else {
        Cow::Owned(root_dir.join(path))
      };
      if let Ok(rel_path) = path.strip_prefix(root_dir)
        && gitignore.matched_path_or_any_parents(rel_path, false).is_ignore()
      {
        verbose_log!("Skipping: {} (matches {} pattern)", path.display(), IGNORE_FILE_NAME);
        return true;
      }
    }

    false
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_glob_patterns() -> Result<()> {
    let manager = IgnoreManager::new(vec!["*.bak".to_string(), "generated/".to_string()])?;

    assert!(manager.is_ignored(Path::new("notes.bak")));
    assert!(manager.is_ignored(Path::new("src/deep/notes.bak")));
    assert!(manager.is_ignored(Path::new("generated/table.c")));
    assert!(manager.is_ignored(Path::new("src/generated/table.c")));
    assert!(!manager.is_ignored(Path::new("src/main.c")));
    Ok(())
  }

  #[test]
  fn test_plain_name_matches_file_or_directory() -> Result<()> {
    let manager = IgnoreManager::new(vec!["scratch".to_string()])?;

    assert!(manager.is_ignored(Path::new("scratch")));
    assert!(manager.is_ignored(Path::new("tools/scratch/run.sh")));
    assert!(!manager.is_ignored(Path::new("tools/scratchpad.sh")));
    Ok(())
  }

  #[test]
  fn test_invalid_glob_is_an_error() {
    assert!(IgnoreManager::new(vec!["src/[".to_string()]).is_err());
  }

  #[test]
  fn test_headerignore_file() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();
    fs::write(root.join(IGNORE_FILE_NAME), "# comment\nthird_party_libs/\n*.gen.c\n!keep.gen.c\n")?;

    let mut manager = IgnoreManager::new(Vec::new())?;
    manager.load_headerignore(root)?;

    assert!(manager.is_ignored(&root.join("third_party_libs/zlib/inflate.c")));
    assert!(manager.is_ignored(&root.join("src/table.gen.c")));
    assert!(!manager.is_ignored(&root.join("src/keep.gen.c")));
    assert!(!manager.is_ignored(&root.join("src/main.c")));
    Ok(())
  }

  #[test]
  fn test_missing_headerignore_is_fine() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let mut manager = IgnoreManager::new(Vec::new())?;
    manager.load_headerignore(temp_dir.path())?;
    assert!(!manager.is_ignored(&temp_dir.path().join("main.c")));
    Ok(())
  }
}
