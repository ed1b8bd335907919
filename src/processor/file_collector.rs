//! # File Collector Module
//!
//! This module walks the run root and collects the files to consider.
//!
//! Symbolic links are never followed; they are reported so that they show up
//! as skipped. Excluded directories (and, when the rules ask for it, hidden
//! ones) are pruned during the walk instead of being filtered file by file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::file_filter::ExclusionSet;

/// A path found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectedPath {
  /// A regular file
  File(PathBuf),
  /// A symbolic link, to a file or a directory
  Symlink(PathBuf),
}

impl CollectedPath {
  pub fn path(&self) -> &Path {
    match self {
      CollectedPath::File(path) | CollectedPath::Symlink(path) => path,
    }
  }
}

/// File collector for directory traversal.
pub struct FileCollector<'a> {
  exclusions: &'a ExclusionSet,
  recursive: bool,
  skip_hidden_dirs: bool,
}

impl<'a> FileCollector<'a> {
  /// Creates a new FileCollector.
  ///
  /// # Parameters
  ///
  /// * `exclusions` - Directory names in here are not descended into
  /// * `recursive` - Whether to descend into subdirectories at all
  /// * `skip_hidden_dirs` - Whether to skip directories starting with `.`
  pub const fn new(exclusions: &'a ExclusionSet, recursive: bool, skip_hidden_dirs: bool) -> Self {
    Self {
      exclusions,
      recursive,
      skip_hidden_dirs,
    }
  }

  /// Traverses `root` and collects files and symlinks, sorted by path.
  ///
  /// Directories that cannot be read are logged and skipped.
  pub fn collect(&self, root: &Path) -> Vec<CollectedPath> {
    debug!("Scanning directory: {}", root.display());
    let start_time = std::time::Instant::now();

    let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
    if !self.recursive {
      walker = walker.max_depth(1);
    }

    let mut collected = Vec::new();
    for entry in walker.into_iter().filter_entry(|entry| self.keep_entry(entry)) {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          warn!("Error walking {}: {}", root.display(), e);
          continue;
        }
      };

      let file_type = entry.file_type();
      if file_type.is_symlink() {
        collected.push(CollectedPath::Symlink(entry.into_path()));
      } else if file_type.is_file() {
        collected.push(CollectedPath::File(entry.into_path()));
      }
    }

    debug!(
      "Found {} files in {}ms",
      collected.len(),
      start_time.elapsed().as_millis()
    );

    collected
  }

  fn keep_entry(&self, entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
      return true;
    }
    let Some(name) = entry.file_name().to_str() else {
      return true;
    };
    if self.skip_hidden_dirs && name.starts_with('.') {
      return false;
    }
    !self.exclusions.excludes_dir_name(name)
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use anyhow::Result;

  use super::*;

  fn relative(root: &Path, collected: &[CollectedPath]) -> Vec<String> {
    collected
      .iter()
      .map(|entry| {
        entry
          .path()
          .strip_prefix(root)
          .unwrap_or(entry.path())
          .to_string_lossy()
          .replace('\\', "/")
      })
      .collect()
  }

  fn tree() -> Result<tempfile::TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src/nested"))?;
    fs::create_dir_all(root.join("node_modules/pkg"))?;
    fs::create_dir_all(root.join(".hidden"))?;
    fs::write(root.join("top.c"), "int a;\n")?;
    fs::write(root.join("src/main.c"), "int b;\n")?;
    fs::write(root.join("src/nested/deep.c"), "int c;\n")?;
    fs::write(root.join("node_modules/pkg/index.js"), "x\n")?;
    fs::write(root.join(".hidden/secret.c"), "int d;\n")?;
    fs::write(root.join(".clang-format"), "x\n")?;
    Ok(temp_dir)
  }

  #[test]
  fn test_recursive_walk_prunes_excluded_and_hidden() -> Result<()> {
    let temp_dir = tree()?;
    let mut exclusions = ExclusionSet::default();
    exclusions.add_dir("node_modules");

    let collected = FileCollector::new(&exclusions, true, true).collect(temp_dir.path());
    assert_eq!(
      relative(temp_dir.path(), &collected),
      vec![".clang-format", "src/main.c", "src/nested/deep.c", "top.c"]
    );
    Ok(())
  }

  #[test]
  fn test_hidden_dirs_kept_when_asked() -> Result<()> {
    let temp_dir = tree()?;
    let exclusions = ExclusionSet::default();

    let collected = FileCollector::new(&exclusions, true, false).collect(temp_dir.path());
    let paths = relative(temp_dir.path(), &collected);
    assert!(paths.contains(&".hidden/secret.c".to_string()));
    assert!(paths.contains(&"node_modules/pkg/index.js".to_string()));
    Ok(())
  }

  #[test]
  fn test_non_recursive_walk() -> Result<()> {
    let temp_dir = tree()?;
    let exclusions = ExclusionSet::default();

    let collected = FileCollector::new(&exclusions, false, true).collect(temp_dir.path());
    assert_eq!(relative(temp_dir.path(), &collected), vec![".clang-format", "top.c"]);
    Ok(())
  }

  #[cfg(unix)]
  #[test]
  fn test_symlinks_are_reported_not_followed() -> Result<()> {
    let temp_dir = tree()?;
    let root = temp_dir.path();
    std::os::unix::fs::symlink(root.join("top.c"), root.join("link.c"))?;
    std::os::unix::fs::symlink(root.join("src"), root.join("src_link"))?;

    let exclusions = ExclusionSet::default();
    let collected = FileCollector::new(&exclusions, true, true).collect(root);

    assert!(collected.contains(&CollectedPath::Symlink(root.join("link.c"))));
    assert!(collected.contains(&CollectedPath::Symlink(root.join("src_link"))));
    assert!(!collected.iter().any(|entry| entry.path().starts_with(root.join("src_link/"))));
    Ok(())
  }
}
