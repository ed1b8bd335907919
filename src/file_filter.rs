//! # File Filter Module
//!
//! This module decides whether a file is eligible for header processing at
//! all, independent of whether it already carries a header.
//!
//! Eligibility is a chain of [`FileFilter`]s evaluated cheapest first:
//! 1. excluded file names, wildcard name patterns and excluded directories
//!    ([`ExclusionFilter`])
//! 2. user ignore globs and `.headerignore` ([`IgnoreFilter`])
//! 3. the size ceiling ([`SizeFilter`])
//! 4. binary sniffing of the first bytes ([`BinaryFilter`])
//!
//! The first filter that rejects a file decides its [`SkipReason`].

use std::fs::File;
use std::io::Read as _;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::trace;

use crate::ignore::IgnoreManager;
use crate::profile::RuleSet;
use crate::report::SkipReason;

/// Result of a file filtering operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
  /// Whether the file should be processed
  pub should_process: bool,
  /// Why the file should not be processed (if it should not)
  pub reason: Option<SkipReason>,
}

impl FilterResult {
  /// Creates a new FilterResult indicating the file should be processed.
  pub const fn process() -> Self {
    Self {
      should_process: true,
      reason: None,
    }
  }

  /// Creates a new FilterResult indicating the file should be skipped.
  pub const fn skip(reason: SkipReason) -> Self {
    Self {
      should_process: false,
      reason: Some(reason),
    }
  }
}

/// Trait for components that filter files based on certain criteria.
pub trait FileFilter: Send + Sync {
  /// Determines whether a file should be processed.
  ///
  /// # Parameters
  ///
  /// * `path` - The path to the file to check
  ///
  /// # Returns
  ///
  /// A `FilterResult` indicating whether the file should be processed and why
  /// not if applicable.
  fn should_process(&self, path: &Path) -> Result<FilterResult>;
}

/// A name pattern containing `*`, matched against the whole name.
#[derive(Debug, Clone)]
struct NamePattern {
  raw: String,
  pattern: glob::Pattern,
}

impl NamePattern {
  fn new(raw: &str) -> Option<Self> {
    // Only `*` is a wildcard; every other glob metacharacter is literal.
    let escaped: Vec<String> = raw.split('*').map(glob::Pattern::escape).collect();
    let pattern = glob::Pattern::new(&escaped.join("*")).ok()?;
    Some(Self {
      raw: raw.to_string(),
      pattern,
    })
  }

  fn matches(&self, name: &str) -> bool {
    self.pattern.matches(name)
  }
}

/// One segment of a directory exclusion entry.
#[derive(Debug, Clone)]
enum Segment {
  Exact(String),
  Wildcard(NamePattern),
}

impl Segment {
  fn parse(raw: &str) -> Option<Self> {
    if raw.contains('*') {
      NamePattern::new(raw).map(Segment::Wildcard)
    } else {
      Some(Segment::Exact(raw.to_string()))
    }
  }

  fn matches(&self, component: &str) -> bool {
    match self {
      Segment::Exact(name) => name == component,
      Segment::Wildcard(pattern) => pattern.matches(component),
    }
  }
}

/// A directory exclusion: a single name, or a `/`-separated run of names that
/// must appear as consecutive path components.
#[derive(Debug, Clone)]
struct DirRule {
  raw: String,
  segments: Vec<Segment>,
}

impl DirRule {
  fn new(raw: &str) -> Option<Self> {
    let segments = raw
      .split('/')
      .filter(|segment| !segment.is_empty())
      .map(Segment::parse)
      .collect::<Option<Vec<_>>>()?;
    if segments.is_empty() {
      return None;
    }
    Some(Self {
      raw: raw.to_string(),
      segments,
    })
  }

  fn matches(&self, components: &[&str]) -> bool {
    components.windows(self.segments.len()).any(|window| {
      window
        .iter()
        .zip(&self.segments)
        .all(|(component, segment)| segment.matches(component))
    })
  }
}

/// File names, name patterns and directories that remove a path from
/// consideration regardless of its type.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
  files: Vec<String>,
  file_patterns: Vec<NamePattern>,
  dirs: Vec<DirRule>,
}

impl ExclusionSet {
  /// Adds a file exclusion. Entries containing `*` are wildcard patterns
  /// matched against the whole file name; others must match exactly.
  ///
  /// Returns `false` if the entry was empty or unusable.
  pub fn add_file(&mut self, entry: &str) -> bool {
    let entry = entry.trim();
    if entry.is_empty() {
      return false;
    }
    if entry.contains('*') {
      match NamePattern::new(entry) {
        Some(pattern) => self.file_patterns.push(pattern),
        None => return false,
      }
    } else if !self.files.iter().any(|existing| existing == entry) {
      self.files.push(entry.to_string());
    }
    true
  }

  /// Adds a directory exclusion, matched against every directory component
  /// of a path relative to the run root.
  ///
  /// Returns `false` if the entry was empty or unusable.
  pub fn add_dir(&mut self, entry: &str) -> bool {
    match DirRule::new(entry.trim().trim_matches('/')) {
      Some(rule) => {
        self.dirs.push(rule);
        true
      }
      None => false,
    }
  }

  /// Returns `true` if a directory with this name is excluded on its own.
  ///
  /// Used to prune the walk. Multi-segment rules are left to [`check`](Self::check).
  pub fn excludes_dir_name(&self, name: &str) -> bool {
    self
      .dirs
      .iter()
      .any(|rule| rule.segments.len() == 1 && rule.segments[0].matches(name))
  }

  /// Checks a path relative to the run root against the exclusions, in
  /// order: exact file name, wildcard file name, directory components.
  pub fn check(&self, relative_path: &Path) -> Option<SkipReason> {
    let file_name = relative_path.file_name().and_then(|name| name.to_str()).unwrap_or("");

    if self.files.iter().any(|name| name == file_name) {
      return Some(SkipReason::ExcludedName);
    }

    if let Some(pattern) = self.file_patterns.iter().find(|pattern| pattern.matches(file_name)) {
      return Some(SkipReason::ExcludedPattern(pattern.raw.clone()));
    }

    let components: Vec<&str> = relative_path
      .parent()
      .map(|parent| {
        parent
          .components()
          .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
          })
          .collect()
      })
      .unwrap_or_default();

    self
      .dirs
      .iter()
      .find(|rule| rule.matches(&components))
      .map(|rule| SkipReason::ExcludedDirectory(rule.raw.clone()))
  }
}

/// Filter that applies an [`ExclusionSet`] to paths relative to the run root.
pub struct ExclusionFilter {
  exclusions: ExclusionSet,
  root: PathBuf,
}

impl ExclusionFilter {
  pub const fn new(exclusions: ExclusionSet, root: PathBuf) -> Self {
    Self { exclusions, root }
  }
}

impl FileFilter for ExclusionFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    let relative = path.strip_prefix(&self.root).unwrap_or(path);
    match self.exclusions.check(relative) {
      Some(reason) => {
        trace!("Skipping: {} ({})", path.display(), reason);
        Ok(FilterResult::skip(reason))
      }
      None => Ok(FilterResult::process()),
    }
  }
}

/// Filter that excludes files matching ignore patterns.
pub struct IgnoreFilter {
  ignore_manager: IgnoreManager,
}

impl IgnoreFilter {
  /// Creates a new IgnoreFilter with the given IgnoreManager.
  pub const fn new(ignore_manager: IgnoreManager) -> Self {
    Self { ignore_manager }
  }
}

impl FileFilter for IgnoreFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    if self.ignore_manager.is_ignored(path) {
      Ok(FilterResult::skip(SkipReason::Ignored))
    } else {
      Ok(FilterResult::process())
    }
  }
}

/// Filter that rejects files larger than a ceiling.
pub struct SizeFilter {
  max_bytes: u64,
}

impl SizeFilter {
  pub const fn new(max_bytes: u64) -> Self {
    Self { max_bytes }
  }
}

impl FileFilter for SizeFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    let Ok(metadata) = std::fs::metadata(path) else {
      return Ok(FilterResult::skip(SkipReason::Unreadable));
    };
    if metadata.len() > self.max_bytes {
      trace!("Skipping: {} ({} bytes)", path.display(), metadata.len());
      return Ok(FilterResult::skip(SkipReason::TooLarge(metadata.len())));
    }
    Ok(FilterResult::process())
  }
}

/// Filter that rejects binary files.
///
/// A file is binary if its first `sniff_bytes` contain a NUL byte, or if less
/// than 70% of them are printable ASCII, tab, line feed or carriage return.
/// Empty files are text. Files that cannot be read are rejected.
pub struct BinaryFilter {
  sniff_bytes: usize,
}

impl BinaryFilter {
  pub const fn new(sniff_bytes: usize) -> Self {
    Self { sniff_bytes }
  }
}

impl FileFilter for BinaryFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    match read_sniff_prefix(path, self.sniff_bytes) {
      Ok(prefix) if looks_binary(&prefix) => Ok(FilterResult::skip(SkipReason::Binary)),
      Ok(_) => Ok(FilterResult::process()),
      Err(e) => {
        trace!("Skipping: {} ({:#})", path.display(), e);
        Ok(FilterResult::skip(SkipReason::Unreadable))
      }
    }
  }
}

fn read_sniff_prefix(path: &Path, limit: usize) -> Result<Vec<u8>> {
  let file = File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
  let mut prefix = Vec::with_capacity(limit);
  file
    .take(limit as u64)
    .read_to_end(&mut prefix)
    .with_context(|| format!("Failed to read file: {}", path.display()))?;
  Ok(prefix)
}

/// Binary heuristic over a raw prefix.
pub fn looks_binary(prefix: &[u8]) -> bool {
  if prefix.is_empty() {
    return false;
  }
  if prefix.contains(&0) {
    return true;
  }
  let printable = prefix
    .iter()
    .filter(|&&byte| (32..=126).contains(&byte) || matches!(byte, 9 | 10 | 13))
    .count();
  // printable / len < 0.7, in integer arithmetic
  printable * 10 < prefix.len() * 7
}

/// Filter that combines multiple filters.
pub struct CompositeFilter {
  filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
  /// Creates a new CompositeFilter with the given filters.
  pub fn new(filters: Vec<Box<dyn FileFilter>>) -> Self {
    Self { filters }
  }

  /// Adds a filter to this CompositeFilter.
  pub fn add_filter(&mut self, filter: Box<dyn FileFilter>) {
    self.filters.push(filter);
  }

  /// Convenience wrapper returning only the verdict.
  pub fn is_eligible(&self, path: &Path) -> Result<bool> {
    Ok(self.should_process(path)?.should_process)
  }
}

impl FileFilter for CompositeFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    for filter in &self.filters {
      let result = filter.should_process(path)?;
      if !result.should_process {
        return Ok(result);
      }
    }
    Ok(FilterResult::process())
  }
}

/// Builds the eligibility chain for a run rooted at `root`.
pub fn create_eligibility_filter(rules: &RuleSet, root: &Path, ignore_manager: IgnoreManager) -> CompositeFilter {
  CompositeFilter::new(vec![
    Box::new(ExclusionFilter::new(rules.exclusions.clone(), root.to_path_buf())),
    Box::new(IgnoreFilter::new(ignore_manager)),
    Box::new(SizeFilter::new(rules.max_file_size)),
    Box::new(BinaryFilter::new(rules.binary_sniff_bytes)),
  ])
}
