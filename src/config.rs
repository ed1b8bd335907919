//! # Configuration Module
//!
//! This module provides configuration file support for sage-headers, allowing
//! users to adjust the built-in profile: extra extension and filename
//! mappings, exclusions, ignore globs, detection patterns and limits.
//!
//! Configuration can be specified in a `.sage-headers.toml` file in the run
//! root or via the `SAGE_HEADERS_CONFIG` environment variable.
//!
//! ```toml
//! profile = "enhanced"
//! template-dir = "tools/license-templates"
//! foreign-licenses = "flag"
//! ignore = ["generated/**"]
//! license-patterns = ["Copyright .* Example Corp"]
//!
//! [extensions]
//! tpl = "html-style"
//!
//! [filenames]
//! "Justfile" = "hash-style"
//!
//! [exclude]
//! dirs = ["fixtures"]
//! files = ["*.pb.go"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::RegexBuilder;
use serde::Deserialize;

use crate::profile::{ForeignLicensePolicy, Profile, RuleSet};
use crate::styles::CommentStyleId;
use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".sage-headers.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "SAGE_HEADERS_CONFIG";

/// Additional exclusions on top of the profile's built-in lists.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExcludeConfig {
  /// Directory names or `/`-separated directory sequences; `*` is allowed.
  #[serde(default)]
  pub dirs: Vec<String>,

  /// Exact file names or `*` patterns.
  #[serde(default)]
  pub files: Vec<String>,
}

/// Main configuration struct for sage-headers.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  /// Profile to use when `--profile` is not given.
  pub profile: Option<Profile>,

  /// Template directory, relative to the run root.
  pub template_dir: Option<PathBuf>,

  /// Size ceiling in bytes.
  pub max_file_size: Option<u64>,

  /// Number of leading bytes searched for an existing header.
  pub header_scan_bytes: Option<usize>,

  /// How files carrying a third-party license are treated.
  pub foreign_licenses: Option<ForeignLicensePolicy>,

  /// Glob patterns of files to ignore.
  pub ignore: Vec<String>,

  /// Extension mappings, without the leading dot. These win over the
  /// built-in tables.
  pub extensions: BTreeMap<String, CommentStyleId>,

  /// Exact filename mappings. These win over the built-in tables.
  pub filenames: BTreeMap<String, CommentStyleId>,

  /// Extra exclusions.
  pub exclude: ExcludeConfig,

  /// Extra regexes that identify this project's header.
  pub license_patterns: Vec<String>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{}': {source}", path.display())]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{}': {source}", path.display())]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// An extension key starts with a dot.
  #[error("Invalid extension '{extension}': extension should not include leading dot")]
  InvalidExtension { extension: String },

  /// A license pattern is not a valid regex.
  #[error("Invalid license pattern '{pattern}': {source}")]
  InvalidPattern { pattern: String, source: regex::Error },

  /// `header-scan-bytes` is zero.
  #[error("header-scan-bytes must be greater than zero")]
  ZeroScanSize,
}

impl Config {
  /// Load configuration from a file.
  ///
  /// # Errors
  ///
  /// Returns a [`ConfigError`] if the file cannot be read, is not valid TOML
  /// or fails validation.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    config.validate()?;

    verbose_log!(
      "Loaded {} extension and {} filename overrides",
      config.extensions.len(),
      config.filenames.len()
    );

    Ok(config)
  }

  /// Validate the configuration.
  ///
  /// Checks that:
  /// - Extension keys don't include the leading dot
  /// - Every license pattern compiles
  /// - The scan size is not zero
  fn validate(&self) -> Result<(), ConfigError> {
    if let Some(extension) = self.extensions.keys().find(|ext| ext.starts_with('.')) {
      return Err(ConfigError::InvalidExtension {
        extension: extension.clone(),
      });
    }

    for pattern in &self.license_patterns {
      RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
          pattern: pattern.clone(),
          source,
        })?;
    }

    if self.header_scan_bytes == Some(0) {
      return Err(ConfigError::ZeroScanSize);
    }

    Ok(())
  }

  /// Builds the rules of `profile` with this configuration applied on top.
  pub fn build_rule_set(&self, profile: Profile) -> RuleSet {
    let mut rules = RuleSet::with_overrides(profile, &self.extensions, &self.filenames);

    if let Some(max_file_size) = self.max_file_size {
      rules.max_file_size = max_file_size;
    }
    if let Some(header_scan_bytes) = self.header_scan_bytes {
      rules.header_scan_bytes = header_scan_bytes;
    }
    if let Some(policy) = self.foreign_licenses {
      rules.foreign_policy = policy;
    }
    for dir in &self.exclude.dirs {
      rules.exclusions.add_dir(dir);
    }
    for file in &self.exclude.files {
      rules.exclusions.add_file(file);
    }
    rules.project_patterns.extend(self.license_patterns.iter().cloned());

    rules
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `SAGE_HEADERS_CONFIG` environment variable
/// 3. `.sage-headers.toml` in the run root
///
/// An explicit path is returned even if it does not exist, so that loading it
/// reports the problem.
pub fn discover_config_path(explicit_path: Option<&Path>, root: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    verbose_log!("Using explicit config path: {}", path.display());
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
    && !env_path.is_empty()
  {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let root_config = root.join(DEFAULT_CONFIG_FILENAME);
  if root_config.is_file() {
    verbose_log!("Using config: {}", root_config.display());
    return Some(root_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path, if any.
///
/// # Errors
///
/// Returns an error if a config file was found but could not be loaded.
pub fn load_config(explicit_path: Option<&Path>, root: &Path, no_config: bool) -> Result<Option<Config>> {
  if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
    return Ok(None);
  }

  match discover_config_path(explicit_path, root) {
    Some(path) => {
      let config = Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))?;
      Ok(Some(config))
    }
    None => Ok(None),
  }
}
