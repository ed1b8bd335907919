//! # Templates Module
//!
//! This module loads license header templates and renders them for a comment
//! style.
//!
//! A template directory holds one plain-text body per comment style, named
//! `<style-id>.txt` (for example `c-style.txt`). Bodies contain no comment
//! delimiters; [`CommentStyle::render`](crate::styles::CommentStyle::render)
//! wraps them. The `{{year}}` placeholder is substituted before rendering.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use sage_headers::styles::CommentStyleId;
//! use sage_headers::templates::{LicenseData, TemplateStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = TemplateStore::load(Path::new(".github/license-templates"))?;
//! store.ensure_available(&[CommentStyleId::CStyle])?;
//!
//! let data = LicenseData {
//!   year: "2025".to_string(),
//! };
//! let header = store.render(CommentStyleId::CStyle, &data)?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::license_detection::fingerprint;
use crate::styles::CommentStyleId;
use crate::verbose_log;

/// Template directory used when none is given, relative to the run root.
pub const DEFAULT_TEMPLATE_DIR: &str = ".github/license-templates";

/// Placeholder replaced by [`LicenseData::year`].
pub const YEAR_PLACEHOLDER: &str = "{{year}}";

/// Body written by [`TemplateStore::bootstrap`].
pub const DEFAULT_BODY: &str = "\
─────────────────────────────────────────────────────────────────────────────
SAGE OS — Copyright (c) {{year}} Ashish Vasant Yesale (ashishyesale007@gmail.com)
SPDX-License-Identifier: BSD-3-Clause OR Proprietary
SAGE OS is dual-licensed under the BSD 3-Clause License and a Commercial License.

This file is part of the SAGE OS Project.
─────────────────────────────────────────────────────────────────────────────
";

/// Data used to fill out a license template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseData {
  /// The copyright year to use in the license
  pub year: String,
}

/// Errors that make a run impossible before any file is touched.
#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("Template directory not found: {}", dir.display())]
  MissingDirectory { dir: PathBuf },

  #[error("No template for {} in {} (run with --init-templates to create defaults)", format_styles(styles), dir.display())]
  MissingTemplates { dir: PathBuf, styles: Vec<CommentStyleId> },

  #[error("Failed to access template {}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

fn format_styles(styles: &[CommentStyleId]) -> String {
  styles.iter().map(|style| style.as_str()).collect::<Vec<_>>().join(", ")
}

/// Template bodies loaded from a directory, keyed by comment style.
#[derive(Debug, Clone)]
pub struct TemplateStore {
  dir: PathBuf,
  dir_exists: bool,
  bodies: BTreeMap<CommentStyleId, String>,
}

impl TemplateStore {
  /// Loads every `<style-id>.txt` found in `dir`.
  ///
  /// A missing directory is not an error here; it is reported by
  /// [`ensure_available`](Self::ensure_available) once it is known that a
  /// template is actually needed.
  ///
  /// # Errors
  ///
  /// Returns [`TemplateError::Io`] if a template file exists but cannot be
  /// read.
  pub fn load(dir: &Path) -> Result<Self, TemplateError> {
    let mut store = Self {
      dir: dir.to_path_buf(),
      dir_exists: dir.is_dir(),
      bodies: BTreeMap::new(),
    };

    if !store.dir_exists {
      debug!("Template directory {} does not exist", dir.display());
      return Ok(store);
    }

    for style in CommentStyleId::ALL {
      let path = dir.join(style.template_file_name());
      if !path.is_file() {
        continue;
      }
      let body = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
        path: path.clone(),
        source,
      })?;
      verbose_log!("Loaded template: {}", path.display());
      store.bodies.insert(style, body);
    }

    debug!("Loaded {} templates from {}", store.bodies.len(), dir.display());
    Ok(store)
  }

  /// Writes [`DEFAULT_BODY`] for every style whose template file is missing,
  /// creating `dir` if needed. Existing files are left untouched.
  ///
  /// # Returns
  ///
  /// The paths of the files that were created.
  ///
  /// # Errors
  ///
  /// Returns [`TemplateError::Io`] if the directory or a file cannot be
  /// created.
  pub fn bootstrap(dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    fs::create_dir_all(dir).map_err(|source| TemplateError::Io {
      path: dir.to_path_buf(),
      source,
    })?;

    let mut created = Vec::new();
    for style in CommentStyleId::ALL {
      let path = dir.join(style.template_file_name());
      if path.exists() {
        continue;
      }
      fs::write(&path, DEFAULT_BODY).map_err(|source| TemplateError::Io {
        path: path.clone(),
        source,
      })?;
      created.push(path);
    }

    Ok(created)
  }

  /// Fails unless a template exists for every style in `styles`.
  ///
  /// # Errors
  ///
  /// Returns [`TemplateError::MissingDirectory`] when the directory does not
  /// exist, or [`TemplateError::MissingTemplates`] naming every style without
  /// a template.
  pub fn ensure_available(&self, styles: &[CommentStyleId]) -> Result<(), TemplateError> {
    if styles.is_empty() {
      return Ok(());
    }
    if !self.dir_exists {
      return Err(TemplateError::MissingDirectory { dir: self.dir.clone() });
    }

    let mut missing: Vec<CommentStyleId> = styles
      .iter()
      .copied()
      .filter(|style| !self.bodies.contains_key(style))
      .collect();
    missing.sort();
    missing.dedup();

    if missing.is_empty() {
      Ok(())
    } else {
      Err(TemplateError::MissingTemplates {
        dir: self.dir.clone(),
        styles: missing,
      })
    }
  }

  /// Renders the template of `style` with `data` and wraps it in the style's
  /// comment delimiters.
  ///
  /// # Errors
  ///
  /// Returns [`TemplateError::MissingTemplates`] if no template is loaded for
  /// `style`.
  pub fn render(&self, style: CommentStyleId, data: &LicenseData) -> Result<String, TemplateError> {
    let body = self.bodies.get(&style).ok_or_else(|| TemplateError::MissingTemplates {
      dir: self.dir.clone(),
      styles: vec![style],
    })?;
    Ok(style.style().render(&body.replace(YEAR_PLACEHOLDER, &data.year)))
  }

  /// Detection patterns derived from every loaded template, deduplicated.
  pub fn fingerprints(&self) -> Vec<String> {
    let mut patterns: Vec<String> = self.bodies.values().filter_map(|body| fingerprint(body)).collect();
    patterns.sort();
    patterns.dedup();
    patterns
  }

  /// The directory templates were loaded from.
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Styles that have a template.
  pub fn styles(&self) -> impl Iterator<Item = CommentStyleId> + '_ {
    self.bodies.keys().copied()
  }
}

#[cfg(test)]
mod tests {
  use anyhow::Result;

  use super::*;

  fn data() -> LicenseData {
    LicenseData {
      year: "2025".to_string(),
    }
  }

  #[test]
  fn test_load_and_render() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    fs::write(temp_dir.path().join("hash-style.txt"), "SAGE OS header {{year}}\n")?;

    let store = TemplateStore::load(temp_dir.path())?;
    assert_eq!(store.styles().collect::<Vec<_>>(), vec![CommentStyleId::HashStyle]);
    assert_eq!(
      store.render(CommentStyleId::HashStyle, &data())?,
      "# SAGE OS header 2025\n"
    );
    Ok(())
  }

  #[test]
  fn test_missing_directory_reported_only_when_needed() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let store = TemplateStore::load(&temp_dir.path().join("absent"))?;

    store.ensure_available(&[])?;
    let err = store.ensure_available(&[CommentStyleId::CStyle]).unwrap_err();
    assert!(matches!(err, TemplateError::MissingDirectory { .. }));
    Ok(())
  }

  #[test]
  fn test_missing_templates_are_listed() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    fs::write(temp_dir.path().join("c-style.txt"), "body\n")?;
    let store = TemplateStore::load(temp_dir.path())?;

    let err = store
      .ensure_available(&[
        CommentStyleId::HashStyle,
        CommentStyleId::CStyle,
        CommentStyleId::CppStyle,
        CommentStyleId::HashStyle,
      ])
      .unwrap_err();
    match err {
      TemplateError::MissingTemplates { styles, .. } => {
        assert_eq!(styles, vec![CommentStyleId::CppStyle, CommentStyleId::HashStyle]);
      }
      other => panic!("unexpected error: {other}"),
    }
    assert!(store.render(CommentStyleId::CppStyle, &data()).is_err());
    Ok(())
  }

  #[test]
  fn test_bootstrap_keeps_existing_files() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let dir = temp_dir.path().join("templates");
    fs::create_dir(&dir)?;
    fs::write(dir.join("c-style.txt"), "custom\n")?;

    let created = TemplateStore::bootstrap(&dir)?;
    assert_eq!(created.len(), CommentStyleId::ALL.len() - 1);
    assert_eq!(fs::read_to_string(dir.join("c-style.txt"))?, "custom\n");
    assert_eq!(fs::read_to_string(dir.join("lua-style.txt"))?, DEFAULT_BODY);

    assert!(TemplateStore::bootstrap(&dir)?.is_empty());
    Ok(())
  }

  #[test]
  fn test_default_body_renders_as_project_header() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    TemplateStore::bootstrap(temp_dir.path())?;
    let store = TemplateStore::load(temp_dir.path())?;

    let header = store.render(CommentStyleId::CStyle, &data())?;
    let lines: Vec<&str> = header.lines().collect();
    assert_eq!(lines[0], "/*");
    assert!(lines[2].starts_with(" * SAGE OS — Copyright (c) 2025"));
    assert_eq!(lines[5], " *");
    assert_eq!(*lines.last().unwrap_or(&""), " */");

    assert_eq!(store.fingerprints().len(), 1);
    Ok(())
  }
}
