#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sage_headers::processor::{Processor, ProcessorConfig, RunMode};
use sage_headers::profile::{Profile, RuleSet};
use sage_headers::styles::CommentStyleId;
use sage_headers::templates::{LicenseData, TemplateStore};

/// Body used by most tests; renders to a one-line header.
pub const TEST_BODY: &str = "Copyright (c) {{year}} Test Project\n";

/// Year used by every test run.
pub const TEST_YEAR: &str = "2025";

/// Writes `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(path)
}

/// Creates `dir` with a template holding `body` for each of `styles`.
pub fn write_templates(dir: &Path, styles: &[CommentStyleId], body: &str) -> Result<()> {
  fs::create_dir_all(dir)?;
  for style in styles {
    fs::write(dir.join(style.template_file_name()), body)?;
  }
  Ok(())
}

/// Creates `dir` with [`TEST_BODY`] for every style and loads it.
pub fn full_template_store(dir: &Path) -> Result<TemplateStore> {
  write_templates(dir, &CommentStyleId::ALL, TEST_BODY)?;
  Ok(TemplateStore::load(dir)?)
}

/// A processor for the enhanced profile that knows the templates' fingerprints.
pub fn processor(mode: RunMode, templates: &TemplateStore) -> Result<Processor> {
  processor_with_rules(mode, RuleSet::new(Profile::Enhanced), templates)
}

pub fn processor_with_rules(mode: RunMode, rules: RuleSet, templates: &TemplateStore) -> Result<Processor> {
  Processor::new(ProcessorConfig {
    mode,
    template_fingerprints: templates.fingerprints(),
    ..ProcessorConfig::new(
      rules,
      LicenseData {
        year: TEST_YEAR.to_string(),
      },
    )
  })
}

/// Reads a file as a string.
pub fn read(path: &Path) -> Result<String> {
  fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
