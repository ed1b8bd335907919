use std::fs;

use anyhow::Result;
use sage_headers::license_detection::{HeaderStatus, LicenseDetector, PatternLicenseDetector};
use sage_headers::styles::CommentStyleId;
use sage_headers::templates::{DEFAULT_BODY, LicenseData, TemplateError, TemplateStore};
use tempfile::tempdir;

fn data(year: &str) -> LicenseData {
  LicenseData { year: year.to_string() }
}

#[test]
fn test_bootstrap_then_render_every_style() -> Result<()> {
  let temp_dir = tempdir()?;
  let dir = temp_dir.path().join(".github/license-templates");

  let created = TemplateStore::bootstrap(&dir)?;
  assert_eq!(created.len(), CommentStyleId::ALL.len());

  let store = TemplateStore::load(&dir)?;
  store.ensure_available(&CommentStyleId::ALL)?;

  for style in CommentStyleId::ALL {
    let header = store.render(style, &data("2031"))?;
    assert!(header.contains("Copyright (c) 2031"), "{style:?}: {header}");
    assert!(!header.contains("{{year}}"));
    assert!(header.ends_with('\n'));
  }
  Ok(())
}

#[test]
fn test_bootstrap_keeps_customized_templates() -> Result<()> {
  let temp_dir = tempdir()?;
  let dir = temp_dir.path();
  let custom = dir.join(CommentStyleId::HashStyle.template_file_name());
  fs::write(&custom, "Custom {{year}}\n")?;

  let created = TemplateStore::bootstrap(dir)?;

  assert_eq!(created.len(), CommentStyleId::ALL.len() - 1);
  assert!(!created.contains(&custom));
  assert_eq!(fs::read_to_string(&custom)?, "Custom {{year}}\n");
  Ok(())
}

#[test]
fn test_rendered_headers_by_style() -> Result<()> {
  let temp_dir = tempdir()?;
  let dir = temp_dir.path();
  for style in CommentStyleId::ALL {
    fs::write(dir.join(style.template_file_name()), "Line one {{year}}\n\nLine three\n")?;
  }
  let store = TemplateStore::load(dir)?;
  let year = data("2025");

  assert_eq!(
    store.render(CommentStyleId::CStyle, &year)?,
    "/*\n * Line one 2025\n *\n * Line three\n */\n"
  );
  assert_eq!(
    store.render(CommentStyleId::HashStyle, &year)?,
    "# Line one 2025\n#\n# Line three\n"
  );
  assert_eq!(
    store.render(CommentStyleId::BatchStyle, &year)?,
    "REM Line one 2025\nREM\nREM Line three\n"
  );
  assert_eq!(
    store.render(CommentStyleId::TextStyle, &year)?,
    "Line one 2025\n\nLine three\n"
  );
  Ok(())
}

#[test]
fn test_missing_directory_is_only_fatal_when_needed() -> Result<()> {
  let temp_dir = tempdir()?;
  let store = TemplateStore::load(&temp_dir.path().join("absent"))?;

  store.ensure_available(&[])?;
  assert!(matches!(
    store.ensure_available(&[CommentStyleId::CStyle]),
    Err(TemplateError::MissingDirectory { .. })
  ));
  Ok(())
}

#[test]
fn test_rendered_default_header_is_detected() -> Result<()> {
  let temp_dir = tempdir()?;
  let dir = temp_dir.path();
  TemplateStore::bootstrap(dir)?;
  let store = TemplateStore::load(dir)?;

  let detector = PatternLicenseDetector::new(&store.fingerprints(), &[])?;
  for style in [CommentStyleId::CStyle, CommentStyleId::LuaStyle, CommentStyleId::VimStyle] {
    let header = store.render(style, &data("2019"))?;
    assert_eq!(detector.detect(&header), HeaderStatus::Project, "{style:?}");
  }
  assert!(DEFAULT_BODY.contains("{{year}}"));
  Ok(())
}
