use std::fs;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::tempdir;

mod common;
use common::{read, write_file};

fn sage_headers() -> Result<Command> {
  let mut cmd = Command::cargo_bin("sage-headers")?;
  cmd.env_remove("RUST_LOG").env_remove("SAGE_HEADERS_CONFIG");
  Ok(cmd)
}

#[test]
fn test_check_exit_codes() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "ok.c", "/* SPDX-License-Identifier: BSD-3-Clause */\nint x;\n")?;

  sage_headers()?
    .arg("--check")
    .arg(root)
    .assert()
    .success()
    .stdout(predicate::str::contains("All files have license headers."));

  write_file(root, "new.py", "print(1)\n")?;

  sage_headers()?
    .arg("--check")
    .arg(root)
    .assert()
    .code(1)
    .stdout(predicate::str::contains("new.py"))
    .stdout(predicate::str::contains("Run without --check"));
  Ok(())
}

#[test]
fn test_quiet_check_lists_only_paths() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, "a.py", "print(1)\n")?;
  write_file(root, "sub/b.c", "int x;\n")?;
  write_file(root, "sub/c.sh", "# SPDX-License-Identifier: MIT\necho\n")?;

  let output = sage_headers()?.args(["--check", "--quiet"]).arg(root).output()?;

  assert_eq!(output.status.code(), Some(1));
  assert_eq!(String::from_utf8(output.stdout)?, "a.py\nsub/b.c\n");
  Ok(())
}

#[test]
fn test_missing_template_dir_is_fatal_and_touches_nothing() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  let file = write_file(root, "a.py", "print(1)\n")?;

  sage_headers()?
    .arg(root)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Template directory not found"));

  assert_eq!(read(&file)?, "print(1)\n");
  Ok(())
}

#[test]
fn test_init_templates_then_add_headers() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  let py = write_file(root, "tool.py", "#!/usr/bin/env python3\nprint(1)\n")?;
  let c = write_file(root, "src/kernel.c", "void kmain(void) {}\n")?;

  sage_headers()?
    .arg("--init-templates")
    .arg(root)
    .assert()
    .success()
    .stdout(predicate::str::contains("c-style.txt"));
  assert!(root.join(".github/license-templates/hash-style.txt").is_file());

  sage_headers()?.args(["--year", "2031"]).arg(root).assert().success();

  let py_content = read(&py)?;
  assert!(py_content.starts_with("#!/usr/bin/env python3\n\n# "));
  assert!(py_content.contains("Copyright (c) 2031"));
  assert!(py_content.ends_with("\nprint(1)\n"));
  assert!(read(&c)?.starts_with("/*\n"));

  // Templates under .github are never headered themselves.
  let template = read(&root.join(".github/license-templates/text-style.txt"))?;
  assert!(template.contains("{{year}}"));

  sage_headers()?.arg("--check").arg(root).assert().success();
  Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  let file = write_file(root, "a.py", "print(1)\n")?;
  let diff_path = temp_dir.path().join("changes.diff");

  sage_headers()?.arg("--init-templates").arg(root).assert().success();
  sage_headers()?
    .arg("--dry-run")
    .arg("--save-diff")
    .arg(&diff_path)
    .arg(root)
    .assert()
    .success()
    .stdout(predicate::str::contains("would get a license header"));

  assert_eq!(read(&file)?, "print(1)\n");
  assert!(read(&diff_path)?.contains("+# "));
  Ok(())
}

#[test]
fn test_list_supported() -> Result<()> {
  sage_headers()?
    .arg("--list-supported")
    .assert()
    .success()
    .stdout(predicate::str::contains("c-style"))
    .stdout(predicate::str::contains(".c"))
    .stdout(predicate::str::contains("Makefile"));

  sage_headers()?
    .args(["--list-supported", "--profile", "basic"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Makefile").not());
  Ok(())
}

#[test]
fn test_invalid_config_is_fatal() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, ".sage-headers.toml", "unknown-key = true\n")?;
  write_file(root, "a.py", "print(1)\n")?;

  sage_headers()?.arg("--check").arg(root).assert().code(1).stderr(predicate::str::contains("ERROR"));

  sage_headers()?
    .args(["--check", "--no-config"])
    .arg(root)
    .assert()
    .code(1)
    .stdout(predicate::str::contains("a.py"));
  Ok(())
}

#[test]
fn test_config_extension_override() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, ".sage-headers.toml", "[extensions]\ncustom = \"hash-style\"\n")?;
  write_file(root, "job.custom", "run\n")?;

  sage_headers()?
    .args(["--check", "--quiet"])
    .arg(root)
    .assert()
    .code(1)
    .stdout(".sage-headers.toml\njob.custom\n");
  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path().join("repo");
  write_file(&root, "a.py", "print(1)\n")?;
  let report_path = temp_dir.path().join("report.json");

  sage_headers()?
    .arg("--check")
    .arg("--report-json")
    .arg(&report_path)
    .arg(&root)
    .assert()
    .code(1);

  let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
  assert_eq!(report["files"][0]["path"], "a.py");
  assert_eq!(report["files"][0]["result"]["status"], "header-missing");
  Ok(())
}

#[test]
fn test_not_a_directory() -> Result<()> {
  let temp_dir = tempdir()?;
  let file = write_file(temp_dir.path(), "a.py", "print(1)\n")?;

  sage_headers()?
    .arg(&file)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Not a directory"));
  Ok(())
}
