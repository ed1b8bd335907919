//! # File I/O Module
//!
//! This module provides file reading and writing utilities for the processor.
//! It encapsulates synchronous file operations.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read as _, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::trace;

/// Attempts at finding an unused temporary file name before giving up.
const TEMP_NAME_ATTEMPTS: u32 = 32;

/// File I/O operations for the processor.
///
/// This struct provides static methods for reading and writing files.
pub struct FileIO;

impl FileIO {
  /// Reads up to `limit` bytes from the start of a file and decodes them
  /// lossily.
  ///
  /// Invalid UTF-8 sequences, including one cut in half by the limit, become
  /// U+FFFD instead of failing the read.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be opened or read.
  pub fn read_header_prefix(path: &Path, limit: usize) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    file
      .take(limit as u64)
      .read_to_end(&mut buf)
      .with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
  }

  /// Read full file content as raw bytes.
  pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
  }

  /// Replaces the content of `path` atomically.
  ///
  /// The data is written to a fresh temporary file next to `path`, synced,
  /// given the original file's permissions and renamed over `path`. If any
  /// step fails the temporary file is removed and `path` is left untouched.
  ///
  /// A rename only needs write access to the directory, so `path` itself is
  /// opened for writing first. A file the user may not write is refused
  /// rather than replaced.
  ///
  /// # Errors
  ///
  /// Returns an error if `path` is not writable, if the temporary file cannot
  /// be created or written, or if the final rename fails.
  pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    ensure_writable(path)?;
    let permissions = fs::metadata(path).ok().map(|metadata| metadata.permissions());
    let (temp, mut file) = create_temp_sibling(path)?;

    let result = (|| -> Result<()> {
      file
        .write_all(content)
        .with_context(|| format!("Failed to write temporary file: {}", temp.display()))?;
      file
        .sync_all()
        .with_context(|| format!("Failed to sync temporary file: {}", temp.display()))?;
      drop(file);

      if let Some(permissions) = permissions {
        fs::set_permissions(&temp, permissions)
          .with_context(|| format!("Failed to copy permissions to {}", temp.display()))?;
      }

      fs::rename(&temp, path).with_context(|| format!("Failed to replace {}", path.display()))
    })();

    if result.is_err() {
      let _ = fs::remove_file(&temp);
    } else {
      trace!("Wrote {} atomically", path.display());
    }
    result
  }
}

/// Opens `path` for writing without truncating it and closes it again.
fn ensure_writable(path: &Path) -> Result<()> {
  OpenOptions::new()
    .write(true)
    .open(path)
    .map(drop)
    .with_context(|| format!("File is not writable: {}", path.display()))
}

fn create_temp_sibling(path: &Path) -> Result<(PathBuf, File)> {
  let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("file");
  let pid = std::process::id();

  for attempt in 0..TEMP_NAME_ATTEMPTS {
    let temp = path.with_file_name(format!(".{file_name}.sagehdr.{pid}.{attempt}"));
    match OpenOptions::new().write(true).create_new(true).open(&temp) {
      Ok(file) => return Ok((temp, file)),
      Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
      Err(e) => {
        return Err(e).with_context(|| format!("Failed to create temporary file: {}", temp.display()));
      }
    }
  }

  bail!("No free temporary file name next to {}", path.display())
}
