//! # Classifier Module
//!
//! Maps a file to the comment style its header must use.
//!
//! Lookup is an explicit ordered priority:
//! 1. exact special file name (`Makefile`, `CMakeLists.txt`, ...)
//! 2. lowercase extension
//! 3. for extensionless executables only, the interpreter named by a `#!` line
//!
//! The [`ExtensionMap`] is first-wins: a key can be registered once, and later
//! registrations of the same key are rejected. Overrides are therefore applied
//! by registering them before the built-in tables.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufRead as _, BufReader, Read as _};
use std::path::Path;

use tracing::{debug, trace};

use crate::styles::CommentStyleId;

/// Upper bound on how much of a file is read when looking for a shebang line.
const SHEBANG_READ_LIMIT: u64 = 1024;

/// Ordered lookup table from file names and extensions to comment styles.
#[derive(Debug, Clone, Default)]
pub struct ExtensionMap {
  filenames: HashMap<String, CommentStyleId>,
  extensions: HashMap<String, CommentStyleId>,
}

impl ExtensionMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers an extension (without the leading dot). Matching is
  /// case-insensitive.
  ///
  /// Returns `false` if the extension was already registered; the existing
  /// mapping is kept.
  pub fn register_extension(&mut self, extension: &str, style: CommentStyleId) -> bool {
    let key = extension.trim_start_matches('.').to_lowercase();
    register(&mut self.extensions, key, style, "extension")
  }

  /// Registers an exact file name such as `Makefile`. Matching is
  /// case-sensitive.
  ///
  /// Returns `false` if the name was already registered; the existing mapping
  /// is kept.
  pub fn register_filename(&mut self, name: &str, style: CommentStyleId) -> bool {
    register(&mut self.filenames, name.to_string(), style, "file name")
  }

  pub fn lookup_filename(&self, name: &str) -> Option<CommentStyleId> {
    self.filenames.get(name).copied()
  }

  pub fn lookup_extension(&self, extension: &str) -> Option<CommentStyleId> {
    self.extensions.get(&extension.to_lowercase()).copied()
  }

  /// Registered extensions, sorted by style and then by extension.
  pub fn extensions(&self) -> Vec<(&str, CommentStyleId)> {
    sorted_entries(&self.extensions)
  }

  /// Registered special file names, sorted by style and then by name.
  pub fn filenames(&self) -> Vec<(&str, CommentStyleId)> {
    sorted_entries(&self.filenames)
  }

  pub fn len(&self) -> usize {
    self.extensions.len() + self.filenames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn register(table: &mut HashMap<String, CommentStyleId>, key: String, style: CommentStyleId, kind: &str) -> bool {
  match table.entry(key) {
    Entry::Occupied(existing) => {
      debug!(
        "Ignoring duplicate {} mapping '{}' -> {} (already mapped to {})",
        kind,
        existing.key(),
        style,
        existing.get()
      );
      false
    }
    Entry::Vacant(slot) => {
      slot.insert(style);
      true
    }
  }
}

fn sorted_entries(table: &HashMap<String, CommentStyleId>) -> Vec<(&str, CommentStyleId)> {
  let mut entries: Vec<_> = table.iter().map(|(key, style)| (key.as_str(), *style)).collect();
  entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
  entries
}

/// Structural prefixes a file kind may carry ahead of its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkupKind {
  /// The file may start with an `<?xml ... ?>` prologue.
  pub xml_prologue: bool,
  /// The file may start with a `<!DOCTYPE ...>` declaration.
  pub doctype: bool,
}

impl MarkupKind {
  /// Neither prologue nor DOCTYPE is recognized.
  pub const PLAIN: MarkupKind = MarkupKind {
    xml_prologue: false,
    doctype: false,
  };

  /// Derives the markup kind from a path's extension.
  pub fn from_path(path: &Path) -> Self {
    let extension = path
      .extension()
      .and_then(|ext| ext.to_str())
      .unwrap_or("")
      .to_lowercase();

    Self {
      xml_prologue: matches!(
        extension.as_str(),
        "xml" | "html" | "xhtml" | "svg" | "xsl" | "xslt" | "xaml"
      ),
      doctype: matches!(extension.as_str(), "html" | "htm" | "xhtml"),
    }
  }
}

/// Resolves the comment style of a file.
#[derive(Debug, Clone)]
pub struct Classifier {
  map: ExtensionMap,
}

impl Classifier {
  pub const fn new(map: ExtensionMap) -> Self {
    Self { map }
  }

  pub const fn extension_map(&self) -> &ExtensionMap {
    &self.map
  }

  /// Returns the comment style for `path`, or `None` if the file type is not
  /// supported.
  ///
  /// Only the shebang fallback touches the file system, and it reads at most
  /// the first line.
  pub fn classify(&self, path: &Path) -> Option<CommentStyleId> {
    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");

    if let Some(style) = self.map.lookup_filename(file_name) {
      trace!("{}: special file name -> {}", path.display(), style);
      return Some(style);
    }

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(extension) => self.map.lookup_extension(extension),
      None if is_executable(path) => {
        let style = read_first_line(path).as_deref().and_then(style_for_shebang);
        trace!("{}: shebang fallback -> {:?}", path.display(), style);
        style
      }
      None => None,
    }
  }
}

/// Infers a comment style from a `#!` interpreter line.
pub fn style_for_shebang(first_line: &str) -> Option<CommentStyleId> {
  let line = first_line.trim();
  if !line.starts_with("#!") {
    return None;
  }

  if line.contains("python") || ["bash", "sh", "zsh", "fish"].iter().any(|shell| line.contains(shell)) {
    Some(CommentStyleId::HashStyle)
  } else if line.contains("node") {
    Some(CommentStyleId::CppStyle)
  } else {
    None
  }
}

fn read_first_line(path: &Path) -> Option<String> {
  let file = File::open(path).ok()?;
  let mut reader = BufReader::new(file.take(SHEBANG_READ_LIMIT));
  let mut line = Vec::new();
  reader.read_until(b'\n', &mut line).ok()?;
  Some(String::from_utf8_lossy(&line).into_owned())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt as _;

  std::fs::metadata(path)
    .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
  false
}
