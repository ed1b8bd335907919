//! # Comment Styles Module
//!
//! The closed set of comment conventions sage-headers knows how to emit, and
//! the renderer that wraps header text in one of them.
//!
//! Every style is defined statically in [`BUILTIN_STYLES`] and never mutated.
//! A style is identified by a [`CommentStyleId`], whose kebab-case name is used
//! in template file names, in the config file and in `--list-supported`.
//!
//! ## Example
//!
//! ```rust
//! use sage_headers::styles::CommentStyleId;
//!
//! let header = CommentStyleId::HashStyle.style().render("SAGE OS header");
//! assert_eq!(header, "# SAGE OS header\n");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a comment convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentStyleId {
  CStyle,
  CppStyle,
  HashStyle,
  HtmlStyle,
  SqlStyle,
  LuaStyle,
  MatlabStyle,
  LatexStyle,
  VimStyle,
  LispStyle,
  HaskellStyle,
  ErlangStyle,
  FortranStyle,
  AdaStyle,
  PascalStyle,
  BatchStyle,
  PowershellStyle,
  MarkdownStyle,
  TextStyle,
}

impl CommentStyleId {
  /// All identifiers, in declaration order.
  pub const ALL: [CommentStyleId; 19] = [
    CommentStyleId::CStyle,
    CommentStyleId::CppStyle,
    CommentStyleId::HashStyle,
    CommentStyleId::HtmlStyle,
    CommentStyleId::SqlStyle,
    CommentStyleId::LuaStyle,
    CommentStyleId::MatlabStyle,
    CommentStyleId::LatexStyle,
    CommentStyleId::VimStyle,
    CommentStyleId::LispStyle,
    CommentStyleId::HaskellStyle,
    CommentStyleId::ErlangStyle,
    CommentStyleId::FortranStyle,
    CommentStyleId::AdaStyle,
    CommentStyleId::PascalStyle,
    CommentStyleId::BatchStyle,
    CommentStyleId::PowershellStyle,
    CommentStyleId::MarkdownStyle,
    CommentStyleId::TextStyle,
  ];

  /// The kebab-case name, e.g. `hash-style`.
  pub const fn as_str(self) -> &'static str {
    match self {
      CommentStyleId::CStyle => "c-style",
      CommentStyleId::CppStyle => "cpp-style",
      CommentStyleId::HashStyle => "hash-style",
      CommentStyleId::HtmlStyle => "html-style",
      CommentStyleId::SqlStyle => "sql-style",
      CommentStyleId::LuaStyle => "lua-style",
      CommentStyleId::MatlabStyle => "matlab-style",
      CommentStyleId::LatexStyle => "latex-style",
      CommentStyleId::VimStyle => "vim-style",
      CommentStyleId::LispStyle => "lisp-style",
      CommentStyleId::HaskellStyle => "haskell-style",
      CommentStyleId::ErlangStyle => "erlang-style",
      CommentStyleId::FortranStyle => "fortran-style",
      CommentStyleId::AdaStyle => "ada-style",
      CommentStyleId::PascalStyle => "pascal-style",
      CommentStyleId::BatchStyle => "batch-style",
      CommentStyleId::PowershellStyle => "powershell-style",
      CommentStyleId::MarkdownStyle => "markdown-style",
      CommentStyleId::TextStyle => "text-style",
    }
  }

  /// The static definition of this style.
  pub fn style(self) -> &'static CommentStyle {
    // BUILTIN_STYLES is declared in the same order as ALL.
    &BUILTIN_STYLES[self as usize]
  }

  /// File name of the template for this style, e.g. `hash-style.txt`.
  pub fn template_file_name(self) -> String {
    format!("{}.txt", self.as_str())
  }
}

impl fmt::Display for CommentStyleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Error returned when a string names no known comment style.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown comment style: '{0}'")]
pub struct ParseCommentStyleError(pub String);

impl FromStr for CommentStyleId {
  type Err = ParseCommentStyleError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_lowercase();
    CommentStyleId::ALL
      .into_iter()
      .find(|id| id.as_str() == wanted)
      .ok_or_else(|| ParseCommentStyleError(s.to_string()))
  }
}

/// The delimiters of a comment style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentShape {
  /// A block comment: an opening line, a per-line prefix and a closing line.
  Block {
    open: &'static str,
    middle: &'static str,
    close: &'static str,
  },
  /// A line comment: every line carries the same prefix.
  Line { prefix: &'static str },
  /// No delimiters at all; the text is emitted verbatim.
  Plain,
}

/// A comment convention, defined statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentStyle {
  pub id: CommentStyleId,
  pub description: &'static str,
  pub shape: CommentShape,
}

impl CommentStyle {
  const fn block(
    id: CommentStyleId,
    description: &'static str,
    open: &'static str,
    middle: &'static str,
    close: &'static str,
  ) -> Self {
    Self {
      id,
      description,
      shape: CommentShape::Block { open, middle, close },
    }
  }

  const fn line(id: CommentStyleId, description: &'static str, prefix: &'static str) -> Self {
    Self {
      id,
      description,
      shape: CommentShape::Line { prefix },
    }
  }

  /// Wraps `body` in this comment style.
  ///
  /// Line boundaries of the body are kept one to one. Empty lines get the
  /// right-trimmed prefix so no trailing whitespace is produced. Trailing line
  /// breaks of the body are not turned into extra comment lines, and the
  /// result always ends with exactly one `\n`.
  pub fn render(&self, body: &str) -> String {
    let body = body.trim_end_matches(['\n', '\r']);
    let mut lines: Vec<&str> = body.lines().collect();
    if lines.is_empty() {
      lines.push("");
    }

    let mut result = String::with_capacity(body.len() + lines.len() * 4 + 16);

    match self.shape {
      CommentShape::Block { open, middle, close } => {
        result.push_str(open);
        result.push('\n');
        push_prefixed(&mut result, &lines, middle);
        result.push_str(close);
        result.push('\n');
      }
      CommentShape::Line { prefix } => push_prefixed(&mut result, &lines, prefix),
      CommentShape::Plain => {
        for line in lines {
          result.push_str(line);
          result.push('\n');
        }
      }
    }

    result
  }
}

fn push_prefixed(out: &mut String, lines: &[&str], prefix: &str) {
  for line in lines {
    if line.is_empty() {
      out.push_str(prefix.trim_end());
    } else {
      out.push_str(prefix);
      out.push_str(line);
    }
    out.push('\n');
  }
}

/// Every built-in style, indexed by `CommentStyleId as usize`.
pub static BUILTIN_STYLES: [CommentStyle; 19] = [
  CommentStyle::block(CommentStyleId::CStyle, "C-style block comments", "/*", " * ", " */"),
  CommentStyle::line(CommentStyleId::CppStyle, "C++ style line comments", "// "),
  CommentStyle::line(CommentStyleId::HashStyle, "Hash style comments", "# "),
  CommentStyle::block(CommentStyleId::HtmlStyle, "HTML/XML style comments", "<!--", "", "-->"),
  CommentStyle::line(CommentStyleId::SqlStyle, "SQL style comments", "-- "),
  CommentStyle::block(CommentStyleId::LuaStyle, "Lua style comments", "--[[", "", "--]]"),
  CommentStyle::line(CommentStyleId::MatlabStyle, "MATLAB style comments", "% "),
  CommentStyle::line(CommentStyleId::LatexStyle, "LaTeX style comments", "% "),
  CommentStyle::line(CommentStyleId::VimStyle, "Vim script comments", "\" "),
  CommentStyle::line(CommentStyleId::LispStyle, "Lisp style comments", ";; "),
  CommentStyle::block(CommentStyleId::HaskellStyle, "Haskell style comments", "{-", "", "-}"),
  CommentStyle::line(CommentStyleId::ErlangStyle, "Erlang style comments", "% "),
  CommentStyle::line(CommentStyleId::FortranStyle, "Fortran style comments", "! "),
  CommentStyle::line(CommentStyleId::AdaStyle, "Ada style comments", "-- "),
  CommentStyle::block(CommentStyleId::PascalStyle, "Pascal style comments", "(*", "", "*)"),
  CommentStyle::line(CommentStyleId::BatchStyle, "Batch file comments", "REM "),
  CommentStyle::block(CommentStyleId::PowershellStyle, "PowerShell style comments", "<#", "", "#>"),
  CommentStyle::block(CommentStyleId::MarkdownStyle, "Markdown style comments", "<!--", "", "-->"),
  CommentStyle {
    id: CommentStyleId::TextStyle,
    description: "Plain text style",
    shape: CommentShape::Plain,
  },
];
