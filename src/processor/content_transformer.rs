//! # Content Transformer Module
//!
//! This module splices a rendered header into file content.
//!
//! Content is handled as raw bytes so that every original byte survives the
//! splice unchanged, whatever its encoding. Structural prefixes that must stay
//! first in the file are kept ahead of the header:
//! - a UTF-8 byte order mark
//! - a `#!` interpreter line
//! - an `<?xml ... ?>` prologue (XML-capable kinds only)
//! - a `<!DOCTYPE ...>` declaration (DOCTYPE-capable kinds only)

use crate::classifier::MarkupKind;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where the header goes relative to the original content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplicePoint {
  /// After the interpreter line, which ends at `line_end` (exclusive).
  Shebang { line_end: usize, has_newline: bool },
  /// Right after a declaration that ends at `end` (exclusive).
  Declaration { end: usize },
  /// At the very top.
  Top,
}

/// Content transformation utilities for header insertion.
pub struct ContentTransformer;

impl ContentTransformer {
  /// Returns `original` with `header` spliced in.
  ///
  /// `header` is expected to end with a newline. The caller is responsible
  /// for checking that the content does not already carry a header.
  ///
  /// # Parameters
  ///
  /// * `original` - The file content
  /// * `header` - The rendered header
  /// * `kind` - Which markup declarations are recognized
  pub fn insert_header(original: &[u8], header: &str, kind: MarkupKind) -> Vec<u8> {
    let (bom, body) = match original.strip_prefix(UTF8_BOM) {
      Some(rest) => (UTF8_BOM, rest),
      None => (&[][..], original),
    };

    let mut out = Vec::with_capacity(original.len() + header.len() + 2);
    out.extend_from_slice(bom);

    match find_splice_point(body, kind) {
      SplicePoint::Shebang { line_end, has_newline } => {
        out.extend_from_slice(&body[..line_end]);
        if !has_newline {
          out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(header.as_bytes());
        let rest = &body[line_end..];
        if !rest.is_empty() {
          out.push(b'\n');
          out.extend_from_slice(rest);
        }
      }
      SplicePoint::Declaration { end } => {
        out.extend_from_slice(&body[..end]);
        out.push(b'\n');
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&body[end..]);
      }
      SplicePoint::Top => {
        out.extend_from_slice(header.as_bytes());
        if !body.is_empty() {
          out.push(b'\n');
          out.extend_from_slice(body);
        }
      }
    }

    out
  }
}

fn find_splice_point(body: &[u8], kind: MarkupKind) -> SplicePoint {
  if body.starts_with(b"#!") {
    return match body.iter().position(|&byte| byte == b'\n') {
      Some(newline) => SplicePoint::Shebang {
        line_end: newline + 1,
        has_newline: true,
      },
      None => SplicePoint::Shebang {
        line_end: body.len(),
        has_newline: false,
      },
    };
  }

  let start = body.iter().position(|byte| !byte.is_ascii_whitespace()).unwrap_or(body.len());
  let trimmed = &body[start..];

  if kind.xml_prologue
    && trimmed.starts_with(b"<?xml")
    && let Some(close) = find(trimmed, b"?>")
  {
    return SplicePoint::Declaration { end: start + close + 2 };
  }

  if kind.doctype
    && trimmed.len() >= 9
    && trimmed[..9].eq_ignore_ascii_case(b"<!doctype")
    && let Some(close) = doctype_close(trimmed)
  {
    return SplicePoint::Declaration { end: start + close + 1 };
  }

  SplicePoint::Top
}

/// Offset of the `>` that closes a DOCTYPE declaration. A `>` inside quotes
/// or inside the `[...]` internal subset does not count.
fn doctype_close(declaration: &[u8]) -> Option<usize> {
  let mut quote = None;
  let mut depth = 0usize;

  for (offset, &byte) in declaration.iter().enumerate() {
    match (quote, byte) {
      (Some(open), _) if byte == open => quote = None,
      (Some(_), _) => {}
      (None, b'"' | b'\'') => quote = Some(byte),
      (None, b'[') => depth += 1,
      (None, b']') => depth = depth.saturating_sub(1),
      (None, b'>') if depth == 0 => return Some(offset),
      _ => {}
    }
  }
  None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  haystack.windows(needle.len()).position(|window| window == needle)
}
