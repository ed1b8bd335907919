//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing.

mod check;

pub use check::{CheckArgs, RunOutcome, run_check};
use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

const LONG_VERSION: &str = concat!(
  env!("CARGO_PKG_VERSION"),
  " (",
  env!("GIT_HASH"),
  " ",
  env!("GIT_DATE"),
  ")"
);

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  name = "sage-headers",
  author,
  version,
  long_version = LONG_VERSION,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # Add missing license headers below the current directory
  sage-headers

  # Fail if any file is missing a header (for CI)
  sage-headers --check .

  # Show what would change without writing anything
  sage-headers --dry-run --show-diff src/

  # Create default templates, one per comment style
  sage-headers --init-templates

  # Only C-family sources, checked for a BSD 3-Clause notice
  sage-headers --profile basic --check kernel/

  # Report third-party licenses as conflicts
  sage-headers --check --foreign-licenses flag .
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(flatten)]
  pub check_args: CheckArgs,
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
