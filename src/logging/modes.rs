use std::sync::atomic::{AtomicU8, Ordering};

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Global output mode shared by the [`verbose_log!`] and [`info_log!`] macros.
///
/// Starts out as `Normal` until [`set_verbose`] or [`set_quiet`] is called.
static OUTPUT_MODE: AtomicU8 = AtomicU8::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
  Normal = 0,
  Quiet = 1,
  Verbose = 2,
}

impl OutputMode {
  const fn from_u8(value: u8) -> Self {
    match value {
      1 => OutputMode::Quiet,
      2 => OutputMode::Verbose,
      _ => OutputMode::Normal,
    }
  }
}

/// When to emit ANSI colors on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
  /// Use colors when stdout is a terminal
  #[default]
  Auto,
  /// Never use colors
  Never,
  /// Always use colors
  Always,
}

impl ColorMode {
  /// Installs this mode as the process-wide owo-colors override.
  pub fn apply(self) {
    match self {
      ColorMode::Auto => owo_colors::unset_override(),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Always => owo_colors::set_override(true),
    }
  }
}

/// Sets the global verbose flag.
///
/// When verbose logging is enabled, the [`verbose_log!`] macro writes to
/// stderr and file lists are printed in full.
pub fn set_verbose() {
  OUTPUT_MODE.store(OutputMode::Verbose as u8, Ordering::SeqCst);
}

/// Sets the global quiet flag. Only errors and bare path lists are printed.
pub fn set_quiet() {
  OUTPUT_MODE.store(OutputMode::Quiet as u8, Ordering::SeqCst);
}

/// Returns `true` if verbose output is enabled.
pub fn is_verbose() -> bool {
  matches!(OutputMode::from_u8(OUTPUT_MODE.load(Ordering::SeqCst)), OutputMode::Verbose)
}

/// Returns `true` if quiet output is enabled.
pub fn is_quiet() -> bool {
  matches!(OutputMode::from_u8(OUTPUT_MODE.load(Ordering::SeqCst)), OutputMode::Quiet)
}

/// Maps the `-q` / `-v` flags onto a default tracing level.
const fn default_level(quiet: bool, verbose: u8) -> &'static str {
  if quiet {
    return "error";
  }
  match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the level derived from the CLI flags.
/// Diagnostics always go to stderr so stdout stays scriptable. Calling this
/// more than once is harmless; later calls are ignored.
pub fn init_tracing(quiet: bool, verbose: u8) {
  let level = default_level(quiet, verbose);
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("warn,sage_headers={level}")));

  let result = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .try_init();

  if result.is_err() {
    tracing::trace!("Tracing subscriber already installed");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_level_from_flags() {
    assert_eq!(default_level(true, 3), "error");
    assert_eq!(default_level(false, 0), "warn");
    assert_eq!(default_level(false, 1), "info");
    assert_eq!(default_level(false, 2), "debug");
    assert_eq!(default_level(false, 9), "trace");
  }

  #[test]
  fn test_output_mode_from_u8_defaults_to_normal() {
    assert_eq!(OutputMode::from_u8(0), OutputMode::Normal);
    assert_eq!(OutputMode::from_u8(1), OutputMode::Quiet);
    assert_eq!(OutputMode::from_u8(2), OutputMode::Verbose);
    assert_eq!(OutputMode::from_u8(42), OutputMode::Normal);
  }
}
