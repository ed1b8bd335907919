//! # Logging Module
//!
//! Logging utilities for sage-headers:
//! - Verbose logging that can be enabled/disabled
//! - Standard info logging with color support
//! - Structured diagnostics through `tracing`
//!
//! Verbose logs go to stderr and info logs go to stdout so the tool composes
//! well in pipelines.
//!
//! ## Example
//!
//! ```rust
//! use sage_headers::logging::{ColorMode, set_verbose};
//! use sage_headers::{info_log, verbose_log};
//!
//! set_verbose();
//! ColorMode::Auto.apply();
//!
//! // Goes to stderr
//! verbose_log!("Processing file: {}", "kernel.c");
//!
//! // Goes to stdout
//! info_log!("Added license header to: {}", "kernel.c");
//! ```

mod modes;

pub use modes::{ColorMode, init_tracing, is_quiet, is_verbose, set_quiet, set_verbose};
use owo_colors::{OwoColorize, Stream};

/// Logs a message to stderr if verbose mode is enabled.
///
/// Uses the same format string syntax as [`eprintln!`].
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)*) => {
        if $crate::logging::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

/// Logs a message to stdout unless quiet mode is enabled.
///
/// Uses the same format string syntax as [`println!`].
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        if !$crate::logging::is_quiet() {
            $crate::logging::print_info_log(&format!($($arg)*));
        }
    };
}

/// Prints an info message, yellow when colors are enabled.
///
/// Used by the [`info_log!`] macro.
pub fn print_info_log(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |m| m.yellow()));
}
