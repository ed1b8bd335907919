//! # sage-headers
//!
//! Inserts or verifies license headers across a source tree.

use std::process::ExitCode;

use owo_colors::{OwoColorize, Stream};
use sage_headers::cli::{Cli, run_check};

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse_args();

  match run_check(cli.check_args).await {
    Ok(outcome) => ExitCode::from(outcome.exit_code()),
    Err(e) => {
      eprintln!("{} {:#}", "ERROR:".if_supports_color(Stream::Stderr, |s| s.red()), e);
      ExitCode::FAILURE
    }
  }
}
