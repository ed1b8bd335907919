//! # sage-headers
//!
//! A tool that inserts or verifies license header comments across a source tree.
//!
//! `sage-headers` picks the comment syntax for each file from its extension, its
//! exact name or its shebang line, skips files that already carry a header and
//! never moves a shebang, an XML prologue or a DOCTYPE declaration away from the
//! top of a file.
//!
//! ## Features
//!
//! * Nineteen comment styles with per-style header templates
//! * Two built-in rule sets (`enhanced` and `basic`) plus TOML configuration
//! * Check-only mode for CI, dry runs with diffs, JSON reports
//! * Atomic writes, so an interrupted run never leaves a half-written file
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use sage_headers::processor::{Processor, ProcessorConfig, RunMode};
//! use sage_headers::profile::{Profile, RuleSet};
//! use sage_headers::templates::{LicenseData, TemplateStore};
//!
//! fn main() -> anyhow::Result<()> {
//!   let templates = TemplateStore::load(Path::new(".github/license-templates"))?;
//!   let processor = Processor::new(ProcessorConfig {
//!     mode: RunMode::CheckOnly,
//!     template_fingerprints: templates.fingerprints(),
//!     ..ProcessorConfig::new(
//!       RuleSet::new(Profile::Enhanced),
//!       LicenseData {
//!         year: "2025".to_string(),
//!       },
//!     )
//!   })?;
//!
//!   let report = processor.run(Path::new("."), &templates)?;
//!   if report.has_problems() {
//!     println!("Some files are missing license headers");
//!   }
//!   Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`styles`] - Comment styles and header rendering
//! * [`classifier`] - Mapping files to comment styles
//! * [`profile`] - Built-in rule sets
//! * [`templates`] - Template loading, bootstrapping and rendering
//! * [`processor`] - Walking, inspecting and splicing
//!
//! [`styles`]: crate::styles
//! [`classifier`]: crate::classifier
//! [`profile`]: crate::profile
//! [`templates`]: crate::templates
//! [`processor`]: crate::processor

pub mod classifier;
pub mod cli;
pub mod config;
pub mod diff;
pub mod file_filter;
pub mod ignore;
pub mod license_detection;
pub mod logging;
pub mod output;
pub mod processor;
pub mod profile;
pub mod report;
pub mod signal;
pub mod styles;
pub mod templates;
