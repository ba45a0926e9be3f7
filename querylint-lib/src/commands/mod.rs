//! Command-line interface and orchestration for querylint
//!
//! This module implements the CLI commands and ties the query analysis, definition
//! loading and backend validation together. It handles argument parsing, configuration
//! management, and the high-level workflows.
//!
//! # Commands
//!
//! - **lint**: Load each metric definition, analyze its query, validate the query and
//!   every metric inside it against the metrics API, and print the findings. The process
//!   exits with the number of failures.
//! - **analyze**: Show how queries decompose into metrics, entirely offline
//! - **init**: Generate a default configuration file
//! - **validate**: Check configuration file syntax and values
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. Configuration lives in `querylint.toml`.

mod analyze;
mod common;
mod config;
mod host;
mod init;
mod lint;
mod run;
mod validate;

pub use analyze::{AnalyzeArgs, AnalyzeFormat, analyze_queries};
pub use common::{ColorMode, LogLevel};
pub use config::Config;
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use lint::{LintArgs, lint_files, render_reports};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
