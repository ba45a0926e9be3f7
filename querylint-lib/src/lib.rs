#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for querylint
//!
//! querylint checks the Datadog metric queries embedded in `DatadogMetric` definitions.
//! A query such as `default_zero(avg:m{*}) / sum:n{*}` can look healthy while one of its
//! metrics does not exist, because `default_zero` turns missing data into a flat zero.
//! The linter breaks each query into its metrics and validates every one separately.
//!
//! # Module Organization
//!
//! - [`query`]: Lexical analysis of queries (infallible, no I/O)
//! - [`definition`]: Loading queries from metric definition files
//! - [`backend`]: Client for the metrics query API
//! - [`validation`]: Per-file validation driver producing findings
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod backend;
pub mod definition;
pub mod query;
pub mod validation;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
