//! Lexical analysis of Datadog metric queries
//!
//! This module decides whether a query is a single metric reference or a composite
//! expression, and breaks composite expressions apart into the metric references they
//! are built from so that each one can be validated on its own.
//!
//! # Implementation Model
//!
//! The analysis is deliberately lexical. There is no grammar and no AST; instead a few
//! small scanners cooperate:
//!
//! - [`find_matching_paren`] balances parentheses with a depth counter, and [`Delimiters`]
//!   pairs every parenthesis of a query up front so the scanners below stay linear.
//! - [`unwrap_wrapper`] peels `default_zero(...)` layers off an expression and counts them.
//! - [`is_composite`] looks for arithmetic operators outside tag-filter braces and for
//!   more than one aggregation prefix.
//! - [`extract_metrics`] finds every wrapped call, then every bare metric reference that
//!   is not already part of a wrapped call.
//!
//! [`analyze`] ties these together and produces a [`QueryAnalysis`].
//!
//! Nothing here can fail. Malformed input degrades to a best-effort answer, and the
//! metrics backend is left to report the actual syntax error.

mod analysis;
mod classifier;
mod covered_spans;
mod delimiters;
mod extractor;
mod metric_scanner;
mod wrapper;

pub use analysis::{MetricSpan, QueryAnalysis, analyze};
pub use classifier::is_composite;
pub use covered_spans::CoveredSpans;
pub use delimiters::{Delimiters, find_matching_paren};
pub use extractor::extract_metrics;
pub use wrapper::{unwrap_wrapper, wrapper_call_open_paren};

/// Name of the function that substitutes zero when its argument has no data.
pub const WRAPPER_FUNCTION: &str = "default_zero";

/// Aggregation keywords that introduce a metric reference (each is followed by `:`).
pub const AGGREGATION_PREFIXES: [&str; 7] = ["avg", "sum", "count", "min", "max", "rate", "gauge"];

/// Returns `true` for bytes that may appear in an identifier.
const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
