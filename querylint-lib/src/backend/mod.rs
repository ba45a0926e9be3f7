//! Talking to the metrics backend
//!
//! A query is validated by running it against the timeseries endpoint over a short
//! window. The backend either refuses it, runs it and returns nothing, or runs it and
//! returns points; see [`QueryOutcome`].
//!
//! All requests from one [`MetricsClient`] (and its clones) share a [`Throttler`], which
//! bounds concurrency and lets a rate-limited request pause the others.

mod client;
mod query_outcome;
mod resilient_http;
mod throttler;

pub use client::{ClientOptions, MetricsClient};
pub use query_outcome::QueryOutcome;
pub use resilient_http::RetryPolicy;
pub use throttler::Throttler;
