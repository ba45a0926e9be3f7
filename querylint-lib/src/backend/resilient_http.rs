//! Retrying HTTP requests against the metrics backend.
//!
//! Wraps each request in a [`seatbelt`] retry layer so that transient failures
//! (connection errors, 5xx, rate limiting) are retried with exponential backoff. A
//! rate-limit response also pauses the shared [`Throttler`] so that concurrent
//! validations back off together.

use super::Throttler;
use core::time::Duration;
use layered::{Execute, Service, Stack};
use reqwest::{Client, Request, Response, StatusCode};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::{RecoveryInfo, ResilienceContext};
use std::sync::Arc;
use tick::Clock;

/// Delay used for 429 responses that carry no `Retry-After` header.
const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(5);

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries on top of the original attempt.
    pub max_retries: u32,

    /// Delay before the first retry; roughly doubled for every subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

/// Classify a response for retry purposes.
///
/// Only responses that name their own delay (429, or 403 with `Retry-After`) carry one.
fn recovery_for(result: &crate::Result<Response>) -> RecoveryInfo {
    match result {
        Err(_) => RecoveryInfo::retry(),
        Ok(resp) if resp.status().is_server_error() => RecoveryInfo::retry(),
        Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
            let delay = parse_retry_after(resp.headers()).map_or(DEFAULT_RATE_LIMIT_DELAY, Duration::from_secs);
            RecoveryInfo::retry().delay(delay)
        }

        // Datadog uses 403 for bad keys; only retry when told how long to wait.
        Ok(resp) if resp.status() == StatusCode::FORBIDDEN => parse_retry_after(resp.headers())
            .map_or_else(RecoveryInfo::never, |secs| RecoveryInfo::retry().delay(Duration::from_secs(secs))),
        Ok(_) => RecoveryInfo::never(),
    }
}

/// Send a request with retries, holding a throttler permit for each attempt.
///
/// Every attempt sends a fresh copy of `request`. The last response or error is returned
/// once retries are exhausted.
pub async fn resilient_send(
    policy: &RetryPolicy,
    throttler: &Arc<Throttler>,
    client: &Client,
    request: Request,
) -> crate::Result<Response> {
    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name("metrics_query");

    let pause = Arc::clone(throttler);
    let permits = Arc::clone(throttler);
    let client = client.clone();

    let service = (
        Retry::layer("retry", &context)
            .clone_input_with(|request: &mut Request, _| request.try_clone())
            .recovery_with(move |result: &crate::Result<Response>, _| {
                let recovery = recovery_for(result);
                if let Some(delay) = recovery.get_delay() {
                    let _ = pause.pause_for(delay);
                }
                recovery
            })
            .max_retry_attempts(policy.max_retries)
            .base_delay(policy.base_delay)
            .backoff(Backoff::Exponential)
            .on_retry(|_output, args| {
                log::debug!(
                    "retrying metrics request (attempt {}, delay {}ms)",
                    args.attempt().index() + 1,
                    args.retry_delay().as_millis(),
                );
            }),
        Execute::new(move |request: Request| {
            let client = client.clone();
            let throttler = Arc::clone(&permits);
            async move {
                let _permit = throttler.acquire().await?;
                client.execute(request).await.map_err(ohno::AppError::from)
            }
        }),
    )
        .into_service();

    service.execute(request).await
}
