use super::query_outcome::QueryResponse;
use super::resilient_http::resilient_send;
use super::{QueryOutcome, RetryPolicy, Throttler};
use crate::Result;
use chrono::{DateTime, TimeDelta, Utc};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;
use url::Url;

const QUERY_PATH: &str = "api/v1/query";

/// Connection settings for [`MetricsClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Root of the metrics API, e.g. `https://api.datadoghq.com`.
    pub site: String,

    /// How far back from "now" each query looks.
    pub query_window: Duration,

    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent_queries: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            site: "https://api.datadoghq.com".to_string(),
            query_window: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_concurrent_queries: 8,
        }
    }
}

/// Client for the timeseries query endpoint of the metrics API.
///
/// Cloning is cheap and clones share the same connection pool and throttler.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    client: reqwest::Client,
    query_url: Url,
    query_window: TimeDelta,
    retry: RetryPolicy,
    throttler: Arc<Throttler>,
}

impl MetricsClient {
    /// Create a client authenticating with the given API and application keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the site is not a valid URL, a key contains characters that
    /// cannot appear in an HTTP header, or the HTTP client cannot be built.
    pub fn new(api_key: &str, app_key: &str, options: &ClientOptions) -> Result<Self> {
        let mut site = Url::parse(&options.site).into_app_err_with(|| format!("invalid metrics site '{}'", options.site))?;
        if !site.path().ends_with('/') {
            let path = format!("{}/", site.path());
            site.set_path(&path);
        }
        let query_url = site.join(QUERY_PATH)?;

        let mut headers = HeaderMap::new();
        let _ = headers.insert("dd-api-key", sensitive_header(api_key)?);
        let _ = headers.insert("dd-application-key", sensitive_header(app_key)?);

        let client = reqwest::Client::builder()
            .user_agent("querylint")
            .default_headers(headers)
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            client,
            query_url,
            query_window: TimeDelta::from_std(options.query_window).into_app_err("query window is too large")?,
            retry: options.retry,
            throttler: Throttler::new(options.max_concurrent_queries),
        })
    }

    /// Run `query` over the window ending now.
    pub async fn query(&self, query: &str) -> Result<QueryOutcome> {
        self.query_at(query, Utc::now()).await
    }

    /// Run `query` over the window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be reached, keeps failing with server
    /// errors after all retries, stays rate limited, or sends a body that cannot be
    /// decoded. A query the backend refuses is not an error; it comes back as
    /// [`QueryOutcome::Rejected`].
    pub async fn query_at(&self, query: &str, now: DateTime<Utc>) -> Result<QueryOutcome> {
        let from = (now - self.query_window).timestamp().to_string();
        let to = now.timestamp().to_string();

        log::trace!("querying metrics from {from} to {to}: {query}");

        let request = self
            .client
            .get(self.query_url.clone())
            .query(&[("from", from.as_str()), ("to", to.as_str()), ("query", query)])
            .build()
            .into_app_err("building metrics query")?;

        let resp = resilient_send(&self.retry, &self.throttler, &self.client, request)
            .await
            .into_app_err("sending metrics query")?;

        let status = resp.status();
        if status.is_success() {
            let body: QueryResponse = resp.json().await.into_app_err("decoding metrics query response")?;
            return Ok(QueryOutcome::from_body(&body));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(app_err!("metrics backend is still rate limiting requests after {} retries", self.retry.max_retries));
        }

        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(QueryOutcome::from_client_error(status.as_u16(), &body));
        }

        Err(app_err!("metrics backend returned HTTP {status}"))
    }
}

fn sensitive_header(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value).into_app_err("API key contains characters not allowed in an HTTP header")?;
    header.set_sensitive(true);
    Ok(header)
}
