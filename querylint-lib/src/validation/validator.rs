use super::{FileReport, Finding, Severity};
use crate::Result;
use crate::backend::{MetricsClient, QueryOutcome};
use crate::definition::load_query;
use crate::query::analyze;
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::join_all;

/// Outcome of checking one query, reduced to what the linter cares about.
enum Check {
    Failed(String),
    NoData,
    Value(f64),
}

impl From<Result<QueryOutcome>> for Check {
    fn from(result: Result<QueryOutcome>) -> Self {
        match result {
            Ok(QueryOutcome::Data(value)) => Self::Value(value),
            Ok(QueryOutcome::NoData) => Self::NoData,
            Ok(QueryOutcome::Rejected(message)) => Self::Failed(message),
            Err(e) => Self::Failed(format!("{e:#}")),
        }
    }
}

/// Validates metric definition files against the metrics backend.
#[derive(Debug, Clone)]
pub struct Validator {
    client: MetricsClient,
}

impl Validator {
    #[must_use]
    pub const fn new(client: MetricsClient) -> Self {
        Self { client }
    }

    /// Validate several files concurrently. Reports come back in input order.
    pub async fn validate_files(&self, paths: &[Utf8PathBuf]) -> Vec<FileReport> {
        join_all(paths.iter().map(|path| self.validate_file(path))).await
    }

    /// Validate a single metric definition file.
    ///
    /// The whole query is run first; if the backend refuses it, nothing else is checked.
    /// Composite queries then have each metric checked on its own, and a simple query
    /// wrapped in `default_zero` has its inner query checked, since the wrapper turns a
    /// missing metric into a flat zero.
    pub async fn validate_file(&self, path: &Utf8Path) -> FileReport {
        let mut report = FileReport::new(path);

        let query = match load_query(path) {
            Ok(query) => query,
            Err(e) => {
                log::debug!("could not extract query from '{path}': {e:#}");
                report.push(Finding::new(Severity::Failure, format!("could not extract query from file: {e:#}")));
                return report;
            }
        };

        if query.is_empty() {
            report.push(Finding::new(Severity::Warning, "file has no metric query, skipping it"));
            return report;
        }

        let analysis = analyze(&query);

        let whole = Check::from(self.client.query(&query).await);
        if let Check::Failed(message) = &whole {
            report.push(Finding::new(Severity::Failure, format!("query was rejected: {message}")).with_query(&query));
            return report;
        }

        if analysis.is_composite() {
            log::debug!(
                "'{path}': composite query, validating {} individual metrics",
                analysis.metrics().len()
            );

            for (index, metric) in analysis.metrics().iter().enumerate() {
                log::debug!(
                    "'{path}': validating metric {index} '{}' (wrapper depth {})",
                    metric.clean_text(),
                    metric.wrapper_depth()
                );

                let finding = match Check::from(self.client.query(metric.clean_text()).await) {
                    Check::Failed(message) if metric.has_wrapper() => Finding::new(
                        Severity::Failure,
                        format!("metric is invalid and default_zero() is masking it: {message}"),
                    ),
                    Check::Failed(message) => Finding::new(Severity::Failure, format!("metric is invalid: {message}")),
                    Check::NoData if metric.has_wrapper() => Finding::new(
                        Severity::Warning,
                        "metric returns no data; it may not exist and default_zero() masks this",
                    ),
                    Check::NoData => Finding::new(Severity::Warning, "metric returns no data; it may not exist"),
                    Check::Value(_) => continue,
                };

                report.push(finding.with_metric_index(index).with_query(metric.original_text()));
            }
        } else if analysis.has_wrapper() {
            log::debug!(
                "'{path}': query uses default_zero, validating inner query '{}' (wrapper depth {})",
                analysis.inner_query(),
                analysis.wrapper_depth()
            );

            match Check::from(self.client.query(analysis.inner_query()).await) {
                Check::Failed(message) => {
                    report.push(
                        Finding::new(
                            Severity::Failure,
                            format!("inner query is invalid and default_zero() is masking it: {message}"),
                        )
                        .with_query(analysis.inner_query()),
                    );
                    return report;
                }
                Check::NoData => report.push(
                    Finding::new(
                        Severity::Warning,
                        "inner query returns no data; the metric may not exist and default_zero() masks this",
                    )
                    .with_query(analysis.inner_query()),
                ),
                Check::Value(_) => {}
            }
        }

        match whole {
            Check::Value(value) => {
                log::debug!("'{path}': query returned {value}");
                report.push(Finding::new(Severity::Info, format!("query returned {value}")).with_query(&query));
            }
            _ => report.push(
                Finding::new(
                    Severity::Warning,
                    "query returned no data; the metric might not be real or there may not be any datapoints",
                )
                .with_query(&query),
            ),
        }

        report
    }
}
