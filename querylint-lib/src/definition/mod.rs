//! Loading metric definitions from disk
//!
//! Metric definitions are YAML manifests in the shape of a Kubernetes `DatadogMetric`
//! resource. Only `spec.query` matters to the linter; every other field is ignored.

mod metric_definition;

pub use metric_definition::{MetricDefinition, load_query};
