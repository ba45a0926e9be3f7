use super::{WRAPPER_FUNCTION, extract_metrics, is_composite, unwrap_wrapper};
use core::ops::Range;
use serde::Serialize;

/// One metric reference found inside a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSpan {
    original_text: String,
    clean_text: String,
    has_wrapper: bool,
    wrapper_depth: usize,
    start: usize,
    end: usize,
}

impl MetricSpan {
    pub(super) fn new(original_text: &str, clean_text: &str, wrapper_depth: usize, span: Range<usize>) -> Self {
        Self {
            original_text: original_text.to_string(),
            clean_text: clean_text.to_string(),
            has_wrapper: wrapper_depth > 0,
            wrapper_depth,
            start: span.start,
            end: span.end,
        }
    }

    pub(super) fn bare(query: &str, span: Range<usize>) -> Self {
        let text = &query[span.clone()];
        Self::new(text, text, 0, span)
    }

    /// The metric exactly as written in the query, wrapper calls included.
    #[must_use]
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// The metric with every `default_zero` layer removed.
    #[must_use]
    pub fn clean_text(&self) -> &str {
        &self.clean_text
    }

    #[must_use]
    pub const fn has_wrapper(&self) -> bool {
        self.has_wrapper
    }

    /// Number of `default_zero` layers that were removed.
    #[must_use]
    pub const fn wrapper_depth(&self) -> usize {
        self.wrapper_depth
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Byte range of the metric within the analyzed query.
    #[must_use]
    pub const fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// The result of analyzing a single query.
///
/// `has_wrapper`, `inner_query` and `wrapper_depth` describe the first metric only. They
/// predate multi-metric support and are kept for consumers that look at one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnalysis {
    original_query: String,
    is_composite: bool,
    has_wrapper: bool,
    inner_query: String,
    wrapper_depth: usize,
    metrics: Vec<MetricSpan>,
}

impl QueryAnalysis {
    #[must_use]
    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    /// Whether the query combines several metrics or applies arithmetic.
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        self.is_composite
    }

    #[must_use]
    pub const fn has_wrapper(&self) -> bool {
        self.has_wrapper
    }

    /// Unwrapped text of the first metric.
    #[must_use]
    pub fn inner_query(&self) -> &str {
        &self.inner_query
    }

    #[must_use]
    pub const fn wrapper_depth(&self) -> usize {
        self.wrapper_depth
    }

    /// Metrics in order of appearance. Never empty.
    #[must_use]
    pub fn metrics(&self) -> &[MetricSpan] {
        &self.metrics
    }
}

/// Analyze a query.
///
/// Simple queries produce exactly one metric spanning the whole input, unwrapped if it
/// is a `default_zero(...)` call. Composite queries are broken into their constituent
/// metrics; if none can be recognized, the whole query is reported as a single metric so
/// that it still gets validated.
#[must_use]
pub fn analyze(query: &str) -> QueryAnalysis {
    let is_composite = is_composite(query);

    let mut metrics = if is_composite { extract_metrics(query) } else { Vec::new() };
    if metrics.is_empty() {
        let (clean, depth) = unwrap_wrapper(query, WRAPPER_FUNCTION);
        metrics.push(MetricSpan::new(query, clean, depth, 0..query.len()));
    }

    let first = &metrics[0];

    QueryAnalysis {
        original_query: query.to_string(),
        is_composite,
        has_wrapper: first.has_wrapper,
        inner_query: first.clean_text.clone(),
        wrapper_depth: first.wrapper_depth,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_simple_metric() {
        let analysis = analyze("avg:system.cpu.user{*}");
        assert!(!analysis.is_composite());
        assert_eq!(analysis.metrics().len(), 1);
        assert!(!analysis.has_wrapper());
        assert_eq!(analysis.wrapper_depth(), 0);
        assert_eq!(analysis.inner_query(), "avg:system.cpu.user{*}");

        let metric = &analysis.metrics()[0];
        assert!(!metric.has_wrapper());
        assert_eq!(metric.span(), 0..22);
    }

    #[test]
    fn test_scenario_nested_wrapper() {
        let analysis = analyze("default_zero(default_zero(avg:system.cpu.user{*}))");
        assert!(!analysis.is_composite());
        assert_eq!(analysis.metrics().len(), 1);
        assert!(analysis.has_wrapper());
        assert_eq!(analysis.wrapper_depth(), 2);
        assert_eq!(analysis.inner_query(), "avg:system.cpu.user{*}");

        let metric = &analysis.metrics()[0];
        assert!(metric.has_wrapper());
        assert_eq!(metric.wrapper_depth(), 2);
        assert_eq!(metric.clean_text(), "avg:system.cpu.user{*}");
    }

    #[test]
    fn test_scenario_two_bare_metrics() {
        let analysis = analyze("avg:system.cpu.user{*} + avg:system.cpu.system{*}");
        assert!(analysis.is_composite());
        assert_eq!(analysis.metrics().len(), 2);
        assert!(analysis.metrics().iter().all(|m| !m.has_wrapper()));
        assert_eq!(analysis.inner_query(), "avg:system.cpu.user{*}");
    }

    #[test]
    fn test_scenario_wrapped_expression() {
        let analysis = analyze(
            "(default_zero(default_zero(avg:m1{t:v}))+default_zero(default_zero(avg:m2{t:v})))/default_zero(avg:m3{t:v})",
        );
        assert!(analysis.is_composite());

        let depths: Vec<_> = analysis.metrics().iter().map(MetricSpan::wrapper_depth).collect();
        assert_eq!(depths, vec![2, 2, 1]);
        assert!(analysis.has_wrapper());
        assert_eq!(analysis.inner_query(), "avg:m1{t:v}");
        assert_eq!(analysis.wrapper_depth(), 2);
    }

    #[test]
    fn test_scenario_mixed_metrics() {
        let analysis = analyze("default_zero(avg:valid{tag:value}) * sum:other{env:prod} / count:third{*}");
        assert!(analysis.is_composite());
        assert_eq!(analysis.metrics().len(), 3);

        let metrics = analysis.metrics();
        assert!(metrics[0].has_wrapper());
        assert_eq!(metrics[0].wrapper_depth(), 1);
        assert_eq!(metrics[0].clean_text(), "avg:valid{tag:value}");
        assert!(!metrics[1].has_wrapper());
        assert_eq!(metrics[1].clean_text(), "sum:other{env:prod}");
        assert!(!metrics[2].has_wrapper());
        assert_eq!(metrics[2].clean_text(), "count:third{*}");
    }

    #[test]
    fn test_wrapper_with_function_suffix() {
        let query = "default_zero(avg:rails.temporal.workflow_task.queue_time.avg{app:persona-web-temporal-worker-retention,env:production,region:us-central1,task_queue:retention}.fill(null))";
        let analysis = analyze(query);
        assert!(!analysis.is_composite());
        assert_eq!(analysis.wrapper_depth(), 1);
        assert_eq!(
            analysis.inner_query(),
            "avg:rails.temporal.workflow_task.queue_time.avg{app:persona-web-temporal-worker-retention,env:production,region:us-central1,task_queue:retention}.fill(null)"
        );
    }

    #[test]
    fn test_spaces_inside_wrapper() {
        let analysis = analyze("default_zero( avg:system.cpu.user{*} )");
        assert!(analysis.has_wrapper());
        assert_eq!(analysis.inner_query(), "avg:system.cpu.user{*}");
    }

    #[test]
    fn test_similar_function_name_is_not_a_wrapper() {
        let query = "default_zero_custom_function(avg:system.cpu.user{*})";
        let analysis = analyze(query);
        assert!(!analysis.is_composite());
        assert!(!analysis.has_wrapper());
        assert_eq!(analysis.metrics().len(), 1);
        assert_eq!(analysis.metrics()[0].clean_text(), query);
    }

    #[test]
    fn test_simple_query_round_trips() {
        for query in [
            "avg:system.cpu.user{*}",
            "default_zero(avg:a{*})",
            "  default_zero( avg:a{*} ) ",
            "not a metric at all",
        ] {
            let analysis = analyze(query);
            assert!(!analysis.is_composite());
            assert_eq!(analysis.original_query(), query);
            assert_eq!(analysis.metrics()[0].original_text(), query);
            assert_eq!(analysis.metrics()[0].span(), 0..query.len());
        }
    }

    #[test]
    fn test_empty_and_blank_input() {
        for query in ["", "   "] {
            let analysis = analyze(query);
            assert!(!analysis.is_composite());
            assert_eq!(analysis.metrics().len(), 1);
            assert!(!analysis.has_wrapper());
            assert_eq!(analysis.metrics()[0].clean_text(), query);
        }
    }

    #[test]
    fn test_unbalanced_simple_wrapper_is_unwrapped_as_nothing() {
        let query = "default_zero(avg:system.cpu.user{*}";
        let analysis = analyze(query);
        assert!(!analysis.has_wrapper());
        assert_eq!(analysis.inner_query(), query);
    }

    #[test]
    fn test_composite_without_metrics_falls_back_to_whole_query() {
        let analysis = analyze("1 + 2");
        assert!(analysis.is_composite());
        assert_eq!(analysis.metrics().len(), 1);
        assert_eq!(analysis.metrics()[0].clean_text(), "1 + 2");
    }

    #[test]
    fn test_two_prefixes_are_always_composite() {
        for query in [
            "avg:a{*}, sum:b{*}",
            "default_zero(avg:a{*}), default_zero(sum:b{*})",
            "default_zero(default_zero(avg:a{*} , max:b{*}))",
        ] {
            assert!(analyze(query).is_composite(), "{query}");
        }
    }

    #[test]
    fn test_serializes_to_json() {
        let analysis = analyze("default_zero(avg:a{*}) + sum:b{*}");
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["is_composite"], true);
        assert_eq!(json["metrics"][0]["clean_text"], "avg:a{*}");
        assert_eq!(json["metrics"][0]["wrapper_depth"], 1);
        assert_eq!(json["metrics"][1]["start"], 25);
    }

    #[test]
    fn test_large_unclosed_input() {
        let analysis = analyze(&"avg:a{".repeat(20_000));
        assert!(analysis.is_composite());
        assert_eq!(analysis.metrics().len(), 20_000);

        let query = format!("{}avg:a{{*}} + sum:b", "default_zero(".repeat(20_000));
        let analysis = analyze(&query);
        assert_eq!(analysis.metrics().len(), 2);
        assert!(!analysis.has_wrapper());
        assert_eq!(analysis.inner_query(), "avg:a{*}");
    }
}
