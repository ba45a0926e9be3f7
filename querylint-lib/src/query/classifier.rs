use super::AGGREGATION_PREFIXES;

/// Decide whether a query combines several metrics rather than naming a single one.
///
/// A query is composite when it has an arithmetic operator outside every `{...}` tag
/// filter, or when aggregation prefixes (`avg:`, `sum:`, ...) occur more than once.
/// Operators inside a tag filter are part of the filter literal and are ignored.
///
/// This is a heuristic. A `-` in a metric name outside braces reads as subtraction, and
/// an operator in the very first or last position is not counted.
#[must_use]
pub fn is_composite(query: &str) -> bool {
    has_combining_operator(query) || aggregation_prefix_count(query) > 1
}

fn has_combining_operator(query: &str) -> bool {
    let last = query.len().saturating_sub(1);
    let mut brace_depth = 0i32;

    for (i, b) in query.bytes().enumerate() {
        match b {
            b'{' => brace_depth += 1,
            b'}' => brace_depth -= 1,
            b'+' | b'-' | b'*' | b'/' if brace_depth == 0 && i > 0 && i < last => return true,
            _ => {}
        }
    }

    false
}

fn aggregation_prefix_count(query: &str) -> usize {
    AGGREGATION_PREFIXES
        .iter()
        .map(|prefix| {
            let needle = format!("{prefix}:");
            query.matches(needle.as_str()).count()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_metric() {
        assert!(!is_composite("avg:system.cpu.user{*}"));
    }

    #[test]
    fn test_wrapped_simple_metric() {
        assert!(!is_composite("default_zero(avg:system.cpu.user{*})"));
        assert!(!is_composite("default_zero(default_zero(default_zero(avg:system.cpu.user{*})))"));
    }

    #[test]
    fn test_two_metrics_with_addition() {
        assert!(is_composite("avg:system.cpu.user{*} + avg:system.cpu.system{*}"));
    }

    #[test]
    fn test_parenthesized_expression() {
        assert!(is_composite("(avg:metric1{*} + avg:metric2{*}) / sum:metric3{*}"));
    }

    #[test]
    fn test_deeply_wrapped_expression() {
        assert!(is_composite(
            "(default_zero(default_zero(avg:deeply.nested.valid.metric1{fake:tag}))+default_zero(default_zero(avg:deeply.nested.valid.metric2{fake:tag})))/default_zero(avg:deeply.nested.valid.metric3{fake:tag})"
        ));
    }

    #[test]
    fn test_operators_inside_tag_filter_are_ignored() {
        assert!(!is_composite(
            "default_zero(avg:rails.temporal.workflow_task.queue_time.avg{app:persona-web-temporal-worker-retention,env:production,region:us-central1}.fill(null))"
        ));
        assert!(!is_composite("avg:http.requests{path:/api/v1/*}"));
    }

    #[test]
    fn test_operator_with_constant() {
        assert!(is_composite("avg:system.load.1{*} * 100"));
    }

    #[test]
    fn test_operator_at_edges_is_not_counted() {
        assert!(!is_composite("-avg:system.cpu.user{*}"));
        assert!(!is_composite("avg:system.cpu.user{*}*"));
    }

    #[test]
    fn test_multiple_prefixes_without_operator() {
        assert!(is_composite("top(avg:a{*} by {host}, 10, 'mean', 'desc'), sum:b{*}"));
    }

    #[test]
    fn test_multiple_prefixes_regardless_of_wrapping() {
        assert!(is_composite("default_zero(avg:a{*}), default_zero(default_zero(max:b{*}))"));
    }

    #[test]
    fn test_prefix_count() {
        assert_eq!(aggregation_prefix_count(""), 0);
        assert_eq!(aggregation_prefix_count("avg:a{*}"), 1);
        assert_eq!(aggregation_prefix_count("avg:a{*} sum:b{*} gauge:c rate:d"), 4);
    }

    #[test]
    fn test_empty_and_blank_queries_are_simple() {
        assert!(!is_composite(""));
        assert!(!is_composite("   "));
        assert!(!is_composite("+"));
    }

    #[test]
    fn test_unbalanced_braces_do_not_panic() {
        assert!(!is_composite("avg:a{x-y"));
        assert!(is_composite("avg:a{x}-avg:b{y"));
    }
}
