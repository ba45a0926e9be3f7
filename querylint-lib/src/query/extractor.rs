use super::metric_scanner::scan_bare_metrics;
use super::{CoveredSpans, Delimiters, MetricSpan, WRAPPER_FUNCTION, is_ident_byte, unwrap_wrapper, wrapper_call_open_paren};

/// Break a composite query into the metric references it is built from.
///
/// Runs two passes over the query. The first finds every top-level `default_zero(...)`
/// call and records it together with its unwrapped form; calls nested inside one that was
/// already recorded are not reported again. The second finds bare metric references and
/// keeps only those that do not touch any byte claimed by the first pass.
///
/// The returned spans never overlap and are ordered by their start offset.
///
/// An unbalanced `default_zero(` is skipped by the first pass. If the text after it looks
/// like a metric, the second pass reports that metric as unwrapped. An empty
/// `default_zero()` is still claimed by the first pass but, having nothing to unwrap, is
/// reported as itself with a wrapper depth of zero.
#[must_use]
pub fn extract_metrics(query: &str) -> Vec<MetricSpan> {
    let mut covered = CoveredSpans::new();
    let mut metrics = extract_wrapped(query, &mut covered);

    metrics.extend(
        scan_bare_metrics(query)
            .into_iter()
            .filter(|range| !covered.overlaps(range))
            .map(|range| MetricSpan::bare(query, range)),
    );

    metrics.sort_by_key(MetricSpan::start);
    metrics
}

fn extract_wrapped(query: &str, covered: &mut CoveredSpans) -> Vec<MetricSpan> {
    let bytes = query.as_bytes();
    let parens = Delimiters::new(query);
    let mut metrics = Vec::new();
    let mut pos = 0;

    while let Some(found) = query.get(pos..).and_then(|rest| rest.find(WRAPPER_FUNCTION)) {
        let start = pos + found;
        pos = start + WRAPPER_FUNCTION.len();

        if start > 0 && is_ident_byte(bytes[start - 1]) {
            continue;
        }

        let Some(open) = wrapper_call_open_paren(query, start, WRAPPER_FUNCTION) else {
            continue;
        };

        let Some(end) = parens.matching_paren(open) else {
            log::trace!("ignoring unbalanced {WRAPPER_FUNCTION}( at offset {start}");
            continue;
        };

        let original = &query[start..end];
        let (clean, depth) = unwrap_wrapper(original, WRAPPER_FUNCTION);
        metrics.push(MetricSpan::new(original, clean, depth, start..end));
        covered.insert(start..end);

        // Calls nested inside this one belong to it.
        pos = end;
    }

    metrics
}
