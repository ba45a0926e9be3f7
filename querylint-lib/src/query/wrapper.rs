use super::Delimiters;
use core::ops::Range;

/// Check whether a call to `name` starts at byte offset `at` of `text`.
///
/// A call is the exact name, optional ASCII whitespace, then `(`. Returns the offset of
/// that `(`. An identifier that merely starts with `name` (such as `default_zero_custom`)
/// is not a call.
#[must_use]
pub fn wrapper_call_open_paren(text: &str, at: usize, name: &str) -> Option<usize> {
    let after_name = text.get(at..)?.strip_prefix(name)?;
    let gap = after_name.len() - after_name.trim_start_matches(|c: char| c.is_ascii_whitespace()).len();
    let open = at + name.len() + gap;

    (text.as_bytes().get(open) == Some(&b'(')).then_some(open)
}

/// Narrow `range` so it excludes leading and trailing whitespace.
fn trim_range(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let start = range.start + (slice.len() - slice.trim_start().len());
    let end = range.end - (slice.len() - slice.trim_end().len());
    start..end.max(start)
}

/// Return the argument range of `name(...)` when the call spans all of `call`.
fn call_body(text: &str, parens: &Delimiters, call: &Range<usize>, name: &str) -> Option<Range<usize>> {
    let open = wrapper_call_open_paren(text, call.start, name)?;
    if parens.matching_paren(open)? != call.end {
        return None;
    }

    let body = open + 1..call.end - 1;
    (!body.is_empty()).then_some(body)
}

/// Peel layers of `name(...)` off `text`.
///
/// Returns the innermost expression and the number of layers removed. Whitespace around
/// the call and inside its parentheses is ignored, so `f(x)`, `f( x )` and `f(f(x))` all
/// unwrap to `x`. When `text` is not a call to `name` at all, it comes back untouched with
/// a depth of zero. That includes an empty call such as `default_zero()`.
#[must_use]
pub fn unwrap_wrapper<'a>(text: &'a str, name: &str) -> (&'a str, usize) {
    let parens = Delimiters::new(text);
    let mut current = trim_range(text, 0..text.len());
    let mut depth = 0;

    while let Some(body) = call_body(text, &parens, &current, name) {
        depth += 1;
        let inner = trim_range(text, body);
        if !text[inner.clone()].starts_with(name) {
            return (&text[inner], depth);
        }

        current = inner;
    }

    if depth == 0 { (text, 0) } else { (&text[current], depth) }
}
