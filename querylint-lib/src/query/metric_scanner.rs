//! Scanner for bare metric references such as `sum:web.requests{env:prod}.as_count()`.
//!
//! A bare metric is an aggregation prefix and `:`, a dotted metric name, an optional
//! `{...}` tag filter, then any number of `.suffix` segments. Suffix segments may contain
//! parentheses, which is how `.as_count()` or `.fill(null)` are picked up.

use super::{AGGREGATION_PREFIXES, Delimiters};
use core::ops::Range;

const fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'_'
}

const fn is_suffix_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'(' || b == b')'
}

/// Count the run of bytes starting at `from` that satisfy `pred`.
fn run_len(bytes: &[u8], from: usize, pred: fn(u8) -> bool) -> usize {
    bytes.get(from..).map_or(0, |rest| rest.iter().take_while(|&&b| pred(b)).count())
}

/// Match a bare metric reference starting exactly at `start`, returning its end offset.
fn match_at(bytes: &[u8], delimiters: &Delimiters, start: usize) -> Option<usize> {
    let rest = &bytes[start..];
    let prefix = AGGREGATION_PREFIXES
        .iter()
        .find(|p| rest.starts_with(p.as_bytes()) && rest.get(p.len()) == Some(&b':'))?;

    let name_start = start + prefix.len() + 1;
    let name_len = run_len(bytes, name_start, is_name_byte);
    if name_len == 0 {
        return None;
    }

    let mut end = name_start + name_len;

    // Tag filter is optional; an unterminated one is simply not part of the match.
    if bytes.get(end) == Some(&b'{')
        && let Some(close) = delimiters.next_close_brace(end + 1)
    {
        end = close + 1;
    }

    while bytes.get(end) == Some(&b'.') {
        let suffix_len = run_len(bytes, end + 1, is_suffix_byte);
        if suffix_len == 0 {
            break;
        }
        end += suffix_len + 1;
    }

    Some(end)
}

/// Find all non-overlapping bare metric references in `text`, left to right.
pub fn scan_bare_metrics(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let delimiters = Delimiters::new(text);
    let mut found = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match match_at(bytes, &delimiters, pos) {
            Some(end) => {
                found.push(pos..end);
                pos = end;
            }
            None => pos += 1,
        }
    }

    found
}
