use core::ops::Range;

/// A set of byte ranges, kept sorted and merged.
///
/// Used to remember which parts of a query already belong to an extracted metric.
/// Overlapping or touching ranges are coalesced on insertion, so lookups are a binary
/// search over disjoint intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoveredSpans {
    ranges: Vec<Range<usize>>,
}

impl CoveredSpans {
    #[must_use]
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Mark `range` as covered. Empty ranges are ignored.
    pub fn insert(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }

        // Everything in lo..hi overlaps or touches the new range.
        let lo = self.ranges.partition_point(|r| r.end < range.start);
        let hi = self.ranges.partition_point(|r| r.start <= range.end);

        let mut merged = range;
        if lo < hi {
            merged.start = merged.start.min(self.ranges[lo].start);
            merged.end = merged.end.max(self.ranges[hi - 1].end);
        }

        let _ = self.ranges.splice(lo..hi, core::iter::once(merged));
    }

    /// Returns `true` if any byte of `range` is covered.
    #[must_use]
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        if range.is_empty() {
            return false;
        }

        let i = self.ranges.partition_point(|r| r.end <= range.start);
        self.ranges.get(i).is_some_and(|r| r.start < range.end)
    }
}
