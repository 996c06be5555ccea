//! Line ranges in the working-tree version of a file.
//!
//! All ranges are 1-indexed and inclusive on both ends. They always refer to
//! the *new* side of a diff, i.e. the file as it currently exists on disk.

use std::fmt;

/// A contiguous span of lines, 1-indexed, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineRange {
    /// First line of the span (>= 1)
    pub start: u32,
    /// Last line of the span (>= start)
    pub end: u32,
}

impl LineRange {
    /// Create a range covering lines `start..=end`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start >= 1, "line numbers are 1-indexed");
        debug_assert!(end >= start, "range end must not precede its start");
        Self { start, end }
    }

    /// Whether `line` falls inside this range.
    pub fn contains(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }

    /// Number of lines covered.
    pub fn line_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Sort ranges and merge any that overlap or touch.
///
/// Two ranges are merged when `next.start <= current.end + 1`, so adjacent
/// ranges like `3..5` and `6..9` collapse into `3..9`. The result is ordered
/// by start and strictly disjoint, with at least one untouched line between
/// consecutive ranges.
pub fn coalesce(mut ranges: Vec<LineRange>) -> Vec<LineRange> {
    ranges.sort();

    let mut merged: Vec<LineRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end + 1 => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn r(start: u32, end: u32) -> LineRange {
        LineRange::new(start, end)
    }

    #[test]
    fn adjacent_ranges_collapse() {
        assert_eq!(coalesce(vec![r(3, 5), r(6, 9)]), vec![r(3, 9)]);
    }

    #[test]
    fn overlapping_ranges_collapse() {
        assert_eq!(coalesce(vec![r(3, 7), r(5, 9)]), vec![r(3, 9)]);
    }

    #[test]
    fn contained_range_is_absorbed() {
        assert_eq!(coalesce(vec![r(3, 10), r(5, 6)]), vec![r(3, 10)]);
    }

    #[test]
    fn separated_ranges_stay_apart() {
        assert_eq!(coalesce(vec![r(3, 5), r(7, 8)]), vec![r(3, 5), r(7, 8)]);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        assert_eq!(
            coalesce(vec![r(20, 22), r(1, 2), r(10, 10)]),
            vec![r(1, 2), r(10, 10), r(20, 22)]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(coalesce(vec![]), vec![]);
    }

    #[test]
    fn single_line_range_contains_only_itself() {
        let range = r(10, 10);
        assert!(range.contains(10));
        assert!(!range.contains(9));
        assert!(!range.contains(11));
        assert_eq!(range.line_count(), 1);
    }
}
