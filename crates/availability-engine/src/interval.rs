//! Half-open interval algebra.
//!
//! All operations treat intervals as `[start, end)`: an interval ending exactly
//! where another starts does not overlap it. The functions are generic over
//! any ordered copyable point type so they work equally on instants and on
//! plain integers.

/// A half-open `[start, end)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval<T> {
    pub start: T,
    pub end: T,
}

impl<T: Ord + Copy> Interval<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    /// True when the interval contains no points (`end <= start`).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, point: T) -> bool {
        self.start <= point && point < self.end
    }

    pub fn overlaps(&self, other: &Interval<T>) -> bool {
        overlaps(self, other)
    }

    pub fn intersect(&self, other: &Interval<T>) -> Option<Interval<T>> {
        intersect(self, other)
    }
}

/// Two intervals overlap iff `a.start < b.end && a.end > b.start`.
///
/// Touching endpoints (`a.end == b.start`) are NOT an overlap.
pub fn overlaps<T: Ord>(a: &Interval<T>, b: &Interval<T>) -> bool {
    a.start < b.end && a.end > b.start
}

/// The common part of two intervals, or `None` when they do not overlap.
pub fn intersect<T: Ord + Copy>(a: &Interval<T>, b: &Interval<T>) -> Option<Interval<T>> {
    if !overlaps(a, b) {
        return None;
    }
    Some(Interval::new(a.start.max(b.start), a.end.min(b.end)))
}

/// Merge overlapping or touching intervals into a sorted, disjoint list.
///
/// Empty intervals are discarded.
pub fn merge<T: Ord + Copy>(intervals: &[Interval<T>]) -> Vec<Interval<T>> {
    let mut sorted: Vec<Interval<T>> = intervals.iter().copied().filter(|i| !i.is_empty()).collect();
    sorted.sort_by_key(|i| (i.start, i.end));

    let mut merged: Vec<Interval<T>> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }
    merged
}

/// Remove every busy interval from `base`, returning the remaining gaps.
///
/// Busy intervals are sorted by start and walked left to right; ones that do
/// not touch `base` are skipped. The result is chronological, contained in
/// `base`, and never includes zero-length gaps.
pub fn subtract<T: Ord + Copy>(base: Interval<T>, busy: &[Interval<T>]) -> Vec<Interval<T>> {
    if base.is_empty() {
        return Vec::new();
    }

    let mut relevant: Vec<Interval<T>> = busy
        .iter()
        .filter(|b| !b.is_empty() && overlaps(*b, &base))
        .copied()
        .collect();
    relevant.sort_by_key(|i| (i.start, i.end));

    let mut free = Vec::new();
    let mut cursor = base.start;

    for b in relevant {
        if cursor < b.start {
            free.push(Interval::new(cursor, b.start));
        }
        cursor = cursor.max(b.end);
        if cursor >= base.end {
            break;
        }
    }

    // Trailing gap after the last busy interval.
    if cursor < base.end {
        free.push(Interval::new(cursor, base.end));
    }

    free
}
