use addr_codec::Interval;

/// A sorted set of non-overlapping inclusive intervals over one address
/// family's integer space
///
/// Construction sorts the intervals ascending by start and merges any that
/// overlap. The merge is what makes the single-probe binary search in
/// [`RangeSet::contains`] equivalent to a linear scan over the raw input: with
/// overlapping intervals, the interval with the greatest start at or below the
/// query point is not necessarily the one that covers it.
#[derive(Debug, Clone)]
pub struct RangeSet<T: Copy + Ord> {
    intervals: Vec<Interval<T>>,
}

impl<T: Copy + Ord> RangeSet<T> {
    /// Build a set from raw intervals, normalizing as described above
    #[must_use]
    pub fn new(mut intervals: Vec<Interval<T>>) -> Self {
        intervals.sort_unstable_by_key(|interval| (interval.start, interval.end));
        let mut merged: Vec<Interval<T>> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start <= last.end => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }
        Self { intervals: merged }
    }

    /// Check whether an address falls inside any interval in the set
    #[must_use]
    pub fn contains(&self, addr: T) -> bool {
        // Index of the first interval with start > addr; the candidate is the
        // one just before it
        let idx = self
            .intervals
            .partition_point(|interval| interval.start <= addr);
        idx > 0 && addr <= self.intervals[idx - 1].end
    }

    /// The normalized intervals, sorted ascending by start
    #[must_use]
    pub fn intervals(&self) -> &[Interval<T>] {
        &self.intervals
    }

    /// The number of intervals in the set (after merging)
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Check if the set holds no intervals
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl<T: Copy + Ord> Default for RangeSet<T> {
    fn default() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }
}

impl<T: Copy + Ord> From<Vec<Interval<T>>> for RangeSet<T> {
    fn from(intervals: Vec<Interval<T>>) -> Self {
        Self::new(intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: u32, end: u32) -> Interval<u32> {
        Interval { start, end }
    }

    #[test]
    fn test_empty_set_contains_nothing() {
        let set: RangeSet<u32> = RangeSet::default();
        assert!(!set.contains(0));
        assert!(!set.contains(u32::MAX));
    }

    #[test]
    fn test_interval_endpoints_are_inclusive() {
        let set = RangeSet::new(vec![interval(100, 200)]);
        assert!(!set.contains(99));
        assert!(set.contains(100));
        assert!(set.contains(150));
        assert!(set.contains(200));
        assert!(!set.contains(201));
    }

    #[test]
    fn test_address_before_every_interval() {
        let set = RangeSet::new(vec![interval(100, 200), interval(300, 400)]);
        assert!(!set.contains(50));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let set = RangeSet::new(vec![
            interval(300, 400),
            interval(100, 200),
            interval(500, 500),
        ]);
        assert!(set.contains(150));
        assert!(set.contains(350));
        assert!(set.contains(500));
        assert!(!set.contains(250));
        assert!(!set.contains(501));
    }

    #[test]
    fn test_overlapping_intervals_are_merged() {
        // Without merging, a search for 70 would probe [50, 60] and miss the
        // covering [0, 100]
        let set = RangeSet::new(vec![interval(0, 100), interval(50, 60)]);
        assert_eq!(set.len(), 1);
        assert!(set.contains(70));
        assert!(set.contains(100));
        assert!(!set.contains(101));
    }

    #[test]
    fn test_merge_matches_linear_scan() {
        let raw = vec![
            interval(10, 40),
            interval(20, 80),
            interval(90, 95),
            interval(92, 120),
            interval(200, 200),
        ];
        let set = RangeSet::new(raw.clone());
        for addr in 0..=250u32 {
            let linear = raw.iter().any(|iv| iv.start <= addr && addr <= iv.end);
            assert_eq!(set.contains(addr), linear, "mismatch at {addr}");
        }
    }
}
