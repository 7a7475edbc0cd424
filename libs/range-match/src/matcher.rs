use std::sync::{Arc, Mutex};

use addr_codec::{parse_addr, Addr};
use arc_swap::ArcSwap;

use crate::error::Error;
use crate::snapshot::{RangeLists, Snapshot};
use crate::source::RangeSource;

/// The snapshot lifecycle state, as observable from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No range data loaded yet (or the loaded lists were empty); every query
    /// answers false
    Empty,
    /// A generation of range data is active
    Ready,
}

/// Counts reported by a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub generation: u64,
    pub ipv4_intervals: usize,
    pub ipv6_intervals: usize,
    pub skipped_entries: usize,
}

/// A concurrently queryable IP range matcher
///
/// The current [`Snapshot`] lives behind a single atomically-swappable
/// reference cell. Queries load the reference without locking and keep the
/// snapshot alive for as long as they use it; a refresh builds a complete
/// replacement and swaps it in as one unit. Exactly one load may be in flight
/// at a time; a second one is rejected rather than interleaved.
#[derive(Debug)]
pub struct Matcher {
    /// The active snapshot
    current: ArcSwap<Snapshot>,
    /// Writer guard serializing loads; held only while building and swapping
    writer: Mutex<()>,
}

impl Matcher {
    /// Construct a matcher with no range data loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a new snapshot from the given lists and atomically swap it in
    ///
    /// Fails with [`Error::RefreshInProgress`] if another load currently holds
    /// the writer guard. Malformed individual entries are skipped, not fatal
    /// (see [`Snapshot::build`]).
    pub fn load(&self, lists: &RangeLists) -> Result<LoadReport, Error> {
        let guard = self.writer.try_lock().map_err(|_| Error::RefreshInProgress)?;

        let generation = self.current.load().generation() + 1;
        let (snapshot, skipped_entries) = Snapshot::build(generation, lists);
        let report = LoadReport {
            generation,
            ipv4_intervals: snapshot.v4().len(),
            ipv6_intervals: snapshot.v6().len(),
            skipped_entries,
        };
        self.current.store(Arc::new(snapshot));

        drop(guard);
        log::debug!(
            "Loaded range snapshot generation {}: {} IPv4 + {} IPv6 intervals ({} entries skipped)",
            report.generation,
            report.ipv4_intervals,
            report.ipv6_intervals,
            report.skipped_entries
        );
        Ok(report)
    }

    /// Fetch the current lists from a source and load them
    ///
    /// A fetch failure leaves the previous snapshot active and is surfaced as
    /// [`Error::SourceUnavailable`] for the caller's logging/retry decisions;
    /// stale-but-valid data beats no data.
    pub fn refresh_from(&self, source: &dyn RangeSource) -> Result<LoadReport, Error> {
        let lists = source.fetch().map_err(|err| Error::SourceUnavailable {
            id: source.id().to_string(),
            reason: err.to_string(),
        })?;
        self.load(&lists)
    }

    /// Seed the matcher with a previously persisted snapshot
    ///
    /// Intended for warm starts before the first fetch; goes through the same
    /// writer guard as [`Matcher::load`].
    pub fn restore(&self, snapshot: Snapshot) -> Result<(), Error> {
        let _guard = self.writer.try_lock().map_err(|_| Error::RefreshInProgress)?;
        self.current.store(Arc::new(snapshot));
        Ok(())
    }

    /// Check whether a parsed address falls inside the active ranges
    #[must_use]
    pub fn contains(&self, addr: Addr) -> bool {
        self.current.load().contains(addr)
    }

    /// Check a textual address against the active ranges
    ///
    /// A malformed address is surfaced as an error, never as "not matched".
    pub fn contains_str(&self, text: &str) -> Result<bool, Error> {
        Ok(self.contains(parse_addr(text)?))
    }

    /// The lifecycle state of the active snapshot
    #[must_use]
    pub fn state(&self) -> State {
        if self.current.load().is_empty() {
            State::Empty
        } else {
            State::Ready
        }
    }

    /// A shared handle to the active snapshot, e.g. for persistence
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
            writer: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubSource(Result<RangeLists, String>);

    impl RangeSource for StubSource {
        fn id(&self) -> &str {
            "stub"
        }

        fn fetch(&self) -> Result<RangeLists, Box<dyn std::error::Error + Send + Sync>> {
            self.0.clone().map_err(Into::into)
        }
    }

    fn cloudflare_style_lists() -> RangeLists {
        RangeLists {
            ipv4_cidrs: vec!["192.0.2.0/24".to_string(), "203.0.113.7/32".to_string()],
            ipv6_cidrs: vec!["2001:db8::/32".to_string()],
        }
    }

    #[test]
    fn test_empty_matcher_answers_false() {
        let matcher = Matcher::new();
        assert_eq!(matcher.state(), State::Empty);
        assert!(!matcher.contains_str("192.0.2.1").unwrap());
        assert!(!matcher.contains_str("2001:db8::1").unwrap());
    }

    #[test]
    fn test_contains_interval_boundaries() {
        let matcher = Matcher::new();
        matcher.load(&cloudflare_style_lists()).unwrap();
        assert_eq!(matcher.state(), State::Ready);

        assert!(matcher.contains_str("192.0.2.0").unwrap());
        assert!(matcher.contains_str("192.0.2.255").unwrap());
        assert!(!matcher.contains_str("192.0.1.255").unwrap());
        assert!(!matcher.contains_str("192.0.3.0").unwrap());

        assert!(matcher.contains_str("2001:db8::").unwrap());
        assert!(matcher
            .contains_str("2001:db8:ffff:ffff:ffff:ffff:ffff:ffff")
            .unwrap());
        assert!(!matcher.contains_str("2001:db9::1").unwrap());
        assert!(!matcher
            .contains_str("2001:db7:ffff:ffff:ffff:ffff:ffff:ffff")
            .unwrap());
    }

    #[test]
    fn test_single_address_block() {
        let matcher = Matcher::new();
        matcher.load(&cloudflare_style_lists()).unwrap();
        assert!(matcher.contains_str("203.0.113.7").unwrap());
        assert!(!matcher.contains_str("203.0.113.6").unwrap());
        assert!(!matcher.contains_str("203.0.113.8").unwrap());
    }

    #[test]
    fn test_malformed_query_address_is_an_error() {
        let matcher = Matcher::new();
        matcher.load(&cloudflare_style_lists()).unwrap();
        assert!(matches!(
            matcher.contains_str("not-an-address"),
            Err(Error::Codec(_))
        ));
    }

    #[test]
    fn test_queries_are_deterministic_within_a_generation() {
        let matcher = Matcher::new();
        matcher.load(&cloudflare_style_lists()).unwrap();
        for _ in 0..3 {
            assert!(matcher.contains_str("192.0.2.99").unwrap());
            assert!(!matcher.contains_str("198.51.100.1").unwrap());
        }
    }

    #[test]
    fn test_load_replaces_previous_generation() {
        let matcher = Matcher::new();
        let first = matcher.load(&cloudflare_style_lists()).unwrap();
        assert_eq!(first.generation, 1);

        let second = matcher
            .load(&RangeLists {
                ipv4_cidrs: vec!["198.51.100.0/24".to_string()],
                ipv6_cidrs: vec![],
            })
            .unwrap();
        assert_eq!(second.generation, 2);

        // The old generation's data is gone wholesale, not mixed in
        assert!(matcher.contains_str("198.51.100.1").unwrap());
        assert!(!matcher.contains_str("192.0.2.1").unwrap());
    }

    #[test]
    fn test_refresh_failure_retains_previous_snapshot() {
        let matcher = Matcher::new();
        matcher
            .refresh_from(&StubSource(Ok(cloudflare_style_lists())))
            .unwrap();

        let result = matcher.refresh_from(&StubSource(Err("connection refused".to_string())));
        assert!(matches!(result, Err(Error::SourceUnavailable { .. })));

        // Stale-but-valid data is still served
        assert_eq!(matcher.state(), State::Ready);
        assert!(matcher.contains_str("192.0.2.1").unwrap());
        assert_eq!(matcher.snapshot().generation(), 1);
    }

    #[test]
    fn test_refresh_failure_on_first_load_stays_empty() {
        let matcher = Matcher::new();
        let result = matcher.refresh_from(&StubSource(Err("timeout".to_string())));
        assert!(matches!(result, Err(Error::SourceUnavailable { .. })));
        assert_eq!(matcher.state(), State::Empty);
        assert!(!matcher.contains_str("192.0.2.1").unwrap());
    }

    #[test]
    fn test_empty_lists_build_an_empty_snapshot() {
        let matcher = Matcher::new();
        let report = matcher.load(&RangeLists::default()).unwrap();
        assert_eq!(report.ipv4_intervals, 0);
        assert_eq!(report.ipv6_intervals, 0);
        assert_eq!(matcher.state(), State::Empty);
        assert!(!matcher.contains_str("192.0.2.1").unwrap());
    }

    #[test]
    fn test_concurrent_load_is_rejected() {
        let matcher = Matcher::new();
        let _held = matcher.writer.lock().unwrap();
        assert!(matches!(
            matcher.load(&cloudflare_style_lists()),
            Err(Error::RefreshInProgress)
        ));
    }

    #[test]
    fn test_reader_keeps_old_snapshot_across_swap() {
        let matcher = Matcher::new();
        matcher.load(&cloudflare_style_lists()).unwrap();

        let held = matcher.snapshot();
        matcher
            .load(&RangeLists {
                ipv4_cidrs: vec!["198.51.100.0/24".to_string()],
                ipv6_cidrs: vec![],
            })
            .unwrap();

        // The held generation is unchanged even though the matcher moved on
        assert_eq!(held.generation(), 1);
        assert!(held.contains(addr_codec::parse_addr("192.0.2.1").unwrap()));
        assert_eq!(matcher.snapshot().generation(), 2);
    }

    #[test]
    fn test_restore_seeds_a_warm_start() {
        let source = Matcher::new();
        source.load(&cloudflare_style_lists()).unwrap();
        let persisted = serde_json::to_string(&*source.snapshot()).unwrap();

        let matcher = Matcher::new();
        matcher
            .restore(serde_json::from_str(&persisted).unwrap())
            .unwrap();
        assert_eq!(matcher.state(), State::Ready);
        assert!(matcher.contains_str("192.0.2.1").unwrap());
    }
}
