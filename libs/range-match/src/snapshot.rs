use addr_codec::{cidr_to_range, Addr, CidrRange, Interval};
use serde::{Deserialize, Serialize};

use crate::set::RangeSet;

/// The two CIDR lists published by the upstream source, one per address family
///
/// This is the document shape the matcher consumes; fetching it is the host's
/// concern (see [`crate::RangeSource`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLists {
    pub ipv4_cidrs: Vec<String>,
    pub ipv6_cidrs: Vec<String>,
}

/// One immutable generation of loaded range data
///
/// Built wholesale from a pair of CIDR lists and never mutated afterwards, so
/// a query holding a reference to a snapshot sees internally consistent data
/// no matter what a concurrent refresh is doing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SnapshotData", into = "SnapshotData")]
pub struct Snapshot {
    generation: u64,
    v4: RangeSet<u32>,
    v6: RangeSet<u128>,
}

impl Snapshot {
    /// The zero-generation snapshot that matches nothing
    #[must_use]
    pub fn empty() -> Self {
        Self {
            generation: 0,
            v4: RangeSet::default(),
            v6: RangeSet::default(),
        }
    }

    /// Build a snapshot from the upstream CIDR lists
    ///
    /// A malformed entry is skipped with a warning rather than failing the
    /// whole build; the upstream data is operator-controlled and assumed
    /// mostly well-formed, but one bad entry must not take the matcher down.
    /// Returns the snapshot and the number of entries skipped.
    #[must_use]
    pub fn build(generation: u64, lists: &RangeLists) -> (Self, usize) {
        let mut v4: Vec<Interval<u32>> = Vec::with_capacity(lists.ipv4_cidrs.len());
        let mut v6: Vec<Interval<u128>> = Vec::with_capacity(lists.ipv6_cidrs.len());
        let mut skipped = 0usize;

        for (cidrs, expect_v4) in [(&lists.ipv4_cidrs, true), (&lists.ipv6_cidrs, false)] {
            for cidr in cidrs {
                match cidr_to_range(cidr) {
                    Ok(CidrRange::V4(interval)) if expect_v4 => v4.push(interval),
                    Ok(CidrRange::V6(interval)) if !expect_v4 => v6.push(interval),
                    Ok(_) => {
                        log::warn!("Skipping CIDR block listed under the wrong family: {cidr:?}");
                        skipped += 1;
                    }
                    Err(err) => {
                        log::warn!("Skipping malformed CIDR block {cidr:?}: {err}");
                        skipped += 1;
                    }
                }
            }
        }

        (
            Self {
                generation,
                v4: RangeSet::new(v4),
                v6: RangeSet::new(v6),
            },
            skipped,
        )
    }

    /// Check whether an address falls inside this snapshot's ranges
    ///
    /// The two families are never intermixed: an IPv4 address is only checked
    /// against IPv4 intervals, and likewise for IPv6.
    #[must_use]
    pub fn contains(&self, addr: Addr) -> bool {
        match addr {
            Addr::V4(addr) => self.v4.contains(addr),
            Addr::V6(addr) => self.v6.contains(addr),
        }
    }

    /// The generation counter, starting at 0 for [`Snapshot::empty`] and
    /// incremented by the matcher on every successful load
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if the snapshot holds no intervals in either family
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// The IPv4 interval set
    #[must_use]
    pub fn v4(&self) -> &RangeSet<u32> {
        &self.v4
    }

    /// The IPv6 interval set
    #[must_use]
    pub fn v6(&self) -> &RangeSet<u128> {
        &self.v6
    }
}

/// Serialized form of a snapshot: plain interval lists per family
///
/// Deserialization goes back through `RangeSet::new`, so a hand-edited or
/// stale cache file still ends up sorted and merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotData {
    generation: u64,
    ipv4_intervals: Vec<Interval<u32>>,
    ipv6_intervals: Vec<Interval<u128>>,
}

impl From<SnapshotData> for Snapshot {
    fn from(data: SnapshotData) -> Self {
        Self {
            generation: data.generation,
            v4: RangeSet::new(data.ipv4_intervals),
            v6: RangeSet::new(data.ipv6_intervals),
        }
    }
}

impl From<Snapshot> for SnapshotData {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            generation: snapshot.generation,
            ipv4_intervals: snapshot.v4.intervals().to_vec(),
            ipv6_intervals: snapshot.v6.intervals().to_vec(),
        }
    }
}
