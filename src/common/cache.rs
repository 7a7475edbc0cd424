//! Snapshot persistence between runs
//!
//! The cache is an opportunistic warm start so a cold process can serve
//! queries before its first fetch completes. The upstream source remains the
//! authority; a cache that fails to load is discarded, not repaired.

use std::path::Path;

use range_match::Snapshot;

type CacheError = Box<dyn std::error::Error + Send + Sync>;

/// Load a previously persisted snapshot, or `None` if the file does not exist
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, CacheError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&json)?;
    Ok(Some(snapshot))
}

/// Persist a snapshot for the next cold start
pub fn store_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), CacheError> {
    let json = serde_json::to_string(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_match::{Matcher, RangeLists};

    #[test]
    fn test_snapshot_survives_a_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "cloudmask-cache-test-{}.json",
            std::process::id()
        ));

        let matcher = Matcher::new();
        matcher
            .load(&RangeLists {
                ipv4_cidrs: vec!["192.0.2.0/24".to_string()],
                ipv6_cidrs: vec!["2001:db8::/32".to_string()],
            })
            .unwrap();
        store_snapshot(&path, &matcher.snapshot()).unwrap();

        let restored = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(restored.generation(), 1);
        assert!(restored.contains(addr_codec::parse_addr("192.0.2.1").unwrap()));
        assert!(!restored.contains(addr_codec::parse_addr("192.0.3.1").unwrap()));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_cache_is_not_an_error() {
        let path = std::env::temp_dir().join("cloudmask-cache-test-missing.json");
        assert!(load_snapshot(&path).unwrap().is_none());
    }
}
