use std::collections::HashMap;
use std::path::PathBuf;

/// In-memory bookkeeping for one cached key.
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    /// Path of the backing record file.
    pub path: PathBuf,
    /// Successful read hits since the last write.
    pub usage_count: u64,
    /// Time of the last write, in epoch milliseconds.
    pub added_at: i64,
    /// Expiry deadline in epoch milliseconds. `None` never expires.
    pub expires_at: Option<i64>,
}

impl IndexEntry {
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// The in-memory index over one cache directory.
///
/// Source of truth for fast decisions; recoverable from disk when an entry
/// is absent. Ranking and expiry scans are plain functions over the map so
/// they stay testable without touching the filesystem.
#[derive(Debug, Default)]
pub(crate) struct CacheIndex {
    entries: HashMap<String, IndexEntry>,
}

impl CacheIndex {
    pub fn get_mut(&mut self, key: &str) -> Option<&mut IndexEntry> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: String, entry: IndexEntry) {
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<IndexEntry> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys whose deadline has passed, with their record paths.
    pub fn expired(&self, now: i64) -> Vec<(String, PathBuf)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.path.clone()))
            .collect()
    }

    /// Keys to drop in one eviction pass, coldest first.
    ///
    /// The pass removes a `trim_percent` share of the index (floored), but
    /// never less than the overflow past `max_entries`, so a write that
    /// grows a tiny index past its cap still restores the bound. Entries
    /// rank ascending by usage count, then by age, then by key so that ties
    /// within one millisecond stay deterministic.
    pub fn eviction_victims(&self, trim_percent: u32, max_entries: usize) -> Vec<String> {
        let len = self.entries.len();
        let proportional = len * trim_percent as usize / 100;
        let overflow = len.saturating_sub(max_entries);
        let to_remove = proportional.max(overflow);
        if to_remove == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<_> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.usage_count, entry.added_at, key))
            .collect();
        ranked.sort_unstable();

        ranked
            .into_iter()
            .take(to_remove)
            .map(|(_, _, key)| key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(usage_count: u64, added_at: i64) -> IndexEntry {
        IndexEntry {
            path: PathBuf::from("unused"),
            usage_count,
            added_at,
            expires_at: None,
        }
    }

    fn index_of(entries: &[(&str, u64, i64)]) -> CacheIndex {
        let mut index = CacheIndex::default();
        for (key, usage, added) in entries {
            index.insert((*key).to_owned(), entry(*usage, *added));
        }
        index
    }

    #[test]
    fn trims_the_least_used_share() {
        let index = index_of(&[
            ("a", 5, 0),
            ("b", 2, 0),
            ("c", 7, 0),
            ("d", 1, 0),
            ("e", 3, 0),
        ]);

        let mut victims = index.eviction_victims(40, 5);
        victims.sort();
        assert_eq!(victims, ["b", "d"]);
    }

    #[test]
    fn low_percentages_may_trim_nothing() {
        let index = index_of(&[("a", 0, 0), ("b", 0, 1), ("c", 0, 2)]);
        assert!(index.eviction_victims(10, 5).is_empty());
    }

    #[test]
    fn overflow_is_always_shed() {
        // 10% of two entries floors to zero, the overflow still goes
        let index = index_of(&[("a", 0, 0), ("b", 0, 0)]);
        assert_eq!(index.eviction_victims(10, 1), ["a"]);
    }

    #[test]
    fn ties_prefer_the_oldest() {
        let index = index_of(&[("newer", 1, 200), ("older", 1, 100), ("hot", 9, 0)]);
        assert_eq!(index.eviction_victims(34, 3), ["older"]);
    }

    #[test]
    fn expired_scan_skips_live_entries() {
        let mut index = CacheIndex::default();
        index.insert(
            "gone".into(),
            IndexEntry {
                expires_at: Some(50),
                ..entry(0, 0)
            },
        );
        index.insert(
            "later".into(),
            IndexEntry {
                expires_at: Some(500),
                ..entry(0, 0)
            },
        );
        index.insert("forever".into(), entry(0, 0));

        let expired = index.expired(100);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, "gone");
    }
}
