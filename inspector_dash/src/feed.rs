//! Feed reconciler: merges the one-shot snapshot with the live stream
//!
//! The feed is kept as two segments, `live` (newest first) followed by
//! `snapshot` (in delivery order). `hydrate` only ever writes the snapshot
//! segment and `ingest_live` only ever pushes to the front of the live segment,
//! so every live record renders ahead of every snapshot record no matter which
//! side of the race finished first.

use std::collections::VecDeque;

/// Stable identity of a feed entry, assigned at insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(u64);

impl EntryKey {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    key: EntryKey,
    record: T,
}

/// Ordered, newest-first view over snapshot and live records
#[derive(Debug, Clone)]
pub struct Feed<T> {
    live: VecDeque<Entry<T>>,
    snapshot: Vec<Entry<T>>,
    next_key: u64,
    capacity: Option<usize>,
    hydrated: bool,
}

impl<T> Feed<T> {
    /// Unbounded feed
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Feed that evicts the oldest entries once `capacity` is exceeded
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            live: VecDeque::new(),
            snapshot: Vec::new(),
            next_key: 0,
            capacity: capacity.map(|c| c.max(1)),
            hydrated: false,
        }
    }

    fn next_entry(&mut self, record: T) -> Entry<T> {
        let key = EntryKey(self.next_key);
        self.next_key += 1;
        Entry { key, record }
    }

    /// Install the snapshot behind any live records already present.
    ///
    /// A repeated call replaces the previous snapshot segment only.
    pub fn hydrate(&mut self, records: Vec<T>) {
        let entries: Vec<Entry<T>> = records
            .into_iter()
            .map(|record| self.next_entry(record))
            .collect();
        self.snapshot = entries;
        self.hydrated = true;
        self.evict();
    }

    /// Put a freshly captured record at the head of the feed
    pub fn ingest_live(&mut self, record: T) -> EntryKey {
        let entry = self.next_entry(record);
        let key = entry.key;
        self.live.push_front(entry);
        self.evict();
        key
    }

    // Oldest snapshot records go first, then the oldest live records
    fn evict(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        while self.len() > capacity {
            if self.snapshot.pop().is_none() {
                self.live.pop_back();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.live.len() + self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a snapshot has been installed
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn entry(&self, index: usize) -> Option<&Entry<T>> {
        if index < self.live.len() {
            self.live.get(index)
        } else {
            self.snapshot.get(index - self.live.len())
        }
    }

    /// Record at render position `index`
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entry(index).map(|e| &e.record)
    }

    /// Key of the record at render position `index`
    pub fn key_at(&self, index: usize) -> Option<EntryKey> {
        self.entry(index).map(|e| e.key)
    }

    /// Current render position of `key`, if it is still in the feed
    pub fn position_of(&self, key: EntryKey) -> Option<usize> {
        self.entries().position(|(k, _)| k == key)
    }

    /// Records in render order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries().map(|(_, record)| record)
    }

    /// Keys and records in render order
    pub fn entries(&self) -> impl Iterator<Item = (EntryKey, &T)> {
        self.live
            .iter()
            .chain(self.snapshot.iter())
            .map(|e| (e.key, &e.record))
    }
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(feed: &Feed<&'static str>) -> Vec<&'static str> {
        feed.iter().copied().collect()
    }

    #[test]
    fn test_hydrate_then_live() {
        let mut feed = Feed::new();
        feed.hydrate(vec!["A", "B"]);
        feed.ingest_live("C");
        feed.ingest_live("D");

        assert_eq!(order(&feed), vec!["D", "C", "A", "B"]);
    }

    #[test]
    fn test_live_then_hydrate() {
        let mut feed = Feed::new();
        feed.ingest_live("C");
        feed.ingest_live("D");
        assert!(!feed.is_hydrated());

        feed.hydrate(vec!["A", "B"]);

        assert!(feed.is_hydrated());
        assert_eq!(order(&feed), vec!["D", "C", "A", "B"]);
    }

    #[test]
    fn test_every_interleaving_keeps_live_ahead() {
        let live = ["L0", "L1", "L2", "L3"];
        let snapshot = vec!["S0", "S1", "S2"];

        for hydrate_at in 0..=live.len() {
            let mut feed = Feed::new();
            for (i, record) in live.iter().enumerate() {
                if i == hydrate_at {
                    feed.hydrate(snapshot.clone());
                }
                feed.ingest_live(*record);
            }
            if hydrate_at == live.len() {
                feed.hydrate(snapshot.clone());
            }

            assert_eq!(
                order(&feed),
                vec!["L3", "L2", "L1", "L0", "S0", "S1", "S2"],
                "hydrate at position {}",
                hydrate_at
            );
        }
    }

    #[test]
    fn test_rehydrate_replaces_snapshot_only() {
        let mut feed = Feed::new();
        feed.hydrate(vec!["A", "B"]);
        feed.ingest_live("C");
        feed.hydrate(vec!["X"]);

        assert_eq!(order(&feed), vec!["C", "X"]);
        assert_eq!(feed.live_len(), 1);
        assert_eq!(feed.snapshot_len(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let mut feed: Feed<&str> = Feed::new();
        feed.hydrate(Vec::new());

        assert!(feed.is_empty());
        assert!(feed.is_hydrated());
        assert!(feed.get(0).is_none());
        assert!(feed.key_at(0).is_none());
    }

    #[test]
    fn test_keys_are_stable_across_prepends() {
        let mut feed = Feed::new();
        feed.hydrate(vec!["A", "B"]);
        let key_a = feed.key_at(0).unwrap();

        feed.ingest_live("C");
        feed.ingest_live("D");

        assert_eq!(feed.position_of(key_a), Some(2));
        assert_eq!(feed.get(2), Some(&"A"));
    }

    #[test]
    fn test_keys_are_unique() {
        let mut feed = Feed::new();
        feed.ingest_live("C");
        feed.hydrate(vec!["A", "B"]);
        feed.ingest_live("D");

        let mut keys: Vec<EntryKey> = feed.entries().map(|(k, _)| k).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_capacity_evicts_snapshot_tail_first() {
        let mut feed = Feed::with_capacity(Some(3));
        feed.hydrate(vec!["A", "B"]);
        feed.ingest_live("C");
        feed.ingest_live("D");

        assert_eq!(order(&feed), vec!["D", "C", "A"]);

        feed.ingest_live("E");
        feed.ingest_live("F");

        assert_eq!(order(&feed), vec!["F", "E", "D"]);
        assert_eq!(feed.snapshot_len(), 0);
    }

    #[test]
    fn test_capacity_applies_to_oversized_snapshot() {
        let mut feed = Feed::with_capacity(Some(2));
        feed.ingest_live("L");
        feed.hydrate(vec!["A", "B", "C"]);

        assert_eq!(order(&feed), vec!["L", "A"]);
    }

    #[test]
    fn test_evicted_key_is_gone() {
        let mut feed = Feed::with_capacity(Some(1));
        let first = feed.ingest_live("A");
        feed.ingest_live("B");

        assert!(feed.position_of(first).is_none());
        assert!(feed.iter().all(|r| *r != "A"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let feed: Feed<&str> = Feed::with_capacity(Some(0));
        assert_eq!(feed.capacity(), Some(1));
    }
}
