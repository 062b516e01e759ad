use crate::key::CacheKey;
use log::{debug, trace};
use std::collections::HashMap;
use vdc_region::RegionBuffer;

struct Entry {
    buffer: RegionBuffer,
    bytes: usize,
    locks: u32,
    last_used: u64,
}

/// LRU cache over `RegionBuffer`s, keyed as in §3/§4.8. Eviction scans
/// unlocked entries for the lowest `last_used` tick rather than
/// maintaining a linked recency list — caches stay small enough (bounded
/// by the memory budget) that the scan cost is not worth a doubly-linked
/// structure.
pub struct GridCache {
    entries: HashMap<CacheKey, Entry>,
    budget_bytes: usize,
    used_bytes: usize,
    tick: u64,
}

impl GridCache {
    pub fn new(budget_bytes: usize) -> Self {
        GridCache { entries: HashMap::new(), budget_bytes, used_bytes: 0, tick: 0 }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<&RegionBuffer> {
        self.tick += 1;
        let tick = self.tick;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_used = tick;
            trace!("cache hit: {:?}", key);
            Some(&entry.buffer)
        } else {
            None
        }
    }

    pub fn lock(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.locks += 1;
        }
    }

    pub fn unlock(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.locks = entry.locks.saturating_sub(1);
        }
    }

    /// Inserts a freshly computed buffer, evicting unlocked entries in
    /// least-recently-used order until it fits the budget. Returns `false`
    /// (without inserting) if eviction alone cannot make room — the caller
    /// translates this to `OutOfMemory`.
    pub fn insert(&mut self, key: CacheKey, buffer: RegionBuffer, initially_locked: bool) -> bool {
        let bytes = buffer.data.len() * std::mem::size_of::<f64>();
        while self.used_bytes + bytes > self.budget_bytes {
            if !self.evict_one() {
                return false;
            }
        }
        self.tick += 1;
        let tick = self.tick;
        self.used_bytes += bytes;
        self.entries.insert(key, Entry { buffer, bytes, locks: if initially_locked { 1 } else { 0 }, last_used: tick });
        true
    }

    fn evict_one(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .filter(|(_, e)| e.locks == 0)
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone());
        match victim {
            Some(key) => {
                if let Some(entry) = self.entries.remove(&key) {
                    self.used_bytes -= entry.bytes;
                    debug!("evicting cache entry: {:?}", key);
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(n: usize) -> RegionBuffer {
        RegionBuffer { data: vec![0.0; n], dims: [n, 1, 1], origin: [0, 0, 0] }
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::new(name, 0, 0, 0, [0, 0, 0], [1, 1, 1])
    }

    #[test]
    fn hit_after_insert_miss_before() {
        let mut c = GridCache::new(1_000_000);
        assert!(c.get(&key("a")).is_none());
        c.insert(key("a"), buf(4), false);
        assert!(c.get(&key("a")).is_some());
    }

    #[test]
    fn evicts_least_recently_used_unlocked_entry_when_budget_exceeded() {
        // each buffer of 100 f64 = 800 bytes; budget fits exactly one
        let mut c = GridCache::new(900);
        c.insert(key("a"), buf(100), false);
        c.get(&key("a")); // bump recency
        c.insert(key("b"), buf(100), false);
        assert!(c.get(&key("a")).is_none());
        assert!(c.get(&key("b")).is_some());
    }

    #[test]
    fn locked_entries_survive_eviction_pressure() {
        let mut c = GridCache::new(900);
        c.insert(key("a"), buf(100), true);
        let inserted = c.insert(key("b"), buf(100), false);
        assert!(!inserted);
        assert!(c.get(&key("a")).is_some());
    }

    #[test]
    fn unlock_makes_entry_eligible_again() {
        let mut c = GridCache::new(900);
        c.insert(key("a"), buf(100), true);
        c.unlock(&key("a"));
        assert!(c.insert(key("b"), buf(100), false));
        assert!(c.get(&key("a")).is_none());
    }
}
