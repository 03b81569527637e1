use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::{Partition, ScoredMatch, SearchOptions};

/// Upper bound on cached queries. The oldest result is evicted past it.
pub const MAX_ENTRIES: usize = 1024;

/// Identifies one ranked result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub partition: Partition,
    /// Snapshot generation the result was computed against.
    pub generation: u64,
    query: String,
    options: String,
}

impl CacheKey {
    pub fn new(
        partition: Partition,
        generation: u64,
        query: &str,
        options: &SearchOptions,
    ) -> Self {
        let query = query.trim().to_lowercase();
        Self {
            partition,
            generation,
            query: if query.is_empty() { "all".to_string() } else { query },
            options: serde_json::to_string(options).unwrap_or_default(),
        }
    }
}

/// Time-bounded cache of ranked search results.
///
/// Keys carry the snapshot generation, so results computed against an old
/// snapshot are never served once a partition has been reloaded.
#[derive(Debug)]
pub struct QueryCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<CacheKey, CachedResult>>,
}

#[derive(Debug)]
struct CachedResult {
    stored_at: Instant,
    matches: Arc<Vec<ScoredMatch>>,
}

impl QueryCache {
    /// A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<ScoredMatch>>> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let cached = entries
            .get(key)
            .map(|cached| (cached.stored_at.elapsed() < self.ttl, cached.matches.clone()));
        match cached {
            Some((true, matches)) => Some(matches),
            Some((false, _)) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a result, first dropping expired entries and entries of older
    /// generations of the same partition.
    pub fn insert(&self, key: CacheKey, matches: Arc<Vec<ScoredMatch>>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|existing, cached| {
            cached.stored_at.elapsed() < self.ttl
                && !(existing.partition == key.partition && existing.generation < key.generation)
        });

        while entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, cached)| cached.stored_at)
                .map(|(oldest, _)| oldest.clone());
            match oldest {
                Some(oldest) => {
                    entries.remove(&oldest);
                }
                None => break,
            }
        }

        entries.insert(
            key,
            CachedResult {
                stored_at: Instant::now(),
                matches,
            },
        );
    }

    /// Drop every cached result of one partition.
    pub fn invalidate(&self, partition: Partition) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|key, _| key.partition != partition);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Number of unexpired results.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
