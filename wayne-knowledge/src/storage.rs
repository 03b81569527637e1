use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::KnowledgeSettings;
use crate::cache::{CacheKey, QueryCache};
use crate::errors::KnowledgeResult;
use crate::models::{
    KnowledgeEntry, KnowledgeStats, LoadReport, Partition, ScoredMatch, SearchOptions,
};
use crate::parser::parse_partition;
use crate::search::{ScoringParams, rank};
use crate::sources::KnowledgeSource;

/// Immutable view of one partition as of one load.
#[derive(Debug)]
pub struct PartitionSnapshot {
    pub partition: Partition,
    /// Zero until the first successful load.
    pub generation: u64,
    pub entries: Vec<KnowledgeEntry>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl PartitionSnapshot {
    fn empty(partition: Partition) -> Self {
        Self {
            partition,
            generation: 0,
            entries: Vec::new(),
            loaded_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory knowledge index over the three partitions.
///
/// Each partition is an `Arc` swapped whole on reload; readers clone the
/// `Arc` and keep scoring their snapshot while a reload is in flight.
#[derive(Clone)]
pub struct KnowledgeStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    source: Arc<dyn KnowledgeSource>,
    settings: KnowledgeSettings,
    partitions: RwLock<HashMap<Partition, Arc<PartitionSnapshot>>>,
    next_generation: AtomicU64,
    cache: QueryCache,
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("stats", &self.stats())
            .finish()
    }
}

impl KnowledgeStore {
    pub fn new(source: Arc<dyn KnowledgeSource>, settings: KnowledgeSettings) -> Self {
        let partitions = Partition::ALL
            .into_iter()
            .map(|partition| (partition, Arc::new(PartitionSnapshot::empty(partition))))
            .collect();
        let cache = QueryCache::new(Duration::from_secs(settings.cache_ttl_seconds));
        Self {
            inner: Arc::new(StoreInner {
                source,
                settings,
                partitions: RwLock::new(partitions),
                next_generation: AtomicU64::new(1),
                cache,
            }),
        }
    }

    pub fn settings(&self) -> &KnowledgeSettings {
        &self.inner.settings
    }

    /// Fetch, parse and install a partition.
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// returned untouched.
    pub async fn load(&self, partition: Partition) -> KnowledgeResult<Arc<PartitionSnapshot>> {
        let raw = match self.inner.source.read_partition(partition).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    "Failed to load {} knowledge from {}: {}",
                    partition,
                    self.inner.source.describe(partition),
                    err
                );
                return Err(err);
            }
        };

        let entries = parse_partition(&raw, partition);
        let snapshot = Arc::new(PartitionSnapshot {
            partition,
            generation: self.inner.next_generation.fetch_add(1, Ordering::Relaxed),
            entries,
            loaded_at: Some(Utc::now()),
        });

        {
            let mut partitions = self
                .inner
                .partitions
                .write()
                .unwrap_or_else(|e| e.into_inner());
            partitions.insert(partition, snapshot.clone());
        }
        self.inner.cache.invalidate(partition);

        info!(
            "Loaded {} knowledge base with {} entries (generation {})",
            partition,
            snapshot.len(),
            snapshot.generation
        );
        Ok(snapshot)
    }

    /// Replace a partition. Readers see the old snapshot until the new one
    /// is fully parsed.
    pub async fn reload(&self, partition: Partition) -> KnowledgeResult<Arc<PartitionSnapshot>> {
        self.load(partition).await
    }

    /// Load every partition concurrently and wait for all of them.
    pub async fn load_all(&self) -> LoadReport {
        let started = std::time::Instant::now();
        let results = join_all(Partition::ALL.into_iter().map(|partition| async move {
            (partition, self.load(partition).await)
        }))
        .await;

        let mut report = LoadReport::default();
        for (partition, result) in results {
            match result {
                Ok(snapshot) => report.loaded.push((partition, snapshot.len())),
                Err(err) => report.failed.push((partition, err)),
            }
        }
        info!(
            "Knowledge bases loaded in {:.2}ms ({} entries, {} failed)",
            started.elapsed().as_secs_f64() * 1000.0,
            report.total_entries(),
            report.failed.len()
        );
        report
    }

    /// Current snapshot of a partition.
    pub fn all(&self, partition: Partition) -> Arc<PartitionSnapshot> {
        let partitions = self
            .inner
            .partitions
            .read()
            .unwrap_or_else(|e| e.into_inner());
        partitions
            .get(&partition)
            .cloned()
            .unwrap_or_else(|| Arc::new(PartitionSnapshot::empty(partition)))
    }

    /// Ranked matches for `query` within one partition, scored against a
    /// single snapshot.
    pub fn search(
        &self,
        partition: Partition,
        query: &str,
        options: &SearchOptions,
    ) -> Arc<Vec<ScoredMatch>> {
        let snapshot = self.all(partition);
        let key = CacheKey::new(partition, snapshot.generation, query, options);
        if let Some(hit) = self.inner.cache.get(&key) {
            return hit;
        }

        let params = ScoringParams::resolve(&self.inner.settings.search, options);
        let matches = Arc::new(rank(&snapshot.entries, query, &params));
        // A reload may have landed while scoring; its results replace ours.
        if self.all(partition).generation == snapshot.generation {
            self.inner.cache.insert(key, matches.clone());
        }
        matches
    }

    pub fn stats(&self) -> KnowledgeStats {
        let partitions = self
            .inner
            .partitions
            .read()
            .unwrap_or_else(|e| e.into_inner());
        let count = |partition| partitions.get(&partition).map_or(0, |s| s.len());
        KnowledgeStats {
            text: count(Partition::Text),
            image: count(Partition::Image),
            code: count(Partition::Code),
            last_updated: partitions.values().filter_map(|s| s.loaded_at).max(),
            cache_size: self.inner.cache.len(),
        }
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        info!("Knowledge cache cleared");
    }
}
