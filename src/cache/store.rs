//! Entry tables and the store that spans them
//!
//! Each memoized function owns a typed [`EntryTable`]. Tables register with a
//! [`MemoStore`], which is what makes tag invalidation and cleanup reach every
//! entry in the process regardless of its result type. The store keeps weak
//! references only; a table disappears once its last `Memoized` handle drops.

use crate::cache::{
    config::MemoConfig,
    entry::{CacheEntry, PriorMetadata},
    engine::Memoized,
    invalidation::{InvalidationEvent, InvalidationReason},
    types::{CacheKey, MemoStats},
};
use crate::error::MemoError;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

static GLOBAL_STORE: Lazy<Arc<MemoStore>> = Lazy::new(|| {
    let config = MemoConfig::from_env().unwrap_or_else(|e| {
        warn!("Ignoring memo configuration from environment: {}", e);
        MemoConfig::default()
    });
    Arc::new(MemoStore::new(config))
});

/// Outcome of looking a key up in a table
#[derive(Debug)]
pub(crate) enum Lookup<T> {
    Fresh(T),
    Expired(PriorMetadata),
    Missing,
}

/// Type-erased view of a table, used for store-wide operations
pub(crate) trait TagIndex: Send + Sync {
    fn table_id(&self) -> &str;

    fn entry_count(&self) -> usize;

    /// Remove every entry carrying `tag`, returning the removed keys
    fn remove_tagged(&self, tag: &str) -> Vec<CacheKey>;

    /// Remove every entry expired at `now`, returning the removed keys
    fn remove_expired(&self, now: Instant) -> Vec<CacheKey>;

    fn remove_all(&self) -> Vec<CacheKey>;
}

/// Key → entry mapping for one memoized function
pub struct EntryTable<T> {
    id: String,
    entries: DashMap<CacheKey, CacheEntry<T>>,
}

impl<T> EntryTable<T> {
    pub(crate) fn new(name: Option<String>) -> Self {
        let id = name.unwrap_or_else(|| {
            let uuid = Uuid::new_v4().simple().to_string();
            format!("memo-{}", &uuid[..8])
        });

        Self {
            id,
            entries: DashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&self, key: CacheKey, entry: CacheEntry<T>) {
        self.entries.insert(key, entry);
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn remove_where<P>(&self, mut predicate: P) -> Vec<CacheKey>
    where
        P: FnMut(&CacheEntry<T>) -> bool,
    {
        let mut removed = Vec::new();
        self.entries.retain(|key, entry| {
            if predicate(entry) {
                removed.push(key.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}

impl<T: Clone> EntryTable<T> {
    pub(crate) fn lookup(&self, key: &str, now: Instant) -> Lookup<T> {
        match self.entries.get(key) {
            None => Lookup::Missing,
            Some(entry) if entry.is_expired_at(now) => Lookup::Expired(entry.prior_metadata()),
            Some(entry) => Lookup::Fresh(entry.data.clone()),
        }
    }

    /// Copy of the entry stored under `key`
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.get(key).map(|entry| entry.clone())
    }
}

impl<T: Send + Sync> TagIndex for EntryTable<T> {
    fn table_id(&self) -> &str {
        &self.id
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn remove_tagged(&self, tag: &str) -> Vec<CacheKey> {
        self.remove_where(|entry| entry.has_tag(tag))
    }

    fn remove_expired(&self, now: Instant) -> Vec<CacheKey> {
        self.remove_where(|entry| entry.is_expired_at(now))
    }

    fn remove_all(&self) -> Vec<CacheKey> {
        self.remove_where(|_| true)
    }
}

/// Registry of entry tables sharing configuration and statistics
pub struct MemoStore {
    config: MemoConfig,
    tables: Mutex<Vec<Weak<dyn TagIndex>>>,
    stats: Mutex<MemoStats>,
}

impl MemoStore {
    /// Create a new store with the given configuration
    pub fn new(config: MemoConfig) -> Self {
        info!("Initializing memo store with config: {:?}", config);

        Self {
            config,
            tables: Mutex::new(Vec::new()),
            stats: Mutex::new(MemoStats::default()),
        }
    }

    /// The process-wide store used by [`crate::wrap`] and [`crate::invalidate_by_tag`]
    ///
    /// Configured from the environment on first use.
    pub fn global() -> Arc<MemoStore> {
        GLOBAL_STORE.clone()
    }

    pub fn config(&self) -> &MemoConfig {
        &self.config
    }

    /// Memoize `func` with a table registered in this store
    pub fn wrap<A, T, E, F, Fut>(self: &Arc<Self>, func: F) -> Memoized<A, T, E, F>
    where
        A: Serialize,
        T: Clone + Send + Sync + 'static,
        E: From<MemoError>,
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, E>>,
    {
        Memoized::new(func, None, Arc::clone(self))
    }

    /// Like [`MemoStore::wrap`], naming the table for logs and events
    pub fn wrap_named<A, T, E, F, Fut>(
        self: &Arc<Self>,
        name: impl Into<String>,
        func: F,
    ) -> Memoized<A, T, E, F>
    where
        A: Serialize,
        T: Clone + Send + Sync + 'static,
        E: From<MemoError>,
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, E>>,
    {
        Memoized::new(func, Some(name.into()), Arc::clone(self))
    }

    pub(crate) fn register<T>(&self, table: &Arc<EntryTable<T>>)
    where
        T: Send + Sync + 'static,
    {
        let table: Arc<dyn TagIndex> = table.clone();
        let mut tables = self.tables.lock();
        tables.retain(|weak| weak.strong_count() > 0);
        tables.push(Arc::downgrade(&table));
        debug!("Registered entry table: {}", table.table_id());
    }

    fn live_tables(&self) -> Vec<Arc<dyn TagIndex>> {
        let mut tables = self.tables.lock();
        tables.retain(|weak| weak.strong_count() > 0);
        tables.iter().filter_map(Weak::upgrade).collect()
    }

    /// Delete every entry, in every table, whose tags contain `tag`
    ///
    /// Returns the number of removed entries; zero when nothing matched.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let events: Vec<InvalidationEvent> = self
            .live_tables()
            .iter()
            .filter_map(|table| {
                let keys = table.remove_tagged(tag);
                (!keys.is_empty()).then(|| {
                    InvalidationEvent::new(
                        InvalidationReason::TagMatch {
                            tag: tag.to_string(),
                        },
                        table.table_id(),
                        keys,
                    )
                })
            })
            .collect();

        let removed: usize = events.iter().map(InvalidationEvent::len).sum();
        self.record(|stats| stats.invalidations += removed as u64);
        info!("Invalidated {} entries with tag: {}", removed, tag);

        removed
    }

    /// Remove all entries past their life
    pub fn cleanup_expired(&self) -> Vec<InvalidationEvent> {
        let now = Instant::now();
        let events: Vec<InvalidationEvent> = self
            .live_tables()
            .iter()
            .filter_map(|table| {
                let keys = table.remove_expired(now);
                (!keys.is_empty()).then(|| {
                    InvalidationEvent::new(InvalidationReason::Expired, table.table_id(), keys)
                })
            })
            .collect();

        let removed: usize = events.iter().map(InvalidationEvent::len).sum();
        if removed > 0 {
            self.record(|stats| stats.invalidations += removed as u64);
            debug!("Cleaned up {} expired entries", removed);
        }

        events
    }

    /// Clear all entries from every table
    pub fn clear(&self) -> usize {
        let removed: usize = self
            .live_tables()
            .iter()
            .map(|table| table.remove_all().len())
            .sum();

        self.record(|stats| stats.invalidations += removed as u64);
        info!("Cleared {} entries from memo store", removed);
        removed
    }

    /// Number of entries across all tables
    pub fn len(&self) -> usize {
        self.live_tables()
            .iter()
            .map(|table| table.entry_count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live tables
    pub fn table_count(&self) -> usize {
        self.live_tables().len()
    }

    /// Get memo statistics
    pub fn stats(&self) -> MemoStats {
        let mut stats = self.stats.lock().clone();
        stats.entries = self.len();
        stats
    }

    pub(crate) fn record<F>(&self, update: F)
    where
        F: FnOnce(&mut MemoStats),
    {
        if self.config.enable_metrics {
            update(&mut self.stats.lock());
        }
    }
}

/// Background task for automatic removal of expired entries
pub async fn start_auto_cleanup(store: Arc<MemoStore>) {
    let interval = store.config.cleanup_interval;

    info!("Starting automatic memo cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let events = store.cleanup_expired();
        if !events.is_empty() {
            debug!("Auto cleanup: {} events", events.len());
        }
    }
}
