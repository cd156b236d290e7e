//! Call interception and storage decisions
//!
//! [`Memoized`] wraps an async function returning `Result<Option<T>, E>`.
//! `None` is the absent-result marker: it is returned to the caller but never
//! stored. `Err` is returned unchanged and never stored either.
//!
//! Each call runs inside a fresh cache context, so the function (and anything
//! it awaits) can call [`crate::set_life`] and [`crate::add_tags`] to decide
//! how its own result is kept.
//!
//! Identical concurrent calls are not de-duplicated: both may run the function
//! and the last one to finish overwrites the other's entry.

use crate::cache::{
    config::MissingContextPolicy,
    entry::{CacheEntry, PriorMetadata},
    invalidation::InvalidationReason,
    key::derive_key,
    store::{EntryTable, Lookup, MemoStore},
    types::CacheKey,
};
use crate::context::{current_context, run_with_context, CacheContextRecord, ContextHandle};
use crate::error::MemoError;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error};

/// A memoized async function
pub struct Memoized<A, T, E, F> {
    func: Arc<F>,
    table: Arc<EntryTable<T>>,
    store: Arc<MemoStore>,
    _signature: PhantomData<fn(A) -> Result<Option<T>, E>>,
}

impl<A, T, E, F> Clone for Memoized<A, T, E, F> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            table: Arc::clone(&self.table),
            store: Arc::clone(&self.store),
            _signature: PhantomData,
        }
    }
}

impl<A, T, E, F, Fut> Memoized<A, T, E, F>
where
    A: Serialize,
    T: Clone + Send + Sync + 'static,
    E: From<MemoError>,
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    pub(crate) fn new(func: F, name: Option<String>, store: Arc<MemoStore>) -> Self {
        let table = Arc::new(EntryTable::new(name));
        store.register(&table);

        Self {
            func: Arc::new(func),
            table,
            store,
            _signature: PhantomData,
        }
    }

    /// Call the function, answering from the cache when a fresh entry exists
    pub async fn call(&self, args: A) -> Result<Option<T>, E> {
        let key = derive_key(&args)?;
        run_with_context(CacheContextRecord::new(), self.lookup_or_compute(key, args)).await
    }

    async fn lookup_or_compute(&self, key: CacheKey, args: A) -> Result<Option<T>, E> {
        let Some(ctx) = current_context() else {
            error!(
                "Cache context missing in {} for key {}; result will not be cached",
                self.table.id(),
                key
            );
            return match self.store.config().missing_context {
                MissingContextPolicy::Recompute => (*self.func)(args).await,
                MissingContextPolicy::Fail => Err(MemoError::ContextMissing {
                    operation: "memoized call",
                }
                .into()),
            };
        };

        let prior = match self.table.lookup(&key, Instant::now()) {
            Lookup::Fresh(data) => {
                debug!("Memo hit in {}: {}", self.table.id(), key);
                self.store.record(|stats| stats.hits += 1);
                return Ok(Some(data));
            }
            Lookup::Expired(prior) => {
                debug!("Memo entry expired in {}: {}", self.table.id(), key);
                self.store.record(|stats| {
                    stats.misses += 1;
                    stats.expirations += 1;
                });
                Some(prior)
            }
            Lookup::Missing => {
                debug!("Memo miss in {}: {}", self.table.id(), key);
                self.store.record(|stats| stats.misses += 1);
                None
            }
        };

        self.compute_and_store(key, args, &ctx, prior).await
    }

    async fn compute_and_store(
        &self,
        key: CacheKey,
        args: A,
        ctx: &ContextHandle,
        prior: Option<PriorMetadata>,
    ) -> Result<Option<T>, E> {
        let result = match (*self.func)(args).await {
            Ok(result) => result,
            Err(err) => {
                debug!("Memoized function failed in {}: {}", self.table.id(), key);
                self.store.record(|stats| stats.failures += 1);
                return Err(err);
            }
        };

        let Some(data) = result else {
            debug!("No value produced in {} for {}; not caching", self.table.id(), key);
            self.store.record(|stats| stats.absent_results += 1);
            return Ok(None);
        };

        let entry = CacheEntry::resolve(
            data.clone(),
            ctx.snapshot(),
            prior,
            self.store.config().default_life,
        );
        debug!(
            "Storing memo entry in {}: {} (life: {:?}, tags: {:?})",
            self.table.id(),
            key,
            entry.life,
            entry.tags
        );
        self.table.insert(key, entry);
        self.store.record(|stats| stats.stores += 1);

        Ok(Some(data))
    }

    /// Copy of the entry cached for `args`, fresh or stale
    pub fn entry(&self, args: &A) -> crate::Result<Option<CacheEntry<T>>> {
        let key = derive_key(args)?;
        Ok(self.table.get(&key))
    }

    /// Remove the entry cached for `args`
    pub fn invalidate(&self, args: &A) -> crate::Result<bool> {
        let key = derive_key(args)?;
        let removed = self.table.remove(&key);
        if removed {
            debug!(
                "Removed memo entry in {} ({}): {}",
                self.table.id(),
                InvalidationReason::Manual,
                key
            );
            self.store.record(|stats| stats.invalidations += 1);
        }
        Ok(removed)
    }
}

impl<A, T, E, F> Memoized<A, T, E, F> {
    /// Identifier of this function's entry table
    pub fn table_id(&self) -> &str {
        self.table.id()
    }

    /// Number of entries cached for this function
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drop every entry cached for this function
    pub fn clear(&self) -> usize
    where
        T: Send + Sync,
    {
        use crate::cache::store::TagIndex;

        let removed = self.table.remove_all().len();
        self.store.record(|stats| stats.invalidations += removed as u64);
        debug!(
            "Removed {} memo entries in {} ({})",
            removed,
            self.table.id(),
            InvalidationReason::Cleared
        );
        removed
    }
}
