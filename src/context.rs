//! Ambient per-call cache context
//!
//! Every memoized call runs inside its own [`CacheContextRecord`]. Code reached
//! from that call, however deeply nested and across any number of `.await`
//! points, can read and mutate the record through [`current_context`] without
//! it being passed as an argument.
//!
//! The record lives in a tokio task-local, so it follows the future it was
//! scoped to. Two calls polled concurrently on the same task (for example with
//! `futures::join!`) each see only their own record.
//!
//! Work handed to `tokio::spawn` starts a new task and does not inherit
//! task-locals. Wrap such futures with [`in_current_context`] to keep them
//! attached to the caller's record; otherwise the context is absent there.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Cache metadata accumulated during one memoized call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheContextRecord {
    /// Requested expiration window; `None` never expires
    pub life: Option<Duration>,

    /// Invalidation labels
    pub tags: HashSet<String>,
}

impl CacheContextRecord {
    /// Create an empty record (no life, no tags)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial life
    pub fn with_life(mut self, life: Duration) -> Self {
        self.life = Some(life);
        self
    }

    /// Add initial tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Shared handle to the record of an in-flight call
#[derive(Debug, Clone)]
pub struct ContextHandle {
    record: Arc<Mutex<CacheContextRecord>>,
}

impl ContextHandle {
    pub fn new(record: CacheContextRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
        }
    }

    /// Replace the requested life
    pub fn set_life(&self, life: Duration) {
        self.record.lock().life = Some(life);
    }

    /// Add a tag, returning false if it was already present
    pub fn add_tag(&self, tag: String) -> bool {
        self.record.lock().tags.insert(tag)
    }

    pub fn life(&self) -> Option<Duration> {
        self.record.lock().life
    }

    pub fn tags(&self) -> HashSet<String> {
        self.record.lock().tags.clone()
    }

    /// Copy of the record as it stands right now
    pub fn snapshot(&self) -> CacheContextRecord {
        self.record.lock().clone()
    }

    /// Whether both handles point at the same record
    pub fn same_record(&self, other: &ContextHandle) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

tokio::task_local! {
    static CACHE_CONTEXT: ContextHandle;
}

/// Run `body` with `initial` as the ambient record for its whole extent
pub async fn run_with_context<F>(initial: CacheContextRecord, body: F) -> F::Output
where
    F: Future,
{
    CACHE_CONTEXT.scope(ContextHandle::new(initial), body).await
}

/// The record of the nearest enclosing [`run_with_context`], if any
pub fn current_context() -> Option<ContextHandle> {
    CACHE_CONTEXT.try_with(|handle| handle.clone()).ok()
}

/// Bind `body` to the caller's current record
///
/// Use this before handing a future to `tokio::spawn`. When called outside any
/// context the future runs unchanged.
pub fn in_current_context<F>(body: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let handle = current_context();
    async move {
        match handle {
            Some(handle) => CACHE_CONTEXT.scope(handle, body).await,
            None => body.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_context_outside_scope() {
        assert!(current_context().is_none());
    }

    #[test]
    fn test_record_builders() {
        let record = CacheContextRecord::new()
            .with_life(Duration::from_secs(5))
            .with_tags(["a", "b", "a"]);

        assert_eq!(record.life, Some(Duration::from_secs(5)));
        assert_eq!(record.tags.len(), 2);
    }

    #[tokio::test]
    async fn test_context_survives_await_points() {
        let life = run_with_context(CacheContextRecord::new(), async {
            tokio::task::yield_now().await;
            current_context().unwrap().set_life(Duration::from_secs(30));
            tokio::time::sleep(Duration::from_millis(1)).await;
            current_context().unwrap().life()
        })
        .await;

        assert_eq!(life, Some(Duration::from_secs(30)));
        assert!(current_context().is_none());
    }

    #[tokio::test]
    async fn test_nested_scope_shadows_outer() {
        run_with_context(CacheContextRecord::new(), async {
            let outer = current_context().unwrap();
            outer.add_tag("outer".to_string());

            run_with_context(CacheContextRecord::new(), async {
                let inner = current_context().unwrap();
                assert!(!inner.same_record(&outer));
                inner.add_tag("inner".to_string());
            })
            .await;

            let restored = current_context().unwrap();
            assert!(restored.same_record(&outer));
            assert_eq!(restored.tags().len(), 1);
            assert!(restored.tags().contains("outer"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_interleaved_scopes_are_isolated() {
        async fn worker(tag: &'static str) -> HashSet<String> {
            for _ in 0..3 {
                current_context().unwrap().add_tag(tag.to_string());
                tokio::task::yield_now().await;
            }
            current_context().unwrap().tags()
        }

        let (left, right) = futures::join!(
            run_with_context(CacheContextRecord::new(), worker("left")),
            run_with_context(CacheContextRecord::new(), worker("right")),
        );

        assert_eq!(left, HashSet::from(["left".to_string()]));
        assert_eq!(right, HashSet::from(["right".to_string()]));
    }

    #[tokio::test]
    async fn test_spawned_task_needs_explicit_binding() {
        run_with_context(CacheContextRecord::new(), async {
            let detached = tokio::spawn(async { current_context().is_some() })
                .await
                .unwrap();
            assert!(!detached);

            tokio::spawn(in_current_context(async {
                current_context().unwrap().add_tag("spawned".to_string());
            }))
            .await
            .unwrap();

            assert!(current_context().unwrap().tags().contains("spawned"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_in_current_context_without_scope() {
        let seen = in_current_context(async { current_context().is_some() }).await;
        assert!(!seen);
    }
}
