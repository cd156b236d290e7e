//! # Ouroboros Memo (ouroboros-memo)
//!
//! Async memoization where the memoized function controls its own cache
//! metadata from inside its body.
//!
//! ## Features
//!
//! - `wrap` turns an async function into a memoized one
//! - `set_life` / `add_tags` set expiry and invalidation labels from anywhere
//!   inside the running call, without threading parameters through
//! - `invalidate_by_tag` removes every entry carrying a label
//! - Per-call context isolation, including calls interleaved on one task
//! - Failures and absent (`None`) results are never cached
//!
//! ## Usage
//!
//! ```rust
//! use ouroboros_memo::{add_tags, invalidate_by_tag, set_life, wrap};
//! use std::time::Duration;
//!
//! async fn load_profile(user_id: u64) -> anyhow::Result<Option<String>> {
//!     // Called from a helper: still reaches the memoized call's context
//!     add_tags([format!("user:{}", user_id)])?;
//!     Ok(Some(format!("profile-{}", user_id)))
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let profile = wrap(|user_id: u64| async move {
//!     set_life(Duration::from_secs(300))?;
//!     load_profile(user_id).await
//! });
//!
//! let first = profile.call(7).await?;
//! let second = profile.call(7).await?; // cached, `load_profile` does not run
//! assert_eq!(first, second);
//!
//! invalidate_by_tag("user:7");
//! # Ok(())
//! # }
//! ```
//!
//! ## Function shape
//!
//! A memoized function takes one argument value (use a tuple for several,
//! `()` for none) that implements `Serialize`; its JSON encoding is the cache
//! key. It returns `Result<Option<T>, E>` where `E: From<MemoError>`, so
//! `anyhow::Error` works directly.
//!
//! ## Spawned tasks
//!
//! The cache context follows the memoized call's future. Work moved onto
//! another task with `tokio::spawn` loses it unless wrapped with
//! [`context::in_current_context`].

pub mod cache;
pub mod context;
pub mod error;

use serde::Serialize;
use std::future::Future;

// Re-export main types for convenience
pub use cache::{
    add_tag, add_tags, invalidate_by_tag, set_life, start_auto_cleanup, CacheEntry, CacheKey,
    InvalidationEvent, InvalidationReason, MemoConfig, MemoConfigBuilder, MemoStats, MemoStore,
    Memoized, MissingContextPolicy,
};
pub use context::{
    current_context, in_current_context, run_with_context, CacheContextRecord, ContextHandle,
};
pub use error::{MemoError, Result};

/// Memoize `func` in the process-wide store
pub fn wrap<A, T, E, F, Fut>(func: F) -> Memoized<A, T, E, F>
where
    A: Serialize,
    T: Clone + Send + Sync + 'static,
    E: From<MemoError>,
    F: Fn(A) -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
{
    MemoStore::global().wrap(func)
}

/// Memoize `func` in the process-wide store under a readable table name
pub fn wrap_named<A, T, E, F, Fut>(name: impl Into<String>, func: F) -> Memoized<A, T, E, F>
where
    A: Serialize,
    T: Clone + Send + Sync + 'static,
    E: From<MemoError>,
    F: Fn(A) -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
{
    MemoStore::global().wrap_named(name, func)
}
