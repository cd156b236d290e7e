//! # Memo Cache Engine
//!
//! Memoization for async functions where the function itself decides how long
//! its result lives and which tags it carries.
//!
//! ## Features
//!
//! - **Call-site life**: `set_life` inside the body sets the expiry window
//! - **Tags**: `add_tags` labels the result; `invalidate_by_tag` drops every
//!   entry with that label, across all memoized functions
//! - **Absent results**: `Ok(None)` is passed through and never cached
//! - **Failures**: `Err` is passed through and never cached
//! - **Stale fallback**: a recomputed stale entry keeps its old life and tags
//!   unless the new call sets its own
//!
//! ## Example
//!
//! ```rust
//! use ouroboros_memo::cache::{add_tag, set_life, MemoConfig, MemoStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = Arc::new(MemoStore::new(MemoConfig::default()));
//!
//! let lookup = store.wrap_named("lookup", |id: u64| async move {
//!     set_life(Duration::from_secs(60))?;
//!     add_tag(format!("item:{}", id))?;
//!     Ok::<_, anyhow::Error>(Some(id * 10))
//! });
//!
//! assert_eq!(lookup.call(3).await?, Some(30));
//! assert_eq!(lookup.call(3).await?, Some(30)); // served from the cache
//!
//! store.invalidate_by_tag("item:3");
//! assert!(lookup.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod control;
pub mod engine;
pub mod entry;
pub mod invalidation;
pub mod key;
pub mod store;
pub mod types;

pub use config::{MemoConfig, MemoConfigBuilder, MissingContextPolicy};
pub use control::{add_tag, add_tags, invalidate_by_tag, set_life};
pub use engine::Memoized;
pub use entry::{CacheEntry, PriorMetadata};
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use key::derive_key;
pub use store::{start_auto_cleanup, EntryTable, MemoStore};
pub use types::{CacheKey, MemoStats};
