//! Invalidation reasons and events
//!
//! Entries leave a table in four ways:
//! - Tag match: bulk removal of every entry carrying a label
//! - Manual: removal of a single key
//! - Cleared: a table emptied wholesale
//! - Expired: stale entries purged by a cleanup pass
//!
//! Expiry on its own never removes anything. A stale entry stays in place
//! until its key is looked up again (and recomputed) or a cleanup pass runs.

use crate::cache::types::CacheKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Entry outlived its life and was purged
    Expired,

    /// Manual invalidation by key
    Manual,

    /// Whole table cleared
    Cleared,

    /// Invalidated by tag match
    TagMatch { tag: String },
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "life expired"),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
            InvalidationReason::Cleared => write!(f, "table cleared"),
            InvalidationReason::TagMatch { tag } => write!(f, "tag match: {}", tag),
        }
    }
}

/// Record of a batch of removed entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Table the keys were removed from
    pub table: String,

    /// Keys that were invalidated
    pub keys: Vec<CacheKey>,
}

impl InvalidationEvent {
    pub fn new(reason: InvalidationReason, table: impl Into<String>, keys: Vec<CacheKey>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            table: table.into(),
            keys,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
