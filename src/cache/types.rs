//! Core type definitions for the memo cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - the serialized argument list of a call
pub type CacheKey = String;

/// Statistics for memo cache activity
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Calls answered from a fresh entry
    pub hits: u64,

    /// Calls that had to run the wrapped function
    pub misses: u64,

    /// Misses caused by an entry past its life
    pub expirations: u64,

    /// Results written to an entry table
    pub stores: u64,

    /// Calls whose function produced no value (not cached)
    pub absent_results: u64,

    /// Calls whose function failed (not cached)
    pub failures: u64,

    /// Entries removed by tag, key, clear or cleanup
    pub invalidations: u64,

    /// Number of entries currently held across all tables
    pub entries: usize,
}

impl MemoStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }

    /// Total lookups seen
    pub fn calls(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for MemoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, stores: {}, expirations: {}, invalidations: {}, entries: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.stores,
            self.expirations,
            self.invalidations,
            self.entries
        )
    }
}
