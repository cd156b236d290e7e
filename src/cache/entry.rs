//! Cache entries with optional life and tags

use crate::context::CacheContextRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// A memoized result together with the metadata that governs it
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The memoized result
    pub data: T,

    /// Expiration window measured from creation; `None` never expires
    pub life: Option<Duration>,

    /// Invalidation labels
    pub tags: HashSet<String>,

    /// Wall-clock creation time
    pub created_at: DateTime<Utc>,

    /// Monotonic creation time used for expiry checks
    stored_at: Instant,
}

/// Life and tags of a stale entry, used as fallbacks when it is recomputed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorMetadata {
    pub life: Option<Duration>,
    pub tags: HashSet<String>,
}

impl<T> CacheEntry<T> {
    /// Create a new entry stamped with the current time
    pub fn new(data: T, life: Option<Duration>, tags: HashSet<String>) -> Self {
        Self {
            data,
            life,
            tags,
            created_at: Utc::now(),
            stored_at: Instant::now(),
        }
    }

    /// Build the entry written after a call completes
    ///
    /// The call's own record wins; the prior entry fills in a missing life and
    /// an empty tag set; `default_life` applies only when neither has a life.
    pub fn resolve(
        data: T,
        record: CacheContextRecord,
        prior: Option<PriorMetadata>,
        default_life: Option<Duration>,
    ) -> Self {
        let (prior_life, prior_tags) = match prior {
            Some(prior) => (prior.life, prior.tags),
            None => (None, HashSet::new()),
        };

        let life = record.life.or(prior_life).or(default_life);
        let tags = if record.tags.is_empty() {
            prior_tags
        } else {
            record.tags
        };

        Self::new(data, life, tags)
    }

    /// Check if the entry has outlived its life
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against an explicit instant
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.life {
            Some(life) => now.saturating_duration_since(self.stored_at) > life,
            None => false,
        }
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.stored_at)
    }

    /// Get time until expiration, `None` when expired or never expiring
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let life = self.life?;
        life.checked_sub(self.age())
    }

    /// Check if entry carries a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Metadata carried over when this entry is recomputed
    pub fn prior_metadata(&self) -> PriorMetadata {
        PriorMetadata {
            life: self.life,
            tags: self.tags.clone(),
        }
    }
}
