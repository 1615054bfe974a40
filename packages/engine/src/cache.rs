use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::recommendation::Recommendation;

/// Shared, immutable recommendation list.
pub type RecommendationList = Arc<Vec<Recommendation>>;

/// Best-effort per-user store of the last computed recommendation list.
///
/// Implementations need no coordination with writers: a stale hit is
/// acceptable and recomputation is idempotent.
pub trait RecommendationCache: Send + Sync {
    /// A list covering at least `limit` results, truncated to `limit`.
    fn get(&self, user_id: i32, limit: usize) -> Option<RecommendationList>;

    /// Store the list computed for `limit`.
    fn set(&self, user_id: i32, limit: usize, items: RecommendationList);

    fn invalidate(&self, user_id: i32);

    /// Drop every entry.
    fn clear(&self);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    items: RecommendationList,
    limit: usize,
    stored_at: Instant,
}

impl CacheEntry {
    /// A list shorter than its limit holds every candidate, so it satisfies any limit.
    fn covers(&self, limit: usize) -> bool {
        limit <= self.limit || self.items.len() < self.limit
    }
}

/// In-process cache with a fixed time-to-live.
#[derive(Debug)]
pub struct InMemoryRecommendationCache {
    entries: DashMap<i32, CacheEntry>,
    ttl: Duration,
}

impl InMemoryRecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.stored_at.elapsed() >= self.ttl
    }

    /// Drop the entry only if it is still expired under the shard lock.
    fn evict_if_expired(&self, user_id: i32) {
        self.entries
            .remove_if(&user_id, |_, entry| self.is_expired(entry));
    }
}

impl RecommendationCache for InMemoryRecommendationCache {
    fn get(&self, user_id: i32, limit: usize) -> Option<RecommendationList> {
        let lookup = self.entries.get(&user_id).map(|entry| {
            if self.is_expired(&entry) {
                Err(())
            } else if !entry.covers(limit) {
                Ok(None)
            } else {
                Ok(Some(entry.items.clone()))
            }
        });

        match lookup? {
            // Read guard is gone; a `set` may have landed since the check.
            Err(()) => {
                self.evict_if_expired(user_id);
                None
            }
            Ok(None) => None,
            Ok(Some(items)) if items.len() <= limit => Some(items),
            Ok(Some(items)) => Some(Arc::new(items[..limit].to_vec())),
        }
    }

    fn set(&self, user_id: i32, limit: usize, items: RecommendationList) {
        self.entries.insert(
            user_id,
            CacheEntry {
                items,
                limit,
                stored_at: Instant::now(),
            },
        );
    }

    fn invalidate(&self, user_id: i32) {
        self.entries.remove(&user_id);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
