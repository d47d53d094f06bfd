//! In-process cache for the dashboard views.
//!
//! Four entries share one TTL:
//! - `users` → top users view
//! - `posts` → joined posts (intermediate, feeds both post views)
//! - `popularPosts` → most-commented posts view
//! - `latestPosts` → latest posts view
//!
//! Entries are replaced wholesale and expire lazily at read time. There is no
//! per-key locking: two requests that both see an expired entry both
//! recompute it and the last write wins. The post views each check the
//! `posts` entry on their own, so they can be built from different snapshots
//! when their checks straddle a refresh.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{AuthoredPost, LatestPostsResponse, PopularPostsResponse, TopUsersResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Users,
    Posts,
    PopularPosts,
    LatestPosts,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Users => "users",
            CacheKey::Posts => "posts",
            CacheKey::PopularPosts => "popularPosts",
            CacheKey::LatestPosts => "latestPosts",
        }
    }
}

#[derive(Debug)]
pub struct CacheEntry<T> {
    pub value: Option<Arc<T>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
        }
    }
}

impl<T> CacheEntry<T> {
    /// Valid iff populated and younger than `ttl`.
    pub fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (&self.value, self.fetched_at) {
            (Some(_), Some(fetched_at)) => now
                .signed_duration_since(fetched_at)
                .to_std()
                // fetched "in the future" means the clock stepped back; still fresh
                .map(|age| age < ttl)
                .unwrap_or(true),
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct CacheSlot<T> {
    key: CacheKey,
    entry: RwLock<CacheEntry<T>>,
}

impl<T> CacheSlot<T> {
    fn new(key: CacheKey) -> Self {
        Self {
            key,
            entry: RwLock::new(CacheEntry::default()),
        }
    }

    pub fn key(&self) -> CacheKey {
        self.key
    }

    fn fresh_value(&self, now: DateTime<Utc>, ttl: Duration) -> Result<Option<Arc<T>>> {
        let entry = self.entry.read().map_err(|_| self.poisoned())?;
        if entry.is_valid(now, ttl) {
            Ok(entry.value.clone())
        } else {
            Ok(None)
        }
    }

    fn store(&self, value: Arc<T>, fetched_at: DateTime<Utc>) -> Result<()> {
        let mut entry = self.entry.write().map_err(|_| self.poisoned())?;
        *entry = CacheEntry {
            value: Some(value),
            fetched_at: Some(fetched_at),
        };
        Ok(())
    }

    fn fetched_at(&self) -> Result<Option<DateTime<Utc>>> {
        let entry = self.entry.read().map_err(|_| self.poisoned())?;
        Ok(entry.fetched_at)
    }

    fn poisoned(&self) -> AppError {
        AppError::Cache(format!("{} entry lock poisoned", self.key.as_str()))
    }
}

pub struct ViewCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    users: CacheSlot<TopUsersResponse>,
    posts: CacheSlot<Vec<AuthoredPost>>,
    popular_posts: CacheSlot<PopularPostsResponse>,
    latest_posts: CacheSlot<LatestPostsResponse>,
}

impl ViewCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            users: CacheSlot::new(CacheKey::Users),
            posts: CacheSlot::new(CacheKey::Posts),
            popular_posts: CacheSlot::new(CacheKey::PopularPosts),
            latest_posts: CacheSlot::new(CacheKey::LatestPosts),
        }
    }

    pub fn users(&self) -> &CacheSlot<TopUsersResponse> {
        &self.users
    }

    pub fn posts(&self) -> &CacheSlot<Vec<AuthoredPost>> {
        &self.posts
    }

    pub fn popular_posts(&self) -> &CacheSlot<PopularPostsResponse> {
        &self.popular_posts
    }

    pub fn latest_posts(&self) -> &CacheSlot<LatestPostsResponse> {
        &self.latest_posts
    }

    /// When `slot` was last written, if ever.
    pub fn fetched_at<T>(&self, slot: &CacheSlot<T>) -> Result<Option<DateTime<Utc>>> {
        slot.fetched_at()
    }

    /// Serve `slot` if it is still valid, otherwise run `compute` and store its result.
    ///
    /// No lock is held while `compute` runs.
    pub async fn get_or_compute<T, F, Fut>(&self, slot: &CacheSlot<T>, compute: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let entry = slot.key().as_str();

        if let Some(value) = slot.fresh_value(self.clock.now(), self.ttl)? {
            debug!("Cache hit for {}", entry);
            metrics::record_cache_event(entry, "hit");
            return Ok(value);
        }

        debug!("Cache miss for {}", entry);
        metrics::record_cache_event(entry, "miss");

        let started = Instant::now();
        let value = Arc::new(compute().await?);
        metrics::observe_compute_duration(entry, started.elapsed());

        slot.store(Arc::clone(&value), self.clock.now())?;
        info!(
            "Recomputed {} in {:?} (ttl={}s)",
            entry,
            started.elapsed(),
            self.ttl.as_secs()
        );

        Ok(value)
    }
}
