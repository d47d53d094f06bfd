use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::cache::ViewCache;
use crate::clients::{EvaluationApi, EvaluationClient};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    array_index, AuthoredPost, LatestPostsResponse, PopularPostsResponse, RankedPost, TopUsersResponse,
    UserStat,
};
use crate::services::join::{build_all_posts, count_comments};

#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Upstream calls allowed in flight per fan-out step. 1 means strictly sequential.
    pub fan_out_concurrency: usize,
    pub top_users_limit: usize,
    pub latest_posts_limit: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            fan_out_concurrency: 1,
            top_users_limit: 5,
            latest_posts_limit: 5,
        }
    }
}

impl From<&Config> for AggregationConfig {
    fn from(config: &Config) -> Self {
        Self {
            fan_out_concurrency: config.fan_out_concurrency,
            top_users_limit: config.top_users_limit,
            latest_posts_limit: config.latest_posts_limit,
        }
    }
}

/// Users ranked by the total number of comments on their posts.
///
/// Nested fan-out: with concurrency `n`, up to `n` users are processed at once,
/// each counting comments with up to `n` calls in flight.
pub async fn compute_top_users(
    api: &dyn EvaluationApi,
    concurrency: usize,
    limit: usize,
) -> TopUsersResponse {
    let users = api.list_users().await;

    let stats: Vec<UserStat> = stream::iter(users.iter())
        .map(|user| async move {
            let posts = api.list_user_posts(&user.id).await;
            let comment_count: usize =
                count_comments(api, posts.iter().map(|p| p.id), concurrency)
                    .await
                    .into_iter()
                    .sum();

            UserStat {
                id: user.id.clone(),
                name: user.name.clone(),
                post_count: posts.len(),
                comment_count,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    TopUsersResponse {
        top_users: rank_top_users(stats, limit),
    }
}

/// Stable sort by comment count, highest first, then cut to `limit`.
pub fn rank_top_users(mut stats: Vec<UserStat>, limit: usize) -> Vec<UserStat> {
    // sort_by is stable: equal counts keep upstream order
    stats.sort_by(|a, b| b.comment_count.cmp(&a.comment_count));
    stats.truncate(limit);
    stats
}

/// Every post tied at the highest comment count.
pub async fn compute_popular_posts(
    api: &dyn EvaluationApi,
    posts: &[AuthoredPost],
    concurrency: usize,
) -> PopularPostsResponse {
    let counts = count_comments(api, posts.iter().map(|p| p.post.id), concurrency).await;

    PopularPostsResponse {
        popular_posts: select_most_commented(posts.to_vec(), counts),
    }
}

/// Tie-inclusive max filter: keeps every post whose count equals the maximum.
/// With no comments anywhere the maximum is 0 and every post is kept.
///
/// Posts are keyed by id before filtering. A repeated id holds one slot and
/// takes its last occurrence. Results come back with array-index ids ascending,
/// followed by any other ids in first-seen order.
pub fn select_most_commented(posts: Vec<AuthoredPost>, counts: Vec<usize>) -> Vec<RankedPost> {
    let max_comments = counts.iter().copied().max().unwrap_or(0);

    let mut by_id: Vec<RankedPost> = Vec::with_capacity(posts.len());
    let mut slots: HashMap<i64, usize> = HashMap::new();
    for (post, comment_count) in posts.into_iter().zip(counts) {
        let ranked = RankedPost {
            post,
            comment_count,
        };
        match slots.entry(ranked.post.post.id) {
            Entry::Occupied(slot) => by_id[*slot.get()] = ranked,
            Entry::Vacant(slot) => {
                slot.insert(by_id.len());
                by_id.push(ranked);
            }
        }
    }

    by_id.sort_by_key(|ranked| match array_index(&ranked.post.post.id.to_string()) {
        Some(index) => (0, index),
        None => (1, 0),
    });
    by_id.retain(|ranked| ranked.comment_count == max_comments);
    by_id
}

/// The `limit` highest post ids, with comment counts fetched for those posts only.
///
/// Post ids stand in for recency; the upstream has no timestamps.
pub async fn compute_latest_posts(
    api: &dyn EvaluationApi,
    posts: &[AuthoredPost],
    concurrency: usize,
    limit: usize,
) -> LatestPostsResponse {
    let newest = newest_first(posts.to_vec(), limit);
    let counts = count_comments(api, newest.iter().map(|p| p.post.id), concurrency).await;

    LatestPostsResponse {
        latest_posts: newest
            .into_iter()
            .zip(counts)
            .map(|(post, comment_count)| RankedPost {
                post,
                comment_count,
            })
            .collect(),
    }
}

pub fn newest_first(mut posts: Vec<AuthoredPost>, limit: usize) -> Vec<AuthoredPost> {
    posts.sort_by(|a, b| b.post.id.cmp(&a.post.id));
    posts.truncate(limit);
    posts
}

/// The three dashboard views, served through [`ViewCache`].
pub struct EngagementService {
    api: Arc<dyn EvaluationApi>,
    cache: ViewCache,
    config: AggregationConfig,
}

impl EngagementService {
    pub fn new(api: Arc<dyn EvaluationApi>, cache: ViewCache, config: AggregationConfig) -> Self {
        Self { api, cache, config }
    }

    /// Wire the reqwest client, a wall-clock cache and the configured limits.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = EvaluationClient::new(
            &config.upstream_base_url,
            &config.upstream_token,
            config.upstream_timeout(),
        )
        .map_err(|e| AppError::Internal(format!("Failed to build evaluation client: {}", e)))?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        info!(
            "Evaluation client targeting {} (cache ttl={}s, fan-out={})",
            client.base_url(),
            config.cache_ttl_seconds,
            config.fan_out_concurrency
        );

        Ok(Self::new(
            Arc::new(client),
            ViewCache::new(config.cache_ttl(), clock),
            AggregationConfig::from(config),
        ))
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    pub async fn top_users(&self) -> Result<Arc<TopUsersResponse>> {
        let api = self.api.as_ref();
        let config = &self.config;

        self.cache
            .get_or_compute(self.cache.users(), move || async move {
                Ok(compute_top_users(api, config.fan_out_concurrency, config.top_users_limit).await)
            })
            .await
    }

    pub async fn popular_posts(&self) -> Result<Arc<PopularPostsResponse>> {
        self.cache
            .get_or_compute(self.cache.popular_posts(), move || async move {
                let posts = self.all_posts().await?;
                debug!("Counting comments for {} posts", posts.len());
                Ok(compute_popular_posts(
                    self.api.as_ref(),
                    &posts,
                    self.config.fan_out_concurrency,
                )
                .await)
            })
            .await
    }

    pub async fn latest_posts(&self) -> Result<Arc<LatestPostsResponse>> {
        self.cache
            .get_or_compute(self.cache.latest_posts(), move || async move {
                let posts = self.all_posts().await?;
                Ok(compute_latest_posts(
                    self.api.as_ref(),
                    &posts,
                    self.config.fan_out_concurrency,
                    self.config.latest_posts_limit,
                )
                .await)
            })
            .await
    }

    /// Joined posts from the `posts` entry, rebuilt when it has expired.
    async fn all_posts(&self) -> Result<Arc<Vec<AuthoredPost>>> {
        let api = self.api.as_ref();
        let concurrency = self.config.fan_out_concurrency;

        self.cache
            .get_or_compute(self.cache.posts(), move || async move {
                Ok(build_all_posts(api, concurrency).await)
            })
            .await
    }
}
