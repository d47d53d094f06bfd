#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use engagement_service::clock::ManualClock;
use engagement_service::handlers::EngagementHandlerState;
use engagement_service::models::{Comment, Post, UserDirectory};
use engagement_service::{AggregationConfig, EngagementService, EvaluationApi, ViewCache};

pub const TTL: Duration = Duration::from_secs(120);

/// In-memory evaluation service that counts every call it receives.
#[derive(Default)]
pub struct FakeEvaluationApi {
    users: Vec<(String, String)>,
    posts: HashMap<String, Vec<Post>>,
    comments: HashMap<i64, usize>,
    calls: AtomicUsize,
}

impl FakeEvaluationApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.users.push((id.to_string(), name.to_string()));
        self
    }

    /// Adds a post by `user_id` carrying `comments` comments.
    pub fn with_post(mut self, id: i64, user_id: &str, comments: usize) -> Self {
        let post: Post = serde_json::from_value(json!({
            "id": id,
            "userId": user_id,
            "content": format!("post {}", id),
        }))
        .expect("valid post fixture");
        self.posts.entry(user_id.to_string()).or_default().push(post);
        self.comments.insert(id, comments);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvaluationApi for FakeEvaluationApi {
    async fn list_users(&self) -> UserDirectory {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.users.iter().cloned().collect()
    }

    async fn list_user_posts(&self, user_id: &str) -> Vec<Post> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.posts.get(user_id).cloned().unwrap_or_default()
    }

    async fn list_post_comments(&self, post_id: i64) -> Vec<Comment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let count = self.comments.get(&post_id).copied().unwrap_or(0);
        (0..count)
            .map(|i| Comment {
                id: json!(i),
                post_id: json!(post_id),
                content: String::new(),
            })
            .collect()
    }
}

pub struct Harness {
    pub api: Arc<FakeEvaluationApi>,
    pub clock: Arc<ManualClock>,
    pub state: EngagementHandlerState,
}

pub fn harness(api: FakeEvaluationApi) -> Harness {
    let api = Arc::new(api);
    let clock = Arc::new(ManualClock::default());
    let cache = ViewCache::new(TTL, clock.clone());
    let service = EngagementService::new(api.clone(), cache, AggregationConfig::default());

    Harness {
        api,
        clock,
        state: EngagementHandlerState {
            service: Arc::new(service),
        },
    }
}

/// Seven users with distinct and tied comment totals.
pub fn populated_api() -> FakeEvaluationApi {
    FakeEvaluationApi::new()
        .with_user("1", "Alice")
        .with_user("2", "Bob")
        .with_user("3", "Carol")
        .with_user("4", "Dave")
        .with_user("5", "Erin")
        .with_user("6", "Frank")
        .with_user("7", "Grace")
        .with_post(101, "1", 2)
        .with_post(102, "1", 1)
        .with_post(201, "2", 5)
        .with_post(301, "3", 5)
        .with_post(401, "4", 0)
        .with_post(501, "5", 3)
        .with_post(601, "6", 3)
        .with_post(602, "6", 0)
        .with_post(701, "7", 1)
}
