//! HTTP client for the third-party evaluation service.
//!
//! The service exposes three read-only resources:
//! - `GET /users` → `{"users": {"<id>": "<name>", ...}}`
//! - `GET /users/{id}/posts` → `{"posts": [...]}`
//! - `GET /posts/{id}/comments` → `{"comments": [...]}`
//!
//! Every call carries the configured bearer token. Calls are fail-soft: the
//! [`EvaluationApi`] methods never return errors, they log the failure and
//! hand back an empty collection so one unreachable endpoint cannot abort a
//! whole aggregation pass.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::metrics;
use crate::models::{Comment, Post, UserDirectory};

const MAX_LOGGED_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Parse failed: {0}")]
    Decode(String),
}

impl UpstreamError {
    fn outcome(&self) -> &'static str {
        match self {
            UpstreamError::Transport(e) if e.is_timeout() => "timeout",
            UpstreamError::Transport(_) => "transport_error",
            UpstreamError::Status { .. } => "status_error",
            UpstreamError::Decode(_) => "decode_error",
        }
    }
}

/// Read access to the evaluation service.
///
/// Implementations substitute an empty value for any failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvaluationApi: Send + Sync {
    async fn list_users(&self) -> UserDirectory;

    async fn list_user_posts(&self, user_id: &str) -> Vec<Post>;

    async fn list_post_comments(&self, post_id: i64) -> Vec<Comment>;
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: UserDirectory,
}

#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct CommentsEnvelope {
    #[serde(default)]
    comments: Vec<Comment>,
}

/// reqwest-backed [`EvaluationApi`].
#[derive(Clone)]
pub struct EvaluationClient {
    client: Client,
    base_url: String,
    token: String,
}

impl EvaluationClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn try_list_users(&self) -> Result<UserDirectory, UpstreamError> {
        let envelope: UsersEnvelope = self.get_json("users", "/users").await?;
        Ok(envelope.users)
    }

    pub async fn try_list_user_posts(&self, user_id: &str) -> Result<Vec<Post>, UpstreamError> {
        let envelope: PostsEnvelope = self
            .get_json("posts", &format!("/users/{}/posts", user_id))
            .await?;
        Ok(envelope.posts)
    }

    pub async fn try_list_post_comments(&self, post_id: i64) -> Result<Vec<Comment>, UpstreamError> {
        let envelope: CommentsEnvelope = self
            .get_json("comments", &format!("/posts/{}/comments", post_id))
            .await?;
        Ok(envelope.comments)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        path: &str,
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Calling evaluation service: GET {}", url);

        let result = self.send_and_decode(&url).await;
        match &result {
            Ok(_) => metrics::record_upstream_request(resource, "success"),
            Err(e) => metrics::record_upstream_request(resource, e.outcome()),
        }
        result
    }

    async fn send_and_decode<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_LOGGED_BODY_CHARS).collect(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl EvaluationApi for EvaluationClient {
    async fn list_users(&self) -> UserDirectory {
        match self.try_list_users().await {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, "Error fetching users");
                UserDirectory::default()
            }
        }
    }

    async fn list_user_posts(&self, user_id: &str) -> Vec<Post> {
        match self.try_list_user_posts(user_id).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Error fetching posts for user");
                Vec::new()
            }
        }
    }

    async fn list_post_comments(&self, post_id: i64) -> Vec<Comment> {
        match self.try_list_post_comments(post_id).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(post_id, error = %e, "Error fetching comments for post");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = EvaluationClient::new(
            "http://localhost:9000/evaluation-service/",
            "token",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/evaluation-service");
    }

    #[test]
    fn test_envelopes_default_missing_fields_to_empty() {
        let users: UsersEnvelope = serde_json::from_str("{}").unwrap();
        assert!(users.users.is_empty());

        let posts: PostsEnvelope = serde_json::from_str(r#"{"other": 1}"#).unwrap();
        assert!(posts.posts.is_empty());

        let comments: CommentsEnvelope = serde_json::from_str("{}").unwrap();
        assert!(comments.comments.is_empty());
    }
}
