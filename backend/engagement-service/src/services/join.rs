//! Joins users, posts and comments from the evaluation service.
//!
//! Fan-out goes through `buffered`, which yields results in input order no
//! matter which call finishes first, so the joined output is identical for
//! every concurrency setting.

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::clients::EvaluationApi;
use crate::models::AuthoredPost;

/// Every post of every user, stamped with the author's name.
///
/// Users are visited in directory order and each user's posts keep upstream
/// order. An empty or failed user listing yields no posts; a failed per-user
/// listing only drops that user's posts.
pub async fn build_all_posts(api: &dyn EvaluationApi, concurrency: usize) -> Vec<AuthoredPost> {
    let users = api.list_users().await;
    if users.is_empty() {
        warn!("Evaluation service returned no users; joined post set is empty");
        return Vec::new();
    }

    let per_user: Vec<Vec<AuthoredPost>> = stream::iter(users.iter())
        .map(|user| async move {
            api.list_user_posts(&user.id)
                .await
                .into_iter()
                .map(|post| AuthoredPost {
                    post,
                    user_name: user.name.clone(),
                })
                .collect::<Vec<_>>()
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let posts: Vec<AuthoredPost> = per_user.into_iter().flatten().collect();
    debug!("Joined {} posts across {} users", posts.len(), users.len());
    posts
}

/// Comment counts for `post_ids`, aligned with the input order.
pub async fn count_comments<I>(api: &dyn EvaluationApi, post_ids: I, concurrency: usize) -> Vec<usize>
where
    I: IntoIterator<Item = i64>,
{
    stream::iter(post_ids)
        .map(|post_id| async move { api.list_post_comments(post_id).await.len() })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockEvaluationApi;
    use crate::models::{Comment, Post, UserDirectory};
    use serde_json::Map;

    fn post(id: i64, user_id: &str) -> Post {
        Post {
            id,
            user_id: user_id.to_string(),
            content: format!("post {}", id),
            extra: Map::new(),
        }
    }

    fn comments(n: usize) -> Vec<Comment> {
        (0..n)
            .map(|i| Comment {
                id: serde_json::Value::from(i),
                post_id: serde_json::Value::Null,
                content: String::new(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_join_stamps_author_names() {
        let mut api = MockEvaluationApi::new();
        api.expect_list_users().times(1).returning(|| {
            UserDirectory::from_iter([
                ("u1".to_string(), "Alice".to_string()),
                ("u2".to_string(), "Bob".to_string()),
            ])
        });
        api.expect_list_user_posts().times(2).returning(|user_id| match user_id {
            "u1" => vec![post(1, "u1")],
            "u2" => vec![post(2, "u2")],
            _ => Vec::new(),
        });

        let joined = build_all_posts(&api, 1).await;

        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].post.id, 1);
        assert_eq!(joined[0].user_name, "Alice");
        assert_eq!(joined[1].post.id, 2);
        assert_eq!(joined[1].user_name, "Bob");
    }

    #[tokio::test]
    async fn test_join_preserves_user_then_post_order() {
        let mut api = MockEvaluationApi::new();
        api.expect_list_users().returning(|| {
            UserDirectory::from_iter([
                ("9".to_string(), "Zoe".to_string()),
                ("1".to_string(), "Amy".to_string()),
            ])
        });
        api.expect_list_user_posts().returning(|user_id| match user_id {
            "9" => vec![post(30, "9"), post(10, "9")],
            "1" => vec![post(20, "1")],
            _ => Vec::new(),
        });

        let ids: Vec<i64> = build_all_posts(&api, 4)
            .await
            .iter()
            .map(|p| p.post.id)
            .collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_empty_user_listing_skips_post_calls() {
        let mut api = MockEvaluationApi::new();
        api.expect_list_users().returning(UserDirectory::default);
        api.expect_list_user_posts().never();

        assert!(build_all_posts(&api, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_user_posts_only_drop_that_user() {
        let mut api = MockEvaluationApi::new();
        api.expect_list_users().returning(|| {
            UserDirectory::from_iter([
                ("u1".to_string(), "Alice".to_string()),
                ("u2".to_string(), "Bob".to_string()),
            ])
        });
        // The client maps u1's failure to an empty list.
        api.expect_list_user_posts().returning(|user_id| match user_id {
            "u2" => vec![post(5, "u2")],
            _ => Vec::new(),
        });

        let joined = build_all_posts(&api, 1).await;
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].user_name, "Bob");
    }

    #[tokio::test]
    async fn test_count_comments_aligns_with_input() {
        let mut api = MockEvaluationApi::new();
        api.expect_list_post_comments()
            .returning(|post_id| comments(post_id as usize % 4));

        let counts = count_comments(&api, vec![3, 1, 2, 4], 3).await;
        assert_eq!(counts, vec![3, 1, 2, 0]);
    }
}
