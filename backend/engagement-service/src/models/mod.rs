//! Upstream records and the derived views served to the dashboard.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A user as listed by the evaluation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Users keyed by id, in listing order.
///
/// The upstream encodes the user list as a JSON object (`{"1": "Alice"}`).
/// Decoding lists it the way a JavaScript object enumerates its keys: array
/// index keys first in ascending numeric order, then every other key in
/// document order. Ranking ties and the joined post order depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<(String, String)> for UserDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(id, name)| User { id, name }).collect())
    }
}

impl<'de> Deserialize<'de> for UserDirectory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // serde_json is built with preserve_order, so Map iterates in document order
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut users: Vec<User> = raw
            .into_iter()
            .map(|(id, name)| {
                let name = match name {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                User { id, name }
            })
            .collect();

        // stable: non-index keys keep document order
        users.sort_by_key(|user| match array_index(&user.id) {
            Some(index) => (0, index),
            None => (1, 0),
        });
        Ok(Self::new(users))
    }
}

/// The numeric value of `key` when it is a canonical array index
/// (`"0"`, `"17"`, but not `"01"`, `"+1"` or `"4294967295"`).
pub fn array_index(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|index| *index != u32::MAX && index.to_string() == key)
}

/// A post as returned by `/users/{id}/posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(rename = "userId", alias = "userid", deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub content: String,
    /// Fields the upstream attaches that this service does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A post stamped with its author's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoredPost {
    #[serde(flatten)]
    pub post: Post,
    #[serde(rename = "userName")]
    pub user_name: String,
}

/// A post carrying the comment count observed when the view was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPost {
    #[serde(flatten)]
    pub post: AuthoredPost,
    #[serde(rename = "commentCount")]
    pub comment_count: usize,
}

/// A comment from `/posts/{id}/comments`. Only the count is used downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Value,
    #[serde(default, rename = "postId", alias = "postid")]
    pub post_id: Value,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStat {
    pub id: String,
    pub name: String,
    #[serde(rename = "postCount")]
    pub post_count: usize,
    #[serde(rename = "commentCount")]
    pub comment_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUsersResponse {
    #[serde(rename = "topUsers")]
    pub top_users: Vec<UserStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularPostsResponse {
    #[serde(rename = "popularPosts")]
    pub popular_posts: Vec<RankedPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestPostsResponse {
    #[serde(rename = "latestPosts")]
    pub latest_posts: Vec<RankedPost>,
}

// Upstream ids are sometimes numeric; user ids are treated as opaque strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number user id, got {}",
            other
        ))),
    }
}
