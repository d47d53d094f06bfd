/// Post View Handlers
///
/// `GET /posts?type=popular|latest`
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::handlers::EngagementHandlerState;

const POSTS_FAILURE_MESSAGE: &str = "Failed to fetch posts";

/// Query parameters for GET /posts
#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    /// "popular" or "latest"; absent or empty means "latest"
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFeed {
    Popular,
    Latest,
}

impl FromStr for PostFeed {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "popular" => Ok(PostFeed::Popular),
            "latest" => Ok(PostFeed::Latest),
            other => Err(AppError::InvalidPostType(other.to_string())),
        }
    }
}

impl PostsQuery {
    pub fn feed(&self) -> Result<PostFeed> {
        match self.kind.as_deref() {
            None | Some("") => Ok(PostFeed::Latest),
            Some(kind) => kind.parse(),
        }
    }
}

/// GET /posts
///
/// Most-commented posts (every post tied at the maximum) or the newest posts by id.
#[get("/posts")]
pub async fn get_posts(
    query: web::Query<PostsQuery>,
    state: web::Data<EngagementHandlerState>,
) -> Result<HttpResponse> {
    let feed = query.feed()?;
    debug!("Posts request: feed={:?}", feed);

    let response = match feed {
        PostFeed::Popular => {
            let view = state
                .service
                .popular_posts()
                .await
                .map_err(|e| e.into_view_error(POSTS_FAILURE_MESSAGE))?;
            HttpResponse::Ok().json(&*view)
        }
        PostFeed::Latest => {
            let view = state
                .service
                .latest_posts()
                .await
                .map_err(|e| e.into_view_error(POSTS_FAILURE_MESSAGE))?;
            HttpResponse::Ok().json(&*view)
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(kind: Option<&str>) -> PostsQuery {
        PostsQuery {
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_or_empty_type_defaults_to_latest() {
        assert_eq!(query(None).feed().unwrap(), PostFeed::Latest);
        assert_eq!(query(Some("")).feed().unwrap(), PostFeed::Latest);
    }

    #[test]
    fn test_known_types_parse() {
        assert_eq!(query(Some("popular")).feed().unwrap(), PostFeed::Popular);
        assert_eq!(query(Some("latest")).feed().unwrap(), PostFeed::Latest);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(matches!(
            query(Some("Popular")).feed(),
            Err(AppError::InvalidPostType(_))
        ));
        assert!(matches!(
            query(Some("bogus")).feed(),
            Err(AppError::InvalidPostType(_))
        ));
    }
}
