pub mod posts;
pub mod users;

use actix_web::web;
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics;
use crate::services::EngagementService;

// Re-export handlers for convenience
pub use posts::{get_posts, PostFeed, PostsQuery};
pub use users::get_top_users;

/// Shared state for the view handlers
pub struct EngagementHandlerState {
    pub service: Arc<EngagementService>,
}

/// Register the dashboard API plus health and metrics endpoints.
///
/// Shared by `main` and the HTTP tests so both serve the same routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        // e.g. `?type=popular&type=latest`
        AppError::InvalidPostType(err.to_string()).into()
    }))
    .route("/health", web::get().to(|| async { "OK" }))
    .route("/metrics", web::get().to(metrics::serve_metrics))
    .service(get_top_users)
    .service(get_posts);
}
