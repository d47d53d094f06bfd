use actix_web::{get, web, HttpResponse};

use crate::error::Result;
use crate::handlers::EngagementHandlerState;

/// GET /users
///
/// Top users by total comments received on their posts.
#[get("/users")]
pub async fn get_top_users(state: web::Data<EngagementHandlerState>) -> Result<HttpResponse> {
    let view = state
        .service
        .top_users()
        .await
        .map_err(|e| e.into_view_error("Failed to fetch top users"))?;

    Ok(HttpResponse::Ok().json(&*view))
}
