use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

pub const INVALID_POST_TYPE_MESSAGE: &str = "Invalid type parameter. Use \"popular\" or \"latest\".";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", INVALID_POST_TYPE_MESSAGE)]
    InvalidPostType(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// Aggregation failure surfaced to clients with a short, endpoint-specific message.
    /// The underlying cause is logged where the error is converted.
    #[error("{message}")]
    ViewUnavailable { message: &'static str },
}

impl AppError {
    /// Collapse any non-client error into the short message an endpoint exposes.
    pub fn into_view_error(self, message: &'static str) -> Self {
        match self {
            AppError::InvalidPostType(_) | AppError::ViewUnavailable { .. } => self,
            other => {
                tracing::error!(error = %other, "{}", message);
                AppError::ViewUnavailable { message }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        if let AppError::InvalidPostType(value) = self {
            tracing::debug!(value = %value, "Rejected posts type parameter");
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidPostType(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
