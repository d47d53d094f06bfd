pub mod cache;
pub mod clients;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

pub use cache::{CacheKey, ViewCache};
pub use clients::{EvaluationApi, EvaluationClient};
pub use services::{AggregationConfig, EngagementService};
