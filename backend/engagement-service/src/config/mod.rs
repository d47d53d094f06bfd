use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_UPSTREAM_BASE_URL: &str = "http://20.244.56.144/evaluation-service";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server config
    pub http_host: String,
    pub http_port: u16,

    // Upstream evaluation service
    pub upstream_base_url: String,
    pub upstream_token: String,
    pub upstream_timeout_seconds: u64,

    // Aggregation
    pub cache_ttl_seconds: u64,
    pub fan_out_concurrency: usize,
    pub top_users_limit: usize,
    pub latest_posts_limit: usize,

    // Observability
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 5000)?
            .set_default("upstream_base_url", DEFAULT_UPSTREAM_BASE_URL)?
            .set_default("upstream_timeout_seconds", 10)?
            .set_default("cache_ttl_seconds", 120)? // 2 minutes
            .set_default("fan_out_concurrency", 1)?
            .set_default("top_users_limit", 5)?
            .set_default("latest_posts_limit", 5)?
            .set_default("log_level", "info")?
            .add_source(config::Environment::default().separator("__"))
            // PaaS platforms inject the listening port as PORT
            .set_override_option("http_port", std::env::var("PORT").ok())?
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.upstream_base_url.is_empty() {
            return Err(anyhow!("Upstream base URL is required"));
        }

        if self.upstream_token.trim().is_empty() {
            return Err(anyhow!("UPSTREAM_TOKEN is required"));
        }

        if self.cache_ttl_seconds == 0 {
            return Err(anyhow!("Cache TTL must be greater than 0"));
        }

        if self.fan_out_concurrency == 0 || self.fan_out_concurrency > 64 {
            return Err(anyhow!("Fan-out concurrency must be between 1 and 64"));
        }

        if self.top_users_limit == 0 || self.latest_posts_limit == 0 {
            return Err(anyhow!("View limits must be greater than 0"));
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
