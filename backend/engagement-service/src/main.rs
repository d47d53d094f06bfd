use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engagement_service::config::Config;
use engagement_service::handlers::{self, EngagementHandlerState};
use engagement_service::EngagementService;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},actix_web=info", config.log_level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {:#}", e);
        eprintln!("ERROR: Invalid configuration: {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        "Starting engagement-service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service = match EngagementService::from_config(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to initialize engagement service: {}", e);
            return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
        }
    };

    let handler_state = web::Data::new(EngagementHandlerState { service });
    let bind_address = config.bind_address();
    tracing::info!("HTTP server listening on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            // Dashboard is served from a different origin
            .wrap(Cors::permissive())
            .app_data(handler_state.clone())
            .configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
