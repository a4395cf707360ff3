//! # Scribe API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use scribe_core::ports::{PasswordService, TokenService};
use scribe_infra::{Argon2PasswordService, JwtTokenService};

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    tracing::info!(
        "Starting Scribe API Server on {}:{}",
        config.host,
        config.port
    );

    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
    let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
    let state = AppState::new(config.database.as_ref(), passwords, config.blog.clone()).await;

    #[cfg(feature = "rate-limit")]
    let limiter = rate_limiter();

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(tokens.clone()))
            .app_data(handlers::json_config())
            .app_data(handlers::query_config())
            .configure(handlers::configure_routes);

        #[cfg(feature = "rate-limit")]
        let app = app.wrap(middleware::rate_limit::RateLimitMiddleware::new(limiter.clone()));

        app.wrap(RequestIdMiddleware).wrap(TracingLogger::default())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Keyed limiter for mutating requests, with a periodic sweep of idle buckets.
#[cfg(feature = "rate-limit")]
fn rate_limiter() -> Arc<dyn scribe_core::ports::RateLimiter> {
    use std::time::Duration;

    use scribe_infra::{InMemoryRateLimiter, RateLimitConfig};

    let config = RateLimitConfig::from_env();
    tracing::info!(
        max_requests = config.max_requests,
        window_secs = config.window.as_secs(),
        "Rate limiting enabled for mutating requests"
    );

    let limiter = Arc::new(InMemoryRateLimiter::new(config));
    let sweeper = limiter.clone();
    actix_web::rt::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            sweeper.retain_recent();
        }
    });

    limiter
}
