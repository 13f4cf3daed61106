use std::sync::Arc;

use ride_booking::api;
use ride_booking::auth::seed_admin;
use ride_booking::auth::token::TokenKeys;
use ride_booking::config::{Config, LogFormat};
use ride_booking::error::AppError;
use ride_booking::state::AppState;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    let tokens = TokenKeys::new(&config.jwt_secret, config.token_ttl_hours);
    let shared_state = Arc::new(AppState::new(tokens, config.event_buffer_size));

    if let Some(seed) = &config.admin_seed {
        seed_admin(&shared_state, seed).await?;
    }

    let app = api::rest::router(shared_state.clone())
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
