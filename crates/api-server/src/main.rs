//! API server for Gatehouse
//!
//! Boot sequence: logging, configuration, state assembly, then the router
//! behind the authorization layer.

mod auth;
mod config;
mod mail;
mod oauth;
mod routes;
mod state;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    if let Err(reason) = config.validate() {
        tracing::error!(%reason, "invalid configuration");
        std::process::exit(1);
    }

    tracing::info!(data_dir = ?config.data_dir, "using data directory");

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config)
        .await
        .expect("Failed to initialize application state");

    let provider_names: Vec<&str> = app_state.providers().iter().map(|p| p.name()).collect();
    tracing::info!(providers = ?provider_names, "external login providers configured");

    // Layers are applied bottom-to-top; CORS runs before the trace layer
    let app = routes::app(app_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!("REST API listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
