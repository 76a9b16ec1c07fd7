//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::config::Environment;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    environment: String,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let environment = match state.config().environment {
        Environment::Production => "production",
        Environment::Development => "development",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: environment.to_string(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
