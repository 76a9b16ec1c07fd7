//! Route handlers

pub mod auth;
pub mod health;
pub mod oauth;
pub mod server;
pub mod users;

use axum::{middleware as axum_middleware, Router};

use crate::auth::middleware::authorize;
use crate::state::AppState;

/// Compose the full application router behind the authorization layer
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(oauth::router())
        .merge(server::router())
        .merge(users::router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            authorize,
        ))
        .with_state(state)
}
