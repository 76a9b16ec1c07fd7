//! Server configuration endpoints
//!
//! `/server/image` is public branding data; `/server/audit` reports
//! configuration health to superusers; `/install` seeds the first admin
//! account and is gated to non-production environments by the middleware.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use gatehouse_core::user::{User, UserRepository};

use crate::auth::password::hash_password;
use crate::auth::{AuthError, CurrentUser, PublicUser};
use crate::config::Environment;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ImageResponse {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditResponse {
    environment: String,
    default_jwt_secret: bool,
    oauth_providers: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InstallRequest {
    email: String,
    password: String,
    #[serde(default)]
    username: Option<String>,
}

async fn server_image(State(state): State<AppState>) -> Json<ImageResponse> {
    Json(ImageResponse {
        url: state.config().server_image.clone(),
    })
}

async fn server_audit(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<AuditResponse>, AuthError> {
    if !user.superuser {
        return Err(AuthError::NotAuthorized);
    }

    let config = state.config();
    let mut warnings = Vec::new();
    if config.uses_default_secret() {
        warnings.push("JWT signing secret is the default placeholder".to_string());
    }
    if state.providers().is_empty() {
        warnings.push("No OAuth providers configured".to_string());
    }

    Ok(Json(AuditResponse {
        environment: match config.environment {
            Environment::Production => "production".to_string(),
            Environment::Development => "development".to_string(),
        },
        default_jwt_secret: config.uses_default_secret(),
        oauth_providers: state.providers().iter().map(|p| p.name().to_string()).collect(),
        warnings,
    }))
}

/// Seed the first superuser. Refused once any user exists.
async fn install(
    State(state): State<AppState>,
    Json(req): Json<InstallRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let existing = state.users().list().await.map_err(AuthError::from)?;
    if !existing.is_empty() {
        return Err(AuthError::NotAuthorized);
    }

    let mut user = User::new(
        req.username.unwrap_or_else(|| "admin".to_string()),
        req.email,
    );
    user.password_hash = Some(hash_password(&req.password, state.config().bcrypt_cost)?);
    user.verified = true;
    user.superuser = true;
    let user = state.users().create(user).await.map_err(AuthError::from)?;

    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/server/image", get(server_image))
        .route("/server/audit", get(server_audit))
        .route("/install", post(install))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use gatehouse_core::user::UserRepository;

    use crate::config::Environment;
    use crate::mail::TracingMailer;
    use crate::routes::testing::{body_json, build_state, seed_verified_user, TEST_PASSWORD};

    #[tokio::test]
    async fn install_seeds_the_first_superuser_once() {
        let (state, _tmp) = build_state().await;
        let app = crate::routes::app(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/install")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        json!({"email": "admin@example.com", "password": "s3cret-pass"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let admin = state
            .users()
            .find_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.superuser);
        assert!(admin.verified);

        // Second attempt is refused
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/install")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        json!({"email": "again@example.com", "password": "s3cret-pass"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn install_is_refused_in_production() {
        let (state, tmp) = build_state().await;
        let mut config = state.config().clone();
        config.environment = Environment::Production;
        config.jwt_secret = "prod-secret".to_string();
        let state = crate::state::AppState::with_parts(
            config,
            Vec::new(),
            std::sync::Arc::new(TracingMailer),
        )
        .await
        .unwrap();
        let app = crate::routes::app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/install")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        json!({"email": "admin@example.com", "password": "s3cret-pass"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        drop(tmp);
    }

    #[tokio::test]
    async fn audit_requires_a_superuser() {
        let (state, _tmp) = build_state().await;
        seed_verified_user(&state, "a@b.com").await;
        let session = state.auth().login("a@b.com", TEST_PASSWORD).await.unwrap();
        let app = crate::routes::app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/server/audit")
                    .header("Authorization", format!("Bearer {}", session.bearer))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn audit_reports_the_placeholder_secret() {
        let (state, tmp) = build_state().await;
        let mut config = state.config().clone();
        config.jwt_secret = crate::config::DEFAULT_JWT_SECRET.to_string();
        let state = crate::state::AppState::with_parts(
            config,
            Vec::new(),
            std::sync::Arc::new(TracingMailer),
        )
        .await
        .unwrap();

        let mut admin = seed_verified_user(&state, "root@b.com").await;
        admin.superuser = true;
        state.users().update(admin).await.unwrap();
        let session = state.auth().login("root@b.com", TEST_PASSWORD).await.unwrap();
        let app = crate::routes::app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/server/audit")
                    .header("Authorization", format!("Bearer {}", session.bearer))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["defaultJwtSecret"], true);
        assert!(!payload["warnings"].as_array().unwrap().is_empty());
        drop(tmp);
    }

    #[tokio::test]
    async fn image_is_public() {
        let (state, _tmp) = build_state().await;
        let app = crate::routes::app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/server/image")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["url"], "https://example.com/logo.png");
    }
}
