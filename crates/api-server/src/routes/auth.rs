//! Login, token renewal and password recovery endpoints

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_core::user::UserRepository;

use crate::auth::claims::PasswordResetClaims;
use crate::auth::{AuthError, PublicUser, Session};
use crate::mail::Mailer;
use crate::oauth::extend_link;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartRecoveryRequest {
    email: String,
    target_uri: String,
}

#[derive(Debug, Deserialize)]
struct FinishRecoveryParams {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecoveryResponse {
    status: String,
}

/// Success envelope for auth/token responses. `token` is the plaintext
/// opaque value and only appears on paths that freshly created one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionEnvelope {
    id: Uuid,
    user: PublicUser,
    expires: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Build the envelope plus the `Authorization: Bearer` response header
fn session_response(session: Session) -> Response {
    let bearer = format!("Bearer {}", session.bearer);
    let envelope = SessionEnvelope {
        id: session.id,
        user: session.user,
        expires: session.expires,
        token: session.token,
    };
    let mut response = Json(envelope).into_response();
    if let Ok(value) = HeaderValue::from_str(&bearer) {
        response.headers_mut().insert(header::AUTHORIZATION, value);
    }
    response
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (email, password) = text.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

async fn basic_login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let (email, password) = basic_credentials(&headers).ok_or(AuthError::AuthenticationFailed)?;
    let session = state.auth().login(&email, &password).await?;
    Ok(session_response(session))
}

async fn json_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let session = state.auth().login(&req.email, &req.password).await?;
    Ok(session_response(session))
}

/// Renewal via header: `Authorization: Token <opaque>` or `Bearer <jwt>`
async fn renew_from_header(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::AuthenticationFailed)?;

    let session = if let Some(opaque) = value.strip_prefix("Token ") {
        state.auth().renew_opaque(opaque.trim()).await?
    } else if let Some(bearer) = value.strip_prefix("Bearer ") {
        state.auth().renew_bearer(bearer.trim()).await?
    } else {
        return Err(AuthError::AuthenticationFailed);
    };
    Ok(session_response(session))
}

async fn renew_from_body(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Response, AuthError> {
    let session = state.auth().renew_opaque(&req.token).await?;
    Ok(session_response(session))
}

/// All-sessions logout. Secured route; the opaque token travels in the body.
async fn logout(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<StatusCode, AuthError> {
    state.auth().logout(&req.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_recovery(
    State(state): State<AppState>,
    Json(req): Json<StartRecoveryRequest>,
) -> Result<(StatusCode, Json<RecoveryResponse>), AuthError> {
    let user = state
        .users()
        .find_by_email(&req.email)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::UserNotFound)?;

    let claims = PasswordResetClaims::new(user.id, req.target_uri);
    let token = state.signer().sign(&claims)?;
    let reset_url = format!(
        "{}/auth/finish-recovery?token={}",
        state.config().public_url.trim_end_matches('/'),
        urlencoding::encode(&token),
    );
    state.mailer().send_password_reset(&user.email, &reset_url).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecoveryResponse {
            status: "sent".to_string(),
        }),
    ))
}

async fn finish_recovery(
    State(state): State<AppState>,
    Query(params): Query<FinishRecoveryParams>,
) -> Result<Redirect, AuthError> {
    let token = params.token.ok_or(AuthError::NotAuthorized)?;
    let claims: PasswordResetClaims = state.signer().verify(&token)?;
    let target = extend_link(&claims.redirect_uri, "token", &token)?;
    Ok(Redirect::to(&target))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth", get(basic_login).post(json_login))
        .route("/token", get(renew_from_header).post(renew_from_body))
        .route("/auth/logout", post(logout))
        .route("/auth/start-recovery", post(start_recovery))
        .route("/auth/finish-recovery", get(finish_recovery).post(finish_recovery))
}
