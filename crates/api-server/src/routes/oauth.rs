//! External login endpoints
//!
//! One login/callback pair per configured provider. The callback runs the
//! whole bridge sequentially with early returns at every failure point; no
//! local user is created unless the profile decoded and passed the
//! organization gate.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use gatehouse_core::user::{User, UserRepository};

use crate::auth::claims::ExternalIdentityClaims;
use crate::auth::AuthError;
use crate::oauth::{extend_link, ExternalProfile, OauthProvider};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LoginParams {
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

fn lookup_provider(state: &AppState, name: &str) -> Result<Arc<dyn OauthProvider>, AuthError> {
    state.provider(name).ok_or(AuthError::NotAuthorized)
}

/// Step 1: stash the browser's final destination and send it to the provider
async fn oauth_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<LoginParams>,
) -> Result<Redirect, AuthError> {
    let provider = lookup_provider(&state, &provider)?;

    let link = params.link.ok_or(AuthError::MissingRedirectLink)?;
    url::Url::parse(&link).map_err(|_| AuthError::MissingRedirectLink)?;

    let state_token = state.links().stash(link).await;
    Ok(Redirect::to(&provider.authorize_url(&state_token)))
}

/// Steps 2–7: code exchange through browser redirect
async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AuthError> {
    let provider = lookup_provider(&state, &provider)?;

    let state_token = params.state.ok_or(AuthError::MissingRedirectLink)?;
    let link = state
        .links()
        .take(&state_token)
        .await
        .ok_or(AuthError::MissingRedirectLink)?;

    let code = params.code.ok_or_else(|| AuthError::UnableToProcessUserData {
        provider: provider.name().to_string(),
    })?;
    let access_token = provider.exchange_code(&code).await?;
    let profile = provider.fetch_profile(&access_token).await?;

    let allowed = provider.allowed_organizations();
    if !allowed.is_empty() && !profile.organizations.iter().any(|org| allowed.contains(org)) {
        return Err(AuthError::InvalidOrganization);
    }

    let user = resolve_local_user(&state, &profile).await?;
    let session = state.auth().login_user(&user).await?;
    let opaque = session
        .token
        .ok_or_else(|| AuthError::Signing("login issued no opaque token".to_string()))?;

    let claims = ExternalIdentityClaims::new(&user, opaque);
    let info = state.signer().sign(&claims)?;
    let target = extend_link(&link, "info", &info)?;
    Ok(Redirect::to(&target))
}

/// Map the external profile to a local account, creating a verified,
/// passwordless user on first login.
async fn resolve_local_user(
    state: &AppState,
    profile: &ExternalProfile,
) -> Result<User, AuthError> {
    if let Some(existing) = state
        .users()
        .find_by_email(&profile.email)
        .await
        .map_err(AuthError::from)?
    {
        return Ok(existing);
    }

    let mut user = User::new(profile.username.clone(), profile.email.clone());
    user.first_name = profile.first_name.clone();
    user.last_name = profile.last_name.clone();
    user.verified = true;
    state.users().create(user).await.map_err(AuthError::from)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/{provider}/login", get(oauth_login))
        .route("/auth/{provider}/callback", get(oauth_callback))
}
