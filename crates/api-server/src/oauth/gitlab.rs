//! GitLab OAuth provider
//!
//! Structurally the same flow as GitHub with a different profile schema:
//! the email arrives in the user payload and the organization gate runs
//! against group paths.

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;

use super::{split_display_name, ExternalProfile, OauthProvider};
use crate::auth::AuthError;
use crate::config::OauthProviderConfig;

const BASE: &str = "https://gitlab.com";

pub struct GitLabProvider {
    config: OauthProviderConfig,
    callback_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    username: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabGroup {
    full_path: String,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
}

impl GitLabProvider {
    pub fn new(config: OauthProviderConfig, public_url: &str) -> Self {
        Self {
            config,
            callback_url: format!("{}/auth/gitlab/callback", public_url.trim_end_matches('/')),
            http: reqwest::Client::new(),
        }
    }

    fn bad_user_data(&self) -> AuthError {
        AuthError::UnableToProcessUserData {
            provider: self.name().to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AuthError> {
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|_| self.bad_user_data())?;
        response.json::<T>().await.map_err(|_| self.bad_user_data())
    }

    fn profile_from_parts(
        &self,
        user: GitLabUser,
        groups: Vec<GitLabGroup>,
    ) -> Result<ExternalProfile, AuthError> {
        let email = user.email.ok_or_else(|| self.bad_user_data())?;
        let (first_name, last_name) = split_display_name(user.name.as_deref().unwrap_or(""));

        Ok(ExternalProfile {
            username: user.username,
            first_name,
            last_name,
            email,
            organizations: groups.into_iter().map(|g| g.full_path).collect(),
        })
    }
}

#[async_trait]
impl OauthProvider for GitLabProvider {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn icon(&self) -> &'static str {
        "gitlab"
    }

    fn color(&self) -> &'static str {
        "#fc6d26"
    }

    fn allowed_organizations(&self) -> &[String] {
        &self.config.allowed_organizations
    }

    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{BASE}/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&scope=read_user&state={}",
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let response = self
            .http
            .post(format!("{BASE}/oauth/token"))
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.callback_url.as_str()),
            ])
            .send()
            .await
            .map_err(|_| self.bad_user_data())?;

        response
            .json::<AccessTokenResponse>()
            .await
            .ok()
            .and_then(|body| body.access_token)
            .ok_or_else(|| self.bad_user_data())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AuthError> {
        let user: GitLabUser = self
            .get_json(&format!("{BASE}/api/v4/user"), access_token)
            .await?;
        let groups: Vec<GitLabGroup> = self
            .get_json(&format!("{BASE}/api/v4/groups"), access_token)
            .await?;
        self.profile_from_parts(user, groups)
    }
}
