//! GitHub OAuth provider
//!
//! Profile assembly needs two API calls: `/user` for the account and
//! `/user/emails` for the primary verified address, which GitHub does not
//! include in the user payload.

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;

use super::{split_display_name, ExternalProfile, OauthProvider};
use crate::auth::AuthError;
use crate::config::OauthProviderConfig;

const WEB_BASE: &str = "https://github.com";
const API_BASE: &str = "https://api.github.com";

pub struct GitHubProvider {
    config: OauthProviderConfig,
    callback_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct GitHubOrg {
    login: String,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
}

impl GitHubProvider {
    pub fn new(config: OauthProviderConfig, public_url: &str) -> Self {
        Self {
            config,
            callback_url: format!("{}/auth/github/callback", public_url.trim_end_matches('/')),
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
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, "gatehouse")
            .send()
            .await
            .map_err(|_| self.bad_user_data())?;
        response.json::<T>().await.map_err(|_| self.bad_user_data())
    }

    /// Pure assembly of a profile from the fetched bodies; fails when no
    /// primary verified email exists.
    fn profile_from_parts(
        &self,
        user: GitHubUser,
        emails: Vec<GitHubEmail>,
        orgs: Vec<GitHubOrg>,
    ) -> Result<ExternalProfile, AuthError> {
        let email = emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email)
            .ok_or_else(|| self.bad_user_data())?;
        let (first_name, last_name) = split_display_name(user.name.as_deref().unwrap_or(""));

        Ok(ExternalProfile {
            username: user.login,
            first_name,
            last_name,
            email,
            organizations: orgs.into_iter().map(|o| o.login).collect(),
        })
    }
}

#[async_trait]
impl OauthProvider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn icon(&self) -> &'static str {
        "github"
    }

    fn color(&self) -> &'static str {
        "#24292e"
    }

    fn allowed_organizations(&self) -> &[String] {
        &self.config.allowed_organizations
    }

    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{WEB_BASE}/login/oauth/authorize?client_id={}&redirect_uri={}&scope={}&state={}",
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode("user:email read:org"),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let response = self
            .http
            .post(format!("{WEB_BASE}/login/oauth/access_token"))
            .header(header::ACCEPT, "application/json")
            .form(&[
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
        let user: GitHubUser = self.get_json(&format!("{API_BASE}/user"), access_token).await?;
        let emails: Vec<GitHubEmail> = self
            .get_json(&format!("{API_BASE}/user/emails"), access_token)
            .await?;
        let orgs: Vec<GitHubOrg> = self
            .get_json(&format!("{API_BASE}/user/orgs"), access_token)
            .await?;
        self.profile_from_parts(user, emails, orgs)
    }
}
