//! External identity bridge
//!
//! Maps a third-party OAuth account onto a local user. Providers are held
//! as trait objects and resolved by name from the request path.

mod github;
mod gitlab;
mod links;

pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use links::LinkStash;

use async_trait::async_trait;

use crate::auth::AuthError;

/// Profile fetched from an external identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Organization/group slugs the account belongs to
    pub organizations: Vec<String>,
}

/// A configured OAuth identity provider
#[async_trait]
pub trait OauthProvider: Send + Sync {
    /// Short name, also the `:provider` path segment
    fn name(&self) -> &'static str;

    /// Icon hint for login buttons
    fn icon(&self) -> &'static str;

    /// Brand color hint for login buttons
    fn color(&self) -> &'static str;

    /// Organizations/groups allowed to log in; empty means no gate
    fn allowed_organizations(&self) -> &[String];

    /// Provider authorization URL carrying our state token
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange the callback authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError>;

    /// Fetch the user profile behind an access token
    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AuthError>;
}

/// Append a query parameter to a redirect link the client handed us earlier
pub fn extend_link(link: &str, key: &str, value: &str) -> Result<String, AuthError> {
    let mut url =
        url::Url::parse(link).map_err(|_| AuthError::UnableToGenerateRedirectLink)?;
    url.query_pairs_mut().append_pair(key, value);
    Ok(url.to_string())
}

/// Split a display name into first/last the way provider profiles are
/// usually shaped ("First Rest Of Name").
pub(crate) fn split_display_name(name: &str) -> (String, String) {
    let mut parts = name.trim().splitn(2, ' ');
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.next().unwrap_or_default().trim().to_string();
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_link_appends_and_encodes() {
        let extended =
            extend_link("https://app.example.com/after?keep=1", "info", "a.b.c").unwrap();
        assert_eq!(extended, "https://app.example.com/after?keep=1&info=a.b.c");

        let err = extend_link("not a url", "info", "x");
        assert!(matches!(err, Err(AuthError::UnableToGenerateRedirectLink)));
    }

    #[test]
    fn display_name_splits_on_first_space() {
        assert_eq!(
            split_display_name("Ada Lovelace"),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(
            split_display_name("Ada King Lovelace"),
            ("Ada".to_string(), "King Lovelace".to_string())
        );
        assert_eq!(
            split_display_name("Ada"),
            ("Ada".to_string(), String::new())
        );
        assert_eq!(split_display_name(""), (String::new(), String::new()));
    }
}
