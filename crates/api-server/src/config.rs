//! Application configuration
//!
//! Built once from the environment in `main` and injected by reference into
//! every component that needs it. Nothing reads configuration from ambient
//! global state after boot.

use std::path::PathBuf;

/// Placeholder signing secret. Boot refuses to start in production while
/// this value is still configured.
pub const DEFAULT_JWT_SECRET: &str = "gatehouse-dev-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    fn from_env() -> Self {
        match std::env::var("GATEHOUSE_ENV").as_deref() {
            Ok("production") | Ok("prod") => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Client credentials and membership allow-list for one OAuth provider
#[derive(Debug, Clone)]
pub struct OauthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// When non-empty, the external profile must belong to at least one of
    /// these organizations/groups.
    pub allowed_organizations: Vec<String>,
}

impl OauthProviderConfig {
    fn from_env(id_var: &str, secret_var: &str, orgs_var: &str) -> Option<Self> {
        let client_id = non_empty_var(id_var)?;
        let client_secret = non_empty_var(secret_var)?;
        Some(Self {
            client_id,
            client_secret,
            allowed_organizations: list_var(orgs_var),
        })
    }
}

/// Immutable server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub jwt_secret: String,
    pub data_dir: PathBuf,
    pub bind_addr: String,
    /// Externally reachable base URL, used for OAuth callbacks and
    /// password-reset links.
    pub public_url: String,
    /// Logo URL served by GET /server/image
    pub server_image: String,
    pub bcrypt_cost: u32,
    pub github: Option<OauthProviderConfig>,
    pub gitlab: Option<OauthProviderConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            jwt_secret: non_empty_var("GATEHOUSE_JWT_SECRET")
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            data_dir: std::env::var("GATEHOUSE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".gatehouse-data")),
            bind_addr: non_empty_var("GATEHOUSE_ADDR").unwrap_or_else(|| "0.0.0.0:8081".to_string()),
            public_url: non_empty_var("GATEHOUSE_PUBLIC_URL")
                .unwrap_or_else(|| "http://localhost:8081".to_string()),
            server_image: non_empty_var("GATEHOUSE_SERVER_IMAGE").unwrap_or_default(),
            bcrypt_cost: password_cost(environment),
            github: OauthProviderConfig::from_env(
                "GITHUB_CLIENT_ID",
                "GITHUB_CLIENT_SECRET",
                "GITHUB_ALLOWED_ORGS",
            ),
            gitlab: OauthProviderConfig::from_env(
                "GITLAB_CLIENT_ID",
                "GITLAB_CLIENT_SECRET",
                "GITLAB_ALLOWED_GROUPS",
            ),
        }
    }

    /// Refuse misconfigurations that must never reach production.
    pub fn validate(&self) -> Result<(), String> {
        if self.environment.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(
                "GATEHOUSE_JWT_SECRET is still the default placeholder; refusing to start in production"
                    .to_string(),
            );
        }
        Ok(())
    }

    /// True when the signing secret is still the shipped placeholder
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    #[cfg(test)]
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Self {
            environment: Environment::Development,
            jwt_secret: "test-secret".to_string(),
            data_dir,
            bind_addr: "127.0.0.1:0".to_string(),
            public_url: "http://localhost:8081".to_string(),
            server_image: "https://example.com/logo.png".to_string(),
            bcrypt_cost: 4,
            github: None,
            gitlab: None,
        }
    }
}

/// Production keeps the full bcrypt cost; everywhere else a low cost keeps
/// the test suite fast.
fn password_cost(environment: Environment) -> u32 {
    if environment.is_production() {
        bcrypt::DEFAULT_COST
    } else {
        4
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn list_var(name: &str) -> Vec<String> {
    std::env::var(name)
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_refuses_placeholder_secret() {
        let mut config = AppConfig::for_tests(PathBuf::from("/tmp"));
        config.environment = Environment::Production;
        config.jwt_secret = DEFAULT_JWT_SECRET.to_string();
        assert!(config.validate().is_err());

        config.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn development_tolerates_placeholder_secret() {
        let mut config = AppConfig::for_tests(PathBuf::from("/tmp"));
        config.jwt_secret = DEFAULT_JWT_SECRET.to_string();
        assert!(config.validate().is_ok());
        assert!(config.uses_default_secret());
    }
}
