//! Application state
//!
//! Assembled once at boot; everything inside is immutable or internally
//! synchronized. The route table is built here, at the composition root,
//! and never mutated afterwards.

use std::sync::Arc;

use gatehouse_core::token::FileTokenStore;
use gatehouse_core::user::FileUserStore;

use crate::auth::{middleware::RouteTable, AuthService, TokenSigner};
use crate::config::AppConfig;
use crate::mail::{Mailer, TracingMailer};
use crate::oauth::{GitHubProvider, GitLabProvider, LinkStash, OauthProvider};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    users: Arc<FileUserStore>,
    tokens: Arc<FileTokenStore>,
    signer: TokenSigner,
    auth: AuthService,
    providers: Vec<Arc<dyn OauthProvider>>,
    links: LinkStash,
    routes: RouteTable,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Create a new AppState with providers and mailer from configuration
    pub async fn new(config: AppConfig) -> gatehouse_core::Result<Self> {
        let mut providers: Vec<Arc<dyn OauthProvider>> = Vec::new();
        if let Some(github) = config.github.clone() {
            providers.push(Arc::new(GitHubProvider::new(github, &config.public_url)));
        }
        if let Some(gitlab) = config.gitlab.clone() {
            providers.push(Arc::new(GitLabProvider::new(gitlab, &config.public_url)));
        }
        Self::with_parts(config, providers, Arc::new(TracingMailer)).await
    }

    /// Create an AppState with explicit providers and mailer
    pub async fn with_parts(
        config: AppConfig,
        providers: Vec<Arc<dyn OauthProvider>>,
        mailer: Arc<dyn Mailer>,
    ) -> gatehouse_core::Result<Self> {
        let users = Arc::new(FileUserStore::new(config.data_dir.join("users.json")).await?);
        let tokens = Arc::new(FileTokenStore::new(config.data_dir.join("tokens.json")).await?);
        let signer = TokenSigner::new(&config.jwt_secret);
        let auth = AuthService::new(Arc::clone(&users), Arc::clone(&tokens), signer.clone());
        let routes = build_route_table(&providers);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                tokens,
                signer,
                auth,
                providers,
                links: LinkStash::new(),
                routes,
                mailer,
            }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn users(&self) -> &FileUserStore {
        &self.inner.users
    }

    pub fn tokens(&self) -> &FileTokenStore {
        &self.inner.tokens
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.inner.signer
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn OauthProvider>> {
        self.inner
            .providers
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    pub fn providers(&self) -> &[Arc<dyn OauthProvider>] {
        &self.inner.providers
    }

    pub fn links(&self) -> &LinkStash {
        &self.inner.links
    }

    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }
}

/// Assemble the immutable route classification table
fn build_route_table(providers: &[Arc<dyn OauthProvider>]) -> RouteTable {
    let mut builder = RouteTable::builder()
        .allow_get("/health")
        .allow_get("/auth")
        .allow_get("/token")
        .allow_get("/server/image")
        .allow_get("/auth/finish-recovery")
        .allow_post("/auth")
        .allow_post("/token")
        .allow_post("/auth/start-recovery")
        .allow_post("/auth/finish-recovery")
        .maintenance("/install");

    for provider in providers {
        builder = builder
            .allow_get(format!("/auth/{}/login", provider.name()))
            .allow_get(format!("/auth/{}/callback", provider.name()));
    }

    builder.build()
}
