//! Redirect-link stash for in-flight OAuth logins
//!
//! The browser's final destination is kept server-side, keyed by the random
//! state token we send through the provider round-trip. Entries are
//! short-lived; abandoned flows are pruned on the next stash.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use gatehouse_core::token::generate_token_value;

const LINK_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
struct StashedLink {
    link: String,
    stashed_at: DateTime<Utc>,
}

impl StashedLink {
    fn is_expired(&self) -> bool {
        self.stashed_at + Duration::minutes(LINK_TTL_MINUTES) <= Utc::now()
    }
}

#[derive(Debug, Default)]
pub struct LinkStash {
    entries: RwLock<HashMap<String, StashedLink>>,
}

impl LinkStash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash a redirect link and return the state token that retrieves it
    pub async fn stash(&self, link: String) -> String {
        let state = generate_token_value();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());
        entries.insert(
            state.clone(),
            StashedLink {
                link,
                stashed_at: Utc::now(),
            },
        );
        state
    }

    /// Take a stashed link by state token. Each token redeems at most once.
    pub async fn take(&self, state: &str) -> Option<String> {
        let mut entries = self.entries.write().await;
        let entry = entries.remove(state)?;
        if entry.is_expired() {
            return None;
        }
        Some(entry.link)
    }
}
