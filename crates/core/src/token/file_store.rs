//! File-based session token storage implementation
//!
//! Stores token records as JSON in a file on disk. Only token hashes are
//! persisted, never plaintext values.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{generate_token_value, hash_token_value, SessionToken, TokenKind};
use super::repository::TokenRepository;
use crate::{Error, Result};

/// File-based session token store using JSON
pub struct FileTokenStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of token records
    cache: RwLock<HashMap<Uuid, SessionToken>>,
}

impl FileTokenStore {
    /// Create a new FileTokenStore
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let tokens: Vec<SessionToken> = serde_json::from_str(&content)?;
            tokens.into_iter().map(|t| (t.id, t)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Persist the cache to disk
    async fn persist(&self) -> Result<()> {
        let cache = self.cache.read().await;
        let tokens: Vec<&SessionToken> = cache.values().collect();
        let content = serde_json::to_string_pretty(&tokens)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Get a raw record by ID, mostly useful in tests
    pub async fn get(&self, id: Uuid) -> Result<Option<SessionToken>> {
        let cache = self.cache.read().await;
        Ok(cache.get(&id).cloned())
    }

    /// Count live records for a user
    pub async fn count_for_user(&self, user_id: Uuid) -> usize {
        let cache = self.cache.read().await;
        cache.values().filter(|t| t.user_id == user_id).count()
    }
}

#[async_trait]
impl TokenRepository for FileTokenStore {
    async fn create(&self, user_id: Uuid, kind: TokenKind) -> Result<(String, SessionToken)> {
        let value = generate_token_value();
        let record = SessionToken {
            id: Uuid::new_v4(),
            user_id,
            token_hash: hash_token_value(&value),
            kind,
            expires_at: Utc::now() + kind.ttl(),
        };
        {
            let mut cache = self.cache.write().await;
            cache.insert(record.id, record.clone());
        }
        self.persist().await?;
        Ok((value, record))
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<SessionToken>> {
        let hash = hash_token_value(value);

        // Expiry check and removal happen under one write lock so that two
        // concurrent uses of the same expired token cannot both succeed.
        let (found, removed_expired) = {
            let mut cache = self.cache.write().await;
            let hit = cache
                .values()
                .find(|t| t.token_hash == hash)
                .map(|t| (t.id, t.is_expired()));
            match hit {
                Some((id, true)) => {
                    cache.remove(&id);
                    (None, true)
                }
                Some((id, false)) => (cache.get(&id).cloned(), false),
                None => (None, false),
            }
        };

        if removed_expired {
            self.persist().await?;
            return Err(Error::ExpiredToken);
        }
        Ok(found)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<usize> {
        let removed = {
            let mut cache = self.cache.write().await;
            let ids: Vec<Uuid> = cache
                .values()
                .filter(|t| t.user_id == user_id)
                .map(|t| t.id)
                .collect();
            for id in &ids {
                cache.remove(id);
            }
            ids.len()
        };
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }
}
