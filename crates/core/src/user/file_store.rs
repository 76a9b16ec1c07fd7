//! File-based user storage implementation
//!
//! Stores users as JSON in a file on disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{normalize_email, User};
use super::repository::UserRepository;
use crate::{Error, Result};

/// File-based user store using JSON
pub struct FileUserStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of users
    cache: RwLock<HashMap<Uuid, User>>,
}

impl FileUserStore {
    /// Create a new FileUserStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let users: Vec<User> = serde_json::from_str(&content)?;
            users.into_iter().map(|u| (u.id, u)).collect()
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
        let users: Vec<&User> = cache.values().collect();
        let content = serde_json::to_string_pretty(&users)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for FileUserStore {
    async fn create(&self, mut user: User) -> Result<User> {
        user.email = normalize_email(&user.email);
        {
            let mut cache = self.cache.write().await;
            if cache.values().any(|u| u.email == user.email) {
                return Err(Error::InvalidInput(format!(
                    "A user with email {} already exists",
                    user.email
                )));
            }
            cache.insert(user.id, user.clone());
        }
        self.persist().await?;
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let cache = self.cache.read().await;
        Ok(cache.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        let cache = self.cache.read().await;
        Ok(cache.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, mut user: User) -> Result<User> {
        user.email = normalize_email(&user.email);
        {
            let mut cache = self.cache.write().await;
            if !cache.contains_key(&user.id) {
                return Err(Error::UserNotFound(user.id.to_string()));
            }
            if cache
                .values()
                .any(|u| u.id != user.id && u.email == user.email)
            {
                return Err(Error::InvalidInput(format!(
                    "A user with email {} already exists",
                    user.email
                )));
            }
            cache.insert(user.id, user.clone());
        }
        self.persist().await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let cache = self.cache.read().await;
        let mut users: Vec<User> = cache.values().cloned().collect();
        users.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(users)
    }
}
