//! User repository trait
//!
//! Defines the interface for user storage operations.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::User;
use crate::Result;

/// Repository interface for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user. Fails if the email is already taken.
    async fn create(&self, user: User) -> Result<User>;

    /// Get a user by ID
    async fn get(&self, id: Uuid) -> Result<Option<User>>;

    /// Find a user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update an existing user
    async fn update(&self, user: User) -> Result<User>;

    /// Get all users
    async fn list(&self) -> Result<Vec<User>>;
}
