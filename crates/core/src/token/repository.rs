//! Session token repository trait

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{SessionToken, TokenKind};
use crate::Result;

/// Repository interface for opaque session tokens
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Create a token for a user, returning the plaintext value and the
    /// stored record. The plaintext is never retrievable again.
    async fn create(&self, user_id: Uuid, kind: TokenKind) -> Result<(String, SessionToken)>;

    /// Look up a token by its presented plaintext value.
    ///
    /// An expired match is deleted and reported as `Error::ExpiredToken`;
    /// an unknown value is `Ok(None)`.
    async fn find_by_value(&self, value: &str) -> Result<Option<SessionToken>>;

    /// Delete all tokens belonging to a user, returning how many were removed
    async fn delete_for_user(&self, user_id: Uuid) -> Result<usize>;
}
