//! Session token model definitions

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// What a stored token is good for.
///
/// `PasswordRecovery` is declared for completeness; the recovery flow issues
/// signed claims instead, so no code path creates tokens of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Authentication,
    PasswordRecovery,
}

impl TokenKind {
    /// Lifetime of a freshly issued token of this kind
    pub fn ttl(self) -> Duration {
        match self {
            Self::Authentication => Duration::days(30),
            Self::PasswordRecovery => Duration::hours(1),
        }
    }
}

/// A persisted session token. Only the hash of the token value is stored;
/// the plaintext leaves the server exactly once, at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Generate a new random token value
pub fn generate_token_value() -> String {
    use rand::RngCore;
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token value for storage or lookup
pub fn hash_token_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
