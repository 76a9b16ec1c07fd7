//! User model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account
///
/// `password_hash` is `None` for accounts that only ever signed in through
/// an external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub verified: bool,
    pub disabled: bool,
    pub superuser: bool,
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified user with the given email
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: normalize_email(email.into()),
            password_hash: None,
            verified: false,
            disabled: false,
            superuser: false,
            registered_at: Utc::now(),
        }
    }
}

/// Canonical form used for storage and lookup. Emails are matched
/// case-insensitively, so the stored value is always lowercase.
pub fn normalize_email(email: impl AsRef<str>) -> String {
    email.as_ref().trim().to_lowercase()
}
