//! Signed claim payloads
//!
//! Each variant carries its own expiration; verification always checks
//! `exp` before trusting any other field.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_core::user::User;

const SESSION_TTL_MINUTES: i64 = 15;
const PASSWORD_RESET_TTL_HOURS: i64 = 36;
const EMAIL_CONFIRM_TTL_HOURS: i64 = 24;
const EXTERNAL_IDENTITY_TTL_MINUTES: i64 = 2;

fn exp_after(duration: Duration) -> usize {
    (Utc::now() + duration).timestamp().max(0) as usize
}

/// Short-lived bearer credential used to authorize requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

impl SessionClaims {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: exp_after(Duration::minutes(SESSION_TTL_MINUTES)),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp as i64, 0).unwrap_or_else(Utc::now)
    }
}

/// Password recovery claim, embedded in the reset link sent by mail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetClaims {
    pub sub: String,
    pub redirect_uri: String,
    pub exp: usize,
}

impl PasswordResetClaims {
    pub fn new(user_id: Uuid, redirect_uri: impl Into<String>) -> Self {
        Self {
            sub: user_id.to_string(),
            redirect_uri: redirect_uri.into(),
            exp: exp_after(Duration::hours(PASSWORD_RESET_TTL_HOURS)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    Registration,
    Invitation,
}

/// Email address confirmation claim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfirmClaims {
    pub sub: String,
    pub confirmation: ConfirmationKind,
    pub redirect_uri: String,
    pub exp: usize,
}

impl EmailConfirmClaims {
    pub fn new(user_id: Uuid, confirmation: ConfirmationKind, redirect_uri: impl Into<String>) -> Self {
        Self {
            sub: user_id.to_string(),
            confirmation,
            redirect_uri: redirect_uri.into(),
            exp: exp_after(Duration::hours(EMAIL_CONFIRM_TTL_HOURS)),
        }
    }
}

/// Transport envelope handed to the browser after an external login.
/// Deliberately short-lived; `info.token` carries the opaque session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentityClaims {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub info: HashMap<String, String>,
    pub exp: usize,
}

impl ExternalIdentityClaims {
    pub fn new(user: &User, opaque_token: String) -> Self {
        let mut info = HashMap::new();
        info.insert("token".to_string(), opaque_token);
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            info,
            exp: exp_after(Duration::minutes(EXTERNAL_IDENTITY_TTL_MINUTES)),
        }
    }
}
