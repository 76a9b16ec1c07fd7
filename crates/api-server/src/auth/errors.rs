//! Auth error taxonomy
//!
//! Every caller-reachable failure maps to a stable machine-readable
//! identifier plus an HTTP status. Raw underlying errors never reach the
//! client; server-side failures are logged and surface a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    AuthenticationFailed,

    #[error("Account is not verified or has been disabled")]
    UnverifiedAccount,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid authentication token")]
    InvalidSignature,

    #[error("Invalid authentication token")]
    MalformedToken,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("User not found")]
    UserNotFound,

    #[error("Missing or malformed redirect link")]
    MissingRedirectLink,

    #[error("Account does not belong to an allowed organization")]
    InvalidOrganization,

    #[error("Unable to process user data from {provider}")]
    UnableToProcessUserData { provider: String },

    #[error("Unable to generate redirect link")]
    UnableToGenerateRedirectLink,

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Stable identifier from a closed set, safe to match on clients
    pub fn identifier(&self) -> String {
        match self {
            Self::AuthenticationFailed => "auth_error.authentication_failed".to_string(),
            Self::UnverifiedAccount => "auth_error.not_verified".to_string(),
            Self::ExpiredToken => "auth_error.expired_token".to_string(),
            // Collapsed so clients cannot tell which check rejected the token
            Self::InvalidSignature | Self::MalformedToken => "auth_error.invalid_token".to_string(),
            Self::NotAuthorized => "auth_error.not_authorized".to_string(),
            Self::UserNotFound => "auth_error.user_not_found".to_string(),
            Self::MissingRedirectLink => "oauth.missing_redirect_link".to_string(),
            Self::InvalidOrganization => "oauth.invalid_organization".to_string(),
            Self::UnableToProcessUserData { provider } => format!("{provider}.bad_user_data"),
            Self::UnableToGenerateRedirectLink => {
                "oauth.unable_to_generate_redirect_link".to_string()
            }
            Self::Signing(_) => "server.signing_failed".to_string(),
            Self::Storage(_) => "server.storage_error".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthenticationFailed
            | Self::ExpiredToken
            | Self::InvalidSignature
            | Self::MalformedToken
            | Self::NotAuthorized
            | Self::InvalidOrganization => StatusCode::UNAUTHORIZED,
            Self::UnverifiedAccount => StatusCode::PRECONDITION_FAILED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::MissingRedirectLink => StatusCode::BAD_REQUEST,
            Self::UnableToProcessUserData { .. }
            | Self::UnableToGenerateRedirectLink
            | Self::Signing(_)
            | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing reason. Server-side failures get a generic message;
    /// the detail stays in the logs.
    fn description(&self) -> String {
        match self {
            Self::Signing(_) | Self::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<gatehouse_core::Error> for AuthError {
    fn from(err: gatehouse_core::Error) -> Self {
        match err {
            gatehouse_core::Error::ExpiredToken => Self::ExpiredToken,
            other => Self::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    description: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.identifier(),
            description: self.description(),
        };
        (status, Json(body)).into_response()
    }
}
