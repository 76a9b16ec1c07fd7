//! Mail delivery contract
//!
//! Template rendering and SMTP are external collaborators; this crate only
//! needs a seam to hand off a reset link.

use async_trait::async_trait;

use crate::auth::AuthError;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), AuthError>;
}

/// Default mailer: logs the delivery instead of sending it
#[derive(Debug, Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), AuthError> {
        tracing::info!(%email, %reset_url, "password reset mail queued");
        Ok(())
    }
}
