//! Auth manager
//!
//! Orchestrates login, token renewal and logout on top of the user store,
//! the opaque token store and the signer. The opaque token is the
//! persisted, revocable credential; the signed bearer is the short-lived,
//! stateless one used to authorize requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use gatehouse_core::token::{FileTokenStore, TokenKind, TokenRepository};
use gatehouse_core::user::{FileUserStore, User, UserRepository};

use super::claims::SessionClaims;
use super::errors::AuthError;
use super::password::verify_credentials;
use super::signer::TokenSigner;

/// Display-safe view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub registered: DateTime<Utc>,
    pub disabled: bool,
    pub superuser: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            registered: user.registered_at,
            disabled: user.disabled,
            superuser: user.superuser,
        }
    }
}

/// Outcome of a successful login or renewal
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user: PublicUser,
    pub expires: DateTime<Utc>,
    /// Plaintext opaque token. Present only on paths that created one;
    /// renewals never re-expose it.
    pub token: Option<String>,
    pub bearer: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<FileUserStore>,
    tokens: Arc<FileTokenStore>,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(users: Arc<FileUserStore>, tokens: Arc<FileTokenStore>, signer: TokenSigner) -> Self {
        Self {
            users,
            tokens,
            signer,
        }
    }

    /// Credential login: verify, gate on account state, issue both
    /// credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::AuthenticationFailed);
        }

        let user = verify_credentials(self.users.as_ref(), email, password)
            .await
            .ok_or(AuthError::AuthenticationFailed)?;

        if !user.verified {
            return Err(AuthError::UnverifiedAccount);
        }

        self.login_user(&user).await
    }

    /// Issue credentials for an already-identified user (external login).
    /// Still refuses disabled accounts.
    pub async fn login_user(&self, user: &User) -> Result<Session, AuthError> {
        if user.disabled {
            return Err(AuthError::UnverifiedAccount);
        }

        let (value, record) = self
            .tokens
            .create(user.id, TokenKind::Authentication)
            .await?;
        let claims = SessionClaims::new(user.id);
        let bearer = self.signer.sign(&claims)?;

        Ok(Session {
            id: record.id,
            user: PublicUser::from(user),
            expires: record.expires_at,
            token: Some(value),
            bearer,
        })
    }

    /// Renew the short-lived bearer from a presented opaque token.
    /// Does not re-verify the password and does not re-expose the token.
    pub async fn renew_opaque(&self, presented: &str) -> Result<Session, AuthError> {
        let record = self
            .tokens
            .find_by_value(presented)
            .await?
            .ok_or(AuthError::AuthenticationFailed)?;

        let user = self
            .users
            .get(record.user_id)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::AuthenticationFailed)?;

        let claims = SessionClaims::new(user.id);
        let bearer = self.signer.sign(&claims)?;

        Ok(Session {
            id: record.id,
            user: PublicUser::from(&user),
            expires: record.expires_at,
            token: None,
            bearer,
        })
    }

    /// Renew from a still-valid bearer
    pub async fn renew_bearer(&self, bearer: &str) -> Result<Session, AuthError> {
        let claims: SessionClaims = self.signer.verify(bearer)?;
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AuthError::AuthenticationFailed)?;

        let user = self
            .users
            .get(user_id)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::AuthenticationFailed)?;

        let fresh = SessionClaims::new(user.id);
        let bearer = self.signer.sign(&fresh)?;

        Ok(Session {
            id: user.id,
            user: PublicUser::from(&user),
            expires: fresh.expires_at(),
            token: None,
            bearer,
        })
    }

    /// All-sessions logout: revokes every opaque token the owning user has
    pub async fn logout(&self, presented: &str) -> Result<(), AuthError> {
        let record = self
            .tokens
            .find_by_value(presented)
            .await?
            .ok_or(AuthError::AuthenticationFailed)?;

        self.tokens
            .delete_for_user(record.user_id)
            .await
            .map_err(AuthError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use gatehouse_core::token::hash_token_value;
    use tempfile::TempDir;

    async fn build_service() -> (AuthService, Arc<FileUserStore>, Arc<FileTokenStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let users = Arc::new(
            FileUserStore::new(temp_dir.path().join("users.json"))
                .await
                .unwrap(),
        );
        let tokens = Arc::new(
            FileTokenStore::new(temp_dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        let signer = TokenSigner::new("test-secret");
        let service = AuthService::new(Arc::clone(&users), Arc::clone(&tokens), signer);
        (service, users, tokens, temp_dir)
    }

    async fn seed_user(users: &FileUserStore, verified: bool) -> User {
        let mut user = User::new("alice", "a@b.com");
        user.password_hash = Some(hash_password("correct", 4).unwrap());
        user.verified = verified;
        users.create(user).await.unwrap()
    }

    #[tokio::test]
    async fn login_issues_both_credentials() {
        let (service, users, tokens, _tmp) = build_service().await;
        let user = seed_user(&users, true).await;

        let session = service.login("a@b.com", "correct").await.unwrap();
        let plaintext = session.token.clone().unwrap();

        // Stored record holds only the hash of the returned plaintext
        let record = tokens.get(session.id).await.unwrap().unwrap();
        assert_ne!(plaintext, record.token_hash);
        assert_eq!(hash_token_value(&plaintext), record.token_hash);
        assert_eq!(record.user_id, user.id);
        assert_eq!(session.user.email, "a@b.com");
        assert!(!session.bearer.is_empty());
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials_and_empty_input() {
        let (service, users, _tokens, _tmp) = build_service().await;
        seed_user(&users, true).await;

        let wrong = service.login("a@b.com", "wrong").await;
        assert!(matches!(wrong, Err(AuthError::AuthenticationFailed)));

        let empty = service.login("", "").await;
        assert!(matches!(empty, Err(AuthError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn login_rejects_unverified_accounts() {
        let (service, users, _tokens, _tmp) = build_service().await;
        seed_user(&users, false).await;

        let result = service.login("a@b.com", "correct").await;
        assert!(matches!(result, Err(AuthError::UnverifiedAccount)));
    }

    #[tokio::test]
    async fn renew_does_not_reexpose_the_opaque_token() {
        let (service, users, _tokens, _tmp) = build_service().await;
        seed_user(&users, true).await;

        let session = service.login("a@b.com", "correct").await.unwrap();
        let opaque = session.token.unwrap();

        let renewed = service.renew_opaque(&opaque).await.unwrap();
        assert!(renewed.token.is_none());
        assert!(!renewed.bearer.is_empty());

        let by_bearer = service.renew_bearer(&renewed.bearer).await.unwrap();
        assert!(by_bearer.token.is_none());
    }

    #[tokio::test]
    async fn logout_revokes_every_session() {
        let (service, users, tokens, _tmp) = build_service().await;
        let user = seed_user(&users, true).await;

        let first = service.login("a@b.com", "correct").await.unwrap();
        let second = service.login("a@b.com", "correct").await.unwrap();
        assert_eq!(tokens.count_for_user(user.id).await, 2);

        service.logout(&second.token.unwrap()).await.unwrap();

        assert_eq!(tokens.count_for_user(user.id).await, 0);
        let renew = service.renew_opaque(&first.token.unwrap()).await;
        assert!(matches!(renew, Err(AuthError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn disabled_users_cannot_login_even_when_identified() {
        let (service, users, _tokens, _tmp) = build_service().await;
        let mut user = seed_user(&users, true).await;
        user.disabled = true;
        let user = users.update(user).await.unwrap();

        let result = service.login_user(&user).await;
        assert!(matches!(result, Err(AuthError::UnverifiedAccount)));
    }
}
