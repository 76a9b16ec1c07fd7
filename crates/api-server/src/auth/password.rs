//! Credential verification
//!
//! Pure identity+secret matching. Account state (verified/disabled) is the
//! auth manager's concern, not this module's.

use gatehouse_core::user::{User, UserRepository};

use super::errors::AuthError;

/// Hash a password for storage. Cost comes from configuration so production
/// stays slow while test suites stay fast.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|err| AuthError::Storage(err.to_string()))
}

/// Check an email+password pair against the stored hash.
///
/// Returns `None` uniformly for an unknown email, a passwordless account,
/// or a mismatching password, so callers cannot enumerate users.
pub async fn verify_credentials(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> Option<User> {
    let user = users.find_by_email(email).await.ok().flatten()?;
    let hash = user.password_hash.as_deref()?;
    if bcrypt::verify(password, hash).unwrap_or(false) {
        Some(user)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::user::FileUserStore;
    use tempfile::TempDir;

    const TEST_COST: u32 = 4;

    async fn store_with_user(password: &str) -> (FileUserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileUserStore::new(temp_dir.path().join("users.json"))
            .await
            .unwrap();
        let mut user = User::new("alice", "real@x.com");
        user.password_hash = Some(hash_password(password, TEST_COST).unwrap());
        store.create(user).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn correct_credentials_resolve_the_user() {
        let (store, _tmp) = store_with_user("hunter2hunter2").await;
        let user = verify_credentials(&store, "real@x.com", "hunter2hunter2").await;
        assert!(user.is_some());
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let (store, _tmp) = store_with_user("correct-password").await;

        let unknown = verify_credentials(&store, "nonexistent@x.com", "anything").await;
        let wrong = verify_credentials(&store, "real@x.com", "wrongpassword").await;

        assert!(unknown.is_none());
        assert!(wrong.is_none());
    }

    #[tokio::test]
    async fn passwordless_accounts_never_match() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileUserStore::new(temp_dir.path().join("users.json"))
            .await
            .unwrap();
        store.create(User::new("ext", "ext@x.com")).await.unwrap();

        let result = verify_credentials(&store, "ext@x.com", "").await;
        assert!(result.is_none());
    }

    #[test]
    fn hash_is_not_the_plaintext() {
        let hash = hash_password("secret", TEST_COST).unwrap();
        assert_ne!(hash, "secret");
        assert!(bcrypt::verify("secret", &hash).unwrap());
    }
}
