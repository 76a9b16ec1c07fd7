//! Token signing and verification
//!
//! HS256 compact JWTs over the single server-wide secret. Pure computation:
//! no storage, no shared mutable state.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};

use super::errors::AuthError;

#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    // The `typ` field is cleared so the header's field ordering stays
    // deterministic across implementations.
    fn header() -> Header {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = None;
        header
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Claims as short as two minutes must expire on time
        validation.leeway = 0;
        validation
    }

    /// Sign a claim payload into a compact token string
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Self::header(), claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }

    /// Verify signature, structure and expiration, in that order of trust:
    /// nothing from the payload is returned unless all checks pass.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        decode::<T>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{
        ConfirmationKind, EmailConfirmClaims, ExternalIdentityClaims, SessionClaims,
    };
    use gatehouse_core::user::User;
    use uuid::Uuid;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret")
    }

    #[test]
    fn sign_verify_roundtrip() {
        let signer = signer();
        let claims = SessionClaims::new(Uuid::new_v4());
        let token = signer.sign(&claims).unwrap();

        // Compact JWT shape: three dot-separated segments
        assert_eq!(token.split('.').count(), 3);

        let decoded: SessionClaims = signer.verify(&token).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn expired_claims_are_rejected() {
        let signer = signer();
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            exp: 1_000, // long past
        };
        let token = signer.sign(&claims).unwrap();
        let result = signer.verify::<SessionClaims>(&token);
        assert!(matches!(result, Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn wrong_secret_is_an_invalid_signature() {
        let claims = SessionClaims::new(Uuid::new_v4());
        let token = signer().sign(&claims).unwrap();
        let other = TokenSigner::new("another-secret");
        let result = other.verify::<SessionClaims>(&token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn tampered_tokens_never_verify() {
        let signer = signer();
        let claims = SessionClaims::new(Uuid::new_v4());
        let token = signer.sign(&claims).unwrap();

        // Flip one character in each segment in turn
        for segment in 0..3 {
            let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
            let mut chars: Vec<char> = parts[segment].chars().collect();
            let mid = chars.len() / 2;
            chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
            parts[segment] = chars.into_iter().collect();
            let tampered = parts.join(".");
            if tampered == token {
                continue;
            }
            assert!(signer.verify::<SessionClaims>(&tampered).is_err());
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let result = signer().verify::<SessionClaims>("not-a-jwt-at-all");
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[test]
    fn confirmation_claims_roundtrip() {
        let signer = signer();
        let claims = EmailConfirmClaims::new(
            Uuid::new_v4(),
            ConfirmationKind::Invitation,
            "https://app.example.com/welcome",
        );
        let token = signer.sign(&claims).unwrap();
        let decoded: EmailConfirmClaims = signer.verify(&token).unwrap();
        assert_eq!(decoded.confirmation, ConfirmationKind::Invitation);
        assert_eq!(decoded.redirect_uri, "https://app.example.com/welcome");
    }

    #[test]
    fn external_identity_claims_roundtrip_with_info_map() {
        let signer = signer();
        let mut user = User::new("octocat", "octo@example.com");
        user.first_name = "Octo".to_string();
        let claims = ExternalIdentityClaims::new(&user, "opaque-value".to_string());
        let token = signer.sign(&claims).unwrap();
        let decoded: ExternalIdentityClaims = signer.verify(&token).unwrap();
        assert_eq!(decoded.info.get("token").unwrap(), "opaque-value");
        assert_eq!(decoded.email, "octo@example.com");
    }
}
