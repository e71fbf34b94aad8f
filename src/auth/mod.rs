//! Bearer-token identity verification.
//!
//! Tokens are HS256 JWTs issued by an external identity provider that shares
//! its signing secret with us. The `sub` claim is the user id; the audience
//! is not checked.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{FinError, Result, UserId};

/// Detail returned when no signing secret is configured
pub const MISSING_SECRET_DETAIL: &str = "Server misconfiguration: missing JWT secret";

/// Maps a bearer token to the caller's identity
pub trait IdentityVerifier: Send + Sync {
    /// `FinError::Unauthorized` for a bad token, `FinError::Config` when the
    /// verifier itself cannot work
    fn verify(&self, token: &str) -> Result<UserId>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
}

/// HS256 verifier backed by a shared secret
pub struct JwtVerifier {
    secret: Option<SecretString>,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(secret: Option<SecretString>) -> Self {
        if secret.is_none() {
            warn!("No JWT secret configured; every authenticated request will fail");
        }
        Self { secret }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);
        validation
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<UserId> {
        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| FinError::Config(MISSING_SECRET_DETAIL.to_string()))?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            &Self::validation(),
        )
        .map_err(|e| {
            debug!(error = %e, "JWT verification failed");
            FinError::Unauthorized(e.to_string())
        })?;

        data.claims
            .sub
            .filter(|sub| !sub.is_empty())
            .map(UserId::from)
            .ok_or_else(|| FinError::Unauthorized("token has no subject".to_string()))
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
pub(crate) mod testing {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    pub(crate) const SECRET: &str = "test-signing-secret";

    /// HS256 token for `sub`, expiring an hour from now
    pub(crate) fn token_for(sub: &str) -> String {
        sign(json!({
            "sub": sub,
            "aud": "authenticated",
            "exp": chrono::Utc::now().timestamp() + 3600,
        }), SECRET)
    }

    pub(crate) fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{SECRET, sign, token_for};
    use super::*;
    use serde_json::json;

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(Some(SecretString::from(SECRET)))
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let user = verifier().verify(&token_for("user-123")).unwrap();
        assert_eq!(user.as_str(), "user-123");
    }

    #[test]
    fn test_audience_is_ignored() {
        let token = sign(json!({"sub": "u1", "aud": "someone-else"}), SECRET);
        assert_eq!(verifier().verify(&token).unwrap().as_str(), "u1");
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = sign(json!({"sub": "u1"}), "other-secret");
        assert!(matches!(
            verifier().verify(&token),
            Err(FinError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let token = sign(
            json!({"sub": "u1", "exp": chrono::Utc::now().timestamp() - 3600}),
            SECRET,
        );
        assert!(matches!(
            verifier().verify(&token),
            Err(FinError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_missing_subject_is_unauthorized() {
        let token = sign(json!({"role": "authenticated"}), SECRET);
        assert!(matches!(
            verifier().verify(&token),
            Err(FinError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_is_unauthorized() {
        assert!(matches!(
            verifier().verify("not.a.jwt"),
            Err(FinError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_missing_secret_is_misconfiguration() {
        let err = JwtVerifier::new(None).verify(&token_for("u1")).unwrap_err();
        assert!(matches!(err, FinError::Config(ref msg) if msg == MISSING_SECRET_DETAIL));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        assert!(!format!("{:?}", verifier()).contains(SECRET));
    }
}
