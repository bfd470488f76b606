//! Bearer-token authorization
//!
//! The identity provider is an external collaborator; the pipeline only
//! depends on the [`IdentityProvider`] trait. The bundled implementation
//! verifies HS256 JWTs carrying the caller's email and name claims.

use crate::error::ApiError;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The caller resolved by the authorization gate
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

/// External identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer credential, resolving the caller or rejecting once.
    async fn verify(&self, credential: &str) -> Result<Identity, ApiError>;
}

/// Token claims accepted by [`JwtIdentityProvider`]
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Caller email, the external identity key
    pub email: String,
    /// First name
    #[serde(default)]
    pub given_name: String,
    /// Last name
    #[serde(default)]
    pub family_name: String,
    /// Expiration time
    pub exp: i64,
    /// Subject
    pub sub: Option<String>,
    /// Issuer
    pub iss: Option<String>,
}

/// HS256 JWT verification
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<Identity, ApiError> {
        let data = decode::<Claims>(credential, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("token validation failed: {e}");
            ApiError::InvalidCredentials("invalid or expired token".to_string())
        })?;

        if data.claims.email.is_empty() {
            return Err(ApiError::InvalidCredentials(
                "token carries no email".to_string(),
            ));
        }

        Ok(Identity {
            email: data.claims.email,
            firstname: data.claims.given_name,
            lastname: data.claims.family_name,
        })
    }
}

/// Extract the token from an `Authorization` header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    fn create_test_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn test_claims(exp: i64) -> Claims {
        Claims {
            email: "ada@example.com".to_string(),
            given_name: "Ada".to_string(),
            family_name: "Lovelace".to_string(),
            exp,
            sub: Some("user123".to_string()),
            iss: None,
        }
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let secret = "test-secret";
        let provider = JwtIdentityProvider::new(secret);
        let token = create_test_token(&test_claims(now() + 3600), secret);

        let identity = provider.verify(&token).await.unwrap();
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.firstname, "Ada");
        assert_eq!(identity.lastname, "Lovelace");
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let secret = "test-secret";
        let provider = JwtIdentityProvider::new(secret);
        let token = create_test_token(&test_claims(now() - 3600), secret);

        assert!(provider.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let provider = JwtIdentityProvider::new("right-secret");
        let token = create_test_token(&test_claims(now() + 3600), "wrong-secret");

        assert!(provider.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_email_is_rejected() {
        let secret = "test-secret";
        let provider = JwtIdentityProvider::new(secret);
        let mut claims = test_claims(now() + 3600);
        claims.email = String::new();
        let token = create_test_token(&claims, secret);

        assert!(provider.verify(&token).await.is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic xyz"), None);
    }
}
