//! Signed, time-limited bearer tokens asserting (id, email, rol).
//!
//! Issuance happens at login; verification of incoming requests is left to
//! whatever sits in front of the API. The decode path exists for that
//! consumer and for tests.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: i32,

    pub email: String,

    pub rol: String,

    /// Issued-at, unix seconds
    pub iat: i64,

    /// Expiry, unix seconds
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Issue an HS256 token for the given account
    pub fn issue(&self, id: i32, email: &str, rol: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: id,
            email: email.to_string(),
            rol: rol.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.ttl_hours)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Decode and validate a token, checking signature and expiry
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid or expired token")?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_decode() {
        let service = TokenService::new("test-secret", 24);
        let token = service.issue(7, "ana@example.com", "admin").unwrap();

        let claims = service.decode(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.rol, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn rejects_wrong_secret() {
        let issuer = TokenService::new("secret-a", 24);
        let verifier = TokenService::new("secret-b", 24);

        let token = issuer.issue(1, "x@example.com", "student").unwrap();
        assert!(verifier.decode(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let service = TokenService::new("test-secret", -1);
        let token = service.issue(1, "x@example.com", "student").unwrap();
        assert!(service.decode(&token).is_err());
    }
}
