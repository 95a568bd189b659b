//! Signed bearer tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT validation error
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Failed to create token: {0}")]
    Encode(String),
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(username: &str, is_admin: bool, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            username: username.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// HS256 signing and verification keys plus the lifetime of issued tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Create a signed token for `username`
    pub fn issue(&self, username: &str, is_admin: bool) -> Result<String, JwtError> {
        let claims = Claims::new(username, is_admin, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::Encode(e.to_string()))
    }

    /// Validate and decode a token
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &[u8]) -> JwtKeys {
        JwtKeys::new(secret, Duration::hours(1))
    }

    #[test]
    fn test_issue_and_validate() {
        let keys = keys(b"secret-dev");
        let token = keys.issue("u1", true).unwrap();
        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.username, "u1");
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret() {
        let token = keys(b"one").issue("u1", false).unwrap();
        assert!(matches!(
            keys(b"two").validate(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired() {
        let keys = JwtKeys::new(b"secret-dev", Duration::hours(-1));
        let token = keys.issue("u1", false).unwrap();
        assert!(matches!(keys.validate(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage() {
        assert!(matches!(
            keys(b"secret-dev").validate("not.a.token"),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_claims_use_camel_case_admin_flag() {
        let claims = Claims::new("u1", false, Duration::hours(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["isAdmin"], false);
        assert_ne!(claims.jti, Claims::new("u1", false, Duration::hours(1)).jti);
    }
}
