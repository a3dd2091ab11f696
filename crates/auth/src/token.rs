//! Credential signing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use teamspace_core::{TenantId, UserId};

use crate::{Claims, Role};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TTL_SECS: i64 = 86_400;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for teamspace_core::DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => {
                teamspace_core::DomainError::unauthenticated("Not authorized, token failed")
            }
            TokenError::Signing(msg) => teamspace_core::DomainError::internal(msg),
        }
    }
}

/// A signed credential plus its lifetime, as handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Signs and verifies identity claims.
///
/// Swappable so tests can mint deterministic tokens without the production
/// secret.
pub trait TokenCodec: Send + Sync {
    fn sign(&self, claims: &Claims) -> Result<SignedToken, TokenError>;
    fn verify(&self, token: &str) -> Result<Claims, TokenError>;
}

/// Wire-format claims. `iat`/`exp` are epoch seconds per RFC 7519.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: Uuid,
    tenant_id: Option<Uuid>,
    role: Role,
    iat: i64,
    exp: i64,
}

/// HMAC-SHA256 codec over a shared secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, DEFAULT_TTL_SECS)
    }

    pub fn with_ttl(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn sign(&self, claims: &Claims) -> Result<SignedToken, TokenError> {
        let now = Utc::now();
        let wire = WireClaims {
            sub: *claims.sub.as_uuid(),
            tenant_id: claims.tenant_id.map(Into::into),
            role: claims.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &wire, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(SignedToken {
            token,
            expires_in: self.ttl_secs,
        })
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data =
            decode::<WireClaims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;
        Ok(Claims {
            sub: UserId::from_uuid(data.claims.sub),
            tenant_id: data.claims.tenant_id.map(TenantId::from_uuid),
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        Claims::new(UserId::new(), Some(TenantId::new()), Role::TenantAdmin)
    }

    #[test]
    fn sign_then_verify_round_trips_claims() {
        let codec = Hs256TokenCodec::new(b"test-secret");
        let claims = sample_claims();

        let signed = codec.sign(&claims).unwrap();
        assert_eq!(signed.expires_in, DEFAULT_TTL_SECS);

        let decoded = codec.verify(&signed.token).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn super_admin_claims_carry_no_tenant() {
        let codec = Hs256TokenCodec::new(b"test-secret");
        let claims = Claims::new(UserId::new(), None, Role::SuperAdmin);

        let signed = codec.sign(&claims).unwrap();
        let decoded = codec.verify(&signed.token).unwrap();
        assert_eq!(decoded.tenant_id, None);
        assert_eq!(decoded.role, Role::SuperAdmin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let codec = Hs256TokenCodec::new(b"test-secret");
        let other = Hs256TokenCodec::new(b"other-secret");

        let signed = codec.sign(&sample_claims()).unwrap();
        let err = other.verify(&signed.token).unwrap_err();
        match err {
            TokenError::Invalid(_) => {}
            other => panic!("expected invalid token, got {other:?}"),
        }
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // Far enough in the past to clear the default leeway.
        let codec = Hs256TokenCodec::with_ttl(b"test-secret", -300);
        let signed = codec.sign(&sample_claims()).unwrap();

        let err = codec.verify(&signed.token).unwrap_err();
        match err {
            TokenError::Expired => {}
            other => panic!("expected expired token, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = Hs256TokenCodec::new(b"test-secret");
        assert!(codec.verify("not-a-token").is_err());
    }
}
