//! Credential hashing using Argon2id.

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("credential hashing failed: {0}")]
pub struct HashError(String);

/// Hashes and verifies login secrets.
///
/// Swappable so tests can substitute a cheap deterministic implementation.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch; `Err` only when the stored digest is
    /// malformed or the primitive itself fails.
    fn verify(&self, secret: &str, digest: &str) -> Result<bool, HashError>;
}

/// Argon2id with default parameters, producing PHC-format strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| HashError(format!("hash error: {e}")))
    }

    fn verify(&self, secret: &str, digest: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(digest).map_err(|e| HashError(format!("invalid hash format: {e}")))?;
        match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError(format!("verify error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_secret_matches() {
        let hasher = Argon2Hasher;
        let digest = hasher.hash("hunter2").unwrap();
        assert!(hasher.verify("hunter2", &digest).unwrap());
    }

    #[test]
    fn wrong_secret_does_not_match() {
        let hasher = Argon2Hasher;
        let digest = hasher.hash("hunter2").unwrap();
        assert!(!hasher.verify("wrong", &digest).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = Argon2Hasher;
        let a = hasher.hash("hunter2").unwrap();
        let b = hasher.hash("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_returns_error() {
        let hasher = Argon2Hasher;
        assert!(hasher.verify("pw", "not-a-hash").is_err());
    }
}
