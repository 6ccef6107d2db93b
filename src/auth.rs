//! Password hashing and verification.
//!
//! Credential hashing is a collaborator of the storage core, not part of it;
//! the seam is a trait so the user repository can be exercised without
//! paying Argon2 cost in tests.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::Argon2;

use crate::error::{Result, StoreError};

/// Hashes and verifies user credentials.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plain-text password for storage.
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a plain-text password against a stored hash.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool>;
}

/// Argon2 credential hasher with default parameters.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        if password.is_empty() {
            return Err(StoreError::Hash("password must not be empty".into()));
        }

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Hash(e.to_string()))
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| StoreError::Hash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
