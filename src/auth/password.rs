//! Password Hashing
//! Mission: One-way salted hashing and verification for credentials

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

/// Bcrypt-backed password hasher with a tunable work factor
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password. Bcrypt salts every call, so identical
    /// passwords produce different stored hashes.
    pub fn hash(&self, plaintext: &str) -> Result<String, BcryptError> {
        hash(plaintext, self.cost)
    }

    /// Verify a plaintext password against a stored hash.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, BcryptError> {
        verify(plaintext, hashed)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}
