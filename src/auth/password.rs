//! Password Hashing and Verification
//!
//! Salted, adaptive bcrypt hashing with a configurable work factor.

use crate::auth::error::PasswordError;

/// Work factor used when none is configured.
pub const DEFAULT_PASSWORD_COST: u32 = 14;

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Hashes and verifies user passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    /// # Errors
    /// `PasswordError::InvalidCost` if `cost` is outside bcrypt's 4..=31
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// - `PasswordError::TooLong` for inputs over 72 bytes, which bcrypt would
    ///   otherwise truncate silently
    /// - `PasswordError::Hashing` if bcrypt fails
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong {
                max: MAX_PASSWORD_BYTES,
            });
        }

        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Verify a password against a stored hash in constant time.
    ///
    /// Returns `Ok(false)` for any mismatch.
    ///
    /// # Errors
    /// `PasswordError::HashFormat` if the stored hash is not a bcrypt hash
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        let matched = bcrypt::verify(plaintext, hash)
            .map_err(|e| PasswordError::HashFormat(e.to_string()))?;

        // Nothing over the limit can have been hashed by us, and bcrypt would
        // compare only the truncated prefix.
        Ok(matched && plaintext.len() <= MAX_PASSWORD_BYTES)
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_PASSWORD_COST,
        }
    }
}
