//! Credential directory
//!
//! Fixed set of users loaded from configuration. Only bcrypt hashes are held.

use std::collections::HashMap;

use crate::auth::{CredentialHasher, PasswordError};
use crate::configuration::UserEntry;

pub struct UserDirectory {
    users: HashMap<String, String>,
    hasher: CredentialHasher,
    // Compared against when the username is unknown so that lookups for
    // missing users cost the same as a wrong password.
    decoy_hash: String,
}

impl UserDirectory {
    pub fn new(entries: &[UserEntry], hasher: CredentialHasher) -> Result<Self, PasswordError> {
        let users = entries
            .iter()
            .map(|entry| (entry.username.clone(), entry.password_hash.clone()))
            .collect();
        let decoy_hash = hasher.hash(&uuid::Uuid::new_v4().to_string())?;

        Ok(Self {
            users,
            hasher,
            decoy_hash,
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// `Ok(true)` only if the user exists and the password matches. CPU-bound;
    /// call from a blocking context.
    ///
    /// # Errors
    /// `PasswordError::HashFormat` if the configured hash for this user is
    /// malformed.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool, PasswordError> {
        match self.users.get(username) {
            Some(hash) => self.hasher.verify(password, hash),
            None => {
                self.hasher.verify(password, &self.decoy_hash)?;
                Ok(false)
            }
        }
    }
}
