//! Credential hashing.
//!
//! Passwords are stored as salted bcrypt hashes. The cost factor is carried by
//! the hasher so production can use the standard cost while tests run fast.

use tracing::{debug, error};

use crate::error::{Result, ServiceError};

/// Cost factor used for stored credentials.
pub const DEFAULT_COST: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes the given password with a fresh random salt.
    pub fn hash(&self, plain: &str) -> Result<String> {
        debug!("Hashing password with cost {}", self.cost);
        bcrypt::hash(plain, self.cost).map_err(|err| {
            error!("Failed to hash password: {}", err);
            ServiceError::PasswordHash(err.to_string())
        })
    }

    /// Checks a plaintext candidate against a stored hash.
    ///
    /// A hash that cannot be parsed counts as a mismatch.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        match bcrypt::verify(plain, hash) {
            Ok(matches) => matches,
            Err(err) => {
                debug!("Password verification failed: {}", err);
                false
            }
        }
    }
}
