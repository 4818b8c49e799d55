//! Password hashing primitives.
//!
//! Argon2id with an optional server-side pepper. Verification is
//! constant-time inside the `argon2` verifier. The cost knob is a small
//! bounded iteration count, a configuration value of its own, never derived
//! from a signing or encryption key.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

use crate::errors::{AuthError, AuthResult};

/// Highest accepted iteration cost
const MAX_COST: u32 = 16;

/// Argon2id password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    pepper: Option<String>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            pepper: None,
        }
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific iteration cost, bounded to `1..=16`
    pub fn with_cost(cost: u32) -> AuthResult<Self> {
        if cost == 0 || cost > MAX_COST {
            return Err(AuthError::Configuration(format!(
                "Password hashing cost must be between 1 and {MAX_COST}"
            )));
        }

        let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| AuthError::Configuration(format!("Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            pepper: None,
        })
    }

    /// Append a server-side pepper to every password before hashing
    pub fn with_pepper(mut self, pepper: impl Into<String>) -> Self {
        self.pepper = Some(pepper.into());
        self
    }

    fn peppered(&self, password: &str) -> String {
        match &self.pepper {
            Some(pepper) => format!("{password}{pepper}"),
            None => password.to_string(),
        }
    }

    /// Hash a plaintext password
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let peppered = self.peppered(password);
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify a plaintext password against a stored hash
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = self.peppered(password);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        self.argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("SecurePass123").unwrap();

        assert!(hasher.verify("SecurePass123", &hash).is_ok());
        assert!(matches!(
            hasher.verify("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_pepper_changes_the_verified_secret() {
        let plain = PasswordHasher::new();
        let peppered = PasswordHasher::new().with_pepper("server-pepper");

        let hash = peppered.hash("SecurePass123").unwrap();
        assert!(peppered.verify("SecurePass123", &hash).is_ok());
        assert!(plain.verify("SecurePass123", &hash).is_err());
    }

    #[test]
    fn test_cost_bounds() {
        assert!(PasswordHasher::with_cost(0).is_err());
        assert!(PasswordHasher::with_cost(MAX_COST + 1).is_err());

        let hasher = PasswordHasher::with_cost(1).unwrap();
        let hash = hasher.hash("SecurePass123").unwrap();
        assert!(hasher.verify("SecurePass123", &hash).is_ok());
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        let hasher = PasswordHasher::new();
        assert!(matches!(
            hasher.verify("SecurePass123", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
