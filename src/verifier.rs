//! Credential verification.
//!
//! Finds at most one record matching the non-password credential entries,
//! then checks the supplied password locally against the record's stored
//! hash. The record source is never queried for password matching itself.

use crate::errors::{AuthError, AuthResult};
use crate::password::PasswordHasher;
use crate::record::{Credentials, PASSWORD_HASH_FIELD, UserRecord};
use crate::store::RecordSource;

/// Lookup plus local password check
#[derive(Clone)]
pub struct CredentialVerifier {
    hasher: PasswordHasher,
}

impl CredentialVerifier {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Resolve `credentials` to a record through `source`.
    ///
    /// Every entry except the reserved `password` key becomes an AND filter.
    /// `NotFound` and `InvalidCredentials` stay distinct here so the
    /// decision can be logged; the public boundary merges them.
    pub async fn verify(
        &self,
        source: &dyn RecordSource,
        credentials: &Credentials,
    ) -> AuthResult<UserRecord> {
        if credentials.is_empty() {
            return Err(AuthError::InvalidInput(
                "Credentials must be a non-empty map".to_string(),
            ));
        }

        let filters = credentials.lookup_filters();
        if filters.is_empty() {
            return Err(AuthError::InvalidInput(
                "Credentials carry no lookup fields".to_string(),
            ));
        }

        let record = source.find_by(&filters).await?.ok_or(AuthError::NotFound)?;

        if let Some(password) = credentials.password() {
            let Some(hash) = record.get_str(PASSWORD_HASH_FIELD) else {
                log::warn!("Matched record has no `{PASSWORD_HASH_FIELD}` field");
                return Err(AuthError::InvalidCredentials);
            };
            self.hasher.verify(password, hash)?;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::store::MemoryRecordSource;

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(PasswordHasher::new())
    }

    fn source_with_ann(hasher: &PasswordHasher) -> MemoryRecordSource {
        let hash = hasher.hash("secret").unwrap();
        MemoryRecordSource::new().with_record(
            UserRecord::new()
                .with("id", 7)
                .with("name", "Ann")
                .with(PASSWORD_HASH_FIELD, hash),
        )
    }

    #[tokio::test]
    async fn test_verify_matches_and_checks_password() {
        let verifier = verifier();
        let source = source_with_ann(verifier.hasher());

        let credentials = Credentials::new().with("id", 7).with("password", "secret");
        let record = verifier.verify(&source, &credentials).await.unwrap();
        assert_eq!(record.get("name"), Some(&json!("Ann")));
    }

    #[tokio::test]
    async fn test_verify_without_password_skips_the_check() {
        let verifier = verifier();
        let source = source_with_ann(verifier.hasher());

        let credentials = Credentials::new().with("id", 7);
        assert!(verifier.verify(&source, &credentials).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_is_distinct_from_not_found() {
        let verifier = verifier();
        let source = source_with_ann(verifier.hasher());

        let wrong = Credentials::new().with("id", 7).with("password", "wrong");
        assert!(matches!(
            verifier.verify(&source, &wrong).await,
            Err(AuthError::InvalidCredentials)
        ));

        let missing = Credentials::new().with("id", 404).with("password", "secret");
        assert!(matches!(
            verifier.verify(&source, &missing).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_empty_credentials_are_invalid_input() {
        let verifier = verifier();
        let source = source_with_ann(verifier.hasher());

        assert!(matches!(
            verifier.verify(&source, &Credentials::new()).await,
            Err(AuthError::InvalidInput(_))
        ));

        let password_only = Credentials::new().with("password", "secret");
        assert!(matches!(
            verifier.verify(&source, &password_only).await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_record_without_stored_hash_fails_closed() {
        let verifier = verifier();
        let source = MemoryRecordSource::new()
            .with_record(UserRecord::new().with("id", 7).with("name", "Ann"));

        let credentials = Credentials::new().with("id", 7).with("password", "secret");
        assert!(matches!(
            verifier.verify(&source, &credentials).await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
