//! The `Auth` facade: guard-scoped token lifecycle orchestration.
//!
//! One `Auth` value per logical request. Fluent setters consume and return
//! the value, so override state is never shared across requests; operations
//! read the session state once and delegate to the record source and token
//! backend. Every public operation funnels its outcome through a single
//! fail-mode policy point.

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;

use crate::config::{AuthConfig, GuardConfig};
use crate::errors::{AuthError, AuthResult};
use crate::password::PasswordHasher;
use crate::record::{Credentials, FieldMap, Fields, UserRecord, is_empty_value, subject_of};
use crate::session::SessionState;
use crate::store::{RecordSource, SourceRegistry};
use crate::token::{RevokeScope, TokenBackend, TokenError, TokenPair};
use crate::verifier::CredentialVerifier;

/// Payload field holding a principal's single role
const ROLE_FIELD: &str = "role";

/// Payload field holding a principal's role list
const ROLES_FIELD: &str = "roles";

/// Authentication facade
#[derive(Clone)]
pub struct Auth {
    config: Arc<AuthConfig>,
    sources: Arc<SourceRegistry>,
    backend: Arc<dyn TokenBackend>,
    verifier: CredentialVerifier,
    session: SessionState,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Auth {
    /// Compose the facade from its collaborators.
    ///
    /// The guard registry and the source registry are cross-checked here:
    /// a malformed guard or a guard without a record source is a
    /// construction-time `Configuration` error, never a call-time surprise.
    pub fn new(
        config: AuthConfig,
        sources: SourceRegistry,
        backend: Arc<dyn TokenBackend>,
    ) -> AuthResult<Self> {
        config.validate().map_err(AuthError::Configuration)?;

        for name in config.guard_names() {
            if !sources.contains_key(name) {
                return Err(AuthError::Configuration(format!(
                    "No record source registered for guard `{name}`"
                )));
            }
        }

        let session = SessionState::new(config.default_guard());
        Ok(Self {
            config: Arc::new(config),
            sources: Arc::new(sources),
            backend,
            verifier: CredentialVerifier::new(PasswordHasher::new()),
            session,
        })
    }

    /// Replace the default password hasher
    pub fn with_password_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.verifier = CredentialVerifier::new(hasher);
        self
    }

    /// Select the guard the next operations run under
    pub fn guard(mut self, name: impl Into<String>) -> Self {
        self.session.guard = name.into();
        self
    }

    /// Override the access token lifetime for the next operations
    pub fn access_ttl(mut self, ttl: Duration) -> Self {
        self.session.access_ttl = Some(ttl);
        self
    }

    /// Override the refresh token lifetime for the next operations
    pub fn refresh_ttl(mut self, ttl: Duration) -> Self {
        self.session.refresh_ttl = Some(ttl);
        self
    }

    /// Raise structured errors (`true`) or return soft sentinels (`false`)
    pub fn fail_mode(mut self, fail_hard: bool) -> Self {
        self.session.fail_hard = fail_hard;
        self
    }

    /// The session state the next operation will read
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Verify credentials against the active guard and issue a token pair
    ///
    /// # Arguments
    ///
    /// * `credentials` - Lookup constraints plus an optional `password` entry
    ///
    /// # Returns
    ///
    /// * `AuthResult<Option<TokenPair>>` - The issued pair, or `None` in soft mode
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidInput` - No lookup constraints were supplied
    /// * `AuthError::AuthenticationFailed` - No record matched or the password
    ///   was wrong (hard mode only; the sub-cases are never distinguished)
    /// * `AuthError::MissingIdentity` - The matched record lacks the guard's
    ///   identity field
    pub async fn attempt(&self, credentials: &Credentials) -> AuthResult<Option<TokenPair>> {
        let result = self.attempt_inner(credentials).await;
        self.settle(result)
    }

    /// Issue a token pair for an already-verified record.
    ///
    /// The record is filtered through the active guard's allow-list; a
    /// record without a usable identity value fails with `MissingIdentity`
    /// before the token backend is ever reached.
    pub async fn login<R: Fields + ?Sized>(&self, record: &R) -> AuthResult<Option<TokenPair>> {
        let result = match self.config.resolve(&self.session.guard) {
            Ok(guard) => self.login_record(guard, record).await,
            Err(e) => Err(e),
        };
        self.settle(result)
    }

    /// Resolve a bearer token to its principal
    ///
    /// # Arguments
    ///
    /// * `access_token` - The presented access token
    /// * `cached` - Return the token's embedded payload directly, with no
    ///   store round trip. The data reflects the state at issuance time, not
    ///   the live record. When `false`, the authoritative record is
    ///   re-fetched by identity field; a record deleted since issuance
    ///   resolves to `Unauthenticated`, never a stale payload.
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthenticated` - Invalid, expired, or revoked token;
    ///   identity field absent from the claims; token issued under another
    ///   guard; or the backing record no longer exists (hard mode only)
    pub async fn user(&self, access_token: &str, cached: bool) -> AuthResult<Option<UserRecord>> {
        let result = self.user_inner(access_token, cached).await;
        self.settle(result)
    }

    /// Rotate a token pair.
    ///
    /// The backend validates the refresh token and rotates both halves,
    /// honoring the session's access lifetime override if one is set.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<Option<TokenPair>> {
        let result = self
            .backend
            .refresh(refresh_token, self.session.access_ttl)
            .await
            .map_err(AuthError::from);
        self.settle(result)
    }

    /// Revoke the presented token's pair, or all of its identity's sessions.
    ///
    /// Repeat revocation returns `false` in soft mode and a backend error
    /// in hard mode; either way the pair stays unusable.
    pub async fn logout(&self, access_token: &str, all: bool) -> AuthResult<bool> {
        let scope = if all {
            RevokeScope::AllSessions
        } else {
            RevokeScope::Session
        };

        let result = self
            .backend
            .revoke(access_token, scope)
            .await
            .map_err(AuthError::from)
            .map(|()| true);
        Ok(self.settle(result)?.unwrap_or(false))
    }

    /// Whether the bearer token's payload carries `role`.
    ///
    /// Matches a `role` string field or membership in a `roles` array.
    pub async fn has_role(&self, access_token: &str, role: &str) -> AuthResult<bool> {
        let result = self.user_inner(access_token, true).await.map(|record| {
            let named = record.get(ROLE_FIELD).and_then(Value::as_str) == Some(role);
            let listed = record
                .get(ROLES_FIELD)
                .and_then(Value::as_array)
                .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some(role)));
            named || listed
        });
        Ok(self.settle(result)?.unwrap_or(false))
    }

    /// Hash a plaintext password for storage
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.verifier.hasher().hash(password)
    }

    async fn attempt_inner(&self, credentials: &Credentials) -> AuthResult<TokenPair> {
        let guard = self.config.resolve(&self.session.guard)?;
        let source = self.source_for(&guard.name)?;
        let record = self.verifier.verify(source.as_ref(), credentials).await?;
        self.login_record(guard, &record).await
    }

    async fn login_record<R: Fields + ?Sized>(
        &self,
        guard: &GuardConfig,
        record: &R,
    ) -> AuthResult<TokenPair> {
        let payload = guard.filter_fields(record);

        // Checked before the backend is reached: a record that doesn't
        // match the guard's schema must not produce an anonymous token.
        let subject = match payload.get(&guard.identity_field) {
            Some(value) if !is_empty_value(value) => subject_of(value),
            _ => return Err(AuthError::MissingIdentity(guard.identity_field.clone())),
        };

        let access_ttl = self.session.access_ttl.unwrap_or(guard.default_access_ttl);
        let refresh_ttl = self
            .session
            .refresh_ttl
            .unwrap_or(guard.default_refresh_ttl);

        let pair = self
            .backend
            .issue(&guard.name, &subject, payload, access_ttl, refresh_ttl)
            .await?;

        log::debug!(
            "Issued token pair for `{subject}` under guard `{}`",
            guard.name
        );
        Ok(pair)
    }

    async fn user_inner(&self, access_token: &str, cached: bool) -> AuthResult<UserRecord> {
        let guard = self.config.resolve(&self.session.guard)?;

        let claims = match self.backend.claims(access_token).await {
            Ok(claims) => claims,
            Err(e @ TokenError::Configuration(_)) => return Err(e.into()),
            Err(e) => {
                log::debug!("Bearer token rejected: {e}");
                return Err(AuthError::Unauthenticated);
            }
        };

        if claims.guard != guard.name {
            log::debug!(
                "Token issued under guard `{}` presented to guard `{}`",
                claims.guard,
                guard.name
            );
            return Err(AuthError::Unauthenticated);
        }

        let Some(identity) = claims
            .payload
            .get(&guard.identity_field)
            .filter(|value| !is_empty_value(value))
            .cloned()
        else {
            return Err(AuthError::Unauthenticated);
        };

        if cached {
            return Ok(UserRecord::from(claims.payload.into_fields()));
        }

        let mut filters = FieldMap::new();
        filters.insert(guard.identity_field.clone(), identity);

        let source = self.source_for(&guard.name)?;
        source
            .find_by(&filters)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    fn source_for(&self, guard: &str) -> AuthResult<&Arc<dyn RecordSource>> {
        self.sources.get(guard).ok_or_else(|| {
            AuthError::Configuration(format!(
                "No record source registered for guard `{guard}`"
            ))
        })
    }

    /// The single fail-mode policy point.
    ///
    /// Fatal errors always propagate. Expected authentication failures are
    /// logged with their internal kind, then either raised with the
    /// public-safe kind (hard mode) or collapsed to `None` (soft mode).
    fn settle<T>(&self, result: AuthResult<T>) -> AuthResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::debug!(
                    "Authentication failure under guard `{}`: {e}",
                    self.session.guard
                );
                if self.session.fail_hard {
                    Err(e.into_public())
                } else {
                    Ok(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordSource;
    use crate::token::{JwtConfig, JwtTokenBackend};

    fn backend() -> Arc<dyn TokenBackend> {
        Arc::new(
            JwtTokenBackend::new(JwtConfig::new(
                "access-secret-access-secret-access-secret",
                "refresh-secret-refresh-secret-refresh-secret",
            ))
            .expect("test backend config should validate"),
        )
    }

    fn sources_for(guards: &[&str]) -> SourceRegistry {
        guards
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    Arc::new(MemoryRecordSource::new()) as Arc<dyn RecordSource>,
                )
            })
            .collect()
    }

    #[test]
    fn test_new_rejects_a_guard_without_a_source() {
        let config = AuthConfig::new("user").guard(GuardConfig::new("user", "id", ["id"]));

        let err = Auth::new(config, SourceRegistry::new(), backend()).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_new_rejects_invalid_guard_config() {
        let config =
            AuthConfig::new("user").guard(GuardConfig::new("user", "uuid", ["id", "name"]));

        let err = Auth::new(config, sources_for(&["user"]), backend()).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_fluent_setters_shape_the_session() {
        let config = AuthConfig::new("user")
            .guard(GuardConfig::new("user", "id", ["id"]))
            .guard(GuardConfig::new("admin", "id", ["id"]));
        let auth = Auth::new(config, sources_for(&["user", "admin"]), backend()).unwrap();

        assert_eq!(auth.session().guard, "user");
        assert!(!auth.session().fail_hard);
        assert_eq!(auth.session().access_ttl, None);

        let auth = auth
            .guard("admin")
            .access_ttl(Duration::minutes(5))
            .fail_mode(true);
        assert_eq!(auth.session().guard, "admin");
        assert!(auth.session().fail_hard);
        assert_eq!(auth.session().access_ttl, Some(Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_unknown_guard_raises_even_in_soft_mode() {
        let config = AuthConfig::new("user").guard(GuardConfig::new("user", "id", ["id"]));
        let auth = Auth::new(config, sources_for(&["user"]), backend()).unwrap();

        let result = auth
            .guard("ghost")
            .attempt(&Credentials::new().with("id", 7))
            .await;
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }
}
