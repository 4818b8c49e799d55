//! JWT token backend.
//!
//! HS256 pairs signed with distinct access and refresh secrets. Both halves
//! of a pair share a session id; revoking either kills both. Revocation is
//! tracked in a backend-owned concurrent store: a denylist of session ids
//! for single-session logout, plus a per-identity issued-before cutoff for
//! all-session logout. Expiry is enforced lazily when a token is verified.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{RevokeScope, TokenClaims, TokenError, TokenPair, TokenPayload};
use super::TokenBackend;
use crate::record::FieldMap;

/// Minimum secret length in bytes
const MIN_SECRET_LEN: usize = 32;

/// JWT backend configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret for access tokens
    pub access_secret: String,

    /// Signing secret for refresh tokens
    pub refresh_secret: String,

    /// Access lifetime used by `refresh` when the caller gives no override
    pub default_access_ttl: Duration,

    /// Clock-skew allowance applied when validating expiry
    pub leeway_secs: u64,
}

impl JwtConfig {
    /// Configuration with a 15-minute default access lifetime and no leeway
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            default_access_ttl: Duration::minutes(15),
            leeway_secs: 0,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.access_secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "Access secret must be at least {MIN_SECRET_LEN} bytes"
            ));
        }

        if self.refresh_secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "Refresh secret must be at least {MIN_SECRET_LEN} bytes"
            ));
        }

        if self.default_access_ttl <= Duration::zero() {
            return Err("Default access lifetime must be positive".to_string());
        }

        Ok(())
    }
}

/// Which half of a pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

/// Signed claim set
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
    /// Unique per token
    jti: Uuid,
    /// Shared by both halves of a pair
    sid: Uuid,
    guard: String,
    typ: TokenKind,
    data: FieldMap,
}

/// Revocation bookkeeping, safe under concurrent access
#[derive(Debug, Default)]
struct RevocationStore {
    /// Session ids revoked individually
    sessions: RwLock<HashSet<Uuid>>,
    /// `guard:subject` -> instant before which every token is dead
    cutoffs: RwLock<HashMap<String, i64>>,
}

impl RevocationStore {
    fn revoke_session(&self, sid: Uuid) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sid);
    }

    fn revoke_identity(&self, key: String, cutoff: i64) {
        let mut cutoffs = self
            .cutoffs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = cutoffs.entry(key).or_insert(cutoff);
        *entry = (*entry).max(cutoff);
    }

    fn is_revoked(&self, claims: &Claims) -> bool {
        if self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&claims.sid)
        {
            return true;
        }

        self.cutoffs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&identity_key(&claims.guard, &claims.sub))
            .is_some_and(|cutoff| claims.iat <= *cutoff)
    }
}

fn identity_key(guard: &str, subject: &str) -> String {
    format!("{guard}:{subject}")
}

fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(instant)
}

/// JWT implementation of [`TokenBackend`]
pub struct JwtTokenBackend {
    config: JwtConfig,
    revocations: RevocationStore,
}

impl JwtTokenBackend {
    /// Create a backend, validating the configuration
    pub fn new(config: JwtConfig) -> Result<Self, TokenError> {
        config.validate().map_err(TokenError::Configuration)?;
        Ok(Self {
            config,
            revocations: RevocationStore::default(),
        })
    }

    fn encode_claims(&self, claims: &Claims, secret: &str) -> Result<String, TokenError> {
        let token = encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn decode_claims(&self, token: &str, secret: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.config.leeway_secs;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        let claims = data.claims;
        if claims.typ != kind {
            return Err(TokenError::WrongKind(match kind {
                TokenKind::Access => "access",
                TokenKind::Refresh => "refresh",
            }));
        }

        if self.revocations.is_revoked(&claims) {
            return Err(TokenError::Revoked);
        }

        Ok(claims)
    }

    /// Sign both halves of a pair from shared claim material
    fn sign_pair(
        &self,
        guard: &str,
        subject: &str,
        data: FieldMap,
        issued_at: DateTime<Utc>,
        access_expires_at: DateTime<Utc>,
        refresh_expires_at: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        // Claims are second-granular; keep the pair's instants identical
        // to what the tokens actually say.
        let issued_at = truncate_to_seconds(issued_at);
        let access_expires_at = truncate_to_seconds(access_expires_at);
        let refresh_expires_at = truncate_to_seconds(refresh_expires_at);

        let sid = Uuid::new_v4();

        let access = Claims {
            sub: subject.to_string(),
            exp: access_expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4(),
            sid,
            guard: guard.to_string(),
            typ: TokenKind::Access,
            data: data.clone(),
        };

        let refresh = Claims {
            sub: subject.to_string(),
            exp: refresh_expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4(),
            sid,
            guard: guard.to_string(),
            typ: TokenKind::Refresh,
            data,
        };

        Ok(TokenPair {
            access_token: self.encode_claims(&access, &self.config.access_secret)?,
            refresh_token: self.encode_claims(&refresh, &self.config.refresh_secret)?,
            issued_at,
            access_expires_at,
            refresh_expires_at,
        })
    }
}

#[async_trait]
impl TokenBackend for JwtTokenBackend {
    async fn issue(
        &self,
        guard: &str,
        subject: &str,
        payload: TokenPayload,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        self.sign_pair(
            guard,
            subject,
            payload.into_fields(),
            now,
            now + access_ttl,
            now + refresh_ttl,
        )
    }

    async fn claims(&self, access_token: &str) -> Result<TokenClaims, TokenError> {
        let claims = self.decode_claims(
            access_token,
            &self.config.access_secret,
            TokenKind::Access,
        )?;

        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| TokenError::Invalid("Unrepresentable iat claim".to_string()))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenError::Invalid("Unrepresentable exp claim".to_string()))?;

        Ok(TokenClaims {
            guard: claims.guard,
            subject: claims.sub,
            payload: claims.data.into(),
            issued_at,
            expires_at,
        })
    }

    async fn refresh(
        &self,
        refresh_token: &str,
        access_ttl: Option<Duration>,
    ) -> Result<TokenPair, TokenError> {
        let old = self.decode_claims(
            refresh_token,
            &self.config.refresh_secret,
            TokenKind::Refresh,
        )?;

        let now = Utc::now();
        let access_ttl = access_ttl.unwrap_or(self.config.default_access_ttl);
        let refresh_expires_at = DateTime::from_timestamp(old.exp, 0)
            .ok_or_else(|| TokenError::Invalid("Unrepresentable exp claim".to_string()))?;

        log::debug!("Rotating token pair for {}", identity_key(&old.guard, &old.sub));

        // The refresh half keeps its original window; only the access
        // half gets a fresh lifetime.
        let rotated = self.sign_pair(
            &old.guard,
            &old.sub,
            old.data,
            now,
            now + access_ttl,
            refresh_expires_at,
        )?;

        // The old pair dies with its session id, only once the
        // replacement exists.
        self.revocations.revoke_session(old.sid);

        Ok(rotated)
    }

    async fn revoke(&self, access_token: &str, scope: RevokeScope) -> Result<(), TokenError> {
        let claims = self.decode_claims(
            access_token,
            &self.config.access_secret,
            TokenKind::Access,
        )?;

        match scope {
            RevokeScope::Session => {
                log::debug!("Revoking session {}", claims.sid);
                self.revocations.revoke_session(claims.sid);
            }
            RevokeScope::AllSessions => {
                let key = identity_key(&claims.guard, &claims.sub);
                log::debug!("Revoking all sessions for {key}");
                self.revocations
                    .revoke_identity(key, Utc::now().timestamp());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::new(
            "access-secret-access-secret-access-secret",
            "refresh-secret-refresh-secret-refresh-secret",
        )
    }

    fn backend() -> JwtTokenBackend {
        JwtTokenBackend::new(test_config()).expect("test config should validate")
    }

    fn payload() -> TokenPayload {
        let mut payload = TokenPayload::new();
        payload.insert("id", serde_json::json!(7));
        payload
    }

    #[test]
    fn test_config_rejects_short_secrets() {
        let config = JwtConfig::new("short", "refresh-secret-refresh-secret-refresh-secret");
        assert!(config.validate().is_err());
        assert!(matches!(
            JwtTokenBackend::new(config),
            Err(TokenError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let backend = backend();
        let pair = backend
            .issue("user", "7", payload(), Duration::minutes(15), Duration::days(7))
            .await
            .unwrap();

        let err = backend.claims(&pair.refresh_token).await.unwrap_err();
        // Signed with a different secret, so it fails before the kind check.
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let backend = backend();
        let pair = backend
            .issue("user", "7", payload(), Duration::minutes(15), Duration::days(7))
            .await
            .unwrap();

        let err = backend.refresh(&pair.access_token, None).await.unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_kind_check_holds_even_with_shared_secrets() {
        let secret = "shared-secret-shared-secret-shared-secret";
        let backend = JwtTokenBackend::new(JwtConfig::new(secret, secret)).unwrap();
        let pair = backend
            .issue("user", "7", payload(), Duration::minutes(15), Duration::days(7))
            .await
            .unwrap();

        assert!(matches!(
            backend.claims(&pair.refresh_token).await.unwrap_err(),
            TokenError::WrongKind("access")
        ));
        assert!(matches!(
            backend.refresh(&pair.access_token, None).await.unwrap_err(),
            TokenError::WrongKind("refresh")
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_kills_earlier_sessions() {
        let backend = backend();
        let first = backend
            .issue("user", "7", payload(), Duration::minutes(15), Duration::days(7))
            .await
            .unwrap();
        let second = backend
            .issue("user", "7", payload(), Duration::minutes(15), Duration::days(7))
            .await
            .unwrap();

        backend
            .revoke(&second.access_token, RevokeScope::AllSessions)
            .await
            .unwrap();

        assert!(matches!(
            backend.claims(&first.access_token).await.unwrap_err(),
            TokenError::Revoked
        ));
        assert!(matches!(
            backend.claims(&second.access_token).await.unwrap_err(),
            TokenError::Revoked
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_does_not_cross_identities() {
        let backend = backend();
        let ann = backend
            .issue("user", "7", payload(), Duration::minutes(15), Duration::days(7))
            .await
            .unwrap();
        let bob = backend
            .issue("user", "8", payload(), Duration::minutes(15), Duration::days(7))
            .await
            .unwrap();

        backend
            .revoke(&ann.access_token, RevokeScope::AllSessions)
            .await
            .unwrap();

        assert!(backend.claims(&bob.access_token).await.is_ok());
    }
}
