//! Token backend seam and the shipped JWT implementation.
//!
//! The orchestrator only ever reaches tokens through [`TokenBackend`]:
//! issue a pair, resolve a presented token's claims, rotate a pair, revoke
//! one session or all of an identity's sessions. The backend exclusively
//! owns the revocation store and enforces TTL expiry lazily at
//! verification time.

use async_trait::async_trait;
use chrono::Duration;

pub mod jwt;
pub mod models;

pub use jwt::{JwtConfig, JwtTokenBackend};
pub use models::{RevokeScope, TokenClaims, TokenError, TokenPair, TokenPayload};

/// Issue/verify/refresh/revoke primitives the orchestrator delegates to
#[async_trait]
pub trait TokenBackend: Send + Sync {
    /// Sign a fresh pair carrying `payload` for `subject` under `guard`
    async fn issue(
        &self,
        guard: &str,
        subject: &str,
        payload: TokenPayload,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair, TokenError>;

    /// Verify a presented access token and return its claims
    async fn claims(&self, access_token: &str) -> Result<TokenClaims, TokenError>;

    /// Validate a refresh token and rotate both halves of the pair.
    ///
    /// The old pair is revoked. The new access lifetime is
    /// `access_ttl` when given, else the backend's default; the refresh
    /// half keeps the original expiry instant.
    async fn refresh(
        &self,
        refresh_token: &str,
        access_ttl: Option<Duration>,
    ) -> Result<TokenPair, TokenError>;

    /// Revoke the presented token's pair, or every session of its identity
    async fn revoke(&self, access_token: &str, scope: RevokeScope) -> Result<(), TokenError>;
}
