//! Token data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::record::{FieldMap, Fields};

/// The filtered set of record fields embedded in a token at issuance.
///
/// Restricted to the active guard's allow-list; immutable once signed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenPayload {
    fields: FieldMap,
}

impl TokenPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }
}

impl Fields for TokenPayload {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl From<FieldMap> for TokenPayload {
    fn from(fields: FieldMap) -> Self {
        Self { fields }
    }
}

/// An issued access/refresh token pair, caller-owned once returned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Verified claims of a presented token
#[derive(Debug, Clone)]
pub struct TokenClaims {
    /// Guard the token was issued under
    pub guard: String,
    /// Canonical identity value
    pub subject: String,
    /// Payload embedded at issuance
    pub payload: TokenPayload,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Revocation scope for `logout`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeScope {
    /// Only the presented token's pair
    Session,
    /// Every outstanding token for the token's identity
    AllSessions,
}

/// Token backend errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Backend configuration is unusable
    #[error("Token backend configuration: {0}")]
    Configuration(String),

    /// Token TTL has elapsed
    #[error("Token expired")]
    Expired,

    /// Token (or its whole identity) has been revoked
    #[error("Token revoked")]
    Revoked,

    /// Token failed verification
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// An access token was presented where a refresh token belongs, or vice versa
    #[error("Wrong token kind, expected {0}")]
    WrongKind(&'static str),

    /// Codec-level error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
