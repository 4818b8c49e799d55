//! # Guardpost
//!
//! A guard-scoped dual-token (access + refresh) authentication library.
//!
//! Each **guard** is an independently configured principal type: its own
//! record source, its own identity field, its own allow-list of fields that
//! may enter a token payload, and its own default token lifetimes. The
//! [`Auth`] facade orchestrates the token lifecycle for whichever guard a
//! request selects: verified credentials become a signed token pair, a
//! presented token resolves back to an identity or a live record, pairs
//! rotate on refresh, and revocation covers one session or all of them.
//!
//! ## Architecture
//!
//! - [`config`]: guard registry and per-guard field policy
//! - [`record`]: field-addressable user records and credentials
//! - [`store`]: record-source seam (PostgreSQL and in-memory backends)
//! - [`password`]: Argon2id password hashing
//! - [`token`]: token backend seam and the JWT implementation
//! - [`facade`]: the `Auth` facade and its fail-mode policy
//!
//! Failures follow two channels: configuration and store faults always
//! propagate, while expected authentication outcomes honor the session's
//! fail mode (structured errors in hard mode, `None`/`false` sentinels in
//! soft mode).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use guardpost::{
//!     Auth, AuthConfig, Credentials, GuardConfig, JwtConfig, JwtTokenBackend,
//!     MemoryRecordSource, SourceRegistry, UserRecord,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::new("user")
//!         .guard(GuardConfig::new("user", "id", ["id", "name"]));
//!
//!     let users = Arc::new(MemoryRecordSource::new());
//!     let mut sources = SourceRegistry::new();
//!     sources.insert("user".to_string(), users.clone());
//!
//!     let backend = Arc::new(JwtTokenBackend::new(JwtConfig::new(
//!         "access-secret-at-least-32-bytes-long",
//!         "refresh-secret-at-least-32-bytes-long",
//!     ))?);
//!
//!     let auth = Auth::new(config, sources, backend)?;
//!
//!     users.insert(
//!         UserRecord::new()
//!             .with("id", 7)
//!             .with("name", "Ann")
//!             .with("password_hash", auth.hash_password("secret")?),
//!     );
//!
//!     let credentials = Credentials::new().with("id", 7).with("password", "secret");
//!     if let Some(pair) = auth.attempt(&credentials).await? {
//!         println!("Access token: {}", pair.access_token);
//!     }
//!     Ok(())
//! }
//! ```

/// Guard registry and per-guard field policy.
pub mod config;
/// Authentication error types.
pub mod errors;
/// The `Auth` facade and its fail-mode policy.
pub mod facade;
/// Password hashing primitives.
pub mod password;
/// User record and credential models.
pub mod record;
/// Per-request session state.
pub mod session;
/// Record source seam and backends.
pub mod store;
/// Token backend seam and the JWT implementation.
pub mod token;
/// Credential verification.
pub mod verifier;

pub use config::{AuthConfig, GuardConfig};
pub use errors::{AuthError, AuthResult};
pub use facade::Auth;
pub use password::PasswordHasher;
pub use record::{Credentials, FieldMap, Fields, UserRecord};
pub use session::SessionState;
pub use store::{MemoryRecordSource, PgRecordSource, RecordSource, SourceRegistry};
pub use token::{
    JwtConfig, JwtTokenBackend, RevokeScope, TokenBackend, TokenClaims, TokenError, TokenPair,
    TokenPayload,
};
pub use verifier::CredentialVerifier;
