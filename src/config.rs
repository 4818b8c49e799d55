//! Guard configuration models.
//!
//! A guard is a named profile selecting which record source, identity field,
//! allowed payload fields, and default token lifetimes apply to an
//! authentication operation. The guard registry is the single source of
//! truth for which fields may ever leave a record and enter a token.

use std::collections::HashMap;

use chrono::Duration;

use crate::errors::{AuthError, AuthResult};
use crate::record::{Fields, is_empty_value};
use crate::token::TokenPayload;

/// Per-guard configuration
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Guard name, also the record-source registry key
    pub name: String,

    /// Record field identifying the principal; must be allow-listed
    pub identity_field: String,

    /// Ordered allow-list of fields that may be copied into a token payload
    pub allowed_fields: Vec<String>,

    /// Default access token lifetime
    pub default_access_ttl: Duration,

    /// Default refresh token lifetime
    pub default_refresh_ttl: Duration,
}

impl GuardConfig {
    /// Create a guard with the stock lifetimes (15-minute access, 7-day refresh)
    pub fn new(
        name: impl Into<String>,
        identity_field: impl Into<String>,
        allowed_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            allowed_fields: allowed_fields.into_iter().map(Into::into).collect(),
            default_access_ttl: Duration::minutes(15),
            default_refresh_ttl: Duration::days(7),
        }
    }

    /// Override the default access token lifetime
    pub fn access_ttl(mut self, ttl: Duration) -> Self {
        self.default_access_ttl = ttl;
        self
    }

    /// Override the default refresh token lifetime
    pub fn refresh_ttl(mut self, ttl: Duration) -> Self {
        self.default_refresh_ttl = ttl;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Guard name must not be empty".to_string());
        }

        if self.identity_field.is_empty() {
            return Err(format!("Guard `{}` has no identity field", self.name));
        }

        if self.allowed_fields.is_empty() {
            return Err(format!("Guard `{}` allows no fields", self.name));
        }

        if !self.allowed_fields.contains(&self.identity_field) {
            return Err(format!(
                "Guard `{}` identity field `{}` is not in its allowed fields",
                self.name, self.identity_field
            ));
        }

        if self.default_access_ttl <= Duration::zero()
            || self.default_refresh_ttl <= Duration::zero()
        {
            return Err(format!(
                "Guard `{}` token lifetimes must be positive",
                self.name
            ));
        }

        Ok(())
    }

    /// Copy allow-listed fields present on `record` into a fresh payload.
    ///
    /// Absent and null-valued fields are omitted, not an error. Works for
    /// any [`Fields`] shape.
    pub fn filter_fields<R: Fields + ?Sized>(&self, record: &R) -> TokenPayload {
        let mut payload = TokenPayload::new();
        for name in &self.allowed_fields {
            if let Some(value) = record.field(name) {
                if !value.is_null() {
                    payload.insert(name.clone(), value.clone());
                }
            }
        }
        payload
    }

    /// Whether `payload` carries a non-empty identity value
    pub fn has_identity<R: Fields + ?Sized>(&self, payload: &R) -> bool {
        payload
            .field(&self.identity_field)
            .is_some_and(|value| !is_empty_value(value))
    }
}

/// The static, process-wide guard registry, read once at construction
#[derive(Debug, Clone)]
pub struct AuthConfig {
    guards: HashMap<String, GuardConfig>,
    default_guard: String,
}

impl AuthConfig {
    /// Start a registry whose unconfigured operations use `default_guard`
    pub fn new(default_guard: impl Into<String>) -> Self {
        Self {
            guards: HashMap::new(),
            default_guard: default_guard.into(),
        }
    }

    /// Register a guard, replacing any previous one of the same name
    pub fn guard(mut self, config: GuardConfig) -> Self {
        self.guards.insert(config.name.clone(), config);
        self
    }

    /// Name of the guard operations start on
    pub fn default_guard(&self) -> &str {
        &self.default_guard
    }

    /// Registered guard names
    pub fn guard_names(&self) -> impl Iterator<Item = &str> {
        self.guards.keys().map(String::as_str)
    }

    /// Look up a guard's configuration
    pub fn resolve(&self, name: &str) -> AuthResult<&GuardConfig> {
        self.guards.get(name).ok_or_else(|| {
            AuthError::Configuration(format!("No guard configured under `{name}`"))
        })
    }

    /// Validate every registered guard and the default guard reference
    pub fn validate(&self) -> Result<(), String> {
        if self.guards.is_empty() {
            return Err("No guards configured".to_string());
        }

        if !self.guards.contains_key(&self.default_guard) {
            return Err(format!(
                "Default guard `{}` is not configured",
                self.default_guard
            ));
        }

        for guard in self.guards.values() {
            guard.validate()?;
        }

        Ok(())
    }
}
