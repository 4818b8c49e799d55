//! Per-request session state.

use chrono::Duration;

/// The fluent overrides one logical request carries between configuration
/// and its operation: active guard, per-call lifetime overrides, and the
/// fail-hard toggle. Read once by each operation; never persisted.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Guard the next operation runs under
    pub guard: String,

    /// Access lifetime override; `None` uses the guard default
    pub access_ttl: Option<Duration>,

    /// Refresh lifetime override; `None` uses the guard default
    pub refresh_ttl: Option<Duration>,

    /// Raise structured errors instead of returning soft sentinels
    pub fail_hard: bool,
}

impl SessionState {
    /// Defaults: the registry's default guard, no overrides, soft failures
    pub fn new(default_guard: impl Into<String>) -> Self {
        Self {
            guard: default_guard.into(),
            access_ttl: None,
            refresh_ttl: None,
            fail_hard: false,
        }
    }
}
