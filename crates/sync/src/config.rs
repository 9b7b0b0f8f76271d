use std::time::Duration;

/// Default grace period before an unconfirmed optimistic entry is dropped.
pub const DEFAULT_OPTIMISTIC_GRACE_MS: u64 = 10_000;

/// Default buffer capacity of the session event bus.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;

/// Sync-layer configuration loaded from environment variables.
///
/// All fields have defaults suitable for an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long an optimistic placeholder may stay visible without a
    /// matching authoritative record.
    pub optimistic_grace: Duration,
    /// Broadcast buffer of the session's event bus.
    pub event_bus_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

impl SyncConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `PORTAL_OPTIMISTIC_GRACE_MS` | `10000` |
    /// | `PORTAL_EVENT_BUS_CAPACITY`  | `1024`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        let grace_ms = positive_from_env("PORTAL_OPTIMISTIC_GRACE_MS", DEFAULT_OPTIMISTIC_GRACE_MS)?;
        let capacity = positive_from_env(
            "PORTAL_EVENT_BUS_CAPACITY",
            DEFAULT_EVENT_BUS_CAPACITY as u64,
        )?;

        Ok(Self {
            optimistic_grace: Duration::from_millis(grace_ms),
            event_bus_capacity: capacity as usize,
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            optimistic_grace: Duration::from_millis(DEFAULT_OPTIMISTIC_GRACE_MS),
            event_bus_capacity: DEFAULT_EVENT_BUS_CAPACITY,
        }
    }
}

fn positive_from_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_positive(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        }),
    }
}
