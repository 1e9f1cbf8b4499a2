//! Search service configuration loaded from environment variables.

use std::time::Duration;

/// Read-side tuning knobs.
///
/// Reads from environment variables:
/// - `RETRY_MAX_ATTEMPTS` — store write attempts before dead-lettering (default: 3)
/// - `RETRY_BASE_DELAY_MS` — first backoff delay, doubled per attempt (default: 50)
/// - `TOMBSTONE_GRACE_SECS` — how long a deletion blocks stale upserts (default: 300)
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub tombstone_grace: chrono::Duration,
}

impl SearchConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            retry_max_attempts: std::env::var("RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_max_attempts),
            retry_base_delay: std::env::var("RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            tombstone_grace: std::env::var("TOMBSTONE_GRACE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(chrono::Duration::seconds)
                .unwrap_or(defaults.tombstone_grace),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: 3,
            retry_base_delay: Duration::from_millis(50),
            tombstone_grace: chrono::Duration::seconds(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = SearchConfig::default();
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_millis(50));
        assert_eq!(config.tombstone_grace, chrono::Duration::seconds(300));
    }
}
