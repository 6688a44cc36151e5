//! Configuration for the sync engine.

use vetsync_protocol::EntityType;

/// Configuration for the queue manager and puller.
///
/// Passed explicitly into constructors so multiple tenants and tests can
/// run isolated instances; there is no process-wide engine state.
/// Connection details (base URL, auth) belong to the [`HttpClient`]
/// implementation, not here.
///
/// [`HttpClient`]: crate::HttpClient
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Timeout budget for each drain and pull request, in milliseconds.
    pub request_timeout_ms: u64,
    /// Below this staleness (hours since the watermark), a pull is skipped
    /// when local data exists.
    pub recent_threshold_hours: u64,
    /// Above this staleness (hours since the watermark), a pull happens
    /// unconditionally.
    pub stale_threshold_hours: u64,
    /// The entity types the puller reconciles.
    pub tracked_types: Vec<EntityType>,
}

impl EngineConfig {
    /// Creates a configuration with the practice-app defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_timeout_ms: 15_000,
            recent_threshold_hours: 4,
            stale_threshold_hours: 24,
            tracked_types: EntityType::ALL.to_vec(),
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Sets the staleness thresholds, in hours.
    #[must_use]
    pub fn with_staleness_thresholds(mut self, recent_hours: u64, stale_hours: u64) -> Self {
        self.recent_threshold_hours = recent_hours;
        self.stale_threshold_hours = stale_hours;
        self
    }

    /// Sets the tracked entity types.
    #[must_use]
    pub fn with_tracked_types(mut self, types: Vec<EntityType>) -> Self {
        self.tracked_types = types;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_all_types() {
        let config = EngineConfig::new();
        assert_eq!(config.tracked_types.len(), 12);
        assert_eq!(config.recent_threshold_hours, 4);
        assert_eq!(config.stale_threshold_hours, 24);
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::new()
            .with_request_timeout_ms(5_000)
            .with_staleness_thresholds(2, 48)
            .with_tracked_types(vec![EntityType::Pets]);
        assert_eq!(config.request_timeout_ms, 5_000);
        assert_eq!(config.recent_threshold_hours, 2);
        assert_eq!(config.stale_threshold_hours, 48);
        assert_eq!(config.tracked_types, vec![EntityType::Pets]);
    }
}
