//! Registry configuration

use std::time::Duration;

use super::error::RegistryError;

/// Default key the roster is stored under
pub const DEFAULT_STORAGE_KEY: &str = "windows";

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Shared store key holding the serialized roster
    pub storage_key: String,

    /// Interval of the polling task
    pub tick_interval: Duration,

    /// Minimum age of the stored heartbeat before it is rewritten
    ///
    /// Zero persists the heartbeat on every tick.
    pub heartbeat_interval: Duration,

    /// Records silent for longer than this are pruned by any window
    pub staleness_threshold: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            tick_interval: Duration::from_millis(100),
            heartbeat_interval: Duration::from_secs(1),
            staleness_threshold: Duration::from_secs(5),
        }
    }
}

impl RegistryConfig {
    /// Set the storage key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the tick interval
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the heartbeat persistence interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the staleness threshold
    pub fn staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    /// Check that a healthy window can never look stale to its peers
    ///
    /// The heartbeat is persisted on the first tick after it turns
    /// `heartbeat_interval` old, so a stored `lastSeen` can lag by up to
    /// `heartbeat_interval + tick_interval`. The threshold must exceed that.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.storage_key.is_empty() {
            return Err(RegistryError::InvalidConfig("storage key is empty".into()));
        }
        if self.tick_interval.is_zero() {
            return Err(RegistryError::InvalidConfig("tick interval is zero".into()));
        }
        if self.staleness_threshold <= self.heartbeat_interval + self.tick_interval {
            return Err(RegistryError::InvalidConfig(format!(
                "staleness threshold {:?} must exceed heartbeat interval {:?} plus tick interval {:?}",
                self.staleness_threshold, self.heartbeat_interval, self.tick_interval
            )));
        }
        Ok(())
    }

    pub(crate) fn heartbeat_millis(&self) -> u64 {
        self.heartbeat_interval.as_millis() as u64
    }

    pub(crate) fn staleness_millis(&self) -> u64 {
        self.staleness_threshold.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.storage_key, "windows");
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(config.staleness_threshold, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .storage_key("scene")
            .tick_interval(Duration::from_millis(50))
            .heartbeat_interval(Duration::ZERO)
            .staleness_threshold(Duration::from_millis(500));

        assert_eq!(config.storage_key, "scene");
        assert_eq!(config.tick_interval, Duration::from_millis(50));
        assert_eq!(config.heartbeat_millis(), 0);
        assert_eq!(config.staleness_millis(), 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_tick() {
        let config = RegistryConfig::default().tick_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_empty_key() {
        let config = RegistryConfig::default().storage_key("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_threshold_below_heartbeat() {
        let config = RegistryConfig::default()
            .heartbeat_interval(Duration::from_secs(5))
            .staleness_threshold(Duration::from_secs(5));
        assert!(config.validate().is_err());

        let config = RegistryConfig::default()
            .tick_interval(Duration::from_secs(2))
            .heartbeat_interval(Duration::ZERO)
            .staleness_threshold(Duration::from_secs(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_threshold_within_heartbeat_lag() {
        // Each bound alone is fine, but a stored heartbeat can be 2.5s old
        let config = RegistryConfig::default()
            .tick_interval(Duration::from_millis(1_000))
            .heartbeat_interval(Duration::from_millis(1_500))
            .staleness_threshold(Duration::from_millis(1_600));
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidConfig(msg)) if msg.contains("plus tick interval")
        ));

        let config = config.staleness_threshold(Duration::from_millis(2_500));
        assert!(config.validate().is_err());

        let config = config.staleness_threshold(Duration::from_millis(2_501));
        assert!(config.validate().is_ok());
    }
}
