//! Client pool and partition configuration structures.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming the JSON config file read by
/// [`ClientPoolConfig::from_env`].
pub const CONFIG_PATH_ENV: &str = "CLIENT_POOL_CONFIG";

/// Names a logical downstream dependency, such as a datastore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Dependency identifier; statistics are shared per id.
    pub id: String,
}

impl ResourceProfile {
    /// Create a profile for the named dependency.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One priority partition of a channel, served by its own client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityPartition {
    /// Priority level. Unique within a pool.
    pub priority_level: i32,
    /// Multiplier applied to the computed priority key.
    #[serde(default = "default_weighting")]
    pub weighting: f64,
    /// Whether slot allocation honours the resource rate limiter.
    #[serde(default)]
    pub supports_rate_limiting: bool,
    /// Downstream dependencies whose health throttles this partition.
    #[serde(default)]
    pub resource_profiles: Vec<ResourceProfile>,
}

const fn default_weighting() -> f64 {
    1.0
}

impl PriorityPartition {
    /// Create a partition with no rate limiting.
    #[must_use]
    pub const fn new(priority_level: i32, weighting: f64) -> Self {
        Self {
            priority_level,
            weighting,
            supports_rate_limiting: false,
            resource_profiles: Vec::new(),
        }
    }

    /// Enable rate limiting against the given resource profiles.
    #[must_use]
    pub fn with_rate_limiting(mut self, profiles: Vec<ResourceProfile>) -> Self {
        self.supports_rate_limiting = true;
        self.resource_profiles = profiles;
        self
    }

    /// Validate partition values.
    pub fn validate(&self) -> Result<(), String> {
        if !self.weighting.is_finite() || self.weighting <= 0.0 {
            return Err(format!(
                "weighting must be a positive number, got {}",
                self.weighting
            ));
        }
        if self.resource_profiles.iter().any(|p| p.id.trim().is_empty()) {
            return Err("resource profile ids must not be empty".into());
        }
        Ok(())
    }
}

/// Tuning for the adaptive poll cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Minimum time between polls of one client.
    pub min_wait_ms: u64,
    /// Maximum time a client may go unpolled.
    pub max_wait_ms: u64,
    /// Step by which the fabric wait time grows or shrinks.
    pub fabric_wait_step_ms: u64,
    /// Success rate above which the maximum wait starts to shrink.
    pub poll_time_reduce_ratio: Option<f64>,
    /// Skip count used when a client has never had a successful poll.
    pub skip_count_fallback: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            min_wait_ms: 100,
            max_wait_ms: 10_000,
            fabric_wait_step_ms: 100,
            poll_time_reduce_ratio: Some(0.75),
            skip_count_fallback: 20,
        }
    }
}

impl PollSettings {
    /// Minimum wait as a duration.
    #[must_use]
    pub const fn min_wait(&self) -> Duration {
        Duration::from_millis(self.min_wait_ms)
    }

    /// Maximum wait as a duration.
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// Fabric wait step as a duration.
    #[must_use]
    pub const fn fabric_wait_step(&self) -> Duration {
        Duration::from_millis(self.fabric_wait_step_ms)
    }

    /// Validate poll tuning values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_wait_ms == 0 {
            return Err("max_wait_ms must be greater than 0".into());
        }
        if self.min_wait_ms > self.max_wait_ms {
            return Err(format!(
                "min_wait_ms ({}) must not exceed max_wait_ms ({})",
                self.min_wait_ms, self.max_wait_ms
            ));
        }
        if let Some(ratio) = self.poll_time_reduce_ratio {
            if !(0.0..1.0).contains(&ratio) {
                return Err(format!("poll_time_reduce_ratio must be in [0, 1), got {ratio}"));
            }
        }
        Ok(())
    }
}

/// Backoff tuning for client reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetSettings {
    /// Delay added per failed reconnect attempt.
    pub backoff_step_ms: u64,
}

impl Default for ResetSettings {
    fn default() -> Self {
        Self {
            backoff_step_ms: 100,
        }
    }
}

impl ResetSettings {
    /// Delay before the next reconnect after `attempt` failures.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Root configuration for one client pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPoolConfig {
    /// Channel this pool serves.
    pub channel_id: String,
    /// Priority partitions, one client each.
    pub partitions: Vec<PriorityPartition>,
    /// Poll cycle tuning.
    #[serde(default)]
    pub poll: PollSettings,
    /// Reset backoff tuning.
    #[serde(default)]
    pub reset: ResetSettings,
}

impl ClientPoolConfig {
    /// Create a config with default poll and reset settings.
    pub fn new(channel_id: impl Into<String>, partitions: Vec<PriorityPartition>) -> Self {
        Self {
            channel_id: channel_id.into(),
            partitions,
            poll: PollSettings::default(),
            reset: ResetSettings::default(),
        }
    }

    /// Validate the channel, every partition and the tuning sections.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_id.trim().is_empty() {
            return Err("channel_id must not be empty".into());
        }
        if self.partitions.is_empty() {
            return Err("at least one priority partition must be defined".into());
        }
        let mut seen = HashSet::new();
        for partition in &self.partitions {
            if !seen.insert(partition.priority_level) {
                return Err(format!(
                    "duplicate priority level {}",
                    partition.priority_level
                ));
            }
            partition
                .validate()
                .map_err(|e| format!("partition `{}` invalid: {e}", partition.priority_level))?;
        }
        self.poll.validate().map_err(|e| format!("poll settings invalid: {e}"))?;
        Ok(())
    }

    /// Parse pool configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Load `.env` if present, then read the file named by
    /// [`CONFIG_PATH_ENV`].
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_err(|_| format!("{CONFIG_PATH_ENV} is not set"))?;
        Self::from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_backoff_is_linear() {
        let reset = ResetSettings::default();
        assert_eq!(reset.backoff(1), Duration::from_millis(100));
        assert_eq!(reset.backoff(2), Duration::from_millis(200));
        assert_eq!(reset.backoff(3), Duration::from_millis(300));
    }

    #[test]
    fn test_partition_rejects_bad_weighting() {
        assert!(PriorityPartition::new(1, 0.0).validate().is_err());
        assert!(PriorityPartition::new(1, f64::NAN).validate().is_err());
        assert!(PriorityPartition::new(1, 1.5).validate().is_ok());
    }

    #[test]
    fn test_poll_settings_bounds() {
        let mut poll = PollSettings::default();
        assert!(poll.validate().is_ok());
        poll.min_wait_ms = poll.max_wait_ms + 1;
        assert!(poll.validate().is_err());
    }
}
