//! Processor configuration.
//!
//! Deserializable from the host's config source; every knob has a default
//! matching production behavior so an empty config is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{CheckInterval, RegionMode};

/// Hard cap on synthetic missed checks per detected gap. Bounds pathological
/// backfills from long-disabled-then-reenabled monitors.
pub const MAX_SYNTHETIC_MISSED_CHECKS: u32 = 100;

/// Authoritative definition of a checker region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDefinition {
    pub slug: String,
    pub mode: RegionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Route out-of-order results through the durable backlog instead of
    /// synchronous backfill.
    pub backlog_queue_enabled: bool,
    pub max_synthetic_missed_checks: u32,
    /// Watermark TTL, seconds.
    pub last_update_ttl_secs: u64,
    /// Interval-tracking TTL, seconds. Longest supported interval plus an
    /// hour, so a stale value can never outlive a full cadence change.
    pub last_seen_interval_ttl_secs: u64,
    pub backlog_ttl_secs: u64,
    pub task_scheduled_ttl_secs: u64,
    pub schedule_lock_ttl_secs: u64,
    /// Lock acquisition poll interval, milliseconds.
    pub lock_poll_interval_ms: u64,
    pub lock_attempts: u32,
    /// Countdown before the backlog retry task runs, seconds.
    pub retry_countdown_secs: u64,
    /// Authoritative region configuration the coordinator reconciles
    /// subscriptions against.
    pub regions: Vec<RegionDefinition>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            backlog_queue_enabled: false,
            max_synthetic_missed_checks: MAX_SYNTHETIC_MISSED_CHECKS,
            last_update_ttl_secs: 7 * 24 * 60 * 60,
            last_seen_interval_ttl_secs: CheckInterval::LONGEST_SECS + 60 * 60,
            backlog_ttl_secs: 600,
            task_scheduled_ttl_secs: 300,
            schedule_lock_ttl_secs: 10,
            lock_poll_interval_ms: 100,
            lock_attempts: 3,
            retry_countdown_secs: 10,
            regions: Vec::new(),
        }
    }
}

impl ProcessorConfig {
    pub fn last_update_ttl(&self) -> Duration {
        Duration::from_secs(self.last_update_ttl_secs)
    }

    pub fn last_seen_interval_ttl(&self) -> Duration {
        Duration::from_secs(self.last_seen_interval_ttl_secs)
    }

    pub fn backlog_ttl(&self) -> Duration {
        Duration::from_secs(self.backlog_ttl_secs)
    }

    pub fn task_scheduled_ttl(&self) -> Duration {
        Duration::from_secs(self.task_scheduled_ttl_secs)
    }

    pub fn schedule_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.schedule_lock_ttl_secs)
    }

    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms)
    }

    pub fn retry_countdown(&self) -> Duration {
        Duration::from_secs(self.retry_countdown_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_valid() {
        let config: ProcessorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_synthetic_missed_checks, 100);
        assert_eq!(config.last_seen_interval_ttl_secs, 3600 + 3600);
        assert!(!config.backlog_queue_enabled);
    }

    #[test]
    fn test_overrides() {
        let config: ProcessorConfig = serde_json::from_str(
            r#"{
                "backlog_queue_enabled": true,
                "regions": [
                    {"slug": "us-west", "mode": "active"},
                    {"slug": "eu-central", "mode": "shadow"}
                ]
            }"#,
        )
        .unwrap();
        assert!(config.backlog_queue_enabled);
        assert_eq!(config.regions.len(), 2);
        assert_eq!(config.regions[1].mode, RegionMode::Shadow);
    }
}
