//! Registry entities referenced by the processor.
//!
//! These are owned by external registries; the core only reads them and
//! requests status transitions or deletion through the registry traits.

use serde::{Deserialize, Serialize};

/// Supported check cadences. The scheduler only ever emits ticks on one of
/// these intervals, so the gap math can assume exact multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum CheckInterval {
    OneMinute,
    FiveMinutes,
    TenMinutes,
    TwentyMinutes,
    ThirtyMinutes,
    OneHour,
}

impl CheckInterval {
    pub const LONGEST_SECS: u64 = 3600;

    pub fn as_secs(&self) -> u64 {
        match self {
            CheckInterval::OneMinute => 60,
            CheckInterval::FiveMinutes => 300,
            CheckInterval::TenMinutes => 600,
            CheckInterval::TwentyMinutes => 1200,
            CheckInterval::ThirtyMinutes => 1800,
            CheckInterval::OneHour => 3600,
        }
    }

    pub fn as_ms(&self) -> i64 {
        self.as_secs() as i64 * 1000
    }

    pub fn from_secs(secs: u64) -> Option<CheckInterval> {
        match secs {
            60 => Some(CheckInterval::OneMinute),
            300 => Some(CheckInterval::FiveMinutes),
            600 => Some(CheckInterval::TenMinutes),
            1200 => Some(CheckInterval::TwentyMinutes),
            1800 => Some(CheckInterval::ThirtyMinutes),
            3600 => Some(CheckInterval::OneHour),
            _ => None,
        }
    }
}

impl TryFrom<u64> for CheckInterval {
    type Error = String;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        CheckInterval::from_secs(secs).ok_or_else(|| format!("unsupported interval: {}s", secs))
    }
}

impl From<CheckInterval> for u64 {
    fn from(interval: CheckInterval) -> u64 {
        interval.as_secs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Disabled,
    /// A region rebalance is in flight; checker configs are being re-pushed.
    Updating,
}

/// A monitored target and its schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeSubscription {
    pub id: u64,
    /// External string key; what the wire record carries.
    pub subscription_id: String,
    pub interval_seconds: CheckInterval,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub host_provider_name: Option<String>,
}

impl UptimeSubscription {
    pub fn host_provider(&self) -> &str {
        self.host_provider_name.as_deref().unwrap_or("other")
    }
}

/// Operating mode for a checker region assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMode {
    /// Results feed production detector state.
    Active,
    /// Results are dropped before the ordering gate; the region runs purely
    /// for validation.
    Shadow,
}

/// Assignment of a checker region to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRegion {
    pub region_slug: String,
    pub mode: RegionMode,
}

/// Routing mode of the downstream issue detector bound to a subscription.
///
/// Registry data is external and may grow modes this build does not know;
/// those land in `Other` and are logged as errors at dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorMode {
    AutoDetectedOnboarding,
    AutoDetectedActive,
    Manual,
    Other(String),
}

impl DetectorMode {
    pub fn as_str(&self) -> &str {
        match self {
            DetectorMode::AutoDetectedOnboarding => "auto_detected_onboarding",
            DetectorMode::AutoDetectedActive => "auto_detected_active",
            DetectorMode::Manual => "manual",
            DetectorMode::Other(s) => s,
        }
    }

    pub fn from_registry(s: &str) -> Self {
        match s {
            "auto_detected_onboarding" => DetectorMode::AutoDetectedOnboarding,
            "auto_detected_active" => DetectorMode::AutoDetectedActive,
            "manual" => DetectorMode::Manual,
            other => DetectorMode::Other(other.to_string()),
        }
    }
}

/// Downstream issue-detection binding for a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    pub id: u64,
    pub enabled: bool,
    pub mode: DetectorMode,
    pub project_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_round_trip() {
        for secs in [60u64, 300, 600, 1200, 1800, 3600] {
            let interval = CheckInterval::from_secs(secs).unwrap();
            assert_eq!(interval.as_secs(), secs);
            assert_eq!(interval.as_ms(), secs as i64 * 1000);
        }
        assert!(CheckInterval::from_secs(90).is_none());
    }

    #[test]
    fn test_interval_serde_as_seconds() {
        let json = serde_json::to_string(&CheckInterval::FiveMinutes).unwrap();
        assert_eq!(json, "300");
        let back: CheckInterval = serde_json::from_str("300").unwrap();
        assert_eq!(back, CheckInterval::FiveMinutes);
        assert!(serde_json::from_str::<CheckInterval>("90").is_err());
    }

    #[test]
    fn test_detector_mode_from_registry() {
        assert_eq!(
            DetectorMode::from_registry("manual"),
            DetectorMode::Manual
        );
        assert_eq!(
            DetectorMode::from_registry("something_new"),
            DetectorMode::Other("something_new".to_string())
        );
    }
}
