//! External collaborator interfaces.
//!
//! The processor never owns subscriptions, regions, detectors, or the
//! downstream evaluation pipeline; it consumes them through these traits.
//! Not-found lookups are modeled as `Ok(None)`, reserving errors for truly
//! unexpected failures per the drop-and-log policy.

use std::time::Duration;

use crate::model::{
    CheckResult, Detector, SubscriptionRegion, SubscriptionStatus, UptimeSubscription,
};

/// Data handed to the shared detector-processing entry point.
#[derive(Debug, Clone)]
pub struct DataPacket {
    /// Stable identifier correlating the packet with its subscription.
    pub source_id: String,
    pub packet: serde_json::Value,
}

/// Maps subscription identifiers to monitor configuration.
pub trait SubscriptionRegistry: Send + Sync {
    fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> anyhow::Result<Option<UptimeSubscription>>;

    fn update_status(
        &self,
        subscription_id: &str,
        status: SubscriptionStatus,
    ) -> anyhow::Result<()>;

    /// Remove an orphaned subscription and its detector binding.
    fn delete_subscription(&self, subscription_id: &str) -> anyhow::Result<()>;
}

/// Active/shadow region assignments for a subscription.
pub trait RegionRegistry: Send + Sync {
    fn load_regions(&self, subscription_id: &str) -> anyhow::Result<Vec<SubscriptionRegion>>;

    fn update_regions(
        &self,
        subscription_id: &str,
        regions: &[SubscriptionRegion],
    ) -> anyhow::Result<()>;
}

/// Lookup and lifecycle control for the downstream detector binding.
pub trait DetectorRegistry: Send + Sync {
    /// `Ok(None)` signals an orphaned subscription (detector deleted).
    fn get_detector(
        &self,
        subscription: &UptimeSubscription,
    ) -> anyhow::Result<Option<Detector>>;

    /// Permanently disable a detector. Used for the robots.txt policy
    /// signal.
    fn disable_detector(&self, detector: &Detector) -> anyhow::Result<()>;

    /// Whether the owning project is entitled to uptime detector
    /// evaluation.
    fn feature_enabled(&self, project_id: u64) -> anyhow::Result<bool>;
}

/// Downstream issue-detection entry points.
pub trait DetectorHandler: Send + Sync {
    /// Onboarding-specific evaluator for monitors still proving themselves.
    fn process_onboarding(&self, packet: &DataPacket, detector: &Detector) -> anyhow::Result<()>;

    /// Shared detector-processing entry point. Synchronous; may fail.
    fn process_packet(&self, packet: &DataPacket, detectors: &[Detector]) -> anyhow::Result<()>;
}

/// Analytics/event sink for validated and synthetic results.
/// Fire-and-forget: publication failures are the sink's to log.
pub trait AnalyticsSink: Send + Sync {
    fn publish(&self, detector: &Detector, result: &CheckResult);
}

/// Pushes checker configuration out to regions.
pub trait ConfigPusher: Send + Sync {
    fn push_config(
        &self,
        region_slug: &str,
        subscription: &UptimeSubscription,
    ) -> anyhow::Result<()>;

    /// Remove the checker config for a subscription in one region. Fired
    /// when a result arrives for a subscription the registry no longer
    /// knows.
    fn delete_config(&self, region_slug: &str, subscription_id: &str) -> anyhow::Result<()>;
}

/// Enqueues the bounded-delay backlog retry task.
pub trait RetryTaskScheduler: Send + Sync {
    fn schedule_retry(
        &self,
        subscription_id: &str,
        countdown: Duration,
        attempt: u32,
    ) -> anyhow::Result<()>;
}
