//! Region coordinator.
//!
//! Reconciliation is cheap but not free, so it runs on average once per
//! hour per subscription. Two independent triggers are OR'd together: a
//! probabilistic one scaled to the subscription's cadence, and a
//! deterministic modulo-of-the-minute check. The deterministic trigger
//! exists because the probabilistic one alone was observed to under-fire;
//! keep both.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::logging::LogContext;
use crate::metrics::MetricTags;
use crate::model::{RegionMode, SubscriptionRegion, SubscriptionStatus, UptimeSubscription};
use crate::pipeline::ProcessorContext;

const ONE_HOUR_SECS: f64 = 3600.0;
const MINUTES_PER_HOUR: u64 = 60;

/// Decide whether this invocation should run region reconciliation.
///
/// `roll` is a uniform draw in [0, 1); `now_ms` is wall-clock time.
pub fn should_run_region_checks(
    subscription: &UptimeSubscription,
    roll: f64,
    now_ms: i64,
) -> bool {
    let chance = subscription.interval_seconds.as_secs() as f64 / ONE_HOUR_SECS;
    if roll < chance {
        return true;
    }

    // Deterministic hourly safety net: each subscription owns one minute
    // bucket per hour, derived from its hashed id.
    let mut hasher = DefaultHasher::new();
    subscription.subscription_id.hash(&mut hasher);
    let assigned_minute = hasher.finish() % MINUTES_PER_HOUR;
    let current_minute = (now_ms / 1000 / 60) as u64 % MINUTES_PER_HOUR;

    assigned_minute == current_minute
}

/// Reconcile a subscription's region assignments against the authoritative
/// configuration. Returns whether anything changed.
///
/// On drift: persist the corrected set, transition the subscription to
/// `updating`, and push the new configuration to every active region.
pub fn check_and_update_regions(
    ctx: &ProcessorContext,
    subscription: &UptimeSubscription,
    current: &[SubscriptionRegion],
    log_ctx: &LogContext,
) -> anyhow::Result<bool> {
    let desired: Vec<SubscriptionRegion> = ctx
        .config
        .regions
        .iter()
        .map(|r| SubscriptionRegion {
            region_slug: r.slug.clone(),
            mode: r.mode,
        })
        .collect();

    let current_set: BTreeSet<(&str, RegionMode)> = current
        .iter()
        .map(|r| (r.region_slug.as_str(), r.mode))
        .collect();
    let desired_set: BTreeSet<(&str, RegionMode)> = desired
        .iter()
        .map(|r| (r.region_slug.as_str(), r.mode))
        .collect();

    if current_set == desired_set {
        return Ok(false);
    }

    log::info!(
        "{} REGION_DRIFT current={:?} desired={:?}",
        log_ctx,
        current_set,
        desired_set
    );

    ctx.regions
        .update_regions(&subscription.subscription_id, &desired)?;
    ctx.subscriptions
        .update_status(&subscription.subscription_id, SubscriptionStatus::Updating)?;

    for region in desired.iter().filter(|r| r.mode == RegionMode::Active) {
        if let Err(e) = ctx
            .config_pusher
            .push_config(&region.region_slug, subscription)
        {
            log::error!(
                "{} REGION_CONFIG_PUSH_FAILED region={} error={:#}",
                log_ctx,
                region.region_slug,
                e
            );
        }
    }

    ctx.metrics.incr("region_check.updated", &MetricTags::new());
    Ok(true)
}

/// Whether the region that produced this result is running in shadow mode
/// for the subscription. Shadow results validate new regions and must
/// never affect production state.
pub fn is_shadow_result(region: &str, assignments: &[SubscriptionRegion]) -> bool {
    assignments
        .iter()
        .any(|r| r.region_slug == region && r.mode == RegionMode::Shadow)
}
