//! Top-level result processing orchestration.
//!
//! One call per incoming stream record. Nothing here propagates errors to
//! the stream-consumption harness: a wedged consumer stalls every
//! subscription sharing its partition, so the policy is drop-and-log with
//! a metric trail.

use crate::decode::decode_check_result;
use crate::logging::LogContext;
use crate::metrics::MetricTags;
use crate::model::{CheckResult, CheckStatus};
use crate::region::{check_and_update_regions, is_shadow_result, should_run_region_checks};
use crate::store::{last_seen_interval_key, last_update_key};

use super::backfill::handle_gap;
use super::backlog::enqueue_out_of_order;
use super::context::ProcessorContext;
use super::dispatch::dispatch_result;
use super::gate::{classify, parse_watermark, GateDecision};

/// What happened to one incoming record.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Accepted, dispatched, watermark advanced. `backfilled` counts the
    /// synthetic records published ahead of it.
    Processed { backfilled: usize },
    /// Scheduled slot at or below the watermark; discarded.
    SkippedStale,
    /// Parked in the out-of-order backlog for a later retry pass.
    Deferred,
    /// Result came from a shadow region; dropped before the gate.
    DroppedShadowRegion,
    /// No subscription for this id; checker config cleanup requested.
    OrphanedSubscription,
    /// Subscription exists but its detector is gone; subscription deleted.
    MissingDetector,
    /// Detector disabled or project lacks the feature; no-op.
    SkippedDisabled,
    /// robots.txt policy signal; detector disabled outright.
    DetectorDisabledByRobots,
    /// Payload did not decode.
    Malformed,
    /// Unexpected collaborator/store failure; logged, record dropped.
    Failed,
}

/// Decode and process one raw stream payload.
pub fn process_payload(ctx: &ProcessorContext, payload: &[u8]) -> ProcessOutcome {
    match decode_check_result(payload) {
        Ok(result) => process_result(ctx, &result),
        Err(e) => {
            log::warn!("RESULT_DECODE_FAILED error={}", e);
            ctx.metrics
                .incr("handle_result.malformed", &MetricTags::new());
            ProcessOutcome::Malformed
        }
    }
}

/// Process one decoded check result.
pub fn process_result(ctx: &ProcessorContext, result: &CheckResult) -> ProcessOutcome {
    replay_result(ctx, result, 1)
}

/// Process one result replayed from the backlog. `next_attempt` is the
/// pass number a re-deferral will schedule; the consumer path starts
/// at 1.
pub(crate) fn replay_result(
    ctx: &ProcessorContext,
    result: &CheckResult,
    next_attempt: u32,
) -> ProcessOutcome {
    let log_ctx = LogContext::new(&result.subscription_id).with_check(&result.guid);
    match handle_result(ctx, result, next_attempt, &log_ctx) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("{} RESULT_PROCESS_FAILED error={:#}", log_ctx, e);
            ctx.metrics
                .incr("handle_result.failed", &MetricTags::new());
            ProcessOutcome::Failed
        }
    }
}

fn handle_result(
    ctx: &ProcessorContext,
    result: &CheckResult,
    next_attempt: u32,
    log_ctx: &LogContext,
) -> anyhow::Result<ProcessOutcome> {
    ctx.metrics.incr(
        "handle_result.total",
        &MetricTags::new()
            .status(result.status.as_str())
            .uptime_region(&result.region),
    );

    let Some(subscription) = ctx.subscriptions.get_subscription(&result.subscription_id)? else {
        // The registry no longer knows this subscription; the checker in
        // this region is still running it. Ask for its config removal.
        log::info!("{} SUBSCRIPTION_ORPHANED region={}", log_ctx, result.region);
        ctx.metrics.incr(
            "handle_result.orphaned_subscription",
            &MetricTags::new().uptime_region(&result.region),
        );
        if let Err(e) = ctx
            .config_pusher
            .delete_config(&result.region, &result.subscription_id)
        {
            log::error!("{} CHECKER_CONFIG_DELETE_FAILED error={:#}", log_ctx, e);
        }
        return Ok(ProcessOutcome::OrphanedSubscription);
    };

    let Some(detector) = ctx.detectors.get_detector(&subscription)? else {
        log::info!("{} DETECTOR_MISSING subscription_id={}", log_ctx, subscription.id);
        ctx.metrics
            .incr("handle_result.missing_detector", &MetricTags::new());
        ctx.subscriptions
            .delete_subscription(&subscription.subscription_id)?;
        return Ok(ProcessOutcome::MissingDetector);
    };

    if !detector.enabled || !ctx.detectors.feature_enabled(detector.project_id)? {
        ctx.metrics.incr(
            "handle_result.disabled",
            &MetricTags::new().mode(detector.mode.as_str()),
        );
        return Ok(ProcessOutcome::SkippedDisabled);
    }

    let assignments = ctx.regions.load_regions(&subscription.subscription_id)?;
    if is_shadow_result(&result.region, &assignments) {
        log::debug!("{} SHADOW_RESULT_DROPPED region={}", log_ctx, result.region);
        ctx.metrics.incr(
            "handle_result.dropped_shadow_region",
            &MetricTags::new().uptime_region(&result.region),
        );
        return Ok(ProcessOutcome::DroppedShadowRegion);
    }

    if result.status == CheckStatus::DisallowedByRobots {
        // Permanent policy signal: disable the detector and stop. The one
        // place a truly unexpected failure is swallowed rather than
        // bubbled to the Failed outcome.
        log::info!("{} DISALLOWED_BY_ROBOTS detector_id={}", log_ctx, detector.id);
        let mut tags = MetricTags::new().host_provider(subscription.host_provider());
        if let Some(reason) = &result.status_reason {
            tags = tags.status_reason(reason.reason_type.as_str());
        }
        ctx.metrics.incr("handle_result.disallowed_by_robots", &tags);
        if let Err(e) = ctx.detectors.disable_detector(&detector) {
            log::error!("{} DETECTOR_DISABLE_FAILED error={:#}", log_ctx, e);
        }
        return Ok(ProcessOutcome::DetectorDisabledByRobots);
    }

    // Side channel: periodic region reconciliation, on average once per
    // hour per subscription. Failures never block result processing.
    if should_run_region_checks(&subscription, ctx.roll(), ctx.clock.now_ms()) {
        if let Err(e) = check_and_update_regions(ctx, &subscription, &assignments, log_ctx) {
            log::error!("{} REGION_CHECK_FAILED error={:#}", log_ctx, e);
        }
    }

    let watermark_key = last_update_key(detector.id);
    let last_update_ms = parse_watermark(ctx.store.get(&watermark_key)?, log_ctx);
    let interval_ms = subscription.interval_seconds.as_ms();

    let mut backfilled = 0;
    match classify(last_update_ms, result.scheduled_check_time_ms, interval_ms) {
        GateDecision::Stale => {
            log::debug!(
                "{} RESULT_STALE scheduled_ms={} watermark_ms={}",
                log_ctx,
                result.scheduled_check_time_ms,
                last_update_ms
            );
            ctx.metrics.incr(
                "handle_result.skipped_already_processed",
                &MetricTags::new().status(result.status.as_str()),
            );
            return Ok(ProcessOutcome::SkippedStale);
        }
        GateDecision::FirstSeen | GateDecision::Expected => {}
        GateDecision::OutOfOrder { num_intervals } => {
            if ctx.config.backlog_queue_enabled {
                enqueue_out_of_order(ctx, result, next_attempt, log_ctx)?;
                return Ok(ProcessOutcome::Deferred);
            }
            backfilled = handle_gap(
                ctx,
                &subscription,
                &detector,
                result,
                last_update_ms,
                num_intervals,
                log_ctx,
            )?
            .len();
        }
    }

    dispatch_result(ctx, &subscription, &detector, result, log_ctx);

    // Watermark advances only after processing, so a crash above is
    // retried on redelivery instead of silently skipped.
    ctx.store.set_with_ttl(
        &watermark_key,
        &result.scheduled_check_time_ms.to_string(),
        ctx.config.last_update_ttl(),
    )?;
    // Refreshed on every accepted result; the gap handler compares against
    // it to tell a real gap from a cadence change.
    ctx.store.set_with_ttl(
        &last_seen_interval_key(detector.id),
        &interval_ms.to_string(),
        ctx.config.last_seen_interval_ttl(),
    )?;

    log::info!(
        "{} RESULT_PROCESSED scheduled_ms={} status={} backfilled={}",
        log_ctx,
        result.scheduled_check_time_ms,
        result.status.as_str(),
        backfilled
    );

    Ok(ProcessOutcome::Processed { backfilled })
}
