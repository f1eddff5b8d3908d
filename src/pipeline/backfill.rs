//! Backfill synthesizer.
//!
//! When the gate detects a gap of N intervals, the intervals between the
//! watermark and the incoming result never produced a real check result.
//! If the subscription's cadence has not changed since the last decision,
//! we fabricate bounded `missed_window` records for those slots and publish
//! them to the analytics sink. Missed checks skip detector evaluation;
//! the analytics publication is all the downstream needs.
//!
//! An interval change looks exactly like a gap (the next tick lands more
//! than one old-interval past the watermark), so `last_seen_interval`
//! tracking is what separates a real gap from a reconfigured monitor.

use crate::logging::LogContext;
use crate::metrics::MetricTags;
use crate::model::{CheckResult, Detector, UptimeSubscription};
use crate::store::{last_seen_interval_key, StoreError};

use super::context::ProcessorContext;

/// Handle a detected gap. Returns the synthetic records that were
/// published, empty when backfill was suppressed.
pub fn handle_gap(
    ctx: &ProcessorContext,
    subscription: &UptimeSubscription,
    detector: &Detector,
    result: &CheckResult,
    last_update_ms: i64,
    num_intervals: f64,
    log_ctx: &LogContext,
) -> Result<Vec<CheckResult>, StoreError> {
    let interval_ms = subscription.interval_seconds.as_ms();

    if num_intervals.fract() != 0.0 {
        // Scheduler misalignment. Observed in the wild when a monitor's
        // ticks drift; log-only, the integral part still backfills.
        log::info!(
            "{} GAP_FRACTIONAL_INTERVALS num_intervals={} last_update={} scheduled={}",
            log_ctx,
            num_intervals,
            last_update_ms,
            result.scheduled_check_time_ms
        );
    }

    let interval_key = last_seen_interval_key(detector.id);
    let last_seen_interval_ms = read_last_seen_interval(ctx, &interval_key, log_ctx)?;

    if last_seen_interval_ms == interval_ms {
        return Ok(synthesize_and_publish(
            ctx,
            detector,
            result,
            last_update_ms,
            interval_ms,
            log_ctx,
        ));
    }

    // The monitor's schedule was recently reconfigured, not a true gap.
    // The caller records the new cadence when it accepts the result, so
    // future gap math uses it.
    log::info!(
        "{} GAP_FALSE_POSITIVE last_seen_interval_ms={} interval_ms={}",
        log_ctx,
        last_seen_interval_ms,
        interval_ms
    );
    ctx.metrics.incr(
        "backfill.false_positive",
        &MetricTags::new().host_provider(subscription.host_provider()),
    );
    Ok(Vec::new())
}

fn read_last_seen_interval(
    ctx: &ProcessorContext,
    key: &str,
    log_ctx: &LogContext,
) -> Result<i64, StoreError> {
    let raw = ctx.store.get(key)?.unwrap_or_else(|| "0".to_string());
    Ok(raw.parse::<i64>().unwrap_or_else(|_| {
        log::warn!("{} LAST_SEEN_INTERVAL_MALFORMED value={:?}", log_ctx, raw);
        0
    }))
}

fn synthesize_and_publish(
    ctx: &ProcessorContext,
    detector: &Detector,
    result: &CheckResult,
    last_update_ms: i64,
    interval_ms: i64,
    log_ctx: &LogContext,
) -> Vec<CheckResult> {
    let records = synthesize_missed(
        result,
        last_update_ms,
        interval_ms,
        ctx.config.max_synthetic_missed_checks,
    );

    if records.is_empty() {
        return records;
    }

    log::info!(
        "{} BACKFILL_SYNTHESIZED count={} from={} interval_ms={}",
        log_ctx,
        records.len(),
        last_update_ms + interval_ms,
        interval_ms
    );
    ctx.metrics.distribution(
        "backfill.synthesized",
        records.len() as f64,
        &MetricTags::new().uptime_region(&result.region),
    );

    for record in &records {
        ctx.analytics.publish(detector, record);
    }

    records
}

/// Fabricate `missed_window` records for every whole interval strictly
/// between the watermark and the incoming result, capped at
/// `max_synthetic`.
pub fn synthesize_missed(
    template: &CheckResult,
    last_update_ms: i64,
    interval_ms: i64,
    max_synthetic: u32,
) -> Vec<CheckResult> {
    // Integer division floors the fractional-misalignment case, so a gap
    // of N intervals yields floor(N) - 1 synthetic slots.
    let num_intervals = (template.scheduled_check_time_ms - last_update_ms) / interval_ms;
    let count = (num_intervals - 1).clamp(0, max_synthetic as i64);

    (1..=count)
        .map(|k| CheckResult::synthetic_miss(template, last_update_ms + k * interval_ms))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckStatus, CheckStatusReason, CheckStatusReasonType};
    use proptest::prelude::*;

    fn template(scheduled_ms: i64) -> CheckResult {
        CheckResult {
            guid: "real-guid".to_string(),
            subscription_id: "sub-1".to_string(),
            status: CheckStatus::Success,
            status_reason: None,
            region: "us-west".to_string(),
            scheduled_check_time_ms: scheduled_ms,
            actual_check_time_ms: scheduled_ms + 100,
            duration_ms: Some(1500),
            trace_id: "trace".to_string(),
            span_id: "span".to_string(),
            request_info: None,
        }
    }

    #[test]
    fn test_gap_of_five_backfills_four() {
        let t = 60_000i64;
        let i = 60_000i64;
        let result = template(t + 5 * i);

        let records = synthesize_missed(&result, t, i, 100);
        let times: Vec<i64> = records.iter().map(|r| r.scheduled_check_time_ms).collect();
        assert_eq!(times, vec![t + i, t + 2 * i, t + 3 * i, t + 4 * i]);
        assert!(records
            .iter()
            .all(|r| r.status == CheckStatus::MissedWindow));
    }

    #[test]
    fn test_cap_applies() {
        let i = 60_000i64;
        let result = template(500 * i + i);

        let records = synthesize_missed(&result, i, i, 100);
        assert_eq!(records.len(), 100);
    }

    #[test]
    fn test_adjacent_tick_needs_no_backfill() {
        let i = 60_000i64;
        let result = template(2 * i);
        assert!(synthesize_missed(&result, i, i, 100).is_empty());
    }

    #[test]
    fn test_fractional_gap_backfills_floor_minus_one() {
        let i = 60_000i64;
        // 2.5 intervals past the watermark: one whole missed slot.
        let result = template(i + i * 5 / 2);
        let records = synthesize_missed(&result, i, i, 100);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].scheduled_check_time_ms, 2 * i);
    }

    #[test]
    fn test_reason_is_miss_backfill() {
        let i = 60_000i64;
        let result = template(4 * i);
        let records = synthesize_missed(&result, i, i, 100);
        for record in records {
            assert_eq!(
                record.status_reason,
                Some(CheckStatusReason {
                    reason_type: CheckStatusReasonType::MissBackfill,
                    description: "Check result missing".to_string(),
                })
            );
            assert!(record.request_info.is_none());
            assert_eq!(record.duration_ms, Some(0));
        }
    }

    proptest! {
        #[test]
        fn prop_backfill_spacing_and_count(
            gap in 2i64..400,
            interval_secs in prop::sample::select(vec![60i64, 300, 600, 1200, 1800, 3600]),
        ) {
            let i = interval_secs * 1000;
            let t = 10 * i;
            let result = template(t + gap * i);

            let records = synthesize_missed(&result, t, i, 100);

            // Count: min(cap, gap - 1).
            prop_assert_eq!(records.len() as i64, (gap - 1).min(100));

            // Spacing: strictly increasing, exactly one interval apart,
            // starting at the first missed slot.
            if let Some(first) = records.first() {
                prop_assert_eq!(first.scheduled_check_time_ms, t + i);
            }
            for pair in records.windows(2) {
                prop_assert_eq!(
                    pair[1].scheduled_check_time_ms - pair[0].scheduled_check_time_ms,
                    i
                );
            }

            // Every synthetic slot sits strictly before the real result.
            for record in &records {
                prop_assert!(record.scheduled_check_time_ms < result.scheduled_check_time_ms);
            }
        }
    }
}
