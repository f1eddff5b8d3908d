//! Result dispatcher.
//!
//! Routes an accepted result to the detector-evaluation pipeline based on
//! detector mode, then publishes it to the analytics sink. Delay and
//! duration distributions are recorded before the mode branch so the stats
//! always reflect the earliest-seen value per scheduled slot; the ordering
//! gate upstream guarantees that value is the first one.

use crate::logging::LogContext;
use crate::metrics::MetricTags;
use crate::model::{CheckResult, Detector, DetectorMode, UptimeSubscription};
use crate::registry::DataPacket;

use super::context::ProcessorContext;

/// Tag set shared by the dispatch-path metrics.
pub fn result_tags(
    subscription: &UptimeSubscription,
    detector: &Detector,
    result: &CheckResult,
) -> MetricTags {
    let mut tags = MetricTags::new()
        .host_provider(subscription.host_provider())
        .status(result.status.as_str())
        .uptime_region(&result.region)
        .mode(detector.mode.as_str());
    if let Some(reason) = &result.status_reason {
        tags = tags.status_reason(reason.reason_type.as_str());
    }
    tags
}

/// Dispatch one accepted result. Detector evaluation failures are caught
/// and logged here; they must not block the caller's bookkeeping.
pub fn dispatch_result(
    ctx: &ProcessorContext,
    subscription: &UptimeSubscription,
    detector: &Detector,
    result: &CheckResult,
    log_ctx: &LogContext,
) {
    let tags = result_tags(subscription, detector, result);

    ctx.metrics
        .distribution("check_result.delay_ms", result.delay_ms() as f64, &tags);
    if let Some(duration_ms) = result.duration_ms {
        ctx.metrics
            .distribution("check_result.duration_ms", duration_ms as f64, &tags);
    }

    let packet = build_packet(subscription, result, &tags);

    match &detector.mode {
        DetectorMode::AutoDetectedOnboarding => {
            if let Err(e) = ctx.handler.process_onboarding(&packet, detector) {
                log::error!(
                    "{} ONBOARDING_EVAL_FAILED detector_id={} error={:#}",
                    log_ctx,
                    detector.id,
                    e
                );
            }
        }
        DetectorMode::AutoDetectedActive | DetectorMode::Manual => {
            if let Err(e) = ctx
                .handler
                .process_packet(&packet, std::slice::from_ref(detector))
            {
                log::error!(
                    "{} DETECTOR_EVAL_FAILED detector_id={} error={:#}",
                    log_ctx,
                    detector.id,
                    e
                );
            }
        }
        DetectorMode::Other(mode) => {
            log::error!(
                "{} UNKNOWN_DETECTOR_MODE mode={} detector_id={}",
                log_ctx,
                mode,
                detector.id
            );
            ctx.metrics.incr("handle_result.unknown_mode", &tags);
        }
    }

    // Analytics publication happens regardless of the dispatch branch.
    ctx.analytics.publish(detector, result);
}

fn build_packet(
    subscription: &UptimeSubscription,
    result: &CheckResult,
    tags: &MetricTags,
) -> DataPacket {
    DataPacket {
        source_id: subscription.id.to_string(),
        packet: serde_json::json!({
            "subscription_id": subscription.subscription_id,
            "interval_seconds": subscription.interval_seconds,
            "result": result,
            "metric_tags": {
                "host_provider": tags.host_provider,
                "status": tags.status,
                "uptime_region": tags.uptime_region,
                "mode": tags.mode,
                "status_reason": tags.status_reason,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CheckInterval, CheckStatus, CheckStatusReason, CheckStatusReasonType, SubscriptionStatus,
    };

    fn subscription() -> UptimeSubscription {
        UptimeSubscription {
            id: 42,
            subscription_id: "sub-dispatch".to_string(),
            interval_seconds: CheckInterval::OneMinute,
            status: SubscriptionStatus::Active,
            host_provider_name: Some("route53".to_string()),
        }
    }

    fn failure_result() -> CheckResult {
        CheckResult {
            guid: "g".to_string(),
            subscription_id: "sub-dispatch".to_string(),
            status: CheckStatus::Failure,
            status_reason: Some(CheckStatusReason {
                reason_type: CheckStatusReasonType::DnsError,
                description: "NXDOMAIN".to_string(),
            }),
            region: "us-west".to_string(),
            scheduled_check_time_ms: 60_000,
            actual_check_time_ms: 61_000,
            duration_ms: Some(250),
            trace_id: "t".to_string(),
            span_id: "s".to_string(),
            request_info: None,
        }
    }

    #[test]
    fn test_result_tags() {
        let detector = Detector {
            id: 7,
            enabled: true,
            mode: DetectorMode::Manual,
            project_id: 1,
        };
        let tags = result_tags(&subscription(), &detector, &failure_result());
        assert_eq!(tags.host_provider.as_deref(), Some("route53"));
        assert_eq!(tags.status.as_deref(), Some("failure"));
        assert_eq!(tags.uptime_region.as_deref(), Some("us-west"));
        assert_eq!(tags.mode.as_deref(), Some("manual"));
        assert_eq!(tags.status_reason.as_deref(), Some("dns_error"));
    }

    #[test]
    fn test_packet_shape() {
        let tags = MetricTags::new().status("failure");
        let packet = build_packet(&subscription(), &failure_result(), &tags);
        assert_eq!(packet.source_id, "42");
        assert_eq!(packet.packet["subscription_id"], "sub-dispatch");
        assert_eq!(packet.packet["interval_seconds"], 60);
        assert_eq!(packet.packet["result"]["guid"], "g");
        assert_eq!(packet.packet["metric_tags"]["status"], "failure");
    }
}
