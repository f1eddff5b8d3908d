//! Ordering & dedup gate.
//!
//! Classifies an incoming result against the per-detector watermark (the
//! `last_update` scheduled ms of the most recently accepted result). The
//! classification itself is a pure read; the watermark only advances after
//! processing completes, so a crash mid-processing is retried on
//! redelivery rather than silently skipped.

use crate::logging::LogContext;

/// Gate decision for one incoming result.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Already processed a result for this scheduled slot (or a later one).
    /// Streams may redeliver; only the first-seen value per slot is
    /// authoritative.
    Stale,
    /// First-ever result for this detector; no watermark exists yet.
    FirstSeen,
    /// Exactly one interval past the watermark.
    Expected,
    /// Anything else: a gap or out-of-order delivery. `num_intervals` is
    /// how many intervals past the watermark this result landed;
    /// fractional values indicate interval misalignment.
    OutOfOrder { num_intervals: f64 },
}

/// Classify a result's scheduled time against the watermark.
///
/// `last_update_ms == 0` means no result has ever been accepted for this
/// detector.
pub fn classify(last_update_ms: i64, scheduled_ms: i64, interval_ms: i64) -> GateDecision {
    if last_update_ms == 0 {
        return GateDecision::FirstSeen;
    }
    if scheduled_ms <= last_update_ms {
        return GateDecision::Stale;
    }
    if scheduled_ms == last_update_ms + interval_ms {
        return GateDecision::Expected;
    }
    GateDecision::OutOfOrder {
        num_intervals: (scheduled_ms - last_update_ms) as f64 / interval_ms as f64,
    }
}

/// Parse a stored watermark value. Missing or malformed values fall back
/// to 0 (never accepted) rather than wedging the pipeline.
pub fn parse_watermark(raw: Option<String>, ctx: &LogContext) -> i64 {
    match raw {
        None => 0,
        Some(s) => s.parse::<i64>().unwrap_or_else(|_| {
            log::warn!("{} WATERMARK_MALFORMED value={:?}", ctx, s);
            0
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: i64 = 60_000;

    #[test]
    fn test_first_seen() {
        assert_eq!(classify(0, 60_000, INTERVAL), GateDecision::FirstSeen);
    }

    #[test]
    fn test_stale_at_and_below_watermark() {
        assert_eq!(classify(120_000, 120_000, INTERVAL), GateDecision::Stale);
        assert_eq!(classify(120_000, 60_000, INTERVAL), GateDecision::Stale);
    }

    #[test]
    fn test_expected_next_tick() {
        assert_eq!(classify(60_000, 120_000, INTERVAL), GateDecision::Expected);
    }

    #[test]
    fn test_gap() {
        assert_eq!(
            classify(60_000, 360_000, INTERVAL),
            GateDecision::OutOfOrder { num_intervals: 5.0 }
        );
    }

    #[test]
    fn test_fractional_misalignment() {
        match classify(60_000, 150_000, INTERVAL) {
            GateDecision::OutOfOrder { num_intervals } => {
                assert_eq!(num_intervals, 1.5);
            }
            other => panic!("expected out-of-order, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_watermark_fallbacks() {
        let ctx = LogContext::new("sub-1");
        assert_eq!(parse_watermark(None, &ctx), 0);
        assert_eq!(parse_watermark(Some("garbage".to_string()), &ctx), 0);
        assert_eq!(parse_watermark(Some("60000".to_string()), &ctx), 60_000);
    }
}
