//! Metrics emission.
//!
//! Thin facade over whatever statsd-style backend the host process wires
//! in. Call sites tag with host provider, status, region, detector mode,
//! and status reason as applicable; emitters that don't care about a tag
//! ignore it.

use std::fmt;

use parking_lot::Mutex;

/// Tag set attached to counters and distributions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTags {
    pub host_provider: Option<String>,
    pub status: Option<String>,
    pub uptime_region: Option<String>,
    pub mode: Option<String>,
    pub status_reason: Option<String>,
}

impl MetricTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_provider(mut self, v: &str) -> Self {
        self.host_provider = Some(v.to_string());
        self
    }

    pub fn status(mut self, v: &str) -> Self {
        self.status = Some(v.to_string());
        self
    }

    pub fn uptime_region(mut self, v: &str) -> Self {
        self.uptime_region = Some(v.to_string());
        self
    }

    pub fn mode(mut self, v: &str) -> Self {
        self.mode = Some(v.to_string());
        self
    }

    pub fn status_reason(mut self, v: &str) -> Self {
        self.status_reason = Some(v.to_string());
        self
    }
}

impl fmt::Display for MetricTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = [
            ("host_provider", &self.host_provider),
            ("status", &self.status),
            ("uptime_region", &self.uptime_region),
            ("mode", &self.mode),
            ("status_reason", &self.status_reason),
        ];
        let mut wrote = false;
        for (key, value) in pairs {
            if let Some(value) = value {
                if wrote {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", key, value)?;
                wrote = true;
            }
        }
        Ok(())
    }
}

/// Counter and distribution recording.
pub trait MetricsEmitter: Send + Sync {
    fn incr(&self, name: &str, tags: &MetricTags);
    fn distribution(&self, name: &str, value: f64, tags: &MetricTags);
}

/// Default emitter: writes metrics to the log at debug level.
#[derive(Debug, Default)]
pub struct LogMetrics;

impl MetricsEmitter for LogMetrics {
    fn incr(&self, name: &str, tags: &MetricTags) {
        log::debug!("METRIC_INCR name={} tags=[{}]", name, tags);
    }

    fn distribution(&self, name: &str, value: f64, tags: &MetricTags) {
        log::debug!("METRIC_DIST name={} value={} tags=[{}]", name, value, tags);
    }
}

/// A single recorded metric event.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    Incr { name: String, tags: MetricTags },
    Distribution {
        name: String,
        value: f64,
        tags: MetricTags,
    },
}

/// Emitter that records every event, for assertions in tests and for
/// embedders that batch-forward metrics themselves.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    events: Mutex<Vec<MetricEvent>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events.lock().clone()
    }

    /// Count of `incr` events with the given metric name.
    pub fn incr_count(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, MetricEvent::Incr { name: n, .. } if n == name))
            .count()
    }

    /// Values recorded for a distribution name, in emission order.
    pub fn distribution_values(&self, name: &str) -> Vec<f64> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                MetricEvent::Distribution { name: n, value, .. } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }
}

impl MetricsEmitter for RecordingMetrics {
    fn incr(&self, name: &str, tags: &MetricTags) {
        self.events.lock().push(MetricEvent::Incr {
            name: name.to_string(),
            tags: tags.clone(),
        });
    }

    fn distribution(&self, name: &str, value: f64, tags: &MetricTags) {
        self.events.lock().push(MetricEvent::Distribution {
            name: name.to_string(),
            value,
            tags: tags.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_metrics() {
        let metrics = RecordingMetrics::new();
        let tags = MetricTags::new().status("success").uptime_region("us-west");

        metrics.incr("handle_result.total", &tags);
        metrics.incr("handle_result.total", &tags);
        metrics.distribution("check_result.delay_ms", 420.0, &tags);

        assert_eq!(metrics.incr_count("handle_result.total"), 2);
        assert_eq!(
            metrics.distribution_values("check_result.delay_ms"),
            vec![420.0]
        );
    }

    #[test]
    fn test_tags_display() {
        let tags = MetricTags::new().status("failure").mode("manual");
        assert_eq!(format!("{}", tags), "status=failure,mode=manual");
    }
}
