//! Wire record for a single uptime check attempt.
//!
//! A `CheckResult` is decoded once at the ingestion boundary and passed by
//! reference through the rest of the pipeline; raw JSON never travels past
//! the decoder. `scheduled_check_time_ms` is the ordering and dedup key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a check attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Failure,
    /// Synthetic status for intervals where no real check ran.
    MissedWindow,
    /// The target's robots.txt forbids checking. Permanent policy signal.
    DisallowedByRobots,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Success => "success",
            CheckStatus::Failure => "failure",
            CheckStatus::MissedWindow => "missed_window",
            CheckStatus::DisallowedByRobots => "disallowed_by_robots",
        }
    }
}

/// Classified cause of a non-success outcome.
///
/// The wire set is open; unrecognized strings round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatusReasonType {
    Timeout,
    DnsError,
    ConnectionError,
    TlsError,
    RedirectError,
    /// Attached to records fabricated by the backfill synthesizer.
    MissBackfill,
    Other(String),
}

impl CheckStatusReasonType {
    pub fn as_str(&self) -> &str {
        match self {
            CheckStatusReasonType::Timeout => "timeout",
            CheckStatusReasonType::DnsError => "dns_error",
            CheckStatusReasonType::ConnectionError => "connection_error",
            CheckStatusReasonType::TlsError => "tls_error",
            CheckStatusReasonType::RedirectError => "redirect_error",
            CheckStatusReasonType::MissBackfill => "miss_backfill",
            CheckStatusReasonType::Other(s) => s,
        }
    }

    pub fn from_wire(s: &str) -> Self {
        match s {
            "timeout" => CheckStatusReasonType::Timeout,
            "dns_error" => CheckStatusReasonType::DnsError,
            "connection_error" => CheckStatusReasonType::ConnectionError,
            "tls_error" => CheckStatusReasonType::TlsError,
            "redirect_error" => CheckStatusReasonType::RedirectError,
            "miss_backfill" => CheckStatusReasonType::MissBackfill,
            other => CheckStatusReasonType::Other(other.to_string()),
        }
    }
}

impl Serialize for CheckStatusReasonType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CheckStatusReasonType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(CheckStatusReasonType::from_wire(&s))
    }
}

/// Structured explanation for a check outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatusReason {
    #[serde(rename = "type")]
    pub reason_type: CheckStatusReasonType,
    pub description: String,
}

/// Request/response details captured by the checker. Present only on real
/// (non-synthetic) checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub http_status_code: Option<u16>,
}

/// A single uptime check result as delivered by the checker stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Opaque unique identifier for this specific check attempt.
    pub guid: String,
    /// Stable key into the subscription registry.
    pub subscription_id: String,
    pub status: CheckStatus,
    #[serde(default)]
    pub status_reason: Option<CheckStatusReason>,
    /// Checker region that performed (or is attributed with) this check.
    pub region: String,
    /// Epoch-ms time the check was supposed to run. The ordering key.
    pub scheduled_check_time_ms: i64,
    /// Epoch-ms time the check actually ran.
    pub actual_check_time_ms: i64,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    pub trace_id: String,
    pub span_id: String,
    #[serde(default)]
    pub request_info: Option<RequestInfo>,
}

impl CheckResult {
    /// Fabricate a `missed_window` record for an interval where no real
    /// check result was ever received. Attributed to the region of the
    /// result that exposed the gap; carries fresh identifiers so downstream
    /// consumers never correlate it with a real check.
    pub fn synthetic_miss(template: &CheckResult, scheduled_check_time_ms: i64) -> CheckResult {
        CheckResult {
            guid: Uuid::new_v4().to_string(),
            subscription_id: template.subscription_id.clone(),
            status: CheckStatus::MissedWindow,
            status_reason: Some(CheckStatusReason {
                reason_type: CheckStatusReasonType::MissBackfill,
                description: "Check result missing".to_string(),
            }),
            region: template.region.clone(),
            scheduled_check_time_ms,
            actual_check_time_ms: scheduled_check_time_ms,
            duration_ms: Some(0),
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: format!("{:016x}", rand::random::<u64>()),
            request_info: None,
        }
    }

    /// Scheduling delay in ms: how late the check actually ran.
    pub fn delay_ms(&self) -> i64 {
        self.actual_check_time_ms - self.scheduled_check_time_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_result() -> CheckResult {
        CheckResult {
            guid: "abc-123".to_string(),
            subscription_id: "sub-1".to_string(),
            status: CheckStatus::Failure,
            status_reason: Some(CheckStatusReason {
                reason_type: CheckStatusReasonType::Timeout,
                description: "read timed out".to_string(),
            }),
            region: "us-west".to_string(),
            scheduled_check_time_ms: 60_000,
            actual_check_time_ms: 60_420,
            duration_ms: Some(30_000),
            trace_id: "t".to_string(),
            span_id: "s".to_string(),
            request_info: None,
        }
    }

    #[test]
    fn test_synthetic_miss_shape() {
        let template = real_result();
        let miss = CheckResult::synthetic_miss(&template, 120_000);

        assert_eq!(miss.status, CheckStatus::MissedWindow);
        assert_eq!(miss.scheduled_check_time_ms, 120_000);
        assert_eq!(miss.actual_check_time_ms, 120_000);
        assert_eq!(miss.duration_ms, Some(0));
        assert!(miss.request_info.is_none());
        assert_eq!(
            miss.status_reason.as_ref().unwrap().reason_type,
            CheckStatusReasonType::MissBackfill
        );
        // Fresh identifiers, never inherited from the template.
        assert_ne!(miss.guid, template.guid);
        assert_ne!(miss.trace_id, template.trace_id);
    }

    #[test]
    fn test_delay() {
        assert_eq!(real_result().delay_ms(), 420);
    }

    #[test]
    fn test_reason_type_other_round_trip() {
        let reason = CheckStatusReasonType::from_wire("quantum_flux");
        assert_eq!(reason, CheckStatusReasonType::Other("quantum_flux".to_string()));
        assert_eq!(reason.as_str(), "quantum_flux");
    }
}
