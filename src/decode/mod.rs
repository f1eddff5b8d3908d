//! Wire-format decoding for check results.
//!
//! The stream transport hands us raw JSON payloads; everything past this
//! boundary works with the typed [`CheckResult`]. Absent optional fields
//! (`duration_ms`, `status_reason`, `request_info`) decode to `None`, never
//! to an error.

use thiserror::Error;

use crate::model::CheckResult;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed check result payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode a raw wire payload into a typed [`CheckResult`].
pub fn decode_check_result(payload: &[u8]) -> Result<CheckResult, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckStatus, CheckStatusReasonType};

    #[test]
    fn test_decode_full_record() {
        let payload = br#"{
            "guid": "54afc7ed-9767-4e26-9bdd-62c6b05ba60d",
            "subscription_id": "sub-check-1",
            "status": "failure",
            "status_reason": {"type": "timeout", "description": "read timed out after 30s"},
            "region": "us-west",
            "scheduled_check_time_ms": 1718718000000,
            "actual_check_time_ms": 1718718001352,
            "duration_ms": 30000,
            "trace_id": "905e185237ed4bd0b4f35c1d31ab52c9",
            "span_id": "8a96b4b516e0428c",
            "request_info": {"request_type": "HEAD", "http_status_code": 504}
        }"#;

        let result = decode_check_result(payload).unwrap();
        assert_eq!(result.status, CheckStatus::Failure);
        assert_eq!(result.scheduled_check_time_ms, 1_718_718_000_000);
        assert_eq!(result.duration_ms, Some(30_000));
        assert_eq!(
            result.status_reason.unwrap().reason_type,
            CheckStatusReasonType::Timeout
        );
        assert_eq!(result.request_info.unwrap().http_status_code, Some(504));
    }

    #[test]
    fn test_decode_absent_optionals_are_null() {
        let payload = br#"{
            "guid": "g",
            "subscription_id": "sub-check-1",
            "status": "success",
            "region": "eu-central",
            "scheduled_check_time_ms": 60000,
            "actual_check_time_ms": 60100,
            "trace_id": "t",
            "span_id": "s"
        }"#;

        let result = decode_check_result(payload).unwrap();
        assert!(result.status_reason.is_none());
        assert!(result.duration_ms.is_none());
        assert!(result.request_info.is_none());
    }

    #[test]
    fn test_decode_unknown_reason_type_preserved() {
        let payload = br#"{
            "guid": "g",
            "subscription_id": "s",
            "status": "failure",
            "status_reason": {"type": "brownout", "description": "upstream brownout"},
            "region": "us-east",
            "scheduled_check_time_ms": 1,
            "actual_check_time_ms": 2,
            "trace_id": "t",
            "span_id": "s"
        }"#;

        let result = decode_check_result(payload).unwrap();
        assert_eq!(
            result.status_reason.unwrap().reason_type,
            CheckStatusReasonType::Other("brownout".to_string())
        );
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_check_result(b"not json{").is_err());
    }
}
