//! Typed data model for the result processor.
//!
//! `result` holds the wire record types; `subscription` holds the registry
//! entities the processor reads (subscriptions, regions, detectors).

pub mod result;
pub mod subscription;

pub use result::{CheckResult, CheckStatus, CheckStatusReason, CheckStatusReasonType, RequestInfo};
pub use subscription::{
    CheckInterval, Detector, DetectorMode, RegionMode, SubscriptionRegion, SubscriptionStatus,
    UptimeSubscription,
};
