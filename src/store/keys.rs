//! Key naming scheme for processor state.
//!
//! Five namespaces share one store; the `uptime:` prefix plus a distinct
//! segment per namespace keeps them collision-free. Watermark and interval
//! tracking are keyed by detector, backlog state by subscription.

/// Watermark: scheduled ms of the most recently accepted result.
pub fn last_update_key(detector_id: u64) -> String {
    format!("uptime:last_update:{}", detector_id)
}

/// Interval observed at the last backfill decision.
pub fn last_seen_interval_key(detector_id: u64) -> String {
    format!("uptime:last_seen_interval:{}", detector_id)
}

/// Sorted set of serialized out-of-order results, scored by scheduled ms.
pub fn backlog_key(subscription_id: &str) -> String {
    format!("uptime:backlog:{}", subscription_id)
}

/// Flag marking that a backlog retry task is already scheduled.
pub fn backlog_task_scheduled_key(subscription_id: &str) -> String {
    format!("uptime:backlog_task_scheduled:{}", subscription_id)
}

/// Short-lived lock guarding the backlog scheduling critical section.
pub fn backlog_schedule_lock_key(subscription_id: &str) -> String {
    format!("uptime:backlog_schedule_lock:{}", subscription_id)
}
