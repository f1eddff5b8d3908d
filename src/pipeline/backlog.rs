//! Out-of-order retry queue.
//!
//! When the backlog feature is enabled, out-of-order results are never
//! backfilled synchronously. They are parked in a durable per-subscription
//! sorted set, and a single bounded-delay retry task replays them in
//! scheduled order. The backlog plus the one scheduled task gives an
//! implicit per-subscription serialization point without a long-held lock.

use std::sync::Arc;

use crate::logging::LogContext;
use crate::metrics::MetricTags;
use crate::model::CheckResult;
use crate::store::{
    backlog_key, backlog_schedule_lock_key, backlog_task_scheduled_key, StateStore, StoreError,
};

use super::context::ProcessorContext;

/// Scoped holder for the schedule lock. Releases on drop, including on
/// early returns and panics, so a crashed handler can never wedge the
/// 10-second lock for its full TTL.
struct ScheduleLock {
    store: Arc<dyn StateStore>,
    key: String,
    held: bool,
}

impl ScheduleLock {
    /// Bounded acquire: `lock_attempts` tries with a fixed poll interval.
    /// Failure is non-fatal; the caller proceeds without the lock, since a
    /// duplicate scheduled task is cheaper than a dropped result.
    fn acquire(ctx: &ProcessorContext, subscription_id: &str, log_ctx: &LogContext) -> Self {
        let key = backlog_schedule_lock_key(subscription_id);
        let mut held = false;

        for attempt in 0..ctx.config.lock_attempts {
            match ctx
                .store
                .set_nx_with_ttl(&key, "1", ctx.config.schedule_lock_ttl())
            {
                Ok(true) => {
                    held = true;
                    break;
                }
                Ok(false) => {
                    if attempt + 1 < ctx.config.lock_attempts {
                        std::thread::sleep(ctx.config.lock_poll_interval());
                    }
                }
                Err(e) => {
                    log::warn!("{} SCHEDULE_LOCK_ERROR error={}", log_ctx, e);
                    break;
                }
            }
        }

        if !held {
            log::info!("{} SCHEDULE_LOCK_NOT_ACQUIRED", log_ctx);
            ctx.metrics
                .incr("backlog.lock_failed", &MetricTags::new());
        }

        Self {
            store: Arc::clone(&ctx.store),
            key,
            held,
        }
    }
}

impl Drop for ScheduleLock {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = self.store.delete(&self.key) {
                log::warn!("SCHEDULE_LOCK_RELEASE_FAILED key={} error={}", self.key, e);
            }
        }
    }
}

/// Park an out-of-order result in the backlog and make sure exactly one
/// retry task is scheduled for this subscription.
///
/// `attempt` is the retry-pass number the scheduled task will carry: 1 on
/// the consumer path, the escalated value when a drain re-enqueues an
/// entry that is still out of order. The scheduling harness caps attempts
/// based on it.
pub fn enqueue_out_of_order(
    ctx: &ProcessorContext,
    result: &CheckResult,
    attempt: u32,
    log_ctx: &LogContext,
) -> Result<(), StoreError> {
    let subscription_id = &result.subscription_id;
    let _lock = ScheduleLock::acquire(ctx, subscription_id, log_ctx);

    let serialized = serde_json::to_string(result).map_err(|e| {
        // CheckResult always serializes; treat a failure as the store's
        // problem so the caller's drop-and-log path handles it.
        StoreError::Unavailable(format!("serialize backlog entry: {}", e))
    })?;

    let backlog = backlog_key(subscription_id);
    ctx.store
        .zadd(&backlog, result.scheduled_check_time_ms, &serialized)?;
    ctx.store.expire(&backlog, ctx.config.backlog_ttl())?;

    let newly_flagged = ctx.store.set_nx_with_ttl(
        &backlog_task_scheduled_key(subscription_id),
        "1",
        ctx.config.task_scheduled_ttl(),
    )?;

    ctx.metrics.incr(
        "backlog.deferred",
        &MetricTags::new().uptime_region(&result.region),
    );
    log::info!(
        "{} RESULT_DEFERRED scheduled_ms={} task_newly_scheduled={}",
        log_ctx,
        result.scheduled_check_time_ms,
        newly_flagged
    );

    if newly_flagged {
        if let Err(e) =
            ctx.scheduler
                .schedule_retry(subscription_id, ctx.config.retry_countdown(), attempt)
        {
            // Clear the flag so the next out-of-order result can try again.
            log::error!("{} RETRY_SCHEDULE_FAILED error={:#}", log_ctx, e);
            ctx.store
                .delete(&backlog_task_scheduled_key(subscription_id))?;
        }
    }

    Ok(())
}

/// Drain a subscription's backlog in scheduled order.
///
/// This is the body of the retry task. The task-scheduled flag is cleared
/// first so results arriving mid-drain can schedule a fresh pass. Each
/// entry replays through the normal gate; an entry that is still out of
/// order re-enters the backlog and schedules the next pass with
/// `attempt + 1`, so the scheduling harness can cap attempts.
pub fn drain_backlog(
    ctx: &ProcessorContext,
    subscription_id: &str,
    attempt: u32,
) -> Result<usize, StoreError> {
    let log_ctx = LogContext::new(subscription_id);
    ctx.store
        .delete(&backlog_task_scheduled_key(subscription_id))?;

    let backlog = backlog_key(subscription_id);
    let entries = ctx.store.zrange(&backlog)?;

    log::info!(
        "{} BACKLOG_DRAIN_START entries={} attempt={}",
        log_ctx,
        entries.len(),
        attempt
    );

    let mut replayed = 0;
    for (scheduled_ms, serialized) in entries {
        ctx.store.zrem(&backlog, &serialized)?;
        match serde_json::from_str::<CheckResult>(&serialized) {
            Ok(result) => {
                super::process::replay_result(ctx, &result, attempt + 1);
                replayed += 1;
            }
            Err(e) => {
                log::error!(
                    "{} BACKLOG_ENTRY_MALFORMED scheduled_ms={} error={}",
                    log_ctx,
                    scheduled_ms,
                    e
                );
            }
        }
    }

    log::info!("{} BACKLOG_DRAIN_COMPLETE replayed={}", log_ctx, replayed);
    Ok(replayed)
}
