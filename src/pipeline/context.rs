//! Per-process processor context.
//!
//! Constructed once at startup and passed by reference into each consumer
//! invocation. Everything the pipeline touches — collaborators, state
//! store, clock, randomness — hangs off this handle; there is no hidden
//! global mutable state.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ProcessorConfig;
use crate::metrics::MetricsEmitter;
use crate::registry::{
    AnalyticsSink, ConfigPusher, DetectorHandler, DetectorRegistry, RegionRegistry,
    RetryTaskScheduler, SubscriptionRegistry,
};
use crate::store::StateStore;

/// Time source. Abstracted so tests can pin the clock for the
/// deterministic region-check trigger and delay metrics.
pub trait Clock: Send + Sync {
    /// Current wall-clock time as epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Production clock backed by the system time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Fixed clock for tests.
#[derive(Debug)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// Handle bundle for one consumer process.
pub struct ProcessorContext {
    pub config: ProcessorConfig,
    pub store: Arc<dyn StateStore>,
    pub subscriptions: Arc<dyn SubscriptionRegistry>,
    pub regions: Arc<dyn RegionRegistry>,
    pub detectors: Arc<dyn DetectorRegistry>,
    pub handler: Arc<dyn DetectorHandler>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub config_pusher: Arc<dyn ConfigPusher>,
    pub scheduler: Arc<dyn RetryTaskScheduler>,
    pub metrics: Arc<dyn MetricsEmitter>,
    pub clock: Arc<dyn Clock>,
    rng: Mutex<SmallRng>,
}

impl ProcessorContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ProcessorConfig,
        store: Arc<dyn StateStore>,
        subscriptions: Arc<dyn SubscriptionRegistry>,
        regions: Arc<dyn RegionRegistry>,
        detectors: Arc<dyn DetectorRegistry>,
        handler: Arc<dyn DetectorHandler>,
        analytics: Arc<dyn AnalyticsSink>,
        config_pusher: Arc<dyn ConfigPusher>,
        scheduler: Arc<dyn RetryTaskScheduler>,
        metrics: Arc<dyn MetricsEmitter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            subscriptions,
            regions,
            detectors,
            handler,
            analytics,
            config_pusher,
            scheduler,
            metrics,
            clock,
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    /// Uniform draw in [0, 1) for the probabilistic region-check trigger.
    pub fn roll(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }
}
