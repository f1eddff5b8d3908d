//! Result-processing pipeline.
//!
//! Coordinates the full flow for one incoming check result:
//! - Registry lookups and cleanup of orphans
//! - Shadow-region drop and robots.txt short-circuit
//! - Region reconciliation side channel
//! - Ordering & dedup gate against the watermark
//! - Gap backfill or out-of-order backlog deferral
//! - Dispatch to the detector pipeline and analytics sink

pub mod backfill;
pub mod backlog;
pub mod context;
pub mod dispatch;
pub mod gate;
pub mod process;

pub use backfill::*;
pub use backlog::*;
pub use context::*;
pub use dispatch::*;
pub use gate::*;
pub use process::*;
