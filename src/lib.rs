//! Uptime check result processor.
//!
//! Ingests the stream of synthetic uptime check results (one per monitored
//! URL per scheduling interval), deduplicates and orders them despite
//! out-of-order delivery, backfills missing checks, coordinates
//! cross-region health verification, and feeds validated results into the
//! downstream issue-detection pipeline. The stream may replay or duplicate
//! messages, so every side effect sits behind an idempotency gate.
//!
//! ## Architecture
//!
//! - `model` - Typed wire record and registry entities
//! - `decode` - Wire-format decoding at the ingestion boundary
//! - `pipeline` - Ordering gate, backfill, backlog, dispatch, orchestration
//! - `region` - Active/shadow region coordination
//! - `store` - Durable key-value state (watermarks, backlogs, flags)
//! - `registry` - External collaborator interfaces
//! - `metrics` - Counter/distribution emission
//! - `logging` - Structured logging with subscription context
//!
//! ## Entry points
//!
//! Build a [`pipeline::ProcessorContext`] once at startup, then call
//! [`pipeline::process_payload`] per stream record (or
//! [`pipeline::process_result`] if the transport already decoded it).
//! The backlog retry task calls [`pipeline::drain_backlog`].

pub mod config;
pub mod decode;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod region;
pub mod registry;
pub mod store;
