//! Structured logging with subscription context.
//!
//! Provides logging utilities that include subscription_id and check guid
//! in every log message for easy correlation.

pub mod structured;

pub use structured::*;

/// Initialize the process-wide logger. Safe to call repeatedly.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
