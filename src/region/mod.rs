//! Region coordination module.
//!
//! Keeps each subscription's active/shadow checker-region assignments in
//! step with the authoritative region configuration.

pub mod coordinator;

pub use coordinator::*;
