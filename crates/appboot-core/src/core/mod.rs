//! Internal implementation modules for `appboot-core`.
//!
//! Callers go through the crate-root re-exports.

pub mod boot;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod tooling;
