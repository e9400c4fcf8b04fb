//! Retry policies and pooled device connections for IoT hub clients.
//!
//! Two pieces live here:
//! - [`retry`]: decides whether a failed operation should be retried and
//!   how long to wait before the next attempt.
//! - [`pool`]: groups per-device units onto a bounded set of shared
//!   physical connections keyed by authentication scope.
//!
//! Transports, payload formats and device samples are out of scope; they
//! plug in through the traits in [`pool`] and the [`retry::Transient`] gate.

pub mod config;
pub mod error;
pub mod logging;
pub mod pool;
pub mod retry;

pub use error::ConfigError;
