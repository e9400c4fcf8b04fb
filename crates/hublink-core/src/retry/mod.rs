//! Retry and backoff policy.
//!
//! A [`RetryPolicy`] is an immutable value: given how many retries have
//! already been made and the error that just happened, it answers with a
//! [`RetryDecision`]. Only errors that report themselves as [`Transient`]
//! are eligible; everything else stops immediately.
//!
//! [`run_with_retry`] composes a policy with an async operation for callers
//! that do not need their own loop.

mod classify;
mod error;
mod jitter;
mod policy;
mod run;

pub use classify::is_transient_io;
pub use error::{ErrorInfo, Transient};
pub use policy::{
    ExponentialBackoff, FixedDelay, IncrementalDelay, RetryDecision, RetryPolicy,
};
pub use run::run_with_retry;
