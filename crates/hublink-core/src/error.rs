//! Configuration validation errors.

use std::time::Duration;

/// Rejected configuration. Raised when a policy or pool setting is built,
/// never deferred to first use.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero (got {value:?})")]
    ZeroDuration { field: &'static str, value: Duration },

    #[error("max_pool_size must be within 1..={max} (got {value})")]
    PoolSizeOutOfRange { value: usize, max: usize },
}
