//! Validated pool settings.

use crate::error::ConfigError;

/// Hard ceiling on slots per scope.
pub const ABSOLUTE_MAX_POOL_SIZE: usize = 256;

/// Slots per scope when not configured.
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Whether a device shares connections, and how many per scope.
///
/// Only constructible with a size in `1..=ABSOLUTE_MAX_POOL_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pooling: bool,
    max_pool_size: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pooling: false,
            max_pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl PoolSettings {
    pub fn new(pooling: bool, max_pool_size: usize) -> Result<Self, ConfigError> {
        if !(1..=ABSOLUTE_MAX_POOL_SIZE).contains(&max_pool_size) {
            return Err(ConfigError::PoolSizeOutOfRange {
                value: max_pool_size,
                max: ABSOLUTE_MAX_POOL_SIZE,
            });
        }
        Ok(Self {
            pooling,
            max_pool_size,
        })
    }

    /// Pooling enabled with `max_pool_size` slots per scope.
    pub fn pooled(max_pool_size: usize) -> Result<Self, ConfigError> {
        Self::new(true, max_pool_size)
    }

    pub fn pooling(&self) -> bool {
        self.pooling
    }

    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(PoolSettings::pooled(1).unwrap().max_pool_size(), 1);
        assert_eq!(
            PoolSettings::pooled(ABSOLUTE_MAX_POOL_SIZE)
                .unwrap()
                .max_pool_size(),
            ABSOLUTE_MAX_POOL_SIZE
        );
    }

    #[test]
    fn zero_and_oversized_pools_are_rejected() {
        assert_eq!(
            PoolSettings::pooled(0),
            Err(ConfigError::PoolSizeOutOfRange {
                value: 0,
                max: ABSOLUTE_MAX_POOL_SIZE
            })
        );
        assert!(PoolSettings::new(false, ABSOLUTE_MAX_POOL_SIZE + 1).is_err());
    }

    #[test]
    fn default_is_dedicated() {
        let s = PoolSettings::default();
        assert!(!s.pooling());
        assert_eq!(s.max_pool_size(), DEFAULT_POOL_SIZE);
    }
}
