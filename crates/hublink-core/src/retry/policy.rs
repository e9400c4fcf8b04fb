use std::time::Duration;

use super::error::Transient;
use super::jitter::apply_jitter;
use crate::error::ConfigError;

/// `2^(attempt + MIN_EXPONENT)` ms: the first retry waits 128ms.
const MIN_EXPONENT: u32 = 6;

/// Exponent ceiling; the largest shift that still fits a `u64` of millis.
const MAX_EXPONENT: u32 = 63;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryDecision::RetryAfter(_))
    }

    /// Wait before the next attempt; zero when not retrying.
    pub fn delay(&self) -> Duration {
        match self {
            RetryDecision::NoRetry => Duration::ZERO,
            RetryDecision::RetryAfter(d) => *d,
        }
    }
}

fn require_non_zero(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ZeroDuration { field, value });
    }
    Ok(())
}

/// Same wait before every retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    max_retries: u32,
    delay: Duration,
    use_jitter: bool,
}

impl FixedDelay {
    pub fn new(max_retries: u32, delay: Duration, use_jitter: bool) -> Result<Self, ConfigError> {
        require_non_zero("delay", delay)?;
        Ok(Self {
            max_retries,
            delay,
            use_jitter,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Wait grows by `step` per retry, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementalDelay {
    max_retries: u32,
    step: Duration,
    max_delay: Duration,
    use_jitter: bool,
}

impl IncrementalDelay {
    pub fn new(
        max_retries: u32,
        step: Duration,
        max_delay: Duration,
        use_jitter: bool,
    ) -> Result<Self, ConfigError> {
        require_non_zero("step", step)?;
        require_non_zero("max_delay", max_delay)?;
        Ok(Self {
            max_retries,
            step,
            max_delay,
            use_jitter,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.max_delay)
    }
}

/// Wait doubles per retry, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    max_retries: u32,
    max_delay: Duration,
    use_jitter: bool,
}

impl ExponentialBackoff {
    pub fn new(
        max_retries: u32,
        max_delay: Duration,
        use_jitter: bool,
    ) -> Result<Self, ConfigError> {
        require_non_zero("max_delay", max_delay)?;
        Ok(Self {
            max_retries,
            max_delay,
            use_jitter,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        // Saturate the exponent first so large attempt counts pin to the cap
        // instead of wrapping the shift.
        let exponent = attempt.saturating_add(MIN_EXPONENT).min(MAX_EXPONENT);
        Duration::from_millis(1u64 << exponent).min(self.max_delay)
    }
}

/// Retry policy: a closed set of strategies behind one entry point.
///
/// Policies hold no per-call state; share them freely across tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    NoRetry,
    Fixed(FixedDelay),
    Incremental(IncrementalDelay),
    Exponential(ExponentialBackoff),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Exponential(ExponentialBackoff {
            max_retries: 10,
            max_delay: Duration::from_secs(10),
            use_jitter: true,
        })
    }
}

impl RetryPolicy {
    pub fn fixed_delay(
        max_retries: u32,
        delay: Duration,
        use_jitter: bool,
    ) -> Result<Self, ConfigError> {
        FixedDelay::new(max_retries, delay, use_jitter).map(RetryPolicy::Fixed)
    }

    pub fn incremental_delay(
        max_retries: u32,
        step: Duration,
        max_delay: Duration,
        use_jitter: bool,
    ) -> Result<Self, ConfigError> {
        IncrementalDelay::new(max_retries, step, max_delay, use_jitter)
            .map(RetryPolicy::Incremental)
    }

    pub fn exponential_backoff(
        max_retries: u32,
        max_delay: Duration,
        use_jitter: bool,
    ) -> Result<Self, ConfigError> {
        ExponentialBackoff::new(max_retries, max_delay, use_jitter).map(RetryPolicy::Exponential)
    }

    /// Number of retries this policy allows; zero for [`RetryPolicy::NoRetry`].
    pub fn max_retries(&self) -> u32 {
        match self {
            RetryPolicy::NoRetry => 0,
            RetryPolicy::Fixed(p) => p.max_retries,
            RetryPolicy::Incremental(p) => p.max_retries,
            RetryPolicy::Exponential(p) => p.max_retries,
        }
    }

    /// Decide whether to retry after a failure.
    ///
    /// `attempt` counts the failed attempts so far, starting at 1 for the
    /// first failure. Non-transient errors and `attempt >= max_retries`
    /// yield `RetryDecision::NoRetry`.
    pub fn should_retry<E>(&self, attempt: u32, last_error: &E) -> RetryDecision
    where
        E: Transient + ?Sized,
    {
        if !last_error.is_transient() || attempt >= self.max_retries() {
            return RetryDecision::NoRetry;
        }

        let (base, cap, use_jitter) = match self {
            RetryPolicy::NoRetry => return RetryDecision::NoRetry,
            RetryPolicy::Fixed(p) => (p.delay, Duration::MAX, p.use_jitter),
            RetryPolicy::Incremental(p) => (p.base_delay(attempt), p.max_delay, p.use_jitter),
            RetryPolicy::Exponential(p) => (p.base_delay(attempt), p.max_delay, p.use_jitter),
        };

        let delay = if use_jitter {
            apply_jitter(base, cap)
        } else {
            base
        };
        RetryDecision::RetryAfter(delay)
    }
}
