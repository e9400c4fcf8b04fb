//! Random perturbation of retry delays.

use std::time::Duration;

use rand::Rng;

/// Jittered delays land within ±20% of the computed delay.
pub(crate) const JITTER_FRACTION: f64 = 0.2;

/// Delays shorter than this are returned unchanged.
pub(crate) const JITTER_THRESHOLD: Duration = Duration::from_millis(50);

/// Spread `base` by a random factor in `[1 - JITTER_FRACTION, 1 + JITTER_FRACTION]`,
/// never exceeding `cap`.
///
/// Each call draws from the thread-local generator, so policies stay
/// immutable and callers on different threads never contend.
pub(crate) fn apply_jitter(base: Duration, cap: Duration) -> Duration {
    if base < JITTER_THRESHOLD {
        return base.min(cap);
    }
    let factor = rand::thread_rng().gen_range(1.0 - JITTER_FRACTION..=1.0 + JITTER_FRACTION);
    Duration::try_from_secs_f64(base.as_secs_f64() * factor)
        .unwrap_or(cap)
        .min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_delays_pass_through() {
        let d = Duration::from_millis(10);
        assert_eq!(apply_jitter(d, Duration::MAX), d);
    }

    #[test]
    fn jittered_delay_stays_within_band() {
        let base = Duration::from_secs(10);
        for _ in 0..200 {
            let d = apply_jitter(base, Duration::MAX);
            assert!(d >= Duration::from_secs(8), "{d:?}");
            assert!(d <= Duration::from_secs(12), "{d:?}");
        }
    }

    #[test]
    fn jitter_respects_cap() {
        let base = Duration::from_secs(10);
        for _ in 0..200 {
            assert!(apply_jitter(base, base) <= base);
        }
    }

    #[test]
    fn jitter_near_duration_max_does_not_panic() {
        let d = apply_jitter(Duration::MAX, Duration::MAX);
        assert!(d > Duration::ZERO);
    }
}
