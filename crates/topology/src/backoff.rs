//! Exponential backoff with jitter for output retries

use std::time::Duration;

use rand::Rng;

/// Backoff durations that double per attempt between a minimum and maximum
/// bound, with jitter spreading concurrent retriers apart.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    min: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    /// Create a backoff strategy bounded by `[min, max]`.
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(min);
        Self { min, max }
    }

    /// Backoff duration for the given consecutive error count (1-based).
    ///
    /// The unjittered duration is `min * 2^(errors-1)` clamped to the
    /// bounds; the returned duration is drawn uniformly from its upper
    /// half so retriers do not stampede in lockstep.
    pub fn duration(&self, errors: u32) -> Duration {
        let exp = errors.saturating_sub(1).min(32);
        let full = self
            .min
            .saturating_mul(2u32.saturating_pow(exp))
            .clamp(self.min, self.max);

        let lower = full / 2;
        if lower.is_zero() || lower >= full {
            return full;
        }
        rand::thread_rng().gen_range(lower..=full).max(self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_stays_bounded() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(5));
        for errors in 1..16 {
            let d = backoff.duration(errors);
            assert!(d >= Duration::from_millis(100), "attempt {errors}: {d:?}");
            assert!(d <= Duration::from_secs(5), "attempt {errors}: {d:?}");
        }
    }

    #[test]
    fn test_backoff_upper_half_of_exponential() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(60));
        // Third consecutive error: full backoff 400ms, jittered within
        // [200ms, 400ms].
        for _ in 0..50 {
            let d = backoff.duration(3);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(400));
        }
    }

    #[test]
    fn test_degenerate_bounds() {
        let backoff = ExponentialBackoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.duration(5), Duration::ZERO);
    }
}
