//! Randomized pre-call delay.

use crate::config::DelayRange;
use rand::Rng;
use std::time::Duration;

impl DelayRange {
    /// Draw a pause uniformly from `[min, max]` seconds.
    ///
    /// A collapsed `(0, 0)` range always yields zero. Bounds are clamped to
    /// `[0, MAX_SECS]`, so unvalidated ranges cannot overflow a `Duration`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.is_zero() {
            return Duration::ZERO;
        }
        let min = clamp_secs(self.min);
        let max = clamp_secs(self.max).max(min);
        let secs = if max > min {
            rng.gen_range(min..=max)
        } else {
            min
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

fn clamp_secs(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, DelayRange::MAX_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_range_never_delays() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(DelayRange::ZERO.sample(&mut rng), Duration::ZERO);
        }
    }

    #[test]
    fn test_samples_stay_within_bounds() {
        let range = DelayRange { min: 0.5, max: 1.5 };
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let d = range.sample(&mut rng);
            assert!(d >= Duration::from_millis(500), "{d:?} below min");
            assert!(d <= Duration::from_millis(1500), "{d:?} above max");
        }
    }

    #[test]
    fn test_out_of_range_bounds_are_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        let cap = Duration::from_secs_f64(DelayRange::MAX_SECS);

        let huge = DelayRange { min: 1e20, max: 1e20 };
        assert_eq!(huge.sample(&mut rng), cap);

        let infinite = DelayRange {
            min: 0.0,
            max: f64::INFINITY,
        };
        assert!(infinite.sample(&mut rng) <= cap);

        let nan = DelayRange {
            min: f64::NAN,
            max: f64::NAN,
        };
        assert_eq!(nan.sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn test_fixed_range_is_exact() {
        let range = DelayRange { min: 0.25, max: 0.25 };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(range.sample(&mut rng), Duration::from_millis(250));
    }
}
